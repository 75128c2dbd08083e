/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::time::Duration;

use clap::Parser;
use kube::Client;
use tracing::{debug, info};

use controlplane::validation::Validators;
use controlplane::{watch, ChangeProcessor};

/// Compiles Gateway API and Kubernetes resources into a validated
/// configuration graph for NGINX.
#[derive(Parser, Debug)]
#[command(name = "controller", version)]
struct Config {
    /// Controller name this build claims GatewayClasses for.
    #[arg(long, env = "CONTROLLER_NAME", default_value = controlplane::consts::DEFAULT_CONTROLLER_NAME)]
    controller_name: String,

    /// Name of the single GatewayClass this build honors. A Gateway naming
    /// any other class is treated as having no GatewayClass at all (§4.5
    /// step 1: "at most one active GatewayClass is honored").
    #[arg(long, env = "GATEWAY_CLASS_NAME", default_value = controlplane::consts::DEFAULT_GATEWAY_CLASS_NAME)]
    gateway_class_name: String,

    /// Disable GRPCRoute/TLSRoute (experimental Gateway API channel) watches.
    #[arg(long, env = "DISABLE_EXPERIMENTAL_ROUTES")]
    disable_experimental_routes: bool,

    /// How long to wait for more changes to arrive before rebuilding the
    /// graph, coalescing a burst of watch events into one rebuild.
    #[arg(long, env = "DEBOUNCE_MILLIS", default_value_t = 100)]
    debounce_millis: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    let client = Client::try_default().await?;

    if let Err(error) = run(client, config).await {
        tracing::error!(%error, "controller exited with an error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(client: Client, config: Config) -> controlplane::Result<()> {
    let validators = Validators {
        controller_name: config.controller_name,
        gateway_class_name: config.gateway_class_name,
        experimental_routes_enabled: !config.disable_experimental_routes,
        ..Validators::default()
    };
    info!(controller_name = %validators.controller_name, gateway_class_name = %validators.gateway_class_name, "starting");

    let mut processor = ChangeProcessor::new(validators);
    let mut events = watch::spawn_watchers(client);
    let debounce = Duration::from_millis(config.debounce_millis);

    loop {
        let Some(first) = events.recv().await else {
            break;
        };
        capture_event(&mut processor, first);

        loop {
            match tokio::time::timeout(debounce, events.recv()).await {
                Ok(Some(event)) => capture_event(&mut processor, event),
                Ok(None) => return Ok(()),
                Err(_elapsed) => break,
            }
        }

        match processor.process() {
            Some(graph) => {
                info!(
                    gateways = graph.gateways.len(),
                    routes = graph.routes.len(),
                    policies = graph.policies.len(),
                    "published updated graph"
                );
            }
            None => {
                debug!("batch touched no relevant objects, skipping rebuild");
            }
        }
    }

    Ok(())
}

fn capture_event(processor: &mut ChangeProcessor, event: watch::WatchEvent) {
    processor.capture_upsert(|store| watch::apply(store, event));
}

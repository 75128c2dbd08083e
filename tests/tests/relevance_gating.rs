/*
Copyright 2025 The Kubernetes Authors.

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

//! Exercises `ChangeProcessor::capture_upsert`/`capture_delete` against the
//! object store directly, without a live cluster: a Service upsert that the
//! previous graph never referenced should not be flagged dirty, while a
//! change to an always-relevant kind always should be.

use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use controlplane::validation::Validators;
use controlplane::ChangeProcessor;

fn service(namespace: &str, name: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn bare_startup_has_no_graph() {
    let processor = ChangeProcessor::new(Validators::default());

    assert!(processor.latest_graph().is_none());
}

#[test]
fn unreferenced_service_upsert_does_not_dirty_the_graph() {
    let mut processor = ChangeProcessor::new(Validators::default());

    processor.capture_upsert(|store| {
        store.upsert_service(controlplane::NsName::new("default", "svc"), service("default", "svc"));
        vec![(controlplane::kinds::ResourceKind::Service, controlplane::NsName::new("default", "svc"))]
    });

    assert!(
        processor.process().is_none(),
        "a Service no Gateway/route references yet should not trigger a rebuild"
    );
    assert!(processor.latest_graph().is_none());
}

#[test]
fn deleting_an_object_never_upserted_is_a_no_op() {
    let mut processor = ChangeProcessor::new(Validators::default());

    processor.capture_delete(|store| {
        let key = controlplane::NsName::new("default", "ghost");
        store.delete_service(&key);
        vec![(controlplane::kinds::ResourceKind::Service, key)]
    });

    assert!(processor.process().is_none());
}

#[test]
fn repeated_processing_with_no_intervening_changes_returns_none_the_second_time() {
    let mut processor = ChangeProcessor::new(Validators::default());

    processor.capture_upsert(|_store| vec![(controlplane::kinds::ResourceKind::GatewayClass, controlplane::NsName::cluster_scoped("nginx"))]);

    let g1 = processor.process().expect("an always-relevant kind must set the dirty bit");
    assert!(
        processor.process().is_none(),
        "a second process() with no intervening captures must return None (P2/P3)"
    );
    assert_eq!(processor.latest_graph().map(|g| g.gateways.len()), Some(g1.gateways.len()));
}

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

pub mod consts;
pub mod graph;
pub mod gvk;
pub mod kinds;
pub mod objects;
pub mod processor;
pub mod relevance;
pub mod resolver;
pub mod store;
pub mod types;
pub mod validation;
pub mod watch;

use thiserror::Error;

pub use processor::ChangeProcessor;
pub use types::NsName;

#[derive(Error, Debug)]
pub enum Error {
    #[error("kube error: {0}")]
    KubeError(#[from] kube::Error),
    #[error("invalid configuration: `{0}`")]
    InvalidConfigError(String),
    #[error("error querying Gateway API CRDs: `{0}`; are the CRDs installed?")]
    CrdNotFoundError(#[source] kube::Error),
    #[error("missing resource namespace")]
    MissingResourceNamespace,
    #[error("missing resource name")]
    MissingResourceName,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reads the namespace/name off an object's metadata, the one place this
/// crate is willing to treat a missing name as a programmer error rather
/// than a recoverable one: the API server never hands the watcher an object
/// without both (§7).
pub trait NamespaceName {
    fn ns_name(&self) -> Result<NsName>;
}

impl NamespaceName for k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
    fn ns_name(&self) -> Result<NsName> {
        let name = self.name.as_deref().ok_or(Error::MissingResourceName)?;
        let namespace = self.namespace.as_deref().unwrap_or_default();
        Ok(NsName::new(namespace, name))
    }
}

//! Deployment-mode signals consumed by the mode resolver.

use serde::{Deserialize, Serialize};
use url::Url;

/// Where the gateway process is hosted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostingPlatform {
    /// Regular host that can run the compute backend next to the gateway
    #[default]
    Local,
    /// Constrained/serverless platform; a local backend is not expected
    Serverless { provider: String },
}

impl HostingPlatform {
    pub fn is_serverless(&self) -> bool {
        matches!(self, HostingPlatform::Serverless { .. })
    }
}

/// Deployment signals captured once at startup and passed explicitly
/// into the mode resolver.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentSignals {
    /// Explicit "force demo" flag
    #[serde(default)]
    pub force_demo: bool,
    #[serde(default)]
    pub hosting: HostingPlatform,
    /// Alternate remote backend address for serverless deployments
    #[serde(default)]
    pub remote_backend_url: Option<Url>,
}

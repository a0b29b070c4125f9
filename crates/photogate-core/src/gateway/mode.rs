//! Deployment mode resolution.
//!
//! Pure function of its inputs: deployment signals captured once at startup,
//! the local backend address, and the readiness cache's last settled outcome.
//! Called once per request at the gateway entry point.

use photogate_types::models::{DeploymentSignals, ModeDecision};
use url::Url;

/// Everything the resolver looks at.
#[derive(Debug, Clone, Copy)]
pub struct ModeContext<'a> {
    pub signals: &'a DeploymentSignals,
    pub local_backend: &'a Url,
    pub local_backend_reachable: bool,
}

/// First match wins:
/// 1. explicit demo flag
/// 2. serverless hosting with the local backend not known reachable:
///    remote backend if configured, otherwise demo
/// 3. live against the local backend
pub fn resolve(ctx: &ModeContext<'_>) -> ModeDecision {
    if ctx.signals.force_demo {
        return ModeDecision::demo();
    }

    if ctx.signals.hosting.is_serverless() && !ctx.local_backend_reachable {
        return match &ctx.signals.remote_backend_url {
            Some(remote) => ModeDecision::remote_hosted(remote.clone()),
            None => ModeDecision::demo(),
        };
    }

    ModeDecision::live(ctx.local_backend.clone())
}

/// Owns the startup-time inputs so handlers only supply reachability.
#[derive(Debug, Clone)]
pub struct ModeResolver {
    signals: DeploymentSignals,
    local_backend: Url,
}

impl ModeResolver {
    pub fn new(signals: DeploymentSignals, local_backend: Url) -> Self {
        Self { signals, local_backend }
    }

    pub fn signals(&self) -> &DeploymentSignals {
        &self.signals
    }

    pub fn local_backend(&self) -> &Url {
        &self.local_backend
    }

    pub fn resolve(&self, local_backend_reachable: bool) -> ModeDecision {
        resolve(&ModeContext {
            signals: &self.signals,
            local_backend: &self.local_backend,
            local_backend_reachable,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use photogate_types::models::{HostingPlatform, Mode};

    fn local() -> Url {
        Url::parse("http://127.0.0.1:8000").unwrap()
    }

    fn serverless() -> HostingPlatform {
        HostingPlatform::Serverless { provider: "vercel".to_string() }
    }

    #[test]
    fn test_force_demo_wins_over_everything() {
        let signals = DeploymentSignals {
            force_demo: true,
            hosting: serverless(),
            remote_backend_url: Some(Url::parse("https://photos.example.com").unwrap()),
        };
        let backend = local();
        let decision = resolve(&ModeContext {
            signals: &signals,
            local_backend: &backend,
            local_backend_reachable: true,
        });
        assert_eq!(decision, ModeDecision::demo());
        assert!(decision.read_only);
        assert!(decision.backend.is_none());
    }

    #[test]
    fn test_serverless_without_remote_is_demo() {
        let signals = DeploymentSignals { hosting: serverless(), ..Default::default() };
        let resolver = ModeResolver::new(signals, local());
        assert_eq!(resolver.resolve(false).mode, Mode::Demo);
    }

    #[test]
    fn test_serverless_with_remote_is_remote_hosted() {
        let remote = Url::parse("https://photos.example.com").unwrap();
        let signals = DeploymentSignals {
            hosting: serverless(),
            remote_backend_url: Some(remote.clone()),
            ..Default::default()
        };
        let decision = ModeResolver::new(signals, local()).resolve(false);
        assert_eq!(decision.mode, Mode::RemoteHosted);
        assert!(decision.read_only);
        assert_eq!(decision.backend, Some(remote));
    }

    #[test]
    fn test_serverless_with_reachable_local_is_live() {
        let signals = DeploymentSignals { hosting: serverless(), ..Default::default() };
        let decision = ModeResolver::new(signals, local()).resolve(true);
        assert_eq!(decision, ModeDecision::live(local()));
    }

    #[test]
    fn test_local_host_is_live_even_when_unreachable() {
        let resolver = ModeResolver::new(DeploymentSignals::default(), local());
        let decision = resolver.resolve(false);
        assert_eq!(decision.mode, Mode::Live);
        assert!(!decision.read_only);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let signals = DeploymentSignals { hosting: serverless(), ..Default::default() };
        let resolver = ModeResolver::new(signals, local());
        for reachable in [true, false] {
            assert_eq!(resolver.resolve(reachable), resolver.resolve(reachable));
        }
    }
}

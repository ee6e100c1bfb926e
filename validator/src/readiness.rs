//! Bounded readiness polling for freshly started services.
//!
//! A service counts as ready once its endpoint answers HTTP 200. Attempts
//! back off exponentially up to a cap and stop at a hard deadline.

use crate::distribution::Project;
use crate::error::{Result, ValidationError};
use crate::probe::ApiProbe;
use bundle_validation_common::password::AdminCredential;
use bundle_validation_common::settings::ReadinessSettings;
use log::{debug, info};
use std::time::{Duration, Instant};

/// Backoff and deadline for one readiness wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Total time allowed before giving up.
    pub timeout: Duration,
}

impl ReadinessPolicy {
    /// Policy for the server, taken from `settings`.
    #[must_use]
    pub const fn server(settings: &ReadinessSettings) -> Self {
        Self {
            initial_backoff: settings.initial_backoff(),
            max_backoff: settings.max_backoff(),
            timeout: settings.server_timeout(),
        }
    }

    /// Policy for the dashboards companion, taken from `settings`.
    #[must_use]
    pub const fn dashboards(settings: &ReadinessSettings) -> Self {
        Self {
            initial_backoff: settings.initial_backoff(),
            max_backoff: settings.max_backoff(),
            timeout: settings.dashboards_timeout(),
        }
    }

    /// Policy for `project`.
    #[must_use]
    pub const fn for_project(project: Project, settings: &ReadinessSettings) -> Self {
        if project.is_dashboards() {
            Self::dashboards(settings)
        } else {
            Self::server(settings)
        }
    }
}

/// Polls `url` until it answers HTTP 200 or the policy's deadline passes.
///
/// # Errors
///
/// Returns [`ValidationError::ClusterStart`] naming `project` and the last
/// observed failure when the deadline passes.
pub fn wait_until_ready(
    probe: &dyn ApiProbe,
    project: Project,
    url: &str,
    credential: &AdminCredential,
    policy: ReadinessPolicy,
) -> Result<()> {
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut delay = policy.initial_backoff;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let last_failure = match probe.get(url, credential) {
            Ok(response) if response.status == 200 => {
                info!(
                    "{project} is ready after {attempts} attempt(s) in {:.1?}",
                    started.elapsed()
                );
                return Ok(());
            }
            Ok(response) => format!("HTTP {}", response.status),
            Err(e) => e.to_string(),
        };
        debug!("{project} not ready yet ({last_failure}); retrying in {delay:?}");

        let now = Instant::now();
        if now >= deadline {
            return Err(ValidationError::ClusterStart {
                project: project.to_string(),
                reason: format!(
                    "{url} not ready after {attempts} attempt(s) within {:?}: {last_failure}",
                    policy.timeout
                ),
            });
        }
        std::thread::sleep(delay.min(deadline - now));
        delay = delay.saturating_mul(2).min(policy.max_backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{MockApiProbe, ProbeError, ProbeResponse};
    use bundle_validation_common::version::Version;
    use mockall::Sequence;

    const URL: &str = "https://localhost:9200";

    fn fast_policy(timeout_ms: u64) -> ReadinessPolicy {
        ReadinessPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn credential() -> AdminCredential {
        AdminCredential::for_version(Version::new(2, 12, 0))
    }

    #[test]
    fn returns_once_the_endpoint_answers() {
        let mut seq = Sequence::new();
        let mut probe = MockApiProbe::new();
        probe
            .expect_get()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|url, _| {
                Err(ProbeError {
                    url: url.to_owned(),
                    reason: "connection refused".to_owned(),
                })
            });
        probe
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ProbeResponse::new(200, "{}")));

        wait_until_ready(&probe, Project::OpenSearch, URL, &credential(), fast_policy(5_000))
            .expect("ready");
    }

    #[test]
    fn times_out_with_cluster_start_error() {
        let mut probe = MockApiProbe::new();
        probe
            .expect_get()
            .returning(|_, _| Ok(ProbeResponse::new(503, "")));

        let err = wait_until_ready(&probe, Project::Dashboards, URL, &credential(), fast_policy(20))
            .expect_err("expected timeout");

        assert!(matches!(err, ValidationError::ClusterStart { .. }));
        let message = err.to_string();
        assert!(message.contains("opensearch-dashboards"));
        assert!(message.contains("HTTP 503"));
    }

    #[test]
    fn picks_the_timeout_per_project() {
        let settings = ReadinessSettings::default();
        assert_eq!(
            ReadinessPolicy::for_project(Project::OpenSearch, &settings).timeout,
            settings.server_timeout()
        );
        assert_eq!(
            ReadinessPolicy::for_project(Project::Dashboards, &settings).timeout,
            settings.dashboards_timeout()
        );
    }
}

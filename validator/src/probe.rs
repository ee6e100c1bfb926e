//! Single authenticated HTTP GET against the cluster under test.
//!
//! Bundles under test ship self-signed demo certificates, so certificate
//! verification is disabled for probes. Non-2xx statuses are returned as
//! responses rather than errors; only transport failures are errors.

use bundle_validation_common::password::AdminCredential;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for one probe round trip.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Status code and body returned by a probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl ProbeResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport failure while probing.
#[derive(Debug, Error)]
#[error("request to {url} failed: {reason}")]
pub struct ProbeError {
    /// The requested URL.
    pub url: String,
    /// Description of the transport failure.
    pub reason: String,
}

/// Issues one GET request and reports status and body.
#[cfg_attr(test, mockall::automock)]
pub trait ApiProbe {
    /// Sends `GET url` with Basic authentication for the admin user.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when no HTTP response was received.
    fn get(&self, url: &str, credential: &AdminCredential) -> Result<ProbeResponse, ProbeError>;
}

/// Probe backed by a `ureq` agent that skips certificate verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProbe;

impl ApiProbe for HttpProbe {
    fn get(&self, url: &str, credential: &AdminCredential) -> Result<ProbeResponse, ProbeError> {
        let to_error = |e: ureq::Error| ProbeError {
            url: url.to_owned(),
            reason: e.to_string(),
        };
        let response = probe_agent()
            .get(url)
            .header("Authorization", credential.basic_auth_header())
            .header("Accept", "*/*")
            .header("Content-Type", "application/json")
            .call()
            .map_err(to_error)?;
        let status = response.status().as_u16();
        let body = response.into_body().read_to_string().map_err(to_error)?;
        Ok(ProbeResponse { status, body })
    }
}

/// Shared agent: no TLS verification, statuses returned as responses.
fn probe_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(true)
            .build();
        let config = ureq::Agent::config_builder()
            .tls_config(tls)
            .http_status_as_error(false)
            .timeout_global(Some(PROBE_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_validation_common::version::Version;

    #[test]
    fn connection_refused_is_a_probe_error() {
        let credential = AdminCredential::for_version(Version::new(2, 12, 0));
        // Port 9 (discard) is closed on CI hosts.
        let err = HttpProbe
            .get("http://127.0.0.1:9/", &credential)
            .expect_err("expected transport failure");
        assert_eq!(err.url, "http://127.0.0.1:9/");
        assert!(!format!("{err}").contains(credential.expose()));
    }
}

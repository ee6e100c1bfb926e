//! The API verification suite.
//!
//! A fixed table of probes confirms that the server answers, lists its
//! plugins, and reports a green cluster, plus the dashboards status endpoint
//! when the companion is part of the run. Every probe always runs; the
//! report carries the pass and fail tallies.

use crate::error::{Result, ValidationError};
use crate::probe::ApiProbe;
use bundle_validation_common::password::AdminCredential;
use bundle_validation_common::settings::Settings;
use bundle_validation_common::version::Version;
use log::{debug, info, warn};

/// One expected request/response pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeSpec {
    /// Absolute request URL.
    pub url: String,
    /// Status code that counts as a pass.
    pub expected_status: u16,
    /// Text the body must contain; empty accepts any body.
    pub expected_substring: &'static str,
}

impl ProbeSpec {
    fn new(url: String, expected_substring: &'static str) -> Self {
        Self {
            url,
            expected_status: 200,
            expected_substring,
        }
    }

    /// Returns `true` when `status` and `body` satisfy this spec.
    #[must_use]
    pub fn accepts(&self, status: u16, body: &str) -> bool {
        status == self.expected_status
            && (self.expected_substring.is_empty() || body.contains(self.expected_substring))
    }
}

/// Returns the server root URL for the given security mode.
#[must_use]
pub fn server_url(settings: &Settings, secure: bool) -> String {
    let scheme = if secure { "https" } else { "http" };
    format!("{scheme}://{}:{}", settings.host, settings.server_port)
}

/// Returns the dashboards status URL.
#[must_use]
pub fn dashboards_status_url(settings: &Settings) -> String {
    format!(
        "http://{}:{}/api/status",
        settings.host, settings.dashboards_port
    )
}

/// Builds the probe table for a run.
///
/// Server probes use `https` only when `secure` is set. The dashboards probe
/// is added when `with_dashboards` is set and is plain `http` regardless.
///
/// # Examples
///
/// ```
/// use bundle_validation_common::settings::Settings;
/// use bundle_validator::suite::probe_plan;
///
/// let plan = probe_plan(&Settings::default(), false, false);
/// assert_eq!(plan.len(), 3);
/// assert!(plan.iter().all(|probe| probe.url.starts_with("http://")));
/// ```
#[must_use]
pub fn probe_plan(settings: &Settings, with_dashboards: bool, secure: bool) -> Vec<ProbeSpec> {
    let base = server_url(settings, secure);
    let mut plan = vec![
        ProbeSpec::new(format!("{base}/"), ""),
        ProbeSpec::new(format!("{base}/_cat/plugins?v"), ""),
        ProbeSpec::new(format!("{base}/_cat/health?v"), "green"),
    ];
    if with_dashboards {
        plan.push(ProbeSpec::new(dashboards_status_url(settings), ""));
    }
    plan
}

/// Pass and fail tallies of one suite run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuiteReport {
    passed: usize,
    failed: usize,
}

impl SuiteReport {
    /// Number of probes that passed.
    #[must_use]
    pub const fn passed(&self) -> usize {
        self.passed
    }

    /// Number of probes that failed.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// Returns `true` when no probe failed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Renders `There are {pass}/{total} test cases Pass`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "There are {}/{} test cases Pass",
            self.passed,
            self.passed + self.failed
        )
    }

    /// Converts the report into the stage outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ValidationFailed`] carrying the summary
    /// when any probe failed.
    pub fn into_result(self) -> Result<()> {
        if self.all_passed() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                summary: self.summary(),
            })
        }
    }
}

/// Runs the probe table through an [`ApiProbe`].
pub struct ApiVerificationSuite<'a> {
    probe: &'a dyn ApiProbe,
    settings: &'a Settings,
}

impl<'a> ApiVerificationSuite<'a> {
    /// Creates a suite over `probe` and the endpoints in `settings`.
    #[must_use]
    pub fn new(probe: &'a dyn ApiProbe, settings: &'a Settings) -> Self {
        Self { probe, settings }
    }

    /// Runs every probe and tallies the outcome.
    ///
    /// Transport errors count as failed probes.
    #[must_use]
    pub fn run(&self, version: Version, with_dashboards: bool, secure: bool) -> SuiteReport {
        let credential = AdminCredential::for_version(version);
        let mut report = SuiteReport::default();
        for spec in probe_plan(self.settings, with_dashboards, secure) {
            info!("Request_url -> {}", spec.url);
            match self.probe.get(&spec.url, &credential) {
                Ok(response) => {
                    info!("Status_code -> {}", response.status);
                    debug!("response_text -> {}", response.body);
                    if spec.accepts(response.status, &response.body) {
                        report.passed += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                    report.failed += 1;
                }
            }
        }
        info!("{}", report.summary());
        report
    }
}

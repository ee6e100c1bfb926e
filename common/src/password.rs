//! Administrative credential policy.
//!
//! Bundles from 2.12.0 onwards refuse to bootstrap the demo security
//! configuration with the historical `admin` password, so the expected
//! credential depends on the version under test. The secret itself is kept
//! behind [`AdminCredential`], whose `Debug` and `Display` output is redacted
//! so it cannot leak into logs by accident.

use crate::version::{Version, VersionError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::info;
use std::fmt;

/// First version that requires the strong bootstrap password.
pub const STRONG_PASSWORD_SINCE: Version = Version::new(2, 12, 0);

/// Administrative user name used by the demo security configuration.
pub const ADMIN_USER: &str = "admin";

/// Environment variable read by the bundle installers at bootstrap time.
pub const INITIAL_ADMIN_PASSWORD_ENV: &str = "OPENSEARCH_INITIAL_ADMIN_PASSWORD";

const STRONG_PASSWORD: &str = "myStrongPassword123!";
const LEGACY_PASSWORD: &str = "admin";

/// Which family of default credential applies to a version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialClass {
    /// The pre-2.12.0 `admin` default.
    Legacy,
    /// The strong default demanded from 2.12.0 onwards.
    Strong,
}

impl CredentialClass {
    /// Returns the class that applies to `version`.
    #[must_use]
    pub fn for_version(version: Version) -> Self {
        if version >= STRONG_PASSWORD_SINCE {
            Self::Strong
        } else {
            Self::Legacy
        }
    }
}

impl fmt::Display for CredentialClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Strong => f.write_str("strong"),
        }
    }
}

/// The administrator password expected by a bundle.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential {
    class: CredentialClass,
    secret: &'static str,
}

impl AdminCredential {
    /// Returns the credential for `version`.
    ///
    /// Logs the credential class, never the secret.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_validation_common::password::{AdminCredential, CredentialClass};
    /// use bundle_validation_common::version::Version;
    ///
    /// let credential = AdminCredential::for_version(Version::new(2, 12, 0));
    /// assert_eq!(credential.class(), CredentialClass::Strong);
    /// assert_eq!(credential.to_string(), "<redacted>");
    /// ```
    #[must_use]
    pub fn for_version(version: Version) -> Self {
        let class = CredentialClass::for_version(version);
        info!("using the {class} administrator credential for version {version}");
        let secret = match class {
            CredentialClass::Strong => STRONG_PASSWORD,
            CredentialClass::Legacy => LEGACY_PASSWORD,
        };
        Self { class, secret }
    }

    /// Returns which default applies.
    #[must_use]
    pub const fn class(&self) -> CredentialClass {
        self.class
    }

    /// Returns the plaintext password.
    ///
    /// Callers must not log the returned value.
    #[must_use]
    pub const fn expose(&self) -> &str {
        self.secret
    }

    /// Returns the password in base64 form.
    #[must_use]
    pub fn encoded(&self) -> String {
        BASE64.encode(self.secret)
    }

    /// Returns the `Authorization` header value for the admin user.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_validation_common::password::AdminCredential;
    /// use bundle_validation_common::version::Version;
    ///
    /// let credential = AdminCredential::for_version(Version::new(2, 3, 0));
    /// assert_eq!(credential.basic_auth_header(), "Basic YWRtaW46YWRtaW4=");
    /// ```
    #[must_use]
    pub fn basic_auth_header(&self) -> String {
        let pair = format!("{ADMIN_USER}:{}", self.secret);
        format!("Basic {}", BASE64.encode(pair))
    }
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredential")
            .field("class", &self.class)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Parses `version` and returns the credential the bundle expects.
///
/// # Errors
///
/// Returns [`VersionError::Malformed`] when `version` is not a
/// `MAJOR.MINOR.PATCH` triple.
pub fn resolve_credential(version: &str) -> Result<AdminCredential, VersionError> {
    let version: Version = version.parse()?;
    Ok(AdminCredential::for_version(version))
}

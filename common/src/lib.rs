//! Shared building blocks for the bundle validator: product versions, the
//! version-dependent administrator credential, and run settings.

pub mod password;
pub mod settings;
pub mod version;

pub use password::{ADMIN_USER, AdminCredential, INITIAL_ADMIN_PASSWORD_ENV, resolve_credential};
pub use settings::{ReadinessSettings, Settings, SettingsError};
pub use version::{Version, VersionError};

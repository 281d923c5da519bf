//! Admin console access policy.
//!
//! Catalog mutations (upload, append, delete, promote) belong to the admin
//! console, which is only enabled in development or when explicitly turned
//! on. The policy is resolved once at startup and handed to the services
//! that need it.

use crate::error::CoreError;

/// Message returned when an admin-only operation is attempted while the
/// console is disabled.
pub const ADMIN_DISABLED_MESSAGE: &str = "Disabled in production";

/// Whether admin-only catalog operations are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    admin_console_enabled: bool,
}

impl AccessPolicy {
    pub const fn new(admin_console_enabled: bool) -> Self {
        Self {
            admin_console_enabled,
        }
    }

    /// Policy with the admin console enabled.
    pub const fn admin() -> Self {
        Self::new(true)
    }

    /// Policy with the admin console disabled.
    pub const fn public() -> Self {
        Self::new(false)
    }

    /// Resolve from the raw `APP_ENV` and `ADMIN_UI_ENABLED` values.
    ///
    /// Enabled when the environment is `development`, or when the flag is
    /// one of `1`, `true`, `yes`, `on`, `dev` (case-insensitive).
    pub fn from_settings(app_env: Option<&str>, admin_flag: Option<&str>) -> Self {
        let is_development = app_env
            .map(|env| env.trim().eq_ignore_ascii_case("development"))
            .unwrap_or(false);
        let flag_enabled = admin_flag
            .map(|flag| {
                matches!(
                    flag.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on" | "dev"
                )
            })
            .unwrap_or(false);
        Self::new(is_development || flag_enabled)
    }

    pub fn admin_console_enabled(&self) -> bool {
        self.admin_console_enabled
    }

    /// Reject with [`CoreError::Forbidden`] unless the admin console is on.
    pub fn require_admin(&self) -> Result<(), CoreError> {
        if self.admin_console_enabled {
            Ok(())
        } else {
            Err(CoreError::Forbidden(ADMIN_DISABLED_MESSAGE.into()))
        }
    }
}

//! Read-only settings for generation, layout and dispatch
//!
//! Values come from environment variables, read once per process. Callers that
//! keep settings elsewhere implement [`SettingsProvider`] instead.

use std::sync::OnceLock;
use std::time::Duration;

use crate::models::{Charset, ECLevel};

/// Smallest integer scale used for raster export
pub const MIN_EXPORT_SCALE: u32 = 10;
/// Largest integer scale used for raster export
pub const MAX_EXPORT_SCALE: u32 = 15;

/// Read-only configuration consumed by the pipeline
pub trait SettingsProvider: Send + Sync {
    /// Correction level for content that does not pick one
    fn default_ec_level(&self) -> ECLevel;
    /// Whether print layout scales symbols to fill their cells
    fn print_scale_to_fill(&self) -> bool;
    /// Whether the print grid is centered on the page
    fn print_center_on_page(&self) -> bool;
    /// Pixels per module for raster export, within 10-15
    fn export_scale(&self) -> u32;
    /// Upper bound for one capability call made by the dispatcher
    fn dispatch_timeout(&self) -> Duration;
    /// Whether `utm*` parameters are removed before a link is opened
    fn strip_tracking_params(&self) -> bool;
    /// Charset used to turn text into symbol bytes
    fn charset(&self) -> Charset;
}

/// Settings snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `QR_DEFAULT_EC_LEVEL` (L/M/Q/H, default M)
    pub default_ec_level: ECLevel,
    /// `QR_PRINT_SCALE_TO_FILL` (0/1, default 0)
    pub print_scale_to_fill: bool,
    /// `QR_PRINT_CENTER` (0/1, default 1)
    pub print_center_on_page: bool,
    /// `QR_EXPORT_SCALE` (default 12, clamped to 10-15)
    pub export_scale: u32,
    /// `QR_DISPATCH_TIMEOUT_MS` (default 15000)
    pub dispatch_timeout: Duration,
    /// `QR_STRIP_TRACKING` (0/1, default 1)
    pub strip_tracking_params: bool,
    /// `QR_CHARSET` (utf8/latin1, default utf8)
    pub charset: Charset,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_ec_level: ECLevel::M,
            print_scale_to_fill: false,
            print_center_on_page: true,
            export_scale: 12,
            dispatch_timeout: Duration::from_millis(15_000),
            strip_tracking_params: true,
            charset: Charset::Utf8,
        }
    }
}

impl Settings {
    /// Build settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ec_level: parse_env("QR_DEFAULT_EC_LEVEL", defaults.default_ec_level),
            print_scale_to_fill: parse_env_bool_u8(
                "QR_PRINT_SCALE_TO_FILL",
                defaults.print_scale_to_fill,
            ),
            print_center_on_page: parse_env_bool_u8(
                "QR_PRINT_CENTER",
                defaults.print_center_on_page,
            ),
            export_scale: parse_env("QR_EXPORT_SCALE", defaults.export_scale)
                .clamp(MIN_EXPORT_SCALE, MAX_EXPORT_SCALE),
            dispatch_timeout: Duration::from_millis(parse_env(
                "QR_DISPATCH_TIMEOUT_MS",
                defaults.dispatch_timeout.as_millis() as u64,
            )),
            strip_tracking_params: parse_env_bool_u8(
                "QR_STRIP_TRACKING",
                defaults.strip_tracking_params,
            ),
            charset: parse_env("QR_CHARSET", defaults.charset),
        }
    }
}

impl SettingsProvider for Settings {
    fn default_ec_level(&self) -> ECLevel {
        self.default_ec_level
    }

    fn print_scale_to_fill(&self) -> bool {
        self.print_scale_to_fill
    }

    fn print_center_on_page(&self) -> bool {
        self.print_center_on_page
    }

    fn export_scale(&self) -> u32 {
        self.export_scale.clamp(MIN_EXPORT_SCALE, MAX_EXPORT_SCALE)
    }

    fn dispatch_timeout(&self) -> Duration {
        self.dispatch_timeout
    }

    fn strip_tracking_params(&self) -> bool {
        self.strip_tracking_params
    }

    fn charset(&self) -> Charset {
        self.charset
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Process-wide settings, read from the environment on first use
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(Settings::from_env)
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.default_ec_level(), ECLevel::M);
        assert!(!s.print_scale_to_fill());
        assert!(s.print_center_on_page());
        assert_eq!(s.export_scale(), 12);
        assert_eq!(s.charset(), Charset::Utf8);
    }

    #[test]
    fn test_export_scale_is_clamped() {
        let low = Settings {
            export_scale: 2,
            ..Settings::default()
        };
        let high = Settings {
            export_scale: 40,
            ..Settings::default()
        };
        assert_eq!(low.export_scale(), MIN_EXPORT_SCALE);
        assert_eq!(high.export_scale(), MAX_EXPORT_SCALE);
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        assert_eq!(parse_env("QR_PIPELINE_TEST_UNSET_VARIABLE", 7u32), 7);
        assert!(parse_env_bool_u8("QR_PIPELINE_TEST_UNSET_VARIABLE", true));
    }
}

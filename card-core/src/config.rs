//! Export pipeline configuration.
//!
//! Values come from [`ExportConfig::default`], optionally a JSON file, and
//! finally `IDCARD_*` environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::PixelSize;
use crate::{CardError, CardResult};

/// Timing, resolution and layout settings shared by every export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Fallback wait after a face change when the host gives no settle signal.
    pub settle_delay_ms: u64,
    /// Upper bound on waiting for a face change to settle.
    pub settle_timeout_ms: u64,
    /// Upper bound on a single face capture.
    pub capture_timeout_ms: u64,
    /// Extra attempts for the settle-then-capture step after a timeout.
    pub capture_retries: u32,
    /// Raster scale multiplier over the design size.
    pub raster_scale: u32,
    /// Design size of a card face in CSS pixels.
    pub design_size: PixelSize,
    /// Delay between the print document loading and printing.
    pub print_delay_ms: u64,
    /// Upper bound on waiting for the print document to load.
    pub print_load_timeout_ms: u64,
    /// Draw cutting guides and instructions.
    pub cutting_guides: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            settle_timeout_ms: 3000,
            capture_timeout_ms: 10_000,
            capture_retries: 1,
            raster_scale: 3,
            design_size: PixelSize::design(),
            print_delay_ms: 1000,
            print_load_timeout_ms: 10_000,
            cutting_guides: true,
        }
    }
}

impl ExportConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> CardResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `IDCARD_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but not a valid number, or the
    /// result fails validation.
    pub fn with_env_overrides(self) -> CardResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is not a valid number or the result fails
    /// validation.
    pub fn with_overrides<F>(mut self, lookup: F) -> CardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> CardResult<T> {
            raw.trim()
                .parse()
                .map_err(|_| CardError::InvalidConfig(format!("{key}={raw}")))
        }

        if let Some(v) = lookup("IDCARD_SETTLE_MS") {
            self.settle_delay_ms = parse("IDCARD_SETTLE_MS", &v)?;
        }
        if let Some(v) = lookup("IDCARD_SETTLE_TIMEOUT_MS") {
            self.settle_timeout_ms = parse("IDCARD_SETTLE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("IDCARD_CAPTURE_TIMEOUT_MS") {
            self.capture_timeout_ms = parse("IDCARD_CAPTURE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("IDCARD_CAPTURE_RETRIES") {
            self.capture_retries = parse("IDCARD_CAPTURE_RETRIES", &v)?;
        }
        if let Some(v) = lookup("IDCARD_RASTER_SCALE") {
            self.raster_scale = parse("IDCARD_RASTER_SCALE", &v)?;
        }
        if let Some(v) = lookup("IDCARD_PRINT_DELAY_MS") {
            self.print_delay_ms = parse("IDCARD_PRINT_DELAY_MS", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> CardResult<()> {
        if self.raster_scale == 0 || self.raster_scale > 8 {
            return Err(CardError::InvalidConfig(format!(
                "raster_scale must be 1..=8, got {}",
                self.raster_scale
            )));
        }
        if self.design_size.is_empty() {
            return Err(CardError::InvalidConfig(
                "design_size must be non-zero".to_string(),
            ));
        }
        if self.settle_timeout_ms < self.settle_delay_ms {
            return Err(CardError::InvalidConfig(format!(
                "settle_timeout_ms ({}) is shorter than settle_delay_ms ({})",
                self.settle_timeout_ms, self.settle_delay_ms
            )));
        }
        if self.capture_timeout_ms == 0 {
            return Err(CardError::InvalidConfig(
                "capture_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Fallback settle wait.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Settle timeout.
    #[must_use]
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    /// Capture timeout.
    #[must_use]
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    /// Delay before printing.
    #[must_use]
    pub fn print_delay(&self) -> Duration {
        Duration::from_millis(self.print_delay_ms)
    }

    /// Print document load timeout.
    #[must_use]
    pub fn print_load_timeout(&self) -> Duration {
        Duration::from_millis(self.print_load_timeout_ms)
    }

    /// Pixel size of a captured face.
    #[must_use]
    pub fn raster_size(&self) -> PixelSize {
        self.design_size.scaled(self.raster_scale)
    }
}

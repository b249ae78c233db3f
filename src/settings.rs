//! Simulation settings
//!
//! Persisted as JSON. Missing fields take their defaults, so a settings file
//! only needs to mention what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};
use crate::geometry::{Point, Size};

/// Tunables for the physics world, the loop and the display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    // === Loop ===
    /// Physics steps per simulated second; also the integration step
    pub step_rate_hz: u32,
    /// Frame cap for the interactive loop
    pub max_fps: u32,

    // === Solver ===
    pub solver_iterations: usize,
    /// Fraction of joint error corrected per step
    pub erp: f64,
    /// Constraint softness
    pub cfm: f64,
    /// Acceleration applied to every body, meters per second squared (+y is down)
    pub gravity: Point,

    // === Contacts ===
    pub contact_bounce: f64,
    pub contact_mu: f64,
    /// Approach speed a contact needs before it bounces
    pub bounce_velocity: f64,

    // === Display ===
    /// Visible area in meters
    pub viewport: Size,
    pub pixels_per_meter: f64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            step_rate_hz: DEFAULT_STEP_RATE_HZ,
            max_fps: DEFAULT_MAX_FPS,

            solver_iterations: SOLVER_ITERATIONS,
            erp: DEFAULT_ERP,
            cfm: DEFAULT_CFM,
            gravity: Point::ZERO,

            contact_bounce: CONTACT_BOUNCE,
            contact_mu: CONTACT_MU,
            bounce_velocity: BOUNCE_VELOCITY,

            viewport: Size::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            pixels_per_meter: PIXELS_PER_METER,
        }
    }
}

impl SimSettings {
    /// Seconds per physics step. Derived, so stepping and time reconciliation agree.
    /// Only meaningful once `validate` has passed.
    pub fn dt(&self) -> f64 {
        1.0 / f64::from(self.step_rate_hz)
    }

    /// Reject values the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.step_rate_hz == 0 {
            return Err(SimError::InvalidStepRate(self.step_rate_hz));
        }
        Ok(())
    }

    /// Read settings from a JSON file. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dt_tracks_step_rate() {
        let mut settings = SimSettings::default();
        assert!((settings.dt() - 0.01).abs() < 1e-12);
        settings.step_rate_hz = 60;
        assert!((settings.dt() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_step_rate_is_rejected() {
        let settings = SimSettings {
            step_rate_hz: 0,
            ..SimSettings::default()
        };
        assert!(matches!(settings.validate(), Err(SimError::InvalidStepRate(0))));

        let path = std::env::temp_dir().join(format!("gyre-zero-rate-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"step_rate_hz": 0}"#).unwrap();
        let loaded = SimSettings::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(loaded, Err(SimError::InvalidStepRate(0))));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: SimSettings = serde_json::from_str(r#"{"step_rate_hz": 50, "gravity": {"x": 0.0, "y": 9.8}}"#).unwrap();
        assert_eq!(settings.step_rate_hz, 50);
        assert_eq!(settings.gravity, Point::new(0.0, 9.8));
        assert_eq!(settings.solver_iterations, SOLVER_ITERATIONS);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("gyre-settings-{}.json", std::process::id()));
        let mut settings = SimSettings::default();
        settings.erp = 0.4;
        settings.save(&path).unwrap();
        let loaded = SimSettings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_is_default_and_bad_json_is_error() {
        let missing = std::env::temp_dir().join("gyre-settings-does-not-exist.json");
        assert_eq!(SimSettings::load(&missing).unwrap(), SimSettings::default());

        let bad = std::env::temp_dir().join(format!("gyre-settings-bad-{}.json", std::process::id()));
        std::fs::write(&bad, "{ not json").unwrap();
        let err = SimSettings::load(&bad).unwrap_err();
        std::fs::remove_file(&bad).unwrap();
        assert!(matches!(err, SimError::Settings(_)));
    }
}

//! Run configuration loading and validation.
//!
//! A probe run is described by a TOML file:
//!
//! ```toml
//! folder = "measurements/wafer3"
//! probes = 2
//! terminations = "ideal"
//! vna_mode = "manual"
//!
//! [delimiters]
//! input = "comma"
//! output = "tab"
//!
//! [unwrap]
//! mode = "gradient_shift"
//!
//! [refine]
//! max_iterations = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::delay::{DelayTimeRefiner, NelderMeadOptions};
use crate::error::{DeembedError, Result};
use crate::phase::{PhaseUnwrapper, SlopeFit, UnwrapMode};
use crate::probe::TransmissionReconstructor;
use crate::records::Delimiter;
use crate::sweep::FailurePolicy;

/// Top-level run configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeembedConfig {
    /// Folder holding the input records; outputs are written next to them.
    pub folder: PathBuf,

    /// Number of probes (1 or 2).
    #[serde(default = "default_probes")]
    pub probes: u8,

    /// Reflections assumed for SHORT/OPEN/LOAD.
    #[serde(default)]
    pub terminations: Terminations,

    /// Whether DUT records are de-embedded as well.
    #[serde(default)]
    pub vna_mode: VnaMode,

    /// Handling of failing frequency points.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub delimiters: DelimiterConfig,

    #[serde(default)]
    pub unwrap: UnwrapConfig,

    /// Simplex settings of the delay-time refinement.
    #[serde(default)]
    pub refine: NelderMeadOptions,
}

fn default_probes() -> u8 {
    2
}

/// Known reflections of the calibration standards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminations {
    /// -1, +1 and 0.
    #[default]
    Ideal,
    /// Read from `S11S/S11O/S11L` (probe 1) and `S22S/S22O/S22L` (probe 2).
    Measured,
}

/// Analyzer operating mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VnaMode {
    /// The analyzer applies the probe models itself; only the models are produced.
    #[default]
    Automatic,
    /// DUT records are de-embedded with the freshly characterized probes.
    Manual,
}

/// Record delimiters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DelimiterConfig {
    #[serde(default)]
    pub input: Delimiter,
    #[serde(default)]
    pub output: Delimiter,
}

/// Jump removal strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnwrapStrategy {
    #[default]
    GradientShift,
    FixedMultiple,
}

/// Phase unwrapping settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct UnwrapConfig {
    #[serde(default)]
    pub mode: UnwrapStrategy,

    /// Multiple of pi removed per jump in `fixed_multiple` mode.
    #[serde(default = "default_phase_factor")]
    pub phase_factor: u8,

    #[serde(default)]
    pub slope_fit: SlopeFit,
}

fn default_phase_factor() -> u8 {
    2
}

impl Default for UnwrapConfig {
    fn default() -> Self {
        Self {
            mode: UnwrapStrategy::default(),
            phase_factor: default_phase_factor(),
            slope_fit: SlopeFit::default(),
        }
    }
}

impl UnwrapConfig {
    pub fn mode(&self) -> UnwrapMode {
        match self.mode {
            UnwrapStrategy::GradientShift => UnwrapMode::GradientShift,
            UnwrapStrategy::FixedMultiple => UnwrapMode::FixedMultiple {
                phase_factor: self.phase_factor,
            },
        }
    }

    pub fn unwrapper(&self) -> PhaseUnwrapper {
        PhaseUnwrapper::new(self.mode()).with_slope_fit(self.slope_fit)
    }
}

impl DeembedConfig {
    /// Default settings for the records in `folder`.
    pub fn new<P: Into<PathBuf>>(folder: P) -> Self {
        Self {
            folder: folder.into(),
            probes: default_probes(),
            terminations: Terminations::default(),
            vna_mode: VnaMode::default(),
            failure_policy: FailurePolicy::default(),
            delimiters: DelimiterConfig::default(),
            unwrap: UnwrapConfig::default(),
            refine: NelderMeadOptions::default(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DeembedConfig =
            toml::from_str(content).map_err(|e| DeembedError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.probes, 1 | 2) {
            return Err(DeembedError::Config(format!(
                "probes must be 1 or 2, got {}",
                self.probes
            )));
        }
        if self.unwrap.mode == UnwrapStrategy::FixedMultiple
            && !matches!(self.unwrap.phase_factor, 1 | 2)
        {
            return Err(DeembedError::Config(format!(
                "phase_factor must be 1 or 2, got {}",
                self.unwrap.phase_factor
            )));
        }
        self.refine
            .validate()
            .map_err(|e| DeembedError::Config(format!("[refine] {}", e)))?;
        Ok(())
    }

    /// Path of a record inside the configured folder.
    pub fn path(&self, name: &str) -> PathBuf {
        self.folder.join(name)
    }

    pub fn reconstructor(&self) -> TransmissionReconstructor {
        TransmissionReconstructor::new(self.unwrap.unwrapper(), DelayTimeRefiner::new(self.refine))
    }
}

/// Load configuration from a file.
///
/// A relative `folder` is resolved against the directory of the file.
pub fn load_config(path: &Path) -> Result<DeembedConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config = DeembedConfig::from_toml_str(&content)
        .map_err(|e| DeembedError::Config(format!("{}: {}", path.display(), e)))?;

    if config.folder.is_relative() {
        if let Some(parent) = path.parent() {
            config.folder = parent.join(&config.folder);
        }
    }

    tracing::debug!(folder = ?config.folder, probes = config.probes, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = DeembedConfig::from_toml_str("folder = \"data\"\n").unwrap();
        assert_eq!(config.probes, 2);
        assert_eq!(config.terminations, Terminations::Ideal);
        assert_eq!(config.vna_mode, VnaMode::Automatic);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.unwrap.mode(), UnwrapMode::GradientShift);
        assert_eq!(config.delimiters.input, Delimiter::Comma);
        assert_eq!(config.refine, NelderMeadOptions::default());
        assert_eq!(config.path("MS11S.csv"), PathBuf::from("data").join("MS11S.csv"));
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            folder = "run1"
            probes = 1
            terminations = "measured"
            vna_mode = "manual"
            failure_policy = "collect"

            [delimiters]
            input = "semicolon"
            output = "tab"

            [unwrap]
            mode = "fixed_multiple"
            phase_factor = 1
            slope_fit = "through_origin"

            [refine]
            max_iterations = 200
            f_tolerance = 1e-6
        "#;
        let config = DeembedConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.probes, 1);
        assert_eq!(config.terminations, Terminations::Measured);
        assert_eq!(config.vna_mode, VnaMode::Manual);
        assert_eq!(config.failure_policy, FailurePolicy::Collect);
        assert_eq!(config.delimiters.output, Delimiter::Tab);
        assert_eq!(
            config.unwrap.mode(),
            UnwrapMode::FixedMultiple { phase_factor: 1 }
        );
        assert_eq!(config.unwrap.slope_fit, SlopeFit::ThroughOrigin);
        assert_eq!(config.refine.max_iterations, 200);
        assert_eq!(config.refine.alpha, 1.0);
    }

    #[test]
    fn test_phase_factor_only_used_by_fixed_multiple() {
        let gradient: UnwrapConfig = toml::from_str("phase_factor = 1").unwrap();
        assert_eq!(gradient.mode(), UnwrapMode::GradientShift);

        let fixed: UnwrapConfig = toml::from_str(r#"mode = "fixed_multiple""#).unwrap();
        assert_eq!(fixed.mode(), UnwrapMode::FixedMultiple { phase_factor: 2 });
        assert_eq!(fixed.unwrapper().mode(), UnwrapMode::FixedMultiple { phase_factor: 2 });
    }

    #[test]
    fn test_invalid_values_rejected() {
        for toml in [
            "folder = \"x\"\nprobes = 3\n",
            "folder = \"x\"\n[unwrap]\nmode = \"fixed_multiple\"\nphase_factor = 4\n",
            "folder = \"x\"\n[refine]\nbeta = 1.5\n",
            "probes = 1\n",
            "folder = \"x\"\nvna_mode = \"remote\"\n",
        ] {
            assert!(
                matches!(DeembedConfig::from_toml_str(toml), Err(DeembedError::Config(_))),
                "accepted: {toml}"
            );
        }
    }
}

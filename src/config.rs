//! Configuration management and validation.
//!
//! Provides configuration structures for the parser, the calibration
//! error-analysis pipeline and the temperature logger. Every threshold the
//! pipeline uses lives here with a named field and a documented default, and
//! is passed explicitly into the stage that needs it.

use crate::constants::MISSING_VALUE_TOKEN;
use crate::error::{Result, TracerError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unit a series' current values were recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CurrentUnit {
    /// Values are already in amperes
    #[default]
    Amperes,
    /// Values are in milliamperes and are divided by 1000 before analysis
    Milliamperes,
}

impl CurrentUnit {
    /// Factor converting a value in this unit to amperes
    pub fn to_amperes_factor(self) -> f64 {
        match self {
            CurrentUnit::Amperes => 1.0,
            CurrentUnit::Milliamperes => 1e-3,
        }
    }
}

/// How reference voltages outside the comparand's voltage range are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterpolationMode {
    /// Out-of-range voltages take the comparand current at the nearest end of
    /// its voltage domain. No extrapolation.
    #[default]
    Clamped,
    /// The end spline segments are extended beyond the domain. Only meant for
    /// exploratory comparisons.
    Extrapolate,
}

/// Parser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Token normalized to an absent value
    pub missing_value_token: String,

    /// Fall back to the loose `Sample <digits>` boundary pattern when no
    /// `Sample No.` boundary exists in a file
    pub allow_fallback_boundaries: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            missing_value_token: MISSING_VALUE_TOKEN.to_string(),
            allow_fallback_boundaries: true,
        }
    }
}

/// Reference-series cleaning thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// A voltage above this followed directly by one below
    /// `collapse_low_voltage` marks a tracer reset (V)
    pub collapse_high_voltage: f64,

    /// Low side of the reset detection (V)
    pub collapse_low_voltage: f64,

    /// Points below this voltage are candidates for spike removal (V)
    pub low_voltage_bound: f64,

    /// Percentile of currents at or above `low_voltage_bound` used as the
    /// spike threshold (0-100)
    pub spike_percentile: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            collapse_high_voltage: 10.0,
            collapse_low_voltage: 1.0,
            low_voltage_bound: 1.0,
            spike_percentile: 90.0,
        }
    }
}

/// Region boundaries and weights for the regional error metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    /// MPP region lower bound as a fraction of Vmax
    pub mpp_lower_vmax_fraction: f64,

    /// MPP region upper bound as a fraction of Voc
    pub mpp_upper_voc_fraction: f64,

    /// ISC region upper bound as a fraction of Voc
    pub isc_upper_voc_fraction: f64,

    /// VOC region lower bound as a fraction of Voc
    pub voc_lower_voc_fraction: f64,

    /// Weight applied to MPP region errors in the combined metric
    pub mpp_weight: f64,

    /// Weight applied to ISC region errors in the combined metric
    pub isc_weight: f64,

    /// Weight applied to VOC region errors in the combined metric
    pub voc_weight: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            mpp_lower_vmax_fraction: 0.7,
            mpp_upper_voc_fraction: 0.6,
            isc_upper_voc_fraction: 0.1,
            voc_lower_voc_fraction: 0.6,
            mpp_weight: 1.0,
            isc_weight: 0.5,
            voc_weight: 0.2,
        }
    }
}

/// Configuration for the calibration error-analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Unit of the calibrated (reference) series' current
    pub reference_unit: CurrentUnit,

    /// Unit of the uncalibrated (comparand) series' current
    pub comparand_unit: CurrentUnit,

    /// Out-of-domain policy for interpolation
    pub interpolation: InterpolationMode,

    /// Reference-series cleaning thresholds
    pub cleaning: CleaningConfig,

    /// Region boundaries and weights
    pub regions: RegionConfig,
}

impl AnalysisConfig {
    /// Set the unit of the reference series' current
    pub fn with_reference_unit(mut self, unit: CurrentUnit) -> Self {
        self.reference_unit = unit;
        self
    }

    /// Set the unit of the comparand series' current
    pub fn with_comparand_unit(mut self, unit: CurrentUnit) -> Self {
        self.comparand_unit = unit;
        self
    }

    /// Set the interpolation mode
    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }

    /// Replace the cleaning thresholds
    pub fn with_cleaning(mut self, cleaning: CleaningConfig) -> Self {
        self.cleaning = cleaning;
        self
    }

    /// Replace the region boundaries and weights
    pub fn with_regions(mut self, regions: RegionConfig) -> Self {
        self.regions = regions;
        self
    }

    /// Check thresholds and weights for values the pipeline cannot use
    pub fn validate(&self) -> Result<()> {
        let c = &self.cleaning;
        require_finite("collapse_high_voltage", c.collapse_high_voltage)?;
        require_finite("collapse_low_voltage", c.collapse_low_voltage)?;
        require_finite("low_voltage_bound", c.low_voltage_bound)?;
        if c.collapse_low_voltage >= c.collapse_high_voltage {
            return Err(TracerError::configuration(format!(
                "collapse_low_voltage ({}) must be below collapse_high_voltage ({})",
                c.collapse_low_voltage, c.collapse_high_voltage
            )));
        }
        if !(0.0..=100.0).contains(&c.spike_percentile) {
            return Err(TracerError::configuration(format!(
                "spike_percentile must be within 0-100, got {}",
                c.spike_percentile
            )));
        }

        let r = &self.regions;
        for (name, value) in [
            ("mpp_lower_vmax_fraction", r.mpp_lower_vmax_fraction),
            ("mpp_upper_voc_fraction", r.mpp_upper_voc_fraction),
            ("isc_upper_voc_fraction", r.isc_upper_voc_fraction),
            ("voc_lower_voc_fraction", r.voc_lower_voc_fraction),
            ("mpp_weight", r.mpp_weight),
            ("isc_weight", r.isc_weight),
            ("voc_weight", r.voc_weight),
        ] {
            require_finite(name, value)?;
            if value < 0.0 {
                return Err(TracerError::configuration(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        debug!("Analysis configuration validated: {:?}", self);
        Ok(())
    }
}

/// A named group of logger channels averaged into one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelGroup {
    /// Output column name, e.g. `Panel1_Avg`
    pub name: String,

    /// Channel numbers belonging to the panel
    pub channels: Vec<u32>,
}

/// Temperature logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Readings below this are masked to absent (°C)
    pub lower_threshold: f64,

    /// Readings above this are masked to absent (°C)
    pub upper_threshold: f64,

    /// Channel groups averaged per row
    pub panels: Vec<PanelGroup>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            lower_threshold: 30.0,
            upper_threshold: 85.0,
            panels: vec![
                PanelGroup {
                    name: "Panel1_Avg".to_string(),
                    channels: (1..=5).collect(),
                },
                PanelGroup {
                    name: "Panel2_Avg".to_string(),
                    channels: (11..=15).collect(),
                },
            ],
        }
    }
}

impl LoggerConfig {
    /// Set the accepted temperature band
    pub fn with_thresholds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_threshold = lower;
        self.upper_threshold = upper;
        self
    }

    /// Check the temperature band
    pub fn validate(&self) -> Result<()> {
        require_finite("lower_threshold", self.lower_threshold)?;
        require_finite("upper_threshold", self.upper_threshold)?;
        if self.lower_threshold >= self.upper_threshold {
            return Err(TracerError::configuration(format!(
                "lower_threshold ({}) must be below upper_threshold ({})",
                self.lower_threshold, self.upper_threshold
            )));
        }
        Ok(())
    }

    /// All channel numbers referenced by a panel group
    pub fn all_channels(&self) -> Vec<u32> {
        let mut channels: Vec<u32> = self
            .panels
            .iter()
            .flat_map(|panel| panel.channels.iter().copied())
            .collect();
        channels.sort_unstable();
        channels.dedup();
        channels
    }
}

/// Global configuration for IV curve processing
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracerConfig {
    pub parser: ParserConfig,
    pub analysis: AnalysisConfig,
    pub logger: LoggerConfig,
}

impl TracerConfig {
    /// Replace the parser configuration
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the analysis configuration
    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    /// Replace the logger configuration
    pub fn with_logger(mut self, logger: LoggerConfig) -> Self {
        self.logger = logger;
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if self.parser.missing_value_token.trim().is_empty() {
            return Err(TracerError::configuration(
                "missing_value_token must not be empty",
            ));
        }
        self.analysis.validate()?;
        self.logger.validate()
    }
}

fn require_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TracerError::configuration(format!(
            "{} must be a finite number, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        TracerConfig::default().validate().unwrap();
    }

    #[test]
    fn test_current_unit_factor() {
        assert_eq!(CurrentUnit::Amperes.to_amperes_factor(), 1.0);
        assert_eq!(CurrentUnit::Milliamperes.to_amperes_factor(), 0.001);
    }

    #[test]
    fn test_rejects_inverted_collapse_thresholds() {
        let config = AnalysisConfig::default().with_cleaning(CleaningConfig {
            collapse_high_voltage: 1.0,
            collapse_low_voltage: 10.0,
            ..CleaningConfig::default()
        });
        assert!(matches!(
            config.validate(),
            Err(TracerError::Configuration { .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_percentile() {
        let config = AnalysisConfig::default().with_cleaning(CleaningConfig {
            spike_percentile: 120.0,
            ..CleaningConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_weight() {
        let config = AnalysisConfig::default().with_regions(RegionConfig {
            voc_weight: -0.2,
            ..RegionConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logger_thresholds() {
        assert!(LoggerConfig::default().with_thresholds(80.0, 30.0).validate().is_err());
        assert!(LoggerConfig::default().with_thresholds(30.0, 80.0).validate().is_ok());
    }

    #[test]
    fn test_logger_all_channels() {
        let channels = LoggerConfig::default().all_channels();
        assert_eq!(channels, vec![1, 2, 3, 4, 5, 11, 12, 13, 14, 15]);
    }
}

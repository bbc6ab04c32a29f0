use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::audio::FrequencyBand;

/// Construction parameters for a `PeakDetector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakDetectorConfig {
    pub freq_low: f32,
    pub freq_high: f32,
    /// Absolute floor; energy at or below this never fires.
    pub threshold: f32,
    /// Frames the cutoff is held after a peak before it starts decaying.
    pub frames_per_peak: u32,
}

impl Default for PeakDetectorConfig {
    fn default() -> Self {
        Self {
            freq_low: 40.0,
            freq_high: 20000.0,
            threshold: 0.25,
            frames_per_peak: 5,
        }
    }
}

impl PeakDetectorConfig {
    pub fn with_band(mut self, band: FrequencyBand) -> Self {
        self.freq_low = band.low_hz;
        self.freq_high = band.high_hz;
        self
    }

    pub fn band(&self) -> FrequencyBand {
        FrequencyBand::new(self.freq_low, self.freq_high)
    }

    /// Suspicious values, described. The detector accepts all of them.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.threshold.is_finite() {
            warnings.push(format!("threshold {} is not a finite number", self.threshold));
        } else if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            warnings.push(format!(
                "threshold {} is outside (0, 1]; normalized energy will {}",
                self.threshold,
                if self.threshold > 1.0 { "never fire" } else { "fire on any rising edge" }
            ));
        }
        if !self.freq_low.is_finite() || !self.freq_high.is_finite() {
            warnings.push(format!(
                "band bounds must be finite ({} Hz, {} Hz)",
                self.freq_low, self.freq_high
            ));
        }
        if self.freq_low > self.freq_high {
            warnings.push(format!(
                "band is inverted ({} Hz > {} Hz)",
                self.freq_low, self.freq_high
            ));
        }
        if self.freq_low < 0.0 {
            warnings.push(format!("negative low frequency {} Hz", self.freq_low));
        }

        warnings
    }
}

/// Spectral analyzer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub fft_size: usize,
    /// Per-bin averaging with the previous frame, 0.0 (none) to <1.0.
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.fft_size == 0 || !self.fft_size.is_power_of_two() {
            warnings.push(format!("fft_size {} is not a power of two", self.fft_size));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            warnings.push(format!("smoothing {} is outside [0, 1)", self.smoothing));
        }
        if self.min_decibels >= self.max_decibels {
            warnings.push(format!(
                "decibel range is empty ({} dB >= {} dB)",
                self.min_decibels, self.max_decibels
            ));
        }

        warnings
    }
}

/// Everything an offline scan needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detector: PeakDetectorConfig,
    pub analyzer: AnalyzerConfig,
    /// Detector updates per second of audio, i.e. the render frame rate.
    pub frame_rate: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            detector: PeakDetectorConfig::default(),
            analyzer: AnalyzerConfig::default(),
            frame_rate: 60.0,
        }
    }
}

impl ScanConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.detector.validate();
        warnings.extend(self.analyzer.validate());
        if !(self.frame_rate > 0.0) {
            warnings.push(format!("frame_rate {} must be positive", self.frame_rate));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_clean() {
        assert!(ScanConfig::default().validate().is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "detector": { "threshold": 0.4 }, "frame_rate": 30.0 }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.detector.threshold, 0.4);
        assert_eq!(config.detector.frames_per_peak, 5);
        assert_eq!(config.detector.freq_low, 40.0);
        assert_eq!(config.analyzer, AnalyzerConfig::default());
        assert_eq!(config.frame_rate, 30.0);
    }

    #[test]
    fn test_validate_flags_suspicious_values() {
        let detector = PeakDetectorConfig {
            freq_low: 500.0,
            freq_high: 100.0,
            threshold: 1.5,
            frames_per_peak: 5,
        };
        assert_eq!(detector.validate().len(), 2);

        let analyzer = AnalyzerConfig {
            fft_size: 1000,
            smoothing: 1.0,
            ..AnalyzerConfig::default()
        };
        assert_eq!(analyzer.validate().len(), 2);
    }

    #[test]
    fn test_validate_flags_non_finite_values() {
        let detector = PeakDetectorConfig {
            threshold: f32::NAN,
            ..PeakDetectorConfig::default()
        };
        let warnings = detector.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("finite"));

        let detector = PeakDetectorConfig {
            freq_high: f32::NAN,
            ..PeakDetectorConfig::default()
        };
        assert_eq!(detector.validate().len(), 1);

        let detector = PeakDetectorConfig {
            freq_low: 40.0,
            freq_high: f32::INFINITY,
            threshold: f32::INFINITY,
            frames_per_peak: 5,
        };
        assert_eq!(detector.validate().len(), 2);
    }

    #[test]
    fn test_with_band() {
        let config = PeakDetectorConfig::default().with_band(FrequencyBand::BASS);
        assert_eq!(config.band(), FrequencyBand::BASS);
        assert_eq!(config.threshold, 0.25);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("peak_scan_config_{}.json", std::process::id()));
        let mut config = ScanConfig::default();
        config.detector.frames_per_peak = 12;
        config.analyzer.smoothing = 0.5;

        config.save(&path).unwrap();
        let loaded = ScanConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(ScanConfig::load("/definitely/not/here.json").is_err());
    }
}

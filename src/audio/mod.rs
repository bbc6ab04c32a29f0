pub mod analysis_interface;
pub mod decode;
pub mod fft;
pub mod peak_detector;
pub mod scan;

pub use analysis_interface::BandEnergy;
pub use decode::{decode_file, DecodedAudio};
pub use fft::SpectrumAnalyzer;
pub use peak_detector::PeakDetector;
pub use scan::{PeakEvent, PeakReport, PeakScanner, ScanStatistics};

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A slice of the spectrum, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl FrequencyBand {
    pub const BASS: Self = Self::new(20.0, 140.0);
    pub const LOW_MID: Self = Self::new(140.0, 400.0);
    pub const MID: Self = Self::new(400.0, 2600.0);
    pub const HIGH_MID: Self = Self::new(2600.0, 5200.0);
    pub const TREBLE: Self = Self::new(5200.0, 14000.0);

    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        Self { low_hz, high_hz }
    }

    /// Look up one of the named presets ("bass", "lowMid", "low-mid", ...).
    pub fn named(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "bass" => Some(Self::BASS),
            "lowmid" => Some(Self::LOW_MID),
            "mid" => Some(Self::MID),
            "highmid" => Some(Self::HIGH_MID),
            "treble" => Some(Self::TREBLE),
            "full" => Some(Self::default()),
            _ => None,
        }
    }
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self::new(40.0, 20000.0)
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} Hz", self.low_hz, self.high_hz)
    }
}

impl FromStr for FrequencyBand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(band) = Self::named(s) {
            return Ok(band);
        }

        let (low, high) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("Unknown frequency band '{}' (expected a name or LOW-HIGH)", s))?;

        let low_hz: f32 = low
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid low frequency in band '{}': {}", s, e))?;
        let high_hz: f32 = high
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid high frequency in band '{}': {}", s, e))?;

        if !low_hz.is_finite() || !high_hz.is_finite() {
            bail!("Frequency band '{}' must have finite bounds", s);
        }

        Ok(Self::new(low_hz, high_hz))
    }
}

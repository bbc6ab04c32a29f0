use super::{BandEnergy, FrequencyBand};
use crate::config::PeakDetectorConfig;
use std::fmt;

/// Multiplicative decay applied to the cutoff once the hold window has passed.
pub const DECAY_RATE: f32 = 0.95;

/// A fired peak raises the cutoff to `energy * CUTOFF_MULTIPLIER`.
pub const CUTOFF_MULTIPLIER: f32 = 1.1;

type PeakCallback = Box<dyn FnMut(f32) + Send>;

/// Onset detector over a band-limited energy signal.
///
/// Feed it one energy sample per frame. A peak fires when the sample is above
/// the adaptive cutoff, above the fixed threshold, and higher than the previous
/// sample. Firing raises the cutoff to 110% of the current energy; after
/// `frames_per_peak` quiet frames the cutoff decays by 5% per frame, never
/// dropping below `threshold`.
///
/// `update` must be called exactly once per frame, after the energy source
/// has been refreshed for that frame. Stale input is not an error, it just
/// tends to suppress detection since there is no rising edge.
///
/// # Usage
/// ```rust,no_run
/// use arrvee_peak_detect::audio::PeakDetector;
///
/// let mut detector = PeakDetector::new(20.0, 140.0, 0.3, 10);
/// detector.on_peak(|energy, label: &&str| println!("{} hit at {:.2}", label, energy), "kick");
///
/// for energy in [0.1, 0.6, 0.4] {
///     detector.update(energy);
///     if detector.is_detected() {
///         // flash something
///     }
/// }
/// ```
pub struct PeakDetector {
    band: FrequencyBand,
    threshold: f32,
    frames_per_peak: u32,
    frames_since_last_peak: u32,
    cutoff: f32,
    energy: f32,
    penergy: f32,
    is_detected: bool,
    on_peak: Option<PeakCallback>,
}

impl PeakDetector {
    /// Values are taken as-is; nothing is clamped or rejected.
    pub fn new(freq_low: f32, freq_high: f32, threshold: f32, frames_per_peak: u32) -> Self {
        Self {
            band: FrequencyBand::new(freq_low, freq_high),
            threshold,
            frames_per_peak,
            frames_since_last_peak: 0,
            cutoff: 0.0,
            energy: 0.0,
            penergy: 0.0,
            is_detected: false,
            on_peak: None,
        }
    }

    pub fn from_config(config: &PeakDetectorConfig) -> Self {
        Self::new(
            config.freq_low,
            config.freq_high,
            config.threshold,
            config.frames_per_peak,
        )
    }

    /// Process one frame of band energy. Returns whether a peak fired on this
    /// frame; the same value stays readable through `is_detected`.
    pub fn update(&mut self, energy: f32) -> bool {
        self.energy = energy;

        let rising = self.energy - self.penergy > 0.0;

        if self.energy > self.cutoff && self.energy > self.threshold && rising {
            if let Some(callback) = self.on_peak.as_mut() {
                callback(self.energy);
            }
            self.is_detected = true;
            self.cutoff = self.energy * CUTOFF_MULTIPLIER;
            self.frames_since_last_peak = 0;
        } else {
            self.is_detected = false;
            if self.frames_since_last_peak <= self.frames_per_peak {
                self.frames_since_last_peak += 1;
            } else {
                self.cutoff = (self.cutoff * DECAY_RATE).max(self.threshold);
            }
        }

        self.penergy = self.energy;
        self.is_detected
    }

    /// Pull this detector's band from `source` and process it as one frame.
    pub fn update_from<S: BandEnergy + ?Sized>(&mut self, source: &S) -> bool {
        let energy = source.band_energy(self.band.low_hz, self.band.high_hz);
        self.update(energy)
    }

    /// Register the observer called on every fired peak with the current
    /// energy and `payload`. Replaces any previous observer.
    pub fn on_peak<F, P>(&mut self, mut callback: F, payload: P)
    where
        F: FnMut(f32, &P) + Send + 'static,
        P: Send + 'static,
    {
        self.on_peak = Some(Box::new(move |energy| callback(energy, &payload)));
    }

    /// Same as `on_peak` for observers that don't need a payload.
    pub fn on_peak_fn<F>(&mut self, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.on_peak = Some(Box::new(callback));
    }

    pub fn clear_on_peak(&mut self) {
        self.on_peak = None;
    }

    pub fn has_observer(&self) -> bool {
        self.on_peak.is_some()
    }

    /// Forget all per-frame state. Configuration and the observer are kept.
    pub fn reset(&mut self) {
        self.frames_since_last_peak = 0;
        self.cutoff = 0.0;
        self.energy = 0.0;
        self.penergy = 0.0;
        self.is_detected = false;
    }

    pub fn is_detected(&self) -> bool {
        self.is_detected
    }

    /// Energy seen on the most recent frame.
    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Energy seen on the frame before the current one. Equal to `energy`
    /// between updates.
    pub fn previous_energy(&self) -> f32 {
        self.penergy
    }

    /// Current adaptive cutoff.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn frames_per_peak(&self) -> u32 {
        self.frames_per_peak
    }

    pub fn frames_since_last_peak(&self) -> u32 {
        self.frames_since_last_peak
    }

    pub fn band(&self) -> FrequencyBand {
        self.band
    }

    pub fn freq_low(&self) -> f32 {
        self.band.low_hz
    }

    pub fn freq_high(&self) -> f32 {
        self.band.high_hz
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::from_config(&PeakDetectorConfig::default())
    }
}

impl fmt::Debug for PeakDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeakDetector")
            .field("band", &self.band)
            .field("threshold", &self.threshold)
            .field("frames_per_peak", &self.frames_per_peak)
            .field("frames_since_last_peak", &self.frames_since_last_peak)
            .field("cutoff", &self.cutoff)
            .field("energy", &self.energy)
            .field("penergy", &self.penergy)
            .field("is_detected", &self.is_detected)
            .field("on_peak", &self.on_peak.is_some())
            .finish()
    }
}

/// Source of band-limited energy for the current frame.
///
/// This is the only thing the peak detector needs from a spectral analyzer:
/// the normalized (0.0-1.0) energy between two frequencies for the frame that
/// was most recently analyzed. Callers refresh the analyzer first, then ask.
///
/// # Implementations
/// - `SpectrumAnalyzer`: FFT-based analyzer over a mono sample buffer
/// - any `Fn(f32, f32) -> f32`, handy for synthetic energy in tests
///
/// ```rust,no_run
/// use arrvee_peak_detect::audio::{BandEnergy, PeakDetector};
///
/// let mut detector = PeakDetector::default();
/// let flat = |_low: f32, _high: f32| 0.5;
/// detector.update_from(&flat);
/// assert_eq!(flat.band_energy(40.0, 20000.0), 0.5);
/// ```
pub trait BandEnergy {
    /// Normalized energy in `[low_hz, high_hz]` for the current frame.
    fn band_energy(&self, low_hz: f32, high_hz: f32) -> f32;
}

impl<F> BandEnergy for F
where
    F: Fn(f32, f32) -> f32,
{
    fn band_energy(&self, low_hz: f32, high_hz: f32) -> f32 {
        self(low_hz, high_hz)
    }
}

use rustfft::{FftPlanner, num_complex::Complex};
use super::BandEnergy;
use crate::config::AnalyzerConfig;

/// FFT analyzer producing a normalized (0.0-1.0) spectrum per frame.
///
/// Each call to `analyze` windows the most recent `fft_size` samples, smooths
/// bin magnitudes against the previous frame, converts them to decibels and
/// maps `[min_decibels, max_decibels]` onto `[0, 1]`. Band energy is the mean
/// of the normalized bins covering the requested frequencies.
pub struct SpectrumAnalyzer {
    sample_rate: f32,
    fft_size: usize,
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,

    // Smoothed linear magnitudes, carried between frames
    magnitudes: Vec<f32>,
    // Normalized 0.0-1.0 per bin for the last analyzed frame
    spectrum: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: f32, fft_size: usize) -> Self {
        Self::with_config(
            sample_rate,
            &AnalyzerConfig {
                fft_size,
                ..AnalyzerConfig::default()
            },
        )
    }

    pub fn with_config(sample_rate: f32, config: &AnalyzerConfig) -> Self {
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window = Self::hann_window(fft_size);
        let bins = fft_size / 2;

        Self {
            sample_rate,
            fft_size,
            fft,
            window,
            smoothing: config.smoothing,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            magnitudes: vec![0.0; bins],
            spectrum: vec![0.0; bins],
        }
    }

    fn hann_window(size: usize) -> Vec<f32> {
        if size < 2 {
            return vec![1.0; size];
        }
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect()
    }

    /// Refresh the spectrum from the tail of `audio_data` (mono, -1.0..1.0).
    /// Short input is zero-padded at the front.
    pub fn analyze(&mut self, audio_data: &[f32]) -> &[f32] {
        let windowed_data = self.apply_window(audio_data);
        let raw = self.compute_fft(&windowed_data);

        let range = self.max_decibels - self.min_decibels;
        for ((smoothed, normalized), magnitude) in self
            .magnitudes
            .iter_mut()
            .zip(self.spectrum.iter_mut())
            .zip(raw)
        {
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;

            let db = 20.0 * smoothed.log10();
            *normalized = ((db - self.min_decibels) / range).clamp(0.0, 1.0);
        }

        &self.spectrum
    }

    fn apply_window(&self, audio_data: &[f32]) -> Vec<f32> {
        let len = self.fft_size.min(audio_data.len());
        let tail = &audio_data[audio_data.len() - len..];
        let pad = self.fft_size - len;

        (0..self.fft_size)
            .map(|i| if i < pad { 0.0 } else { tail[i - pad] * self.window[i] })
            .collect()
    }

    fn compute_fft(&self, windowed_data: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = windowed_data
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        buffer[..self.fft_size / 2]
            .iter()
            .map(|c| c.norm() / self.fft_size as f32)
            .collect()
    }

    fn bin_index(&self, freq: f32) -> usize {
        let nyquist = self.sample_rate / 2.0;
        let bins = self.spectrum.len();
        let index = (freq / nyquist * bins as f32).round();

        if index.is_nan() || index < 0.0 {
            0
        } else {
            (index as usize).min(bins.saturating_sub(1))
        }
    }

    /// Mean normalized energy over `[freq1, freq2]` (order doesn't matter).
    pub fn energy(&self, freq1: f32, freq2: f32) -> f32 {
        if self.spectrum.is_empty() {
            return 0.0;
        }

        // NaN maps to bin 0, so order after mapping
        let (a, b) = (self.bin_index(freq1), self.bin_index(freq2));
        let bins = &self.spectrum[a.min(b)..=a.max(b)];
        bins.iter().sum::<f32>() / bins.len() as f32
    }

    /// Normalized energy of the single bin containing `freq`.
    pub fn energy_at(&self, freq: f32) -> f32 {
        self.spectrum
            .get(self.bin_index(freq))
            .copied()
            .unwrap_or(0.0)
    }

    /// Normalized spectrum of the last analyzed frame.
    pub fn spectrum(&self) -> &[f32] {
        &self.spectrum
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_width(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }
}

impl BandEnergy for SpectrumAnalyzer {
    fn band_energy(&self, low_hz: f32, high_hz: f32) -> f32 {
        self.energy(low_hz, high_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn unsmoothed(fft_size: usize) -> SpectrumAnalyzer {
        SpectrumAnalyzer::with_config(
            SAMPLE_RATE,
            &AnalyzerConfig {
                fft_size,
                smoothing: 0.0,
                ..AnalyzerConfig::default()
            },
        )
    }

    #[test]
    fn test_silence_is_zero() {
        let mut analyzer = unsmoothed(1024);
        analyzer.analyze(&vec![0.0; 1024]);
        assert!(analyzer.spectrum().iter().all(|&v| v == 0.0));
        assert_eq!(analyzer.energy(40.0, 20000.0), 0.0);
    }

    #[test]
    fn test_tone_lands_in_its_band() {
        let mut analyzer = unsmoothed(1024);
        analyzer.analyze(&sine(100.0, 0.8, 1024));

        let low = analyzer.energy(40.0, 200.0);
        let high = analyzer.energy(5000.0, 10000.0);
        assert!(low > 0.5, "low band energy {}", low);
        assert!(high < 0.1, "high band energy {}", high);
        assert!(analyzer.energy_at(100.0) > 0.9);
    }

    #[test]
    fn test_energy_swaps_reversed_bounds() {
        let mut analyzer = unsmoothed(1024);
        analyzer.analyze(&sine(1000.0, 0.5, 1024));
        assert_eq!(analyzer.energy(800.0, 1200.0), analyzer.energy(1200.0, 800.0));
    }

    #[test]
    fn test_nan_band_edge_does_not_panic() {
        let mut analyzer = unsmoothed(1024);
        analyzer.analyze(&sine(1000.0, 0.5, 1024));

        let forward = analyzer.energy(500.0, f32::NAN);
        let reversed = analyzer.energy(f32::NAN, 500.0);
        assert_eq!(forward, reversed);
        assert_eq!(forward, analyzer.energy(0.0, 500.0));
        assert_eq!(analyzer.energy(f32::NAN, f32::NAN), analyzer.spectrum()[0]);
    }

    #[test]
    fn test_out_of_range_frequencies_clamp() {
        let mut analyzer = unsmoothed(512);
        analyzer.analyze(&sine(1000.0, 0.5, 512));

        let last = *analyzer.spectrum().last().unwrap();
        assert_eq!(analyzer.energy_at(96000.0), last);
        assert_eq!(analyzer.energy_at(-10.0), analyzer.spectrum()[0]);
    }

    #[test]
    fn test_smoothing_carries_previous_frame() {
        let mut smoothed = SpectrumAnalyzer::new(SAMPLE_RATE, 1024);
        let mut raw = unsmoothed(1024);
        let tone = sine(200.0, 0.01, 1024);

        smoothed.analyze(&tone);
        raw.analyze(&tone);
        let first = smoothed.energy_at(200.0);
        assert!(first < raw.energy_at(200.0));

        // the tone stops but smoothing keeps some of it around
        smoothed.analyze(&vec![0.0; 1024]);
        let after = smoothed.energy_at(200.0);
        assert!(after > 0.0 && after < first);
    }

    #[test]
    fn test_short_input_is_padded() {
        let mut analyzer = unsmoothed(1024);
        let spectrum = analyzer.analyze(&sine(440.0, 0.5, 300));
        assert_eq!(spectrum.len(), 512);
        assert!(analyzer.energy(300.0, 600.0) > 0.0);
    }

    #[test]
    fn test_implements_band_energy() {
        let mut analyzer = unsmoothed(1024);
        analyzer.analyze(&sine(100.0, 0.8, 1024));
        let source: &dyn BandEnergy = &analyzer;
        assert_eq!(source.band_energy(40.0, 200.0), analyzer.energy(40.0, 200.0));
    }
}

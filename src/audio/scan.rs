use anyhow::{bail, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{FrequencyBand, PeakDetector, SpectrumAnalyzer};
use crate::config::ScanConfig;

/// One fired peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakEvent {
    pub frame: usize,
    /// Seconds from the start of the audio to the end of the analyzed window
    pub timestamp: f32,
    pub energy: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub duration_seconds: f32,
    pub sample_rate: u32,
    pub total_samples: usize,
    pub frame_rate: f32,
    pub fft_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub total_frames: usize,
    pub total_peaks: usize,
    pub peaks_per_minute: f32,
    pub mean_energy: f32,
    pub max_energy: f32,
    /// None with fewer than two peaks
    pub mean_peak_interval: Option<f32>,
}

/// Result of scanning a whole buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakReport {
    pub file_info: FileInfo,
    pub band: FrequencyBand,
    pub config: ScanConfig,
    pub peaks: Vec<PeakEvent>,
    pub statistics: ScanStatistics,
}

impl PeakReport {
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Where the scan loop currently is; shared with the peak observer.
#[derive(Default)]
struct FrameClock {
    frame: AtomicUsize,
    /// Sample index one past the end of the frame's window
    position: AtomicUsize,
}

impl FrameClock {
    fn set(&self, frame: usize, position: usize) {
        self.frame.store(frame, Ordering::Relaxed);
        self.position.store(position, Ordering::Relaxed);
    }

    fn get(&self) -> (usize, usize) {
        (
            self.frame.load(Ordering::Relaxed),
            self.position.load(Ordering::Relaxed),
        )
    }
}

/// Runs the analyzer and detector over decoded audio one render frame at a
/// time, the same way a visualizer loop would call them live.
pub struct PeakScanner {
    config: ScanConfig,
}

impl PeakScanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let fft_size = config.analyzer.fft_size;
        if fft_size == 0 || !fft_size.is_power_of_two() {
            bail!("FFT size must be a non-zero power of two, got {}", fft_size);
        }
        if !(config.frame_rate > 0.0) {
            bail!("Frame rate must be positive, got {}", config.frame_rate);
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Samples between two detector updates.
    pub fn hop_size(&self, sample_rate: u32) -> usize {
        ((sample_rate as f32 / self.config.frame_rate).round() as usize).max(1)
    }

    pub fn scan(&self, filename: &str, samples: &[f32], sample_rate: u32) -> Result<PeakReport> {
        if sample_rate == 0 {
            bail!("Sample rate must be non-zero");
        }

        let hop = self.hop_size(sample_rate);
        let fft_size = self.config.analyzer.fft_size;
        let mut analyzer = SpectrumAnalyzer::with_config(sample_rate as f32, &self.config.analyzer);
        let mut detector = PeakDetector::from_config(&self.config.detector);

        // Observer payload is the frame clock, advanced by the loop below
        let frame_clock = Arc::new(FrameClock::default());
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        detector.on_peak(
            move |energy, clock: &Arc<FrameClock>| {
                let (frame, position) = clock.get();
                if let Ok(mut events) = sink.lock() {
                    events.push((frame, position, energy));
                }
            },
            Arc::clone(&frame_clock),
        );

        info!(
            "Scanning {} samples at {} Hz: band {}, hop {} samples, FFT {}",
            samples.len(),
            sample_rate,
            detector.band(),
            hop,
            fft_size
        );

        let mut total_frames = 0usize;
        let mut energy_sum = 0.0f64;
        let mut max_energy = 0.0f32;

        let mut position = hop.min(samples.len());
        while position > 0 {
            frame_clock.set(total_frames, position);

            let start = position.saturating_sub(fft_size);
            analyzer.analyze(&samples[start..position]);

            if detector.update_from(&analyzer) {
                debug!(
                    "Peak at frame {} ({:.3}s), energy {:.3}, cutoff now {:.3}",
                    total_frames,
                    position as f32 / sample_rate as f32,
                    detector.energy(),
                    detector.cutoff()
                );
            }

            energy_sum += detector.energy() as f64;
            max_energy = max_energy.max(detector.energy());
            total_frames += 1;

            if position == samples.len() {
                break;
            }
            position = (position + hop).min(samples.len());
        }

        let peaks: Vec<PeakEvent> = fired
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
            .into_iter()
            .map(|(frame, position, energy)| PeakEvent {
                frame,
                timestamp: position as f32 / sample_rate as f32,
                energy,
            })
            .collect();

        let duration_seconds = samples.len() as f32 / sample_rate as f32;
        let statistics = Self::statistics(&peaks, total_frames, duration_seconds, energy_sum, max_energy);

        info!(
            "Scan complete: {} frames, {} peaks ({:.1} per minute)",
            statistics.total_frames, statistics.total_peaks, statistics.peaks_per_minute
        );

        Ok(PeakReport {
            file_info: FileInfo {
                filename: filename.to_string(),
                duration_seconds,
                sample_rate,
                total_samples: samples.len(),
                frame_rate: self.config.frame_rate,
                fft_size,
            },
            band: detector.band(),
            config: self.config.clone(),
            peaks,
            statistics,
        })
    }

    fn statistics(
        peaks: &[PeakEvent],
        total_frames: usize,
        duration_seconds: f32,
        energy_sum: f64,
        max_energy: f32,
    ) -> ScanStatistics {
        let mean_energy = if total_frames > 0 {
            (energy_sum / total_frames as f64) as f32
        } else {
            0.0
        };

        let peaks_per_minute = if duration_seconds > 0.0 {
            peaks.len() as f32 * 60.0 / duration_seconds
        } else {
            0.0
        };

        let mean_peak_interval = if peaks.len() >= 2 {
            let span = peaks[peaks.len() - 1].timestamp - peaks[0].timestamp;
            Some(span / (peaks.len() - 1) as f32)
        } else {
            None
        };

        ScanStatistics {
            total_frames,
            total_peaks: peaks.len(),
            peaks_per_minute,
            mean_energy,
            max_energy,
            mean_peak_interval,
        }
    }
}

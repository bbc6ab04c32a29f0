use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use arrvee_peak_detect::audio::{decode_file, FrequencyBand, PeakScanner};
use arrvee_peak_detect::config::ScanConfig;

#[derive(Parser)]
#[command(name = "peak-scan")]
#[command(about = "Detect rhythmic peaks in a frequency band of an audio file")]
struct Args {
    /// Audio file to scan (MP3, WAV, M4A, OGG, etc.)
    #[arg()]
    input_file: String,

    /// Band to listen to: bass, low-mid, mid, high-mid, treble, full, or LOW-HIGH in Hz
    #[arg(short, long)]
    band: Option<FrequencyBand>,

    /// Energy floor (0.0-1.0) below which no peak fires
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Frames the cutoff is held after a peak before decaying
    #[arg(long)]
    frames_per_peak: Option<u32>,

    /// FFT size (power of two)
    #[arg(long)]
    fft_size: Option<usize>,

    /// Detector updates per second
    #[arg(long)]
    frame_rate: Option<f32>,

    /// Spectrum smoothing between frames, 0.0 to <1.0
    #[arg(long)]
    smoothing: Option<f32>,

    /// JSON config file; flags above override it
    #[arg(short, long)]
    config: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

impl Args {
    fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config from {}", path);
                ScanConfig::load(path)?
            }
            None => ScanConfig::default(),
        };

        if let Some(band) = self.band {
            config.detector = config.detector.with_band(band);
        }
        if let Some(threshold) = self.threshold {
            config.detector.threshold = threshold;
        }
        if let Some(frames_per_peak) = self.frames_per_peak {
            config.detector.frames_per_peak = frames_per_peak;
        }
        if let Some(fft_size) = self.fft_size {
            config.analyzer.fft_size = fft_size;
        }
        if let Some(frame_rate) = self.frame_rate {
            config.frame_rate = frame_rate;
        }
        if let Some(smoothing) = self.smoothing {
            config.analyzer.smoothing = smoothing;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Arrvee Peak Scan");
    info!("Input file: {}", args.input_file);

    let config = args.scan_config()?;
    for warning in config.validate() {
        warn!("Config: {}", warning);
    }
    info!(
        "Band: {}, threshold {}, {} frames per peak, {} fps",
        config.detector.band(),
        config.detector.threshold,
        config.detector.frames_per_peak,
        config.frame_rate
    );

    let audio = decode_file(&args.input_file)?;
    let scanner = PeakScanner::new(config)?;
    let report = scanner.scan(&args.input_file, &audio.samples, audio.sample_rate)?;

    info!("\n=== PEAK SCAN RESULTS ===");
    info!("Duration: {:.2} seconds", report.file_info.duration_seconds);
    info!("Frames: {}", report.statistics.total_frames);
    info!("Peaks: {}", report.statistics.total_peaks);
    info!("Peaks per minute: {:.1}", report.statistics.peaks_per_minute);
    info!(
        "Band energy: mean {:.3}, max {:.3}",
        report.statistics.mean_energy, report.statistics.max_energy
    );
    if let Some(interval) = report.statistics.mean_peak_interval {
        info!("Mean peak interval: {:.3}s", interval);
    }

    match &args.output {
        Some(path) => {
            report.save_json(path)?;
            let size = std::fs::metadata(path)?.len();
            info!("Report saved to {} ({:.1} KB)", path, size as f64 / 1024.0);
        }
        None => println!("{}", report.to_json()?),
    }

    Ok(())
}

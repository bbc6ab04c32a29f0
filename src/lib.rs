//! Adaptive onset ("peak") detection over band-limited audio energy.
//!
//! `audio::PeakDetector` is the core: feed it one normalized energy value per
//! frame and it reports debounced peaks. `audio::SpectrumAnalyzer` supplies
//! that energy from raw samples, and `audio::PeakScanner` runs both over a
//! whole file.

pub mod audio;
pub mod config;

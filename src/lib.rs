// Spectral Cut - noise-adaptive spectral cutting
// Spectrum loading, noise-floor estimation, linewidth bounds and window cutting

// Module declarations
pub mod analysis;
pub mod config;
pub mod cutting;
pub mod error;
pub mod spectrum;
pub mod synth;

// Re-exports for convenience
pub use analysis::{estimate_noise, find_linewidth_bounds, find_peaks, resample};
pub use cutting::{cut_spectrum, CutMode, CutReport, CutWindow, SpectralCutter};
pub use error::{ErrorCode, SpectrumError};
pub use spectrum::transform::{transform, TransformParams};
pub use spectrum::{Spectrum, SpectrumPoint};

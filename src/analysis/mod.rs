// Analysis module - spectral analysis primitives for the cutting pipeline
//
// Pipeline used by the noise-adaptive cutter:
// resample (spline, fine grid) → peaks (seed threshold) → linewidth
// (walk down to the reference level) → noise (valley statistics)
//
// Every stage is a pure function of its inputs; nothing here mutates a
// spectrum.

pub mod linewidth;
pub mod noise;
pub mod peaks;
pub mod resample;

pub use linewidth::{find_linewidth_bounds, LinewidthBounds, LinewidthScan};
pub use noise::{estimate_noise, NoiseEstimate, NoiseEstimator, SweepPoint};
pub use peaks::{find_peaks, nearest_peak, Peak, PeakDetector};
pub use resample::{resample, CubicSpline};

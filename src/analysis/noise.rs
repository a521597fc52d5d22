// Noise module - baseline noise-floor estimation from inter-peak valleys
//
// Algorithm:
// 1. Spline-resample the spectrum to a fine resolution
// 2. Peak-pick the resampled spectrum with the seed threshold as cutoff
// 3. For each consecutive peak pair, take the right linewidth bound of the
//    first and the left bound of the second (seed as noise level). If the
//    left bound lies at a higher frequency than the right bound, the gap is a
//    genuine valley and the original samples inside it join the pool.
//    Collapsed or inverted gaps (closely spaced peaks) are skipped.
// 4. level = sqrt(2) * sqrt(mean^2 + std^2) over the pool
//
// The level combines magnitude and dispersion of the baseline; both terms
// are kept. An empty pool is reported as InsufficientPeaks, never NaN.

use serde::Serialize;

use crate::analysis::linewidth::LinewidthScan;
use crate::analysis::peaks::PeakDetector;
use crate::analysis::resample::resample;
use crate::error::{ErrorCode, SpectrumError};
use crate::spectrum::Spectrum;

/// Default spline resolution for the estimator's resampling step
pub const DEFAULT_RESAMPLE_RESOLUTION: f64 = 0.002;

/// Noise-floor estimate with the pooled statistics behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseEstimate {
    /// sqrt(2) * sqrt(mean^2 + std_dev^2)
    pub level: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Number of pooled baseline samples
    pub sample_count: usize,
    /// Peaks found on the resampled spectrum
    pub peak_count: usize,
    /// Valleys that contributed samples
    pub valley_count: usize,
}

/// One row of a seed sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub seed: f64,
    pub level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Noise-floor estimator
///
/// Stateless apart from its resampling resolution; every call recomputes the
/// estimate from scratch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEstimator {
    resample_resolution: f64,
}

impl Default for NoiseEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_RESAMPLE_RESOLUTION)
    }
}

impl NoiseEstimator {
    pub fn new(resample_resolution: f64) -> Self {
        Self {
            resample_resolution,
        }
    }

    pub fn resample_resolution(&self) -> f64 {
        self.resample_resolution
    }

    /// Estimate the noise floor of `spectrum` starting from `seed_threshold`
    ///
    /// # Arguments
    /// * `spectrum` - Original spectrum (its samples feed the statistics)
    /// * `seed_threshold` - Peak cutoff and linewidth reference level
    ///
    /// # Errors
    /// * `EmptySpectrum` for an empty spectrum
    /// * `InvalidInput` for a bad seed or resolution, or too few points
    /// * `InsufficientPeaks` when no valley yields baseline samples
    pub fn estimate(
        &self,
        spectrum: &Spectrum,
        seed_threshold: f64,
    ) -> Result<NoiseEstimate, SpectrumError> {
        if spectrum.is_empty() {
            return Err(SpectrumError::EmptySpectrum);
        }
        if !(seed_threshold.is_finite() && seed_threshold >= 0.0) {
            return Err(SpectrumError::invalid(format!(
                "seed threshold must be a non-negative number (got {})",
                seed_threshold
            )));
        }

        let resampled = resample(spectrum, self.resample_resolution)?;
        let peaks = PeakDetector::new(seed_threshold).detect(&resampled);
        let scan = LinewidthScan::new(resampled.intensities(), seed_threshold);
        let dense_freqs = resampled.frequencies();
        let original = spectrum.intensities();

        let mut pool: Vec<f64> = Vec::new();
        let mut valley_count = 0;
        for pair in peaks.windows(2) {
            let (Some(left), Some(right)) = (scan.bounds(pair[0].index), scan.bounds(pair[1].index))
            else {
                continue;
            };
            let valley_start = dense_freqs[left.high];
            let valley_end = dense_freqs[right.low];
            if !(valley_end > valley_start) {
                tracing::trace!(
                    "[NoiseEstimator] Skipping collapsed valley between {} and {}",
                    pair[0].frequency,
                    pair[1].frequency
                );
                continue;
            }

            // Map the dense-grid valley back onto the original samples
            let start = spectrum.index_at_or_after(valley_start);
            let end = spectrum.index_at_or_after(valley_end);
            if end > start {
                valley_count += 1;
                pool.extend_from_slice(&original[start..end]);
            }
        }

        tracing::debug!(
            "[NoiseEstimator] seed={} peaks={} valleys={} pooled={}",
            seed_threshold,
            peaks.len(),
            valley_count,
            pool.len()
        );

        if pool.is_empty() {
            return Err(SpectrumError::InsufficientPeaks {
                peaks: peaks.len(),
                valleys: valley_count,
            });
        }

        let (mean, std_dev) = mean_and_std(&pool);
        Ok(NoiseEstimate {
            level: std::f64::consts::SQRT_2 * (mean * mean + std_dev * std_dev).sqrt(),
            mean,
            std_dev,
            sample_count: pool.len(),
            peak_count: peaks.len(),
            valley_count,
        })
    }

    /// Run the estimator for each seed guess
    ///
    /// Failures are recorded per row instead of aborting the sweep.
    pub fn sweep(&self, spectrum: &Spectrum, seeds: &[f64]) -> Vec<SweepPoint> {
        seeds
            .iter()
            .map(|&seed| match self.estimate(spectrum, seed) {
                Ok(estimate) => SweepPoint {
                    seed,
                    level: Some(estimate.level),
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(
                        "[NoiseEstimator] Sweep seed {} failed (code {}): {}",
                        seed,
                        err.code(),
                        err.message()
                    );
                    SweepPoint {
                        seed,
                        level: None,
                        error: Some(err.message()),
                    }
                }
            })
            .collect()
    }
}

/// Estimate the noise floor, returning only the level
pub fn estimate_noise(
    spectrum: &Spectrum,
    seed_threshold: f64,
    resample_resolution: f64,
) -> Result<f64, SpectrumError> {
    NoiseEstimator::new(resample_resolution)
        .estimate(spectrum, seed_threshold)
        .map(|estimate| estimate.level)
}

/// `steps` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps - 1) as f64;
            (0..steps).map(|i| start + i as f64 * step).collect()
        }
    }
}

/// Mean and population standard deviation
fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

// Noise-adaptive cut windows
//
// One whole-spectrum noise estimate, then per cut frequency: nearest peak
// above the noise floor, linewidth bounds at the noise floor, closed window
// [low, high].

use crate::analysis::linewidth::LinewidthScan;
use crate::analysis::noise::{NoiseEstimate, NoiseEstimator};
use crate::analysis::peaks::{nearest_peak, PeakDetector};
use crate::cutting::CutWindow;
use crate::error::SpectrumError;
use crate::spectrum::Spectrum;

/// Windows for every target plus the noise estimate they were sized with
pub(crate) fn adaptive_windows(
    spectrum: &Spectrum,
    targets: &[f64],
    seed_threshold: f64,
    resample_resolution: f64,
) -> Result<(Vec<CutWindow>, NoiseEstimate), SpectrumError> {
    let noise = NoiseEstimator::new(resample_resolution).estimate(spectrum, seed_threshold)?;

    let peaks = PeakDetector::new(noise.level).detect(spectrum);
    if peaks.is_empty() {
        tracing::warn!(
            "[SpectralCutter] No peaks above noise floor {:.6}",
            noise.level
        );
        return Err(SpectrumError::InsufficientPeaks {
            peaks: 0,
            valleys: noise.valley_count,
        });
    }

    let scan = LinewidthScan::new(spectrum.intensities(), noise.level);
    let mut windows = Vec::with_capacity(targets.len());
    for &target in targets {
        let Some(peak) = nearest_peak(&peaks, target) else {
            continue;
        };
        let Some(bounds) = scan.bounds(peak.index) else {
            continue;
        };
        tracing::debug!(
            "[SpectralCutter] target={} peak={} bounds=[{}, {}]",
            target,
            peak.frequency,
            bounds.low,
            bounds.high
        );
        windows.push(CutWindow {
            target,
            start: bounds.low,
            end: bounds.high + 1,
        });
    }

    Ok((windows, noise))
}

// Peaks module - local-maximum detection above intensity thresholds
//
// A sample is a peak when it is interior, >= both neighbours, strictly above
// the minimum threshold and, when an upper threshold is set, strictly below
// it. Plateaus emit every qualifying sample; no deduplication.

use serde::Serialize;

use crate::spectrum::Spectrum;

/// Detected local maximum
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub frequency: f64,
    pub intensity: f64,
    /// Index into the spectrum the peak was detected on
    pub index: usize,
}

/// Threshold-bounded peak picker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDetector {
    threshold_min: f64,
    threshold_max: Option<f64>,
}

impl PeakDetector {
    /// Detector with a minimum intensity cutoff and no upper bound
    pub fn new(threshold_min: f64) -> Self {
        Self {
            threshold_min,
            threshold_max: None,
        }
    }

    /// Add an upper intensity cutoff; `0` keeps the detector unbounded
    pub fn with_max(mut self, threshold_max: f64) -> Self {
        self.threshold_max = (threshold_max != 0.0).then_some(threshold_max);
        self
    }

    pub fn threshold_min(&self) -> f64 {
        self.threshold_min
    }

    pub fn threshold_max(&self) -> Option<f64> {
        self.threshold_max
    }

    /// Scan `spectrum` for peaks in ascending index order
    pub fn detect(&self, spectrum: &Spectrum) -> Vec<Peak> {
        let freqs = spectrum.frequencies();
        let values = spectrum.intensities();
        if values.len() < 3 {
            return Vec::new();
        }

        (1..values.len() - 1)
            .filter(|&i| {
                let v = values[i];
                v >= values[i - 1]
                    && v >= values[i + 1]
                    && v > self.threshold_min
                    && self.threshold_max.map_or(true, |max| v < max)
            })
            .map(|i| Peak {
                frequency: freqs[i],
                intensity: values[i],
                index: i,
            })
            .collect()
    }
}

/// Find peaks above `threshold_min` (and below `threshold_max` when given)
///
/// `None` or `Some(0.0)` for the upper threshold means unbounded.
pub fn find_peaks(spectrum: &Spectrum, threshold_min: f64, threshold_max: Option<f64>) -> Vec<Peak> {
    let detector = match threshold_max {
        Some(max) => PeakDetector::new(threshold_min).with_max(max),
        None => PeakDetector::new(threshold_min),
    };
    detector.detect(spectrum)
}

/// Peak closest in frequency to `frequency` (first one wins on ties)
pub fn nearest_peak(peaks: &[Peak], frequency: f64) -> Option<&Peak> {
    peaks.iter().reduce(|best, peak| {
        if (peak.frequency - frequency).abs() < (best.frequency - frequency).abs() {
            peak
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(values: &[f64]) -> Spectrum {
        let freqs = (0..values.len()).map(|i| 10.0 + i as f64 * 0.5).collect();
        Spectrum::from_columns(freqs, values.to_vec()).unwrap()
    }

    #[test]
    fn test_detects_interior_maxima_above_threshold() {
        let s = spectrum(&[5.0, 1.0, 3.0, 1.0, 0.5, 2.0, 0.1, 9.0]);
        let peaks = find_peaks(&s, 1.0, None);

        let indices: Vec<usize> = peaks.iter().map(|p| p.index).collect();
        // first/last samples are never peaks even when they are maxima
        assert_eq!(indices, vec![2, 5]);
        assert_eq!(peaks[0].frequency, 11.0);
        assert_eq!(peaks[1].intensity, 2.0);
    }

    #[test]
    fn test_min_threshold_is_strict() {
        let s = spectrum(&[0.0, 1.0, 0.0, 2.0, 0.0]);
        let indices: Vec<usize> = find_peaks(&s, 1.0, None).iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![3]);
    }

    #[test]
    fn test_upper_threshold() {
        let s = spectrum(&[0.0, 1.5, 0.0, 5.0, 0.0, 3.0, 0.0]);
        let indices: Vec<usize> = find_peaks(&s, 1.0, Some(4.0))
            .iter()
            .map(|p| p.index)
            .collect();
        assert_eq!(indices, vec![1, 5]);

        // zero upper threshold means no upper bound
        assert_eq!(find_peaks(&s, 1.0, Some(0.0)).len(), 3);
    }

    #[test]
    fn test_plateau_emits_each_sample() {
        let s = spectrum(&[0.0, 2.0, 2.0, 2.0, 0.0]);
        let indices: Vec<usize> = find_peaks(&s, 1.0, None).iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_short_spectrum_has_no_peaks() {
        assert!(find_peaks(&spectrum(&[1.0, 5.0]), 0.0, None).is_empty());
        assert!(find_peaks(&Spectrum::default(), 0.0, None).is_empty());
    }

    #[test]
    fn test_nearest_peak() {
        let s = spectrum(&[0.0, 3.0, 0.0, 0.0, 4.0, 0.0]);
        let peaks = find_peaks(&s, 1.0, None);
        assert_eq!(nearest_peak(&peaks, 10.4).map(|p| p.index), Some(1));
        assert_eq!(nearest_peak(&peaks, 11.9).map(|p| p.index), Some(4));
        assert!(nearest_peak(&[], 11.0).is_none());
    }
}

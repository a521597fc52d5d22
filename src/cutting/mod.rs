// SpectralCutter - zero intensity around target frequencies
//
// Module organization:
// - fixed: caller-supplied window width, floor arithmetic on the grid
// - adaptive: window sized by the noise floor and the nearest peak's linewidth
// - mod.rs: Coordinator (SpectralCutter, CutMode, CutReport)
//
// All windows are computed before any sample is zeroed and are applied as a
// union mask, so overlapping cuts compose and one cut never reshapes another.

mod adaptive;
mod fixed;

use serde::{Deserialize, Serialize};

use crate::analysis::noise::{NoiseEstimate, DEFAULT_RESAMPLE_RESOLUTION};
use crate::error::SpectrumError;
use crate::spectrum::Spectrum;

/// How cut windows are sized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CutMode {
    /// Fixed frequency width centred on each cut
    Fixed { width: f64 },
    /// Width follows the nearest peak down to the estimated noise floor
    NoiseAdaptive {
        seed_threshold: f64,
        #[serde(default = "default_resample_resolution")]
        resample_resolution: f64,
    },
}

fn default_resample_resolution() -> f64 {
    DEFAULT_RESAMPLE_RESOLUTION
}

impl CutMode {
    pub fn fixed(width: f64) -> Self {
        CutMode::Fixed { width }
    }

    /// Adaptive mode with the default resampling resolution
    pub fn noise_adaptive(seed_threshold: f64) -> Self {
        CutMode::NoiseAdaptive {
            seed_threshold,
            resample_resolution: DEFAULT_RESAMPLE_RESOLUTION,
        }
    }
}

/// Half-open index range `[start, end)` zeroed for one cut frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CutWindow {
    #[serde(rename = "target_frequency")]
    pub target: f64,
    pub start: usize,
    pub end: usize,
}

impl CutWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Outcome of a cut
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutReport {
    pub windows: Vec<CutWindow>,
    /// Distinct samples zeroed (window union)
    pub zeroed_samples: usize,
    /// Noise estimate used to size adaptive windows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseEstimate>,
}

/// Applies a [`CutMode`] to caller-owned spectra
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralCutter {
    mode: CutMode,
}

impl SpectralCutter {
    pub fn new(mode: CutMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &CutMode {
        &self.mode
    }

    /// Zero every sample inside the window of each cut frequency
    ///
    /// The spectrum is modified in place; on error it is left untouched.
    ///
    /// # Errors
    /// * `EmptySpectrum` - checked first, regardless of the cut list
    /// * `EmptyCutList`
    /// * `InvalidInput` - non-finite cut frequency, bad width, < 2 samples
    /// * `InsufficientPeaks` - adaptive mode without a usable noise floor
    pub fn cut(
        &self,
        spectrum: &mut Spectrum,
        cut_frequencies: &[f64],
    ) -> Result<CutReport, SpectrumError> {
        if spectrum.is_empty() {
            return Err(SpectrumError::EmptySpectrum);
        }
        if cut_frequencies.is_empty() {
            return Err(SpectrumError::EmptyCutList);
        }
        if let Some(bad) = cut_frequencies.iter().find(|f| !f.is_finite()) {
            return Err(SpectrumError::invalid(format!(
                "cut frequency must be finite (got {})",
                bad
            )));
        }

        let (windows, noise) = match self.mode {
            CutMode::Fixed { width } => (self.fixed_windows(spectrum, cut_frequencies, width)?, None),
            CutMode::NoiseAdaptive {
                seed_threshold,
                resample_resolution,
            } => {
                let (windows, noise) = adaptive::adaptive_windows(
                    spectrum,
                    cut_frequencies,
                    seed_threshold,
                    resample_resolution,
                )?;
                (windows, Some(noise))
            }
        };

        let mut mask = vec![false; spectrum.len()];
        for window in &windows {
            mask[window.start..window.end].iter_mut().for_each(|m| *m = true);
        }
        let zeroed_samples = spectrum.apply_zero_mask(&mask);

        tracing::debug!(
            "[SpectralCutter] {} cuts, {} samples zeroed",
            windows.len(),
            zeroed_samples
        );

        Ok(CutReport {
            windows,
            zeroed_samples,
            noise,
        })
    }

    fn fixed_windows(
        &self,
        spectrum: &Spectrum,
        cut_frequencies: &[f64],
        width: f64,
    ) -> Result<Vec<CutWindow>, SpectrumError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(SpectrumError::invalid(format!(
                "cut width must be positive (got {})",
                width
            )));
        }
        let (Some(first), Some(resolution)) = (spectrum.first_frequency(), spectrum.resolution())
        else {
            return Err(SpectrumError::invalid(
                "fixed-width cutting needs at least 2 samples",
            ));
        };
        if !spectrum.is_uniform(resolution * 1e-3) {
            tracing::warn!("[SpectralCutter] Spectrum spacing is not uniform; windows use the first spacing");
        }

        Ok(cut_frequencies
            .iter()
            .map(|&target| fixed::fixed_window(first, resolution, spectrum.len(), target, width))
            .collect())
    }
}

/// Cut `spectrum` in place and report the applied windows
pub fn cut_spectrum(
    spectrum: &mut Spectrum,
    cut_frequencies: &[f64],
    mode: &CutMode,
) -> Result<CutReport, SpectrumError> {
    SpectralCutter::new(*mode).cut(spectrum, cut_frequencies)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(n: usize, value: f64) -> Spectrum {
        let freqs = (0..n).map(|i| i as f64 * 0.1).collect();
        Spectrum::from_columns(freqs, vec![value; n]).unwrap()
    }

    /// |sin| ripple of amplitude 0.5 with Gaussian lines at 30 and 70
    fn rippled_lines() -> Spectrum {
        let freqs: Vec<f64> = (0..1000).map(|i| i as f64 * 0.1).collect();
        let values = freqs
            .iter()
            .map(|&f| {
                let line = |center: f64, height: f64| {
                    height * (-0.5 * ((f - center) / 0.4).powi(2)).exp()
                };
                0.5 * (2.0 * std::f64::consts::PI * f / 1.3).sin().abs()
                    + line(30.0, 10.0)
                    + line(70.0, 8.0)
            })
            .collect();
        Spectrum::from_columns(freqs, values).unwrap()
    }

    #[test]
    fn test_empty_spectrum_checked_before_cut_list() {
        let mode = CutMode::fixed(1.0);
        let mut empty = Spectrum::default();
        let err = cut_spectrum(&mut empty, &[], &mode).unwrap_err();
        assert_eq!(err, SpectrumError::EmptySpectrum);
        let err = cut_spectrum(&mut empty, &[1.0], &mode).unwrap_err();
        assert_eq!(err, SpectrumError::EmptySpectrum);
        assert!(err.is_input_error());
    }

    #[test]
    fn test_empty_cut_list() {
        let mut spectrum = flat(10, 1.0);
        let err = cut_spectrum(&mut spectrum, &[], &CutMode::fixed(1.0)).unwrap_err();
        assert_eq!(err, SpectrumError::EmptyCutList);
        assert!(err.is_input_error());
    }

    #[test]
    fn test_invalid_width_and_short_spectrum() {
        let mut spectrum = flat(10, 1.0);
        for width in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                cut_spectrum(&mut spectrum, &[0.5], &CutMode::fixed(width)),
                Err(SpectrumError::InvalidInput { .. })
            ));
        }
        let mut single = flat(1, 1.0);
        assert!(matches!(
            cut_spectrum(&mut single, &[0.0], &CutMode::fixed(1.0)),
            Err(SpectrumError::InvalidInput { .. })
        ));
        assert!(matches!(
            cut_spectrum(&mut spectrum, &[f64::INFINITY], &CutMode::fixed(1.0)),
            Err(SpectrumError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_fixed_cut_zeroes_expected_count() {
        let mut spectrum = flat(1000, 1.0);
        let original = spectrum.clone();
        let (width, resolution) = (1.05, 0.1);

        let report = cut_spectrum(&mut spectrum, &[50.0], &CutMode::fixed(width)).unwrap();

        let nominal = ((width / 2.0) / resolution).floor() as i64 * 2;
        assert!((report.zeroed_samples as i64 - nominal).abs() <= 1);
        assert_eq!(report.windows[0].start, 495);
        assert_eq!(report.windows[0].end, 504);
        assert!(report.noise.is_none());

        for (i, point) in spectrum.points().enumerate() {
            let outside = point.frequency < 50.0 - width / 2.0 || point.frequency > 50.0 + width / 2.0;
            if outside {
                assert_eq!(point.intensity, original.intensities()[i], "sample {} changed", i);
            }
        }
        assert!(spectrum.intensities()[495..504].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fixed_windows_compose_by_union() {
        let mut spectrum = flat(1000, 1.0);
        let report =
            cut_spectrum(&mut spectrum, &[50.0, 50.3], &CutMode::fixed(1.05)).unwrap();
        assert_eq!(report.windows.len(), 2);
        assert_eq!(report.zeroed_samples, 12);
        assert!(spectrum.intensities()[495..507].iter().all(|&v| v == 0.0));
        assert_eq!(spectrum.intensities()[494], 1.0);
        assert_eq!(spectrum.intensities()[507], 1.0);
    }

    #[test]
    fn test_fixed_cut_near_edges_is_clamped() {
        let mut spectrum = flat(100, 1.0);
        let report = cut_spectrum(&mut spectrum, &[0.0, 9.93, 250.0], &CutMode::fixed(2.0)).unwrap();
        assert_eq!(report.windows[2].len(), 0);
        assert_eq!(spectrum.intensities()[0], 0.0);
        assert_eq!(spectrum.intensities()[99], 0.0);
    }

    #[test]
    fn test_adaptive_cut_follows_linewidth() {
        let mut spectrum = rippled_lines();
        let original = spectrum.clone();
        let mode = CutMode::NoiseAdaptive {
            seed_threshold: 1.0,
            resample_resolution: 0.01,
        };

        let report = cut_spectrum(&mut spectrum, &[30.05], &mode).unwrap();

        let noise = report.noise.expect("adaptive cut reports its noise floor");
        assert!((noise.level - 0.5).abs() / 0.5 < 0.05, "noise level {}", noise.level);

        let window = report.windows[0];
        assert!(window.start <= 290 && window.end > 310, "window {:?}", window);
        assert!(spectrum.intensities()[290..=310].iter().all(|&v| v == 0.0));

        // the other line and the far baseline are untouched
        for i in [250, 500, 650, 700, 750] {
            assert_eq!(spectrum.intensities()[i], original.intensities()[i]);
        }
    }

    #[test]
    fn test_adaptive_cut_shares_one_estimate_across_targets() {
        let mut spectrum = rippled_lines();
        let original = spectrum.clone();
        let mode = CutMode::NoiseAdaptive {
            seed_threshold: 1.0,
            resample_resolution: 0.01,
        };

        let report = cut_spectrum(&mut spectrum, &[30.0, 70.0, 30.1], &mode).unwrap();

        assert_eq!(report.windows.len(), 3);
        let (first, second, repeat) = (report.windows[0], report.windows[1], report.windows[2]);
        // both targets near 30 resolve to the same peak and the same window
        assert_eq!((repeat.start, repeat.end), (first.start, first.end));
        assert_eq!((first.start, first.end), (287, 312));
        assert_eq!((second.start, second.end), (689, 714));

        // zeroed count is the union, not the sum of window lengths
        assert_eq!(report.zeroed_samples, first.len() + second.len());
        assert_eq!(report.zeroed_samples, 50);
        assert!(spectrum.intensities()[287..312].iter().all(|&v| v == 0.0));
        assert!(spectrum.intensities()[689..714].iter().all(|&v| v == 0.0));
        assert_eq!(spectrum.intensities()[286], original.intensities()[286]);
        assert_eq!(spectrum.intensities()[500], original.intensities()[500]);

        // windows match a single-target cut sized by the same estimate
        let mut single = original.clone();
        let alone = cut_spectrum(&mut single, &[70.0], &mode).unwrap();
        assert_eq!(alone.windows[0], CutWindow { target: 70.0, ..second });
        assert_eq!(alone.noise, report.noise);
    }

    #[test]
    fn test_adaptive_cut_propagates_insufficient_peaks() {
        let mut spectrum = flat(200, 1.0);
        let before = spectrum.clone();
        let err = cut_spectrum(&mut spectrum, &[5.0], &CutMode::noise_adaptive(1.5)).unwrap_err();
        assert!(matches!(err, SpectrumError::InsufficientPeaks { .. }));
        assert_eq!(spectrum, before);
    }

    #[test]
    fn test_cut_mode_json() {
        let mode: CutMode =
            serde_json::from_str(r#"{"mode":"noise_adaptive","seed_threshold":0.2}"#).unwrap();
        assert_eq!(mode, CutMode::noise_adaptive(0.2));
        let mode: CutMode = serde_json::from_str(r#"{"mode":"fixed","width":0.7}"#).unwrap();
        assert_eq!(mode, CutMode::fixed(0.7));
    }
}

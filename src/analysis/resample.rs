// Resample module - cubic spline re-evaluation on a uniform grid
//
// A natural cubic spline is fitted through every input point (no smoothing)
// and evaluated at `first + k * resolution`. The output length is
// ceil((span_resolution / resolution) * len), so the last output frequency
// may fall short of the original end.

use crate::error::SpectrumError;
use crate::spectrum::Spectrum;

/// Smallest spectrum the spline fit accepts
pub const MIN_SPLINE_POINTS: usize = 4;

/// Guard against runaway allocations from tiny resolutions
///
/// The noise estimator holds the resampled columns (16 B/point) and a
/// `LinewidthScan` (16 B/point) at once, plus up to one 24 B `Peak` per point
/// on plateaus above the seed: ~56 B/point, so ~560 MB at this cap.
pub const MAX_RESAMPLED_POINTS: usize = 10_000_000;

/// Interpolating natural cubic spline
///
/// Stores the knot second derivatives; segments are evaluated with the
/// standard cubic Hermite-in-moments form.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    moments: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through `(knots[i], values[i])`
    ///
    /// Knots must be strictly increasing (guaranteed for a [`Spectrum`]).
    pub fn fit(knots: &[f64], values: &[f64]) -> Result<Self, SpectrumError> {
        let n = knots.len();
        if n != values.len() {
            return Err(SpectrumError::invalid("spline knots and values differ in length"));
        }
        if n < MIN_SPLINE_POINTS {
            return Err(SpectrumError::invalid(format!(
                "spline fit needs at least {} points (got {})",
                MIN_SPLINE_POINTS, n
            )));
        }

        // Tridiagonal system for interior moments, natural ends (M0 = Mn-1 = 0),
        // solved with the Thomas algorithm.
        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        let mut diag = vec![1.0; n];
        let mut upper = vec![0.0; n];
        let mut rhs = vec![0.0; n];
        let mut lower = vec![0.0; n];
        for i in 1..n - 1 {
            lower[i] = h[i - 1];
            diag[i] = 2.0 * (h[i - 1] + h[i]);
            upper[i] = h[i];
            rhs[i] = 6.0
                * ((values[i + 1] - values[i]) / h[i] - (values[i] - values[i - 1]) / h[i - 1]);
        }

        let mut c_prime = vec![0.0; n];
        let mut d_prime = vec![0.0; n];
        c_prime[0] = upper[0] / diag[0];
        d_prime[0] = rhs[0] / diag[0];
        for i in 1..n {
            let m = diag[i] - lower[i] * c_prime[i - 1];
            c_prime[i] = upper[i] / m;
            d_prime[i] = (rhs[i] - lower[i] * d_prime[i - 1]) / m;
        }

        let mut moments = vec![0.0; n];
        moments[n - 1] = d_prime[n - 1];
        for i in (0..n - 1).rev() {
            moments[i] = d_prime[i] - c_prime[i] * moments[i + 1];
        }

        Ok(Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
            moments,
        })
    }

    /// Evaluate the spline at `x`
    ///
    /// Points outside the knot span extrapolate the nearest end segment.
    pub fn evaluate(&self, x: f64) -> f64 {
        let last_segment = self.knots.len() - 2;
        let i = self
            .knots
            .partition_point(|&k| k <= x)
            .saturating_sub(1)
            .min(last_segment);

        let h = self.knots[i + 1] - self.knots[i];
        let a = (self.knots[i + 1] - x) / h;
        let b = (x - self.knots[i]) / h;
        a * self.values[i]
            + b * self.values[i + 1]
            + ((a * a * a - a) * self.moments[i] + (b * b * b - b) * self.moments[i + 1]) * h * h
                / 6.0
    }
}

/// Resample `spectrum` onto a uniform grid spaced by `resolution`
///
/// # Errors
/// `InvalidInput` when `resolution` is not a positive finite number or the
/// spectrum has fewer than [`MIN_SPLINE_POINTS`] samples.
pub fn resample(spectrum: &Spectrum, resolution: f64) -> Result<Spectrum, SpectrumError> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(SpectrumError::invalid(format!(
            "resampling resolution must be positive (got {})",
            resolution
        )));
    }
    if spectrum.len() < MIN_SPLINE_POINTS {
        return Err(SpectrumError::invalid(format!(
            "resampling needs at least {} points (got {})",
            MIN_SPLINE_POINTS,
            spectrum.len()
        )));
    }

    let first = spectrum.frequencies()[0];
    let span_resolution = spectrum
        .span_resolution()
        .ok_or_else(|| SpectrumError::invalid("spectrum has no span"))?;
    let target_len = ((span_resolution / resolution) * spectrum.len() as f64).ceil();
    if target_len > MAX_RESAMPLED_POINTS as f64 {
        return Err(SpectrumError::invalid(format!(
            "resolution {} would produce {} points",
            resolution, target_len
        )));
    }
    let target_len = target_len as usize;

    let spline = CubicSpline::fit(spectrum.frequencies(), spectrum.intensities())?;
    let frequencies: Vec<f64> = (0..target_len)
        .map(|k| first + k as f64 * resolution)
        .collect();
    let intensities = frequencies.iter().map(|&f| spline.evaluate(f)).collect();

    tracing::debug!(
        "[Resample] {} points -> {} points at resolution {}",
        spectrum.len(),
        target_len,
        resolution
    );

    Ok(Spectrum::from_sorted_columns(frequencies, intensities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn smooth_spectrum(n: usize, step: f64) -> Spectrum {
        let freqs: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
        let values = freqs
            .iter()
            .map(|&f| 2.0 + (2.0 * PI * f / 10.0).sin())
            .collect();
        Spectrum::from_columns(freqs, values).unwrap()
    }

    #[test]
    fn test_spline_passes_through_knots() {
        let knots = [0.0, 1.0, 2.5, 3.0, 4.0];
        let values = [1.0, -2.0, 0.5, 4.0, 3.0];
        let spline = CubicSpline::fit(&knots, &values).unwrap();
        for (k, v) in knots.iter().zip(values) {
            assert!((spline.evaluate(*k) - v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spline_reproduces_straight_line() {
        let knots = [0.0, 1.0, 2.0, 3.0, 4.0];
        let values = [1.0, 3.0, 5.0, 7.0, 9.0];
        let spline = CubicSpline::fit(&knots, &values).unwrap();
        assert!((spline.evaluate(2.25) - 5.5).abs() < 1e-12);
        assert!((spline.evaluate(3.9) - 8.8).abs() < 1e-12);
    }

    #[test]
    fn test_output_grid() {
        let spectrum = smooth_spectrum(100, 0.1);
        let resampled = resample(&spectrum, 0.02).unwrap();

        let span_resolution = spectrum.span_resolution().unwrap();
        let expected_len = ((span_resolution / 0.02) * 100.0).ceil() as usize;
        assert!(expected_len == 495 || expected_len == 496);
        assert_eq!(resampled.len(), expected_len);
        assert_eq!(resampled.first_frequency(), Some(0.0));
        assert!(resampled.last_frequency().unwrap() <= 9.9 + 1e-9);
        assert!((resampled.resolution().unwrap() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_native_resolution_round_trip() {
        let spectrum = smooth_spectrum(1000, 0.1);
        let resampled = resample(&spectrum, 0.1).unwrap();

        assert!(resampled.len() >= spectrum.len() - 1 && resampled.len() <= spectrum.len());
        for (i, point) in resampled.points().enumerate() {
            let original = spectrum.point(i).unwrap();
            assert!((point.frequency - original.frequency).abs() < 1e-9);
            assert!(
                (point.intensity - original.intensity).abs() < 1e-6,
                "sample {} drifted: {} vs {}",
                i,
                point.intensity,
                original.intensity
            );
        }
    }

    #[test]
    fn test_finer_grid_follows_underlying_curve() {
        let spectrum = smooth_spectrum(200, 0.1);
        let resampled = resample(&spectrum, 0.01).unwrap();
        for point in resampled.points().filter(|p| p.frequency > 1.0 && p.frequency < 18.0) {
            let truth = 2.0 + (2.0 * PI * point.frequency / 10.0).sin();
            assert!((point.intensity - truth).abs() < 1e-4);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let spectrum = smooth_spectrum(10, 0.1);
        assert!(matches!(
            resample(&spectrum, 0.0),
            Err(SpectrumError::InvalidInput { .. })
        ));
        assert!(matches!(
            resample(&spectrum, -1.0),
            Err(SpectrumError::InvalidInput { .. })
        ));
        assert!(matches!(
            resample(&smooth_spectrum(3, 0.1), 0.01),
            Err(SpectrumError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rejects_grid_above_point_cap() {
        // (0.3 / 4 / 1e-8) * 4 = 3e7 points
        let spectrum = smooth_spectrum(4, 0.1);
        match resample(&spectrum, 1e-8) {
            Err(SpectrumError::InvalidInput { reason }) => assert!(reason.contains("points")),
            other => panic!("expected InvalidInput, got {:?}", other.map(|s| s.len())),
        }
        assert!(resample(&spectrum, 1e-6).is_ok());
    }
}

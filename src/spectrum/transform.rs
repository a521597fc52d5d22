// Transform module - time-domain samples to magnitude spectrum
//
// The recording is Kaiser-windowed, zero-padded to twice its length and
// Fourier transformed. Frequencies follow the usual FFT bin layout scaled by
// a unit multiplier (MHz by default) and the result is clipped to the
// requested band.

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::error::SpectrumError;
use crate::spectrum::Spectrum;

/// Kaiser window shape parameter
pub const DEFAULT_KAISER_BETA: f64 = 9.5;

/// Frequency unit multiplier (1e6 = MHz)
pub const DEFAULT_FREQUENCY_MULTIPLIER: f64 = 1.0e6;

/// Magnitudes are divided by this before being stored
const INTENSITY_SCALE: f64 = 100.0;

/// Band and acquisition parameters for the transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformParams {
    /// Lower band edge, in units of `frequency_multiplier`
    pub start_frequency: f64,
    /// Upper band edge, in units of `frequency_multiplier`
    pub end_frequency: f64,
    /// Samples per second of the recording
    pub sample_rate: f64,
    #[serde(default = "default_frequency_multiplier")]
    pub frequency_multiplier: f64,
    #[serde(default = "default_kaiser_beta")]
    pub kaiser_beta: f64,
}

fn default_frequency_multiplier() -> f64 {
    DEFAULT_FREQUENCY_MULTIPLIER
}

fn default_kaiser_beta() -> f64 {
    DEFAULT_KAISER_BETA
}

impl TransformParams {
    pub fn new(start_frequency: f64, end_frequency: f64, sample_rate: f64) -> Self {
        Self {
            start_frequency,
            end_frequency,
            sample_rate,
            frequency_multiplier: DEFAULT_FREQUENCY_MULTIPLIER,
            kaiser_beta: DEFAULT_KAISER_BETA,
        }
    }

    pub fn with_frequency_multiplier(mut self, multiplier: f64) -> Self {
        self.frequency_multiplier = multiplier;
        self
    }

    fn validate(&self) -> Result<(), SpectrumError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(SpectrumError::invalid(format!(
                "sample rate must be positive (got {})",
                self.sample_rate
            )));
        }
        if !(self.frequency_multiplier.is_finite() && self.frequency_multiplier > 0.0) {
            return Err(SpectrumError::invalid(format!(
                "frequency multiplier must be positive (got {})",
                self.frequency_multiplier
            )));
        }
        if !(self.start_frequency <= self.end_frequency) {
            return Err(SpectrumError::invalid(format!(
                "band start {} exceeds end {}",
                self.start_frequency, self.end_frequency
            )));
        }
        if !(self.kaiser_beta.is_finite() && self.kaiser_beta >= 0.0) {
            return Err(SpectrumError::invalid(format!(
                "Kaiser beta must be non-negative (got {})",
                self.kaiser_beta
            )));
        }
        Ok(())
    }
}

/// FFT processor turning recordings into band-limited spectra
pub struct SpectrumTransformer {
    planner: FftPlanner<f64>,
    params: TransformParams,
}

impl SpectrumTransformer {
    pub fn new(params: TransformParams) -> Self {
        Self {
            planner: FftPlanner::new(),
            params,
        }
    }

    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    /// Compute the band-limited magnitude spectrum of `samples`
    ///
    /// # Returns
    /// Spectrum sorted by frequency; empty when no bin falls in the band
    pub fn transform(&mut self, samples: &[f64]) -> Result<Spectrum, SpectrumError> {
        self.params.validate()?;
        if samples.is_empty() {
            return Err(SpectrumError::invalid("no time-domain samples"));
        }
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(SpectrumError::invalid(format!(
                "non-finite time-domain sample at index {}",
                pos
            )));
        }

        let window = kaiser_window(samples.len(), self.params.kaiser_beta);
        let fft_size = samples.len() * 2;

        let mut buffer: Vec<Complex<f64>> = Vec::with_capacity(fft_size);
        buffer.extend(
            samples
                .iter()
                .zip(&window)
                .map(|(&sample, &w)| Complex::new(sample * w, 0.0)),
        );
        buffer.resize(fft_size, Complex::new(0.0, 0.0));

        let fft = self.planner.plan_fft_forward(fft_size);
        fft.process(&mut buffer);

        let bin_width = self.params.sample_rate / fft_size as f64 / self.params.frequency_multiplier;
        let mut bins: Vec<(f64, f64)> = buffer
            .iter()
            .enumerate()
            .map(|(i, value)| {
                (
                    fft_bin_index(i, fft_size) as f64 * bin_width,
                    value.norm() / INTENSITY_SCALE,
                )
            })
            .filter(|(freq, _)| {
                self.params.start_frequency <= *freq && *freq <= self.params.end_frequency
            })
            .collect();
        bins.sort_by(|a, b| a.0.total_cmp(&b.0));

        tracing::debug!(
            "[Transform] {} samples -> {} bins in [{}, {}]",
            samples.len(),
            bins.len(),
            self.params.start_frequency,
            self.params.end_frequency
        );
        if bins.is_empty() {
            tracing::warn!("[Transform] No FFT bins inside the requested band");
        }

        let (frequencies, intensities) = bins.into_iter().unzip();
        Ok(Spectrum::from_sorted_columns(frequencies, intensities))
    }
}

/// Convenience wrapper around [`SpectrumTransformer`]
pub fn transform(samples: &[f64], params: &TransformParams) -> Result<Spectrum, SpectrumError> {
    SpectrumTransformer::new(*params).transform(samples)
}

/// Signed bin number in standard FFT order: 0, 1, ..., n/2-1, -n/2, ..., -1
fn fft_bin_index(i: usize, n: usize) -> i64 {
    if i < n.div_ceil(2) {
        i as i64
    } else {
        i as i64 - n as i64
    }
}

/// Kaiser window of `length` samples with shape `beta`
pub fn kaiser_window(length: usize, beta: f64) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    if length == 1 {
        return vec![1.0];
    }

    let half = (length - 1) as f64 / 2.0;
    let i0_beta = bessel_i0(beta);

    (0..length)
        .map(|n| {
            let x = (n as f64 - half) / half;
            bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / i0_beta
        })
        .collect()
}

/// Modified Bessel function of the first kind, order 0 (power series)
fn bessel_i0(x: f64) -> f64 {
    let quarter_sq = x * x / 4.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;
    while term > sum * 1e-17 {
        term *= quarter_sq / (k * k);
        sum += term;
        k += 1.0;
    }
    sum
}

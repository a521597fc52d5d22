//! Deterministic synthetic spectra.
//!
//! Used by the CLI `synth` subcommand and by tests that need a spectrum with
//! a known noise floor. The floor is `baseline + ripple * |sin(2πf/period)|`
//! plus seeded uniform noise in `[0, noise_amplitude)`; lines are Gaussian.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::SpectrumError;
use crate::spectrum::Spectrum;

const DEFAULT_SEED: u64 = 0x5A5A_FFF0;

/// Gaussian spectral line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralLine {
    pub center: f64,
    pub height: f64,
    /// Gaussian sigma in frequency units
    pub width: f64,
}

impl SpectralLine {
    pub fn new(center: f64, height: f64, width: f64) -> Self {
        Self {
            center,
            height,
            width,
        }
    }

    fn value_at(&self, frequency: f64) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        let z = (frequency - self.center) / self.width;
        self.height * (-0.5 * z * z).exp()
    }
}

/// Builder for a uniformly spaced synthetic spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpectrum {
    pub start_frequency: f64,
    pub resolution: f64,
    pub points: usize,
    #[serde(default)]
    pub baseline: f64,
    #[serde(default)]
    pub ripple_amplitude: f64,
    #[serde(default = "default_ripple_period")]
    pub ripple_period: f64,
    #[serde(default)]
    pub noise_amplitude: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub lines: Vec<SpectralLine>,
}

fn default_ripple_period() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl SyntheticSpectrum {
    /// Flat zero spectrum with `points` samples starting at `start_frequency`
    pub fn new(start_frequency: f64, resolution: f64, points: usize) -> Self {
        Self {
            start_frequency,
            resolution,
            points,
            baseline: 0.0,
            ripple_amplitude: 0.0,
            ripple_period: default_ripple_period(),
            noise_amplitude: 0.0,
            seed: DEFAULT_SEED,
            lines: Vec::new(),
        }
    }

    pub fn with_baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }

    /// `amplitude * |sin(2πf / period)|` added to the floor
    pub fn with_ripple(mut self, amplitude: f64, period: f64) -> Self {
        self.ripple_amplitude = amplitude;
        self.ripple_period = period;
        self
    }

    pub fn with_noise(mut self, amplitude: f64, seed: u64) -> Self {
        self.noise_amplitude = amplitude;
        self.seed = seed;
        self
    }

    pub fn with_line(mut self, line: SpectralLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Render the spectrum
    ///
    /// The same builder always renders the same samples.
    pub fn generate(&self) -> Result<Spectrum, SpectrumError> {
        if self.points == 0 {
            return Err(SpectrumError::EmptySpectrum);
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(SpectrumError::invalid(format!(
                "synthetic resolution must be positive (got {})",
                self.resolution
            )));
        }
        if self.ripple_amplitude != 0.0 && !(self.ripple_period > 0.0) {
            return Err(SpectrumError::invalid("ripple period must be positive"));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let frequencies: Vec<f64> = (0..self.points)
            .map(|i| self.start_frequency + i as f64 * self.resolution)
            .collect();
        let intensities = frequencies
            .iter()
            .map(|&f| {
                let mut value = self.baseline;
                if self.ripple_amplitude != 0.0 {
                    value += self.ripple_amplitude * (2.0 * PI * f / self.ripple_period).sin().abs();
                }
                if self.noise_amplitude > 0.0 {
                    value += rng.gen_range(0.0..self.noise_amplitude);
                }
                value + self.lines.iter().map(|line| line.value_at(f)).sum::<f64>()
            })
            .collect();

        Spectrum::from_columns(frequencies, intensities)
    }
}

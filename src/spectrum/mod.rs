// Spectrum - frequency/intensity sample table
//
// Module organization:
// - mod.rs: Spectrum data model and index helpers
// - io: whitespace-delimited tables and WAV input
// - transform: time-domain samples to magnitude spectrum

pub mod io;
pub mod transform;

use serde::{Deserialize, Serialize};

use crate::error::SpectrumError;

/// One (frequency, intensity) sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub frequency: f64,
    pub intensity: f64,
}

/// Ordered frequency/intensity table
///
/// Frequencies are finite and strictly increasing. Spacing is expected to be
/// uniform (the resolution is taken from the first two samples), but only
/// ordering is enforced. An empty spectrum is representable so that callers
/// get `EmptySpectrum` from the operations that need data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    intensities: Vec<f64>,
}

impl Spectrum {
    /// Build a spectrum from parallel frequency and intensity columns
    pub fn from_columns(
        frequencies: Vec<f64>,
        intensities: Vec<f64>,
    ) -> Result<Self, SpectrumError> {
        if frequencies.len() != intensities.len() {
            return Err(SpectrumError::invalid(format!(
                "column length mismatch: {} frequencies, {} intensities",
                frequencies.len(),
                intensities.len()
            )));
        }

        if let Some(pos) = frequencies.iter().position(|f| !f.is_finite()) {
            return Err(SpectrumError::invalid(format!(
                "non-finite frequency at index {}",
                pos
            )));
        }
        if let Some(pos) = intensities.iter().position(|v| !v.is_finite()) {
            return Err(SpectrumError::invalid(format!(
                "non-finite intensity at index {}",
                pos
            )));
        }
        if let Some(pos) = frequencies.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SpectrumError::invalid(format!(
                "frequencies must be strictly increasing (index {})",
                pos + 1
            )));
        }

        Ok(Self {
            frequencies,
            intensities,
        })
    }

    /// Build a spectrum from (frequency, intensity) points
    pub fn from_points(points: &[SpectrumPoint]) -> Result<Self, SpectrumError> {
        Self::from_columns(
            points.iter().map(|p| p.frequency).collect(),
            points.iter().map(|p| p.intensity).collect(),
        )
    }

    /// Columns already known to be finite and strictly increasing
    pub(crate) fn from_sorted_columns(frequencies: Vec<f64>, intensities: Vec<f64>) -> Self {
        debug_assert_eq!(frequencies.len(), intensities.len());
        Self {
            frequencies,
            intensities,
        }
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn point(&self, index: usize) -> Option<SpectrumPoint> {
        Some(SpectrumPoint {
            frequency: *self.frequencies.get(index)?,
            intensity: *self.intensities.get(index)?,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = SpectrumPoint> + '_ {
        self.frequencies
            .iter()
            .zip(&self.intensities)
            .map(|(&frequency, &intensity)| SpectrumPoint {
                frequency,
                intensity,
            })
    }

    pub fn first_frequency(&self) -> Option<f64> {
        self.frequencies.first().copied()
    }

    pub fn last_frequency(&self) -> Option<f64> {
        self.frequencies.last().copied()
    }

    /// Spacing between the first two frequencies
    pub fn resolution(&self) -> Option<f64> {
        match self.frequencies.as_slice() {
            [first, second, ..] => Some(second - first),
            _ => None,
        }
    }

    /// Span divided by sample count, `(last - first) / len`
    ///
    /// Slightly smaller than [`Spectrum::resolution`] for a uniform grid; the
    /// resampler sizes its output with this value.
    pub fn span_resolution(&self) -> Option<f64> {
        let first = self.first_frequency()?;
        let last = self.last_frequency()?;
        Some((last - first) / self.len() as f64)
    }

    /// True when every spacing is within `tolerance` of the first one
    pub fn is_uniform(&self, tolerance: f64) -> bool {
        let Some(resolution) = self.resolution() else {
            return true;
        };
        self.frequencies
            .windows(2)
            .all(|w| ((w[1] - w[0]) - resolution).abs() <= tolerance)
    }

    /// First index whose frequency is >= `frequency` (may equal `len()`)
    pub fn index_at_or_after(&self, frequency: f64) -> usize {
        self.frequencies.partition_point(|&f| f < frequency)
    }

    /// Index of the sample closest in frequency
    pub fn nearest_index(&self, frequency: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let upper = self.index_at_or_after(frequency);
        if upper == 0 {
            return Some(0);
        }
        if upper == self.len() {
            return Some(self.len() - 1);
        }
        let below = frequency - self.frequencies[upper - 1];
        let above = self.frequencies[upper] - frequency;
        Some(if above < below { upper } else { upper - 1 })
    }

    /// Zero every intensity whose mask entry is set
    ///
    /// Returns the number of samples covered by the mask.
    pub(crate) fn apply_zero_mask(&mut self, mask: &[bool]) -> usize {
        let mut zeroed = 0;
        for (value, &cut) in self.intensities.iter_mut().zip(mask) {
            if cut {
                *value = 0.0;
                zeroed += 1;
            }
        }
        zeroed
    }
}

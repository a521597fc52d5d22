// Linewidth module - where a peak's signal returns to baseline
//
// Algorithm (independent left/right walks from the peak index):
// 1. Step outward while the current sample is >= the noise level
// 2. Stop early at a valley floor: a sample whose two neighbours are both
//    strictly greater, even if it is still above the noise level
// 3. Stop at the spectrum edges (index 0 on the left, len - 1 on the right;
//    the right edge clamp overrides the valley check)
//
// Bounds need not be symmetric. A sample below the noise level ends a walk
// on that sample, so a peak already below the level yields (index, index).

use serde::Serialize;

use crate::error::SpectrumError;
use crate::spectrum::Spectrum;

/// Index range `[low, high]` around a peak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinewidthBounds {
    pub low: usize,
    pub high: usize,
}

impl LinewidthBounds {
    /// Number of samples covered, bounds included
    pub fn width(&self) -> usize {
        self.high - self.low + 1
    }
}

#[inline]
fn is_valley_floor(values: &[f64], pos: usize) -> bool {
    pos > 0 && pos + 1 < values.len() && values[pos - 1] > values[pos] && values[pos + 1] > values[pos]
}

/// Whether a walk standing on `pos` ends there (edges handled by callers)
#[inline]
fn stops_at(values: &[f64], pos: usize, noise_level: f64) -> bool {
    !(values[pos] >= noise_level) || is_valley_floor(values, pos)
}

fn walk_left(values: &[f64], index: usize, noise_level: f64) -> usize {
    let mut offset = 0;
    while values[index - offset] >= noise_level {
        let pos = index - offset;
        if pos == 0 || is_valley_floor(values, pos) {
            break;
        }
        offset += 1;
    }
    index - offset
}

fn walk_right(values: &[f64], index: usize, noise_level: f64) -> usize {
    let last = values.len() - 1;
    let mut offset = 0;
    while values[index + offset] >= noise_level {
        let pos = index + offset;
        if pos >= last {
            return last;
        }
        if is_valley_floor(values, pos) {
            break;
        }
        offset += 1;
    }
    index + offset
}

/// Walk outward from `index` until the signal returns to `noise_level`
///
/// # Arguments
/// * `spectrum` - Spectrum the index refers to
/// * `index` - Peak position
/// * `noise_level` - Reference intensity marking the baseline
///
/// # Returns
/// `(low, high)` sample indices
pub fn find_linewidth_bounds(
    spectrum: &Spectrum,
    index: usize,
    noise_level: f64,
) -> Result<(usize, usize), SpectrumError> {
    if spectrum.is_empty() {
        return Err(SpectrumError::EmptySpectrum);
    }
    if index >= spectrum.len() {
        return Err(SpectrumError::invalid(format!(
            "peak index {} out of range for {} samples",
            index,
            spectrum.len()
        )));
    }

    let values = spectrum.intensities();
    Ok((
        walk_left(values, index, noise_level),
        walk_right(values, index, noise_level),
    ))
}

/// Precomputed walk endpoints for every start index at one noise level
///
/// Equivalent to [`find_linewidth_bounds`] for each index, but linear in the
/// spectrum length overall. Plateaus above the noise level make individual
/// walks long, and the noise estimator needs bounds for every peak.
#[derive(Debug, Clone)]
pub struct LinewidthScan {
    left_stop: Vec<usize>,
    right_stop: Vec<usize>,
}

impl LinewidthScan {
    pub fn new(values: &[f64], noise_level: f64) -> Self {
        let n = values.len();
        let mut left_stop = vec![0; n];
        let mut right_stop = vec![0; n];
        if n == 0 {
            return Self {
                left_stop,
                right_stop,
            };
        }

        for pos in 1..n {
            left_stop[pos] = if stops_at(values, pos, noise_level) {
                pos
            } else {
                left_stop[pos - 1]
            };
        }

        right_stop[n - 1] = n - 1;
        for pos in (0..n - 1).rev() {
            right_stop[pos] = if stops_at(values, pos, noise_level) {
                pos
            } else {
                right_stop[pos + 1]
            };
        }

        Self {
            left_stop,
            right_stop,
        }
    }

    /// Bounds for a walk starting at `index`, `None` when out of range
    pub fn bounds(&self, index: usize) -> Option<LinewidthBounds> {
        Some(LinewidthBounds {
            low: *self.left_stop.get(index)?,
            high: *self.right_stop.get(index)?,
        })
    }
}

// Fixed-width cut windows
//
// low  = floor((f - w/2 - f0) / r) + 1
// high = floor((f + w/2 - f0) / r) - 1
// The half-open range [low, high) excludes the samples at the nominal edges;
// both ends are clamped to [0, len).

use crate::cutting::CutWindow;

/// Window for one cut frequency
///
/// # Arguments
/// * `first_frequency` - Frequency of sample 0
/// * `resolution` - Sample spacing
/// * `len` - Number of samples
/// * `target` - Cut frequency
/// * `width` - Full window width in frequency units
pub(crate) fn fixed_window(
    first_frequency: f64,
    resolution: f64,
    len: usize,
    target: f64,
    width: f64,
) -> CutWindow {
    let half = width / 2.0;
    let low = ((target - half - first_frequency) / resolution).floor() + 1.0;
    let high = ((target + half - first_frequency) / resolution).floor() - 1.0;

    let clamp = |value: f64| value.max(0.0).min(len as f64) as usize;
    let start = clamp(low);
    let end = clamp(high).max(start);

    CutWindow {
        target,
        start,
        end,
    }
}

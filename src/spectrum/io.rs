//! Numeric table and WAV loading.
//!
//! Spectra are stored as whitespace-delimited text with frequency in the
//! first column and intensity in the second. Time-domain recordings are
//! either a text table (one column selected) or a mono PCM WAV file.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::SpectrumError;
use crate::spectrum::Spectrum;

/// Parse whitespace-delimited rows, skipping blank lines and `#` comments
///
/// Returns the numeric rows along with their 1-based line numbers.
fn parse_rows(text: &str) -> Result<Vec<(usize, Vec<f64>)>, SpectrumError> {
    let mut rows = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|err| SpectrumError::Parse {
                    line: idx + 1,
                    reason: format!("'{}': {}", token, err),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push((idx + 1, values));
    }
    Ok(rows)
}

/// Parse a two-column frequency/intensity table
///
/// Extra columns are ignored.
pub fn parse_spectrum(text: &str) -> Result<Spectrum, SpectrumError> {
    let rows = parse_rows(text)?;
    let mut frequencies = Vec::with_capacity(rows.len());
    let mut intensities = Vec::with_capacity(rows.len());

    for (line, values) in rows {
        match values.as_slice() {
            [frequency, intensity, ..] => {
                frequencies.push(*frequency);
                intensities.push(*intensity);
            }
            _ => {
                return Err(SpectrumError::Parse {
                    line,
                    reason: "expected frequency and intensity columns".to_string(),
                })
            }
        }
    }

    Spectrum::from_columns(frequencies, intensities)
}

/// Load a spectrum table from disk
pub fn load_spectrum<P: AsRef<Path>>(path: P) -> Result<Spectrum, SpectrumError> {
    let text = fs::read_to_string(path.as_ref()).map_err(|err| SpectrumError::Io {
        details: format!("reading {}: {}", path.as_ref().display(), err),
    })?;
    let spectrum = parse_spectrum(&text)?;
    tracing::debug!(
        "[SpectrumIo] Loaded {} points from {}",
        spectrum.len(),
        path.as_ref().display()
    );
    Ok(spectrum)
}

/// Parse one column from a multi-column time-domain table
///
/// `column` counts from the end when negative (`-1` is the last column).
pub fn parse_time_domain(text: &str, column: isize) -> Result<Vec<f64>, SpectrumError> {
    let rows = parse_rows(text)?;
    let mut samples = Vec::with_capacity(rows.len());

    for (line, values) in rows {
        let width = values.len() as isize;
        let idx = if column < 0 { width + column } else { column };
        if idx < 0 || idx >= width {
            return Err(SpectrumError::Parse {
                line,
                reason: format!("column {} out of range for {} columns", column, width),
            });
        }
        let sample = values[idx as usize];
        if !sample.is_finite() {
            return Err(SpectrumError::Parse {
                line,
                reason: format!("non-finite sample {}", sample),
            });
        }
        samples.push(sample);
    }

    Ok(samples)
}

/// Load time-domain samples from a text table or a `.wav` file
pub fn load_time_domain<P: AsRef<Path>>(path: P, column: isize) -> Result<Vec<f64>, SpectrumError> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);

    if is_wav {
        let (samples, sample_rate) = read_wav(path)?;
        tracing::debug!(
            "[SpectrumIo] Loaded {} WAV samples at {} Hz from {}",
            samples.len(),
            sample_rate,
            path.display()
        );
        return Ok(samples);
    }

    let text = fs::read_to_string(path).map_err(|err| SpectrumError::Io {
        details: format!("reading {}: {}", path.display(), err),
    })?;
    parse_time_domain(&text, column)
}

/// Read a mono WAV file, normalising integer PCM to [-1, 1]
///
/// Returns the samples and the file's sample rate.
pub fn read_wav(path: &Path) -> Result<(Vec<f64>, u32), SpectrumError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(SpectrumError::invalid(format!(
            "{} must be mono (found {} channels)",
            path.display(),
            spec.channels
        )));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(f64::from))
            .collect::<Result<Vec<f64>, _>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f64;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f64 / max))
                .collect::<Result<Vec<f64>, _>>()?
        }
    };

    Ok((samples, spec.sample_rate))
}

/// Write a spectrum as two whitespace-separated columns
pub fn write_spectrum<W: Write>(spectrum: &Spectrum, writer: &mut W) -> Result<(), SpectrumError> {
    for point in spectrum.points() {
        writeln!(writer, "{} {}", point.frequency, point.intensity)?;
    }
    Ok(())
}

/// Save a spectrum table to disk
pub fn save_spectrum<P: AsRef<Path>>(spectrum: &Spectrum, path: P) -> Result<(), SpectrumError> {
    let mut buffer = Vec::with_capacity(spectrum.len() * 24);
    write_spectrum(spectrum, &mut buffer)?;
    fs::write(path.as_ref(), buffer).map_err(|err| SpectrumError::Io {
        details: format!("writing {}: {}", path.as_ref().display(), err),
    })
}

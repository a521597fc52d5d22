use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use spectral_cut::analysis::noise::{linspace, NoiseEstimate, NoiseEstimator, SweepPoint};
use spectral_cut::analysis::peaks::{Peak, PeakDetector};
use spectral_cut::config::AppConfig;
use spectral_cut::cutting::{CutMode, CutReport, SpectralCutter};
use spectral_cut::error::{log_spectrum_error, SpectrumError};
use spectral_cut::spectrum::io::{load_spectrum, load_time_domain, read_wav, save_spectrum};
use spectral_cut::spectrum::transform::{SpectrumTransformer, TransformParams};
use spectral_cut::spectrum::Spectrum;
use spectral_cut::synth::{SpectralLine, SyntheticSpectrum};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "spectral_cli",
    about = "Spectrum transform, noise-floor estimation and noise-adaptive cutting"
)]
struct Cli {
    /// JSON configuration file (defaults are used when missing or invalid)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform a time-domain recording into a magnitude spectrum
    Transform(TransformArgs),
    /// List peaks above the thresholds
    Peaks(PeaksArgs),
    /// Spline-resample a spectrum onto a finer grid
    Resample(ResampleArgs),
    /// Estimate the noise floor from one seed threshold
    Noise(NoiseArgs),
    /// Estimate the noise floor over a range of seed thresholds
    Sweep(SweepArgs),
    /// Zero cut windows around target frequencies
    Cut(CutArgs),
    /// Write a synthetic spectrum
    Synth(SynthArgs),
}

#[derive(Args, Debug, Clone)]
struct TransformArgs {
    /// Time-domain table or mono WAV file
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output: PathBuf,
    #[arg(long)]
    start: Option<f64>,
    #[arg(long)]
    end: Option<f64>,
    /// Samples per second (WAV files default to their own rate)
    #[arg(long)]
    sample_rate: Option<f64>,
    #[arg(long)]
    multiplier: Option<f64>,
    /// Column of a multi-column table, negative counts from the end
    #[arg(long, allow_hyphen_values = true)]
    column: Option<isize>,
}

#[derive(Args, Debug, Clone)]
struct PeaksArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    min: Option<f64>,
    /// Upper intensity bound (0 disables)
    #[arg(long)]
    max: Option<f64>,
}

#[derive(Args, Debug, Clone)]
struct ResampleArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output: PathBuf,
    #[arg(long)]
    resolution: Option<f64>,
}

#[derive(Args, Debug, Clone)]
struct NoiseArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    seed: Option<f64>,
    /// Resampling resolution used by the estimator
    #[arg(long)]
    resolution: Option<f64>,
}

#[derive(Args, Debug, Clone)]
struct SweepArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    start: Option<f64>,
    #[arg(long)]
    end: Option<f64>,
    #[arg(long)]
    steps: Option<usize>,
    #[arg(long)]
    resolution: Option<f64>,
    #[arg(long, value_enum, default_value_t = SweepFormat::Json)]
    format: SweepFormat,
}

#[derive(Args, Debug, Clone)]
struct CutArgs {
    #[arg(long)]
    input: PathBuf,
    /// Where to write the cut spectrum (report only when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Cut frequencies
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    at: Vec<f64>,
    /// Also cut every peak above this intensity
    #[arg(long)]
    pick_threshold: Option<f64>,
    /// Fixed window width
    #[arg(long, conflicts_with = "adaptive")]
    width: Option<f64>,
    /// Size windows from the noise floor and peak linewidths
    #[arg(long)]
    adaptive: bool,
    /// Seed threshold for the noise estimate (adaptive only)
    #[arg(long, requires = "adaptive")]
    seed: Option<f64>,
    /// Resampling resolution for the noise estimate (adaptive only)
    #[arg(long, requires = "adaptive")]
    resolution: Option<f64>,
}

#[derive(Args, Debug, Clone)]
struct SynthArgs {
    #[arg(long)]
    output: PathBuf,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    start: f64,
    #[arg(long, default_value_t = 0.1)]
    resolution: f64,
    #[arg(long, default_value_t = 1000)]
    points: usize,
    #[arg(long, default_value_t = 0.0)]
    baseline: f64,
    #[arg(long, default_value_t = 0.0)]
    ripple: f64,
    #[arg(long, default_value_t = 1.0)]
    ripple_period: f64,
    /// Uniform noise amplitude
    #[arg(long, default_value_t = 0.0)]
    noise: f64,
    #[arg(long, default_value_t = 0x5A5A_FFF0)]
    seed: u64,
    /// Gaussian line as center:height:width (repeatable)
    #[arg(long = "line", value_parser = parse_line)]
    lines: Vec<SpectralLine>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum SweepFormat {
    Json,
    Table,
}

fn parse_line(raw: &str) -> Result<SpectralLine, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected center:height:width, got '{raw}'"));
    }
    let mut values = [0.0; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid number '{part}': {err}"))?;
    }
    Ok(SpectralLine::new(values[0], values[1], values[2]))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            if let Some(spectrum_err) = err.downcast_ref::<SpectrumError>() {
                log_spectrum_error(spectrum_err, "spectral_cli");
            }
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Command::Transform(args) => run_transform(&config, args),
        Command::Peaks(args) => run_peaks(&config, args),
        Command::Resample(args) => run_resample(&config, args),
        Command::Noise(args) => run_noise(&config, args),
        Command::Sweep(args) => run_sweep(&config, args),
        Command::Cut(args) => run_cut(&config, args),
        Command::Synth(args) => run_synth(args),
    }?;
    Ok(ExitCode::SUCCESS)
}

fn load(path: &Path) -> Result<Spectrum> {
    load_spectrum(path).with_context(|| format!("loading spectrum {}", path.display()))
}

fn emit<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[derive(Serialize)]
struct SpectrumSummary<'a> {
    output: &'a Path,
    points: usize,
    first_frequency: Option<f64>,
    last_frequency: Option<f64>,
}

impl<'a> SpectrumSummary<'a> {
    fn new(output: &'a Path, spectrum: &Spectrum) -> Self {
        Self {
            output,
            points: spectrum.len(),
            first_frequency: spectrum.first_frequency(),
            last_frequency: spectrum.last_frequency(),
        }
    }
}

fn run_transform(config: &AppConfig, args: TransformArgs) -> Result<()> {
    let defaults = &config.transform;
    let is_wav = args
        .input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    let (samples, file_rate) = if is_wav {
        let (samples, rate) = read_wav(&args.input)
            .with_context(|| format!("reading {}", args.input.display()))?;
        (samples, Some(rate as f64))
    } else {
        let column = args.column.unwrap_or(defaults.column);
        let samples = load_time_domain(&args.input, column)
            .with_context(|| format!("reading {}", args.input.display()))?;
        (samples, None)
    };

    let Some(start) = args.start.or(defaults.start_frequency) else {
        bail!("--start is required (or transform.start_frequency in the config)");
    };
    let Some(end) = args.end.or(defaults.end_frequency) else {
        bail!("--end is required (or transform.end_frequency in the config)");
    };
    let Some(sample_rate) = args.sample_rate.or(defaults.sample_rate).or(file_rate) else {
        bail!("--sample-rate is required (or transform.sample_rate in the config)");
    };

    let mut params = TransformParams::new(start, end, sample_rate)
        .with_frequency_multiplier(args.multiplier.unwrap_or(defaults.frequency_multiplier));
    params.kaiser_beta = defaults.kaiser_beta;

    let spectrum = SpectrumTransformer::new(params)
        .transform(&samples)
        .context("transforming samples")?;
    save_spectrum(&spectrum, &args.output)?;

    emit(&SpectrumSummary::new(&args.output, &spectrum))
}

#[derive(Serialize)]
struct PeaksReport<'a> {
    input: &'a Path,
    threshold_min: f64,
    threshold_max: Option<f64>,
    count: usize,
    peaks: Vec<Peak>,
}

fn run_peaks(config: &AppConfig, args: PeaksArgs) -> Result<()> {
    let spectrum = load(&args.input)?;
    let min = args.min.unwrap_or(config.peaks.threshold_min);
    let mut detector = PeakDetector::new(min);
    if let Some(max) = args.max.or(config.peaks.threshold_max) {
        detector = detector.with_max(max);
    }
    let peaks = detector.detect(&spectrum);

    emit(&PeaksReport {
        input: &args.input,
        threshold_min: detector.threshold_min(),
        threshold_max: detector.threshold_max(),
        count: peaks.len(),
        peaks,
    })
}

fn run_resample(config: &AppConfig, args: ResampleArgs) -> Result<()> {
    let spectrum = load(&args.input)?;
    let resolution = args.resolution.unwrap_or(config.noise.resample_resolution);
    let resampled = spectral_cut::resample(&spectrum, resolution)
        .with_context(|| format!("resampling to {resolution}"))?;
    save_spectrum(&resampled, &args.output)?;

    emit(&SpectrumSummary::new(&args.output, &resampled))
}

#[derive(Serialize)]
struct NoiseReport<'a> {
    input: &'a Path,
    seed_threshold: f64,
    resample_resolution: f64,
    #[serde(flatten)]
    estimate: NoiseEstimate,
}

fn run_noise(config: &AppConfig, args: NoiseArgs) -> Result<()> {
    let spectrum = load(&args.input)?;
    let seed = args.seed.unwrap_or(config.noise.seed_threshold);
    let resolution = args.resolution.unwrap_or(config.noise.resample_resolution);
    let estimate = NoiseEstimator::new(resolution)
        .estimate(&spectrum, seed)
        .with_context(|| format!("estimating noise with seed {seed}"))?;

    emit(&NoiseReport {
        input: &args.input,
        seed_threshold: seed,
        resample_resolution: resolution,
        estimate,
    })
}

#[derive(Serialize)]
struct SweepReport<'a> {
    input: &'a Path,
    resample_resolution: f64,
    rows: Vec<SweepPoint>,
}

fn run_sweep(config: &AppConfig, args: SweepArgs) -> Result<()> {
    let spectrum = load(&args.input)?;
    let noise = &config.noise;
    let seeds = linspace(
        args.start.unwrap_or(noise.sweep_start),
        args.end.unwrap_or(noise.sweep_end),
        args.steps.unwrap_or(noise.sweep_steps),
    );
    let resolution = args.resolution.unwrap_or(noise.resample_resolution);
    let rows = NoiseEstimator::new(resolution).sweep(&spectrum, &seeds);

    match args.format {
        SweepFormat::Json => emit(&SweepReport {
            input: &args.input,
            resample_resolution: resolution,
            rows,
        }),
        SweepFormat::Table => {
            for row in rows {
                match row.level {
                    Some(level) => println!("GUESS: {:.3}   ACTUAL: {:.3}", row.seed, level),
                    None => println!(
                        "GUESS: {:.3}   ACTUAL: -   ({})",
                        row.seed,
                        row.error.unwrap_or_default()
                    ),
                }
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct CutOutput<'a> {
    input: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a Path>,
    mode: CutMode,
    cut_frequencies: Vec<f64>,
    #[serde(flatten)]
    report: CutReport,
}

fn run_cut(config: &AppConfig, args: CutArgs) -> Result<()> {
    let mut spectrum = load(&args.input)?;

    let mut targets = args.at.clone();
    if let Some(threshold) = args.pick_threshold {
        targets.extend(
            PeakDetector::new(threshold)
                .detect(&spectrum)
                .iter()
                .map(|peak| peak.frequency),
        );
    }
    if targets.is_empty() && args.pick_threshold.is_none() {
        bail!("give cut frequencies with --at or pick them with --pick-threshold");
    }

    let mode = if args.adaptive {
        CutMode::NoiseAdaptive {
            seed_threshold: args.seed.unwrap_or(config.noise.seed_threshold),
            resample_resolution: args.resolution.unwrap_or(config.noise.resample_resolution),
        }
    } else {
        CutMode::fixed(args.width.unwrap_or(config.cutting.width))
    };

    let report = SpectralCutter::new(mode)
        .cut(&mut spectrum, &targets)
        .context("cutting spectrum")?;
    if let Some(output) = &args.output {
        save_spectrum(&spectrum, output)?;
    }

    emit(&CutOutput {
        input: &args.input,
        output: args.output.as_deref(),
        mode,
        cut_frequencies: targets,
        report,
    })
}

fn run_synth(args: SynthArgs) -> Result<()> {
    let builder = SyntheticSpectrum {
        start_frequency: args.start,
        resolution: args.resolution,
        points: args.points,
        baseline: args.baseline,
        ripple_amplitude: args.ripple,
        ripple_period: args.ripple_period,
        noise_amplitude: args.noise,
        seed: args.seed,
        lines: args.lines,
    };
    let spectrum = builder.generate().context("generating synthetic spectrum")?;
    save_spectrum(&spectrum, &args.output)?;

    emit(&SpectrumSummary::new(&args.output, &spectrum))
}

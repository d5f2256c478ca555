//! deembed: probe characterization and de-embedding from analyzer records.
//!
//! `probe` characterizes the probes of a measurement folder (and de-embeds
//! the device in manual mode), `apply` reuses saved probe models, `delay`
//! and `impedance` work on a single trace.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deembed_core::delay::{ImpedanceSource, NelderMeadOptions};
use deembed_core::phase::{PhaseUnwrapper, UnwrapMode};
use deembed_core::pipeline::{self, DutDeembedding, RunReport};
use deembed_core::records::Delimiter;
use deembed_core::{load_config, DelayTimeRefiner};

#[derive(Parser)]
#[command(name = "deembed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Unwrap {
    /// Shift each segment onto the line fitted before the jump
    #[default]
    GradientShift,
    /// Subtract a fixed multiple of pi per jump
    FixedMultiple,
}

#[derive(Subcommand)]
enum Commands {
    /// Characterize probes from SHORT/OPEN/LOAD records
    Probe {
        /// Path to the run configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// De-embed device records with saved probe models
    Apply {
        /// Path to the run configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Delay time of a measured trace over a sub-sweep
    Delay {
        /// Three-column (Hz, Re, Im) record
        input: PathBuf,

        /// Start of the sub-sweep (Hz)
        #[arg(long)]
        f_start: f64,

        /// End of the sub-sweep (Hz)
        #[arg(long)]
        f_stop: f64,

        /// Record delimiter (comma, semicolon, tab, space)
        #[arg(short, long, default_value = "comma")]
        delimiter: Delimiter,

        /// Jump removal strategy
        #[arg(long, value_enum, default_value_t = Unwrap::GradientShift)]
        unwrap: Unwrap,

        /// Multiple of pi removed per jump with `fixed-multiple`
        #[arg(long, default_value = "2")]
        phase_factor: u8,

        /// Iteration budget of the delay-time refinement
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Tolerance on the spread of refinement objective values
        #[arg(long)]
        ftol: Option<f64>,

        /// Output directory (defaults to the input's folder)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delay-corrected impedance dispersion of a measured trace
    Impedance {
        /// Three-column (Hz, Re, Im) record
        input: PathBuf,

        /// Delay time to remove (s)
        #[arg(long)]
        dt: f64,

        /// Trace kind: s11 (one-port reflection) or s21 (series transmission)
        #[arg(short, long, default_value = "s11")]
        source: ImpedanceSource,

        /// Record delimiter (comma, semicolon, tab, space)
        #[arg(short, long, default_value = "comma")]
        delimiter: Delimiter,

        /// Output directory (defaults to the input's folder)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Probe { config } => characterize(&config)?,
        Commands::Apply { config } => apply(&config)?,
        Commands::Delay {
            input,
            f_start,
            f_stop,
            delimiter,
            unwrap,
            phase_factor,
            max_iterations,
            ftol,
            output,
        } => {
            let mode = match unwrap {
                Unwrap::GradientShift => UnwrapMode::GradientShift,
                Unwrap::FixedMultiple => UnwrapMode::FixedMultiple { phase_factor },
            };
            let options = refine_options(max_iterations, ftol)?;
            delay(&input, delimiter, f_start, f_stop, mode, options, output)?;
        }
        Commands::Impedance {
            input,
            dt,
            source,
            delimiter,
            output,
        } => impedance(&input, dt, source, delimiter, output)?,
    }

    Ok(())
}

/// Refinement settings with the command-line overrides applied
fn refine_options(max_iterations: Option<usize>, ftol: Option<f64>) -> Result<NelderMeadOptions> {
    let mut options = NelderMeadOptions::default();
    if let Some(n) = max_iterations {
        options.max_iterations = n;
    }
    if let Some(tol) = ftol {
        options.f_tolerance = tol;
    }
    options.validate().context("invalid refinement settings")?;
    Ok(options)
}

/// Output directory of a single-trace tool
fn output_dir(input: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    let dir = output.unwrap_or_else(|| {
        input
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    });
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    Ok(dir)
}

fn characterize(config_path: &Path) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = load_config(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let report = pipeline::run(&config).context("probe characterization failed")?;
    print_report(&report);
    Ok(())
}

fn apply(config_path: &Path) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = load_config(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let (dut, written) =
        pipeline::apply_saved_probes(&config).context("de-embedding with saved probes failed")?;
    print_dut(&dut);
    for path in &written {
        println!("  wrote {}", path.display());
    }
    Ok(())
}

fn delay(
    input: &Path,
    delimiter: Delimiter,
    f_start: f64,
    f_stop: f64,
    mode: UnwrapMode,
    options: NelderMeadOptions,
    output: Option<PathBuf>,
) -> Result<()> {
    let dir = output_dir(input, output)?;
    let unwrapper = PhaseUnwrapper::new(mode);
    let refiner = DelayTimeRefiner::new(options);

    let extraction = pipeline::delay_tool(
        input,
        delimiter,
        f_start,
        f_stop,
        &unwrapper,
        &refiner,
        &dir,
    )
    .with_context(|| format!("delay extraction from {}", input.display()))?;

    println!("Trace: {}", input.display());
    println!("Points: {}", extraction.trace.len());
    println!("Phase jumps: {}", extraction.phase.jumps.len());
    println!("Coarse delay: {:e} s", extraction.delay.coarse);
    println!("Refined delay: {:e} s", extraction.delay.refined);
    if !extraction.delay.converged {
        println!(
            "  refinement stopped after {} iterations without converging",
            extraction.delay.iterations
        );
    }
    println!("Phase records written to {}", dir.display());
    Ok(())
}

fn impedance(
    input: &Path,
    dt: f64,
    source: ImpedanceSource,
    delimiter: Delimiter,
    output: Option<PathBuf>,
) -> Result<()> {
    let dir = output_dir(input, output)?;
    let corrected = pipeline::impedance_tool(input, delimiter, dt, source, &dir)
        .with_context(|| format!("impedance dispersion of {}", input.display()))?;

    println!("Trace: {}", input.display());
    println!("Points: {}", corrected.z.len());
    if let (Some(first), Some(last)) = (corrected.z.values.first(), corrected.z.values.last()) {
        println!("Z at start: {:.4} {:+.4}j ohm", first.re, first.im);
        println!("Z at stop: {:.4} {:+.4}j ohm", last.re, last.im);
    }
    println!("Corrected records written to {}", dir.display());
    Ok(())
}

fn print_report(report: &RunReport) {
    for (i, probe) in report.probes.iter().enumerate() {
        println!("Probe {}:", i + 1);
        println!("  Points: {}", probe.len());
        println!("  Phase jumps: {}", probe.phase.jumps.len());
        println!("  Delay time: {:e} s", probe.delay.refined);
    }
    if let Some(dut) = &report.dut {
        print_dut(dut);
    }
    for path in &report.written {
        println!("  wrote {}", path.display());
    }
}

fn print_dut(dut: &DutDeembedding) {
    match dut {
        DutDeembedding::OnePort(out) => {
            println!("DUT (one-port): {} points", out.s11.len());
        }
        DutDeembedding::TwoPort(out) => {
            println!("DUT (two-port): {} points", out.s21.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refine_options_defaults() {
        let options = refine_options(None, None).unwrap();
        assert_eq!(options, NelderMeadOptions::default());
    }

    #[test]
    fn test_refine_options_overrides() {
        let options = refine_options(Some(50), Some(1e-8)).unwrap();
        assert_eq!(options.max_iterations, 50);
        assert_eq!(options.f_tolerance, 1e-8);
        assert_eq!(options.alpha, NelderMeadOptions::default().alpha);
    }

    #[test]
    fn test_refine_options_rejects_bad_values() {
        assert!(refine_options(Some(0), None).is_err());
        assert!(refine_options(None, Some(-1e-6)).is_err());
        assert!(refine_options(None, Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_delay_flags_parse() {
        let cli = Cli::try_parse_from([
            "deembed",
            "delay",
            "trace.csv",
            "--f-start",
            "1e9",
            "--f-stop",
            "2e9",
            "--max-iterations",
            "40",
            "--ftol",
            "1e-9",
        ])
        .unwrap();
        match cli.command {
            Commands::Delay {
                max_iterations,
                ftol,
                ..
            } => {
                assert_eq!(max_iterations, Some(40));
                assert_eq!(ftol, Some(1e-9));
            }
            _ => panic!("expected the delay command"),
        }
    }
}

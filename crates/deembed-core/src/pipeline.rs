//! Pipeline module - composition of the de-embedding stages over record files
//!
//! ```text
//! MS11S/O/L ─┐
//!            ├─ ErrorModelSolver ─ TransmissionReconstructor ─ Probe_1.s2p
//! S11S/O/L ──┘                                                     │
//! MS11 (MS21, MS12, MS22) ─────────── NetworkCascadeDeembedder ────┴─ S11A / S21A
//! ```

use std::path::{Path, PathBuf};

use crate::calibration::{ErrorModelSolver, ProbeReflections, StandardSet};
use crate::config::{DeembedConfig, Terminations, VnaMode};
use crate::deembed::{NetworkCascadeDeembedder, OnePortDeembedding, TwoPortDeembedding};
use crate::delay::{
    delay_corrected_impedance, extract_delay, DelayCorrected, DelayExtraction, DelayTimeRefiner,
    ImpedanceSource,
};
use crate::error::{DeembedError, Result};
use crate::math::{CubicSplineInterpolator, SweepInterpolator};
use crate::network::Network;
use crate::phase::PhaseUnwrapper;
use crate::probe::{ProbeNetworkModel, TransmissionReconstructor};
use crate::records::{read_dispersion, save_dispersion, save_phase, Delimiter, Layout};

/// Record name prefixes of probe `index` (1 or 2): readings through the
/// standards and the separately measured standards
fn probe_prefixes(index: u8) -> (&'static str, &'static str) {
    match index {
        1 => ("MS11", "S11"),
        _ => ("MS22", "S22"),
    }
}

/// Characterize one probe: 3-term solve followed by transmission reconstruction
pub fn characterize_probe<I: SweepInterpolator + ?Sized>(
    readings: &ProbeReflections,
    standards: &StandardSet,
    solver: &ErrorModelSolver,
    reconstructor: &TransmissionReconstructor,
    interpolator: &I,
) -> Result<ProbeNetworkModel> {
    let solution = solver.solve(readings, standards, interpolator)?;
    reconstructor.reconstruct(&solution)
}

/// Readings of probe `index` through SHORT/OPEN/LOAD and the standards to use
pub fn load_probe_inputs(
    config: &DeembedConfig,
    index: u8,
) -> Result<(ProbeReflections, StandardSet)> {
    let (reading, standard) = probe_prefixes(index);
    let delim = config.delimiters.input;
    let read = |prefix: &str, tag: &str| {
        read_dispersion(config.path(&format!("{}{}.csv", prefix, tag)), delim)
    };

    let readings = ProbeReflections::new(
        read(reading, "S")?,
        read(reading, "O")?,
        read(reading, "L")?,
    )?;
    let standards = match config.terminations {
        Terminations::Ideal => StandardSet::ideal(),
        Terminations::Measured => StandardSet::measured(
            read(standard, "S")?,
            read(standard, "O")?,
            read(standard, "L")?,
        ),
    };
    Ok((readings, standards))
}

/// Write the phase records and the S2P model of probe `index`
pub fn write_probe_outputs(
    config: &DeembedConfig,
    index: u8,
    probe: &ProbeNetworkModel,
) -> Result<Vec<PathBuf>> {
    let delim = config.delimiters.output;
    let f = probe.frequency.f();

    let initial = config.path(&format!("Probe_{}_phase_initial.csv", index));
    save_phase(&initial, delim, f, &probe.phase.initial)?;
    let unwrapped = config.path(&format!("Probe_{}_phase_unwrapped.csv", index));
    save_phase(&unwrapped, delim, f, &probe.phase.unwrapped)?;
    let s2p = config.path(&format!("Probe_{}.s2p", index));
    probe.write_s2p(&s2p, delim)?;

    Ok(vec![initial, unwrapped, s2p])
}

/// De-embedded device data
#[derive(Debug, Clone)]
pub enum DutDeembedding {
    OnePort(OnePortDeembedding),
    TwoPort(TwoPortDeembedding),
}

/// Everything a run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub probes: Vec<ProbeNetworkModel>,
    pub dut: Option<DutDeembedding>,
    pub written: Vec<PathBuf>,
}

/// De-embed the DUT records of the folder with the given probe models
///
/// One probe de-embeds `MS11` into `S11A` and `ZA_from_S11A`; two probes
/// de-embed `MS11/MS21/MS12/MS22` into `S21A` and `ZA_from_S21A`.
pub fn deembed_dut(
    config: &DeembedConfig,
    probes: &[Network],
) -> Result<(DutDeembedding, Vec<PathBuf>)> {
    let deembedder = NetworkCascadeDeembedder::new(config.failure_policy);
    let (input, output) = (config.delimiters.input, config.delimiters.output);
    let read = |name: &str| read_dispersion(config.path(name), input);

    match probes {
        [probe] => {
            let result = deembedder.one_port(&read("MS11.csv")?, probe)?;
            let s_path = config.path("S11A.csv");
            let z_path = config.path("ZA_from_S11A.csv");
            save_dispersion(&s_path, output, Layout::SParameter, &result.s11)?;
            save_dispersion(&z_path, output, Layout::Impedance, &result.z)?;
            Ok((DutDeembedding::OnePort(result), vec![s_path, z_path]))
        }
        [probe1, probe2] => {
            let (s11, s21) = (read("MS11.csv")?, read("MS21.csv")?);
            let (s12, s22) = (read("MS12.csv")?, read("MS22.csv")?);
            for (d, name) in [(&s21, "MS21"), (&s12, "MS12"), (&s22, "MS22")] {
                s11.frequency.ensure_matches(&d.frequency, name)?;
            }
            let mut measured = Network::from_two_port(
                s11.frequency.clone(),
                &s11.values,
                &s21.values,
                &s12.values,
                &s22.values,
            )?;
            measured.name = Some("DUT".to_string());

            let result = deembedder.two_port(&measured, probe1, probe2)?;
            let s_path = config.path("S21A.csv");
            let z_path = config.path("ZA_from_S21A.csv");
            save_dispersion(&s_path, output, Layout::SParameter, &result.s21)?;
            save_dispersion(&z_path, output, Layout::Impedance, &result.z)?;
            Ok((DutDeembedding::TwoPort(result), vec![s_path, z_path]))
        }
        _ => Err(DeembedError::InvalidInput(format!(
            "de-embedding needs 1 or 2 probe models, got {}",
            probes.len()
        ))),
    }
}

/// Characterize the configured probes and, in manual mode, de-embed the DUT
pub fn run(config: &DeembedConfig) -> Result<RunReport> {
    config.validate()?;
    let solver = ErrorModelSolver::new(config.failure_policy);
    let reconstructor = config.reconstructor();
    let mut report = RunReport::default();

    for index in 1..=config.probes {
        tracing::info!(probe = index, "characterizing probe");
        let (readings, standards) = load_probe_inputs(config, index)?;
        let probe = characterize_probe(
            &readings,
            &standards,
            &solver,
            &reconstructor,
            &CubicSplineInterpolator,
        )?;
        report
            .written
            .extend(write_probe_outputs(config, index, &probe)?);
        report.probes.push(probe);
    }

    if config.vna_mode == VnaMode::Manual {
        let networks = report
            .probes
            .iter()
            .map(ProbeNetworkModel::to_network)
            .collect::<Result<Vec<_>>>()?;
        let (dut, written) = deembed_dut(config, &networks)?;
        report.dut = Some(dut);
        report.written.extend(written);
    }

    tracing::info!(files = report.written.len(), "run complete");
    Ok(report)
}

/// De-embed the DUT records with probe models saved by an earlier run
/// (`Probe_1.s2p`, and `Probe_2.s2p` with two probes)
pub fn apply_saved_probes(config: &DeembedConfig) -> Result<(DutDeembedding, Vec<PathBuf>)> {
    config.validate()?;
    let probes = (1..=config.probes)
        .map(|index| {
            let path = config.path(&format!("Probe_{}.s2p", index));
            tracing::debug!(path = %path.display(), "loading probe model");
            Network::from_touchstone(&path).map_err(DeembedError::from)
        })
        .collect::<Result<Vec<_>>>()?;
    deembed_dut(config, &probes)
}

/// Delay time of a measured trace over `[f_start, f_stop]` (Hz)
///
/// Writes `Phase_initial.csv` and `Phase_unwrapped.csv` into `out_dir`.
pub fn delay_tool(
    input: &Path,
    delimiter: Delimiter,
    f_start: f64,
    f_stop: f64,
    unwrapper: &PhaseUnwrapper,
    refiner: &DelayTimeRefiner,
    out_dir: &Path,
) -> Result<DelayExtraction> {
    let s = read_dispersion(input, delimiter)?;
    let extraction = extract_delay(&s, f_start, f_stop, unwrapper, refiner)?;

    let f = extraction.trace.f();
    save_phase(
        out_dir.join("Phase_initial.csv"),
        delimiter,
        f,
        &extraction.phase.initial,
    )?;
    save_phase(
        out_dir.join("Phase_unwrapped.csv"),
        delimiter,
        f,
        &extraction.phase.unwrapped,
    )?;
    Ok(extraction)
}

/// Delay-corrected S-parameter and impedance dispersion of a measured trace
///
/// Writes `S_corrected.csv` and `Z_corrected.csv` into `out_dir`.
pub fn impedance_tool(
    input: &Path,
    delimiter: Delimiter,
    dt: f64,
    source: ImpedanceSource,
    out_dir: &Path,
) -> Result<DelayCorrected> {
    let s = read_dispersion(input, delimiter)?;
    let corrected = delay_corrected_impedance(&s, dt, source)?;

    save_dispersion(
        out_dir.join("S_corrected.csv"),
        delimiter,
        Layout::CorrectedS,
        &corrected.s,
    )?;
    save_dispersion(
        out_dir.join("Z_corrected.csv"),
        delimiter,
        Layout::CorrectedZ,
        &corrected.z,
    )?;
    Ok(corrected)
}

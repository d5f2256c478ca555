//! Pipeline Tests
//!
//! Full runs over a folder of synthetic analyzer records.

use anyhow::Result;
use approx::assert_relative_eq;
use deembed_core::calibration::ErrorTerms;
use deembed_core::config::{DeembedConfig, Terminations, VnaMode};
use deembed_core::delay::{DelayTimeRefiner, ImpedanceSource};
use deembed_core::dispersion::Dispersion;
use deembed_core::frequency::{Frequency, FrequencyUnit};
use deembed_core::network::Network;
use deembed_core::phase::PhaseUnwrapper;
use deembed_core::pipeline::{apply_saved_probes, delay_tool, impedance_tool, run, DutDeembedding};
use deembed_core::records::{read_dispersion, save_dispersion, Delimiter, Layout};
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

const SERIES_R: f64 = 20.0;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir =
        std::env::temp_dir().join(format!("deembed-pipeline-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn sweep() -> Frequency {
    Frequency::new(1.0, 3.0, 81, FrequencyUnit::GHz)
}

fn probe(freq: &Frequency, tau: f64, s11: Complex64, s22: Complex64) -> Network {
    let n = freq.npoints();
    let s21: Array1<Complex64> = freq
        .f()
        .iter()
        .map(|&f| Complex64::from_polar(0.9, -2.0 * PI * f * tau))
        .collect();
    Network::from_two_port(
        freq.clone(),
        &Array1::from_elem(n, s11),
        &s21,
        &s21,
        &Array1::from_elem(n, s22),
    )
    .unwrap()
}

fn probe_1(freq: &Frequency) -> Network {
    probe(freq, 0.1e-9, c(0.05, -0.02), c(-0.03, 0.01))
}

fn probe_2(freq: &Frequency) -> Network {
    probe(freq, 0.15e-9, c(0.02, 0.04), c(0.01, -0.05))
}

fn save(dir: &Path, name: &str, freq: &Frequency, values: Array1<Complex64>) {
    let d = Dispersion::new(freq.clone(), values).unwrap();
    save_dispersion(dir.join(name), Delimiter::Comma, Layout::Complex, &d).unwrap();
}

/// `MS11S/O/L` (or `MS22S/O/L`) records for terminations `known`
fn save_readings(dir: &Path, prefix: &str, p: &Network, known: [Complex64; 3]) {
    let terms: Vec<ErrorTerms> = (0..p.nfreq())
        .map(|i| {
            ErrorTerms::from_s(
                p.s[[i, 0, 0]],
                p.s[[i, 1, 0]],
                p.s[[i, 0, 1]],
                p.s[[i, 1, 1]],
            )
        })
        .collect();
    for (tag, gamma) in ["S", "O", "L"].iter().zip(known) {
        let values = terms.iter().map(|t| t.measured(gamma)).collect();
        save(dir, &format!("{}{}.csv", prefix, tag), &p.frequency, values);
    }
}

fn series_resistor(freq: &Frequency) -> Network {
    let n = freq.npoints();
    let s21 = Array1::from_elem(n, c(100.0 / (100.0 + SERIES_R), 0.0));
    let s11 = Array1::from_elem(n, c(SERIES_R / (100.0 + SERIES_R), 0.0));
    Network::from_two_port(freq.clone(), &s11, &s21, &s21, &s11).unwrap()
}

fn assert_series_resistance(path: &Path) {
    let z = read_dispersion(path, Delimiter::Comma).unwrap();
    assert_eq!(z.len(), 81);
    for v in z.values.iter() {
        assert_relative_eq!(v.re, SERIES_R, epsilon = 1e-6);
        assert_relative_eq!(v.im, 0.0, epsilon = 1e-6);
    }
}

#[test]
fn test_two_probe_manual_run() -> Result<()> {
    let dir = scratch_dir("two-probe");
    let freq = sweep();
    let (p1, p2) = (probe_1(&freq), probe_2(&freq));
    let ideal = [c(-1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)];
    save_readings(&dir, "MS11", &p1, ideal);
    save_readings(&dir, "MS22", &p2, ideal);

    let measured = p1
        .cascade(&series_resistor(&freq))?
        .cascade(&p2.flipped()?)?;
    let ports: [(&str, usize, usize); 4] =
        [("MS11", 0, 0), ("MS21", 1, 0), ("MS12", 0, 1), ("MS22", 1, 1)];
    for (name, i, j) in ports {
        let values = measured.s.slice(ndarray::s![.., i, j]).to_owned();
        save(&dir, &format!("{}.csv", name), &freq, values);
    }

    let mut config = DeembedConfig::new(&dir);
    config.vna_mode = VnaMode::Manual;
    let report = run(&config)?;

    assert_eq!(report.probes.len(), 2);
    for name in [
        "Probe_1_phase_initial.csv",
        "Probe_1_phase_unwrapped.csv",
        "Probe_1.s2p",
        "Probe_2.s2p",
        "S21A.csv",
        "ZA_from_S21A.csv",
    ] {
        assert!(dir.join(name).exists(), "{} missing", name);
    }
    assert_eq!(report.written.len(), 8);
    match report.dut {
        Some(DutDeembedding::TwoPort(ref out)) => {
            assert_relative_eq!(out.s21.values[40].re, 100.0 / 120.0, epsilon = 1e-9);
        }
        ref other => panic!("unexpected device result: {other:?}"),
    }
    assert_series_resistance(&dir.join("ZA_from_S21A.csv"));

    // The saved models reproduce the result without the standards
    fs::remove_file(dir.join("ZA_from_S21A.csv"))?;
    let (_, written) = apply_saved_probes(&config)?;
    assert_eq!(written.len(), 2);
    assert_series_resistance(&dir.join("ZA_from_S21A.csv"));

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_automatic_mode_skips_device() -> Result<()> {
    let dir = scratch_dir("automatic");
    let freq = sweep();
    let ideal = [c(-1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)];
    save_readings(&dir, "MS11", &probe_1(&freq), ideal);

    let mut config = DeembedConfig::new(&dir);
    config.probes = 1;
    let report = run(&config)?;
    assert!(report.dut.is_none());
    assert_eq!(report.written.len(), 3);
    assert!(!dir.join("S11A.csv").exists());

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_one_probe_with_measured_terminations() -> Result<()> {
    let dir = scratch_dir("one-probe");
    let freq = sweep();
    let p1 = probe_1(&freq);
    let known = [c(-0.98, 0.01), c(0.99, -0.02), c(0.02, 0.005)];
    save_readings(&dir, "MS11", &p1, known);

    // Standards measured on a coarser grid
    let coarse = Frequency::new(0.5, 3.5, 13, FrequencyUnit::GHz);
    for (tag, gamma) in ["S", "O", "L"].iter().zip(known) {
        save(
            &dir,
            &format!("S11{}.csv", tag),
            &coarse,
            Array1::from_elem(13, gamma),
        );
    }

    let gamma = c(0.2, 0.1);
    let device: Array1<Complex64> = (0..freq.npoints())
        .map(|i| {
            ErrorTerms::from_s(
                p1.s[[i, 0, 0]],
                p1.s[[i, 1, 0]],
                p1.s[[i, 0, 1]],
                p1.s[[i, 1, 1]],
            )
            .measured(gamma)
        })
        .collect();
    save(&dir, "MS11.csv", &freq, device);

    let mut config = DeembedConfig::new(&dir);
    config.probes = 1;
    config.terminations = Terminations::Measured;
    config.vna_mode = VnaMode::Manual;
    run(&config)?;

    let s11 = read_dispersion(dir.join("S11A.csv"), Delimiter::Comma)?;
    for v in s11.values.iter() {
        assert_relative_eq!(v.re, gamma.re, epsilon = 1e-9);
        assert_relative_eq!(v.im, gamma.im, epsilon = 1e-9);
    }
    let z = read_dispersion(dir.join("ZA_from_S11A.csv"), Delimiter::Comma)?;
    let want = 50.0 * (c(1.0, 0.0) + gamma) / (c(1.0, 0.0) - gamma);
    assert_relative_eq!(z.values[0].re, want.re, epsilon = 1e-6);
    assert_relative_eq!(z.values[0].im, want.im, epsilon = 1e-6);

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_missing_record_fails_run() {
    let dir = scratch_dir("missing");
    let config = DeembedConfig::new(&dir);
    assert!(matches!(run(&config), Err(deembed_core::DeembedError::Io(_))));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_delay_and_impedance_tools() -> Result<()> {
    let dir = scratch_dir("tools");
    let dt = 0.3e-9;
    let gamma = -1.0 / 3.0;
    let freq = Frequency::new(1.0, 3.0, 101, FrequencyUnit::GHz);
    let values = freq
        .f()
        .iter()
        .map(|&f| Complex64::from_polar(gamma, -2.0 * PI * f * dt))
        .collect();
    save(&dir, "trace.csv", &freq, values);
    let input = dir.join("trace.csv");

    let extraction = delay_tool(
        &input,
        Delimiter::Comma,
        1.0e9,
        2.0e9,
        &PhaseUnwrapper::default(),
        &DelayTimeRefiner::default(),
        &dir,
    )?;
    assert_eq!(extraction.trace.len(), 51);
    assert!((extraction.delay.refined - dt).abs() < 1e-12);
    let unwrapped = fs::read_to_string(dir.join("Phase_unwrapped.csv"))?;
    assert_eq!(unwrapped.lines().count(), 51);
    assert!(dir.join("Phase_initial.csv").exists());

    let corrected = impedance_tool(
        &input,
        Delimiter::Comma,
        extraction.delay.refined,
        ImpedanceSource::S11,
        &dir,
    )?;
    assert_relative_eq!(corrected.z.values[50].re, 25.0, epsilon = 1e-4);
    let z_rows = fs::read_to_string(dir.join("Z_corrected.csv"))?;
    let first: Vec<f64> = z_rows
        .lines()
        .next()
        .unwrap()
        .split(',')
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(first.len(), 4);
    assert_relative_eq!(first[1], 25.0, epsilon = 1e-4);
    assert!(dir.join("S_corrected.csv").exists());

    fs::remove_dir_all(&dir)?;
    Ok(())
}

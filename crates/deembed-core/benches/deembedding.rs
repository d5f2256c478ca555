//! Benchmarks for probe characterization and de-embedding
//!
//! Tests performance of the 3-term solve, transmission reconstruction,
//! phase unwrapping and two-probe de-embedding over sweep length.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deembed_core::calibration::{ErrorModelSolver, ErrorTerms, ProbeReflections, StandardSet};
use deembed_core::dispersion::Dispersion;
use deembed_core::frequency::{Frequency, FrequencyUnit};
use deembed_core::math::CubicSplineInterpolator;
use deembed_core::phase::PhaseUnwrapper;
use deembed_core::{Network, NetworkCascadeDeembedder, TransmissionReconstructor};
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Reciprocal probe with a one-way delay of `tau`
fn create_probe(nfreq: usize, tau: f64) -> Network {
    let freq = Frequency::new(1.0, 10.0, nfreq, FrequencyUnit::GHz);
    let s21: Array1<Complex64> = freq
        .f()
        .iter()
        .map(|&f| Complex64::from_polar(0.9, -2.0 * PI * f * tau))
        .collect();
    let s11 = Array1::from_elem(nfreq, Complex64::new(0.05, -0.02));
    let s22 = Array1::from_elem(nfreq, Complex64::new(-0.03, 0.01));
    Network::from_two_port(freq, &s11, &s21, &s21, &s22).unwrap()
}

fn create_readings(probe: &Network) -> ProbeReflections {
    let terms: Vec<ErrorTerms> = (0..probe.nfreq())
        .map(|i| {
            ErrorTerms::from_s(
                probe.s[[i, 0, 0]],
                probe.s[[i, 1, 0]],
                probe.s[[i, 0, 1]],
                probe.s[[i, 1, 1]],
            )
        })
        .collect();
    let reading = |gamma: f64| {
        let values = terms
            .iter()
            .map(|t| t.measured(Complex64::new(gamma, 0.0)))
            .collect();
        Dispersion::new(probe.frequency.clone(), values).unwrap()
    };
    ProbeReflections::new(reading(-1.0), reading(1.0), reading(0.0)).unwrap()
}

fn bench_error_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("error_model_solve");

    for nfreq in [101, 401, 1601].iter() {
        let readings = create_readings(&create_probe(*nfreq, 0.2e-9));
        let solver = ErrorModelSolver::default();
        let standards = StandardSet::ideal();
        let id = BenchmarkId::from_parameter(nfreq);

        group.bench_with_input(id, nfreq, |b, _| {
            b.iter(|| {
                black_box(solver.solve(&readings, &standards, &CubicSplineInterpolator))
            })
        });
    }

    group.finish();
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");

    for nfreq in [101, 401, 1601].iter() {
        let readings = create_readings(&create_probe(*nfreq, 0.2e-9));
        let solution = ErrorModelSolver::default()
            .solve(&readings, &StandardSet::ideal(), &CubicSplineInterpolator)
            .unwrap();
        let reconstructor = TransmissionReconstructor::default();
        let id = BenchmarkId::from_parameter(nfreq);

        group.bench_with_input(id, nfreq, |b, _| {
            b.iter(|| black_box(reconstructor.reconstruct(&solution)))
        });
    }

    group.finish();
}

fn bench_unwrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("unwrap");

    for nfreq in [101, 1001, 10001].iter() {
        let f: Vec<f64> = (0..*nfreq).map(|i| 1e9 + i as f64 * 1e6).collect();
        let re: Vec<f64> = f.iter().map(|&x| (-2.0 * PI * x * 1.3e-9).cos()).collect();
        let im: Vec<f64> = f.iter().map(|&x| (-2.0 * PI * x * 1.3e-9).sin()).collect();
        let unwrapper = PhaseUnwrapper::default();
        let id = BenchmarkId::from_parameter(nfreq);

        group.bench_with_input(id, nfreq, |b, _| {
            b.iter(|| black_box(unwrapper.unwrap(&f, &re, &im)))
        });
    }

    group.finish();
}

fn bench_two_port(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_port_deembed");

    for nfreq in [101, 1001, 10001].iter() {
        let p1 = create_probe(*nfreq, 0.1e-9);
        let p2 = create_probe(*nfreq, 0.15e-9);
        let measured = p1.cascade(&p2.flipped().unwrap()).unwrap();
        let deembedder = NetworkCascadeDeembedder::default();
        let id = BenchmarkId::from_parameter(nfreq);

        group.bench_with_input(id, nfreq, |b, _| {
            b.iter(|| black_box(deembedder.two_port(&measured, &p1, &p2)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_error_model,
    bench_reconstruct,
    bench_unwrap,
    bench_two_port
);
criterion_main!(benches);

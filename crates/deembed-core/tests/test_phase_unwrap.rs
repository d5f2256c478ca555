//! Phase Unwrapping Tests
//!
//! Jump detection and both jump removal strategies on synthetic traces.

use approx::assert_relative_eq;
use deembed_core::phase::{
    count_jumps, detect_jumps, PhaseJump, PhaseUnwrapper, SlopeFit, UnwrapMode,
};
use deembed_core::DeembedError;
use std::f64::consts::PI;

fn wrap(p: f64) -> f64 {
    p.sin().atan2(p.cos())
}

/// Five points from 1.0 to 1.4 GHz with one pi jump between index 2 and 3
fn pi_jump_trace() -> (Vec<f64>, Vec<f64>) {
    let f = vec![1.0e9, 1.1e9, 1.2e9, 1.3e9, 1.4e9];
    let phase = vec![-0.5, -0.9, -1.3, -1.7 + PI, -2.1 + PI];
    (f, phase)
}

#[test]
fn test_single_pi_jump_detected() {
    let (_, phase) = pi_jump_trace();
    assert_eq!(detect_jumps(&phase), vec![PhaseJump { left: 2, right: 3 }]);
}

#[test]
fn test_gradient_shift_recovers_pre_jump_line() {
    let (f, phase) = pi_jump_trace();
    let out = PhaseUnwrapper::default().unwrap_phase(&f, &phase).unwrap();

    let expected = [-0.5, -0.9, -1.3, -1.7, -2.1];
    for (got, want) in out.unwrapped.iter().zip(expected) {
        assert_relative_eq!(*got, want, epsilon = 1e-9);
    }
    assert_relative_eq!(out.slope, -4e-9, max_relative = 1e-9);
    assert_eq!(out.slope_sign, -1);
    assert_relative_eq!(out.delay_time, 4e-9 / (2.0 * PI), max_relative = 1e-9);
    assert_eq!(out.initial, phase);
}

#[test]
fn test_fixed_multiple_removes_pi() {
    let (f, phase) = pi_jump_trace();
    let out = PhaseUnwrapper::new(UnwrapMode::FixedMultiple { phase_factor: 1 })
        .unwrap_phase(&f, &phase)
        .unwrap();
    assert_relative_eq!(out.unwrapped[3], -1.7, epsilon = 1e-12);
    assert_relative_eq!(out.unwrapped[4], -2.1, epsilon = 1e-12);
}

#[test]
fn test_jump_free_trace_is_unchanged() {
    let f: Vec<f64> = (0..20).map(|i| 1e9 + i as f64 * 1e7).collect();
    let phase: Vec<f64> = f.iter().map(|&x| 0.3 - 1e-10 * (x - 1e9)).collect();
    let out = PhaseUnwrapper::default().unwrap_phase(&f, &phase).unwrap();
    assert!(out.jumps.is_empty());
    assert_eq!(out.unwrapped, phase);
}

#[test]
fn test_ramp_recovered_up_to_global_turn() {
    let dt0 = 1.3e-9;
    let f: Vec<f64> = (0..101).map(|i| 1e9 + i as f64 * 1e7).collect();
    let truth: Vec<f64> = f.iter().map(|&x| -2.0 * PI * x * dt0).collect();
    let re: Vec<f64> = truth.iter().map(|p| p.cos()).collect();
    let im: Vec<f64> = truth.iter().map(|p| p.sin()).collect();

    assert!(count_jumps(&re, &im).unwrap() > 0);

    let out = PhaseUnwrapper::default().unwrap(&f, &re, &im).unwrap();
    let offset = out.unwrapped[0] - truth[0];
    let turns = offset / (2.0 * PI);
    assert_relative_eq!(turns, turns.round(), epsilon = 1e-9);
    for (u, t) in out.unwrapped.iter().zip(&truth) {
        assert_relative_eq!(u - t, offset, epsilon = 1e-8);
    }
    assert_relative_eq!(out.delay_time, dt0, max_relative = 1e-9);
}

#[test]
fn test_wrapped_ramp_with_two_pi_multiples() {
    let dt0 = 0.9e-9;
    let f: Vec<f64> = (0..61).map(|i| 2e9 + i as f64 * 2e7).collect();
    let phase: Vec<f64> = f.iter().map(|&x| wrap(-2.0 * PI * x * dt0)).collect();

    let out = PhaseUnwrapper::new(UnwrapMode::FixedMultiple { phase_factor: 2 })
        .with_slope_fit(SlopeFit::Intercept)
        .unwrap_phase(&f, &phase)
        .unwrap();
    assert!(!out.jumps.is_empty());
    assert!(out.unwrapped.windows(2).all(|w| w[1] < w[0]));
    assert_relative_eq!(out.delay_time, dt0, max_relative = 1e-9);
}

#[test]
fn test_invalid_inputs() {
    let unwrapper = PhaseUnwrapper::default();
    assert!(matches!(
        unwrapper.unwrap_phase(&[1e9, 2e9], &[0.1, 0.2]),
        Err(DeembedError::InvalidInput(_))
    ));
    assert!(matches!(
        unwrapper.unwrap_phase(&[1e9, 2e9, 3e9], &[0.1, f64::NAN, 0.2]),
        Err(DeembedError::InvalidInput(_))
    ));
    assert!(matches!(
        PhaseUnwrapper::new(UnwrapMode::FixedMultiple { phase_factor: 3 })
            .unwrap_phase(&[1e9, 2e9, 3e9], &[0.1, 0.2, 0.3]),
        Err(DeembedError::InvalidInput(_))
    ));
}

//! Error types shared by every stage of the de-embedding pipeline.

use thiserror::Error;

use crate::touchstone::parser::TouchstoneError;

/// Stage of the pipeline that owns a linear system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// 3-term one-port error model solve
    ErrorModel,
    /// Cascade (chain) matrix construction or inversion
    Cascade,
    /// Bilinear one-port inversion
    OnePort,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::ErrorModel => write!(f, "3-term error model"),
            Stage::Cascade => write!(f, "cascade matrix"),
            Stage::OnePort => write!(f, "one-port inversion"),
        }
    }
}

/// De-embedding errors
#[derive(Error, Debug)]
pub enum DeembedError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Singular {stage} system{}", at_index(.index))]
    SingularSystem { stage: Stage, index: Option<usize> },

    #[error("At frequency index {index}: {source}")]
    AtPoint {
        index: usize,
        source: Box<DeembedError>,
    },

    #[error("Phase unwrap ambiguity: {0}")]
    PhaseUnwrapAmbiguity(String),

    #[error(
        "Delay-time refinement did not converge after {iterations} iterations \
         (best dt = {best_dt:e} s, J = {best_value:e})"
    )]
    OptimizationNonConvergence {
        best_dt: f64,
        best_value: f64,
        iterations: usize,
    },

    #[error("{}", sweep_summary(.0))]
    SweepFailures(Vec<(usize, DeembedError)>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Touchstone(#[from] TouchstoneError),
}

impl DeembedError {
    /// Singular system without a known frequency index
    pub fn singular(stage: Stage) -> Self {
        DeembedError::SingularSystem { stage, index: None }
    }

    /// Attach a frequency index to a point-level failure.
    ///
    /// Singular systems carry the index themselves; any other error is
    /// wrapped unless it already names a point.
    pub fn at(self, index: usize) -> Self {
        match self {
            DeembedError::SingularSystem { stage, .. } => DeembedError::SingularSystem {
                stage,
                index: Some(index),
            },
            e @ (DeembedError::AtPoint { .. } | DeembedError::SweepFailures(_)) => e,
            other => DeembedError::AtPoint {
                index,
                source: Box::new(other),
            },
        }
    }

    /// Frequency index the failure is scoped to, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            DeembedError::SingularSystem { index, .. } => *index,
            DeembedError::AtPoint { index, .. } => Some(*index),
            DeembedError::SweepFailures(failures) => failures.first().map(|(i, _)| *i),
            _ => None,
        }
    }
}

fn at_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" at frequency index {}", i),
        None => String::new(),
    }
}

fn sweep_summary(failures: &[(usize, DeembedError)]) -> String {
    match failures.first() {
        Some((i, e)) => format!(
            "{} frequency point(s) failed, first at index {}: {}",
            failures.len(),
            i,
            e
        ),
        None => "0 frequency point(s) failed".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, DeembedError>;

//! Per-frequency evaluation with a batch failure policy
//!
//! Every point of a sweep is solved independently. With the `parallel`
//! feature the points are evaluated on the rayon pool; results are always
//! returned in index order.

use serde::{Deserialize, Serialize};

use crate::error::{DeembedError, Result};

/// What to do when individual frequency points fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Report the lowest failing index
    #[default]
    FailFast,
    /// Report every failing index as [`DeembedError::SweepFailures`]
    Collect,
}

/// Evaluate `point` at every index `0..n` under `policy`
pub fn map_points<T, F>(n: usize, policy: FailurePolicy, point: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    let results = evaluate(n, point);

    match policy {
        FailurePolicy::FailFast => results.into_iter().collect(),
        FailurePolicy::Collect => {
            let mut values = Vec::with_capacity(n);
            let mut failures = Vec::new();
            for (i, r) in results.into_iter().enumerate() {
                match r {
                    Ok(v) => values.push(v),
                    Err(e) => failures.push((i, e)),
                }
            }
            if failures.is_empty() {
                Ok(values)
            } else {
                tracing::warn!(
                    failed = failures.len(),
                    total = n,
                    "frequency points failed"
                );
                Err(DeembedError::SweepFailures(failures))
            }
        }
    }
}

#[cfg(feature = "parallel")]
fn evaluate<T, F>(n: usize, point: F) -> Vec<Result<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    use rayon::prelude::*;
    (0..n).into_par_iter().map(|i| point(i)).collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate<T, F>(n: usize, point: F) -> Vec<Result<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    (0..n).map(point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    fn odd_fails(i: usize) -> Result<usize> {
        if i % 2 == 1 {
            Err(DeembedError::singular(Stage::ErrorModel).at(i))
        } else {
            Ok(i * 10)
        }
    }

    #[test]
    fn test_all_points_ok_in_order() {
        let out = map_points(5, FailurePolicy::Collect, |i| Ok(i * 2)).unwrap();
        assert_eq!(out, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_fail_fast_reports_first_index() {
        let err = map_points(6, FailurePolicy::FailFast, odd_fails).unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert!(matches!(err, DeembedError::SingularSystem { .. }));
    }

    #[test]
    fn test_collect_reports_every_index() {
        let err = map_points(6, FailurePolicy::Collect, odd_fails).unwrap_err();
        match err {
            DeembedError::SweepFailures(failures) => {
                let indices: Vec<usize> = failures.iter().map(|(i, _)| *i).collect();
                assert_eq!(indices, vec![1, 3, 5]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

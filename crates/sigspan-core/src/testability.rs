//! # Testability Controller
//!
//! Finds the minimum frequency a pattern must reach so that testing every
//! pattern at that frequency keeps the family-wise error rate below `alpha`
//! (Tarone's testability criterion).
//!
//! The database splits into `n1` graphs of the class of interest and `n2`
//! others. A pattern with frequency `f` can at best reach the p-value
//! `phi(f)` ([`min_p_value`]); it is *testable* at level `alpha` when
//! `phi(f) <= alpha`. With `m(f)` the number of patterns of frequency at
//! least `f`, the sought threshold is the smallest `f` with
//! `m(f) × phi(f) <= alpha`.
//!
//! Four strategies search for it, each treating the miner as an oracle:
//!
//! | Strategy | Oracle |
//! |---|---|
//! | [`single_pass`] | one full run, frequencies inspected afterwards |
//! | [`decreasing_bound`] | pattern count per frequency, scanned downwards |
//! | [`early_termination`] | budgeted count, scanned upwards |
//! | [`bisection`] | budgeted count, integer bisection |

use crate::miner::Miner;
use crate::{Frequency, SigspanError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// MINIMUM P-VALUE
// =============================================================================

/// The smallest p-value a pattern of frequency `f` can reach:
/// `C(n1, f) / C(n1 + n2, f)` for `f <= n1`, `1 / C(n1 + n2, n1)` above.
///
/// Computed as a running product starting at `n1 / (n1 + n2)`, so every
/// intermediate value stays in `[0, 1]`.
///
/// # Errors
/// `PreconditionViolated` unless `f < n1 + n2` and `n1 > 0`.
pub fn min_p_value(n1: Frequency, n2: Frequency, f: Frequency) -> Result<f64, SigspanError> {
    let total = u64::from(n1) + u64::from(n2);
    if n1 == 0 {
        return Err(SigspanError::PreconditionViolated(
            "n1 must be positive".to_string(),
        ));
    }
    if u64::from(f) >= total {
        return Err(SigspanError::PreconditionViolated(format!(
            "frequency {} must be below n1 + n2 = {}",
            f, total
        )));
    }

    let (n1, f) = (u64::from(n1), u64::from(f));
    let (base1, base2, len) = if f <= n1 {
        (n1 - f + 1, total - f + 1, f.saturating_sub(1))
    } else {
        (1, total - n1 + 1, n1 - 1)
    };

    let mut p = n1 as f64 / total as f64;
    for k in 0..len {
        p *= (base1 + k) as f64 / (base2 + k) as f64;
    }
    Ok(p)
}

/// Smallest frequency in `[1, n1)` whose minimum p-value is at most
/// `alpha`.
///
/// # Errors
/// `PreconditionViolated` when no frequency in range is testable.
pub fn min_admissible_frequency(
    n1: Frequency,
    n2: Frequency,
    alpha: f64,
) -> Result<Frequency, SigspanError> {
    for f in 1..n1 {
        if min_p_value(n1, n2, f)? <= alpha {
            return Ok(f);
        }
    }
    Err(SigspanError::PreconditionViolated(format!(
        "no frequency below {} reaches alpha = {}",
        n1, alpha
    )))
}

fn check_alpha(alpha: f64) -> Result<(), SigspanError> {
    if alpha.is_finite() && alpha > 0.0 {
        Ok(())
    } else {
        Err(SigspanError::InvalidConfig(format!(
            "alpha must be a positive number, got {}",
            alpha
        )))
    }
}

fn positive_count(count: usize, f: Frequency) -> Result<usize, SigspanError> {
    if count == 0 {
        return Err(SigspanError::PreconditionViolated(format!(
            "no pattern reaches frequency {}",
            f
        )));
    }
    Ok(count)
}

// =============================================================================
// STRATEGIES
// =============================================================================

/// Run the oracle once at the minimum admissible frequency and read the
/// threshold off the sorted frequencies.
///
/// For each distinct frequency `f`, from the largest down, `k` is the number
/// of patterns with frequency at least `f`. The result is `f + 1` for the
/// first `f` with `k × phi(f) > alpha`, or the minimum admissible frequency
/// when none violates.
pub fn single_pass<F>(
    mut oracle: F,
    n1: Frequency,
    n2: Frequency,
    alpha: f64,
) -> Result<Frequency, SigspanError>
where
    F: FnMut(Frequency) -> Vec<Frequency>,
{
    check_alpha(alpha)?;
    let min_freq = min_admissible_frequency(n1, n2, alpha)?;

    let mut freqs = oracle(min_freq);
    if freqs.is_empty() {
        return Err(SigspanError::PreconditionViolated(format!(
            "oracle returned no pattern at frequency {}",
            min_freq
        )));
    }
    freqs.sort_unstable_by(|a, b| b.cmp(a));

    for (i, &f) in freqs.iter().enumerate() {
        // Only the last pattern of each run of equal frequencies counts.
        if freqs.get(i + 1) == Some(&f) {
            continue;
        }
        let k = (i + 1) as f64;
        if k * min_p_value(n1, n2, f)? > alpha {
            tracing::info!(threshold = f + 1, violating = f, "single-pass threshold");
            return Ok(f + 1);
        }
    }

    tracing::info!(threshold = min_freq, "single-pass found no violation");
    Ok(min_freq)
}

/// Scan frequencies from `n1 - 1` down to 1 with the pattern count `m(f)`;
/// return one above the first frequency violating the bound, or 1 when none
/// does.
///
/// # Errors
/// `PreconditionViolated` when `n1` is zero or a count is zero.
pub fn decreasing_bound<F>(
    mut m: F,
    n1: Frequency,
    n2: Frequency,
    alpha: f64,
) -> Result<Frequency, SigspanError>
where
    F: FnMut(Frequency) -> usize,
{
    check_alpha(alpha)?;
    if n1 == 0 {
        return Err(SigspanError::PreconditionViolated(
            "n1 must be positive".to_string(),
        ));
    }

    for f in (1..n1).rev() {
        let count = positive_count(m(f), f)?;
        if count as f64 * min_p_value(n1, n2, f)? > alpha {
            tracing::info!(threshold = f + 1, violating = f, "decreasing-bound threshold");
            return Ok(f + 1);
        }
    }

    tracing::info!(threshold = 1, "decreasing-bound found no violation");
    Ok(1)
}

/// Scan the admissible frequencies upwards with a budgeted count
/// `m(f, phi(f))`; return the first frequency satisfying the bound, or `n1`
/// when none does.
///
/// # Errors
/// `PreconditionViolated` when the minimum admissible frequency already
/// satisfies the bound.
pub fn early_termination<F>(
    mut m: F,
    n1: Frequency,
    n2: Frequency,
    alpha: f64,
) -> Result<Frequency, SigspanError>
where
    F: FnMut(Frequency, f64) -> usize,
{
    check_alpha(alpha)?;
    let min_freq = min_admissible_frequency(n1, n2, alpha)?;

    for f in min_freq..n1 {
        let pv = min_p_value(n1, n2, f)?;
        let count = positive_count(m(f, pv), f)?;
        let satisfied = count as f64 * pv <= alpha;

        if f == min_freq && satisfied {
            return Err(SigspanError::PreconditionViolated(format!(
                "starting frequency {} already satisfies the bound",
                f
            )));
        }
        if satisfied {
            tracing::info!(threshold = f, testable = count, "early-termination threshold");
            return Ok(f);
        }
    }

    tracing::info!(threshold = n1, "early-termination exhausted the range");
    Ok(n1)
}

/// Integer bisection of `g(f) = m(f, phi(f)) × phi(f) − alpha` on
/// `[min admissible frequency, n1]`; returns the lower end once the bracket
/// has width 1.
///
/// # Errors
/// `PreconditionViolated` unless `g` is positive at the lower end and not
/// positive at `n1`.
pub fn bisection<F>(
    mut m: F,
    n1: Frequency,
    n2: Frequency,
    alpha: f64,
) -> Result<Frequency, SigspanError>
where
    F: FnMut(Frequency, f64) -> usize,
{
    check_alpha(alpha)?;
    let mut lo = min_admissible_frequency(n1, n2, alpha)?;
    let mut hi = n1;

    let mut g = |f: Frequency| -> Result<f64, SigspanError> {
        let pv = min_p_value(n1, n2, f)?;
        let count = positive_count(m(f, pv), f)?;
        Ok(count as f64 * pv - alpha)
    };

    if g(lo)? <= 0.0 {
        return Err(SigspanError::PreconditionViolated(format!(
            "bound already satisfied at the lower end {}",
            lo
        )));
    }
    if g(hi)? > 0.0 {
        return Err(SigspanError::PreconditionViolated(format!(
            "bound still violated at the upper end {}",
            hi
        )));
    }

    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if g(mid)? > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    tracing::info!(threshold = lo, "bisection threshold");
    Ok(lo)
}

// =============================================================================
// ORACLE WIRING
// =============================================================================

/// Which threshold search to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    SinglePass,
    DecreasingBound,
    EarlyTermination,
    Bisection,
}

impl Strategy {
    pub const ALL: [Self; 4] = [
        Self::SinglePass,
        Self::DecreasingBound,
        Self::EarlyTermination,
        Self::Bisection,
    ];

    /// Name used on the command line and in config files.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SinglePass => "single-pass",
            Self::DecreasingBound => "decreasing-bound",
            Self::EarlyTermination => "early-termination",
            Self::Bisection => "bisection",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = SigspanError;

    fn from_str(s: &str) -> Result<Self, SigspanError> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| SigspanError::InvalidConfig(format!("unknown strategy '{}'", s)))
    }
}

/// Run `strategy` with `miner` as its oracle.
///
/// - single-pass: [`Miner::run`]
/// - decreasing-bound: the length of [`Miner::run`]
/// - early-termination and bisection: the length of
///   [`Miner::run_with_budget`] at `(f, phi(f), alpha)`
pub fn find_threshold(
    miner: &Miner<'_>,
    strategy: Strategy,
    n1: Frequency,
    n2: Frequency,
    alpha: f64,
) -> Result<Frequency, SigspanError> {
    tracing::debug!(%strategy, n1, n2, alpha, "threshold search started");

    match strategy {
        Strategy::SinglePass => single_pass(|f| miner.run(f), n1, n2, alpha),
        Strategy::DecreasingBound => decreasing_bound(|f| miner.run(f).len(), n1, n2, alpha),
        Strategy::EarlyTermination => early_termination(
            |f, pv| miner.run_with_budget(f, pv, alpha).len(),
            n1,
            n2,
            alpha,
        ),
        Strategy::Bisection => bisection(
            |f, pv| miner.run_with_budget(f, pv, alpha).len(),
            n1,
            n2,
            alpha,
        ),
    }
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Corrected significance levels at a chosen threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestabilitySummary {
    pub threshold: Frequency,
    /// Patterns with frequency at least `threshold`.
    pub testable: usize,
    /// `alpha / testable`.
    pub tarone_level: f64,
    /// Patterns at frequency 1.
    pub total: usize,
    /// `alpha / total`.
    pub bonferroni_level: f64,
}

impl TestabilitySummary {
    /// Count testable and total patterns with `miner` and derive both levels.
    ///
    /// A level is `alpha` itself when its count is zero.
    #[must_use]
    pub fn compute(miner: &Miner<'_>, threshold: Frequency, alpha: f64) -> Self {
        let testable = miner.run(threshold).len();
        let total = miner.run(1).len();
        let level = |count: usize| {
            if count == 0 {
                alpha
            } else {
                alpha / count as f64
            }
        };

        Self {
            threshold,
            testable,
            tarone_level: level(testable),
            total,
            bonferroni_level: level(total),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn binomial(n: u64, k: u64) -> f64 {
        (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
    }

    /// Supports of the single vertex labels in the reference scenario.
    const SUPPORTS: [Frequency; 9] = [15, 9, 8, 7, 6, 5, 4, 3, 2];

    fn oracle(f: Frequency) -> Vec<Frequency> {
        SUPPORTS.iter().copied().filter(|&s| s >= f).collect()
    }

    fn budgeted(f: Frequency, pv: f64) -> usize {
        let mut count = 0;
        for s in SUPPORTS {
            if s >= f {
                count += 1;
                if count as f64 * pv > 0.05 {
                    break;
                }
            }
        }
        count
    }

    #[test]
    fn phi_matches_binomial_ratio() {
        let expected = binomial(15, 5) / binomial(59, 5);
        let phi = min_p_value(15, 44, 5).expect("phi");
        assert!((phi - expected).abs() < 1e-9);
    }

    #[test]
    fn phi_above_n1_is_inverse_binomial() {
        let phi = min_p_value(4, 6, 7).expect("phi");
        assert!((phi - 1.0 / binomial(10, 4)).abs() < 1e-12);
    }

    #[test]
    fn phi_empty_product_at_frequency_one() {
        for f in [0, 1] {
            let phi = min_p_value(15, 44, f).expect("phi");
            assert!((phi - 15.0 / 59.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn phi_preconditions() {
        assert!(matches!(
            min_p_value(0, 5, 1),
            Err(SigspanError::PreconditionViolated(_))
        ));
        assert!(matches!(
            min_p_value(3, 2, 5),
            Err(SigspanError::PreconditionViolated(_))
        ));
    }

    #[test]
    fn scenario_values() {
        assert!((min_p_value(15, 44, 3).expect("phi") - 0.013_996).abs() < 1e-6);
        assert_eq!(min_admissible_frequency(15, 44, 0.05).expect("min freq"), 3);
    }

    #[test]
    fn scenario_thresholds() {
        assert_eq!(single_pass(oracle, 15, 44, 0.05).expect("single"), 4);
        assert_eq!(
            decreasing_bound(|f| oracle(f).len(), 15, 44, 0.05).expect("decreasing"),
            4
        );
        assert_eq!(early_termination(budgeted, 15, 44, 0.05).expect("early"), 4);
        assert_eq!(bisection(budgeted, 15, 44, 0.05).expect("bisection"), 3);
    }

    #[test]
    fn empty_oracle_is_a_precondition_violation() {
        let result = single_pass(|_| Vec::new(), 15, 44, 0.05);
        assert!(matches!(result, Err(SigspanError::PreconditionViolated(_))));
    }

    #[test]
    fn zero_count_is_a_precondition_violation() {
        let result = decreasing_bound(|_| 0, 15, 44, 0.05);
        assert!(matches!(result, Err(SigspanError::PreconditionViolated(_))));
    }

    #[test]
    fn empty_class_of_interest_rejected_by_every_strategy() {
        let precondition = |r: Result<Frequency, SigspanError>| {
            matches!(r, Err(SigspanError::PreconditionViolated(_)))
        };
        assert!(precondition(single_pass(|_| vec![3], 0, 44, 0.05)));
        assert!(precondition(decreasing_bound(|_| 5, 0, 44, 0.05)));
        assert!(precondition(early_termination(|_, _| 5, 0, 44, 0.05)));
        assert!(precondition(bisection(|_, _| 5, 0, 44, 0.05)));
    }

    #[test]
    fn early_termination_rejects_satisfied_start() {
        let result = early_termination(|_, _| 1, 15, 44, 0.05);
        assert!(matches!(result, Err(SigspanError::PreconditionViolated(_))));
    }

    #[test]
    fn bisection_rejects_violated_upper_end() {
        let result = bisection(|_, _| usize::MAX, 15, 44, 0.05);
        assert!(matches!(result, Err(SigspanError::PreconditionViolated(_))));
    }

    #[test]
    fn no_admissible_frequency() {
        let result = single_pass(oracle, 2, 2, 0.01);
        assert!(matches!(result, Err(SigspanError::PreconditionViolated(_))));
    }

    #[test]
    fn invalid_alpha_rejected() {
        assert!(matches!(
            single_pass(oracle, 15, 44, 0.0),
            Err(SigspanError::InvalidConfig(_))
        ));
        assert!(matches!(
            bisection(budgeted, 15, 44, f64::NAN),
            Err(SigspanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn strategy_names_roundtrip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>().expect("parse"), strategy);
        }
        assert!("fastest".parse::<Strategy>().is_err());
    }
}

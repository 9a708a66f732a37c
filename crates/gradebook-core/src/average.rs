//! Pure averaging functions.
//!
//! Each function returns `None` when nothing contributes; an average over zero
//! inputs is never reported as 0. All results are rounded to the policy
//! precision before they are stored or compared.

use crate::{
  policy::{AveragingPolicy, EmptySubjectPolicy},
  record::ExamKind,
};

/// Precision cap; an `f64` carries no further decimal digits worth rounding.
pub const MAX_PRECISION: u32 = 12;

/// Round half away from zero to `precision` decimal digits (capped at
/// [`MAX_PRECISION`]).
///
/// Ties are judged on the decimal value, not its binary approximation:
/// `2.675` is stored as `2.67499999…`, yet rounds to `2.68`.
pub fn round_to(value: f64, precision: u32) -> f64 {
  let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
  let scaled = value * factor;
  // Snap off representation error below the sixth fractional digit.
  let snapped = if scaled.abs() < 1e9 {
    (scaled * 1e6).round() / 1e6
  } else {
    scaled
  };
  snapped.round() / factor
}

/// Weighted arithmetic mean of `(value, weight)` pairs.
pub fn weighted_mean(items: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
  let (sum, weights) = items
    .into_iter()
    .fold((0.0, 0.0), |(sum, weights), (value, weight)| {
      (sum + value * weight, weights + weight)
    });
  (weights > 0.0).then(|| sum / weights)
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
  weighted_mean(values.into_iter().map(|v| (v, 1.0)))
}

/// Subject average for one term from the student's scored exams. Exams
/// without a score must not be passed in.
pub fn subject_average(
  policy: &AveragingPolicy,
  scored: impl IntoIterator<Item = (ExamKind, f64)>,
) -> Option<f64> {
  weighted_mean(
    scored
      .into_iter()
      .map(|(kind, value)| (value, policy.weight(kind))),
  )
  .map(|avg| round_to(avg, policy.precision))
}

/// Term average across subjects, each subject weighted equally.
///
/// `unscored_subjects` is the number of subjects that have exams in the term
/// but no score for this student; it only matters under
/// [`EmptySubjectPolicy::CountAsZero`]. A student with no scored subject at
/// all has no term average under either policy.
pub fn term_average(
  policy: &AveragingPolicy,
  subject_averages: &[f64],
  unscored_subjects: usize,
) -> Option<f64> {
  if subject_averages.is_empty() {
    return None;
  }
  let zeros = match policy.empty_subject {
    EmptySubjectPolicy::Exclude => 0,
    EmptySubjectPolicy::CountAsZero => unscored_subjects,
  };
  mean(
    subject_averages
      .iter()
      .copied()
      .chain(std::iter::repeat_n(0.0, zeros)),
  )
  .map(|avg| round_to(avg, policy.precision))
}

/// Yearly figure from the term figures of that year. Terms without a figure
/// are simply absent from `term_values`.
pub fn yearly_average(policy: &AveragingPolicy, term_values: &[f64]) -> Option<f64> {
  mean(term_values.iter().copied()).map(|avg| round_to(avg, policy.precision))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounds_to_two_digits() {
    assert_eq!(round_to(19.0 / 3.0, 2), 6.33);
    assert_eq!(round_to(7.0, 2), 7.0);
  }

  #[test]
  fn decimal_ties_round_away_from_zero() {
    assert_eq!(round_to(2.675, 2), 2.68);
    assert_eq!(round_to(1.005, 2), 1.01);
    assert_eq!(round_to(0.125, 2), 0.13);
    assert_eq!(round_to(-2.675, 2), -2.68);
    assert_eq!(round_to(8.345, 2), 8.35);
  }

  #[test]
  fn oversized_precision_is_capped() {
    assert_eq!(round_to(1.5, u32::MAX), 1.5);
    assert_eq!(round_to(6.25, 40), 6.25);
  }

  #[test]
  fn term_mean_over_three_subjects() {
    let policy = AveragingPolicy::default();
    assert_eq!(term_average(&policy, &[8.0, 6.0, 5.0], 0), Some(6.33));
  }

  #[test]
  fn nothing_to_average_is_none_not_zero() {
    let policy = AveragingPolicy::default();
    assert_eq!(subject_average(&policy, []), None);
    assert_eq!(term_average(&policy, &[], 3), None);
    assert_eq!(yearly_average(&policy, &[]), None);
  }

  #[test]
  fn final_counts_double_by_default() {
    let policy = AveragingPolicy::default();
    let avg = subject_average(
      &policy,
      [(ExamKind::Midterm, 6.0), (ExamKind::Final, 9.0)],
    );
    assert_eq!(avg, Some(8.0));
  }

  #[test]
  fn missing_exam_is_excluded_not_zeroed() {
    let policy = AveragingPolicy::default();
    assert_eq!(subject_average(&policy, [(ExamKind::Midterm, 7.0)]), Some(7.0));
  }

  #[test]
  fn empty_subject_policy_count_as_zero() {
    let policy = AveragingPolicy {
      empty_subject: EmptySubjectPolicy::CountAsZero,
      ..AveragingPolicy::default()
    };
    assert_eq!(term_average(&policy, &[9.0, 6.0], 1), Some(5.0));
    assert_eq!(term_average(&policy, &[], 2), None);

    let exclude = AveragingPolicy::default();
    assert_eq!(term_average(&exclude, &[9.0, 6.0], 1), Some(7.5));
  }

  #[test]
  fn yearly_is_plain_mean_of_terms() {
    let policy = AveragingPolicy::default();
    assert_eq!(yearly_average(&policy, &[8.5, 9.5]), Some(9.0));
    assert_eq!(yearly_average(&policy, &[7.25]), Some(7.25));
  }

  #[test]
  fn zero_weights_yield_none() {
    assert_eq!(weighted_mean([(5.0, 0.0)]), None);
  }
}

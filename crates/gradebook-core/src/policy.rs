//! Averaging policy: the knobs the school configures rather than the engine
//! inferring them.

use serde::{Deserialize, Serialize};

use crate::record::ExamKind;

/// How a subject with no scored exams in a term feeds the term average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySubjectPolicy {
  /// The subject is left out of the term mean.
  #[default]
  Exclude,
  /// The subject counts as 0 if it has at least one exam scheduled in the
  /// term.
  CountAsZero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AveragingPolicy {
  pub midterm_weight: f64,
  pub final_weight:   f64,
  pub regular_weight: f64,
  /// Decimal digits kept on every stored average, at most
  /// [`crate::average::MAX_PRECISION`].
  pub precision:      u32,
  pub empty_subject:  EmptySubjectPolicy,
  /// Whether score batches also refresh yearly figures and yearly ranks.
  pub rollup_yearly:  bool,
}

impl Default for AveragingPolicy {
  fn default() -> Self {
    Self {
      midterm_weight: 1.0,
      final_weight:   2.0,
      regular_weight: 1.0,
      precision:      2,
      empty_subject:  EmptySubjectPolicy::default(),
      rollup_yearly:  true,
    }
  }
}

impl AveragingPolicy {
  pub fn weight(&self, kind: ExamKind) -> f64 {
    match kind {
      ExamKind::Midterm => self.midterm_weight,
      ExamKind::Final => self.final_weight,
      ExamKind::Regular => self.regular_weight,
    }
  }
}

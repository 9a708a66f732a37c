//! Academic-performance bands.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Lower bound (inclusive) of the "Giỏi" band.
pub const EXCELLENT_THRESHOLD: f64 = 8.0;
/// Lower bound (inclusive) of the "Khá" band.
pub const GOOD_THRESHOLD: f64 = 6.5;
/// Lower bound (inclusive) of the "Trung bình" band.
pub const AVERAGE_THRESHOLD: f64 = 5.0;

/// Qualitative classification of a numeric average. Serialised with the
/// Vietnamese labels used on report cards.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
)]
pub enum AcademicPerformance {
  #[serde(rename = "Giỏi")]
  #[strum(serialize = "Giỏi")]
  Excellent,
  #[serde(rename = "Khá")]
  #[strum(serialize = "Khá")]
  Good,
  #[serde(rename = "Trung bình")]
  #[strum(serialize = "Trung bình")]
  Average,
  #[serde(rename = "Yếu")]
  #[strum(serialize = "Yếu")]
  Weak,
}

impl AcademicPerformance {
  pub fn classify(average: f64) -> Self {
    if average >= EXCELLENT_THRESHOLD {
      Self::Excellent
    } else if average >= GOOD_THRESHOLD {
      Self::Good
    } else if average >= AVERAGE_THRESHOLD {
      Self::Average
    } else {
      Self::Weak
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn band_boundaries() {
    assert_eq!(AcademicPerformance::classify(8.0), AcademicPerformance::Excellent);
    assert_eq!(AcademicPerformance::classify(7.999), AcademicPerformance::Good);
    assert_eq!(AcademicPerformance::classify(6.5), AcademicPerformance::Good);
    assert_eq!(AcademicPerformance::classify(6.49), AcademicPerformance::Average);
    assert_eq!(AcademicPerformance::classify(5.0), AcademicPerformance::Average);
    assert_eq!(AcademicPerformance::classify(4.999), AcademicPerformance::Weak);
    assert_eq!(AcademicPerformance::classify(10.0), AcademicPerformance::Excellent);
    assert_eq!(AcademicPerformance::classify(0.0), AcademicPerformance::Weak);
  }

  #[test]
  fn labels_round_trip_through_strum_and_serde() {
    for band in AcademicPerformance::iter() {
      let label = band.to_string();
      assert_eq!(AcademicPerformance::from_str(&label).unwrap(), band);
      let json = serde_json::to_string(&band).unwrap();
      assert_eq!(json, format!("\"{label}\""));
    }
    assert_eq!(AcademicPerformance::Average.as_ref(), "Trung bình");
  }

  #[test]
  fn unknown_label_is_rejected() {
    assert!(AcademicPerformance::from_str("Xuất sắc").is_err());
  }
}

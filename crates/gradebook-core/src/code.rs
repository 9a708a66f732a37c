//! Typed identifiers.
//!
//! Every record in the school database is addressed by a human-assigned
//! string code (`"HS001"`, `"10A1"`, `"HK1_2024"`). Each kind of code gets its
//! own newtype so a classroom code can never be passed where a grade code is
//! expected. Equality and ordering are plain string semantics.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! code_type {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      pub fn new(code: impl Into<String>) -> Self { Self(code.into()) }

      pub fn as_str(&self) -> &str { &self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl AsRef<str> for $name {
      fn as_ref(&self) -> &str { &self.0 }
    }

    impl From<&str> for $name {
      fn from(code: &str) -> Self { Self(code.to_owned()) }
    }

    impl From<String> for $name {
      fn from(code: String) -> Self { Self(code) }
    }
  };
}

code_type!(
  /// Identifies a student.
  StudentCode
);
code_type!(
  /// Identifies a single exam sitting (one subject, one term).
  ExamCode
);
code_type!(SubjectCode);
code_type!(
  /// Identifies one of the two terms of a school year.
  TermCode
);
code_type!(SchoolYearCode);
code_type!(
  /// Identifies a classroom; classrooms belong to exactly one grade.
  ClassroomCode
);
code_type!(
  /// Identifies a grade level within one school year (e.g. grade 10 of
  /// 2024-2025).
  GradeCode
);
code_type!(TeacherCode);

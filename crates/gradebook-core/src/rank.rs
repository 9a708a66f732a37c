//! Competition ranking over a whole cohort.
//!
//! Ranks are always recomputed from scratch for the full cohort. Equal
//! averages share a rank and the following rank skips ahead, so averages
//! `[9.0, 9.0, 7.0]` rank as `[1, 1, 3]`.

use crate::{code::StudentCode, derived::RankAssignment};

/// Rank `entries` by average, highest first.
///
/// Each student's rank is `1 + (number of students with a strictly greater
/// average)`. The output is ordered by rank, with ties broken by student code
/// so the result is deterministic.
pub fn competition_ranks(
  entries: impl IntoIterator<Item = (StudentCode, f64)>,
) -> Vec<RankAssignment> {
  let mut sorted: Vec<(StudentCode, f64)> = entries.into_iter().collect();
  sorted.sort_by(|(a_code, a_avg), (b_code, b_avg)| {
    b_avg.total_cmp(a_avg).then_with(|| a_code.cmp(b_code))
  });

  let mut ranks = Vec::with_capacity(sorted.len());
  let mut previous: Option<(f64, u32)> = None;
  for (index, (student_code, average)) in sorted.into_iter().enumerate() {
    let rank = match previous {
      Some((prev_avg, prev_rank)) if prev_avg == average => prev_rank,
      _ => index as u32 + 1,
    };
    previous = Some((average, rank));
    ranks.push(RankAssignment { student_code, rank });
  }
  ranks
}

//! The averaging and ranking engine.
//!
//! [`Engine`] owns the recompute pipeline that runs after every score batch:
//!
//! 1. subject averages for each touched (student, subject, term)
//! 2. term averages for each touched (student, term), classified into a band
//! 3. yearly subject and student averages, when the policy rolls years up
//! 4. one rank pass per affected (cohort, scope)
//!
//! Each stage finishes for the whole batch before the next one starts, and a
//! rank pass only ever reads averages committed by the earlier stages. The
//! engine is generic over any [`gradebook_core::store::GradebookStore`].

mod engine;
mod entry;
mod locks;
mod query;

pub use engine::{Engine, RecomputeSummary};
pub use entry::ScoreEntry;
pub use locks::KeyedLocks;
pub use query::{PerformanceEntry, PerformanceReport, RankingEntry, RankingReport};

//! Teacher score entry: validate a batch, write it, then recompute.

use std::collections::HashSet;

use gradebook_core::{
  Error, Result,
  code::{ClassroomCode, ExamCode, StudentCode, TeacherCode},
  record::{Score, ScoreInput},
  store::GradebookStore,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::Engine;

/// One exam's worth of scores for a classroom, submitted by a teacher.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreEntry {
  pub teacher_code:   TeacherCode,
  pub classroom_code: ClassroomCode,
  pub exam_code:      ExamCode,
  pub scores:         Vec<ScoreInput>,
}

impl<S: GradebookStore> Engine<S> {
  /// Record a batch of exam scores and recompute everything downstream.
  ///
  /// The whole batch is rejected before anything is written if any entry
  /// fails validation. Returns the exam's scores for the classroom as
  /// stored after the write.
  #[instrument(
    skip_all,
    fields(
      teacher = %entry.teacher_code,
      classroom = %entry.classroom_code,
      exam = %entry.exam_code,
      count = entry.scores.len(),
    )
  )]
  pub async fn enter_scores(&self, entry: ScoreEntry) -> Result<Vec<Score>> {
    let scores = self.validate_entry(&entry).await.inspect_err(|e| {
      warn!(error = %e, "score batch rejected");
    })?;

    let touched: Vec<(StudentCode, ExamCode)> = scores
      .iter()
      .map(|s| (s.student_code.clone(), s.exam_code.clone()))
      .collect();
    let plan = self.plan(&touched).await?;

    self
      .store()
      .upsert_scores(scores)
      .await
      .map_err(Error::store)?;
    info!("scores written");

    self.execute(plan).await?;

    let roster = self
      .store()
      .list_students(entry.classroom_code.clone())
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|s| s.student_code)
      .collect();
    self
      .store()
      .list_exam_scores(entry.exam_code, roster)
      .await
      .map_err(Error::store)
  }

  /// Every check a batch must pass, in the order callers see failures.
  async fn validate_entry(&self, entry: &ScoreEntry) -> Result<Vec<Score>> {
    if entry.scores.is_empty() {
      return Err(Error::EmptyBatch);
    }

    self.get_classroom(&entry.classroom_code).await?;
    let exam = self
      .store()
      .get_exam(entry.exam_code.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ExamNotFound(entry.exam_code.clone()))?;

    let assigned = self
      .store()
      .is_teacher_assigned(
        entry.teacher_code.clone(),
        entry.classroom_code.clone(),
        exam.subject_code.clone(),
      )
      .await
      .map_err(Error::store)?;
    if !assigned {
      return Err(Error::TeacherNotAssigned {
        teacher:   entry.teacher_code.clone(),
        classroom: entry.classroom_code.clone(),
        subject:   exam.subject_code,
      });
    }

    let roster: HashSet<StudentCode> = self
      .store()
      .list_students(entry.classroom_code.clone())
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|s| s.student_code)
      .collect();
    if roster.is_empty() {
      return Err(Error::EmptyClassroom(entry.classroom_code.clone()));
    }

    let mut seen = HashSet::new();
    let mut scores = Vec::with_capacity(entry.scores.len());
    for input in &entry.scores {
      if !roster.contains(&input.student_code) {
        return Err(Error::StudentNotInClassroom {
          student:   input.student_code.clone(),
          classroom: entry.classroom_code.clone(),
        });
      }
      let score = Score::new(
        input.student_code.clone(),
        entry.exam_code.clone(),
        input.score_value,
      )?;
      if !seen.insert(input.student_code.clone()) {
        return Err(Error::DuplicateStudent(input.student_code.clone()));
      }
      scores.push(score);
    }
    Ok(scores)
  }
}

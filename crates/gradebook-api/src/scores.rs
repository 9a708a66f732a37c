//! Handlers for score entry and explicit recompute.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/classrooms/{classroom}/exams/{exam}/scores` | Body: [`ScoresBody`]; returns 201 + the classroom's scores for the exam |
//! | `POST` | `/classrooms/{classroom}/terms/{term}/recompute` | Returns a [`RecomputeSummary`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use gradebook_core::{
  code::{ClassroomCode, ExamCode, TeacherCode, TermCode},
  record::ScoreInput,
  store::GradebookStore,
};
use gradebook_engine::{Engine, RecomputeSummary, ScoreEntry};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Enter ────────────────────────────────────────────────────────────────────

/// JSON body accepted by the score entry endpoint. Classroom and exam come
/// from the path.
#[derive(Debug, Deserialize)]
pub struct ScoresBody {
  pub teacher_code: TeacherCode,
  pub scores:       Vec<ScoreInput>,
}

/// `POST /classrooms/{classroom}/exams/{exam}/scores`
pub async fn enter<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((classroom, exam)): Path<(ClassroomCode, ExamCode)>,
  Json(body): Json<ScoresBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GradebookStore + 'static,
{
  let scores = engine
    .enter_scores(ScoreEntry {
      teacher_code:   body.teacher_code,
      classroom_code: classroom,
      exam_code:      exam,
      scores:         body.scores,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(scores)))
}

// ─── Recompute ────────────────────────────────────────────────────────────────

/// `POST /classrooms/{classroom}/terms/{term}/recompute`
pub async fn recompute<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path((classroom, term)): Path<(ClassroomCode, TermCode)>,
) -> Result<Json<RecomputeSummary>, ApiError>
where
  S: GradebookStore + 'static,
{
  let summary = engine.recompute_classroom(&classroom, &term).await?;
  Ok(Json(summary))
}

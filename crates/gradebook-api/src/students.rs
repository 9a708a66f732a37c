//! Handler for `GET /students/{student}/scores`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use gradebook_core::{
  code::{StudentCode, SubjectCode, TermCode},
  record::StudentScore,
  store::GradebookStore,
};
use gradebook_engine::Engine;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ScoreParams {
  pub subject_code: Option<SubjectCode>,
  pub term_code:    Option<TermCode>,
}

/// `GET /students/{student}/scores[?subject_code=...][&term_code=...]`
pub async fn scores<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(student): Path<StudentCode>,
  Query(params): Query<ScoreParams>,
) -> Result<Json<Vec<StudentScore>>, ApiError>
where
  S: GradebookStore + 'static,
{
  let scores = engine
    .student_scores(student, params.subject_code, params.term_code)
    .await?;
  Ok(Json(scores))
}

//! Handlers for `/rankings` endpoints.
//!
//! Without `term_code` the ranking covers the school year of the cohort's
//! grade.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use gradebook_core::{
  code::{ClassroomCode, GradeCode, TermCode},
  derived::Cohort,
  store::GradebookStore,
};
use gradebook_engine::{Engine, RankingReport};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct RankingParams {
  pub term_code: Option<TermCode>,
}

/// `GET /rankings/classrooms/{classroom}[?term_code=...]`
pub async fn classroom<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(classroom): Path<ClassroomCode>,
  Query(params): Query<RankingParams>,
) -> Result<Json<RankingReport>, ApiError>
where
  S: GradebookStore + 'static,
{
  let report = engine
    .rankings(Cohort::Classroom(classroom), params.term_code)
    .await?;
  Ok(Json(report))
}

/// `GET /rankings/grades/{grade}[?term_code=...]`
pub async fn grade<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(grade): Path<GradeCode>,
  Query(params): Query<RankingParams>,
) -> Result<Json<RankingReport>, ApiError>
where
  S: GradebookStore + 'static,
{
  let report = engine
    .rankings(Cohort::Grade(grade), params.term_code)
    .await?;
  Ok(Json(report))
}

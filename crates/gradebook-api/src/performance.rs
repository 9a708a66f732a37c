//! Handlers for `/performance` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use gradebook_core::{
  code::{ClassroomCode, GradeCode, TermCode},
  derived::Cohort,
  performance::AcademicPerformance,
  store::GradebookStore,
};
use gradebook_engine::{Engine, PerformanceReport};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct PerformanceParams {
  pub term_code:            Option<TermCode>,
  /// Report-card label, e.g. `Giỏi`.
  pub academic_performance: Option<AcademicPerformance>,
}

/// `GET /performance/classrooms/{classroom}[?term_code=...][&academic_performance=...]`
pub async fn classroom<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(classroom): Path<ClassroomCode>,
  Query(params): Query<PerformanceParams>,
) -> Result<Json<PerformanceReport>, ApiError>
where
  S: GradebookStore + 'static,
{
  let report = engine
    .performance(
      Cohort::Classroom(classroom),
      params.term_code,
      params.academic_performance,
    )
    .await?;
  Ok(Json(report))
}

/// `GET /performance/grades/{grade}[?term_code=...][&academic_performance=...]`
pub async fn grade<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(grade): Path<GradeCode>,
  Query(params): Query<PerformanceParams>,
) -> Result<Json<PerformanceReport>, ApiError>
where
  S: GradebookStore + 'static,
{
  let report = engine
    .performance(Cohort::Grade(grade), params.term_code, params.academic_performance)
    .await?;
  Ok(Json(report))
}

//! JSON REST API for the gradebook.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`gradebook_core::store::GradebookStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gradebook_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod performance;
pub mod rankings;
pub mod scores;
pub mod students;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use gradebook_core::store::GradebookStore;
use gradebook_engine::Engine;

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: GradebookStore + 'static,
{
  Router::new()
    // Scores
    .route(
      "/classrooms/{classroom}/exams/{exam}/scores",
      post(scores::enter::<S>),
    )
    .route(
      "/classrooms/{classroom}/terms/{term}/recompute",
      post(scores::recompute::<S>),
    )
    // Rankings
    .route("/rankings/classrooms/{classroom}", get(rankings::classroom::<S>))
    .route("/rankings/grades/{grade}", get(rankings::grade::<S>))
    // Performance
    .route("/performance/classrooms/{classroom}", get(performance::classroom::<S>))
    .route("/performance/grades/{grade}", get(performance::grade::<S>))
    // Students
    .route("/students/{student}/scores", get(students::scores::<S>))
    .with_state(engine)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::NaiveDate;
  use gradebook_core::{
    policy::AveragingPolicy,
    record::{
      Classroom, Exam, Grade, ReferenceData, SchoolYear, Student, Subject, Teacher,
      TeacherAssignment, Term,
    },
  };
  use gradebook_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  fn reference() -> ReferenceData {
    ReferenceData {
      school_years: vec![SchoolYear {
        school_year_code: "Y2024".into(),
        school_year_name: "2024-2025".into(),
      }],
      terms:        vec![Term {
        term_code:        "T1".into(),
        term_name:        "Học kỳ 1".into(),
        school_year_code: "Y2024".into(),
      }],
      grades:       vec![Grade {
        grade_code:       "G10".into(),
        grade_name:       "Khối 10".into(),
        school_year_code: "Y2024".into(),
      }],
      classrooms:   vec![Classroom {
        classroom_code: "C1".into(),
        classroom_name: "10A1".into(),
        grade_code:     "G10".into(),
      }],
      subjects:     vec![Subject { subject_code: "MATH".into(), subject_name: "Toán".into() }],
      students:     vec![
        Student { student_code: "S1".into(), name: "An".into(), classroom_code: "C1".into() },
        Student { student_code: "S2".into(), name: "Bình".into(), classroom_code: "C1".into() },
      ],
      teachers:     vec![Teacher { teacher_code: "GV1".into(), name: "Cô Lan".into() }],
      assignments:  vec![TeacherAssignment {
        classroom_code: "C1".into(),
        teacher_code:   "GV1".into(),
        subject_code:   "MATH".into(),
      }],
      exams:        vec![Exam {
        exam_code:    "MATH-MID".into(),
        exam_name:    "Kiểm tra giữa kỳ Toán".into(),
        subject_code: "MATH".into(),
        term_code:    "T1".into(),
        date:         NaiveDate::from_ymd_opt(2024, 10, 15).unwrap(),
        kind:         None,
      }],
    }
  }

  async fn router() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.seed(reference()).await.unwrap();
    api_router(Arc::new(Engine::new(Arc::new(store), AveragingPolicy::default())))
  }

  async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  async fn enter_math(app: &Router, scores: Value) -> (StatusCode, Value) {
    send(
      app,
      "POST",
      "/classrooms/C1/exams/MATH-MID/scores",
      Some(json!({ "teacher_code": "GV1", "scores": scores })),
    )
    .await
  }

  // ── Scores ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn entering_scores_returns_201_with_the_sheet() {
    let app = router().await;
    let (status, body) = enter_math(
      &app,
      json!([
        { "student_code": "S1", "score_value": 8.5 },
        { "student_code": "S2", "score_value": 6.0 },
      ]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let sheet = body.as_array().unwrap();
    assert_eq!(sheet.len(), 2);
    assert_eq!(sheet[0]["student_code"], "S1");
    assert_eq!(sheet[0]["score_value"], 8.5);
  }

  #[tokio::test]
  async fn out_of_range_score_is_400() {
    let app = router().await;
    let (status, body) = enter_math(&app, json!([{ "student_code": "S1", "score_value": 11 }])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("S1"));
  }

  #[tokio::test]
  async fn unassigned_teacher_is_400() {
    let app = router().await;
    let (status, _) = send(
      &app,
      "POST",
      "/classrooms/C1/exams/MATH-MID/scores",
      Some(json!({
        "teacher_code": "GV9",
        "scores": [{ "student_code": "S1", "score_value": 7 }],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unknown_exam_is_404() {
    let app = router().await;
    let (status, body) = send(
      &app,
      "POST",
      "/classrooms/C1/exams/NOPE/scores",
      Some(json!({
        "teacher_code": "GV1",
        "scores": [{ "student_code": "S1", "score_value": 7 }],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("NOPE"));
  }

  #[tokio::test]
  async fn recompute_returns_summary() {
    let app = router().await;
    enter_math(&app, json!([{ "student_code": "S1", "score_value": 7 }])).await;

    let (status, body) = send(&app, "POST", "/classrooms/C1/terms/T1/recompute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["term_averages"], 2);

    let (status, _) = send(&app, "POST", "/classrooms/C1/terms/T9/recompute", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Reports ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn rankings_for_term_and_year() {
    let app = router().await;
    enter_math(
      &app,
      json!([
        { "student_code": "S1", "score_value": 6 },
        { "student_code": "S2", "score_value": 9 },
      ]),
    )
    .await;

    let (status, body) = send(&app, "GET", "/rankings/classrooms/C1?term_code=T1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_students"], 2);
    assert_eq!(body["rankings"][0]["student_code"], "S2");
    assert_eq!(body["rankings"][0]["rank"], 1);
    assert_eq!(body["rankings"][1]["rank"], 2);

    let (status, body) = send(&app, "GET", "/rankings/grades/G10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rankings"][0]["average"], 9.0);
  }

  #[tokio::test]
  async fn rankings_without_results_are_404() {
    let app = router().await;
    let (status, body) = send(&app, "GET", "/rankings/classrooms/C1?term_code=T1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn performance_filters_by_label() {
    let app = router().await;
    enter_math(
      &app,
      json!([
        { "student_code": "S1", "score_value": 8.5 },
        { "student_code": "S2", "score_value": 6.6 },
      ]),
    )
    .await;

    let (status, body) = send(
      &app,
      "GET",
      "/performance/grades/G10?term_code=T1&academic_performance=Kh%C3%A1",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_students"], 1);
    assert_eq!(body["students"][0]["student_code"], "S2");
    assert_eq!(body["students"][0]["academic_performance"], "Khá");

    let (status, _) = send(
      &app,
      "GET",
      "/performance/classrooms/C1?term_code=T1&academic_performance=Y%E1%BA%BFu",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn student_scores_are_listed() {
    let app = router().await;
    enter_math(&app, json!([{ "student_code": "S1", "score_value": 7.25 }])).await;

    let (status, body) = send(&app, "GET", "/students/S1/scores?subject_code=MATH", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["exam_code"], "MATH-MID");
    assert_eq!(body[0]["term_code"], "T1");

    let (status, _) = send(&app, "GET", "/students/S9/scores", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}

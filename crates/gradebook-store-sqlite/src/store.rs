//! [`SqliteStore`]: the SQLite implementation of [`GradebookStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use gradebook_core::{
  code::{
    ClassroomCode, ExamCode, GradeCode, SchoolYearCode, StudentCode,
    SubjectCode, TeacherCode, TermCode,
  },
  derived::{ClassifiedAverage, RankAssignment, RankKind, Scope, StudentAverage, SubjectAverage},
  record::{
    Classroom, Exam, Grade, ReferenceData, SchoolYear, Score, Student,
    StudentScore, Term,
  },
  store::GradebookStore,
};

use crate::{
  encode::{
    classroom_from_row, encode_date, encode_dt, encode_exam_kind,
    encode_performance, grade_from_row, placeholders, rank_column,
    scope_columns, student_from_row, term_from_row, RawExam,
    RawStudentAverage,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A gradebook backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load reference data in one transaction. Existing rows with the same
  /// code are replaced.
  pub async fn seed(&self, data: ReferenceData) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for y in &data.school_years {
          tx.execute(
            "INSERT OR REPLACE INTO school_years (school_year_code, school_year_name)
             VALUES (?1, ?2)",
            rusqlite::params![y.school_year_code.as_str(), y.school_year_name],
          )?;
        }
        for t in &data.terms {
          tx.execute(
            "INSERT OR REPLACE INTO terms (term_code, term_name, school_year_code)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![t.term_code.as_str(), t.term_name, t.school_year_code.as_str()],
          )?;
        }
        for g in &data.grades {
          tx.execute(
            "INSERT OR REPLACE INTO grades (grade_code, grade_name, school_year_code)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![g.grade_code.as_str(), g.grade_name, g.school_year_code.as_str()],
          )?;
        }
        for c in &data.classrooms {
          tx.execute(
            "INSERT OR REPLACE INTO classrooms (classroom_code, classroom_name, grade_code)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![c.classroom_code.as_str(), c.classroom_name, c.grade_code.as_str()],
          )?;
        }
        for s in &data.subjects {
          tx.execute(
            "INSERT OR REPLACE INTO subjects (subject_code, subject_name) VALUES (?1, ?2)",
            rusqlite::params![s.subject_code.as_str(), s.subject_name],
          )?;
        }
        for s in &data.students {
          tx.execute(
            "INSERT OR REPLACE INTO students (student_code, name, classroom_code)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![s.student_code.as_str(), s.name, s.classroom_code.as_str()],
          )?;
        }
        for t in &data.teachers {
          tx.execute(
            "INSERT OR REPLACE INTO teachers (teacher_code, name) VALUES (?1, ?2)",
            rusqlite::params![t.teacher_code.as_str(), t.name],
          )?;
        }
        for a in &data.assignments {
          tx.execute(
            "INSERT OR IGNORE INTO classroom_teachers (classroom_code, teacher_code, subject_code)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
              a.classroom_code.as_str(),
              a.teacher_code.as_str(),
              a.subject_code.as_str(),
            ],
          )?;
        }
        for e in &data.exams {
          tx.execute(
            "INSERT OR REPLACE INTO exams
               (exam_code, exam_name, subject_code, term_code, exam_date, kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              e.exam_code.as_str(),
              e.exam_name,
              e.subject_code.as_str(),
              e.term_code.as_str(),
              encode_date(e.date),
              e.kind.map(encode_exam_kind),
            ],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch zero or one row of a reference table by its primary key.
  async fn get_one<T, F>(&self, sql: &'static str, code: String, map: F) -> Result<Option<T>>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(sql, rusqlite::params![code], map).optional()?))
        .await?,
    )
  }

  /// Fetch every row matching a single-parameter query.
  async fn get_many<T, F>(&self, sql: &'static str, code: String, map: F) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(sql)?;
          let rows = stmt
            .query_map(rusqlite::params![code], map)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }
}

// ─── GradebookStore impl ─────────────────────────────────────────────────────

impl GradebookStore for SqliteStore {
  type Error = Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn get_school_year(&self, code: SchoolYearCode) -> Result<Option<SchoolYear>> {
    self
      .get_one(
        "SELECT school_year_code, school_year_name FROM school_years
         WHERE school_year_code = ?1",
        code.to_string(),
        |row| {
          Ok(SchoolYear {
            school_year_code: SchoolYearCode::from(row.get::<_, String>(0)?),
            school_year_name: row.get(1)?,
          })
        },
      )
      .await
  }

  async fn get_term(&self, code: TermCode) -> Result<Option<Term>> {
    self
      .get_one(
        "SELECT term_code, term_name, school_year_code FROM terms WHERE term_code = ?1",
        code.to_string(),
        term_from_row,
      )
      .await
  }

  async fn list_terms(&self, school_year: SchoolYearCode) -> Result<Vec<Term>> {
    self
      .get_many(
        "SELECT term_code, term_name, school_year_code FROM terms
         WHERE school_year_code = ?1 ORDER BY term_code",
        school_year.to_string(),
        term_from_row,
      )
      .await
  }

  async fn get_grade(&self, code: GradeCode) -> Result<Option<Grade>> {
    self
      .get_one(
        "SELECT grade_code, grade_name, school_year_code FROM grades WHERE grade_code = ?1",
        code.to_string(),
        grade_from_row,
      )
      .await
  }

  async fn get_classroom(&self, code: ClassroomCode) -> Result<Option<Classroom>> {
    self
      .get_one(
        "SELECT classroom_code, classroom_name, grade_code FROM classrooms
         WHERE classroom_code = ?1",
        code.to_string(),
        classroom_from_row,
      )
      .await
  }

  async fn get_student(&self, code: StudentCode) -> Result<Option<Student>> {
    self
      .get_one(
        "SELECT student_code, name, classroom_code FROM students WHERE student_code = ?1",
        code.to_string(),
        student_from_row,
      )
      .await
  }

  async fn list_students(&self, classroom: ClassroomCode) -> Result<Vec<Student>> {
    self
      .get_many(
        "SELECT student_code, name, classroom_code FROM students
         WHERE classroom_code = ?1 ORDER BY student_code",
        classroom.to_string(),
        student_from_row,
      )
      .await
  }

  async fn list_grade_students(&self, grade: GradeCode) -> Result<Vec<Student>> {
    self
      .get_many(
        "SELECT s.student_code, s.name, s.classroom_code
         FROM students s
         JOIN classrooms c ON c.classroom_code = s.classroom_code
         WHERE c.grade_code = ?1
         ORDER BY s.student_code",
        grade.to_string(),
        student_from_row,
      )
      .await
  }

  async fn get_exam(&self, code: ExamCode) -> Result<Option<Exam>> {
    let sql_code = code.to_string();
    let raw: Option<RawExam> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM exams WHERE exam_code = ?1", RawExam::COLUMNS);
        Ok(
          conn
            .query_row(&sql, rusqlite::params![sql_code], RawExam::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawExam::into_exam).transpose()
  }

  async fn list_exams(&self, term: TermCode, subject: Option<SubjectCode>) -> Result<Vec<Exam>> {
    let term_str    = term.to_string();
    let subject_str = subject.map(|s| s.to_string());

    let raws: Vec<RawExam> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM exams
           WHERE term_code = ?1 AND (?2 IS NULL OR subject_code = ?2)
           ORDER BY exam_date, exam_code",
          RawExam::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![term_str, subject_str], RawExam::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawExam::into_exam).collect()
  }

  async fn is_teacher_assigned(
    &self,
    teacher:   TeacherCode,
    classroom: ClassroomCode,
    subject:   SubjectCode,
  ) -> Result<bool> {
    let (teacher, classroom, subject) =
      (teacher.to_string(), classroom.to_string(), subject.to_string());

    let assigned = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM classroom_teachers
               WHERE teacher_code = ?1 AND classroom_code = ?2 AND subject_code = ?3",
              rusqlite::params![teacher, classroom, subject],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(assigned)
  }

  // ── Scores ────────────────────────────────────────────────────────────────

  async fn upsert_scores(&self, scores: Vec<Score>) -> Result<()> {
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO scores (student_code, exam_code, score_value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (student_code, exam_code)
             DO UPDATE SET score_value = excluded.score_value,
                           updated_at  = excluded.updated_at",
          )?;
          for score in &scores {
            stmt.execute(rusqlite::params![
              score.student_code.as_str(),
              score.exam_code.as_str(),
              score.score_value,
              now,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_exam_scores(&self, exam: ExamCode, students: Vec<StudentCode>) -> Result<Vec<Score>> {
    if students.is_empty() {
      return Ok(Vec::new());
    }
    let exam_str = exam.to_string();

    let rows: Vec<(String, String, f64)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT student_code, exam_code, score_value FROM scores
           WHERE exam_code = ?1 AND student_code IN ({})
           ORDER BY student_code",
          placeholders(2, students.len())
        );
        let params = std::iter::once(exam_str)
          .chain(students.iter().map(|s| s.to_string()));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(student, exam, value)| Score {
          student_code: student.into(),
          exam_code:    exam.into(),
          score_value:  value,
        })
        .collect(),
    )
  }

  async fn list_student_scores(
    &self,
    student: StudentCode,
    subject: Option<SubjectCode>,
    term:    Option<TermCode>,
  ) -> Result<Vec<StudentScore>> {
    let student_str = student.to_string();
    let subject_str = subject.map(|s| s.to_string());
    let term_str    = term.map(|t| t.to_string());

    let scores = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.exam_code, e.subject_code, e.term_code, s.score_value
           FROM scores s
           JOIN exams e ON e.exam_code = s.exam_code
           WHERE s.student_code = ?1
             AND (?2 IS NULL OR e.subject_code = ?2)
             AND (?3 IS NULL OR e.term_code = ?3)
           ORDER BY e.term_code, e.subject_code, e.exam_date, s.exam_code",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![student_str, subject_str, term_str], |row| {
            Ok(StudentScore {
              exam_code:    ExamCode::from(row.get::<_, String>(0)?),
              subject_code: SubjectCode::from(row.get::<_, String>(1)?),
              term_code:    TermCode::from(row.get::<_, String>(2)?),
              score_value:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(scores)
  }

  // ── Subject averages ──────────────────────────────────────────────────────

  async fn put_subject_average(&self, row: SubjectAverage) -> Result<()> {
    let cols = scope_columns(&row.scope);

    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO {table} (student_code, subject_code, {scope}, average)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (student_code, subject_code, {scope})
           DO UPDATE SET average = excluded.average",
          table = cols.subject_table,
          scope = cols.scope_column,
        );
        conn.execute(
          &sql,
          rusqlite::params![
            row.student_code.as_str(),
            row.subject_code.as_str(),
            cols.code,
            row.average,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_subject_average(
    &self,
    student: StudentCode,
    subject: SubjectCode,
    scope:   Scope,
  ) -> Result<()> {
    let cols = scope_columns(&scope);
    let (student, subject) = (student.to_string(), subject.to_string());

    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "DELETE FROM {} WHERE student_code = ?1 AND subject_code = ?2 AND {} = ?3",
          cols.subject_table, cols.scope_column,
        );
        conn.execute(&sql, rusqlite::params![student, subject, cols.code])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_subject_averages(
    &self,
    student: StudentCode,
    scope:   Scope,
  ) -> Result<Vec<SubjectAverage>> {
    let cols = scope_columns(&scope);
    let student_str = student.to_string();

    let rows: Vec<(String, f64)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT subject_code, average FROM {} WHERE student_code = ?1 AND {} = ?2
           ORDER BY subject_code",
          cols.subject_table, cols.scope_column,
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![student_str, cols.code], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(subject, average)| SubjectAverage {
          student_code: student.clone(),
          subject_code: subject.into(),
          scope: scope.clone(),
          average,
        })
        .collect(),
    )
  }

  // ── Student averages ──────────────────────────────────────────────────────

  async fn put_student_average(&self, row: ClassifiedAverage) -> Result<()> {
    let cols        = scope_columns(row.scope());
    let student     = row.student_code().to_string();
    let average     = row.average();
    let performance = encode_performance(row.academic_performance());

    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO {table} (student_code, {scope}, {avg}, academic_performance)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (student_code, {scope})
           DO UPDATE SET {avg} = excluded.{avg},
                         academic_performance = excluded.academic_performance",
          table = cols.student_table,
          scope = cols.scope_column,
          avg = cols.average_column,
        );
        conn.execute(&sql, rusqlite::params![student, cols.code, average, performance])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_student_average(&self, student: StudentCode, scope: Scope) -> Result<()> {
    let cols = scope_columns(&scope);
    let student = student.to_string();

    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "DELETE FROM {} WHERE student_code = ?1 AND {} = ?2",
          cols.student_table, cols.scope_column,
        );
        conn.execute(&sql, rusqlite::params![student, cols.code])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_student_average(
    &self,
    student: StudentCode,
    scope:   Scope,
  ) -> Result<Option<StudentAverage>> {
    let cols = scope_columns(&scope);
    let student = student.to_string();

    let raw: Option<RawStudentAverage> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM {} WHERE student_code = ?1 AND {} = ?2",
          RawStudentAverage::select_list(&cols),
          cols.student_table,
          cols.scope_column,
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![student, cols.code], RawStudentAverage::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_student_average(&scope)).transpose()
  }

  async fn list_student_averages(
    &self,
    scope:    Scope,
    students: Vec<StudentCode>,
  ) -> Result<Vec<StudentAverage>> {
    if students.is_empty() {
      return Ok(Vec::new());
    }
    let cols = scope_columns(&scope);

    let raws: Vec<RawStudentAverage> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM {} WHERE {} = ?1 AND student_code IN ({})
           ORDER BY student_code",
          RawStudentAverage::select_list(&cols),
          cols.student_table,
          cols.scope_column,
          placeholders(2, students.len()),
        );
        let params = std::iter::once(cols.code.clone())
          .chain(students.iter().map(|s| s.to_string()));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawStudentAverage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|r| r.into_student_average(&scope))
      .collect()
  }

  async fn write_ranks(
    &self,
    scope: Scope,
    kind:  RankKind,
    ranks: Vec<RankAssignment>,
  ) -> Result<()> {
    let cols = scope_columns(&scope);
    let rank_col = rank_column(kind);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let sql = format!(
            "UPDATE {} SET {rank_col} = ?1 WHERE student_code = ?2 AND {} = ?3",
            cols.student_table, cols.scope_column,
          );
          let mut stmt = tx.prepare(&sql)?;
          for r in &ranks {
            stmt.execute(rusqlite::params![r.rank, r.student_code.as_str(), cols.code])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

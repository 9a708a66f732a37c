//! SQL schema for the gradebook SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Reference data (written only by seeding) ──────────────────────────────

CREATE TABLE IF NOT EXISTS school_years (
    school_year_code TEXT PRIMARY KEY,
    school_year_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS terms (
    term_code        TEXT PRIMARY KEY,
    term_name        TEXT NOT NULL,
    school_year_code TEXT NOT NULL REFERENCES school_years(school_year_code)
);

CREATE TABLE IF NOT EXISTS grades (
    grade_code       TEXT PRIMARY KEY,
    grade_name       TEXT NOT NULL,
    school_year_code TEXT NOT NULL REFERENCES school_years(school_year_code)
);

CREATE TABLE IF NOT EXISTS classrooms (
    classroom_code TEXT PRIMARY KEY,
    classroom_name TEXT NOT NULL,
    grade_code     TEXT NOT NULL REFERENCES grades(grade_code)
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_code TEXT PRIMARY KEY,
    subject_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    student_code   TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    classroom_code TEXT NOT NULL REFERENCES classrooms(classroom_code)
);

CREATE TABLE IF NOT EXISTS teachers (
    teacher_code TEXT PRIMARY KEY,
    name         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS classroom_teachers (
    classroom_code TEXT NOT NULL REFERENCES classrooms(classroom_code),
    teacher_code   TEXT NOT NULL REFERENCES teachers(teacher_code),
    subject_code   TEXT NOT NULL REFERENCES subjects(subject_code),
    PRIMARY KEY (classroom_code, teacher_code, subject_code)
);

CREATE TABLE IF NOT EXISTS exams (
    exam_code    TEXT PRIMARY KEY,
    exam_name    TEXT NOT NULL,
    subject_code TEXT NOT NULL REFERENCES subjects(subject_code),
    term_code    TEXT NOT NULL REFERENCES terms(term_code),
    exam_date    TEXT NOT NULL,  -- YYYY-MM-DD
    kind         TEXT            -- 'midterm' | 'final' | 'regular' | NULL (infer from name)
);

-- ── Raw scores ────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS scores (
    student_code TEXT NOT NULL REFERENCES students(student_code),
    exam_code    TEXT NOT NULL REFERENCES exams(exam_code),
    score_value  REAL NOT NULL CHECK (score_value >= 0 AND score_value <= 10),
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (student_code, exam_code)
);

-- ── Derived rows (written only by the engine) ─────────────────────────────

CREATE TABLE IF NOT EXISTS subject_averages (
    student_code TEXT NOT NULL REFERENCES students(student_code),
    subject_code TEXT NOT NULL REFERENCES subjects(subject_code),
    term_code    TEXT NOT NULL REFERENCES terms(term_code),
    average      REAL NOT NULL,
    PRIMARY KEY (student_code, subject_code, term_code)
);

CREATE TABLE IF NOT EXISTS subject_yearly_averages (
    student_code     TEXT NOT NULL REFERENCES students(student_code),
    subject_code     TEXT NOT NULL REFERENCES subjects(subject_code),
    school_year_code TEXT NOT NULL REFERENCES school_years(school_year_code),
    average          REAL NOT NULL,
    PRIMARY KEY (student_code, subject_code, school_year_code)
);

CREATE TABLE IF NOT EXISTS student_term_averages (
    student_code         TEXT NOT NULL REFERENCES students(student_code),
    term_code            TEXT NOT NULL REFERENCES terms(term_code),
    term_average         REAL NOT NULL,
    classroom_rank       INTEGER,
    grade_rank           INTEGER,
    academic_performance TEXT NOT NULL,
    PRIMARY KEY (student_code, term_code)
);

CREATE TABLE IF NOT EXISTS student_yearly_averages (
    student_code         TEXT NOT NULL REFERENCES students(student_code),
    school_year_code     TEXT NOT NULL REFERENCES school_years(school_year_code),
    yearly_average       REAL NOT NULL,
    classroom_rank       INTEGER,
    grade_rank           INTEGER,
    academic_performance TEXT NOT NULL,
    PRIMARY KEY (student_code, school_year_code)
);

CREATE INDEX IF NOT EXISTS terms_year_idx          ON terms(school_year_code);
CREATE INDEX IF NOT EXISTS classrooms_grade_idx    ON classrooms(grade_code);
CREATE INDEX IF NOT EXISTS students_classroom_idx  ON students(classroom_code);
CREATE INDEX IF NOT EXISTS exams_term_subject_idx  ON exams(term_code, subject_code);
CREATE INDEX IF NOT EXISTS scores_exam_idx         ON scores(exam_code);
CREATE INDEX IF NOT EXISTS term_averages_term_idx  ON student_term_averages(term_code);
CREATE INDEX IF NOT EXISTS yearly_averages_year_idx ON student_yearly_averages(school_year_code);

PRAGMA user_version = 1;
";

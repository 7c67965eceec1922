//! SQL schema for the Bulletin SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS programs (
    program_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    level       TEXT
);

CREATE TABLE IF NOT EXISTS students (
    student_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    program_id    INTEGER REFERENCES programs(program_id),
    academic_year TEXT NOT NULL,
    enrolled_at   TEXT NOT NULL     -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    coefficient REAL NOT NULL CHECK (coefficient > 0),
    program_id  INTEGER REFERENCES programs(program_id)
);

CREATE TABLE IF NOT EXISTS exams (
    exam_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id  INTEGER NOT NULL REFERENCES subjects(subject_id),
    title       TEXT NOT NULL,
    exam_type   TEXT NOT NULL,      -- 'CONTROLE' | 'EXAMEN' | 'PROJET' | 'TP'
    coefficient REAL NOT NULL CHECK (coefficient > 0),
    held_on     TEXT                -- YYYY-MM-DD or NULL
);

-- One row per (student, exam). The score is replaced in place on update.
CREATE TABLE IF NOT EXISTS grades (
    student_id  INTEGER NOT NULL REFERENCES students(student_id),
    exam_id     INTEGER NOT NULL REFERENCES exams(exam_id),
    score       REAL NOT NULL,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (student_id, exam_id)
);

CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL,    -- 'ADMIN' | 'RESPONSABLE' | 'TEACHER' | 'STUDENT'
    student_id    INTEGER REFERENCES students(student_id),
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS students_program_idx ON students(program_id);
CREATE INDEX IF NOT EXISTS subjects_program_idx ON subjects(program_id);
CREATE INDEX IF NOT EXISTS exams_subject_idx    ON exams(subject_id);
CREATE INDEX IF NOT EXISTS grades_exam_idx      ON grades(exam_id);

PRAGMA user_version = 1;
";

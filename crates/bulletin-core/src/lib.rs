//! Core types, trait definitions and grade arithmetic for Bulletin.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::GradeStore`]; everything that turns
//! stored grades into averages, statuses and transcripts lives here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod exam;
pub mod grade;
pub mod report;
pub mod store;
pub mod student;
pub mod subject;
pub mod transcript;
pub mod user;

pub use error::{Error, Result};

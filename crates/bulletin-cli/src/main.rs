//! `bulletin`: command-line client for the Bulletin grade server.
//!
//! # Usage
//!
//! ```
//! bulletin --url http://localhost:8080 --user prof --password secret students
//! bulletin --config ~/.config/bulletin/config.toml transcript 12 --detail
//! ```

mod client;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "bulletin", about = "Query grades, averages and transcripts")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the bulletin server (default: http://localhost:8080).
  #[arg(long, env = "BULLETIN_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "BULLETIN_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "BULLETIN_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List students, optionally restricted to one program.
  Students {
    #[arg(long)]
    program: Option<i64>,
  },
  /// List subjects, optionally restricted to one program.
  Subjects {
    #[arg(long)]
    program: Option<i64>,
  },
  /// List every grade of a student.
  Grades { student_id: i64 },
  /// Overall average and status of a student.
  Average { student_id: i64 },
  /// Print a student's transcript.
  Transcript {
    student_id: i64,
    /// Include per-exam lines under each subject.
    #[arg(long)]
    detail:     bool,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

/// Flag (or its env var) over config file over `default`.
fn pick(flag: Option<String>, file: &str, default: &str) -> String {
  flag
    .or_else(|| (!file.is_empty()).then(|| file.to_string()))
    .unwrap_or_else(|| default.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(ApiConfig {
    base_url: pick(args.url, &file_cfg.url, "http://localhost:8080"),
    username: pick(args.user, &file_cfg.username, ""),
    password: pick(args.password, &file_cfg.password, ""),
  })?;

  let text = match args.command {
    Command::Students { program } => output::students(&client.list_students(program).await?),
    Command::Subjects { program } => output::subjects(&client.list_subjects(program).await?),
    Command::Grades { student_id } => output::grades(&client.list_grades(student_id).await?),
    Command::Average { student_id } => {
      output::overall(&client.overall_average(student_id).await?)
    }
    Command::Transcript { student_id, detail } => {
      client.transcript_text(student_id, detail).await?
    }
  };
  print!("{text}");
  if !text.ends_with('\n') {
    println!();
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flag_beats_file_beats_default() {
    assert_eq!(pick(Some("a".into()), "b", "c"), "a");
    assert_eq!(pick(None, "b", "c"), "b");
    assert_eq!(pick(None, "", "c"), "c");
  }

  #[test]
  fn parses_transcript_subcommand() {
    let args = Args::try_parse_from(["bulletin", "transcript", "12", "--detail"]).unwrap();
    assert!(matches!(
      args.command,
      Command::Transcript { student_id: 12, detail: true }
    ));
  }

  #[test]
  fn config_file_fields_are_optional() {
    let cfg: ConfigFile = toml::from_str("url = \"http://school:9000\"").unwrap();
    assert_eq!(cfg.url, "http://school:9000");
    assert!(cfg.username.is_empty());
  }
}

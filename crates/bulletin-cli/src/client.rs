//! Async HTTP client wrapping the Bulletin JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bulletin_core::{
  aggregate::OverallAggregate, grade::GradeEntry, student::Student, subject::Subject,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Connection settings for the Bulletin API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the Bulletin JSON REST API.
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
    tracing::debug!(path, "GET");
    let resp = self
      .auth(self.client.get(self.url(path)))
      .query(query)
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;

    if resp.status().is_success() {
      return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow!("GET {path} → {status}: {}", error_message(&body)))
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    self
      .get(path, query)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {path}"))
  }

  /// `GET /api/students[?program_id=<id>]`
  pub async fn list_students(&self, program_id: Option<i64>) -> Result<Vec<Student>> {
    let query: Vec<_> = program_id.map(|id| ("program_id", id.to_string())).into_iter().collect();
    self.get_json("/students", &query).await
  }

  /// `GET /api/subjects[?program_id=<id>]`
  pub async fn list_subjects(&self, program_id: Option<i64>) -> Result<Vec<Subject>> {
    let query: Vec<_> = program_id.map(|id| ("program_id", id.to_string())).into_iter().collect();
    self.get_json("/subjects", &query).await
  }

  /// `GET /api/grades?student_id=<id>`
  pub async fn list_grades(&self, student_id: i64) -> Result<Vec<GradeEntry>> {
    self
      .get_json("/grades", &[("student_id", student_id.to_string())])
      .await
  }

  /// `GET /api/students/<id>/average`
  pub async fn overall_average(&self, student_id: i64) -> Result<OverallAggregate> {
    self
      .get_json(&format!("/students/{student_id}/average"), &[])
      .await
  }

  /// `GET /api/students/<id>/transcript?format=text`
  pub async fn transcript_text(&self, student_id: i64, detail: bool) -> Result<String> {
    self
      .get(
        &format!("/students/{student_id}/transcript"),
        &[("format", "text".to_string()), ("detail", detail.to_string())],
      )
      .await?
      .text()
      .await
      .context("reading transcript")
  }
}

/// Pull the `error` field out of an API error body, falling back to the raw
/// text.
fn error_message(body: &str) -> String {
  serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_message_prefers_json_field() {
    assert_eq!(
      error_message(r#"{"error":"forbidden","code":"forbidden"}"#),
      "forbidden"
    );
    assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
  }

  #[test]
  fn url_joins_api_prefix() {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://localhost:8080/".into(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap();
    assert_eq!(client.url("/students"), "http://localhost:8080/api/students");
  }
}

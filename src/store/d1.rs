// src/store/d1.rs
//! Cloudflare D1 store over the HTTP query API. Thin glue: every method is
//! one parameterized SQL statement; dedup is enforced by the table's
//! `(id, collected_on)` unique constraint via `INSERT OR IGNORE`.

use crate::error::HarvestError;
use crate::store::{PostStore, SessionLog, TaskStore};
use crate::types::{DailyTask, ExtractedKeyword, SessionRecord, StoredPost, TaskStatus};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const ENV_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
const ENV_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
const ENV_DATABASE_ID: &str = "D1_DATABASE_ID";

pub struct D1Store {
    http: reqwest::Client,
    query_url: String,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct D1Envelope {
    success: bool,
    #[serde(default)]
    result: Vec<D1QueryResult>,
}

#[derive(Debug, Default, Deserialize)]
struct D1QueryResult {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    meta: D1Meta,
}

#[derive(Debug, Default, Deserialize)]
struct D1Meta {
    #[serde(default)]
    changes: u64,
}

impl D1Store {
    pub fn from_env() -> Result<Self, HarvestError> {
        let token = require_env(ENV_API_TOKEN)?;
        let account = require_env(ENV_ACCOUNT_ID)?;
        let database = require_env(ENV_DATABASE_ID)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HarvestError::storage(format!("building http client: {e}")))?;

        Ok(Self {
            http,
            query_url: format!(
                "https://api.cloudflare.com/client/v4/accounts/{account}/d1/database/{database}/query"
            ),
            api_token: token,
        })
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<D1QueryResult, HarvestError> {
        let resp = self
            .http
            .post(&self.query_url)
            .bearer_auth(&self.api_token)
            .json(&json!({ "sql": sql, "params": params }))
            .send()
            .await
            .map_err(|e| HarvestError::storage(format!("d1 request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HarvestError::storage(format!(
                "d1 api returned {status}: {body}"
            )));
        }

        let envelope: D1Envelope = resp
            .json()
            .await
            .map_err(|e| HarvestError::storage(format!("d1 response decode: {e}")))?;
        if !envelope.success {
            return Err(HarvestError::storage("d1 query unsuccessful"));
        }
        Ok(envelope.result.into_iter().next().unwrap_or_default())
    }

    async fn count_query(&self, sql: &str, params: Vec<Value>) -> Result<u32, HarvestError> {
        let result = self.execute(sql, params).await?;
        Ok(result
            .results
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32)
    }
}

fn require_env(name: &str) -> Result<String, HarvestError> {
    std::env::var(name).map_err(|_| HarvestError::config(format!("missing env var {name}")))
}

fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn status_from_str(s: &str) -> TaskStatus {
    match s {
        "running" => TaskStatus::Running,
        "completed" => TaskStatus::Completed,
        "failed" => TaskStatus::Failed,
        _ => TaskStatus::Pending,
    }
}

#[async_trait::async_trait]
impl PostStore for D1Store {
    async fn exists_today(&self, item_id: &str, date: NaiveDate) -> Result<bool, HarvestError> {
        let count = self
            .count_query(
                "SELECT COUNT(*) AS count FROM harvested_posts WHERE id = ? AND collected_on = ?",
                vec![json!(item_id), json!(date_str(date))],
            )
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, post: &StoredPost) -> Result<bool, HarvestError> {
        let classification = serde_json::to_string(&post.classification)
            .map_err(|e| HarvestError::storage(format!("serializing classification: {e}")))?;
        let result = self
            .execute(
                "INSERT OR IGNORE INTO harvested_posts (
                    id, collected_on, source, permalink, url, title, body,
                    score, upvote_ratio, num_comments, author, created_utc,
                    quality_score, time_weighted_score, tech_relevance_score,
                    primary_category, content_type, classification
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                vec![
                    json!(post.item.id),
                    json!(date_str(post.collected_on)),
                    json!(post.source),
                    json!(post.item.permalink),
                    json!(post.item.url),
                    json!(post.item.title),
                    json!(post.item.body),
                    json!(post.item.score),
                    json!(post.item.upvote_ratio),
                    json!(post.item.num_comments),
                    json!(post.item.author),
                    json!(post.item.created_utc),
                    json!(post.quality_score),
                    json!(post.time_weighted_score),
                    json!(post.tech_relevance_score),
                    json!(post.classification.primary_category),
                    json!(post.classification.content_type),
                    json!(classification),
                ],
            )
            .await?;
        Ok(result.meta.changes > 0)
    }

    async fn insert_keywords(
        &self,
        item_id: &str,
        keywords: &[ExtractedKeyword],
    ) -> Result<u32, HarvestError> {
        let mut written = 0u32;
        for kw in keywords {
            let result = self
                .execute(
                    "INSERT INTO post_keywords (
                        post_id, keyword, category, confidence,
                        extraction_method, frequency, position
                    ) VALUES (?, ?, ?, ?, ?, ?, ?)",
                    vec![
                        json!(item_id),
                        json!(kw.keyword),
                        json!(kw.category),
                        json!(kw.confidence),
                        json!(kw.method),
                        json!(kw.frequency),
                        json!(kw.position),
                    ],
                )
                .await?;
            if result.meta.changes > 0 {
                written += 1;
            }
        }
        Ok(written)
    }

    async fn count_today(&self, date: NaiveDate) -> Result<u32, HarvestError> {
        self.count_query(
            "SELECT COUNT(*) AS count FROM harvested_posts WHERE collected_on = ?",
            vec![json!(date_str(date))],
        )
        .await
    }

    async fn count_today_by_source(
        &self,
        date: NaiveDate,
    ) -> Result<HashMap<String, u32>, HarvestError> {
        let result = self
            .execute(
                "SELECT source, COUNT(*) AS count FROM harvested_posts
                 WHERE collected_on = ? GROUP BY source ORDER BY count DESC",
                vec![json!(date_str(date))],
            )
            .await?;

        let mut stats = HashMap::new();
        for row in result.results {
            let source = row.get("source").and_then(Value::as_str);
            let count = row.get("count").and_then(Value::as_u64);
            if let (Some(source), Some(count)) = (source, count) {
                stats.insert(source.to_string(), count as u32);
            }
        }
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl TaskStore for D1Store {
    async fn create_if_absent(&self, date: NaiveDate, target: u32) -> Result<(), HarvestError> {
        self.execute(
            "INSERT OR IGNORE INTO daily_tasks (task_date, target_count, status)
             VALUES (?, ?, 'pending')",
            vec![json!(date_str(date)), json!(target)],
        )
        .await?;
        Ok(())
    }

    async fn try_start(&self, date: NaiveDate) -> Result<bool, HarvestError> {
        // Conditional update doubles as the cross-process claim: only one
        // writer observes changes > 0.
        let result = self
            .execute(
                "UPDATE daily_tasks
                 SET status = 'running', started_at = unixepoch(), error_message = NULL
                 WHERE task_date = ? AND status IN ('pending', 'failed')",
                vec![json!(date_str(date))],
            )
            .await?;
        Ok(result.meta.changes > 0)
    }

    async fn finish(
        &self,
        date: NaiveDate,
        status: TaskStatus,
        actual_count: u32,
        error_message: Option<String>,
    ) -> Result<(), HarvestError> {
        self.execute(
            "UPDATE daily_tasks
             SET status = ?, actual_count = ?, ended_at = unixepoch(), error_message = ?
             WHERE task_date = ?",
            vec![
                json!(status.as_str()),
                json!(actual_count),
                json!(error_message),
                json!(date_str(date)),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get(&self, date: NaiveDate) -> Result<Option<DailyTask>, HarvestError> {
        let result = self
            .execute(
                "SELECT task_date, target_count, actual_count, status,
                        started_at, ended_at, error_message
                 FROM daily_tasks WHERE task_date = ?",
                vec![json!(date_str(date))],
            )
            .await?;

        let Some(row) = result.results.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(DailyTask {
            date,
            target_count: row.get("target_count").and_then(Value::as_u64).unwrap_or(0) as u32,
            actual_count: row.get("actual_count").and_then(Value::as_u64).unwrap_or(0) as u32,
            status: status_from_str(
                row.get("status").and_then(Value::as_str).unwrap_or("pending"),
            ),
            started_at: row.get("started_at").and_then(Value::as_i64),
            ended_at: row.get("ended_at").and_then(Value::as_i64),
            error_message: row
                .get("error_message")
                .and_then(Value::as_str)
                .map(str::to_string),
        }))
    }
}

#[async_trait::async_trait]
impl SessionLog for D1Store {
    async fn record(&self, session: &SessionRecord) -> Result<(), HarvestError> {
        self.execute(
            "INSERT INTO crawl_sessions (
                session_id, task_date, sources_touched, total_fetched,
                total_processed, total_stored, api_calls, status, errors
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                json!(session.session_id),
                json!(date_str(session.date)),
                json!(session.sources_touched.join(",")),
                json!(session.total_fetched),
                json!(session.total_processed),
                json!(session.total_stored),
                json!(session.api_calls),
                json!(session.status.as_str()),
                json!(session.errors.join("; ")),
            ],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_counts_and_changes() {
        let raw = r#"{
            "success": true,
            "result": [{
                "results": [{"count": 7}],
                "meta": {"changes": 1, "duration": 0.2}
            }]
        }"#;
        let env: D1Envelope = serde_json::from_str(raw).unwrap();
        assert!(env.success);
        let result = &env.result[0];
        assert_eq!(result.results[0]["count"], 7);
        assert_eq!(result.meta.changes, 1);
    }

    #[test]
    fn envelope_tolerates_missing_fields() {
        let env: D1Envelope = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(env.result.is_empty());
    }
}

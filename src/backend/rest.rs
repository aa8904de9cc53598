// Hosted roster table over a PostgREST-style API (Supabase convention).
//
// Every operation is a single request against `{url}/rest/v1/{table}`.
// Upserts go through `on_conflict` with `Prefer: resolution=merge-duplicates`
// so insert-or-update is one atomic call, never read-then-branch.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ScheduleMode;
use crate::roster::entry::{EntryId, RosterEntry};

use super::{BackendResult, RosterBackend, TransportError};

/// How much response body to quote in an error message.
const ERROR_BODY_SNIPPET: usize = 200;

pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    key_column: &'static str,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: &str, table: &str, mode: ScheduleMode) -> Self {
        RestBackend {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            key_column: mode.key_column(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Check the status and parse the body as JSON, quoting a snippet of the
    /// body in the error message on a non-2xx response.
    async fn expect_json(
        response: reqwest::Response,
        context: &str,
    ) -> BackendResult<Value> {
        let status = response.status();
        let body = response.text().await.map_err(TransportError::from)?;
        if !status.is_success() {
            let snippet: String = body.chars().take(ERROR_BODY_SNIPPET).collect();
            return Err(TransportError::new(format!(
                "{context}: HTTP {status}: {snippet}"
            )));
        }
        serde_json::from_str(&body)
            .map_err(|e| TransportError::new(format!("{context}: invalid response body: {e}")))
    }

    /// Check the status of a response whose body we don't need.
    async fn expect_ok(response: reqwest::Response, context: &str) -> BackendResult<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_SNIPPET).collect();
            return Err(TransportError::new(format!(
                "{context}: HTTP {status}: {snippet}"
            )));
        }
        Ok(())
    }

    fn entry_from_value(&self, value: &Value, context: &str) -> BackendResult<RosterEntry> {
        // The id column is a UUID string on hosted Postgres but may be a
        // bigint on self-hosted setups; accept both.
        let id = match value.get("id") {
            Some(Value::String(s)) => EntryId(s.clone()),
            Some(Value::Number(n)) => EntryId(n.to_string()),
            _ => return Err(TransportError::new(format!("{context}: row missing id"))),
        };
        let position = value
            .get(self.key_column)
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                TransportError::new(format!("{context}: row missing {}", self.key_column))
            })? as u32;
        let member1 = value
            .get("member1")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let member2 = value
            .get("member2")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(RosterEntry {
            id,
            position,
            member1,
            member2,
        })
    }

    /// Parse a `return=representation` response, which is always an array;
    /// single-row writes return an array of one.
    fn single_entry(&self, value: &Value, context: &str) -> BackendResult<RosterEntry> {
        let row = value
            .as_array()
            .and_then(|rows| rows.first())
            .ok_or_else(|| TransportError::new(format!("{context}: empty response")))?;
        self.entry_from_value(row, context)
    }
}

#[async_trait]
impl RosterBackend for RestBackend {
    async fn select_all(&self) -> BackendResult<Vec<RosterEntry>> {
        let order = format!("{}.asc", self.key_column);
        let request = self
            .http
            .get(self.endpoint())
            .query(&[("select", "*"), ("order", order.as_str())]);
        let response = self.authed(request).send().await.map_err(TransportError::from)?;
        let body = Self::expect_json(response, "select").await?;

        let rows = body
            .as_array()
            .ok_or_else(|| TransportError::new("select: response is not an array"))?;
        rows.iter()
            .map(|row| self.entry_from_value(row, "select"))
            .collect()
    }

    async fn upsert_slot(
        &self,
        slot: u32,
        member1: &str,
        member2: &str,
    ) -> BackendResult<RosterEntry> {
        debug!(slot, "upserting slot");
        let request = self
            .http
            .post(self.endpoint())
            .query(&[("on_conflict", self.key_column)])
            .header(
                "Prefer",
                "resolution=merge-duplicates,return=representation",
            )
            .json(&json!([{
                self.key_column: slot,
                "member1": member1,
                "member2": member2,
            }]));
        let response = self.authed(request).send().await.map_err(TransportError::from)?;
        let body = Self::expect_json(response, "upsert").await?;
        self.single_entry(&body, "upsert")
    }

    async fn insert_at(&self, position: u32) -> BackendResult<RosterEntry> {
        let request = self
            .http
            .post(self.endpoint())
            .header("Prefer", "return=representation")
            .json(&json!([{
                self.key_column: position,
                "member1": "",
                "member2": "",
            }]));
        let response = self.authed(request).send().await.map_err(TransportError::from)?;
        let body = Self::expect_json(response, "insert").await?;
        self.single_entry(&body, "insert")
    }

    async fn update_members(
        &self,
        id: &EntryId,
        member1: &str,
        member2: &str,
    ) -> BackendResult<RosterEntry> {
        let request = self
            .http
            .patch(self.endpoint())
            .query(&[("id", &format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&json!({ "member1": member1, "member2": member2 }));
        let response = self.authed(request).send().await.map_err(TransportError::from)?;
        let body = Self::expect_json(response, "update").await?;
        self.single_entry(&body, "update")
    }

    /// Sequential per-row writes in list order, stopping at the first
    /// failure. Best-effort: a mid-sequence failure leaves earlier rows
    /// persisted with their new rank and later rows untouched.
    async fn update_positions(&self, ranks: &[(EntryId, u32)]) -> BackendResult<()> {
        for (id, rank) in ranks {
            let request = self
                .http
                .patch(self.endpoint())
                .query(&[("id", &format!("eq.{id}"))])
                .json(&json!({ self.key_column: rank }));
            let response = self.authed(request).send().await.map_err(TransportError::from)?;
            Self::expect_ok(response, "reorder").await?;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &EntryId) -> BackendResult<()> {
        let request = self
            .http
            .delete(self.endpoint())
            .query(&[("id", &format!("eq.{id}"))]);
        let response = self.authed(request).send().await.map_err(TransportError::from)?;
        Self::expect_ok(response, "delete").await
    }

    async fn delete_by_slot(&self, slot: u32) -> BackendResult<()> {
        let request = self
            .http
            .delete(self.endpoint())
            .query(&[(self.key_column, &format!("eq.{slot}"))]);
        let response = self.authed(request).send().await.map_err(TransportError::from)?;
        Self::expect_ok(response, "delete").await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path whose audit payloads carry a credential email and therefore get the
/// masking transform applied.
pub const MASKED_PATH: &str = "/order/status";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub status_code: u16,
    pub status_message: String,
}

/// One request's durable trace: what was asked, with what payload, and how
/// it ended. Records are append-only and never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub ts: DateTime<Utc>,
    /// `"<METHOD> <path>"`, e.g. `"POST /cart/add"`.
    pub intent: String,
    pub payload: Value,
    pub result_summary: ResultSummary,
}

impl AuditRecord {
    /// Builds the record, masking any `email` field when the path is the
    /// order-status endpoint.
    pub fn new(
        method: &str,
        path: &str,
        mut payload: Value,
        status_code: u16,
        status_message: impl Into<String>,
    ) -> Self {
        if path == MASKED_PATH {
            if let Some(email) = payload.get("email").and_then(Value::as_str) {
                let masked = mask_email(email);
                payload["email"] = Value::String(masked);
            }
        }
        Self {
            ts: Utc::now(),
            intent: format!("{method} {path}"),
            payload,
            result_summary: ResultSummary {
                status_code,
                status_message: status_message.into(),
            },
        }
    }
}

/// Keeps the first character of the local part, replaces the remainder with
/// five asterisks, keeps the domain. Strings without `@` pass through.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}*****@{domain}")
        }
        _ => email.to_owned(),
    }
}

/// Destination for audit records. Implementations must not block the
/// response path; failures stay inside the sink.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl InMemoryAuditSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

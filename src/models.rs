use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

pub const NOT_AVAILABLE: &str = "N/A";

/// A monitored endpoint. Built once from configuration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl Target {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Unknown,
    Success,
    Failed,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Unknown => "UNKNOWN",
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
        }
    }
}

/// Result of a single probe. Probing never raises; every error ends up here.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { response_time_ms: u64, body: String },
    Failure { error: String },
}

/// Status change produced by one update, with the counters as of that write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: Status,
    pub to: Status,
    pub uptime: String,
    pub total_probes: u64,
}

/// Rolling health statistics for one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub name: String,
    pub url: String,
    pub status: Status,
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,
    #[serde(rename = "lastPing")]
    pub last_ping_at: Option<DateTime<Utc>>,
    pub success_count: u64,
    pub failure_count: u64,
    #[serde(rename = "uptime", serialize_with = "serialize_percent")]
    pub uptime_percent: Option<u8>,
    pub resource_usage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

fn serialize_percent<S: Serializer>(value: &Option<u8>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{}%", value.unwrap_or(0)))
}

impl HealthRecord {
    pub fn new(target: &Target) -> Self {
        Self {
            name: target.name.clone(),
            url: target.url.clone(),
            status: Status::Unknown,
            response_time_ms: 0,
            last_ping_at: None,
            success_count: 0,
            failure_count: 0,
            uptime_percent: None,
            resource_usage: NOT_AVAILABLE.into(),
            last_error: None,
        }
    }

    pub fn total_probes(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Folds one probe outcome into the record. `resource_usage` is the value
    /// already extracted from a successful body and is ignored on failure.
    pub fn apply(&mut self, outcome: &Outcome, resource_usage: String, now: DateTime<Utc>) {
        match outcome {
            Outcome::Success { response_time_ms, .. } => {
                self.status = Status::Success;
                self.response_time_ms = *response_time_ms;
                self.success_count += 1;
                self.resource_usage = resource_usage;
                self.last_error = None;
            }
            Outcome::Failure { error } => {
                self.status = Status::Failed;
                self.response_time_ms = 0;
                self.failure_count += 1;
                self.resource_usage = NOT_AVAILABLE.into();
                self.last_error = Some(error.clone());
            }
        }
        self.last_ping_at = Some(now);
        self.uptime_percent = uptime_percent(self.success_count, self.failure_count);
    }

    pub fn uptime_label(&self) -> String {
        format!("{}%", self.uptime_percent.unwrap_or(0))
    }
}

/// round(success / total * 100), or `None` before any probe has completed.
pub fn uptime_percent(success: u64, failure: u64) -> Option<u8> {
    let total = success + failure;
    if total == 0 {
        return None;
    }
    Some((success as f64 / total as f64 * 100.0).round() as u8)
}

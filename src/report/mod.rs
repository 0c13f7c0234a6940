use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use uuid::Uuid;

use crate::models::{Device, DeviceOutcome, Facts, Outcome, ProvisionError};

pub const HEADER: [&str; 7] = ["device", "result", "hostname", "serial", "sw_version", "loopback", "detail"];

/// Report is the final partition of a run: every device appears in exactly
/// one of `succeeded` or `failed`, in input order within each list.
#[derive(Debug, Clone)]
pub struct Report {
    pub run_id: Uuid,
    pub goal: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: Vec<(Device, Facts)>,
    pub failed: Vec<(Device, ProvisionError)>,
}

impl Report {
    pub fn new(
        run_id: Uuid,
        goal: &str,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcomes: Vec<DeviceOutcome>,
    ) -> Self {
        let (succeeded, failed) = partition(outcomes);
        Self {
            run_id,
            goal: goal.to_string(),
            started_at,
            finished_at,
            succeeded,
            failed,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn log_summary(&self) {
        let elapsed = self.finished_at - self.started_at;
        tracing::info!(
            "Run {} ({}) finished in {}ms: {} devices, {} succeeded, {} failed",
            self.run_id,
            self.goal,
            elapsed.num_milliseconds(),
            self.total(),
            self.succeeded.len(),
            self.failed.len()
        );
        for (device, err) in &self.failed {
            tracing::warn!("{}: {} ({})", device, err, err.kind());
        }
    }

    /// Render the report as delimited text, successes first
    pub fn to_delimited(&self, delimiter: char) -> String {
        let mut out = String::new();
        push_row(&mut out, delimiter, HEADER.iter().map(|h| h.to_string()));

        for (device, facts) in &self.succeeded {
            push_row(
                &mut out,
                delimiter,
                [
                    device.address.clone(),
                    "success".to_string(),
                    facts.hostname.clone().unwrap_or_default(),
                    facts.serial.clone().unwrap_or_default(),
                    facts.sw_version.as_ref().map(|v| v.to_string()).unwrap_or_default(),
                    facts.loopback_address.clone().unwrap_or_default(),
                    facts.commit_job.as_ref().map(|j| format!("commit job {}", j)).unwrap_or_default(),
                ],
            );
        }

        for (device, err) in &self.failed {
            push_row(
                &mut out,
                delimiter,
                [
                    device.address.clone(),
                    err.kind().to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    err.to_string(),
                ],
            );
        }
        out
    }

    pub async fn write_delimited(&self, path: &Path, delimiter: char) -> Result<()> {
        tokio::fs::write(path, self.to_delimited(delimiter))
            .await
            .with_context(|| format!("writing report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
        Ok(())
    }
}

/// Split outcomes into successes and failures, preserving order
pub fn partition(outcomes: Vec<DeviceOutcome>) -> (Vec<(Device, Facts)>, Vec<(Device, ProvisionError)>) {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for DeviceOutcome { device, outcome } in outcomes {
        match outcome {
            Outcome::Success(facts) => succeeded.push((device, facts)),
            Outcome::Failed(err) => failed.push((device, err)),
        }
    }
    (succeeded, failed)
}

fn push_row(out: &mut String, delimiter: char, fields: impl IntoIterator<Item = String>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(delimiter);
        }
        first = false;
        out.push_str(&quote(&field, delimiter));
    }
    out.push('\n');
}

fn quote(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

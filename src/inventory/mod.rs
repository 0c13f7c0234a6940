use anyhow::{Context, Result};
use std::collections::HashSet;
use tokio::io::AsyncReadExt;

use crate::models::Device;
use crate::utils::{is_valid_hostname, is_valid_ipv4};

/// Line that ends the device list
const SENTINEL: &str = "done";

/// Parse a device list, one address per line.
///
/// Blank lines and `#` comments are skipped, input stops at `done`, invalid
/// addresses are logged and dropped, repeats keep their first position.
pub fn parse(text: &str) -> Vec<Device> {
    let mut seen = HashSet::new();
    let mut devices = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        if entry.eq_ignore_ascii_case(SENTINEL) {
            break;
        }
        if !is_valid_ipv4(entry) && !is_valid_hostname(entry) {
            tracing::warn!("Skipping invalid device address on line {}: {:?}", lineno + 1, entry);
            continue;
        }
        if !seen.insert(entry.to_string()) {
            tracing::debug!("Skipping duplicate device {}", entry);
            continue;
        }
        devices.push(Device::new(entry));
    }
    devices
}

/// Load devices from `path`, or from stdin when `path` is `-`
pub async fn load(path: &str) -> Result<Vec<Device>> {
    let text = if path == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("reading devices from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading device list {}", path))?
    };

    let devices = parse(&text);
    tracing::info!("Loaded {} devices from {}", devices.len(), if path == "-" { "stdin" } else { path });
    Ok(devices)
}

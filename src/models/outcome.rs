use super::devices::{Device, IneligibleReason};
use crate::panos::SoftwareVersion;

/// ProvisionError is the reason a device ended the run in `Failed`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    /// No session could be obtained (credential or connectivity problem)
    #[error("auth failed: {0}")]
    Auth(String),

    /// Device excluded from mutating steps by HA policy
    #[error("{0}")]
    Ineligible(IneligibleReason),

    /// A named step failed; earlier steps stay applied
    #[error("{step}: {reason}")]
    Step { step: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    /// The device task panicked
    #[error("task aborted: {0}")]
    Aborted(String),
}

impl ProvisionError {
    /// Short machine-friendly tag used in report output
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionError::Auth(_) => "auth",
            ProvisionError::Ineligible(_) => "ineligible",
            ProvisionError::Step { .. } => "step",
            ProvisionError::Transport(_) => "transport",
            ProvisionError::Aborted(_) => "aborted",
        }
    }
}

/// Values recorded by steps for later steps and for the report
#[derive(Debug, Clone, Default)]
pub struct Facts {
    pub hostname: Option<String>,
    pub serial: Option<String>,
    pub sw_version: Option<SoftwareVersion>,
    pub loopback_address: Option<String>,
    pub commit_job: Option<String>,
}

/// Terminal per-device result; exactly one per device per run
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(Facts),
    Failed(ProvisionError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// DeviceOutcome pairs a device with its terminal outcome
#[derive(Debug, Clone)]
pub struct DeviceOutcome {
    pub device: Device,
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_names_step() {
        let err = ProvisionError::Step {
            step: "ensure-zone-member".to_string(),
            reason: "zone trust rejected: Invalid Object".to_string(),
        };
        assert_eq!(err.to_string(), "ensure-zone-member: zone trust rejected: Invalid Object");
        assert_eq!(err.kind(), "step");
    }

    #[test]
    fn test_ineligible_display() {
        assert_eq!(ProvisionError::Ineligible(IneligibleReason::Standby).to_string(), "standby");
        assert_eq!(ProvisionError::Ineligible(IneligibleReason::Unknown).to_string(), "unknown");
    }
}

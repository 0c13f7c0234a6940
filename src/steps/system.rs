use anyhow::Result;
use async_trait::async_trait;

use crate::models::AuditParams;
use crate::panos::ops::{self, CommitResult};
use crate::panos::{ApiError, SoftwareVersion};
use crate::pipeline::{Step, StepContext};

/// Reads hostname, serial and software version; later steps need the version
/// to address the REST API.
pub struct DetectVersion;

#[async_trait]
impl<P: Sync + 'static> Step<P> for DetectVersion {
    fn name(&self) -> &'static str {
        "detect-version"
    }

    fn mutates(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut StepContext<'_, P>) -> Result<()> {
        let body = ctx
            .op(ops::SHOW_SYSTEM_INFO)
            .await
            .map_err(|e| anyhow::anyhow!("show system info: {}", e))?;
        let info = ops::parse_system_info(&body)?;

        tracing::info!(
            "{}: hostname={} serial={} sw-version={}",
            ctx.device,
            info.hostname.as_deref().unwrap_or("N/A"),
            info.serial.as_deref().unwrap_or("N/A"),
            info.sw_version
        );

        ctx.facts.hostname = info.hostname;
        ctx.facts.serial = info.serial;
        ctx.facts.sw_version = Some(info.sw_version);
        Ok(())
    }
}

/// Records whatever identity `show system info` reports. Missing fields are
/// `N/A` rather than a failure since the audit never addresses the REST API.
pub struct ReadSystemInfo;

#[async_trait]
impl Step<AuditParams> for ReadSystemInfo {
    fn name(&self) -> &'static str {
        "read-system-info"
    }

    fn mutates(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut StepContext<'_, AuditParams>) -> Result<()> {
        let body = ctx
            .op(ops::SHOW_SYSTEM_INFO)
            .await
            .map_err(|e| anyhow::anyhow!("show system info: {}", e))?;
        let identity = ops::parse_system_identity(&body)?;

        let sw_version = match identity.sw_version.as_deref().map(SoftwareVersion::parse) {
            Some(Ok(v)) => Some(v),
            Some(Err(e)) => {
                tracing::warn!("{}: {}", ctx.device, e);
                None
            }
            None => {
                tracing::warn!("{}: software version not reported", ctx.device);
                None
            }
        };

        ctx.facts.hostname = Some(identity.hostname.unwrap_or_else(|| "N/A".to_string()));
        ctx.facts.serial = Some(identity.serial.unwrap_or_else(|| "N/A".to_string()));
        ctx.facts.sw_version = sw_version;
        Ok(())
    }
}

/// Reads the loopback's configured address via `show interface`
pub struct ReadLoopbackAddress;

#[async_trait]
impl Step<AuditParams> for ReadLoopbackAddress {
    fn name(&self) -> &'static str {
        "read-loopback-address"
    }

    fn mutates(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut StepContext<'_, AuditParams>) -> Result<()> {
        let name = ctx.params.interface_name();
        let address = match ctx.op(&ops::show_interface(&name)).await {
            Ok(body) => ops::parse_interface_ip(&body)?,
            // The device refuses `show interface` for names it does not have
            Err(ApiError::Rejected(msg)) => {
                tracing::info!("{}: {} not present: {}", ctx.device, name, msg);
                None
            }
            Err(e) => return Err(anyhow::anyhow!("show interface {}: {}", name, e)),
        };

        ctx.facts.loopback_address = Some(address.unwrap_or_else(|| "N/A".to_string()));
        Ok(())
    }
}

/// Persists pending changes to the running configuration
pub struct Commit;

#[async_trait]
impl<P: Sync + 'static> Step<P> for Commit {
    fn name(&self) -> &'static str {
        "commit"
    }

    async fn run(&self, ctx: &mut StepContext<'_, P>) -> Result<()> {
        let body = ctx.api.commit(ctx.device, ctx.session).await?;
        match ops::parse_commit(&body)? {
            CommitResult::Enqueued(job) => {
                tracing::info!("{}: commit enqueued as job {}", ctx.device, job);
                ctx.facts.commit_job = Some(job);
            }
            CommitResult::NoChanges(msg) => {
                tracing::info!("{}: nothing committed: {}", ctx.device, msg);
            }
        }
        Ok(())
    }
}

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::Instrument;

use crate::models::*;
use crate::panos::{ops, DeviceApi};
use crate::pipeline::Pipeline;
use crate::report::Report;

/// Obtain a session for one device; a single attempt
pub async fn acquire(api: &dyn DeviceApi, device: &Device, credential: &Credential) -> Result<Session, ProvisionError> {
    api.keygen(device, credential)
        .await
        .map_err(|e| ProvisionError::Auth(e.to_string()))
}

/// Classify the device's HA role for mutating pipelines.
///
/// Only an unreachable device is an error; every other failure to read the
/// role is `Ineligible(Unknown)`.
pub async fn check_eligibility(api: &dyn DeviceApi, device: &Device, session: &Session) -> Result<Eligibility, ProvisionError> {
    match api.op(device, session, ops::SHOW_HA_STATE).await {
        Ok(body) => Ok(Eligibility::from_role(ops::parse_ha_role(&body))),
        Err(e) if e.is_transport() => Err(ProvisionError::Transport(format!("HA state query: {}", e))),
        Err(e) => {
            tracing::warn!("{}: HA state unavailable: {}", device, e);
            Ok(Eligibility::Ineligible(IneligibleReason::Unknown))
        }
    }
}

/// Run one device end to end: session, HA check when the pipeline writes,
/// then the pipeline itself.
pub async fn run_device<P: Sync>(
    api: &dyn DeviceApi,
    device: &Device,
    credential: &Credential,
    pipeline: &Pipeline<P>,
    params: &P,
) -> Outcome {
    let session = match acquire(api, device, credential).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("{}: {}", device, e);
            return Outcome::Failed(e);
        }
    };

    if pipeline.mutates() {
        match check_eligibility(api, device, &session).await {
            Ok(Eligibility::Eligible(role)) => {
                tracing::debug!("{}: HA role {}", device, role);
            }
            Ok(Eligibility::Ineligible(reason)) => {
                tracing::info!("{}: skipped, device is {}", device, reason);
                return Outcome::Failed(ProvisionError::Ineligible(reason));
            }
            Err(e) => {
                tracing::warn!("{}: {}", device, e);
                return Outcome::Failed(e);
            }
        }
    }

    pipeline.run(api, device, &session, params).await
}

/// Orchestrator fans a pipeline out over a device list with a bounded
/// number of concurrent device sessions.
pub struct Orchestrator {
    api: Arc<dyn DeviceApi>,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn DeviceApi>, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
        }
    }

    /// Run `pipeline` against every device and report one outcome per device.
    ///
    /// A panicking device task is reported as `Aborted`; other devices are
    /// unaffected.
    pub async fn run_all<P: Send + Sync + 'static>(
        &self,
        devices: Vec<Device>,
        credential: Arc<Credential>,
        pipeline: Arc<Pipeline<P>>,
        params: Arc<P>,
    ) -> Report {
        let run_id = uuid::Uuid::new_v4();
        let started_at = Utc::now();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        tracing::info!(
            "Run {}: {} on {} devices (concurrency={}, steps={})",
            run_id,
            pipeline.name(),
            devices.len(),
            self.concurrency,
            pipeline.step_names().join(" -> ")
        );

        let handles: Vec<_> = devices
            .into_iter()
            .map(|device| {
                let api = self.api.clone();
                let semaphore = semaphore.clone();
                let credential = credential.clone();
                let pipeline = pipeline.clone();
                let params = params.clone();
                let task_device = device.clone();
                let span = tracing::info_span!("device", run = %run_id, host = %device);

                let handle = tokio::spawn(
                    async move {
                        let _permit = match semaphore.acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => {
                                return Outcome::Failed(ProvisionError::Aborted("worker pool closed".to_string()))
                            }
                        };
                        run_device(api.as_ref(), &task_device, &credential, &pipeline, &params).await
                    }
                    .instrument(span),
                );
                (device, handle)
            })
            .collect();

        let outcomes = join_all(handles.into_iter().map(|(device, handle)| async move {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let reason = join_error_message(e);
                    tracing::error!("{}: device task aborted: {}", device, reason);
                    Outcome::Failed(ProvisionError::Aborted(reason))
                }
            };
            DeviceOutcome { device, outcome }
        }))
        .await;

        Report::new(run_id, pipeline.name(), started_at, Utc::now(), outcomes)
    }
}

fn join_error_message(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

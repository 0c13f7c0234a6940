use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::models::{Device, Facts, Outcome, ProvisionError, Session};
use crate::panos::{ApiError, DeviceApi, ObjectRef, SoftwareVersion};

/// Everything a step can see while running against one device
pub struct StepContext<'a, P> {
    pub api: &'a dyn DeviceApi,
    pub device: &'a Device,
    pub session: &'a Session,
    pub params: &'a P,
    /// Values recorded by earlier steps
    pub facts: Facts,
}

impl<'a, P> StepContext<'a, P> {
    pub fn new(api: &'a dyn DeviceApi, device: &'a Device, session: &'a Session, params: &'a P) -> Self {
        Self {
            api,
            device,
            session,
            params,
            facts: Facts::default(),
        }
    }

    /// REST version detected by an earlier step
    pub fn version(&self) -> Result<&SoftwareVersion> {
        self.facts
            .sw_version
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("software version not detected"))
    }

    pub async fn op(&self, cmd: &str) -> Result<String, ApiError> {
        self.api.op(self.device, self.session, cmd).await
    }

    pub async fn get_object(&self, object: &ObjectRef) -> Result<Option<Value>> {
        let version = self.version()?;
        self.api
            .get_object(self.device, self.session, version, object)
            .await
            .map_err(|e| anyhow::anyhow!("read {}: {}", object, e))
    }

    /// Write `entry` back, creating the object when it did not exist
    pub async fn put_object(&self, object: &ObjectRef, entry: &Value, exists: bool) -> Result<()> {
        let version = self.version()?;
        let result = if exists {
            self.api
                .update_object(self.device, self.session, version, object, entry)
                .await
        } else {
            self.api
                .create_object(self.device, self.session, version, object, entry)
                .await
        };
        result.map_err(|e| anyhow::anyhow!("write {}: {}", object, e))
    }
}

/// A named, idempotent unit of work against one device
#[async_trait]
pub trait Step<P: Sync>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the step writes device configuration
    fn mutates(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut StepContext<'_, P>) -> Result<()>;
}

/// An ordered, short-circuiting sequence of steps for one goal
pub struct Pipeline<P: Sync> {
    name: String,
    steps: Vec<Box<dyn Step<P>>>,
}

impl<P: Sync> Pipeline<P> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl Step<P> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Append `step` only when `enabled`
    pub fn step_if(self, enabled: bool, step: impl Step<P> + 'static) -> Self {
        if enabled {
            self.step(step)
        } else {
            self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// True when any step writes; such pipelines require an eligible device
    pub fn mutates(&self) -> bool {
        self.steps.iter().any(|s| s.mutates())
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(&self, api: &dyn DeviceApi, device: &Device, session: &Session, params: &P) -> Outcome {
        let mut ctx = StepContext::new(api, device, session, params);

        for step in &self.steps {
            tracing::debug!("{}: running step {}", device, step.name());
            if let Err(e) = step.run(&mut ctx).await {
                tracing::warn!("{}: step {} failed: {:#}", device, step.name(), e);
                return Outcome::Failed(ProvisionError::Step {
                    step: step.name().to_string(),
                    reason: format!("{:#}", e),
                });
            }
        }

        Outcome::Success(ctx.facts)
    }
}

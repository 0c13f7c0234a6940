pub mod client;
pub mod ops;
pub mod types;
pub mod xml;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{Credential, Device, Session};

pub use client::PanosClient;
pub use types::{ObjectKind, ObjectRef, SoftwareVersion};

/// Errors raised by the device management API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection failure or timeout
    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The device answered but refused the request
    #[error("rejected: {0}")]
    Rejected(String),

    /// The response did not have the expected shape
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// DeviceApi is the management surface of one firewall model.
///
/// Every call is a single request with no retry. `PanosClient` talks to real
/// devices; tests substitute an in-memory firewall.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Exchange the credential for an API key
    async fn keygen(&self, device: &Device, credential: &Credential) -> Result<Session, ApiError>;

    /// Run an operational command, returning the raw success response
    async fn op(&self, device: &Device, session: &Session, cmd: &str) -> Result<String, ApiError>;

    /// Fetch a configuration object's entry, `None` when absent
    async fn get_object(
        &self,
        device: &Device,
        session: &Session,
        version: &SoftwareVersion,
        object: &ObjectRef,
    ) -> Result<Option<Value>, ApiError>;

    async fn create_object(
        &self,
        device: &Device,
        session: &Session,
        version: &SoftwareVersion,
        object: &ObjectRef,
        entry: &Value,
    ) -> Result<(), ApiError>;

    /// Replace a configuration object with the full `entry`
    async fn update_object(
        &self,
        device: &Device,
        session: &Session,
        version: &SoftwareVersion,
        object: &ObjectRef,
        entry: &Value,
    ) -> Result<(), ApiError>;

    /// Enqueue a commit, returning the raw success response
    async fn commit(&self, device: &Device, session: &Session) -> Result<String, ApiError>;
}

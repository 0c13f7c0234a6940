use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::ops::parse_api_key;
use super::types::{entry_body, first_entry, rest_code, rest_message, rest_succeeded, OBJECT_NOT_PRESENT};
use super::xml::{error_message_from_text, parse_response};
use super::{ApiError, DeviceApi, ObjectRef, SoftwareVersion};
use crate::models::{Credential, Device, Session};

const KEY_HEADER: &str = "X-PAN-KEY";

/// PAN-OS XML and REST API client shared by all device tasks.
///
/// The client holds no per-device state; each call names its device and
/// session explicitly.
pub struct PanosClient {
    client: Client,
}

impl PanosClient {
    /// Build a client with a fixed per-call timeout.
    ///
    /// `accept_invalid_certs` disables TLS certificate verification and must
    /// come from explicit operator configuration.
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        if accept_invalid_certs {
            tracing::warn!("TLS certificate verification is DISABLED for device API calls");
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }

    fn xml_url(device: &Device) -> String {
        format!("https://{}/api/", device.address)
    }

    fn rest_url(device: &Device, version: &SoftwareVersion, object: &ObjectRef) -> String {
        format!(
            "https://{}/restapi/{}/{}",
            device.address,
            version.rest_segment(),
            object.kind.resource_path()
        )
    }

    /// Read an XML API response, mapping HTTP and document errors
    async fn xml_body(resp: Response) -> Result<String, ApiError> {
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message_from_text(&body),
            });
        }
        parse_response(&body)?;
        Ok(body)
    }

    /// Read a REST response body as JSON, tolerating an empty body
    async fn rest_body(resp: Response) -> Result<(StatusCode, Value), ApiError> {
        let status = resp.status();
        let text = resp.text().await.map_err(transport)?;
        if text.trim().is_empty() {
            return Ok((status, Value::Null));
        }
        match serde_json::from_str(&text) {
            Ok(body) => Ok((status, body)),
            Err(_) if !status.is_success() => Err(ApiError::Status {
                status: status.as_u16(),
                message: text.trim().chars().take(200).collect(),
            }),
            Err(e) => Err(ApiError::Parse(format!("invalid JSON: {}", e))),
        }
    }

    async fn write_object(
        &self,
        method: reqwest::Method,
        device: &Device,
        session: &Session,
        version: &SoftwareVersion,
        object: &ObjectRef,
        entry: &Value,
    ) -> Result<(), ApiError> {
        let resp = self
            .client
            .request(method.clone(), Self::rest_url(device, version, object))
            .query(&object.query())
            .header(KEY_HEADER, session.token())
            .json(&entry_body(entry))
            .send()
            .await
            .map_err(transport)?;

        let (status, body) = Self::rest_body(resp).await?;
        if status.is_success() && (body.is_null() || rest_succeeded(&body)) {
            tracing::debug!("{} {} on {} succeeded", method, object, device);
            return Ok(());
        }
        if status.is_success() {
            return Err(ApiError::Rejected(rest_message(&body)));
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message: rest_message(&body),
        })
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Transport(format!("timed out: {}", e))
    } else {
        ApiError::Transport(e.to_string())
    }
}

#[async_trait]
impl DeviceApi for PanosClient {
    async fn keygen(&self, device: &Device, credential: &Credential) -> Result<Session, ApiError> {
        let resp = self
            .client
            .post(Self::xml_url(device))
            .form(&[
                ("type", "keygen"),
                ("user", credential.username.as_str()),
                ("password", credential.secret()),
            ])
            .send()
            .await
            .map_err(transport)?;

        let body = Self::xml_body(resp).await?;
        Ok(Session::new(parse_api_key(&body)?))
    }

    async fn op(&self, device: &Device, session: &Session, cmd: &str) -> Result<String, ApiError> {
        let resp = self
            .client
            .get(Self::xml_url(device))
            .query(&[("type", "op"), ("cmd", cmd)])
            .header(KEY_HEADER, session.token())
            .send()
            .await
            .map_err(transport)?;

        Self::xml_body(resp).await
    }

    async fn get_object(
        &self,
        device: &Device,
        session: &Session,
        version: &SoftwareVersion,
        object: &ObjectRef,
    ) -> Result<Option<Value>, ApiError> {
        let resp = self
            .client
            .get(Self::rest_url(device, version, object))
            .query(&object.query())
            .header(KEY_HEADER, session.token())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport)?;

        let (status, body) = Self::rest_body(resp).await?;
        if status == StatusCode::NOT_FOUND || rest_code(&body) == Some(OBJECT_NOT_PRESENT) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: rest_message(&body),
            });
        }
        if !rest_succeeded(&body) {
            return Err(ApiError::Rejected(rest_message(&body)));
        }
        Ok(first_entry(&body))
    }

    async fn create_object(
        &self,
        device: &Device,
        session: &Session,
        version: &SoftwareVersion,
        object: &ObjectRef,
        entry: &Value,
    ) -> Result<(), ApiError> {
        self.write_object(reqwest::Method::POST, device, session, version, object, entry)
            .await
    }

    async fn update_object(
        &self,
        device: &Device,
        session: &Session,
        version: &SoftwareVersion,
        object: &ObjectRef,
        entry: &Value,
    ) -> Result<(), ApiError> {
        self.write_object(reqwest::Method::PUT, device, session, version, object, entry)
            .await
    }

    async fn commit(&self, device: &Device, session: &Session) -> Result<String, ApiError> {
        let resp = self
            .client
            .get(Self::xml_url(device))
            .query(&[("type", "commit"), ("cmd", "<commit></commit>")])
            .header(KEY_HEADER, session.token())
            .send()
            .await
            .map_err(transport)?;

        Self::xml_body(resp).await
    }
}

//! Operational commands and parsers for their XML responses.

use super::types::SoftwareVersion;
use super::xml::{first_text, parse_response, text_at};
use super::ApiError;
use crate::models::HaRole;

pub const SHOW_SYSTEM_INFO: &str = "<show><system><info></info></system></show>";
pub const SHOW_HA_STATE: &str = "<show><high-availability><state></state></high-availability></show>";

/// `show interface <name>`
pub fn show_interface(name: &str) -> String {
    format!("<show><interface>{}</interface></show>", name)
}

/// System identity reported by `show system info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub hostname: Option<String>,
    pub serial: Option<String>,
    pub sw_version: SoftwareVersion,
}

/// Identity fields as reported, none of them required
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemIdentity {
    pub hostname: Option<String>,
    pub serial: Option<String>,
    pub sw_version: Option<String>,
}

/// Commit result: a job id, or nothing when there was nothing to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    Enqueued(String),
    NoChanges(String),
}

/// Extract the API key from a keygen response
pub fn parse_api_key(text: &str) -> Result<String, ApiError> {
    let doc = parse_response(text)?;
    text_at(&doc, &["result", "key"]).ok_or_else(|| ApiError::Parse("keygen response has no result/key".to_string()))
}

pub fn parse_system_info(text: &str) -> Result<SystemInfo, ApiError> {
    let doc = parse_response(text)?;
    let raw = first_text(&doc, "sw-version")
        .ok_or_else(|| ApiError::Parse("system info has no sw-version".to_string()))?;
    Ok(SystemInfo {
        hostname: first_text(&doc, "hostname"),
        serial: first_text(&doc, "serial"),
        sw_version: SoftwareVersion::parse(&raw)?,
    })
}

pub fn parse_system_identity(text: &str) -> Result<SystemIdentity, ApiError> {
    let doc = parse_response(text)?;
    Ok(SystemIdentity {
        hostname: first_text(&doc, "hostname"),
        serial: first_text(&doc, "serial"),
        sw_version: first_text(&doc, "sw-version"),
    })
}

/// Classify the local HA role.
///
/// Anything that cannot be read with certainty is `Unknown`.
pub fn parse_ha_role(text: &str) -> HaRole {
    let doc = match parse_response(text) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!("HA state unreadable: {}", e);
            return HaRole::Unknown;
        }
    };

    match text_at(&doc, &["result", "enabled"]).as_deref() {
        Some("no") => HaRole::Standalone,
        Some("yes") => {
            let state = text_at(&doc, &["result", "group", "local-info", "state"]).map(|s| s.to_lowercase());
            match state.as_deref() {
                Some("active") | Some("active-primary") | Some("active-secondary") => HaRole::Active,
                Some("passive") => HaRole::Passive,
                _ => HaRole::Unknown,
            }
        }
        _ => HaRole::Unknown,
    }
}

/// First `ip` of a `show interface` response, if any
pub fn parse_interface_ip(text: &str) -> Result<Option<String>, ApiError> {
    let doc = parse_response(text)?;
    Ok(first_text(&doc, "ip").filter(|ip| ip != "N/A"))
}

pub fn parse_commit(text: &str) -> Result<CommitResult, ApiError> {
    let doc = parse_response(text)?;
    if let Some(job) = text_at(&doc, &["result", "job"]) {
        return Ok(CommitResult::Enqueued(job));
    }
    let msg = first_text(&doc, "line")
        .or_else(|| first_text(&doc, "msg"))
        .unwrap_or_else(|| "no job enqueued".to_string());
    Ok(CommitResult::NoChanges(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HA_ACTIVE: &str = r#"<response status="success"><result><enabled>yes</enabled><group><mode>Active-Passive</mode><local-info><state>active</state></local-info><peer-info><state>passive</state></peer-info></group></result></response>"#;
    const HA_PASSIVE: &str = r#"<response status="success"><result><enabled>yes</enabled><group><local-info><state>passive</state></local-info><peer-info><state>active</state></peer-info></group></result></response>"#;
    const HA_DISABLED: &str = r#"<response status="success"><result><enabled>no</enabled></result></response>"#;

    #[test]
    fn test_parse_api_key() {
        let key = parse_api_key(r#"<response status="success"><result><key>LUFRPT1xyz==</key></result></response>"#).unwrap();
        assert_eq!(key, "LUFRPT1xyz==");
    }

    #[test]
    fn test_parse_api_key_missing() {
        let err = parse_api_key(r#"<response status="success"><result></result></response>"#).unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn test_parse_system_info() {
        let info = parse_system_info(
            r#"<response status="success"><result><system><hostname>edge-fw-01</hostname><serial>0123456789</serial><sw-version>10.2.4-h2</sw-version></system></result></response>"#,
        )
        .unwrap();
        assert_eq!(info.hostname.as_deref(), Some("edge-fw-01"));
        assert_eq!(info.serial.as_deref(), Some("0123456789"));
        assert_eq!(info.sw_version.rest_segment(), "v10.2");
    }

    #[test]
    fn test_parse_system_info_without_version() {
        let err = parse_system_info(r#"<response status="success"><result><system><hostname>x</hostname></system></result></response>"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn test_parse_system_identity_tolerates_missing_fields() {
        let identity =
            parse_system_identity(r#"<response status="success"><result><system><hostname>x</hostname></system></result></response>"#)
                .unwrap();
        assert_eq!(identity.hostname.as_deref(), Some("x"));
        assert_eq!(identity.serial, None);
        assert_eq!(identity.sw_version, None);
        assert!(parse_system_identity("<html/>").is_err());
    }

    #[test]
    fn test_parse_ha_role() {
        assert_eq!(parse_ha_role(HA_ACTIVE), HaRole::Active);
        assert_eq!(parse_ha_role(HA_PASSIVE), HaRole::Passive);
        assert_eq!(parse_ha_role(HA_DISABLED), HaRole::Standalone);
    }

    #[test]
    fn test_parse_ha_role_fails_closed() {
        assert_eq!(parse_ha_role(""), HaRole::Unknown);
        assert_eq!(parse_ha_role("<html/>"), HaRole::Unknown);
        assert_eq!(parse_ha_role(r#"<response status="success"><result/></response>"#), HaRole::Unknown);
        assert_eq!(
            parse_ha_role(r#"<response status="success"><result><enabled>yes</enabled><group><local-info><state>suspended</state></local-info></group></result></response>"#),
            HaRole::Unknown
        );
        assert_eq!(
            parse_ha_role(r#"<response status="error"><msg>not allowed</msg></response>"#),
            HaRole::Unknown
        );
    }

    #[test]
    fn test_parse_interface_ip() {
        let ip = parse_interface_ip(
            r#"<response status="success"><result><ifnet><name>loopback.109</name><ip>10.1.109.5/32</ip></ifnet></result></response>"#,
        )
        .unwrap();
        assert_eq!(ip.as_deref(), Some("10.1.109.5/32"));

        let none = parse_interface_ip(r#"<response status="success"><result><ifnet><ip>N/A</ip></ifnet></result></response>"#).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_parse_commit() {
        let enqueued = parse_commit(
            r#"<response status="success" code="19"><result><msg><line>Commit job enqueued with jobid 42</line></msg><job>42</job></result></response>"#,
        )
        .unwrap();
        assert_eq!(enqueued, CommitResult::Enqueued("42".to_string()));

        let none = parse_commit(r#"<response status="success" code="19"><msg>There are no changes to commit.</msg></response>"#).unwrap();
        assert_eq!(none, CommitResult::NoChanges("There are no changes to commit.".to_string()));
    }
}

use serde_json::{json, Map, Value};
use std::fmt;

use super::ApiError;

// --- Software version ---

/// PAN-OS software version; the REST path is keyed by major.minor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareVersion {
    pub major: u32,
    pub minor: u32,
    pub raw: String,
}

impl SoftwareVersion {
    /// Parse a `sw-version` value such as "10.1.6-h3"
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let raw = raw.trim();
        let mut parts = raw.split(|c: char| c == '.' || c == '-');
        let major = parts.next().and_then(|p| p.parse().ok());
        let minor = parts.next().and_then(|p| p.parse().ok());
        match (major, minor) {
            (Some(major), Some(minor)) => Ok(Self {
                major,
                minor,
                raw: raw.to_string(),
            }),
            _ => Err(ApiError::Parse(format!("unrecognised sw-version '{}'", raw))),
        }
    }

    /// REST API version segment, e.g. "v10.1"
    pub fn rest_segment(&self) -> String {
        format!("v{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// --- Configuration objects ---

/// Configuration object families reachable through the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    ManagementProfile,
    LoopbackInterface,
    Zone,
    VirtualRouter,
}

impl ObjectKind {
    pub fn resource_path(&self) -> &'static str {
        match self {
            ObjectKind::ManagementProfile => "Network/InterfaceManagementNetworkProfiles",
            ObjectKind::LoopbackInterface => "Network/LoopbackInterfaces",
            ObjectKind::Zone => "Network/Zones",
            ObjectKind::VirtualRouter => "Network/VirtualRouters",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::ManagementProfile => "management profile",
            ObjectKind::LoopbackInterface => "loopback interface",
            ObjectKind::Zone => "zone",
            ObjectKind::VirtualRouter => "virtual router",
        };
        f.write_str(s)
    }
}

/// Where an object lives in the device configuration tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// Network-level objects need no location parameter
    Device,
    Vsys(String),
}

/// A named configuration object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub name: String,
    pub location: Location,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            location: Location::Device,
        }
    }

    pub fn in_vsys(mut self, vsys: impl Into<String>) -> Self {
        self.location = Location::Vsys(vsys.into());
        self
    }

    /// Query parameters addressing this object
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::with_capacity(3);
        if let Location::Vsys(vsys) = &self.location {
            q.push(("location", "vsys".to_string()));
            q.push(("vsys", vsys.clone()));
        }
        q.push(("name", self.name.clone()));
        q
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

// --- REST envelopes ---

/// PAN-OS error code for "Object Not Present"
pub const OBJECT_NOT_PRESENT: u64 = 5;

/// Wrap an entry for a POST/PUT body
pub fn entry_body(entry: &Value) -> Value {
    json!({ "entry": entry })
}

/// Numeric `@code`/`code` of a REST response; PAN-OS sends it as either a string or a number
pub fn rest_code(body: &Value) -> Option<u64> {
    let code = body.get("@code").or_else(|| body.get("code"))?;
    match code {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// True when the body reports `@status: success`
pub fn rest_succeeded(body: &Value) -> bool {
    body.get("@status").and_then(Value::as_str) == Some("success")
}

/// Human-readable message of a REST error body
pub fn rest_message(body: &Value) -> String {
    let message = body
        .get("message")
        .or_else(|| body.get("msg"))
        .and_then(Value::as_str)
        .unwrap_or("request rejected");
    let details: Vec<String> = body
        .get("details")
        .and_then(Value::as_array)
        .map(|details| {
            details
                .iter()
                .flat_map(|d| {
                    d.pointer("/causes")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default()
                })
                .filter_map(|c| c.get("description").and_then(Value::as_str).map(String::from))
                .collect()
        })
        .unwrap_or_default();
    if details.is_empty() {
        message.to_string()
    } else {
        format!("{} ({})", message, details.join("; "))
    }
}

/// First entry of a successful list response
pub fn first_entry(body: &Value) -> Option<Value> {
    match body.pointer("/result/entry")? {
        Value::Array(entries) => entries.first().cloned(),
        entry @ Value::Object(_) => Some(entry.clone()),
        _ => None,
    }
}

// --- Read-modify-write helpers ---

/// Walk (creating as needed) nested objects below `entry`
fn object_at<'a>(entry: &'a mut Value, path: &[&str]) -> Option<&'a mut Map<String, Value>> {
    let mut cur = entry;
    for key in path {
        let map = cur.as_object_mut()?;
        cur = map.entry(key.to_string()).or_insert_with(|| json!({}));
        if cur.is_null() {
            *cur = json!({});
        }
    }
    cur.as_object_mut()
}

/// Normalise `key` below `path` into an array, accepting a lone value
fn array_at<'a>(entry: &'a mut Value, path: &[&str], key: &str) -> Option<&'a mut Vec<Value>> {
    let obj = object_at(entry, path)?;
    let slot = obj.entry(key.to_string()).or_insert_with(|| json!([]));
    if !slot.is_array() {
        let lone = slot.take();
        *slot = if lone.is_null() { json!([]) } else { json!([lone]) };
    }
    slot.as_array_mut()
}

/// Set a top-level scalar field of `entry`, returning true when it changed
pub fn set_field(entry: &mut Value, key: &str, value: &str) -> Result<bool, ApiError> {
    let obj = entry
        .as_object_mut()
        .ok_or_else(|| ApiError::Parse("entry is not an object".to_string()))?;
    if obj.get(key).and_then(Value::as_str) == Some(value) {
        return Ok(false);
    }
    obj.insert(key.to_string(), Value::String(value.to_string()));
    Ok(true)
}

/// Add `member` to the `member` list at `path` unless already present.
///
/// Returns true when the entry changed.
pub fn merge_member(entry: &mut Value, path: &[&str], member: &str) -> Result<bool, ApiError> {
    let members = array_at(entry, path, "member")
        .ok_or_else(|| ApiError::Parse(format!("'{}' is not an object", path.join("."))))?;
    if members.iter().any(|m| m.as_str() == Some(member)) {
        return Ok(false);
    }
    members.push(Value::String(member.to_string()));
    Ok(true)
}

/// Members of the `member` list at `path`
pub fn members(entry: &Value, path: &[&str]) -> Vec<String> {
    let mut cur = entry;
    for key in path {
        match cur.get(key) {
            Some(v) => cur = v,
            None => return Vec::new(),
        }
    }
    match cur.get("member") {
        Some(Value::Array(items)) => items.iter().filter_map(|m| m.as_str().map(String::from)).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Add a named `entry` item at `path` unless one with the same `@name` exists.
///
/// Returns true when the entry changed.
pub fn merge_named_entry(entry: &mut Value, path: &[&str], item: Value) -> Result<bool, ApiError> {
    let name = item
        .get("@name")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| ApiError::Parse("entry has no @name".to_string()))?;
    let items = array_at(entry, path, "entry")
        .ok_or_else(|| ApiError::Parse(format!("'{}' is not an object", path.join("."))))?;
    if items
        .iter()
        .any(|e| e.get("@name").and_then(Value::as_str) == Some(name.as_str()))
    {
        return Ok(false);
    }
    items.push(item);
    Ok(true)
}

/// Names of the `entry` items at `path`
pub fn entry_names(entry: &Value, path: &[&str]) -> Vec<String> {
    let mut cur = entry;
    for key in path {
        match cur.get(key) {
            Some(v) => cur = v,
            None => return Vec::new(),
        }
    }
    let name_of = |e: &Value| e.get("@name").and_then(Value::as_str).map(String::from);
    match cur.get("entry") {
        Some(Value::Array(items)) => items.iter().filter_map(name_of).collect(),
        Some(item @ Value::Object(_)) => name_of(item).into_iter().collect(),
        _ => Vec::new(),
    }
}

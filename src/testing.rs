//! In-memory firewall used by unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::models::{Credential, Device, Session};
use crate::panos::ops::{SHOW_HA_STATE, SHOW_SYSTEM_INFO};
use crate::panos::{ApiError, DeviceApi, ObjectKind, ObjectRef, SoftwareVersion};

/// A recorded API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Keygen(String),
    Op(String, String),
    Get(String, ObjectRef),
    Create(String, ObjectRef),
    Update(String, ObjectRef),
    Commit(String),
}

impl Call {
    pub fn host(&self) -> &str {
        match self {
            Call::Keygen(h) | Call::Op(h, _) | Call::Get(h, _) | Call::Create(h, _) | Call::Update(h, _) | Call::Commit(h) => h,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Call::Create(..) | Call::Update(..) | Call::Commit(_))
    }
}

type ObjectKey = (String, ObjectKind, String);

#[derive(Default)]
struct State {
    ha: HashMap<String, String>,
    system_info: HashMap<String, String>,
    auth_failures: HashMap<String, u16>,
    unreachable: HashSet<String>,
    panics: HashSet<String>,
    objects: HashMap<ObjectKey, Value>,
    calls: Vec<Call>,
}

pub struct FakeFirewall {
    state: Mutex<State>,
}

impl FakeFirewall {
    /// Every device starts standalone on PAN-OS 10.1 with an empty config
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Report HA enabled with the given local state
    pub fn set_ha_state(&self, host: &str, local_state: &str) {
        let xml = format!(
            r#"<response status="success"><result><enabled>yes</enabled><group><local-info><state>{}</state></local-info></group></result></response>"#,
            local_state
        );
        self.lock().ha.insert(host.to_string(), xml);
    }

    /// Answer the HA query with an arbitrary body
    pub fn set_ha_response(&self, host: &str, body: &str) {
        self.lock().ha.insert(host.to_string(), body.to_string());
    }

    /// Answer `show system info` with an arbitrary body
    pub fn set_system_info(&self, host: &str, body: &str) {
        self.lock().system_info.insert(host.to_string(), body.to_string());
    }

    pub fn fail_auth(&self, host: &str, status: u16) {
        self.lock().auth_failures.insert(host.to_string(), status);
    }

    /// Fail every call after keygen with a transport error
    pub fn set_unreachable(&self, host: &str) {
        self.lock().unreachable.insert(host.to_string());
    }

    pub fn panic_on(&self, host: &str) {
        self.lock().panics.insert(host.to_string());
    }

    pub fn insert_object(&self, host: &str, kind: ObjectKind, name: &str, entry: Value) {
        self.lock()
            .objects
            .insert((host.to_string(), kind, name.to_string()), entry);
    }

    pub fn object(&self, host: &str, kind: ObjectKind, name: &str) -> Option<Value> {
        self.lock()
            .objects
            .get(&(host.to_string(), kind, name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn calls_for(&self, host: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.host() == host).collect()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        let mut state = self.lock();
        let host = call.host().to_string();
        state.calls.push(call);
        if state.panics.contains(&host) {
            drop(state);
            panic!("fake firewall exploded on {}", host);
        }
        if state.unreachable.contains(&host) {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn system_info(host: &str) -> String {
        format!(
            r#"<response status="success"><result><system><hostname>fw-{}</hostname><serial>SN{}</serial><sw-version>10.1.6-h3</sw-version></system></result></response>"#,
            host.replace('.', "-"),
            host.replace('.', "")
        )
    }

    fn interface(&self, host: &str, cmd: &str) -> Result<String, ApiError> {
        let name = cmd
            .trim_start_matches("<show><interface>")
            .trim_end_matches("</interface></show>");
        let entry = self.object(host, ObjectKind::LoopbackInterface, name);
        let ip = entry
            .as_ref()
            .and_then(|e| e.pointer("/ip/entry/0/@name"))
            .and_then(Value::as_str)
            .unwrap_or("N/A")
            .to_string();
        match entry {
            Some(_) => Ok(format!(
                r#"<response status="success"><result><ifnet><name>{}</name><ip>{}</ip></ifnet></result></response>"#,
                name, ip
            )),
            None => Err(ApiError::Rejected(format!("{} is not a valid interface", name))),
        }
    }
}

#[async_trait]
impl DeviceApi for FakeFirewall {
    async fn keygen(&self, device: &Device, credential: &Credential) -> Result<Session, ApiError> {
        let host = device.address.clone();
        {
            let mut state = self.lock();
            state.calls.push(Call::Keygen(host.clone()));
            if let Some(status) = state.auth_failures.get(&host) {
                return Err(ApiError::Status {
                    status: *status,
                    message: "Invalid Credential".to_string(),
                });
            }
        }
        Ok(Session::new(format!("key-{}-{}", credential.username, host)))
    }

    async fn op(&self, device: &Device, _session: &Session, cmd: &str) -> Result<String, ApiError> {
        let host = device.address.as_str();
        self.record(Call::Op(host.to_string(), cmd.to_string()))?;
        if cmd == SHOW_SYSTEM_INFO {
            let custom = self.lock().system_info.get(host).cloned();
            return Ok(custom.unwrap_or_else(|| Self::system_info(host)));
        }
        if cmd == SHOW_HA_STATE {
            let ha = self.lock().ha.get(host).cloned();
            return Ok(ha.unwrap_or_else(|| {
                r#"<response status="success"><result><enabled>no</enabled></result></response>"#.to_string()
            }));
        }
        if cmd.starts_with("<show><interface>") {
            return self.interface(host, cmd);
        }
        Err(ApiError::Rejected(format!("unexpected command {}", cmd)))
    }

    async fn get_object(
        &self,
        device: &Device,
        _session: &Session,
        _version: &SoftwareVersion,
        object: &ObjectRef,
    ) -> Result<Option<Value>, ApiError> {
        self.record(Call::Get(device.address.clone(), object.clone()))?;
        Ok(self.object(&device.address, object.kind, &object.name))
    }

    async fn create_object(
        &self,
        device: &Device,
        _session: &Session,
        _version: &SoftwareVersion,
        object: &ObjectRef,
        entry: &Value,
    ) -> Result<(), ApiError> {
        self.record(Call::Create(device.address.clone(), object.clone()))?;
        if self.object(&device.address, object.kind, &object.name).is_some() {
            return Err(ApiError::Rejected(format!("{} already exists", object)));
        }
        self.insert_object(&device.address, object.kind, &object.name, entry.clone());
        Ok(())
    }

    async fn update_object(
        &self,
        device: &Device,
        _session: &Session,
        _version: &SoftwareVersion,
        object: &ObjectRef,
        entry: &Value,
    ) -> Result<(), ApiError> {
        self.record(Call::Update(device.address.clone(), object.clone()))?;
        if self.object(&device.address, object.kind, &object.name).is_none() {
            return Err(ApiError::Rejected(format!("{} does not exist", object)));
        }
        self.insert_object(&device.address, object.kind, &object.name, entry.clone());
        Ok(())
    }

    async fn commit(&self, device: &Device, _session: &Session) -> Result<String, ApiError> {
        self.record(Call::Commit(device.address.clone()))?;
        Ok(r#"<response status="success" code="19"><result><msg><line>Commit job enqueued with jobid 7</line></msg><job>7</job></result></response>"#.to_string())
    }
}

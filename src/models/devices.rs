use std::fmt;
use std::net::Ipv4Addr;

/// Device is a firewall addressed by its management host or IP.
///
/// The address is both the API endpoint and the key under which the
/// device's outcome is reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    pub address: String,
}

impl Device {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// The management address as an IPv4 literal, if it is one
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        self.address.parse().ok()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Credential shared read-only by every device task of a run
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    secret: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Session is the API key issued to one device task.
///
/// It is never cloned into another task and is dropped when the task ends.
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(<redacted>)")
    }
}

/// High-availability role reported by a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaRole {
    Standalone,
    Active,
    Passive,
    Unknown,
}

impl fmt::Display for HaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HaRole::Standalone => "standalone",
            HaRole::Active => "active",
            HaRole::Passive => "passive",
            HaRole::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Why a device was excluded from mutating steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    Standby,
    Unknown,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::Standby => f.write_str("standby"),
            IneligibleReason::Unknown => f.write_str("unknown"),
        }
    }
}

/// Result of the HA precondition check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible(HaRole),
    Ineligible(IneligibleReason),
}

impl Eligibility {
    pub fn from_role(role: HaRole) -> Self {
        match role {
            HaRole::Standalone | HaRole::Active => Eligibility::Eligible(role),
            HaRole::Passive => Eligibility::Ineligible(IneligibleReason::Standby),
            HaRole::Unknown => Eligibility::Ineligible(IneligibleReason::Unknown),
        }
    }
}

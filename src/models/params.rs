use crate::utils::Ipv4Subnet;

/// Default loopback unit, as used by the fleet's loopback.109 convention
pub const DEFAULT_LOOPBACK_UNIT: u16 = 109;

/// Parameters for the loopback provisioning goal
#[derive(Debug, Clone)]
pub struct LoopbackParams {
    pub unit: u16,
    pub subnet: Ipv4Subnet,
    pub management_profile: String,
    pub permitted_ips: Vec<String>,
    pub zone: String,
    pub vsys: String,
    pub virtual_router: String,
    pub bgp_redistribution: bool,
}

impl LoopbackParams {
    pub fn interface_name(&self) -> String {
        loopback_name(self.unit)
    }
}

/// Parameters for the read-only audit goal
#[derive(Debug, Clone)]
pub struct AuditParams {
    pub unit: u16,
}

impl AuditParams {
    pub fn interface_name(&self) -> String {
        loopback_name(self.unit)
    }
}

fn loopback_name(unit: u16) -> String {
    format!("loopback.{}", unit)
}

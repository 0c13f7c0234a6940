pub mod loopback;
pub mod system;

pub use loopback::{
    AllocateAddress, EnsureBgpRedistribution, EnsureLoopbackInterface, EnsureManagementProfile,
    EnsureVirtualRouterMember, EnsureZoneMember,
};
pub use system::{Commit, DetectVersion, ReadLoopbackAddress, ReadSystemInfo};

use crate::models::{AuditParams, LoopbackParams};
use crate::pipeline::Pipeline;

/// Loopback provisioning: profile, interface, zone, virtual router and
/// optionally BGP redistribution, with an optional trailing commit.
pub fn provision_loopback(params: &LoopbackParams, commit: bool) -> Pipeline<LoopbackParams> {
    Pipeline::new("provision-loopback")
        .step(DetectVersion)
        .step(AllocateAddress)
        .step(EnsureManagementProfile)
        .step(EnsureLoopbackInterface)
        .step(EnsureZoneMember)
        .step(EnsureVirtualRouterMember)
        .step_if(params.bgp_redistribution, EnsureBgpRedistribution)
        .step_if(commit, Commit)
}

/// Read-only inventory of hostname, serial, version and loopback address
pub fn audit() -> Pipeline<AuditParams> {
    Pipeline::new("audit")
        .step(ReadSystemInfo)
        .step(ReadLoopbackAddress)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(bgp: bool) -> LoopbackParams {
        LoopbackParams {
            unit: 109,
            subnet: "10.1.109.0/24".parse().unwrap(),
            management_profile: "allow-ping".to_string(),
            permitted_ips: vec![],
            zone: "trust".to_string(),
            vsys: "vsys1".to_string(),
            virtual_router: "default".to_string(),
            bgp_redistribution: bgp,
        }
    }

    #[test]
    fn test_provision_loopback_step_order() {
        let pipeline = provision_loopback(&params(true), true);
        assert_eq!(
            pipeline.step_names(),
            vec![
                "detect-version",
                "allocate-address",
                "ensure-management-profile",
                "ensure-loopback-interface",
                "ensure-zone-member",
                "ensure-virtual-router-member",
                "ensure-bgp-redistribution",
                "commit",
            ]
        );
        assert!(pipeline.mutates());
    }

    #[test]
    fn test_provision_loopback_optional_steps() {
        let pipeline = provision_loopback(&params(false), false);
        let names = pipeline.step_names();
        assert!(!names.contains(&"ensure-bgp-redistribution"));
        assert!(!names.contains(&"commit"));
    }

    #[test]
    fn test_audit_is_read_only() {
        let pipeline = audit();
        assert_eq!(pipeline.step_names(), vec!["read-system-info", "read-loopback-address"]);
        assert!(!pipeline.mutates());
    }
}

//! Steps that converge a firewall onto the loopback provisioning target.
//!
//! Every write is read-modify-write over the full object: fetch the current
//! entry, merge the new member, and PUT the whole entry back (POST when the
//! object does not exist yet). Nothing is written when the entry already
//! holds the member.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::models::LoopbackParams;
use crate::panos::types::{merge_member, merge_named_entry, set_field};
use crate::panos::{ObjectKind, ObjectRef};
use crate::pipeline::{Step, StepContext};

/// Zone network types that cannot hold a layer3 interface
const OTHER_ZONE_TYPES: [&str; 5] = ["layer2", "virtual-wire", "tap", "tunnel", "external"];

fn allocated_address(ctx: &StepContext<'_, LoopbackParams>) -> Result<String> {
    ctx.facts
        .loopback_address
        .clone()
        .ok_or_else(|| anyhow::anyhow!("loopback address not allocated"))
}

/// Write `entry` when it changed, logging either way
async fn commit_entry(ctx: &StepContext<'_, LoopbackParams>, object: &ObjectRef, entry: &Value, exists: bool, changed: bool) -> Result<()> {
    if !changed {
        tracing::info!("{}: {} already in place", ctx.device, object);
        return Ok(());
    }
    ctx.put_object(object, entry, exists).await?;
    tracing::info!(
        "{}: {} {}",
        ctx.device,
        if exists { "updated" } else { "created" },
        object
    );
    Ok(())
}

/// Derives the device's loopback address from the subnet and the last octet
/// of its management address.
pub struct AllocateAddress;

#[async_trait]
impl Step<LoopbackParams> for AllocateAddress {
    fn name(&self) -> &'static str {
        "allocate-address"
    }

    fn mutates(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut StepContext<'_, LoopbackParams>) -> Result<()> {
        let mgmt = ctx
            .device
            .ipv4()
            .ok_or_else(|| anyhow::anyhow!("management address {} is not an IPv4 literal", ctx.device))?;
        let offset = mgmt.octets()[3] as u32;
        let host = ctx.params.subnet.host(offset)?;

        ctx.facts.loopback_address = Some(format!("{}/32", host));
        Ok(())
    }
}

/// Ensures the interface management profile exists, answers ping, and
/// permits the whitelisted management IPs.
pub struct EnsureManagementProfile;

#[async_trait]
impl Step<LoopbackParams> for EnsureManagementProfile {
    fn name(&self) -> &'static str {
        "ensure-management-profile"
    }

    async fn run(&self, ctx: &mut StepContext<'_, LoopbackParams>) -> Result<()> {
        let params = ctx.params;
        let object = ObjectRef::new(ObjectKind::ManagementProfile, &params.management_profile);

        let current = ctx.get_object(&object).await?;
        let exists = current.is_some();
        let mut entry = current.unwrap_or_else(|| json!({ "@name": params.management_profile }));

        let mut changed = set_field(&mut entry, "ping", "yes")?;
        for ip in &params.permitted_ips {
            changed |= merge_named_entry(&mut entry, &["permitted-ip"], json!({ "@name": ip }))?;
        }

        commit_entry(ctx, &object, &entry, exists, changed).await
    }
}

/// Ensures `loopback.<unit>` carries the allocated address and the
/// management profile.
pub struct EnsureLoopbackInterface;

#[async_trait]
impl Step<LoopbackParams> for EnsureLoopbackInterface {
    fn name(&self) -> &'static str {
        "ensure-loopback-interface"
    }

    async fn run(&self, ctx: &mut StepContext<'_, LoopbackParams>) -> Result<()> {
        let params = ctx.params;
        let address = allocated_address(ctx)?;
        let object = ObjectRef::new(ObjectKind::LoopbackInterface, params.interface_name());

        let current = ctx.get_object(&object).await?;
        let exists = current.is_some();
        let mut entry = current.unwrap_or_else(|| json!({ "@name": params.interface_name() }));

        let mut changed = merge_named_entry(&mut entry, &["ip"], json!({ "@name": address }))?;
        changed |= set_field(&mut entry, "interface-management-profile", &params.management_profile)?;

        commit_entry(ctx, &object, &entry, exists, changed).await
    }
}

/// Ensures the loopback is a layer3 member of the security zone, creating
/// the zone when it is missing.
pub struct EnsureZoneMember;

#[async_trait]
impl Step<LoopbackParams> for EnsureZoneMember {
    fn name(&self) -> &'static str {
        "ensure-zone-member"
    }

    async fn run(&self, ctx: &mut StepContext<'_, LoopbackParams>) -> Result<()> {
        let params = ctx.params;
        let object = ObjectRef::new(ObjectKind::Zone, &params.zone).in_vsys(&params.vsys);

        let current = ctx.get_object(&object).await?;
        let exists = current.is_some();
        let mut entry = current.unwrap_or_else(|| json!({ "@name": params.zone }));

        if let Some(network) = entry.get("network").and_then(Value::as_object) {
            if let Some(other) = network.keys().find(|k| OTHER_ZONE_TYPES.contains(&k.as_str())) {
                return Err(anyhow::anyhow!("zone {} is a {} zone, not layer3", params.zone, other));
            }
        }

        let changed = merge_member(&mut entry, &["network", "layer3"], &params.interface_name())?;
        commit_entry(ctx, &object, &entry, exists, changed).await
    }
}

/// Ensures the loopback is bound to the virtual router
pub struct EnsureVirtualRouterMember;

#[async_trait]
impl Step<LoopbackParams> for EnsureVirtualRouterMember {
    fn name(&self) -> &'static str {
        "ensure-virtual-router-member"
    }

    async fn run(&self, ctx: &mut StepContext<'_, LoopbackParams>) -> Result<()> {
        let params = ctx.params;
        let object = ObjectRef::new(ObjectKind::VirtualRouter, &params.virtual_router);

        let mut entry = ctx
            .get_object(&object)
            .await?
            .ok_or_else(|| anyhow::anyhow!("virtual router {} does not exist", params.virtual_router))?;

        let changed = merge_member(&mut entry, &["interface"], &params.interface_name())?;
        commit_entry(ctx, &object, &entry, true, changed).await
    }
}

/// Ensures BGP on the virtual router redistributes the loopback prefix
pub struct EnsureBgpRedistribution;

#[async_trait]
impl Step<LoopbackParams> for EnsureBgpRedistribution {
    fn name(&self) -> &'static str {
        "ensure-bgp-redistribution"
    }

    async fn run(&self, ctx: &mut StepContext<'_, LoopbackParams>) -> Result<()> {
        let params = ctx.params;
        let address = allocated_address(ctx)?;
        let object = ObjectRef::new(ObjectKind::VirtualRouter, &params.virtual_router);

        let mut entry = ctx
            .get_object(&object)
            .await?
            .ok_or_else(|| anyhow::anyhow!("virtual router {} does not exist", params.virtual_router))?;

        if entry.pointer("/protocol/bgp").map_or(true, Value::is_null) {
            return Err(anyhow::anyhow!(
                "BGP is not configured on virtual router {}",
                params.virtual_router
            ));
        }
        if entry.pointer("/protocol/bgp/enable").and_then(Value::as_str) != Some("yes") {
            return Err(anyhow::anyhow!("BGP is disabled on virtual router {}", params.virtual_router));
        }

        let rule = json!({
            "@name": address,
            "enable": "yes",
            "address-family-identifier": "ipv4",
            "set-origin": "incomplete",
        });
        let changed = merge_named_entry(&mut entry, &["protocol", "bgp", "redist-rules"], rule)?;
        commit_entry(ctx, &object, &entry, true, changed).await
    }
}

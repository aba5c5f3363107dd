use crate::error::{ChefCtlError, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const HINTS_FILE: &str = "azure.json";

/// Role-instance metadata as reported by the platform helper.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoleInstance {
    pub deployment_id: Option<String>,
    pub instance_id: Option<String>,
    pub update_domain: Option<u64>,
    pub fault_domain: Option<u64>,
    pub role_name: Option<String>,
    pub instance_endpoints: BTreeMap<String, InstanceEndpoint>,
    pub virtual_ip_groups: BTreeMap<String, VirtualIpGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstanceEndpoint {
    pub ip_endpoint: Option<String>,
    pub public_ip_endpoint: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VirtualIpGroup {
    pub name: Option<String>,
    pub virtual_ip_endpoints: BTreeMap<String, VirtualIpEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VirtualIpEndpoint {
    pub public_ip_address: Option<String>,
    pub instance_endpoints: BTreeMap<String, InstanceEndpoint>,
}

/// Where role-instance metadata comes from. Production shells out to the
/// platform helper; tests return canned structs.
pub trait RoleInstanceSource {
    fn fetch(&self) -> Result<RoleInstance>;
}

/// Fetches metadata by running a helper binary that prints JSON.
pub struct CommandSource {
    bin: PathBuf,
}

impl CommandSource {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        CommandSource { bin: bin.into() }
    }
}

impl RoleInstanceSource for CommandSource {
    fn fetch(&self) -> Result<RoleInstance> {
        let output = Command::new(&self.bin)
            .output()
            .map_err(|e| ChefCtlError::ProcessSpawn {
                name: "metadata helper".to_string(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ChefCtlError::ProcessFailed {
                name: "metadata helper".to_string(),
                code: output.status.code().unwrap_or(-1),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Write the hints file the agent's azure plugin reads.
///
/// The source is queried twice and only the second result is kept: the
/// first response is sometimes incomplete. This is deliberate and local
/// to this call; nothing else in chefctl retries.
pub fn export_hints(source: &dyn RoleInstanceSource, out_dir: &Path) -> Result<PathBuf> {
    let _discarded = source.fetch()?;
    let role_instance = source.fetch()?;

    let hints = build_hints(&role_instance);

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(HINTS_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(&hints)?)?;
    Ok(path)
}

/// Null-safe leaf rendering: a present value (zero included) renders via
/// its string form, an absent one as the empty string.
fn hint<T: ToString>(value: Option<&T>) -> Value {
    Value::String(value.map(T::to_string).unwrap_or_default())
}

fn endpoint_hints(endpoint: &InstanceEndpoint) -> Value {
    json!({
        "ip_endpoint": hint(endpoint.ip_endpoint.as_ref()),
        "public_ip_endpoint": hint(endpoint.public_ip_endpoint.as_ref()),
        "protocol": hint(endpoint.protocol.as_ref()),
    })
}

fn endpoint_map_hints(endpoints: &BTreeMap<String, InstanceEndpoint>) -> Value {
    let map: Map<String, Value> = endpoints
        .iter()
        .map(|(name, ep)| (name.clone(), endpoint_hints(ep)))
        .collect();
    Value::Object(map)
}

fn build_hints(role_instance: &RoleInstance) -> Value {
    let vip_groups: Map<String, Value> = role_instance
        .virtual_ip_groups
        .iter()
        .map(|(group_name, group)| {
            let vips: Map<String, Value> = group
                .virtual_ip_endpoints
                .iter()
                .map(|(vip_name, vip)| {
                    (
                        vip_name.clone(),
                        json!({
                            "public_ip_address": hint(vip.public_ip_address.as_ref()),
                            "instance_endpoints": endpoint_map_hints(&vip.instance_endpoints),
                        }),
                    )
                })
                .collect();
            (
                group_name.clone(),
                json!({
                    "name": hint(group.name.as_ref()),
                    "virtual_ip_endpoints": Value::Object(vips),
                }),
            )
        })
        .collect();

    json!({
        "deployment_id": hint(role_instance.deployment_id.as_ref()),
        "instance_id": hint(role_instance.instance_id.as_ref()),
        "update_domain": hint(role_instance.update_domain.as_ref()),
        "fault_domain": hint(role_instance.fault_domain.as_ref()),
        "role_name": hint(role_instance.role_name.as_ref()),
        "instance_endpoints": endpoint_map_hints(&role_instance.instance_endpoints),
        "virtual_ip_groups": Value::Object(vip_groups),
    })
}

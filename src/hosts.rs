use crate::model::node::NodeRecord;
use serde::{Deserialize, Serialize};

/// Attribute paths for the two addresses every managed node carries.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AddressPaths {
    pub management_ip: String,
    pub floating_ip: String,
}

impl Default for AddressPaths {
    fn default() -> Self {
        AddressPaths {
            management_ip: "network.management.ip".to_string(),
            floating_ip: "network.floating.ip".to_string(),
        }
    }
}

impl AddressPaths {
    // A node whose floating address differs from its management address
    // publishes its service names under prefixed aliases.
    fn is_split(&self, node: &NodeRecord) -> bool {
        match (node.get_path(&self.management_ip), node.get_path(&self.floating_ip)) {
            (Some(management), Some(floating)) => management != floating,
            _ => false,
        }
    }
}

pub fn float_host(node: &NodeRecord, paths: &AddressPaths, labels: &[&str]) -> String {
    prefixed_host("f-", node, paths, labels)
}

pub fn storage_host(node: &NodeRecord, paths: &AddressPaths, labels: &[&str]) -> String {
    prefixed_host("s-", node, paths, labels)
}

fn prefixed_host(prefix: &str, node: &NodeRecord, paths: &AddressPaths, labels: &[&str]) -> String {
    let joined = labels.join(".");

    if paths.is_split(node) {
        format!("{}{}", prefix, joined)
    } else {
        joined
    }
}

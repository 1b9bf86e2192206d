use crate::extract::FlatRecord;
use serde::Serialize;

#[derive(Serialize, Debug, Default)]
pub struct Metadata {
    #[serde(rename = "buildtime")]
    pub build_time: String,
    pub counts: u64,
}

#[derive(Serialize, Debug, Default)]
pub struct InventoryOutput {
    pub metadata: Metadata,
    pub environment: String,
    pub head_node_names: Vec<String>,
    pub nodes: Vec<FlatRecord>,
}

#[derive(Serialize, Debug)]
pub struct ZoneEntry {
    pub cidr: String,
    pub zone: String,
}

#[derive(Serialize, Debug, Default)]
pub struct ReverseZoneOutput {
    pub metadata: Metadata,
    pub zones: Vec<ZoneEntry>,
}

pub mod config;
pub mod extract;
pub mod hosts;
pub mod io;
pub mod keyring;
pub mod model;
pub mod query;
pub mod task;

use crate::hosts::AddressPaths;
use crate::query::NodeIndex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub inventory_data: Arc<RwLock<InventoryCache>>,
    pub zone_data: Arc<RwLock<ZoneCache>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
    pub listen_address: String,
    pub inventory_endpoint: String,
    pub zones_endpoint: String,

    pub environment: String,
    pub node_records_path: String,
    pub head_node_cache_path: String,
    pub config_bag_root: String,

    pub networks: Vec<String>,
    pub address_paths: AddressPaths,

    pub update_interval_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            listen_address: "0.0.0.0:8080".to_string(),
            inventory_endpoint: "/inventory.json".to_string(),
            zones_endpoint: "/zones.json".to_string(),

            environment: "production".to_string(),
            node_records_path: "./nodes".to_string(),
            head_node_cache_path: "/etc/headnodes".to_string(),
            config_bag_root: "./config-bags".to_string(),

            networks: Vec::new(),
            address_paths: AddressPaths::default(),

            update_interval_seconds: 300,
        }
    }
}

pub struct InventoryCache {
    pub index: NodeIndex,
    pub json_content: String,
    pub last_updated: std::time::SystemTime,
}

impl Default for InventoryCache {
    fn default() -> Self {
        InventoryCache {
            index: NodeIndex::default(),
            json_content: String::new(),
            last_updated: std::time::SystemTime::now(),
        }
    }
}

pub struct ZoneCache {
    pub json_content: String,
    pub last_updated: std::time::SystemTime,
}

impl Default for ZoneCache {
    fn default() -> Self {
        ZoneCache {
            json_content: String::new(),
            last_updated: std::time::SystemTime::now(),
        }
    }
}

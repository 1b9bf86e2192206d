use crate::AppState;
use crate::extract::{HOSTNAME_MGMT_IP_KEYS, extract_attributes};
use crate::io::{get_nodes_from_dir, read_cached_head_node_names};
use crate::model::output::{InventoryOutput, Metadata};
use crate::query::{NodeIndex, QueryFilter, sort_by_hostname};
use crate::task::Task;
use std::path::Path;
use tracing::{info, warn};

pub struct RefreshInventoryTask {
    app_state: AppState,
}

impl RefreshInventoryTask {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl Task for RefreshInventoryTask {
    fn name(&self) -> &str {
        "Refresh Inventory"
    }

    fn run(&self) -> anyhow::Result<()> {
        let state = &self.app_state;

        let node_records_path = Path::new(&state.config.node_records_path);

        let (index, output) = if node_records_path.exists() {
            let nodes = get_nodes_from_dir(node_records_path)?;
            let index = NodeIndex::new(nodes);

            let head_node_names = match read_cached_head_node_names(Path::new(
                &state.config.head_node_cache_path,
            )) {
                Ok(names) => names,
                Err(e) => {
                    warn!("Failed to read head node cache: {:?}", e);
                    Vec::new()
                }
            };

            let output =
                build_inventory_output(&index, &state.config.environment, head_node_names);

            (index, output)
        } else {
            warn!(
                "Node records path {:?} does not exist. Skipping inventory refresh.",
                node_records_path
            );

            (NodeIndex::default(), InventoryOutput::default())
        };

        let mut data_lock = state.inventory_data.write().unwrap();

        data_lock.last_updated = std::time::SystemTime::now();
        data_lock.json_content = serde_json::to_string_pretty(&output)?;
        data_lock.index = index;

        Ok(())
    }
}

fn build_inventory_output(
    index: &NodeIndex,
    environment: &str,
    head_node_names: Vec<String>,
) -> InventoryOutput {
    let mut nodes = index.search(&QueryFilter::environment(environment));
    sort_by_hostname(&mut nodes);

    // A node missing the projected attributes only drops itself, not the
    // whole inventory document.
    let mut projected = Vec::new();

    for node in &nodes {
        match extract_attributes(std::slice::from_ref(node), HOSTNAME_MGMT_IP_KEYS) {
            Ok(mut flat) => projected.append(&mut flat),
            Err(e) => warn!("{}", e),
        }
    }

    info!("Projected {} of {} inventory nodes.", projected.len(), nodes.len());

    let metadata = Metadata {
        build_time: chrono::Utc::now().to_rfc3339(),
        counts: projected.len() as u64,
    };

    InventoryOutput {
        metadata,
        environment: environment.to_string(),
        head_node_names,
        nodes: projected,
    }
}

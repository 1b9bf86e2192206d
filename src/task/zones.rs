use crate::AppState;
use crate::model::output::{Metadata, ReverseZoneOutput, ZoneEntry};
use crate::model::zone::reverse_dns_zone;
use crate::task::Task;
use tracing::{info, warn};

pub struct GenerateReverseZonesTask {
    app_state: AppState,
}

impl GenerateReverseZonesTask {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl Task for GenerateReverseZonesTask {
    fn name(&self) -> &str {
        "Generate Reverse Zones"
    }

    fn run(&self) -> anyhow::Result<()> {
        let state = &self.app_state;

        let output = build_zone_output(&state.config.networks);

        let mut data_lock = state.zone_data.write().unwrap();

        data_lock.last_updated = std::time::SystemTime::now();
        data_lock.json_content = serde_json::to_string_pretty(&output)?;

        Ok(())
    }
}

fn build_zone_output(networks: &[String]) -> ReverseZoneOutput {
    let mut zones = Vec::with_capacity(networks.len());

    for cidr in networks {
        match reverse_dns_zone(cidr) {
            Ok(zone) => zones.push(ZoneEntry {
                cidr: cidr.clone(),
                zone,
            }),
            Err(e) => warn!("Skipping network {:?}: {}", cidr, e),
        }
    }

    info!("Generated {} reverse zone names.", zones.len());

    let metadata = Metadata {
        build_time: chrono::Utc::now().to_rfc3339(),
        counts: zones.len() as u64,
    };

    ReverseZoneOutput { metadata, zones }
}

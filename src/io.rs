use crate::AppState;
use crate::model::node::NodeRecord;
use crate::task::Task;
use crate::task::inventory::RefreshInventoryTask;
use crate::task::zones::GenerateReverseZonesTask;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

fn discover_node_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut node_files = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory {:?}", dir))? {
        let entry = entry.with_context(|| format!("Failed to read directory entry {:?}", dir))?;
        let path = entry.path();

        if path.is_file() {
            node_files.push(path);
        }
    }

    Ok(node_files)
}

fn parse_node(file_path: &Path) -> anyhow::Result<NodeRecord> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read node record {:?}", file_path))?;

    let node = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse node record {:?}", file_path))?;

    Ok(node)
}

pub fn get_nodes_from_dir(dir: &Path) -> anyhow::Result<Vec<NodeRecord>> {
    let node_paths = discover_node_files(dir)?;

    info!("Discovered {} node record files.", node_paths.len());

    let mut nodes = Vec::with_capacity(node_paths.len());

    for path in node_paths {
        let node = parse_node(&path)?;
        nodes.push(node);
    }

    info!("Loaded {} node records.", nodes.len());

    Ok(nodes)
}

/// Head-node names cached on local disk, one per line. A missing file means
/// a first run and yields an empty list.
pub fn read_cached_head_node_names(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read head node cache {:?}", path));
        }
    };

    Ok(parse_head_node_names(&content))
}

fn parse_head_node_names(content: &str) -> Vec<String> {
    let mut names: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    names.sort();
    names
}

pub async fn background_updater(state: AppState) {
    let update_interval = std::time::Duration::from_secs(state.config.update_interval_seconds);

    let tasks: Vec<Box<dyn Task>> = vec![
        Box::new(RefreshInventoryTask::new(state.clone())),
        Box::new(GenerateReverseZonesTask::new(state.clone())),
    ];

    loop {
        for task in &tasks {
            info!("Running task: {}", task.name());

            if let Err(e) = task.run() {
                error!("Error running task '{}': {:?}", task.name(), e);
            } else {
                info!("Successfully completed task: {}", task.name());
            }
        }

        info!("Waiting for {:?} before next update.", update_interval);

        tokio::time::sleep(update_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_node_names_skip_blanks_and_comments() {
        let content = "\n# cached head nodes\nhead2\n  head1  \n\n# trailing comment\nhead3\n";

        assert_eq!(parse_head_node_names(content), vec!["head1", "head2", "head3"]);
    }

    #[test]
    fn test_head_node_names_empty_input() {
        assert!(parse_head_node_names("").is_empty());
        assert!(parse_head_node_names("# nothing but comments\n").is_empty());
    }

    #[test]
    fn test_missing_cache_file_is_first_run() {
        let names =
            read_cached_head_node_names(Path::new("/nonexistent/headnodes-cache")).unwrap();

        assert!(names.is_empty());
    }
}

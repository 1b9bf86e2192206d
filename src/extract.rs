use crate::model::node::NodeRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;

/// One projected node: requested output key -> attribute value.
pub type FlatRecord = BTreeMap<String, Value>;

//
// Default projections requested from node objects. The first element of each
// pair names the key in the flat result, the second is the attribute to pull
// from the node record, expressed as a dot-separated path.
//
pub const HOSTNAME_MGMT_IP_KEYS: &[(&str, &str)] = &[
    ("hostname", "hostname"),
    ("mgmt_ip", "network.management.ip"),
];

pub const MGMT_IP_METRICS_PORT_KEYS: &[(&str, &str)] = &[
    ("mgmt_ip", "network.management.ip"),
    ("metrics_port", "metrics.web_port"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    MissingAttribute { path: String, node: String },
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::MissingAttribute { path, node } => {
                write!(f, "Attribute path '{}' does not resolve on node '{}'", path, node)
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Project each node record into a flat record holding the requested
/// attributes.
///
/// `keys` is an ordered list of `(output key, attribute path)` pairs; a
/// repeated output key keeps the value of the last pair that named it. Output
/// order follows input order. Any path that fails to resolve aborts the whole
/// projection, so callers never see a partially filled record.
pub fn extract_attributes<S: AsRef<str>>(
    records: &[NodeRecord],
    keys: &[(S, S)],
) -> Result<Vec<FlatRecord>, ExtractError> {
    let mut result = Vec::with_capacity(records.len());

    for record in records {
        let mut flat = FlatRecord::new();

        for (name, path) in keys {
            let value = record.get_path(path.as_ref()).ok_or_else(|| {
                ExtractError::MissingAttribute {
                    path: path.as_ref().to_string(),
                    node: record.hostname().unwrap_or("<unnamed>").to_string(),
                }
            })?;

            flat.insert(name.as_ref().to_string(), value.clone());
        }

        result.push(flat);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> NodeRecord {
        NodeRecord::try_from(value).unwrap()
    }

    #[test]
    fn test_projects_nested_attribute() {
        let records = vec![node(json!({
            "network": { "management": { "ip": "10.0.0.5" } }
        }))];

        let flat =
            extract_attributes(&records, &[("mgmt_ip", "network.management.ip")]).unwrap();

        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].get("mgmt_ip"), Some(&json!("10.0.0.5")));
    }

    #[test]
    fn test_default_projection_keys() {
        let records = vec![node(json!({
            "hostname": "head1",
            "network": { "management": { "ip": "10.0.0.5" } }
        }))];

        let flat = extract_attributes(&records, HOSTNAME_MGMT_IP_KEYS).unwrap();

        assert_eq!(flat[0].get("hostname"), Some(&json!("head1")));
        assert_eq!(flat[0].get("mgmt_ip"), Some(&json!("10.0.0.5")));
    }

    #[test]
    fn test_preserves_record_order() {
        let records = vec![
            node(json!({ "hostname": "c" })),
            node(json!({ "hostname": "a" })),
            node(json!({ "hostname": "b" })),
        ];

        let flat = extract_attributes(&records, &[("hostname", "hostname")]).unwrap();

        let names: Vec<&Value> = flat.iter().map(|r| r.get("hostname").unwrap()).collect();
        assert_eq!(names, vec![&json!("c"), &json!("a"), &json!("b")]);
    }

    #[test]
    fn test_missing_path_fails_whole_projection() {
        let records = vec![
            node(json!({ "hostname": "a", "network": { "management": { "ip": "10.0.0.1" } } })),
            node(json!({ "hostname": "b" })),
        ];

        let err = extract_attributes(&records, HOSTNAME_MGMT_IP_KEYS).unwrap_err();

        assert_eq!(
            err,
            ExtractError::MissingAttribute {
                path: "network.management.ip".to_string(),
                node: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_output_key_last_wins() {
        let records = vec![node(json!({ "first": 1, "second": 2 }))];

        let flat =
            extract_attributes(&records, &[("value", "first"), ("value", "second")]).unwrap();

        assert_eq!(flat[0].get("value"), Some(&json!(2)));
        assert_eq!(flat[0].len(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        let no_records: Vec<NodeRecord> = Vec::new();
        assert_eq!(
            extract_attributes(&no_records, HOSTNAME_MGMT_IP_KEYS).unwrap(),
            Vec::<FlatRecord>::new()
        );

        let records = vec![node(json!({ "hostname": "a" }))];
        let no_keys: &[(&str, &str)] = &[];
        let flat = extract_attributes(&records, no_keys).unwrap();
        assert_eq!(flat, vec![FlatRecord::new()]);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let records = vec![node(json!({
            "hostname": "head1",
            "network": { "management": { "ip": "10.0.0.5" } }
        }))];

        let first = extract_attributes(&records, HOSTNAME_MGMT_IP_KEYS).unwrap();
        let second = extract_attributes(&records, HOSTNAME_MGMT_IP_KEYS).unwrap();

        assert_eq!(first, second);
    }
}

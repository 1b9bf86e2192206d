use crate::extract::{FlatRecord, extract_attributes};
use crate::model::node::NodeRecord;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SearchField {
    Hostname,
    Environment,
    Role,
    Recipe,
}

/// Predicates over the node inventory, the in-process stand-in for an
/// external search service. All set fields must match (AND semantics).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub hostname: Option<String>,
    pub environment: Option<String>,
    pub role: Option<String>,
    pub recipe: Option<String>,
}

impl QueryFilter {
    pub fn environment(environment: &str) -> Self {
        QueryFilter {
            environment: Some(environment.to_string()),
            ..Default::default()
        }
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.to_string());
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_recipe(mut self, recipe: &str) -> Self {
        self.recipe = Some(recipe.to_string());
        self
    }

    pub fn matches(&self, node: &NodeRecord) -> bool {
        if let Some(hostname) = &self.hostname
            && node.hostname() != Some(hostname.as_str())
        {
            return false;
        }

        if let Some(environment) = &self.environment
            && node.environment() != Some(environment.as_str())
        {
            return false;
        }

        if let Some(role) = &self.role
            && !node.has_role(role)
        {
            return false;
        }

        if let Some(recipe) = &self.recipe
            && !node.has_recipe(recipe)
        {
            return false;
        }

        true
    }

    fn terms(&self) -> Vec<(SearchField, &str)> {
        let mut terms = Vec::new();

        if let Some(role) = &self.role {
            terms.push((SearchField::Role, role.as_str()));
        }
        if let Some(recipe) = &self.recipe {
            terms.push((SearchField::Recipe, recipe.as_str()));
        }
        if let Some(hostname) = &self.hostname {
            terms.push((SearchField::Hostname, hostname.as_str()));
        }
        if let Some(environment) = &self.environment {
            terms.push((SearchField::Environment, environment.as_str()));
        }

        terms
    }
}

// Query-string form: `role:head AND environment:production`. The parse
// side accepts the same shape back, so filters survive a round trip
// through an HTTP query parameter.
impl Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .terms()
            .iter()
            .map(|(field, value)| format!("{}:{}", field, value))
            .collect();

        write!(f, "{}", terms.join(" AND "))
    }
}

impl FromStr for QueryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = QueryFilter::default();

        for term in s.split(" AND ") {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }

            let (field, value) = term
                .split_once(':')
                .ok_or_else(|| format!("Query term '{}' is not of the form field:value", term))?;

            let field = SearchField::from_str(field.trim())
                .map_err(|_| format!("Unknown search field '{}' in query term '{}'", field, term))?;
            let value = value.trim().to_string();

            match field {
                SearchField::Hostname => filter.hostname = Some(value),
                SearchField::Environment => filter.environment = Some(value),
                SearchField::Role => filter.role = Some(value),
                SearchField::Recipe => filter.recipe = Some(value),
            }
        }

        Ok(filter)
    }
}

/// In-memory index over the loaded node records.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    nodes: Vec<NodeRecord>,
}

impl NodeIndex {
    pub fn new(nodes: Vec<NodeRecord>) -> Self {
        NodeIndex { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn search(&self, filter: &QueryFilter) -> Vec<NodeRecord> {
        self.nodes
            .iter()
            .filter(|node| filter.matches(node))
            .cloned()
            .collect()
    }
}

/// Deterministic order for node sets: by hostname, records without one
/// first. Node records have no inherent ordering of their own.
pub fn sort_by_hostname(nodes: &mut [NodeRecord]) {
    nodes.sort_by(|a, b| a.hostname().cmp(&b.hostname()));
}

fn replace_stale(
    mut results: Vec<NodeRecord>,
    current: &NodeRecord,
    current_hostname: &str,
) -> (Vec<NodeRecord>, bool) {
    let mut matched = false;

    for slot in results.iter_mut() {
        if slot.hostname() == Some(current_hostname) {
            *slot = current.clone();
            matched = true;
        }
    }

    (results, matched)
}

/// Fold the live record of the current node into a search result set.
///
/// The index only catches up with a converging node after the fact, so any
/// snapshot it returned under `current_hostname` is stale and is replaced by
/// `current`; if the index missed the node entirely, `current` is appended.
/// The result is sorted by hostname.
pub fn reconcile(
    results: Vec<NodeRecord>,
    current: &NodeRecord,
    current_hostname: &str,
) -> Vec<NodeRecord> {
    let (mut results, matched) = replace_stale(results, current, current_hostname);

    if !matched {
        results.push(current.clone());
    }

    sort_by_hostname(&mut results);
    results
}

/// Every node in the environment, with the current node folded in.
pub fn all_nodes(index: &NodeIndex, current: &NodeRecord, environment: &str) -> Vec<NodeRecord> {
    let results = index.search(&QueryFilter::environment(environment));

    reconcile(results, current, current.hostname().unwrap_or_default())
}

/// Nodes carrying a role. An index that knows nothing yet degrades to the
/// current node alone.
pub fn nodes_by_role(
    index: &NodeIndex,
    role: &str,
    current: &NodeRecord,
    environment: &str,
) -> Vec<NodeRecord> {
    let results = index.search(&QueryFilter::environment(environment).with_role(role));

    let (mut results, _) =
        replace_stale(results, current, current.hostname().unwrap_or_default());

    if results.is_empty() {
        return vec![current.clone()];
    }

    sort_by_hostname(&mut results);
    results
}

/// Nodes running a recipe. The current node's own run list decides its
/// membership before the index has seen it.
pub fn nodes_for_recipe(
    index: &NodeIndex,
    recipe: &str,
    current: &NodeRecord,
    environment: &str,
) -> Vec<NodeRecord> {
    let results = index.search(&QueryFilter::environment(environment).with_recipe(recipe));

    let (mut results, matched) =
        replace_stale(results, current, current.hostname().unwrap_or_default());

    if current.has_recipe(recipe) && !matched {
        results.push(current.clone());
    }

    sort_by_hostname(&mut results);
    results
}

/// Requested attributes of every node running a recipe.
pub fn node_attributes<S: AsRef<str>>(
    index: &NodeIndex,
    keys: &[(S, S)],
    recipe: &str,
    current: &NodeRecord,
    environment: &str,
) -> Result<Vec<FlatRecord>, crate::extract::ExtractError> {
    let nodes = nodes_for_recipe(index, recipe, current, environment);

    extract_attributes(&nodes, keys)
}

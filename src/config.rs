use anyhow::Context;
use serde_json::{Map, Value};
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Bag holding one configuration item per environment.
pub const CONFIG_BAG: &str = "configs";

/// Storage for named JSON documents, grouped into bags. The real store sits
/// on a configuration server; tests use an in-memory one.
pub trait BagBackend: Send + Sync {
    fn load(&self, bag: &str, item: &str) -> anyhow::Result<Option<Map<String, Value>>>;
    fn save(&self, bag: &str, item: &str, document: &Map<String, Value>) -> anyhow::Result<()>;
}

/// Filesystem backend: one `<root>/<bag>/<item>.json` file per item.
pub struct FsBagBackend {
    root: PathBuf,
}

impl FsBagBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBagBackend { root: root.into() }
    }

    fn item_path(&self, bag: &str, item: &str) -> PathBuf {
        self.root.join(bag).join(format!("{}.json", item))
    }
}

impl BagBackend for FsBagBackend {
    fn load(&self, bag: &str, item: &str) -> anyhow::Result<Option<Map<String, Value>>> {
        let path = self.item_path(bag, item);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config item {:?}", path))?;

        let document = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config item {:?}", path))?;

        Ok(Some(document))
    }

    fn save(&self, bag: &str, item: &str, document: &Map<String, Value>) -> anyhow::Result<()> {
        let bag_dir = self.root.join(bag);

        fs::create_dir_all(&bag_dir)
            .with_context(|| format!("Failed to create bag directory {:?}", bag_dir))?;

        let path = self.item_path(bag, item);
        let content = serde_json::to_string_pretty(document)?;

        fs::write(&path, content).with_context(|| format!("Failed to write config item {:?}", path))
    }
}

/// Transform applied to values on their way in and out of the store. An
/// encrypting store plugs in here; nothing in this crate implements the
/// cryptography itself.
pub trait ValueCodec: Send + Sync {
    fn encode(&self, value: &Value) -> anyhow::Result<Value>;
    fn decode(&self, value: &Value) -> anyhow::Result<Value>;
}

/// Stores values untouched.
pub struct PlainCodec;

impl ValueCodec for PlainCodec {
    fn encode(&self, value: &Value) -> anyhow::Result<Value> {
        Ok(value.clone())
    }

    fn decode(&self, value: &Value) -> anyhow::Result<Value> {
        Ok(value.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingConfigValue(pub String);

impl Display for MissingConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to find value for config key '{}'", self.0)
    }
}

impl std::error::Error for MissingConfigValue {}

/// Client for the per-environment configuration item.
///
/// Construct one with [`ConfigBag::open`] and pass it around by reference;
/// opening loads the environment's document, creating and persisting a bare
/// `{"id": <environment>}` on first use.
pub struct ConfigBag {
    backend: Box<dyn BagBackend>,
    codec: Box<dyn ValueCodec>,
    environment: String,
    document: Map<String, Value>,
}

impl ConfigBag {
    pub fn open(
        backend: Box<dyn BagBackend>,
        environment: &str,
        codec: Box<dyn ValueCodec>,
    ) -> anyhow::Result<Self> {
        let document = match backend.load(CONFIG_BAG, environment)? {
            Some(document) => {
                info!("Loaded existing config item {}/{}", CONFIG_BAG, environment);
                document
            }
            None => {
                let mut document = Map::new();
                document.insert("id".to_string(), Value::String(environment.to_string()));

                backend.save(CONFIG_BAG, environment, &document)?;
                info!("Created new config item {}/{}", CONFIG_BAG, environment);

                document
            }
        };

        Ok(ConfigBag {
            backend,
            codec,
            environment: environment.to_string(),
            document,
        })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Decoded value stored under `key`, or `None`. A stored JSON `null`
    /// counts as absent.
    pub fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        match self.document.get(key) {
            Some(stored) if !stored.is_null() => {
                info!("Fetched value for key '{}'", key);
                Ok(Some(self.codec.decode(stored)?))
            }
            _ => Ok(None),
        }
    }

    /// Like [`ConfigBag::get`], but absence is an error. The error wraps
    /// [`MissingConfigValue`]; whether that is fatal is the caller's call.
    pub fn require(&self, key: &str) -> anyhow::Result<Value> {
        self.get(key)?
            .ok_or_else(|| anyhow::Error::new(MissingConfigValue(key.to_string())))
    }

    /// Return the stored value for `key`, or encode and persist `value` and
    /// hand it back.
    pub fn get_or_insert(&mut self, key: &str, value: Value) -> anyhow::Result<Value> {
        if let Some(stored) = self.document.get(key)
            && !stored.is_null()
        {
            info!("Loaded existing item with key '{}'", key);
            return self.codec.decode(stored);
        }

        let encoded = self.codec.encode(&value)?;
        self.document.insert(key.to_string(), encoded);
        self.backend.save(CONFIG_BAG, &self.environment, &self.document)?;

        info!("Created new item with key '{}'", key);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct MemoryBackend {
        items: Arc<Mutex<HashMap<(String, String), Map<String, Value>>>>,
    }

    impl BagBackend for MemoryBackend {
        fn load(&self, bag: &str, item: &str) -> anyhow::Result<Option<Map<String, Value>>> {
            let items = self.items.lock().unwrap();
            Ok(items.get(&(bag.to_string(), item.to_string())).cloned())
        }

        fn save(&self, bag: &str, item: &str, document: &Map<String, Value>) -> anyhow::Result<()> {
            let mut items = self.items.lock().unwrap();
            items.insert((bag.to_string(), item.to_string()), document.clone());
            Ok(())
        }
    }

    /// Reverses stored strings, enough to see encode/decode in action.
    struct ReversingCodec;

    impl ValueCodec for ReversingCodec {
        fn encode(&self, value: &Value) -> anyhow::Result<Value> {
            match value {
                Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
                other => Ok(other.clone()),
            }
        }

        fn decode(&self, value: &Value) -> anyhow::Result<Value> {
            self.encode(value)
        }
    }

    fn open(backend: MemoryBackend) -> ConfigBag {
        ConfigBag::open(Box::new(backend), "production", Box::new(PlainCodec)).unwrap()
    }

    #[test]
    fn test_open_creates_item_on_first_use() {
        let backend = MemoryBackend::default();
        let bag = open(backend.clone());

        assert_eq!(bag.environment(), "production");

        let stored = backend.load(CONFIG_BAG, "production").unwrap().unwrap();
        assert_eq!(stored.get("id"), Some(&json!("production")));
    }

    #[test]
    fn test_open_loads_existing_item() {
        let backend = MemoryBackend::default();
        let mut document = Map::new();
        document.insert("id".to_string(), json!("production"));
        document.insert("admin_password".to_string(), json!("hunter2"));
        backend.save(CONFIG_BAG, "production", &document).unwrap();

        let bag = open(backend);

        assert_eq!(bag.get("admin_password").unwrap(), Some(json!("hunter2")));
    }

    #[test]
    fn test_get_missing_key_is_none() {
        let bag = open(MemoryBackend::default());

        assert_eq!(bag.get("absent").unwrap(), None);
    }

    #[test]
    fn test_stored_null_counts_as_absent() {
        let backend = MemoryBackend::default();
        let mut document = Map::new();
        document.insert("id".to_string(), json!("production"));
        document.insert("tombstone".to_string(), Value::Null);
        backend.save(CONFIG_BAG, "production", &document).unwrap();

        let bag = open(backend);

        assert_eq!(bag.get("tombstone").unwrap(), None);
    }

    #[test]
    fn test_require_missing_key_is_typed_error() {
        let bag = open(MemoryBackend::default());

        let err = bag.require("absent").unwrap_err();

        let missing = err.downcast_ref::<MissingConfigValue>().unwrap();
        assert_eq!(missing, &MissingConfigValue("absent".to_string()));
    }

    #[test]
    fn test_get_or_insert_persists_and_returns_new_value() {
        let backend = MemoryBackend::default();
        let mut bag = open(backend.clone());

        let value = bag.get_or_insert("admin_password", json!("hunter2")).unwrap();
        assert_eq!(value, json!("hunter2"));

        // visible to a later client through the backend
        let reopened = open(backend);
        assert_eq!(reopened.get("admin_password").unwrap(), Some(json!("hunter2")));
    }

    #[test]
    fn test_get_or_insert_keeps_existing_value() {
        let mut bag = open(MemoryBackend::default());

        bag.get_or_insert("admin_password", json!("first")).unwrap();
        let value = bag.get_or_insert("admin_password", json!("second")).unwrap();

        assert_eq!(value, json!("first"));
    }

    #[test]
    fn test_codec_encodes_at_rest_and_decodes_on_read() {
        let backend = MemoryBackend::default();
        let mut bag =
            ConfigBag::open(Box::new(backend.clone()), "production", Box::new(ReversingCodec))
                .unwrap();

        let value = bag.get_or_insert("admin_password", json!("hunter2")).unwrap();
        // the caller always sees plaintext
        assert_eq!(value, json!("hunter2"));
        assert_eq!(bag.get("admin_password").unwrap(), Some(json!("hunter2")));

        // the backend only ever sees the encoded form
        let stored = backend.load(CONFIG_BAG, "production").unwrap().unwrap();
        assert_eq!(stored.get("admin_password"), Some(&json!("2retnuh")));
    }
}

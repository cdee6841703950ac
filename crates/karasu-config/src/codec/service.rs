//! JSON codec with registered adapters.
//!
//! The codec keeps the registered adapters and factories and a built
//! snapshot derived from them. Registering anything rebuilds the snapshot
//! from scratch under the write lock; encode/decode only ever see a complete
//! snapshot.

use super::adapter::{TypeAdapter, TypeAdapterFactory, TypeKey};
use crate::error::{ConfigError, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use tracing::debug;

/// Key under which an adapter factory is registered.
pub type FactoryKey = String;

/// Adapter set frozen at build time.
struct BuiltCodec {
    adapters: HashMap<TypeId, Arc<dyn TypeAdapter>>,
    /// Factories in key order.
    factories: Vec<Arc<dyn TypeAdapterFactory>>,
    /// Factory lookups already made against this build.
    resolved: Mutex<HashMap<TypeId, Option<Arc<dyn TypeAdapter>>>>,
}

impl BuiltCodec {
    fn build(
        adapters: &HashMap<TypeId, (TypeKey, Arc<dyn TypeAdapter>)>,
        factories: &BTreeMap<FactoryKey, Arc<dyn TypeAdapterFactory>>,
    ) -> Self {
        Self {
            adapters: adapters
                .iter()
                .map(|(id, (_, adapter))| (*id, Arc::clone(adapter)))
                .collect(),
            factories: factories.values().cloned().collect(),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    fn adapter_for(&self, key: &TypeKey) -> Option<Arc<dyn TypeAdapter>> {
        if let Some(adapter) = self.adapters.get(&key.id()) {
            return Some(Arc::clone(adapter));
        }
        if self.factories.is_empty() {
            return None;
        }

        if let Ok(resolved) = self.resolved.lock() {
            if let Some(hit) = resolved.get(&key.id()) {
                return hit.clone();
            }
        }

        let found = self.factories.iter().find_map(|factory| factory.create(key));
        if let Ok(mut resolved) = self.resolved.lock() {
            resolved.insert(key.id(), found.clone());
        }
        found
    }
}

struct CodecState {
    adapters: HashMap<TypeId, (TypeKey, Arc<dyn TypeAdapter>)>,
    factories: BTreeMap<FactoryKey, Arc<dyn TypeAdapterFactory>>,
    built: Arc<BuiltCodec>,
}

impl CodecState {
    fn rebuild(&mut self) {
        self.built = Arc::new(BuiltCodec::build(&self.adapters, &self.factories));
        debug!(
            "Rebuilt codec with {} adapters and {} factories",
            self.adapters.len(),
            self.factories.len()
        );
    }
}

/// Converts config values to and from pretty-printed JSON.
pub struct Codec {
    state: RwLock<CodecState>,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    /// Create a codec with no adapters.
    pub fn new() -> Self {
        let adapters = HashMap::new();
        let factories = BTreeMap::new();
        let built = Arc::new(BuiltCodec::build(&adapters, &factories));
        Self {
            state: RwLock::new(CodecState {
                adapters,
                factories,
                built,
            }),
        }
    }

    // ========================================
    // Registration
    // ========================================

    /// Register an adapter for `T`, replacing any previous one.
    pub fn register_adapter<T: 'static>(&self, adapter: impl TypeAdapter + 'static) -> Result<()> {
        let key = TypeKey::of::<T>();
        let adapter: Arc<dyn TypeAdapter> = Arc::new(adapter);
        let mut state = self.write_state()?;
        state.adapters.insert(key.id(), (key, adapter));
        state.rebuild();
        debug!("Registered type adapter for {}", key.name());
        Ok(())
    }

    /// Register an adapter factory under `key`, replacing any previous one.
    pub fn register_adapter_factory(
        &self,
        key: impl Into<FactoryKey>,
        factory: impl TypeAdapterFactory + 'static,
    ) -> Result<()> {
        let key = key.into();
        let mut state = self.write_state()?;
        debug!("Registered type adapter factory {}", key);
        state.factories.insert(key, Arc::new(factory));
        state.rebuild();
        Ok(())
    }

    pub fn adapter_count(&self) -> usize {
        self.state.read().map(|s| s.adapters.len()).unwrap_or(0)
    }

    pub fn factory_count(&self) -> usize {
        self.state.read().map(|s| s.factories.len()).unwrap_or(0)
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, CodecState>> {
        self.state
            .write()
            .map_err(|_| ConfigError::LockPoisoned("codec state".to_string()))
    }

    fn snapshot(&self) -> Result<Arc<BuiltCodec>> {
        self.state
            .read()
            .map(|state| Arc::clone(&state.built))
            .map_err(|_| ConfigError::LockPoisoned("codec state".to_string()))
    }

    // ========================================
    // Encoding
    // ========================================

    /// Encode a value as pretty-printed JSON.
    pub fn encode<T: Serialize + 'static>(&self, value: &T) -> Result<String> {
        let built = self.snapshot()?;
        let _active = ActiveCodec::enter(&built);
        let tree = encode_value(&built, &TypeKey::of::<T>(), value)?;
        to_pretty(&tree)
    }

    /// Decode a value of type `T` from JSON text.
    pub fn decode<T: DeserializeOwned + 'static>(&self, text: &str) -> Result<T> {
        let built = self.snapshot()?;
        let _active = ActiveCodec::enter(&built);
        let tree = parse(text)?;
        decode_value(&built, &TypeKey::of::<T>(), tree)
    }

    /// Encode a list as a pretty-printed JSON array, adapting each element.
    pub fn encode_list<T: Serialize + 'static>(&self, values: &[T]) -> Result<String> {
        let built = self.snapshot()?;
        let _active = ActiveCodec::enter(&built);
        let key = TypeKey::of::<T>();
        let items = values
            .iter()
            .map(|value| encode_value(&built, &key, value))
            .collect::<Result<Vec<_>>>()?;
        to_pretty(&Value::Array(items))
    }

    /// Decode a JSON array of `T`. A `null` document is an empty list.
    pub fn decode_list<T: DeserializeOwned + 'static>(&self, text: &str) -> Result<Vec<T>> {
        let built = self.snapshot()?;
        let _active = ActiveCodec::enter(&built);
        let key = TypeKey::of::<T>();
        match parse(text)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| decode_value(&built, &key, item))
                .collect(),
            other => Err(ConfigError::Parse {
                message: format!("expected a JSON array, found {}", json_kind(&other)),
                source: None,
            }),
        }
    }
}

fn encode_value<T: Serialize>(built: &BuiltCodec, key: &TypeKey, value: &T) -> Result<Value> {
    let tree = serde_json::to_value(value).map_err(|e| ConfigError::Serialize {
        message: format!("Failed to encode {}: {}", key.name(), e),
        source: Some(e),
    })?;
    match built.adapter_for(key) {
        Some(adapter) => adapter.write(tree),
        None => Ok(tree),
    }
}

fn decode_value<T: DeserializeOwned>(built: &BuiltCodec, key: &TypeKey, tree: Value) -> Result<T> {
    let tree = match built.adapter_for(key) {
        Some(adapter) => adapter.read(tree)?,
        None => tree,
    };
    serde_json::from_value(tree).map_err(|e| ConfigError::Parse {
        message: format!("Failed to decode {}: {}", key.name(), e),
        source: Some(e),
    })
}

fn parse(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| ConfigError::Parse {
        message: format!("Malformed JSON: {}", e),
        source: Some(e),
    })
}

fn to_pretty(tree: &Value) -> Result<String> {
    serde_json::to_string_pretty(tree).map_err(|e| ConfigError::Serialize {
        message: e.to_string(),
        source: Some(e),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ========================================
// Codec in use on this thread
// ========================================

thread_local! {
    /// Snapshots of the codecs currently encoding or decoding on this thread,
    /// innermost last.
    static ACTIVE: RefCell<Vec<Arc<BuiltCodec>>> = RefCell::new(Vec::new());
}

/// Marks a snapshot as active for the duration of one encode or decode.
struct ActiveCodec;

impl ActiveCodec {
    fn enter(built: &Arc<BuiltCodec>) -> Self {
        ACTIVE.with(|stack| stack.borrow_mut().push(Arc::clone(built)));
        ActiveCodec
    }
}

impl Drop for ActiveCodec {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Adapter for `key` from the codec running on this thread, or from the
/// process-wide codec outside any encode/decode.
pub(crate) fn active_adapter(key: &TypeKey) -> Option<Arc<dyn TypeAdapter>> {
    let current = ACTIVE.with(|stack| stack.borrow().last().cloned());
    match current {
        Some(built) => built.adapter_for(key),
        None => global().snapshot().ok()?.adapter_for(key),
    }
}

// ========================================
// Process-wide codec
// ========================================

static GLOBAL_CODEC: OnceLock<Arc<Codec>> = OnceLock::new();

/// The codec shared by every registry that was not given its own.
pub fn global() -> Arc<Codec> {
    Arc::clone(GLOBAL_CODEC.get_or_init(|| Arc::new(Codec::new())))
}

/// Register an adapter for `T` on the process-wide codec.
pub fn register_adapter<T: 'static>(adapter: impl TypeAdapter + 'static) -> Result<()> {
    global().register_adapter::<T>(adapter)
}

/// Register an adapter factory on the process-wide codec.
pub fn register_adapter_factory(
    key: impl Into<FactoryKey>,
    factory: impl TypeAdapterFactory + 'static,
) -> Result<()> {
    global().register_adapter_factory(key, factory)
}

//! Field-level adapter hook.
//!
//! serde gives a codec no way to see the types nested inside a value, so a
//! registered adapter only reaches a field whose type opts in:
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize)]
//! struct NetworkConfig {
//!     #[serde(with = "karasu_config::codec::adapted")]
//!     timeout: Timeout,
//! }
//! ```
//!
//! The field is encoded structurally, then handed to the adapter the running
//! codec has for its type. Decoding runs the adapter's `read` before serde
//! sees the field. Without an adapter the field is plain serde.

use super::adapter::TypeKey;
use super::service::active_adapter;
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub fn serialize<T, S>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: Serialize + 'static,
    S: Serializer,
{
    let tree = serde_json::to_value(value).map_err(S::Error::custom)?;
    let tree = match active_adapter(&TypeKey::of::<T>()) {
        Some(adapter) => adapter.write(tree).map_err(S::Error::custom)?,
        None => tree,
    };
    tree.serialize(serializer)
}

pub fn deserialize<'de, T, D>(deserializer: D) -> std::result::Result<T, D::Error>
where
    T: DeserializeOwned + 'static,
    D: Deserializer<'de>,
{
    let tree = Value::deserialize(deserializer)?;
    let tree = match active_adapter(&TypeKey::of::<T>()) {
        Some(adapter) => adapter.read(tree).map_err(D::Error::custom)?,
        None => tree,
    };
    serde_json::from_value(tree).map_err(D::Error::custom)
}

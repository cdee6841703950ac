//! Pluggable per-type adapters layered over serde's structural encoding.

use crate::error::Result;
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

/// Identity of a type as seen by the codec.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust type name, for diagnostics and factory matching.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

/// Encoder/decoder override for one type.
///
/// The codec first encodes a value structurally with serde, then hands the
/// JSON tree to [`write`](TypeAdapter::write). On the way back,
/// [`read`](TypeAdapter::read) sees the parsed tree before serde decodes it.
/// `read` must undo `write` for round trips to hold.
pub trait TypeAdapter: Send + Sync {
    fn write(&self, value: Value) -> Result<Value>;

    fn read(&self, value: Value) -> Result<Value>;
}

/// Produces adapters for types it recognizes.
///
/// Returning `None` lets the next factory (in key order) have a go.
pub trait TypeAdapterFactory: Send + Sync {
    fn create(&self, key: &TypeKey) -> Option<Arc<dyn TypeAdapter>>;
}

impl<F> TypeAdapterFactory for F
where
    F: Fn(&TypeKey) -> Option<Arc<dyn TypeAdapter>> + Send + Sync,
{
    fn create(&self, key: &TypeKey) -> Option<Arc<dyn TypeAdapter>> {
        self(key)
    }
}

/// A [`TypeAdapter`] made from two closures.
pub struct FnAdapter<W, R> {
    write: W,
    read: R,
}

impl<W, R> FnAdapter<W, R>
where
    W: Fn(Value) -> Result<Value> + Send + Sync,
    R: Fn(Value) -> Result<Value> + Send + Sync,
{
    pub fn new(write: W, read: R) -> Self {
        Self { write, read }
    }
}

impl<W, R> TypeAdapter for FnAdapter<W, R>
where
    W: Fn(Value) -> Result<Value> + Send + Sync,
    R: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn write(&self, value: Value) -> Result<Value> {
        (self.write)(value)
    }

    fn read(&self, value: Value) -> Result<Value> {
        (self.read)(value)
    }
}

//! Serialization of config values.
//!
//! This module provides:
//! - A JSON [`Codec`] built on serde, pretty-printed and round-trippable
//! - Per-type [`TypeAdapter`]s and [`TypeAdapterFactory`]s layered on top
//! - The [`adapted`] field hook that applies them to nested fields
//! - A process-wide codec plus registration helpers for it

pub mod adapted;
mod adapter;
mod service;

pub use adapter::{FnAdapter, TypeAdapter, TypeAdapterFactory, TypeKey};
pub use service::{global, register_adapter, register_adapter_factory, Codec, FactoryKey};

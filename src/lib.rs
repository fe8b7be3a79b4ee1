#![forbid(unsafe_code)]

//! Application-state serialization for desktop editors
//!
//! Persists heterogeneous application state (window bounds, fonts, points,
//! nested collections, maps) to a structured settings document and restores
//! it later. Independent slices of state implement [`StateListener`] and are
//! driven through default/read/write phases by a [`StateSerializer`].

pub mod allowlist;
pub mod codec;
pub mod constants;
pub mod controller;
pub mod document;
pub mod errors;
pub mod records;
pub mod tags;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use allowlist::TypeAllowList;
pub use controller::{
    SerializerOptions, SettingsReader, SettingsWriter, StateListener, StateRegistry,
    StateSerializer,
};
pub use errors::CodecError;
pub use records::Record;
pub use types::{FontSpec, FontStyle, Point, Rect};
pub use value::Value;

//! Core type definitions for UDF conformance runs.
//!
//! - [`Kind`]: coarse primitive-type classifier used by signatures and fixtures.
//! - [`Signature`]: parsed `ReturnKind(ArgKind, ...)` mini-language.
//! - [`Value`]: dynamically typed scalar crossing the SQL boundary.

pub mod kind;
pub mod signature;
pub mod value;

pub use kind::{Kind, KindGroup};
pub use signature::Signature;
pub use value::Value;

//! # Type System
//!
//! The codec's type model:
//! - `scalar`: primitive table (sizes, alignments)
//! - `field`: the closed kind algebra and the fixed/variable classifier
//! - `value`: dynamic value tree and map keys

pub mod field;
pub mod scalar;
pub mod value;

pub use field::{FieldType, KeyType, WireClass};
pub use scalar::Scalar;
pub use value::{MapKey, Value};

//! # zmem - Zero-Copy Memory-Layout Serialization
//!
//! zmem is a binary serialization format and codec whose byte layout
//! mirrors in-memory representation for trivially-copyable aggregates and
//! adds a disciplined offset-table layout for variable-length data. Fixed
//! aggregates serialize by memory copy and read back zero-copy; variable
//! data is placed word-aligned behind 16-byte inline references.
//!
//! ## Quick Start
//!
//! ```ignore
//! use zmem::{FieldDef, FieldType, Scalar, Schema, Value, View};
//!
//! let schema = Schema::new(vec![
//!     FieldDef::new("id", FieldType::Scalar(Scalar::U64)),
//!     FieldDef::new("weights", FieldType::Vector {
//!         elem: Box::new(FieldType::Scalar(Scalar::F32)),
//!     }),
//! ])?;
//!
//! let value = Value::Struct(vec![
//!     Value::U64(123),
//!     Value::Vector(vec![Value::F32(1.0), Value::F32(2.0)]),
//! ]);
//!
//! let bytes = zmem::write_to_vec(&schema, &value)?;
//! assert_eq!(bytes.len(), zmem::encoded_size(&schema, &value)?);
//!
//! // Owning decode, or zero-copy access:
//! let decoded = zmem::read(&schema, &bytes)?;
//! let view = View::new(&bytes, &schema)?;
//! assert_eq!(view.get_u64(0)?, 123);
//! assert_eq!(view.get_slice::<f32>(1)?, &[1.0, 2.0]);
//! ```
//!
//! ## Wire Layout
//!
//! A variable aggregate encodes as:
//!
//! ```text
//! +------------------+--------------------+--------------------+---------+
//! | Total size (u64) | Inline section     | Variable section   | Padding |
//! |                  | fixed fields +     | payloads, each     | to 8    |
//! |                  | 16-byte refs       | word-aligned       |         |
//! +------------------+--------------------+--------------------+---------+
//! ```
//!
//! All multi-byte values are little-endian. Offsets inside an aggregate
//! are relative to its byte 8 (the first byte after the size header);
//! elements of a vector of variable elements are fully self-contained and
//! independently decodable. Fixed aggregates are written headerless,
//! zero-padded to a multiple of 8.
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------+
//! |   Public API (write/read/View)      |
//! +-------------------------------------+
//! |  Writer (growing | preallocated)    |
//! |  Reader | Lazy views                |
//! +-------------------------------------+
//! |  Size predictor (exact byte count)  |
//! +-------------------------------------+
//! |  Schema placement | Kind classifier |
//! +-------------------------------------+
//! |  Layout arithmetic | Wire structs   |
//! +-------------------------------------+
//! ```
//!
//! ## Guarantees
//!
//! - **Size exactness**: `write` produces exactly `encoded_size` bytes,
//!   which is what permits the check-free preallocated writer.
//! - **Determinism**: structurally equal values encode bit-identically
//!   (zeroed padding, sorted map entries, canonical booleans, zeroed
//!   absent optionals and union tails).
//! - **Failure isolation**: the total-size header is patched last; a
//!   truncated write leaves a zero header and readers reject it.
//! - **Concurrency**: the codec is synchronous and stateless; buffers may
//!   be shared by any number of concurrent views.
//!
//! ## Module Overview
//!
//! - [`types`]: scalar table, kind algebra, classifier, dynamic values
//! - [`schema`]: registered manifests with precomputed placement
//! - [`layout`]: placement arithmetic and zerocopy wire structs
//! - [`size`]: exact size prediction
//! - [`writer`]: growing and preallocated encoders
//! - [`reader`]: validating owning decoder
//! - [`view`]: lazy zero-copy views
//! - [`registry`]: name-keyed manifest registration

#[macro_use]
mod macros;

pub mod error;
pub mod layout;
pub mod reader;
pub mod registry;
pub mod schema;
pub mod size;
pub mod types;
pub mod view;
pub mod writer;


pub use error::{ErrorKind, ZmemError};
pub use reader::{read, read_strict, read_with, DecodeOptions};
pub use registry::SchemaRegistry;
pub use schema::{FieldDef, Schema};
pub use size::encoded_size;
pub use types::{FieldType, KeyType, MapKey, Scalar, Value, WireClass};
pub use view::{MapView, SeqView, UnionRef, VarMapView, View};
pub use writer::{write, write_preallocated, write_to_vec, write_with_limit};

//! # Field Kind Algebra
//!
//! `FieldType` is the closed set of kinds every codec path dispatches on.
//! The classifier lives here: a type is *fixed* when its encoded size is a
//! compile-time constant (serializable by memory copy) and *variable* when
//! its size depends on runtime data (serialized through a 16-byte inline
//! reference and a payload in the variable section).
//!
//! ## Kind → Storage Class
//!
//! | Kind | Class | Inline footprint |
//! |------|-------|------------------|
//! | Scalar, FixedStr, Array, Enum | fixed | own (size, align) |
//! | Struct | fixed iff all fields fixed | own layout, or 16 @ 8 |
//! | Optional | fixed (inner must be fixed) | align(T) + size(T) @ align(T) |
//! | Union | fixed iff all variants fixed | union layout, or 16 @ 8 |
//! | Vector, Str, Map | variable | 16 @ 8 |
//!
//! Dispatch is by tagged variant, not trait objects; the layout algebra
//! stays in one match per walk.

use crate::layout::{optional_layout, union_layout, INLINE_REF_ALIGN, INLINE_REF_SIZE, WORD};
use crate::schema::Schema;
use crate::types::scalar::Scalar;

/// Storage classification of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireClass {
    Fixed { size: usize, align: usize },
    Variable,
}

/// Key type of a map: an integer scalar (numeric order) or a fixed-length
/// string (memcmp order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    Int(Scalar),
    FixedStr { len: usize },
}

impl KeyType {
    pub fn size(&self) -> usize {
        match self {
            KeyType::Int(s) => s.size(),
            KeyType::FixedStr { len } => *len,
        }
    }

    pub fn align(&self) -> usize {
        match self {
            KeyType::Int(s) => s.align(),
            KeyType::FixedStr { .. } => 1,
        }
    }
}

/// The closed kind set of the layout algebra.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A primitive, stored little-endian at natural alignment.
    Scalar(Scalar),
    /// `len` bytes, null-terminated; holds at most `len - 1` content bytes.
    FixedStr { len: usize },
    /// `len` contiguous elements of a fixed type.
    Array { elem: Box<FieldType>, len: usize },
    /// A nested aggregate described by its own manifest.
    Struct(Box<Schema>),
    /// Present flag + padding + value; inner type must be fixed.
    Optional { inner: Box<FieldType> },
    /// Stored as its underlying integer; membership is not validated on
    /// the wire.
    Enum { repr: Scalar },
    /// Tagged union; the wire tag is the variant index in `tag`.
    Union { tag: Scalar, variants: Vec<FieldType> },
    /// Growable sequence; element class decides the payload shape.
    Vector { elem: Box<FieldType> },
    /// Variable-length string: length-prefixed via the inline reference,
    /// not null-terminated.
    Str,
    /// Sorted key/value entries; value class decides the payload shape.
    Map { key: KeyType, value: Box<FieldType> },
}

impl FieldType {
    /// Classifies the type as fixed (with size and alignment) or variable.
    pub fn wire_class(&self) -> WireClass {
        match self {
            FieldType::Scalar(s) => WireClass::Fixed {
                size: s.size(),
                align: s.align(),
            },
            FieldType::FixedStr { len } => WireClass::Fixed {
                size: *len,
                align: 1,
            },
            FieldType::Array { elem, len } => match elem.wire_class() {
                WireClass::Fixed { size, align } => WireClass::Fixed {
                    size: size * len,
                    align,
                },
                WireClass::Variable => WireClass::Variable,
            },
            FieldType::Struct(schema) => match schema.fixed_size() {
                Some(size) => WireClass::Fixed {
                    size,
                    align: schema.alignment(),
                },
                None => WireClass::Variable,
            },
            FieldType::Optional { inner } => match inner.wire_class() {
                WireClass::Fixed { size, align } => {
                    let l = optional_layout(size, align);
                    WireClass::Fixed {
                        size: l.size,
                        align: l.align,
                    }
                }
                WireClass::Variable => WireClass::Variable,
            },
            FieldType::Enum { repr } => WireClass::Fixed {
                size: repr.size(),
                align: repr.align(),
            },
            FieldType::Union { tag, variants } => {
                let mut size = 0;
                let mut align = 1;
                for v in variants {
                    match v.wire_class() {
                        WireClass::Fixed { size: s, align: a } => {
                            size = size.max(s);
                            align = align.max(a);
                        }
                        WireClass::Variable => return WireClass::Variable,
                    }
                }
                let l = union_layout(tag.size(), tag.align(), size, align);
                WireClass::Fixed {
                    size: l.size,
                    align: l.align,
                }
            }
            FieldType::Vector { .. } | FieldType::Str | FieldType::Map { .. } => {
                WireClass::Variable
            }
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.wire_class(), WireClass::Variable)
    }

    /// Fixed (size, align), or `None` for variable types.
    pub fn fixed_layout(&self) -> Option<(usize, usize)> {
        match self.wire_class() {
            WireClass::Fixed { size, align } => Some((size, align)),
            WireClass::Variable => None,
        }
    }

    /// Bytes this field occupies in its aggregate's inline section.
    pub fn inline_size(&self) -> usize {
        match self.wire_class() {
            WireClass::Fixed { size, .. } => size,
            WireClass::Variable => INLINE_REF_SIZE,
        }
    }

    /// Alignment of this field within its aggregate's inline section.
    pub fn inline_align(&self) -> usize {
        match self.wire_class() {
            WireClass::Fixed { align, .. } => align,
            WireClass::Variable => INLINE_REF_ALIGN,
        }
    }

    /// Alignment of this field's payload in the variable section. Payloads
    /// start word-aligned; only 128-bit scalar elements require more.
    pub fn payload_align(&self) -> usize {
        match self {
            FieldType::Vector { elem } => match elem.fixed_layout() {
                Some((_, align)) => align.max(WORD),
                None => WORD,
            },
            FieldType::Map { key, value } => match value.fixed_layout() {
                Some((_, value_align)) => key.align().max(value_align).max(WORD),
                None => WORD,
            },
            _ => WORD,
        }
    }

    /// Inline-footprint union layout for variable unions: tag at 0, the
    /// active variant's inline form at `payload_offset`, payload region
    /// sized to the largest variant inline footprint.
    pub(crate) fn var_union_inline(tag: Scalar, variants: &[FieldType]) -> crate::layout::UnionLayout {
        let mut size = 0;
        let mut align = 1;
        for v in variants {
            size = size.max(v.inline_size());
            align = align.max(v.inline_align());
        }
        union_layout(tag.size(), tag.align(), size, align)
    }

    /// Short name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldType::Scalar(s) => s.name(),
            FieldType::FixedStr { .. } => "fixed string",
            FieldType::Array { .. } => "array",
            FieldType::Struct(_) => "struct",
            FieldType::Optional { .. } => "optional",
            FieldType::Enum { .. } => "enum",
            FieldType::Union { .. } => "union",
            FieldType::Vector { .. } => "vector",
            FieldType::Str => "string",
            FieldType::Map { .. } => "map",
        }
    }
}

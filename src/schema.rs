//! # Schema Definition
//!
//! A `Schema` is the registered manifest for one aggregate type: the
//! ordered list of fields the external reflection capability would
//! enumerate. Construction validates the kind algebra and pre-computes the
//! inline placement so every later walk (predict, write, read, view) reads
//! offsets instead of recomputing them.
//!
//! ## Schema Internals
//!
//! - `fields`: ordered field definitions
//! - `inline_offsets`: byte offset of each field in the inline section
//! - `var_field_indices`: indices of variable fields (payload emission order)
//! - `inline_size`: placement cursor after the last field (unpadded)
//! - `alignment`: max field alignment, floor 8 for variable aggregates
//! - `fixed_size`: total size when every field is fixed (cursor rounded up
//!   to the aggregate alignment), `None` otherwise

use eyre::{ensure, Result};

use crate::layout::{align_up, INLINE_REF_ALIGN};
use crate::types::field::{FieldType, KeyType};

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldDef>,
    inline_offsets: Vec<usize>,
    var_field_indices: Vec<usize>,
    inline_size: usize,
    alignment: usize,
    fixed_size: Option<usize>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDef>) -> Result<Self> {
        for def in &fields {
            validate_type(&def.ty, &def.name)?;
        }

        let mut inline_offsets = Vec::with_capacity(fields.len());
        let mut var_field_indices = Vec::new();
        let mut cursor = 0usize;
        let mut alignment = 1usize;

        for (idx, def) in fields.iter().enumerate() {
            let align = def.ty.inline_align();
            let offset = align_up(cursor, align);
            inline_offsets.push(offset);
            cursor = offset + def.ty.inline_size();
            alignment = alignment.max(align);
            if def.ty.is_variable() {
                var_field_indices.push(idx);
            }
        }

        let fixed_size = if var_field_indices.is_empty() {
            Some(align_up(cursor, alignment))
        } else {
            alignment = alignment.max(INLINE_REF_ALIGN);
            None
        };

        Ok(Self {
            fields,
            inline_offsets,
            var_field_indices,
            inline_size: cursor,
            alignment,
            fixed_size,
        })
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, idx: usize) -> Option<&FieldDef> {
        self.fields.get(idx)
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Byte offset of field `idx` in the inline section.
    pub fn inline_offset(&self, idx: usize) -> usize {
        self.inline_offsets[idx]
    }

    /// Indices of the variable fields, in declaration order.
    pub fn var_field_indices(&self) -> &[usize] {
        &self.var_field_indices
    }

    pub fn var_field_count(&self) -> usize {
        self.var_field_indices.len()
    }

    /// Placement cursor after the last field, before any trailing padding.
    pub fn inline_size(&self) -> usize {
        self.inline_size
    }

    /// Max field alignment; variable aggregates have a floor of 8.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Total encoded size when the aggregate is fixed, `None` when any
    /// field is variable.
    pub fn fixed_size(&self) -> Option<usize> {
        self.fixed_size
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_size.is_some()
    }

    pub fn is_variable(&self) -> bool {
        self.fixed_size.is_none()
    }
}

fn validate_type(ty: &FieldType, name: &str) -> Result<()> {
    match ty {
        FieldType::Scalar(_) | FieldType::Str | FieldType::Struct(_) => Ok(()),
        FieldType::FixedStr { len } => {
            ensure!(
                *len >= 1,
                "field `{}`: fixed string length must be at least 1",
                name
            );
            Ok(())
        }
        FieldType::Array { elem, .. } => {
            ensure!(
                !elem.is_variable(),
                "field `{}`: array elements must be fixed",
                name
            );
            ensure!(
                elem.inline_size() > 0,
                "field `{}`: array elements must have nonzero size",
                name
            );
            validate_type(elem, name)
        }
        FieldType::Optional { inner } => {
            ensure!(
                !inner.is_variable(),
                "field `{}`: optional inner type must be fixed",
                name
            );
            validate_type(inner, name)
        }
        FieldType::Enum { repr } => {
            ensure!(
                repr.is_integer() && repr.size() <= 8,
                "field `{}`: enum repr must be an integer of at most 8 bytes, got {}",
                name,
                repr.name()
            );
            Ok(())
        }
        FieldType::Union { tag, variants } => {
            ensure!(
                tag.is_integer() && tag.size() <= 8,
                "field `{}`: union tag must be an integer of at most 8 bytes, got {}",
                name,
                tag.name()
            );
            ensure!(
                !variants.is_empty(),
                "field `{}`: union must declare at least one variant",
                name
            );
            for v in variants {
                validate_type(v, name)?;
            }
            Ok(())
        }
        FieldType::Vector { elem } => {
            ensure!(
                elem.inline_size() > 0,
                "field `{}`: vector elements must have nonzero size",
                name
            );
            validate_type(elem, name)
        }
        FieldType::Map { key, value } => {
            match key {
                KeyType::Int(s) => ensure!(
                    s.is_integer() && s.size() <= 8,
                    "field `{}`: map key must be an integer of at most 8 bytes, got {}",
                    name,
                    s.name()
                ),
                KeyType::FixedStr { len } => ensure!(
                    *len >= 1,
                    "field `{}`: map key string length must be at least 1",
                    name
                ),
            }
            validate_type(value, name)
        }
    }
}

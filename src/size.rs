//! # Size Prediction
//!
//! Computes the exact byte length the writer will produce for a value,
//! including the size header, inline section, alignment padding, variable
//! payloads, offset tables, and trailing padding. Exactness is the gate for
//! the preallocated writer path: `write_preallocated` into a buffer of
//! `encoded_size` bytes fills it completely.
//!
//! The predictor and writer share one placement rule set (`Schema` offsets
//! plus the payload walk below), so they cannot drift independently. The
//! writer finishes with a debug assertion comparing its final cursor to the
//! prediction.

use eyre::{bail, ensure, Result};

use crate::layout::{
    align_up, map_entry_layout, var_map_entry_layout, SIZE_HEADER, WORD,
};
use crate::schema::Schema;
use crate::types::field::{FieldType, KeyType};
use crate::types::value::{expect_map, expect_str, expect_struct, expect_union, expect_vector};
use crate::types::Value;

/// Exact encoded byte length of `value` under `schema`, header included.
///
/// Fixed aggregates are encoded headerless and zero-padded to a multiple
/// of 8; variable aggregates get an 8-byte size header plus their padded
/// content region.
pub fn encoded_size(schema: &Schema, value: &Value) -> Result<usize> {
    let fields = expect_struct(value, schema)?;
    match schema.fixed_size() {
        Some(size) => Ok(align_up(size, WORD)),
        None => Ok(SIZE_HEADER + aggregate_content_size(schema, fields)?),
    }
}

/// Content length (inline + variable sections, padded to 8) of a variable
/// aggregate. Excludes the size header.
pub(crate) fn aggregate_content_size(schema: &Schema, fields: &[Value]) -> Result<usize> {
    let mut cursor = align_up(schema.inline_size(), WORD);
    for &idx in schema.var_field_indices() {
        let def = &schema.fields()[idx];
        cursor = align_up(cursor, def.ty.payload_align());
        cursor += payload_size(&def.ty, &fields[idx], &def.name)?;
    }
    Ok(align_up(cursor, WORD))
}

/// Byte length of a variable field's payload in the variable section.
pub(crate) fn payload_size(ty: &FieldType, value: &Value, name: &str) -> Result<usize> {
    match ty {
        FieldType::Vector { elem } => {
            let items = expect_vector(value, name)?;
            match elem.fixed_layout() {
                Some((elem_size, _)) => Ok(items.len() * elem_size),
                None => {
                    let table = (items.len() + 1) * WORD;
                    let mut cursor = 0usize;
                    for item in items {
                        if !matches!(**elem, FieldType::Str) {
                            cursor = align_up(cursor, WORD);
                        }
                        cursor += element_size(elem, item, name)?;
                    }
                    Ok(table + cursor)
                }
            }
        }
        FieldType::Str => Ok(expect_str(value, name)?.len()),
        FieldType::Struct(nested) => {
            let nested_fields = expect_struct(value, nested)?;
            Ok(SIZE_HEADER + aggregate_content_size(nested, nested_fields)?)
        }
        FieldType::Union { tag, variants } => {
            Ok(SIZE_HEADER + union_content_size(*tag, variants, value, name)?)
        }
        FieldType::Map { key, value: value_ty } => map_payload_size(key, value_ty, value, name),
        other => bail!(
            "field `{}`: {} is not a variable type",
            name,
            other.kind_name()
        ),
    }
}

/// Byte length of one element of a vector of variable elements. String
/// elements are packed raw (the offset table delimits them); all other
/// element kinds are self-delimiting: aggregates and unions carry their own
/// size header, nested vectors gain a count-word prefix, maps start with
/// their own count or header words.
fn element_size(elem: &FieldType, value: &Value, name: &str) -> Result<usize> {
    match elem {
        FieldType::Str => Ok(expect_str(value, name)?.len()),
        FieldType::Struct(nested) => {
            let nested_fields = expect_struct(value, nested)?;
            Ok(SIZE_HEADER + aggregate_content_size(nested, nested_fields)?)
        }
        FieldType::Union { tag, variants } => {
            Ok(SIZE_HEADER + union_content_size(*tag, variants, value, name)?)
        }
        FieldType::Vector { .. } => Ok(WORD + payload_size(elem, value, name)?),
        FieldType::Map { .. } => payload_size(elem, value, name),
        other => bail!(
            "field `{}`: {} cannot be a variable vector element",
            name,
            other.kind_name()
        ),
    }
}

/// Content length (after the size header) of a self-contained variable
/// union: tag, padding, inline payload region, then the active variant's
/// variable payload, all padded to 8.
pub(crate) fn union_content_size(
    tag: crate::types::Scalar,
    variants: &[FieldType],
    value: &Value,
    name: &str,
) -> Result<usize> {
    let (tag_idx, inner) = expect_union(value, name)?;
    ensure!(
        tag_idx < variants.len(),
        "field `{}`: union tag {} out of range ({} variants)",
        name,
        tag_idx,
        variants.len()
    );
    let variant = &variants[tag_idx];
    let layout = FieldType::var_union_inline(tag, variants);
    let mut cursor = align_up(layout.payload_offset + layout.payload_size, WORD);
    if variant.is_variable() {
        cursor = align_up(cursor, variant.payload_align());
        cursor += payload_size(variant, inner, name)?;
    }
    Ok(align_up(cursor, WORD))
}

fn map_payload_size(
    key: &KeyType,
    value_ty: &FieldType,
    value: &Value,
    name: &str,
) -> Result<usize> {
    let entries = expect_map(value, name)?;
    match value_ty.fixed_layout() {
        Some((value_size, value_align)) => {
            if entries.is_empty() {
                return Ok(WORD);
            }
            let layout = map_entry_layout(key.size(), key.align(), value_size, value_align);
            Ok(layout.entries_offset + entries.len() * layout.stride)
        }
        None => {
            let (_, stride) = var_map_entry_layout(key.size());
            let entries_end = 2 * WORD + entries.len() * stride;
            let mut cursor = 0usize;
            for (_, v) in entries {
                cursor = align_up(cursor, value_ty.payload_align());
                cursor += payload_size(value_ty, v, name)?;
            }
            Ok(entries_end + cursor)
        }
    }
}

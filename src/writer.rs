//! # Writer
//!
//! Encodes a value into the wire layout in a single forward pass with
//! back-patching: inline references and size headers are reserved as zeros,
//! payloads are placed word-aligned in declaration order, and each reserved
//! slot is patched once its payload lands. The total-size header is patched
//! last, so a truncated write leaves a zero header and readers reject it.
//!
//! ## Modes
//!
//! | Mode | Sink | Bounds checks |
//! |------|------|---------------|
//! | Growing | `Vec<u8>`, optional capacity limit | every emit; exceeding the limit returns `BufferTooSmall` |
//! | Preallocated | `&mut [u8]` sized by [`encoded_size`] | one up-front length comparison, then elided |
//!
//! The preallocated mode is gated by the size predictor: the slice must be
//! exactly `encoded_size(schema, value)` bytes, which is the exact count
//! this writer emits. Per-emit checks reduce to debug assertions.
//!
//! ## Determinism
//!
//! Equal values produce bit-identical output: all padding is zero-filled,
//! map entries are sorted by key, booleans are written canonically, absent
//! optionals and unused union tails are zeroed.

use eyre::{bail, ensure, Result};
use smallvec::SmallVec;

use crate::error::{err, ErrorKind};
use crate::layout::{
    map_entry_layout, optional_layout, padding_for, union_layout, var_map_entry_layout,
    INLINE_REF_SIZE, SIZE_HEADER, WORD,
};
use crate::schema::Schema;
use crate::size::encoded_size;
use crate::types::field::{FieldType, KeyType, WireClass};
use crate::types::value::{expect_map, expect_str, expect_struct, expect_union, expect_vector};
use crate::types::{MapKey, Scalar, Value};

/// Appends the encoding of `value` to `out`. Returns the bytes written.
pub fn write(schema: &Schema, value: &Value, out: &mut Vec<u8>) -> Result<usize> {
    write_with_limit(schema, value, out, usize::MAX)
}

/// Like [`write`], but refuses to grow `out` past `limit` total bytes,
/// returning `BufferTooSmall` instead.
pub fn write_with_limit(
    schema: &Schema,
    value: &Value,
    out: &mut Vec<u8>,
    limit: usize,
) -> Result<usize> {
    let start = out.len();
    let result = {
        let mut sink = Sink::Growing { buf: out, limit };
        write_root(schema, value, &mut sink).map(|_| sink.pos())
    };
    match result {
        Ok(end) => Ok(end - start),
        Err(e) => {
            out.truncate(start);
            Err(e)
        }
    }
}

/// Encodes into a fresh buffer.
pub fn write_to_vec(schema: &Schema, value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write(schema, value, &mut out)?;
    Ok(out)
}

/// Writes into a buffer pre-sized to exactly [`encoded_size`] bytes,
/// eliding per-emit bounds checks. Returns the bytes written, which always
/// equals the buffer length.
pub fn write_preallocated(schema: &Schema, value: &Value, buf: &mut [u8]) -> Result<usize> {
    let required = encoded_size(schema, value)?;
    ensure!(
        buf.len() == required,
        "preallocated buffer is {} bytes, value needs {}",
        buf.len(),
        required
    );
    let mut sink = Sink::Prealloc { buf, pos: 0 };
    write_root(schema, value, &mut sink)?;
    let written = sink.pos();
    debug_assert_eq!(written, required, "writer cursor disagrees with size prediction");
    Ok(written)
}

enum Sink<'a> {
    Growing { buf: &'a mut Vec<u8>, limit: usize },
    Prealloc { buf: &'a mut [u8], pos: usize },
}

impl Sink<'_> {
    fn pos(&self) -> usize {
        match self {
            Sink::Growing { buf, .. } => buf.len(),
            Sink::Prealloc { pos, .. } => *pos,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Sink::Growing { buf, limit } => {
                if buf.len() + bytes.len() > *limit {
                    return Err(err(ErrorKind::BufferTooSmall, buf.len()));
                }
                buf.extend_from_slice(bytes);
                Ok(())
            }
            Sink::Prealloc { buf, pos } => {
                debug_assert!(
                    *pos + bytes.len() <= buf.len(),
                    "writer overran the predicted size"
                );
                // SAFETY: the buffer length was checked against
                // `encoded_size` before the walk started, and the predictor
                // computes the exact byte count this writer emits, so
                // `pos + bytes.len()` never exceeds `buf.len()`. The debug
                // assertion above verifies the invariant in test builds.
                unsafe {
                    buf.as_mut_ptr()
                        .add(*pos)
                        .copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
                }
                *pos += bytes.len();
                Ok(())
            }
        }
    }

    fn zeros(&mut self, n: usize) -> Result<()> {
        match self {
            Sink::Growing { buf, limit } => {
                if buf.len() + n > *limit {
                    return Err(err(ErrorKind::BufferTooSmall, buf.len()));
                }
                buf.resize(buf.len() + n, 0);
                Ok(())
            }
            Sink::Prealloc { buf, pos } => {
                debug_assert!(*pos + n <= buf.len(), "writer overran the predicted size");
                // SAFETY: same sizing invariant as `put`; the region is in
                // bounds and writing zeroes to u8 is always valid. Callers
                // may hand in a dirty scratch buffer, so padding must be
                // written explicitly.
                unsafe {
                    std::ptr::write_bytes(buf.as_mut_ptr().add(*pos), 0, n);
                }
                *pos += n;
                Ok(())
            }
        }
    }

    /// Overwrites an already-written region (slot patching).
    fn patch(&mut self, at: usize, bytes: &[u8]) {
        match self {
            Sink::Growing { buf, .. } => buf[at..at + bytes.len()].copy_from_slice(bytes),
            Sink::Prealloc { buf, .. } => buf[at..at + bytes.len()].copy_from_slice(bytes),
        }
    }

    fn patch_u64(&mut self, at: usize, value: u64) {
        self.patch(at, &value.to_le_bytes());
    }
}

fn write_root(schema: &Schema, value: &Value, sink: &mut Sink) -> Result<()> {
    let fields = expect_struct(value, schema)?;
    if let Some(size) = schema.fixed_size() {
        encode_fixed_struct(schema, fields, sink)?;
        sink.zeros(padding_for(size, WORD))
    } else {
        write_aggregate(schema, fields, sink)
    }
}

/// Emits one variable aggregate: size header, inline section, variable
/// section, content padding, header patch.
fn write_aggregate(schema: &Schema, fields: &[Value], sink: &mut Sink) -> Result<()> {
    let header_at = sink.pos();
    sink.zeros(SIZE_HEADER)?;
    let base = sink.pos();

    let mut slots: SmallVec<[usize; 8]> = SmallVec::new();
    let mut cursor = 0usize;
    for (idx, def) in schema.fields().iter().enumerate() {
        let offset = schema.inline_offset(idx);
        sink.zeros(offset - cursor)?;
        if def.ty.is_variable() {
            slots.push(sink.pos());
            sink.zeros(INLINE_REF_SIZE)?;
        } else {
            encode_fixed(&def.ty, &fields[idx], &def.name, sink)?;
        }
        cursor = offset + def.ty.inline_size();
    }
    sink.zeros(padding_for(cursor, WORD))?;

    for (slot, &idx) in slots.iter().zip(schema.var_field_indices()) {
        let def = &schema.fields()[idx];
        sink.zeros(padding_for(sink.pos() - base, def.ty.payload_align()))?;
        let offset = sink.pos() - base;
        let second = emit_payload(&def.ty, &fields[idx], &def.name, sink)?;
        sink.patch_u64(*slot, offset as u64);
        sink.patch_u64(*slot + WORD, second);
    }

    sink.zeros(padding_for(sink.pos() - base, WORD))?;
    sink.patch_u64(header_at, (sink.pos() - base) as u64);
    Ok(())
}

fn encode_fixed_struct(schema: &Schema, fields: &[Value], sink: &mut Sink) -> Result<()> {
    let Some(size) = schema.fixed_size() else {
        bail!("aggregate with variable fields cannot be encoded in place");
    };
    let start = sink.pos();
    for (idx, def) in schema.fields().iter().enumerate() {
        sink.zeros(schema.inline_offset(idx) - (sink.pos() - start))?;
        encode_fixed(&def.ty, &fields[idx], &def.name, sink)?;
    }
    sink.zeros(size - (sink.pos() - start))
}

fn encode_fixed(ty: &FieldType, value: &Value, name: &str, sink: &mut Sink) -> Result<()> {
    match ty {
        FieldType::Scalar(s) => encode_scalar(*s, value, name, sink),
        FieldType::FixedStr { len } => {
            let s = match value {
                Value::FixedStr(s) | Value::Str(s) => s.as_str(),
                other => bail!(
                    "field `{}`: expected string value, got {}",
                    name,
                    other.kind_name()
                ),
            };
            ensure!(
                s.len() < *len,
                "field `{}`: {} bytes do not fit a fixed string of {} (one byte is the terminator)",
                name,
                s.len(),
                len
            );
            sink.put(s.as_bytes())?;
            sink.zeros(len - s.len())
        }
        FieldType::Array { elem, len } => {
            let items = match value {
                Value::Array(items) | Value::Vector(items) => items,
                other => bail!(
                    "field `{}`: expected array value, got {}",
                    name,
                    other.kind_name()
                ),
            };
            ensure!(
                items.len() == *len,
                "field `{}`: array value has {} elements, manifest declares {}",
                name,
                items.len(),
                len
            );
            for item in items {
                encode_fixed(elem, item, name, sink)?;
            }
            Ok(())
        }
        FieldType::Struct(nested) => {
            let nested_fields = expect_struct(value, nested)?;
            encode_fixed_struct(nested, nested_fields, sink)
        }
        FieldType::Optional { inner } => {
            let opt = match value {
                Value::Optional(o) => o,
                other => bail!(
                    "field `{}`: expected optional value, got {}",
                    name,
                    other.kind_name()
                ),
            };
            let Some((size, align)) = inner.fixed_layout() else {
                bail!("field `{}`: optional inner type must be fixed", name);
            };
            let layout = optional_layout(size, align);
            match opt {
                Some(v) => {
                    sink.put(&[1])?;
                    sink.zeros(layout.value_offset - 1)?;
                    encode_fixed(inner, v, name, sink)
                }
                None => sink.zeros(layout.size),
            }
        }
        FieldType::Enum { repr } => {
            let v = match value {
                Value::Enum(v) => *v,
                other => bail!(
                    "field `{}`: expected enum value, got {}",
                    name,
                    other.kind_name()
                ),
            };
            encode_int(*repr, v as i128, name, sink)
        }
        FieldType::Union { tag, variants } => {
            let (tag_idx, inner) = expect_union(value, name)?;
            ensure!(
                tag_idx < variants.len(),
                "field `{}`: union tag {} out of range ({} variants)",
                name,
                tag_idx,
                variants.len()
            );
            let mut payload_size = 0;
            let mut payload_align = 1;
            for v in variants {
                let Some((s, a)) = v.fixed_layout() else {
                    bail!("field `{}`: union with variable variants has no fixed form", name);
                };
                payload_size = payload_size.max(s);
                payload_align = payload_align.max(a);
            }
            let layout = union_layout(tag.size(), tag.align(), payload_size, payload_align);
            let start = sink.pos();
            encode_int(*tag, tag_idx as i128, name, sink)?;
            sink.zeros(layout.payload_offset - tag.size())?;
            encode_fixed(&variants[tag_idx], inner, name, sink)?;
            sink.zeros(layout.size - (sink.pos() - start))
        }
        other => bail!(
            "field `{}`: {} is not a fixed type",
            name,
            other.kind_name()
        ),
    }
}

fn encode_scalar(s: Scalar, value: &Value, name: &str, sink: &mut Sink) -> Result<()> {
    match (s, value) {
        (Scalar::Bool, Value::Bool(v)) => sink.put(&[u8::from(*v)]),
        (Scalar::U8, Value::U8(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::I8, Value::I8(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::U16, Value::U16(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::I16, Value::I16(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::U32, Value::U32(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::I32, Value::I32(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::F32, Value::F32(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::U64, Value::U64(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::I64, Value::I64(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::F64, Value::F64(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::U128, Value::U128(v)) => sink.put(&v.to_le_bytes()),
        (Scalar::I128, Value::I128(v)) => sink.put(&v.to_le_bytes()),
        (s, other) => bail!(
            "field `{}`: expected {} value, got {}",
            name,
            s.name(),
            other.kind_name()
        ),
    }
}

fn encode_int(s: Scalar, v: i128, name: &str, sink: &mut Sink) -> Result<()> {
    let out_of_range = || {
        eyre::eyre!(
            "field `{}`: value {} does not fit {}",
            name,
            v,
            s.name()
        )
    };
    match s {
        Scalar::U8 => sink.put(&u8::try_from(v).map_err(|_| out_of_range())?.to_le_bytes()),
        Scalar::I8 => sink.put(&i8::try_from(v).map_err(|_| out_of_range())?.to_le_bytes()),
        Scalar::U16 => sink.put(&u16::try_from(v).map_err(|_| out_of_range())?.to_le_bytes()),
        Scalar::I16 => sink.put(&i16::try_from(v).map_err(|_| out_of_range())?.to_le_bytes()),
        Scalar::U32 => sink.put(&u32::try_from(v).map_err(|_| out_of_range())?.to_le_bytes()),
        Scalar::I32 => sink.put(&i32::try_from(v).map_err(|_| out_of_range())?.to_le_bytes()),
        Scalar::U64 => sink.put(&u64::try_from(v).map_err(|_| out_of_range())?.to_le_bytes()),
        Scalar::I64 => sink.put(&i64::try_from(v).map_err(|_| out_of_range())?.to_le_bytes()),
        other => bail!(
            "field `{}`: {} is not an integer representation",
            name,
            other.name()
        ),
    }
}

fn encode_key(key_ty: &KeyType, key: &MapKey, name: &str, sink: &mut Sink) -> Result<()> {
    match (key_ty, key) {
        (KeyType::Int(s), MapKey::Int(v)) => encode_int(*s, *v, name, sink),
        (KeyType::FixedStr { len }, MapKey::Str(s)) => {
            ensure!(
                s.len() < *len,
                "field `{}`: map key of {} bytes does not fit a fixed string of {}",
                name,
                s.len(),
                len
            );
            sink.put(s.as_bytes())?;
            sink.zeros(len - s.len())
        }
        (_, key) => bail!(
            "field `{}`: map key kind mismatch, got {} key",
            name,
            key.kind_name()
        ),
    }
}

/// Emits one variable field's payload; returns the inline reference's
/// second word (count for vectors and maps, byte length for strings, total
/// encoded length for nested aggregates).
fn emit_payload(ty: &FieldType, value: &Value, name: &str, sink: &mut Sink) -> Result<u64> {
    match ty {
        FieldType::Vector { elem } => {
            let items = expect_vector(value, name)?;
            match elem.wire_class() {
                WireClass::Fixed { .. } => {
                    for item in items {
                        encode_fixed(elem, item, name, sink)?;
                    }
                    Ok(items.len() as u64)
                }
                WireClass::Variable => {
                    let table_at = sink.pos();
                    sink.zeros((items.len() + 1) * WORD)?;
                    let data_start = sink.pos();
                    for (i, item) in items.iter().enumerate() {
                        if !matches!(**elem, FieldType::Str) {
                            sink.zeros(padding_for(sink.pos() - data_start, WORD))?;
                        }
                        sink.patch_u64(table_at + i * WORD, (sink.pos() - data_start) as u64);
                        emit_element(elem, item, name, sink)?;
                    }
                    sink.patch_u64(
                        table_at + items.len() * WORD,
                        (sink.pos() - data_start) as u64,
                    );
                    Ok(items.len() as u64)
                }
            }
        }
        FieldType::Str => {
            let s = expect_str(value, name)?;
            sink.put(s.as_bytes())?;
            Ok(s.len() as u64)
        }
        FieldType::Struct(nested) => {
            let start = sink.pos();
            let nested_fields = expect_struct(value, nested)?;
            write_aggregate(nested, nested_fields, sink)?;
            Ok((sink.pos() - start) as u64)
        }
        FieldType::Union { tag, variants } => {
            let start = sink.pos();
            write_var_union(*tag, variants, value, name, sink)?;
            Ok((sink.pos() - start) as u64)
        }
        FieldType::Map { key, value: value_ty } => emit_map(key, value_ty, value, name, sink),
        other => bail!(
            "field `{}`: {} has no variable payload",
            name,
            other.kind_name()
        ),
    }
}

/// Emits one element of a vector of variable elements. Strings are packed
/// raw (delimited by the offset table); aggregates and unions are
/// self-contained; nested vectors gain a count-word prefix; maps are
/// already self-describing.
fn emit_element(elem: &FieldType, value: &Value, name: &str, sink: &mut Sink) -> Result<()> {
    match elem {
        FieldType::Str => {
            let s = expect_str(value, name)?;
            sink.put(s.as_bytes())
        }
        FieldType::Struct(nested) => {
            let nested_fields = expect_struct(value, nested)?;
            write_aggregate(nested, nested_fields, sink)
        }
        FieldType::Union { tag, variants } => write_var_union(*tag, variants, value, name, sink),
        FieldType::Vector { .. } => {
            let items = expect_vector(value, name)?;
            sink.put(&(items.len() as u64).to_le_bytes())?;
            emit_payload(elem, value, name, sink)?;
            Ok(())
        }
        FieldType::Map { .. } => {
            emit_payload(elem, value, name, sink)?;
            Ok(())
        }
        other => bail!(
            "field `{}`: {} cannot be a variable vector element",
            name,
            other.kind_name()
        ),
    }
}

/// Emits a self-contained variable union: size header, tag, inline payload
/// region sized for the largest variant, then the active variant's
/// variable payload.
fn write_var_union(
    tag: Scalar,
    variants: &[FieldType],
    value: &Value,
    name: &str,
    sink: &mut Sink,
) -> Result<()> {
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

    let header_at = sink.pos();
    sink.zeros(SIZE_HEADER)?;
    let base = sink.pos();

    encode_int(tag, tag_idx as i128, name, sink)?;
    sink.zeros(layout.payload_offset - tag.size())?;

    let mut slot = None;
    if variant.is_variable() {
        slot = Some(sink.pos());
        sink.zeros(INLINE_REF_SIZE)?;
    } else {
        encode_fixed(variant, inner, name, sink)?;
    }
    sink.zeros(layout.payload_offset + layout.payload_size - (sink.pos() - base))?;
    sink.zeros(padding_for(sink.pos() - base, WORD))?;

    if let Some(slot) = slot {
        sink.zeros(padding_for(sink.pos() - base, variant.payload_align()))?;
        let offset = sink.pos() - base;
        let second = emit_payload(variant, inner, name, sink)?;
        sink.patch_u64(slot, offset as u64);
        sink.patch_u64(slot + WORD, second);
    }

    sink.zeros(padding_for(sink.pos() - base, WORD))?;
    sink.patch_u64(header_at, (sink.pos() - base) as u64);
    Ok(())
}

fn emit_map(
    key_ty: &KeyType,
    value_ty: &FieldType,
    value: &Value,
    name: &str,
    sink: &mut Sink,
) -> Result<u64> {
    let entries = expect_map(value, name)?;

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| entries[a].0.cmp(&entries[b].0));
    for pair in order.windows(2) {
        if entries[pair[0]].0 == entries[pair[1]].0 {
            return Err(err(ErrorKind::MapDuplicateKey, sink.pos()));
        }
    }

    match value_ty.fixed_layout() {
        Some((value_size, value_align)) => {
            let layout = map_entry_layout(key_ty.size(), key_ty.align(), value_size, value_align);
            sink.put(&(entries.len() as u64).to_le_bytes())?;
            if !entries.is_empty() {
                sink.zeros(layout.entries_offset - WORD)?;
                for &i in &order {
                    let entry_start = sink.pos();
                    encode_key(key_ty, &entries[i].0, name, sink)?;
                    sink.zeros(layout.value_offset - (sink.pos() - entry_start))?;
                    encode_fixed(value_ty, &entries[i].1, name, sink)?;
                    sink.zeros(layout.stride - (sink.pos() - entry_start))?;
                }
            }
            Ok(entries.len() as u64)
        }
        None => {
            let (ref_offset, stride) = var_map_entry_layout(key_ty.size());
            let header_at = sink.pos();
            sink.zeros(WORD)?;
            sink.put(&(entries.len() as u64).to_le_bytes())?;

            let mut slots: SmallVec<[usize; 8]> = SmallVec::new();
            for &i in &order {
                let entry_start = sink.pos();
                encode_key(key_ty, &entries[i].0, name, sink)?;
                sink.zeros(ref_offset - (sink.pos() - entry_start))?;
                slots.push(sink.pos());
                sink.zeros(INLINE_REF_SIZE)?;
                debug_assert_eq!(sink.pos() - entry_start, stride);
            }

            let section = sink.pos();
            for (slot, &i) in slots.iter().zip(&order) {
                sink.zeros(padding_for(sink.pos() - section, value_ty.payload_align()))?;
                let offset = sink.pos() - section;
                let second = emit_payload(value_ty, &entries[i].1, name, sink)?;
                sink.patch_u64(*slot, offset as u64);
                sink.patch_u64(*slot + WORD, second);
            }

            sink.patch_u64(header_at, (sink.pos() - (header_at + WORD)) as u64);
            Ok(entries.len() as u64)
        }
    }
}

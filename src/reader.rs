//! # Reader
//!
//! Decodes a buffer into an owning [`Value`] tree, mirroring the writer:
//! validate the size header, parse the inline section at the manifest's
//! offsets, follow inline references into the variable section, and
//! materialize vectors, strings, and maps into owning containers.
//!
//! Every offset and span from the wire is checked against the declared
//! content region before it is dereferenced; violations surface as
//! [`crate::ZmemError`] values with the absolute byte offset where they
//! were detected. Map ordering is always verified on decode.
//!
//! ## Strict Mode
//!
//! `DecodeOptions { strict: true }` additionally enforces canonical form on
//! untrusted input: optional flags must be 0 or 1, booleans must be 0 or 1,
//! and fixed strings must be NUL-terminated with a zero tail. Permissive
//! reads (the default) accept any nonzero byte as true/present, matching
//! widespread practice, and cost nothing on the hot path.

use eyre::{bail, ensure, Result};

use crate::error::{err, ErrorKind};
use crate::layout::{
    align_up, map_entry_layout, optional_layout, union_layout, var_map_entry_layout, InlineRef,
    VarMapHeader, INLINE_REF_SIZE, MAX_NESTING_DEPTH, SIZE_HEADER, WORD,
};
use crate::schema::Schema;
use crate::types::field::{FieldType, KeyType, WireClass};
use crate::types::{MapKey, Scalar, Value};
use zerocopy::FromBytes;

/// Decode policy. The default is permissive; see the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub strict: bool,
}

/// Decodes `bytes` into an owning value under `schema` (permissive).
pub fn read(schema: &Schema, bytes: &[u8]) -> Result<Value> {
    read_with(schema, bytes, DecodeOptions::default())
}

/// Decodes with strict canonical-form checks enabled.
pub fn read_strict(schema: &Schema, bytes: &[u8]) -> Result<Value> {
    read_with(schema, bytes, DecodeOptions { strict: true })
}

pub fn read_with(schema: &Schema, bytes: &[u8], opts: DecodeOptions) -> Result<Value> {
    if let Some(size) = schema.fixed_size() {
        let need = align_up(size, WORD);
        if bytes.len() < need {
            return Err(err(ErrorKind::UnexpectedEnd, need));
        }
        Ok(Value::Struct(decode_fixed_struct(schema, bytes, 0, &opts, 0)?))
    } else {
        let (content, at) = split_content(bytes, 0)?;
        Ok(Value::Struct(decode_aggregate(schema, content, at, &opts, 0)?))
    }
}

/// Splits a self-contained encoding into its content region, validating
/// the size header. `abs` is the encoding's absolute offset, for error
/// reporting.
pub(crate) fn split_content(bytes: &[u8], abs: usize) -> Result<(&[u8], usize)> {
    if bytes.len() < SIZE_HEADER {
        return Err(err(ErrorKind::UnexpectedEnd, abs + SIZE_HEADER));
    }
    let raw: [u8; 8] = bytes[..SIZE_HEADER]
        .try_into()
        .map_err(|_| err(ErrorKind::UnexpectedEnd, abs + SIZE_HEADER))?;
    let size = u64::from_le_bytes(raw);
    let size = usize::try_from(size).map_err(|_| err(ErrorKind::SizeHeaderMismatch, abs))?;
    if size % WORD != 0 {
        return Err(err(ErrorKind::SizeHeaderMismatch, abs));
    }
    if bytes.len() < SIZE_HEADER + size {
        return Err(err(ErrorKind::UnexpectedEnd, abs + SIZE_HEADER + size));
    }
    Ok((&bytes[SIZE_HEADER..SIZE_HEADER + size], abs + SIZE_HEADER))
}

/// Bounds-checked sub-slice; `at` is the absolute offset of `bytes`.
pub(crate) fn take(bytes: &[u8], off: usize, n: usize, at: usize) -> Result<&[u8]> {
    let end = off
        .checked_add(n)
        .ok_or_else(|| err(ErrorKind::OffsetOutOfRange, at + off))?;
    if end > bytes.len() {
        return Err(err(ErrorKind::UnexpectedEnd, at + end));
    }
    Ok(&bytes[off..end])
}

pub(crate) fn read_word(bytes: &[u8], off: usize, at: usize) -> Result<u64> {
    let raw: [u8; 8] = take(bytes, off, WORD, at)?
        .try_into()
        .map_err(|_| err(ErrorKind::UnexpectedEnd, at + off + WORD))?;
    Ok(u64::from_le_bytes(raw))
}

pub(crate) fn read_inline_ref(bytes: &[u8], off: usize, at: usize) -> Result<InlineRef> {
    let raw = take(bytes, off, INLINE_REF_SIZE, at)?;
    InlineRef::read_from_bytes(raw).map_err(|_| err(ErrorKind::UnexpectedEnd, at + off))
}

pub(crate) fn decode_aggregate(
    schema: &Schema,
    content: &[u8],
    at: usize,
    opts: &DecodeOptions,
    depth: usize,
) -> Result<Vec<Value>> {
    ensure!(
        depth < MAX_NESTING_DEPTH,
        "nesting depth {} exceeds maximum {}",
        depth,
        MAX_NESTING_DEPTH
    );
    let inline_end = align_up(schema.inline_size(), WORD);
    if content.len() < inline_end {
        return Err(err(ErrorKind::UnexpectedEnd, at + inline_end));
    }

    let mut out = Vec::with_capacity(schema.field_count());
    for (idx, def) in schema.fields().iter().enumerate() {
        let off = schema.inline_offset(idx);
        if def.ty.is_variable() {
            let r = read_inline_ref(content, off, at)?;
            out.push(decode_payload(
                &def.ty, content, r, at, opts, depth, &def.name,
            )?);
        } else {
            out.push(decode_fixed(&def.ty, content, off, opts, at, &def.name)?);
        }
    }
    Ok(out)
}

pub(crate) fn decode_fixed_struct(
    schema: &Schema,
    bytes: &[u8],
    off: usize,
    opts: &DecodeOptions,
    at: usize,
) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(schema.field_count());
    for (idx, def) in schema.fields().iter().enumerate() {
        out.push(decode_fixed(
            &def.ty,
            bytes,
            off + schema.inline_offset(idx),
            opts,
            at,
            &def.name,
        )?);
    }
    Ok(out)
}

pub(crate) fn decode_fixed(
    ty: &FieldType,
    bytes: &[u8],
    off: usize,
    opts: &DecodeOptions,
    at: usize,
    name: &str,
) -> Result<Value> {
    match ty {
        FieldType::Scalar(s) => decode_scalar(*s, bytes, off, opts, at),
        FieldType::FixedStr { len } => {
            let raw = take(bytes, off, *len, at)?;
            let content = match raw.iter().position(|&b| b == 0) {
                Some(nul) => {
                    if opts.strict && raw[nul..].iter().any(|&b| b != 0) {
                        bail!(
                            "field `{}`: nonzero bytes after fixed string terminator at byte {}",
                            name,
                            at + off
                        );
                    }
                    &raw[..nul]
                }
                None => {
                    if opts.strict {
                        bail!(
                            "field `{}`: fixed string missing terminator at byte {}",
                            name,
                            at + off
                        );
                    }
                    raw
                }
            };
            Ok(Value::FixedStr(
                String::from_utf8_lossy(content).into_owned(),
            ))
        }
        FieldType::Array { elem, len } => {
            let Some((elem_size, _)) = elem.fixed_layout() else {
                bail!("field `{}`: array elements must be fixed", name);
            };
            let mut items = Vec::with_capacity(*len);
            for i in 0..*len {
                items.push(decode_fixed(elem, bytes, off + i * elem_size, opts, at, name)?);
            }
            Ok(Value::Array(items))
        }
        FieldType::Struct(nested) => Ok(Value::Struct(decode_fixed_struct(
            nested, bytes, off, opts, at,
        )?)),
        FieldType::Optional { inner } => {
            let flag = take(bytes, off, 1, at)?[0];
            if opts.strict && flag > 1 {
                return Err(err(ErrorKind::OptionalInvalidFlag, at + off));
            }
            let Some((size, align)) = inner.fixed_layout() else {
                bail!("field `{}`: optional inner type must be fixed", name);
            };
            if flag == 0 {
                return Ok(Value::Optional(None));
            }
            let layout = optional_layout(size, align);
            let v = decode_fixed(inner, bytes, off + layout.value_offset, opts, at, name)?;
            Ok(Value::Optional(Some(Box::new(v))))
        }
        FieldType::Enum { repr } => Ok(Value::Enum(decode_int(*repr, bytes, off, at, name)?)),
        FieldType::Union { tag, variants } => {
            let tag_v = decode_int(*tag, bytes, off, at, name)?;
            let tag_idx = usize::try_from(tag_v)
                .ok()
                .filter(|&i| i < variants.len())
                .ok_or_else(|| {
                    eyre::eyre!(
                        "field `{}`: union tag {} out of range at byte {}",
                        name,
                        tag_v,
                        at + off
                    )
                })?;
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
            let v = decode_fixed(
                &variants[tag_idx],
                bytes,
                off + layout.payload_offset,
                opts,
                at,
                name,
            )?;
            Ok(Value::Union {
                tag: tag_idx,
                value: Box::new(v),
            })
        }
        other => bail!(
            "field `{}`: {} is not a fixed type",
            name,
            other.kind_name()
        ),
    }
}

fn decode_scalar(
    s: Scalar,
    bytes: &[u8],
    off: usize,
    opts: &DecodeOptions,
    at: usize,
) -> Result<Value> {
    let raw = take(bytes, off, s.size(), at)?;
    let short = |_| err(ErrorKind::UnexpectedEnd, at + off + s.size());
    let v = match s {
        Scalar::Bool => {
            if opts.strict && raw[0] > 1 {
                return Err(err(ErrorKind::NonCanonicalBoolean, at + off));
            }
            Value::Bool(raw[0] != 0)
        }
        Scalar::U8 => Value::U8(raw[0]),
        Scalar::I8 => Value::I8(raw[0] as i8),
        Scalar::U16 => Value::U16(u16::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::I16 => Value::I16(i16::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::U32 => Value::U32(u32::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::I32 => Value::I32(i32::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::F32 => Value::F32(f32::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::U64 => Value::U64(u64::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::I64 => Value::I64(i64::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::F64 => Value::F64(f64::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::U128 => Value::U128(u128::from_le_bytes(raw.try_into().map_err(short)?)),
        Scalar::I128 => Value::I128(i128::from_le_bytes(raw.try_into().map_err(short)?)),
    };
    Ok(v)
}

/// Reads an integer scalar, widening to i64 (enum and union tags).
fn decode_int(s: Scalar, bytes: &[u8], off: usize, at: usize, name: &str) -> Result<i64> {
    let v = decode_int_wide(s, bytes, off, at, name)?;
    i64::try_from(v).map_err(|_| {
        eyre::eyre!(
            "field `{}`: value {} at byte {} exceeds the i64 range",
            name,
            v,
            at + off
        )
    })
}

/// Reads an integer scalar, widening to i128 (map keys).
pub(crate) fn decode_int_wide(
    s: Scalar,
    bytes: &[u8],
    off: usize,
    at: usize,
    name: &str,
) -> Result<i128> {
    let raw = take(bytes, off, s.size(), at)?;
    let short = |_| err(ErrorKind::UnexpectedEnd, at + off + s.size());
    let v = match s {
        Scalar::U8 => raw[0] as i128,
        Scalar::I8 => raw[0] as i8 as i128,
        Scalar::U16 => u16::from_le_bytes(raw.try_into().map_err(short)?) as i128,
        Scalar::I16 => i16::from_le_bytes(raw.try_into().map_err(short)?) as i128,
        Scalar::U32 => u32::from_le_bytes(raw.try_into().map_err(short)?) as i128,
        Scalar::I32 => i32::from_le_bytes(raw.try_into().map_err(short)?) as i128,
        Scalar::U64 => u64::from_le_bytes(raw.try_into().map_err(short)?) as i128,
        Scalar::I64 => i64::from_le_bytes(raw.try_into().map_err(short)?) as i128,
        other => bail!(
            "field `{}`: {} is not an integer representation",
            name,
            other.name()
        ),
    };
    Ok(v)
}

pub(crate) fn decode_key(
    key_ty: &KeyType,
    bytes: &[u8],
    off: usize,
    at: usize,
    name: &str,
) -> Result<MapKey> {
    match key_ty {
        KeyType::Int(s) => Ok(MapKey::Int(decode_int_wide(*s, bytes, off, at, name)?)),
        KeyType::FixedStr { len } => {
            let raw = take(bytes, off, *len, at)?;
            let content = match raw.iter().position(|&b| b == 0) {
                Some(nul) => &raw[..nul],
                None => raw,
            };
            Ok(MapKey::Str(String::from_utf8_lossy(content).into_owned()))
        }
    }
}

/// Resolves a variable field's payload through its inline reference.
/// Offsets are relative to `content`'s start (the enclosing aggregate's
/// byte 8).
pub(crate) fn decode_payload(
    ty: &FieldType,
    content: &[u8],
    r: InlineRef,
    at: usize,
    opts: &DecodeOptions,
    depth: usize,
    name: &str,
) -> Result<Value> {
    let offset =
        usize::try_from(r.offset()).map_err(|_| err(ErrorKind::OffsetOutOfRange, at))?;
    match ty {
        FieldType::Vector { elem } => {
            let count =
                usize::try_from(r.count()).map_err(|_| err(ErrorKind::VectorCountOverflow, at))?;
            match elem.wire_class() {
                WireClass::Fixed { size, .. } => {
                    let need = count
                        .checked_mul(size)
                        .ok_or_else(|| err(ErrorKind::VectorCountOverflow, at + offset))?;
                    span_check(content, offset, need, at)?;
                    let mut items = Vec::with_capacity(count);
                    for i in 0..count {
                        items.push(decode_fixed(elem, content, offset + i * size, opts, at, name)?);
                    }
                    Ok(Value::Vector(items))
                }
                WireClass::Variable => {
                    decode_var_vector(elem, content, offset, count, at, opts, depth, name)
                }
            }
        }
        FieldType::Str => {
            let len =
                usize::try_from(r.count()).map_err(|_| err(ErrorKind::OffsetOutOfRange, at))?;
            let raw = span_check(content, offset, len, at)?;
            Ok(Value::Str(String::from_utf8_lossy(raw).into_owned()))
        }
        FieldType::Struct(nested) => {
            let total =
                usize::try_from(r.count()).map_err(|_| err(ErrorKind::OffsetOutOfRange, at))?;
            let span = span_check(content, offset, total, at)?;
            let (inner, inner_at) = split_content(span, at + offset)?;
            Ok(Value::Struct(decode_aggregate(
                nested,
                inner,
                inner_at,
                opts,
                depth + 1,
            )?))
        }
        FieldType::Union { tag, variants } => {
            let total =
                usize::try_from(r.count()).map_err(|_| err(ErrorKind::OffsetOutOfRange, at))?;
            let span = span_check(content, offset, total, at)?;
            let (inner, inner_at) = split_content(span, at + offset)?;
            decode_var_union(*tag, variants, inner, inner_at, opts, depth + 1, name)
        }
        FieldType::Map { key, value } => {
            decode_map(key, value, content, offset, r, at, opts, depth, name)
        }
        other => bail!(
            "field `{}`: {} has no variable payload",
            name,
            other.kind_name()
        ),
    }
}

pub(crate) fn span_check<'a>(
    content: &'a [u8],
    offset: usize,
    len: usize,
    at: usize,
) -> Result<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| err(ErrorKind::OffsetOutOfRange, at + offset))?;
    if end > content.len() {
        return Err(err(ErrorKind::OffsetOutOfRange, at + offset));
    }
    Ok(&content[offset..end])
}

#[allow(clippy::too_many_arguments)]
fn decode_var_vector(
    elem: &FieldType,
    content: &[u8],
    offset: usize,
    count: usize,
    at: usize,
    opts: &DecodeOptions,
    depth: usize,
    name: &str,
) -> Result<Value> {
    let table_len = count
        .checked_add(1)
        .and_then(|n| n.checked_mul(WORD))
        .ok_or_else(|| err(ErrorKind::VectorCountOverflow, at + offset))?;
    span_check(content, offset, table_len, at)?;
    let data_start = offset + table_len;
    let sentinel = read_word(content, offset + count * WORD, at)?;
    let sentinel =
        usize::try_from(sentinel).map_err(|_| err(ErrorKind::OffsetOutOfRange, at + offset))?;
    span_check(content, data_start, sentinel, at)?;

    let mut items = Vec::with_capacity(count);
    let mut prev = 0usize;
    for i in 0..count {
        let start = read_word(content, offset + i * WORD, at)? as usize;
        let end = read_word(content, offset + (i + 1) * WORD, at)? as usize;
        if start < prev || end < start || end > sentinel {
            return Err(err(ErrorKind::OffsetOutOfRange, at + offset + i * WORD));
        }
        prev = start;
        let span = &content[data_start + start..data_start + end];
        items.push(decode_element(
            elem,
            span,
            at + data_start + start,
            opts,
            depth,
            name,
        )?);
    }
    Ok(Value::Vector(items))
}

/// Decodes one element of a vector of variable elements (see the writer's
/// `emit_element` for the element shapes).
pub(crate) fn decode_element(
    elem: &FieldType,
    span: &[u8],
    abs: usize,
    opts: &DecodeOptions,
    depth: usize,
    name: &str,
) -> Result<Value> {
    match elem {
        FieldType::Str => Ok(Value::Str(String::from_utf8_lossy(span).into_owned())),
        FieldType::Struct(nested) => {
            let (inner, inner_at) = split_content(span, abs)?;
            Ok(Value::Struct(decode_aggregate(
                nested,
                inner,
                inner_at,
                opts,
                depth + 1,
            )?))
        }
        FieldType::Union { tag, variants } => {
            let (inner, inner_at) = split_content(span, abs)?;
            decode_var_union(*tag, variants, inner, inner_at, opts, depth + 1, name)
        }
        FieldType::Vector { .. } => {
            let count = read_word(span, 0, abs)?;
            let r = synth_ref(WORD as u64, count);
            decode_payload(elem, span, r, abs, opts, depth + 1, name)
        }
        FieldType::Map { value, .. } => {
            let count = match value.wire_class() {
                WireClass::Fixed { .. } => read_word(span, 0, abs)?,
                WireClass::Variable => read_word(span, WORD, abs)?,
            };
            let r = synth_ref(0, count);
            decode_payload(elem, span, r, abs, opts, depth + 1, name)
        }
        other => bail!(
            "field `{}`: {} cannot be a variable vector element",
            name,
            other.kind_name()
        ),
    }
}

/// Builds an inline reference for payloads that carry their own counts
/// (vector elements resolved in place).
fn synth_ref(offset: u64, count: u64) -> InlineRef {
    InlineRef::new(offset, count)
}

fn decode_var_union(
    tag: Scalar,
    variants: &[FieldType],
    content: &[u8],
    at: usize,
    opts: &DecodeOptions,
    depth: usize,
    name: &str,
) -> Result<Value> {
    ensure!(
        depth < MAX_NESTING_DEPTH,
        "nesting depth {} exceeds maximum {}",
        depth,
        MAX_NESTING_DEPTH
    );
    let layout = FieldType::var_union_inline(tag, variants);
    let inline_end = align_up(layout.payload_offset + layout.payload_size, WORD);
    if content.len() < inline_end {
        return Err(err(ErrorKind::UnexpectedEnd, at + inline_end));
    }
    let tag_v = decode_int(tag, content, 0, at, name)?;
    let tag_idx = usize::try_from(tag_v)
        .ok()
        .filter(|&i| i < variants.len())
        .ok_or_else(|| {
            eyre::eyre!(
                "field `{}`: union tag {} out of range at byte {}",
                name,
                tag_v,
                at
            )
        })?;
    let variant = &variants[tag_idx];
    let value = if variant.is_variable() {
        let r = read_inline_ref(content, layout.payload_offset, at)?;
        decode_payload(variant, content, r, at, opts, depth, name)?
    } else {
        decode_fixed(variant, content, layout.payload_offset, opts, at, name)?
    };
    Ok(Value::Union {
        tag: tag_idx,
        value: Box::new(value),
    })
}

#[allow(clippy::too_many_arguments)]
fn decode_map(
    key_ty: &KeyType,
    value_ty: &FieldType,
    content: &[u8],
    offset: usize,
    r: InlineRef,
    at: usize,
    opts: &DecodeOptions,
    depth: usize,
    name: &str,
) -> Result<Value> {
    let count =
        usize::try_from(r.count()).map_err(|_| err(ErrorKind::VectorCountOverflow, at))?;
    match value_ty.fixed_layout() {
        Some((value_size, value_align)) => {
            let stored = read_word(content, offset, at)? as usize;
            if stored != count {
                return Err(err(ErrorKind::SizeHeaderMismatch, at + offset));
            }
            if count == 0 {
                return Ok(Value::Map(Vec::new()));
            }
            let layout =
                map_entry_layout(key_ty.size(), key_ty.align(), value_size, value_align);
            let entries_len = count
                .checked_mul(layout.stride)
                .ok_or_else(|| err(ErrorKind::VectorCountOverflow, at + offset))?;
            span_check(content, offset + layout.entries_offset, entries_len, at)?;

            let mut entries = Vec::with_capacity(count);
            for i in 0..count {
                let entry = offset + layout.entries_offset + i * layout.stride;
                let key = decode_key(key_ty, content, entry, at, name)?;
                check_order(&entries, &key, at + entry)?;
                let value =
                    decode_fixed(value_ty, content, entry + layout.value_offset, opts, at, name)?;
                entries.push((key, value));
            }
            Ok(Value::Map(entries))
        }
        None => {
            let raw = take(content, offset, 2 * WORD, at)?;
            let header = VarMapHeader::read_from_bytes(raw)
                .map_err(|_| err(ErrorKind::UnexpectedEnd, at + offset))?;
            let stored = usize::try_from(header.count())
                .map_err(|_| err(ErrorKind::VectorCountOverflow, at + offset))?;
            if stored != count {
                return Err(err(ErrorKind::SizeHeaderMismatch, at + offset));
            }
            let total = usize::try_from(header.total())
                .map_err(|_| err(ErrorKind::SizeHeaderMismatch, at + offset))?;
            span_check(content, offset + WORD, total, at)?;

            let (ref_offset, stride) = var_map_entry_layout(key_ty.size());
            let entries_len = count
                .checked_mul(stride)
                .ok_or_else(|| err(ErrorKind::VectorCountOverflow, at + offset))?;
            if total < WORD + entries_len {
                return Err(err(ErrorKind::SizeHeaderMismatch, at + offset));
            }
            let section_start = offset + 2 * WORD + entries_len;
            let section_end = offset + WORD + total;
            let section = &content[section_start..section_end];

            let mut entries = Vec::with_capacity(count);
            for i in 0..count {
                let entry = offset + 2 * WORD + i * stride;
                let key = decode_key(key_ty, content, entry, at, name)?;
                check_order(&entries, &key, at + entry)?;
                let vref = read_inline_ref(content, entry + ref_offset, at)?;
                let value = decode_payload(
                    value_ty,
                    section,
                    vref,
                    at + section_start,
                    opts,
                    depth + 1,
                    name,
                )?;
                entries.push((key, value));
            }
            Ok(Value::Map(entries))
        }
    }
}

fn check_order(entries: &[(MapKey, Value)], key: &MapKey, abs: usize) -> Result<()> {
    if let Some((prev, _)) = entries.last() {
        match prev.cmp(key) {
            std::cmp::Ordering::Less => {}
            std::cmp::Ordering::Equal => return Err(err(ErrorKind::MapDuplicateKey, abs)),
            std::cmp::Ordering::Greater => return Err(err(ErrorKind::MapUnsorted, abs)),
        }
    }
    Ok(())
}

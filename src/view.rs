//! # Lazy Zero-Copy View
//!
//! `View` is a position-addressed, non-owning handle over an encoded
//! buffer. Field access is O(1) through the manifest's precomputed inline
//! offsets; nothing is copied or allocated until the caller asks for an
//! owning value explicitly.
//!
//! ## Access Shapes
//!
//! | Field kind | Accessor | Returns |
//! |------------|----------|---------|
//! | scalar | `get_u32`, `get_f64`, ... | the value |
//! | fixed string | `get_fixed_str` | `&str` into the buffer |
//! | string | `get_str`, `get_str_bytes` | borrowed bytes |
//! | vector of scalars | `get_slice::<T>` | typed span into the buffer |
//! | vector (any) | `get_seq` | [`SeqView`], O(1) `element(i)` |
//! | nested struct | `get_struct` | nested [`View`] |
//! | map, fixed values | `get_map` | [`MapView`], O(log n) `find` |
//! | map, variable values | `get_var_map` | [`VarMapView`] |
//! | union | `get_union` | [`UnionRef`] |
//! | optional | `get_optional` | `Option<Value>` |
//! | anything | `get_value` | owning [`Value`] (materializes) |
//!
//! ## Thread Safety
//!
//! A view borrows its buffer immutably and never mutates; any number of
//! views may read the same buffer concurrently. Memory-mapped regions are
//! legitimate inputs as long as the mapping outlives the view.

use eyre::{bail, ensure, Result};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::error::{err, ErrorKind};
use crate::layout::{
    align_up, map_entry_layout, optional_layout, union_layout, var_map_entry_layout, InlineRef,
    MapEntryLayout, VarMapHeader, WORD,
};
use crate::reader::{
    self, decode_fixed, decode_payload, read_inline_ref, read_word, span_check, split_content,
    take, DecodeOptions,
};
use crate::schema::{FieldDef, Schema};
use crate::types::field::{FieldType, KeyType, WireClass};
use crate::types::{MapKey, Scalar, Value};

/// Non-owning view of one encoded aggregate.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    content: &'a [u8],
    schema: &'a Schema,
    at: usize,
}

impl<'a> View<'a> {
    /// Opens a view over a complete encoding, validating the size header
    /// for variable aggregates.
    pub fn new(bytes: &'a [u8], schema: &'a Schema) -> Result<Self> {
        match schema.fixed_size() {
            Some(size) => {
                let need = align_up(size, WORD);
                if bytes.len() < need {
                    return Err(err(ErrorKind::UnexpectedEnd, need));
                }
                Ok(Self {
                    content: &bytes[..size],
                    schema,
                    at: 0,
                })
            }
            None => {
                let (content, at) = split_content(bytes, 0)?;
                let inline_end = align_up(schema.inline_size(), WORD);
                if content.len() < inline_end {
                    return Err(err(ErrorKind::UnexpectedEnd, at + inline_end));
                }
                Ok(Self { content, schema, at })
            }
        }
    }

    /// View over a fixed sub-range whose length equals the nested fixed
    /// size (nested fixed structs, stride-addressed vector elements).
    fn from_fixed_region(content: &'a [u8], schema: &'a Schema, at: usize) -> Self {
        Self {
            content,
            schema,
            at,
        }
    }

    /// View over a self-contained nested encoding.
    fn new_nested(span: &'a [u8], schema: &'a Schema, at: usize) -> Result<Self> {
        let (content, inner_at) = split_content(span, at)?;
        let inline_end = align_up(schema.inline_size(), WORD);
        if content.len() < inline_end {
            return Err(err(ErrorKind::UnexpectedEnd, inner_at + inline_end));
        }
        Ok(Self {
            content,
            schema,
            at: inner_at,
        })
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// The content region this view addresses (after the size header for
    /// variable aggregates).
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    fn def(&self, idx: usize) -> Result<&'a FieldDef> {
        self.schema.field(idx).ok_or_else(|| {
            eyre::eyre!(
                "field index {} out of bounds ({} fields)",
                idx,
                self.schema.field_count()
            )
        })
    }

    fn scalar_offset(&self, idx: usize, want: Scalar) -> Result<usize> {
        let def = self.def(idx)?;
        match &def.ty {
            FieldType::Scalar(s) if *s == want => Ok(self.schema.inline_offset(idx)),
            other => bail!(
                "field `{}` is {}, not {}",
                def.name,
                other.kind_name(),
                want.name()
            ),
        }
    }

    fn var_ref(&self, idx: usize) -> Result<(&'a FieldDef, InlineRef)> {
        let def = self.def(idx)?;
        ensure!(
            def.ty.is_variable(),
            "field `{}` is not a variable field",
            def.name
        );
        let off = self.schema.inline_offset(idx);
        let r = read_inline_ref(self.content, off, self.at)?;
        Ok((def, r))
    }

    pub fn get_bool(&self, idx: usize) -> Result<bool> {
        let off = self.scalar_offset(idx, Scalar::Bool)?;
        Ok(take(self.content, off, 1, self.at)?[0] != 0)
    }

    pub fn get_u8(&self, idx: usize) -> Result<u8> {
        let off = self.scalar_offset(idx, Scalar::U8)?;
        Ok(take(self.content, off, 1, self.at)?[0])
    }

    pub fn get_i8(&self, idx: usize) -> Result<i8> {
        let off = self.scalar_offset(idx, Scalar::I8)?;
        Ok(take(self.content, off, 1, self.at)?[0] as i8)
    }

    pub fn get_u16(&self, idx: usize) -> Result<u16> {
        let off = self.scalar_offset(idx, Scalar::U16)?;
        let raw: [u8; 2] = take(self.content, off, 2, self.at)?
            .try_into()
            .map_err(|_| err(ErrorKind::UnexpectedEnd, self.at + off + 2))?;
        Ok(u16::from_le_bytes(raw))
    }

    pub fn get_i16(&self, idx: usize) -> Result<i16> {
        let off = self.scalar_offset(idx, Scalar::I16)?;
        let raw: [u8; 2] = take(self.content, off, 2, self.at)?
            .try_into()
            .map_err(|_| err(ErrorKind::UnexpectedEnd, self.at + off + 2))?;
        Ok(i16::from_le_bytes(raw))
    }

    pub fn get_u32(&self, idx: usize) -> Result<u32> {
        let off = self.scalar_offset(idx, Scalar::U32)?;
        let raw: [u8; 4] = take(self.content, off, 4, self.at)?
            .try_into()
            .map_err(|_| err(ErrorKind::UnexpectedEnd, self.at + off + 4))?;
        Ok(u32::from_le_bytes(raw))
    }

    pub fn get_i32(&self, idx: usize) -> Result<i32> {
        let off = self.scalar_offset(idx, Scalar::I32)?;
        let raw: [u8; 4] = take(self.content, off, 4, self.at)?
            .try_into()
            .map_err(|_| err(ErrorKind::UnexpectedEnd, self.at + off + 4))?;
        Ok(i32::from_le_bytes(raw))
    }

    pub fn get_f32(&self, idx: usize) -> Result<f32> {
        let off = self.scalar_offset(idx, Scalar::F32)?;
        let raw: [u8; 4] = take(self.content, off, 4, self.at)?
            .try_into()
            .map_err(|_| err(ErrorKind::UnexpectedEnd, self.at + off + 4))?;
        Ok(f32::from_le_bytes(raw))
    }

    pub fn get_u64(&self, idx: usize) -> Result<u64> {
        let off = self.scalar_offset(idx, Scalar::U64)?;
        read_word(self.content, off, self.at)
    }

    pub fn get_i64(&self, idx: usize) -> Result<i64> {
        let off = self.scalar_offset(idx, Scalar::I64)?;
        Ok(read_word(self.content, off, self.at)? as i64)
    }

    pub fn get_f64(&self, idx: usize) -> Result<f64> {
        let off = self.scalar_offset(idx, Scalar::F64)?;
        Ok(f64::from_bits(read_word(self.content, off, self.at)?))
    }

    pub fn get_u128(&self, idx: usize) -> Result<u128> {
        let off = self.scalar_offset(idx, Scalar::U128)?;
        let raw: [u8; 16] = take(self.content, off, 16, self.at)?
            .try_into()
            .map_err(|_| err(ErrorKind::UnexpectedEnd, self.at + off + 16))?;
        Ok(u128::from_le_bytes(raw))
    }

    pub fn get_i128(&self, idx: usize) -> Result<i128> {
        let off = self.scalar_offset(idx, Scalar::I128)?;
        let raw: [u8; 16] = take(self.content, off, 16, self.at)?
            .try_into()
            .map_err(|_| err(ErrorKind::UnexpectedEnd, self.at + off + 16))?;
        Ok(i128::from_le_bytes(raw))
    }

    /// Underlying integer of an enum field.
    pub fn get_enum(&self, idx: usize) -> Result<i64> {
        let def = self.def(idx)?;
        let FieldType::Enum { repr } = &def.ty else {
            bail!("field `{}` is {}, not enum", def.name, def.ty.kind_name());
        };
        let off = self.schema.inline_offset(idx);
        let wide = reader::decode_int_wide(*repr, self.content, off, self.at, &def.name)?;
        i64::try_from(wide)
            .map_err(|_| eyre::eyre!("field `{}`: enum value exceeds the i64 range", def.name))
    }

    /// Content of a fixed string field, up to its terminator.
    pub fn get_fixed_str(&self, idx: usize) -> Result<&'a str> {
        let def = self.def(idx)?;
        let FieldType::FixedStr { len } = &def.ty else {
            bail!(
                "field `{}` is {}, not a fixed string",
                def.name,
                def.ty.kind_name()
            );
        };
        let off = self.schema.inline_offset(idx);
        let raw = take(self.content, off, *len, self.at)?;
        let content = match raw.iter().position(|&b| b == 0) {
            Some(nul) => &raw[..nul],
            None => raw,
        };
        std::str::from_utf8(content)
            .map_err(|e| eyre::eyre!("invalid UTF-8 in field `{}`: {}", def.name, e))
    }

    pub fn get_str(&self, idx: usize) -> Result<&'a str> {
        let (def, bytes) = self.str_span(idx)?;
        std::str::from_utf8(bytes)
            .map_err(|e| eyre::eyre!("invalid UTF-8 in field `{}`: {}", def.name, e))
    }

    pub fn get_str_bytes(&self, idx: usize) -> Result<&'a [u8]> {
        Ok(self.str_span(idx)?.1)
    }

    fn str_span(&self, idx: usize) -> Result<(&'a FieldDef, &'a [u8])> {
        let (def, r) = self.var_ref(idx)?;
        ensure!(
            matches!(def.ty, FieldType::Str),
            "field `{}` is {}, not a string",
            def.name,
            def.ty.kind_name()
        );
        let offset = r.offset() as usize;
        let len = r.count() as usize;
        Ok((def, span_check(self.content, offset, len, self.at)?))
    }

    /// Zero-copy typed span over a vector of scalars. `T` must match the
    /// manifest's element type; the payload must be aligned for `T` in the
    /// caller's buffer (guaranteed for word-aligned buffers and element
    /// types up to 8 bytes).
    pub fn get_slice<T>(&self, idx: usize) -> Result<&'a [T]>
    where
        T: FromBytes + Immutable + KnownLayout,
    {
        let (def, r) = self.var_ref(idx)?;
        let FieldType::Vector { elem } = &def.ty else {
            bail!("field `{}` is {}, not a vector", def.name, def.ty.kind_name());
        };
        let Some((elem_size, _)) = elem.fixed_layout() else {
            bail!(
                "field `{}` has variable elements; use get_seq",
                def.name
            );
        };
        ensure!(
            elem_size == std::mem::size_of::<T>(),
            "field `{}`: elements are {} bytes, requested type is {}",
            def.name,
            elem_size,
            std::mem::size_of::<T>()
        );
        let offset = r.offset() as usize;
        let count = r.count() as usize;
        let need = count
            .checked_mul(elem_size)
            .ok_or_else(|| err(ErrorKind::VectorCountOverflow, self.at + offset))?;
        let span = span_check(self.content, offset, need, self.at)?;
        <[T]>::ref_from_bytes(span).map_err(|_| {
            eyre::eyre!(
                "vector payload in field `{}` is not aligned for zero-copy access",
                def.name
            )
        })
    }

    /// Sequence view over any vector field: O(1) element access for both
    /// fixed (stride) and variable (offset table) elements.
    pub fn get_seq(&self, idx: usize) -> Result<SeqView<'a>> {
        let (def, r) = self.var_ref(idx)?;
        let FieldType::Vector { elem } = &def.ty else {
            bail!("field `{}` is {}, not a vector", def.name, def.ty.kind_name());
        };
        let offset = r.offset() as usize;
        let count = usize::try_from(r.count())
            .map_err(|_| err(ErrorKind::VectorCountOverflow, self.at + offset))?;
        match elem.wire_class() {
            WireClass::Fixed { size, .. } => {
                let need = count
                    .checked_mul(size)
                    .ok_or_else(|| err(ErrorKind::VectorCountOverflow, self.at + offset))?;
                let data = span_check(self.content, offset, need, self.at)?;
                Ok(SeqView {
                    elem,
                    count,
                    table: None,
                    table_at: 0,
                    data,
                    stride: size,
                    at: self.at + offset,
                })
            }
            WireClass::Variable => {
                let table_len = count
                    .checked_add(1)
                    .and_then(|n| n.checked_mul(WORD))
                    .ok_or_else(|| err(ErrorKind::VectorCountOverflow, self.at + offset))?;
                let table = span_check(self.content, offset, table_len, self.at)?;
                let sentinel = read_word(self.content, offset + count * WORD, self.at)? as usize;
                let data_start = offset + table_len;
                let data = span_check(self.content, data_start, sentinel, self.at)?;
                Ok(SeqView {
                    elem,
                    count,
                    table: Some(table),
                    table_at: self.at + offset,
                    data,
                    stride: 0,
                    at: self.at + data_start,
                })
            }
        }
    }

    /// Nested view over a struct field, fixed or variable.
    pub fn get_struct(&self, idx: usize) -> Result<View<'a>> {
        let def = self.def(idx)?;
        let FieldType::Struct(nested) = &def.ty else {
            bail!("field `{}` is {}, not a struct", def.name, def.ty.kind_name());
        };
        if let Some(size) = nested.fixed_size() {
            let off = self.schema.inline_offset(idx);
            let span = take(self.content, off, size, self.at)?;
            Ok(View::from_fixed_region(span, nested, self.at + off))
        } else {
            let (_, r) = self.var_ref(idx)?;
            let offset = r.offset() as usize;
            let total = r.count() as usize;
            let span = span_check(self.content, offset, total, self.at)?;
            View::new_nested(span, nested, self.at + offset)
        }
    }

    /// Map view over a field with fixed values.
    pub fn get_map(&self, idx: usize) -> Result<MapView<'a>> {
        let (def, r) = self.var_ref(idx)?;
        let FieldType::Map { key, value } = &def.ty else {
            bail!("field `{}` is {}, not a map", def.name, def.ty.kind_name());
        };
        let Some((value_size, value_align)) = value.fixed_layout() else {
            bail!(
                "field `{}` has variable values; use get_var_map",
                def.name
            );
        };
        let offset = r.offset() as usize;
        let count = usize::try_from(r.count())
            .map_err(|_| err(ErrorKind::VectorCountOverflow, self.at + offset))?;
        let stored = read_word(self.content, offset, self.at)? as usize;
        if stored != count {
            return Err(err(ErrorKind::SizeHeaderMismatch, self.at + offset));
        }
        let layout = map_entry_layout(key.size(), key.align(), value_size, value_align);
        let entries = if count == 0 {
            &self.content[offset + WORD..offset + WORD]
        } else {
            let entries_len = count
                .checked_mul(layout.stride)
                .ok_or_else(|| err(ErrorKind::VectorCountOverflow, self.at + offset))?;
            span_check(self.content, offset + layout.entries_offset, entries_len, self.at)?
        };
        Ok(MapView {
            key,
            value,
            value_size,
            count,
            entries,
            layout,
            at: self.at + offset + layout.entries_offset,
        })
    }

    /// Map view over a field with variable values.
    pub fn get_var_map(&self, idx: usize) -> Result<VarMapView<'a>> {
        let (def, r) = self.var_ref(idx)?;
        let FieldType::Map { key, value } = &def.ty else {
            bail!("field `{}` is {}, not a map", def.name, def.ty.kind_name());
        };
        ensure!(
            value.is_variable(),
            "field `{}` has fixed values; use get_map",
            def.name
        );
        let offset = r.offset() as usize;
        let count = usize::try_from(r.count())
            .map_err(|_| err(ErrorKind::VectorCountOverflow, self.at + offset))?;
        let raw = take(self.content, offset, 2 * WORD, self.at)?;
        let header = VarMapHeader::read_from_bytes(raw)
            .map_err(|_| err(ErrorKind::UnexpectedEnd, self.at + offset))?;
        if header.count() as usize != count {
            return Err(err(ErrorKind::SizeHeaderMismatch, self.at + offset));
        }
        let total = usize::try_from(header.total())
            .map_err(|_| err(ErrorKind::SizeHeaderMismatch, self.at + offset))?;
        span_check(self.content, offset + WORD, total, self.at)?;

        let (ref_offset, stride) = var_map_entry_layout(key.size());
        let entries_len = count
            .checked_mul(stride)
            .ok_or_else(|| err(ErrorKind::VectorCountOverflow, self.at + offset))?;
        if total < WORD + entries_len {
            return Err(err(ErrorKind::SizeHeaderMismatch, self.at + offset));
        }
        let entries_start = offset + 2 * WORD;
        let section_start = entries_start + entries_len;
        let section_end = offset + WORD + total;
        Ok(VarMapView {
            key,
            value,
            count,
            entries: &self.content[entries_start..section_start],
            section: &self.content[section_start..section_end],
            ref_offset,
            stride,
            entries_at: self.at + entries_start,
            section_at: self.at + section_start,
        })
    }

    /// Union handle exposing the tag and the active variant.
    pub fn get_union(&self, idx: usize) -> Result<UnionRef<'a>> {
        let def = self.def(idx)?;
        let FieldType::Union { tag, variants } = &def.ty else {
            bail!("field `{}` is {}, not a union", def.name, def.ty.kind_name());
        };
        match def.ty.wire_class() {
            WireClass::Fixed { .. } => {
                let off = self.schema.inline_offset(idx);
                let mut payload_size = 0;
                let mut payload_align = 1;
                for v in variants {
                    let Some((s, a)) = v.fixed_layout() else {
                        bail!("field `{}`: variable variant in fixed union", def.name);
                    };
                    payload_size = payload_size.max(s);
                    payload_align = payload_align.max(a);
                }
                let layout = union_layout(tag.size(), tag.align(), payload_size, payload_align);
                let tag_idx = self.read_tag(*tag, off, variants.len(), &def.name)?;
                Ok(UnionRef {
                    variants,
                    tag_idx,
                    region: self.content,
                    payload_offset: off + layout.payload_offset,
                    at: self.at,
                    self_contained: false,
                })
            }
            WireClass::Variable => {
                let (_, r) = self.var_ref(idx)?;
                let offset = r.offset() as usize;
                let total = r.count() as usize;
                let span = span_check(self.content, offset, total, self.at)?;
                let (region, region_at) = split_content(span, self.at + offset)?;
                let layout = FieldType::var_union_inline(*tag, variants);
                let inline_end = align_up(layout.payload_offset + layout.payload_size, WORD);
                if region.len() < inline_end {
                    return Err(err(ErrorKind::UnexpectedEnd, region_at + inline_end));
                }
                let tag_idx = {
                    let wide =
                        reader::decode_int_wide(*tag, region, 0, region_at, &def.name)?;
                    usize::try_from(wide)
                        .ok()
                        .filter(|&i| i < variants.len())
                        .ok_or_else(|| {
                            eyre::eyre!(
                                "field `{}`: union tag {} out of range at byte {}",
                                def.name,
                                wide,
                                region_at
                            )
                        })?
                };
                Ok(UnionRef {
                    variants,
                    tag_idx,
                    region,
                    payload_offset: layout.payload_offset,
                    at: region_at,
                    self_contained: true,
                })
            }
        }
    }

    fn read_tag(
        &self,
        tag: Scalar,
        off: usize,
        variant_count: usize,
        name: &str,
    ) -> Result<usize> {
        let wide = reader::decode_int_wide(tag, self.content, off, self.at, name)?;
        usize::try_from(wide)
            .ok()
            .filter(|&i| i < variant_count)
            .ok_or_else(|| {
                eyre::eyre!(
                    "field `{}`: union tag {} out of range at byte {}",
                    name,
                    wide,
                    self.at + off
                )
            })
    }

    /// Present flag and value of an optional field. Materializes the inner
    /// value (allocation-free for scalars).
    pub fn get_optional(&self, idx: usize) -> Result<Option<Value>> {
        let def = self.def(idx)?;
        let FieldType::Optional { inner } = &def.ty else {
            bail!(
                "field `{}` is {}, not an optional",
                def.name,
                def.ty.kind_name()
            );
        };
        let off = self.schema.inline_offset(idx);
        let flag = take(self.content, off, 1, self.at)?[0];
        if flag == 0 {
            return Ok(None);
        }
        let Some((size, align)) = inner.fixed_layout() else {
            bail!("field `{}`: optional inner type must be fixed", def.name);
        };
        let layout = optional_layout(size, align);
        decode_fixed(
            inner,
            self.content,
            off + layout.value_offset,
            &DecodeOptions::default(),
            self.at,
            &def.name,
        )
        .map(Some)
    }

    /// Materializes any field as an owning value.
    pub fn get_value(&self, idx: usize) -> Result<Value> {
        let def = self.def(idx)?;
        let opts = DecodeOptions::default();
        if def.ty.is_variable() {
            let (_, r) = self.var_ref(idx)?;
            decode_payload(&def.ty, self.content, r, self.at, &opts, 0, &def.name)
        } else {
            decode_fixed(
                &def.ty,
                self.content,
                self.schema.inline_offset(idx),
                &opts,
                self.at,
                &def.name,
            )
        }
    }
}

/// O(1) indexed access over a vector field's payload.
#[derive(Debug, Clone, Copy)]
pub struct SeqView<'a> {
    elem: &'a FieldType,
    count: usize,
    table: Option<&'a [u8]>,
    table_at: usize,
    data: &'a [u8],
    stride: usize,
    at: usize,
}

impl<'a> SeqView<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn elem_type(&self) -> &'a FieldType {
        self.elem
    }

    /// Raw bytes of the whole payload region (fixed: elements; variable:
    /// element data after the offset table).
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn elem_span(&self, i: usize) -> Result<(&'a [u8], usize)> {
        ensure!(
            i < self.count,
            "element index {} out of bounds (len={})",
            i,
            self.count
        );
        match self.table {
            None => {
                let off = i * self.stride;
                Ok((&self.data[off..off + self.stride], self.at + off))
            }
            Some(table) => {
                let start = read_word(table, i * WORD, self.table_at)? as usize;
                let end = read_word(table, (i + 1) * WORD, self.table_at)? as usize;
                if start > end || end > self.data.len() {
                    return Err(err(ErrorKind::OffsetOutOfRange, self.table_at + i * WORD));
                }
                Ok((&self.data[start..end], self.at + start))
            }
        }
    }

    /// Nested view over a struct element.
    pub fn element(&self, i: usize) -> Result<View<'a>> {
        let (span, abs) = self.elem_span(i)?;
        match self.elem {
            FieldType::Struct(nested) => {
                if nested.is_fixed() {
                    Ok(View::from_fixed_region(span, nested, abs))
                } else {
                    View::new_nested(span, nested, abs)
                }
            }
            other => bail!(
                "{} elements have no structured view; use element_value",
                other.kind_name()
            ),
        }
    }

    /// Borrowed string element.
    pub fn element_str(&self, i: usize) -> Result<&'a str> {
        ensure!(
            matches!(self.elem, FieldType::Str),
            "{} elements are not strings",
            self.elem.kind_name()
        );
        let (span, _) = self.elem_span(i)?;
        std::str::from_utf8(span)
            .map_err(|e| eyre::eyre!("invalid UTF-8 in vector element {}: {}", i, e))
    }

    /// Raw bytes of one element.
    pub fn element_bytes(&self, i: usize) -> Result<&'a [u8]> {
        Ok(self.elem_span(i)?.0)
    }

    /// Materializes one element as an owning value.
    pub fn element_value(&self, i: usize) -> Result<Value> {
        let (span, abs) = self.elem_span(i)?;
        let opts = DecodeOptions::default();
        if self.elem.is_variable() {
            reader::decode_element(self.elem, span, abs, &opts, 0, "element")
        } else {
            decode_fixed(self.elem, span, 0, &opts, abs, "element")
        }
    }
}

/// Sorted-entry access over a map field with fixed values.
#[derive(Debug, Clone, Copy)]
pub struct MapView<'a> {
    key: &'a KeyType,
    value: &'a FieldType,
    value_size: usize,
    count: usize,
    entries: &'a [u8],
    layout: MapEntryLayout,
    at: usize,
}

impl<'a> MapView<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn key_at(&self, i: usize) -> Result<MapKey> {
        ensure!(
            i < self.count,
            "entry index {} out of bounds (len={})",
            i,
            self.count
        );
        reader::decode_key(self.key, self.entries, i * self.layout.stride, self.at, "map key")
    }

    /// Raw value bytes of entry `i`.
    pub fn value_bytes(&self, i: usize) -> Result<&'a [u8]> {
        ensure!(
            i < self.count,
            "entry index {} out of bounds (len={})",
            i,
            self.count
        );
        let off = i * self.layout.stride + self.layout.value_offset;
        Ok(&self.entries[off..off + self.value_size])
    }

    /// Materialized value of entry `i` (allocation-free for scalars).
    pub fn value_at(&self, i: usize) -> Result<Value> {
        ensure!(
            i < self.count,
            "entry index {} out of bounds (len={})",
            i,
            self.count
        );
        decode_fixed(
            self.value,
            self.entries,
            i * self.layout.stride + self.layout.value_offset,
            &DecodeOptions::default(),
            self.at,
            "map value",
        )
    }

    /// Binary search over the sorted entries; O(log n).
    pub fn find(&self, key: &MapKey) -> Result<Option<usize>> {
        let mut lo = 0usize;
        let mut hi = self.count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.key_at(mid)?.cmp(key) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Ok(Some(mid)),
            }
        }
        Ok(None)
    }

    pub fn get(&self, key: &MapKey) -> Result<Option<Value>> {
        match self.find(key)? {
            Some(i) => self.value_at(i).map(Some),
            None => Ok(None),
        }
    }
}

/// Sorted-entry access over a map field with variable values. Entry value
/// offsets are relative to the map's own variable section.
#[derive(Debug, Clone, Copy)]
pub struct VarMapView<'a> {
    key: &'a KeyType,
    value: &'a FieldType,
    count: usize,
    entries: &'a [u8],
    section: &'a [u8],
    ref_offset: usize,
    stride: usize,
    entries_at: usize,
    section_at: usize,
}

impl<'a> VarMapView<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn key_at(&self, i: usize) -> Result<MapKey> {
        ensure!(
            i < self.count,
            "entry index {} out of bounds (len={})",
            i,
            self.count
        );
        reader::decode_key(self.key, self.entries, i * self.stride, self.entries_at, "map key")
    }

    fn value_ref(&self, i: usize) -> Result<InlineRef> {
        ensure!(
            i < self.count,
            "entry index {} out of bounds (len={})",
            i,
            self.count
        );
        read_inline_ref(self.entries, i * self.stride + self.ref_offset, self.entries_at)
    }

    /// Borrowed string value of entry `i`.
    pub fn value_str(&self, i: usize) -> Result<&'a str> {
        ensure!(
            matches!(self.value, FieldType::Str),
            "map values are {}, not strings",
            self.value.kind_name()
        );
        let r = self.value_ref(i)?;
        let span = span_check(
            self.section,
            r.offset() as usize,
            r.count() as usize,
            self.section_at,
        )?;
        std::str::from_utf8(span)
            .map_err(|e| eyre::eyre!("invalid UTF-8 in map value {}: {}", i, e))
    }

    /// Nested view over a struct value of entry `i`.
    pub fn value_view(&self, i: usize) -> Result<View<'a>> {
        let FieldType::Struct(nested) = self.value else {
            bail!(
                "map values are {}, not structs",
                self.value.kind_name()
            );
        };
        let r = self.value_ref(i)?;
        let span = span_check(
            self.section,
            r.offset() as usize,
            r.count() as usize,
            self.section_at,
        )?;
        View::new_nested(span, nested, self.section_at + r.offset() as usize)
    }

    /// Materialized value of entry `i`.
    pub fn value_at(&self, i: usize) -> Result<Value> {
        let r = self.value_ref(i)?;
        decode_payload(
            self.value,
            self.section,
            r,
            self.section_at,
            &DecodeOptions::default(),
            0,
            "map value",
        )
    }

    /// Binary search over the sorted entries; O(log n).
    pub fn find(&self, key: &MapKey) -> Result<Option<usize>> {
        let mut lo = 0usize;
        let mut hi = self.count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.key_at(mid)?.cmp(key) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Ok(Some(mid)),
            }
        }
        Ok(None)
    }

    pub fn get(&self, key: &MapKey) -> Result<Option<Value>> {
        match self.find(key)? {
            Some(i) => self.value_at(i).map(Some),
            None => Ok(None),
        }
    }
}

/// Handle over a union field: tag plus access to the active variant.
#[derive(Debug, Clone, Copy)]
pub struct UnionRef<'a> {
    variants: &'a [FieldType],
    tag_idx: usize,
    region: &'a [u8],
    payload_offset: usize,
    at: usize,
    self_contained: bool,
}

impl<'a> UnionRef<'a> {
    /// Active variant index.
    pub fn tag(&self) -> usize {
        self.tag_idx
    }

    pub fn variant_type(&self) -> &'a FieldType {
        &self.variants[self.tag_idx]
    }

    /// Nested view when the active variant is a struct.
    pub fn as_view(&self) -> Result<View<'a>> {
        let variant = self.variant_type();
        let FieldType::Struct(nested) = variant else {
            bail!(
                "active union variant is {}, not a struct",
                variant.kind_name()
            );
        };
        if let Some(size) = nested.fixed_size() {
            let span = take(self.region, self.payload_offset, size, self.at)?;
            Ok(View::from_fixed_region(span, nested, self.at + self.payload_offset))
        } else {
            let r = read_inline_ref(self.region, self.payload_offset, self.at)?;
            let span = span_check(
                self.region,
                r.offset() as usize,
                r.count() as usize,
                self.at,
            )?;
            View::new_nested(span, nested, self.at + r.offset() as usize)
        }
    }

    /// Materializes the union as an owning value.
    pub fn to_value(&self) -> Result<Value> {
        let variant = self.variant_type();
        let opts = DecodeOptions::default();
        let value = if self.self_contained && variant.is_variable() {
            let r = read_inline_ref(self.region, self.payload_offset, self.at)?;
            decode_payload(variant, self.region, r, self.at, &opts, 0, "union variant")?
        } else {
            decode_fixed(
                variant,
                self.region,
                self.payload_offset,
                &opts,
                self.at,
                "union variant",
            )?
        };
        Ok(Value::Union {
            tag: self.tag_idx,
            value: Box::new(value),
        })
    }
}

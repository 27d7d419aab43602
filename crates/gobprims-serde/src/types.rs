//! Type definitions as they travel on the wire.
//!
//! A definition message carries a `wireType`, itself a struct whose single
//! set field says which kind of type is being described:
//!
//! | field | index | payload |
//! |-------|-------|---------|
//! | `ArrayT`  | 0 | `arrayType  { CommonType, Elem, Len }` |
//! | `SliceT`  | 1 | `sliceType  { CommonType, Elem }` |
//! | `StructT` | 2 | `structType { CommonType, Field []fieldType }` |
//! | `MapT`    | 3 | `mapType    { CommonType, Key, Elem }` |
//!
//! Indices 4-6 describe custom marshaler types and are not supported.

use std::collections::HashMap;

use bytes::{Buf, BufMut};
use gobprims_wire::ids::{self, is_reserved, TypeId};
use gobprims_wire::{
    get_int, get_len, get_str, get_uint, put_int, put_str, put_uint, DEFAULT_MAX_MESSAGE,
};

use crate::error::{GobError, Result};

/// Name and id shared by every defined type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonType {
    pub name: String,
    pub id: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub common: CommonType,
    pub elem: TypeId,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceType {
    pub common: CommonType,
    pub elem: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub common: CommonType,
    pub fields: Vec<FieldType>,
}

/// One field of a struct definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldType {
    pub name: String,
    pub id: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapType {
    pub common: CommonType,
    pub key: TypeId,
    pub elem: TypeId,
}

/// A user-defined type, exactly one of the four describable kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    Array(ArrayType),
    Slice(SliceType),
    Struct(StructType),
    Map(MapType),
}

const ARRAY_T: i64 = 0;
const SLICE_T: i64 = 1;
const STRUCT_T: i64 = 2;
const MAP_T: i64 = 3;
const LAST_MARSHALER_T: i64 = 6;

impl WireType {
    pub fn common(&self) -> &CommonType {
        match self {
            WireType::Array(t) => &t.common,
            WireType::Slice(t) => &t.common,
            WireType::Struct(t) => &t.common,
            WireType::Map(t) => &t.common,
        }
    }

    pub fn id(&self) -> TypeId {
        self.common().id
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    /// Short name of the described kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WireType::Array(_) => "array",
            WireType::Slice(_) => "slice",
            WireType::Struct(_) => "struct",
            WireType::Map(_) => "map",
        }
    }

    /// Append the encoded `wireType` struct to `dst`.
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        let mut wire = Fields::new(dst);
        match self {
            WireType::Array(t) => {
                wire.next(ARRAY_T);
                let mut inner = Fields::new(&mut *wire.dst);
                inner.next(0);
                encode_common(&mut *inner.dst, &t.common);
                inner.int(1, t.elem);
                inner.int(2, t.len as i64);
                inner.finish();
            }
            WireType::Slice(t) => {
                wire.next(SLICE_T);
                let mut inner = Fields::new(&mut *wire.dst);
                inner.next(0);
                encode_common(&mut *inner.dst, &t.common);
                inner.int(1, t.elem);
                inner.finish();
            }
            WireType::Struct(t) => {
                wire.next(STRUCT_T);
                let mut inner = Fields::new(&mut *wire.dst);
                inner.next(0);
                encode_common(&mut *inner.dst, &t.common);
                if !t.fields.is_empty() {
                    inner.next(1);
                    put_uint(&mut *inner.dst, t.fields.len() as u64);
                    for field in &t.fields {
                        let mut f = Fields::new(&mut *inner.dst);
                        f.str(0, &field.name);
                        f.int(1, field.id);
                        f.finish();
                    }
                }
                inner.finish();
            }
            WireType::Map(t) => {
                wire.next(MAP_T);
                let mut inner = Fields::new(&mut *wire.dst);
                inner.next(0);
                encode_common(&mut *inner.dst, &t.common);
                inner.int(1, t.key);
                inner.int(2, t.elem);
                inner.finish();
            }
        }
        wire.finish();
    }

    /// Decode a `wireType` struct from `src`.
    pub fn decode<B: Buf>(src: &mut B) -> Result<Self> {
        let mut found = Vec::with_capacity(1);
        read_fields(src, "wireType", |src, index| {
            let wire = match index {
                ARRAY_T => {
                    let mut common = CommonType::default();
                    let (mut elem, mut len) = (0, 0);
                    read_fields(src, "arrayType", |src, index| {
                        match index {
                            0 => common = decode_common(src)?,
                            1 => elem = get_int(src)?,
                            2 => len = get_len_int(src)?,
                            _ => return Err(invalid_field("arrayType", index)),
                        }
                        Ok(())
                    })?;
                    WireType::Array(ArrayType { common, elem, len })
                }
                SLICE_T => {
                    let mut common = CommonType::default();
                    let mut elem = 0;
                    read_fields(src, "sliceType", |src, index| {
                        match index {
                            0 => common = decode_common(src)?,
                            1 => elem = get_int(src)?,
                            _ => return Err(invalid_field("sliceType", index)),
                        }
                        Ok(())
                    })?;
                    WireType::Slice(SliceType { common, elem })
                }
                STRUCT_T => {
                    let mut common = CommonType::default();
                    let mut fields = Vec::new();
                    read_fields(src, "structType", |src, index| {
                        match index {
                            0 => common = decode_common(src)?,
                            1 => fields = decode_field_list(src)?,
                            _ => return Err(invalid_field("structType", index)),
                        }
                        Ok(())
                    })?;
                    WireType::Struct(StructType { common, fields })
                }
                MAP_T => {
                    let mut common = CommonType::default();
                    let (mut key, mut elem) = (0, 0);
                    read_fields(src, "mapType", |src, index| {
                        match index {
                            0 => common = decode_common(src)?,
                            1 => key = get_int(src)?,
                            2 => elem = get_int(src)?,
                            _ => return Err(invalid_field("mapType", index)),
                        }
                        Ok(())
                    })?;
                    WireType::Map(MapType { common, key, elem })
                }
                4..=LAST_MARSHALER_T => return Err(GobError::Unsupported("custom marshaler types")),
                _ => return Err(invalid_field("wireType", index)),
            };
            found.push(wire);
            Ok(())
        })?;

        if found.len() != 1 {
            return Err(GobError::AmbiguousWireType);
        }
        found.pop().ok_or(GobError::AmbiguousWireType)
    }
}

/// Emits struct fields as `delta || value`, ending with a zero delta.
struct Fields<'a, B> {
    dst: &'a mut B,
    last: i64,
}

impl<'a, B: BufMut> Fields<'a, B> {
    fn new(dst: &'a mut B) -> Self {
        Self { dst, last: -1 }
    }

    fn next(&mut self, index: i64) {
        put_uint(self.dst, (index - self.last) as u64);
        self.last = index;
    }

    fn int(&mut self, index: i64, value: i64) {
        if value != 0 {
            self.next(index);
            put_int(self.dst, value);
        }
    }

    fn str(&mut self, index: i64, value: &str) {
        if !value.is_empty() {
            self.next(index);
            put_str(self.dst, value);
        }
    }

    fn finish(self) {
        put_uint(self.dst, 0);
    }
}

fn encode_common<B: BufMut>(dst: &mut B, common: &CommonType) {
    let mut fields = Fields::new(dst);
    fields.str(0, &common.name);
    fields.int(1, common.id);
    fields.finish();
}

/// Walk the `delta || value` pairs of one struct, calling `field` with the
/// absolute index of each. `field` must consume the value.
fn read_fields<B, F>(src: &mut B, type_name: &str, mut field: F) -> Result<()>
where
    B: Buf,
    F: FnMut(&mut B, i64) -> Result<()>,
{
    let mut index: i64 = -1;
    loop {
        let delta = get_uint(src)?;
        if delta == 0 {
            return Ok(());
        }
        index = i64::try_from(delta)
            .ok()
            .and_then(|delta| index.checked_add(delta))
            .ok_or_else(|| invalid_field(type_name, i64::MAX))?;
        field(src, index)?;
    }
}

fn decode_common<B: Buf>(src: &mut B) -> Result<CommonType> {
    let mut common = CommonType::default();
    read_fields(src, "commonType", |src, index| {
        match index {
            0 => common.name = get_str(src)?,
            1 => common.id = get_int(src)?,
            _ => return Err(invalid_field("commonType", index)),
        }
        Ok(())
    })?;
    Ok(common)
}

fn decode_field_list<B: Buf>(src: &mut B) -> Result<Vec<FieldType>> {
    let count = get_len(src)?;
    let mut fields = Vec::with_capacity(count.min(src.remaining()));
    for _ in 0..count {
        let mut field = FieldType::default();
        read_fields(src, "fieldType", |src, index| {
            match index {
                0 => field.name = get_str(src)?,
                1 => field.id = get_int(src)?,
                _ => return Err(invalid_field("fieldType", index)),
            }
            Ok(())
        })?;
        fields.push(field);
    }
    Ok(fields)
}

fn get_len_int<B: Buf>(src: &mut B) -> Result<usize> {
    let len = get_int(src)?;
    usize::try_from(len).map_err(|_| GobError::Message(format!("negative array length {len}")))
}

fn invalid_field(type_name: &str, index: i64) -> GobError {
    GobError::InvalidField {
        type_name: type_name.to_string(),
        index,
    }
}

/// What a type id resolves to when decoding a value.
#[derive(Debug, Clone, Copy)]
pub enum Kind<'a> {
    Bool,
    Int,
    Uint,
    Float,
    Bytes,
    String,
    Array(&'a ArrayType),
    Slice(&'a SliceType),
    Struct(&'a StructType),
    Map(&'a MapType),
}

/// Types received on one stream, keyed by id.
#[derive(Debug)]
pub struct TypeTable {
    types: HashMap<TypeId, WireType>,
    array_limit: usize,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::with_array_limit(DEFAULT_MAX_MESSAGE)
    }
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table that refuses array types longer than `limit` elements.
    ///
    /// Every element takes at least one byte on the wire, so a decoder
    /// passes its maximum message size.
    pub fn with_array_limit(limit: usize) -> Self {
        Self {
            types: HashMap::new(),
            array_limit: limit,
        }
    }

    /// Longest array type this table accepts.
    pub fn array_limit(&self) -> usize {
        self.array_limit
    }

    /// Register a definition received for `id`.
    pub fn define(&mut self, id: TypeId, wire: WireType) -> Result<()> {
        if is_reserved(id) {
            return Err(GobError::DefiningBuiltin(id));
        }
        if wire.id() != id {
            return Err(GobError::DefiningIdMismatch {
                id,
                declared: wire.id(),
            });
        }
        if self.types.contains_key(&id) {
            return Err(GobError::DuplicateType(id));
        }
        if let WireType::Array(t) = &wire {
            if t.len > self.array_limit {
                return Err(GobError::ArrayTooLong {
                    len: t.len,
                    limit: self.array_limit,
                });
            }
        }
        tracing::debug!(id, name = wire.name(), kind = wire.kind(), "type defined");
        self.types.insert(id, wire);
        Ok(())
    }

    pub fn get(&self, id: TypeId) -> Option<&WireType> {
        self.types.get(&id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve `id` to the kind of value it describes.
    pub fn kind(&self, id: TypeId) -> Result<Kind<'_>> {
        Ok(match id {
            ids::BOOL => Kind::Bool,
            ids::INT => Kind::Int,
            ids::UINT => Kind::Uint,
            ids::FLOAT => Kind::Float,
            ids::BYTE_SLICE => Kind::Bytes,
            ids::STRING => Kind::String,
            ids::COMPLEX => return Err(GobError::Unsupported("complex values")),
            ids::INTERFACE => return Err(GobError::Unsupported("interface values")),
            _ if id <= 0 => return Err(GobError::UndefinedType(id)),
            _ if is_reserved(id) => return Err(GobError::Unsupported("type descriptor values")),
            _ => match self.types.get(&id) {
                Some(WireType::Array(t)) => Kind::Array(t),
                Some(WireType::Slice(t)) => Kind::Slice(t),
                Some(WireType::Struct(t)) => Kind::Struct(t),
                Some(WireType::Map(t)) => Kind::Map(t),
                None => return Err(GobError::UndefinedType(id)),
            },
        })
    }

    /// Human-readable name for `id`, for diagnostics.
    pub fn describe(&self, id: TypeId) -> String {
        if let Some(name) = ids::type_name(id) {
            return name.to_string();
        }
        match self.types.get(&id) {
            Some(wire) => wire.name().to_string(),
            None => format!("type {id}"),
        }
    }
}

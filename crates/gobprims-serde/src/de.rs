use std::cell::Cell;
use std::io::Read;

use bytes::{Buf, Bytes};
use gobprims_wire::{
    get_bool, get_bytes, get_float, get_int, get_len, get_str, get_uint, MessageReader,
    TypeId, WireConfig, WireError,
};
use serde::de::value::SeqDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, IgnoredAny, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, Deserialize};

use crate::error::{GobError, Result};
use crate::types::{FieldType, Kind, StructType, TypeTable, WireType};
use crate::zero::ZeroDeserializer;

/// Deepest type nesting followed while decoding one value.
pub const MAX_DEPTH: usize = 128;

/// Reads a stream of self-describing values.
pub struct Decoder<R> {
    reader: MessageReader<R>,
    types: TypeTable,
}

impl<R: Read> Decoder<R> {
    /// Create a decoder with default wire configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create a decoder with explicit wire configuration.
    pub fn with_config(inner: R, config: WireConfig) -> Self {
        Self {
            types: TypeTable::with_array_limit(config.max_message_size),
            reader: MessageReader::with_config(inner, config),
        }
    }

    /// Decode the next value, absorbing any type definitions before it.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T> {
        loop {
            let mut message = self.reader.read_message()?;
            let id = get_int(&mut message)?;

            if id < 0 {
                let id = id.checked_neg().ok_or(GobError::UndefinedType(id))?;
                let wire = WireType::decode(&mut message)?;
                ensure_consumed(&message)?;
                self.types.define(id, wire)?;
                continue;
            }

            let kind = self.types.kind(id)?;
            if !matches!(kind, Kind::Struct(_)) {
                let delta = get_uint(&mut message)?;
                if delta != 0 {
                    return Err(GobError::CorruptSingleton(delta));
                }
            }
            tracing::trace!(id, ty = %self.types.describe(id), "decoding value");
            let value = T::deserialize(ValueDeserializer::new(&mut message, &self.types, id))?;
            ensure_consumed(&message)?;
            return Ok(value);
        }
    }

    /// Types defined on the stream so far.
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Consume the decoder and return the inner stream.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// Decode the first value of a stream held in memory.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Decoder::new(bytes).decode()
}

/// Decode the first value read from `reader`.
pub fn from_reader<R: Read, T: DeserializeOwned>(reader: R) -> Result<T> {
    Decoder::new(reader).decode()
}

/// Element count of a slice, array or map. Every element takes at least one
/// byte, so a count beyond the bytes left is corrupt.
fn get_count(src: &mut Bytes) -> Result<usize> {
    let count = get_len(src)?;
    if count > src.remaining() {
        return Err(WireError::CountOutOfRange(count as u64).into());
    }
    Ok(count)
}

fn ensure_consumed(message: &Bytes) -> Result<()> {
    match message.remaining() {
        0 => Ok(()),
        n => Err(GobError::TrailingData(n)),
    }
}

/// Deserializes one value of type `id` from the front of `src`.
pub(crate) struct ValueDeserializer<'a> {
    src: &'a mut Bytes,
    types: &'a TypeTable,
    id: TypeId,
    depth: usize,
}

impl<'a> ValueDeserializer<'a> {
    pub(crate) fn new(src: &'a mut Bytes, types: &'a TypeTable, id: TypeId) -> Self {
        Self {
            src,
            types,
            id,
            depth: 0,
        }
    }

    fn child(src: &'a mut Bytes, types: &'a TypeTable, id: TypeId, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(GobError::RecursionLimit(MAX_DEPTH));
        }
        Ok(Self {
            src,
            types,
            id,
            depth,
        })
    }
}

impl<'de, 'a> de::Deserializer<'de> for ValueDeserializer<'a> {
    type Error = GobError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let depth = self.depth + 1;
        match self.types.kind(self.id)? {
            Kind::Bool => visitor.visit_bool(get_bool(self.src)?),
            Kind::Int => visitor.visit_i64(get_int(self.src)?),
            Kind::Uint => visitor.visit_u64(get_uint(self.src)?),
            Kind::Float => visitor.visit_f64(get_float(self.src)?),
            Kind::String => visitor.visit_string(get_str(self.src)?),
            Kind::Bytes => {
                let bytes = get_bytes(self.src)?;
                let mut seq = SeqDeserializer::<_, GobError>::new(bytes.into_iter());
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            Kind::Slice(t) => {
                let len = get_count(self.src)?;
                let mut access = ElemAccess::new(self.src, self.types, t.elem, len, depth);
                let value = visitor.visit_seq(&mut access)?;
                access.drain()?;
                Ok(value)
            }
            Kind::Array(t) => {
                let len = get_count(self.src)?;
                if len != t.len {
                    return Err(GobError::LengthMismatch {
                        expected: t.len,
                        actual: len,
                    });
                }
                let mut access = ElemAccess::new(self.src, self.types, t.elem, len, depth);
                let value = visitor.visit_seq(&mut access)?;
                access.drain()?;
                Ok(value)
            }
            Kind::Map(t) => {
                let len = get_count(self.src)?;
                let mut access = EntryAccess {
                    src: self.src,
                    types: self.types,
                    key: t.key,
                    elem: t.elem,
                    remaining: len,
                    value_pending: false,
                    depth,
                };
                let value = visitor.visit_map(&mut access)?;
                access.drain()?;
                Ok(value)
            }
            Kind::Struct(t) => {
                let mut access = StructAccess::new(self.src, self.types, t, depth);
                let value = visitor.visit_map(&mut access)?;
                access.drain()?;
                Ok(value)
            }
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let types = self.types;
        match types.kind(self.id)? {
            Kind::Bytes => visitor.visit_byte_buf(get_bytes(self.src)?.to_vec()),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let types = self.types;
        match types.kind(self.id)? {
            Kind::Int => {
                let rune = get_int(self.src)?;
                let c = u32::try_from(rune)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| GobError::Message(format!("invalid rune {rune}")))?;
                visitor.visit_char(c)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        IgnoredAny::deserialize(self)?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        Err(GobError::Unsupported("enums"))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_any(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 str string
        seq tuple tuple_struct map struct identifier
    }
}

/// Elements of a slice or array.
struct ElemAccess<'a> {
    src: &'a mut Bytes,
    types: &'a TypeTable,
    elem: TypeId,
    remaining: usize,
    depth: usize,
}

impl<'a> ElemAccess<'a> {
    fn new(
        src: &'a mut Bytes,
        types: &'a TypeTable,
        elem: TypeId,
        remaining: usize,
        depth: usize,
    ) -> Self {
        Self {
            src,
            types,
            elem,
            remaining,
            depth,
        }
    }

    fn next(&mut self) -> Result<ValueDeserializer<'_>> {
        ValueDeserializer::child(&mut *self.src, self.types, self.elem, self.depth)
    }

    /// Skip elements the visitor did not ask for.
    fn drain(&mut self) -> Result<()> {
        while self.remaining > 0 {
            self.remaining -= 1;
            IgnoredAny::deserialize(self.next()?)?;
        }
        Ok(())
    }
}

impl<'de, 'a> de::SeqAccess<'de> for ElemAccess<'a> {
    type Error = GobError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(self.next()?).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Entries of a map.
struct EntryAccess<'a> {
    src: &'a mut Bytes,
    types: &'a TypeTable,
    key: TypeId,
    elem: TypeId,
    remaining: usize,
    value_pending: bool,
    depth: usize,
}

impl EntryAccess<'_> {
    fn drain(&mut self) -> Result<()> {
        if self.value_pending {
            self.value_pending = false;
            IgnoredAny::deserialize(ValueDeserializer::child(
                &mut *self.src,
                self.types,
                self.elem,
                self.depth,
            )?)?;
        }
        while self.remaining > 0 {
            self.remaining -= 1;
            for id in [self.key, self.elem] {
                IgnoredAny::deserialize(ValueDeserializer::child(
                    &mut *self.src,
                    self.types,
                    id,
                    self.depth,
                )?)?;
            }
        }
        Ok(())
    }
}

impl<'de, 'a> de::MapAccess<'de> for EntryAccess<'a> {
    type Error = GobError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let key = seed.deserialize(ValueDeserializer::child(
            &mut *self.src,
            self.types,
            self.key,
            self.depth,
        )?)?;
        self.value_pending = true;
        Ok(Some(key))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        self.value_pending = false;
        seed.deserialize(ValueDeserializer::child(
            &mut *self.src,
            self.types,
            self.elem,
            self.depth,
        )?)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Fields of a struct, presented as a map over every defined field.
///
/// Fields absent from the wire are produced as zero values.
struct StructAccess<'a> {
    src: &'a mut Bytes,
    types: &'a TypeTable,
    def: &'a StructType,
    /// Next defined field to present.
    index: usize,
    /// Index of the last field read off the wire.
    last: i64,
    /// Next field present on the wire, once its delta has been read.
    on_wire: Option<usize>,
    terminated: bool,
    /// Field whose value the visitor asks for next, and whether it is on the wire.
    current: Option<(TypeId, bool)>,
    depth: usize,
}

impl<'a> StructAccess<'a> {
    fn new(src: &'a mut Bytes, types: &'a TypeTable, def: &'a StructType, depth: usize) -> Self {
        Self {
            src,
            types,
            def,
            index: 0,
            last: -1,
            on_wire: None,
            terminated: false,
            current: None,
            depth,
        }
    }

    /// Index of the next field present on the wire, reading its delta if needed.
    fn peek_wire(&mut self) -> Result<Option<usize>> {
        if self.on_wire.is_none() && !self.terminated {
            let delta = get_uint(&mut *self.src)?;
            if delta == 0 {
                self.terminated = true;
            } else {
                let index = i64::try_from(delta)
                    .ok()
                    .and_then(|d| self.last.checked_add(d))
                    .filter(|&i| (i as u64) < self.def.fields.len() as u64)
                    .ok_or_else(|| GobError::InvalidField {
                        type_name: self.def.common.name.clone(),
                        index: self.last.saturating_add(delta.min(i64::MAX as u64) as i64),
                    })?;
                self.last = index;
                self.on_wire = Some(index as usize);
            }
        }
        Ok(self.on_wire)
    }

    fn field_value(&mut self, field: &FieldType) -> Result<ValueDeserializer<'_>> {
        ValueDeserializer::child(&mut *self.src, self.types, field.id, self.depth)
    }

    /// Skip whatever the visitor left unread, through the terminating zero.
    fn drain(&mut self) -> Result<()> {
        if let Some((id, true)) = self.current.take() {
            IgnoredAny::deserialize(ValueDeserializer::child(
                &mut *self.src,
                self.types,
                id,
                self.depth,
            )?)?;
        }
        while let Some(index) = self.peek_wire()? {
            self.on_wire = None;
            let def = self.def;
            IgnoredAny::deserialize(self.field_value(&def.fields[index])?)?;
        }
        Ok(())
    }
}

impl<'de, 'a> de::MapAccess<'de> for StructAccess<'a> {
    type Error = GobError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let def = self.def;
        while let Some(field) = def.fields.get(self.index) {
            let present = self.peek_wire()? == Some(self.index);
            self.index += 1;
            if present {
                self.on_wire = None;
            } else if self.types.kind(field.id).is_err() {
                // No zero value to offer for this field; leave it out.
                continue;
            }
            self.current = Some((field.id, present));
            return seed.deserialize(field.name.as_str().into_deserializer()).map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (id, present) = self
            .current
            .take()
            .ok_or_else(|| GobError::Message("struct value requested before its key".to_string()))?;
        if present {
            seed.deserialize(ValueDeserializer::child(
                &mut *self.src,
                self.types,
                id,
                self.depth,
            )?)
        } else {
            let budget = Cell::new(self.types.array_limit());
            seed.deserialize(ZeroDeserializer::new(self.types, id, self.depth, &budget))
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.def.fields.len().saturating_sub(self.index))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::encoder::{to_vec, Encoder};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Point {
        x: i64,
        y: i64,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Shape {
        name: String,
        corners: Vec<Point>,
        tags: HashMap<String, u32>,
        origin: Point,
        scale: f64,
        solid: bool,
        raw: Vec<u8>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct OnlyY {
        y: i64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct MaybePoint {
        x: Option<i64>,
        y: Option<i64>,
    }

    fn point_stream() -> Vec<u8> {
        let mut wire = vec![
            0x1f, 0xff, 0x81, 0x03, 0x01, 0x01, 0x05, b'P', b'o', b'i', b'n', b't', 0x01, 0xff,
            0x82, 0x00, 0x01, 0x02, 0x01, 0x01, b'X', 0x01, 0x04, 0x00, 0x01, 0x01, b'Y', 0x01,
            0x04, 0x00, 0x00, 0x00,
        ];
        wire.extend_from_slice(&[0x07, 0xff, 0x82, 0x01, 0x2c, 0x01, 0x42, 0x00]);
        wire
    }

    #[test]
    fn decodes_reference_point() {
        let point: Point = from_slice(&point_stream()).unwrap();
        assert_eq!(point, Point { x: 22, y: 33 });
    }

    #[test]
    fn round_trips_nested_struct() {
        let shape = Shape {
            name: "tri".to_string(),
            corners: vec![Point { x: 0, y: 0 }, Point { x: 4, y: 0 }, Point { x: 0, y: 3 }],
            tags: HashMap::from([("sides".to_string(), 3)]),
            origin: Point { x: -1, y: 1 },
            scale: 2.5,
            solid: true,
            raw: vec![0, 255, 7],
        };
        let wire = to_vec(&shape).unwrap();
        assert_eq!(from_slice::<Shape>(&wire).unwrap(), shape);
    }

    #[test]
    fn omitted_fields_decode_as_zero() {
        let shape = Shape {
            name: String::new(),
            corners: vec![Point { x: 1, y: 1 }],
            tags: HashMap::from([("a".to_string(), 0)]),
            origin: Point { x: 0, y: 0 },
            scale: 0.0,
            solid: false,
            raw: vec![1],
        };
        let wire = to_vec(&shape).unwrap();
        assert_eq!(from_slice::<Shape>(&wire).unwrap(), shape);
    }

    #[test]
    fn absent_fields_become_none() {
        let wire = to_vec(&Point { x: 0, y: 9 }).unwrap();
        let point: MaybePoint = from_slice(&wire).unwrap();
        assert_eq!(point, MaybePoint { x: None, y: Some(9) });
    }

    #[test]
    fn unknown_wire_fields_skipped() {
        let only: OnlyY = from_slice(&point_stream()).unwrap();
        assert_eq!(only, OnlyY { y: 33 });
    }

    #[test]
    fn decodes_consecutive_values() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.encode(&Point { x: 1, y: 2 }).unwrap();
        encoder.encode(&Point { x: 3, y: 4 }).unwrap();
        encoder.encode("tail").unwrap();
        let wire = encoder.into_inner();

        let mut decoder = Decoder::new(wire.as_slice());
        assert_eq!(decoder.decode::<Point>().unwrap(), Point { x: 1, y: 2 });
        assert_eq!(decoder.decode::<Point>().unwrap(), Point { x: 3, y: 4 });
        assert_eq!(decoder.decode::<String>().unwrap(), "tail");
        assert_eq!(decoder.types().len(), 1);
        assert!(matches!(
            decoder.decode::<Point>(),
            Err(GobError::Wire(gobprims_wire::WireError::EndOfStream))
        ));
    }

    #[test]
    fn arrays_and_chars() {
        let wire = to_vec(&[1u16, 2, 3]).unwrap();
        assert_eq!(from_slice::<[u16; 3]>(&wire).unwrap(), [1, 2, 3]);

        let wire = to_vec(&'é').unwrap();
        assert_eq!(from_slice::<char>(&wire).unwrap(), 'é');
    }

    #[test]
    fn array_length_checked() {
        // [2]int defined, value carries three elements.
        let mut wire = to_vec(&[5i64, 6]).unwrap();
        let value_at = wire.len() - 7;
        wire.truncate(value_at);
        wire.extend_from_slice(&[0x07, 0xff, 0x82, 0x00, 0x03, 0x02, 0x04, 0x06]);
        assert!(matches!(
            from_slice::<Vec<i64>>(&wire),
            Err(GobError::LengthMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn oversized_count_rejected() {
        // []int announcing 100 elements in a four-byte message.
        let mut wire = to_vec(&vec![1i64]).unwrap();
        let value_at = wire.len() - 6;
        wire.truncate(value_at);
        wire.extend_from_slice(&[0x05, 0xff, 0x82, 0x00, 0x64, 0x02]);
        assert!(matches!(
            from_slice::<Vec<i64>>(&wire),
            Err(GobError::Wire(WireError::CountOutOfRange(100)))
        ));
    }

    #[test]
    fn undefined_type_rejected() {
        let wire = [0x03, 0xff, 0x82, 0x00];
        assert!(matches!(
            from_slice::<Point>(&wire),
            Err(GobError::UndefinedType(65))
        ));
    }

    #[test]
    fn singleton_delta_checked() {
        let wire = [0x03, 0x04, 0x01, 0x0e];
        assert!(matches!(
            from_slice::<i64>(&wire),
            Err(GobError::CorruptSingleton(1))
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let wire = [0x04, 0x04, 0x00, 0x0e, 0x00];
        assert!(matches!(
            from_slice::<i64>(&wire),
            Err(GobError::TrailingData(1))
        ));
    }

    #[test]
    fn field_index_out_of_range() {
        let mut wire = point_stream();
        let len = wire.len();
        // Second delta jumps past field Y.
        wire[len - 3] = 0x05;
        assert!(matches!(
            from_slice::<Point>(&wire),
            Err(GobError::InvalidField { ref type_name, index: 5 }) if type_name == "Point"
        ));
    }

    #[test]
    fn duplicate_definition_rejected() {
        let mut wire = point_stream()[..32].to_vec();
        wire.extend_from_slice(&point_stream());
        assert!(matches!(
            from_slice::<Point>(&wire),
            Err(GobError::DuplicateType(65))
        ));
    }

    #[test]
    fn self_referential_type_bounded() {
        #[derive(Debug, Deserialize)]
        struct Loop {
            #[serde(rename = "Next")]
            _next: Box<Loop>,
        }

        // struct Loop { Next Loop } defined with id 65; every level asks
        // for the zero of the next.
        let def = [
            0x14, 0xff, 0x81, 0x03, 0x01, 0x01, 0x04, b'L', b'o', b'o', b'p', 0x01, 0xff, 0x82,
            0x00, 0x01, 0x01, 0x01, 0x04, b'N', b'e', b'x', b't', 0x01, 0xff, 0x82, 0x00, 0x00,
            0x00,
        ];
        let mut wire = def.to_vec();
        wire[0] = (def.len() - 1) as u8;
        wire.extend_from_slice(&[0x03, 0xff, 0x82, 0x00]);
        assert!(matches!(
            from_slice::<Loop>(&wire),
            Err(GobError::RecursionLimit(MAX_DEPTH))
        ));
    }

    #[test]
    fn absent_recursive_field_ignored() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct ValOnly {
            #[serde(rename = "Val")]
            val: i64,
        }

        // struct Node { Val int; Next *Node } with Next nil.
        let def = [
            0x00, 0xff, 0x81, 0x03, 0x01, 0x01, 0x04, b'N', b'o', b'd', b'e', 0x01, 0xff, 0x82,
            0x00, 0x01, 0x02, 0x01, 0x03, b'V', b'a', b'l', 0x01, 0x04, 0x00, 0x01, 0x04, b'N',
            b'e', b'x', b't', 0x01, 0xff, 0x82, 0x00, 0x00, 0x00,
        ];
        let mut wire = def.to_vec();
        wire[0] = (def.len() - 1) as u8;
        wire.extend_from_slice(&[0x05, 0xff, 0x82, 0x01, 0x0a, 0x00]);

        assert_eq!(from_slice::<ValOnly>(&wire).unwrap(), ValOnly { val: 5 });
        assert!(from_slice::<IgnoredAny>(&wire).is_ok());
    }

    /// struct H { A int; Big [N]int } with N given as an encoded int, then
    /// a value that sets only A.
    fn sparse_array_stream(len: &[u8]) -> Vec<u8> {
        let outer = vec![
            0x00, 0xff, 0x81, 0x03, 0x01, 0x01, 0x01, b'H', 0x01, 0xff, 0x82, 0x00, 0x01, 0x02,
            0x01, 0x01, b'A', 0x01, 0x04, 0x00, 0x01, 0x03, b'B', b'i', b'g', 0x01, 0xff, 0x84,
            0x00, 0x00, 0x00,
        ];
        let mut array = vec![
            0x00, 0xff, 0x83, 0x01, 0x01, 0x01, 0x03, b'B', b'i', b'g', 0x01, 0xff, 0x84, 0x00,
            0x01, 0x04, 0x01,
        ];
        array.extend_from_slice(len);
        array.extend_from_slice(&[0x00, 0x00]);

        let mut wire = Vec::new();
        for def in [outer, array] {
            let at = wire.len();
            wire.extend_from_slice(&def);
            wire[at] = (def.len() - 1) as u8;
        }
        wire.extend_from_slice(&[0x05, 0xff, 0x82, 0x01, 0x02, 0x00]);
        wire
    }

    #[test]
    fn absent_array_field_decodes_as_zeros() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "PascalCase")]
        struct H {
            a: i64,
            big: [i64; 3],
        }

        #[derive(Debug, Deserialize, PartialEq)]
        struct AOnly {
            #[serde(rename = "A")]
            a: i64,
        }

        let wire = sparse_array_stream(&[0x06]);
        assert_eq!(from_slice::<H>(&wire).unwrap(), H { a: 1, big: [0; 3] });
        assert_eq!(from_slice::<AOnly>(&wire).unwrap(), AOnly { a: 1 });
    }

    #[test]
    fn oversized_array_definition_rejected() {
        // [1<<40]int can never arrive in one message.
        let wire = sparse_array_stream(&[0xfa, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert!(matches!(
            from_slice::<HashMap<String, i64>>(&wire),
            Err(GobError::ArrayTooLong {
                len: 0x100_0000_0000,
                limit: gobprims_wire::DEFAULT_MAX_MESSAGE
            })
        ));
    }
}

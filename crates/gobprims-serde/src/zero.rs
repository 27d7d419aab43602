//! Zero values for struct fields the stream left out.
//!
//! Encoders omit zero-valued fields, so a field missing from the wire
//! stands for the zero of its declared type. Array zeros draw on a shared
//! element budget so nested definitions cannot expand without bound.

use std::cell::Cell;

use gobprims_wire::{TypeId, WireError};
use serde::de::{self, DeserializeSeed, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

use crate::de::MAX_DEPTH;
use crate::error::{GobError, Result};
use crate::types::{FieldType, Kind, TypeTable};

#[derive(Clone, Copy)]
pub(crate) struct ZeroDeserializer<'a> {
    types: &'a TypeTable,
    id: TypeId,
    depth: usize,
    budget: &'a Cell<usize>,
}

impl<'a> ZeroDeserializer<'a> {
    pub(crate) fn new(
        types: &'a TypeTable,
        id: TypeId,
        depth: usize,
        budget: &'a Cell<usize>,
    ) -> Self {
        Self {
            types,
            id,
            depth,
            budget,
        }
    }

    fn child(&self, id: TypeId) -> Self {
        Self::new(self.types, id, self.depth + 1, self.budget)
    }

    fn spend(&self, elems: usize) -> Result<()> {
        let left = self
            .budget
            .get()
            .checked_sub(elems)
            .ok_or(WireError::CountOutOfRange(elems as u64))?;
        self.budget.set(left);
        Ok(())
    }
}

impl<'de, 'a> de::Deserializer<'de> for ZeroDeserializer<'a> {
    type Error = GobError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.depth > MAX_DEPTH {
            return Err(GobError::RecursionLimit(MAX_DEPTH));
        }
        match self.types.kind(self.id)? {
            Kind::Bool => visitor.visit_bool(false),
            Kind::Int => visitor.visit_i64(0),
            Kind::Uint => visitor.visit_u64(0),
            Kind::Float => visitor.visit_f64(0.0),
            Kind::String => visitor.visit_str(""),
            Kind::Bytes | Kind::Slice(_) => visitor.visit_seq(ZeroElems {
                zero: self,
                remaining: 0,
            }),
            Kind::Array(t) => {
                self.spend(t.len)?;
                visitor.visit_seq(ZeroElems {
                    zero: self.child(t.elem),
                    remaining: t.len,
                })
            }
            Kind::Map(_) => visitor.visit_map(ZeroFields {
                parent: self,
                fields: &[],
                next: None,
            }),
            Kind::Struct(t) => visitor.visit_map(ZeroFields {
                parent: self,
                fields: &t.fields,
                next: None,
            }),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_none()
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.types.kind(self.id)? {
            Kind::Bytes => visitor.visit_bytes(&[]),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.types.kind(self.id)? {
            Kind::Int => visitor.visit_char('\0'),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    // Nothing on the wire to skip.
    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        Err(GobError::Unsupported("enums"))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 str string
        seq tuple tuple_struct map struct identifier
    }
}

/// `remaining` zero elements of one type.
struct ZeroElems<'a> {
    zero: ZeroDeserializer<'a>,
    remaining: usize,
}

impl<'de, 'a> de::SeqAccess<'de> for ZeroElems<'a> {
    type Error = GobError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(self.zero).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Every field of a struct at its zero value; with no fields, an empty map.
struct ZeroFields<'a> {
    parent: ZeroDeserializer<'a>,
    fields: &'a [FieldType],
    next: Option<TypeId>,
}

impl<'de, 'a> de::MapAccess<'de> for ZeroFields<'a> {
    type Error = GobError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        while let Some((field, rest)) = self.fields.split_first() {
            self.fields = rest;
            if self.parent.types.kind(field.id).is_err() {
                continue;
            }
            self.next = Some(field.id);
            return seed.deserialize(field.name.as_str().into_deserializer()).map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let id = self
            .next
            .take()
            .ok_or_else(|| GobError::Message("struct value requested before its key".to_string()))?;
        seed.deserialize(self.parent.child(id))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

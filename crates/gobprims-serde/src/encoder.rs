use std::io::Write;

use bytes::BytesMut;
use gobprims_wire::{
    put_bool, put_bytes, put_float, put_int, put_str, put_uint, MessageWriter, WireConfig,
};
use serde::Serialize;

use crate::error::{GobError, Result};
use crate::registry::Registry;
use crate::value::{Value, ValueSerializer};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes a stream of self-describing values.
///
/// Each value's type is defined on the stream the first time it is needed;
/// later values of the same type refer to it by id only.
pub struct Encoder<W> {
    writer: MessageWriter<W>,
    registry: Registry,
    buf: BytesMut,
}

impl<W: Write> Encoder<W> {
    /// Create an encoder with default wire configuration.
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create an encoder with explicit wire configuration.
    pub fn with_config(inner: W, config: WireConfig) -> Self {
        Self {
            writer: MessageWriter::with_config(inner, config),
            registry: Registry::default(),
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode one value, preceded by any type definitions it needs.
    ///
    /// Nothing is written if the value cannot be described. If a type
    /// definition fails to write, the types stay unsent and the next value
    /// that needs them defines them again.
    pub fn encode<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let value = value.serialize(ValueSerializer)?;
        if matches!(value, Value::Absent) {
            return Err(GobError::NilValue);
        }

        let committed = self.registry.clone();
        let (id, defs) = self.registry.prepare(&value)?;

        for wire in &defs {
            self.buf.clear();
            put_int(&mut self.buf, -wire.id());
            wire.encode(&mut self.buf);
            tracing::debug!(id = wire.id(), name = wire.name(), "sending type definition");
            if let Err(err) = self.writer.write_message(&self.buf) {
                self.registry = committed;
                return Err(err.into());
            }
        }

        self.buf.clear();
        put_int(&mut self.buf, id);
        if !matches!(value, Value::Struct { .. }) {
            put_uint(&mut self.buf, 0);
        }
        encode_value(&value, &mut self.buf);
        tracing::trace!(id, len = self.buf.len(), "sending value");
        self.writer.write_message(&self.buf)?;
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        self.writer.get_mut()
    }

    /// Consume the encoder and return the inner stream.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// Encode a single value into a fresh stream.
pub fn to_vec<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.encode(value)?;
    Ok(encoder.into_inner())
}

fn encode_value(value: &Value, dst: &mut BytesMut) {
    match value {
        Value::Bool(b) => put_bool(dst, *b),
        Value::Int(i) => put_int(dst, *i),
        Value::Uint(u) => put_uint(dst, *u),
        Value::Byte(b) => put_uint(dst, u64::from(*b)),
        Value::Float(f) => put_float(dst, *f),
        Value::Bytes(b) => put_bytes(dst, b),
        Value::String(s) => put_str(dst, s),
        Value::Seq(elems) | Value::Array(elems) => {
            put_uint(dst, elems.len() as u64);
            for elem in elems {
                encode_value(elem, dst);
            }
        }
        Value::Map(entries) => {
            put_uint(dst, entries.len() as u64);
            for (key, elem) in entries {
                encode_value(key, dst);
                encode_value(elem, dst);
            }
        }
        Value::Struct { fields, .. } => {
            let mut last = -1i64;
            for (index, (_, field)) in fields.iter().enumerate() {
                if field.is_zero() {
                    continue;
                }
                let index = index as i64;
                put_uint(dst, (index - last) as u64);
                last = index;
                encode_value(field, dst);
            }
            put_uint(dst, 0);
        }
        // Only reachable as a struct field, which `is_zero` skips.
        Value::Absent => {}
    }
}

//! Primitive encodings and message framing for the gob wire format.
//!
//! A gob stream is a sequence of messages. Every message is:
//! - An unsigned-integer byte count for the rest of the message
//! - A signed-integer type id (negative: a type definition follows)
//! - The encoded definition or value
//!
//! This crate owns the byte-level layer only. Type definitions and the
//! serde integration live in `gobprims-serde`.

pub mod codec;
pub mod error;
pub mod ids;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_message, encode_message, get_bool, get_bytes, get_float, get_int, get_len, get_str,
    get_uint, put_bool, put_bytes, put_float, put_int, put_str, put_uint, WireConfig,
    DEFAULT_MAX_MESSAGE, MAX_UINT_BYTES,
};
pub use error::{Result, WireError};
pub use ids::{type_name, TypeId, FIRST_USER_ID};
pub use reader::MessageReader;
pub use writer::MessageWriter;

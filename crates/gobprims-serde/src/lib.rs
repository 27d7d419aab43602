//! Self-describing gob streams for serde data types.
//!
//! [`Encoder`] defines each type on the stream the first time a value of it
//! is sent, then writes values that refer to it by id. [`Decoder`] absorbs
//! those definitions and maps values back onto `Deserialize` types,
//! filling in fields the sender omitted with their zero values.
//!
//! Named structs map to gob structs, `Vec<u8>` to byte slices, other
//! sequences to slices, tuples and fixed arrays to arrays, and maps to maps.
//! Enums and `()` have no gob representation.

mod de;
mod encoder;
mod error;
mod registry;
pub mod types;
mod value;
mod zero;

pub use de::{from_reader, from_slice, Decoder, MAX_DEPTH};
pub use encoder::{to_vec, Encoder};
pub use error::{GobError, Result};
pub use types::{TypeTable, WireType};

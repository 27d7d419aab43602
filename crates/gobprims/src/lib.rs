//! Self-describing binary encoding of Rust records.
//!
//! gobprims writes values as a stream of messages that carry their own type
//! definitions, so a reader needs no separately distributed schema. The wire
//! format is compatible with Go's `encoding/gob`.
//!
//! # Crate Structure
//!
//! - [`wire`]: primitive encodings, message framing, built-in type ids
//! - [`codec`]: type definitions, serde-driven [`codec::Encoder`] and [`codec::Decoder`]
//! - [`record`]: the sample `Example` record
//! - [`write_sample`] / [`write_record`]: encode a record into a file

pub mod record;
mod write;

/// Re-export wire types.
pub mod wire {
    pub use gobprims_wire::*;
}

/// Re-export encoder and decoder types.
pub mod codec {
    pub use gobprims_serde::*;
}

pub use record::{sample, Example, Point};
pub use write::{write_record, write_sample, WriteError, DEFAULT_OUTPUT};

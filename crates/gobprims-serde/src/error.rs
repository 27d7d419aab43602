use std::fmt;

use gobprims_wire::TypeId;

/// Errors that can occur while encoding or decoding gob values.
#[derive(Debug, thiserror::Error)]
pub enum GobError {
    /// Wire-level error (primitives, framing, I/O).
    #[error(transparent)]
    Wire(#[from] gobprims_wire::WireError),

    /// Error reported by a `Serialize` or `Deserialize` implementation.
    #[error("{0}")]
    Message(String),

    /// The data model has no representation in the gob format.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// A value only ever carried `None` or empty containers, so its
    /// element type is unknown.
    #[error("cannot determine the type of {0}")]
    IndeterminateType(String),

    /// Two values of the same named struct disagree on its layout.
    #[error("conflicting definitions for struct {0}")]
    ShapeConflict(String),

    /// Elements of one sequence or map have different types.
    #[error("sequence elements have different types")]
    MixedSequence,

    /// A top-level `None` was passed to the encoder.
    #[error("cannot encode nil value")]
    NilValue,

    /// A sequence, array or map holds a `None` element.
    #[error("cannot encode nil element")]
    NilElement,

    /// A value references a type id that was never defined.
    #[error("type id {0} is not defined")]
    UndefinedType(TypeId),

    /// The stream tried to redefine a type id.
    #[error("duplicate definition for type id {0}")]
    DuplicateType(TypeId),

    /// The stream tried to define a reserved id.
    #[error("type id {0} is reserved")]
    DefiningBuiltin(TypeId),

    /// A definition message names a different id than its body.
    #[error("definition for type id {id} carries id {declared}")]
    DefiningIdMismatch { id: TypeId, declared: TypeId },

    /// A `wireType` sets no variant or more than one.
    #[error("type definition must describe exactly one kind")]
    AmbiguousWireType,

    /// A struct value refers to a field index its definition does not have.
    #[error("field index {index} out of range for {type_name}")]
    InvalidField { type_name: String, index: i64 },

    /// Array element count differs from its definition.
    #[error("array length mismatch (expected {expected}, got {actual})")]
    LengthMismatch { expected: usize, actual: usize },

    /// An array type is longer than any message could carry.
    #[error("array length {len} exceeds limit {limit}")]
    ArrayTooLong { len: usize, limit: usize },

    /// A non-struct value did not start with a zero delta.
    #[error("non-zero delta {0} before singleton value")]
    CorruptSingleton(u64),

    /// Bytes left over in a message after its value was decoded.
    #[error("{0} trailing bytes after value")]
    TrailingData(usize),

    /// Type definitions nest deeper than the decoder will follow.
    #[error("type nesting exceeds {0} levels")]
    RecursionLimit(usize),
}

impl serde::ser::Error for GobError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        GobError::Message(msg.to_string())
    }
}

impl serde::de::Error for GobError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        GobError::Message(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GobError>;

//! Built-in type ids.
//!
//! Ids 1-8 name the basic types, 16-23 the types used to describe other
//! types. Ids below 65 are reserved; streams allocate user types from 65 up.

/// Identifier of a type within one stream.
pub type TypeId = i64;

pub const BOOL: TypeId = 1;
pub const INT: TypeId = 2;
pub const UINT: TypeId = 3;
pub const FLOAT: TypeId = 4;
pub const BYTE_SLICE: TypeId = 5;
pub const STRING: TypeId = 6;
pub const COMPLEX: TypeId = 7;
pub const INTERFACE: TypeId = 8;

pub const WIRE_TYPE: TypeId = 16;
pub const ARRAY_TYPE: TypeId = 17;
pub const COMMON_TYPE: TypeId = 18;
pub const SLICE_TYPE: TypeId = 19;
pub const STRUCT_TYPE: TypeId = 20;
pub const FIELD_TYPE: TypeId = 21;
pub const FIELD_TYPE_SLICE: TypeId = 22;
pub const MAP_TYPE: TypeId = 23;

/// First id handed out to user-defined types.
pub const FIRST_USER_ID: TypeId = 65;

/// Returns the Go spelling of a built-in type id, if it is one.
pub fn type_name(id: TypeId) -> Option<&'static str> {
    Some(match id {
        BOOL => "bool",
        INT => "int",
        UINT => "uint",
        FLOAT => "float64",
        BYTE_SLICE => "[]uint8",
        STRING => "string",
        COMPLEX => "complex128",
        INTERFACE => "interface",
        WIRE_TYPE => "wireType",
        ARRAY_TYPE => "arrayType",
        COMMON_TYPE => "commonType",
        SLICE_TYPE => "sliceType",
        STRUCT_TYPE => "structType",
        FIELD_TYPE => "fieldType",
        FIELD_TYPE_SLICE => "[]fieldType",
        MAP_TYPE => "mapType",
        _ => return None,
    })
}

/// Returns true if the id is in the reserved range.
pub fn is_reserved(id: TypeId) -> bool {
    id < FIRST_USER_ID
}

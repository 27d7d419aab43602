//! Encoder-side type inference and id allocation.
//!
//! Shapes are inferred from a [`Value`] tree. Struct layouts are recorded
//! by name, so a later value of the same struct can fill in fields that an
//! earlier one left empty, and definitions refer to each other by name
//! rather than by nesting.

use std::collections::HashMap;

use gobprims_wire::ids::{self, TypeId, FIRST_USER_ID};

use crate::error::{GobError, Result};
use crate::types::{ArrayType, CommonType, FieldType, MapType, SliceType, StructType, WireType};
use crate::value::Value;

/// Inferred type of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Shape {
    /// Seen only as `None` or inside empty containers so far.
    Unknown,
    Bool,
    Int,
    Uint,
    Float,
    Bytes,
    String,
    Slice(Box<Shape>),
    Array(Box<Shape>, usize),
    Map(Box<Shape>, Box<Shape>),
    Struct(&'static str),
}

impl Shape {
    fn is_known(&self) -> bool {
        match self {
            Shape::Unknown => false,
            Shape::Slice(elem) | Shape::Array(elem, _) => elem.is_known(),
            Shape::Map(key, elem) => key.is_known() && elem.is_known(),
            _ => true,
        }
    }

    /// Go spelling, used as the name of unnamed composite types.
    fn go_name(&self) -> String {
        match self {
            Shape::Unknown => "?".to_string(),
            Shape::Bool => "bool".to_string(),
            Shape::Int => "int".to_string(),
            Shape::Uint => "uint".to_string(),
            Shape::Float => "float64".to_string(),
            Shape::Bytes => "[]uint8".to_string(),
            Shape::String => "string".to_string(),
            Shape::Slice(elem) => format!("[]{}", elem.go_name()),
            Shape::Array(elem, len) => format!("[{len}]{}", elem.go_name()),
            Shape::Map(key, elem) => format!("map[{}]{}", key.go_name(), elem.go_name()),
            Shape::Struct(name) => (*name).to_string(),
        }
    }
}

/// Combine two observations of the same slot, `None` if they disagree.
fn unify(a: &Shape, b: &Shape) -> Option<Shape> {
    match (a, b) {
        (Shape::Unknown, other) | (other, Shape::Unknown) => Some(other.clone()),
        (Shape::Bytes, Shape::Slice(elem)) | (Shape::Slice(elem), Shape::Bytes)
            if **elem == Shape::Unknown =>
        {
            Some(Shape::Bytes)
        }
        (Shape::Slice(x), Shape::Slice(y)) => Some(Shape::Slice(Box::new(unify(x, y)?))),
        (Shape::Array(x, n), Shape::Array(y, m)) if n == m => {
            Some(Shape::Array(Box::new(unify(x, y)?), *n))
        }
        (Shape::Map(k1, v1), Shape::Map(k2, v2)) => Some(Shape::Map(
            Box::new(unify(k1, k2)?),
            Box::new(unify(v1, v2)?),
        )),
        _ if a == b => Some(a.clone()),
        _ => None,
    }
}

/// Insert `wire` ahead of the definitions of its children.
fn place(defs: &mut Vec<WireType>, slot: usize, wire: WireType) -> TypeId {
    let id = wire.id();
    defs.insert(slot, wire);
    id
}

#[derive(Debug, Clone)]
struct StructDef {
    fields: Vec<(&'static str, Shape)>,
    id: Option<TypeId>,
}

/// Types known to one encoder stream.
#[derive(Debug, Clone)]
pub(crate) struct Registry {
    structs: HashMap<&'static str, StructDef>,
    composites: HashMap<Shape, TypeId>,
    next_id: TypeId,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            structs: HashMap::new(),
            composites: HashMap::new(),
            next_id: FIRST_USER_ID,
        }
    }
}

impl Registry {
    /// Resolve the type id of `value`, returning the definitions that must
    /// precede it on the stream, parents before children.
    ///
    /// On error the registry is left as it was.
    pub(crate) fn prepare(&mut self, value: &Value) -> Result<(TypeId, Vec<WireType>)> {
        let snapshot = self.clone();
        let result = self.infer(value).and_then(|shape| {
            if !shape.is_known() {
                return Err(GobError::IndeterminateType("top-level value".to_string()));
            }
            let mut defs = Vec::new();
            let id = self.assign(&shape, &mut defs)?;
            Ok((id, defs))
        });
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    fn infer(&mut self, value: &Value) -> Result<Shape> {
        Ok(match value {
            Value::Bool(_) => Shape::Bool,
            Value::Int(_) => Shape::Int,
            Value::Uint(_) | Value::Byte(_) => Shape::Uint,
            Value::Float(_) => Shape::Float,
            Value::Bytes(_) => Shape::Bytes,
            Value::String(_) => Shape::String,
            Value::Absent => Shape::Unknown,
            Value::Seq(elems) => Shape::Slice(Box::new(self.infer_elems(elems)?)),
            Value::Array(elems) => Shape::Array(Box::new(self.infer_elems(elems)?), elems.len()),
            Value::Map(entries) => {
                let mut key = Shape::Unknown;
                let mut elem = Shape::Unknown;
                for (k, v) in entries {
                    key = unify(&key, &self.infer_elem(k)?).ok_or(GobError::MixedSequence)?;
                    elem = unify(&elem, &self.infer_elem(v)?).ok_or(GobError::MixedSequence)?;
                }
                Shape::Map(Box::new(key), Box::new(elem))
            }
            Value::Struct { name, fields } => self.infer_struct(*name, fields)?,
        })
    }

    fn infer_elem(&mut self, value: &Value) -> Result<Shape> {
        if matches!(value, Value::Absent) {
            return Err(GobError::NilElement);
        }
        self.infer(value)
    }

    fn infer_elems(&mut self, elems: &[Value]) -> Result<Shape> {
        let mut shape = Shape::Unknown;
        for elem in elems {
            shape = unify(&shape, &self.infer_elem(elem)?).ok_or(GobError::MixedSequence)?;
        }
        Ok(shape)
    }

    fn infer_struct(
        &mut self,
        name: &'static str,
        fields: &[(&'static str, Value)],
    ) -> Result<Shape> {
        let mut shapes = Vec::with_capacity(fields.len());
        for (field, value) in fields {
            shapes.push((*field, self.infer(value)?));
        }

        let conflict = || GobError::ShapeConflict(name.to_string());
        match self.structs.get_mut(name) {
            None => {
                self.structs.insert(name, StructDef { fields: shapes, id: None });
            }
            Some(def) => {
                if def.fields.len() != shapes.len() {
                    return Err(conflict());
                }
                for ((known_name, known), (field, seen)) in def.fields.iter_mut().zip(&shapes) {
                    if *known_name != *field {
                        return Err(conflict());
                    }
                    let merged = unify(known, seen).ok_or_else(conflict)?;
                    if def.id.is_some() && merged != *known {
                        return Err(conflict());
                    }
                    *known = merged;
                }
            }
        }
        Ok(Shape::Struct(name))
    }

    fn alloc(&mut self) -> TypeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Id for `shape`, appending any definitions not yet sent to `defs`.
    fn assign(&mut self, shape: &Shape, defs: &mut Vec<WireType>) -> Result<TypeId> {
        if let Some(&id) = self.composites.get(shape) {
            return Ok(id);
        }
        Ok(match shape {
            Shape::Unknown => return Err(GobError::IndeterminateType("element".to_string())),
            Shape::Bool => ids::BOOL,
            Shape::Int => ids::INT,
            Shape::Uint => ids::UINT,
            Shape::Float => ids::FLOAT,
            Shape::Bytes => ids::BYTE_SLICE,
            Shape::String => ids::STRING,
            Shape::Struct(name) => return self.assign_struct(*name, defs),
            Shape::Slice(elem) => {
                let (common, slot) = self.reserve(shape, defs);
                let elem = self.assign(elem, defs)?;
                place(defs, slot, WireType::Slice(SliceType { common, elem }))
            }
            Shape::Array(elem, len) => {
                let (common, slot) = self.reserve(shape, defs);
                let elem = self.assign(elem, defs)?;
                place(
                    defs,
                    slot,
                    WireType::Array(ArrayType {
                        common,
                        elem,
                        len: *len,
                    }),
                )
            }
            Shape::Map(key, elem) => {
                let (common, slot) = self.reserve(shape, defs);
                let key = self.assign(key, defs)?;
                let elem = self.assign(elem, defs)?;
                place(defs, slot, WireType::Map(MapType { common, key, elem }))
            }
        })
    }

    /// Claim an id for an unnamed composite and the position of its definition.
    fn reserve(&mut self, shape: &Shape, defs: &[WireType]) -> (CommonType, usize) {
        let id = self.alloc();
        self.composites.insert(shape.clone(), id);
        let common = CommonType {
            name: shape.go_name(),
            id,
        };
        (common, defs.len())
    }

    fn assign_struct(&mut self, name: &'static str, defs: &mut Vec<WireType>) -> Result<TypeId> {
        let fields = match self.structs.get(name) {
            Some(StructDef { id: Some(id), .. }) => return Ok(*id),
            Some(def) => def.fields.clone(),
            None => return Err(GobError::ShapeConflict(name.to_string())),
        };

        // Claim the id before visiting fields so self-references resolve.
        let id = self.alloc();
        if let Some(def) = self.structs.get_mut(name) {
            def.id = Some(id);
        }
        let slot = defs.len();
        let mut wire_fields = Vec::with_capacity(fields.len());
        for (field, shape) in &fields {
            if !shape.is_known() {
                return Err(GobError::IndeterminateType(format!("field {field} of {name}")));
            }
            wire_fields.push(FieldType {
                name: (*field).to_string(),
                id: self.assign(shape, defs)?,
            });
        }

        tracing::debug!(id, name, fields = wire_fields.len(), "struct type assigned");
        Ok(place(
            defs,
            slot,
            WireType::Struct(StructType {
                common: CommonType {
                    name: name.to_string(),
                    id,
                },
                fields: wire_fields,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: i64, y: i64) -> Value {
        Value::Struct {
            name: "Point",
            fields: vec![("X", Value::Int(x)), ("Y", Value::Int(y))],
        }
    }

    fn line(points: Vec<Value>, label: Value) -> Value {
        Value::Struct {
            name: "Line",
            fields: vec![("Points", Value::Seq(points)), ("Label", label)],
        }
    }

    #[test]
    fn builtins_need_no_definitions() {
        let mut registry = Registry::default();
        let (id, defs) = registry.prepare(&Value::String("x".into())).unwrap();
        assert_eq!(id, ids::STRING);
        assert!(defs.is_empty());

        let (id, defs) = registry.prepare(&Value::Bytes(vec![1])).unwrap();
        assert_eq!(id, ids::BYTE_SLICE);
        assert!(defs.is_empty());
    }

    #[test]
    fn parent_defined_before_children() {
        let mut registry = Registry::default();
        let (id, defs) = registry
            .prepare(&line(vec![point(1, 2)], Value::String("l".into())))
            .unwrap();

        assert_eq!(id, 65);
        let order: Vec<(TypeId, &str)> = defs.iter().map(|d| (d.id(), d.name())).collect();
        assert_eq!(order, vec![(65, "Line"), (66, "[]Point"), (67, "Point")]);
    }

    #[test]
    fn definitions_sent_once() {
        let mut registry = Registry::default();
        let (_, defs) = registry.prepare(&point(1, 2)).unwrap();
        assert_eq!(defs.len(), 1);

        let (id, defs) = registry.prepare(&point(3, 4)).unwrap();
        assert_eq!(id, 65);
        assert!(defs.is_empty());
    }

    #[test]
    fn empty_field_is_indeterminate() {
        let mut registry = Registry::default();
        let err = registry
            .prepare(&line(Vec::new(), Value::Absent))
            .unwrap_err();
        assert!(matches!(err, GobError::IndeterminateType(ref what) if what.contains("Line")));

        // Nothing was recorded, so a complete value still defines from 65.
        let (id, defs) = registry
            .prepare(&line(vec![point(1, 1)], Value::String("l".into())))
            .unwrap();
        assert_eq!(id, 65);
        assert_eq!(defs.len(), 3);
    }

    #[test]
    fn later_values_reuse_known_layout() {
        let mut registry = Registry::default();
        registry
            .prepare(&line(vec![point(1, 1)], Value::String("l".into())))
            .unwrap();

        let (id, defs) = registry.prepare(&line(Vec::new(), Value::Absent)).unwrap();
        assert_eq!(id, 65);
        assert!(defs.is_empty());
    }

    #[test]
    fn mixed_sequences_rejected() {
        let mut registry = Registry::default();
        let err = registry
            .prepare(&Value::Seq(vec![Value::Int(1), Value::String("a".into())]))
            .unwrap_err();
        assert!(matches!(err, GobError::MixedSequence));

        let err = registry
            .prepare(&Value::Seq(vec![Value::Absent]))
            .unwrap_err();
        assert!(matches!(err, GobError::NilElement));
    }

    #[test]
    fn conflicting_struct_layouts_rejected() {
        let mut registry = Registry::default();
        registry.prepare(&point(1, 2)).unwrap();

        let other = Value::Struct {
            name: "Point",
            fields: vec![("X", Value::String("a".into())), ("Y", Value::Int(1))],
        };
        assert!(matches!(
            registry.prepare(&other),
            Err(GobError::ShapeConflict(ref name)) if name == "Point"
        ));
    }

    #[test]
    fn composite_names() {
        let mut registry = Registry::default();
        let value = Value::Map(vec![(
            Value::String("k".into()),
            Value::Array(vec![Value::Float(1.0), Value::Float(2.0)]),
        )]);
        let (id, defs) = registry.prepare(&value).unwrap();
        assert_eq!(id, 65);
        let names: Vec<&str> = defs.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["map[string][2]float64", "[2]float64"]);
    }

    #[test]
    fn empty_slice_unifies_with_bytes() {
        assert_eq!(
            unify(&Shape::Slice(Box::new(Shape::Unknown)), &Shape::Bytes),
            Some(Shape::Bytes)
        );
        assert_eq!(unify(&Shape::Int, &Shape::Uint), None);
    }
}

//! # Model Schemas
//!
//! Wraps the JSON Schema of a model and resolves references lazily, one
//! level at a time. Lazy resolution is what lets recursive models (a tree
//! node holding `Option<Box<Node>>`) be edited: a definition is only
//! expanded when the form actually needs its fields.
//!
//! `schemars` 0.8 stores shared types under `#/definitions/`, newer drafts
//! under `#/$defs/`; both are understood. Field-level metadata (description,
//! default, title) may wrap a reference in a single-element `allOf`; the
//! outer keys are merged over the referenced definition.
//!
//! `schemars` describes fixed-width integers with a `format` (`uint8`,
//! `int32`, ...) and at most a `minimum`. Loading a schema adds the range
//! of each such format as `minimum`/`maximum`, so an overflowing value is a
//! schema error like any other and is reported together with the rest.

use schemars::JsonSchema;
use serde_json::{Map, Value};

use crate::core::error::FormError;

/// Keys that only make sense on the wrapper and are dropped when merging.
const WRAPPER_KEYS: [&str; 2] = ["$ref", "allOf"];

/// Upper bound on chained references (`A -> B -> C`) before giving up.
const MAX_REF_CHAIN: usize = 32;

/// The JSON Schema of one model plus its definition table.
#[derive(Clone, Debug)]
pub struct ModelSchema {
    root: Value,
    definitions: Map<String, Value>,
}

/// A schema fragment with references resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub schema: Value,
    /// Name of the last definition the fragment pointed at.
    pub definition: Option<String>,
}

impl ModelSchema {
    /// Generate the schema of `T` with `schemars`.
    pub fn of<T: JsonSchema>() -> Result<Self, FormError> {
        let root = schemars::schema_for!(T);
        let value = serde_json::to_value(&root)
            .map_err(|e| FormError::Schema(format!("cannot serialize schema: {e}")))?;
        Self::from_value(value)
    }

    /// Use a hand-written (or externally generated) JSON Schema.
    pub fn from_value(mut root: Value) -> Result<Self, FormError> {
        bound_integer_formats(&mut root);
        let Some(object) = root.as_object() else {
            return Err(FormError::Schema("root schema must be a JSON object".into()));
        };

        let mut definitions = Map::new();
        for key in ["definitions", "$defs"] {
            if let Some(defs) = object.get(key).and_then(Value::as_object) {
                for (name, def) in defs {
                    definitions.insert(name.clone(), def.clone());
                }
            }
        }

        Ok(Self { root, definitions })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    /// Title of the model, falling back to `"Form"`.
    pub fn title(&self) -> &str {
        self.root
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Form")
    }

    /// Follow `$ref` and single-element `allOf` wrappers until a concrete
    /// fragment is reached.
    pub fn resolve(&self, fragment: &Value) -> Result<Resolved, FormError> {
        let mut current = fragment.clone();
        let mut definition = None;

        for _ in 0..MAX_REF_CHAIN {
            let target = match reference_of(&current) {
                Some(Reference::Ref(pointer)) => {
                    let (name, target) = self.lookup(&pointer)?;
                    if name.is_some() {
                        definition = name;
                    }
                    target
                }
                Some(Reference::AllOf(inner)) => inner,
                None => return Ok(Resolved { schema: current, definition }),
            };
            current = merge_wrapper(&current, target);
        }

        Err(FormError::Schema(format!(
            "reference chain longer than {MAX_REF_CHAIN} in {fragment}"
        )))
    }

    /// Build a standalone schema for `fragment` that still resolves the
    /// model's definitions. Used to validate one variant of a union.
    pub fn standalone(&self, fragment: &Value) -> Value {
        if !fragment.is_object() {
            return fragment.clone();
        }
        // Draft 7 ignores keywords next to `$ref`, so the fragment is
        // wrapped rather than extended.
        let mut schema = Map::new();
        if let Some(version) = self.root.get("$schema") {
            schema.insert("$schema".into(), version.clone());
        }
        for key in ["definitions", "$defs"] {
            if let Some(defs) = self.root.get(key) {
                schema.insert(key.into(), defs.clone());
            }
        }
        schema.insert("allOf".into(), Value::Array(vec![fragment.clone()]));
        Value::Object(schema)
    }

    fn lookup(&self, pointer: &str) -> Result<(Option<String>, Value), FormError> {
        if pointer == "#" {
            return Ok((None, self.root.clone()));
        }
        let name = pointer
            .strip_prefix("#/definitions/")
            .or_else(|| pointer.strip_prefix("#/$defs/"))
            .ok_or_else(|| FormError::Schema(format!("unsupported reference `{pointer}`")))?;
        let target = self
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| FormError::Schema(format!("definition not found: `{name}`")))?;
        Ok((Some(name.to_string()), target))
    }
}

/// Range of the integer formats `schemars` emits. `uint`/`int` are
/// `usize`/`isize`, taken as 64-bit.
fn integer_format_range(format: &str) -> Option<(Value, Value)> {
    let range = match format {
        "uint8" => (Value::from(u8::MIN), Value::from(u8::MAX)),
        "int8" => (Value::from(i8::MIN), Value::from(i8::MAX)),
        "uint16" => (Value::from(u16::MIN), Value::from(u16::MAX)),
        "int16" => (Value::from(i16::MIN), Value::from(i16::MAX)),
        "uint32" => (Value::from(u32::MIN), Value::from(u32::MAX)),
        "int32" => (Value::from(i32::MIN), Value::from(i32::MAX)),
        "uint64" | "uint" => (Value::from(u64::MIN), Value::from(u64::MAX)),
        "int64" | "int" => (Value::from(i64::MIN), Value::from(i64::MAX)),
        _ => return None,
    };
    Some(range)
}

fn is_integer_type(fragment: &Map<String, Value>) -> bool {
    match fragment.get("type") {
        Some(Value::String(ty)) => ty == "integer",
        Some(Value::Array(types)) => types.iter().any(|ty| ty == "integer"),
        _ => false,
    }
}

/// Add the range of every integer `format` as `minimum`/`maximum`, keeping
/// bounds the schema already declares.
fn bound_integer_formats(fragment: &mut Value) {
    match fragment {
        Value::Object(object) => {
            let range = object
                .get("format")
                .and_then(Value::as_str)
                .and_then(integer_format_range)
                .filter(|_| is_integer_type(object));
            if let Some((min, max)) = range {
                object.entry("minimum").or_insert(min);
                object.entry("maximum").or_insert(max);
            }
            object.values_mut().for_each(bound_integer_formats);
        }
        Value::Array(items) => items.iter_mut().for_each(bound_integer_formats),
        _ => {}
    }
}

enum Reference {
    Ref(String),
    AllOf(Value),
}

fn reference_of(fragment: &Value) -> Option<Reference> {
    if let Some(pointer) = fragment.get("$ref").and_then(Value::as_str) {
        return Some(Reference::Ref(pointer.to_string()));
    }
    match fragment.get("allOf").and_then(Value::as_array) {
        Some(parts) if parts.len() == 1 => Some(Reference::AllOf(parts[0].clone())),
        _ => None,
    }
}

/// Overlay the wrapper's own keys (description, default, ...) on the target.
fn merge_wrapper(wrapper: &Value, target: Value) -> Value {
    let (Some(outer), Value::Object(mut inner)) = (wrapper.as_object(), target) else {
        return wrapper.clone();
    };
    for (key, value) in outer {
        if WRAPPER_KEYS.contains(&key.as_str()) {
            continue;
        }
        // The definition's own title names the type; field labels are read
        // from the unresolved fragment instead.
        if key == "title" && inner.contains_key("title") {
            continue;
        }
        inner.insert(key.clone(), value.clone());
    }
    Value::Object(inner)
}

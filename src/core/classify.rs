//! # Annotation Classifier
//!
//! Decides which rendering strategy applies to one field's declared type.
//! The result is a closed set: every annotation maps to exactly one
//! `Classification`, or is rejected with `FormError::UnsupportedAnnotation`.
//!
//! | Classification | JSON Schema shape                                   |
//! |----------------|-----------------------------------------------------|
//! | `Scalar`       | `type: string / integer / number / boolean`         |
//! | `Enumeration`  | named `enum` (or `oneOf` of single-value members)    |
//! | `LiteralSet`   | unnamed `enum`, `const`, `type: null`               |
//! | `Union`        | `oneOf` / `anyOf` / multi-`type` arrays             |
//! | `NestedModel`  | `type: object` with `properties`                    |
//! | `Collection`   | `type: array` with a single `items` schema          |
//!
//! Classification is pure: it reads the schema and never builds widgets.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::core::descriptor::FieldPath;
use crate::core::error::FormError;
use crate::core::schema::ModelSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Integer,
    Number,
    Boolean,
}

/// The tag of a `Classification`, used as a registry key and in config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationKind {
    Text,
    Integer,
    Number,
    Boolean,
    Enumeration,
    LiteralSet,
    Union,
    NestedModel,
    Collection,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 9] = [
        AnnotationKind::Text,
        AnnotationKind::Integer,
        AnnotationKind::Number,
        AnnotationKind::Boolean,
        AnnotationKind::Enumeration,
        AnnotationKind::LiteralSet,
        AnnotationKind::Union,
        AnnotationKind::NestedModel,
        AnnotationKind::Collection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKind::Text => "text",
            AnnotationKind::Integer => "integer",
            AnnotationKind::Number => "number",
            AnnotationKind::Boolean => "boolean",
            AnnotationKind::Enumeration => "enumeration",
            AnnotationKind::LiteralSet => "literal_set",
            AnnotationKind::Union => "union",
            AnnotationKind::NestedModel => "nested_model",
            AnnotationKind::Collection => "collection",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnotationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown annotation kind `{s}`"))
    }
}

/// One property of a nested model, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: String,
    /// The property's schema fragment, unresolved.
    pub schema: Value,
    pub required: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    Scalar(ScalarKind),
    Enumeration { name: String, members: Vec<Value> },
    LiteralSet(Vec<Value>),
    /// Unresolved variant fragments, in declaration order.
    Union(Vec<Value>),
    NestedModel {
        name: Option<String>,
        properties: Vec<Property>,
    },
    Collection { items: Value, unique: bool },
}

impl Classification {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Classification::Scalar(ScalarKind::Text) => AnnotationKind::Text,
            Classification::Scalar(ScalarKind::Integer) => AnnotationKind::Integer,
            Classification::Scalar(ScalarKind::Number) => AnnotationKind::Number,
            Classification::Scalar(ScalarKind::Boolean) => AnnotationKind::Boolean,
            Classification::Enumeration { .. } => AnnotationKind::Enumeration,
            Classification::LiteralSet(_) => AnnotationKind::LiteralSet,
            Classification::Union(_) => AnnotationKind::Union,
            Classification::NestedModel { .. } => AnnotationKind::NestedModel,
            Classification::Collection { .. } => AnnotationKind::Collection,
        }
    }
}

/// Output of `classify`: the classification plus the resolved fragment it
/// was derived from.
#[derive(Clone, Debug, PartialEq)]
pub struct Classified {
    pub classification: Classification,
    pub resolved: Value,
    pub definition: Option<String>,
}

/// Classify the annotation of the field at `field`.
pub fn classify(
    schema: &ModelSchema,
    field: &FieldPath,
    annotation: &Value,
) -> Result<Classified, FormError> {
    let resolved = schema
        .resolve(annotation)
        .map_err(|_| FormError::unsupported(field, annotation))?;
    let classification =
        classify_resolved(schema, field, &resolved.schema, resolved.definition.as_deref())?;
    Ok(Classified {
        classification,
        resolved: resolved.schema,
        definition: resolved.definition,
    })
}

fn classify_resolved(
    schema: &ModelSchema,
    field: &FieldPath,
    fragment: &Value,
    definition: Option<&str>,
) -> Result<Classification, FormError> {
    let Some(object) = fragment.as_object() else {
        return Err(FormError::unsupported(field, fragment));
    };
    let name = definition
        .map(str::to_string)
        .or_else(|| object.get("title").and_then(Value::as_str).map(str::to_string));

    if let Some(literal) = object.get("const") {
        return Ok(Classification::LiteralSet(vec![literal.clone()]));
    }

    if let Some(members) = object.get("enum").and_then(Value::as_array) {
        return Ok(literal_classification(name, members.clone()));
    }

    for key in ["oneOf", "anyOf"] {
        if let Some(variants) = object.get(key).and_then(Value::as_array) {
            return classify_variants(schema, field, variants, name);
        }
    }

    match object.get("type") {
        Some(Value::String(ty)) => classify_type(field, fragment, ty, name),
        Some(Value::Array(types)) => match types.as_slice() {
            [Value::String(ty)] => classify_type(field, fragment, ty, name),
            [] => Err(FormError::unsupported(field, fragment)),
            _ => {
                // `["string", "null"]`: one variant per listed type.
                let variants = types
                    .iter()
                    .map(|ty| {
                        let mut variant = object.clone();
                        variant.insert("type".into(), ty.clone());
                        for key in ["default", "title", "description"] {
                            variant.remove(key);
                        }
                        Value::Object(variant)
                    })
                    .collect();
                Ok(Classification::Union(variants))
            }
        },
        Some(_) => Err(FormError::unsupported(field, fragment)),
        None if object.contains_key("properties") => classify_object(field, fragment, name),
        None => Err(FormError::unsupported(field, fragment)),
    }
}

fn classify_type(
    field: &FieldPath,
    fragment: &Value,
    ty: &str,
    name: Option<String>,
) -> Result<Classification, FormError> {
    match ty {
        "string" => Ok(Classification::Scalar(ScalarKind::Text)),
        "integer" => Ok(Classification::Scalar(ScalarKind::Integer)),
        "number" => Ok(Classification::Scalar(ScalarKind::Number)),
        "boolean" => Ok(Classification::Scalar(ScalarKind::Boolean)),
        "null" => Ok(Classification::LiteralSet(vec![Value::Null])),
        "object" => classify_object(field, fragment, name),
        "array" => match fragment.get("items") {
            Some(items @ Value::Object(_)) => Ok(Classification::Collection {
                items: items.clone(),
                unique: fragment.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false),
            }),
            // Tuples (`items` as an array) and untyped arrays have no single
            // entry widget.
            _ => Err(FormError::unsupported(field, fragment)),
        },
        _ => Err(FormError::unsupported(field, fragment)),
    }
}

fn classify_object(
    field: &FieldPath,
    fragment: &Value,
    name: Option<String>,
) -> Result<Classification, FormError> {
    let properties = fragment.get("properties").and_then(Value::as_object);
    let open_map = match fragment.get("additionalProperties") {
        None | Some(Value::Bool(false)) => false,
        Some(_) => true,
    };

    // Maps (`HashMap<String, T>`) have no fixed field set.
    if properties.is_none() && open_map {
        return Err(FormError::unsupported(field, fragment));
    }

    let required: Vec<&str> = fragment
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let properties = properties
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| Property {
                    name: name.clone(),
                    schema: schema.clone(),
                    required: required.contains(&name.as_str()),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Classification::NestedModel { name, properties })
}

fn classify_variants(
    schema: &ModelSchema,
    field: &FieldPath,
    variants: &[Value],
    name: Option<String>,
) -> Result<Classification, FormError> {
    if let [single] = variants {
        return classify(schema, field, single).map(|c| c.classification);
    }
    if variants.is_empty() {
        return Err(FormError::unsupported(field, &Value::Array(Vec::new())));
    }

    // A union whose every variant is a fixed value is really an enumeration.
    let mut members = Vec::new();
    for variant in variants {
        let resolved = schema
            .resolve(variant)
            .map_err(|_| FormError::unsupported(field, variant))?;
        match literal_members(&resolved.schema) {
            Some(values) => members.extend(values),
            None => return Ok(Classification::Union(variants.to_vec())),
        }
    }
    Ok(literal_classification(name, members))
}

/// Values a fragment admits when it admits only a fixed set.
fn literal_members(fragment: &Value) -> Option<Vec<Value>> {
    if let Some(literal) = fragment.get("const") {
        return Some(vec![literal.clone()]);
    }
    if let Some(members) = fragment.get("enum").and_then(Value::as_array) {
        return Some(members.clone());
    }
    match fragment.get("type") {
        Some(Value::String(ty)) if ty == "null" => Some(vec![Value::Null]),
        _ => None,
    }
}

fn literal_classification(name: Option<String>, members: Vec<Value>) -> Classification {
    match name {
        Some(name) if members.iter().all(Value::is_string) => {
            Classification::Enumeration { name, members }
        }
        _ => Classification::LiteralSet(members),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn model() -> ModelSchema {
        ModelSchema::from_value(json!({
            "type": "object",
            "definitions": {
                "Colors": { "type": "string", "enum": ["blue", "red"] },
                "Level": {
                    "oneOf": [
                        { "type": "string", "enum": ["low"] },
                        { "type": "string", "enum": ["high"] }
                    ]
                },
                "Engine": {
                    "title": "Engine",
                    "type": "object",
                    "required": ["power"],
                    "properties": {
                        "power": { "type": "integer" },
                        "label": { "type": "string" }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn kind_of(annotation: Value) -> AnnotationKind {
        classify(&model(), &FieldPath::parse("field"), &annotation)
            .unwrap()
            .classification
            .kind()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(kind_of(json!({ "type": "string" })), AnnotationKind::Text);
        assert_eq!(kind_of(json!({ "type": "integer", "format": "int64" })), AnnotationKind::Integer);
        assert_eq!(kind_of(json!({ "type": "number" })), AnnotationKind::Number);
        assert_eq!(kind_of(json!({ "type": "boolean" })), AnnotationKind::Boolean);
    }

    #[test]
    fn test_named_enum_is_enumeration() {
        let classified = classify(
            &model(),
            &FieldPath::parse("color"),
            &json!({ "$ref": "#/definitions/Colors" }),
        )
        .unwrap();
        assert_eq!(
            classified.classification,
            Classification::Enumeration {
                name: "Colors".into(),
                members: vec![json!("blue"), json!("red")],
            }
        );
        assert_eq!(classified.definition.as_deref(), Some("Colors"));
    }

    #[test]
    fn test_one_of_single_values_is_enumeration() {
        assert_eq!(
            kind_of(json!({ "$ref": "#/definitions/Level" })),
            AnnotationKind::Enumeration
        );
    }

    #[test]
    fn test_unnamed_enum_and_const_are_literal_sets() {
        assert_eq!(kind_of(json!({ "enum": [1, 2, 3] })), AnnotationKind::LiteralSet);
        assert_eq!(kind_of(json!({ "const": "fixed" })), AnnotationKind::LiteralSet);
        assert_eq!(kind_of(json!({ "type": "null" })), AnnotationKind::LiteralSet);
    }

    #[test]
    fn test_optional_enum_collapses_to_literal_set() {
        let classified = classify(
            &model(),
            &FieldPath::parse("color"),
            &json!({ "anyOf": [{ "$ref": "#/definitions/Colors" }, { "type": "null" }] }),
        )
        .unwrap();
        assert_eq!(
            classified.classification,
            Classification::LiteralSet(vec![json!("blue"), json!("red"), Value::Null])
        );
    }

    #[test]
    fn test_type_array_is_union() {
        let classified = classify(
            &model(),
            &FieldPath::parse("nickname"),
            &json!({ "type": ["string", "null"], "default": null }),
        )
        .unwrap();
        assert_eq!(
            classified.classification,
            Classification::Union(vec![json!({ "type": "string" }), json!({ "type": "null" })])
        );
    }

    #[test]
    fn test_any_of_mixed_is_union() {
        assert_eq!(
            kind_of(json!({ "anyOf": [{ "type": "integer" }, { "$ref": "#/definitions/Colors" }] })),
            AnnotationKind::Union
        );
    }

    #[test]
    fn test_single_variant_unwraps() {
        assert_eq!(
            kind_of(json!({ "anyOf": [{ "type": "integer" }] })),
            AnnotationKind::Integer
        );
    }

    #[test]
    fn test_nested_model_keeps_declaration_order() {
        let classified = classify(
            &model(),
            &FieldPath::parse("engine"),
            &json!({ "$ref": "#/definitions/Engine" }),
        )
        .unwrap();
        let Classification::NestedModel { name, properties } = classified.classification else {
            panic!("expected nested model");
        };
        assert_eq!(name.as_deref(), Some("Engine"));
        let names: Vec<_> = properties.iter().map(|p| (p.name.as_str(), p.required)).collect();
        assert_eq!(names, vec![("power", true), ("label", false)]);
    }

    #[test]
    fn test_collection() {
        let classified = classify(
            &model(),
            &FieldPath::parse("tags"),
            &json!({ "type": "array", "items": { "type": "string" }, "uniqueItems": true }),
        )
        .unwrap();
        assert_eq!(
            classified.classification,
            Classification::Collection {
                items: json!({ "type": "string" }),
                unique: true,
            }
        );
    }

    #[test]
    fn test_unsupported_annotations_name_the_field() {
        let unsupported = [
            json!({ "type": "object", "additionalProperties": { "type": "integer" } }),
            json!({ "type": "array", "items": [{ "type": "string" }, { "type": "integer" }] }),
            json!({}),
            json!(true),
            json!({ "type": "tuple" }),
            json!({ "$ref": "#/definitions/Missing" }),
        ];
        for annotation in unsupported {
            let err = classify(&model(), &FieldPath::parse("extras.map"), &annotation).unwrap_err();
            match err {
                FormError::UnsupportedAnnotation { field, .. } => {
                    assert_eq!(field.to_string(), "extras.map");
                }
                other => panic!("unexpected error for {annotation}: {other}"),
            }
        }
    }

    #[test]
    fn test_kind_names_parse() {
        for kind in AnnotationKind::ALL {
            assert_eq!(kind.as_str().parse::<AnnotationKind>(), Ok(kind));
        }
        assert!("widget".parse::<AnnotationKind>().is_err());
    }
}

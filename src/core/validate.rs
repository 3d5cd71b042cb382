//! # Validation Bridge
//!
//! Turns a session into either a validated instance or a set of field
//! errors. Validation itself is delegated:
//!
//! 1. the collected document is checked against the model's JSON Schema
//!    with `jsonschema`, collecting every error
//! 2. if that passes, `serde` constructs the instance; a failure there is
//!    reported at the path `serde_path_to_error` tracked
//!
//! Errors are attached to the deepest node whose path covers them and the
//! session stays open. Nothing here evaluates a rule on its own.

use std::collections::BTreeSet;
use std::fmt;

use jsonschema::error::ValidationErrorKind;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_path_to_error::Segment;

use crate::core::descriptor::FieldPath;
use crate::core::form::FormSession;
use crate::core::widget::{VariantTarget, Widget};

/// How many nested union refinements a single error may go through.
const MAX_REFINEMENT_DEPTH: usize = 8;

const REQUIRED_MESSAGE: &str = "field required";
const NO_VARIANT_MESSAGE: &str = "does not match any of the allowed variants";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub path: FieldPath,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The errors of one rejected submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Every path that carries at least one error.
    pub fn fields(&self) -> BTreeSet<FieldPath> {
        self.errors.iter().map(|e| e.path.clone()).collect()
    }

    pub fn for_field<'a>(&'a self, path: &'a FieldPath) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| &e.path == path)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate the session's document and construct `T` from it.
///
/// Previous errors are cleared first; on failure the new ones are attached
/// to the session's nodes (or its form-level errors for the model root).
pub fn validate<T: DeserializeOwned>(session: &mut FormSession) -> Result<T, ValidationErrors> {
    session.clear_errors();
    let document = session.document();
    debug!("Validating {}", document);

    let mut errors = schema_errors(session, &document);
    if errors.is_empty() {
        match construct::<T>(document) {
            Ok(instance) => return Ok(instance),
            Err(error) => errors.push(error),
        }
    }

    info!("Validation found {} errors", errors.len());
    for error in &errors {
        attach(session, error);
    }
    Err(ValidationErrors { errors })
}

fn attach(session: &mut FormSession, error: &FieldError) {
    match session.root_mut().closest_mut(&error.path) {
        Some(node) if !node.path().is_root() => {
            // Errors below a leaf (a key inside a JSON entry) keep their
            // relative location in the message.
            let message = if node.path() == &error.path {
                error.message.clone()
            } else {
                format!("{}: {}", error.path, error.message)
            };
            node.errors.push(message);
        }
        _ => session.push_form_error(error.message.clone()),
    }
}

// ============================================================================
// Schema check
// ============================================================================

fn schema_errors(session: &FormSession, document: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check(
        session,
        session.schema().root(),
        document,
        &FieldPath::root(),
        MAX_REFINEMENT_DEPTH,
        &mut errors,
    );
    errors
}

fn check(
    session: &FormSession,
    schema: &Value,
    instance: &Value,
    base: &FieldPath,
    depth: usize,
    errors: &mut Vec<FieldError>,
) {
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => {
            errors.push(FieldError {
                path: base.clone(),
                message: format!("invalid schema: {e}"),
            });
            return;
        }
    };

    for error in validator.iter_errors(instance) {
        let relative = FieldPath::from_json_pointer(error.instance_path.as_str());
        let path = relative.rebased(&FieldPath::root(), base);
        match &error.kind {
            ValidationErrorKind::Required { property } => {
                let name = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                errors.push(FieldError {
                    path: path.child(&name),
                    message: REQUIRED_MESSAGE.to_string(),
                });
            }
            ValidationErrorKind::AnyOf | ValidationErrorKind::OneOfNotValid => {
                let before = errors.len();
                if depth > 0 {
                    refine(session, &path, &error.instance, depth - 1, errors);
                }
                if errors.len() == before {
                    errors.push(FieldError {
                        path,
                        message: NO_VARIANT_MESSAGE.to_string(),
                    });
                }
            }
            _ => errors.push(FieldError {
                path,
                message: error.to_string(),
            }),
        }
    }
}

/// Explain a union failure in terms of the variant the user picked.
fn refine(
    session: &FormSession,
    path: &FieldPath,
    instance: &Value,
    depth: usize,
    errors: &mut Vec<FieldError>,
) {
    let Some(node) = session.find_by(path, &|w| matches!(w, Widget::Variant(_))) else {
        return;
    };
    let Widget::Variant(selector) = &node.widget else {
        return;
    };
    let Some(VariantTarget::Schema { schema, tag }) = selector.selected_option().map(|o| &o.target)
    else {
        return;
    };

    let standalone = session.schema().standalone(schema);
    match tag {
        Some(tag) => {
            if let Some(inner) = instance.get(tag) {
                check(session, &standalone, inner, &path.child(tag), depth, errors);
            }
        }
        None => check(session, &standalone, instance, path, depth, errors),
    }
}

// ============================================================================
// Construction
// ============================================================================

fn construct<T: DeserializeOwned>(document: Value) -> Result<T, FieldError> {
    serde_path_to_error::deserialize::<_, T>(document).map_err(|err| {
        let mut path = FieldPath::root();
        for segment in err.path().iter() {
            path = match segment {
                Segment::Seq { index } => path.index(*index),
                Segment::Map { key } => path.child(key),
                Segment::Enum { variant } => path.child(variant),
                Segment::Unknown => path,
            };
        }
        let message = err.inner().to_string();
        match missing_field(&message) {
            Some(field) => FieldError {
                path: path.child(field),
                message: REQUIRED_MESSAGE.to_string(),
            },
            None => FieldError { path, message },
        }
    })
}

/// The field named by serde's "missing field `x`" message.
fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

//! Errors raised while building or running a form.
//!
//! Validation failures are not errors in this sense: they are returned as
//! `ValidationErrors` and keep the session open.

use thiserror::Error;

use crate::core::descriptor::FieldPath;

#[derive(Debug, Error)]
pub enum FormError {
    /// A field's type has neither a registered nor a default widget.
    #[error("unsupported annotation for field `{field}`: {annotation}")]
    UnsupportedAnnotation { field: FieldPath, annotation: String },

    /// A union offers both free text and string literals, so typed text
    /// could match a literal as well.
    #[error("field `{field}` mixes free text with string literals; use an enum instead")]
    AmbiguousUnion { field: FieldPath },

    #[error("field `{field}` is nested deeper than {limit} levels")]
    RecursionLimit { field: FieldPath, limit: usize },

    /// The schema itself is malformed (bad reference, non-object root, ...).
    #[error("schema error: {0}")]
    Schema(String),

    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormError {
    pub(crate) fn unsupported(field: &FieldPath, annotation: &serde_json::Value) -> Self {
        FormError::UnsupportedAnnotation {
            field: field.clone(),
            annotation: annotation.to_string(),
        }
    }
}

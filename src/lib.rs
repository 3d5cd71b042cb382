//! tickform: terminal forms generated from model schemas.
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize, JsonSchema)]
//! struct Person {
//!     name: String,
//!     #[serde(default)]
//!     age: i64,
//! }
//!
//! let form = Form::<Person>::new(FormConfig::default())?;
//! match tickform::tui::run(form)? {
//!     FormOutcome::Accepted(person) => println!("{}", person.name),
//!     FormOutcome::Aborted => println!("cancelled"),
//! }
//! ```

pub mod core;
pub mod tui;

#[cfg(test)]
pub mod test_support;

pub use crate::core::action::{Action, Effect};
pub use crate::core::config::{ConfigError, FormConfig};
pub use crate::core::descriptor::{FieldDescriptor, FieldPath};
pub use crate::core::error::FormError;
pub use crate::core::model::{Form, FormOutcome, Model, Submission};
pub use crate::core::registry::{WidgetKey, WidgetRegistry};
pub use crate::core::validate::{FieldError, ValidationErrors};

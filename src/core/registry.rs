//! # Widget Registry
//!
//! Lookup table from an annotation to the constructor of its widget.
//!
//! Constructors are registered under a `WidgetKey` before the form is
//! built; the last registration for a key wins. Lookup goes from the most
//! to the least specific key:
//!
//! 1. `Definition(name)`: the schema definition the field references
//! 2. `Format(format)`: the field's `format` (`date`, `uint16`, ...)
//! 3. `Kind(kind)`: the field's classification
//! 4. the built-in default table (`builtin::default_widget`)
//!
//! Definition and format constructors also see fields the classifier
//! rejects, so a custom widget can support a type the defaults cannot.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::core::classify::AnnotationKind;
use crate::core::config::{FormConfig, WidgetChoice};
use crate::core::descriptor::FieldDescriptor;
use crate::core::error::FormError;
use crate::core::form::FormBuilder;
use crate::core::widget::{Prefill, Widget};

/// Builds the widget for one field.
///
/// The builder gives access to the schema and config and builds nested
/// nodes for containers.
pub type WidgetConstructor = Arc<
    dyn Fn(&FieldDescriptor, Prefill<'_>, &mut FormBuilder<'_>) -> Result<Widget, FormError>
        + Send
        + Sync,
>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WidgetKey {
    Kind(AnnotationKind),
    Definition(String),
    Format(String),
}

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    constructors: HashMap<WidgetKey, WidgetConstructor>,
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("keys", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the config's `[widgets]` overrides installed.
    pub fn from_config(config: &FormConfig) -> Self {
        let mut registry = Self::new();
        for (&kind, &choice) in &config.widgets {
            registry.register_constructor(WidgetKey::Kind(kind), builtin::for_choice(choice));
        }
        registry
    }

    /// Register `constructor` under `key`, replacing any earlier one.
    pub fn register<F>(&mut self, key: WidgetKey, constructor: F) -> &mut Self
    where
        F: Fn(&FieldDescriptor, Prefill<'_>, &mut FormBuilder<'_>) -> Result<Widget, FormError>
            + Send
            + Sync
            + 'static,
    {
        self.register_constructor(key, Arc::new(constructor))
    }

    /// Register an already boxed constructor under `key`.
    pub fn register_constructor(&mut self, key: WidgetKey, constructor: WidgetConstructor) -> &mut Self {
        debug!("Registering widget constructor for {:?}", key);
        self.constructors.insert(key, constructor);
        self
    }

    pub fn contains(&self, key: &WidgetKey) -> bool {
        self.constructors.contains_key(key)
    }

    /// The most specific registered constructor for `descriptor`, if any.
    pub fn lookup(&self, descriptor: &FieldDescriptor) -> Option<&WidgetConstructor> {
        self.specific(descriptor.definition.as_deref(), descriptor.format.as_deref())
            .or_else(|| {
                let kind = descriptor.classification.as_ref()?.kind();
                self.constructors.get(&WidgetKey::Kind(kind))
            })
    }

    /// Constructor registered for a definition name or format.
    pub fn specific(&self, definition: Option<&str>, format: Option<&str>) -> Option<&WidgetConstructor> {
        let by_definition = definition
            .and_then(|name| self.constructors.get(&WidgetKey::Definition(name.to_string())));
        by_definition.or_else(|| {
            format.and_then(|format| self.constructors.get(&WidgetKey::Format(format.to_string())))
        })
    }
}

/// The default widget table and the constructors behind `[widgets]`.
pub mod builtin {
    use serde_json::Value;

    use super::*;
    use crate::core::classify::{Classification, ScalarKind};
    use crate::core::widget::{ChoiceList, ChoiceOption, SubForm, TextEntry, TextKind};

    /// | Classification              | Widget                   |
    /// |-----------------------------|--------------------------|
    /// | `Scalar(Text/Integer/Number)` | `TextEntry`            |
    /// | `Scalar(Boolean)`           | `ChoiceList` True/False  |
    /// | `Enumeration`, `LiteralSet` | `ChoiceList`             |
    /// | `Union`                     | `VariantSelector`        |
    /// | `NestedModel`               | `SubForm`                |
    /// | `Collection`                | `ListEditor`             |
    pub fn default_widget(
        descriptor: &FieldDescriptor,
        prefill: Prefill<'_>,
        builder: &mut FormBuilder<'_>,
    ) -> Result<Widget, FormError> {
        let Some(classification) = &descriptor.classification else {
            return Err(FormError::unsupported(&descriptor.path, &descriptor.annotation));
        };
        match classification {
            Classification::Scalar(ScalarKind::Text) => {
                Ok(Widget::Text(TextEntry::prefilled(TextKind::Text, prefill)))
            }
            Classification::Scalar(ScalarKind::Integer) => {
                Ok(Widget::Text(TextEntry::prefilled(TextKind::Integer, prefill)))
            }
            Classification::Scalar(ScalarKind::Number) => {
                Ok(Widget::Text(TextEntry::prefilled(TextKind::Number, prefill)))
            }
            Classification::Scalar(ScalarKind::Boolean)
            | Classification::Enumeration { .. }
            | Classification::LiteralSet(_) => Ok(choice(descriptor, prefill, builder)),
            Classification::Union(variants) => {
                let selector = builder.variant_selector(descriptor, variants, prefill)?;
                Ok(Widget::Variant(selector))
            }
            Classification::NestedModel { properties, .. } => {
                let (value, _) = crate::core::widget::evaluate(prefill.value, prefill.default, Value::is_object);
                let fields = builder.fields(&descriptor.path, properties, value.as_ref())?;
                Ok(Widget::Form(SubForm { fields }))
            }
            Classification::Collection { items, unique } => {
                let list = builder.list_editor(descriptor, items, *unique, prefill)?;
                Ok(Widget::List(list))
            }
        }
    }

    /// Option list for booleans, enumerations and literal sets.
    fn choice(descriptor: &FieldDescriptor, prefill: Prefill<'_>, builder: &FormBuilder<'_>) -> Widget {
        let options = match &descriptor.classification {
            Some(Classification::Scalar(ScalarKind::Boolean)) => {
                let labels = builder.config().boolean_labels_for(&descriptor.path.to_string());
                vec![
                    ChoiceOption { label: labels.true_label, value: Value::Bool(true) },
                    ChoiceOption { label: labels.false_label, value: Value::Bool(false) },
                ]
            }
            Some(Classification::Enumeration { members, .. } | Classification::LiteralSet(members)) => {
                members
                    .iter()
                    .map(|member| ChoiceOption { label: member_label(member), value: member.clone() })
                    .collect()
            }
            _ => Vec::new(),
        };
        let mut list = ChoiceList::prefilled(options, prefill);
        if list.selected.is_none() && descriptor.required && list.options.len() == 1 {
            list.selected = Some(0);
        }
        Widget::Choice(list)
    }

    /// Display text of a literal option.
    pub fn member_label(member: &Value) -> String {
        match member {
            Value::String(s) => s.clone(),
            Value::Null => "None".to_string(),
            other => other.to_string(),
        }
    }

    /// Constructor behind a `[widgets]` config entry.
    pub fn for_choice(widget: WidgetChoice) -> WidgetConstructor {
        match widget {
            WidgetChoice::Choice => constructor(|descriptor, prefill, builder| {
                Ok(choice(descriptor, prefill, builder))
            }),
            WidgetChoice::Json => constructor(|_, prefill, _| {
                Ok(Widget::Text(TextEntry::prefilled(TextKind::Json, prefill)))
            }),
            WidgetChoice::Text => constructor(|descriptor, prefill, _| {
                let kind = match &descriptor.classification {
                    Some(Classification::Scalar(ScalarKind::Text))
                    | Some(Classification::Enumeration { .. }) => TextKind::Text,
                    Some(Classification::Scalar(ScalarKind::Integer)) => TextKind::Integer,
                    Some(Classification::Scalar(ScalarKind::Number)) => TextKind::Number,
                    _ => TextKind::Json,
                };
                Ok(Widget::Text(TextEntry::prefilled(kind, prefill)))
            }),
        }
    }

    /// Box a closure as a `WidgetConstructor`.
    pub fn constructor<F>(f: F) -> WidgetConstructor
    where
        F: Fn(&FieldDescriptor, Prefill<'_>, &mut FormBuilder<'_>) -> Result<Widget, FormError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::{Classification, ScalarKind};
    use crate::core::descriptor::FieldPath;
    use crate::core::widget::{TextEntry, TextKind};
    use serde_json::json;

    fn descriptor(classification: Classification) -> FieldDescriptor {
        FieldDescriptor {
            path: FieldPath::parse("when"),
            name: "when".into(),
            label: "when".into(),
            description: None,
            annotation: json!({ "type": "string", "format": "date" }),
            classification: Some(classification),
            default: None,
            required: true,
            definition: Some("Day".into()),
            format: Some("date".into()),
        }
    }

    fn constructor(tag: &'static str) -> impl Fn(&FieldDescriptor, Prefill<'_>, &mut FormBuilder<'_>) -> Result<Widget, FormError>
    + Send
    + Sync
    + 'static {
        move |_, _, _| {
            let mut entry = TextEntry::new(TextKind::Text);
            entry.paste(tag);
            Ok(Widget::Text(entry))
        }
    }

    #[test]
    fn test_lookup_order() {
        let desc = descriptor(Classification::Scalar(ScalarKind::Text));
        let mut registry = WidgetRegistry::new();
        assert!(registry.lookup(&desc).is_none());

        registry.register(WidgetKey::Kind(AnnotationKind::Text), constructor("kind"));
        assert!(registry.lookup(&desc).is_some());

        registry.register(WidgetKey::Format("date".into()), constructor("format"));
        registry.register(WidgetKey::Definition("Day".into()), constructor("definition"));
        assert!(registry.specific(Some("Day"), None).is_some());
        assert!(registry.specific(None, Some("date")).is_some());
        assert!(registry.specific(Some("Other"), Some("time")).is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = WidgetRegistry::new();
        registry
            .register(WidgetKey::Format("date".into()), constructor("first"))
            .register(WidgetKey::Format("date".into()), constructor("second"));
        assert_eq!(registry.constructors.len(), 1);
    }

    #[test]
    fn test_from_config_installs_kind_overrides() {
        let mut config = FormConfig::default();
        config.widgets.insert(AnnotationKind::Boolean, WidgetChoice::Text);
        let registry = WidgetRegistry::from_config(&config);
        assert!(registry.contains(&WidgetKey::Kind(AnnotationKind::Boolean)));
        assert!(!registry.contains(&WidgetKey::Kind(AnnotationKind::Text)));
    }

    #[test]
    fn test_member_labels() {
        assert_eq!(builtin::member_label(&json!("blue")), "blue");
        assert_eq!(builtin::member_label(&json!(null)), "None");
        assert_eq!(builtin::member_label(&json!(3)), "3");
    }
}

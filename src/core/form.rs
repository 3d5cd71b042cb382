//! # Form Assembly
//!
//! `FormBuilder` walks a model's fields in declaration order and asks the
//! registry for a widget per field, recursing into nested models, union
//! variants and collection entries. `FormSession` owns the resulting tree
//! and is the only thing `update()` mutates.
//!
//! ## Eager checks, lazy subtrees
//!
//! Only the subtrees that are shown get built: the selected variant of a
//! union and the existing entries of a collection. Unselected variants and
//! the entry schema of an empty collection are still *probed* once so that
//! an unsupported annotation anywhere in the model fails at construction,
//! not when the user happens to pick it. Probing stops at a definition it
//! is already probing, which is what lets recursive models through.

use log::{debug, info};
use serde_json::Value;

use crate::core::classify::{Classification, Property, ScalarKind, classify};
use crate::core::config::FormConfig;
use crate::core::descriptor::{FieldDescriptor, FieldPath, PathSegment};
use crate::core::error::FormError;
use crate::core::registry::{WidgetRegistry, builtin};
use crate::core::schema::ModelSchema;
use crate::core::widget::{
    FieldNode, ListEditor, Prefill, SubForm, TextEntry, VariantOption, VariantSelector,
    VariantTarget, Widget, evaluate,
};

// ============================================================================
// Builder
// ============================================================================

pub struct FormBuilder<'s> {
    schema: &'s ModelSchema,
    registry: &'s WidgetRegistry,
    config: &'s FormConfig,
    /// Definitions currently being probed, innermost last.
    probing: Vec<String>,
}

impl<'s> FormBuilder<'s> {
    pub fn new(schema: &'s ModelSchema, registry: &'s WidgetRegistry, config: &'s FormConfig) -> Self {
        Self {
            schema,
            registry,
            config,
            probing: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'s ModelSchema {
        self.schema
    }

    pub fn config(&self) -> &'s FormConfig {
        self.config
    }

    /// Build the root node. The model itself must be a nested model.
    pub fn root(&mut self, value: Option<&Value>) -> Result<FieldNode, FormError> {
        let path = FieldPath::root();
        let classified = classify(self.schema, &path, self.schema.root())?;
        let Classification::NestedModel { properties, .. } = &classified.classification else {
            return Err(FormError::Schema(format!(
                "the model must be an object with fields, found {}",
                classified.classification.kind()
            )));
        };
        let fields = self.fields(&path, properties, value)?;

        let title = self
            .config
            .title
            .clone()
            .unwrap_or_else(|| self.schema.title().to_string());
        let descriptor = FieldDescriptor {
            path,
            name: String::new(),
            label: title,
            description: string_key(&classified.resolved, "description"),
            annotation: classified.resolved.clone(),
            classification: Some(classified.classification.clone()),
            default: None,
            required: true,
            definition: classified.definition,
            format: None,
        };
        Ok(FieldNode::new(descriptor, Widget::Form(SubForm { fields })))
    }

    /// Build one node per property of a nested model.
    pub fn fields(
        &mut self,
        parent: &FieldPath,
        properties: &[Property],
        value: Option<&Value>,
    ) -> Result<Vec<FieldNode>, FormError> {
        properties
            .iter()
            .map(|property| {
                let field_value = value.and_then(|v| v.get(&property.name));
                self.field(
                    parent.child(&property.name),
                    &property.name,
                    &property.schema,
                    property.required,
                    field_value,
                )
            })
            .collect()
    }

    /// Build the node for one field, pre-populated with `value`.
    pub fn field(
        &mut self,
        path: FieldPath,
        name: &str,
        annotation: &Value,
        required: bool,
        value: Option<&Value>,
    ) -> Result<FieldNode, FormError> {
        let descriptor = self.descriptor(path, name, annotation, required)?;
        let prefill = Prefill {
            value,
            default: descriptor.default.as_ref(),
        };

        let registry = self.registry;
        let widget = match registry.lookup(&descriptor) {
            Some(constructor) => constructor(&descriptor, prefill, self)?,
            None => builtin::default_widget(&descriptor, prefill, self)?,
        };
        Ok(FieldNode::new(descriptor, widget))
    }

    fn descriptor(
        &self,
        path: FieldPath,
        name: &str,
        annotation: &Value,
        required: bool,
    ) -> Result<FieldDescriptor, FormError> {
        if path.depth() > self.config.max_depth {
            return Err(FormError::RecursionLimit {
                field: path,
                limit: self.config.max_depth,
            });
        }

        let (classification, resolved, definition) = match classify(self.schema, &path, annotation) {
            Ok(classified) => (
                Some(classified.classification),
                classified.resolved,
                classified.definition,
            ),
            Err(err @ FormError::UnsupportedAnnotation { .. }) => {
                // A definition- or format-specific constructor may still
                // know how to edit it.
                let Ok(resolved) = self.schema.resolve(annotation) else {
                    return Err(err);
                };
                let format = string_key(&resolved.schema, "format");
                if self
                    .registry
                    .specific(resolved.definition.as_deref(), format.as_deref())
                    .is_none()
                {
                    return Err(err);
                }
                (None, resolved.schema, resolved.definition)
            }
            Err(err) => return Err(err),
        };

        let label = self
            .config
            .labels
            .get(&path.to_string())
            .cloned()
            .or_else(|| string_key(annotation, "title"))
            .unwrap_or_else(|| name.to_string());

        Ok(FieldDescriptor {
            name: name.to_string(),
            label,
            description: string_key(&resolved, "description"),
            default: resolved.get("default").cloned(),
            format: string_key(&resolved, "format"),
            annotation: resolved,
            classification,
            required,
            definition,
            path,
        })
    }

    /// Check that `annotation` can be built, without keeping the result.
    fn probe(&mut self, path: FieldPath, name: &str, annotation: &Value) -> Result<(), FormError> {
        let definition = self
            .schema
            .resolve(annotation)
            .ok()
            .and_then(|resolved| resolved.definition);
        if let Some(definition) = &definition {
            if self.probing.contains(definition) {
                return Ok(());
            }
            self.probing.push(definition.clone());
        }
        let result = self.field(path, name, annotation, true, None).map(|_| ());
        if definition.is_some() {
            self.probing.pop();
        }
        result
    }

    // ========================================================================
    // Variant selectors
    // ========================================================================

    /// Selector for a union field. Literal members become fixed options;
    /// every other variant gets a nested node once it is selected.
    pub fn variant_selector(
        &mut self,
        descriptor: &FieldDescriptor,
        variants: &[Value],
        prefill: Prefill<'_>,
    ) -> Result<VariantSelector, FormError> {
        let path = &descriptor.path;
        let options = self.variant_options(path, variants)?;

        let has_text = options.iter().any(|option| {
            matches!(&option.target, VariantTarget::Schema { schema, tag: None }
                if self.is_text(path, schema))
        });
        let has_string_literal = options
            .iter()
            .any(|option| matches!(&option.target, VariantTarget::Fixed(Value::String(_))));
        if has_text && has_string_literal {
            return Err(FormError::AmbiguousUnion { field: path.clone() });
        }

        for option in &options {
            if let VariantTarget::Schema { schema, tag } = &option.target {
                let (variant_path, name) = variant_location(path, tag.as_deref(), &descriptor.name);
                self.probe(variant_path, &name, schema)?;
            }
        }

        let (value, active) = evaluate(prefill.value, prefill.default, |v| {
            self.match_variant(&options, v).is_some()
        });
        let mut selected = value
            .as_ref()
            .filter(|_| active)
            .and_then(|v| self.match_variant(&options, v));
        if selected.is_none() && descriptor.required && options.len() == 1 {
            selected = Some(0);
        }

        let active_node = match selected {
            Some(idx) => {
                let inner = value.as_ref().and_then(|v| unwrap_tag(&options[idx], v));
                self.variant_node(path, &descriptor.name, &options[idx], inner)?
            }
            None => None,
        };

        Ok(VariantSelector {
            options,
            selected,
            active: active_node.map(Box::new),
        })
    }

    /// Build the nested node a variant option stands for, if any.
    pub fn variant_node(
        &mut self,
        union_path: &FieldPath,
        union_name: &str,
        option: &VariantOption,
        value: Option<&Value>,
    ) -> Result<Option<FieldNode>, FormError> {
        match &option.target {
            VariantTarget::Fixed(_) => Ok(None),
            VariantTarget::Schema { schema, tag } => {
                let (path, name) = variant_location(union_path, tag.as_deref(), union_name);
                let mut node = self.field(path, &name, schema, true, value)?;
                if tag.is_none() {
                    node.descriptor.label = option.label.clone();
                }
                Ok(Some(node))
            }
        }
    }

    fn variant_options(
        &mut self,
        path: &FieldPath,
        variants: &[Value],
    ) -> Result<Vec<VariantOption>, FormError> {
        let mut options = Vec::new();
        for variant in variants {
            let classified = classify(self.schema, path, variant)?;
            let title = string_key(&classified.resolved, "title");
            match classified.classification {
                Classification::Enumeration { members, .. } | Classification::LiteralSet(members) => {
                    options.extend(members.into_iter().map(|member| VariantOption {
                        label: builtin::member_label(&member),
                        target: VariantTarget::Fixed(member),
                    }));
                }
                Classification::Scalar(ScalarKind::Boolean) => {
                    let labels = self.config.boolean_labels_for(&path.to_string());
                    options.push(VariantOption {
                        label: labels.true_label,
                        target: VariantTarget::Fixed(Value::Bool(true)),
                    });
                    options.push(VariantOption {
                        label: labels.false_label,
                        target: VariantTarget::Fixed(Value::Bool(false)),
                    });
                }
                Classification::Union(inner) => {
                    options.extend(self.variant_options(path, &inner)?);
                }
                Classification::Scalar(kind) => {
                    let fallback = match kind {
                        ScalarKind::Integer => "integer",
                        ScalarKind::Number => "number",
                        _ => "text",
                    };
                    options.push(VariantOption {
                        label: title.unwrap_or_else(|| fallback.to_string()),
                        target: VariantTarget::Schema {
                            schema: variant.clone(),
                            tag: None,
                        },
                    });
                }
                Classification::NestedModel { name, properties } => {
                    options.push(self.model_option(variant, &classified.resolved, name, &properties));
                }
                Classification::Collection { .. } => {
                    options.push(VariantOption {
                        label: title.unwrap_or_else(|| "list".to_string()),
                        target: VariantTarget::Schema {
                            schema: variant.clone(),
                            tag: None,
                        },
                    });
                }
            }
        }
        Ok(options)
    }

    /// Option for a model variant. Externally tagged enum variants
    /// (`{"Sports": {...}}`) are unwrapped so the user edits the payload.
    fn model_option(
        &self,
        variant: &Value,
        resolved: &Value,
        name: Option<String>,
        properties: &[Property],
    ) -> VariantOption {
        let closed = resolved.get("additionalProperties") == Some(&Value::Bool(false));
        if let [only] = properties
            && only.required
            && closed
        {
            return VariantOption {
                label: only.name.clone(),
                target: VariantTarget::Schema {
                    schema: only.schema.clone(),
                    tag: Some(only.name.clone()),
                },
            };
        }

        // Internally tagged: a required property fixed to one string.
        let internal_tag = properties.iter().filter(|p| p.required).find_map(|p| {
            let resolved = self.schema.resolve(&p.schema).ok()?.schema;
            match (resolved.get("const"), resolved.get("enum").and_then(Value::as_array)) {
                (Some(Value::String(tag)), _) => Some(tag.clone()),
                (None, Some(members)) if members.len() == 1 => members[0].as_str().map(str::to_string),
                _ => None,
            }
        });

        VariantOption {
            label: internal_tag
                .or(name)
                .unwrap_or_else(|| "object".to_string()),
            target: VariantTarget::Schema {
                schema: variant.clone(),
                tag: None,
            },
        }
    }

    fn is_text(&self, path: &FieldPath, schema: &Value) -> bool {
        matches!(
            classify(self.schema, path, schema).map(|c| c.classification),
            Ok(Classification::Scalar(ScalarKind::Text))
        )
    }

    /// Index of the first option `value` belongs to. Fixed options are
    /// tried before schema options.
    pub fn match_variant(&self, options: &[VariantOption], value: &Value) -> Option<usize> {
        let fixed = options
            .iter()
            .position(|option| matches!(&option.target, VariantTarget::Fixed(v) if v == value));
        fixed.or_else(|| {
            options.iter().position(|option| match &option.target {
                VariantTarget::Fixed(_) => false,
                VariantTarget::Schema { schema, tag } => match tag {
                    Some(tag) => match value.as_object() {
                        Some(object) if object.len() == 1 => object
                            .get(tag)
                            .is_some_and(|inner| self.is_instance(schema, inner)),
                        _ => false,
                    },
                    None => self.is_instance(schema, value),
                },
            })
        })
    }

    fn is_instance(&self, schema: &Value, value: &Value) -> bool {
        jsonschema::validator_for(&self.schema.standalone(schema))
            .map(|validator| validator.is_valid(value))
            .unwrap_or(false)
    }

    // ========================================================================
    // Collections
    // ========================================================================

    pub fn list_editor(
        &mut self,
        descriptor: &FieldDescriptor,
        items: &Value,
        unique: bool,
        prefill: Prefill<'_>,
    ) -> Result<ListEditor, FormError> {
        let path = &descriptor.path;
        self.probe(path.index(0), "#0", items)?;

        let (value, _) = evaluate(prefill.value, prefill.default, Value::is_array);
        let entries = value
            .as_ref()
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .enumerate()
                    .map(|(idx, v)| self.entry(path, idx, items, Some(v)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(ListEditor {
            items: items.clone(),
            unique,
            entries,
        })
    }

    /// Build the node of collection entry `idx`.
    pub fn entry(
        &mut self,
        list_path: &FieldPath,
        idx: usize,
        items: &Value,
        value: Option<&Value>,
    ) -> Result<FieldNode, FormError> {
        self.field(list_path.index(idx), &format!("#{idx}"), items, true, value)
    }
}

/// Where the nested node of a variant lives: below the tag for externally
/// tagged variants, at the union's own path otherwise.
fn variant_location(union_path: &FieldPath, tag: Option<&str>, union_name: &str) -> (FieldPath, String) {
    match tag {
        Some(tag) => (union_path.child(tag), tag.to_string()),
        None => (union_path.clone(), union_name.to_string()),
    }
}

/// The payload a variant node is pre-populated with.
fn unwrap_tag<'v>(option: &VariantOption, value: &'v Value) -> Option<&'v Value> {
    match &option.target {
        VariantTarget::Schema { tag: Some(tag), .. } => value.get(tag),
        _ => Some(value),
    }
}

fn deselect(widget: &mut Widget) -> bool {
    match widget {
        Widget::Choice(list) => list.selected.take().is_some(),
        Widget::Variant(selector) => {
            selector.active = None;
            selector.selected.take().is_some()
        }
        _ => false,
    }
}

fn string_key(fragment: &Value, key: &str) -> Option<String> {
    fragment.get(key).and_then(Value::as_str).map(str::to_string)
}

// ============================================================================
// Session
// ============================================================================

/// Where a session is in its lifecycle.
///
/// `Editing → Submitting → Accepted` on success; a rejected submission goes
/// back to `Editing` with the field errors attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Editing,
    Submitting,
    Accepted,
}

/// The state of one form being edited.
#[derive(Debug)]
pub struct FormSession {
    schema: ModelSchema,
    registry: WidgetRegistry,
    config: FormConfig,
    root: FieldNode,
    phase: Phase,
    form_errors: Vec<String>,
}

impl FormSession {
    /// Build a session for `schema`, pre-populated from `value` (an
    /// instance being edited) and the schema's defaults.
    pub fn new(
        schema: ModelSchema,
        registry: WidgetRegistry,
        config: FormConfig,
        value: Option<&Value>,
    ) -> Result<Self, FormError> {
        let root = FormBuilder::new(&schema, &registry, &config).root(value)?;
        info!(
            "Form session created for `{}` with {} fields",
            root.descriptor.label,
            root.children().len()
        );
        Ok(Self {
            schema,
            registry,
            config,
            root,
            phase: Phase::Editing,
            form_errors: Vec::new(),
        })
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.root.descriptor.label
    }

    pub fn root(&self) -> &FieldNode {
        &self.root
    }

    /// Top-level fields in declaration order.
    pub fn fields(&self) -> &[FieldNode] {
        self.root.children()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        debug!("Session phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// The document a submission would validate: every field with a value.
    pub fn document(&self) -> Value {
        self.root
            .value()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    /// Descriptors of every node in the tree, parents first.
    pub fn descriptors(&self) -> Vec<&FieldDescriptor> {
        let mut descriptors = Vec::new();
        for field in self.fields() {
            field.walk(&mut |node| descriptors.push(&node.descriptor));
        }
        descriptors
    }

    /// The deepest node at `path`.
    pub fn find(&self, path: &FieldPath) -> Option<&FieldNode> {
        self.root.find(path)
    }

    pub fn find_by(&self, path: &FieldPath, accept: &dyn Fn(&Widget) -> bool) -> Option<&FieldNode> {
        self.root.find_by(path, accept)
    }

    pub(crate) fn find_by_mut(
        &mut self,
        path: &FieldPath,
        accept: &dyn Fn(&Widget) -> bool,
    ) -> Option<&mut FieldNode> {
        self.root.find_by_mut(path, accept)
    }

    pub(crate) fn text_entry_mut(&mut self, path: &FieldPath) -> Option<&mut TextEntry> {
        match &mut self.find_by_mut(path, &|w| matches!(w, Widget::Text(_)))?.widget {
            Widget::Text(entry) => Some(entry),
            _ => None,
        }
    }

    /// Choose option `index` of the choice list or variant selector at
    /// `path`. Picking a different variant replaces its subtree; nothing
    /// outside it changes. Returns whether anything changed.
    pub fn select(&mut self, path: &FieldPath, index: usize) -> Result<bool, FormError> {
        let is_selector = |w: &Widget| matches!(w, Widget::Choice(_) | Widget::Variant(_));
        let Some(node) = self.root.find_by(path, &is_selector) else {
            return Ok(false);
        };

        let replacement = match &node.widget {
            Widget::Variant(selector) => {
                if selector.selected == Some(index) {
                    return Ok(false);
                }
                let Some(option) = selector.options.get(index) else {
                    return Ok(false);
                };
                let mut builder = FormBuilder::new(&self.schema, &self.registry, &self.config);
                builder.variant_node(path, &node.descriptor.name, option, None)?
            }
            Widget::Choice(list) if index >= list.options.len() => return Ok(false),
            _ => None,
        };

        let Some(node) = self.root.find_by_mut(path, &is_selector) else {
            return Ok(false);
        };
        match &mut node.widget {
            Widget::Choice(list) => {
                let changed = list.selected != Some(index);
                list.selected = Some(index);
                Ok(changed)
            }
            Widget::Variant(selector) => {
                debug!("Variant {} of {} selected", index, path);
                selector.selected = Some(index);
                selector.active = replacement.map(Box::new);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Append an empty entry to the collection at `path`. Returns the new
    /// entry's path.
    pub fn add_entry(&mut self, path: &FieldPath) -> Result<Option<FieldPath>, FormError> {
        let is_list = |w: &Widget| matches!(w, Widget::List(_));
        let Some(Widget::List(list)) = self.root.find_by(path, &is_list).map(|n| &n.widget) else {
            return Ok(None);
        };
        let idx = list.entries.len();
        let entry = FormBuilder::new(&self.schema, &self.registry, &self.config)
            .entry(path, idx, &list.items, None)?;

        let Some(Widget::List(list)) = self.root.find_by_mut(path, &is_list).map(|n| &mut n.widget)
        else {
            return Ok(None);
        };
        list.entries.push(entry);
        debug!("Added entry {} to {}", idx, path);
        Ok(Some(path.index(idx)))
    }

    /// Remove entry `index` of the collection at `path`; later entries
    /// move up one index.
    pub fn remove_entry(&mut self, path: &FieldPath, index: usize) -> bool {
        let is_list = |w: &Widget| matches!(w, Widget::List(_));
        let Some(Widget::List(list)) = self.root.find_by_mut(path, &is_list).map(|n| &mut n.widget)
        else {
            return false;
        };
        if index >= list.entries.len() {
            return false;
        }
        list.entries.remove(index);
        for (idx, entry) in list.entries.iter_mut().enumerate().skip(index) {
            entry.rebase(&path.index(idx + 1), &path.index(idx));
        }
        debug!("Removed entry {} from {}", index, path);
        true
    }

    /// The collection entry `path` lies in, as `(collection path, index)`.
    pub fn enclosing_entry(&self, path: &FieldPath) -> Option<(FieldPath, usize)> {
        let mut current = Some(path.clone());
        while let Some(candidate) = current {
            if let Some(PathSegment::Index(idx)) = candidate.last()
                && let Some(list_path) = candidate.parent()
                && self
                    .root
                    .find_by(&list_path, &|w| matches!(w, Widget::List(_)))
                    .is_some()
            {
                return Some((list_path, *idx));
            }
            current = candidate.parent();
        }
        None
    }

    /// Reset the field at `path` to "no value".
    pub fn clear(&mut self, path: &FieldPath) -> bool {
        let Some(node) = self.root.find_mut(path) else {
            return false;
        };
        match &mut node.widget {
            Widget::Text(entry) => entry.clear(),
            widget @ (Widget::Choice(_) | Widget::Variant(_)) => deselect(widget),
            Widget::Form(_) | Widget::List(_) => false,
        }
    }

    /// Drop the selection of the choice list or variant selector at
    /// `path`. Unlike `clear`, an untagged union is deselected even though
    /// its active variant lives at the same path.
    pub fn deselect(&mut self, path: &FieldPath) -> bool {
        let is_selector = |w: &Widget| matches!(w, Widget::Choice(_) | Widget::Variant(_));
        match self.root.find_by_mut(path, &is_selector) {
            Some(node) => deselect(&mut node.widget),
            None => false,
        }
    }

    /// Errors that belong to the model as a whole.
    pub fn form_errors(&self) -> &[String] {
        &self.form_errors
    }

    pub(crate) fn root_mut(&mut self) -> &mut FieldNode {
        &mut self.root
    }

    pub(crate) fn push_form_error(&mut self, message: String) {
        self.form_errors.push(message);
    }

    pub fn clear_errors(&mut self) {
        self.form_errors.clear();
        self.root.walk_mut(&mut |node| node.errors.clear());
    }

    /// Whether any node or the form itself carries an error.
    pub fn has_errors(&self) -> bool {
        let mut found = !self.form_errors.is_empty();
        self.root.walk(&mut |node| found |= !node.errors.is_empty());
        found
    }
}

//! # Widgets
//!
//! The interactive elements a field can be bound to, as plain state. The
//! TUI renders them and turns key presses into `Action`s; nothing here
//! knows about terminals.
//!
//! Every widget answers one question, `value()`: what would this field
//! contribute to the submitted document? `None` means "no value" and the
//! field is omitted, which is distinct from JSON `null`.

use serde_json::{Map, Value};

use crate::core::descriptor::{FieldDescriptor, FieldPath};

// ============================================================================
// Text entry
// ============================================================================

/// How a text entry's buffer is turned into a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKind {
    Text,
    Integer,
    Number,
    /// Free-form JSON, used when a field is overridden to raw input.
    Json,
}

impl TextKind {
    /// Whether `value` could have been typed into an entry of this kind.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            TextKind::Text => value.is_string(),
            TextKind::Integer => value.is_i64() || value.is_u64(),
            TextKind::Number => value.is_number(),
            TextKind::Json => true,
        }
    }

    /// Render a value as editable text.
    pub fn render(self, value: &Value) -> String {
        match (self, value) {
            (TextKind::Json, v) => v.to_string(),
            (_, Value::String(s)) => s.clone(),
            (_, v) => v.to_string(),
        }
    }
}

/// Single-line text input with a byte-offset cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct TextEntry {
    pub kind: TextKind,
    buffer: String,
    cursor: usize,
    /// False until the user edits the entry, unless it was prefilled with
    /// an accepted value. A non-present entry contributes no value even if
    /// its buffer shows an inactive default.
    present: bool,
}

impl TextEntry {
    pub fn new(kind: TextKind) -> Self {
        Self {
            kind,
            buffer: String::new(),
            cursor: 0,
            present: false,
        }
    }

    /// Entry pre-populated according to the `evaluate` table.
    pub fn prefilled(kind: TextKind, prefill: Prefill<'_>) -> Self {
        let (value, active) = evaluate(prefill.value, prefill.default, |v| kind.accepts(v));
        let buffer = value.as_ref().map(|v| kind.render(v)).unwrap_or_default();
        Self {
            kind,
            cursor: buffer.len(),
            buffer,
            present: active,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn value(&self) -> Option<Value> {
        if !self.present {
            return None;
        }
        let trimmed = self.buffer.trim();
        match self.kind {
            TextKind::Text => Some(Value::String(self.buffer.clone())),
            _ if trimmed.is_empty() => None,
            TextKind::Integer => Some(
                trimmed
                    .parse::<i64>()
                    .map(Value::from)
                    .or_else(|_| trimmed.parse::<u64>().map(Value::from))
                    .unwrap_or_else(|_| Value::String(self.buffer.clone())),
            ),
            TextKind::Number => Some(
                trimmed
                    .parse::<i64>()
                    .map(Value::from)
                    .ok()
                    .or_else(|| {
                        trimmed
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(Value::Number)
                    })
                    .unwrap_or_else(|| Value::String(self.buffer.clone())),
            ),
            TextKind::Json => Some(
                serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(self.buffer.clone())),
            ),
        }
    }

    /// Returns `true` when the buffer changed.
    pub fn insert(&mut self, ch: char) -> bool {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.present = true;
        true
    }

    /// Insert pasted text. Newlines are flattened into spaces.
    pub fn paste(&mut self, text: &str) -> bool {
        let text: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        if text.is_empty() {
            return false;
        }
        self.buffer.insert_str(self.cursor, &text);
        self.cursor += text.len();
        self.present = true;
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_char_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        self.present = true;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let next = next_char_boundary(&self.buffer, self.cursor);
        self.buffer.drain(self.cursor..next);
        self.present = true;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_char_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_char_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_home(&mut self) -> bool {
        (self.cursor != 0).then(|| self.cursor = 0).is_some()
    }

    pub fn move_end(&mut self) -> bool {
        let end = self.buffer.len();
        (self.cursor != end).then(|| self.cursor = end).is_some()
    }

    /// Reset to "no value".
    pub fn clear(&mut self) -> bool {
        let changed = self.present || !self.buffer.is_empty();
        self.buffer.clear();
        self.cursor = 0;
        self.present = false;
        changed
    }
}

/// Byte offset of the character boundary before `pos`.
pub(crate) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset of the character boundary after `pos`.
pub(crate) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

// ============================================================================
// Choices and variants
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceOption {
    pub label: String,
    pub value: Value,
}

/// A set of mutually exclusive options. At most one is selected.
#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceList {
    pub options: Vec<ChoiceOption>,
    pub selected: Option<usize>,
}

impl ChoiceList {
    pub fn prefilled(options: Vec<ChoiceOption>, prefill: Prefill<'_>) -> Self {
        let (value, active) = evaluate(prefill.value, prefill.default, |v| {
            options.iter().any(|option| option.value == *v)
        });
        let selected = value
            .filter(|_| active)
            .and_then(|v| options.iter().position(|option| option.value == v));
        Self { options, selected }
    }

    pub fn value(&self) -> Option<Value> {
        self.selected
            .and_then(|idx| self.options.get(idx))
            .map(|option| option.value.clone())
    }
}

/// What choosing a variant means.
#[derive(Clone, Debug, PartialEq)]
pub enum VariantTarget {
    /// A literal: the option is the value.
    Fixed(Value),
    /// A schema the user fills in through a nested node.
    Schema {
        schema: Value,
        /// Externally tagged enum variant: the value is `{tag: inner}`.
        tag: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariantOption {
    pub label: String,
    pub target: VariantTarget,
}

/// Option list for a union; the selected option decides which nested
/// subtree is active.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantSelector {
    pub options: Vec<VariantOption>,
    pub selected: Option<usize>,
    pub active: Option<Box<FieldNode>>,
}

impl VariantSelector {
    pub fn selected_option(&self) -> Option<&VariantOption> {
        self.selected.and_then(|idx| self.options.get(idx))
    }

    pub fn value(&self) -> Option<Value> {
        match &self.selected_option()?.target {
            VariantTarget::Fixed(value) => Some(value.clone()),
            VariantTarget::Schema { tag, .. } => {
                let inner = self.active.as_ref()?.value()?;
                Some(match tag {
                    Some(tag) => {
                        let mut wrapped = Map::new();
                        wrapped.insert(tag.clone(), inner);
                        Value::Object(wrapped)
                    }
                    None => inner,
                })
            }
        }
    }
}

// ============================================================================
// Containers
// ============================================================================

/// A nested model: one node per property, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct SubForm {
    pub fields: Vec<FieldNode>,
}

impl SubForm {
    pub fn value(&self) -> Option<Value> {
        let object = self
            .fields
            .iter()
            .filter_map(|field| Some((field.descriptor.name.clone(), field.value()?)))
            .collect::<Map<_, _>>();
        Some(Value::Object(object))
    }
}

/// A homogeneous collection whose entries can be added and removed.
#[derive(Clone, Debug, PartialEq)]
pub struct ListEditor {
    /// Schema fragment of one entry.
    pub items: Value,
    pub unique: bool,
    pub entries: Vec<FieldNode>,
}

impl ListEditor {
    pub fn value(&self) -> Option<Value> {
        Some(Value::Array(
            self.entries
                .iter()
                .map(|entry| entry.value().unwrap_or(Value::Null))
                .collect(),
        ))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Widget {
    Text(TextEntry),
    Choice(ChoiceList),
    Variant(VariantSelector),
    Form(SubForm),
    List(ListEditor),
}

impl Widget {
    pub fn value(&self) -> Option<Value> {
        match self {
            Widget::Text(entry) => entry.value(),
            Widget::Choice(list) => list.value(),
            Widget::Variant(selector) => selector.value(),
            Widget::Form(form) => form.value(),
            Widget::List(list) => list.value(),
        }
    }
}

// ============================================================================
// Field nodes
// ============================================================================

/// One field of the session tree: its descriptor, widget and the errors
/// from the last validation.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldNode {
    pub descriptor: FieldDescriptor,
    pub widget: Widget,
    pub errors: Vec<String>,
}

impl FieldNode {
    pub fn new(descriptor: FieldDescriptor, widget: Widget) -> Self {
        Self {
            descriptor,
            widget,
            errors: Vec::new(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.descriptor.path
    }

    pub fn value(&self) -> Option<Value> {
        self.widget.value()
    }

    pub fn children(&self) -> &[FieldNode] {
        match &self.widget {
            Widget::Form(form) => &form.fields,
            Widget::List(list) => &list.entries,
            Widget::Variant(VariantSelector {
                active: Some(node), ..
            }) => std::slice::from_ref(node.as_ref()),
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [FieldNode] {
        match &mut self.widget {
            Widget::Form(form) => &mut form.fields,
            Widget::List(list) => &mut list.entries,
            Widget::Variant(VariantSelector {
                active: Some(node), ..
            }) => std::slice::from_mut(node.as_mut()),
            _ => &mut [],
        }
    }

    /// Visit this node and its descendants, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a FieldNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut FieldNode)) {
        visit(self);
        for child in self.children_mut() {
            child.walk_mut(visit);
        }
    }

    /// The deepest node at exactly `path` whose widget satisfies `accept`.
    ///
    /// An untagged variant's active node shares its selector's path, so
    /// the same path may address several nodes.
    pub fn find_by(&self, path: &FieldPath, accept: &dyn Fn(&Widget) -> bool) -> Option<&FieldNode> {
        if !path.starts_with(self.path()) {
            return None;
        }
        let deeper = self
            .children()
            .iter()
            .find_map(|child| child.find_by(path, accept));
        deeper.or_else(|| (self.path() == path && accept(&self.widget)).then_some(self))
    }

    pub fn find_by_mut(
        &mut self,
        path: &FieldPath,
        accept: &dyn Fn(&Widget) -> bool,
    ) -> Option<&mut FieldNode> {
        if !path.starts_with(self.path()) {
            return None;
        }
        let here = self.path() == path && accept(&self.widget);
        let has_deeper = self
            .children()
            .iter()
            .any(|child| child.find_by(path, accept).is_some());
        if has_deeper {
            return self
                .children_mut()
                .iter_mut()
                .find_map(|child| child.find_by_mut(path, accept));
        }
        here.then_some(self)
    }

    pub fn find(&self, path: &FieldPath) -> Option<&FieldNode> {
        self.find_by(path, &|_| true)
    }

    pub fn find_mut(&mut self, path: &FieldPath) -> Option<&mut FieldNode> {
        self.find_by_mut(path, &|_| true)
    }

    /// The deepest node whose path is `path` or one of its ancestors.
    pub fn closest_mut(&mut self, path: &FieldPath) -> Option<&mut FieldNode> {
        if !path.starts_with(self.path()) {
            return None;
        }
        let has_deeper = self
            .children()
            .iter()
            .any(|child| path.starts_with(child.path()));
        if has_deeper {
            return self
                .children_mut()
                .iter_mut()
                .find(|child| path.starts_with(child.path()))
                .and_then(|child| child.closest_mut(path));
        }
        Some(self)
    }

    /// Move this subtree from `from` to `to`.
    pub fn rebase(&mut self, from: &FieldPath, to: &FieldPath) {
        self.walk_mut(&mut |node| node.descriptor.rebase(from, to));
    }
}

// ============================================================================
// Pre-population
// ============================================================================

/// The value a field is constructed with and its default.
#[derive(Clone, Copy, Debug, Default)]
pub struct Prefill<'a> {
    pub value: Option<&'a Value>,
    pub default: Option<&'a Value>,
}

/// Decide what a widget shows and whether it counts as filled in.
///
/// | default  | value           | shown   | active |
/// |----------|-----------------|---------|--------|
/// | match    | match           | value   | yes    |
/// | match    | none            | default | yes    |
/// | match    | no-match        | default | no     |
/// | no-match | match           | value   | yes    |
/// | no-match | none / no-match | none    | no     |
/// | none     | match           | value   | yes    |
/// | none     | none / no-match | none    | no     |
pub fn evaluate(
    value: Option<&Value>,
    default: Option<&Value>,
    matches: impl Fn(&Value) -> bool,
) -> (Option<Value>, bool) {
    let default = default.filter(|d| matches(d));
    match value {
        Some(v) if matches(v) => (Some(v.clone()), true),
        None => (default.cloned(), default.is_some()),
        Some(_) => (default.cloned(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn descriptor(path: &str) -> FieldDescriptor {
        let path = FieldPath::parse(path);
        let name = match path.last() {
            Some(crate::core::descriptor::PathSegment::Field(name)) => name.clone(),
            Some(crate::core::descriptor::PathSegment::Index(idx)) => format!("#{idx}"),
            None => String::new(),
        };
        FieldDescriptor {
            path,
            label: name.clone(),
            name,
            description: None,
            annotation: json!({ "type": "string" }),
            classification: None,
            default: None,
            required: true,
            definition: None,
            format: None,
        }
    }

    fn text_node(path: &str, text: &str) -> FieldNode {
        let mut entry = TextEntry::new(TextKind::Text);
        entry.paste(text);
        FieldNode::new(descriptor(path), Widget::Text(entry))
    }

    #[test]
    fn test_evaluate_table() {
        let is_int = |v: &Value| v.is_i64();
        let (m, n) = (json!(1), json!("x"));

        assert_eq!(evaluate(Some(&m), Some(&json!(2)), is_int), (Some(json!(1)), true));
        assert_eq!(evaluate(None, Some(&m), is_int), (Some(json!(1)), true));
        assert_eq!(evaluate(Some(&n), Some(&m), is_int), (Some(json!(1)), false));
        assert_eq!(evaluate(Some(&m), Some(&n), is_int), (Some(json!(1)), true));
        assert_eq!(evaluate(None, Some(&n), is_int), (None, false));
        assert_eq!(evaluate(Some(&n), Some(&n), is_int), (None, false));
        assert_eq!(evaluate(Some(&m), None, is_int), (Some(json!(1)), true));
        assert_eq!(evaluate(None, None, is_int), (None, false));
        assert_eq!(evaluate(Some(&n), None, is_int), (None, false));
    }

    #[test]
    fn test_untouched_text_has_no_value() {
        let entry = TextEntry::new(TextKind::Text);
        assert_eq!(entry.value(), None);
    }

    #[test]
    fn test_edited_empty_text_is_empty_string() {
        let mut entry = TextEntry::new(TextKind::Text);
        entry.insert('a');
        entry.backspace();
        assert_eq!(entry.value(), Some(json!("")));
    }

    #[test]
    fn test_numeric_parsing() {
        let mut entry = TextEntry::new(TextKind::Integer);
        entry.paste("42");
        assert_eq!(entry.value(), Some(json!(42)));

        let mut entry = TextEntry::new(TextKind::Number);
        entry.paste("2.5");
        assert_eq!(entry.value(), Some(json!(2.5)));

        let mut entry = TextEntry::new(TextKind::Integer);
        entry.paste("4x");
        assert_eq!(entry.value(), Some(json!("4x")));

        let mut entry = TextEntry::new(TextKind::Integer);
        entry.paste("  ");
        assert_eq!(entry.value(), None);
    }

    #[test]
    fn test_json_entry() {
        let mut entry = TextEntry::new(TextKind::Json);
        entry.paste(r#"{"a": [1, 2]}"#);
        assert_eq!(entry.value(), Some(json!({ "a": [1, 2] })));
    }

    #[test]
    fn test_prefilled_default_is_active() {
        let entry = TextEntry::prefilled(
            TextKind::Integer,
            Prefill {
                value: None,
                default: Some(&json!(0)),
            },
        );
        assert_eq!(entry.buffer(), "0");
        assert_eq!(entry.value(), Some(json!(0)));
    }

    #[test]
    fn test_prefilled_mismatch_shows_default_inactive() {
        let entry = TextEntry::prefilled(
            TextKind::Integer,
            Prefill {
                value: Some(&json!("oops")),
                default: Some(&json!(3)),
            },
        );
        assert_eq!(entry.buffer(), "3");
        assert_eq!(entry.value(), None);
    }

    #[test]
    fn test_cursor_editing_multibyte() {
        let mut entry = TextEntry::new(TextKind::Text);
        entry.paste("café");
        assert!(entry.move_left());
        entry.insert('!');
        assert_eq!(entry.buffer(), "caf!é");
        entry.move_home();
        assert!(entry.delete());
        assert_eq!(entry.buffer(), "af!é");
        assert!(!entry.move_left());
        entry.move_end();
        assert!(entry.backspace());
        assert_eq!(entry.buffer(), "af!");
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut entry = TextEntry::new(TextKind::Text);
        entry.paste("a\nb");
        assert_eq!(entry.buffer(), "a b");
    }

    #[test]
    fn test_clear_resets_to_no_value() {
        let mut entry = TextEntry::new(TextKind::Text);
        entry.insert('x');
        assert!(entry.clear());
        assert_eq!(entry.value(), None);
        assert!(!entry.clear());
    }

    #[test]
    fn test_choice_list_prefill() {
        let options = vec![
            ChoiceOption { label: "True".into(), value: json!(true) },
            ChoiceOption { label: "False".into(), value: json!(false) },
        ];
        let list = ChoiceList::prefilled(
            options.clone(),
            Prefill { value: None, default: Some(&json!(false)) },
        );
        assert_eq!(list.selected, Some(1));
        assert_eq!(list.value(), Some(json!(false)));

        let list = ChoiceList::prefilled(options, Prefill::default());
        assert_eq!(list.value(), None);
    }

    #[test]
    fn test_variant_value_wraps_tag() {
        let selector = VariantSelector {
            options: vec![VariantOption {
                label: "Sports".into(),
                target: VariantTarget::Schema {
                    schema: json!({ "type": "string" }),
                    tag: Some("Sports".into()),
                },
            }],
            selected: Some(0),
            active: Some(Box::new(text_node("edition.Sports", "fast"))),
        };
        assert_eq!(selector.value(), Some(json!({ "Sports": "fast" })));
    }

    #[test]
    fn test_sub_form_omits_missing_values() {
        let form = SubForm {
            fields: vec![
                text_node("name", "Ann"),
                FieldNode::new(descriptor("nick"), Widget::Text(TextEntry::new(TextKind::Text))),
            ],
        };
        assert_eq!(form.value(), Some(json!({ "name": "Ann" })));
    }

    #[test]
    fn test_find_prefers_deepest_node() {
        let selector = VariantSelector {
            options: vec![],
            selected: None,
            active: Some(Box::new(text_node("ports", "10"))),
        };
        let root = FieldNode::new(
            descriptor(""),
            Widget::Form(SubForm {
                fields: vec![FieldNode::new(descriptor("ports"), Widget::Variant(selector))],
            }),
        );
        let path = FieldPath::parse("ports");
        assert!(matches!(root.find(&path).unwrap().widget, Widget::Text(_)));
        let selector = root
            .find_by(&path, &|w| matches!(w, Widget::Variant(_)))
            .unwrap();
        assert!(matches!(selector.widget, Widget::Variant(_)));
    }

    #[test]
    fn test_closest_falls_back_to_ancestor() {
        let mut root = FieldNode::new(
            descriptor(""),
            Widget::Form(SubForm {
                fields: vec![text_node("name", "Ann")],
            }),
        );
        let node = root.closest_mut(&FieldPath::parse("name.first")).unwrap();
        assert_eq!(node.path().to_string(), "name");
        let node = root.closest_mut(&FieldPath::parse("other")).unwrap();
        assert!(node.path().is_root());
    }

    #[test]
    fn test_rebase_subtree() {
        let mut node = text_node("tags[2]", "x");
        node.rebase(&FieldPath::parse("tags[2]"), &FieldPath::parse("tags[1]"));
        assert_eq!(node.path().to_string(), "tags[1]");
        assert_eq!(node.descriptor.name, "#1");
    }
}

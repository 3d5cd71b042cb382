//! # Focus
//!
//! The form is navigated as one flat list of focus targets: every text
//! entry, every option of a choice or variant selector, the `[+ add]` row
//! of each collection, then the two buttons. The list is recomputed from
//! the session every frame because selecting a variant or adding an entry
//! changes the tree.

use crate::core::descriptor::FieldPath;
use crate::core::form::FormSession;
use crate::core::widget::{FieldNode, Widget};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FocusTarget {
    Input(FieldPath),
    Option { path: FieldPath, index: usize },
    AddEntry(FieldPath),
    Submit,
    Cancel,
}

impl FocusTarget {
    /// The field this target belongs to; `None` for the buttons.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            FocusTarget::Input(path)
            | FocusTarget::Option { path, .. }
            | FocusTarget::AddEntry(path) => Some(path),
            FocusTarget::Submit | FocusTarget::Cancel => None,
        }
    }
}

/// Focus targets in display order.
pub fn focus_order(session: &FormSession) -> Vec<FocusTarget> {
    let mut targets = Vec::new();
    for field in session.fields() {
        collect(field, &mut targets);
    }
    targets.push(FocusTarget::Submit);
    targets.push(FocusTarget::Cancel);
    targets
}

fn collect(node: &FieldNode, targets: &mut Vec<FocusTarget>) {
    let path = node.path();
    match &node.widget {
        Widget::Text(_) => targets.push(FocusTarget::Input(path.clone())),
        Widget::Choice(list) => targets.extend((0..list.options.len()).map(|index| FocusTarget::Option {
            path: path.clone(),
            index,
        })),
        Widget::Variant(selector) => {
            targets.extend((0..selector.options.len()).map(|index| FocusTarget::Option {
                path: path.clone(),
                index,
            }));
            if let Some(active) = &selector.active {
                collect(active, targets);
            }
        }
        Widget::Form(form) => form.fields.iter().for_each(|f| collect(f, targets)),
        Widget::List(list) => {
            list.entries.iter().for_each(|entry| collect(entry, targets));
            targets.push(FocusTarget::AddEntry(path.clone()));
        }
    }
}

/// Which target has focus. Survives tree changes by re-finding the focused
/// target and falling back to the same position.
#[derive(Debug, Default)]
pub struct FocusState {
    targets: Vec<FocusTarget>,
    index: usize,
}

impl FocusState {
    pub fn new(session: &FormSession) -> Self {
        Self {
            targets: focus_order(session),
            index: 0,
        }
    }

    /// Recompute targets after the session changed.
    pub fn refresh(&mut self, session: &FormSession) {
        let current = self.current().cloned();
        self.targets = focus_order(session);
        if let Some(position) = current.and_then(|c| self.targets.iter().position(|t| *t == c)) {
            self.index = position;
        } else {
            self.index = self.index.min(self.targets.len().saturating_sub(1));
        }
    }

    pub fn current(&self) -> Option<&FocusTarget> {
        self.targets.get(self.index)
    }

    pub fn targets(&self) -> &[FocusTarget] {
        &self.targets
    }

    pub fn next(&mut self) {
        if !self.targets.is_empty() {
            self.index = (self.index + 1) % self.targets.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.targets.is_empty() {
            self.index = (self.index + self.targets.len() - 1) % self.targets.len();
        }
    }

    /// Move focus to `target` if it exists.
    pub fn focus(&mut self, target: &FocusTarget) -> bool {
        match self.targets.iter().position(|t| t == target) {
            Some(position) => {
                self.index = position;
                true
            }
            None => false,
        }
    }
}

//! # Typed Forms
//!
//! `Form<T>` ties a session to the model type it edits. Any
//! `JsonSchema + Serialize + DeserializeOwned` type is a `Model`.

use std::marker::PhantomData;

use log::{info, warn};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::action::{Action, Effect, update};
use crate::core::config::FormConfig;
use crate::core::error::FormError;
use crate::core::form::{FormSession, Phase};
use crate::core::registry::WidgetRegistry;
use crate::core::schema::ModelSchema;
use crate::core::validate::{ValidationErrors, validate};

pub trait Model: JsonSchema + Serialize + DeserializeOwned {}

impl<T: JsonSchema + Serialize + DeserializeOwned> Model for T {}

/// How an interactive session ended.
#[derive(Clone, Debug, PartialEq)]
pub enum FormOutcome<T> {
    Accepted(T),
    Aborted,
}

/// Result of one submission attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission<T> {
    Accepted(T),
    /// The session is back in editing with these errors attached.
    Rejected(ValidationErrors),
    /// The form was already accepted; nothing was validated.
    Closed,
}

#[derive(Debug)]
pub struct Form<T> {
    session: FormSession,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> Form<T> {
    /// Empty form, pre-populated with the model's defaults.
    pub fn new(config: FormConfig) -> Result<Self, FormError> {
        let registry = WidgetRegistry::from_config(&config);
        Self::with_registry(None, config, registry)
    }

    /// Form pre-populated from an existing instance.
    pub fn edit(instance: &T, config: FormConfig) -> Result<Self, FormError> {
        let registry = WidgetRegistry::from_config(&config);
        Self::with_registry(Some(instance), config, registry)
    }

    /// Form using a caller-provided registry. Config `[widgets]` entries
    /// are not added to it.
    pub fn with_registry(
        instance: Option<&T>,
        config: FormConfig,
        registry: WidgetRegistry,
    ) -> Result<Self, FormError> {
        let schema = ModelSchema::of::<T>()?;
        let value = instance
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| FormError::Schema(format!("cannot serialize instance: {e}")))?;
        let session = FormSession::new(schema, registry, config, value.as_ref())?;
        Ok(Self {
            session,
            _model: PhantomData,
        })
    }

    pub fn session(&self) -> &FormSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut FormSession {
        &mut self.session
    }

    /// Apply an action. With live validation on, every change re-checks the
    /// document and refreshes the errors shown.
    pub fn apply(&mut self, action: Action) -> Effect {
        let effect = update(&mut self.session, action);
        if effect == Effect::Changed && self.session.config().live_validation {
            self.check();
        }
        effect
    }

    /// Validate and, on success, finish the session.
    pub fn submit(&mut self) -> Submission<T> {
        if self.session.phase() == Phase::Accepted {
            warn!("Ignoring submit on an accepted form");
            return Submission::Closed;
        }
        self.session.set_phase(Phase::Submitting);
        match validate::<T>(&mut self.session) {
            Ok(instance) => {
                info!("Form accepted");
                self.session.set_phase(Phase::Accepted);
                Submission::Accepted(instance)
            }
            Err(errors) => {
                info!("Form rejected with {} errors", errors.len());
                self.session.set_phase(Phase::Editing);
                Submission::Rejected(errors)
            }
        }
    }

    /// Validate without finishing; errors are attached to the session.
    /// An accepted form is left as it is.
    pub fn check(&mut self) -> ValidationErrors {
        if self.session.phase() == Phase::Accepted {
            return ValidationErrors::default();
        }
        validate::<T>(&mut self.session).err().unwrap_or_default()
    }
}

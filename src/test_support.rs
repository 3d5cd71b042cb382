//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::action::{Action, update};
use crate::core::config::FormConfig;
use crate::core::descriptor::FieldPath;
use crate::core::form::FormSession;
use crate::core::registry::WidgetRegistry;
use crate::core::schema::ModelSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub age: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Colors {
    Blue,
    Red,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Normal {
    #[serde(default = "default_seats")]
    pub seats: u8,
}

fn default_seats() -> u8 {
    5
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Sports {
    pub top_speed: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum Edition {
    Normal(Normal),
    Sports(Sports),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Car {
    pub color: Colors,
    pub edition: Edition,
    #[serde(default = "enabled")]
    pub extra_insurance: bool,
}

fn enabled() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortKeyword {
    Any,
    Opaque,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Ports {
    Number(u16),
    Keyword(PortKeyword),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Server {
    #[serde(default = "default_ports")]
    pub ports: Ports,
    pub tags: Vec<String>,
}

fn default_ports() -> Ports {
    Ports::Number(10)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Limits {
    pub name: String,
    pub low: u8,
    pub high: u8,
}

pub fn person_schema() -> ModelSchema {
    ModelSchema::of::<Person>().unwrap()
}

pub fn car_schema() -> ModelSchema {
    ModelSchema::of::<Car>().unwrap()
}

pub fn server_schema() -> ModelSchema {
    ModelSchema::of::<Server>().unwrap()
}

pub fn limits_schema() -> ModelSchema {
    ModelSchema::of::<Limits>().unwrap()
}

/// Session with the default registry and config.
pub fn session_for(schema: ModelSchema, value: Option<&Value>) -> FormSession {
    FormSession::new(schema, WidgetRegistry::new(), FormConfig::default(), value)
        .expect("test schema should build")
}

/// Type `text` into the text entry at `path`, one key at a time.
pub fn type_into(session: &mut FormSession, path: &str, text: &str) {
    for ch in text.chars() {
        update(
            session,
            Action::InsertChar {
                path: FieldPath::parse(path),
                ch,
            },
        );
    }
}

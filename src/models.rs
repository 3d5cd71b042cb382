//! Sample models for the demo binary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A person.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Person {
    /// Full name
    pub name: String,
    #[serde(default)]
    pub age: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Colors {
    Blue,
    Red,
    Green,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Normal {
    #[serde(default = "default_seats")]
    pub seats: u8,
}

fn default_seats() -> u8 {
    5
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Sports {
    /// Top speed in km/h
    pub top_speed: u32,
    pub spoiler: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub enum Edition {
    Normal(Normal),
    Sports(Sports),
}

/// A car to insure.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Car {
    pub color: Colors,
    pub edition: Edition,
    #[serde(default = "enabled")]
    pub extra_insurance: bool,
}

fn enabled() -> bool {
    true
}

impl Car {
    pub fn sample() -> Self {
        Self {
            color: Colors::Red,
            edition: Edition::Sports(Sports {
                top_speed: 250,
                spoiler: Some(true),
            }),
            extra_insurance: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortKeyword {
    Any,
    Opaque,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Ports {
    Number(u16),
    Keyword(PortKeyword),
}

/// A server listening on some ports.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Server {
    #[serde(default = "default_ports")]
    pub ports: Ports,
    #[schemars(length(min = 1))]
    pub hostname: String,
    pub tags: Vec<String>,
}

fn default_ports() -> Ports {
    Ports::Number(10)
}

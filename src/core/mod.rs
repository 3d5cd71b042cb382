//! # Core Form Logic
//!
//! Everything tickform knows about models and forms, independent of any
//! terminal.
//!
//! ```text
//!   T: Model ──schemars──▶ ModelSchema
//!                              │ classify()
//!                              ▼
//!                       FieldDescriptor ──WidgetRegistry──▶ Widget
//!                              │                              │
//!                              └──────── FormSession ◀────────┘
//!                                            │ update(Action)
//!                                            ▼
//!                                        validate()
//!                                   jsonschema + serde
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: the model's JSON Schema and reference resolution
//! - [`classify`]: the closed set of annotation kinds
//! - [`descriptor`]: field paths and per-field metadata
//! - [`widget`]: widget state and pre-population
//! - [`registry`]: annotation kind to widget constructor
//! - [`form`]: the form assembler and the session
//! - [`action`]: the `Action` enum and `update()`
//! - [`validate`]: the validation bridge
//! - [`model`]: the typed `Form<T>` facade
//! - [`config`]: `~/.tickform/config.toml`

pub mod action;
pub mod classify;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod form;
pub mod model;
pub mod registry;
pub mod schema;
pub mod validate;
pub mod widget;

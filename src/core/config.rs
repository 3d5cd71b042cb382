//! # Configuration
//!
//! Centralizes all form settings with a clear override hierarchy:
//! defaults → config file → env vars → programmatic/CLI overrides.
//!
//! Config lives at `~/.tickform/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::classify::AnnotationKind;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TickformConfig {
    #[serde(default)]
    pub form: FormSection,
    /// Field path (`edition.engine`) → label.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Field path → labels of the two boolean options.
    #[serde(default)]
    pub boolean_labels: BTreeMap<String, BooleanLabels>,
    /// Annotation kind (`boolean`, `enumeration`, ...) → widget override.
    #[serde(default)]
    pub widgets: BTreeMap<String, WidgetChoice>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FormSection {
    pub title: Option<String>,
    pub submit_label: Option<String>,
    pub cancel_label: Option<String>,
    pub live_validation: Option<bool>,
    pub show_model_info: Option<bool>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BooleanLabels {
    pub true_label: String,
    pub false_label: String,
}

impl Default for BooleanLabels {
    fn default() -> Self {
        Self {
            true_label: "True".to_string(),
            false_label: "False".to_string(),
        }
    }
}

/// Widget a whole annotation kind can be switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetChoice {
    /// Typed text entry (booleans and literals are typed as JSON).
    Text,
    /// Raw JSON entry for the whole field.
    Json,
    /// Option list (the default for booleans and enumerations).
    Choice,
}

impl WidgetChoice {
    /// Whether this widget can edit fields of `kind`.
    pub fn supports(self, kind: AnnotationKind) -> bool {
        use AnnotationKind::*;
        match self {
            WidgetChoice::Json => true,
            WidgetChoice::Text => matches!(
                kind,
                Text | Integer | Number | Boolean | Enumeration | LiteralSet
            ),
            WidgetChoice::Choice => matches!(kind, Boolean | Enumeration | LiteralSet),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SUBMIT_LABEL: &str = "OK";
pub const DEFAULT_CANCEL_LABEL: &str = "CANCEL";
pub const DEFAULT_MAX_DEPTH: usize = 16;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FormConfig {
    /// Overrides the schema title when set.
    pub title: Option<String>,
    pub submit_label: String,
    pub cancel_label: String,
    pub live_validation: bool,
    pub show_model_info: bool,
    pub max_depth: usize,
    pub labels: BTreeMap<String, String>,
    pub boolean_labels: BTreeMap<String, BooleanLabels>,
    pub widgets: BTreeMap<AnnotationKind, WidgetChoice>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            title: None,
            submit_label: DEFAULT_SUBMIT_LABEL.to_string(),
            cancel_label: DEFAULT_CANCEL_LABEL.to_string(),
            live_validation: false,
            show_model_info: false,
            max_depth: DEFAULT_MAX_DEPTH,
            labels: BTreeMap::new(),
            boolean_labels: BTreeMap::new(),
            widgets: BTreeMap::new(),
        }
    }
}

impl FormConfig {
    /// Labels for the boolean field at `path` (`"True"`/`"False"` unless
    /// configured).
    pub fn boolean_labels_for(&self, path: &str) -> BooleanLabels {
        self.boolean_labels.get(path).cloned().unwrap_or_default()
    }
}

/// Programmatic overrides, applied last (e.g. from CLI flags).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub title: Option<String>,
    pub live_validation: Option<bool>,
    pub show_model_info: Option<bool>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid widget `{widget:?}` for `{kind}`")]
    InvalidWidget { kind: String, widget: WidgetChoice },
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.tickform/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".tickform").join("config.toml"))
}

/// Load config from `~/.tickform/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `TickformConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<TickformConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(TickformConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(TickformConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. A missing file is an error here.
pub fn load_config_from(path: &Path) -> Result<TickformConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: TickformConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# tickform configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [form]
# title = "Edit car"                 # Overrides the model's schema title
# submit_label = "OK"
# cancel_label = "CANCEL"
# live_validation = false            # Or set TICKFORM_LIVE_VALIDATION=1
# show_model_info = false            # Or set TICKFORM_SHOW_MODEL_INFO=1
# max_depth = 16                     # Deepest nesting a form may build

# [labels]
# "edition.engine" = "Engine"

# [boolean_labels]
# extra_insurance = { true_label = "Yes please", false_label = "No thanks" }

# [widgets]
# boolean = "text"                   # "text", "json" or "choice"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env
/// vars → overrides. Fails only on an invalid `[widgets]` table.
pub fn resolve(config: &TickformConfig, overrides: &Overrides) -> Result<FormConfig, ConfigError> {
    let form = &config.form;

    let live_validation = overrides
        .live_validation
        .or_else(|| env_flag("TICKFORM_LIVE_VALIDATION"))
        .or(form.live_validation)
        .unwrap_or(false);

    let show_model_info = overrides
        .show_model_info
        .or_else(|| env_flag("TICKFORM_SHOW_MODEL_INFO"))
        .or(form.show_model_info)
        .unwrap_or(false);

    let mut widgets = BTreeMap::new();
    for (name, widget) in &config.widgets {
        let kind: AnnotationKind = name.parse().map_err(|_| ConfigError::InvalidWidget {
            kind: name.clone(),
            widget: *widget,
        })?;
        if !widget.supports(kind) {
            return Err(ConfigError::InvalidWidget {
                kind: name.clone(),
                widget: *widget,
            });
        }
        widgets.insert(kind, *widget);
    }

    Ok(FormConfig {
        title: overrides.title.clone().or_else(|| form.title.clone()),
        submit_label: form
            .submit_label
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBMIT_LABEL.to_string()),
        cancel_label: form
            .cancel_label
            .clone()
            .unwrap_or_else(|| DEFAULT_CANCEL_LABEL.to_string()),
        live_validation,
        show_model_info,
        max_depth: form.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        labels: config.labels.clone(),
        boolean_labels: config.boolean_labels.clone(),
        widgets,
    })
}

/// Reads a boolean environment flag (`1`, `true`, `yes`, `on`).
fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!("Ignoring {name}={other}: expected a boolean");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = TickformConfig::default();
        assert!(config.labels.is_empty());
        assert!(config.form.title.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve(&TickformConfig::default(), &Overrides::default()).unwrap();
        assert_eq!(resolved.submit_label, DEFAULT_SUBMIT_LABEL);
        assert_eq!(resolved.cancel_label, DEFAULT_CANCEL_LABEL);
        assert_eq!(resolved.max_depth, DEFAULT_MAX_DEPTH);
        assert!(resolved.widgets.is_empty());
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = TickformConfig {
            form: FormSection {
                title: Some("Edit car".to_string()),
                submit_label: Some("Save".to_string()),
                max_depth: Some(4),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve(&config, &Overrides::default()).unwrap();
        assert_eq!(resolved.title.as_deref(), Some("Edit car"));
        assert_eq!(resolved.submit_label, "Save");
        assert_eq!(resolved.max_depth, 4);
    }

    #[test]
    fn test_overrides_win() {
        let config = TickformConfig {
            form: FormSection {
                title: Some("From file".to_string()),
                live_validation: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let overrides = Overrides {
            title: Some("From CLI".to_string()),
            live_validation: Some(true),
            show_model_info: None,
        };
        let resolved = resolve(&config, &overrides).unwrap();
        assert_eq!(resolved.title.as_deref(), Some("From CLI"));
        assert!(resolved.live_validation);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[form]
title = "Edit car"
live_validation = true

[labels]
"edition.engine" = "Engine"

[boolean_labels]
extra_insurance = { true_label = "Yes please", false_label = "No thanks" }

[widgets]
boolean = "text"
union = "json"
"#;
        let config: TickformConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.form.live_validation, Some(true));
        assert_eq!(config.labels["edition.engine"], "Engine");

        let resolved = resolve(&config, &Overrides::default()).unwrap();
        assert_eq!(
            resolved.boolean_labels_for("extra_insurance").true_label,
            "Yes please"
        );
        assert_eq!(resolved.boolean_labels_for("other").false_label, "False");
        assert_eq!(resolved.widgets[&AnnotationKind::Boolean], WidgetChoice::Text);
        assert_eq!(resolved.widgets[&AnnotationKind::Union], WidgetChoice::Json);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[form]
max_depth = 3
"#;
        let config: TickformConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.form.max_depth, Some(3));
        assert!(config.form.submit_label.is_none());
        assert!(config.widgets.is_empty());
    }

    #[test]
    fn test_invalid_widget_combination() {
        let config: TickformConfig = toml::from_str("[widgets]\nnested_model = \"choice\"\n").unwrap();
        let err = resolve(&config, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWidget { .. }));
    }

    #[test]
    fn test_unknown_widget_kind() {
        let config: TickformConfig = toml::from_str("[widgets]\nslider = \"json\"\n").unwrap();
        assert!(resolve(&config, &Overrides::default()).is_err());
    }

    #[test]
    fn test_unknown_widget_name_is_parse_error() {
        let result: Result<TickformConfig, _> = toml::from_str("[widgets]\nboolean = \"slider\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_missing_file() {
        let err = load_config_from(Path::new("/nonexistent/tickform.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

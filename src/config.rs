//! Runtime configuration for applications.
//!
//! Values come from code, from `REFLECTIVE_DI_*` environment variables, or,
//! with the `config` feature, from JSON.

use std::env;

use crate::error::{DiError, DiResult};

const ENV_PREFIX: &str = "REFLECTIVE_DI";

/// Settings read by [`Application::create`](crate::Application::create).
///
/// ```rust
/// use reflective_di::RuntimeConfig;
///
/// let config = RuntimeConfig::new("billing").eager_instantiation(false);
/// assert_eq!(config.name, "billing");
/// assert!(!config.eager_instantiation);
/// assert!(!config.trace_resolution);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RuntimeConfig {
    /// Name of the application injector.
    pub name: String,
    /// Build every singleton when the application starts.
    pub eager_instantiation: bool,
    /// Attach a [`TracingObserver`](crate::TracingObserver) to the application injector.
    pub trace_resolution: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            eager_instantiation: true,
            trace_resolution: false,
        }
    }
}

impl RuntimeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn eager_instantiation(mut self, eager: bool) -> Self {
        self.eager_instantiation = eager;
        self
    }

    pub fn trace_resolution(mut self, trace: bool) -> Self {
        self.trace_resolution = trace;
        self
    }

    /// Reads `REFLECTIVE_DI_NAME`, `REFLECTIVE_DI_EAGER` and
    /// `REFLECTIVE_DI_TRACE`. Unset variables keep their defaults.
    pub fn from_env() -> DiResult<Self> {
        let mut config = Self::default();
        if let Some(name) = env_var("name") {
            config.name = name;
        }
        if let Some(eager) = env_var("eager") {
            config.eager_instantiation = parse_bool("eager", &eager)?;
        }
        if let Some(trace) = env_var("trace") {
            config.trace_resolution = parse_bool("trace", &trace)?;
        }
        Ok(config)
    }

    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::Config(e.to_string()))
    }

    #[cfg(feature = "config")]
    pub fn to_json(&self) -> DiResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DiError::Config(e.to_string()))
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(format!("{}_{}", ENV_PREFIX, key.to_uppercase())).ok()
}

fn parse_bool(key: &str, value: &str) -> DiResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(DiError::Config(format!(
            "{}_{} must be a boolean, got '{}'",
            ENV_PREFIX,
            key.to_uppercase(),
            other
        ))),
    }
}

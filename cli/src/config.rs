//! Environment-driven configuration for the demo binary.

use std::str::FromStr;

use cmdtree_core::TermStyle;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter directive.
pub const LOG_VAR: &str = "CMDTREE_LOG";
/// Environment variable selecting when help output is styled.
pub const COLOR_VAR: &str = "CMDTREE_COLOR";

const FALLBACK_LOG_VAR: &str = "RUST_LOG";
const NO_COLOR_VAR: &str = "NO_COLOR";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: expected one of auto, always, never")]
    InvalidColor { var: &'static str, value: String },
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidLogFilter {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// Exit code for configuration errors (`EX_CONFIG`).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        78
    }
}

/// When to style help and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Style only when the terminal supports it.
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err(ConfigError::InvalidColor {
                var: COLOR_VAR,
                value: s.to_string(),
            }),
        }
    }
}

/// Resolved configuration for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Tracing filter directive, e.g. `debug` or `cmdtree_core=trace`.
    pub log_filter: String,
    /// Variable `log_filter` was read from.
    pub log_var: &'static str,
    pub color: ColorMode,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_var: LOG_VAR,
            color: ColorMode::Auto,
        }
    }
}

impl DemoConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// `CMDTREE_LOG` wins over `RUST_LOG`; an empty value counts as unset.
    /// A set `NO_COLOR` forces [`ColorMode::Never`], but an invalid
    /// `CMDTREE_COLOR` is still reported.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let (log_var, log_filter) = non_empty(LOG_VAR)
            .map(|value| (LOG_VAR, value))
            .or_else(|| non_empty(FALLBACK_LOG_VAR).map(|value| (FALLBACK_LOG_VAR, value)))
            .unwrap_or_else(|| (LOG_VAR, DEFAULT_LOG_FILTER.to_string()));

        let mut color = match non_empty(COLOR_VAR) {
            Some(value) => value.parse()?,
            None => ColorMode::Auto,
        };
        if lookup(NO_COLOR_VAR).is_some_and(|value| !value.is_empty()) {
            color = ColorMode::Never;
        }

        let config = Self {
            log_filter,
            log_var,
            color,
        };
        config.env_filter()?;
        Ok(config)
    }

    /// Parses `log_filter` into a tracing filter.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.log_filter).map_err(|err| ConfigError::InvalidLogFilter {
            var: self.log_var,
            value: self.log_filter.clone(),
            reason: err.to_string(),
        })
    }

    /// Style for the app's help and diagnostics.
    pub fn style(&self) -> TermStyle {
        match self.color {
            ColorMode::Auto => TermStyle::auto(),
            ColorMode::Always => TermStyle::forced(true),
            ColorMode::Never => TermStyle::forced(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<DemoConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DemoConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]).unwrap(), DemoConfig::default());
    }

    #[test]
    fn test_log_filter_precedence() {
        assert_eq!(config(&[("RUST_LOG", "info")]).unwrap().log_filter, "info");
        assert_eq!(
            config(&[("RUST_LOG", "info"), ("CMDTREE_LOG", "debug")])
                .unwrap()
                .log_filter,
            "debug"
        );
        assert_eq!(config(&[("CMDTREE_LOG", " ")]).unwrap().log_filter, "warn");
    }

    #[test]
    fn test_color_modes() {
        assert_eq!(config(&[("CMDTREE_COLOR", "always")]).unwrap().color, ColorMode::Always);
        assert_eq!(config(&[("CMDTREE_COLOR", "NEVER")]).unwrap().color, ColorMode::Never);
        assert_eq!(
            config(&[("CMDTREE_COLOR", "always"), ("NO_COLOR", "1")])
                .unwrap()
                .color,
            ColorMode::Never
        );
        assert_eq!(config(&[("NO_COLOR", "")]).unwrap().color, ColorMode::Auto);
    }

    #[test]
    fn test_invalid_color_is_config_error() {
        let err = config(&[("CMDTREE_COLOR", "sometimes"), ("NO_COLOR", "1")]).unwrap_err();
        assert_eq!(err.exit_code(), 78);
        assert_eq!(
            err.to_string(),
            "invalid value \"sometimes\" for CMDTREE_COLOR: expected one of auto, always, never"
        );
    }

    #[test]
    fn test_invalid_log_filter_is_config_error() {
        let err = config(&[("CMDTREE_LOG", "cmdtree=loud")]).unwrap_err();
        assert_eq!(err.exit_code(), 78);
        assert!(matches!(
            err,
            ConfigError::InvalidLogFilter { var: "CMDTREE_LOG", ref value, .. } if value == "cmdtree=loud"
        ));

        let err = config(&[("RUST_LOG", "cmdtree=loud")]).unwrap_err();
        assert!(err.to_string().starts_with("invalid value \"cmdtree=loud\" for RUST_LOG: "));

        let ok = config(&[("CMDTREE_LOG", "cmdtree_core=trace,warn")]).unwrap();
        assert!(ok.env_filter().is_ok());
    }

    #[test]
    fn test_style_respects_mode() {
        use cmdtree_core::Style;

        let never = DemoConfig {
            color: ColorMode::Never,
            ..DemoConfig::default()
        };
        assert_eq!(never.style().bold("USAGE:"), "USAGE:");
    }
}

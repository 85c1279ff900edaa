//! Flag definitions and value coercion.
//!
//! A [`Flag`] is an immutable template: it describes one named, typed input
//! a command accepts and never holds a parsed value. Parsed values live in
//! the per-invocation [`Context`](crate::Context) as [`FlagValue`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Value type of a flag.
///
/// # Examples
///
/// ```
/// use cmdtree_core::ValueType;
///
/// assert!(ValueType::Integer.takes_value());
/// assert!(!ValueType::Boolean.takes_value());
/// assert_eq!(ValueType::String.to_string(), "string");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Free-form text.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// Presence switch; consumes no value token.
    Boolean,
}

impl ValueType {
    /// Lowercase type name used in help and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    /// Whether a flag of this type consumes a value.
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::Boolean)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced flag value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl FlagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The [`ValueType`] this value belongs to.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Boolean(_) => ValueType::Boolean,
            Self::Integer(_) => ValueType::Integer,
            Self::String(_) => ValueType::String,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Definition of one flag a command accepts.
///
/// Build flags with [`Flag::string`], [`Flag::integer`] or
/// [`Flag::boolean`], then chain [`with_short`](Flag::with_short),
/// [`with_default`](Flag::with_default) or
/// [`with_choices`](Flag::with_choices).
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Flag, FlagValue, ValueType};
///
/// let name = Flag::string("name", "Who to greet", true).with_short('n');
/// assert_eq!(name.name(), "name");
/// assert_eq!(name.short(), Some('n'));
/// assert!(name.is_required());
///
/// let times = Flag::integer("times", "Repetitions", false).with_default(3_i64);
/// assert_eq!(times.default_value(), Some(&FlagValue::Integer(3)));
///
/// let verbose = Flag::boolean("verbose", "Chatty output");
/// assert_eq!(verbose.value_type(), ValueType::Boolean);
/// assert!(!verbose.is_required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    name: String,
    short: Option<char>,
    usage: String,
    value_type: ValueType,
    required: bool,
    default: Option<FlagValue>,
    choices: Vec<String>,
}

impl Flag {
    fn new(name: &str, usage: &str, value_type: ValueType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            usage: usage.to_string(),
            value_type,
            required,
            default: None,
            choices: Vec::new(),
        }
    }

    /// Creates a string flag.
    pub fn string(name: &str, usage: &str, required: bool) -> Self {
        Self::new(name, usage, ValueType::String, required)
    }

    /// Creates an integer flag.
    pub fn integer(name: &str, usage: &str, required: bool) -> Self {
        Self::new(name, usage, ValueType::Integer, required)
    }

    /// Creates a boolean flag. Boolean flags are never required and read
    /// as `false` when absent.
    pub fn boolean(name: &str, usage: &str) -> Self {
        Self::new(name, usage, ValueType::Boolean, false)
    }

    /// Adds a single-letter alias (`-n` for `--name`).
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Sets the value used when the flag is not supplied.
    pub fn with_default(mut self, value: impl Into<FlagValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts a string flag to a fixed set of values.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Long name, matched as `--name`; also the key in the context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Single-letter alias, matched as `-x`.
    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Type values are coerced to.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether resolution fails when the flag is absent.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Declared default, if any. See [`Flag::implicit_value`] for what an
    /// absent flag actually reads as.
    pub fn default_value(&self) -> Option<&FlagValue> {
        self.default.as_ref()
    }

    /// Allowed values of a string flag; empty means unrestricted.
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Value stored in the context when the flag is not supplied.
    ///
    /// Booleans fall back to `false`; other types only have one when a
    /// default was declared.
    pub fn implicit_value(&self) -> Option<FlagValue> {
        match (&self.default, self.value_type) {
            (Some(value), _) => Some(value.clone()),
            (None, ValueType::Boolean) => Some(FlagValue::Boolean(false)),
            (None, _) => None,
        }
    }

    /// Human-readable description of the accepted values.
    pub fn expected(&self) -> String {
        if self.choices.is_empty() {
            self.value_type.as_str().to_string()
        } else {
            format!("one of: {}", self.choices.join(", "))
        }
    }

    /// Coerces a raw token into this flag's type.
    ///
    /// `raw` is `None` when the flag appeared without a value, which is
    /// only valid for booleans. `command` is the resolved command path,
    /// carried into the error.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdtree_core::{Flag, FlagValue};
    ///
    /// let count = Flag::integer("count", "", false);
    /// assert_eq!(count.coerce(Some("42"), "app").unwrap(), FlagValue::Integer(42));
    /// assert!(count.coerce(Some("forty"), "app").is_err());
    ///
    /// let quiet = Flag::boolean("quiet", "");
    /// assert_eq!(quiet.coerce(None, "app").unwrap(), FlagValue::Boolean(true));
    /// ```
    pub fn coerce(&self, raw: Option<&str>, command: &str) -> Result<FlagValue, ResolveError> {
        let Some(raw) = raw else {
            return match self.value_type {
                ValueType::Boolean => Ok(FlagValue::Boolean(true)),
                _ => Err(ResolveError::MissingFlagValue {
                    command: command.to_string(),
                    flag: self.name.clone(),
                }),
            };
        };

        let mismatch = || ResolveError::FlagTypeMismatch {
            command: command.to_string(),
            flag: self.name.clone(),
            expected: self.expected(),
            value: raw.to_string(),
        };

        match self.value_type {
            ValueType::Boolean => match raw {
                "true" => Ok(FlagValue::Boolean(true)),
                "false" => Ok(FlagValue::Boolean(false)),
                _ => Err(mismatch()),
            },
            ValueType::Integer => raw
                .parse::<i64>()
                .map(FlagValue::Integer)
                .map_err(|_| mismatch()),
            ValueType::String => {
                if !self.choices.is_empty() && !self.choices.iter().any(|c| c == raw) {
                    return Err(mismatch());
                }
                Ok(FlagValue::String(raw.to_string()))
            }
        }
    }
}

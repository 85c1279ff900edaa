//! Error types for registration, resolution and dispatch.
//!
//! Three layers of failure are kept apart:
//!
//! - [`RegistryError`]: a caller built an invalid command tree. These are
//!   programming errors surfaced at startup through the registration API.
//! - [`ResolveError`]: the invocation's tokens do not fit the registered
//!   tree. These never escape [`App::run`](crate::App::run) as panics; they
//!   are printed as a one-line diagnostic and returned inside [`RunError`].
//! - [`RunError`]: everything `run` reports back to the host program.

use thiserror::Error;

/// Errors raised while registering commands and flags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Command or flag name is empty or whitespace-only.
    #[error("name cannot be empty")]
    EmptyName,
    /// Name contains characters that the resolver would split on.
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    /// Name collides with one of the reserved help tokens.
    #[error("reserved name: {0:?}")]
    ReservedName(String),
    /// Two sibling commands share a name.
    #[error("duplicate command '{name}' under '{parent}'")]
    DuplicateCommand { parent: String, name: String },
    /// Two flags on the same command share a name.
    #[error("duplicate flag '--{name}' on '{command}'")]
    DuplicateFlag { command: String, name: String },
    /// Two flags on the same command share a short alias.
    #[error("duplicate short flag '-{short}' on '{command}'")]
    DuplicateShort { command: String, short: char },
    /// A required flag also declares a default value.
    #[error("flag '--{0}' cannot be required and have a default value")]
    RequiredWithDefault(String),
    /// A default value does not match the flag's declared type.
    #[error("default for flag '--{flag}' must be of type {expected}")]
    DefaultTypeMismatch { flag: String, expected: String },
    /// A default value is not one of the flag's allowed choices.
    #[error("default '{value}' for flag '--{flag}' is not an allowed choice")]
    InvalidDefaultChoice { flag: String, value: String },
    /// Two positional arguments on the same command share a name.
    #[error("duplicate argument '{name}' on '{command}'")]
    DuplicateArg { command: String, name: String },
    /// A required argument follows an optional one, or any argument
    /// follows a repeating one.
    #[error("argument '{name}' on '{command}' cannot follow an optional or repeating argument")]
    MisplacedArg { command: String, name: String },
    /// A [`CommandId`](crate::CommandId) from another registry was used.
    #[error("unknown command id")]
    UnknownCommandId,
}

/// Errors raised while resolving an invocation against the command tree.
///
/// `command` fields hold the space-separated command path (starting with
/// the app name) that was resolved when the error was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A positional token was left over where a child command was expected.
    #[error("unknown command: '{name}' is not a command of '{command}'")]
    UnknownCommand { command: String, name: String },
    /// A flag token matched no flag in scope.
    #[error("unknown flag: '{token}' for '{command}'")]
    UnknownFlag { command: String, token: String },
    /// A value-taking flag was the last token.
    #[error("missing flag value: '--{flag}' requires a value")]
    MissingFlagValue { command: String, flag: String },
    /// A flag value could not be coerced to the declared type.
    #[error("flag type mismatch: '--{flag}' expects {expected}, got '{value}'")]
    FlagTypeMismatch {
        command: String,
        flag: String,
        expected: String,
        value: String,
    },
    /// A required flag was not supplied.
    #[error("missing required flag: '--{flag}' for '{command}'")]
    MissingRequiredFlag { command: String, flag: String },
    /// Fewer positionals than the command's required arguments.
    #[error("missing argument: '<{name}>' for '{command}'")]
    MissingArgument { command: String, name: String },
    /// More positionals than the command declares.
    #[error("too many arguments: '{command}' takes at most {expected}, got {received}")]
    TooManyArguments {
        command: String,
        expected: usize,
        received: usize,
    },
}

impl ResolveError {
    /// Short kind label, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCommand { .. } => "unknown command",
            Self::UnknownFlag { .. } => "unknown flag",
            Self::MissingFlagValue { .. } => "missing flag value",
            Self::FlagTypeMismatch { .. } => "flag type mismatch",
            Self::MissingRequiredFlag { .. } => "missing required flag",
            Self::MissingArgument { .. } => "missing argument",
            Self::TooManyArguments { .. } => "too many arguments",
        }
    }
}

/// Failure reported by [`App::run`](crate::App::run).
#[derive(Debug, Error)]
pub enum RunError {
    /// Resolution failed; the diagnostic has already been written.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The dispatched action failed. The error is the action's own.
    #[error(transparent)]
    Action(anyhow::Error),
    /// Writing help or a diagnostic failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Resolve(_) => 2,
            Self::Action(_) => 1,
            Self::Io(_) => 74,
        }
    }
}

/// Convenience alias for registration results.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_display_is_single_line_with_kind() {
        let err = ResolveError::MissingRequiredFlag {
            command: "demo greet".to_string(),
            flag: "name".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with(err.kind()));
        assert!(text.contains("--name"));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn run_error_exit_codes() {
        let resolve = RunError::from(ResolveError::UnknownFlag {
            command: "demo".to_string(),
            token: "--nope".to_string(),
        });
        assert_eq!(resolve.exit_code(), 2);
        assert_eq!(RunError::Action(anyhow::anyhow!("boom")).exit_code(), 1);
    }
}

//! The argument resolver.
//!
//! Turns the raw token list of one invocation (program name excluded) into
//! a [`Resolution`] or a [`ResolveError`]. Resolution runs in two states:
//!
//! 1. **Command path.** While the next token exactly names a child of the
//!    current node (and is not a help token), descend into that child.
//! 2. **Arguments.** Every remaining token is classified on its own:
//!    `--name`, `--name=value`, `-n`, `-n=value`, the end-of-flags marker
//!    `--`, a help token, or a positional. Flags and positionals may
//!    interleave; value-taking flags consume the next token verbatim.
//!
//! A runnable node then checks that every required flag in scope was
//! supplied and, when it declares positional arguments, that the number of
//! positionals fits them.
//!
//! Both loops are driven by a [`Cursor`] whose only way to yield a token is
//! to move past it, so each iteration strictly advances and the arguments
//! state performs at most one classification step per token.

use tracing::{debug, trace};

use crate::app::App;
use crate::command::Command;
use crate::error::ResolveError;
use crate::flag::{Flag, FlagValue};
use crate::registry::{CommandId, Registry};

pub(crate) const HELP_WORD: &str = "help";
const HELP_LONG: &str = "--help";
const HELP_SHORT: &str = "-h";
const END_OF_FLAGS: &str = "--";

/// Whether `token` is one of the reserved help tokens (`help`, `--help`, `-h`).
pub fn is_help_token(token: &str) -> bool {
    matches!(token, HELP_WORD | HELP_LONG | HELP_SHORT)
}

/// Successful outcome of resolving an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A runnable command (or the root action) was resolved.
    Resolved(Invocation),
    /// Help was requested for a command, or for the root when `None`.
    HelpRequested(Option<CommandId>),
}

/// One flag occurrence accepted by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppliedFlag {
    /// Canonical (long) name of the flag.
    pub name: String,
    /// The raw value token, if the flag took or was given one.
    pub raw: Option<String>,
    /// The value coerced to the flag's declared type.
    pub value: FlagValue,
}

/// The resolved command, its positionals, and the flags as supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    command: Option<CommandId>,
    positionals: Vec<String>,
    supplied: Vec<SuppliedFlag>,
    steps: usize,
}

impl Invocation {
    /// The resolved command; `None` when the root action is the target.
    pub fn command(&self) -> Option<CommandId> {
        self.command
    }

    /// Positional tokens in the order given.
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// Flag occurrences in the order they appeared.
    pub fn supplied(&self) -> &[SuppliedFlag] {
        &self.supplied
    }

    /// Number of token-classification steps taken after the command path.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Resolves `tokens` against the app's command tree.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{resolve, App, Command, Flag, Resolution};
///
/// let mut app = App::new("demo");
/// let greet = app
///     .add_command(
///         Command::new("greet")
///             .with_flag(Flag::string("name", "Who to greet", true))
///             .with_action(|_| Ok(())),
///     )
///     .unwrap();
///
/// match resolve(&app, &["greet", "--name", "Ana"]).unwrap() {
///     Resolution::Resolved(invocation) => {
///         assert_eq!(invocation.command(), Some(greet));
///         assert_eq!(invocation.supplied()[0].name, "name");
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
///
/// assert_eq!(
///     resolve(&app, &["greet", "--help"]).unwrap(),
///     Resolution::HelpRequested(Some(greet))
/// );
/// assert!(resolve(&app, &["greet"]).is_err());
/// ```
pub fn resolve<S: AsRef<str>>(app: &App, tokens: &[S]) -> Result<Resolution, ResolveError> {
    let outcome = Resolver::new(app, tokens).run();
    match &outcome {
        Ok(Resolution::Resolved(invocation)) => debug!(
            command = %app.registry().display_path(invocation.command),
            positionals = invocation.positionals.len(),
            flags = invocation.supplied.len(),
            "resolved invocation"
        ),
        Ok(Resolution::HelpRequested(scope)) => debug!(
            command = %app.registry().display_path(*scope),
            "help requested"
        ),
        Err(err) => debug!(error = %err, "resolution failed"),
    }
    outcome
}

enum Token<'t> {
    Help,
    EndOfFlags,
    Long { name: &'t str, value: Option<&'t str> },
    Short { alias: char, value: Option<&'t str> },
    Positional(&'t str),
}

fn classify(token: &str) -> Token<'_> {
    if is_help_token(token) {
        return Token::Help;
    }
    if token == END_OF_FLAGS {
        return Token::EndOfFlags;
    }
    if let Some(long) = token.strip_prefix("--") {
        return match long.split_once('=') {
            Some((name, value)) => Token::Long {
                name,
                value: Some(value),
            },
            None => Token::Long {
                name: long,
                value: None,
            },
        };
    }
    if let Some(rest) = token.strip_prefix('-') {
        let mut chars = rest.chars();
        // `-4` is a negative number, not an alias.
        if let Some(alias) = chars.next().filter(|c| !c.is_ascii_digit()) {
            let tail = chars.as_str();
            if tail.is_empty() {
                return Token::Short { alias, value: None };
            }
            if let Some(value) = tail.strip_prefix('=') {
                return Token::Short {
                    alias,
                    value: Some(value),
                };
            }
        }
    }
    Token::Positional(token)
}

/// Forward-only view over the token list.
struct Cursor<'t, S> {
    tokens: &'t [S],
    pos: usize,
}

impl<'t, S: AsRef<str>> Cursor<'t, S> {
    fn peek(&self) -> Option<&'t str> {
        self.tokens.get(self.pos).map(AsRef::as_ref)
    }

    /// Yields the current token and moves past it.
    fn advance(&mut self) -> Option<&'t str> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }
}

struct Resolver<'a, 't, S> {
    app: &'a App,
    registry: &'a Registry,
    cursor: Cursor<'t, S>,
    scope: Option<CommandId>,
    positionals: Vec<String>,
    supplied: Vec<SuppliedFlag>,
    steps: usize,
}

impl<'a, 't, S: AsRef<str>> Resolver<'a, 't, S> {
    fn new(app: &'a App, tokens: &'t [S]) -> Self {
        Self {
            app,
            registry: app.registry(),
            cursor: Cursor { tokens, pos: 0 },
            scope: None,
            positionals: Vec::new(),
            supplied: Vec::new(),
            steps: 0,
        }
    }

    fn run(mut self) -> Result<Resolution, ResolveError> {
        self.read_command_path();
        if self.read_arguments()? {
            return Ok(Resolution::HelpRequested(self.scope));
        }
        self.finish()
    }

    fn read_command_path(&mut self) {
        while let Some(token) = self.cursor.peek() {
            if is_help_token(token) {
                break;
            }
            let Some(child) = self.registry.find_child(self.scope, token) else {
                break;
            };
            self.cursor.advance();
            self.scope = Some(child);
            debug!(command = %self.command_path(), "descended into command");
        }
    }

    /// Consumes the rest of the tokens. Returns `true` if a help token cut
    /// the stream short.
    fn read_arguments(&mut self) -> Result<bool, ResolveError> {
        let registry = self.registry;
        let mut flags_done = false;

        while let Some(token) = self.cursor.advance() {
            self.steps += 1;
            if flags_done {
                self.positionals.push(token.to_string());
                continue;
            }

            trace!(token, "classifying token");
            match classify(token) {
                Token::Help => return Ok(true),
                Token::EndOfFlags => flags_done = true,
                Token::Long { name, value } => {
                    let flag = registry
                        .find_flag(self.scope, name)
                        .ok_or_else(|| self.unknown_flag(format!("--{name}")))?;
                    self.supply(flag, value)?;
                }
                Token::Short { alias, value } => {
                    let flag = registry
                        .find_short(self.scope, alias)
                        .ok_or_else(|| self.unknown_flag(format!("-{alias}")))?;
                    self.supply(flag, value)?;
                }
                Token::Positional(value) => self.positionals.push(value.to_string()),
            }
        }

        Ok(false)
    }

    fn supply(&mut self, flag: &Flag, inline: Option<&'t str>) -> Result<(), ResolveError> {
        let raw = match inline {
            Some(value) => Some(value),
            None if flag.value_type().takes_value() => {
                let value = self.cursor.advance().ok_or_else(|| ResolveError::MissingFlagValue {
                    command: self.command_path(),
                    flag: flag.name().to_string(),
                })?;
                Some(value)
            }
            None => None,
        };

        let value = flag.coerce(raw, &self.command_path())?;
        self.supplied.push(SuppliedFlag {
            name: flag.name().to_string(),
            raw: raw.map(str::to_string),
            value,
        });
        Ok(())
    }

    fn finish(self) -> Result<Resolution, ResolveError> {
        if !self.has_action() {
            let has_children = !self.registry.children(self.scope).is_empty();
            if let (true, Some(first)) = (has_children, self.positionals.first()) {
                return Err(ResolveError::UnknownCommand {
                    command: self.command_path(),
                    name: first.clone(),
                });
            }
            return Ok(Resolution::HelpRequested(self.scope));
        }

        self.check_required()?;
        self.check_arguments()?;

        Ok(Resolution::Resolved(Invocation {
            command: self.scope,
            positionals: self.positionals,
            supplied: self.supplied,
            steps: self.steps,
        }))
    }

    fn has_action(&self) -> bool {
        match self.scope {
            Some(id) => self.registry.get(id).is_some_and(Command::has_action),
            None => self.app.has_action(),
        }
    }

    /// Every required flag in scope must have been supplied. A flag hidden
    /// by a nearer one of the same name is not in scope.
    fn check_required(&self) -> Result<(), ResolveError> {
        let missing = self
            .registry
            .flags_in_scope(self.scope)
            .into_iter()
            .find(|flag| flag.is_required() && !self.supplied.iter().any(|s| s.name == flag.name()));
        match missing {
            Some(flag) => Err(ResolveError::MissingRequiredFlag {
                command: self.command_path(),
                flag: flag.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Positionals must cover the required arguments and, unless the last
    /// argument repeats, not outnumber the declared ones. Commands without
    /// declarations take any positionals.
    fn check_arguments(&self) -> Result<(), ResolveError> {
        let Some(command) = self.scope.and_then(|id| self.registry.get(id)) else {
            return Ok(());
        };
        let args = command.args();
        let received = self.positionals.len();

        if let Some(missing) = args.iter().filter(|a| a.is_required()).nth(received) {
            return Err(ResolveError::MissingArgument {
                command: self.command_path(),
                name: missing.name().to_string(),
            });
        }
        let repeats = args.last().is_some_and(|a| a.is_multiple());
        if !args.is_empty() && !repeats && received > args.len() {
            return Err(ResolveError::TooManyArguments {
                command: self.command_path(),
                expected: args.len(),
                received,
            });
        }
        Ok(())
    }

    fn unknown_flag(&self, token: String) -> ResolveError {
        ResolveError::UnknownFlag {
            command: self.command_path(),
            token,
        }
    }

    fn command_path(&self) -> String {
        self.registry.display_path(self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::Arg;

    fn noop(_: &crate::Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn app() -> App {
        let mut app = App::new("git").with_action(noop);
        app.add_flag(Flag::boolean("verbose", "").with_short('v')).unwrap();
        app.add_command(
            Command::new("commit")
                .with_flag(Flag::string("message", "", true).with_short('m'))
                .with_flag(Flag::integer("depth", "", false))
                .with_flag(Flag::boolean("amend", ""))
                .with_action(noop),
        )
        .unwrap();
        app.add_command(
            Command::new("remote")
                .with_subcommand(Command::new("add").with_action(noop))
                .with_subcommand(Command::new("remove").with_action(noop)),
        )
        .unwrap();
        app
    }

    fn resolved(app: &App, tokens: &[&str]) -> Invocation {
        match resolve(app, tokens) {
            Ok(Resolution::Resolved(invocation)) => invocation,
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_shapes() {
        assert!(matches!(classify("--help"), Token::Help));
        assert!(matches!(classify("help"), Token::Help));
        assert!(matches!(classify("-h"), Token::Help));
        assert!(matches!(classify("--"), Token::EndOfFlags));
        assert!(matches!(
            classify("--name=Ana"),
            Token::Long { name: "name", value: Some("Ana") }
        ));
        assert!(matches!(classify("--name"), Token::Long { name: "name", value: None }));
        assert!(matches!(classify("-n"), Token::Short { alias: 'n', value: None }));
        assert!(matches!(classify("-n=Ana"), Token::Short { alias: 'n', value: Some("Ana") }));
        assert!(matches!(classify("-abc"), Token::Positional("-abc")));
        assert!(matches!(classify("-42"), Token::Positional("-42")));
        assert!(matches!(classify("-4"), Token::Positional("-4")));
        assert!(matches!(classify("-"), Token::Positional("-")));
        assert!(matches!(classify("file.txt"), Token::Positional("file.txt")));
    }

    #[test]
    fn test_descends_command_path() {
        let app = app();
        let invocation = resolved(&app, &["remote", "add", "origin", "url"]);
        let add = app.registry().find_child(app.registry().find_child(None, "remote"), "add");
        assert_eq!(invocation.command(), add);
        assert_eq!(invocation.positionals(), ["origin", "url"]);
    }

    #[test]
    fn test_flag_forms() {
        let app = app();
        let invocation = resolved(&app, &["commit", "-m", "wip", "--depth=3", "--amend", "-v"]);
        let values: Vec<_> = invocation
            .supplied()
            .iter()
            .map(|s| (s.name.as_str(), s.value.clone()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("message", FlagValue::String("wip".into())),
                ("depth", FlagValue::Integer(3)),
                ("amend", FlagValue::Boolean(true)),
                ("verbose", FlagValue::Boolean(true)),
            ]
        );
        assert_eq!(invocation.steps(), 4);
    }

    #[test]
    fn test_value_flag_consumes_next_token_verbatim() {
        let app = app();
        let invocation = resolved(&app, &["commit", "--message", "--help"]);
        assert_eq!(invocation.supplied()[0].raw.as_deref(), Some("--help"));
    }

    #[test]
    fn test_interleaved_positionals() {
        let app = app();
        let invocation = resolved(&app, &["commit", "a", "-m", "x", "b", "--amend", "c"]);
        assert_eq!(invocation.positionals(), ["a", "b", "c"]);
    }

    #[test]
    fn test_end_of_flags_marker() {
        let app = app();
        let invocation = resolved(&app, &["commit", "-m", "x", "--", "--amend", "help"]);
        assert_eq!(invocation.positionals(), ["--amend", "help"]);
        assert_eq!(invocation.supplied().len(), 1);
    }

    #[test]
    fn test_help_short_circuits_validation() {
        let app = app();
        let commit = app.registry().find_child(None, "commit");
        assert_eq!(
            resolve(&app, &["commit", "--bogus=1", "-h"]).unwrap_err(),
            ResolveError::UnknownFlag {
                command: "git commit".into(),
                token: "--bogus".into(),
            }
        );
        assert_eq!(
            resolve(&app, &["commit", "extra", "-h", "--bogus"]).unwrap(),
            Resolution::HelpRequested(commit)
        );
        assert_eq!(resolve(&app, &["help"]).unwrap(), Resolution::HelpRequested(None));
        assert_eq!(resolve(&app, &["commit", "help"]).unwrap(), Resolution::HelpRequested(commit));
    }

    #[test]
    fn test_missing_flag_value() {
        let app = app();
        assert_eq!(
            resolve(&app, &["commit", "--message"]).unwrap_err(),
            ResolveError::MissingFlagValue {
                command: "git commit".into(),
                flag: "message".into(),
            }
        );
    }

    #[test]
    fn test_missing_value_for_short_alias_at_end() {
        let app = app();
        assert_eq!(
            resolve(&app, &["commit", "-m"]).unwrap_err(),
            ResolveError::MissingFlagValue {
                command: "git commit".into(),
                flag: "message".into(),
            }
        );
    }

    #[test]
    fn test_integer_mismatch() {
        let app = app();
        assert!(matches!(
            resolve(&app, &["commit", "-m", "x", "--depth", "deep"]),
            Err(ResolveError::FlagTypeMismatch { ref flag, ref expected, .. })
                if flag == "depth" && expected == "integer"
        ));
    }

    #[test]
    fn test_missing_required_flag() {
        let app = app();
        assert_eq!(
            resolve(&app, &["commit", "--amend"]).unwrap_err(),
            ResolveError::MissingRequiredFlag {
                command: "git commit".into(),
                flag: "message".into(),
            }
        );
    }

    #[test]
    fn test_optional_child_flag_shadows_required_ancestor() {
        let mut app = App::new("demo");
        app.add_flag(Flag::string("name", "", true)).unwrap();
        let run = app
            .add_command(
                Command::new("run")
                    .with_flag(Flag::string("name", "", false))
                    .with_action(noop),
            )
            .unwrap();
        app.add_command(Command::new("walk").with_action(noop)).unwrap();

        assert_eq!(resolved(&app, &["run"]).command(), Some(run));
        assert_eq!(
            resolve(&app, &["walk"]).unwrap_err(),
            ResolveError::MissingRequiredFlag {
                command: "demo walk".into(),
                flag: "name".into(),
            }
        );
    }

    #[test]
    fn test_child_flag_shadows_ancestor_type() {
        let mut app = App::new("demo");
        app.add_flag(Flag::boolean("mode", "").with_short('m')).unwrap();
        app.add_command(
            Command::new("run")
                .with_flag(Flag::string("mode", "", false).with_short('m'))
                .with_action(noop),
        )
        .unwrap();

        let invocation = resolved(&app, &["run", "-m", "fast"]);
        assert_eq!(invocation.supplied()[0].value, FlagValue::String("fast".into()));
        assert!(invocation.positionals().is_empty());
    }

    #[test]
    fn test_declared_arguments_checked() {
        let mut app = App::new("cp");
        app.add_command(
            Command::new("copy")
                .with_arg(Arg::required("SOURCE", ""))
                .with_arg(Arg::required("DEST", ""))
                .with_arg(Arg::optional("MODE", ""))
                .with_action(noop),
        )
        .unwrap();
        app.add_command(
            Command::new("cat")
                .with_arg(Arg::required("FILES", "").allow_multiple())
                .with_action(noop),
        )
        .unwrap();
        app.add_command(Command::new("group").with_arg(Arg::required("NAME", "")))
            .unwrap();

        assert_eq!(
            resolve(&app, &["copy", "a"]).unwrap_err(),
            ResolveError::MissingArgument {
                command: "cp copy".into(),
                name: "DEST".into(),
            }
        );
        assert_eq!(resolved(&app, &["copy", "a", "b"]).positionals(), ["a", "b"]);
        assert_eq!(resolved(&app, &["copy", "a", "b", "0644"]).positionals().len(), 3);
        assert_eq!(
            resolve(&app, &["copy", "a", "b", "c", "d"]).unwrap_err(),
            ResolveError::TooManyArguments {
                command: "cp copy".into(),
                expected: 3,
                received: 4,
            }
        );
        assert!(matches!(
            resolve(&app, &["cat"]),
            Err(ResolveError::MissingArgument { ref name, .. }) if name == "FILES"
        ));
        assert_eq!(resolved(&app, &["cat", "a", "b", "c", "d"]).positionals().len(), 4);

        // Help wins over argument checks, and so does an action-less node.
        assert!(matches!(resolve(&app, &["copy", "-h"]), Ok(Resolution::HelpRequested(_))));
        assert!(matches!(resolve(&app, &["group"]), Ok(Resolution::HelpRequested(_))));
    }

    #[test]
    fn test_unknown_short_flag_reports_command() {
        let app = app();
        assert_eq!(
            resolve(&app, &["remote", "add", "-x"]).unwrap_err(),
            ResolveError::UnknownFlag {
                command: "git remote add".into(),
                token: "-x".into(),
            }
        );
    }

    #[test]
    fn test_actionless_parent_shows_help_or_rejects_unknown_child() {
        let app = app();
        let remote = app.registry().find_child(None, "remote");
        assert_eq!(resolve(&app, &["remote"]).unwrap(), Resolution::HelpRequested(remote));
        assert_eq!(
            resolve(&app, &["remote", "rename"]).unwrap_err(),
            ResolveError::UnknownCommand {
                command: "git remote".into(),
                name: "rename".into(),
            }
        );
    }

    #[test]
    fn test_root_action_receives_unmatched_positionals() {
        let app = app();
        let invocation = resolved(&app, &["status", "-v"]);
        assert_eq!(invocation.command(), None);
        assert_eq!(invocation.positionals(), ["status"]);
    }

    #[test]
    fn test_root_without_action_reports_unknown_command() {
        let mut app = App::new("tool");
        app.add_command(Command::new("run").with_action(noop)).unwrap();
        assert_eq!(
            resolve(&app, &["walk"]).unwrap_err(),
            ResolveError::UnknownCommand {
                command: "tool".into(),
                name: "walk".into(),
            }
        );
    }
}

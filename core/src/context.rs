//! The per-invocation context handed to actions.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::app::App;
use crate::command::Command;
use crate::flag::FlagValue;
use crate::registry::CommandId;
use crate::resolve::Invocation;

/// Immutable bundle of everything an action needs: the resolved command,
/// typed flag values, positional arguments, and the owning app.
///
/// A context is built fresh for every run and dropped when the action
/// returns, so no parse result outlives its invocation.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    app: &'a App,
    command: Option<CommandId>,
    flags: BTreeMap<String, FlagValue>,
    args: Vec<String>,
}

impl<'a> Context<'a> {
    /// Packages a resolved invocation.
    ///
    /// Implicit values come from the flags in scope, where a nearer
    /// definition hides an ancestor's of the same name. Supplied values are
    /// then applied in order so the last occurrence of a flag wins. Values
    /// were already coerced and validated by the resolver; this step cannot
    /// fail.
    pub fn build(app: &'a App, invocation: Invocation) -> Self {
        let mut flags = BTreeMap::new();
        for flag in app.registry().flags_in_scope(invocation.command()) {
            if let Some(value) = flag.implicit_value() {
                flags.insert(flag.name().to_string(), value);
            }
        }
        for supplied in invocation.supplied() {
            flags.insert(supplied.name.clone(), supplied.value.clone());
        }

        Self {
            app,
            command: invocation.command(),
            flags,
            args: invocation.positionals().to_vec(),
        }
    }

    /// The app this invocation ran against.
    pub fn app(&self) -> &'a App {
        self.app
    }

    pub fn command_id(&self) -> Option<CommandId> {
        self.command
    }

    /// The resolved command; `None` when the root action runs.
    pub fn command(&self) -> Option<&'a Command> {
        let registry = self.app.registry();
        self.command.and_then(|id| registry.get(id))
    }

    /// Space-separated command path including the app name.
    pub fn command_path(&self) -> String {
        self.app.registry().display_path(self.command)
    }

    /// Every flag value, keyed by long name.
    pub fn flags(&self) -> &BTreeMap<String, FlagValue> {
        &self.flags
    }

    /// Value of a flag, supplied or implicit. `None` for an unset string or
    /// integer flag without a default.
    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.flag(name).and_then(FlagValue::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.flag(name).and_then(FlagValue::as_integer)
    }

    /// Boolean flag value; `false` when the flag is unknown.
    pub fn boolean(&self, name: &str) -> bool {
        self.flag(name).and_then(FlagValue::as_bool).unwrap_or(false)
    }

    /// Positional arguments in the order given.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Positional bound to the declared argument `name`.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.values_of(name).first().map(String::as_str)
    }

    /// Every positional bound to the declared argument `name`: one value,
    /// or the remaining ones for a repeating argument.
    pub fn values_of(&self, name: &str) -> &[String] {
        let Some(args) = self.command().map(Command::args) else {
            return &[];
        };
        let Some((index, arg)) = args.iter().enumerate().find(|(_, a)| a.name() == name) else {
            return &[];
        };
        let end = if arg.is_multiple() {
            self.args.len()
        } else {
            index + 1
        };
        self.args.get(index..end.min(self.args.len())).unwrap_or_default()
    }

    /// Serializable copy of the invocation data.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            command: self.command.map(|_| self.command_path()),
            flags: self.flags.clone(),
            args: self.args.clone(),
        }
    }
}

/// Owned, serializable view of a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSnapshot {
    /// Full command path, or `None` for the root action.
    pub command: Option<String>,
    pub flags: BTreeMap<String, FlagValue>,
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::Arg;
    use crate::flag::Flag;
    use crate::resolve::{Resolution, resolve};

    fn noop(_: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn build<'a>(app: &'a App, tokens: &[&str]) -> Context<'a> {
        match resolve(app, tokens).unwrap() {
            Resolution::Resolved(invocation) => Context::build(app, invocation),
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    fn app() -> App {
        let mut app = App::new("demo");
        app.add_flag(Flag::boolean("verbose", "")).unwrap();
        app.add_flag(Flag::string("config", "", false).with_default("demo.toml"))
            .unwrap();
        app.add_command(
            Command::new("greet")
                .with_flag(Flag::string("name", "", true))
                .with_flag(Flag::integer("times", "", false).with_default(1_i64))
                .with_flag(Flag::string("config", "", false).with_default("greet.toml"))
                .with_flag(Flag::string("nickname", "", false))
                .with_action(noop),
        )
        .unwrap();
        app
    }

    #[test]
    fn test_defaults_merged_for_unsupplied_flags() {
        let app = app();
        let ctx = build(&app, &["greet", "--name", "Ana"]);

        assert_eq!(ctx.string("name"), Some("Ana"));
        assert_eq!(ctx.integer("times"), Some(1));
        assert!(!ctx.boolean("verbose"));
        assert_eq!(ctx.flag("verbose"), Some(&FlagValue::Boolean(false)));
        assert_eq!(ctx.flag("nickname"), None);
        assert_eq!(ctx.flags().len(), 4);
    }

    #[test]
    fn test_nearest_default_wins() {
        let app = app();
        let ctx = build(&app, &["greet", "--name", "Ana"]);
        assert_eq!(ctx.string("config"), Some("greet.toml"));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let app = app();
        let ctx = build(&app, &["greet", "--name", "Ana", "--times", "2", "--times=5"]);
        assert_eq!(ctx.integer("times"), Some(5));
    }

    #[test]
    fn test_command_accessors() {
        let app = app();
        let ctx = build(&app, &["greet", "--name", "Ana", "x", "y"]);
        assert_eq!(ctx.command().map(Command::name), Some("greet"));
        assert_eq!(ctx.command_path(), "demo greet");
        assert_eq!(ctx.args(), ["x", "y"]);
        assert_eq!(ctx.arg(1), Some("y"));
        assert_eq!(ctx.arg(2), None);
    }

    #[test]
    fn test_shadowed_flag_takes_nearest_definition() {
        let mut app = App::new("demo");
        app.add_flag(Flag::boolean("mode", "")).unwrap();
        app.add_command(
            Command::new("run")
                .with_flag(Flag::string("mode", "", false))
                .with_action(noop),
        )
        .unwrap();

        let ctx = build(&app, &["run"]);
        assert_eq!(ctx.flag("mode"), None);
        assert!(ctx.flags().is_empty());

        let ctx = build(&app, &["run", "--mode", "fast"]);
        assert_eq!(ctx.string("mode"), Some("fast"));
    }

    #[test]
    fn test_declared_args_bind_by_name() {
        let mut app = App::new("demo");
        app.add_command(
            Command::new("copy")
                .with_arg(Arg::required("SOURCE", ""))
                .with_arg(Arg::optional("DEST", ""))
                .with_action(noop),
        )
        .unwrap();
        app.add_command(
            Command::new("cat")
                .with_arg(Arg::required("FIRST", ""))
                .with_arg(Arg::optional("REST", "").allow_multiple())
                .with_action(noop),
        )
        .unwrap();

        let ctx = build(&app, &["copy", "a.txt"]);
        assert_eq!(ctx.value_of("SOURCE"), Some("a.txt"));
        assert_eq!(ctx.value_of("DEST"), None);
        assert_eq!(ctx.value_of("OTHER"), None);

        let ctx = build(&app, &["cat", "a", "b", "c"]);
        assert_eq!(ctx.values_of("FIRST"), ["a"]);
        assert_eq!(ctx.values_of("REST"), ["b", "c"]);

        let ctx = build(&app, &["cat", "a"]);
        assert!(ctx.values_of("REST").is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let app = app();
        let ctx = build(&app, &["greet", "--name", "Ana", "--verbose"]);
        let json = serde_json::to_value(ctx.snapshot()).unwrap();
        assert_eq!(json["command"], "demo greet");
        assert_eq!(json["flags"]["name"], "Ana");
        assert_eq!(json["flags"]["verbose"], true);
        assert_eq!(json["flags"]["times"], 1);
        assert_eq!(json["args"], serde_json::json!([]));
    }

    #[test]
    fn test_repeated_builds_do_not_share_state() {
        let app = app();
        let first = build(&app, &["greet", "--name", "Ana", "--verbose"]);
        let second = build(&app, &["greet", "--name", "Bo"]);
        assert_eq!(first.string("name"), Some("Ana"));
        assert!(first.boolean("verbose"));
        assert_eq!(second.string("name"), Some("Bo"));
        assert!(!second.boolean("verbose"));
    }
}

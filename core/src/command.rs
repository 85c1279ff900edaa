//! Command definitions and the action capability.

use std::fmt;

use crate::arg::Arg;
use crate::context::Context;
use crate::flag::Flag;

/// A single-invocation callback run once resolution succeeds.
///
/// Any `Fn(&Context) -> anyhow::Result<()>` closure is an action; the root
/// app action and command actions share this one capability.
pub trait Action: Send + Sync {
    fn call(&self, ctx: &Context<'_>) -> anyhow::Result<()>;
}

impl<F> Action for F
where
    F: Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn call(&self, ctx: &Context<'_>) -> anyhow::Result<()> {
        self(ctx)
    }
}

/// A named node of the command tree.
///
/// `Command` is the registration-time value: it carries its flags and any
/// nested subcommands, and is moved into the app's
/// [`Registry`](crate::Registry) by [`App::add_command`](crate::App::add_command)
/// or [`App::add_subcommand`](crate::App::add_subcommand). Once registered,
/// nested subcommands are owned by the registry and linked to their parent.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Command, Flag};
///
/// let greet = Command::new("greet")
///     .with_short("Say hello")
///     .with_example("demo greet --name Ana")
///     .with_flag(Flag::string("name", "Who to greet", true))
///     .with_action(|ctx| {
///         println!("Hello, {}!", ctx.string("name").unwrap_or("world"));
///         Ok(())
///     });
///
/// assert_eq!(greet.name(), "greet");
/// assert_eq!(greet.flags().len(), 1);
/// assert!(greet.has_action());
/// ```
pub struct Command {
    name: String,
    short: Option<String>,
    long: Option<String>,
    usage: Option<String>,
    example: Option<String>,
    action: Option<Box<dyn Action>>,
    flags: Vec<Flag>,
    args: Vec<Arg>,
    pub(crate) subcommands: Vec<Command>,
}

impl Command {
    /// Creates a command with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            long: None,
            usage: None,
            example: None,
            action: None,
            flags: Vec::new(),
            args: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    /// One-line description shown in command listings.
    pub fn with_short(mut self, short: &str) -> Self {
        self.short = Some(short.to_string());
        self
    }

    /// Long description shown in this command's help header.
    pub fn with_long(mut self, long: &str) -> Self {
        self.long = Some(long.to_string());
        self
    }

    /// Replaces the computed tail of the usage line.
    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    /// Example invocation shown at the end of this command's help.
    pub fn with_example(mut self, example: &str) -> Self {
        self.example = Some(example.to_string());
        self
    }

    /// Sets the closure run when this command is resolved.
    pub fn with_action<F>(self, action: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_handler(action)
    }

    /// Sets any [`Action`] implementation as this command's action.
    pub fn with_handler(mut self, action: impl Action + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Declares the next positional argument.
    pub fn with_arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_subcommand(mut self, sub: Command) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Appends a flag. Uniqueness is checked when the command is registered.
    pub fn add_flag(&mut self, flag: Flag) {
        self.flags.push(flag);
    }

    /// Appends a positional argument declaration.
    pub fn add_arg(&mut self, arg: Arg) {
        self.args.push(arg);
    }

    /// Appends a nested subcommand.
    pub fn add_subcommand(&mut self, sub: Command) {
        self.subcommands.push(sub);
    }

    /// Name matched against invocation tokens.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description for the parent's `COMMANDS:` listing.
    pub fn short(&self) -> Option<&str> {
        self.short.as_deref()
    }

    /// Description shown in this command's own help header.
    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    /// Custom usage tail, if one replaces the computed one.
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    /// Flags declared directly on this command, in declaration order.
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// Declared positional arguments, in order.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Number of leading positionals that must be present.
    pub fn required_args(&self) -> usize {
        self.args.iter().filter(|a| a.is_required()).count()
    }

    /// Whether this command runs something when resolved, as opposed to
    /// only grouping subcommands.
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub(crate) fn action(&self) -> Option<&dyn Action> {
        self.action.as_deref()
    }

    /// Finds a flag by long name.
    pub fn find_flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name() == name)
    }

    /// Finds a flag by short alias.
    pub fn find_short(&self, short: char) -> Option<&Flag> {
        self.flags.iter().find(|f| f.short() == Some(short))
    }

    pub(crate) fn push_flag(&mut self, flag: Flag) {
        self.flags.push(flag);
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("flags", &self.flags)
            .field("args", &self.args)
            .field("subcommands", &self.subcommands)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_flags_and_subcommands() {
        let mut remote = Command::new("remote").with_subcommand(Command::new("add"));
        remote.add_subcommand(Command::new("remove"));
        remote.add_flag(Flag::boolean("verbose", "Verbose"));

        assert_eq!(remote.subcommands.len(), 2);
        assert!(remote.find_flag("verbose").is_some());
        assert!(remote.find_flag("quiet").is_none());
        assert!(!remote.has_action());
    }

    #[test]
    fn test_args_keep_declaration_order() {
        let copy = Command::new("copy")
            .with_arg(Arg::required("SOURCE", ""))
            .with_arg(Arg::optional("DEST", ""));
        let names: Vec<_> = copy.args().iter().map(Arg::name).collect();
        assert_eq!(names, ["SOURCE", "DEST"]);
        assert_eq!(copy.required_args(), 1);
    }

    #[test]
    fn test_find_short_alias() {
        let cmd = Command::new("greet").with_flag(Flag::string("name", "", true).with_short('n'));
        assert_eq!(cmd.find_short('n').map(Flag::name), Some("name"));
        assert!(cmd.find_short('x').is_none());
    }
}

//! The app: registration API and run orchestration.

use std::fmt;
use std::io::{self, Write};

use tracing::debug;

use crate::command::{Action, Command};
use crate::context::Context;
use crate::describe::{AppDescription, describe_app};
use crate::error::{Result, RunError};
use crate::flag::Flag;
use crate::help::{render_error, render_help};
use crate::registry::{CommandId, Registry};
use crate::resolve::{Invocation, Resolution, resolve};
use crate::style::Style;

/// A command-line application: metadata, the command tree, an optional root
/// action, and the style used for help output.
///
/// Registration takes `&mut self` and [`run`](Self::run) takes `&self`, so
/// the tree is read-only once the app starts serving invocations.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{App, Command, Flag, PlainStyle};
///
/// let mut app = App::new("demo")
///     .with_version("1.0.0")
///     .with_style(PlainStyle);
/// app.add_command(
///     Command::new("greet")
///         .with_flag(Flag::string("name", "Who to greet", true))
///         .with_action(|ctx| {
///             assert_eq!(ctx.string("name"), Some("Ana"));
///             Ok(())
///         }),
/// )
/// .unwrap();
///
/// let (mut out, mut err) = (Vec::new(), Vec::new());
/// app.run_with(["demo", "greet", "--name", "Ana"], &mut out, &mut err).unwrap();
///
/// let failure = app.run_with(["demo", "greet"], &mut out, &mut err).unwrap_err();
/// assert_eq!(failure.exit_code(), 2);
/// assert_eq!(
///     String::from_utf8(err).unwrap(),
///     "error: missing required flag: '--name' for 'demo greet'\n"
/// );
/// ```
pub struct App {
    name: String,
    version: Option<String>,
    description: Option<String>,
    registry: Registry,
    action: Option<Box<dyn Action>>,
    style: Box<dyn Style>,
    listings: bool,
}

impl App {
    /// Creates an app with no commands. `name` labels the root in usage
    /// lines and diagnostics.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
            description: None,
            registry: Registry::new(name),
            action: None,
            style: default_style(),
            listings: true,
        }
    }

    /// Version shown after the name in help headers.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Description shown in help headers when a command has none.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the root action, run when no command matches.
    pub fn with_action<F>(self, action: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_handler(action)
    }

    /// Sets any [`Action`] implementation as the root action.
    pub fn with_handler(mut self, action: impl Action + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    /// Replaces the style used for help and diagnostics.
    pub fn with_style(mut self, style: impl Style + 'static) -> Self {
        self.style = Box::new(style);
        self
    }

    /// Turns the `COMMANDS:`, `ARGS:` and `FLAGS:` help listings on or off.
    /// With listings off, help is only the header, `USAGE:` and `EXAMPLE:`.
    pub fn with_listings(mut self, listings: bool) -> Self {
        self.listings = listings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The command tree, read-only.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether the app has a root action.
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Style used by [`help_text`](Self::help_text) and `run` diagnostics.
    pub fn style(&self) -> &dyn Style {
        self.style.as_ref()
    }

    /// Whether help includes the command, argument and flag listings.
    pub fn shows_listings(&self) -> bool {
        self.listings
    }

    /// Registers a top-level command (and any nested subcommands).
    pub fn add_command(&mut self, command: Command) -> Result<CommandId> {
        let id = self.registry.attach(None, command)?;
        debug!(command = %self.registry.display_path(Some(id)), "registered command");
        Ok(id)
    }

    /// Registers `command` as a child of an already registered command.
    pub fn add_subcommand(&mut self, parent: CommandId, command: Command) -> Result<CommandId> {
        let id = self.registry.attach(Some(parent), command)?;
        debug!(command = %self.registry.display_path(Some(id)), "registered command");
        Ok(id)
    }

    /// Adds a top-level flag, accepted by the root and every command.
    pub fn add_flag(&mut self, flag: Flag) -> Result<()> {
        self.registry.add_flag(None, flag)
    }

    /// Adds a flag to an already registered command.
    pub fn add_command_flag(&mut self, command: CommandId, flag: Flag) -> Result<()> {
        self.registry.add_flag(Some(command), flag)
    }

    /// Help text for a command, or for the root when `None`. An id this app
    /// did not issue renders the root help.
    pub fn help_text(&self, command: Option<CommandId>) -> String {
        render_help(self, command, self.style())
    }

    /// Serializable description of the registered tree.
    pub fn describe(&self) -> AppDescription {
        describe_app(self)
    }

    /// Runs one invocation against stdout and stderr.
    ///
    /// `args` includes the program name as its first element, as returned by
    /// [`std::env::args`].
    pub fn run<I, S>(&self, args: I) -> std::result::Result<(), RunError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run_with(args, &mut io::stdout(), &mut io::stderr())
    }

    /// Runs one invocation, writing help to `out` and diagnostics to `err`.
    ///
    /// - No tokens after the program name: root help, success.
    /// - A help token, or a node without an action: that node's help, success.
    /// - A resolution error: one diagnostic line on `err`, then
    ///   [`RunError::Resolve`]. No action runs.
    /// - Otherwise the resolved command's action (or the root action) runs
    ///   and its failure is returned as [`RunError::Action`].
    pub fn run_with<I, S>(
        &self,
        args: I,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> std::result::Result<(), RunError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let Some(tokens) = args.get(1..).filter(|tokens| !tokens.is_empty()) else {
            debug!("empty invocation, showing root help");
            out.write_all(self.help_text(None).as_bytes())?;
            return Ok(());
        };

        match resolve(self, tokens) {
            Ok(Resolution::HelpRequested(scope)) => {
                out.write_all(self.help_text(scope).as_bytes())?;
                Ok(())
            }
            Ok(Resolution::Resolved(invocation)) => self.dispatch(invocation, out),
            Err(failure) => {
                err.write_all(render_error(&failure, self.style()).as_bytes())?;
                Err(RunError::Resolve(failure))
            }
        }
    }

    fn dispatch(&self, invocation: Invocation, out: &mut impl Write) -> std::result::Result<(), RunError> {
        let scope = invocation.command();
        let action = match scope {
            Some(id) => self.registry.get(id).and_then(Command::action),
            None => self.action.as_deref(),
        };
        let Some(action) = action else {
            out.write_all(self.help_text(scope).as_bytes())?;
            return Ok(());
        };

        let ctx = Context::build(self, invocation);
        debug!(
            command = %ctx.command_path(),
            args = ctx.args().len(),
            "dispatching action"
        );
        action.call(&ctx).map_err(RunError::Action)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("description", &self.description)
            .field("registry", &self.registry)
            .field("has_action", &self.action.is_some())
            .field("listings", &self.listings)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "console")]
fn default_style() -> Box<dyn Style> {
    Box::new(crate::style::TermStyle::auto())
}

#[cfg(not(feature = "console"))]
fn default_style() -> Box<dyn Style> {
    Box::new(crate::style::PlainStyle)
}

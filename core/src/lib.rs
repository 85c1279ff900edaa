//! Declarative command trees: registration, argument resolution, dispatch
//! and help rendering.
//!
//! A host program describes its interface once:
//!
//! - [`Flag`]: an immutable template for one typed input (string, integer
//!   or boolean), with an optional short alias, default and choices.
//! - [`Command`]: a named node with flags, declared positional [`Arg`]s,
//!   nested subcommands and an [`Action`].
//! - [`App`]: the root. It owns the [`Registry`] (the command tree), the
//!   top-level flags, an optional root action and the [`Style`] used for
//!   help output.
//!
//! Each call to [`App::run`] resolves one argv-style token list
//! ([`resolve`]), packages the result into a fresh [`Context`], and invokes
//! the matching action, or renders help ([`render_help`]) or a one-line
//! diagnostic ([`render_error`]).
//!
//! # Example
//!
//! ```
//! use cmdtree_core::*;
//!
//! let mut app = App::new("demo")
//!     .with_version("1.0.0")
//!     .with_style(PlainStyle);
//! app.add_flag(Flag::boolean("verbose", "Chatty output").with_short('v'))
//!     .unwrap();
//! let math = app
//!     .add_command(Command::new("math").with_short("Arithmetic"))
//!     .unwrap();
//! app.add_subcommand(
//!     math,
//!     Command::new("add").with_action(|ctx| {
//!         let sum: i64 = ctx.args().iter().filter_map(|a| a.parse::<i64>().ok()).sum();
//!         assert_eq!(sum, 5);
//!         assert!(ctx.boolean("verbose"));
//!         Ok(())
//!     }),
//! )
//! .unwrap();
//!
//! let (mut out, mut err) = (Vec::new(), Vec::new());
//! app.run_with(["demo", "math", "add", "2", "-v", "3"], &mut out, &mut err)
//!     .unwrap();
//!
//! app.run_with(["demo", "math"], &mut out, &mut err).unwrap();
//! let help = String::from_utf8(out).unwrap();
//! assert!(help.contains("USAGE:\n  demo math [FLAGS] [SUBCOMMAND] [ARGS...]\n"));
//! ```

mod app;
mod arg;
mod command;
mod context;
mod describe;
mod error;
mod flag;
mod help;
mod registry;
mod resolve;
mod style;

pub use app::App;
pub use arg::Arg;
pub use command::{Action, Command};
pub use context::{Context, ContextSnapshot};
pub use describe::{AppDescription, CommandDescription, DESCRIPTION_VERSION, FlagDescription};
pub use error::{RegistryError, ResolveError, Result, RunError};
pub use flag::{Flag, FlagValue, ValueType};
pub use help::{render_error, render_help, usage_line};
pub use registry::{CommandId, Registry};
pub use resolve::{Invocation, Resolution, SuppliedFlag, is_help_token, resolve};
#[cfg(feature = "console")]
pub use style::TermStyle;
pub use style::{Color, PlainStyle, Style};

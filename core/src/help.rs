//! Help and diagnostic rendering.
//!
//! [`render_help`] is a pure function of the app, the command help was
//! requested for, and a [`Style`]. The base layout is a header, a `USAGE:`
//! section and an optional `EXAMPLE:` section. Between the last two, help
//! also lists what the node accepts:
//!
//! ```text
//! <name> v<version>
//! <long description of the command, else the app description>
//!
//! USAGE:
//!   <name> <command path> [FLAGS] [SUBCOMMAND|COMMAND] [ARGS...]
//!
//! COMMANDS:            (only when the node has children)
//!   <child>  <short description>
//!
//! ARGS:                (only when the command declares arguments)
//!   <NAME>  <usage>
//!
//! FLAGS:               (only when any flag is accepted here)
//!   -n, --name <string>  <usage> (required)
//!
//! EXAMPLE:             (only when the command defines one)
//!   <example>
//! ```
//!
//! [`App::with_listings`](crate::App::with_listings) turns the three
//! listings off, leaving only the base layout. When a command declares
//! arguments, their placeholders (`<NAME>`, `[NAME]`) replace `[ARGS...]`.
//!
//! Rendering with [`PlainStyle`](crate::PlainStyle) yields exactly this
//! text; other styles only wrap fragments. An id the app did not issue is
//! rendered as the root.

use crate::app::App;
use crate::error::ResolveError;
use crate::flag::Flag;
use crate::registry::CommandId;
use crate::style::{Color, Style};

/// Renders help for `command`, or for the app root when `None`.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{render_help, App, Command, PlainStyle};
///
/// let mut app = App::new("demo").with_version("1.0.0").with_style(PlainStyle);
/// app.add_command(Command::new("greet").with_short("Say hello")).unwrap();
///
/// let help = render_help(&app, None, &PlainStyle);
/// assert!(help.starts_with("demo v1.0.0\n"));
/// assert!(help.contains("USAGE:\n  demo [COMMAND] [ARGS...]\n"));
/// ```
pub fn render_help(app: &App, command: Option<CommandId>, style: &dyn Style) -> String {
    let command = known(app, command);
    let mut sections = vec![header(app, command, style), usage_section(app, command, style)];

    if app.shows_listings() {
        let listings = [
            commands_section(app, command, style),
            args_section(app, command, style),
            flags_section(app, command, style),
        ];
        sections.extend(listings.into_iter().flatten());
    }
    if let Some(section) = example_section(app, command, style) {
        sections.push(section);
    }

    sections.join("\n")
}

/// Renders the one-line diagnostic for a resolution error.
pub fn render_error(err: &ResolveError, style: &dyn Style) -> String {
    format!("{} {err}\n", style.bold("error:"))
}

/// The single usage line, without indentation.
pub fn usage_line(app: &App, command: Option<CommandId>, style: &dyn Style) -> String {
    let command = known(app, command);
    let registry = app.registry();
    let mut parts = vec![style.bold(app.name())];

    let path = registry.path(command);
    if !path.is_empty() {
        parts.push(style.colored(Color::Green, &path.join(" ")));
    }

    let node = command.and_then(|id| registry.get(id));
    if let Some(custom) = node.and_then(|c| c.usage()) {
        parts.push(custom.to_string());
        return parts.join(" ");
    }

    if !registry.flags_in_scope(command).is_empty() {
        parts.push(style.colored(Color::HiBlack, "[FLAGS]"));
    }
    if !registry.children(command).is_empty() {
        let placeholder = if command.is_some() {
            "[SUBCOMMAND]"
        } else {
            "[COMMAND]"
        };
        parts.push(style.colored(Color::Yellow, placeholder));
    }
    match node.map(|c| c.args()).filter(|args| !args.is_empty()) {
        Some(args) => parts.extend(args.iter().map(|arg| arg.placeholder())),
        None => parts.push(style.colored(Color::HiBlack, "[ARGS...]")),
    }

    parts.join(" ")
}

/// Unknown ids fall back to the root.
fn known(app: &App, command: Option<CommandId>) -> Option<CommandId> {
    command.filter(|&id| app.registry().contains(id))
}

fn header(app: &App, command: Option<CommandId>, style: &dyn Style) -> String {
    let mut out = style.colored(Color::HiBlue, app.name());
    if let Some(version) = app.version() {
        out.push_str(&style.colored(Color::HiBlack, &format!(" v{version}")));
    }
    out.push('\n');

    let long = command
        .and_then(|id| app.registry().get(id))
        .and_then(|c| c.long());
    if let Some(description) = long.or(app.description()) {
        out.push_str(&style.dim(description));
        out.push('\n');
    }

    out
}

fn usage_section(app: &App, command: Option<CommandId>, style: &dyn Style) -> String {
    format!(
        "{}\n  {}\n",
        style.bold("USAGE:"),
        usage_line(app, command, style)
    )
}

fn commands_section(app: &App, command: Option<CommandId>, style: &dyn Style) -> Option<String> {
    let registry = app.registry();
    let children = registry.children(command);
    if children.is_empty() {
        return None;
    }

    let rows: Vec<(String, String)> = children
        .iter()
        .filter_map(|&id| registry.get(id))
        .map(|c| (c.name().to_string(), c.short().unwrap_or_default().to_string()))
        .collect();

    Some(table(&style.bold("COMMANDS:"), &rows, Color::Green, style))
}

fn args_section(app: &App, command: Option<CommandId>, style: &dyn Style) -> Option<String> {
    let args = command.and_then(|id| app.registry().get(id))?.args();
    if args.is_empty() {
        return None;
    }

    let rows: Vec<(String, String)> = args
        .iter()
        .map(|arg| (arg.placeholder(), arg.usage().to_string()))
        .collect();

    Some(table(&style.bold("ARGS:"), &rows, Color::Green, style))
}

fn flags_section(app: &App, command: Option<CommandId>, style: &dyn Style) -> Option<String> {
    let flags = app.registry().flags_in_scope(command);
    if flags.is_empty() {
        return None;
    }

    let rows: Vec<(String, String)> = flags
        .into_iter()
        .map(|flag| (flag_signature(flag), flag_description(flag)))
        .collect();

    Some(table(&style.bold("FLAGS:"), &rows, Color::Yellow, style))
}

fn example_section(app: &App, command: Option<CommandId>, style: &dyn Style) -> Option<String> {
    let example = command
        .and_then(|id| app.registry().get(id))
        .and_then(|c| c.example())?;

    let mut out = format!("{}\n", style.bold("EXAMPLE:"));
    for line in example.lines() {
        out.push_str(&format!("  {}\n", style.colored(Color::Green, line)));
    }
    Some(out)
}

/// Two-column listing; the left column is padded before styling so escape
/// sequences never affect alignment. Widths count chars, as `{:<width$}`
/// pads by chars.
fn table(title: &str, rows: &[(String, String)], color: Color, style: &dyn Style) -> String {
    let width = rows
        .iter()
        .map(|(left, _)| left.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = format!("{title}\n");
    for (left, right) in rows {
        if right.is_empty() {
            out.push_str(&format!("  {}\n", style.colored(color, left)));
        } else {
            let padded = format!("{left:<width$}");
            out.push_str(&format!("  {}  {right}\n", style.colored(color, &padded)));
        }
    }
    out
}

fn flag_signature(flag: &Flag) -> String {
    let mut out = match flag.short() {
        Some(short) => format!("-{short}, --{}", flag.name()),
        None => format!("    --{}", flag.name()),
    };
    if flag.value_type().takes_value() {
        out.push_str(&format!(" <{}>", flag.value_type()));
    }
    out
}

fn flag_description(flag: &Flag) -> String {
    let mut parts = Vec::new();
    if !flag.usage().is_empty() {
        parts.push(flag.usage().to_string());
    }
    if flag.is_required() {
        parts.push("(required)".to_string());
    }
    if !flag.choices().is_empty() {
        parts.push(format!("[possible values: {}]", flag.choices().join(", ")));
    }
    if let Some(default) = flag.default_value() {
        parts.push(format!("[default: {default}]"));
    }
    parts.join(" ")
}

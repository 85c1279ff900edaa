//! Serializable description of a registered app.
//!
//! [`App::describe`](crate::App::describe) walks the registry and produces an
//! owned tree of plain data that can be rendered with `serde_json` or any
//! other serde format. Nothing here borrows from the app.

use serde::Serialize;

use crate::app::App;
use crate::arg::Arg;
use crate::flag::{Flag, FlagValue, ValueType};
use crate::registry::{CommandId, Registry};

/// Version of the description format (semver).
pub const DESCRIPTION_VERSION: &str = "1.0.0";

/// Top-level summary of an app.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppDescription {
    /// Description format version (see [`DESCRIPTION_VERSION`]).
    pub format_version: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the app has a root action.
    pub runnable: bool,
    /// Flags accepted by every command.
    pub flags: Vec<FlagDescription>,
    pub commands: Vec<CommandDescription>,
}

impl AppDescription {
    /// Total number of commands in the tree.
    pub fn command_count(&self) -> usize {
        self.commands.iter().map(CommandDescription::count).sum()
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One command and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandDescription {
    pub name: String,
    /// Full path including the app name, e.g. `demo math add`.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Whether the command has an action of its own.
    pub runnable: bool,
    pub flags: Vec<FlagDescription>,
    /// Declared positional arguments, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Arg>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandDescription>,
}

impl CommandDescription {
    fn count(&self) -> usize {
        1 + self.subcommands.iter().map(Self::count).sum::<usize>()
    }
}

/// One flag definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub value_type: ValueType,
    pub usage: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FlagValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl From<&Flag> for FlagDescription {
    fn from(flag: &Flag) -> Self {
        Self {
            name: flag.name().to_string(),
            short: flag.short(),
            value_type: flag.value_type(),
            usage: flag.usage().to_string(),
            required: flag.is_required(),
            default: flag.default_value().cloned(),
            choices: flag.choices().to_vec(),
        }
    }
}

pub(crate) fn describe_app(app: &App) -> AppDescription {
    let registry = app.registry();
    AppDescription {
        format_version: DESCRIPTION_VERSION.to_string(),
        name: app.name().to_string(),
        version: app.version().map(str::to_string),
        description: app.description().map(str::to_string),
        runnable: app.has_action(),
        flags: describe_flags(registry.flags(None)),
        commands: registry
            .children(None)
            .iter()
            .filter_map(|&id| describe_command(registry, id))
            .collect(),
    }
}

fn describe_command(registry: &Registry, id: CommandId) -> Option<CommandDescription> {
    let command = registry.get(id)?;
    Some(CommandDescription {
        name: command.name().to_string(),
        path: registry.display_path(Some(id)),
        short: command.short().map(str::to_string),
        long: command.long().map(str::to_string),
        usage: command.usage().map(str::to_string),
        example: command.example().map(str::to_string),
        runnable: command.has_action(),
        flags: describe_flags(command.flags()),
        args: command.args().to_vec(),
        subcommands: registry
            .children(Some(id))
            .iter()
            .filter_map(|&child| describe_command(registry, child))
            .collect(),
    })
}

fn describe_flags(flags: &[Flag]) -> Vec<FlagDescription> {
    flags.iter().map(FlagDescription::from).collect()
}

#[cfg(test)]
mod tests {
    use crate::arg::Arg;
    use crate::command::Command;
    use crate::flag::Flag;
    use crate::App;

    fn noop(_: &crate::Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn sample() -> App {
        let mut app = App::new("demo")
            .with_version("1.0.0")
            .with_description("A tiny demo");
        app.add_flag(Flag::boolean("verbose", "Chatty output").with_short('v'))
            .unwrap();
        app.add_command(
            Command::new("math")
                .with_short("Arithmetic")
                .with_subcommand(
                    Command::new("add")
                        .with_arg(Arg::required("OPERANDS", "Numbers").allow_multiple())
                        .with_action(noop),
                )
                .with_subcommand(Command::new("mul").with_action(noop)),
        )
        .unwrap();
        app.add_command(
            Command::new("greet")
                .with_flag(
                    Flag::string("greeting", "", false)
                        .with_choices(["hello", "hi"])
                        .with_default("hello"),
                )
                .with_action(noop),
        )
        .unwrap();
        app
    }

    #[test]
    fn test_describe_tree() {
        let description = sample().describe();
        assert_eq!(description.name, "demo");
        assert_eq!(description.version.as_deref(), Some("1.0.0"));
        assert!(!description.runnable);
        assert_eq!(description.flags.len(), 1);
        assert_eq!(description.command_count(), 4);

        let math = &description.commands[0];
        assert_eq!(math.path, "demo math");
        assert!(!math.runnable);
        assert_eq!(math.subcommands[1].path, "demo math mul");
        assert!(math.subcommands[1].runnable);
    }

    #[test]
    fn test_describe_json_shape() {
        let json = serde_json::to_value(sample().describe()).unwrap();
        assert_eq!(json["format_version"], "1.0.0");
        assert_eq!(json["flags"][0]["short"], "v");
        assert_eq!(json["flags"][0]["value_type"], "boolean");

        let greet = &json["commands"][1];
        assert_eq!(greet["flags"][0]["default"], "hello");
        assert_eq!(greet["flags"][0]["choices"], serde_json::json!(["hello", "hi"]));
        assert!(greet.get("subcommands").is_none());
        assert!(greet.get("args").is_none());

        let add = &json["commands"][0]["subcommands"][0];
        assert_eq!(add["args"][0]["name"], "OPERANDS");
        assert_eq!(add["args"][0]["required"], true);
        assert_eq!(add["args"][0]["multiple"], true);
        assert!(greet.get("example").is_none());
    }

    #[test]
    fn test_to_json_is_pretty() {
        let json = sample().describe().to_json().unwrap();
        assert!(json.starts_with("{\n  \"format_version\": \"1.0.0\""));
    }
}

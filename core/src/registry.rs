//! The command registry: an arena-backed command tree.
//!
//! Commands are stored in a flat arena and addressed by [`CommandId`]. Each
//! node owns its [`Command`] and the ids of its children, and keeps a
//! non-owning back-reference (an id) to its parent that is only used to
//! reconstruct command paths and flag scopes.
//!
//! The root of the tree is not a [`Command`]; it is the app itself and is
//! addressed as `None` wherever a scope is an `Option<CommandId>`. It owns
//! the app's top-level flags and top-level commands.
//!
//! Registration validates the incoming subtree before touching the arena,
//! so a failed call leaves the registry unchanged. Because subtrees are
//! moved in by value, every node has exactly one parent and the graph
//! cannot contain cycles.
//!
//! Ids are stamped with the registry that issued them. An id from another
//! registry (or one that was never issued) is unknown: read queries treat it
//! as an empty scope and registration rejects it.

use std::collections::HashSet;
use std::iter;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::arg::Arg;
use crate::command::Command;
use crate::error::{RegistryError, Result};
use crate::flag::{Flag, FlagValue};
use crate::resolve::HELP_WORD;

static NEXT_REGISTRY: AtomicUsize = AtomicUsize::new(0);

/// Handle to a command registered in a [`Registry`].
///
/// Only meaningful for the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId {
    registry: usize,
    index: usize,
}

#[derive(Debug)]
struct Node {
    command: Command,
    parent: Option<CommandId>,
    children: Vec<CommandId>,
}

/// Tree of registered commands rooted at the app.
#[derive(Debug)]
pub struct Registry {
    token: usize,
    root_name: String,
    root_flags: Vec<Flag>,
    root_children: Vec<CommandId>,
    nodes: Vec<Node>,
}

impl Registry {
    /// Creates an empty registry whose root is labelled `root_name`.
    pub fn new(root_name: &str) -> Self {
        Self {
            token: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            root_name: root_name.to_string(),
            root_flags: Vec::new(),
            root_children: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Number of registered commands, excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no command has been registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Label of the root, normally the app name.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// True when `id` was issued by this registry.
    pub fn contains(&self, id: CommandId) -> bool {
        self.node(id).is_some()
    }

    fn node(&self, id: CommandId) -> Option<&Node> {
        if id.registry != self.token {
            return None;
        }
        self.nodes.get(id.index)
    }

    fn node_mut(&mut self, id: CommandId) -> Option<&mut Node> {
        if id.registry != self.token {
            return None;
        }
        self.nodes.get_mut(id.index)
    }

    /// Looks up a registered command.
    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.node(id).map(|node| &node.command)
    }

    /// Parent of a command; `None` for top-level and unknown commands.
    pub fn parent(&self, id: CommandId) -> Option<CommandId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Children of a scope, in registration order. Empty for an unknown id.
    pub fn children(&self, scope: Option<CommandId>) -> &[CommandId] {
        match scope {
            Some(id) => self.node(id).map(|node| node.children.as_slice()).unwrap_or_default(),
            None => &self.root_children,
        }
    }

    /// Flags declared directly on a scope. Empty for an unknown id.
    pub fn flags(&self, scope: Option<CommandId>) -> &[Flag] {
        match scope {
            Some(id) => self.get(id).map(Command::flags).unwrap_or_default(),
            None => &self.root_flags,
        }
    }

    /// Exact, case-sensitive lookup of a child by name.
    pub fn find_child(&self, scope: Option<CommandId>, name: &str) -> Option<CommandId> {
        self.children(scope)
            .iter()
            .copied()
            .find(|&id| self.get(id).is_some_and(|c| c.name() == name))
    }

    /// Walks from `scope` up to the root, yielding the root (`None`) last.
    pub fn lineage(&self, scope: Option<CommandId>) -> impl Iterator<Item = Option<CommandId>> {
        iter::successors(Some(scope), move |current| current.map(|id| self.parent(id)))
    }

    /// Finds a flag by long name, nearest scope first.
    pub fn find_flag(&self, scope: Option<CommandId>, name: &str) -> Option<&Flag> {
        self.lineage(scope)
            .find_map(|s| self.flags(s).iter().find(|f| f.name() == name))
    }

    /// Finds a flag by short alias, nearest scope first.
    pub fn find_short(&self, scope: Option<CommandId>, short: char) -> Option<&Flag> {
        self.lineage(scope)
            .find_map(|s| self.flags(s).iter().find(|f| f.short() == Some(short)))
    }

    /// Every flag accepted at `scope`, nearest first, shadowed names skipped.
    pub fn flags_in_scope(&self, scope: Option<CommandId>) -> Vec<&Flag> {
        let mut seen = HashSet::new();
        self.lineage(scope)
            .flat_map(|s| self.flags(s).iter())
            .filter(|f| seen.insert(f.name()))
            .collect()
    }

    /// Command names from the top level down to `scope`.
    pub fn path(&self, scope: Option<CommandId>) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .lineage(scope)
            .flatten()
            .filter_map(|id| self.get(id).map(Command::name))
            .collect();
        names.reverse();
        names
    }

    /// Space-separated path including the root name (`"demo remote add"`).
    pub fn display_path(&self, scope: Option<CommandId>) -> String {
        iter::once(self.root_name.as_str())
            .chain(self.path(scope))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Depth-first iteration over every registered command.
    pub fn walk(&self) -> Vec<CommandId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<CommandId> = self.root_children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(Some(id)).iter().rev().copied());
        }
        out
    }

    /// Validates and inserts `command` (with its nested subcommands) under
    /// `parent`.
    pub(crate) fn attach(&mut self, parent: Option<CommandId>, command: Command) -> Result<CommandId> {
        if parent.is_some_and(|id| !self.contains(id)) {
            return Err(RegistryError::UnknownCommandId);
        }

        let parent_label = self.display_path(parent);
        if self.find_child(parent, command.name()).is_some() {
            return Err(RegistryError::DuplicateCommand {
                parent: parent_label,
                name: command.name().to_string(),
            });
        }
        validate_command(&command, &format!("{parent_label} {}", command.name()))?;

        Ok(self.insert(parent, command))
    }

    fn insert(&mut self, parent: Option<CommandId>, mut command: Command) -> CommandId {
        let subcommands = std::mem::take(&mut command.subcommands);
        let id = CommandId {
            registry: self.token,
            index: self.nodes.len(),
        };
        self.nodes.push(Node {
            command,
            parent,
            children: Vec::new(),
        });
        match parent.and_then(|parent| self.node_mut(parent)) {
            Some(node) => node.children.push(id),
            None => self.root_children.push(id),
        }
        for sub in subcommands {
            self.insert(Some(id), sub);
        }
        id
    }

    /// Validates and appends a flag to a scope.
    pub(crate) fn add_flag(&mut self, scope: Option<CommandId>, flag: Flag) -> Result<()> {
        if scope.is_some_and(|id| !self.contains(id)) {
            return Err(RegistryError::UnknownCommandId);
        }

        let label = self.display_path(scope);
        validate_flags(self.flags(scope), std::slice::from_ref(&flag), &label)?;
        match scope.and_then(|id| self.node_mut(id)) {
            Some(node) => node.command.push_flag(flag),
            None => self.root_flags.push(flag),
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RegistryError::EmptyName);
    }
    if name.starts_with('-') || name.contains('=') || name.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_command(command: &Command, label: &str) -> Result<()> {
    validate_name(command.name())?;
    if command.name() == HELP_WORD {
        return Err(RegistryError::ReservedName(command.name().to_string()));
    }

    validate_flags(&[], command.flags(), label)?;
    validate_args(command.args(), label)?;

    let mut seen: HashSet<&str> = HashSet::new();
    for sub in &command.subcommands {
        if !seen.insert(sub.name()) {
            return Err(RegistryError::DuplicateCommand {
                parent: label.to_string(),
                name: sub.name().to_string(),
            });
        }
        validate_command(sub, &format!("{label} {}", sub.name()))?;
    }

    Ok(())
}

fn validate_flags(existing: &[Flag], added: &[Flag], command: &str) -> Result<()> {
    let mut names: HashSet<&str> = existing.iter().map(Flag::name).collect();
    let mut shorts: HashSet<char> = existing.iter().filter_map(Flag::short).collect();

    for flag in added {
        validate_flag(flag)?;
        if !names.insert(flag.name()) {
            return Err(RegistryError::DuplicateFlag {
                command: command.to_string(),
                name: flag.name().to_string(),
            });
        }
        if let Some(short) = flag.short() {
            if !shorts.insert(short) {
                return Err(RegistryError::DuplicateShort {
                    command: command.to_string(),
                    short,
                });
            }
        }
    }

    Ok(())
}

/// Arguments bind to positionals in order, so every required argument
/// comes before the optional ones and a repeating argument comes last.
fn validate_args(args: &[Arg], command: &str) -> Result<()> {
    let mut names: HashSet<&str> = HashSet::new();
    let mut open_tail = false;

    for arg in args {
        validate_name(arg.name())?;
        if !names.insert(arg.name()) {
            return Err(RegistryError::DuplicateArg {
                command: command.to_string(),
                name: arg.name().to_string(),
            });
        }
        if arg.is_required() && open_tail {
            return Err(RegistryError::MisplacedArg {
                command: command.to_string(),
                name: arg.name().to_string(),
            });
        }
        open_tail |= !arg.is_required();
    }

    if let Some(pos) = args.iter().position(Arg::is_multiple) {
        if let Some(next) = args.get(pos + 1) {
            return Err(RegistryError::MisplacedArg {
                command: command.to_string(),
                name: next.name().to_string(),
            });
        }
    }

    Ok(())
}

fn validate_flag(flag: &Flag) -> Result<()> {
    validate_name(flag.name())?;
    if flag.name() == HELP_WORD {
        return Err(RegistryError::ReservedName(flag.name().to_string()));
    }

    if let Some(short) = flag.short() {
        if short == 'h' {
            return Err(RegistryError::ReservedName(short.to_string()));
        }
        if short == '-' || short == '=' || short.is_whitespace() || short.is_ascii_digit() {
            return Err(RegistryError::InvalidName(short.to_string()));
        }
    }

    let Some(default) = flag.default_value() else {
        return Ok(());
    };
    if flag.is_required() {
        return Err(RegistryError::RequiredWithDefault(flag.name().to_string()));
    }
    if default.value_type() != flag.value_type() {
        return Err(RegistryError::DefaultTypeMismatch {
            flag: flag.name().to_string(),
            expected: flag.value_type().to_string(),
        });
    }
    if let FlagValue::String(value) = default {
        if !flag.choices().is_empty() && !flag.choices().contains(value) {
            return Err(RegistryError::InvalidDefaultChoice {
                flag: flag.name().to_string(),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

//! Positional argument declarations.

use serde::Serialize;

/// A named positional argument declared on a command.
///
/// Declared arguments are matched against positionals in order. A command
/// that declares none accepts any number of positionals.
///
/// # Examples
///
/// ```
/// use cmdtree_core::Arg;
///
/// let src = Arg::required("SOURCE", "File to copy");
/// assert_eq!(src.placeholder(), "<SOURCE>");
///
/// let rest = Arg::optional("FILES", "More files").allow_multiple();
/// assert_eq!(rest.placeholder(), "[FILES]...");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arg {
    name: String,
    usage: String,
    required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    multiple: bool,
}

impl Arg {
    fn new(name: &str, usage: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            usage: usage.to_string(),
            required,
            multiple: false,
        }
    }

    /// An argument that must be present.
    pub fn required(name: &str, usage: &str) -> Self {
        Self::new(name, usage, true)
    }

    /// An argument that may be left out.
    pub fn optional(name: &str, usage: &str) -> Self {
        Self::new(name, usage, false)
    }

    /// Lets the argument absorb every remaining positional. Only the last
    /// declared argument may do this.
    pub fn allow_multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Name shown in usage lines and used by [`Context::value_of`](crate::Context::value_of).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description shown in the `ARGS:` listing.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Usage-line form: `<NAME>` when required, `[NAME]` otherwise, with a
    /// trailing `...` when the argument repeats.
    pub fn placeholder(&self) -> String {
        let mut out = if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        };
        if self.multiple {
            out.push_str("...");
        }
        out
    }
}

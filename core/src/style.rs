//! The style capability used by the help renderer.
//!
//! Rendering code only asks for semantic emphasis through [`Style`]; it
//! never writes control sequences itself. [`PlainStyle`] turns every
//! request into a no-op and is what golden-text tests render with.
//! [`TermStyle`] (feature `console`) maps requests onto terminal styling.

/// Fixed palette available to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Green,
    Yellow,
    HiBlack,
    HiBlue,
}

/// Semantic text styling.
pub trait Style: Send + Sync {
    fn bold(&self, text: &str) -> String;
    fn dim(&self, text: &str) -> String;
    fn colored(&self, color: Color, text: &str) -> String;
}

/// Styling that leaves text untouched.
///
/// ```
/// use cmdtree_core::{Color, PlainStyle, Style};
///
/// assert_eq!(PlainStyle.colored(Color::Green, "ok"), "ok");
/// assert_eq!(PlainStyle.bold("USAGE:"), "USAGE:");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainStyle;

impl Style for PlainStyle {
    fn bold(&self, text: &str) -> String {
        text.to_string()
    }

    fn dim(&self, text: &str) -> String {
        text.to_string()
    }

    fn colored(&self, _color: Color, text: &str) -> String {
        text.to_string()
    }
}

#[cfg(feature = "console")]
pub use term::TermStyle;

#[cfg(feature = "console")]
mod term {
    use console::{StyledObject, style};

    use super::{Color, Style};

    /// Terminal styling backed by the `console` crate.
    ///
    /// By default `console` decides whether to emit styling (tty detection,
    /// `NO_COLOR`, `CLICOLOR`); [`TermStyle::forced`] overrides that choice.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TermStyle {
        force: Option<bool>,
    }

    impl TermStyle {
        /// Lets `console` decide based on the terminal.
        pub fn auto() -> Self {
            Self { force: None }
        }

        /// Always (`true`) or never (`false`) emit styling.
        pub fn forced(enabled: bool) -> Self {
            Self {
                force: Some(enabled),
            }
        }

        fn finish(&self, styled: StyledObject<&str>) -> String {
            match self.force {
                Some(enabled) => styled.force_styling(enabled).to_string(),
                None => styled.to_string(),
            }
        }
    }

    impl Style for TermStyle {
        fn bold(&self, text: &str) -> String {
            self.finish(style(text).bold())
        }

        fn dim(&self, text: &str) -> String {
            self.finish(style(text).dim())
        }

        fn colored(&self, color: Color, text: &str) -> String {
            let styled = style(text);
            let styled = match color {
                Color::Green => styled.green(),
                Color::Yellow => styled.yellow(),
                Color::HiBlack => styled.black().bright(),
                Color::HiBlue => styled.blue().bright(),
            };
            self.finish(styled)
        }
    }

}

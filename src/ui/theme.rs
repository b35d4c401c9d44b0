use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for each kind of thing symstore prints
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub label: Style,
    pub usr: Style,
    pub path: Style,
    /// `line:column`
    pub position: Style,
    pub symbol_id: Style,
}

impl Theme {
    /// Colors only when stdout is a terminal and `NO_COLOR` is unset
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::for_terminal(console::Term::stdout().is_term() && !no_color)
    }

    pub fn for_terminal(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: pick(Style::new().cyan().bold()),
            success: pick(Style::new().green().bold()),
            error: pick(Style::new().red().bold()),
            warn: pick(Style::new().yellow().bold()),
            label: pick(Style::new().white().dimmed()),
            usr: pick(Style::new().magenta()),
            path: pick(Style::new().blue()),
            position: pick(Style::new().bold()),
            symbol_id: pick(Style::new().dimmed()),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

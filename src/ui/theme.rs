use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for CLI output
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    /// Validator output echoed under a rejection
    pub diagnostic: Style,
    /// Files skipped because their filename is already stored
    pub duplicate: Style,
}

impl Theme {
    pub fn new(colors: bool) -> Self {
        if !colors {
            return Self {
                header: Style::new(),
                success: Style::new(),
                error: Style::new(),
                warn: Style::new(),
                info: Style::new(),
                dim: Style::new(),
                diagnostic: Style::new(),
                duplicate: Style::new(),
            };
        }
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().bright_black(),
            diagnostic: Style::new().red(),
            duplicate: Style::new().yellow(),
        }
    }
}

/// Colors only on an interactive terminal without `NO_COLOR`
pub fn colors_enabled(no_color: bool, is_term: bool) -> bool {
    !no_color && is_term
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(|| {
        Theme::new(colors_enabled(
            std::env::var_os("NO_COLOR").is_some(),
            console::Term::stdout().is_term(),
        ))
    })
}

use nu_ansi_term::{Color, Style};

/// Styling for terminal output. Every method is a no-op when color is off.
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    enabled: bool,
}

impl ColorScheme {
    pub fn new(enabled: bool) -> Self {
        ColorScheme { enabled }
    }

    fn paint(&self, style: Style, t: &str) -> String {
        if self.enabled {
            style.paint(t).to_string()
        } else {
            t.to_string()
        }
    }

    pub fn red(&self, t: &str) -> String {
        self.paint(Color::Red.normal(), t)
    }

    pub fn yellow(&self, t: &str) -> String {
        self.paint(Color::Yellow.normal(), t)
    }

    pub fn green(&self, t: &str) -> String {
        self.paint(Color::Green.normal(), t)
    }

    pub fn cyan(&self, t: &str) -> String {
        self.paint(Color::Cyan.normal(), t)
    }

    pub fn success_icon(&self) -> String {
        self.green("✔")
    }

    pub fn warning_icon(&self) -> String {
        self.yellow("!")
    }

    pub fn failure_icon(&self) -> String {
        self.red("✘")
    }
}

//! Prompt line parsing.

/// What the user asked for at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Say(String),
    Title(String),
    Quit,
    Help,
    Empty,
}

pub const HELP: &str = "commands: /title <name>, /quit, /help";

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        match line.split_once(char::is_whitespace) {
            Some(("/title", title)) if !title.trim().is_empty() => {
                Self::Title(title.trim().to_string())
            }
            _ => match line {
                "/quit" | "/exit" => Self::Quit,
                "/help" | "/title" => Self::Help,
                _ => Self::Say(line.to_string()),
            },
        }
    }
}

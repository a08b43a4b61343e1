//! REPL line handling: `:commands` and multi-line questions ended by an empty line.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    File(PathBuf),
    History,
    Clear,
    Help,
    Quit,
    /// Known command with a missing argument, or an unknown command.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Question(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim().trim_start_matches(':');
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    match name {
        "file" | "f" if !arg.is_empty() => Command::File(PathBuf::from(arg)),
        "file" | "f" => Command::Invalid("usage: :file <path-to-pdf>".to_string()),
        "history" | "h" => Command::History,
        "clear" => Command::Clear,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command ':{other}' (try :help)")),
    }
}

/// Accumulates lines until a question or command is complete.
#[derive(Debug, Default)]
pub struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a question is being typed.
    pub fn is_collecting(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Feeds one line. Returns the input it completes, if any.
    pub fn push_line(&mut self, line: &str) -> Option<Input> {
        let line = line.trim_end_matches(['\r', '\n']);

        if !self.is_collecting() && line.trim_start().starts_with(':') {
            return Some(Input::Command(parse_command(line)));
        }

        if line.trim().is_empty() {
            return self.finish();
        }

        self.lines.push(line.to_string());
        None
    }

    /// Ends the current question, e.g. on end of input.
    pub fn finish(&mut self) -> Option<Input> {
        if self.lines.is_empty() {
            return None;
        }
        let question = std::mem::take(&mut self.lines).join("\n");
        Some(Input::Question(question))
    }
}

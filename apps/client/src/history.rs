//! In-memory conversation history. Lost when the client exits.

use chrono::{DateTime, Local};

#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct History {
    entries: Vec<ConversationEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.push_at(question, answer, Local::now());
    }

    fn push_at(&mut self, question: impl Into<String>, answer: impl Into<String>, asked_at: DateTime<Local>) {
        self.entries.push(ConversationEntry {
            question: question.into(),
            answer: answer.into(),
            asked_at,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Numbered from 1, oldest first, so the latest answer ends up at the bottom of the terminal.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "No questions asked yet.".to_string();
        }

        let mut out = String::from("Conversation History\n");
        for (idx, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!(
                "\n### {} ({})\nQuestion:\n{}\n\nAnswer:\n{}\n{}\n",
                idx + 1,
                entry.asked_at.format("%H:%M:%S"),
                entry.question,
                entry.answer,
                "-".repeat(40),
            ));
        }
        out
    }
}

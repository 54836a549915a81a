//! Terminal rendering of hub frames.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use huddle_server::infrastructure::dto::websocket::{
    MessageDto, OutboundEvent, PersonDto, RoomStateDto, ServerFrame,
};
use huddle_shared::time::{format_local_clock, parse_rfc3339};

/// Turns frames into printable lines, remembering titles by identity.
#[derive(Debug, Default)]
pub struct Renderer {
    titles: HashMap<String, String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, frame: &ServerFrame) -> Vec<String> {
        match frame {
            ServerFrame::Event(OutboundEvent::Persons(persons)) => {
                self.remember(persons);
                vec![self.people_line(persons)]
            }
            ServerFrame::Event(OutboundEvent::SystemMessage(notice)) => {
                vec![format!("[{}] * {}", clock(&notice.date), notice.body)]
            }
            ServerFrame::Event(OutboundEvent::Message(message)) => {
                vec![self.message_line(message)]
            }
            ServerFrame::Snapshot(RoomStateDto { persons, messages }) => {
                self.remember(persons);
                std::iter::once(self.people_line(persons))
                    .chain(messages.iter().map(|m| self.message_line(m)))
                    .collect()
            }
        }
    }

    fn remember(&mut self, persons: &[PersonDto]) {
        for person in persons {
            self.titles
                .insert(person.identity.clone(), person.title.clone());
        }
    }

    fn people_line(&self, persons: &[PersonDto]) -> String {
        let titles: Vec<&str> = persons.iter().map(|p| p.title.as_str()).collect();
        format!("* people: {}", titles.join(", "))
    }

    fn message_line(&self, message: &MessageDto) -> String {
        let author = self
            .titles
            .get(&message.identity)
            .cloned()
            .unwrap_or_else(|| message.identity.chars().take(4).collect());
        format!("[{}] <{}> {}", clock(&message.date), author, message.body)
    }
}

fn clock(date: &str) -> String {
    parse_rfc3339(date)
        .map(|at: DateTime<Utc>| format_local_clock(&at))
        .unwrap_or_else(|| date.to_string())
}

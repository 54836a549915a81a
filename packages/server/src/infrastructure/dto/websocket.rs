//! WebSocket message DTOs for the presence hub.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Message, Person, RoomState, SystemMessage, Timestamp};

/// Client → server message as it travels on the wire.
///
/// The server validates raw JSON instead of deserializing into this type,
/// so clients get every shape error at once; this DTO is for building
/// messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessageDto {
    pub r#type: String,
    pub body: String,
    #[serde(rename = "publicKey")]
    pub public_key: Value,
    pub signature: Vec<u8>,
}

/// Person as broadcast in a `PERSONS` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDto {
    pub identity: String,
    pub title: String,
}

/// Chat message as broadcast in a `MESSAGE` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub identity: String,
    /// RFC 3339 with milliseconds, UTC
    pub date: String,
    pub body: String,
}

/// Join/quit notice as broadcast in a `SYSTEM_MESSAGE` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessageDto {
    pub date: String,
    pub body: String,
}

/// Full room state, sent as a bare object in snapshot mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStateDto {
    pub persons: Vec<PersonDto>,
    pub messages: Vec<MessageDto>,
}

/// Server → client event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundEvent {
    Persons(Vec<PersonDto>),
    SystemMessage(SystemMessageDto),
    Message(MessageDto),
}

/// Anything the server may send on a room socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Event(OutboundEvent),
    Snapshot(RoomStateDto),
}

impl ServerFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

fn wire_date(timestamp: &Timestamp) -> String {
    timestamp
        .value()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&Person> for PersonDto {
    fn from(person: &Person) -> Self {
        Self {
            identity: person.identity.as_str().to_string(),
            title: person.title.as_str().to_string(),
        }
    }
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            identity: message.identity.as_str().to_string(),
            date: wire_date(&message.date),
            body: message.body.as_str().to_string(),
        }
    }
}

impl From<&SystemMessage> for SystemMessageDto {
    fn from(message: &SystemMessage) -> Self {
        Self {
            date: wire_date(&message.date),
            body: message.body.clone(),
        }
    }
}

impl From<&RoomState> for RoomStateDto {
    fn from(state: &RoomState) -> Self {
        Self {
            persons: state.persons.iter().map(PersonDto::from).collect(),
            messages: state.messages.iter().map(MessageDto::from).collect(),
        }
    }
}

impl OutboundEvent {
    pub fn persons(persons: &[Person]) -> Self {
        Self::Persons(persons.iter().map(PersonDto::from).collect())
    }

    pub fn message(message: &Message) -> Self {
        Self::Message(message.into())
    }

    pub fn system_message(message: &SystemMessage) -> Self {
        Self::SystemMessage(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, MessageBody, Title};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn at() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_message_event_wire_shape() {
        // テスト項目: MESSAGE イベントは type/body 形式で identity, date, body を持つ
        // given (前提条件):
        let message = Message::new(
            Identity::new("X1".to_string()).unwrap(),
            MessageBody::new("hi".to_string()).unwrap(),
            at(),
        );

        // when (操作):
        let json = serde_json::to_value(OutboundEvent::message(&message)).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            json!({
                "type": "MESSAGE",
                "body": {"identity": "X1", "date": "2024-01-01T00:00:00.000Z", "body": "hi"}
            })
        );
    }

    #[test]
    fn test_system_message_event_type_name() {
        // テスト項目: システムメッセージの type は SYSTEM_MESSAGE
        let title = Title::new("alice".to_string()).unwrap();
        let json =
            serde_json::to_value(OutboundEvent::system_message(&SystemMessage::joined(&title, at())))
                .unwrap();
        assert_eq!(json["type"], "SYSTEM_MESSAGE");
        assert_eq!(json["body"]["body"], "alice joined");
    }

    #[test]
    fn test_persons_event_wire_shape() {
        // テスト項目: PERSONS イベントは Person の配列を body に持つ
        let person = Person::with_default_title(Identity::new("abcdef".to_string()).unwrap());
        let json = serde_json::to_value(OutboundEvent::persons(&[person])).unwrap();
        assert_eq!(
            json,
            json!({"type": "PERSONS", "body": [{"identity": "abcdef", "title": "abcd"}]})
        );
    }

    #[test]
    fn test_server_frame_distinguishes_snapshot() {
        // テスト項目: type を持たないフレームはスナップショットとして解釈される
        let snapshot = ServerFrame::parse(r#"{"persons":[],"messages":[]}"#).unwrap();
        assert_eq!(
            snapshot,
            ServerFrame::Snapshot(RoomStateDto {
                persons: vec![],
                messages: vec![]
            })
        );

        let event = ServerFrame::parse(r#"{"type":"PERSONS","body":[]}"#).unwrap();
        assert_eq!(event, ServerFrame::Event(OutboundEvent::Persons(vec![])));
    }
}

use serde::{Deserialize, Serialize};

use crate::constants::RELAY_KIND;
use crate::level::{Level, deserialize_lenient};
use crate::value::SerializedValue;

/// Why an incoming channel payload was not accepted as an envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("message carries no payload")]
    MissingPayload,

    #[error("foreign message kind: {0:?}")]
    ForeignKind(Option<String>),

    #[error("malformed relay envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The wire unit: one console call or uncaught error.
///
/// Self-contained; no later message refers back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    kind: String,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub level: Level,
    #[serde(default)]
    pub args: Vec<SerializedValue>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Envelope {
    /// Creates an envelope stamped with the relay discriminator.
    pub fn new(
        level: Level,
        args: Vec<SerializedValue>,
        timestamp: i64,
        source_url: Option<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            kind: RELAY_KIND.to_owned(),
            level,
            args,
            timestamp,
            source_url,
            session_id,
        }
    }

    /// The discriminator as received.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Parses a channel payload, rejecting anything that is not relay traffic.
    ///
    /// The discriminator is checked before the body so unrelated messages
    /// are never reported as malformed.
    pub fn from_message(data: Option<&serde_json::Value>) -> Result<Self, ProtocolError> {
        let data = match data {
            Some(serde_json::Value::Null) | None => return Err(ProtocolError::MissingPayload),
            Some(d) => d,
        };

        let kind = data.get("kind").and_then(serde_json::Value::as_str);
        if kind != Some(RELAY_KIND) {
            return Err(ProtocolError::ForeignKind(kind.map(str::to_owned)));
        }

        Ok(serde_json::from_value(data.clone())?)
    }

    /// Encodes the envelope as a channel payload.
    pub fn to_message(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// An accepted envelope together with the sender's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub origin: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ErrorDescriptor;

    fn sample() -> Envelope {
        Envelope::new(
            Level::Warn,
            vec!["disk almost full".into(), SerializedValue::Number(93.0)],
            1_700_000_000_000,
            Some("https://embed.example/widget".into()),
            None,
        )
    }

    #[test]
    fn wire_field_names() {
        let json = sample().to_message().unwrap();
        assert_eq!(json["kind"], RELAY_KIND);
        assert_eq!(json["level"], "warn");
        assert_eq!(json["args"][0], "disk almost full");
        assert_eq!(json["args"][1], 93);
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["sourceUrl"], "https://embed.example/widget");
    }

    #[test]
    fn omits_absent_optional_fields() {
        let env = Envelope::new(Level::Log, vec![], 1, None, None);
        let json = serde_json::to_string(&env).unwrap();
        assert!(!json.contains("sourceUrl"));
        assert!(!json.contains("sessionId"));
    }

    #[test]
    fn from_message_roundtrip() {
        let env = Envelope::new(
            Level::Error,
            vec![SerializedValue::Error(ErrorDescriptor {
                name: "TypeError".into(),
                message: "x is undefined".into(),
                stack: Some("TypeError: x is undefined".into()),
            })],
            5,
            None,
            Some("checkout".into()),
        );
        let msg = env.to_message().unwrap();
        let parsed = Envelope::from_message(Some(&msg)).unwrap();
        assert_eq!(parsed, env);
        assert_eq!(parsed.kind(), RELAY_KIND);
    }

    #[test]
    fn from_message_rejects_absent_payload() {
        assert!(matches!(
            Envelope::from_message(None),
            Err(ProtocolError::MissingPayload)
        ));
        assert!(matches!(
            Envelope::from_message(Some(&serde_json::Value::Null)),
            Err(ProtocolError::MissingPayload)
        ));
    }

    #[test]
    fn from_message_rejects_foreign_kind() {
        let msg = serde_json::json!({"kind": "WEBPACK_HMR", "level": "log", "args": []});
        match Envelope::from_message(Some(&msg)) {
            Err(ProtocolError::ForeignKind(Some(kind))) => assert_eq!(kind, "WEBPACK_HMR"),
            other => panic!("expected foreign kind, got {other:?}"),
        }

        let msg = serde_json::json!("just a string");
        assert!(matches!(
            Envelope::from_message(Some(&msg)),
            Err(ProtocolError::ForeignKind(None))
        ));
    }

    #[test]
    fn from_message_rejects_malformed_body() {
        let msg = serde_json::json!({"kind": RELAY_KIND, "args": "not a list"});
        assert!(matches!(
            Envelope::from_message(Some(&msg)),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn missing_level_reads_as_log() {
        let msg = serde_json::json!({"kind": RELAY_KIND, "args": ["hi"], "timestamp": 3});
        let env = Envelope::from_message(Some(&msg)).unwrap();
        assert_eq!(env.level, Level::Log);
        assert_eq!(env.args, vec![SerializedValue::from("hi")]);
    }

    #[test]
    fn relay_event_flattens_envelope() {
        let event = RelayEvent {
            envelope: sample(),
            origin: "https://embed.example".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["origin"], "https://embed.example");
        assert_eq!(json["level"], "warn");
        assert_eq!(json["kind"], RELAY_KIND);

        let back: RelayEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}

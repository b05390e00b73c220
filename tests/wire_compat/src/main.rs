fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use framerelay_protocol::{Envelope, Level, ProtocolError, RelayEvent, SerializedValue};
    use framerelay_value::{ErrorValue, ObjectRef, Thrown, Value, serialize};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes numbers so that `65` and `65.0` compare equal.
    ///
    /// Browsers print every number through one `Number` type; Rust keeps
    /// integers and floats apart.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON values
    /// (key-order independent, number-normalized).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  Browser: {fixture}\n  Rust:    {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_envelope_log() {
        let envelope: Envelope = roundtrip_test("envelope_log.json");
        assert_eq!(envelope.level, Level::Log);
        assert_eq!(envelope.args.len(), 5);
        assert_eq!(envelope.args[2], SerializedValue::Number(19.99));
        assert!(envelope.args[4].is_nullish());
        assert!(envelope.session_id.is_none());
    }

    #[test]
    fn fixture_envelope_error() {
        let envelope: Envelope = roundtrip_test("envelope_error.json");
        assert_eq!(envelope.level, Level::Error);
        let SerializedValue::Error(descriptor) = &envelope.args[0] else {
            panic!("expected an error record, got {:?}", envelope.args[0]);
        };
        assert_eq!(descriptor.name, "TypeError");
        assert!(descriptor.stack.as_deref().unwrap_or_default().contains("renderCart"));
    }

    #[test]
    fn fixture_envelope_session() {
        let envelope: Envelope = roundtrip_test("envelope_session.json");
        assert_eq!(envelope.session_id.as_deref(), Some("profile-widget"));
        let state = &envelope.args[1];
        assert_eq!(
            state.get("user").and_then(|u| u.get("id")).and_then(SerializedValue::as_str),
            Some("9007199254740993n")
        );
        assert_eq!(state.get("self").and_then(SerializedValue::as_str), Some("[Circular]"));
    }

    #[test]
    fn fixture_relay_event() {
        let event: RelayEvent = roundtrip_test("relay_event.json");
        assert_eq!(event.origin, "https://embed.example");
        assert_eq!(event.envelope.level, Level::Info);
        assert_eq!(event.envelope.session_id.as_deref(), Some("checkout"));
        assert!(event.envelope.source_url.is_none());
    }

    #[test]
    fn fixtures_parse_as_channel_messages() {
        for name in [
            "envelope_log.json",
            "envelope_error.json",
            "envelope_session.json",
        ] {
            let data = load_fixture(name);
            let envelope = Envelope::from_message(Some(&data))
                .unwrap_or_else(|e| panic!("{name} rejected: {e}"));
            assert_eq!(envelope.kind(), "IFRAME_CONSOLE_RELAY");
        }
    }

    #[test]
    fn unknown_level_reads_as_log() {
        for level in ["verbose", "warning", "fatal"] {
            let mut data = load_fixture("envelope_log.json");
            data["level"] = serde_json::json!(level);
            let envelope = Envelope::from_message(Some(&data)).unwrap();
            assert_eq!(envelope.level, Level::Log, "{level}");
        }
    }

    #[test]
    fn foreign_payload_is_rejected() {
        let mut data = load_fixture("envelope_log.json");
        data["kind"] = serde_json::json!("webpackHotUpdate");
        assert!(matches!(
            Envelope::from_message(Some(&data)),
            Err(ProtocolError::ForeignKind(Some(_)))
        ));
    }

    #[test]
    fn serializer_matches_browser_output() {
        let state = ObjectRef::new();
        state.set(
            "user",
            Value::object([
                ("id", Value::BigInt(9_007_199_254_740_993)),
                ("roles", Value::array([Value::from("admin"), Value::from("billing")])),
            ]),
        );
        state.set("onSave", Value::function("onSave"));
        state.set("callback", Value::function(""));
        state.set("tag", Value::Symbol(Some("session".into())));
        state.set(
            "root",
            Value::object([
                ("nodeType", Value::from(1)),
                ("nodeName", Value::from("DIV")),
            ]),
        );
        state.set("self", Value::Object(state.clone()));
        state.define_getter("secret", || Err(Thrown::message("denied")));
        state.set("ratio", Value::from(0.25));

        let fixture = load_fixture("envelope_session.json");
        let expected: SerializedValue = serde_json::from_value(fixture["args"][1].clone()).unwrap();
        assert_eq!(serialize(&Value::Object(state)), expected);
    }

    #[test]
    fn serializer_matches_browser_error_record() {
        let error = ErrorValue::new(
            "TypeError",
            "Cannot read properties of undefined (reading 'total')",
        )
        .with_stack(
            "TypeError: Cannot read properties of undefined (reading 'total')\n    \
             at renderCart (https://embed.example/app.js:42:17)",
        );

        let fixture = load_fixture("envelope_error.json");
        assert_eq!(
            serde_json::to_value(serialize(&Value::from(error))).unwrap(),
            fixture["args"][0]
        );
    }
}

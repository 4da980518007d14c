use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the response fails after delivering this many events.
    /// `Some(0)` means the request itself fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_after: Option<usize>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            fail_after: None,
        }
    }

    /// Creates a `PresetResponse` streaming the given text fragments.
    pub fn with_deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            deltas
                .into_iter()
                .map(|delta| PresetEvent::MessageDelta(delta.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a `PresetResponse` whose request fails immediately.
    #[inline]
    pub fn failing() -> Self {
        Self::with_events(Vec::new()).with_failure_after(0)
    }

    /// Makes the response fail after `events` events have been delivered.
    #[inline]
    pub fn with_failure_after(mut self, events: usize) -> Self {
        self.fail_after = Some(events);
        self
    }

    pub(crate) fn text(&self) -> String {
        self.events
            .iter()
            .map(|event| match event {
                PresetEvent::MessageDelta(delta) => delta.as_str(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response =
            PresetResponse::with_deltas(["I have left ", "a message for you."])
                .with_failure_after(1);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
        assert_eq!(deserialized.text(), "I have left a message for you.");
    }

    #[test]
    fn test_deserialize_without_failure() {
        let response: PresetResponse = serde_json::from_str(
            r#"{"events":[{"type":"message_delta","data":"Hi"}]}"#,
        )
        .unwrap();
        assert_eq!(response, PresetResponse::with_deltas(["Hi"]));
    }
}

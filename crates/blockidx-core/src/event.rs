//! Block events

use serde::{Deserialize, Serialize};

/// Reserved pseudo-field bound to the height of every indexed block
pub const BLOCK_HEIGHT_FIELD: &str = "block.height";

/// Build the composite field name `<event type>.<attribute key>`
pub fn composite_field(kind: &str, key: &str) -> String {
    let mut field = String::with_capacity(kind.len() + key.len() + 1);
    field.push_str(kind);
    field.push('.');
    field.push_str(key);
    field
}

/// A single key/value attribute attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
    /// Only attributes flagged for indexing are persisted
    pub index: bool,
}

impl EventAttribute {
    /// Create an attribute that will be indexed
    pub fn indexed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            index: true,
        }
    }

    /// Create an attribute that is carried but never indexed
    pub fn unindexed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            index: false,
        }
    }
}

/// A typed event emitted by block execution
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    /// Event type, the first half of every composite field
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    /// Create an event with no attributes
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute
    pub fn with_attribute(mut self, attribute: EventAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Iterate over the attributes flagged for indexing
    pub fn indexed_attributes(&self) -> impl Iterator<Item = &EventAttribute> {
        self.attributes.iter().filter(|attr| attr.index)
    }
}

/// The events emitted while executing one block
///
/// This is the unit of work for a single indexing call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockEvents {
    pub height: i64,
    pub events: Vec<Event>,
}

impl BlockEvents {
    /// Create an empty batch for a height
    pub fn new(height: i64) -> Self {
        Self {
            height,
            events: Vec::new(),
        }
    }

    /// Append an event
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_field() {
        assert_eq!(composite_field("begin_event", "proposer"), "begin_event.proposer");
        assert_eq!(composite_field("block", "height"), BLOCK_HEIGHT_FIELD);
    }

    #[test]
    fn test_indexed_attributes_filter() {
        let event = Event::new("end_event")
            .with_attribute(EventAttribute::indexed("foo", "1"))
            .with_attribute(EventAttribute::unindexed("bar", "2"))
            .with_attribute(EventAttribute::indexed("baz", "3"));

        let keys: Vec<_> = event.indexed_attributes().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["foo", "baz"]);
    }

    #[test]
    fn test_event_serde_uses_type_key() {
        let event = Event::new("begin_event").with_attribute(EventAttribute::indexed("proposer", "FCAA001"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "begin_event");
        assert_eq!(json["attributes"][0]["index"], true);

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}

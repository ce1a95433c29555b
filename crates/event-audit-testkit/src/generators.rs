//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use event_audit::{Document, EventRecord, EventType};

/// Generate a known event type.
pub fn event_type() -> impl Strategy<Value = EventType> {
    prop_oneof![
        Just(EventType::Main),
        Just(EventType::Deploys),
        Just(EventType::Sigs),
    ]
}

/// Generate a non-empty type label in any letter case.
pub fn type_label() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,15}".prop_map(String::from)
}

/// Generate a field name.
pub fn field_name() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,11}".prop_map(String::from)
}

/// Generate a sequence number.
pub fn sequence() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX
}

/// Generate a finite float.
pub fn finite_f64() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

/// Generate a scalar JSON value.
pub fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        finite_f64().prop_map(Value::from),
        "\\PC{0,16}".prop_map(Value::String),
    ]
}

/// Generate a JSON value nested up to a few levels deep.
pub fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(field_name(), inner, 0..6)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

/// Generate a storable event document: arbitrary fields plus a valid `type`
/// and an optional numeric `id`.
pub fn event_document() -> impl Strategy<Value = Document> {
    (
        prop::collection::btree_map(field_name(), json_value(), 0..8),
        type_label(),
        proptest::option::of(sequence()),
    )
        .prop_map(|(fields, label, id)| {
            let mut map: Map<String, Value> = fields.into_iter().collect();
            map.insert(Document::TYPE_FIELD.to_string(), Value::String(label));
            match id {
                Some(id) => map.insert(Document::SEQUENCE_FIELD.to_string(), Value::from(id)),
                None => map.remove(Document::SEQUENCE_FIELD),
            };
            Document::from(map)
        })
}

/// Parameters for generating a typed event.
#[derive(Debug, Clone)]
pub struct EventParams {
    pub event_type: EventType,
    pub id: Option<i64>,
    pub source: Option<String>,
    pub data_type: Option<String>,
    pub data: Value,
}

impl Arbitrary for EventParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            event_type(),
            proptest::option::of(sequence()),
            proptest::option::of("http://[a-z]{1,8}:[0-9]{4}/events/[a-z]{1,8}"),
            proptest::option::of("[A-Z][A-Za-z]{0,15}"),
            json_value(),
        )
            .prop_map(|(event_type, id, source, data_type, data)| EventParams {
                event_type,
                id,
                source,
                data_type,
                data,
            })
            .boxed()
    }
}

/// Build a typed event from parameters.
pub fn event_from_params(params: &EventParams) -> EventRecord {
    let mut record = EventRecord::new(params.event_type.collection_name(), params.data.clone());
    record.id = params.id;
    record.source = params.source.clone();
    record.data_type = params.data_type.clone();
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_event_documents_are_storable(doc in event_document()) {
            prop_assert!(doc.event_type().is_ok());
            let reparsed = Document::parse(&doc.to_json_string()).unwrap();
            prop_assert_eq!(reparsed, doc);
        }

        #[test]
        fn test_event_record_round_trips(params: EventParams) {
            let record = event_from_params(&params);
            let doc = record.clone().into_document().unwrap();

            prop_assert_eq!(doc.event_type().unwrap(), params.event_type.collection_name());
            prop_assert_eq!(doc.sequence(), params.id);
            prop_assert_eq!(EventRecord::try_from(&doc).unwrap(), record);
        }
    }
}

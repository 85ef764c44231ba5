//! Inbound payload model.
//!
//! The NLU provider annotates every message before it reaches the webhook.
//! The annotation lives at a fixed nesting inside the conversation payload:
//!
//! ```text
//! conversation
//! └── messages[0]
//!     └── messageValidation
//!         └── data
//!             └── entities
//!                 ├── intent:   [{ value, confidence, ... }, ...]
//!                 ├── location: [{ value, ... }, ...]
//!                 └── ...
//! ```
//!
//! [`RequestView`] is the typed projection of that `entities` object. The
//! remainder of the payload is kept untouched as a [`serde_json::Value`] so
//! handlers can read whatever else the provider sent.

use std::collections::hash_map;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExtractError, ExtractResult};

/// Reserved entity name under which the provider lists detected intents.
pub const INTENT_KEY: &str = "intent";

const ENTITIES_PATH: &str = "conversation.messages[0].messageValidation.data.entities";
const INTENT_PATH: &str = "conversation.messages[0].messageValidation.data.entities.intent";

/// A single entity instance as reported by the NLU provider.
///
/// Only `value` is interpreted by the dispatcher. Every other field
/// (`confidence`, `type`, ...) is preserved in [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitEntity {
    /// The resolved value of the entity.
    #[serde(default)]
    pub value: Value,

    /// Provider-specific fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WitEntity {
    /// Creates an entity instance with the given value and no extra fields.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            extra: Map::new(),
        }
    }

    /// Adds a provider-specific field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns the value as a string slice, if it is a JSON string.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Returns `true` if the value is the JSON string `expected`.
    pub fn value_is(&self, expected: &str) -> bool {
        self.value_str() == Some(expected)
    }

    /// Returns the provider confidence, if present.
    pub fn confidence(&self) -> Option<f64> {
        self.extra.get("confidence").and_then(Value::as_f64)
    }
}

/// Mapping from entity name to every instance matched for that name.
///
/// Deserialization is lenient per name: an entry that is not a list of
/// entity objects is kept as present with no instances, and its name is
/// reported by [`is_malformed`](Self::is_malformed). Only requirements that
/// name such an entry can fail because of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntityMap {
    entries: HashMap<String, Vec<WitEntity>>,
    #[serde(skip)]
    malformed: BTreeSet<String>,
}

impl EntityMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds instances for `name` (builder pattern).
    pub fn with(mut self, name: impl Into<String>, instances: Vec<WitEntity>) -> Self {
        self.insert(name, instances);
        self
    }

    /// Replaces the instances recorded for `name`.
    pub fn insert(&mut self, name: impl Into<String>, instances: Vec<WitEntity>) {
        let name = name.into();
        self.malformed.remove(&name);
        self.entries.insert(name, instances);
    }

    /// Records `name` as present but not a list of entity objects.
    pub fn insert_malformed(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.entries.insert(name.clone(), Vec::new());
        self.malformed.insert(name);
    }

    /// Returns the instances recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&[WitEntity]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Returns `true` if the provider sent `name` with an unexpected shape.
    pub fn is_malformed(&self, name: &str) -> bool {
        self.malformed.contains(name)
    }

    /// Names whose entries had an unexpected shape, in sorted order.
    pub fn malformed_names(&self) -> impl Iterator<Item = &str> {
        self.malformed.iter().map(String::as_str)
    }

    /// Returns `true` if at least one instance exists for `name`.
    pub fn has_any(&self, name: &str) -> bool {
        self.get(name).is_some_and(|list| !list.is_empty())
    }

    /// Returns `true` if some instance of `name` has the string value `value`.
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.get(name)
            .is_some_and(|list| list.iter().any(|e| e.value_is(value)))
    }

    /// Returns the first instance of `name`.
    pub fn first(&self, name: &str) -> Option<&WitEntity> {
        self.get(name).and_then(<[WitEntity]>::first)
    }

    /// Iterates over entity names and their instances.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<WitEntity>> {
        self.entries.iter()
    }

    /// Number of entity names present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entity names are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a map from a raw `entities` object, one entry at a time.
    pub fn from_raw(raw: Map<String, Value>) -> Self {
        let mut map = Self::new();
        for (name, value) in raw {
            match serde_json::from_value::<Vec<WitEntity>>(value) {
                Ok(instances) => map.insert(name, instances),
                Err(_) => map.insert_malformed(name),
            }
        }
        map
    }
}

impl<'de> Deserialize<'de> for EntityMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::deserialize(deserializer).map(Self::from_raw)
    }
}

impl FromIterator<(String, Vec<WitEntity>)> for EntityMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<WitEntity>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            malformed: BTreeSet::new(),
        }
    }
}

/// The intent/entity views extracted from one inbound payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestView {
    /// Intents detected for the message, in provider order.
    pub intents: Vec<WitEntity>,
    /// All entities, including the reserved `intent` key.
    pub entities: EntityMap,
}

impl RequestView {
    /// Creates a view from already-typed parts.
    pub fn new(intents: Vec<WitEntity>, entities: EntityMap) -> Self {
        Self { intents, entities }
    }

    /// Extracts the view from a raw payload.
    ///
    /// Every segment of the nesting must be present and `entities` must be
    /// an object. A missing or malformed `intent` list is an error rather
    /// than an empty list. Other entity entries are read leniently.
    pub fn extract(payload: &Value) -> ExtractResult<Self> {
        let raw = field(payload, "conversation", "conversation")
            .and_then(|v| field(v, "messages", "conversation.messages"))
            .and_then(|v| {
                v.get(0).ok_or(ExtractError::MissingField {
                    path: "conversation.messages[0]",
                })
            })
            .and_then(|v| {
                field(
                    v,
                    "messageValidation",
                    "conversation.messages[0].messageValidation",
                )
            })
            .and_then(|v| field(v, "data", "conversation.messages[0].messageValidation.data"))
            .and_then(|v| field(v, "entities", ENTITIES_PATH))?;

        let raw = raw
            .as_object()
            .ok_or_else(|| ExtractError::malformed(ENTITIES_PATH, "expected an object"))?;

        let intents = raw
            .get(INTENT_KEY)
            .ok_or(ExtractError::MissingField { path: INTENT_PATH })
            .and_then(|v| {
                Vec::<WitEntity>::deserialize(v)
                    .map_err(|e| ExtractError::malformed(INTENT_PATH, e))
            })?;

        let entities = EntityMap::from_raw(raw.clone());

        Ok(Self { intents, entities })
    }

    /// Returns `true` if one of the detected intents has the value `name`.
    pub fn has_intent(&self, name: &str) -> bool {
        self.intents.iter().any(|i| i.value_is(name))
    }
}

fn field<'a>(value: &'a Value, key: &str, path: &'static str) -> ExtractResult<&'a Value> {
    value.get(key).ok_or(ExtractError::MissingField { path })
}

/// One inbound call: the raw payload plus its extracted views.
///
/// Cloning is cheap; both parts are reference counted.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    payload: Arc<Value>,
    view: Arc<RequestView>,
}

impl InboundRequest {
    /// Builds a request from an already-parsed payload.
    pub fn from_value(payload: Value) -> ExtractResult<Self> {
        let view = RequestView::extract(&payload)?;
        Ok(Self {
            payload: Arc::new(payload),
            view: Arc::new(view),
        })
    }

    /// Parses and builds a request from a raw JSON body.
    pub fn from_slice(body: &[u8]) -> ExtractResult<Self> {
        Self::from_value(serde_json::from_slice(body)?)
    }

    /// Builds a request from parts without going through extraction.
    pub fn from_parts(payload: Value, view: RequestView) -> Self {
        Self {
            payload: Arc::new(payload),
            view: Arc::new(view),
        }
    }

    /// The raw payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// A shared handle to the raw payload.
    pub fn payload_arc(&self) -> Arc<Value> {
        Arc::clone(&self.payload)
    }

    /// The extracted views.
    pub fn view(&self) -> &RequestView {
        &self.view
    }

    /// Detected intents.
    pub fn intents(&self) -> &[WitEntity] {
        &self.view.intents
    }

    /// The entity mapping.
    pub fn entities(&self) -> &EntityMap {
        &self.view.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(entities: Value) -> Value {
        json!({
            "conversation": {
                "id": "c-1",
                "messages": [{
                    "text": "hola",
                    "messageValidation": { "data": { "entities": entities } }
                }]
            }
        })
    }

    #[test]
    fn test_extract_views() {
        let body = payload(json!({
            "intent": [{ "value": "greet", "confidence": 0.97 }],
            "location": [{ "value": "Ourense" }, { "value": "Vigo" }]
        }));

        let view = RequestView::extract(&body).unwrap();

        assert_eq!(view.intents.len(), 1);
        assert!(view.has_intent("greet"));
        assert_eq!(view.intents[0].confidence(), Some(0.97));
        assert!(view.entities.has_value("location", "Vigo"));
        assert!(view.entities.has_any(INTENT_KEY));
        assert_eq!(view.entities.len(), 2);
    }

    #[test]
    fn test_missing_intent_list_is_an_error() {
        let body = payload(json!({ "location": [{ "value": "Vigo" }] }));

        let err = RequestView::extract(&body).unwrap_err();
        assert!(matches!(err, ExtractError::MissingField { path } if path.ends_with(".intent")));
    }

    #[test]
    fn test_missing_messages() {
        let body = json!({ "conversation": { "messages": [] } });

        let err = RequestView::extract(&body).unwrap_err();
        assert_eq!(
            err,
            ExtractError::MissingField {
                path: "conversation.messages[0]"
            }
        );
    }

    #[test]
    fn test_malformed_entity_list() {
        let body = payload(json!({ "intent": "greet" }));

        let err = RequestView::extract(&body).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));
    }

    #[test]
    fn test_entities_must_be_an_object() {
        let body = payload(json!([{ "intent": [] }]));

        let err = RequestView::extract(&body).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { path, .. } if path == ENTITIES_PATH));
    }

    #[test]
    fn test_unrelated_malformed_entity_is_tolerated() {
        let body = payload(json!({
            "intent": [{ "value": "greet" }],
            "location": { "value": "Vigo" },
            "date": ["tomorrow"],
            "section": [{ "value": "news" }]
        }));

        let view = RequestView::extract(&body).unwrap();

        assert!(view.has_intent("greet"));
        assert!(view.entities.is_malformed("location"));
        assert!(view.entities.is_malformed("date"));
        assert!(!view.entities.has_any("location"));
        assert!(!view.entities.has_value("location", "Vigo"));
        assert!(view.entities.has_value("section", "news"));
        assert_eq!(
            view.entities.malformed_names().collect::<Vec<_>>(),
            ["date", "location"]
        );
    }

    #[test]
    fn test_entity_without_value_is_kept() {
        let body = payload(json!({ "intent": [{ "confidence": 0.4 }] }));

        let view = RequestView::extract(&body).unwrap();
        assert_eq!(view.intents[0].value, Value::Null);
        assert!(!view.has_intent("greet"));
    }

    #[test]
    fn test_empty_list_is_not_presence() {
        let entities = EntityMap::new().with("location", vec![]);

        assert!(!entities.has_any("location"));
        assert!(!entities.has_any("date"));
        assert!(entities.get("location").is_some());
    }

    #[test]
    fn test_from_slice_rejects_invalid_json() {
        let err = InboundRequest::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidJson(_)));
    }

    #[test]
    fn test_request_keeps_raw_payload() {
        let body = payload(json!({ "intent": [{ "value": "greet" }] }));

        let request = InboundRequest::from_value(body.clone()).unwrap();
        assert_eq!(request.payload(), &body);
        assert_eq!(request.payload()["conversation"]["id"], "c-1");
        assert_eq!(request.intents()[0].value_str(), Some("greet"));
    }
}

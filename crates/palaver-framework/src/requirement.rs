//! Entity requirements declared by handlers.
//!
//! A requirement is either presence-only or value-constrained. In data form
//! (config files, JSON route tables) it is written the way NLU tooling
//! usually spells it:
//!
//! ```text
//! "location"               -> Presence("location")
//! ["location"]             -> Presence("location")
//! ["location", "Ourense"]  -> Value { name: "location", value: "Ourense" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::MatchFailure;
use palaver_core::EntityMap;

/// A constraint on the entities of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRequirement", into = "RawRequirement")]
pub enum EntityRequirement {
    /// At least one instance of the entity must be present.
    Presence(String),
    /// At least one instance must carry exactly this value.
    Value {
        /// Entity name.
        name: String,
        /// Expected value.
        value: String,
    },
}

impl EntityRequirement {
    /// Creates a presence-only requirement.
    pub fn presence(name: impl Into<String>) -> Self {
        Self::Presence(name.into())
    }

    /// Creates a value requirement.
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Value {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The entity name this requirement refers to.
    pub fn name(&self) -> &str {
        match self {
            Self::Presence(name) | Self::Value { name, .. } => name,
        }
    }

    /// Tests the requirement against an entity mapping.
    pub fn check(&self, entities: &EntityMap) -> Result<(), MatchFailure> {
        let name = self.name();
        if entities.is_malformed(name) {
            return Err(MatchFailure::EntityMalformed {
                name: name.to_string(),
            });
        }
        if !entities.has_any(name) {
            return Err(MatchFailure::EntityAbsent {
                name: name.to_string(),
            });
        }

        match self {
            Self::Presence(_) => Ok(()),
            Self::Value { name, value } => {
                if entities.has_value(name, value) {
                    Ok(())
                } else {
                    Err(MatchFailure::EntityValueAbsent {
                        name: name.clone(),
                        value: value.clone(),
                    })
                }
            }
        }
    }
}

impl From<&str> for EntityRequirement {
    fn from(name: &str) -> Self {
        Self::presence(name)
    }
}

impl From<String> for EntityRequirement {
    fn from(name: String) -> Self {
        Self::Presence(name)
    }
}

impl From<(&str, &str)> for EntityRequirement {
    fn from((name, value): (&str, &str)) -> Self {
        Self::value(name, value)
    }
}

/// Loose wire form of a requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Name(String),
    Tuple(Vec<String>),
}

impl TryFrom<RawRequirement> for EntityRequirement {
    type Error = String;

    fn try_from(raw: RawRequirement) -> Result<Self, Self::Error> {
        match raw {
            RawRequirement::Name(name) => Ok(Self::Presence(name)),
            RawRequirement::Tuple(parts) => {
                let mut parts = parts.into_iter();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(name), None, None) => Ok(Self::Presence(name)),
                    (Some(name), Some(value), None) => Ok(Self::Value { name, value }),
                    _ => Err("entity requirement must be [name] or [name, value]".to_string()),
                }
            }
        }
    }
}

impl From<EntityRequirement> for RawRequirement {
    fn from(requirement: EntityRequirement) -> Self {
        match requirement {
            EntityRequirement::Presence(name) => Self::Name(name),
            EntityRequirement::Value { name, value } => Self::Tuple(vec![name, value]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::WitEntity;
    use serde_json::json;

    fn cities() -> EntityMap {
        EntityMap::new().with(
            "location",
            vec![WitEntity::new("Ourense"), WitEntity::new("Vigo")],
        )
    }

    #[test]
    fn test_parse_loose_shapes() {
        let parsed: Vec<EntityRequirement> =
            serde_json::from_value(json!(["location", ["date"], ["location", "Vigo"]])).unwrap();

        assert_eq!(
            parsed,
            vec![
                EntityRequirement::presence("location"),
                EntityRequirement::presence("date"),
                EntityRequirement::value("location", "Vigo"),
            ]
        );
    }

    #[test]
    fn test_reject_bad_tuples() {
        assert!(serde_json::from_value::<EntityRequirement>(json!([])).is_err());
        assert!(serde_json::from_value::<EntityRequirement>(json!(["a", "b", "c"])).is_err());
        assert!(serde_json::from_value::<EntityRequirement>(json!(42)).is_err());
    }

    #[test]
    fn test_serialize_back_to_loose_shape() {
        let value = serde_json::to_value(vec![
            EntityRequirement::presence("location"),
            EntityRequirement::value("location", "Vigo"),
        ])
        .unwrap();

        assert_eq!(value, json!(["location", ["location", "Vigo"]]));
    }

    #[test]
    fn test_presence_ignores_values() {
        assert!(EntityRequirement::presence("location").check(&cities()).is_ok());
        assert_eq!(
            EntityRequirement::presence("date").check(&cities()),
            Err(MatchFailure::EntityAbsent {
                name: "date".into()
            })
        );
    }

    #[test]
    fn test_malformed_entity_fails_only_its_requirements() {
        let mut entities = cities();
        entities.insert_malformed("date");

        assert!(EntityRequirement::value("location", "Vigo").check(&entities).is_ok());
        assert_eq!(
            EntityRequirement::presence("date").check(&entities),
            Err(MatchFailure::EntityMalformed {
                name: "date".into()
            })
        );
    }

    #[test]
    fn test_value_requires_exact_match() {
        assert!(EntityRequirement::value("location", "Vigo").check(&cities()).is_ok());
        assert_eq!(
            EntityRequirement::value("location", "vigo").check(&cities()),
            Err(MatchFailure::EntityValueAbsent {
                name: "location".into(),
                value: "vigo".into()
            })
        );
        assert!(matches!(
            EntityRequirement::value("date", "today").check(&cities()),
            Err(MatchFailure::EntityAbsent { .. })
        ));
    }
}

//! Entity matcher.
//!
//! [`Requirements`] is the guard attached to every route. It is a pure
//! predicate over a [`RequestView`]: an optional intent that must have been
//! detected, plus a list of [`EntityRequirement`]s that must all hold.
//!
//! ```rust,ignore
//! let requirements = Requirements::new()
//!     .intent("weather")
//!     .entity("location")
//!     .entity(("unit", "celsius"));
//!
//! requirements.check(request.view())?;
//! ```
//!
//! A route without requirements accepts every request.

use serde::{Deserialize, Serialize};

use crate::error::MatchFailure;
use crate::requirement::EntityRequirement;
use palaver_core::RequestView;

/// The intent and entity constraints of one route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Intent that must be among the detected intents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    /// Entity constraints, all of which must hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntityRequirement>,
}

impl Requirements {
    /// Creates an empty set of requirements that matches every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the given intent.
    pub fn intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    /// Adds an entity requirement.
    pub fn entity(mut self, requirement: impl Into<EntityRequirement>) -> Self {
        self.entities.push(requirement.into());
        self
    }

    /// Returns `true` if nothing is required.
    pub fn is_empty(&self) -> bool {
        self.intent.is_none() && self.entities.is_empty()
    }

    /// Checks the requirements against a request, reporting the first one
    /// that does not hold.
    pub fn check(&self, view: &RequestView) -> Result<(), MatchFailure> {
        if let Some(intent) = &self.intent
            && !view.has_intent(intent)
        {
            return Err(MatchFailure::IntentAbsent {
                intent: intent.clone(),
            });
        }

        self.entities
            .iter()
            .try_for_each(|requirement| requirement.check(&view.entities))
    }

    /// Returns `true` if the request satisfies every requirement.
    pub fn matches(&self, view: &RequestView) -> bool {
        self.check(view).is_ok()
    }
}

//! Extractor system for the Palaver framework.
//!
//! This module provides the [`FromRequest`] trait, which defines how types
//! can be extracted from an [`InboundRequest`] for use as handler parameters.
//!
//! The built-in extractors mirror what a webhook handler usually needs:
//!
//! | Extractor         | Contents                                    |
//! |-------------------|---------------------------------------------|
//! | [`Payload`]       | the raw JSON body                           |
//! | [`Intents`]       | detected intents, in provider order         |
//! | [`Entities`]      | the full entity mapping                     |
//! | [`RequestView`]   | intents and entities together               |
//! | [`InboundRequest`]| everything                                  |

use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;

use palaver_core::{EntityMap, ExtractError, InboundRequest, RequestView, WitEntity};

/// A trait for types that can be extracted from an [`InboundRequest`].
///
/// If extraction fails the handler is not run and the attempt counts as a
/// failure, so the chain moves on to the next handler.
///
/// # Example
///
/// ```rust,ignore
/// struct ConversationId(String);
///
/// impl FromRequest for ConversationId {
///     fn from_request(req: &InboundRequest) -> Result<Self, ExtractError> {
///         req.payload()["conversation"]["id"]
///             .as_str()
///             .map(|id| ConversationId(id.to_string()))
///             .ok_or(ExtractError::MissingField { path: "conversation.id" })
///     }
/// }
/// ```
pub trait FromRequest: Sized {
    /// Attempts to extract this type from the given request.
    fn from_request(req: &InboundRequest) -> Result<Self, ExtractError>;
}

/// The raw inbound payload.
#[derive(Debug, Clone)]
pub struct Payload(pub Arc<Value>);

impl Deref for Payload {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Payload {
    fn from_request(req: &InboundRequest) -> Result<Self, ExtractError> {
        Ok(Self(req.payload_arc()))
    }
}

/// Intents detected for the message.
#[derive(Debug, Clone)]
pub struct Intents(pub Vec<WitEntity>);

impl Deref for Intents {
    type Target = [WitEntity];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Intents {
    fn from_request(req: &InboundRequest) -> Result<Self, ExtractError> {
        Ok(Self(req.intents().to_vec()))
    }
}

/// The entity mapping of the message.
#[derive(Debug, Clone)]
pub struct Entities(pub EntityMap);

impl Deref for Entities {
    type Target = EntityMap;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Entities {
    fn from_request(req: &InboundRequest) -> Result<Self, ExtractError> {
        Ok(Self(req.entities().clone()))
    }
}

impl FromRequest for RequestView {
    fn from_request(req: &InboundRequest) -> Result<Self, ExtractError> {
        Ok(req.view().clone())
    }
}

impl FromRequest for InboundRequest {
    fn from_request(req: &InboundRequest) -> Result<Self, ExtractError> {
        Ok(req.clone())
    }
}

/// Optional parameters never fail extraction.
impl<T: FromRequest> FromRequest for Option<T> {
    fn from_request(req: &InboundRequest) -> Result<Self, ExtractError> {
        Ok(T::from_request(req).ok())
    }
}

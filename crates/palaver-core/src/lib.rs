//! # Palaver Core
//!
//! Data types shared by every layer of the Palaver webhook dispatcher.
//!
//! ## Contents
//!
//! - **Inbound payload**: the raw conversation JSON and the intent/entity
//!   views the NLU provider attached to it ([`InboundRequest`],
//!   [`RequestView`], [`EntityMap`], [`WitEntity`])
//! - **Outbound response**: the chat reply handed back to the caller
//!   ([`Response`], [`ResponseKind`])
//! - **Text utilities**: emoji stripping used to derive spoken text
//!   ([`text::strip_emojis`])
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌──────────┐
//! │ raw payload  │────▶│ RequestView │────▶│ Handler  │────▶ Response
//! │ (JSON body)  │     │ intents +   │     │  chain   │
//! └──────────────┘     │ entities    │     └──────────┘
//!                      └─────────────┘
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod text;

pub use error::{ExtractError, ExtractResult};
pub use request::{EntityMap, INTENT_KEY, InboundRequest, RequestView, WitEntity};
pub use response::{Response, ResponseKind};

/// Prelude for common imports.
pub mod prelude {
    pub use super::error::{ExtractError, ExtractResult};
    pub use super::request::{EntityMap, InboundRequest, RequestView, WitEntity};
    pub use super::response::{Response, ResponseKind};
}

//! # Palaver Transport
//!
//! Network wiring for Palaver endpoints.
//!
//! The dispatch logic lives entirely in `palaver-framework`; this crate only
//! moves bytes between the network and an [`Endpoint`](palaver_framework::Endpoint).
//!
//! ## Features
//!
//! - `http-server`: mounts endpoints on an axum router
//! - `full`: everything
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  NLU provider       │  POST <path> with annotated conversation JSON
//! ├─────────────────────┤
//! │  palaver-transport  │  <- This crate (axum router, graceful shutdown)
//! ├─────────────────────┤
//! │  palaver-framework  │  Endpoint -> HandlerChain -> Reply
//! └─────────────────────┘
//! ```

pub mod error;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{TransportError, TransportResult};

#[cfg(feature = "http-server")]
pub use http::{router, serve};

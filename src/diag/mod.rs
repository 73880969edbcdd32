//! # UDS Diagnostic Routing
//!
//! Dispatches UDS requests to the service registered for their SID.
//!
//! ## Key Types
//!
//! - [`UdsServiceRouter`] - SID registry and dispatch
//! - [`RoutableUdsService`] - contract for services behind the router
//! - [`ResponseFuture`] / [`Responder`] - single-resolution asynchronous result
//! - [`CancellationSource`] / [`CancellationHandler`] - conversation abort signalling
//! - [`MetaInfo`] - request metadata passed through to the service

pub mod cancellation;
pub mod meta;
pub mod response;
pub mod router;
pub mod service;

pub use cancellation::{CancellationHandler, CancellationSource};
pub use meta::{Context, MetaInfo};
pub use response::{NegativeResponseCode, OperationOutput, Resolution, Responder, ResponseFuture};
pub use router::UdsServiceRouter;
pub use service::{OfferState, RoutableUdsService};

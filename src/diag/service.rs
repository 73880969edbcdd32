use super::cancellation::CancellationHandler;
use super::meta::MetaInfo;
use super::response::ResponseFuture;
use crate::error::DiagError;
use std::sync::atomic::{AtomicBool, Ordering};

/// A diagnostic service that can sit behind a [`super::UdsServiceRouter`].
pub trait RoutableUdsService: Send + Sync {
    /// Must be callable concurrently with `handle_message`.
    fn is_offered(&self) -> bool;

    /// Handle a request. Implementations observe `cancellation` and resolve
    /// the returned future promptly once the conversation is aborted.
    fn handle_message(
        &self,
        request: &[u8],
        meta_info: &MetaInfo,
        cancellation: CancellationHandler,
    ) -> ResponseFuture;
}

/// Offer flag for service implementations.
#[derive(Debug, Default)]
pub struct OfferState {
    offered: AtomicBool,
}

impl OfferState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&self) -> Result<(), DiagError> {
        self.offered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| DiagError::AlreadyOffered)
    }

    pub fn stop_offer(&self) {
        self.offered.store(false, Ordering::Release);
    }

    pub fn is_offered(&self) -> bool {
        self.offered.load(Ordering::Acquire)
    }
}

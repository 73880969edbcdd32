use super::cancellation::CancellationHandler;
use super::meta::MetaInfo;
use super::response::{NegativeResponseCode, OperationOutput, ResponseFuture};
use super::service::RoutableUdsService;
use crate::logging::{DiagLogger, LogFacade, LogLevel};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Routes UDS requests to the service registered for their SID.
///
/// The router does not own its services: the registry holds weak references,
/// and a service that has been dropped is treated as unregistered.
pub struct UdsServiceRouter {
    specifier: String,
    services: RwLock<HashMap<u8, Weak<dyn RoutableUdsService>>>,
    logger: Arc<dyn DiagLogger>,
}

impl UdsServiceRouter {
    pub fn new(specifier: impl Into<String>) -> Self {
        Self::with_logger(specifier, LogFacade::new())
    }

    pub fn with_logger(specifier: impl Into<String>, logger: Arc<dyn DiagLogger>) -> Self {
        UdsServiceRouter {
            specifier: specifier.into(),
            services: RwLock::new(HashMap::new()),
            logger,
        }
    }

    /// Instance specifier of the owning diagnostic server.
    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    /// Register `service` for `sid`. Returns `true` if this replaced a
    /// previous registration.
    pub fn register<S>(&self, sid: u8, service: &Arc<S>) -> bool
    where
        S: RoutableUdsService + 'static,
    {
        let weak: Weak<S> = Arc::downgrade(service);
        let weak: Weak<dyn RoutableUdsService> = weak;
        let replaced = self.write().insert(sid, weak).is_some();
        self.logger.log(
            LogLevel::Info,
            "UdsRouter",
            &format!("[{}] registered service for SID 0x{:02x}", self.specifier, sid),
        );
        replaced
    }

    pub fn unregister(&self, sid: u8) -> bool {
        let removed = self.write().remove(&sid).is_some();
        if removed {
            self.logger.log(
                LogLevel::Info,
                "UdsRouter",
                &format!("[{}] unregistered SID 0x{:02x}", self.specifier, sid),
            );
        }
        removed
    }

    pub fn is_registered(&self, sid: u8) -> bool {
        self.resolve(sid).is_some()
    }

    /// Forward the request to the service for `sid` if it is registered and
    /// currently offered; otherwise resolve immediately with `[0x7F, sid, 0x11]`.
    pub fn route(
        &self,
        sid: u8,
        request: &[u8],
        meta_info: &MetaInfo,
        cancellation: CancellationHandler,
    ) -> ResponseFuture {
        match self.resolve(sid) {
            Some(service) if service.is_offered() => service.handle_message(request, meta_info, cancellation),
            _ => {
                self.logger.log(
                    LogLevel::Debug,
                    "UdsRouter",
                    &format!("[{}] SID 0x{:02x} not supported", self.specifier, sid),
                );
                ResponseFuture::ready(OperationOutput::negative(sid, NegativeResponseCode::ServiceNotSupported))
            }
        }
    }

    // The read lock is released before the service is called.
    fn resolve(&self, sid: u8) -> Option<Arc<dyn RoutableUdsService>> {
        self.read().get(&sid).and_then(Weak::upgrade)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<u8, Weak<dyn RoutableUdsService>>> {
        self.services.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<u8, Weak<dyn RoutableUdsService>>> {
        self.services.write().unwrap_or_else(|e| e.into_inner())
    }
}

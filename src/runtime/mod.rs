//! # Diagnostic Runtime
//!
//! Wires a [`UdsServiceRouter`] and one [`SdClient`] per required service
//! from configuration. Transport is left to the caller: received SD
//! datagrams are handed to [`DiagRuntime::handle_sd_datagram`].
//!
//! ## Lifecycle
//!
//! 1. Load configuration: `DiagRuntime::load("diag.json", "tester", handle)`
//! 2. Register services: `runtime.router().register(0x22, &service)`
//! 3. Feed discovery traffic: `runtime.handle_sd_datagram(&datagram)`
//! 4. Route requests: `runtime.router().route(sid, &request, &meta, cancellation)`
//!
//! ## Example
//!
//! ```ignore
//! let runtime = DiagRuntime::load("diag.json", "tester", tokio::runtime::Handle::current())?;
//! runtime.wait_for_service("dtc")?;
//! ```

pub mod config;

use config::{InstanceConfig, SystemConfig};
use crate::codec::SdMessage;
use crate::diag::UdsServiceRouter;
use crate::error::{ConfigError, DiagError, WireError};
use crate::logging::{DiagLogger, LogFacade, LogLevel};
use crate::sd::client::{RequiredService, SdClient};
use crate::sd::machine::ClientServiceState;
use crate::sd::timer::{LeaseTimer, TokioLeaseTimer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

pub struct DiagRuntime {
    instance: String,
    router: Arc<UdsServiceRouter>,
    clients: HashMap<String, SdClient>,
    config: InstanceConfig,
    logger: Arc<dyn DiagLogger>,
}

impl DiagRuntime {
    /// Load `instance_name` from the JSON config at `path`, using tokio lease timers.
    pub fn load(path: impl AsRef<Path>, instance_name: &str, handle: Handle) -> Result<Self, ConfigError> {
        let logger = LogFacade::new();
        logger.log(
            LogLevel::Info,
            "Runtime",
            &format!("Loading config from {}", path.as_ref().display()),
        );

        let system = SystemConfig::load(path)?;
        let config = system.instance(instance_name)?.clone();

        Ok(Self::from_config(instance_name, config, logger, move || {
            TokioLeaseTimer::new(handle.clone()) as Arc<dyn LeaseTimer>
        }))
    }

    /// Build from an already parsed instance config; `timer_factory` supplies
    /// one lease timer per required service.
    pub fn from_config<F>(instance_name: &str, config: InstanceConfig, logger: Arc<dyn DiagLogger>, timer_factory: F) -> Self
    where
        F: Fn() -> Arc<dyn LeaseTimer>,
    {
        let router = Arc::new(UdsServiceRouter::with_logger(config.router.specifier.clone(), Arc::clone(&logger)));

        let clients = config
            .required
            .iter()
            .map(|(alias, required)| {
                let service = RequiredService::new(required.service_id, required.instance_id, required.major_version);
                let client = SdClient::new(service, timer_factory(), Arc::clone(&logger));
                client.start();
                if !required.requested {
                    client.machine().service_not_requested();
                }
                (alias.clone(), client)
            })
            .collect::<HashMap<_, _>>();

        logger.log(
            LogLevel::Info,
            "Runtime",
            &format!("Initialized '{}' with {} required service(s)", instance_name, clients.len()),
        );

        DiagRuntime {
            instance: instance_name.to_string(),
            router,
            clients,
            config,
            logger,
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn router(&self) -> &Arc<UdsServiceRouter> {
        &self.router
    }

    pub fn client(&self, alias: &str) -> Option<&SdClient> {
        self.clients.get(alias)
    }

    /// Decode an SD datagram and feed it to every client. Returns the number
    /// of entries applied across clients. A client that received a Stop Offer
    /// ignores further offers until [`DiagRuntime::restart_service`].
    pub fn handle_sd_datagram(&self, datagram: &[u8]) -> Result<usize, WireError> {
        let message = SdMessage::decode(datagram).inspect_err(|e| {
            self.logger.log(LogLevel::Warn, "Runtime", &format!("Dropping SD datagram: {}", e));
        })?;

        Ok(self
            .clients
            .values()
            .map(|client| client.handle_packet(message.packet()))
            .sum())
    }

    pub fn service_state(&self, alias: &str) -> Option<ClientServiceState> {
        self.clients.get(alias).map(SdClient::state)
    }

    pub fn request_service(&self, alias: &str) -> Result<(), DiagError> {
        self.lookup(alias)?.machine().service_requested();
        Ok(())
    }

    pub fn release_service(&self, alias: &str) -> Result<(), DiagError> {
        self.lookup(alias)?.machine().service_not_requested();
        Ok(())
    }

    /// Resume discovery for a service that was stopped.
    pub fn restart_service(&self, alias: &str) -> Result<(), DiagError> {
        let client = self.lookup(alias)?;
        client.start();
        self.logger.log(
            LogLevel::Info,
            "Runtime",
            &format!("Restarted discovery for '{}' (0x{:04x})", alias, client.service().service_id),
        );
        Ok(())
    }

    /// Block until the service is ready, up to the configured find timeout.
    pub fn wait_for_service(&self, alias: &str) -> Result<(), DiagError> {
        let client = self.lookup(alias)?;
        let timeout = Duration::from_millis(self.config.sd.find_timeout_ms);

        if client.machine().wait_until_ready(timeout) {
            self.logger.log(
                LogLevel::Info,
                "Runtime",
                &format!("Service '{}' (0x{:04x}) available", alias, client.service().service_id),
            );
            Ok(())
        } else {
            self.logger.log(
                LogLevel::Warn,
                "Runtime",
                &format!("Timeout waiting for service '{}' (0x{:04x})", alias, client.service().service_id),
            );
            Err(DiagError::NotOffered)
        }
    }

    fn lookup(&self, alias: &str) -> Result<&SdClient, DiagError> {
        self.clients
            .get(alias)
            .ok_or_else(|| DiagError::InvalidArgument(format!("unknown service alias '{}'", alias)))
    }
}

use super::entries::{EntryType, SdEntry};
use super::machine::{ClientServiceState, ServiceAvailabilityMachine};
use super::options::SdOption;
use super::packet::SdPacket;
use super::timer::LeaseTimer;
use crate::logging::{DiagLogger, LogLevel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identity of a service the client is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequiredService {
    pub service_id: u16,
    /// 0xFFFF matches any instance
    pub instance_id: u16,
    /// 0xFF matches any major version
    pub major_version: u8,
}

impl RequiredService {
    pub fn new(service_id: u16, instance_id: u16, major_version: u8) -> Self {
        RequiredService { service_id, instance_id, major_version }
    }

    pub fn any_instance(service_id: u16) -> Self {
        Self::new(service_id, SdEntry::ANY_INSTANCE, SdEntry::ANY_MAJOR)
    }

    pub fn matches(&self, entry: &SdEntry) -> bool {
        entry.service_id == self.service_id
            && (self.instance_id == SdEntry::ANY_INSTANCE || entry.instance_id == self.instance_id)
            && (self.major_version == SdEntry::ANY_MAJOR || entry.major_version == self.major_version)
    }
}

/// SD client for one required service: turns offer entries into
/// availability-machine events.
pub struct SdClient {
    service: RequiredService,
    machine: ServiceAvailabilityMachine,
    endpoints: Mutex<Vec<SdOption>>,
    logger: Arc<dyn DiagLogger>,
}

impl SdClient {
    pub fn new(service: RequiredService, timer: Arc<dyn LeaseTimer>, logger: Arc<dyn DiagLogger>) -> Self {
        let name = format!("0x{:04x}.0x{:04x}", service.service_id, service.instance_id);
        SdClient {
            service,
            machine: ServiceAvailabilityMachine::new(name, timer, Arc::clone(&logger)),
            endpoints: Mutex::new(Vec::new()),
            logger,
        }
    }

    pub fn service(&self) -> RequiredService {
        self.service
    }

    pub fn machine(&self) -> &ServiceAvailabilityMachine {
        &self.machine
    }

    pub fn state(&self) -> ClientServiceState {
        self.machine.state()
    }

    pub fn start(&self) {
        self.machine.start();
    }

    /// Endpoint options of the most recently accepted offer.
    pub fn endpoints(&self) -> Vec<SdOption> {
        self.endpoints.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Apply every matching OfferService / Stop Offer entry of `packet`.
    /// Returns the number of entries applied; a stopped client applies none.
    pub fn handle_packet(&self, packet: &SdPacket) -> usize {
        let mut applied = 0;

        for entry in packet.entries.iter().filter(|e| e.entry_type == EntryType::OfferService) {
            if !self.service.matches(entry) || self.machine.state() == ClientServiceState::Stopped {
                continue;
            }

            if entry.is_stop_offer() {
                self.logger.log(
                    LogLevel::Info,
                    "SdClient",
                    &format!("Stop offer for service 0x{:04x}", entry.service_id),
                );
                self.endpoints.lock().unwrap_or_else(|e| e.into_inner()).clear();
                self.machine.service_stopped();
            } else {
                *self.endpoints.lock().unwrap_or_else(|e| e.into_inner()) = packet.options_for(entry);
                self.machine.service_offered(Duration::from_secs(entry.ttl as u64));
            }
            applied += 1;
        }

        applied
    }
}

//! # SOME/IP Service Discovery (client side)
//!
//! - [`entries`], [`options`], [`packet`] - SD wire structures
//! - [`timer`] - lease timers ([`LeaseTimer`] contract plus tokio and manual implementations)
//! - [`machine`] - per-service availability state machine
//! - [`client`] - binds a machine to a required service and feeds it SD packets

pub mod entries;
pub mod options;
pub mod packet;
pub mod timer;
pub mod machine;
pub mod client;

pub use entries::*;
pub use options::*;
pub use packet::*;
pub use timer::{ExpirationCallback, LeaseTimer, ManualLeaseTimer, TokioLeaseTimer};
pub use machine::{ClientServiceState, ServiceAvailabilityMachine};
pub use client::{RequiredService, SdClient};

mod tests;

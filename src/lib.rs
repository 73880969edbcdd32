pub mod codec;
pub mod diag;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod sd;

pub use codec::{MessageType, ReturnCode, RpcMessage, SdMessage, SomeIpHeader, SomeIpMessage};
pub use codec::{SomeIpSerialize, SomeIpDeserialize};
pub use error::{ConfigError, DiagError, WireError};

pub use sd::machine::{ClientServiceState, ServiceAvailabilityMachine};
pub use sd::client::{RequiredService, SdClient};
pub use sd::timer::{LeaseTimer, ManualLeaseTimer, TokioLeaseTimer};
pub use sd::entries::{SdEntry, EntryType};
pub use sd::options::SdOption;
pub use sd::packet::SdPacket;

pub use diag::{
    CancellationHandler, CancellationSource, MetaInfo, OperationOutput, Resolution,
    Responder, ResponseFuture, RoutableUdsService, UdsServiceRouter,
};
pub use runtime::DiagRuntime;

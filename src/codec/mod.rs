//! # SOME/IP Codec Module
//!
//! Binary message model and big-endian encoding primitives.
//!
//! ## Key Types
//!
//! - [`SomeIpHeader`] - 16-byte SOME/IP header with session counter handling
//! - [`SomeIpMessage`] - trait over complete messages ([`RpcMessage`], [`SdMessage`])
//! - [`SomeIpSerialize`] / [`SomeIpDeserialize`] - traits for payload encoding
//! - [`MessageType`] - Request, Response, Notification, Error and their TP variants
//! - [`ReturnCode`] - Standard AUTOSAR return codes
//!
//! ## Example
//!
//! ```
//! use someip_diag::codec::{RpcMessage, SomeIpMessage};
//!
//! let request = RpcMessage::request(0x1001_0001, 0x0042, 0x01, vec![0xAB]);
//! let bytes = request.to_bytes();
//! assert_eq!(&bytes[0..4], &[0x10, 0x01, 0x00, 0x01]);
//! assert_eq!(bytes.len(), 17);
//! ```

pub mod header;
pub mod message;
pub mod primitives;
pub mod traits;

pub use header::{MessageType, ReturnCode, SomeIpHeader};
pub use message::{RpcMessage, SdMessage, SomeIpMessage};
pub use primitives::{concat, inject_u16, inject_u32};
pub use traits::{SomeIpSerialize, SomeIpDeserialize};

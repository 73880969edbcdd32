use super::primitives::{inject_u16, inject_u32};
use crate::error::WireError;

/// SOME/IP message type. Bit 0x20 marks the Transfer-Protocol variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Request expecting a response
    Request = 0x00,
    /// Fire and forget request
    RequestNoReturn = 0x01,
    Notification = 0x02,
    Response = 0x80,
    /// Response carrying an error return code
    Error = 0x81,
    TpRequest = 0x20,
    TpRequestNoReturn = 0x21,
    TpNotification = 0x22,
    TpResponse = 0xA0,
    TpError = 0xA1,
}

impl MessageType {
    const TP_FLAG: u8 = 0x20;

    pub fn is_tp(&self) -> bool {
        (*self as u8) & Self::TP_FLAG != 0
    }

    /// Response and Error kinds, which must carry a return code.
    pub fn is_response(&self) -> bool {
        (*self as u8) & 0x80 != 0
    }

    pub fn is_request(&self) -> bool {
        matches!(
            self,
            MessageType::Request
                | MessageType::RequestNoReturn
                | MessageType::TpRequest
                | MessageType::TpRequestNoReturn
        )
    }

    /// The Transfer-Protocol counterpart of this type (identity for TP types).
    pub fn with_tp(self) -> Self {
        match self {
            MessageType::Request => MessageType::TpRequest,
            MessageType::RequestNoReturn => MessageType::TpRequestNoReturn,
            MessageType::Notification => MessageType::TpNotification,
            MessageType::Response => MessageType::TpResponse,
            MessageType::Error => MessageType::TpError,
            tp => tp,
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = WireError;

    fn try_from(v: u8) -> Result<Self, WireError> {
        Ok(match v {
            0x00 => MessageType::Request,
            0x01 => MessageType::RequestNoReturn,
            0x02 => MessageType::Notification,
            0x80 => MessageType::Response,
            0x81 => MessageType::Error,
            0x20 => MessageType::TpRequest,
            0x21 => MessageType::TpRequestNoReturn,
            0x22 => MessageType::TpNotification,
            0xA0 => MessageType::TpResponse,
            0xA1 => MessageType::TpError,
            other => return Err(WireError::UnknownMessageType(other)),
        })
    }
}

/// Standard AUTOSAR return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReturnCode {
    Ok = 0x00,
    NotOk = 0x01,
    UnknownService = 0x02,
    UnknownMethod = 0x03,
    NotReady = 0x04,
    NotReachable = 0x05,
    Timeout = 0x06,
    WrongProtocolVersion = 0x07,
    WrongInterfaceVersion = 0x08,
    MalformedMessage = 0x09,
    WrongMessageType = 0x0A,
    E2eRepeated = 0x0B,
    E2eWrongSequence = 0x0C,
    E2e = 0x0D,
    E2eNotAvailable = 0x0E,
    E2eNoNewData = 0x0F,
}

impl TryFrom<u8> for ReturnCode {
    type Error = WireError;

    fn try_from(v: u8) -> Result<Self, WireError> {
        const CODES: [ReturnCode; 16] = [
            ReturnCode::Ok,
            ReturnCode::NotOk,
            ReturnCode::UnknownService,
            ReturnCode::UnknownMethod,
            ReturnCode::NotReady,
            ReturnCode::NotReachable,
            ReturnCode::Timeout,
            ReturnCode::WrongProtocolVersion,
            ReturnCode::WrongInterfaceVersion,
            ReturnCode::MalformedMessage,
            ReturnCode::WrongMessageType,
            ReturnCode::E2eRepeated,
            ReturnCode::E2eWrongSequence,
            ReturnCode::E2e,
            ReturnCode::E2eNotAvailable,
            ReturnCode::E2eNoNewData,
        ];
        CODES
            .get(v as usize)
            .copied()
            .ok_or(WireError::UnknownReturnCode(v))
    }
}

/// The fixed 16-byte SOME/IP header.
///
/// Every field is fixed at construction except the session ID, which the
/// owner may replace or advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SomeIpHeader {
    message_id: u32,
    client_id: u16,
    session_id: u16,
    protocol_version: u8,
    interface_version: u8,
    message_type: MessageType,
    return_code: ReturnCode,
}

impl SomeIpHeader {
    pub const HEADER_LENGTH: usize = 16;
    /// Bytes covered by the length field that belong to the header itself
    /// (Request ID + versions + type + return code).
    pub const LENGTH_OFFSET: u32 = 8;
    pub const SOMEIP_PROTOCOL_VERSION: u8 = 0x01;

    /// Header for a request or notification. The return code is always `Ok`.
    ///
    /// # Panics
    ///
    /// If `message_type` is a response or error kind.
    pub fn request(message_id: u32, client_id: u16, interface_version: u8, message_type: MessageType) -> Self {
        assert!(
            !message_type.is_response(),
            "{:?} requires a return code; use SomeIpHeader::response",
            message_type
        );
        SomeIpHeader {
            message_id,
            client_id,
            session_id: 1,
            protocol_version: Self::SOMEIP_PROTOCOL_VERSION,
            interface_version,
            message_type,
            return_code: ReturnCode::Ok,
        }
    }

    /// Header for a response or error.
    ///
    /// # Panics
    ///
    /// If `message_type` is a request or notification kind.
    pub fn response(
        message_id: u32,
        client_id: u16,
        interface_version: u8,
        message_type: MessageType,
        return_code: ReturnCode,
    ) -> Self {
        assert!(
            message_type.is_response(),
            "{:?} is not a response kind; use SomeIpHeader::request",
            message_type
        );
        SomeIpHeader {
            message_id,
            client_id,
            session_id: 1,
            protocol_version: Self::SOMEIP_PROTOCOL_VERSION,
            interface_version,
            message_type,
            return_code,
        }
    }

    pub fn with_session_id(mut self, session_id: u16) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_protocol_version(mut self, protocol_version: u8) -> Self {
        self.protocol_version = protocol_version;
        self
    }

    pub fn message_id(&self) -> u32 {
        self.message_id
    }

    pub fn service_id(&self) -> u16 {
        (self.message_id >> 16) as u16
    }

    pub fn method_id(&self) -> u16 {
        self.message_id as u16
    }

    pub fn client_id(&self) -> u16 {
        self.client_id
    }

    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    pub fn interface_version(&self) -> u8 {
        self.interface_version
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn return_code(&self) -> ReturnCode {
        self.return_code
    }

    pub fn set_session_id(&mut self, session_id: u16) {
        self.session_id = session_id;
    }

    /// Advance the session ID by one. Past 0xFFFF the counter restarts at 1,
    /// since 0 means "no active session".
    ///
    /// Returns `true` if the counter wrapped.
    pub fn increment_session_id(&mut self) -> bool {
        match self.session_id.checked_add(1) {
            Some(next) => {
                self.session_id = next;
                false
            }
            None => {
                self.session_id = 1;
                true
            }
        }
    }

    /// Encode the header with the given length field value.
    pub fn encode(&self, length: u32) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(Self::HEADER_LENGTH);
        inject_u32(&mut buffer, self.message_id);
        inject_u32(&mut buffer, length);
        inject_u16(&mut buffer, self.client_id);
        inject_u16(&mut buffer, self.session_id);
        buffer.push(self.protocol_version);
        buffer.push(self.interface_version);
        buffer.push(self.message_type as u8);
        buffer.push(self.return_code as u8);
        buffer
    }

    /// Decode a header, returning it with the raw length field.
    pub fn decode(buffer: &[u8]) -> Result<(Self, u32), WireError> {
        if buffer.len() < Self::HEADER_LENGTH {
            return Err(WireError::Truncated { needed: Self::HEADER_LENGTH, actual: buffer.len() });
        }

        let be_u32 = |at: usize| u32::from_be_bytes([buffer[at], buffer[at + 1], buffer[at + 2], buffer[at + 3]]);
        let be_u16 = |at: usize| u16::from_be_bytes([buffer[at], buffer[at + 1]]);

        let header = SomeIpHeader {
            message_id: be_u32(0),
            client_id: be_u16(8),
            session_id: be_u16(10),
            protocol_version: buffer[12],
            interface_version: buffer[13],
            message_type: MessageType::try_from(buffer[14])?,
            return_code: ReturnCode::try_from(buffer[15])?,
        };
        Ok((header, be_u32(4)))
    }
}

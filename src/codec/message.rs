use super::header::{MessageType, ReturnCode, SomeIpHeader};
use super::primitives::concat;
use super::traits::{SomeIpDeserialize, SomeIpSerialize};
use crate::error::WireError;
use crate::sd::packet::SdPacket;

/// A complete SOME/IP message: header plus kind-specific payload.
pub trait SomeIpMessage {
    fn header(&self) -> &SomeIpHeader;

    fn header_mut(&mut self) -> &mut SomeIpHeader;

    /// Value of the length field: everything after the length field itself.
    fn length(&self) -> u32;

    fn payload(&self) -> &[u8] {
        &[]
    }

    fn message_id(&self) -> u32 {
        self.header().message_id()
    }

    fn client_id(&self) -> u16 {
        self.header().client_id()
    }

    fn session_id(&self) -> u16 {
        self.header().session_id()
    }

    fn protocol_version(&self) -> u8 {
        self.header().protocol_version()
    }

    fn interface_version(&self) -> u8 {
        self.header().interface_version()
    }

    fn message_type(&self) -> MessageType {
        self.header().message_type()
    }

    fn return_code(&self) -> ReturnCode {
        self.header().return_code()
    }

    fn set_session_id(&mut self, session_id: u16) {
        self.header_mut().set_session_id(session_id);
    }

    fn increment_session_id(&mut self) -> bool {
        self.header_mut().increment_session_id()
    }

    /// Header followed by payload, exactly as written to the wire.
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header().encode(self.length());
        concat(&mut bytes, self.payload().to_vec());
        bytes
    }
}

/// Request, notification, response or error carrying an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMessage {
    header: SomeIpHeader,
    payload: Vec<u8>,
}

impl RpcMessage {
    pub fn request(message_id: u32, client_id: u16, interface_version: u8, payload: Vec<u8>) -> Self {
        Self::outbound(message_id, client_id, interface_version, MessageType::Request, payload)
    }

    pub fn request_no_return(message_id: u32, client_id: u16, interface_version: u8, payload: Vec<u8>) -> Self {
        Self::outbound(message_id, client_id, interface_version, MessageType::RequestNoReturn, payload)
    }

    pub fn notification(message_id: u32, interface_version: u8, payload: Vec<u8>) -> Self {
        Self::outbound(message_id, 0x0000, interface_version, MessageType::Notification, payload)
    }

    /// Any non-response kind, including the TP variants.
    ///
    /// # Panics
    ///
    /// If `message_type` is a response kind.
    pub fn outbound(
        message_id: u32,
        client_id: u16,
        interface_version: u8,
        message_type: MessageType,
        payload: Vec<u8>,
    ) -> Self {
        RpcMessage {
            header: SomeIpHeader::request(message_id, client_id, interface_version, message_type),
            payload,
        }
    }

    /// Response (or error, when `return_code` is not `Ok`) to `request`,
    /// echoing its message, client and session IDs.
    pub fn response_to(request: &RpcMessage, return_code: ReturnCode, payload: Vec<u8>) -> Self {
        let mut message_type = if return_code == ReturnCode::Ok {
            MessageType::Response
        } else {
            MessageType::Error
        };
        if request.message_type().is_tp() {
            message_type = message_type.with_tp();
        }

        let header = SomeIpHeader::response(
            request.message_id(),
            request.client_id(),
            request.interface_version(),
            message_type,
            return_code,
        )
        .with_session_id(request.session_id());

        RpcMessage { header, payload }
    }

    pub fn from_parts(header: SomeIpHeader, payload: Vec<u8>) -> Self {
        RpcMessage { header, payload }
    }

    /// Decode a single message occupying the whole buffer.
    pub fn decode(buffer: &[u8]) -> Result<Self, WireError> {
        let (header, length) = SomeIpHeader::decode(buffer)?;
        let payload = checked_payload(buffer, length)?;
        Ok(RpcMessage { header, payload: payload.to_vec() })
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

impl SomeIpMessage for RpcMessage {
    fn header(&self) -> &SomeIpHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut SomeIpHeader {
        &mut self.header
    }

    fn length(&self) -> u32 {
        SomeIpHeader::LENGTH_OFFSET + self.payload.len() as u32
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Service discovery message (service 0xFFFF, method 0x8100).
#[derive(Debug, Clone)]
pub struct SdMessage {
    header: SomeIpHeader,
    packet: SdPacket,
    encoded: Vec<u8>,
}

impl SdMessage {
    pub const MESSAGE_ID: u32 = 0xFFFF_8100;
    pub const INTERFACE_VERSION: u8 = 0x01;

    pub fn new(packet: SdPacket) -> Self {
        let header = SomeIpHeader::request(Self::MESSAGE_ID, 0x0000, Self::INTERFACE_VERSION, MessageType::Notification);
        let encoded = packet.to_vec();
        SdMessage { header, packet, encoded }
    }

    pub fn decode(buffer: &[u8]) -> Result<Self, WireError> {
        let (header, length) = SomeIpHeader::decode(buffer)?;
        if header.message_id() != Self::MESSAGE_ID {
            return Err(WireError::NotServiceDiscovery(header.message_id()));
        }

        let payload = checked_payload(buffer, length)?;
        let mut reader = payload;
        let packet = SdPacket::deserialize(&mut reader)?;

        Ok(SdMessage { header, packet, encoded: payload.to_vec() })
    }

    pub fn packet(&self) -> &SdPacket {
        &self.packet
    }
}

impl SomeIpMessage for SdMessage {
    fn header(&self) -> &SomeIpHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut SomeIpHeader {
        &mut self.header
    }

    fn length(&self) -> u32 {
        SomeIpHeader::LENGTH_OFFSET + self.encoded.len() as u32
    }

    fn payload(&self) -> &[u8] {
        &self.encoded
    }
}

fn checked_payload(buffer: &[u8], length: u32) -> Result<&[u8], WireError> {
    let available = buffer.len() - SomeIpHeader::HEADER_LENGTH + SomeIpHeader::LENGTH_OFFSET as usize;
    if length < SomeIpHeader::LENGTH_OFFSET || length as usize != available {
        return Err(WireError::LengthMismatch { length, available });
    }
    Ok(&buffer[SomeIpHeader::HEADER_LENGTH..])
}

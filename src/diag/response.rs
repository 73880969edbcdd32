use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub const NEGATIVE_RESPONSE_SID: u8 = 0x7F;

/// Common UDS negative response codes (ISO 14229-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NegativeResponseCode {
    GeneralReject = 0x10,
    ServiceNotSupported = 0x11,
    SubFunctionNotSupported = 0x12,
    IncorrectMessageLengthOrInvalidFormat = 0x13,
    ResponseTooLong = 0x14,
    BusyRepeatRequest = 0x21,
    ConditionsNotCorrect = 0x22,
    RequestSequenceError = 0x24,
    RequestOutOfRange = 0x31,
    SecurityAccessDenied = 0x33,
    ResponsePending = 0x78,
    ServiceNotSupportedInActiveSession = 0x7F,
}

/// Response of a diagnostic operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationOutput {
    pub response_data: Vec<u8>,
}

impl OperationOutput {
    pub fn new(response_data: Vec<u8>) -> Self {
        OperationOutput { response_data }
    }

    /// `[0x7F, sid, nrc]`
    pub fn negative(sid: u8, nrc: NegativeResponseCode) -> Self {
        OperationOutput { response_data: vec![NEGATIVE_RESPONSE_SID, sid, nrc as u8] }
    }

    pub fn is_negative(&self) -> bool {
        self.response_data.len() == 3 && self.response_data[0] == NEGATIVE_RESPONSE_SID
    }

    pub fn negative_response_code(&self) -> Option<u8> {
        self.is_negative().then(|| self.response_data[2])
    }
}

/// Terminal outcome of a [`ResponseFuture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Response(OperationOutput),
    /// The conversation was aborted, or the responder went away without answering.
    Cancelled,
}

impl Resolution {
    pub fn response(self) -> Option<OperationOutput> {
        match self {
            Resolution::Response(output) => Some(output),
            Resolution::Cancelled => None,
        }
    }
}

/// Producer half of a [`ResponseFuture`]. Resolves it exactly once.
#[derive(Debug)]
pub struct Responder {
    tx: oneshot::Sender<Resolution>,
}

impl Responder {
    /// Returns `false` if the future was already dropped.
    pub fn respond(self, output: OperationOutput) -> bool {
        self.tx.send(Resolution::Response(output)).is_ok()
    }

    pub fn cancel(self) -> bool {
        self.tx.send(Resolution::Cancelled).is_ok()
    }

    /// The caller has dropped the future; no one will read the response.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug)]
enum Inner {
    Pending(oneshot::Receiver<Resolution>),
    Done(Resolution),
    Consumed,
}

/// Single-resolution asynchronous result of a routed request.
#[derive(Debug)]
pub struct ResponseFuture {
    inner: Inner,
}

impl ResponseFuture {
    pub fn channel() -> (Responder, ResponseFuture) {
        let (tx, rx) = oneshot::channel();
        (Responder { tx }, ResponseFuture { inner: Inner::Pending(rx) })
    }

    /// An already-resolved future.
    pub fn ready(output: OperationOutput) -> Self {
        ResponseFuture { inner: Inner::Done(Resolution::Response(output)) }
    }

    /// The resolution, if one is available without waiting.
    pub fn try_resolution(&mut self) -> Option<&Resolution> {
        if let Inner::Pending(rx) = &mut self.inner {
            match rx.try_recv() {
                Ok(resolution) => self.inner = Inner::Done(resolution),
                Err(oneshot::error::TryRecvError::Closed) => self.inner = Inner::Done(Resolution::Cancelled),
                Err(oneshot::error::TryRecvError::Empty) => return None,
            }
        }

        match &self.inner {
            Inner::Done(resolution) => Some(resolution),
            _ => None,
        }
    }

    pub fn is_resolved(&mut self) -> bool {
        self.try_resolution().is_some()
    }

    /// Block the current thread until resolved.
    ///
    /// # Panics
    ///
    /// If called from within an asynchronous execution context, or after
    /// the future has completed.
    pub fn blocking_wait(self) -> Resolution {
        match self.inner {
            Inner::Pending(rx) => rx.blocking_recv().unwrap_or(Resolution::Cancelled),
            Inner::Done(resolution) => resolution,
            Inner::Consumed => panic!("ResponseFuture already completed"),
        }
    }
}

impl Future for ResponseFuture {
    type Output = Resolution;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Resolution> {
        match std::mem::replace(&mut self.inner, Inner::Consumed) {
            Inner::Done(resolution) => Poll::Ready(resolution),
            Inner::Pending(mut rx) => match Pin::new(&mut rx).poll(cx) {
                Poll::Ready(result) => Poll::Ready(result.unwrap_or(Resolution::Cancelled)),
                Poll::Pending => {
                    self.inner = Inner::Pending(rx);
                    Poll::Pending
                }
            },
            Inner::Consumed => panic!("ResponseFuture polled after completion"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_response_layout() {
        let output = OperationOutput::negative(0x22, NegativeResponseCode::ServiceNotSupported);
        assert_eq!(output.response_data, vec![0x7F, 0x22, 0x11]);
        assert!(output.is_negative());
        assert_eq!(output.negative_response_code(), Some(0x11));

        let positive = OperationOutput::new(vec![0x62, 0xF1, 0x90]);
        assert!(!positive.is_negative());
        assert_eq!(positive.negative_response_code(), None);
    }

    #[test]
    fn test_ready_is_resolved() {
        let mut future = ResponseFuture::ready(OperationOutput::new(vec![0x50, 0x01]));
        assert!(future.is_resolved());
        assert_eq!(
            future.blocking_wait(),
            Resolution::Response(OperationOutput::new(vec![0x50, 0x01]))
        );
    }

    #[test]
    fn test_channel_resolution() {
        let (responder, mut future) = ResponseFuture::channel();
        assert!(!future.is_resolved());
        assert!(!responder.is_closed());

        assert!(responder.respond(OperationOutput::new(vec![0x7E, 0x00])));
        assert!(future.is_resolved());
        assert_eq!(
            future.try_resolution(),
            Some(&Resolution::Response(OperationOutput::new(vec![0x7E, 0x00])))
        );
    }

    #[test]
    fn test_dropped_responder_means_cancelled() {
        let (responder, future) = ResponseFuture::channel();
        drop(responder);
        assert_eq!(future.blocking_wait(), Resolution::Cancelled);
    }

    #[test]
    fn test_respond_after_future_dropped() {
        let (responder, future) = ResponseFuture::channel();
        drop(future);
        assert!(responder.is_closed());
        assert!(!responder.respond(OperationOutput::default()));
    }

    #[tokio::test]
    async fn test_await_resolution() {
        let (responder, future) = ResponseFuture::channel();
        tokio::spawn(async move {
            responder.cancel();
        });
        assert_eq!(future.await, Resolution::Cancelled);

        let ready = ResponseFuture::ready(OperationOutput::new(vec![1]));
        assert_eq!(ready.await.response(), Some(OperationOutput::new(vec![1])));
    }
}

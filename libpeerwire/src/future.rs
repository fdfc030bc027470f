//! Single-assignment result cells for outstanding requests.
//!
//! A [`FutureResponse`] is created together with the request it represents and resolved exactly once, either with the
//! reply message or with a [`ResponseError`]. The first resolution is authoritative. Every later attempt is refused and
//! logged, so a successful result can never be replaced by a late failure (or the other way around).
//!
//! The outcome can be observed in three ways:
//! - `.await` the future (it implements [`std::future::Future`]),
//! - block the calling thread with [`FutureResponse::wait`],
//! - register a callback with [`FutureResponse::add_listener`].

use crate::codec::ObjectCodec;
use crate::error::{CodecError, ResponseError};
use crate::message::Message;
use log::*;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

pub type ResponseOutcome = Result<Message, ResponseError>;

type Listener = Box<dyn FnOnce(&ResponseOutcome) + Send>;

#[derive(Default)]
struct Inner {
    outcome: Option<ResponseOutcome>,
    listeners: Vec<Listener>,
    wakers: Vec<Waker>,
}

struct Shared {
    request: Message,
    inner: Mutex<Inner>,
    done: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The eventual outcome of one outbound request. Clones share the same cell.
#[derive(Clone)]
pub struct FutureResponse {
    shared: Arc<Shared>,
}

impl FutureResponse {
    pub fn new(request: Message) -> Self {
        let shared = Shared { request, inner: Mutex::new(Inner::default()), done: Condvar::new() };
        Self { shared: Arc::new(shared) }
    }

    /// The request this future is waiting on.
    pub fn request(&self) -> &Message {
        &self.shared.request
    }

    /// Resolve with a reply. Returns `false` if the future was already resolved, in which case nothing changes.
    pub fn succeed(&self, reply: Message) -> bool {
        self.resolve(Ok(reply))
    }

    /// Fail with `error`. Returns `false` if the future was already resolved, in which case nothing changes.
    pub fn fail(&self, error: ResponseError) -> bool {
        self.resolve(Err(error))
    }

    fn resolve(&self, outcome: ResponseOutcome) -> bool {
        let mut inner = self.shared.lock();
        if let Some(existing) = &inner.outcome {
            let existing = describe(existing);
            drop(inner);
            error!(
                "Refusing to resolve the future for {} again with {}. It already holds {existing}",
                self.shared.request,
                describe(&outcome)
            );
            return false;
        }
        inner.outcome = Some(outcome.clone());
        let listeners = std::mem::take(&mut inner.listeners);
        let wakers = std::mem::take(&mut inner.wakers);
        drop(inner);
        self.shared.done.notify_all();
        for listener in listeners {
            listener(&outcome);
        }
        wakers.into_iter().for_each(Waker::wake);
        true
    }

    /// Run `listener` once the future resolves. If it already has, `listener` runs immediately on this thread,
    /// otherwise it runs on the thread that resolves the future.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: FnOnce(&ResponseOutcome) + Send + 'static,
    {
        let mut inner = self.shared.lock();
        match inner.outcome.clone() {
            Some(outcome) => {
                drop(inner);
                listener(&outcome);
            }
            None => inner.listeners.push(Box::new(listener)),
        }
    }

    /// Block the calling thread until the future resolves or `timeout` elapses.
    ///
    /// Returns `None` on timeout. Timing out does not fail the future; whoever owns the request decides that.
    pub fn wait(&self, timeout: Duration) -> Option<ResponseOutcome> {
        let inner = self.shared.lock();
        let (inner, _) = self
            .shared
            .done
            .wait_timeout_while(inner, timeout, |inner| inner.outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        inner.outcome.clone()
    }

    pub fn outcome(&self) -> Option<ResponseOutcome> {
        self.shared.lock().outcome.clone()
    }

    pub fn is_done(&self) -> bool {
        self.shared.lock().outcome.is_some()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.shared.lock().outcome, Some(Ok(_)))
    }
}

fn describe(outcome: &ResponseOutcome) -> String {
    match outcome {
        Ok(reply) => format!("success ({reply})"),
        Err(err) => format!("failure ({err})"),
    }
}

impl Future for FutureResponse {
    type Output = ResponseOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.shared.lock();
        match &inner.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    inner.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// The future of a direct-data exchange: a [`FutureResponse`] that remembers the payload mode of the request.
#[derive(Clone)]
pub struct FutureData {
    response: FutureResponse,
    raw: bool,
}

impl FutureData {
    pub fn new(request: Message, raw: bool) -> Self {
        Self { response: FutureResponse::new(request), raw }
    }

    pub fn from_response(response: FutureResponse, raw: bool) -> Self {
        Self { response, raw }
    }

    pub fn response(&self) -> &FutureResponse {
        &self.response
    }

    pub fn into_response(self) -> FutureResponse {
        self.response
    }

    /// True if the request carried raw bytes, false if it carried an encoded object.
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// The body of a successful reply. `None` while pending, on failure, or when the reply carried no body.
    pub fn reply_bytes(&self) -> Option<Vec<u8>> {
        match self.response.outcome() {
            Some(Ok(mut reply)) => reply.take_payload(),
            _ => None,
        }
    }

    /// Decode the body of a successful reply as an object. `Ok(None)` when there is no body to decode.
    pub fn reply_object<T: DeserializeOwned>(&self, codec: &impl ObjectCodec) -> Result<Option<T>, CodecError> {
        match self.reply_bytes() {
            Some(bytes) => codec.decode_all(&bytes).map(Some),
            None => Ok(None),
        }
    }
}

impl Future for FutureData {
    type Output = ResponseOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.response).poll(cx)
    }
}

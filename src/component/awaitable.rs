//! `Awaitable<T>`: a value that is either available now or later.
//!
//! Hooks return an `Awaitable` so that synchronous implementations never
//! introduce a suspension point. Awaiting a ready `Awaitable` completes on the
//! first poll; only pending ones hand control back to the executor.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;
use futures::FutureExt;

enum Inner<T> {
    Ready(Option<T>),
    Pending(LocalBoxFuture<'static, T>),
}

/// Either an immediately available value or a pending, `!Send` future.
pub struct Awaitable<T> {
    inner: Inner<T>,
}

// The value is moved out, never pinned, and the pending future is boxed.
impl<T> Unpin for Awaitable<T> {}

impl<T> Awaitable<T> {
    /// A value that is already available.
    pub fn ready(value: T) -> Self {
        Self {
            inner: Inner::Ready(Some(value)),
        }
    }

    /// A value produced by `future`.
    pub fn pending(future: impl Future<Output = T> + 'static) -> Self {
        Self {
            inner: Inner::Pending(future.boxed_local()),
        }
    }

    /// Whether the value can be taken without polling.
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, Inner::Ready(Some(_)))
    }

    /// Take the value if it is available now, otherwise give the awaitable back.
    pub fn try_into_ready(self) -> Result<T, Self> {
        match self.inner {
            Inner::Ready(Some(value)) => Ok(value),
            inner => Err(Self { inner }),
        }
    }

    /// Map the eventual value, keeping ready values ready.
    pub fn map<U: 'static>(self, f: impl FnOnce(T) -> U + 'static) -> Awaitable<U>
    where
        T: 'static,
    {
        match self.try_into_ready() {
            Ok(value) => Awaitable::ready(f(value)),
            Err(pending) => Awaitable::pending(async move { f(pending.await) }),
        }
    }
}

impl<T> Future for Awaitable<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        match &mut this.inner {
            Inner::Ready(value) => Poll::Ready(value.take().expect("Awaitable polled after completion")),
            Inner::Pending(future) => future.as_mut().poll(cx),
        }
    }
}

impl<T> fmt::Debug for Awaitable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Inner::Ready(Some(_)) => f.write_str("Awaitable::Ready"),
            Inner::Ready(None) => f.write_str("Awaitable::Taken"),
            Inner::Pending(_) => f.write_str("Awaitable::Pending"),
        }
    }
}

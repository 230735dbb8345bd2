//! A re-armable one-shot timer for use inside `tokio::select!` loops.
//!
//! The underlying `Sleep` is only created on the first arming, so a timer can
//! be built outside a runtime and handed to an actor before it is spawned.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::{Instant, Sleep};

#[derive(Debug, Default)]
pub struct Timer {
    sleep: Option<Pin<Box<Sleep>>>,
    armed: bool,
}

impl Timer {
    /// A timer that never fires until it is armed.
    pub fn manual() -> Self { Self::default() }

    pub fn set_next_fire(&mut self, after: Duration) { self.set_deadline(Instant::now() + after); }

    pub fn set_deadline(&mut self, deadline: Instant) {
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(tokio::time::sleep_until(deadline))),
        }
        self.armed = true;
    }

    pub fn cancel(&mut self) { self.armed = false; }

    pub fn is_armed(&self) -> bool { self.armed }
}

impl Future for Timer {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.armed {
            return Poll::Pending;
        }
        let Some(sleep) = self.sleep.as_mut() else {
            return Poll::Pending;
        };
        match sleep.as_mut().poll(cx) {
            Poll::Ready(()) => {
                self.armed = false;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

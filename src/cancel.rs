/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! Cooperative cancellation for the blocking operations.
//!
//! A `CancelSignal` is a shared flag. Cloning it yields another handle to the same flag, so one
//! clone can be handed to whatever decides to stop (a console watcher, a shutdown hook, a timer)
//! while another is passed to `dequeue_blocking`, `acquire_blocking` or `subscribe`. Those
//! operations observe the flag at every poll/retry tick and when waiting for messages; in-flight
//! commands are never interrupted.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Idempotent, and visible to every clone and child.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has fired.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// A signal that fires when this one does, but which can also be fired on its own without
    /// affecting the parent.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

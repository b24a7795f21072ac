/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! The commands the toolkit needs from a Redis connection.
//!
//! Every operation in `queue`, `lock` and `pubsub` borrows something implementing `Connection`
//! for the duration of a single call. The connection is created, shared and closed by the
//! caller; reconnection is left to the client library underneath it.

mod redis;

#[cfg(test)]
pub(crate) mod memory;

use std::{future::Future, pin::Pin, time::Duration};

use futures_util::stream::Stream;

use crate::error::Error;

pub use self::redis::RedisConnection;

/// A future resolving to the reply of a single command
pub type CommandFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// The messages published to a subscribed channel, in delivery order. Dropping the stream
/// unsubscribes.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// A handle to one Redis server.
///
/// Implementations must be usable concurrently from several tasks; each method is a single
/// atomic server-side command.
pub trait Connection: Send + Sync {
    /// Push `payload` onto the head of the list at `key`, returning the new length (`LPUSH`)
    fn push<'a>(&'a self, key: &'a str, payload: &'a str) -> CommandFuture<'a, i64>;

    /// Pop from the tail of the list at `key`, `None` if it is empty or absent (`RPOP`)
    fn pop<'a>(&'a self, key: &'a str) -> CommandFuture<'a, Option<String>>;

    /// Length of the list at `key` (`LLEN`)
    fn len<'a>(&'a self, key: &'a str) -> CommandFuture<'a, i64>;

    /// Set `key` to `value` with an expiry, only if `key` does not exist (`SET NX PX`).
    /// Resolves to `true` if the key was set.
    fn set_if_absent<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> CommandFuture<'a, bool>;

    /// Delete `key` only if its value is exactly `value`, atomically on the server. Resolves to
    /// `true` if the key was deleted.
    fn delete_if_equals<'a>(&'a self, key: &'a str, value: &'a str) -> CommandFuture<'a, bool>;

    /// Publish `message` to `channel`, returning the number of receivers (`PUBLISH`)
    fn publish<'a>(&'a self, channel: &'a str, message: &'a str) -> CommandFuture<'a, i64>;

    /// Subscribe to `channel`. Resolves once the server has confirmed the subscription, so
    /// anything published afterwards is delivered through the returned stream.
    fn subscribe<'a>(&'a self, channel: &'a str) -> CommandFuture<'a, MessageStream>;
}

/// Whole milliseconds for a `PX` argument, never less than one
pub(crate) fn ttl_millis(ttl: Duration) -> u128 {
    let millis = ttl.as_millis();
    if Duration::from_millis(millis as u64) < ttl {
        millis + 1
    } else {
        millis.max(1)
    }
}

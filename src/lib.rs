/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! Three messaging patterns on Redis, built on the `redis-async` client.
//!
//! ## Connection
//!
//! Every operation borrows a [`Connection`](connection/trait.Connection.html) for the duration of
//! one call. [`RedisConnection::connect`](connection/struct.RedisConnection.html#method.connect)
//! opens one from a [`Settings`](config/struct.Settings.html); it is cheap to clone and may be
//! used from many tasks at once. The caller owns it, nothing here keeps a global handle.
//!
//! ## Work queue
//!
//! [`queue::enqueue`](queue/fn.enqueue.html) pushes onto a list, and
//! [`queue::dequeue_blocking`](queue/fn.dequeue_blocking.html) waits for the oldest entry by
//! polling. Entries come out in the order they went in.
//!
//! ## Lock
//!
//! [`lock::try_acquire`](lock/fn.try_acquire.html) takes a leased lock and hands back a random
//! [`LockToken`](lock/struct.LockToken.html); [`lock::release`](lock/fn.release.html) only
//! deletes the lock while that token still owns it. A lease that runs out releases the lock on
//! the server, so `release` reporting `AlreadyExpiredOrStolen` is an ordinary outcome.
//!
//! ## PUBSUB
//!
//! [`pubsub::publish`](pubsub/fn.publish.html) broadcasts a message, and
//! [`pubsub::subscribe`](pubsub/fn.subscribe.html) feeds each message on a channel to a handler,
//! one at a time and in order, until cancelled.
//!
//! ## Cancellation
//!
//! The waiting operations take a [`CancelSignal`](cancel/struct.CancelSignal.html). Firing it
//! ends the wait at the next opportunity: the operation returns a `Cancelled` outcome rather than
//! an error.

pub mod cancel;
pub mod config;
pub mod connection;
pub mod error;
pub mod lock;
pub mod pubsub;
pub mod queue;

mod task;

pub use cancel::CancelSignal;
pub use config::Settings;
pub use connection::{Connection, RedisConnection};
pub use error::{Error, HandlerError};
pub use lock::{Acquire, Acquired, LockToken, Release};
pub use pubsub::SubscriptionSummary;
pub use queue::Dequeued;

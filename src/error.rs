/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! Error handling

use std::{error, fmt};

/// The boxed error type a subscription handler may fail with
pub type BoxError = Box<dyn error::Error + Send + Sync>;

#[derive(Debug)]
pub enum Error {
    /// The Redis client could not complete a command: the connection is unavailable, or the
    /// reply could not be understood
    Connection(redis_async::error::Error),

    /// The server answered a command with an error reply, e.g. `WRONGTYPE`
    Server(String),

    /// The caller supplied something that cannot be acted upon, e.g. a zero-length lease
    InvalidInput(String),

    /// A subscription stream closed without having been cancelled
    EndOfStream,
}

pub(crate) fn invalid_input(msg: impl Into<String>) -> Error {
    Error::InvalidInput(msg.into())
}

impl From<redis_async::error::Error> for Error {
    fn from(err: redis_async::error::Error) -> Error {
        match err {
            redis_async::error::Error::Remote(reply) => Error::Server(reply),
            err => Error::Connection(err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection(err) => Some(err),
            Error::Server(_) => None,
            Error::InvalidInput(_) => None,
            Error::EndOfStream => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(err) => write!(f, "Redis connection error: {}", err),
            Error::Server(reply) => write!(f, "Redis server error: {}", reply),
            Error::InvalidInput(s) => write!(f, "Invalid input: {}", s),
            Error::EndOfStream => f.write_str("Subscription ended unexpectedly"),
        }
    }
}

/// A subscription handler failed to process one message.
///
/// This is reported to the caller but never ends the subscription.
#[derive(Debug)]
pub struct HandlerError {
    pub channel: String,
    pub message: String,
    pub source: BoxError,
}

impl error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Handler failed for message on channel {}: {}",
            self.channel, self.source
        )
    }
}

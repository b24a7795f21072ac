/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! A FIFO work queue on a Redis list.
//!
//! Producers push onto the head of the list, consumers pop from the tail. Several consumers may
//! share a queue; each entry is handed to exactly one of them.

use std::time::Duration;

use crate::{
    cancel::CancelSignal,
    connection::Connection,
    error,
    task::{self, Tick},
};

/// The outcome of `dequeue_blocking`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    Item(String),
    Cancelled,
}

/// Push `payload` onto the queue at `key`, returning the queue length afterwards.
pub async fn enqueue<C>(con: &C, key: &str, payload: &str) -> Result<i64, error::Error>
where
    C: Connection + ?Sized,
{
    let len = con.push(key, payload).await?;
    log::debug!("Enqueued onto {}, length now {}", key, len);
    Ok(len)
}

/// Take the oldest entry, if there is one, without waiting.
pub async fn try_dequeue<C>(con: &C, key: &str) -> Result<Option<String>, error::Error>
where
    C: Connection + ?Sized,
{
    con.pop(key).await
}

/// Wait for the oldest entry.
///
/// Polls the queue, sleeping `poll_interval` whenever it is empty. Returns `Dequeued::Cancelled`
/// as soon as `cancel` fires; the signal is checked before every poll and interrupts the sleep.
/// A failed poll is returned to the caller immediately, it is not retried.
pub async fn dequeue_blocking<C>(
    con: &C,
    key: &str,
    poll_interval: Duration,
    cancel: &CancelSignal,
) -> Result<Dequeued, error::Error>
where
    C: Connection + ?Sized,
{
    task::check_interval("poll interval", poll_interval)?;

    loop {
        if cancel.is_cancelled() {
            log::debug!("Stopped waiting on {}", key);
            return Ok(Dequeued::Cancelled);
        }
        if let Some(item) = con.pop(key).await? {
            return Ok(Dequeued::Item(item));
        }
        if task::pause(poll_interval, cancel).await == Tick::Cancelled {
            log::debug!("Stopped waiting on {}", key);
            return Ok(Dequeued::Cancelled);
        }
    }
}

/// The number of entries waiting at `key`
pub async fn queue_len<C>(con: &C, key: &str) -> Result<i64, error::Error>
where
    C: Connection + ?Sized,
{
    con.len(key).await
}

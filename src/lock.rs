/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! A leased mutual-exclusion lock on a single Redis key.
//!
//! Acquiring sets the key to a freshly generated token, only if the key is absent, with an expiry
//! equal to the lease. Releasing deletes the key only while it still holds that same token, so a
//! holder whose lease has run out can never release a lock somebody else has since taken.
//!
//! Leases are not renewed. A holder whose work outlasts its lease loses exclusivity silently; it
//! is the caller's responsibility to choose a lease longer than the work it protects, and to
//! treat `Release::AlreadyExpiredOrStolen` as the normal sign that the lease ran out.

use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::{
    cancel::CancelSignal,
    connection::Connection,
    error,
    task::{self, Tick},
};

/// Proof of ownership of a lock, generated at acquisition time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// A new 128-bit random token
    pub fn generate() -> Self {
        LockToken(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Rebuild a token handed over from elsewhere, e.g. another process
impl From<String> for LockToken {
    fn from(token: String) -> Self {
        LockToken(token)
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The outcome of `try_acquire`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquire {
    Held(LockToken),
    /// Another holder's lease is still running
    NotAcquired,
}

/// The outcome of `acquire_blocking`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    Held(LockToken),
    Cancelled,
}

/// The outcome of `release`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Released,
    /// The lease ran out, and the key is now absent or owned by a different token. Nothing was
    /// deleted.
    AlreadyExpiredOrStolen,
}

/// Make a single attempt to take the lock at `key` for `lease`.
pub async fn try_acquire<C>(con: &C, key: &str, lease: Duration) -> Result<Acquire, error::Error>
where
    C: Connection + ?Sized,
{
    if lease.is_zero() {
        return Err(error::invalid_input("lease must be greater than zero"));
    }

    let token = LockToken::generate();
    if con.set_if_absent(key, token.as_str(), lease).await? {
        log::debug!("Acquired lock {} for {:?}", key, lease);
        Ok(Acquire::Held(token))
    } else {
        Ok(Acquire::NotAcquired)
    }
}

/// Keep trying to take the lock at `key`, sleeping `retry_interval` after each failed attempt,
/// until it is held or `cancel` fires.
pub async fn acquire_blocking<C>(
    con: &C,
    key: &str,
    lease: Duration,
    retry_interval: Duration,
    cancel: &CancelSignal,
) -> Result<Acquired, error::Error>
where
    C: Connection + ?Sized,
{
    task::check_interval("retry interval", retry_interval)?;

    let mut attempt: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            log::debug!("Gave up on lock {} after {} attempts", key, attempt);
            return Ok(Acquired::Cancelled);
        }
        attempt += 1;
        match try_acquire(con, key, lease).await? {
            Acquire::Held(token) => return Ok(Acquired::Held(token)),
            Acquire::NotAcquired => log::debug!("Lock {} busy, attempt {}", key, attempt),
        }
        if task::pause(retry_interval, cancel).await == Tick::Cancelled {
            log::debug!("Gave up on lock {} after {} attempts", key, attempt);
            return Ok(Acquired::Cancelled);
        }
    }
}

/// Release the lock at `key` if, and only if, it is still held by `token`.
pub async fn release<C>(con: &C, key: &str, token: &LockToken) -> Result<Release, error::Error>
where
    C: Connection + ?Sized,
{
    if token.as_str().is_empty() {
        return Ok(Release::AlreadyExpiredOrStolen);
    }

    if con.delete_if_equals(key, token.as_str()).await? {
        log::debug!("Released lock {}", key);
        Ok(Release::Released)
    } else {
        log::info!("Lock {} was no longer held by this token", key);
        Ok(Release::AlreadyExpiredOrStolen)
    }
}

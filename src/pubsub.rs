/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! Broadcast messages over Redis channels.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use futures_channel::mpsc;
use futures_util::stream::StreamExt;

use crate::{
    cancel::CancelSignal,
    connection::Connection,
    error::{self, BoxError, HandlerError},
};

/// What happened during a subscription that ended through cancellation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionSummary {
    /// Messages passed to the handler
    pub received: u64,
    /// Of those, the ones the handler failed on
    pub failed: u64,
}

/// Publish `message` on `channel`, returning the number of subscribers that received it.
pub async fn publish<C>(con: &C, channel: &str, message: &str) -> Result<i64, error::Error>
where
    C: Connection + ?Sized,
{
    let receivers = con.publish(channel, message).await?;
    log::debug!("Published to {}, {} receivers", channel, receivers);
    Ok(receivers)
}

/// Subscribe to `channel` and pass every message to `handler` until `cancel` fires.
///
/// The handler is called once per message, one call at a time, in the order the server delivers
/// them. A handler failure is logged and counted; it does not end the subscription. A handler
/// that panics is treated as having failed on that message. Once cancelled, the channel is
/// unsubscribed before this returns.
///
/// Returns an error if the subscription cannot be made, or if it is lost before being
/// cancelled.
pub async fn subscribe<C, F, E>(
    con: &C,
    channel: &str,
    handler: F,
    cancel: &CancelSignal,
) -> Result<SubscriptionSummary, error::Error>
where
    C: Connection + ?Sized,
    F: FnMut(&str) -> Result<(), E>,
    E: Into<BoxError>,
{
    run_subscription(con, channel, handler, cancel, None).await
}

/// As `subscribe`, additionally sending every handler failure to `errors`.
pub async fn subscribe_reporting<C, F, E>(
    con: &C,
    channel: &str,
    handler: F,
    cancel: &CancelSignal,
    errors: &mpsc::UnboundedSender<HandlerError>,
) -> Result<SubscriptionSummary, error::Error>
where
    C: Connection + ?Sized,
    F: FnMut(&str) -> Result<(), E>,
    E: Into<BoxError>,
{
    run_subscription(con, channel, handler, cancel, Some(errors)).await
}

async fn run_subscription<C, F, E>(
    con: &C,
    channel: &str,
    mut handler: F,
    cancel: &CancelSignal,
    errors: Option<&mpsc::UnboundedSender<HandlerError>>,
) -> Result<SubscriptionSummary, error::Error>
where
    C: Connection + ?Sized,
    F: FnMut(&str) -> Result<(), E>,
    E: Into<BoxError>,
{
    let mut messages = con.subscribe(channel).await?;
    log::info!("Subscribed to {}", channel);

    let mut summary = SubscriptionSummary::default();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = messages.next() => next,
        };
        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                log::error!("Subscription to {} failed: {}", channel, e);
                return Err(e);
            }
            None => {
                log::error!("Subscription to {} closed", channel);
                return Err(error::Error::EndOfStream);
            }
        };

        summary.received += 1;
        let source: BoxError =
            match panic::catch_unwind(AssertUnwindSafe(|| handler(message.as_str()))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.into(),
                Err(payload) => panic_message(payload).into(),
            };
        summary.failed += 1;
        let err = HandlerError {
            channel: channel.to_owned(),
            message,
            source,
        };
        log::warn!("{}", err);
        if let Some(errors) = errors {
            // The caller may have stopped listening for errors; delivery carries on regardless
            let _ = errors.unbounded_send(err);
        }
    }

    // Dropping the stream unsubscribes
    drop(messages);
    log::info!("Unsubscribed from {}", channel);
    Ok(summary)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let reason = match payload.downcast::<String>() {
        Ok(reason) => *reason,
        Err(payload) => match payload.downcast_ref::<&str>() {
            Some(reason) => (*reason).to_owned(),
            None => "unknown cause".to_owned(),
        },
    };
    format!("Handler panicked: {}", reason)
}

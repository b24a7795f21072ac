/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::StreamExt;

use redis_async::{client::PairedConnection, resp::FromResp, resp_array};

use super::{ttl_millis, CommandFuture, Connection, MessageStream};

use crate::{config::Settings, error::Error};

/// Deletes KEYS[1] only while it still holds ARGV[1]
const DELETE_IF_EQUALS_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// A `Connection` backed by `redis-async`.
///
/// Commands are multiplexed over one paired connection, which reconnects by itself after the
/// server goes away; commands issued while disconnected fail with `Error::Connection`.
///
/// Every `subscribe` opens a pub/sub connection of its own, closed again when the returned stream
/// is dropped. The server tracks subscriptions per connection, so any number of tasks may
/// subscribe to the same channel through clones of one `RedisConnection` and each receives every
/// message. Cloning is cheap.
#[derive(Clone)]
pub struct RedisConnection {
    paired: PairedConnection,
    settings: Arc<Settings>,
}

impl RedisConnection {
    /// Open the command connection to the server described by `settings`
    pub async fn connect(settings: &Settings) -> Result<Self, Error> {
        let paired = settings.connection_builder()?.paired_connect().await?;
        log::info!(
            "Connected to Redis at {}:{}",
            settings.host(),
            settings.port()
        );
        Ok(Self::from_parts(paired, settings.clone()))
    }

    /// Wrap a paired connection the caller has already established. Subscriptions connect to
    /// the server described by `settings`.
    pub fn from_parts(paired: PairedConnection, settings: Settings) -> Self {
        RedisConnection {
            paired,
            settings: Arc::new(settings),
        }
    }
}

impl Connection for RedisConnection {
    fn push<'a>(&'a self, key: &'a str, payload: &'a str) -> CommandFuture<'a, i64> {
        Box::pin(async move {
            let len: i64 = self.paired.send(resp_array!["LPUSH", key, payload]).await?;
            Ok(len)
        })
    }

    fn pop<'a>(&'a self, key: &'a str) -> CommandFuture<'a, Option<String>> {
        Box::pin(async move {
            let item: Option<String> = self.paired.send(resp_array!["RPOP", key]).await?;
            Ok(item)
        })
    }

    fn len<'a>(&'a self, key: &'a str) -> CommandFuture<'a, i64> {
        Box::pin(async move {
            let len: i64 = self.paired.send(resp_array!["LLEN", key]).await?;
            Ok(len)
        })
    }

    fn set_if_absent<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> CommandFuture<'a, bool> {
        Box::pin(async move {
            let millis = ttl_millis(ttl).to_string();
            // "OK" when set, nil when the key already exists
            let reply: Option<String> = self
                .paired
                .send(resp_array!["SET", key, value, "NX", "PX", millis])
                .await?;
            Ok(reply.is_some())
        })
    }

    fn delete_if_equals<'a>(&'a self, key: &'a str, value: &'a str) -> CommandFuture<'a, bool> {
        Box::pin(async move {
            let deleted: i64 = self
                .paired
                .send(resp_array!["EVAL", DELETE_IF_EQUALS_SCRIPT, "1", key, value])
                .await?;
            Ok(deleted == 1)
        })
    }

    fn publish<'a>(&'a self, channel: &'a str, message: &'a str) -> CommandFuture<'a, i64> {
        Box::pin(async move {
            let receivers: i64 = self
                .paired
                .send(resp_array!["PUBLISH", channel, message])
                .await?;
            Ok(receivers)
        })
    }

    fn subscribe<'a>(&'a self, channel: &'a str) -> CommandFuture<'a, MessageStream> {
        Box::pin(async move {
            let builder = self.settings.connection_builder()?;
            let pubsub = builder.pubsub_connect().await?;
            log::debug!("Opened pub/sub connection for {}", channel);
            // The stream keeps its connection alive; both go when it is dropped
            let stream = pubsub.subscribe(channel).await?;
            let messages: MessageStream = Box::pin(stream.map(|message| {
                message
                    .and_then(String::from_resp)
                    .map_err(Error::from)
            }));
            Ok(messages)
        })
    }
}

/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! An in-process stand-in for a Redis server, used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::time::Duration;

use futures_channel::mpsc;
use futures_util::stream::StreamExt;
use tokio::time::Instant;

use super::{CommandFuture, Connection, MessageStream};

use crate::error::Error;

#[derive(Default)]
struct State {
    lists: HashMap<String, VecDeque<String>>,
    strings: HashMap<String, (String, Instant)>,
    /// One sender per `subscribe` call. Like `RedisConnection`, each call stands for a pub/sub
    /// connection of its own, so dropping one stream leaves the others subscribed.
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<String>>>,
}

impl State {
    fn live_value(&mut self, key: &str) -> Option<&String> {
        let expired = matches!(self.strings.get(key), Some((_, expiry)) if *expiry <= Instant::now());
        if expired {
            self.strings.remove(key);
        }
        self.strings.get(key).map(|(value, _)| value)
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryConnection {
    state: Arc<Mutex<State>>,
    /// When set every command fails, as if the server had gone away
    down: Arc<AtomicBool>,
}

impl MemoryConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub(crate) fn value(&self, key: &str) -> Option<String> {
        self.lock().live_value(key).cloned()
    }

    /// Active subscriptions to `channel`
    pub(crate) fn subscribers(&self, channel: &str) -> usize {
        let mut state = self.lock();
        match state.subscribers.get_mut(channel) {
            Some(senders) => {
                senders.retain(|tx| !tx.is_closed());
                senders.len()
            }
            None => 0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("Memory connection state poisoned")
    }

    fn check(&self) -> Result<(), Error> {
        if self.down.load(Ordering::SeqCst) {
            return Err(Error::Connection(redis_async::error::Error::IO(
                io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused").into(),
            )));
        }
        Ok(())
    }

    fn run<T: Send + 'static>(
        &self,
        f: impl FnOnce(&mut State) -> T,
    ) -> CommandFuture<'static, T> {
        let result = self.check().map(|()| f(&mut *self.lock()));
        Box::pin(async move {
            // Yield so the caller observes a real suspension point, as with a network round trip
            tokio::task::yield_now().await;
            result
        })
    }
}

impl Connection for MemoryConnection {
    fn push<'a>(&'a self, key: &'a str, payload: &'a str) -> CommandFuture<'a, i64> {
        let (key, payload) = (key.to_owned(), payload.to_owned());
        self.run(move |state| {
            let list = state.lists.entry(key).or_default();
            list.push_front(payload);
            list.len() as i64
        })
    }

    fn pop<'a>(&'a self, key: &'a str) -> CommandFuture<'a, Option<String>> {
        let key = key.to_owned();
        self.run(move |state| {
            let list = state.lists.get_mut(&key)?;
            let item = list.pop_back();
            if list.is_empty() {
                state.lists.remove(&key);
            }
            item
        })
    }

    fn len<'a>(&'a self, key: &'a str) -> CommandFuture<'a, i64> {
        let key = key.to_owned();
        self.run(move |state| state.lists.get(&key).map_or(0, |list| list.len() as i64))
    }

    fn set_if_absent<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> CommandFuture<'a, bool> {
        let (key, value) = (key.to_owned(), value.to_owned());
        self.run(move |state| {
            if state.live_value(&key).is_some() {
                return false;
            }
            state.strings.insert(key, (value, Instant::now() + ttl));
            true
        })
    }

    fn delete_if_equals<'a>(&'a self, key: &'a str, value: &'a str) -> CommandFuture<'a, bool> {
        let (key, value) = (key.to_owned(), value.to_owned());
        self.run(move |state| {
            if state.live_value(&key) != Some(&value) {
                return false;
            }
            state.strings.remove(&key);
            true
        })
    }

    fn publish<'a>(&'a self, channel: &'a str, message: &'a str) -> CommandFuture<'a, i64> {
        let (channel, message) = (channel.to_owned(), message.to_owned());
        self.run(move |state| {
            let Some(senders) = state.subscribers.get_mut(&channel) else {
                return 0;
            };
            senders.retain(|tx| tx.unbounded_send(message.clone()).is_ok());
            senders.len() as i64
        })
    }

    fn subscribe<'a>(&'a self, channel: &'a str) -> CommandFuture<'a, MessageStream> {
        let channel = channel.to_owned();
        self.run(move |state| {
            let (tx, rx) = mpsc::unbounded();
            state.subscribers.entry(channel).or_default().push(tx);
            let messages: MessageStream = Box::pin(rx.map(Ok));
            messages
        })
    }
}

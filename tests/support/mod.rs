/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! A RESP server on a local port that understands just enough commands for the pub/sub tests.
//!
//! As with Redis, subscriptions belong to the TCP connection that made them.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use redis_patterns::Settings;

type Outbox = mpsc::UnboundedSender<String>;

/// channel -> connection id -> that connection's outgoing frames
type Channels = Arc<Mutex<HashMap<String, HashMap<u64, Outbox>>>>;

pub struct FakeRedis {
    port: u16,
    channels: Channels,
}

impl FakeRedis {
    pub async fn start() -> FakeRedis {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Cannot bind listener");
        let port = listener.local_addr().expect("No local address").port();
        let channels = Channels::default();

        let accepting = channels.clone();
        tokio::spawn(async move {
            let mut next_id = 0;
            while let Ok((socket, _)) = listener.accept().await {
                next_id += 1;
                tokio::spawn(serve(socket, next_id, accepting.clone()));
            }
        });

        FakeRedis { port, channels }
    }

    pub fn settings(&self) -> Settings {
        Settings::new("127.0.0.1", self.port)
    }

    /// Connections currently subscribed to `channel`
    pub fn subscribers(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .expect("Poisoned")
            .get(channel)
            .map_or(0, HashMap::len)
    }
}

async fn serve(socket: TcpStream, id: u64, channels: Channels) {
    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);
    let (outbox, mut frames) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if write.write_all(frame.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut subscribed = HashSet::new();
    while let Ok(Some(command)) = read_command(&mut reader).await {
        let mut channels = channels.lock().expect("Poisoned");
        let name = command[0].to_ascii_uppercase();
        match (name.as_str(), &command[1..]) {
            ("SUBSCRIBE", topics) => {
                for topic in topics {
                    subscribed.insert(topic.clone());
                    channels
                        .entry(topic.clone())
                        .or_default()
                        .insert(id, outbox.clone());
                    let _ = outbox.send(push("subscribe", topic, &integer(subscribed.len())));
                }
            }
            ("UNSUBSCRIBE", topics) => {
                for topic in topics {
                    subscribed.remove(topic);
                    forget(&mut *channels, topic, id);
                    let _ = outbox.send(push("unsubscribe", topic, &integer(subscribed.len())));
                }
            }
            ("PUBLISH", [topic, message]) => {
                let receivers = channels.get(topic).map_or(0, |subscribers| {
                    for subscriber in subscribers.values() {
                        let _ = subscriber.send(push("message", topic, &bulk(message)));
                    }
                    subscribers.len()
                });
                let _ = outbox.send(integer(receivers));
            }
            ("PING", []) => {
                let _ = outbox.send("+PONG\r\n".to_owned());
            }
            _ => {
                let _ = outbox.send(format!("-ERR unknown command '{}'\r\n", command[0]));
            }
        }
    }

    let mut channels = channels.lock().expect("Poisoned");
    for topic in &subscribed {
        forget(&mut *channels, topic, id);
    }
    writer.abort();
}

fn forget(channels: &mut HashMap<String, HashMap<u64, Outbox>>, topic: &str, id: u64) {
    if let Some(subscribers) = channels.get_mut(topic) {
        subscribers.remove(&id);
        if subscribers.is_empty() {
            channels.remove(topic);
        }
    }
}

/// Reads one command, sent as an array of bulk strings. `None` once the client hangs up.
async fn read_command<R>(reader: &mut R) -> io::Result<Option<Vec<String>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    let parts = header(&line, '*')?;
    let mut command = Vec::with_capacity(parts);
    for _ in 0..parts {
        line.clear();
        reader.read_line(&mut line).await?;
        let len = header(&line, '$')?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        command.push(String::from_utf8_lossy(&buf).into_owned());
    }
    if command.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "Empty command"));
    }
    Ok(Some(command))
}

fn header(line: &str, kind: char) -> io::Result<usize> {
    line.trim_end()
        .strip_prefix(kind)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("Bad header: {:?}", line)))
}

fn bulk(s: &str) -> String {
    format!("${}\r\n{}\r\n", s.len(), s)
}

fn integer(n: usize) -> String {
    format!(":{}\r\n", n)
}

fn push(kind: &str, topic: &str, last: &str) -> String {
    format!("*3\r\n{}{}{}", bulk(kind), bulk(topic), last)
}

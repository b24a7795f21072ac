/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! Connection parameters, key names and polling intervals.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use redis_async::client::ConnectionBuilder;

use crate::error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;

pub const DEFAULT_QUEUE_KEY: &str = "task_queue";
pub const DEFAULT_LOCK_KEY: &str = "resource_lock";
pub const DEFAULT_CHANNEL: &str = "notifications";

#[derive(Debug, Clone)]
pub struct Settings {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) username: Option<Arc<str>>,
    pub(crate) password: Option<Arc<str>>,

    pub queue_key: String,
    pub lock_key: String,
    pub channel: String,

    /// Sleep between empty pops in `dequeue_blocking`
    pub poll_interval: Duration,
    /// Sleep between failed attempts in `acquire_blocking`
    pub retry_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            queue_key: DEFAULT_QUEUE_KEY.to_owned(),
            lock_key: DEFAULT_LOCK_KEY.to_owned(),
            channel: DEFAULT_CHANNEL.to_owned(),
            poll_interval: Duration::from_millis(500),
            retry_interval: Duration::from_secs(1),
        }
    }
}

impl Settings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Settings {
            host: host.into(),
            port,
            ..Settings::default()
        }
    }

    /// Defaults, overridden by `REDIS_HOST`, `REDIS_PORT`, `REDIS_USERNAME` and `REDIS_PASSWORD`
    /// where those are set.
    pub fn from_env() -> Result<Self, error::Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, error::Error> {
        let mut settings = Settings::default();
        if let Some(host) = lookup("REDIS_HOST") {
            settings.host = host;
        }
        if let Some(port) = lookup("REDIS_PORT") {
            settings.port = parse_port(&port)?;
        }
        if let Some(username) = lookup("REDIS_USERNAME") {
            settings.username(username);
        }
        if let Some(password) = lookup("REDIS_PASSWORD") {
            settings.password(password);
        }
        Ok(settings)
    }

    /// Replace host and port with those parsed from `host:port`. A bare host keeps the current
    /// port. IPv6 literals go in brackets when followed by a port, as in `[::1]:6379`; an
    /// unbracketed one such as `::1` is taken as a bare host.
    pub fn with_address(&mut self, address: &str) -> Result<&mut Self, error::Error> {
        let (host, port) = split_address(address)?;
        if host.is_empty() {
            return Err(error::invalid_input(format!(
                "No host in address: {}",
                address
            )));
        }
        self.host = host.to_owned();
        if let Some(port) = port {
            self.port = port;
        }
        Ok(self)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Set the username used when connecting
    pub fn username<V: Into<Arc<str>>>(&mut self, username: V) -> &mut Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password used when connecting
    pub fn password<V: Into<Arc<str>>>(&mut self, password: V) -> &mut Self {
        self.password = Some(password.into());
        self
    }

    pub fn queue_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.queue_key = key.into();
        self
    }

    pub fn lock_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.lock_key = key.into();
        self
    }

    pub fn channel(&mut self, channel: impl Into<String>) -> &mut Self {
        self.channel = channel.into();
        self
    }

    pub(crate) fn connection_builder(&self) -> Result<ConnectionBuilder, error::Error> {
        let mut builder = ConnectionBuilder::new(self.host.clone(), self.port)?;
        if let Some(username) = &self.username {
            builder.username(username.clone());
        }
        if let Some(password) = &self.password {
            builder.password(password.clone());
        }
        #[cfg(feature = "tls")]
        builder.tls();
        Ok(builder)
    }
}

fn split_address(address: &str) -> Result<(&str, Option<u16>), error::Error> {
    if let Some(bracketed) = address.strip_prefix('[') {
        let (host, rest) = bracketed
            .split_once(']')
            .ok_or_else(|| error::invalid_input(format!("Unclosed '[' in address: {}", address)))?;
        return match rest {
            "" => Ok((host, None)),
            _ => match rest.strip_prefix(':') {
                Some(port) => Ok((host, Some(parse_port(port)?))),
                None => Err(error::invalid_input(format!(
                    "Expected ':' after ']' in address: {}",
                    address
                ))),
            },
        };
    }
    match address.split_once(':') {
        Some((host, port)) if !port.contains(':') => Ok((host, Some(parse_port(port)?))),
        // More than one ':' is an IPv6 address without a port
        Some(_) => Ok((address, None)),
        None => Ok((address, None)),
    }
}

fn parse_port(port: &str) -> Result<u16, error::Error> {
    port.trim()
        .parse()
        .map_err(|_| error::invalid_input(format!("Not a valid port: {}", port)))
}

/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! Console plumbing shared by the sender and receiver demos.

#![allow(dead_code)]

use std::env;
use std::future::Future;
use std::io::Write;
use std::time::Duration;

use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};

use redis_patterns::{CancelSignal, Error, Settings};

pub type Console = Lines<BufReader<Stdin>>;

/// Lease taken by the receiver while it waits for the lock
pub const RECEIVER_LEASE: Duration = Duration::from_secs(5);
/// How long the receiver works while holding the lock
pub const RECEIVER_HOLD: Duration = Duration::from_secs(3);
/// Lease taken by the sender
pub const SENDER_LEASE: Duration = Duration::from_secs(10);
/// Longer than `SENDER_LEASE`, so the lease runs out before the sender releases
pub const SENDER_HOLD: Duration = Duration::from_secs(15);

pub fn console() -> Console {
    BufReader::new(stdin()).lines()
}

/// Settings from the environment, with the address optionally replaced by the first argument
pub fn settings() -> Result<Settings, Error> {
    let mut settings = Settings::from_env()?;
    if let Some(address) = env::args().nth(1) {
        settings.with_address(&address)?;
    }
    Ok(settings)
}

pub fn menu(title: &str, options: &[&str]) {
    println!("\n=== {} ===", title);
    for (i, option) in options.iter().enumerate() {
        println!("{}. {}", i + 1, option);
    }
}

/// Print `prompt` and read one line. `None` once input has ended.
pub async fn read_line(console: &mut Console, prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = std::io::stdout().flush();
    match console.next_line().await {
        Ok(line) => line,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            None
        }
    }
}

/// Drive `op` to completion, firing `cancel` if the operator types `q` or input ends meanwhile.
pub async fn until_quit<F: Future>(console: &mut Console, cancel: &CancelSignal, op: F) -> F::Output {
    tokio::pin!(op);
    let mut open = true;
    loop {
        tokio::select! {
            output = &mut op => return output,
            line = console.next_line(), if open => match line {
                Ok(Some(line)) if line.trim().eq_ignore_ascii_case("q") => cancel.cancel(),
                Ok(Some(_)) => (),
                Ok(None) | Err(_) => {
                    open = false;
                    cancel.cancel();
                }
            },
        }
    }
}

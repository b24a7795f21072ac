/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

// Pushes work, takes the lock and publishes notifications. Run `receiver` alongside it.
//
//     cargo run --example sender -- 127.0.0.1:6379

#[path = "console.rs"]
mod console;

use std::process;

use redis_patterns::{
    lock, pubsub, queue, Acquire, Error, RedisConnection, Release, Settings,
};

use console::{Console, SENDER_HOLD, SENDER_LEASE};

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let settings = console::settings()?;
    let con = RedisConnection::connect(&settings).await?;
    let mut console = console::console();

    loop {
        console::menu(
            "SENDER",
            &[
                "Push to queue",
                "Take lock",
                "Publish message",
                "Exit",
            ],
        );
        let Some(input) = console::read_line(&mut console, "Select option: ").await else {
            return Ok(());
        };

        // A failed command is reported, the menu carries on
        let result = match input.trim() {
            "1" => push(&con, &settings, &mut console).await,
            "2" => take_lock(&con, &settings, &mut console).await,
            "3" => publish(&con, &settings, &mut console).await,
            "4" => return Ok(()),
            _ => {
                println!("Invalid option.");
                Ok(())
            }
        };
        if let Err(e) = result {
            eprintln!("ERROR: {}", e);
        }
    }
}

async fn push(con: &RedisConnection, settings: &Settings, console: &mut Console) -> Result<(), Error> {
    let Some(message) = console::read_line(console, "Enter message to queue: ").await else {
        return Ok(());
    };
    let len = queue::enqueue(con, &settings.queue_key, &message).await?;
    println!("[Queue] Message '{}' pushed, {} waiting.", message, len);
    Ok(())
}

async fn take_lock(
    con: &RedisConnection,
    settings: &Settings,
    console: &mut Console,
) -> Result<(), Error> {
    println!("[Lock] Attempting to take lock...");
    let token = match lock::try_acquire(con, &settings.lock_key, SENDER_LEASE).await? {
        Acquire::Held(token) => token,
        Acquire::NotAcquired => {
            println!("[Lock] Lock is already held by another process.");
            return Ok(());
        }
    };

    println!(
        "[Lock] Lock ACQUIRED with a {:?} lease. Holding for {:?}, press Enter to release sooner...",
        SENDER_LEASE, SENDER_HOLD
    );
    tokio::select! {
        _ = tokio::time::sleep(SENDER_HOLD) => (),
        _ = console.next_line() => (),
    }

    match lock::release(con, &settings.lock_key, &token).await? {
        Release::Released => println!("[Lock] Lock released."),
        Release::AlreadyExpiredOrStolen => {
            println!("[Lock] Lease had already expired, or the lock now belongs to someone else.")
        }
    }
    Ok(())
}

async fn publish(
    con: &RedisConnection,
    settings: &Settings,
    console: &mut Console,
) -> Result<(), Error> {
    let Some(message) = console::read_line(console, "Enter message to publish: ").await else {
        return Ok(());
    };
    let receivers = pubsub::publish(con, &settings.channel, &message).await?;
    println!(
        "[Pub/Sub] Message '{}' published to {} subscriber(s).",
        message, receivers
    );
    Ok(())
}

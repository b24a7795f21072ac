/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

// Consumes what `sender` produces. While waiting, type `q` and Enter to stop.
//
//     cargo run --example receiver -- 127.0.0.1:6379

#[path = "console.rs"]
mod console;

use std::process;

use redis_patterns::{
    error::BoxError, lock, pubsub, queue, Acquired, CancelSignal, Dequeued, Error,
    RedisConnection, Release, Settings,
};

use console::{Console, RECEIVER_HOLD, RECEIVER_LEASE};

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
            "RECEIVER",
            &[
                "Read from queue",
                "Wait for lock",
                "Subscribe to channel",
                "Exit",
            ],
        );
        let Some(input) = console::read_line(&mut console, "Select option: ").await else {
            return Ok(());
        };

        let result = match input.trim() {
            "1" => drain_queue(&con, &settings, &mut console).await,
            "2" => wait_for_lock(&con, &settings, &mut console).await,
            "3" => listen(&con, &settings, &mut console).await,
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

async fn drain_queue(
    con: &RedisConnection,
    settings: &Settings,
    console: &mut Console,
) -> Result<(), Error> {
    println!("[Queue] Waiting for items... (type 'q' to stop)");
    let cancel = CancelSignal::new();
    let drain = async {
        loop {
            match queue::dequeue_blocking(con, &settings.queue_key, settings.poll_interval, &cancel)
                .await?
            {
                Dequeued::Item(item) => println!("[Queue] Received: {}", item),
                Dequeued::Cancelled => return Ok::<(), Error>(()),
            }
        }
    };
    console::until_quit(console, &cancel, drain).await?;
    println!("[Queue] Stopped.");
    Ok(())
}

async fn wait_for_lock(
    con: &RedisConnection,
    settings: &Settings,
    console: &mut Console,
) -> Result<(), Error> {
    println!("[Lock] Waiting to acquire lock... (type 'q' to stop)");
    let cancel = CancelSignal::new();
    let acquire = lock::acquire_blocking(
        con,
        &settings.lock_key,
        RECEIVER_LEASE,
        settings.retry_interval,
        &cancel,
    );
    let token = match console::until_quit(console, &cancel, acquire).await? {
        Acquired::Held(token) => token,
        Acquired::Cancelled => {
            println!("[Lock] Stopped waiting.");
            return Ok(());
        }
    };

    println!(
        "[Lock] Lock ACQUIRED! Doing work for {:?}...",
        RECEIVER_HOLD
    );
    tokio::time::sleep(RECEIVER_HOLD).await;

    match lock::release(con, &settings.lock_key, &token).await? {
        Release::Released => println!("[Lock] Lock released."),
        Release::AlreadyExpiredOrStolen => {
            println!("[Lock] Lease had already expired before release.")
        }
    }
    Ok(())
}

async fn listen(
    con: &RedisConnection,
    settings: &Settings,
    console: &mut Console,
) -> Result<(), Error> {
    println!("[Pub/Sub] Subscribing... (type 'q' to stop)");
    let cancel = CancelSignal::new();
    let subscription = pubsub::subscribe(
        con,
        &settings.channel,
        |message| {
            println!("[Pub/Sub] Received: {}", message);
            Ok::<(), BoxError>(())
        },
        &cancel,
    );
    let summary = console::until_quit(console, &cancel, subscription).await?;
    println!(
        "[Pub/Sub] Unsubscribed after {} message(s).",
        summary.received
    );
    Ok(())
}

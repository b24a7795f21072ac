/*
 * Copyright 2026 Ben Ashford
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::time::Duration;

use crate::{cancel::CancelSignal, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    Elapsed,
    Cancelled,
}

/// Sleep for `duration`, waking early if `cancel` fires first.
pub(crate) async fn pause(duration: Duration, cancel: &CancelSignal) -> Tick {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Tick::Cancelled,
        _ = tokio::time::sleep(duration) => Tick::Elapsed,
    }
}

pub(crate) fn check_interval(name: &str, interval: Duration) -> Result<(), error::Error> {
    if interval.is_zero() {
        return Err(error::invalid_input(format!(
            "{} must be greater than zero",
            name
        )));
    }
    Ok(())
}

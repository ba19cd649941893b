// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::constants::poll::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use std::time::Duration;

/// Polling schedule while waiting on remote state to converge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(POLL_INTERVAL_SECS),
            max: Duration::from_secs(POLL_MAX_INTERVAL_SECS),
        }
    }
}

impl Backoff {
    pub(crate) fn next(&self, current: Duration) -> Duration {
        (current * 2).min(self.max)
    }
}

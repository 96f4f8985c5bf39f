/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *
 */
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the quorum engine and its per-node connection pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Clock drift factor, as a fraction of the requested TTL
    pub drift_factor: f64,
    /// Base delay between acquisition retries
    pub retry_delay: Duration,
    /// Random jitter applied around the retry delay, in milliseconds
    pub retry_jitter_ms: u64,
    /// Connection pool size per node
    pub pool_size: u32,
    /// Connection establishment timeout
    pub connection_timeout: Duration,
    /// Per-node response timeout for unlock and cleanup rounds
    pub response_timeout: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            drift_factor: 0.01,
            retry_delay: Duration::from_millis(200),
            retry_jitter_ms: 50,
            pool_size: 4,
            connection_timeout: Duration::from_secs(3),
            response_timeout: Duration::from_secs(3),
        }
    }
}

impl LockConfig {
    pub fn with_drift_factor(mut self, factor: f64) -> Self {
        self.drift_factor = factor;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_retry_jitter_ms(mut self, jitter_ms: u64) -> Self {
        self.retry_jitter_ms = jitter_ms;
        self
    }

    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }
}

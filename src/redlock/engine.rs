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
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex as TokioMutex;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::config::LockConfig;
use crate::errors::{DistLockError, DistLockResult};
use crate::locker::LockDriver;
use crate::redlock::{HeldLock, LockNode};
use crate::util::{calculate_drift, calculate_quorum, jitter_delay, join_ids, lock_token};

/// Quorum lock engine over N independent nodes.
///
/// Every acquisition round mints a fresh random token, fans the
/// conditional set out to all nodes concurrently and counts grants. The
/// lock is held only when a majority of nodes granted it and the lease
/// still has positive validity after subtracting the time the round
/// took and a clock-drift margin. A failed round sweeps the partial
/// grants off every node before reporting failure, so a minority of
/// stragglers cannot starve later callers for a full TTL.
pub struct RedLockDriver {
    nodes: Vec<Arc<dyn LockNode>>,
    prefix: String,
    config: LockConfig,
    held: TokioMutex<HashMap<String, HeldLock>>,
    closed: AtomicBool,
}

impl RedLockDriver {
    pub fn new(
        nodes: Vec<Arc<dyn LockNode>>,
        prefix: &str,
        config: LockConfig,
    ) -> DistLockResult<Self> {
        if nodes.is_empty() {
            return Err(DistLockError::NoNodes);
        }
        Ok(Self {
            nodes,
            prefix: prefix.to_string(),
            config,
            held: TokioMutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn nodes(&self) -> &[Arc<dyn LockNode>] {
        &self.nodes
    }

    /// Remaining guaranteed lease for a batch this process believes it
    /// holds, as computed when the quorum was last reached or extended.
    pub async fn validity(&self, ids: &[&str]) -> Option<Duration> {
        self.held
            .lock()
            .await
            .get(&join_ids(ids))
            .map(|entry| entry.validity)
    }

    fn quorum(&self) -> usize {
        calculate_quorum(self.nodes.len())
    }

    fn prefixed(&self, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .map(|id| {
                if self.prefix.is_empty() {
                    (*id).to_string()
                } else {
                    format!("{}:{}", self.prefix, id)
                }
            })
            .collect()
    }

    /// Compare-and-delete fan-out used for both voluntary release and
    /// post-failure sweeping. Returns how many nodes acknowledged.
    async fn release_on_nodes(
        nodes: Vec<Arc<dyn LockNode>>,
        keys: Vec<String>,
        token: String,
        response_timeout: Duration,
    ) -> usize {
        let mut tasks = Vec::new();
        for node in nodes {
            let keys = keys.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                match timeout(response_timeout, node.release(&keys, &token)).await {
                    Ok(Ok(released)) => released,
                    Ok(Err(err)) => {
                        debug!("lock node {} release failed: {}", node.address(), err);
                        false
                    }
                    Err(_) => false,
                }
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if let Ok(true) = task.await {
                successes += 1;
            }
        }
        successes
    }

    /// One acquisition round: fresh token, concurrent fan-out bounded
    /// by the TTL, quorum count, validity check, sweep on failure.
    async fn try_lock_round(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DistLockError::Closed);
        }

        let quorum = self.quorum();
        let token = lock_token();
        let keys = self.prefixed(ids);
        let canceled = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let mut tasks = Vec::new();
        for node in &self.nodes {
            let node = node.clone();
            let keys = keys.clone();
            let token = token.clone();
            let canceled = canceled.clone();
            tasks.push(tokio::spawn(async move {
                match timeout(ttl, node.acquire(&keys, &token, ttl)).await {
                    Ok(Ok(granted)) => granted,
                    Ok(Err(err)) => {
                        debug!("lock node {} acquire failed: {}", node.address(), err);
                        false
                    }
                    Err(_) => {
                        canceled.fetch_add(1, Ordering::Release);
                        false
                    }
                }
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if canceled.load(Ordering::Acquire) > 0 {
                break;
            }
            if let Ok(granted) = task.await {
                if granted {
                    successes += 1;
                }
            }
        }

        if canceled.load(Ordering::Acquire) > 0 {
            // In-flight calls are left to finish on their own; the
            // sweep runs detached so the caller fails fast.
            tokio::spawn(Self::release_on_nodes(
                self.nodes.clone(),
                keys,
                token,
                self.config.response_timeout,
            ));
            return Err(DistLockError::Canceled);
        }

        let elapsed = started.elapsed();
        let drift = calculate_drift(ttl, self.config.drift_factor);
        let validity = ttl
            .checked_sub(elapsed + drift)
            .unwrap_or(Duration::from_secs(0));

        if successes >= quorum && validity.as_millis() > 0 {
            {
                let mut held = self.held.lock().await;
                held.insert(
                    join_ids(ids),
                    HeldLock {
                        token,
                        validity,
                        acquired_at: started,
                    },
                );
            }
            debug!(
                "acquired {:?} on {}/{} nodes, validity {:?}",
                ids,
                successes,
                self.nodes.len(),
                validity
            );
            Ok(())
        } else {
            debug!(
                "failed to acquire {:?}: {}/{} grants, validity {:?}",
                ids, successes, quorum, validity
            );
            Self::release_on_nodes(
                self.nodes.clone(),
                keys,
                token,
                self.config.response_timeout,
            )
            .await;
            Err(DistLockError::AcquireLock)
        }
    }

    /// Blocking acquisition: repeats rounds on a jittered delay until
    /// one succeeds or the TTL-derived attempt budget runs out.
    async fn lock_with_retries(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        let delay_ms = self.config.retry_delay.as_millis().max(1);
        let attempts = (ttl.as_millis() / delay_ms).max(1);

        for attempt in 0..attempts {
            match self.try_lock_round(ids, ttl).await {
                Ok(()) => return Ok(()),
                Err(DistLockError::AcquireLock) => {
                    if attempt + 1 < attempts {
                        sleep(jitter_delay(
                            self.config.retry_delay,
                            self.config.retry_jitter_ms,
                        ))
                        .await;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Err(DistLockError::AcquireLock)
    }

    async fn unlock_round(&self, ids: &[&str]) -> DistLockResult<()> {
        let entry = { self.held.lock().await.remove(&join_ids(ids)) };
        let entry = match entry {
            Some(entry) => entry,
            // Not held here, or already released: idempotent no-op.
            None => return Ok(()),
        };

        let keys = self.prefixed(ids);
        let released = Self::release_on_nodes(
            self.nodes.clone(),
            keys,
            entry.token,
            self.config.response_timeout,
        )
        .await;
        debug!("released {:?} on {}/{} nodes", ids, released, self.nodes.len());
        Ok(())
    }

    async fn extend_round(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DistLockError::Closed);
        }

        let cache_key = join_ids(ids);
        let token = match self.held.lock().await.get(&cache_key) {
            Some(entry) => entry.token.clone(),
            // Cannot refresh a lease this process does not hold.
            None => return Err(DistLockError::ExtendLock),
        };

        let quorum = self.quorum();
        let keys = self.prefixed(ids);
        let canceled = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let mut tasks = Vec::new();
        for node in &self.nodes {
            let node = node.clone();
            let keys = keys.clone();
            let token = token.clone();
            let canceled = canceled.clone();
            tasks.push(tokio::spawn(async move {
                match timeout(ttl, node.refresh(&keys, &token, ttl)).await {
                    Ok(Ok(refreshed)) => refreshed,
                    Ok(Err(err)) => {
                        debug!("lock node {} refresh failed: {}", node.address(), err);
                        false
                    }
                    Err(_) => {
                        canceled.fetch_add(1, Ordering::Release);
                        false
                    }
                }
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if canceled.load(Ordering::Acquire) > 0 {
                break;
            }
            if let Ok(refreshed) = task.await {
                if refreshed {
                    successes += 1;
                }
            }
        }

        // The lease may still be live on a majority, so a cut-off
        // refresh round must not sweep anything.
        if canceled.load(Ordering::Acquire) > 0 {
            return Err(DistLockError::Canceled);
        }

        if successes >= quorum {
            let elapsed = started.elapsed();
            let drift = calculate_drift(ttl, self.config.drift_factor);
            let validity = ttl
                .checked_sub(elapsed + drift)
                .unwrap_or(Duration::from_secs(0));
            let mut held = self.held.lock().await;
            if let Some(entry) = held.get_mut(&cache_key) {
                entry.validity = validity;
                entry.acquired_at = started;
            }
            debug!("extended {:?} on {}/{} nodes", ids, successes, self.nodes.len());
            Ok(())
        } else {
            // The stale entry stays cached so a later unlock still
            // sweeps whatever survived on the nodes.
            debug!("failed to extend {:?}: {}/{} grants", ids, successes, quorum);
            Err(DistLockError::ExtendLock)
        }
    }
}

#[async_trait]
impl LockDriver for RedLockDriver {
    async fn try_lock(&self, id: &str, ttl: Duration) -> DistLockResult<()> {
        self.try_lock_round(&[id], ttl).await
    }

    async fn lock(&self, id: &str, ttl: Duration) -> DistLockResult<()> {
        self.lock_with_retries(&[id], ttl).await
    }

    async fn unlock(&self, id: &str) -> DistLockResult<()> {
        self.unlock_round(&[id]).await
    }

    async fn extend_lock(&self, id: &str, ttl: Duration) -> DistLockResult<()> {
        self.extend_round(&[id], ttl).await
    }

    async fn try_lock_multi(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        self.try_lock_round(ids, ttl).await
    }

    async fn lock_multi(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        self.lock_with_retries(ids, ttl).await
    }

    async fn unlock_multi(&self, ids: &[&str]) -> DistLockResult<()> {
        self.unlock_round(ids).await
    }

    async fn close(&self) -> DistLockResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

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
use std::time::{Duration, Instant};
use async_trait::async_trait;
use tokio::sync::Mutex as TokioMutex;
use tokio::time::sleep;
use crate::errors::{DistLockError, DistLockResult};
use crate::locker::LockDriver;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// In-process driver backed by a mutex-guarded expiry map. Selected by
/// `local://` or an empty endpoint, for single-instance deployments and
/// tests where no external coordination is needed.
///
/// There is no ownership token: the map is the canonical state and only
/// this process can reach it, so `unlock` deletes unconditionally and
/// `extend_lock` has nothing to refresh remotely.
pub struct LocalDriver {
    entries: TokioMutex<HashMap<String, Instant>>,
}

impl LocalDriver {
    pub fn new() -> Self {
        Self {
            entries: TokioMutex::new(HashMap::new()),
        }
    }

    async fn try_insert(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        // All-or-nothing: refuse the whole batch before touching any entry.
        for id in ids {
            if let Some(deadline) = entries.get(*id) {
                if *deadline > now {
                    return Err(DistLockError::ResourceLocked);
                }
            }
        }

        for id in ids {
            entries.insert((*id).to_string(), now + ttl);
        }
        Ok(())
    }

    async fn poll_insert(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        let attempts = (ttl.as_millis() / POLL_INTERVAL.as_millis()).max(1);
        for attempt in 0..attempts {
            match self.try_insert(ids, ttl).await {
                Ok(()) => return Ok(()),
                Err(DistLockError::ResourceLocked) => {
                    if attempt + 1 < attempts {
                        sleep(POLL_INTERVAL).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Err(DistLockError::ResourceLocked)
    }

    async fn remove(&self, ids: &[&str]) {
        let mut entries = self.entries.lock().await;
        for id in ids {
            entries.remove(*id);
        }
    }
}

#[async_trait]
impl LockDriver for LocalDriver {
    async fn try_lock(&self, id: &str, ttl: Duration) -> DistLockResult<()> {
        self.try_insert(&[id], ttl).await
    }

    async fn lock(&self, id: &str, ttl: Duration) -> DistLockResult<()> {
        self.poll_insert(&[id], ttl).await
    }

    async fn unlock(&self, id: &str) -> DistLockResult<()> {
        self.remove(&[id]).await;
        Ok(())
    }

    async fn extend_lock(&self, _id: &str, _ttl: Duration) -> DistLockResult<()> {
        Ok(())
    }

    async fn try_lock_multi(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        self.try_insert(ids, ttl).await
    }

    async fn lock_multi(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()> {
        self.poll_insert(ids, ttl).await
    }

    async fn unlock_multi(&self, ids: &[&str]) -> DistLockResult<()> {
        self.remove(ids).await;
        Ok(())
    }

    async fn close(&self) -> DistLockResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

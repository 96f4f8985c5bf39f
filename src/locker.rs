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
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use crate::config::LockConfig;
use crate::errors::{DistLockError, DistLockResult};
use crate::local::LocalDriver;
use crate::registry::DriverRegistry;
use crate::url::LockUrl;

/// Uniform driver contract shared by the in-process driver and the
/// quorum engine. One implementation serves both facades.
#[async_trait]
pub trait LockDriver: Send + Sync {
    async fn try_lock(&self, id: &str, ttl: Duration) -> DistLockResult<()>;
    async fn lock(&self, id: &str, ttl: Duration) -> DistLockResult<()>;
    async fn unlock(&self, id: &str) -> DistLockResult<()>;
    async fn extend_lock(&self, id: &str, ttl: Duration) -> DistLockResult<()>;
    async fn try_lock_multi(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()>;
    async fn lock_multi(&self, ids: &[&str], ttl: Duration) -> DistLockResult<()>;
    async fn unlock_multi(&self, ids: &[&str]) -> DistLockResult<()>;
    async fn close(&self) -> DistLockResult<()>;
    fn as_any(&self) -> &dyn Any;
}

// Engine-level acquisition and extension failures surface uniformly as
// a locked resource, so callers see one taxonomy across drivers.
fn surface(result: DistLockResult<()>) -> DistLockResult<()> {
    match result {
        Err(DistLockError::AcquireLock) | Err(DistLockError::ExtendLock) => {
            Err(DistLockError::ResourceLocked)
        }
        other => other,
    }
}

fn build_driver(
    url: &str,
    config: &LockConfig,
    registry: &DriverRegistry,
) -> DistLockResult<Arc<dyn LockDriver>> {
    let parsed = LockUrl::parse(url)?;
    // local:// and the empty endpoint bypass the registry entirely.
    if parsed.is_local() {
        return Ok(Arc::new(LocalDriver::new()));
    }
    registry.resolve(&parsed, config)
}

/// Single-resource lock facade over a URL-selected driver.
#[derive(Clone)]
pub struct Locker {
    driver: Arc<dyn LockDriver>,
}

impl Locker {
    /// Builds a locker from an endpoint URL with the built-in driver
    /// registry and default configuration.
    pub fn new(url: &str) -> DistLockResult<Self> {
        Self::with_registry(url, LockConfig::default(), &DriverRegistry::builtin())
    }

    pub fn with_config(url: &str, config: LockConfig) -> DistLockResult<Self> {
        Self::with_registry(url, config, &DriverRegistry::builtin())
    }

    pub fn with_registry(
        url: &str,
        config: LockConfig,
        registry: &DriverRegistry,
    ) -> DistLockResult<Self> {
        Ok(Self {
            driver: build_driver(url, &config, registry)?,
        })
    }

    /// Non-blocking acquisition of `id` for `ttl_secs` seconds.
    pub async fn try_lock(&self, id: &str, ttl_secs: u64) -> DistLockResult<()> {
        surface(self.driver.try_lock(id, Duration::from_secs(ttl_secs)).await)
    }

    /// Blocking acquisition: retries until the TTL-derived attempt
    /// budget runs out.
    pub async fn lock(&self, id: &str, ttl_secs: u64) -> DistLockResult<()> {
        surface(self.driver.lock(id, Duration::from_secs(ttl_secs)).await)
    }

    /// Releases `id`. Unlocking a resource this process does not hold
    /// is a no-op.
    pub async fn unlock(&self, id: &str) -> DistLockResult<()> {
        self.driver.unlock(id).await
    }

    /// Re-arms the lease on `id` for another `ttl_secs` seconds.
    pub async fn extend_lock(&self, id: &str, ttl_secs: u64) -> DistLockResult<()> {
        surface(self.driver.extend_lock(id, Duration::from_secs(ttl_secs)).await)
    }

    pub async fn close(&self) -> DistLockResult<()> {
        self.driver.close().await
    }

    /// Capability escape hatch to the concrete driver behind the facade.
    pub fn driver_as<T: 'static>(&self) -> Option<&T> {
        self.driver.as_any().downcast_ref::<T>()
    }
}

/// Multi-resource lock facade: a batch of ids is acquired and released
/// as one all-or-nothing unit.
#[derive(Clone)]
pub struct MultiLocker {
    driver: Arc<dyn LockDriver>,
}

impl MultiLocker {
    pub fn new(url: &str) -> DistLockResult<Self> {
        Self::with_registry(url, LockConfig::default(), &DriverRegistry::builtin())
    }

    pub fn with_config(url: &str, config: LockConfig) -> DistLockResult<Self> {
        Self::with_registry(url, config, &DriverRegistry::builtin())
    }

    pub fn with_registry(
        url: &str,
        config: LockConfig,
        registry: &DriverRegistry,
    ) -> DistLockResult<Self> {
        Ok(Self {
            driver: build_driver(url, &config, registry)?,
        })
    }

    /// Non-blocking acquisition of the whole batch for `ttl_secs` seconds.
    pub async fn try_lock(&self, ids: &[&str], ttl_secs: u64) -> DistLockResult<()> {
        surface(
            self.driver
                .try_lock_multi(ids, Duration::from_secs(ttl_secs))
                .await,
        )
    }

    /// Blocking acquisition of the whole batch.
    pub async fn lock(&self, ids: &[&str], ttl_secs: u64) -> DistLockResult<()> {
        surface(
            self.driver
                .lock_multi(ids, Duration::from_secs(ttl_secs))
                .await,
        )
    }

    /// Releases the batch. Unlocking a batch this process does not hold
    /// is a no-op.
    pub async fn unlock(&self, ids: &[&str]) -> DistLockResult<()> {
        self.driver.unlock_multi(ids).await
    }

    pub async fn close(&self) -> DistLockResult<()> {
        self.driver.close().await
    }

    pub fn driver_as<T: 'static>(&self) -> Option<&T> {
        self.driver.as_any().downcast_ref::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redlock::RedLockDriver;

    struct RefusingDriver;

    #[async_trait]
    impl LockDriver for RefusingDriver {
        async fn try_lock(&self, _id: &str, _ttl: Duration) -> DistLockResult<()> {
            Err(DistLockError::AcquireLock)
        }

        async fn lock(&self, _id: &str, _ttl: Duration) -> DistLockResult<()> {
            Err(DistLockError::AcquireLock)
        }

        async fn unlock(&self, _id: &str) -> DistLockResult<()> {
            Ok(())
        }

        async fn extend_lock(&self, _id: &str, _ttl: Duration) -> DistLockResult<()> {
            Err(DistLockError::ExtendLock)
        }

        async fn try_lock_multi(&self, _ids: &[&str], _ttl: Duration) -> DistLockResult<()> {
            Err(DistLockError::AcquireLock)
        }

        async fn lock_multi(&self, _ids: &[&str], _ttl: Duration) -> DistLockResult<()> {
            Err(DistLockError::AcquireLock)
        }

        async fn unlock_multi(&self, _ids: &[&str]) -> DistLockResult<()> {
            Ok(())
        }

        async fn close(&self) -> DistLockResult<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[tokio::test]
    async fn engine_failures_surface_as_resource_locked() {
        let mut registry = DriverRegistry::new();
        registry.register("stub", |_url, _config| {
            Ok(Arc::new(RefusingDriver) as Arc<dyn LockDriver>)
        });

        let locker = Locker::with_registry("stub://node", LockConfig::default(), &registry).unwrap();
        assert!(matches!(
            locker.try_lock("a", 1).await,
            Err(DistLockError::ResourceLocked)
        ));
        assert!(matches!(
            locker.lock("a", 1).await,
            Err(DistLockError::ResourceLocked)
        ));
        assert!(matches!(
            locker.extend_lock("a", 1).await,
            Err(DistLockError::ResourceLocked)
        ));
        assert!(locker.unlock("a").await.is_ok());

        let mlock =
            MultiLocker::with_registry("stub://node", LockConfig::default(), &registry).unwrap();
        assert!(matches!(
            mlock.try_lock(&["a", "b"], 1).await,
            Err(DistLockError::ResourceLocked)
        ));
        assert!(mlock.unlock(&["a", "b"]).await.is_ok());
    }

    #[tokio::test]
    async fn local_url_round_trip() {
        let locker = Locker::new("local://").unwrap();
        locker.try_lock("res", 5).await.unwrap();
        assert!(matches!(
            locker.try_lock("res", 5).await,
            Err(DistLockError::ResourceLocked)
        ));
        locker.unlock("res").await.unwrap();
        locker.try_lock("res", 5).await.unwrap();
        locker.close().await.unwrap();
    }

    #[tokio::test]
    async fn multi_facade_round_trip() {
        let mlock = MultiLocker::new("local://").unwrap();
        mlock.try_lock(&["a", "b"], 5).await.unwrap();
        assert!(matches!(
            mlock.try_lock(&["b", "c"], 5).await,
            Err(DistLockError::ResourceLocked)
        ));
        mlock.unlock(&["a", "b"]).await.unwrap();
        mlock.try_lock(&["b", "c"], 5).await.unwrap();
        mlock.close().await.unwrap();
    }

    #[test]
    fn empty_url_selects_local_driver() {
        let locker = Locker::new("").unwrap();
        assert!(locker.driver_as::<LocalDriver>().is_some());
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        match Locker::new("zookeeper://h1:2181") {
            Err(DistLockError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "zookeeper"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("constructor should fail"),
        }
    }

    #[test]
    fn redis_scheme_requires_hosts() {
        assert!(matches!(
            Locker::new("redis://"),
            Err(DistLockError::NoNodes)
        ));
    }

    #[test]
    fn redis_scheme_builds_without_connecting() {
        let locker = Locker::new("redis://127.0.0.1:6399,127.0.0.2:6399/ns").unwrap();
        let driver = locker.driver_as::<RedLockDriver>().unwrap();
        assert_eq!(driver.nodes().len(), 2);
        assert!(locker.driver_as::<LocalDriver>().is_none());
    }
}

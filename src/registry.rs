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
use std::collections::HashMap;
use std::sync::Arc;
use crate::config::LockConfig;
use crate::errors::{DistLockError, DistLockResult};
use crate::locker::LockDriver;
use crate::redlock::{LockNode, RedLockDriver, RedisLockNode};
use crate::url::LockUrl;

/// Builds a driver for one parsed endpoint.
pub type DriverFactory =
    Arc<dyn Fn(&LockUrl, &LockConfig) -> DistLockResult<Arc<dyn LockDriver>> + Send + Sync>;

/// Explicit scheme-to-factory table consumed by the facade constructors.
/// Constructed once at process start; there is no process-global state.
#[derive(Clone)]
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl DriverRegistry {
    /// An empty registry. `local://` is handled by the facades directly
    /// and needs no registration.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry preloaded with the `redis` quorum driver.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("redis", |url, config| {
            let mut nodes: Vec<Arc<dyn LockNode>> = Vec::new();
            for node_url in url.node_urls() {
                nodes.push(Arc::new(RedisLockNode::new(&node_url, config)?));
            }
            let driver = RedLockDriver::new(nodes, url.prefix(), config.clone())?;
            Ok(Arc::new(driver) as Arc<dyn LockDriver>)
        });
        registry
    }

    /// Registers a factory for `scheme`, replacing any previous one.
    pub fn register<F>(&mut self, scheme: &str, factory: F)
    where
        F: Fn(&LockUrl, &LockConfig) -> DistLockResult<Arc<dyn LockDriver>> + Send + Sync + 'static,
    {
        self.factories
            .insert(scheme.to_ascii_lowercase(), Arc::new(factory));
    }

    pub fn resolve(
        &self,
        url: &LockUrl,
        config: &LockConfig,
    ) -> DistLockResult<Arc<dyn LockDriver>> {
        match self.factories.get(url.scheme()) {
            Some(factory) => factory(url, config),
            None => Err(DistLockError::UnsupportedScheme(url.scheme().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalDriver;

    #[test]
    fn empty_registry_knows_no_schemes() {
        let registry = DriverRegistry::new();
        let url = LockUrl::parse("redis://h1:6379").unwrap();
        assert!(matches!(
            registry.resolve(&url, &LockConfig::default()),
            Err(DistLockError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn builtin_registry_resolves_redis() {
        let registry = DriverRegistry::builtin();
        let url = LockUrl::parse("redis://h1:6379,h2:6379").unwrap();
        assert!(registry.resolve(&url, &LockConfig::default()).is_ok());
    }

    #[test]
    fn custom_factory_wins_for_its_scheme() {
        let mut registry = DriverRegistry::new();
        registry.register("Custom", |_url, _config| {
            Ok(Arc::new(LocalDriver::new()) as Arc<dyn LockDriver>)
        });

        // Lookup is case-insensitive on both sides.
        let url = LockUrl::parse("custom://anything").unwrap();
        let driver = registry.resolve(&url, &LockConfig::default()).unwrap();
        assert!(driver.as_any().downcast_ref::<LocalDriver>().is_some());
    }
}

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

use redis::RedisError;
use thiserror::Error;

pub type DistLockResult<T> = std::result::Result<T, DistLockError>;

#[derive(Error, Debug)]
pub enum DistLockError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Resource is locked")]
    ResourceLocked,

    #[error("Failed to acquire lock")]
    AcquireLock,

    #[error("Failed to extend lock")]
    ExtendLock,

    #[error("Lock operation canceled")]
    Canceled,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid lock url: {0}")]
    InvalidUrl(String),

    #[error("No lock nodes provided")]
    NoNodes,

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Lock driver is closed")]
    Closed,
}

impl From<deadpool::managed::PoolError<RedisError>> for DistLockError {
    fn from(err: deadpool::managed::PoolError<RedisError>) -> Self {
        DistLockError::Pool(err.to_string())
    }
}

impl From<deadpool::managed::BuildError> for DistLockError {
    fn from(err: deadpool::managed::BuildError) -> Self {
        DistLockError::Pool(err.to_string())
    }
}

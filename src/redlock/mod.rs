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
use std::time::{Duration, Instant};

mod engine;
mod node;

pub use engine::*;
pub use node::*;

/// Process-local record of one held lease, keyed by the joined resource
/// ids. Created on a successful quorum round, consulted and removed on
/// unlock, consulted and refreshed on extension.
#[derive(Debug, Clone)]
pub struct HeldLock {
    /// Ownership token proven to the nodes on release and refresh
    pub token: String,
    /// Guaranteed remaining lease when the quorum was reached
    pub validity: Duration,
    /// Start of the acquisition round
    pub acquired_at: Instant,
}

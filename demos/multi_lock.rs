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
use distlock::{DistLockError, DistLockResult, MultiLocker};

#[tokio::main]
async fn main() -> DistLockResult<()> {
    // 1. Multi-resource locker over the in-process driver
    let locker = MultiLocker::new("local://")?;

    // 2. Both accounts are locked in one shot, or neither is
    locker.try_lock(&["account:alice", "account:bob"], 5).await?;
    println!("transfer window open");

    // 3. A batch overlapping a held resource is refused as a whole
    match locker.try_lock(&["account:bob", "account:carol"], 5).await {
        Err(DistLockError::ResourceLocked) => println!("overlapping batch refused"),
        other => other?,
    }

    // 4. Release both and shut down
    locker.unlock(&["account:alice", "account:bob"]).await?;
    locker.close().await?;
    Ok(())
}

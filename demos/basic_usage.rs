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
use distlock::{DistLockResult, Locker};

#[tokio::main]
async fn main() -> DistLockResult<()> {
    // 1. Create a locker. "local://" runs in-process; a deployment
    //    would point at its quorum, e.g.
    //    "redis://10.0.0.1:6379,10.0.0.2:6379,10.0.0.3:6379/myapp"
    let locker = Locker::new("local://")?;

    // 2. Block until the lock is ours, for up to 10 seconds
    locker.lock("orders:1042", 10).await?;
    println!("critical section entered");

    // 3. Keep the lease alive while the work drags on
    locker.extend_lock("orders:1042", 10).await?;
    println!("lease extended");

    // 4. Release and shut down
    locker.unlock("orders:1042").await?;
    locker.close().await?;
    Ok(())
}

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

use once_cell::sync::Lazy;
use redis::Script;

/// Atomic conditional acquisition over 1..N keys.
/// ARGV: token, expiry unit ('EX' or 'PX'), expiry value.
/// Either every key in the batch is set with the token, or none is.
pub static ACQUIRE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(r#"
        -- Refuse the whole batch if any key is already held
        for i = 1, #KEYS do
            if redis.call('exists', KEYS[i]) == 1 then
                return 0
            end
        end

        -- Set every key; roll back the batch on any individual failure
        for i = 1, #KEYS do
            local ok = redis.call('set', KEYS[i], ARGV[1], 'NX', ARGV[2], ARGV[3])
            if not ok then
                for j = 1, i - 1 do
                    redis.call('del', KEYS[j])
                end
                return 0
            end
        end

        return 1
    "#)
});

/// Atomic compare-and-delete over 1..N keys.
/// ARGV: token.
/// Deletes nothing unless every key still carries the caller's token.
pub static RELEASE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(r#"
        for i = 1, #KEYS do
            if redis.call('get', KEYS[i]) ~= ARGV[1] then
                return 0
            end
        end

        for i = 1, #KEYS do
            redis.call('del', KEYS[i])
        end

        return 1
    "#)
});

/// Atomic compare-and-refresh over 1..N keys.
/// ARGV: token, expiry unit ('EX' or 'PX'), expiry value.
/// Re-arms every expiry only when every key still carries the token.
pub static EXTEND_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(r#"
        for i = 1, #KEYS do
            if redis.call('get', KEYS[i]) ~= ARGV[1] then
                return 0
            end
        end

        for i = 1, #KEYS do
            if ARGV[2] == 'EX' then
                redis.call('expire', KEYS[i], ARGV[3])
            else
                redis.call('pexpire', KEYS[i], ARGV[3])
            end
        end

        return 1
    "#)
});

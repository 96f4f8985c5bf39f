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
use std::time::Duration;
use rand::Rng;
use uuid::Uuid;

/// Generates a fresh ownership token for one acquisition attempt.
pub fn lock_token() -> String {
    Uuid::new_v4().to_string()
}

/// Clock drift margin subtracted from the nominal TTL: a configured
/// fraction of the TTL plus a fixed 2 ms skew pad.
pub fn calculate_drift(ttl: Duration, drift_factor: f64) -> Duration {
    let drift_ms = (ttl.as_millis() as f64 * drift_factor).ceil() as u64;
    Duration::from_millis(drift_ms) + Duration::from_millis(2)
}

pub fn calculate_quorum(n: usize) -> usize {
    (n as f64 / 2.0).floor() as usize + 1
}

pub fn jitter_delay(base_delay: Duration, jitter_ms: u64) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter = rng.gen_range(0..=jitter_ms);
    if rng.gen_bool(0.5) {
        base_delay + Duration::from_millis(jitter)
    } else {
        base_delay - Duration::from_millis(jitter).min(base_delay)
    }
}

/// Expiry unit and value for a node-side SET: whole seconds go out as
/// `EX`, anything with a sub-second component switches to `PX`.
pub fn expiry_args(ttl: Duration) -> (&'static str, u64) {
    if ttl.subsec_nanos() == 0 && ttl.as_secs() > 0 {
        ("EX", ttl.as_secs())
    } else {
        ("PX", ttl.as_millis() as u64)
    }
}

/// Cache key for a batch of resource ids.
pub fn join_ids(ids: &[&str]) -> String {
    ids.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_is_majority() {
        assert_eq!(calculate_quorum(1), 1);
        assert_eq!(calculate_quorum(2), 2);
        assert_eq!(calculate_quorum(3), 2);
        assert_eq!(calculate_quorum(5), 3);
        assert_eq!(calculate_quorum(7), 4);
    }

    #[test]
    fn drift_includes_fixed_pad() {
        assert_eq!(
            calculate_drift(Duration::from_secs(1), 0.01),
            Duration::from_millis(12)
        );
        assert_eq!(
            calculate_drift(Duration::from_millis(500), 0.01),
            Duration::from_millis(7)
        );
        // Zero TTL still carries the skew pad.
        assert_eq!(
            calculate_drift(Duration::from_secs(0), 0.01),
            Duration::from_millis(2)
        );
    }

    #[test]
    fn jitter_stays_within_window() {
        let base = Duration::from_millis(200);
        for _ in 0..100 {
            let delay = jitter_delay(base, 50);
            assert!(delay >= Duration::from_millis(150));
            assert!(delay <= Duration::from_millis(250));
        }
    }

    #[test]
    fn jitter_never_underflows() {
        let base = Duration::from_millis(10);
        for _ in 0..100 {
            let delay = jitter_delay(base, 50);
            assert!(delay <= Duration::from_millis(60));
        }
    }

    #[test]
    fn whole_seconds_use_ex() {
        assert_eq!(expiry_args(Duration::from_secs(30)), ("EX", 30));
        assert_eq!(expiry_args(Duration::from_secs(1)), ("EX", 1));
    }

    #[test]
    fn sub_second_ttl_uses_px() {
        assert_eq!(expiry_args(Duration::from_millis(1500)), ("PX", 1500));
        assert_eq!(expiry_args(Duration::from_millis(250)), ("PX", 250));
        assert_eq!(expiry_args(Duration::from_secs(0)), ("PX", 0));
    }

    #[test]
    fn joined_ids_keep_order() {
        assert_eq!(join_ids(&["a", "b", "c"]), "a,b,c");
        assert_eq!(join_ids(&["solo"]), "solo");
        assert_eq!(join_ids(&[]), "");
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(lock_token(), lock_token());
    }
}

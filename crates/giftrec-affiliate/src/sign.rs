//! Request signing for the affiliate gateway.
//!
//! The gateway authenticates every call with an MD5 digest over the sorted
//! parameters, wrapped in the app secret on both ends.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use md5::{Digest, Md5};

/// Gateway timestamps are wall-clock time at UTC+8, whatever the server's
/// own timezone is.
const GATEWAY_UTC_OFFSET_HOURS: i64 = 8;

/// Formats `now` as `YYYY-MM-DD HH:mm:ss` in the gateway's fixed UTC+8 offset.
#[must_use]
pub fn gateway_timestamp(now: DateTime<Utc>) -> String {
    (now.naive_utc() + TimeDelta::hours(GATEWAY_UTC_OFFSET_HOURS))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Computes the request signature.
///
/// `BTreeMap` iteration is already ascending byte order over keys, which is
/// the order the gateway concatenates `key + value` pairs in. The result is
/// the uppercase hex MD5 of `secret + pairs + secret`.
#[must_use]
pub fn sign_params(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    for (key, value) in params {
        hasher.update(key.as_bytes());
        hasher.update(value.as_bytes());
    }
    hasher.update(secret.as_bytes());
    format!("{:X}", hasher.finalize())
}

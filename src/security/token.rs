//! Stream identifier and stream-key generation.
//!
//! Both tokens come from the OS entropy source. The stream id is public;
//! the stream key is the broadcast secret and is only ever compared in
//! constant time.

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

pub const STREAM_ID_PREFIX: &str = "stream_";
pub const STREAM_KEY_PREFIX: &str = "sk_";

/// 24 hex characters of entropy.
const STREAM_ID_BYTES: usize = 12;
/// 48 hex characters of entropy.
const STREAM_KEY_BYTES: usize = 24;

fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn generate_stream_id() -> String {
    format!("{}{}", STREAM_ID_PREFIX, random_hex(STREAM_ID_BYTES))
}

pub fn generate_stream_key() -> String {
    format!("{}{}", STREAM_KEY_PREFIX, random_hex(STREAM_KEY_BYTES))
}

/// Constant-time stream-key comparison. An empty candidate never matches.
pub fn verify_stream_key(expected: &str, candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}

//! 拨号过程的结构化日志输出。
//!
//! 每次拨号生成一个关联 id，贯穿缓存命中、候选回退与最终结果，
//! 便于在日志里串起一次完整的连接建立过程。

use std::net::SocketAddr;

use uuid::Uuid;

use crate::core::errors::DialError;

/// Emit when a cached address short-circuits resolution.
pub fn emit_cache_hit(dial_id: Uuid, host: &str, addr: SocketAddr) {
    tracing::info!(
        target = "dns",
        dial_id = %dial_id,
        host,
        addr = %addr,
        "resolution cache hit"
    );
}

/// Emit when a successful fresh resolution is written through to the cache.
pub fn emit_cache_store(dial_id: Uuid, host: &str, addr: SocketAddr) {
    tracing::info!(
        target = "dns",
        dial_id = %dial_id,
        host,
        addr = %addr,
        "resolution cached"
    );
}

/// Emit when a cache entry is dropped after a failed connection.
pub fn emit_cache_invalidate(host: &str, reason: &str) {
    tracing::warn!(
        target = "dns",
        host,
        reason,
        "resolution cache entry invalidated"
    );
}

/// Emit when a candidate fails and the dial falls back to the next one.
pub fn emit_candidate_fallback(dial_id: Uuid, addr: SocketAddr, remaining: usize, error: &DialError) {
    tracing::warn!(
        target = "dial",
        dial_id = %dial_id,
        addr = %addr,
        remaining,
        error = %error,
        "candidate failed; trying next address"
    );
}

/// Emit when a dial completes with an open handle.
pub fn emit_established(dial_id: Uuid, addr: SocketAddr, elapsed_ms: u64, used_cache: bool) {
    tracing::info!(
        target = "dial",
        dial_id = %dial_id,
        addr = %addr,
        elapsed_ms,
        used_cache,
        "connection established"
    );
}

/// Emit when every candidate failed.
pub fn emit_exhausted(dial_id: Uuid, host: &str, attempts: usize) {
    tracing::error!(
        target = "dial",
        dial_id = %dial_id,
        host,
        attempts,
        "all candidate addresses failed"
    );
}

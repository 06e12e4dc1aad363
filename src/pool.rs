use std::sync::Mutex;

use once_cell::sync::Lazy;

/// Buffers larger than this are dropped instead of pooled.
const MAX_POOLED_CAPACITY: usize = 64 * 1024;

/// Upper bound on idle pooled buffers.
const MAX_POOLED_BUFFERS: usize = 16;

static POOL: Lazy<Mutex<Vec<Vec<u8>>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Take a scratch buffer from the pool, or allocate a fresh one.
pub(crate) fn take() -> Vec<u8> {
    // A poisoned pool just means some writer panicked mid-render; bypass it.
    let pooled = match POOL.lock() {
        Ok(mut pool) => pool.pop(),
        Err(_) => None,
    };
    match pooled {
        Some(mut buf) => {
            buf.clear();
            buf
        }
        None => Vec::new(),
    }
}

/// Return a scratch buffer to the pool. Oversized buffers are dropped.
pub(crate) fn put(buf: Vec<u8>) {
    if buf.capacity() > MAX_POOLED_CAPACITY {
        return;
    }
    if let Ok(mut pool) = POOL.lock() {
        if pool.len() < MAX_POOLED_BUFFERS {
            pool.push(buf);
        }
    }
}

/// Drop all pooled buffers.
pub(crate) fn clear() {
    if let Ok(mut pool) = POOL.lock() {
        pool.clear();
    }
}

//! FromSoft's path hashing algorithm, used by dvdbnd lookup tables and the
//! BND4 filename hash table.
//!
//! The path is lowercased, backslashes become forward slashes, and a leading
//! slash is ensured before folding each character into the accumulator as
//! `h * prime + c` with prime 37. Pre-Elden Ring formats keep a 32-bit
//! accumulator; Elden Ring widens it to 64 bits with the same fold.

/// Normalize a path the way the hash expects.
fn normalize(path: &str) -> String {
    let mut s = path.to_lowercase().replace('\\', "/");
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    s
}

/// 32-bit path hash used by pre-Elden Ring dvdbnds and hashed binders.
pub fn path_hash_32(path: &str) -> u32 {
    normalize(path)
        .chars()
        .fold(0u32, |h, c| h.wrapping_mul(37).wrapping_add(c as u32))
}

/// 64-bit path hash used by Elden Ring dvdbnds.
pub fn path_hash_64(path: &str) -> u64 {
    normalize(path)
        .chars()
        .fold(0u64, |h, c| h.wrapping_mul(37).wrapping_add(c as u64))
}

/// Whether `candidate` is prime. Bucket counts are conventionally prime so
/// the modulo spreads hashes evenly.
pub fn is_prime(candidate: u32) -> bool {
    if candidate < 2 {
        return false;
    }
    if candidate == 2 {
        return true;
    }
    if candidate % 2 == 0 {
        return false;
    }
    let mut i = 3u32;
    while let Some(sq) = i.checked_mul(i) {
        if sq > candidate {
            break;
        }
        if candidate % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

//! The tree shape shared by the namespaced merkle tree and the commitment aggregator.
//!
//! Both follow RFC 6962: a list of `n > 1` leaves is split at the largest power of two
//! strictly smaller than `n`, and each half is hashed recursively.

/// Returns the largest power of two strictly less than `len`.
///
/// `len` must be at least 1. For `len == 1` the result is 0, since a single leaf is
/// never split.
pub fn split_point(len: usize) -> usize {
    debug_assert!(len >= 1, "Trying to split a tree with size < 1");
    // Powers of two split in half, everything else below the next power of two
    len.next_power_of_two() >> 1
}

/// Folds already hashed leaves into a root using `hash_node` on every internal node.
///
/// Returns `None` if there are no leaves.
pub fn compute_root<T, F>(leaves: &[T], hash_node: &F) -> Option<T>
where
    T: Clone,
    F: Fn(&T, &T) -> T,
{
    match leaves.len() {
        0 => None,
        1 => Some(leaves[0].clone()),
        len => {
            let (left, right) = leaves.split_at(split_point(len));
            let left = compute_root(left, hash_node)?;
            let right = compute_root(right, hash_node)?;
            Some(hash_node(&left, &right))
        }
    }
}

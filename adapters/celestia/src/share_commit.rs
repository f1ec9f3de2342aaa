use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::blob::Blob;
use crate::config::{BlobConfig, SquareBound};
use crate::merkle::compute_root;
use crate::nmt::{NamespaceMerkleTree, NamespacedHash, NmtError, NAMESPACED_HASH_SIZE};
use crate::shares::{split_shares, Share};

const LEAF_DOMAIN_SEPARATOR: u8 = 0x00;
const NODE_DOMAIN_SEPARATOR: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitmentError {
    #[error(transparent)]
    Nmt(#[from] NmtError),
}

/// The share commitment of a blob, as carried by `MsgPayForBlobs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(#[serde(with = "hex::serde")] pub [u8; 32]);

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Commitment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Computes the share commitment of a blob, following Celestia's
/// "non-interactive default rules": the blob's shares are split into a merkle mountain
/// range of subtrees, each subtree is committed to with a namespaced merkle tree, and the
/// subtree roots are merkleized into the final commitment.
pub fn create_commitment(blob: &Blob, config: &BlobConfig) -> Result<Commitment, CommitmentError> {
    let shares = split_shares(blob, config);
    let width = subtree_width(shares.len(), config);
    let tree_sizes = merkle_mountain_range_sizes(shares.len(), width);
    debug!(
        shares = shares.len(),
        subtree_width = width,
        subtrees = tree_sizes.len(),
        "Computing share commitment"
    );

    let mut leaf_sets: Vec<&[Share]> = Vec::with_capacity(tree_sizes.len());
    let mut cursor = 0;
    for size in tree_sizes {
        leaf_sets.push(&shares[cursor..cursor + size]);
        cursor += size;
    }

    let subtree_roots = subtree_roots(blob, &leaf_sets)?;
    let roots: Vec<[u8; NAMESPACED_HASH_SIZE]> =
        subtree_roots.iter().map(NamespacedHash::to_array).collect();
    Ok(Commitment(hash_from_byte_slices(&roots)))
}

fn subtree_root(blob: &Blob, set: &[Share]) -> Result<NamespacedHash, NmtError> {
    let mut tree = NamespaceMerkleTree::new();
    for share in set {
        tree.push_leaf(share.as_serialized(), blob.namespace())?;
    }
    Ok(tree.root())
}

#[cfg(feature = "native")]
fn subtree_roots(blob: &Blob, leaf_sets: &[&[Share]]) -> Result<Vec<NamespacedHash>, NmtError> {
    use rayon::prelude::*;

    leaf_sets
        .par_iter()
        .map(|set| subtree_root(blob, set))
        .collect()
}

#[cfg(not(feature = "native"))]
fn subtree_roots(blob: &Blob, leaf_sets: &[&[Share]]) -> Result<Vec<NamespacedHash>, NmtError> {
    leaf_sets.iter().map(|set| subtree_root(blob, set)).collect()
}

/// Merkle root over arbitrary byte slices, as computed by tendermint's
/// `simple_hash_from_byte_vectors`. An empty list hashes to all zeros.
pub fn hash_from_byte_slices<T: AsRef<[u8]>>(items: &[T]) -> [u8; 32] {
    let leaves: Vec<[u8; 32]> = items
        .iter()
        .map(|item| {
            let mut hasher = Sha256::new();
            hasher.update([LEAF_DOMAIN_SEPARATOR]);
            hasher.update(item.as_ref());
            hasher.finalize().into()
        })
        .collect();

    compute_root(&leaves, &|left: &[u8; 32], right: &[u8; 32]| {
        let mut hasher = Sha256::new();
        hasher.update([NODE_DOMAIN_SEPARATOR]);
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().into()
    })
    .unwrap_or([0u8; 32])
}

/// Returns the maximum number of shares in a single subtree of the commitment.
pub fn subtree_width(share_count: usize, config: &BlobConfig) -> usize {
    let threshold = config.subtree_root_threshold();
    let width = round_up_power_of_2(div_ceil(share_count, threshold));
    let bounded_by = match config.square_bound() {
        SquareBound::SubtreeWidth => width,
        SquareBound::ShareCount => share_count,
    };
    let min_square_size = round_up_power_of_2(ceil_sqrt(bounded_by));
    width.min(min_square_size)
}

/// Returns the sizes of the subtrees of a binary merkle mountain range over `len` leaves,
/// largest first, none exceeding `max_tree_size`. A `max_tree_size` of zero is treated as one.
pub fn merkle_mountain_range_sizes(mut len: usize, max_tree_size: usize) -> Vec<usize> {
    let max_tree_size = max_tree_size.max(1);
    let mut output = Vec::new();

    while len != 0 {
        if len >= max_tree_size {
            output.push(max_tree_size);
            len -= max_tree_size;
        } else {
            let p = round_down_power_of_2(len);
            output.push(p);
            len -= p;
        }
    }
    output
}

/// Returns the smallest power of 2 that is greater than or equal to the input
pub fn round_up_power_of_2(num: usize) -> usize {
    num.next_power_of_two()
}

/// returns the largest power of 2 that is less than or equal to the input
/// Examples:
///   - round_down_power_of_2(2): 2
///   - round_down_power_of_2(3): 2
///   - round_down_power_of_2(7): 4
///   - round_down_power_of_2(8): 8
pub fn round_down_power_of_2(num: usize) -> usize {
    if num.is_power_of_two() {
        num
    } else {
        num.next_power_of_two() >> 1
    }
}

fn div_ceil(num: usize, divisor: usize) -> usize {
    num / divisor + usize::from(num % divisor != 0)
}

fn ceil_sqrt(num: usize) -> usize {
    let mut root = 0usize;
    while root.saturating_mul(root) < num {
        root += 1;
    }
    root
}

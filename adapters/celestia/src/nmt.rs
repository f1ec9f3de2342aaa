use sha2::{Digest, Sha256};

use crate::merkle::compute_root;
use crate::namespace::{Namespace, NS_SIZE};

/// The size of a sha256 digest
pub const HASH_SIZE: usize = 32;
/// The size of a serialized [`NamespacedHash`]: min namespace, max namespace, digest
pub const NAMESPACED_HASH_SIZE: usize = 2 * NS_SIZE + HASH_SIZE;

const LEAF_DOMAIN_SEPARATOR: u8 = 0x00;
const NODE_DOMAIN_SEPARATOR: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NmtError {
    #[error("Leaf in namespace {current} pushed after namespace {previous}")]
    OutOfOrder {
        previous: Namespace,
        current: Namespace,
    },
}

/// A node of a namespaced merkle tree, tagged with the namespace range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamespacedHash {
    min_ns: Namespace,
    max_ns: Namespace,
    hash: [u8; HASH_SIZE],
}

impl NamespacedHash {
    /// The root of a tree without leaves
    pub const EMPTY: Self = Self {
        min_ns: Namespace::new_unchecked([0; NS_SIZE]),
        max_ns: Namespace::new_unchecked([0; NS_SIZE]),
        hash: [0; HASH_SIZE],
    };

    pub fn hash_leaf(data: &[u8], namespace: Namespace) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([LEAF_DOMAIN_SEPARATOR]);
        hasher.update(namespace.as_bytes());
        hasher.update(data);
        Self {
            min_ns: namespace,
            max_ns: namespace,
            hash: hasher.finalize().into(),
        }
    }

    pub fn hash_node(left: &Self, right: &Self) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([NODE_DOMAIN_SEPARATOR]);
        hasher.update(left.to_array());
        hasher.update(right.to_array());
        Self {
            min_ns: left.min_ns.min(right.min_ns),
            max_ns: left.max_ns.max(right.max_ns),
            hash: hasher.finalize().into(),
        }
    }

    pub fn min_namespace(&self) -> Namespace {
        self.min_ns
    }

    pub fn max_namespace(&self) -> Namespace {
        self.max_ns
    }

    pub fn hash(&self) -> &[u8; HASH_SIZE] {
        &self.hash
    }

    pub fn to_array(&self) -> [u8; NAMESPACED_HASH_SIZE] {
        let mut out = [0u8; NAMESPACED_HASH_SIZE];
        out[..NS_SIZE].copy_from_slice(self.min_ns.as_bytes());
        out[NS_SIZE..2 * NS_SIZE].copy_from_slice(self.max_ns.as_bytes());
        out[2 * NS_SIZE..].copy_from_slice(&self.hash);
        out
    }
}

/// An in-memory namespaced merkle tree over sha256.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMerkleTree {
    leaves: Vec<NamespacedHash>,
}

impl NamespaceMerkleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a leaf. Leaves must be pushed in non-decreasing namespace order.
    pub fn push_leaf(&mut self, data: &[u8], namespace: Namespace) -> Result<(), NmtError> {
        if let Some(last) = self.leaves.last() {
            if namespace < last.max_ns {
                return Err(NmtError::OutOfOrder {
                    previous: last.max_ns,
                    current: namespace,
                });
            }
        }
        self.leaves.push(NamespacedHash::hash_leaf(data, namespace));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn root(&self) -> NamespacedHash {
        compute_root(&self.leaves, &NamespacedHash::hash_node).unwrap_or(NamespacedHash::EMPTY)
    }
}

//! The per-batch Merkle tree over state roots.
//!
//! Leaves are `keccak256(state_roots[i])`, padded with `keccak256(0x00..00)`
//! up to the next power of two; each parent is `keccak256(left || right)`.
//! The resulting root is the `batchRoot` committed on L1, and the sibling
//! lists produced here are what the L1 verifier folds back up.

use alloy_primitives::{keccak256, B256};

/// Hash of a 32-byte zero word; the padding leaf.
fn zero_leaf() -> B256 {
    keccak256([0u8; 32])
}

fn hash_pair(left: B256, right: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

/// Hashes the state roots into the padded leaf level.
fn leaf_level(state_roots: &[B256]) -> Vec<B256> {
    let width = state_roots.len().next_power_of_two();
    let mut level: Vec<B256> = state_roots.iter().map(|root| keccak256(root)).collect();
    level.resize(width, zero_leaf());
    level
}

fn parent_level(level: &[B256]) -> Vec<B256> {
    level.chunks(2).map(|pair| hash_pair(pair[0], pair[1])).collect()
}

/// Computes the Merkle root over the given state roots.
///
/// For a single-element batch the root is the lone leaf hash.
pub fn compute_root(state_roots: &[B256]) -> B256 {
    let mut level = leaf_level(state_roots);
    while level.len() > 1 {
        level = parent_level(&level);
    }
    level[0]
}

/// Produces the bottom-up sibling list proving inclusion of the leaf at
/// `index`. Returns `None` if `index` is out of range.
pub fn inclusion_proof(state_roots: &[B256], index: u64) -> Option<Vec<B256>> {
    let mut idx = usize::try_from(index).ok()?;
    if idx >= state_roots.len() {
        return None;
    }

    let mut level = leaf_level(state_roots);
    let mut siblings = Vec::new();
    while level.len() > 1 {
        siblings.push(level[idx ^ 1]);
        level = parent_level(&level);
        idx /= 2;
    }
    Some(siblings)
}

/// Folds a leaf hash up through its siblings, reproducing the root.
pub fn fold_proof(leaf: B256, index: u64, siblings: &[B256]) -> B256 {
    let mut node = leaf;
    let mut idx = index;
    for sibling in siblings {
        node = if idx % 2 == 0 { hash_pair(node, *sibling) } else { hash_pair(*sibling, node) };
        idx /= 2;
    }
    node
}

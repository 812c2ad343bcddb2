// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Deterministic key/value Merkle trie backing state and helper-trie proofs.
//!
//! leaf = H( "LightFuzz-Trie-Leaf-v1" || H(key) || H(value) )
//! node = H( "LightFuzz-Trie-Node-v1" || left || right )

use ring::digest;
use rlp::{Encodable, RlpStream};
use std::collections::BTreeMap;
use std::ops::Bound;

/// Hash32 type.
pub type Hash32 = [u8; 32];

const LEAF_DOMAIN: &[u8] = b"LightFuzz-Trie-Leaf-v1";
const NODE_DOMAIN: &[u8] = b"LightFuzz-Trie-Node-v1";

/// Side of sibling in proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Sibling is left.
    Left,
    /// Sibling is right.
    Right,
}

/// One proof item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofItem {
    /// Whether sibling is left or right of current hash.
    pub side: Side,
    /// Sibling hash.
    pub sibling: Hash32,
}

/// Merkle inclusion proof, ordered leaf to root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrieProof {
    /// Proven key.
    pub key: Vec<u8>,
    /// Value stored under `key`.
    pub value: Vec<u8>,
    /// Path items from leaf toward the root.
    pub path: Vec<ProofItem>,
}

impl Encodable for TrieProof {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.key);
        s.append(&self.value);
        s.begin_list(self.path.len());
        for item in &self.path {
            s.begin_list(2);
            s.append(&(matches!(item.side, Side::Left) as u8));
            s.append(&item.sibling.as_slice());
        }
    }
}

fn h(data: &[u8]) -> Hash32 {
    let d = digest::digest(&digest::SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(d.as_ref());
    out
}

fn hash_leaf(key: &[u8], value: &[u8]) -> Hash32 {
    let hk = h(key);
    let hv = h(value);
    let mut buf = Vec::with_capacity(LEAF_DOMAIN.len() + 32 + 32);
    buf.extend_from_slice(LEAF_DOMAIN);
    buf.extend_from_slice(&hk);
    buf.extend_from_slice(&hv);
    h(&buf)
}

fn hash_node(left: Hash32, right: Hash32) -> Hash32 {
    let mut buf = Vec::with_capacity(NODE_DOMAIN.len() + 32 + 32);
    buf.extend_from_slice(NODE_DOMAIN);
    buf.extend_from_slice(&left);
    buf.extend_from_slice(&right);
    h(&buf)
}

fn next_level(level: &[Hash32]) -> Vec<Hash32> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [l, r] => hash_node(*l, *r),
            [l] => hash_node(*l, *l),
            _ => [0u8; 32],
        })
        .collect()
}

/// Immutable trie over sorted key/value pairs. Levels are kept so proofs are
/// cheap to serve repeatedly.
#[derive(Clone, Debug, Default)]
pub struct MerkleTrie {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    // levels[0] = leaves, last = [root]
    levels: Vec<Vec<Hash32>>,
}

impl MerkleTrie {
    /// Build from key/value pairs. Later duplicates overwrite earlier ones.
    pub fn build<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        let entries: BTreeMap<Vec<u8>, Vec<u8>> = pairs.into_iter().collect();
        let mut levels = Vec::new();
        if !entries.is_empty() {
            let mut level: Vec<Hash32> = entries.iter().map(|(k, v)| hash_leaf(k, v)).collect();
            while level.len() > 1 {
                let next = next_level(&level);
                levels.push(level);
                level = next;
            }
            levels.push(level);
        }
        Self { entries, levels }
    }

    /// True if the trie holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Root hash; ZERO hash if empty.
    pub fn root(&self) -> Hash32 {
        self.levels
            .last()
            .and_then(|l| l.first().copied())
            .unwrap_or([0u8; 32])
    }

    /// Inclusion proof for `key`, omitting the `from_level` items nearest the
    /// root (the requester already holds them). `None` if the key is absent.
    pub fn prove(&self, key: &[u8], from_level: u64) -> Option<TrieProof> {
        let value = self.entries.get(key)?;
        let mut idx = self
            .entries
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
            .count();

        let depth = self.levels.len().saturating_sub(1);
        let mut path = Vec::with_capacity(depth);
        for level in self.levels.iter().take(depth) {
            let is_right = idx % 2 == 1;
            let sib_idx = if is_right { idx - 1 } else { idx + 1 };
            let sibling = level.get(sib_idx).copied().unwrap_or(level[idx]);
            path.push(ProofItem {
                side: if is_right { Side::Left } else { Side::Right },
                sibling,
            });
            idx /= 2;
        }

        let keep = depth.saturating_sub(usize::try_from(from_level).unwrap_or(usize::MAX));
        path.truncate(keep);
        Some(TrieProof {
            key: key.to_vec(),
            value: value.clone(),
            path,
        })
    }
}

/// Verify a full-depth proof against `root`.
pub fn verify_proof(root: Hash32, proof: &TrieProof) -> bool {
    let mut cur = hash_leaf(&proof.key, &proof.value);
    for item in proof.path.iter() {
        cur = match item.side {
            Side::Left => hash_node(item.sibling, cur),
            Side::Right => hash_node(cur, item.sibling),
        };
    }
    cur == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: u8) -> MerkleTrie {
        MerkleTrie::build((0..n).map(|i| (vec![i], vec![i, i])))
    }

    #[test]
    fn empty_trie_has_zero_root() {
        let t = MerkleTrie::build(Vec::new());
        assert_eq!(t.root(), [0u8; 32]);
        assert!(t.prove(b"x", 0).is_none());
    }

    #[test]
    fn every_key_proves_against_root() {
        let t = sample(7);
        for i in 0..7u8 {
            let p = t.prove(&[i], 0).unwrap();
            assert!(verify_proof(t.root(), &p));
        }
    }

    #[test]
    fn leaf_position_follows_key_order() {
        let t = MerkleTrie::build(vec![
            (vec![9], vec![1]),
            (vec![1, 0], vec![2]),
            (vec![1], vec![3]),
            (vec![5], vec![4]),
        ]);
        // Sorted order: [1], [1, 0], [5], [9].
        assert_eq!(t.prove(&[1], 0).unwrap().path[0].side, Side::Right);
        assert_eq!(t.prove(&[1, 0], 0).unwrap().path[0].side, Side::Left);
        assert_eq!(t.prove(&[5], 0).unwrap().path[0].side, Side::Right);
        assert_eq!(t.prove(&[9], 0).unwrap().path[0].side, Side::Left);
        assert!(t.prove(&[2], 0).is_none());
    }

    #[test]
    fn from_level_trims_upper_path() {
        let t = sample(8);
        let full = t.prove(&[3], 0).unwrap();
        assert_eq!(full.path.len(), 3);
        assert_eq!(t.prove(&[3], 1).unwrap().path.len(), 2);
        assert!(t.prove(&[3], u64::MAX).unwrap().path.is_empty());
    }
}

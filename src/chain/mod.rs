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

//! Reference chain the light server serves and the fuzzer draws "known" values from.

pub mod fixture;

use crate::core::types::H256;

/// Read-only view of the reference chain used to bias generated values
/// toward entities that exist.
pub trait ChainFixture {
    /// Number of blocks after genesis.
    fn chain_len(&self) -> u64;
    /// Canonical hash at `number`, if the block exists.
    fn canonical_hash(&self, number: u64) -> Option<H256>;
    /// State-trie keys (address hashes) of accounts the chain touched.
    fn account_hashes(&self) -> &[H256];
    /// Hashes of transactions included in the chain.
    fn tx_hashes(&self) -> &[H256];
    /// Keys present in the canonical-hash trie.
    fn cht_keys(&self) -> &[Vec<u8>];
    /// Keys present in the bloom trie.
    fn bloom_keys(&self) -> &[Vec<u8>];
    /// Next valid nonce of the funded signing account.
    fn bank_nonce(&self) -> u64;
}

pub use fixture::{Account, HelperTrieKind, TestChain};

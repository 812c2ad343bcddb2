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

//! Deterministic in-memory test chain.
//!
//! Genesis funds a single bank account. Block `i + 1` carries one bank transaction
//! with nonce `i`: every fourth block deploys a contract, the others pay a
//! derived address. Helper tries hold one section covering the whole chain.

use crate::chain::ChainFixture;
use crate::config::{ChainConfig, ConfigError};
use crate::core::signer::{HomesteadSigner, SignerError, TxSigner};
use crate::core::trie::MerkleTrie;
use crate::core::types::{Address, Header, Receipt, SignedTx, TxRequest, H256, TX_GAS};
use rlp::RlpStream;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Fixture build errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("empty chain")]
    EmptyChain,
    #[error("signer: {0}")]
    Signer(#[from] SignerError),
    #[error("bank balance exhausted at block {0}")]
    Funds(u64),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

const BANK_FUNDS: u128 = 100 * 1_000_000_000_000_000_000;
const GAS_LIMIT: u64 = 100_000_000;
const CREATE_GAS: u64 = 200_000;
const GWEI: u128 = 1_000_000_000;

/// Storage-array contract used for every deployment.
const TEST_CONTRACT_CODE: &str = "606060405260cc8060106000396000f360606040526000357c01000000000000000000000000000000000000000000000000000000009004806360cd2685146041578063c16431b914606b57603f565b005b6055600480803590602001909190505060a9565b6040518082815260200191505060405180910390f35b60886004808035906020019091908035906020019091905050608a565b005b80600060005083606481101560025790900160005b50819055505b5050565b6000600060005082606481101560025790900160005b5054905060c7565b91905056";

/// Helper trie families served by the light server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelperTrieKind {
    /// Canonical-hash trie: `be64(number) -> rlp([hash, td])`.
    CanonicalHash,
    /// Bloom-bits trie: `be16(bit) || be64(section) -> bits`.
    BloomBits,
}

/// Account state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    /// Nonce.
    pub nonce: u64,
    /// Balance in wei.
    pub balance: u128,
    /// Deployed code (empty for plain accounts).
    pub code: Vec<u8>,
    /// Storage slots, keyed by slot hash.
    pub storage: BTreeMap<H256, Vec<u8>>,
}

impl Account {
    fn storage_trie(&self) -> MerkleTrie {
        MerkleTrie::build(
            self.storage
                .iter()
                .map(|(k, v)| (k.as_bytes().to_vec(), v.clone())),
        )
    }

    fn encode_with_root(&self, storage_root: [u8; 32]) -> Vec<u8> {
        let mut s = RlpStream::new_list(4);
        s.append(&self.nonce);
        s.append(&self.balance);
        s.append(&storage_root.as_slice());
        s.append(&H256::keccak(&self.code));
        s.out().to_vec()
    }
}

/// One block: header, transactions, receipts.
#[derive(Clone, Debug)]
pub struct Block {
    /// Header.
    pub header: Header,
    /// Transactions.
    pub txs: Vec<SignedTx>,
    /// Receipts, one per transaction.
    pub receipts: Vec<Receipt>,
}

/// Location of an included transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxLookup {
    /// Containing block hash.
    pub block_hash: H256,
    /// Containing block number.
    pub block_number: u64,
    /// Index within the block.
    pub index: u64,
}

/// Immutable reference chain.
pub struct TestChain {
    blocks: Vec<Block>,
    hashes: Vec<H256>,
    by_hash: HashMap<H256, u64>,
    accounts: BTreeMap<H256, Account>,
    state_trie: MerkleTrie,
    storage_tries: HashMap<H256, MerkleTrie>,
    account_hashes: Vec<H256>,
    tx_hashes: Vec<H256>,
    tx_index: HashMap<H256, TxLookup>,
    cht: MerkleTrie,
    cht_keys: Vec<Vec<u8>>,
    bloom: MerkleTrie,
    bloom_keys: Vec<Vec<u8>>,
    bank: Address,
}

fn state_trie_of(accounts: &BTreeMap<H256, Account>) -> (MerkleTrie, HashMap<H256, MerkleTrie>) {
    let mut storage_tries = HashMap::new();
    let mut leaves = Vec::with_capacity(accounts.len());
    for (key, acc) in accounts {
        let st = acc.storage_trie();
        leaves.push((key.as_bytes().to_vec(), acc.encode_with_root(st.root())));
        if !st.is_empty() {
            storage_tries.insert(*key, st);
        }
    }
    (MerkleTrie::build(leaves), storage_tries)
}

fn indexed_root<T: rlp::Encodable>(items: &[T]) -> H256 {
    let trie = MerkleTrie::build(
        items
            .iter()
            .enumerate()
            .map(|(i, it)| (rlp::encode(&(i as u64)).to_vec(), rlp::encode(it).to_vec())),
    );
    H256::from_bytes(trie.root())
}

fn slot_key(slot: u64) -> H256 {
    let mut raw = [0u8; 32];
    raw[24..].copy_from_slice(&slot.to_be_bytes());
    H256::keccak(&raw)
}

impl TestChain {
    /// Build the chain described by `cfg`.
    pub fn build(cfg: &ChainConfig) -> Result<Self, FixtureError> {
        if cfg.chain_len == 0 {
            return Err(FixtureError::EmptyChain);
        }
        let signer = HomesteadSigner::from_hex(&cfg.bank_key_hex)?;
        let bank = signer.address();
        let code = hex::decode(TEST_CONTRACT_CODE).unwrap_or_default();

        let mut accounts: BTreeMap<H256, Account> = BTreeMap::new();
        accounts.insert(
            bank.hash(),
            Account {
                balance: BANK_FUNDS,
                ..Account::default()
            },
        );

        let (state, _) = state_trie_of(&accounts);
        let genesis = Header {
            parent_hash: H256::default(),
            number: 0,
            state_root: H256::from_bytes(state.root()),
            tx_root: indexed_root::<SignedTx>(&[]),
            receipt_root: indexed_root::<Receipt>(&[]),
            gas_limit: GAS_LIMIT,
            gas_used: 0,
            timestamp: 0,
        };
        let mut blocks = vec![Block {
            header: genesis,
            txs: Vec::new(),
            receipts: Vec::new(),
        }];
        let mut account_hashes = Vec::with_capacity(cfg.chain_len as usize);

        for i in 0..cfg.chain_len {
            let number = i + 1;
            let (req, addr) = if i % 4 == 0 {
                let req = TxRequest {
                    nonce: i,
                    gas_price: 0,
                    gas: CREATE_GAS,
                    to: None,
                    value: 0,
                    data: code.clone(),
                };
                (req, Address::create(&bank, i))
            } else {
                let req = TxRequest {
                    nonce: i,
                    gas_price: GWEI,
                    gas: TX_GAS,
                    to: Some(Address::from_low_u64(i)),
                    value: 10_000,
                    data: Vec::new(),
                };
                (req, Address::from_low_u64(i))
            };
            let gas_used = req.gas;
            let cost = req
                .value
                .checked_add(req.gas_price * u128::from(req.gas))
                .ok_or(FixtureError::Funds(number))?;
            let tx = signer.sign_tx(req)?;

            let bank_acc = accounts.entry(bank.hash()).or_default();
            bank_acc.balance = bank_acc
                .balance
                .checked_sub(cost)
                .ok_or(FixtureError::Funds(number))?;
            bank_acc.nonce += 1;

            let target = accounts.entry(addr.hash()).or_default();
            target.balance += tx.tx.value;
            if tx.tx.to.is_none() {
                target.code = code.clone();
                target.storage.insert(slot_key(0), rlp::encode(&number).to_vec());
                target.storage.insert(slot_key(1), rlp::encode(&addr).to_vec());
            }
            account_hashes.push(addr.hash());

            let receipts = vec![Receipt {
                status: 1,
                cumulative_gas: gas_used,
            }];
            let txs = vec![tx];
            let (state, _) = state_trie_of(&accounts);
            let parent = blocks.last().map(|b| b.header.hash()).unwrap_or_default();
            let header = Header {
                parent_hash: parent,
                number,
                state_root: H256::from_bytes(state.root()),
                tx_root: indexed_root(&txs),
                receipt_root: indexed_root(&receipts),
                gas_limit: GAS_LIMIT,
                gas_used,
                timestamp: number * 10,
            };
            blocks.push(Block { header, txs, receipts });
        }

        let hashes: Vec<H256> = blocks.iter().map(|b| b.header.hash()).collect();
        let by_hash = hashes
            .iter()
            .enumerate()
            .map(|(n, h)| (*h, n as u64))
            .collect();

        let mut tx_hashes = Vec::new();
        let mut tx_index = HashMap::new();
        for (n, b) in blocks.iter().enumerate() {
            for (i, tx) in b.txs.iter().enumerate() {
                let h = tx.hash();
                tx_hashes.push(h);
                tx_index.insert(
                    h,
                    TxLookup {
                        block_hash: hashes[n],
                        block_number: n as u64,
                        index: i as u64,
                    },
                );
            }
        }

        let mut cht_keys = Vec::with_capacity(cfg.chain_len as usize);
        let mut cht_leaves = Vec::with_capacity(cfg.chain_len as usize);
        let mut bloom_keys = Vec::with_capacity(cfg.chain_len as usize);
        let mut bloom_leaves = Vec::with_capacity(cfg.chain_len as usize);
        for n in 1..=cfg.chain_len {
            let key = n.to_be_bytes().to_vec();
            let mut s = RlpStream::new_list(2);
            s.append(&hashes[n as usize]);
            s.append(&n);
            cht_leaves.push((key.clone(), s.out().to_vec()));
            cht_keys.push(key);

            let mut key2 = vec![0u8; 10];
            key2[2..].copy_from_slice(&n.to_be_bytes());
            bloom_leaves.push((key2.clone(), vec![0x02, 0x0e]));
            bloom_keys.push(key2);
        }

        let (state_trie, storage_tries) = state_trie_of(&accounts);
        debug!(
            blocks = blocks.len(),
            accounts = accounts.len(),
            head = %hashes[hashes.len() - 1],
            "test chain built"
        );

        Ok(Self {
            blocks,
            hashes,
            by_hash,
            accounts,
            state_trie,
            storage_tries,
            account_hashes,
            tx_hashes,
            tx_index,
            cht: MerkleTrie::build(cht_leaves),
            cht_keys,
            bloom: MerkleTrie::build(bloom_leaves),
            bloom_keys,
            bank,
        })
    }

    /// Head block number.
    pub fn head_number(&self) -> u64 {
        (self.blocks.len() - 1) as u64
    }

    /// Block by number.
    pub fn block_by_number(&self, number: u64) -> Option<&Block> {
        usize::try_from(number).ok().and_then(|n| self.blocks.get(n))
    }

    /// Block number of a canonical hash.
    pub fn number_of(&self, hash: &H256) -> Option<u64> {
        self.by_hash.get(hash).copied()
    }

    /// Block by hash.
    pub fn block_by_hash(&self, hash: &H256) -> Option<&Block> {
        self.number_of(hash).and_then(|n| self.block_by_number(n))
    }

    /// Head-state account by state-trie key.
    pub fn account(&self, key: &H256) -> Option<&Account> {
        self.accounts.get(key)
    }

    /// Head-state account trie.
    pub fn state_trie(&self) -> &MerkleTrie {
        &self.state_trie
    }

    /// Storage trie of the account under `key`, if it has storage.
    pub fn storage_trie(&self, key: &H256) -> Option<&MerkleTrie> {
        self.storage_tries.get(key)
    }

    /// Where an included transaction lives.
    pub fn lookup_tx(&self, hash: &H256) -> Option<TxLookup> {
        self.tx_index.get(hash).copied()
    }

    /// Helper trie of `kind` for `section`. One section covers the whole chain.
    pub fn helper_trie(&self, kind: HelperTrieKind, section: u64) -> Option<&MerkleTrie> {
        if section != 0 {
            return None;
        }
        match kind {
            HelperTrieKind::CanonicalHash => Some(&self.cht),
            HelperTrieKind::BloomBits => Some(&self.bloom),
        }
    }

    /// The funded signing account.
    pub fn bank(&self) -> Address {
        self.bank
    }
}

impl ChainFixture for TestChain {
    fn chain_len(&self) -> u64 {
        self.head_number()
    }

    fn canonical_hash(&self, number: u64) -> Option<H256> {
        usize::try_from(number)
            .ok()
            .and_then(|n| self.hashes.get(n))
            .copied()
    }

    fn account_hashes(&self) -> &[H256] {
        &self.account_hashes
    }

    fn tx_hashes(&self) -> &[H256] {
        &self.tx_hashes
    }

    fn cht_keys(&self) -> &[Vec<u8>] {
        &self.cht_keys
    }

    fn bloom_keys(&self) -> &[Vec<u8>] {
        &self.bloom_keys
    }

    fn bank_nonce(&self) -> u64 {
        self.accounts
            .get(&self.bank.hash())
            .map(|a| a.nonce)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TestChain {
        let cfg = ChainConfig {
            chain_len: 8,
            ..ChainConfig::default()
        };
        TestChain::build(&cfg).unwrap()
    }

    #[test]
    fn chain_links_parents() {
        let c = small();
        assert_eq!(c.chain_len(), 8);
        for n in 1..=8u64 {
            let b = c.block_by_number(n).unwrap();
            assert_eq!(b.header.parent_hash, c.canonical_hash(n - 1).unwrap());
            assert_eq!(c.number_of(&b.header.hash()), Some(n));
        }
        assert!(c.canonical_hash(9).is_none());
    }

    #[test]
    fn bank_nonce_counts_bank_transactions() {
        let c = small();
        assert_eq!(c.bank_nonce(), 8);
        assert_eq!(c.tx_hashes().len(), 8);
        assert_eq!(c.cht_keys().len(), 8);
        assert_eq!(c.bloom_keys()[0].len(), 10);
    }

    #[test]
    fn contracts_carry_code_and_storage() {
        let c = small();
        let first = c.account_hashes()[0];
        let acc = c.account(&first).unwrap();
        assert!(!acc.code.is_empty());
        assert!(c.storage_trie(&first).is_some());
        let second = c.account_hashes()[1];
        assert!(c.account(&second).unwrap().code.is_empty());
    }

    #[test]
    fn zero_length_chain_is_rejected() {
        let cfg = ChainConfig {
            chain_len: 0,
            ..ChainConfig::default()
        };
        assert!(matches!(TestChain::build(&cfg), Err(FixtureError::EmptyChain)));
    }
}

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

//! Transaction pool behind `SendTxV2` / `GetTxStatus`.
//!
//! Validation runs against the head state of the reference chain. A transaction
//! is pending when every nonce from the sender's state nonce up to its own is
//! pooled, queued otherwise.

use crate::chain::{Account, TestChain};
use crate::core::signer::recover_sender;
use crate::core::types::{Address, SignedTx, H256, TX_GAS};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Pool-wide transaction cap.
pub const MAX_POOL_TXS: usize = 4096;
/// Per-sender transaction cap.
pub const MAX_ACCOUNT_TXS: usize = 64;
/// Replacement must raise the gas price by this percentage.
pub const PRICE_BUMP_PERCENT: u128 = 10;

/// Pool admission errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("invalid sender")]
    InvalidSender,
    #[error("already known")]
    AlreadyKnown,
    #[error("transaction underpriced")]
    Underpriced,
    #[error("intrinsic gas too low")]
    IntrinsicGas,
    #[error("nonce too low")]
    NonceTooLow,
    #[error("insufficient funds for gas * price + value")]
    InsufficientFunds,
    #[error("replacement transaction underpriced")]
    ReplacementUnderpriced,
    #[error("txpool is full")]
    Full,
}

/// Status codes reported by `GetTxStatus` / `SendTxV2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatusCode {
    /// Not known to the server.
    Unknown = 0,
    /// Pooled behind a nonce gap.
    Queued = 1,
    /// Pooled and executable.
    Pending = 2,
    /// Included in the chain.
    Included = 3,
    /// Rejected.
    Error = 4,
}

/// In-memory pool, one instance per server.
#[derive(Debug, Default)]
pub struct TxPool {
    by_sender: BTreeMap<Address, BTreeMap<u64, SignedTx>>,
    by_hash: HashMap<H256, (Address, u64)>,
}

impl TxPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pooled transaction count.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// True if nothing is pooled.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Validate and admit `tx`, returning its resulting status.
    pub fn add(&mut self, chain: &TestChain, tx: SignedTx) -> Result<TxStatusCode, PoolError> {
        let hash = tx.hash();
        if self.by_hash.contains_key(&hash) || chain.lookup_tx(&hash).is_some() {
            return Err(PoolError::AlreadyKnown);
        }
        let sender = recover_sender(&tx).map_err(|_| PoolError::InvalidSender)?;
        if tx.tx.gas_price == 0 {
            return Err(PoolError::Underpriced);
        }
        if tx.tx.gas < TX_GAS {
            return Err(PoolError::IntrinsicGas);
        }

        let state = chain.account(&sender.hash()).cloned().unwrap_or_else(Account::default);
        if tx.tx.nonce < state.nonce {
            return Err(PoolError::NonceTooLow);
        }
        let cost = tx
            .tx
            .gas_price
            .checked_mul(u128::from(tx.tx.gas))
            .and_then(|c| c.checked_add(tx.tx.value))
            .ok_or(PoolError::InsufficientFunds)?;
        if cost > state.balance {
            return Err(PoolError::InsufficientFunds);
        }

        let queue = self.by_sender.entry(sender).or_default();
        if let Some(old) = queue.get(&tx.tx.nonce) {
            let min = old
                .tx
                .gas_price
                .saturating_mul(100 + PRICE_BUMP_PERCENT)
                / 100;
            if tx.tx.gas_price < min {
                return Err(PoolError::ReplacementUnderpriced);
            }
            let old_hash = old.hash();
            self.by_hash.remove(&old_hash);
        } else if queue.len() >= MAX_ACCOUNT_TXS || self.by_hash.len() >= MAX_POOL_TXS {
            return Err(PoolError::Full);
        }

        let nonce = tx.tx.nonce;
        queue.insert(nonce, tx);
        self.by_hash.insert(hash, (sender, nonce));
        Ok(self.pooled_status(chain, &sender, nonce))
    }

    fn pooled_status(&self, chain: &TestChain, sender: &Address, nonce: u64) -> TxStatusCode {
        let Some(queue) = self.by_sender.get(sender) else {
            return TxStatusCode::Unknown;
        };
        let base = chain.account(&sender.hash()).map(|a| a.nonce).unwrap_or(0);
        if nonce < base {
            return TxStatusCode::Queued;
        }
        // range() panics on an inverted range; guarded above.
        let contiguous = queue.range(base..=nonce).count() as u64;
        if contiguous == nonce - base + 1 {
            TxStatusCode::Pending
        } else {
            TxStatusCode::Queued
        }
    }

    /// Pool-side status of `hash` (chain inclusion is checked by the caller).
    pub fn status(&self, chain: &TestChain, hash: &H256) -> TxStatusCode {
        match self.by_hash.get(hash) {
            Some((sender, nonce)) => self.pooled_status(chain, sender, *nonce),
            None => TxStatusCode::Unknown,
        }
    }
}

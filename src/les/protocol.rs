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

//! Light protocol versions, message codes and per-request limits.

use std::fmt;

/// Light protocol version 2.
pub const LPV2: u64 = 2;
/// Light protocol version 4.
pub const LPV4: u64 = 4;

/// Max headers per `GetBlockHeaders`.
pub const MAX_HEADER_FETCH: usize = 192;
/// Max hashes per `GetBlockBodies`.
pub const MAX_BODY_FETCH: usize = 32;
/// Max hashes per `GetReceipts`.
pub const MAX_RECEIPT_FETCH: usize = 128;
/// Max requests per `GetCode`.
pub const MAX_CODE_FETCH: usize = 64;
/// Max requests per `GetProofsV2`.
pub const MAX_PROOFS_FETCH: usize = 64;
/// Max requests per `GetHelperTrieProofs`.
pub const MAX_HELPER_TRIE_PROOFS_FETCH: usize = 64;
/// Max transactions per `SendTxV2`.
pub const MAX_TX_SEND: usize = 64;
/// Max hashes per `GetTxStatus`.
pub const MAX_TX_STATUS: usize = 256;

/// Message codes.
pub mod code {
    /// Header request.
    pub const GET_BLOCK_HEADERS: u64 = 0x02;
    /// Header reply.
    pub const BLOCK_HEADERS: u64 = 0x03;
    /// Body request.
    pub const GET_BLOCK_BODIES: u64 = 0x04;
    /// Body reply.
    pub const BLOCK_BODIES: u64 = 0x05;
    /// Receipt request.
    pub const GET_RECEIPTS: u64 = 0x06;
    /// Receipt reply.
    pub const RECEIPTS: u64 = 0x07;
    /// Code request.
    pub const GET_CODE: u64 = 0x0a;
    /// Code reply.
    pub const CODE: u64 = 0x0b;
    /// State proof request.
    pub const GET_PROOFS_V2: u64 = 0x0f;
    /// State proof reply.
    pub const PROOFS_V2: u64 = 0x10;
    /// Helper trie proof request.
    pub const GET_HELPER_TRIE_PROOFS: u64 = 0x11;
    /// Helper trie proof reply.
    pub const HELPER_TRIE_PROOFS: u64 = 0x12;
    /// Transaction submission.
    pub const SEND_TX_V2: u64 = 0x13;
    /// Transaction status request.
    pub const GET_TX_STATUS: u64 = 0x14;
    /// Transaction status reply.
    pub const TX_STATUS: u64 = 0x15;
}

/// The request kinds a light client may send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    /// `GetBlockHeaders`.
    BlockHeaders,
    /// `GetBlockBodies`.
    BlockBodies,
    /// `GetCode`.
    Code,
    /// `GetReceipts`.
    Receipts,
    /// `GetProofsV2`.
    Proofs,
    /// `GetHelperTrieProofs`.
    HelperTrieProofs,
    /// `SendTxV2`.
    SendTx,
    /// `GetTxStatus`.
    TxStatus,
}

impl MessageKind {
    /// All kinds, in selector order.
    pub const ALL: [MessageKind; 8] = [
        MessageKind::BlockHeaders,
        MessageKind::BlockBodies,
        MessageKind::Code,
        MessageKind::Receipts,
        MessageKind::Proofs,
        MessageKind::HelperTrieProofs,
        MessageKind::SendTx,
        MessageKind::TxStatus,
    ];

    /// Kind at selector position `i`.
    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// Request message code.
    pub fn code(self) -> u64 {
        match self {
            MessageKind::BlockHeaders => code::GET_BLOCK_HEADERS,
            MessageKind::BlockBodies => code::GET_BLOCK_BODIES,
            MessageKind::Code => code::GET_CODE,
            MessageKind::Receipts => code::GET_RECEIPTS,
            MessageKind::Proofs => code::GET_PROOFS_V2,
            MessageKind::HelperTrieProofs => code::GET_HELPER_TRIE_PROOFS,
            MessageKind::SendTx => code::SEND_TX_V2,
            MessageKind::TxStatus => code::GET_TX_STATUS,
        }
    }

    /// Reply message code.
    pub fn reply_code(self) -> u64 {
        match self {
            MessageKind::BlockHeaders => code::BLOCK_HEADERS,
            MessageKind::BlockBodies => code::BLOCK_BODIES,
            MessageKind::Code => code::CODE,
            MessageKind::Receipts => code::RECEIPTS,
            MessageKind::Proofs => code::PROOFS_V2,
            MessageKind::HelperTrieProofs => code::HELPER_TRIE_PROOFS,
            MessageKind::SendTx | MessageKind::TxStatus => code::TX_STATUS,
        }
    }

    /// Kind for a request message code.
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }

    /// Maximum number of items the server serves in one request.
    pub fn max_items(self) -> usize {
        match self {
            MessageKind::BlockHeaders => MAX_HEADER_FETCH,
            MessageKind::BlockBodies => MAX_BODY_FETCH,
            MessageKind::Code => MAX_CODE_FETCH,
            MessageKind::Receipts => MAX_RECEIPT_FETCH,
            MessageKind::Proofs => MAX_PROOFS_FETCH,
            MessageKind::HelperTrieProofs => MAX_HELPER_TRIE_PROOFS_FETCH,
            MessageKind::SendTx => MAX_TX_SEND,
            MessageKind::TxStatus => MAX_TX_STATUS,
        }
    }

    /// Short name for logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::BlockHeaders => "GetBlockHeaders",
            MessageKind::BlockBodies => "GetBlockBodies",
            MessageKind::Code => "GetCode",
            MessageKind::Receipts => "GetReceipts",
            MessageKind::Proofs => "GetProofsV2",
            MessageKind::HelperTrieProofs => "GetHelperTrieProofs",
            MessageKind::SendTx => "SendTxV2",
            MessageKind::TxStatus => "GetTxStatus",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// True if `version` is a light protocol version this server speaks.
pub fn is_supported_version(version: u64) -> bool {
    (LPV2..=LPV4).contains(&version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_back_to_kinds() {
        for (i, k) in MessageKind::ALL.iter().enumerate() {
            assert_eq!(MessageKind::from_index(i), Some(*k));
            assert_eq!(MessageKind::from_code(k.code()), Some(*k));
        }
        assert_eq!(MessageKind::from_code(code::BLOCK_HEADERS), None);
        assert_eq!(MessageKind::from_index(8), None);
    }
}

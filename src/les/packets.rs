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

//! Light protocol request packets and their RLP encoding.
//!
//! Every packet is `[req_id, body]`; the body layout depends on the message kind.

use crate::core::types::{CodecError, SignedTx, H256};
use crate::les::protocol::MessageKind;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

/// Origin of a header query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashOrNumber {
    /// Start at the block with this hash.
    Hash(H256),
    /// Start at the canonical block with this number.
    Number(u64),
}

impl Encodable for HashOrNumber {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            HashOrNumber::Hash(h) => h.rlp_append(s),
            HashOrNumber::Number(n) => n.rlp_append(s),
        }
    }
}

impl Decodable for HashOrNumber {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.size() == H256::LEN {
            Ok(HashOrNumber::Hash(rlp.as_val()?))
        } else {
            Ok(HashOrNumber::Number(rlp.as_val()?))
        }
    }
}

/// `GetBlockHeaders` body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderQuery {
    /// First block.
    pub origin: HashOrNumber,
    /// Number of headers wanted.
    pub amount: u64,
    /// Blocks skipped between consecutive headers.
    pub skip: u64,
    /// Walk toward genesis.
    pub reverse: bool,
}

impl Encodable for HeaderQuery {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.origin);
        s.append(&self.amount);
        s.append(&self.skip);
        s.append(&(self.reverse as u8));
    }
}

impl Decodable for HeaderQuery {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let reverse = match rlp.val_at::<u8>(3)? {
            0 => false,
            1 => true,
            _ => return Err(DecoderError::Custom("reverse flag")),
        };
        Ok(Self {
            origin: rlp.val_at(0)?,
            amount: rlp.val_at(1)?,
            skip: rlp.val_at(2)?,
            reverse,
        })
    }
}

/// One `GetCode` item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeReq {
    /// Block whose state is queried.
    pub block_hash: H256,
    /// State-trie key of the account.
    pub acc_key: Vec<u8>,
}

impl Encodable for CodeReq {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.block_hash);
        s.append(&self.acc_key);
    }
}

impl Decodable for CodeReq {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            block_hash: rlp.val_at(0)?,
            acc_key: rlp.val_at(1)?,
        })
    }
}

/// One `GetProofsV2` item. Both shapes share one wire layout
/// `[block_hash, acc_key, key, from_level]`; an empty `acc_key` means an
/// account proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofReq {
    /// Prove `key` in the account trie.
    Account {
        /// Block whose state is queried.
        block_hash: H256,
        /// Account trie key.
        key: Vec<u8>,
        /// Trie levels the requester already holds.
        from_level: u64,
    },
    /// Prove `key` in the storage trie of `acc_key`.
    Storage {
        /// Block whose state is queried.
        block_hash: H256,
        /// Account owning the storage trie.
        acc_key: Vec<u8>,
        /// Storage trie key.
        key: Vec<u8>,
        /// Trie levels the requester already holds.
        from_level: u64,
    },
}

impl ProofReq {
    /// Block whose state is queried.
    pub fn block_hash(&self) -> H256 {
        match self {
            ProofReq::Account { block_hash, .. } | ProofReq::Storage { block_hash, .. } => {
                *block_hash
            }
        }
    }
}

impl Encodable for ProofReq {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        match self {
            ProofReq::Account {
                block_hash,
                key,
                from_level,
            } => {
                s.append(block_hash);
                s.append_empty_data();
                s.append(key);
                s.append(from_level);
            }
            ProofReq::Storage {
                block_hash,
                acc_key,
                key,
                from_level,
            } => {
                s.append(block_hash);
                s.append(acc_key);
                s.append(key);
                s.append(from_level);
            }
        }
    }
}

impl Decodable for ProofReq {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let block_hash = rlp.val_at(0)?;
        let acc_key: Vec<u8> = rlp.val_at(1)?;
        let key = rlp.val_at(2)?;
        let from_level = rlp.val_at(3)?;
        if acc_key.is_empty() {
            Ok(ProofReq::Account {
                block_hash,
                key,
                from_level,
            })
        } else {
            Ok(ProofReq::Storage {
                block_hash,
                acc_key,
                key,
                from_level,
            })
        }
    }
}

/// Helper trie family named by a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelperTrieType {
    /// Type 0: canonical-hash trie.
    CanonicalHash,
    /// Type 1: bloom-bits trie.
    BloomBits,
    /// Any other type tag.
    Other(u64),
}

impl HelperTrieType {
    /// Wire tag.
    pub fn tag(self) -> u64 {
        match self {
            HelperTrieType::CanonicalHash => 0,
            HelperTrieType::BloomBits => 1,
            HelperTrieType::Other(t) => t,
        }
    }

    /// Type for a wire tag.
    pub fn from_tag(tag: u64) -> Self {
        match tag {
            0 => HelperTrieType::CanonicalHash,
            1 => HelperTrieType::BloomBits,
            t => HelperTrieType::Other(t),
        }
    }
}

/// Auxiliary data flag: return the header named by a canonical-hash-trie key.
pub const AUX_HEADER: u64 = 2;

/// One `GetHelperTrieProofs` item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelperTrieReq {
    /// Trie family.
    pub trie_type: HelperTrieType,
    /// Section index.
    pub trie_idx: u64,
    /// Key to prove.
    pub key: Vec<u8>,
    /// Trie levels the requester already holds.
    pub from_level: u64,
    /// Auxiliary data request ([`AUX_HEADER`] or 0).
    pub aux_req: u64,
}

impl Encodable for HelperTrieReq {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(5);
        s.append(&self.trie_type.tag());
        s.append(&self.trie_idx);
        s.append(&self.key);
        s.append(&self.from_level);
        s.append(&self.aux_req);
    }
}

impl Decodable for HelperTrieReq {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 5 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            trie_type: HelperTrieType::from_tag(rlp.val_at(0)?),
            trie_idx: rlp.val_at(1)?,
            key: rlp.val_at(2)?,
            from_level: rlp.val_at(3)?,
            aux_req: rlp.val_at(4)?,
        })
    }
}

/// Request body, one variant per [`MessageKind`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// `GetBlockHeaders`.
    BlockHeaders(HeaderQuery),
    /// `GetBlockBodies`.
    BlockBodies(Vec<H256>),
    /// `GetCode`.
    Code(Vec<CodeReq>),
    /// `GetReceipts`.
    Receipts(Vec<H256>),
    /// `GetProofsV2`.
    Proofs(Vec<ProofReq>),
    /// `GetHelperTrieProofs`.
    HelperTrieProofs(Vec<HelperTrieReq>),
    /// `SendTxV2`.
    SendTx(Vec<SignedTx>),
    /// `GetTxStatus`.
    TxStatus(Vec<H256>),
}

impl RequestBody {
    /// Message kind of this body.
    pub fn kind(&self) -> MessageKind {
        match self {
            RequestBody::BlockHeaders(_) => MessageKind::BlockHeaders,
            RequestBody::BlockBodies(_) => MessageKind::BlockBodies,
            RequestBody::Code(_) => MessageKind::Code,
            RequestBody::Receipts(_) => MessageKind::Receipts,
            RequestBody::Proofs(_) => MessageKind::Proofs,
            RequestBody::HelperTrieProofs(_) => MessageKind::HelperTrieProofs,
            RequestBody::SendTx(_) => MessageKind::SendTx,
            RequestBody::TxStatus(_) => MessageKind::TxStatus,
        }
    }

    /// Number of items the server is asked to serve.
    pub fn item_count(&self) -> u64 {
        match self {
            RequestBody::BlockHeaders(q) => q.amount,
            RequestBody::BlockBodies(v) | RequestBody::Receipts(v) | RequestBody::TxStatus(v) => {
                v.len() as u64
            }
            RequestBody::Code(v) => v.len() as u64,
            RequestBody::Proofs(v) => v.len() as u64,
            RequestBody::HelperTrieProofs(v) => v.len() as u64,
            RequestBody::SendTx(v) => v.len() as u64,
        }
    }
}

fn append_items<T: Encodable>(s: &mut RlpStream, items: &[T]) {
    s.begin_list(items.len());
    for it in items {
        s.append(it);
    }
}

impl Encodable for RequestBody {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            RequestBody::BlockHeaders(q) => q.rlp_append(s),
            RequestBody::BlockBodies(v) | RequestBody::Receipts(v) | RequestBody::TxStatus(v) => {
                append_items(s, v)
            }
            RequestBody::Code(v) => append_items(s, v),
            RequestBody::Proofs(v) => append_items(s, v),
            RequestBody::HelperTrieProofs(v) => append_items(s, v),
            RequestBody::SendTx(v) => append_items(s, v),
        }
    }
}

/// A request as sent on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// Request id echoed in the reply.
    pub req_id: u64,
    /// Body.
    pub body: RequestBody,
}

impl Request {
    /// Message kind.
    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    /// RLP `[req_id, body]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(2);
        s.append(&self.req_id);
        s.append(&self.body);
        s.out().to_vec()
    }

    /// Decode a packet of the given kind.
    pub fn decode(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        let rlp = Rlp::new(bytes);
        if rlp.item_count()? != 2 {
            return Err(CodecError::ItemCount);
        }
        let req_id = rlp.val_at(0)?;
        let b = rlp.at(1)?;
        let body = match kind {
            MessageKind::BlockHeaders => RequestBody::BlockHeaders(b.as_val()?),
            MessageKind::BlockBodies => RequestBody::BlockBodies(b.as_list()?),
            MessageKind::Code => RequestBody::Code(b.as_list()?),
            MessageKind::Receipts => RequestBody::Receipts(b.as_list()?),
            MessageKind::Proofs => RequestBody::Proofs(b.as_list()?),
            MessageKind::HelperTrieProofs => RequestBody::HelperTrieProofs(b.as_list()?),
            MessageKind::SendTx => RequestBody::SendTx(b.as_list()?),
            MessageKind::TxStatus => RequestBody::TxStatus(b.as_list()?),
        };
        Ok(Self { req_id, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Address, TxRequest};

    fn signed(nonce: u64, to: Option<Address>) -> SignedTx {
        SignedTx {
            tx: TxRequest { nonce, gas_price: 1_000_000_000, gas: 21_000, to, value: 10_000, data: vec![nonce as u8] },
            v: 27,
            r: H256::from_bytes([0x11; 32]),
            s: H256::from_bytes([0x22; 32]),
        }
    }

    #[test]
    fn every_kind_round_trips_with_several_items() {
        let a = H256::from_bytes([1u8; 32]);
        let b = H256::from_bytes([2u8; 32]);
        let bodies = vec![
            RequestBody::BlockHeaders(HeaderQuery { origin: HashOrNumber::Number(5), amount: 1, skip: 0, reverse: false }),
            RequestBody::BlockHeaders(HeaderQuery { origin: HashOrNumber::Hash(a), amount: 3, skip: 2, reverse: true }),
            RequestBody::BlockBodies(vec![a, b]),
            RequestBody::Code(vec![
                CodeReq { block_hash: a, acc_key: vec![3; 32] },
                CodeReq { block_hash: b, acc_key: Vec::new() },
            ]),
            RequestBody::Receipts(vec![b, a, b]),
            RequestBody::Proofs(vec![
                ProofReq::Account { block_hash: a, key: vec![4; 32], from_level: 0 },
                ProofReq::Storage { block_hash: b, acc_key: vec![5; 32], key: vec![6; 32], from_level: 1 },
            ]),
            RequestBody::HelperTrieProofs(vec![
                HelperTrieReq { trie_type: HelperTrieType::CanonicalHash, trie_idx: 0, key: vec![7; 8], from_level: 0, aux_req: AUX_HEADER },
                HelperTrieReq { trie_type: HelperTrieType::BloomBits, trie_idx: 3, key: vec![8; 10], from_level: 2, aux_req: 0 },
                HelperTrieReq { trie_type: HelperTrieType::Other(9), trie_idx: 1, key: Vec::new(), from_level: 0, aux_req: 0 },
            ]),
            RequestBody::SendTx(vec![signed(0, Some(Address::from_low_u64(7))), signed(1, None)]),
            RequestBody::TxStatus(vec![a, b]),
        ];
        for (i, body) in bodies.into_iter().enumerate() {
            let req = Request { req_id: i as u64 + 1, body };
            let back = Request::decode(req.kind(), &req.encode()).unwrap();
            assert_eq!(back, req);
        }
    }

    #[test]
    fn header_origin_decodes_by_width() {
        for origin in [HashOrNumber::Number(0), HashOrNumber::Number(u64::MAX), HashOrNumber::Hash(H256::from_bytes([7u8; 32]))] {
            let req = Request {
                req_id: 9,
                body: RequestBody::BlockHeaders(HeaderQuery { origin, amount: 1, skip: 0, reverse: true }),
            };
            let back = Request::decode(MessageKind::BlockHeaders, &req.encode()).unwrap();
            assert_eq!(back, req);
        }
    }

    #[test]
    fn proof_shape_follows_acc_key() {
        let reqs = vec![
            ProofReq::Account { block_hash: H256::default(), key: vec![1; 32], from_level: 2 },
            ProofReq::Storage { block_hash: H256::default(), acc_key: vec![2; 32], key: vec![3; 32], from_level: 0 },
        ];
        let req = Request { req_id: 1, body: RequestBody::Proofs(reqs) };
        let back = Request::decode(MessageKind::Proofs, &req.encode()).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn wrong_kind_is_a_decode_error() {
        let req = Request {
            req_id: 1,
            body: RequestBody::Code(vec![CodeReq { block_hash: H256::default(), acc_key: vec![1, 2] }]),
        };
        assert!(Request::decode(MessageKind::BlockBodies, &req.encode()).is_err());
        assert!(Request::decode(MessageKind::BlockHeaders, &[0xc0]).is_err());
    }
}

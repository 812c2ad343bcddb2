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

//! Light server: decodes inbound requests and serves them from the reference chain.
//!
//! Protocol-level problems (unknown code, bad encoding, oversized request) come
//! back as [`ServeError`]. Per-item problems (unknown block, missing key, bad
//! transaction) never fail the request; the item is skipped or gets an error status.

use crate::chain::{HelperTrieKind, TestChain};
use crate::core::types::{CodecError, SignedTx, H256};
use crate::les::packets::{
    CodeReq, HashOrNumber, HeaderQuery, HelperTrieReq, HelperTrieType, ProofReq, Request,
    RequestBody, AUX_HEADER,
};
use crate::les::protocol::{is_supported_version, MessageKind};
use crate::les::txpool::{TxPool, TxStatusCode};
use rlp::RlpStream;
use thiserror::Error;
use tracing::trace;

/// Replies stop growing once they pass this many bytes.
pub const SOFT_RESPONSE_LIMIT: usize = 2 * 1024 * 1024;

/// Flow-control buffer value advertised in every reply.
pub const BUFFER_LIMIT: u64 = 300_000_000;

/// Errors returned for a request as a whole.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("unknown message code {0:#x}")]
    UnknownMessage(u64),
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u64),
    #[error("decode: {0}")]
    Decode(#[from] CodecError),
    #[error("{kind} asks for {count} items, limit {max}")]
    TooManyItems {
        /// Request kind.
        kind: MessageKind,
        /// Items asked for.
        count: u64,
        /// Kind limit.
        max: usize,
    },
}

/// Encoded reply to a served request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    /// Reply message code.
    pub code: u64,
    /// Echoed request id.
    pub req_id: u64,
    /// Items served (skipped items excluded).
    pub items: usize,
    /// RLP `[req_id, buffer_value, data]`.
    pub payload: Vec<u8>,
}

/// Entry point for messages received from a peer.
pub trait MessagePipeline {
    /// Handle one encoded message of `code` under protocol `version`.
    fn handle(&mut self, code: u64, version: u64, payload: &[u8]) -> Result<Reply, ServeError>;
}

/// Status entry of `SendTxV2` / `GetTxStatus` replies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxStatusEntry {
    /// Status.
    pub status: TxStatusCode,
    /// Containing block for included transactions.
    pub block: Option<(H256, u64, u64)>,
    /// Rejection reason for `Error`.
    pub error: String,
}

impl rlp::Encodable for TxStatusEntry {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&(self.status as u8));
        match &self.block {
            Some((hash, number, index)) => {
                s.begin_list(3);
                s.append(hash);
                s.append(number);
                s.append(index);
            }
            None => {
                s.begin_list(0);
            }
        }
        s.append(&self.error.as_bytes());
    }
}

/// Light server over a borrowed reference chain with its own transaction pool.
pub struct LightServer<'c> {
    chain: &'c TestChain,
    pool: TxPool,
}

struct Served {
    items: usize,
    data: Vec<u8>,
}

fn list_of(raw_items: &[Vec<u8>]) -> Vec<u8> {
    let mut s = RlpStream::new_list(raw_items.len());
    for it in raw_items {
        s.append_raw(it, 1);
    }
    s.out().to_vec()
}

impl<'c> LightServer<'c> {
    /// Server with an empty pool.
    pub fn new(chain: &'c TestChain) -> Self {
        Self {
            chain,
            pool: TxPool::new(),
        }
    }

    /// Transaction pool state.
    pub fn pool(&self) -> &TxPool {
        &self.pool
    }

    /// Decode and serve one request.
    pub fn serve(&mut self, kind: MessageKind, payload: &[u8]) -> Result<Reply, ServeError> {
        let req = Request::decode(kind, payload)?;
        let count = req.body.item_count();
        if count > kind.max_items() as u64 {
            return Err(ServeError::TooManyItems {
                kind,
                count,
                max: kind.max_items(),
            });
        }

        let served = match req.body {
            RequestBody::BlockHeaders(q) => self.headers(&q),
            RequestBody::BlockBodies(hashes) => self.bodies(&hashes),
            RequestBody::Code(reqs) => self.code(&reqs),
            RequestBody::Receipts(hashes) => self.receipts(&hashes),
            RequestBody::Proofs(reqs) => self.proofs(&reqs),
            RequestBody::HelperTrieProofs(reqs) => self.helper_trie_proofs(&reqs),
            RequestBody::SendTx(txs) => self.send_txs(txs),
            RequestBody::TxStatus(hashes) => self.tx_status(&hashes),
        };
        trace!(%kind, req_id = req.req_id, asked = count, served = served.items, "served");

        let mut s = RlpStream::new_list(3);
        s.append(&req.req_id);
        s.append(&BUFFER_LIMIT);
        s.append_raw(&served.data, 1);
        Ok(Reply {
            code: kind.reply_code(),
            req_id: req.req_id,
            items: served.items,
            payload: s.out().to_vec(),
        })
    }

    fn origin_number(&self, origin: &HashOrNumber) -> Option<u64> {
        match origin {
            HashOrNumber::Hash(h) => self.chain.number_of(h),
            HashOrNumber::Number(n) => Some(*n),
        }
    }

    fn headers(&self, q: &HeaderQuery) -> Served {
        let mut out = Vec::new();
        let mut bytes = 0usize;
        let mut next = self.origin_number(&q.origin);
        while let Some(number) = next {
            if out.len() as u64 >= q.amount || bytes >= SOFT_RESPONSE_LIMIT {
                break;
            }
            let Some(block) = self.chain.block_by_number(number) else {
                break;
            };
            let enc = rlp::encode(&block.header).to_vec();
            bytes += enc.len();
            out.push(enc);

            // Overflowing skips end the walk instead of wrapping.
            next = q.skip.checked_add(1).and_then(|step| {
                if q.reverse {
                    number.checked_sub(step)
                } else {
                    number.checked_add(step)
                }
            });
        }
        Served {
            items: out.len(),
            data: list_of(&out),
        }
    }

    fn bodies(&self, hashes: &[H256]) -> Served {
        let mut out = Vec::new();
        let mut bytes = 0usize;
        for h in hashes {
            if bytes >= SOFT_RESPONSE_LIMIT {
                break;
            }
            let Some(block) = self.chain.block_by_hash(h) else {
                continue;
            };
            let mut s = RlpStream::new_list(2);
            s.begin_list(block.txs.len());
            for tx in &block.txs {
                s.append(tx);
            }
            s.begin_list(0);
            let enc = s.out().to_vec();
            bytes += enc.len();
            out.push(enc);
        }
        Served {
            items: out.len(),
            data: list_of(&out),
        }
    }

    fn receipts(&self, hashes: &[H256]) -> Served {
        let mut out = Vec::new();
        for h in hashes {
            let Some(block) = self.chain.block_by_hash(h) else {
                continue;
            };
            let mut s = RlpStream::new_list(block.receipts.len());
            for r in &block.receipts {
                s.append(r);
            }
            out.push(s.out().to_vec());
        }
        Served {
            items: out.len(),
            data: list_of(&out),
        }
    }

    fn code(&self, reqs: &[CodeReq]) -> Served {
        let mut out = Vec::new();
        for r in reqs {
            if self.chain.number_of(&r.block_hash).is_none() {
                continue;
            }
            if r.acc_key.len() != H256::LEN {
                continue;
            }
            let key = H256::from_slice_lossy(&r.acc_key);
            let Some(acc) = self.chain.account(&key) else {
                continue;
            };
            out.push(rlp::encode(&acc.code).to_vec());
        }
        Served {
            items: out.len(),
            data: list_of(&out),
        }
    }

    fn proofs(&self, reqs: &[ProofReq]) -> Served {
        let mut out = Vec::new();
        for r in reqs {
            if self.chain.number_of(&r.block_hash()).is_none() {
                continue;
            }
            let proof = match r {
                ProofReq::Account {
                    key, from_level, ..
                } => self.chain.state_trie().prove(key, *from_level),
                ProofReq::Storage {
                    acc_key,
                    key,
                    from_level,
                    ..
                } => {
                    if acc_key.len() != H256::LEN {
                        continue;
                    }
                    self.chain
                        .storage_trie(&H256::from_slice_lossy(acc_key))
                        .and_then(|t| t.prove(key, *from_level))
                }
            };
            // Absent keys still count as served, with an empty proof.
            let enc = match proof {
                Some(p) => rlp::encode(&p).to_vec(),
                None => vec![0xc0],
            };
            out.push(enc);
        }
        Served {
            items: out.len(),
            data: list_of(&out),
        }
    }

    fn helper_trie_proofs(&self, reqs: &[HelperTrieReq]) -> Served {
        let mut proofs = Vec::new();
        let mut aux = Vec::new();
        for r in reqs {
            let kind = match r.trie_type {
                HelperTrieType::CanonicalHash => HelperTrieKind::CanonicalHash,
                HelperTrieType::BloomBits => HelperTrieKind::BloomBits,
                HelperTrieType::Other(_) => continue,
            };
            let Some(trie) = self.chain.helper_trie(kind, r.trie_idx) else {
                continue;
            };
            proofs.push(match trie.prove(&r.key, r.from_level) {
                Some(p) => rlp::encode(&p).to_vec(),
                None => vec![0xc0],
            });

            if kind == HelperTrieKind::CanonicalHash && r.aux_req == AUX_HEADER {
                let Ok(raw) = <[u8; 8]>::try_from(r.key.as_slice()) else {
                    continue;
                };
                let number = u64::from_be_bytes(raw);
                if let Some(block) = self.chain.block_by_number(number) {
                    aux.push(rlp::encode(&block.header).to_vec());
                }
            }
        }
        let mut s = RlpStream::new_list(2);
        s.append_raw(&list_of(&proofs), 1);
        s.append_raw(&list_of(&aux), 1);
        Served {
            items: proofs.len(),
            data: s.out().to_vec(),
        }
    }

    fn send_txs(&mut self, txs: Vec<SignedTx>) -> Served {
        let mut out = Vec::with_capacity(txs.len());
        for tx in txs {
            let hash = tx.hash();
            let entry = match self.pool.add(self.chain, tx) {
                Ok(status) => TxStatusEntry {
                    status,
                    block: None,
                    error: String::new(),
                },
                Err(e) => {
                    trace!(tx = %hash, error = %e, "tx rejected");
                    TxStatusEntry {
                        status: TxStatusCode::Error,
                        block: None,
                        error: e.to_string(),
                    }
                }
            };
            out.push(rlp::encode(&entry).to_vec());
        }
        Served {
            items: out.len(),
            data: list_of(&out),
        }
    }

    fn tx_status(&self, hashes: &[H256]) -> Served {
        let mut out = Vec::with_capacity(hashes.len());
        for h in hashes {
            let entry = match self.chain.lookup_tx(h) {
                Some(l) => TxStatusEntry {
                    status: TxStatusCode::Included,
                    block: Some((l.block_hash, l.block_number, l.index)),
                    error: String::new(),
                },
                None => TxStatusEntry {
                    status: self.pool.status(self.chain, h),
                    block: None,
                    error: String::new(),
                },
            };
            out.push(rlp::encode(&entry).to_vec());
        }
        Served {
            items: out.len(),
            data: list_of(&out),
        }
    }
}

impl MessagePipeline for LightServer<'_> {
    fn handle(&mut self, code: u64, version: u64, payload: &[u8]) -> Result<Reply, ServeError> {
        let kind = MessageKind::from_code(code).ok_or(ServeError::UnknownMessage(code))?;
        if !is_supported_version(version) {
            return Err(ServeError::UnsupportedVersion(version));
        }
        self.serve(kind, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainFixture;
    use crate::config::ChainConfig;
    use crate::les::packets::RequestBody;

    fn chain() -> TestChain {
        TestChain::build(&ChainConfig {
            chain_len: 12,
            ..ChainConfig::default()
        })
        .unwrap()
    }

    fn packet(body: RequestBody) -> (u64, Vec<u8>) {
        let req = Request { req_id: 7, body };
        (req.kind().code(), req.encode())
    }

    #[test]
    fn forward_walk_stops_at_head() {
        let c = chain();
        let mut srv = LightServer::new(&c);
        let (code, bytes) = packet(RequestBody::BlockHeaders(HeaderQuery {
            origin: HashOrNumber::Number(10),
            amount: 5,
            skip: 0,
            reverse: false,
        }));
        let reply = srv.handle(code, 2, &bytes).unwrap();
        assert_eq!(reply.req_id, 7);
        assert_eq!(reply.code, crate::les::protocol::code::BLOCK_HEADERS);
        assert_eq!(reply.items, 3);
    }

    #[test]
    fn huge_skip_does_not_wrap() {
        let c = chain();
        let mut srv = LightServer::new(&c);
        for reverse in [false, true] {
            let (code, bytes) = packet(RequestBody::BlockHeaders(HeaderQuery {
                origin: HashOrNumber::Number(3),
                amount: 4,
                skip: u64::MAX,
                reverse,
            }));
            assert_eq!(srv.handle(code, 3, &bytes).unwrap().items, 1);
        }
    }

    #[test]
    fn unknown_hashes_are_skipped() {
        let c = chain();
        let mut srv = LightServer::new(&c);
        let known = c.canonical_hash(4).unwrap();
        let (code, bytes) =
            packet(RequestBody::BlockBodies(vec![known, H256::from_bytes([9; 32])]));
        assert_eq!(srv.handle(code, 4, &bytes).unwrap().items, 1);
    }

    #[test]
    fn other_helper_trie_types_are_skipped() {
        let c = chain();
        let mut srv = LightServer::new(&c);
        let key = c.cht_keys()[2].clone();
        let reqs = vec![
            HelperTrieReq {
                trie_type: HelperTrieType::CanonicalHash,
                trie_idx: 0,
                key: key.clone(),
                from_level: 0,
                aux_req: AUX_HEADER,
            },
            HelperTrieReq {
                trie_type: HelperTrieType::Other(2),
                trie_idx: 0,
                key: key.clone(),
                from_level: 0,
                aux_req: AUX_HEADER,
            },
            HelperTrieReq {
                trie_type: HelperTrieType::BloomBits,
                trie_idx: 1,
                key,
                from_level: 0,
                aux_req: 0,
            },
        ];
        let (code, bytes) = packet(RequestBody::HelperTrieProofs(reqs));
        assert_eq!(srv.handle(code, 2, &bytes).unwrap().items, 1);
    }

    #[test]
    fn protocol_errors_are_typed() {
        let c = chain();
        let mut srv = LightServer::new(&c);
        assert!(matches!(
            srv.handle(0x7f, 2, &[]),
            Err(ServeError::UnknownMessage(0x7f))
        ));
        let (code, bytes) = packet(RequestBody::TxStatus(vec![]));
        assert!(matches!(
            srv.handle(code, 1, &bytes),
            Err(ServeError::UnsupportedVersion(1))
        ));
        assert!(matches!(
            srv.handle(code, 2, &[0x01, 0x02]),
            Err(ServeError::Decode(_))
        ));
    }
}

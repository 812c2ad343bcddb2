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

//! Generate/dispatch loop.
//!
//! Each iteration picks a request kind with `random_int(8)`, fills every field
//! from the cursor, draws a protocol version and hands the encoded packet to the
//! pipeline. The loop ends when the cursor is exhausted.

use crate::chain::ChainFixture;
use crate::config::{HarnessConfig, VersionRange, DEFAULT_MIN_INPUT_LEN};
use crate::core::signer::TxSigner;
use crate::core::types::{Address, TxRequest, TX_GAS};
use crate::fuzzing::cursor::Cursor;
use crate::les::packets::{
    CodeReq, HashOrNumber, HeaderQuery, HelperTrieReq, HelperTrieType, ProofReq, Request,
    RequestBody, AUX_HEADER,
};
use crate::les::protocol::{
    MessageKind, MAX_BODY_FETCH, MAX_CODE_FETCH, MAX_HEADER_FETCH, MAX_HELPER_TRIE_PROOFS_FETCH,
    MAX_PROOFS_FETCH, MAX_RECEIPT_FETCH, MAX_TX_SEND, MAX_TX_STATUS,
};
use crate::les::server::{MessagePipeline, ServeError};
use crate::monitoring::metrics::Metrics;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Value of every generated transaction.
pub const TX_VALUE: u128 = 10_000;
/// Gas price unit scaled by a random byte.
pub const GAS_PRICE_UNIT: u128 = 1_000_000_000;

/// Outcome of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Input was below the minimum length; nothing was generated.
    pub skipped: bool,
    /// Messages dispatched per kind.
    pub per_kind: BTreeMap<MessageKind, u64>,
    /// Messages the pipeline served.
    pub accepted: u64,
    /// Messages the pipeline rejected.
    pub rejected: u64,
    /// Input bytes consumed.
    pub consumed: usize,
}

impl RunSummary {
    /// Total messages dispatched.
    pub fn dispatched(&self) -> u64 {
        self.accepted + self.rejected
    }
}

/// Driver over an injected fixture, signer and pipeline.
pub struct Fuzzer<'f, F, S, P> {
    fixture: &'f F,
    signer: S,
    pipeline: P,
    min_input_len: usize,
    versions: VersionRange,
    nonce: u64,
    next_req_id: u64,
    metrics: Option<Arc<Metrics>>,
}

impl<'f, F, S, P> Fuzzer<'f, F, S, P>
where
    F: ChainFixture,
    S: TxSigner,
    P: MessagePipeline,
{
    /// Driver with default limits.
    pub fn new(fixture: &'f F, signer: S, pipeline: P) -> Self {
        Self {
            fixture,
            signer,
            pipeline,
            min_input_len: DEFAULT_MIN_INPUT_LEN,
            versions: VersionRange::default(),
            nonce: fixture.bank_nonce(),
            next_req_id: 1,
            metrics: None,
        }
    }

    /// Apply input length and version settings from `cfg`.
    pub fn with_config(mut self, cfg: &HarnessConfig) -> Self {
        self.min_input_len = cfg.min_input_len;
        self.versions = cfg.versions;
        self
    }

    /// Record counters into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The pipeline, for inspection after a run.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Give back the pipeline.
    pub fn into_pipeline(self) -> P {
        self.pipeline
    }

    /// Run one input to exhaustion.
    ///
    /// Panics if the pipeline fails to decode a packet this driver encoded.
    pub fn run(&mut self, input: &[u8]) -> RunSummary {
        let mut summary = RunSummary::default();
        if input.len() < self.min_input_len {
            debug!(len = input.len(), min = self.min_input_len, "input too short");
            if let Some(m) = &self.metrics {
                m.skipped_inputs_total.inc();
            }
            summary.skipped = true;
            return summary;
        }

        self.nonce = self.fixture.bank_nonce();
        self.next_req_id = 1;
        let mut cur = Cursor::new(input);
        while !cur.is_exhausted() {
            let kind = self.pick_kind(&mut cur);
            let req = self.generate_request(kind, &mut cur);
            let span = usize::try_from(self.versions.span()).unwrap_or(usize::MAX);
            let version = self.versions.min.saturating_add(cur.random_int(span) as u64);
            self.dispatch(&req, version, &mut summary);
        }
        summary.consumed = cur.offset();

        info!(
            len = input.len(),
            dispatched = summary.dispatched(),
            accepted = summary.accepted,
            rejected = summary.rejected,
            "run finished"
        );
        summary
    }

    fn pick_kind(&self, cur: &mut Cursor<'_>) -> MessageKind {
        let i = cur.random_int(MessageKind::ALL.len());
        MessageKind::from_index(i).unwrap_or(MessageKind::BlockHeaders)
    }

    fn req_id(&mut self) -> u64 {
        let id = self.next_req_id;
        self.next_req_id = self.next_req_id.wrapping_add(1);
        id
    }

    /// Build a request of `kind` from cursor draws.
    pub fn generate_request(&mut self, kind: MessageKind, cur: &mut Cursor<'_>) -> Request {
        let body = match kind {
            MessageKind::BlockHeaders => RequestBody::BlockHeaders(self.header_query(cur)),
            MessageKind::BlockBodies => {
                let n = cur.random_int(MAX_BODY_FETCH + 1);
                RequestBody::BlockBodies(
                    (0..n).map(|_| cur.random_block_hash(self.fixture)).collect(),
                )
            }
            MessageKind::Code => {
                let n = cur.random_int(MAX_CODE_FETCH + 1);
                RequestBody::Code(
                    (0..n)
                        .map(|_| CodeReq {
                            block_hash: cur.random_block_hash(self.fixture),
                            acc_key: cur.random_addr_hash(self.fixture).as_bytes().to_vec(),
                        })
                        .collect(),
                )
            }
            MessageKind::Receipts => {
                let n = cur.random_int(MAX_RECEIPT_FETCH + 1);
                RequestBody::Receipts(
                    (0..n).map(|_| cur.random_block_hash(self.fixture)).collect(),
                )
            }
            MessageKind::Proofs => {
                let n = cur.random_int(MAX_PROOFS_FETCH + 1);
                RequestBody::Proofs((0..n).map(|_| self.proof_req(cur)).collect())
            }
            MessageKind::HelperTrieProofs => {
                let n = cur.random_int(MAX_HELPER_TRIE_PROOFS_FETCH + 1);
                RequestBody::HelperTrieProofs((0..n).map(|_| self.helper_trie_req(cur)).collect())
            }
            MessageKind::SendTx => {
                let n = cur.random_int(MAX_TX_SEND + 1);
                let mut txs = Vec::with_capacity(n);
                for _ in 0..n {
                    let tx = self.tx_request(cur);
                    match self.signer.sign_tx(tx) {
                        Ok(signed) => {
                            if let Some(m) = &self.metrics {
                                m.signed_txs_total.inc();
                            }
                            txs.push(signed);
                        }
                        Err(e) => warn!(error = %e, "signing failed, tx dropped"),
                    }
                }
                RequestBody::SendTx(txs)
            }
            MessageKind::TxStatus => {
                let n = cur.random_int(MAX_TX_STATUS + 1);
                RequestBody::TxStatus((0..n).map(|_| cur.random_tx_hash(self.fixture)).collect())
            }
        };
        Request {
            req_id: self.req_id(),
            body,
        }
    }

    fn header_query(&self, cur: &mut Cursor<'_>) -> HeaderQuery {
        let amount = cur.random_x(MAX_HEADER_FETCH as u64 + 1);
        let skip = cur.random_x(10);
        let reverse = cur.random_bool();
        // Numbers reach twice the chain length to hit missing blocks.
        let origin = if cur.random_bool() {
            HashOrNumber::Hash(cur.random_block_hash(self.fixture))
        } else {
            let bound = usize::try_from(self.fixture.chain_len().saturating_mul(2))
                .unwrap_or(usize::MAX);
            HashOrNumber::Number(cur.random_int(bound) as u64)
        };
        HeaderQuery {
            origin,
            amount,
            skip,
            reverse,
        }
    }

    fn proof_req(&self, cur: &mut Cursor<'_>) -> ProofReq {
        if cur.random_bool() {
            ProofReq::Storage {
                block_hash: cur.random_block_hash(self.fixture),
                acc_key: cur.random_addr_hash(self.fixture).as_bytes().to_vec(),
                key: cur.random_addr_hash(self.fixture).as_bytes().to_vec(),
                from_level: cur.random_x(3),
            }
        } else {
            ProofReq::Account {
                block_hash: cur.random_block_hash(self.fixture),
                key: cur.random_addr_hash(self.fixture).as_bytes().to_vec(),
                from_level: cur.random_x(3),
            }
        }
    }

    fn helper_trie_req(&self, cur: &mut Cursor<'_>) -> HelperTrieReq {
        match cur.random_int(3) {
            0 => HelperTrieReq {
                trie_type: HelperTrieType::CanonicalHash,
                trie_idx: cur.random_x(3),
                key: cur.random_cht_key(self.fixture),
                from_level: cur.random_x(3),
                aux_req: AUX_HEADER,
            },
            1 => HelperTrieReq {
                trie_type: HelperTrieType::BloomBits,
                trie_idx: cur.random_x(3),
                key: cur.random_bloom_key(self.fixture),
                from_level: cur.random_x(3),
                aux_req: 0,
            },
            _ => HelperTrieReq {
                trie_type: HelperTrieType::Other(2),
                trie_idx: cur.random_x(3),
                key: cur.random_cht_key(self.fixture),
                from_level: cur.random_x(3),
                aux_req: 0,
            },
        }
    }

    fn tx_request(&mut self, cur: &mut Cursor<'_>) -> TxRequest {
        let nonce = if cur.random_bool() {
            u64::from(cur.random_byte())
        } else {
            let n = self.nonce;
            self.nonce = self.nonce.wrapping_add(1);
            n
        };
        TxRequest {
            nonce,
            gas_price: GAS_PRICE_UNIT * u128::from(cur.random_byte()),
            gas: TX_GAS,
            to: Some(Address::default()),
            value: TX_VALUE,
            data: Vec::new(),
        }
    }

    fn dispatch(&mut self, req: &Request, version: u64, summary: &mut RunSummary) {
        let kind = req.kind();
        let payload = req.encode();
        *summary.per_kind.entry(kind).or_default() += 1;
        if let Some(m) = &self.metrics {
            m.dispatched_total.with_label_values(&[kind.name()]).inc();
        }

        match self.pipeline.handle(kind.code(), version, &payload) {
            Ok(reply) => {
                debug!(%kind, version, req_id = req.req_id, items = reply.items, "served");
                summary.accepted += 1;
                if let Some(m) = &self.metrics {
                    m.accepted_total.inc();
                }
            }
            Err(ServeError::Decode(e)) => {
                panic!("{kind} packet {} failed to decode: {e}", hex::encode(&payload));
            }
            Err(e) => {
                debug!(%kind, version, req_id = req.req_id, error = %e, "rejected");
                summary.rejected += 1;
                if let Some(m) = &self.metrics {
                    m.rejected_total.inc();
                }
            }
        }
    }
}

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

use lightfuzz::chain::{ChainFixture, TestChain};
use lightfuzz::config::{ChainConfig, HarnessConfig};
use lightfuzz::core::signer::{HomesteadSigner, TxSigner};
use lightfuzz::core::trie::verify_proof;
use lightfuzz::core::types::{Address, TxRequest, H256};
use lightfuzz::fuzzing::Harness;
use lightfuzz::les::packets::{HashOrNumber, HeaderQuery, ProofReq, Request, RequestBody};
use lightfuzz::les::protocol::MAX_BODY_FETCH;
use lightfuzz::les::txpool::TxStatusCode;
use lightfuzz::les::{LightServer, MessageKind, MessagePipeline, ServeError};
use proptest::prelude::*;
use rlp::Rlp;

fn small_cfg() -> HarnessConfig {
    HarnessConfig {
        chain: ChainConfig {
            chain_len: 32,
            ..ChainConfig::default()
        },
        ..HarnessConfig::default()
    }
}

fn chain() -> TestChain {
    TestChain::build(&small_cfg().chain).unwrap()
}

fn send(srv: &mut LightServer<'_>, body: RequestBody) -> Result<lightfuzz::les::Reply, ServeError> {
    let req = Request { req_id: 1, body };
    srv.handle(req.kind().code(), 2, &req.encode())
}

fn statuses(payload: &[u8]) -> Vec<u8> {
    let rlp = Rlp::new(payload);
    let list = rlp.at(2).unwrap();
    (0..list.item_count().unwrap())
        .map(|i| list.at(i).unwrap().val_at::<u8>(0).unwrap())
        .collect()
}

fn transfer(nonce: u64) -> TxRequest {
    TxRequest {
        nonce,
        gas_price: 1_000_000_000,
        gas: 21_000,
        to: Some(Address::default()),
        value: 10_000,
        data: Vec::new(),
    }
}

#[test]
fn valid_header_query_is_served() {
    let c = chain();
    let mut srv = LightServer::new(&c);
    let origin = c.canonical_hash(5).unwrap();
    let reply = send(
        &mut srv,
        RequestBody::BlockHeaders(HeaderQuery {
            origin: HashOrNumber::Hash(origin),
            amount: 1,
            skip: 0,
            reverse: false,
        }),
    )
    .unwrap();
    assert_eq!(reply.items, 1);
}

#[test]
fn header_query_by_number_is_served() {
    let c = chain();
    let mut srv = LightServer::new(&c);
    let reply = send(
        &mut srv,
        RequestBody::BlockHeaders(HeaderQuery {
            origin: HashOrNumber::Number(5),
            amount: 3,
            skip: 1,
            reverse: false,
        }),
    )
    .unwrap();
    assert_eq!(reply.items, 3);
}

#[test]
fn served_account_proofs_verify_against_state_root() {
    let c = chain();
    let mut srv = LightServer::new(&c);
    let block_hash = c.canonical_hash(c.chain_len()).unwrap();
    let keys: Vec<H256> = c.account_hashes().iter().take(2).copied().collect();
    assert_eq!(keys.len(), 2);
    let reqs = keys
        .iter()
        .map(|k| ProofReq::Account {
            block_hash,
            key: k.as_bytes().to_vec(),
            from_level: 0,
        })
        .collect();
    let reply = send(&mut srv, RequestBody::Proofs(reqs)).unwrap();
    assert_eq!(reply.items, 2);

    let served = Rlp::new(&reply.payload).at(2).unwrap();
    let root = c.state_trie().root();
    for (i, k) in keys.iter().enumerate() {
        let proof = c.state_trie().prove(k.as_bytes(), 0).unwrap();
        assert!(verify_proof(root, &proof));
        assert_eq!(served.at(i).unwrap().as_raw(), &rlp::encode(&proof)[..]);
    }
}

#[test]
fn one_past_max_bodies_is_rejected() {
    let c = chain();
    let mut srv = LightServer::new(&c);
    let hashes = vec![H256::default(); MAX_BODY_FETCH + 1];
    match send(&mut srv, RequestBody::BlockBodies(hashes)) {
        Err(ServeError::TooManyItems { kind, count, max }) => {
            assert_eq!(kind, MessageKind::BlockBodies);
            assert_eq!(count, MAX_BODY_FETCH as u64 + 1);
            assert_eq!(max, MAX_BODY_FETCH);
        }
        other => panic!("expected TooManyItems, got {other:?}"),
    }
}

#[test]
fn signed_transactions_enter_the_pool() {
    let c = chain();
    let signer = HomesteadSigner::from_hex(&small_cfg().chain.bank_key_hex).unwrap();
    assert_eq!(signer.address(), c.bank());
    let next = c.bank_nonce();
    let pending = signer.sign_tx(transfer(next)).unwrap();
    let gapped = signer.sign_tx(transfer(next + 2)).unwrap();
    let stale = signer.sign_tx(transfer(0)).unwrap();
    let mut free = transfer(next + 1);
    free.gas_price = 0;
    let free = signer.sign_tx(free).unwrap();

    let mut srv = LightServer::new(&c);
    let reply = send(
        &mut srv,
        RequestBody::SendTx(vec![pending.clone(), gapped.clone(), stale, free, pending.clone()]),
    )
    .unwrap();
    assert_eq!(
        statuses(&reply.payload),
        vec![
            TxStatusCode::Pending as u8,
            TxStatusCode::Queued as u8,
            TxStatusCode::Error as u8,
            TxStatusCode::Error as u8,
            TxStatusCode::Error as u8,
        ]
    );
    assert_eq!(srv.pool().len(), 2);

    let included = c.tx_hashes()[0];
    let reply = send(
        &mut srv,
        RequestBody::TxStatus(vec![included, pending.hash(), gapped.hash(), H256::default()]),
    )
    .unwrap();
    assert_eq!(
        statuses(&reply.payload),
        vec![
            TxStatusCode::Included as u8,
            TxStatusCode::Pending as u8,
            TxStatusCode::Queued as u8,
            TxStatusCode::Unknown as u8,
        ]
    );
}

#[test]
fn tampered_signature_is_an_error_status() {
    let c = chain();
    let signer = HomesteadSigner::from_hex(&small_cfg().chain.bank_key_hex).unwrap();
    let mut tx = signer.sign_tx(transfer(c.bank_nonce())).unwrap();
    tx.v = 35;
    let mut srv = LightServer::new(&c);
    let reply = send(&mut srv, RequestBody::SendTx(vec![tx])).unwrap();
    assert_eq!(statuses(&reply.payload), vec![TxStatusCode::Error as u8]);
    assert!(srv.pool().is_empty());
}

#[test]
fn worked_example_runs_against_the_reference_chain() {
    let harness = Harness::new(HarnessConfig::default()).unwrap();
    let summary = harness.run(&[0u8; 100], None);
    assert_eq!(summary.accepted, 10);
    assert_eq!(summary.rejected, 0);
    assert_eq!(harness.run(&[0u8; 60], None).dispatched(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn arbitrary_inputs_never_crash_the_harness(input in proptest::collection::vec(any::<u8>(), 100..2048)) {
        let harness = Harness::new(small_cfg()).unwrap();
        let summary = harness.run(&input, None);
        prop_assert!(summary.dispatched() >= 1);
        prop_assert_eq!(summary.consumed, input.len());
    }
}

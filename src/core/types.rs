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

//! Fixed-width chain primitives and their RLP encoding.

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use sha3::{Digest, Keccak256};
use std::fmt;
use thiserror::Error;

/// Wire codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("rlp decode: {0}")]
    Decode(DecoderError),
    #[error("unexpected item count")]
    ItemCount,
}

impl From<DecoderError> for CodecError {
    fn from(e: DecoderError) -> Self {
        CodecError::Decode(e)
    }
}

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut h = Keccak256::new();
    h.update(data);
    let r = h.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&r);
    out
}

/// 256-bit hash type (32 bytes).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct H256([u8; 32]);

impl H256 {
    /// Width in bytes.
    pub const LEN: usize = 32;

    /// Construct from raw bytes.
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    /// Construct from a slice, right-aligning shorter input and keeping the
    /// trailing 32 bytes of longer input.
    pub fn from_slice_lossy(b: &[u8]) -> Self {
        let mut out = [0u8; 32];
        if b.len() >= 32 {
            out.copy_from_slice(&b[b.len() - 32..]);
        } else {
            out[32 - b.len()..].copy_from_slice(b);
        }
        Self(out)
    }

    /// Keccak-256 of `data` as a hash value.
    pub fn keccak(data: &[u8]) -> Self {
        Self(keccak256(data))
    }

    /// Return bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form, enough to correlate log lines.
        write!(f, "0x{}…", hex::encode(&self.0[..4]))
    }
}

impl Encodable for H256 {
    fn rlp_append(&self, s: &mut RlpStream) {
        self.0.as_slice().rlp_append(s);
    }
}

impl Decodable for H256 {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let b = rlp.data()?;
        if b.len() != 32 {
            return Err(DecoderError::RlpInvalidLength);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(b);
        Ok(Self(out))
    }
}

/// 160-bit account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Construct from raw bytes.
    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    /// Address holding `n` in its low eight bytes.
    pub fn from_low_u64(n: u64) -> Self {
        let mut out = [0u8; 20];
        out[12..].copy_from_slice(&n.to_be_bytes());
        Self(out)
    }

    /// Address of an uncompressed SEC1 public key (`0x04 || X || Y`).
    pub fn from_uncompressed_pubkey(pubkey: &[u8]) -> Option<Self> {
        if pubkey.len() != 65 || pubkey[0] != 0x04 {
            return None;
        }
        let h = keccak256(&pubkey[1..]);
        let mut out = [0u8; 20];
        out.copy_from_slice(&h[12..]);
        Some(Self(out))
    }

    /// Address of the contract created by `sender` at `nonce`.
    pub fn create(sender: &Address, nonce: u64) -> Self {
        let mut s = RlpStream::new_list(2);
        s.append(sender);
        s.append(&nonce);
        let h = keccak256(&s.out());
        let mut out = [0u8; 20];
        out.copy_from_slice(&h[12..]);
        Self(out)
    }

    /// Return bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Keccak-256 of the address, the account's key in the state trie.
    pub fn hash(&self) -> H256 {
        H256::keccak(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Encodable for Address {
    fn rlp_append(&self, s: &mut RlpStream) {
        self.0.as_slice().rlp_append(s);
    }
}

impl Decodable for Address {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let b = rlp.data()?;
        if b.len() != 20 {
            return Err(DecoderError::RlpInvalidLength);
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(b);
        Ok(Self(out))
    }
}

/// Block header of the reference chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Parent block hash.
    pub parent_hash: H256,
    /// Block number.
    pub number: u64,
    /// State root after this block.
    pub state_root: H256,
    /// Root over the block's transactions.
    pub tx_root: H256,
    /// Root over the block's receipts.
    pub receipt_root: H256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas used.
    pub gas_used: u64,
    /// Seconds since UNIX epoch.
    pub timestamp: u64,
}

impl Header {
    /// Block hash: Keccak-256 of the RLP header.
    pub fn hash(&self) -> H256 {
        H256::keccak(&rlp::encode(self))
    }
}

impl Encodable for Header {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(8);
        s.append(&self.parent_hash);
        s.append(&self.number);
        s.append(&self.state_root);
        s.append(&self.tx_root);
        s.append(&self.receipt_root);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
    }
}

impl Decodable for Header {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 8 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            parent_hash: rlp.val_at(0)?,
            number: rlp.val_at(1)?,
            state_root: rlp.val_at(2)?,
            tx_root: rlp.val_at(3)?,
            receipt_root: rlp.val_at(4)?,
            gas_limit: rlp.val_at(5)?,
            gas_used: rlp.val_at(6)?,
            timestamp: rlp.val_at(7)?,
        })
    }
}

/// Intrinsic gas of a plain value transfer.
pub const TX_GAS: u64 = 21_000;

/// Unsigned legacy transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxRequest {
    /// Sender nonce.
    pub nonce: u64,
    /// Price per gas unit in wei.
    pub gas_price: u128,
    /// Gas limit.
    pub gas: u64,
    /// Recipient; `None` creates a contract.
    pub to: Option<Address>,
    /// Transferred value in wei.
    pub value: u128,
    /// Call data or init code.
    pub data: Vec<u8>,
}

impl TxRequest {
    fn append_body(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        match &self.to {
            Some(a) => s.append(a),
            None => s.append_empty_data(),
        };
        s.append(&self.value);
        s.append(&self.data);
    }

    /// Homestead signing hash: `keccak(rlp([nonce, gas_price, gas, to, value, data]))`.
    pub fn signing_hash(&self) -> H256 {
        let mut s = RlpStream::new_list(6);
        self.append_body(&mut s);
        H256::keccak(&s.out())
    }
}

/// Signed legacy transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTx {
    /// Transaction body.
    pub tx: TxRequest,
    /// Recovery value (27 or 28 under Homestead rules).
    pub v: u64,
    /// Signature `r`.
    pub r: H256,
    /// Signature `s`.
    pub s: H256,
}

impl SignedTx {
    /// Transaction hash: Keccak-256 of the RLP transaction.
    pub fn hash(&self) -> H256 {
        H256::keccak(&rlp::encode(self))
    }
}

fn trimmed(b: &H256) -> &[u8] {
    let bytes = b.as_bytes();
    let first = bytes.iter().position(|x| *x != 0).unwrap_or(32);
    &bytes[first..]
}

impl Encodable for SignedTx {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(9);
        self.tx.append_body(s);
        s.append(&self.v);
        // r and s are scalars: minimal big-endian.
        s.append(&trimmed(&self.r));
        s.append(&trimmed(&self.s));
    }
}

impl Decodable for SignedTx {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let to_rlp = rlp.at(3)?;
        let to = if to_rlp.is_empty() {
            None
        } else {
            Some(to_rlp.as_val::<Address>()?)
        };
        let r: Vec<u8> = rlp.val_at(7)?;
        let s: Vec<u8> = rlp.val_at(8)?;
        if r.len() > 32 || s.len() > 32 {
            return Err(DecoderError::RlpIsTooBig);
        }
        Ok(Self {
            tx: TxRequest {
                nonce: rlp.val_at(0)?,
                gas_price: rlp.val_at(1)?,
                gas: rlp.val_at(2)?,
                to,
                value: rlp.val_at(4)?,
                data: rlp.val_at(5)?,
            },
            v: rlp.val_at(6)?,
            r: H256::from_slice_lossy(&r),
            s: H256::from_slice_lossy(&s),
        })
    }
}

/// Transaction receipt (status + cumulative gas).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// 1 on success.
    pub status: u8,
    /// Cumulative gas used in the block up to this transaction.
    pub cumulative_gas: u64,
}

impl Encodable for Receipt {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.status);
        s.append(&self.cumulative_gas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_tx_rlp_roundtrip_keeps_hash() {
        let tx = SignedTx {
            tx: TxRequest {
                nonce: 7,
                gas_price: 1_000_000_000,
                gas: 21_000,
                to: Some(Address::default()),
                value: 10_000,
                data: Vec::new(),
            },
            v: 27,
            r: H256::from_slice_lossy(&[1, 2, 3]),
            s: H256::from_bytes([9u8; 32]),
        };
        let enc = rlp::encode(&tx);
        let dec: SignedTx = rlp::decode(&enc).unwrap();
        assert_eq!(dec, tx);
        assert_eq!(dec.hash(), tx.hash());
    }

    #[test]
    fn contract_creation_has_empty_to() {
        let tx = SignedTx {
            tx: TxRequest { nonce: 0, gas_price: 0, gas: 200_000, to: None, value: 0, data: vec![0x60] },
            v: 28,
            r: H256::default(),
            s: H256::default(),
        };
        let dec: SignedTx = rlp::decode(&rlp::encode(&tx)).unwrap();
        assert!(dec.tx.to.is_none());
    }

    #[test]
    fn header_hash_changes_with_number() {
        let mut h = Header {
            parent_hash: H256::default(),
            number: 0,
            state_root: H256::default(),
            tx_root: H256::default(),
            receipt_root: H256::default(),
            gas_limit: 100_000_000,
            gas_used: 0,
            timestamp: 0,
        };
        let a = h.hash();
        h.number = 1;
        assert_ne!(a, h.hash());
    }

    #[test]
    fn fixed_width_values_count_once_inside_lists() {
        let hashes = vec![H256::from_bytes([1u8; 32]), H256::from_bytes([2u8; 32])];
        let enc = rlp::encode_list::<H256, _>(&hashes);
        assert_eq!(Rlp::new(&enc).item_count().unwrap(), 2);
        assert_eq!(rlp::decode_list::<H256>(&enc), hashes);

        let addrs = vec![Address::from_low_u64(1), Address::from_low_u64(2)];
        let enc = rlp::encode_list::<Address, _>(&addrs);
        assert_eq!(rlp::decode_list::<Address>(&enc), addrs);

        let h = Header {
            parent_hash: H256::from_bytes([3u8; 32]),
            number: 5,
            state_root: H256::from_bytes([4u8; 32]),
            tx_root: H256::default(),
            receipt_root: H256::default(),
            gas_limit: 100_000_000,
            gas_used: 21_000,
            timestamp: 50,
        };
        let back: Header = rlp::decode(&rlp::encode(&h)).unwrap();
        assert_eq!(back, h);
    }
}

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

//! Homestead (pre-EIP-155) transaction signing and sender recovery over secp256k1.
//!
//! Signing hash is `keccak(rlp([nonce, gas_price, gas, to, value, data]))`, `v` is
//! `27 + recovery_id`, and `s` must be in the lower half of the curve order.

use crate::core::types::{Address, SignedTx, TxRequest, H256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use thiserror::Error;
use zeroize::Zeroize;

/// Signer errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("invalid key encoding")]
    InvalidKey,
    #[error("crypto")]
    Crypto,
    #[error("bad signature")]
    BadSignature,
}

/// Transaction signing abstraction (injected into the fuzz driver).
pub trait TxSigner {
    /// Address the signer signs for.
    fn address(&self) -> Address;
    /// Sign a legacy transaction.
    fn sign_tx(&self, tx: TxRequest) -> Result<SignedTx, SignerError>;
}

impl<T: TxSigner + ?Sized> TxSigner for &T {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn sign_tx(&self, tx: TxRequest) -> Result<SignedTx, SignerError> {
        (**self).sign_tx(tx)
    }
}

/// In-memory secp256k1 key producing Homestead signatures.
pub struct HomesteadSigner {
    key: SigningKey,
    address: Address,
}

impl HomesteadSigner {
    /// Build from a hex-encoded 32-byte private key (optional `0x` prefix).
    pub fn from_hex(key_hex: &str) -> Result<Self, SignerError> {
        let trimmed = key_hex.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let mut raw = hex::decode(trimmed).map_err(|_| SignerError::InvalidKey)?;
        let res = Self::from_slice(&raw);
        raw.zeroize();
        res
    }

    /// Build from raw private key bytes.
    pub fn from_slice(raw: &[u8]) -> Result<Self, SignerError> {
        if raw.len() != 32 {
            return Err(SignerError::InvalidKey);
        }
        let key = SigningKey::from_slice(raw).map_err(|_| SignerError::InvalidKey)?;
        let address = address_of(key.verifying_key()).ok_or(SignerError::InvalidKey)?;
        Ok(Self { key, address })
    }
}

fn address_of(vk: &VerifyingKey) -> Option<Address> {
    let point = vk.to_encoded_point(false);
    Address::from_uncompressed_pubkey(point.as_bytes())
}

impl TxSigner for HomesteadSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_tx(&self, tx: TxRequest) -> Result<SignedTx, SignerError> {
        let sighash = tx.signing_hash();
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(sighash.as_bytes())
            .map_err(|_| SignerError::Crypto)?;
        // Homestead requires low-s; flipping s flips the y parity in recid.
        let (sig, recid) = match sig.normalize_s() {
            Some(low) => (low, RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced())),
            None => (sig, recid),
        };
        let (r, s) = sig.split_bytes();
        let mut rb = [0u8; 32];
        rb.copy_from_slice(&r);
        let mut sb = [0u8; 32];
        sb.copy_from_slice(&s);
        Ok(SignedTx {
            tx,
            v: 27 + u64::from(recid.to_byte()),
            r: H256::from_bytes(rb),
            s: H256::from_bytes(sb),
        })
    }
}

/// Recover the sender of a Homestead-signed transaction.
pub fn recover_sender(tx: &SignedTx) -> Result<Address, SignerError> {
    let recid = match tx.v {
        27 | 28 => (tx.v - 27) as u8,
        _ => return Err(SignerError::BadSignature),
    };
    let recid = RecoveryId::from_byte(recid).ok_or(SignerError::BadSignature)?;
    let sig = Signature::from_scalars(*tx.r.as_bytes(), *tx.s.as_bytes())
        .map_err(|_| SignerError::BadSignature)?;
    // Homestead rejects high-s signatures.
    if sig.normalize_s().is_some() {
        return Err(SignerError::BadSignature);
    }
    let sighash = tx.tx.signing_hash();
    let vk = VerifyingKey::recover_from_prehash(sighash.as_bytes(), &sig, recid)
        .map_err(|_| SignerError::BadSignature)?;
    address_of(&vk).ok_or(SignerError::BadSignature)
}

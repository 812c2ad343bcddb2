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

//! Byte-stream cursor turning a fuzz input into bounded draws.
//!
//! Widths are fixed so that a given input always yields the same draws:
//!
//! | draw | bytes |
//! |---|---|
//! | `random_byte`, `random_bool` | 1 |
//! | `random_int(b)`, `b <= 256` | 1 |
//! | `random_int(b)`, `b <= 65536` | 2, little-endian |
//! | `random_int(b)`, larger | 4, little-endian |
//! | `random_x(b)` | 2, little-endian |
//!
//! A zero bound yields 0 and consumes nothing. A draw that needs more bytes than
//! remain consumes the rest and yields zero. Once the offset reaches the end the
//! cursor is [`CursorState::Exhausted`] for good.

use crate::chain::ChainFixture;
use crate::core::types::H256;
use tracing::trace;

/// Raw width of a random block, account or transaction hash.
pub const HASH_DRAW_LEN: usize = 32;
/// Raw width of a random canonical-hash-trie key.
pub const CHT_KEY_DRAW_LEN: usize = 8;
/// Raw width of a random bloom-trie key.
pub const BLOOM_KEY_DRAW_LEN: usize = 10;

/// One in this many domain draws returns a known fixture entry.
const KNOWN_BIAS: usize = 3;

/// Cursor lifecycle. `Exhausted` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorState {
    /// Bytes remain.
    Active,
    /// Input consumed; every draw returns a default.
    Exhausted,
}

/// Cursor over one fuzz input.
#[derive(Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
    state: CursorState,
}

impl<'a> Cursor<'a> {
    /// Cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        let state = if buf.is_empty() {
            CursorState::Exhausted
        } else {
            CursorState::Active
        };
        Self { buf, offset: 0, state }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Current state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// True once the input is used up.
    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    fn exhaust(&mut self) {
        if self.state == CursorState::Active {
            trace!(offset = self.offset, len = self.buf.len(), "cursor exhausted");
        }
        self.offset = self.buf.len();
        self.state = CursorState::Exhausted;
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.state == CursorState::Exhausted {
            return None;
        }
        let end = match self.offset.checked_add(n) {
            Some(end) if end <= self.buf.len() => end,
            _ => {
                self.exhaust();
                return None;
            }
        };
        let out = &self.buf[self.offset..end];
        self.offset = end;
        if self.offset >= self.buf.len() {
            self.exhaust();
        }
        Some(out)
    }

    fn take_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(raw) = self.take(N) {
            out.copy_from_slice(raw);
        }
        out
    }

    /// One byte.
    pub fn random_byte(&mut self) -> u8 {
        self.take_array::<1>()[0]
    }

    /// Least significant bit of one byte.
    pub fn random_bool(&mut self) -> bool {
        self.random_byte() & 1 == 1
    }

    /// Value in `[0, bound)`.
    pub fn random_int(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        let raw = if bound <= 1 << 8 {
            usize::from(self.random_byte())
        } else if bound <= 1 << 16 {
            usize::from(u16::from_le_bytes(self.take_array()))
        } else {
            u32::from_le_bytes(self.take_array()) as usize
        };
        raw % bound
    }

    /// Count-like value in `[0, bound)`.
    pub fn random_x(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        u64::from(u16::from_le_bytes(self.take_array())) % bound
    }

    /// `n` raw bytes, zero-filled if the input runs out.
    pub fn read(&mut self, n: usize) -> Vec<u8> {
        if n == 0 {
            return Vec::new();
        }
        match self.take(n) {
            Some(raw) => raw.to_vec(),
            None => vec![0u8; n],
        }
    }

    fn pick<T: Clone>(&mut self, known: &[T]) -> Option<T> {
        let idx = self.random_int(known.len().saturating_mul(KNOWN_BIAS));
        known.get(idx).cloned()
    }

    /// Canonical hash of a block in `0..=chain_len`, or 32 random bytes.
    pub fn random_block_hash(&mut self, fixture: &impl ChainFixture) -> H256 {
        let known = usize::try_from(fixture.chain_len())
            .unwrap_or(usize::MAX)
            .saturating_add(1);
        let idx = self.random_int(known.saturating_mul(KNOWN_BIAS));
        if idx < known {
            if let Some(h) = fixture.canonical_hash(idx as u64) {
                return h;
            }
        }
        H256::from_slice_lossy(&self.read(HASH_DRAW_LEN))
    }

    /// Known account trie key, or 32 random bytes.
    pub fn random_addr_hash(&mut self, fixture: &impl ChainFixture) -> H256 {
        match self.pick(fixture.account_hashes()) {
            Some(h) => h,
            None => H256::from_slice_lossy(&self.read(HASH_DRAW_LEN)),
        }
    }

    /// Known included transaction hash, or 32 random bytes.
    pub fn random_tx_hash(&mut self, fixture: &impl ChainFixture) -> H256 {
        match self.pick(fixture.tx_hashes()) {
            Some(h) => h,
            None => H256::from_slice_lossy(&self.read(HASH_DRAW_LEN)),
        }
    }

    /// Known canonical-hash-trie key, or 8 random bytes.
    pub fn random_cht_key(&mut self, fixture: &impl ChainFixture) -> Vec<u8> {
        match self.pick(fixture.cht_keys()) {
            Some(k) => k,
            None => self.read(CHT_KEY_DRAW_LEN),
        }
    }

    /// Known bloom-trie key, or 10 random bytes.
    pub fn random_bloom_key(&mut self, fixture: &impl ChainFixture) -> Vec<u8> {
        match self.pick(fixture.bloom_keys()) {
            Some(k) => k,
            None => self.read(BLOOM_KEY_DRAW_LEN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_follow_bound() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
        let mut c = Cursor::new(&buf);
        assert_eq!(c.random_int(256), 1);
        assert_eq!(c.offset(), 1);
        assert_eq!(c.random_int(65536), 0x0302);
        assert_eq!(c.offset(), 3);
        assert_eq!(c.random_int(1 << 20), 0x0706_0504 % (1 << 20));
        assert_eq!(c.offset(), 7);
        assert_eq!(c.random_x(1000), 0x0908 % 1000);
        assert!(c.is_exhausted());
    }

    #[test]
    fn zero_bound_consumes_nothing() {
        let mut c = Cursor::new(&[0xff]);
        assert_eq!(c.random_int(0), 0);
        assert_eq!(c.random_x(0), 0);
        assert_eq!(c.offset(), 0);
        assert_eq!(c.state(), CursorState::Active);
    }

    #[test]
    fn short_draw_exhausts_and_yields_zero() {
        let mut c = Cursor::new(&[0xff, 0xff, 0xff]);
        assert_eq!(c.random_byte(), 0xff);
        assert_eq!(c.read(4), vec![0u8; 4]);
        assert!(c.is_exhausted());
        assert_eq!(c.offset(), 3);
        assert_eq!(c.random_byte(), 0);
        assert!(!c.random_bool());
    }

    #[test]
    fn empty_input_starts_exhausted() {
        let c = Cursor::new(&[]);
        assert_eq!(c.state(), CursorState::Exhausted);
    }
}

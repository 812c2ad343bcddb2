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

//! Fuzz source and driver, plus the harness wiring them to the reference chain.

pub mod cursor;
pub mod driver;

pub use cursor::{Cursor, CursorState};
pub use driver::{Fuzzer, RunSummary};

use crate::chain::fixture::FixtureError;
use crate::chain::TestChain;
use crate::config::HarnessConfig;
use crate::core::signer::HomesteadSigner;
use crate::les::server::LightServer;
use crate::monitoring::metrics::Metrics;
use std::sync::Arc;

/// Reference chain and bank signer, built once and shared across inputs.
pub struct Harness {
    chain: TestChain,
    signer: HomesteadSigner,
    cfg: HarnessConfig,
}

impl Harness {
    /// Validate `cfg` and build the chain it describes.
    pub fn new(cfg: HarnessConfig) -> Result<Self, FixtureError> {
        cfg.validate()?;
        let chain = TestChain::build(&cfg.chain)?;
        let signer = HomesteadSigner::from_hex(&cfg.chain.bank_key_hex)?;
        Ok(Self { chain, signer, cfg })
    }

    /// The reference chain.
    pub fn chain(&self) -> &TestChain {
        &self.chain
    }

    /// Run one input against a fresh light server.
    pub fn run(&self, input: &[u8], metrics: Option<Arc<Metrics>>) -> RunSummary {
        let server = LightServer::new(&self.chain);
        let mut fuzzer = Fuzzer::new(&self.chain, &self.signer, server).with_config(&self.cfg);
        if let Some(m) = metrics {
            fuzzer = fuzzer.with_metrics(m);
        }
        fuzzer.run(input)
    }
}

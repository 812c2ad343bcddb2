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

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lightfuzz::chain::TestChain;
use lightfuzz::config::ChainConfig;
use lightfuzz::les::{LightServer, MessageKind, MessagePipeline};
use std::sync::OnceLock;

#[derive(Clone, Debug, Arbitrary)]
struct Input {
    kind: u8,
    version: u8,
    payload: Vec<u8>,
}

static CHAIN: OnceLock<TestChain> = OnceLock::new();

fuzz_target!(|inp: Input| {
    let chain = CHAIN
        .get_or_init(|| TestChain::build(&ChainConfig::default()).expect("default reference chain"));
    // Mostly known request codes, sometimes anything.
    let code = match MessageKind::from_index(usize::from(inp.kind % 10)) {
        Some(k) => k.code(),
        None => u64::from(inp.kind),
    };
    let mut server = LightServer::new(chain);
    let _ = server.handle(code, u64::from(inp.version % 6), &inp.payload);
});

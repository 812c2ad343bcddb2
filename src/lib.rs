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

//! lightfuzz - generative fuzzing harness for the light client wire protocol.
//!
//! This crate provides:
//! - A byte-stream cursor turning fuzz input into bounded, deterministic draws
//! - A driver generating the eight light protocol requests and dispatching them
//! - A deterministic reference chain with Merkle proofs for the serving side
//! - An in-process light server and transaction pool as the target pipeline
//! - Monitoring via Prometheus counters and structured logging

/// Deterministic reference chain.
pub mod chain;
/// Harness configuration.
pub mod config;
/// Primitive types, signing and Merkle tries.
pub mod core;
/// Byte-stream cursor and generate/dispatch driver.
pub mod fuzzing;
/// Light protocol packets, limits and server.
pub mod les;
/// Observability (metrics, structured logging helpers).
pub mod monitoring;

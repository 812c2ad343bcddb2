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

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
    #[error("encode")]
    Encode,
}

/// Harness counters.
#[derive(Clone)]
pub struct Metrics {
    /// Registry.
    pub registry: Registry,

    /// Messages handed to the pipeline, by kind.
    pub dispatched_total: IntCounterVec,
    /// Messages the pipeline served.
    pub accepted_total: IntCounter,
    /// Messages the pipeline rejected with a protocol error.
    pub rejected_total: IntCounter,
    /// Inputs below the minimum length.
    pub skipped_inputs_total: IntCounter,
    /// Transactions signed for `SendTxV2`.
    pub signed_txs_total: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, MetricsError> {
    let c = IntCounter::new(name, help).map_err(|_| MetricsError::Prom)?;
    registry
        .register(Box::new(c.clone()))
        .map_err(|_| MetricsError::Prom)?;
    Ok(c)
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let dispatched_total = IntCounterVec::new(
            Opts::new("lightfuzz_dispatched_total", "Messages dispatched"),
            &["kind"],
        )
        .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(dispatched_total.clone()))
            .map_err(|_| MetricsError::Prom)?;

        let accepted_total = counter(&registry, "lightfuzz_accepted_total", "Messages served")?;
        let rejected_total =
            counter(&registry, "lightfuzz_rejected_total", "Messages rejected")?;
        let skipped_inputs_total = counter(
            &registry,
            "lightfuzz_skipped_inputs_total",
            "Inputs below the minimum length",
        )?;
        let signed_txs_total =
            counter(&registry, "lightfuzz_signed_txs_total", "Transactions signed")?;

        Ok(Self {
            registry,
            dispatched_total,
            accepted_total,
            rejected_total,
            skipped_inputs_total,
            signed_txs_total,
        })
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| MetricsError::Encode)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lists_counters() {
        let m = Metrics::new().unwrap();
        m.dispatched_total.with_label_values(&["GetCode"]).inc();
        m.accepted_total.inc();
        let text = m.render().unwrap();
        assert!(text.contains("lightfuzz_dispatched_total{kind=\"GetCode\"} 1"));
        assert!(text.contains("lightfuzz_accepted_total 1"));
    }
}

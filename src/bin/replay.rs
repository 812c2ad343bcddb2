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

//! Replays fuzz inputs through the harness.
//!
//! Usage: `lightfuzz-replay [--config path] [--json] <file>...`

use anyhow::{bail, Context, Result};
use lightfuzz::config::HarnessConfig;
use lightfuzz::fuzzing::Harness;
use lightfuzz::monitoring::{logging, metrics::Metrics};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    json: bool,
    files: Vec<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        json: false,
        files: Vec::new(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--config" => {
                let path = it.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--json" => args.json = true,
            s if s.starts_with("--") => bail!("unknown flag {s}"),
            _ => args.files.push(PathBuf::from(a)),
        }
    }
    if args.files.is_empty() {
        bail!("usage: lightfuzz-replay [--config path] [--json] <file>...");
    }
    Ok(args)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    logging::init(args.json);

    let cfg = match &args.config {
        Some(p) => HarnessConfig::load(p).with_context(|| format!("config {}", p.display()))?,
        None => HarnessConfig::default(),
    };
    let harness = Harness::new(cfg).context("build reference chain")?;
    info!(head = harness.chain().head_number(), "reference chain ready");
    let metrics = Arc::new(Metrics::new()?);

    for path in &args.files {
        let input = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let summary = harness.run(&input, Some(metrics.clone()));
        info!(
            file = %path.display(),
            skipped = summary.skipped,
            dispatched = summary.dispatched(),
            accepted = summary.accepted,
            rejected = summary.rejected,
            consumed = summary.consumed,
            "replayed"
        );
    }

    print!("{}", metrics.render()?);
    Ok(())
}

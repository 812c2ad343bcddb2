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

use lightfuzz::chain::fixture::FixtureError;
use lightfuzz::config::{ConfigError, HarnessConfig, VersionRange};
use lightfuzz::fuzzing::Harness;
use std::io::Write;

#[test]
fn config_file_drives_the_harness() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lightfuzz.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "min_input_len = 16\n\n[chain]\nchain_len = 8\n\n[versions]\nmin = 3\nmax = 3").unwrap();
    drop(f);

    let cfg = HarnessConfig::load(&path).unwrap();
    assert_eq!(cfg.min_input_len, 16);
    assert_eq!(cfg.versions.span(), 1);

    let harness = Harness::new(cfg).unwrap();
    let summary = harness.run(&[0u8; 16], None);
    assert!(!summary.skipped);
    assert!(summary.accepted >= 1);
}

#[test]
fn harness_rejects_unvalidated_version_ranges() {
    for versions in [
        VersionRange { min: 0, max: u64::MAX },
        VersionRange { min: 9, max: 2 },
    ] {
        let cfg = HarnessConfig {
            versions,
            ..HarnessConfig::default()
        };
        assert!(matches!(
            Harness::new(cfg),
            Err(FixtureError::Config(ConfigError::BadVersions))
        ));
    }
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        HarnessConfig::load(dir.path().join("absent.toml")),
        Err(ConfigError::Read)
    ));
}

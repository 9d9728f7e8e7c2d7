// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging setup shared by the binary and tests.

use tracing_subscriber::EnvFilter;

/// Create an environment filter based on verbosity level.
///
/// The default level is `info`, which keeps the audit trail of failed
/// authentication, blocks and accepted writes. `RUST_LOG` takes precedence
/// when set.
pub fn create_env_filter(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_directives(verbosity))
    }
}

fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "spaceapi=info,spaceapi_server=info",
        1 => "spaceapi=debug,spaceapi_server=debug",
        // -vv: include request tracing from axum
        2 => "spaceapi=debug,spaceapi_server=debug,axum=debug",
        _ => "spaceapi=trace,spaceapi_server=trace,axum=trace,tower=debug",
    }
}

/// Initialize console logging.
///
/// Must be called at most once per process.
pub fn init_logging(verbosity: u8) {
    let filter = create_env_filter(verbosity);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

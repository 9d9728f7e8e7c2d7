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

//! Security module for the SpaceAPI server.
//!
//! - [`AuthRateLimiter`]: failed-attempt tracking with temporary blocks
//! - [`AuthGate`]: API key check in front of the write routes
//!
//! # Example
//!
//! ```
//! use spaceapi::server::security::{AuthRateLimitConfig, AuthRateLimiter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let limiter = AuthRateLimiter::new(AuthRateLimitConfig::default());
//!
//!     if limiter.is_blocked("192.168.1.100").await {
//!         println!("client is blocked");
//!         return;
//!     }
//!
//!     // On auth failure
//!     if limiter.record_failure("192.168.1.100").await {
//!         println!("client has been blocked");
//!     }
//! }
//! ```

mod gate;
mod rate_limit;

pub use gate::{
    extract_api_key, require_api_key, AuthGate, ClientId, API_KEY_HEADER, FORWARDED_FOR_HEADER,
};
pub use rate_limit::{AttemptRecord, AuthRateLimitConfig, AuthRateLimiter, MAX_DURATION};

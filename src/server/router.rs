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

//! Axum router configuration.
//!
//! ```text
//! /
//! ├── GET  /                               - SpaceAPI document
//! ├── GET  /health                         - liveness check
//! ├── GET  /api/space                      - SpaceAPI document
//! └── POST /api/space/*                    - writes, behind the API key gate
//!     ├── /state
//!     ├── /people
//!     ├── /event
//!     └── /sensors/{category}
//! ```

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;

use super::cors::cors;
use super::handlers::{
    add_event, get_space, health, update_people, update_sensor, update_state,
};
use super::security::{require_api_key, AuthGate};
use crate::document::StatusStore;

/// Build the complete router.
pub fn build_router(store: StatusStore, gate: AuthGate, cors_enabled: bool) -> Router {
    let router = Router::new()
        .merge(read_router())
        .merge(write_router(gate))
        .with_state(store);

    if cors_enabled {
        router.layer(from_fn(cors))
    } else {
        router
    }
}

/// Unauthenticated read routes.
fn read_router() -> Router<StatusStore> {
    Router::new()
        .route("/", get(get_space))
        .route("/health", get(health))
        .route("/api/space", get(get_space))
}

/// Write routes; every one of them passes through the API key gate.
fn write_router(gate: AuthGate) -> Router<StatusStore> {
    Router::new()
        .route("/api/space/state", post(update_state))
        .route("/api/space/people", post(update_people))
        .route("/api/space/event", post(add_event))
        .route("/api/space/sensors/{category}", post(update_sensor))
        .route_layer(from_fn_with_state(gate, require_api_key))
}

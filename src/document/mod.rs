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

//! The SpaceAPI status document.
//!
//! The document is loaded once at startup and then owned by a [`StatusStore`],
//! which serializes every read and mutation behind a single lock.

mod model;
mod store;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use model::{
    Area, Contact, Event, Feed, Feeds, Icon, Keymaster, Link, LinkedSpace, Location,
    MembershipPlan, SensorKind, SensorValue, Sensors, SpaceApi, Spacefed, State,
};
pub use store::{
    EventInput, SensorUpdate, StateUpdate, StatusStore, DEFAULT_SENSOR_LOCATION, MAX_EVENTS,
};

/// Errors raised while loading the initial document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load a SpaceAPI document from a JSON file.
pub fn load_document(path: &Path) -> Result<SpaceApi, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

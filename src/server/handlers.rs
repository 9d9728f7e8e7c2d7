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

//! HTTP handlers for the status API.
//!
//! Write handlers parse the raw body themselves so that malformed or
//! mismatched JSON is always reported as 400 before the document is touched.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::de::DeserializeOwned;

use crate::document::{
    Event, EventInput, SensorKind, SensorUpdate, SensorValue, SpaceApi, State as SpaceState,
    StateUpdate, StatusStore,
};
use crate::server::error::ApiError;
use crate::server::security::ClientId;

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

/// `GET /` and `GET /api/space`: the full document.
pub async fn get_space(State(store): State<StatusStore>) -> Json<SpaceApi> {
    Json(store.snapshot().await)
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

/// `POST /api/space/state`: partial update of the state section.
pub async fn update_state(
    State(store): State<StatusStore>,
    Extension(client): Extension<ClientId>,
    body: Bytes,
) -> Result<Json<SpaceState>, ApiError> {
    let update: StateUpdate = parse_body(&body)?;
    let state = store.update_state(update).await;

    tracing::info!(
        client = %client,
        open = ?state.open,
        state_message = state.message.as_deref().unwrap_or_default(),
        trigger_person = state.trigger_person.as_deref().unwrap_or_default(),
        "Space state updated"
    );

    Ok(Json(state))
}

/// `POST /api/space/people`: upsert a people counter reading.
pub async fn update_people(
    State(store): State<StatusStore>,
    Extension(client): Extension<ClientId>,
    body: Bytes,
) -> Result<Json<Vec<SensorValue>>, ApiError> {
    upsert(store, client, SensorKind::PeopleNowPresent, &body).await
}

/// `POST /api/space/sensors/{category}`: upsert a reading of any category.
pub async fn update_sensor(
    State(store): State<StatusStore>,
    Extension(client): Extension<ClientId>,
    Path(category): Path<String>,
    body: Bytes,
) -> Result<Json<Vec<SensorValue>>, ApiError> {
    let kind: SensorKind = category.parse().map_err(ApiError::UnknownSensor)?;
    upsert(store, client, kind, &body).await
}

async fn upsert(
    store: StatusStore,
    client: ClientId,
    kind: SensorKind,
    body: &Bytes,
) -> Result<Json<Vec<SensorValue>>, ApiError> {
    let update: SensorUpdate = parse_body(body)?;
    let location = update.location().to_string();
    let value = update.value.clone();
    let readings = store.upsert_sensor(kind, update).await;

    tracing::info!(
        client = %client,
        sensor = %kind,
        location = %location,
        value = %value,
        "Sensor reading updated"
    );

    Ok(Json(readings))
}

/// `POST /api/space/event`: append an event.
pub async fn add_event(
    State(store): State<StatusStore>,
    Extension(client): Extension<ClientId>,
    body: Bytes,
) -> Result<Json<Event>, ApiError> {
    let input: EventInput = parse_body(&body)?;
    let event = store.append_event(input).await;

    tracing::info!(
        client = %client,
        name = %event.name,
        kind = %event.kind,
        "Event added"
    );

    Ok(Json(event))
}

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

//! Shared, lock-guarded status document.
//!
//! Every operation takes the lock once and releases it before returning, so
//! callers never hold it across network I/O.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::model::{Event, SensorKind, SensorValue, Sensors, SpaceApi, State};

/// Number of events kept in the document. Older events are dropped first.
pub const MAX_EVENTS: usize = 10;

/// Location used for sensor updates that do not name one.
pub const DEFAULT_SENSOR_LOCATION: &str = "Main Space";

/// Partial update of the state section.
///
/// Absent fields are left unchanged. Empty strings for `message` and
/// `trigger_person` are treated as absent; `open: false` is a real value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateUpdate {
    #[serde(default)]
    pub open: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub trigger_person: Option<String>,
}

/// Upsert of a single sensor reading.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorUpdate {
    pub value: serde_json::Number,
    #[serde(default)]
    pub location: Option<String>,
}

impl SensorUpdate {
    /// Location this update targets, falling back to [`DEFAULT_SENSOR_LOCATION`].
    pub fn location(&self) -> &str {
        match self.location.as_deref() {
            Some(location) if !location.is_empty() => location,
            _ => DEFAULT_SENSOR_LOCATION,
        }
    }
}

/// New event as submitted by a client. Any client timestamp is ignored.
///
/// Missing `name` or `type` fields decode as empty strings.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub extra: Option<String>,
}

/// Thread-safe handle to the status document.
#[derive(Debug, Clone)]
pub struct StatusStore {
    document: Arc<RwLock<SpaceApi>>,
}

impl StatusStore {
    pub fn new(document: SpaceApi) -> Self {
        Self {
            document: Arc::new(RwLock::new(document)),
        }
    }

    /// Copy of the whole document as of now.
    pub async fn snapshot(&self) -> SpaceApi {
        self.document.read().await.clone()
    }

    /// Apply a partial state update and stamp `lastchange`.
    ///
    /// Returns the resulting state section.
    pub async fn update_state(&self, update: StateUpdate) -> State {
        let mut doc = self.document.write().await;
        let state = doc.state.get_or_insert_with(State::default);

        if let Some(open) = update.open {
            state.open = Some(open);
        }
        if let Some(message) = update.message.filter(|m| !m.is_empty()) {
            state.message = Some(message);
        }
        if let Some(trigger) = update.trigger_person.filter(|t| !t.is_empty()) {
            state.trigger_person = Some(trigger);
        }
        state.lastchange = Some(Utc::now().timestamp());

        state.clone()
    }

    /// Overwrite the reading at the update's location, or append a new one.
    ///
    /// Returns every reading of the category after the change.
    pub async fn upsert_sensor(&self, kind: SensorKind, update: SensorUpdate) -> Vec<SensorValue> {
        let now = Utc::now().timestamp();
        let location = update.location().to_string();
        let value = serde_json::Value::Number(update.value);

        let mut doc = self.document.write().await;
        let readings = doc
            .sensors
            .get_or_insert_with(Sensors::default)
            .readings_mut(kind);

        match readings
            .iter_mut()
            .find(|r| r.location.as_deref() == Some(location.as_str()))
        {
            Some(reading) => {
                reading.value = value;
                reading.lastchange = Some(now);
            }
            None => readings.push(SensorValue {
                value,
                location: Some(location),
                name: kind.default_reading_name().map(str::to_string),
                lastchange: Some(now),
                ..Default::default()
            }),
        }

        readings.clone()
    }

    /// Append an event stamped with the current time, keeping the last
    /// [`MAX_EVENTS`] entries.
    pub async fn append_event(&self, input: EventInput) -> Event {
        let event = Event {
            name: input.name,
            kind: input.kind,
            timestamp: Utc::now().timestamp(),
            extra: input.extra,
        };

        let mut doc = self.document.write().await;
        doc.events.push(event.clone());
        if doc.events.len() > MAX_EVENTS {
            let excess = doc.events.len() - MAX_EVENTS;
            doc.events.drain(..excess);
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_document() -> SpaceApi {
        SpaceApi {
            api_compatibility: vec!["15".into()],
            space: "Test Space".into(),
            state: Some(State {
                open: Some(true),
                lastchange: Some(0),
                message: Some("A".into()),
                trigger_person: Some("Bob".into()),
                icon: None,
            }),
            ..Default::default()
        }
    }

    fn sensor(value: i64, location: Option<&str>) -> SensorUpdate {
        SensorUpdate {
            value: value.into(),
            location: location.map(str::to_string),
        }
    }

    fn event(name: &str) -> EventInput {
        EventInput {
            name: name.into(),
            kind: "check-in".into(),
            extra: None,
        }
    }

    #[tokio::test]
    async fn test_partial_state_update() {
        let store = StatusStore::new(open_document());
        let before = Utc::now().timestamp();

        let state = store
            .update_state(StateUpdate {
                message: Some("B".into()),
                ..Default::default()
            })
            .await;

        assert_eq!(state.open, Some(true));
        assert_eq!(state.message.as_deref(), Some("B"));
        assert_eq!(state.trigger_person.as_deref(), Some("Bob"));
        assert!(state.lastchange.unwrap() >= before);
        assert_eq!(store.snapshot().await.state, Some(state));
    }

    #[tokio::test]
    async fn test_state_update_false_is_applied_empty_strings_are_not() {
        let store = StatusStore::new(open_document());

        let state = store
            .update_state(StateUpdate {
                open: Some(false),
                message: Some(String::new()),
                trigger_person: Some(String::new()),
            })
            .await;

        assert_eq!(state.open, Some(false));
        assert_eq!(state.message.as_deref(), Some("A"));
        assert_eq!(state.trigger_person.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn test_empty_state_update_still_stamps_lastchange() {
        let store = StatusStore::new(open_document());

        let state = store.update_state(StateUpdate::default()).await;

        assert!(state.lastchange.unwrap() > 0);
        assert_eq!(state.open, Some(true));
    }

    #[tokio::test]
    async fn test_state_section_created_when_missing() {
        let store = StatusStore::new(SpaceApi::default());

        let state = store
            .update_state(StateUpdate {
                open: Some(true),
                ..Default::default()
            })
            .await;

        assert_eq!(state.open, Some(true));
        assert!(store.snapshot().await.state.is_some());
    }

    #[tokio::test]
    async fn test_sensor_upsert_appends_then_updates_in_place() {
        let store = StatusStore::new(open_document());

        let readings = store
            .upsert_sensor(SensorKind::PeopleNowPresent, sensor(5, Some("Roof")))
            .await;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, serde_json::json!(5));
        assert_eq!(readings[0].name.as_deref(), Some("People Counter"));

        let readings = store
            .upsert_sensor(SensorKind::PeopleNowPresent, sensor(9, Some("Roof")))
            .await;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, serde_json::json!(9));
        assert_eq!(readings[0].location.as_deref(), Some("Roof"));
    }

    #[tokio::test]
    async fn test_sensor_default_location() {
        let store = StatusStore::new(open_document());

        store
            .upsert_sensor(SensorKind::PeopleNowPresent, sensor(1, None))
            .await;
        let readings = store
            .upsert_sensor(SensorKind::PeopleNowPresent, sensor(2, Some("")))
            .await;

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].location.as_deref(), Some(DEFAULT_SENSOR_LOCATION));
        assert_eq!(readings[0].value, serde_json::json!(2));
    }

    #[tokio::test]
    async fn test_sensor_categories_are_independent() {
        let store = StatusStore::new(open_document());

        store
            .upsert_sensor(SensorKind::Temperature, sensor(21, Some("Lab")))
            .await;
        let people = store
            .upsert_sensor(SensorKind::PeopleNowPresent, sensor(3, Some("Lab")))
            .await;

        assert_eq!(people.len(), 1);
        let sensors = store.snapshot().await.sensors.unwrap();
        assert_eq!(sensors.temperature.len(), 1);
        assert_eq!(sensors.temperature[0].name, None);
    }

    #[tokio::test]
    async fn test_event_append_keeps_last_ten() {
        let mut doc = open_document();
        doc.events.push(Event {
            name: "original".into(),
            kind: "check-in".into(),
            timestamp: 1,
            extra: None,
        });
        let store = StatusStore::new(doc);

        for i in 0..12 {
            store.append_event(event(&format!("event-{i}"))).await;
        }

        let events = store.snapshot().await.events;
        assert_eq!(events.len(), MAX_EVENTS);
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        let expected: Vec<String> = (2..12).map(|i| format!("event-{i}")).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_event_timestamp_assigned_by_server() {
        let store = StatusStore::new(SpaceApi::default());
        let before = Utc::now().timestamp();

        let input: EventInput = serde_json::from_str(
            r#"{"name":"alice","type":"check-in","timestamp":42,"extra":"hello"}"#,
        )
        .unwrap();
        let event = store.append_event(input).await;

        assert!(event.timestamp >= before);
        assert_eq!(event.extra.as_deref(), Some("hello"));
    }

    #[test]
    fn test_sensor_update_requires_numeric_value() {
        assert!(serde_json::from_str::<SensorUpdate>(r#"{"value":"five"}"#).is_err());
        assert!(serde_json::from_str::<SensorUpdate>(r#"{"location":"Roof"}"#).is_err());
        assert!(serde_json::from_str::<SensorUpdate>(r#"{"value":2.5}"#).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_event_appends() {
        let store = StatusStore::new(SpaceApi::default());

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append_event(event(&i.to_string())).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.snapshot().await.events.len(), MAX_EVENTS);
    }
}

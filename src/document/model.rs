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

//! SpaceAPI v15 document types.
//!
//! Optional and empty fields are omitted on output so a document round-trips
//! close to the file it was loaded from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root of the SpaceAPI document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpaceApi {
    #[serde(default)]
    pub api_compatibility: Vec<String>,
    #[serde(default)]
    pub space: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacefed: Option<Spacefed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cam: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensors: Option<Sensors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feeds: Option<Feeds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub membership_plans: Vec<MembershipPlan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_spaces: Vec<LinkedSpace>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub areas: Vec<Area>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub square_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Spacefed {
    #[serde(default)]
    pub spacenet: bool,
    #[serde(default)]
    pub spacesaml: bool,
}

/// Current open/closed state of the space.
///
/// `open` is tri-state: `None` means unknown and is written out as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub open: Option<bool>,
    /// Unix timestamp of the last change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastchange: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Icon {
    pub open: String,
    pub closed: String,
}

/// Something that happened in the space (check-in, door opened, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Unix timestamp, always assigned by the server.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sip: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keymasters: Vec<Keymaster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastodon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identica: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foursquare: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmpp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_mail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Keymaster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irc_nick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmpp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastodon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<String>,
}

/// Sensor readings, one list per category.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sensors {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temperature: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub door_locked: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub barometer: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub radiation: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub humidity: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub beverage_supply: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub power_consumption: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wind: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_connections: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub account_balance: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub total_member_count: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub people_now_present: Vec<SensorValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_traffic: Vec<SensorValue>,
}

impl Sensors {
    /// Mutable readings of one category.
    pub fn readings_mut(&mut self, kind: SensorKind) -> &mut Vec<SensorValue> {
        match kind {
            SensorKind::Temperature => &mut self.temperature,
            SensorKind::DoorLocked => &mut self.door_locked,
            SensorKind::Barometer => &mut self.barometer,
            SensorKind::Radiation => &mut self.radiation,
            SensorKind::Humidity => &mut self.humidity,
            SensorKind::BeverageSupply => &mut self.beverage_supply,
            SensorKind::PowerConsumption => &mut self.power_consumption,
            SensorKind::Wind => &mut self.wind,
            SensorKind::NetworkConnections => &mut self.network_connections,
            SensorKind::AccountBalance => &mut self.account_balance,
            SensorKind::TotalMemberCount => &mut self.total_member_count,
            SensorKind::PeopleNowPresent => &mut self.people_now_present,
            SensorKind::NetworkTraffic => &mut self.network_traffic,
        }
    }
}

/// A single sensor reading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorValue {
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastchange: Option<i64>,
}

/// Sensor categories defined by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperature,
    DoorLocked,
    Barometer,
    Radiation,
    Humidity,
    BeverageSupply,
    PowerConsumption,
    Wind,
    NetworkConnections,
    AccountBalance,
    TotalMemberCount,
    PeopleNowPresent,
    NetworkTraffic,
}

impl SensorKind {
    pub const ALL: [SensorKind; 13] = [
        SensorKind::Temperature,
        SensorKind::DoorLocked,
        SensorKind::Barometer,
        SensorKind::Radiation,
        SensorKind::Humidity,
        SensorKind::BeverageSupply,
        SensorKind::PowerConsumption,
        SensorKind::Wind,
        SensorKind::NetworkConnections,
        SensorKind::AccountBalance,
        SensorKind::TotalMemberCount,
        SensorKind::PeopleNowPresent,
        SensorKind::NetworkTraffic,
    ];

    /// Field name of the category in the document.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::DoorLocked => "door_locked",
            SensorKind::Barometer => "barometer",
            SensorKind::Radiation => "radiation",
            SensorKind::Humidity => "humidity",
            SensorKind::BeverageSupply => "beverage_supply",
            SensorKind::PowerConsumption => "power_consumption",
            SensorKind::Wind => "wind",
            SensorKind::NetworkConnections => "network_connections",
            SensorKind::AccountBalance => "account_balance",
            SensorKind::TotalMemberCount => "total_member_count",
            SensorKind::PeopleNowPresent => "people_now_present",
            SensorKind::NetworkTraffic => "network_traffic",
        }
    }

    /// Name given to readings created through an upsert.
    pub fn default_reading_name(&self) -> Option<&'static str> {
        match self {
            SensorKind::PeopleNowPresent => Some("People Counter"),
            _ => None,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feeds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog: Option<Feed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki: Option<Feed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<Feed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flickr: Option<Feed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feed {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MembershipPlan {
    pub name: String,
    pub value: f64,
    pub currency: String,
    pub billing_interval: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkedSpace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

//! JSON shapes returned by the Telldus Live and local TellStick APIs.
//!
//! The two APIs are loose about types: ids, states and scales arrive as
//! numbers from one server and as strings from the other. The deserializers
//! here accept both.

use serde::{Deserialize, Deserializer};

use tellduslive_types::{
    BatteryStatus, Device, DeviceKind, Method, Methods, Parameter, SensorItem,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Loose {
    fn into_string(self) -> String {
        match self {
            Loose::Str(s) => s,
            Loose::Int(i) => i.to_string(),
            Loose::Float(f) => f.to_string(),
            Loose::Bool(b) => u8::from(b).to_string(),
        }
    }

    fn into_u32(self) -> Option<u32> {
        match self {
            Loose::Str(s) => s.trim().parse().ok(),
            Loose::Int(i) => u32::try_from(i).ok(),
            Loose::Float(f) if f >= 0.0 && f <= f64::from(u32::MAX) => Some(f as u32),
            Loose::Float(_) => None,
            Loose::Bool(b) => Some(u32::from(b)),
        }
    }
}

fn loose_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Loose::deserialize(d).map(Loose::into_string)
}

fn loose_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Loose>::deserialize(d)?.map(Loose::into_string))
}

fn loose_opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(Option::<Loose>::deserialize(d)?.and_then(Loose::into_u32))
}

fn loose_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(loose_opt_u32(d)?.unwrap_or_default())
}

/// Body of `devices/list`.
#[derive(Debug, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub device: Option<Vec<RawDevice>>,
}

/// Body of `sensors/list`.
#[derive(Debug, Deserialize)]
pub struct SensorList {
    #[serde(default)]
    pub sensor: Option<Vec<RawSensor>>,
}

/// One entry of `devices/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDevice {
    #[serde(deserialize_with = "loose_string")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_u32")]
    pub state: Option<u32>,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub statevalue: Option<String>,
    #[serde(default, deserialize_with = "loose_u32")]
    pub methods: u32,
    /// Kept as text; see [`BatteryStatus::from_reported`].
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub battery: Option<String>,
}

/// Body of `device/info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDeviceInfo {
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub model: Option<String>,
    #[serde(default)]
    pub parameter: Vec<RawParameter>,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub client: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParameter {
    #[serde(deserialize_with = "loose_string")]
    pub name: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub value: String,
}

/// One entry of `sensors/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSensor {
    #[serde(deserialize_with = "loose_string")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub sensor_id: Option<String>,
    /// Kept as text; see [`BatteryStatus::from_reported`].
    #[serde(default, deserialize_with = "loose_opt_string")]
    pub battery: Option<String>,
    /// Absent for sensors that have never reported.
    #[serde(default)]
    pub data: Option<Vec<RawSensorItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSensorItem {
    #[serde(deserialize_with = "loose_string")]
    pub name: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub value: String,
    #[serde(default, deserialize_with = "loose_u32")]
    pub scale: u32,
}

/// Body of a device command.
#[derive(Debug, Deserialize)]
pub struct CommandStatus {
    #[serde(default)]
    pub status: Option<String>,
}

impl CommandStatus {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Body of the local API token endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expires: Option<i64>,
    #[serde(default)]
    pub auth_url: Option<String>,
}

impl RawDevice {
    /// Build a device, taking the protocol details from `info`.
    pub fn into_device(self, info: RawDeviceInfo) -> Device {
        let state = self.state.and_then(|bits| match Method::try_from(bits) {
            Ok(method) => Some(method),
            Err(e) => {
                tracing::debug!("Device {}: {}", self.id, e);
                None
            }
        });

        Device {
            id: self.id,
            name: self.name.unwrap_or_default(),
            protocol: info.protocol,
            model: info.model,
            client_id: info.client,
            battery: self.battery.as_deref().map(BatteryStatus::from_reported),
            kind: DeviceKind::Actuator {
                state,
                state_value: self.statevalue,
                methods: Methods::from_bits(self.methods),
                parameters: info
                    .parameter
                    .into_iter()
                    .map(|p| Parameter::new(p.name, p.value))
                    .collect(),
            },
        }
    }
}

impl RawDeviceInfo {
    /// Protocol details of a device already in the snapshot.
    pub fn from_device(device: &Device) -> Self {
        Self {
            protocol: device.protocol.clone(),
            model: device.model.clone(),
            parameter: device
                .parameters()
                .iter()
                .map(|p| RawParameter {
                    name: p.name.clone(),
                    value: p.value.clone(),
                })
                .collect(),
            client: device.client_id.clone(),
        }
    }
}

impl RawSensor {
    pub fn into_device(self) -> Device {
        Device {
            id: self.id,
            name: self.name.unwrap_or_default(),
            protocol: self.protocol,
            model: self.model,
            client_id: self.client,
            battery: self.battery.as_deref().map(BatteryStatus::from_reported),
            kind: DeviceKind::Sensor {
                sensor_id: self.sensor_id,
                items: self
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .map(|i| SensorItem::new(i.name, i.value, i.scale))
                    .collect(),
            },
        }
    }
}

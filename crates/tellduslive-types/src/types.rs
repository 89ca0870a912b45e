//! Core types for Telldus devices and sensors.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseResult};

/// Name shown for devices the server reports without a name.
pub const UNNAMED_DEVICE: &str = "NO NAME";

/// Raw battery value reported for a low battery.
pub const BATTERY_LOW: u32 = 255;
/// Raw battery value reported when the battery state is unknown.
pub const BATTERY_UNKNOWN: u32 = 254;
/// Raw battery value reported for a healthy battery.
pub const BATTERY_OK: u32 = 253;

/// A Tellstick device method.
///
/// The discriminants are the bit values used by the Telldus API, both for the
/// `methods` bitmask of a device and for its last known `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[non_exhaustive]
#[repr(u32)]
pub enum Method {
    TurnOn = 1,
    TurnOff = 2,
    Bell = 4,
    Toggle = 8,
    Dim = 16,
    Learn = 32,
    Up = 128,
    Down = 256,
    Stop = 512,
    Rgbw = 1024,
    Thermostat = 2048,
}

impl Method {
    /// All methods, in ascending bit order.
    pub const ALL: [Method; 11] = [
        Method::TurnOn,
        Method::TurnOff,
        Method::Bell,
        Method::Toggle,
        Method::Dim,
        Method::Learn,
        Method::Up,
        Method::Down,
        Method::Stop,
        Method::Rgbw,
        Method::Thermostat,
    ];

    /// The bit value of this method.
    #[must_use]
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// The name of the method in API paths (`device/<name>`).
    ///
    /// ```
    /// use tellduslive_types::Method;
    ///
    /// assert_eq!(Method::TurnOn.api_name(), "turnOn");
    /// assert_eq!(Method::Stop.api_name(), "stop");
    /// ```
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            Method::TurnOn => "turnOn",
            Method::TurnOff => "turnOff",
            Method::Bell => "bell",
            Method::Toggle => "toggle",
            Method::Dim => "dim",
            Method::Learn => "learn",
            Method::Up => "up",
            Method::Down => "down",
            Method::Stop => "stop",
            Method::Rgbw => "rgbw",
            Method::Thermostat => "thermostat",
        }
    }
}

impl TryFrom<u32> for Method {
    type Error = ParseError;

    /// Convert a single bit value to a `Method`.
    ///
    /// ```
    /// use tellduslive_types::Method;
    ///
    /// assert_eq!(Method::try_from(1), Ok(Method::TurnOn));
    /// assert_eq!(Method::try_from(256), Ok(Method::Down));
    /// assert!(Method::try_from(3).is_err());
    /// ```
    fn try_from(value: u32) -> ParseResult<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.bits() == value)
            .ok_or(ParseError::UnknownMethodBits(value))
    }
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.api_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name().to_uppercase())
    }
}

/// A set of [`Method`]s, as carried in the `methods` field of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Methods(u32);

impl Methods {
    /// The methods this client asks the server to report.
    pub const SUPPORTED: Methods = Methods(
        Method::TurnOn as u32
            | Method::TurnOff as u32
            | Method::Dim as u32
            | Method::Up as u32
            | Method::Down as u32
            | Method::Stop as u32,
    );

    /// Create a set from a raw bitmask.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether `method` is in the set.
    #[must_use]
    pub fn contains(self, method: Method) -> bool {
        self.0 & method.bits() != 0
    }

    /// Iterate over the known methods in the set, in ascending bit order.
    pub fn iter(self) -> impl Iterator<Item = Method> {
        Method::ALL.into_iter().filter(move |m| self.contains(*m))
    }
}

impl From<Method> for Methods {
    fn from(method: Method) -> Self {
        Self(method.bits())
    }
}

impl fmt::Display for Methods {
    /// `TURNON|TURNOFF|DIM` style listing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Battery health reported by battery-powered devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BatteryStatus {
    Low,
    Unknown,
    Ok,
    /// Any other value, exactly as reported (typically a charge percentage).
    Level(String),
}

impl BatteryStatus {
    /// Interpret a numeric battery value from the API.
    ///
    /// ```
    /// use tellduslive_types::BatteryStatus;
    ///
    /// assert_eq!(BatteryStatus::from_raw(255), BatteryStatus::Low);
    /// assert_eq!(BatteryStatus::from_raw(254), BatteryStatus::Unknown);
    /// assert_eq!(BatteryStatus::from_raw(253), BatteryStatus::Ok);
    /// assert_eq!(BatteryStatus::from_raw(87), BatteryStatus::Level("87".into()));
    /// ```
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            BATTERY_LOW => BatteryStatus::Low,
            BATTERY_UNKNOWN => BatteryStatus::Unknown,
            BATTERY_OK => BatteryStatus::Ok,
            other => BatteryStatus::Level(other.to_string()),
        }
    }

    /// Interpret a battery value in its textual form. Only the three
    /// sentinels are recognized; negative, fractional or non-numeric values
    /// are kept unchanged.
    ///
    /// ```
    /// use tellduslive_types::BatteryStatus;
    ///
    /// assert_eq!(BatteryStatus::from_reported("253"), BatteryStatus::Ok);
    /// assert_eq!(BatteryStatus::from_reported("-1"), BatteryStatus::Level("-1".into()));
    /// ```
    #[must_use]
    pub fn from_reported(value: &str) -> Self {
        match value.trim().parse::<u32>() {
            Ok(raw @ (BATTERY_LOW | BATTERY_UNKNOWN | BATTERY_OK)) => Self::from_raw(raw),
            _ => BatteryStatus::Level(value.to_string()),
        }
    }
}

impl fmt::Display for BatteryStatus {
    /// The value as the API reports it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatteryStatus::Low => write!(f, "{}", BATTERY_LOW),
            BatteryStatus::Unknown => write!(f, "{}", BATTERY_UNKNOWN),
            BatteryStatus::Ok => write!(f, "{}", BATTERY_OK),
            BatteryStatus::Level(value) => f.write_str(value),
        }
    }
}

/// A named device parameter (`house`, `unit`, `code`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single telemetry reading belonging to a sensor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorItem {
    /// Reading name, e.g. `temp` or `humidity`.
    pub name: String,
    /// Reading value as reported by the server.
    pub value: String,
    /// Scale index (unit variant) of the reading.
    #[cfg_attr(feature = "serde", serde(default))]
    pub scale: u32,
}

impl SensorItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>, scale: u32) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            scale,
        }
    }
}

impl fmt::Display for SensorItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// What kind of entity a [`Device`] is, with the fields specific to it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum DeviceKind {
    /// A controllable device (switch, dimmer, blind, ...).
    Actuator {
        /// Last method executed on the device.
        state: Option<Method>,
        /// Value accompanying the state, e.g. the dim level.
        state_value: Option<String>,
        /// Methods the device supports.
        methods: Methods,
        parameters: Vec<Parameter>,
    },
    /// A sensor reporting telemetry.
    Sensor {
        /// Sensor id within its protocol and model.
        sensor_id: Option<String>,
        items: Vec<SensorItem>,
    },
}

/// A device or sensor registered with Telldus Live.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Device {
    /// Device id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// RF protocol name, e.g. `arctech`.
    pub protocol: Option<String>,
    /// Model name, e.g. `selflearning-switch`.
    pub model: Option<String>,
    /// Id of the gateway (client) the device belongs to.
    pub client_id: Option<String>,
    /// Battery status, if the device reports one.
    pub battery: Option<BatteryStatus>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: DeviceKind,
}

impl Device {
    /// Create an actuator with no state and no methods.
    pub fn actuator(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            protocol: None,
            model: None,
            client_id: None,
            battery: None,
            kind: DeviceKind::Actuator {
                state: None,
                state_value: None,
                methods: Methods::default(),
                parameters: Vec::new(),
            },
        }
    }

    /// Create a sensor with no items.
    pub fn sensor(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            protocol: None,
            model: None,
            client_id: None,
            battery: None,
            kind: DeviceKind::Sensor {
                sensor_id: None,
                items: Vec::new(),
            },
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_battery(mut self, battery: BatteryStatus) -> Self {
        self.battery = Some(battery);
        self
    }

    /// Set the state of an actuator. No effect on sensors.
    pub fn with_state(mut self, new_state: Method) -> Self {
        self.set_state(new_state);
        self
    }

    /// Set the supported methods of an actuator. No effect on sensors.
    pub fn with_methods(mut self, new_methods: Methods) -> Self {
        if let DeviceKind::Actuator { methods, .. } = &mut self.kind {
            *methods = new_methods;
        }
        self
    }

    /// Set the sensor id of a sensor. No effect on actuators.
    pub fn with_sensor_id(mut self, id: impl Into<String>) -> Self {
        if let DeviceKind::Sensor { sensor_id, .. } = &mut self.kind {
            *sensor_id = Some(id.into());
        }
        self
    }

    /// Append a reading to a sensor. No effect on actuators.
    pub fn with_item(mut self, item: SensorItem) -> Self {
        if let DeviceKind::Sensor { items, .. } = &mut self.kind {
            items.push(item);
        }
        self
    }

    /// Name to display, falling back to [`UNNAMED_DEVICE`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            UNNAMED_DEVICE
        } else {
            &self.name
        }
    }

    #[must_use]
    pub fn is_sensor(&self) -> bool {
        matches!(self.kind, DeviceKind::Sensor { .. })
    }

    /// Last known state of an actuator; `None` for sensors.
    #[must_use]
    pub fn state(&self) -> Option<Method> {
        match &self.kind {
            DeviceKind::Actuator { state, .. } => *state,
            DeviceKind::Sensor { .. } => None,
        }
    }

    /// Record that `method` was executed on the device.
    pub fn set_state(&mut self, method: Method) {
        if let DeviceKind::Actuator { state, .. } = &mut self.kind {
            *state = Some(method);
        }
    }

    /// Record a new state value, e.g. after dimming.
    pub fn set_state_value(&mut self, value: impl Into<String>) {
        if let DeviceKind::Actuator { state_value, .. } = &mut self.kind {
            *state_value = Some(value.into());
        }
    }

    /// State value of an actuator, `"0"` when the server reports none.
    #[must_use]
    pub fn state_value(&self) -> &str {
        match &self.kind {
            DeviceKind::Actuator {
                state_value: Some(v),
                ..
            } if !v.is_empty() && v != "unde" => v,
            _ => "0",
        }
    }

    /// Supported methods of an actuator; empty for sensors.
    #[must_use]
    pub fn methods(&self) -> Methods {
        match &self.kind {
            DeviceKind::Actuator { methods, .. } => *methods,
            DeviceKind::Sensor { .. } => Methods::default(),
        }
    }

    /// Device parameters; empty for sensors.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        match &self.kind {
            DeviceKind::Actuator { parameters, .. } => parameters,
            DeviceKind::Sensor { .. } => &[],
        }
    }

    /// Value of the parameter called `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters()
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Sensor id of a sensor; `None` for actuators.
    #[must_use]
    pub fn sensor_id(&self) -> Option<&str> {
        match &self.kind {
            DeviceKind::Sensor { sensor_id, .. } => sensor_id.as_deref(),
            DeviceKind::Actuator { .. } => None,
        }
    }

    /// Readings of a sensor; empty for actuators.
    #[must_use]
    pub fn items(&self) -> &[SensorItem] {
        match &self.kind {
            DeviceKind::Sensor { items, .. } => items,
            DeviceKind::Actuator { .. } => &[],
        }
    }

    /// The reading with the given name and scale.
    #[must_use]
    pub fn item(&self, name: &str, scale: u32) -> Option<&SensorItem> {
        self.items()
            .iter()
            .find(|i| i.name == name && i.scale == scale)
    }

    /// Value of the reading with the given name and scale.
    #[must_use]
    pub fn value(&self, name: &str, scale: u32) -> Option<&str> {
        self.item(name, scale).map(|i| i.value.as_str())
    }

    /// True when the device is on, including dimmed.
    #[must_use]
    pub fn is_on(&self) -> bool {
        matches!(self.state(), Some(Method::TurnOn | Method::Dim))
    }

    /// True when a blind or similar device is down.
    #[must_use]
    pub fn is_down(&self) -> bool {
        self.state() == Some(Method::Down)
    }

    /// Current dim level, if the state value is numeric.
    #[must_use]
    pub fn dim_level(&self) -> Option<u8> {
        self.state_value().parse().ok()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DeviceKind::Sensor { items, .. } => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "Sensor #{:>9} {:<20} ({})",
                    self.id,
                    self.display_name(),
                    items.join(", ")
                )
            }
            DeviceKind::Actuator { state, methods, .. } => {
                let state = state.map(|s| s.to_string()).unwrap_or_default();
                write!(
                    f,
                    "Device #{:>9} {:<20} ({}:{}) [{}]",
                    self.id,
                    self.display_name(),
                    state,
                    self.state_value(),
                    methods
                )
            }
        }
    }
}

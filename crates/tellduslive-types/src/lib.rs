//! Platform-agnostic types for Telldus Live devices and sensors.
//!
//! This crate provides the data model shared by the session library
//! (tellduslive-core) and the command-line client (tellduslive-cli).
//!
//! # Features
//!
//! - Devices and sensors as reported by Telldus Live or a local TellStick
//! - Tellstick methods and method bitmasks
//! - Battery status decoding
//! - Error types for data parsing
//!
//! # Example
//!
//! ```
//! use tellduslive_types::{Device, Method, Methods};
//!
//! let lamp = Device::actuator("1234", "Kitchen lamp")
//!     .with_methods(Methods::SUPPORTED)
//!     .with_state(Method::TurnOn);
//!
//! assert!(lamp.is_on());
//! assert!(lamp.methods().contains(Method::Dim));
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    BATTERY_LOW, BATTERY_OK, BATTERY_UNKNOWN, BatteryStatus, Device, DeviceKind, Method, Methods,
    Parameter, SensorItem, UNNAMED_DEVICE,
};

#[cfg(test)]
mod tests {
    use super::*;

    // --- ParseError tests ---

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::InvalidData("test message".to_string());
        assert_eq!(err.to_string(), "Invalid data: test message");
        assert_eq!(
            ParseError::UnknownMethodBits(3).to_string(),
            "Unknown method bit value: 3"
        );
    }

    // --- Serialization tests ---

    #[test]
    fn test_method_serialization() {
        assert_eq!(
            serde_json::to_string(&Method::TurnOn).unwrap(),
            "\"turnOn\""
        );
        let parsed: Method = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(parsed, Method::Down);
    }

    #[test]
    fn test_methods_serialize_as_bitmask() {
        assert_eq!(serde_json::to_string(&Methods::SUPPORTED).unwrap(), "915");
    }

    #[test]
    fn test_device_serialization_is_tagged() {
        let sensor = Device::sensor("9", "Greenhouse")
            .with_battery(BatteryStatus::Low)
            .with_item(SensorItem::new("temp", "18.5", 0));

        let json = serde_json::to_value(&sensor).unwrap();
        assert_eq!(json["kind"], "sensor");
        assert_eq!(json["battery"], "low");
        assert_eq!(json["items"][0]["name"], "temp");

        let back: Device = serde_json::from_value(json).unwrap();
        assert_eq!(back, sensor);
    }
}

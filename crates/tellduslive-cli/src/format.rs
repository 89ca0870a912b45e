//! Output formatting for device tables and discovered gateways.
//!
//! Device rows are fixed width: id right-justified to 8, name left-justified
//! to 20, then protocol, model and battery. Devices end with their state;
//! sensors get one row per item, ending with the sensor id and `name=value`.
//! Gateways are rendered with `tabled`.

use tellduslive_core::Gateway;
use tellduslive_types::{BatteryStatus, Device, Method};

use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit the header row.
    pub no_header: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            no_header: false,
        }
    }

    /// Create with no_header option.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }
}

/// Battery column: a checkmark for `ok` and `low`, nothing for `unknown` or
/// no battery, any other value as reported.
pub fn battery_label(battery: Option<&BatteryStatus>) -> String {
    match battery {
        Some(BatteryStatus::Ok) | Some(BatteryStatus::Low) => style::CHECKMARK.to_string(),
        Some(BatteryStatus::Unknown) | None => String::new(),
        Some(BatteryStatus::Level(value)) => value.clone(),
    }
}

/// State column: "On", "Off", "Up" or "Down", "?" for anything else.
pub fn state_label(state: Option<Method>) -> &'static str {
    match state {
        Some(Method::TurnOn) => "On",
        Some(Method::TurnOff) => "Off",
        Some(Method::Up) => "Up",
        Some(Method::Down) => "Down",
        _ => "?",
    }
}

fn columns(id: &str, name: &str, protocol: &str, model: &str, battery: &str) -> String {
    format!(
        "{:>8} {:<20} {:<12} {:<28} {:<3}",
        id, name, protocol, model, battery
    )
}

/// Rows for one device: one for an actuator, one per item for a sensor
/// (none for a sensor without items).
pub fn format_device_rows(device: &Device, opts: &FormatOptions) -> Vec<String> {
    let prefix = columns(
        &device.id,
        device.display_name(),
        device.protocol.as_deref().unwrap_or_default(),
        device.model.as_deref().unwrap_or_default(),
        &battery_label(device.battery.as_ref()),
    );

    if device.is_sensor() {
        let sensor_id = device.sensor_id().unwrap_or_default();
        device
            .items()
            .iter()
            .map(|item| format!("{} {:<8} {}", prefix, sensor_id, item))
            .collect()
    } else {
        let state = style::format_state_colored(state_label(device.state()), opts.no_color);
        vec![format!("{} {}", prefix, state)]
    }
}

/// The full device table, devices first, then sensors, each group in
/// snapshot order.
pub fn format_device_table(devices: &[Device], opts: &FormatOptions) -> String {
    let mut ordered: Vec<&Device> = devices.iter().collect();
    ordered.sort_by_key(|d| d.is_sensor());

    let mut output = String::new();
    if !opts.no_header {
        let header = format!(
            "{} {}",
            columns("ID", "NAME", "PROTOCOL", "MODEL", "BAT"),
            "STATE"
        );
        output.push_str(&style::format_header(&header, opts.no_color));
        output.push('\n');
    }
    for device in ordered {
        for row in format_device_rows(device, opts) {
            output.push_str(&row);
            output.push('\n');
        }
    }
    output
}

/// Table of gateways found by discovery.
pub fn format_gateway_table(gateways: &[Gateway], opts: &FormatOptions) -> String {
    use tabled::settings::object::Rows;
    use tabled::settings::{Remove, Style};
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct GatewayRow {
        #[tabled(rename = "Address")]
        address: String,
        #[tabled(rename = "Product")]
        product: String,
        #[tabled(rename = "MAC")]
        mac: String,
        #[tabled(rename = "Firmware")]
        firmware: String,
        #[tabled(rename = "Local API")]
        local_api: String,
    }

    let rows: Vec<GatewayRow> = gateways
        .iter()
        .map(|g| GatewayRow {
            address: g.address.to_string(),
            product: g.product.clone(),
            mac: g.mac.clone(),
            firmware: g.firmware.clone(),
            local_api: if g.supports_local_api() { "yes" } else { "no" }.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    style::apply_table_style(&mut table, opts.no_color);
    if opts.no_header {
        table.with(Remove::row(Rows::first()));
    }
    format!("{}\n", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellduslive_types::{Methods, SensorItem};

    const CHECK: &str = style::CHECKMARK;

    fn plain() -> FormatOptions {
        FormatOptions::new(true)
    }

    fn thermometer() -> Device {
        Device::sensor("201", "Outdoor")
            .with_protocol("fineoffset")
            .with_model("temperaturehumidity")
            .with_sensor_id("135")
            .with_battery(BatteryStatus::Ok)
            .with_item(SensorItem::new("temp", "4.1", 0))
            .with_item(SensorItem::new("humidity", "80", 0))
    }

    fn switch(id: &str, state: Method) -> Device {
        Device::actuator(id, "Hall")
            .with_protocol("arctech")
            .with_model("selflearning-switch")
            .with_methods(Methods::SUPPORTED)
            .with_state(state)
    }

    // ========================================================================
    // Battery and state labels
    // ========================================================================

    #[test]
    fn test_battery_label() {
        assert_eq!(battery_label(Some(&BatteryStatus::Low)), CHECK);
        assert_eq!(battery_label(Some(&BatteryStatus::Ok)), CHECK);
        assert_eq!(battery_label(Some(&BatteryStatus::Unknown)), "");
        assert_eq!(battery_label(None), "");
        assert_eq!(battery_label(Some(&BatteryStatus::Level("87".into()))), "87");
        assert_eq!(battery_label(Some(&BatteryStatus::Level("-1".into()))), "-1");
    }

    #[test]
    fn test_state_label() {
        assert_eq!(state_label(Some(Method::TurnOn)), "On");
        assert_eq!(state_label(Some(Method::TurnOff)), "Off");
        assert_eq!(state_label(Some(Method::Up)), "Up");
        assert_eq!(state_label(Some(Method::Down)), "Down");
        assert_eq!(state_label(Some(Method::Dim)), "?");
        assert_eq!(state_label(Some(Method::Stop)), "?");
        assert_eq!(state_label(None), "?");
    }

    // ========================================================================
    // Rows
    // ========================================================================

    #[test]
    fn test_device_row_layout() {
        let rows = format_device_rows(&switch("102", Method::TurnOff), &plain());
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("     102 Hall                 arctech"));
        assert!(rows[0].ends_with(" Off"));
    }

    #[test]
    fn test_sensor_row_per_item() {
        let rows = format_device_rows(&thermometer(), &plain());
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("     201 Outdoor"));
        assert!(rows[0].contains(CHECK));
        assert!(rows[0].ends_with("135      temp=4.1"));
        assert!(rows[1].ends_with("135      humidity=80"));
    }

    #[test]
    fn test_sensor_without_items_has_no_rows() {
        let sensor = Device::sensor("202", "Attic");
        assert!(format_device_rows(&sensor, &plain()).is_empty());
    }

    #[test]
    fn test_unnamed_device() {
        let rows = format_device_rows(&Device::actuator("7", ""), &plain());
        assert!(rows[0].contains("NO NAME"));
        assert!(rows[0].ends_with(" ?"));
    }

    // ========================================================================
    // Table
    // ========================================================================

    #[test]
    fn test_table_orders_sensors_last() {
        let devices = vec![
            thermometer(),
            switch("102", Method::TurnOn),
            switch("103", Method::TurnOff),
        ];
        let table = format_device_table(&devices, &plain().with_no_header(true));
        let lines: Vec<&str> = table.lines().collect();

        // 1 row per device, 2 for the sensor
        assert_eq!(lines.len(), 4);
        assert!(lines[0].trim_start().starts_with("102"));
        assert!(lines[1].trim_start().starts_with("103"));
        assert!(lines[2].contains("temp=4.1"));
        assert!(lines[3].contains("humidity=80"));
    }

    #[test]
    fn test_table_header() {
        let table = format_device_table(&[switch("1", Method::TurnOn)], &plain());
        let first = table.lines().next().unwrap();
        assert!(first.trim_start().starts_with("ID"));
        assert!(first.contains("NAME"));
        assert!(first.ends_with("STATE"));
    }

    fn gateway(product: &str) -> Gateway {
        Gateway {
            address: "192.168.1.20".parse().unwrap(),
            product: product.into(),
            mac: "ACCA54000001".into(),
            code: "ABCDEFGHIJ".into(),
            firmware: "1.1.0".into(),
        }
    }

    #[test]
    fn test_gateway_table() {
        let table = format_gateway_table(
            &[gateway("TellstickZnet"), gateway("TellStickNet")],
            &plain(),
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Address"));
        assert!(lines[0].contains("Local API"));
        assert!(lines[1].contains("192.168.1.20"));
        assert!(lines[1].trim_end().ends_with("yes"));
        assert!(lines[2].trim_end().ends_with("no"));
    }

    #[test]
    fn test_gateway_table_without_header() {
        let table =
            format_gateway_table(&[gateway("TellstickZnet")], &plain().with_no_header(true));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("TellstickZnet"));
    }
}

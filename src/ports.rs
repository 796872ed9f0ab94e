//! Serial port discovery.
//!
//! Device naming differs per host platform (`/dev/cu.usbmodem*` on macOS,
//! `/dev/ttyACM*` on Linux), so auto-detection is a [`PortMatcher`] predicate
//! applied to the list returned by [`list_ports`].

use serialport::SerialPortType;
use std::fmt;

/// A single enumerated serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS-level identifier used to open the port
    pub name: String,
    /// Human-readable description
    pub description: String,
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

impl PortInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Decides whether an enumerated port is the SuperPico.
pub trait PortMatcher {
    fn matches(&self, port: &PortInfo) -> bool;
}

impl<F> PortMatcher for F
where
    F: Fn(&PortInfo) -> bool,
{
    fn matches(&self, port: &PortInfo) -> bool {
        self(port)
    }
}

/// Case-insensitive substring match against the port name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePatterns {
    patterns: Vec<String>,
}

impl NamePatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// USB CDC devices as macOS names them. Used by the frame capture tool.
    pub fn usb_modem() -> Self {
        Self::new(["usbmodem"])
    }

    /// USB CDC devices on macOS and Linux. Used by the serial monitor.
    pub fn usb_modem_or_acm() -> Self {
        Self::new(["usbmodem", "acm"])
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl PortMatcher for NamePatterns {
    fn matches(&self, port: &PortInfo) -> bool {
        let name = port.name.to_lowercase();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

/// Enumerate the serial ports present on this host.
pub fn list_ports() -> Result<Vec<PortInfo>, serialport::Error> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            description: describe(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB serial device");
            match usb.manufacturer.as_deref() {
                Some(manufacturer) => format!(
                    "{} - {} ({:04x}:{:04x})",
                    manufacturer, product, usb.vid, usb.pid
                ),
                None => format!("{} ({:04x}:{:04x})", product, usb.vid, usb.pid),
            }
        }
        SerialPortType::PciPort => "PCI serial port".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth serial port".to_string(),
        SerialPortType::Unknown => "n/a".to_string(),
    }
}

/// Return the name of the first port accepted by `matcher`.
pub fn find_port<M: PortMatcher + ?Sized>(ports: &[PortInfo], matcher: &M) -> Option<String> {
    ports
        .iter()
        .find(|p| matcher.matches(p))
        .map(|p| p.name.clone())
}

/// Enumerate ports and return the first one accepted by `matcher`.
pub fn detect_port<M: PortMatcher + ?Sized>(
    matcher: &M,
) -> Result<Option<String>, serialport::Error> {
    let ports = list_ports()?;
    let found = find_port(&ports, matcher);
    match &found {
        Some(name) => log::debug!("Auto-detected port {}", name),
        None => log::debug!("No matching port among {} candidate(s)", ports.len()),
    }
    Ok(found)
}

/// Print the port list to stdout.
pub fn print_ports(ports: &[PortInfo]) {
    if ports.is_empty() {
        println!("  (none found)");
        return;
    }
    for port in ports {
        println!("  {}", port);
    }
}

use serde::Deserialize;
use serde::Serialize;
use std::fmt;

pub const DEFAULT_VERSION: &str = "0.0.1";
pub const DEFAULT_HELP_URL: &str = "https://github.com/lion7/extcap";

/// Version and help page reported in front of the interface list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub info: String,
    pub help: String,
}

impl VersionInfo {
    pub fn new(info: &str, help: &str) -> VersionInfo {
        VersionInfo {
            info: info.to_string(),
            help: help.to_string(),
        }
    }
    /// Fill blank fields with the crate defaults.
    pub fn with_defaults(mut self) -> VersionInfo {
        if self.info.is_empty() {
            self.info = DEFAULT_VERSION.to_string();
        }
        if self.help.is_empty() {
            self.help = DEFAULT_HELP_URL.to_string();
        }
        self
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "extcap {{version={}}}{{help={}}}", self.info, self.help)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureInterface {
    /// Identifier Wireshark passes back in `--extcap-interface`.
    pub value: String,
    pub display: String,
}

impl CaptureInterface {
    pub fn new(value: &str, display: &str) -> CaptureInterface {
        CaptureInterface {
            value: value.to_string(),
            display: display.to_string(),
        }
    }
}

impl fmt::Display for CaptureInterface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "interface {{value={}}}{{display={}}}", self.value, self.display)
    }
}

/// Data link type of the stream written for one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dlt {
    pub number: u32,
    pub name: String,
    pub display: String,
}

impl Dlt {
    pub fn new(number: u32, name: &str, display: &str) -> Dlt {
        Dlt {
            number,
            name: name.to_string(),
            display: display.to_string(),
        }
    }
}

impl fmt::Display for Dlt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "dlt {{number={}}}{{name={}}}{{display={}}}",
            self.number, self.name, self.display
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_line() {
        let v = VersionInfo::default().with_defaults();
        assert_eq!(
            v.to_string(),
            "extcap {version=0.0.1}{help=https://github.com/lion7/extcap}"
        );
        let v = VersionInfo::new("1.2.0", "").with_defaults();
        assert_eq!(v.info, "1.2.0");
        assert_eq!(v.help, DEFAULT_HELP_URL);
    }
    #[test]
    fn interface_line() {
        let iface = CaptureInterface::new("eth0", "Ethernet");
        assert_eq!(iface.to_string(), "interface {value=eth0}{display=Ethernet}");
        assert_eq!(iface.to_string(), iface.to_string());
    }
    #[test]
    fn dlt_line() {
        let dlt = Dlt::new(1, "EN10MB", "Ethernet");
        assert_eq!(dlt.to_string(), "dlt {number=1}{name=EN10MB}{display=Ethernet}");
    }
}

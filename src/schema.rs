//! Command-line schema of an extcap tool.
//!
//! The fixed protocol flags come first, then one flag per configuration
//! option the tool declares. Parsing produces a [`Flags`] snapshot which is
//! all the dispatcher looks at.
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap::value_parser;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::ExtcapError;
use crate::option::ConfigOption;
use crate::option::OptionKind;
use crate::option::OptionValue;

pub const EXTCAP_VERSION: &str = "extcap-version";
pub const EXTCAP_INTERFACES: &str = "extcap-interfaces";
pub const EXTCAP_DLTS: &str = "extcap-dlts";
pub const EXTCAP_INTERFACE: &str = "extcap-interface";
pub const EXTCAP_CONFIG: &str = "extcap-config";
pub const CAPTURE: &str = "capture";
pub const EXTCAP_CAPTURE_FILTER: &str = "extcap-capture-filter";
pub const FIFO: &str = "fifo";
pub const DEBUG: &str = "debug";
pub const DEBUG_FILE: &str = "debug-file";

const SWITCHES: [&str; 5] = [EXTCAP_INTERFACES, EXTCAP_DLTS, EXTCAP_CONFIG, CAPTURE, DEBUG];
const VALUED: [&str; 5] = [
    EXTCAP_VERSION,
    EXTCAP_INTERFACE,
    EXTCAP_CAPTURE_FILTER,
    FIFO,
    DEBUG_FILE,
];
// generated by clap itself
const RESERVED: [&str; 1] = ["help"];

fn protocol_flags() -> Vec<Arg> {
    vec![
        Arg::new(EXTCAP_VERSION)
            .long(EXTCAP_VERSION)
            .value_name("ver")
            .action(ArgAction::Set)
            .help("specify the Wireshark major and minor version"),
        Arg::new(EXTCAP_INTERFACES)
            .long(EXTCAP_INTERFACES)
            .action(ArgAction::SetTrue)
            .help("list the extcap interfaces"),
        Arg::new(EXTCAP_DLTS)
            .long(EXTCAP_DLTS)
            .action(ArgAction::SetTrue)
            .help("list the DLTs"),
        Arg::new(EXTCAP_INTERFACE)
            .long(EXTCAP_INTERFACE)
            .value_name("iface")
            .action(ArgAction::Set)
            .help("specify the extcap interface <iface>"),
        Arg::new(EXTCAP_CONFIG)
            .long(EXTCAP_CONFIG)
            .action(ArgAction::SetTrue)
            .help("list the additional configuration for an interface"),
        Arg::new(CAPTURE)
            .long(CAPTURE)
            .action(ArgAction::SetTrue)
            .help("run the capture"),
        Arg::new(EXTCAP_CAPTURE_FILTER)
            .long(EXTCAP_CAPTURE_FILTER)
            .value_name("filter")
            .action(ArgAction::Set)
            .help("the capture filter <filter>"),
        Arg::new(FIFO)
            .long(FIFO)
            .value_name("fifo")
            .action(ArgAction::Set)
            .help("dump data to file or <fifo>"),
        Arg::new(DEBUG)
            .long(DEBUG)
            .action(ArgAction::SetTrue)
            .help("print debug messages"),
        Arg::new(DEBUG_FILE)
            .long(DEBUG_FILE)
            .value_name("path")
            .action(ArgAction::Set)
            .help("write debug messages to <path>"),
    ]
}

fn check_name(name: &str) -> Result<(), ExtcapError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && !name.contains(|c: char| c == '=' || c.is_whitespace());
    if valid {
        Ok(())
    } else {
        Err(ExtcapError::InvalidFlagName {
            name: name.to_string(),
        })
    }
}

/// Flag for one declared option. The flag layer owns default and required-ness.
fn option_flag(opt: &ConfigOption) -> Result<Arg, ExtcapError> {
    let arg = Arg::new(opt.call.clone())
        .long(opt.call.clone())
        .help(opt.display.clone())
        .required(opt.required)
        .action(ArgAction::Set);
    let arg = match &opt.kind {
        OptionKind::String { default } => {
            let arg = arg.value_parser(value_parser!(String));
            if opt.required || default.is_empty() {
                arg
            } else {
                arg.default_value(default.clone())
            }
        }
        OptionKind::Boolean { default } => {
            // `--flag` alone means true, `--flag=false` is accepted too
            let arg = arg
                .value_parser(value_parser!(bool))
                .num_args(0..=1)
                .default_missing_value("true");
            if opt.required {
                arg
            } else {
                arg.default_value(default.to_string())
            }
        }
        OptionKind::Integer { default } => {
            let arg = arg
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true);
            if opt.required {
                arg
            } else {
                arg.default_value(default.to_string())
            }
        }
        OptionKind::Selector | OptionKind::MultiCheck => return Err(opt.unsupported()),
    };
    Ok(arg)
}

#[derive(Debug, Clone)]
pub struct Schema {
    command: Command,
    options: Vec<ConfigOption>,
}

impl Schema {
    /// First phase: the fixed protocol flags on top of `base`.
    pub fn new(base: Command) -> Schema {
        Schema {
            command: base.args(protocol_flags()),
            options: Vec::new(),
        }
    }
    /// Second phase: append one flag per declared option.
    /// Fails on the first option that cannot be advertised.
    pub fn with_options(mut self, options: Vec<ConfigOption>) -> Result<Schema, ExtcapError> {
        for opt in options {
            check_name(&opt.call)?;
            let taken = SWITCHES.contains(&opt.call.as_str())
                || VALUED.contains(&opt.call.as_str())
                || RESERVED.contains(&opt.call.as_str())
                || self.options.iter().any(|o| o.call == opt.call);
            if taken {
                return Err(ExtcapError::DuplicateFlag { name: opt.call });
            }
            let arg = option_flag(&opt)?;
            self.command = self.command.arg(arg);
            self.options.push(opt);
        }
        Ok(self)
    }
    pub fn command(&self) -> &Command {
        &self.command
    }
    pub fn options(&self) -> &[ConfigOption] {
        &self.options
    }
    pub fn render_help(&self) -> String {
        self.command.clone().render_help().to_string()
    }
    pub fn parse<I, T>(&self, args: I) -> Result<Flags, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().try_get_matches_from(args)?;
        Ok(self.flags(&matches))
    }
    fn flags(&self, matches: &ArgMatches) -> Flags {
        let mut flags = Flags::new();
        for name in SWITCHES {
            if matches.get_flag(name) {
                flags.values.insert(name.to_string(), OptionValue::Bool(true));
            }
        }
        for name in VALUED {
            if let Some(v) = matches.get_one::<String>(name) {
                flags.values.insert(name.to_string(), OptionValue::String(v.clone()));
            }
        }
        for opt in &self.options {
            let name = opt.call.as_str();
            let value = match &opt.kind {
                OptionKind::String { default } => OptionValue::String(
                    matches
                        .get_one::<String>(name)
                        .cloned()
                        .unwrap_or_else(|| default.clone()),
                ),
                OptionKind::Boolean { default } => {
                    OptionValue::Bool(matches.get_one::<bool>(name).copied().unwrap_or(*default))
                }
                OptionKind::Integer { default } => {
                    OptionValue::Integer(matches.get_one::<i64>(name).copied().unwrap_or(*default))
                }
                // rejected in with_options
                OptionKind::Selector | OptionKind::MultiCheck => continue,
            };
            flags.values.insert(name.to_string(), value);
        }
        flags
    }
}

/// Recognized flags of one invocation with their values.
///
/// Protocol flags are present only when given on the command line. Declared
/// options are always present, holding their default when not given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    values: BTreeMap<String, OptionValue>,
}

impl Flags {
    pub fn new() -> Flags {
        Flags::default()
    }
    /// Builder used by hosts and tests that assemble flags by hand.
    pub fn with(mut self, name: &str, value: impl Into<OptionValue>) -> Flags {
        self.values.insert(name.to_string(), value.into());
        self
    }
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::String(s)) => Some(s),
            _ => None,
        }
    }
    pub fn interface(&self) -> Option<&str> {
        self.get_str(EXTCAP_INTERFACE)
    }
    pub fn fifo(&self) -> Option<PathBuf> {
        self.get_str(FIFO).map(PathBuf::from)
    }
    pub fn capture_filter(&self) -> &str {
        self.get_str(EXTCAP_CAPTURE_FILTER).unwrap_or("")
    }
    pub fn debug(&self) -> bool {
        self.is_set(DEBUG)
    }
    pub fn debug_file(&self) -> Option<PathBuf> {
        self.get_str(DEBUG_FILE).map(PathBuf::from)
    }
    pub fn iter(&self) -> btree_map::Iter<'_, String, OptionValue> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(options: Vec<ConfigOption>) -> Result<Schema, ExtcapError> {
        Schema::new(Command::new("sshdump")).with_options(options)
    }

    #[test]
    fn parse_protocol_flags() {
        let s = schema(Vec::new()).unwrap();
        let flags = s
            .parse([
                "sshdump",
                "--capture",
                "--extcap-interface=eth0",
                "--fifo",
                "/tmp/p",
                "--extcap-capture-filter=tcp port 22",
            ])
            .unwrap();
        assert!(flags.is_set(CAPTURE));
        assert!(!flags.is_set(EXTCAP_DLTS));
        assert_eq!(flags.interface(), Some("eth0"));
        assert_eq!(flags.fifo(), Some(PathBuf::from("/tmp/p")));
        assert_eq!(flags.capture_filter(), "tcp port 22");
        assert!(!flags.debug());
    }
    #[test]
    fn declared_options_get_defaults() {
        let s = schema(vec![
            ConfigOption::string("remote-host", "Remote host", "localhost"),
            ConfigOption::boolean("verbose", "Verbose", false),
            ConfigOption::integer("remote-port", "Remote port", 22),
        ])
        .unwrap();
        let flags = s.parse(["sshdump", "--extcap-config"]).unwrap();
        assert_eq!(
            flags.get("remote-host"),
            Some(&OptionValue::String(String::from("localhost")))
        );
        assert_eq!(flags.get("verbose"), Some(&OptionValue::Bool(false)));
        assert_eq!(flags.get("remote-port"), Some(&OptionValue::Integer(22)));
    }
    #[test]
    fn declared_options_parse_values() {
        let s = schema(vec![
            ConfigOption::boolean("verbose", "Verbose", false),
            ConfigOption::boolean("promisc", "Promiscuous", false),
            ConfigOption::integer("offset", "Offset", 0),
        ])
        .unwrap();
        let flags = s
            .parse(["sshdump", "--verbose=true", "--promisc", "--offset=-4"])
            .unwrap();
        assert_eq!(flags.get("verbose"), Some(&OptionValue::Bool(true)));
        assert_eq!(flags.get("promisc"), Some(&OptionValue::Bool(true)));
        assert_eq!(flags.get("offset"), Some(&OptionValue::Integer(-4)));

        let flags = s.parse(["sshdump", "--verbose=false"]).unwrap();
        assert_eq!(flags.get("verbose"), Some(&OptionValue::Bool(false)));
    }
    #[test]
    fn required_option_enforced() {
        let s = schema(vec![
            ConfigOption::string("remote-host", "Remote host", "").required(true),
        ])
        .unwrap();
        assert!(s.parse(["sshdump", "--capture"]).is_err());
        let flags = s.parse(["sshdump", "--remote-host", "10.1.1.1"]).unwrap();
        assert_eq!(flags.get_str("remote-host"), Some("10.1.1.1"));
    }
    #[test]
    fn bad_integer_rejected() {
        let s = schema(vec![ConfigOption::integer("count", "Count", 0)]).unwrap();
        assert!(s.parse(["sshdump", "--count=ten"]).is_err());
    }
    #[test]
    fn unsupported_option_aborts() {
        let ret = schema(vec![
            ConfigOption::string("remote-host", "Remote host", "localhost"),
            ConfigOption::selector("mode", "Mode"),
        ]);
        assert!(matches!(ret, Err(ExtcapError::UnsupportedOption { .. })));
    }
    #[test]
    fn colliding_names_abort() {
        let ret = schema(vec![ConfigOption::string("fifo", "Fifo", "")]);
        assert!(matches!(ret, Err(ExtcapError::DuplicateFlag { .. })));
        let ret = schema(vec![
            ConfigOption::boolean("verbose", "Verbose", false),
            ConfigOption::integer("verbose", "Verbosity", 1),
        ]);
        assert!(matches!(ret, Err(ExtcapError::DuplicateFlag { .. })));
        let ret = schema(vec![ConfigOption::boolean("a b", "Spaces", false)]);
        assert!(matches!(ret, Err(ExtcapError::InvalidFlagName { .. })));
    }
    #[test]
    fn help_lists_option_flags() {
        let s = schema(vec![ConfigOption::integer("remote-port", "Remote port", 22)]).unwrap();
        let help = s.render_help();
        assert!(help.contains("--extcap-interfaces"));
        assert!(help.contains("--remote-port"));
        assert_eq!(s.options().len(), 1);
    }
}

//! Configuration options advertised through `--extcap-config`.
//!
//! An option is a flag on the tool's command line. Wireshark shows it in the
//! interface options dialog and passes its value back when starting a capture.
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use strum_macros::Display;

use crate::error::ExtcapError;

/// Kind of a configuration option together with its default value.
///
/// `Selector` and `MultiCheck` exist in the extcap protocol but this crate
/// does not render them; building a schema with one of them fails.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionKind {
    #[strum(serialize = "string")]
    String { default: String },
    #[strum(serialize = "boolean")]
    Boolean { default: bool },
    #[strum(serialize = "integer")]
    Integer { default: i64 },
    #[strum(serialize = "selector")]
    Selector,
    #[strum(serialize = "multicheck")]
    MultiCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptionValue::String(s) => write!(f, "{}", s),
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::String(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOption {
    /// Flag name without the leading dashes.
    pub call: String,
    /// Text shown next to the option in Wireshark.
    pub display: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: OptionKind,
}

impl ConfigOption {
    fn new(call: &str, display: &str, kind: OptionKind) -> ConfigOption {
        ConfigOption {
            call: call.to_string(),
            display: display.to_string(),
            required: false,
            kind,
        }
    }
    pub fn string(call: &str, display: &str, default: &str) -> ConfigOption {
        Self::new(
            call,
            display,
            OptionKind::String {
                default: default.to_string(),
            },
        )
    }
    pub fn boolean(call: &str, display: &str, default: bool) -> ConfigOption {
        Self::new(call, display, OptionKind::Boolean { default })
    }
    pub fn integer(call: &str, display: &str, default: i64) -> ConfigOption {
        Self::new(call, display, OptionKind::Integer { default })
    }
    pub fn selector(call: &str, display: &str) -> ConfigOption {
        Self::new(call, display, OptionKind::Selector)
    }
    pub fn multicheck(call: &str, display: &str) -> ConfigOption {
        Self::new(call, display, OptionKind::MultiCheck)
    }
    pub fn required(mut self, required: bool) -> ConfigOption {
        self.required = required;
        self
    }
    pub fn call(&self) -> &str {
        &self.call
    }
    pub fn display(&self) -> &str {
        &self.display
    }
    pub fn is_required(&self) -> bool {
        self.required
    }
    /// Default value typed to the option kind.
    pub fn default_value(&self) -> Result<OptionValue, ExtcapError> {
        match &self.kind {
            OptionKind::String { default } => Ok(OptionValue::String(default.clone())),
            OptionKind::Boolean { default } => Ok(OptionValue::Bool(*default)),
            OptionKind::Integer { default } => Ok(OptionValue::Integer(*default)),
            OptionKind::Selector | OptionKind::MultiCheck => Err(self.unsupported()),
        }
    }
    /// Render the `arg` line for this option at position `number`.
    /// ```rust
    /// use extcap::ConfigOption;
    ///
    /// let opt = ConfigOption::integer("port", "Remote port", 22).required(true);
    /// assert_eq!(
    ///     opt.render(0).unwrap(),
    ///     "arg {number=0}{call=--port}{display=Remote port}{type=integer}{default=22}{required=true}"
    /// );
    /// ```
    pub fn render(&self, number: usize) -> Result<String, ExtcapError> {
        let default = self.default_value()?;
        Ok(format!(
            "arg {{number={}}}{{call=--{}}}{{display={}}}{{type={}}}{{default={}}}{{required={}}}",
            number, self.call, self.display, self.kind, default, self.required
        ))
    }
    pub(crate) fn unsupported(&self) -> ExtcapError {
        ExtcapError::UnsupportedOption {
            call: self.call.clone(),
            kind: self.kind.to_string(),
        }
    }
}

/// Option values handed to the capture callback, keyed by flag name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions(BTreeMap<String, OptionValue>);

impl CaptureOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(OptionValue::String(s)) => Some(s),
            _ => None,
        }
    }
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name) {
            Some(OptionValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(OptionValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> btree_map::Iter<'_, String, OptionValue> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a CaptureOptions {
    type Item = (&'a String, &'a OptionValue);
    type IntoIter = btree_map::Iter<'a, String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, OptionValue)> for CaptureOptions {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        CaptureOptions(iter.into_iter().collect())
    }
}

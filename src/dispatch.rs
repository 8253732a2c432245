use std::io::Write;
use strum_macros::Display;
use tracing::debug;
use tracing::warn;

use crate::error::BoxError;
use crate::error::ExtcapError;
use crate::option::CaptureOptions;
use crate::option::ConfigOption;
use crate::pipe::PipeOpener;
use crate::pipe::Sink;
use crate::protocol::CaptureInterface;
use crate::protocol::Dlt;
use crate::protocol::VersionInfo;
use crate::schema;
use crate::schema::Flags;

/// What a capture tool has to provide.
///
/// Only `interfaces`, `dlt` and `capture` are mandatory. A tool with
/// configuration options overrides `has_config_options` and
/// `config_options`, and lists every option it can take in
/// `all_config_options` so that the options become command-line flags.
pub trait Extcap {
    fn interfaces(&self) -> Result<Vec<CaptureInterface>, BoxError>;
    fn dlt(&self, iface: &str) -> Result<Dlt, BoxError>;
    /// Whether `config_options` is implemented. While this returns `false`,
    /// `--extcap-config` prints nothing and `config_options` is never called.
    fn has_config_options(&self) -> bool {
        false
    }
    /// Options for one interface, in the order Wireshark should number them.
    /// Only called when `has_config_options` returns `true`, so override both.
    fn config_options(&self, _iface: &str) -> Result<Vec<ConfigOption>, BoxError> {
        Ok(Vec::new())
    }
    fn all_config_options(&self) -> Vec<ConfigOption> {
        Vec::new()
    }
    /// Blocks for the whole capture. The sink is closed when dropped.
    fn capture(
        &self,
        iface: &str,
        fifo: Sink,
        filter: &str,
        opts: &CaptureOptions,
    ) -> Result<(), BoxError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Mode {
    ListInterfaces,
    ListDlts,
    ListConfig,
    Capture,
    ValidateCaptureFilter,
    Help,
}

impl Mode {
    /// Only presence of flags matters, in this order.
    pub fn select(flags: &Flags) -> Mode {
        if flags.is_set(schema::EXTCAP_INTERFACES) {
            Mode::ListInterfaces
        } else if flags.is_set(schema::EXTCAP_DLTS) {
            Mode::ListDlts
        } else if flags.is_set(schema::EXTCAP_CONFIG) {
            Mode::ListConfig
        } else if flags.is_set(schema::CAPTURE) {
            Mode::Capture
        } else if flags.is_set(schema::EXTCAP_CAPTURE_FILTER) {
            Mode::ValidateCaptureFilter
        } else {
            Mode::Help
        }
    }
}

// consumed by the dispatcher itself, never passed to the capture callback
const NOT_CAPTURE_OPTIONS: [&str; 5] = [
    schema::EXTCAP_INTERFACE,
    schema::FIFO,
    schema::EXTCAP_CAPTURE_FILTER,
    schema::DEBUG,
    schema::DEBUG_FILE,
];

pub fn capture_options(flags: &Flags) -> CaptureOptions {
    flags
        .iter()
        .filter(|(name, _)| !NOT_CAPTURE_OPTIONS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn require_interface(flags: &Flags) -> Result<&str, ExtcapError> {
    flags.interface().ok_or(ExtcapError::NoInterfaceSpecified)
}

pub struct Dispatcher<'a> {
    tool: &'a dyn Extcap,
    opener: &'a dyn PipeOpener,
    version: &'a VersionInfo,
    help: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        tool: &'a dyn Extcap,
        opener: &'a dyn PipeOpener,
        version: &'a VersionInfo,
        help: &'a str,
    ) -> Dispatcher<'a> {
        Dispatcher {
            tool,
            opener,
            version,
            help,
        }
    }
    /// Run the mode selected by `flags`, writing protocol lines to `out`.
    pub fn dispatch(&self, flags: &Flags, out: &mut dyn Write) -> Result<Mode, ExtcapError> {
        let mode = Mode::select(flags);
        debug!("extcap mode: {}", mode);
        match mode {
            Mode::ListInterfaces => self.list_interfaces(out)?,
            Mode::ListDlts => self.list_dlts(flags, out)?,
            Mode::ListConfig => self.list_config(flags, out)?,
            Mode::Capture => self.capture(flags)?,
            Mode::ValidateCaptureFilter => {
                debug!("capture filter accepted: {}", flags.capture_filter());
            }
            Mode::Help => {
                write!(out, "{}", self.help)?;
            }
        }
        out.flush()?;
        Ok(mode)
    }
    fn list_interfaces(&self, out: &mut dyn Write) -> Result<(), ExtcapError> {
        let ifaces = self.tool.interfaces().map_err(ExtcapError::Callback)?;
        writeln!(out, "{}", self.version)?;
        for iface in &ifaces {
            writeln!(out, "{}", iface)?;
        }
        Ok(())
    }
    fn list_dlts(&self, flags: &Flags, out: &mut dyn Write) -> Result<(), ExtcapError> {
        let iface = require_interface(flags)?;
        let dlt = self.tool.dlt(iface).map_err(ExtcapError::Callback)?;
        writeln!(out, "{}", dlt)?;
        Ok(())
    }
    fn list_config(&self, flags: &Flags, out: &mut dyn Write) -> Result<(), ExtcapError> {
        if !self.tool.has_config_options() {
            debug!("tool has no config options");
            return Ok(());
        }
        let iface = require_interface(flags)?;
        let opts = self
            .tool
            .config_options(iface)
            .map_err(ExtcapError::Callback)?;
        // render everything first so a bad option leaves no partial output
        let mut lines = Vec::with_capacity(opts.len());
        for (number, opt) in opts.iter().enumerate() {
            lines.push(opt.render(number)?);
        }
        for line in lines {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
    fn capture(&self, flags: &Flags) -> Result<(), ExtcapError> {
        let iface = require_interface(flags)?;
        let fifo = flags.fifo().ok_or(ExtcapError::NoPipeProvided)?;
        let filter = flags.capture_filter();
        let opts = capture_options(flags);

        let pipe = self.opener.open(&fifo)?;
        debug!(
            "start capture on {} into {} (filter: {:?}, {} options)",
            iface,
            fifo.display(),
            filter,
            opts.len()
        );
        match self.tool.capture(iface, pipe, filter, &opts) {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("capture on {} failed: {}", iface, e);
                Err(ExtcapError::Callback(e))
            }
        }
    }
}

//! Build Wireshark extcap tools.
//!
//! Wireshark starts an extcap tool once per question: which interfaces do you
//! have, which link type does this interface use, which options does it take,
//! and finally "capture into this FIFO". Implement [`Extcap`] for your capture
//! source and hand it to [`App`]; the flags, the text protocol and the FIFO
//! are taken care of.
use clap::Command;
use clap::error::ErrorKind;
use std::ffi::OsString;
use std::io;
use std::io::Write;
use std::path::Path;
use std::process;
use std::result;
use tracing::debug;

mod logging;

pub mod dispatch;
pub mod error;
pub mod option;
#[cfg(feature = "pcap")]
pub mod pcap;
pub mod pipe;
pub mod protocol;
pub mod schema;

pub use dispatch::Dispatcher;
pub use dispatch::Extcap;
pub use dispatch::Mode;
pub use error::BoxError;
pub use error::ExtcapError;
pub use option::CaptureOptions;
pub use option::ConfigOption;
pub use option::OptionKind;
pub use option::OptionValue;
pub use pipe::FifoOpener;
pub use pipe::PipeOpener;
pub use pipe::Sink;
pub use protocol::CaptureInterface;
pub use protocol::Dlt;
pub use protocol::VersionInfo;
pub use schema::Flags;
pub use schema::Schema;

pub type Result<T, E = error::ExtcapError> = result::Result<T, E>;

const DEFAULT_USAGE_EXAMPLE: &str = "--extcap-interfaces";
const HELP_TEMPLATE: &str = "{before-help}USAGE:\n{usage}\n\nOPTIONS:\n{options}{after-help}";

pub struct App<T: Extcap> {
    tool: T,
    name: String,
    usage: String,
    help_page: String,
    version: VersionInfo,
    usage_examples: Vec<String>,
    opener: Box<dyn PipeOpener>,
}

impl<T: Extcap> App<T> {
    pub fn new(tool: T) -> App<T> {
        App {
            tool,
            name: String::new(),
            usage: String::new(),
            help_page: String::new(),
            version: VersionInfo::default(),
            usage_examples: Vec::new(),
            opener: Box::new(FifoOpener),
        }
    }
    /// Application name used in help output. Defaults to the file name of
    /// the running binary.
    pub fn name(mut self, name: &str) -> App<T> {
        self.name = name.to_string();
        self
    }
    /// One line description.
    pub fn usage(mut self, usage: &str) -> App<T> {
        self.usage = usage.to_string();
        self
    }
    pub fn help_page(mut self, help_page: &str) -> App<T> {
        self.help_page = help_page.to_string();
        self
    }
    pub fn version(mut self, version: VersionInfo) -> App<T> {
        self.version = version;
        self
    }
    /// Add a usage example, printed after the application name, for example
    /// `--extcap-interface=sshdump --extcap-dlts`.
    /// `--extcap-interfaces` is always listed first.
    pub fn usage_example(mut self, example: &str) -> App<T> {
        self.usage_examples.push(example.to_string());
        self
    }
    /// Replace the default [`FifoOpener`].
    pub fn pipe_opener<P: PipeOpener + 'static>(mut self, opener: P) -> App<T> {
        self.opener = Box::new(opener);
        self
    }
    pub fn tool(&self) -> &T {
        &self.tool
    }
    fn command(&self, name: &str) -> Command {
        let mut usage = format!("   {} {}", name, DEFAULT_USAGE_EXAMPLE);
        for example in &self.usage_examples {
            usage.push_str(&format!("\n   {} {}", name, example));
        }
        let title = if self.usage.is_empty() {
            format!("NAME:\n   {}", name)
        } else {
            format!("NAME:\n   {} - {}", name, self.usage)
        };
        // Caller text only goes in as tag values, never into the template.
        let mut cmd = Command::new(name.to_string())
            .about(self.usage.clone())
            .before_help(title)
            .override_usage(usage)
            .help_template(HELP_TEMPLATE);
        if !self.help_page.is_empty() {
            cmd = cmd.after_help(format!("DESCRIPTION:\n   {}", self.help_page));
        }
        cmd
    }
    /// Build the flag schema for this tool. Fails before any argument is
    /// looked at if one of the declared options cannot become a flag.
    pub fn schema(&self, name: &str) -> Result<Schema> {
        Schema::new(self.command(name)).with_options(self.tool.all_config_options())
    }
    /// Parse `args` (program name first) and run the requested mode, writing
    /// protocol output to `out`.
    pub fn try_run_from<I, A>(&self, args: I, out: &mut dyn Write) -> Result<Mode>
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let name = if self.name.is_empty() {
            args.first()
                .and_then(|arg0| Path::new(arg0).file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("extcap"))
        } else {
            self.name.clone()
        };

        let flag_schema = self.schema(&name)?;
        let help = flag_schema.render_help();
        let flags = match flag_schema.parse(args) {
            Ok(flags) => flags,
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                write!(out, "{}", help)?;
                out.flush()?;
                return Ok(Mode::Help);
            }
            Err(e) => return Err(e.into()),
        };
        logging::init(&flags);
        if let Some(v) = flags.get_str(schema::EXTCAP_VERSION) {
            debug!("requested by Wireshark {}", v);
        }

        let version = self.version.clone().with_defaults();
        let dispatcher = Dispatcher::new(&self.tool, self.opener.as_ref(), &version, &help);
        dispatcher.dispatch(&flags, out)
    }
    /// Run with the process arguments. Errors go to stderr with exit status 1.
    pub fn run(&self) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = self.try_run_from(std::env::args_os(), &mut out) {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

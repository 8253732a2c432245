use extcap::App;
use extcap::BoxError;
use extcap::CaptureInterface;
use extcap::CaptureOptions;
use extcap::ConfigOption;
use extcap::Dlt;
use extcap::Extcap;
use extcap::ExtcapError;
use extcap::Mode;
use extcap::OptionValue;
use extcap::Sink;
use extcap::VersionInfo;
use std::cell::Cell;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

#[derive(Default)]
struct Record {
    capture_calls: usize,
    iface: String,
    filter: String,
    opts: CaptureOptions,
}

#[derive(Default, Clone)]
struct Remote {
    global: Vec<ConfigOption>,
    record: Rc<RefCell<Record>>,
}

impl Extcap for Remote {
    fn interfaces(&self) -> Result<Vec<CaptureInterface>, BoxError> {
        Ok(vec![CaptureInterface::new("eth0", "Ethernet")])
    }
    fn dlt(&self, _iface: &str) -> Result<Dlt, BoxError> {
        Ok(Dlt::new(1, "EN10MB", "Ethernet"))
    }
    fn has_config_options(&self) -> bool {
        !self.global.is_empty()
    }
    fn config_options(&self, _iface: &str) -> Result<Vec<ConfigOption>, BoxError> {
        Ok(self.global.clone())
    }
    fn all_config_options(&self) -> Vec<ConfigOption> {
        self.global.clone()
    }
    fn capture(
        &self,
        iface: &str,
        mut fifo: Sink,
        filter: &str,
        opts: &CaptureOptions,
    ) -> Result<(), BoxError> {
        fifo.write_all(b"capture data")?;
        let mut record = self.record.borrow_mut();
        record.capture_calls += 1;
        record.iface = iface.to_string();
        record.filter = filter.to_string();
        record.opts = opts.clone();
        Ok(())
    }
}

fn run(app: &App<Remote>, args: &[&str]) -> (Result<Mode, ExtcapError>, String) {
    let mut out = Vec::new();
    let ret = app.try_run_from(args.iter().copied(), &mut out);
    (ret, String::from_utf8(out).unwrap())
}

#[test]
fn list_interfaces_scenario() {
    let app = App::new(Remote::default()).version(VersionInfo::new("1.0.0", "https://example.org/help"));
    let (ret, out) = run(&app, &["remote", "--extcap-interfaces", "--extcap-version=4.2"]);
    assert_eq!(ret.unwrap(), Mode::ListInterfaces);
    assert_eq!(
        out,
        "extcap {version=1.0.0}{help=https://example.org/help}\ninterface {value=eth0}{display=Ethernet}\n"
    );
}

#[test]
fn list_dlts_scenario() {
    let app = App::new(Remote::default());
    let (ret, out) = run(&app, &["remote", "--extcap-dlts", "--extcap-interface=eth0"]);
    assert!(ret.is_ok());
    assert_eq!(out, "dlt {number=1}{name=EN10MB}{display=Ethernet}\n");
}

#[test]
fn list_config_lines() {
    let tool = Remote {
        global: vec![
            ConfigOption::string("remote-host", "Remote host", "localhost"),
            ConfigOption::integer("remote-port", "Remote port", 22),
        ],
        ..Default::default()
    };
    let app = App::new(tool);
    let (ret, out) = run(&app, &["remote", "--extcap-config", "--extcap-interface", "eth0"]);
    assert!(ret.is_ok());
    assert_eq!(
        out,
        "arg {number=0}{call=--remote-host}{display=Remote host}{type=string}{default=localhost}{required=false}\n\
         arg {number=1}{call=--remote-port}{display=Remote port}{type=integer}{default=22}{required=false}\n"
    );
}

#[test]
fn capture_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let fifo = dir.path().join("p");
    fs::write(&fifo, b"").unwrap();
    let fifo_arg = format!("--fifo={}", fifo.display());

    let tool = Remote {
        global: vec![ConfigOption::boolean("verbose", "Verbose", false)],
        ..Default::default()
    };
    let record = tool.record.clone();
    let app = App::new(tool);
    let (ret, out) = run(
        &app,
        &[
            "remote",
            "--capture",
            "--extcap-interface=eth0",
            &fifo_arg,
            "--extcap-capture-filter=tcp",
            "--verbose=true",
        ],
    );
    assert_eq!(ret.unwrap(), Mode::Capture);
    assert!(out.is_empty());
    assert_eq!(fs::read(&fifo).unwrap(), b"capture data");

    let record = record.borrow();
    assert_eq!(record.capture_calls, 1);
    assert_eq!(record.iface, "eth0");
    assert_eq!(record.filter, "tcp");
    assert_eq!(record.opts.get("verbose"), Some(&OptionValue::Bool(true)));
    assert!(!record.opts.contains("extcap-interface"));
    assert!(!record.opts.contains("fifo"));
    assert!(!record.opts.contains("extcap-capture-filter"));
}

#[test]
fn capture_open_error_skips_callback() {
    let tool = Remote::default();
    let record = tool.record.clone();
    let app = App::new(tool);
    let (ret, _) = run(
        &app,
        &["remote", "--capture", "--extcap-interface=eth0", "--fifo=/no/such/fifo"],
    );
    match ret {
        Err(ExtcapError::OpenPipe { path, .. }) => assert_eq!(path, Path::new("/no/such/fifo")),
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(record.borrow().capture_calls, 0);
}

#[test]
fn custom_opener_error_is_returned_as_is() {
    let tool = Remote::default();
    let record = tool.record.clone();
    let app = App::new(tool).pipe_opener(|_: &Path| -> Result<Sink, ExtcapError> {
        Err(ExtcapError::Callback("socket refused".into()))
    });
    let (ret, _) = run(&app, &["remote", "--capture", "--extcap-interface=eth0", "--fifo=tcp://x"]);
    assert_eq!(ret.unwrap_err().to_string(), "socket refused");
    assert_eq!(record.borrow().capture_calls, 0);
}

#[test]
fn missing_fifo() {
    let tool = Remote::default();
    let record = tool.record.clone();
    let opened = Rc::new(Cell::new(0));
    let counter = opened.clone();
    let app = App::new(tool).pipe_opener(move |_: &Path| -> Result<Sink, ExtcapError> {
        counter.set(counter.get() + 1);
        Ok(Box::new(std::io::sink()))
    });
    let (ret, _) = run(&app, &["remote", "--capture", "--extcap-interface=eth0"]);
    assert!(matches!(ret, Err(ExtcapError::NoPipeProvided)));
    assert_eq!(record.borrow().capture_calls, 0);
    assert_eq!(opened.get(), 0);

    let (ret, _) = run(&app, &["remote", "--capture", "--fifo=/tmp/p"]);
    assert!(matches!(ret, Err(ExtcapError::NoInterfaceSpecified)));
    assert_eq!(opened.get(), 0);
}

#[test]
fn unsupported_global_option_aborts_every_mode() {
    let tool = Remote {
        global: vec![ConfigOption::selector("channel", "Channel")],
        ..Default::default()
    };
    let app = App::new(tool);
    for args in [
        vec!["remote", "--extcap-interfaces"],
        vec!["remote", "--extcap-dlts", "--extcap-interface=eth0"],
        vec!["remote"],
    ] {
        let (ret, out) = run(&app, &args);
        assert!(matches!(ret, Err(ExtcapError::UnsupportedOption { .. })));
        assert!(out.is_empty());
    }
}

#[test]
fn filter_validation_succeeds() {
    let app = App::new(Remote::default());
    let (ret, out) = run(
        &app,
        &["remote", "--extcap-interface=eth0", "--extcap-capture-filter=port 22"],
    );
    assert_eq!(ret.unwrap(), Mode::ValidateCaptureFilter);
    assert!(out.is_empty());
}

#[test]
fn help_output() {
    let app = App::new(Remote::default())
        .usage("capture from a remote host")
        .help_page("Streams packets captured over ssh.")
        .usage_example("--extcap-interface=remote --extcap-dlts");
    let (ret, out) = run(&app, &["/usr/lib/wireshark/extcap/remote"]);
    assert_eq!(ret.unwrap(), Mode::Help);
    assert!(out.contains("remote - capture from a remote host"));
    assert!(out.contains("   remote --extcap-interfaces\n   remote --extcap-interface=remote --extcap-dlts"));
    assert!(out.contains("Streams packets captured over ssh."));
    assert!(out.contains("--fifo"));

    let (ret, help) = run(&app, &["remote", "--help"]);
    assert_eq!(ret.unwrap(), Mode::Help);
    assert_eq!(help, out);
}

#[test]
fn help_text_with_braces_is_printed_verbatim() {
    let app = App::new(Remote::default())
        .usage("tool for {bin} and {options}")
        .help_page("Reads {usage} from {name}.");
    let (ret, out) = run(&app, &["t"]);
    assert_eq!(ret.unwrap(), Mode::Help);
    assert!(out.contains("t - tool for {bin} and {options}\n"));
    assert!(out.contains("Reads {usage} from {name}."));
    let name_line = out.lines().find(|l| l.contains("tool for")).unwrap();
    assert!(!name_line.contains("--extcap-version"));
    assert_eq!(out.matches("--extcap-version").count(), 1);
}

#[test]
fn unknown_flag_is_an_error() {
    let app = App::new(Remote::default());
    let (ret, _) = run(&app, &["remote", "--no-such-flag"]);
    assert!(matches!(ret, Err(ExtcapError::Args(_))));
}

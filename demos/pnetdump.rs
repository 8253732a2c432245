//! Minimal extcap tool on top of pnet.
//!
//! Install it into Wireshark's extcap directory (see Help > About > Folders)
//! and the system interfaces show up as `pnetdump:<name>`.
use extcap::App;
use extcap::BoxError;
use extcap::CaptureInterface;
use extcap::CaptureOptions;
use extcap::ConfigOption;
use extcap::Dlt;
use extcap::Extcap;
use extcap::ExtcapError;
use extcap::Sink;
use extcap::VersionInfo;
use extcap::pcap::LinkType;
use extcap::pcap::PcapByteOrder;
use extcap::pcap::PcapWriter;
use pnet::datalink;
use pnet::datalink::Channel::Ethernet;
use pnet::datalink::Config;
use pnet::datalink::NetworkInterface;
use std::io::ErrorKind;
use tracing::debug;
use tracing::info;

const PREFIX: &str = "pnetdump:";

struct PnetDump;

impl PnetDump {
    fn find(iface: &str) -> Result<NetworkInterface, BoxError> {
        let name = iface.strip_prefix(PREFIX).unwrap_or(iface);
        datalink::interfaces()
            .into_iter()
            .find(|n| n.name == name)
            .ok_or_else(|| format!("unable to found interface: {}", name).into())
    }
}

impl Extcap for PnetDump {
    fn interfaces(&self) -> Result<Vec<CaptureInterface>, BoxError> {
        let mut ret = Vec::new();
        for n in datalink::interfaces() {
            let display = if n.description.is_empty() {
                format!("pnet capture on {}", n.name)
            } else {
                n.description.clone()
            };
            ret.push(CaptureInterface::new(&format!("{}{}", PREFIX, n.name), &display));
        }
        Ok(ret)
    }
    fn dlt(&self, iface: &str) -> Result<Dlt, BoxError> {
        Self::find(iface)?;
        Ok(LinkType::Ethernet.dlt("Ethernet"))
    }
    fn has_config_options(&self) -> bool {
        true
    }
    fn config_options(&self, _iface: &str) -> Result<Vec<ConfigOption>, BoxError> {
        Ok(self.all_config_options())
    }
    fn all_config_options(&self) -> Vec<ConfigOption> {
        vec![
            ConfigOption::integer("count", "Stop after this many packets (0 = never)", 0),
            ConfigOption::boolean("promisc", "Promiscuous mode", true),
        ]
    }
    fn capture(
        &self,
        iface: &str,
        fifo: Sink,
        filter: &str,
        opts: &CaptureOptions,
    ) -> Result<(), BoxError> {
        let interface = Self::find(iface)?;
        let count = opts.get_integer("count").unwrap_or(0);
        let config = Config {
            promiscuous: opts.get_bool("promisc").unwrap_or(true),
            ..Default::default()
        };
        if !filter.is_empty() {
            info!("capture filter {:?} is ignored by pnetdump", filter);
        }

        let mut rx = match datalink::channel(&interface, config) {
            Ok(Ethernet(_tx, rx)) => rx,
            Ok(_) => return Err("unhandled channel type".into()),
            Err(e) => return Err(format!("unable to create channel: {}", e).into()),
        };
        let mut writer = PcapWriter::new(fifo, LinkType::Ethernet, PcapByteOrder::WiresharkDefault)?;
        loop {
            let data = rx.next()?;
            let written = writer
                .write_packet(data)
                .and_then(|_| writer.flush());
            match written {
                Ok(_) => (),
                // Wireshark closed its end of the FIFO
                Err(ExtcapError::Io(e)) if e.kind() == ErrorKind::BrokenPipe => break,
                Err(e) => return Err(e.into()),
            }
            if count > 0 && writer.packets() >= count as u64 {
                break;
            }
        }
        debug!("{} packets written", writer.packets());
        Ok(())
    }
}

fn main() {
    App::new(PnetDump)
        .usage("capture Ethernet frames with pnet")
        .version(VersionInfo::new("0.1.0", ""))
        .usage_example("--extcap-interface=pnetdump:eth0 --extcap-dlts")
        .usage_example("--extcap-interface=pnetdump:eth0 --extcap-config")
        .usage_example("--extcap-interface=pnetdump:eth0 --count 100 --fifo=FILENAME --capture")
        .run();
}

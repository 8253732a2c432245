//! Classic pcap stream, the format Wireshark reads from the extcap FIFO.
//!
//! The stream is a file header followed by packet records and is written
//! incrementally, so the capture callback can push packets as they arrive.
use byteorder::BigEndian;
use byteorder::ByteOrder;
use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use serde::Deserialize;
use serde::Serialize;
use std::io::Read;
use std::io::Write;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;
use strum::IntoEnumIterator;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;

use crate::error::ExtcapError;
use crate::protocol::Dlt;

pub const DEFAULT_SNAPLEN: u32 = 262144;
const MAGIC_MICROS: u32 = 0xa1b2c3d4;
const MAGIC_NANOS: u32 = 0xa1b23c4d;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcapByteOrder {
    BigEndian,
    LittleEndian,
    WiresharkDefault, // LittleEndian
}

/// Link types from the tcpdump.org registry, displayed with their DLT name.
#[repr(u32)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum LinkType {
    #[strum(serialize = "NULL")]
    Null = 0,
    #[strum(serialize = "EN10MB")]
    Ethernet = 1,
    #[strum(serialize = "AX25")]
    Ax25 = 3,
    #[strum(serialize = "IEEE802")]
    Ieee8025 = 6,
    #[strum(serialize = "ARCNET")]
    ArcnetBsd = 7,
    #[strum(serialize = "SLIP")]
    Slip = 8,
    #[strum(serialize = "PPP")]
    Ppp = 9,
    #[strum(serialize = "FDDI")]
    Fddi = 10,
    #[strum(serialize = "PPP_SERIAL")]
    PppHdlc = 50,
    #[strum(serialize = "PPP_ETHER")]
    PppEther = 51,
    #[strum(serialize = "RAW")]
    Raw = 101,
    #[strum(serialize = "C_HDLC")]
    CHdlc = 104,
    #[strum(serialize = "IEEE802_11")]
    Ieee80211 = 105,
    #[strum(serialize = "FRELAY")]
    Frelay = 107,
    #[strum(serialize = "LOOP")]
    Loop = 108,
    #[strum(serialize = "LINUX_SLL")]
    LinuxSll = 113,
    #[strum(serialize = "PFLOG")]
    Pflog = 117,
    #[strum(serialize = "PRISM_HEADER")]
    Ieee80211Prism = 119,
    #[strum(serialize = "IEEE802_11_RADIO")]
    Ieee80211Radiotap = 127,
    #[strum(serialize = "USER0")]
    User0 = 147,
    #[strum(serialize = "USER1")]
    User1 = 148,
    #[strum(serialize = "USER2")]
    User2 = 149,
    #[strum(serialize = "USER3")]
    User3 = 150,
    #[strum(serialize = "BLUETOOTH_HCI_H4")]
    BluetoothHciH4 = 187,
    #[strum(serialize = "USB_LINUX")]
    UsbLinux = 189,
    #[strum(serialize = "PPI")]
    Ppi = 192,
    #[strum(serialize = "IEEE802_15_4")]
    Ieee802154WithFcs = 195,
    #[strum(serialize = "USB_LINUX_MMAPPED")]
    UsbLinuxMmapped = 220,
    #[strum(serialize = "IPV4")]
    Ipv4 = 228,
    #[strum(serialize = "IPV6")]
    Ipv6 = 229,
    #[strum(serialize = "NFLOG")]
    Nflog = 239,
    #[strum(serialize = "USBPCAP")]
    UsbPcap = 249,
    #[strum(serialize = "BLUETOOTH_LE_LL")]
    BluetoothLeLl = 251,
    #[strum(serialize = "WIRESHARK_UPPER_PDU")]
    WiresharkUpperPdu = 252,
    #[strum(serialize = "NETLINK")]
    Netlink = 253,
    #[strum(serialize = "BLUETOOTH_LINUX_MONITOR")]
    BluetoothLinuxMonitor = 254,
    #[strum(serialize = "LINUX_SLL2")]
    LinuxSll2 = 276,
}

impl LinkType {
    pub fn to_u32(self) -> u32 {
        self as u32
    }
    pub fn from_u32(value: u32) -> Option<Self> {
        LinkType::iter().find(|&e| e as u32 == value)
    }
    /// DLT record for this link type with a custom display name.
    pub fn dlt(self, display: &str) -> Dlt {
        Dlt::new(self.to_u32(), &self.to_string(), display)
    }
}

impl From<LinkType> for Dlt {
    fn from(linktype: LinkType) -> Dlt {
        let name = linktype.to_string();
        Dlt::new(linktype.to_u32(), &name, &name)
    }
}

// File Header
// from https://www.ietf.org/archive/id/draft-gharris-opsawg-pcap-01.html#name-file-header
//
//                         1                   2                   3
//     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//  0 |                          Magic Number                         |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//  4 |          Major Version        |         Minor Version         |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//  8 |                           Reserved1                           |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// 12 |                           Reserved2                           |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// 16 |                            SnapLen                            |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// 20 | FCS |f|0 0 0 0 0 0 0 0 0 0 0 0|         LinkType              |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// 0xa1b2c3d4 for microsecond timestamps, 0xa1b23c4d for nanoseconds.
    pub magic_number: u32,
    pub major_version: u16,
    pub minor_version: u16,
    /// Maximum number of octets stored per packet.
    pub snaplen: u32,
    /// Wireshark ignores the FCS bits and reads the whole 32 bits as link type.
    pub linktype: LinkType,
}

impl FileHeader {
    pub fn new(linktype: LinkType, snaplen: u32) -> FileHeader {
        FileHeader {
            magic_number: MAGIC_MICROS,
            major_version: 2,
            minor_version: 4,
            snaplen,
            linktype,
        }
    }
    pub fn nanos(&self) -> bool {
        self.magic_number == MAGIC_NANOS
    }
    fn write_as<B: ByteOrder, W: Write>(&self, w: &mut W) -> Result<(), ExtcapError> {
        w.write_u32::<B>(self.magic_number)?;
        w.write_u16::<B>(self.major_version)?;
        w.write_u16::<B>(self.minor_version)?;
        // reserved1 and reserved2
        w.write_u32::<B>(0)?;
        w.write_u32::<B>(0)?;
        w.write_u32::<B>(self.snaplen)?;
        w.write_u32::<B>(self.linktype.to_u32())?;
        Ok(())
    }
    pub fn write<W: Write>(&self, w: &mut W, pbo: PcapByteOrder) -> Result<(), ExtcapError> {
        match pbo {
            PcapByteOrder::LittleEndian | PcapByteOrder::WiresharkDefault => {
                self.write_as::<LittleEndian, W>(w)
            }
            PcapByteOrder::BigEndian => self.write_as::<BigEndian, W>(w),
        }
    }
    fn read_as<B: ByteOrder, R: Read>(r: &mut R) -> Result<FileHeader, ExtcapError> {
        let magic_number = r.read_u32::<B>()?;
        let major_version = r.read_u16::<B>()?;
        let minor_version = r.read_u16::<B>()?;
        let _reserved1 = r.read_u32::<B>()?;
        let _reserved2 = r.read_u32::<B>()?;
        let snaplen = r.read_u32::<B>()?;
        let linktype_value = r.read_u32::<B>()?;
        let linktype = match LinkType::from_u32(linktype_value) {
            Some(l) => l,
            None => {
                return Err(ExtcapError::UnknownLinkType {
                    linktype: linktype_value,
                });
            }
        };
        Ok(FileHeader {
            magic_number,
            major_version,
            minor_version,
            snaplen,
            linktype,
        })
    }
    pub fn read<R: Read>(r: &mut R, pbo: PcapByteOrder) -> Result<FileHeader, ExtcapError> {
        match pbo {
            PcapByteOrder::LittleEndian | PcapByteOrder::WiresharkDefault => {
                Self::read_as::<LittleEndian, R>(r)
            }
            PcapByteOrder::BigEndian => Self::read_as::<BigEndian, R>(r),
        }
    }
}

// Packet Record
// from https://www.ietf.org/archive/id/draft-gharris-opsawg-pcap-01.html#name-packet-record
//                         1                   2                   3
//     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//  0 |                      Timestamp (Seconds)                      |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//  4 |            Timestamp (Microseconds or nanoseconds)            |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//  8 |                    Captured Packet Length                     |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// 12 |                    Original Packet Length                     |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// 16 /                                                               /
//    /                          Packet Data                          /
//    /                        variable length                        /
//    /                                                               /
//    +---------------------------------------------------------------+

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    pub ts_sec: u32,
    /// Microseconds or nanoseconds, following the file header magic.
    pub ts_frac: u32,
    pub original_packet_length: u32,
    /// Captured bytes, already cut to the snap length.
    pub packet_data: Vec<u8>,
}

impl PacketRecord {
    /// Record stamped with the current time.
    pub fn now(packet_data: &[u8], snaplen: u32, nanos: bool) -> Result<PacketRecord, ExtcapError> {
        let dura = SystemTime::now().duration_since(UNIX_EPOCH)?;
        let ts_frac = if nanos {
            dura.subsec_nanos()
        } else {
            dura.subsec_micros()
        };
        Ok(Self::with_timestamp(
            packet_data,
            snaplen,
            dura.as_secs() as u32,
            ts_frac,
        ))
    }
    pub fn with_timestamp(packet_data: &[u8], snaplen: u32, ts_sec: u32, ts_frac: u32) -> PacketRecord {
        let captured = packet_data.len().min(snaplen as usize);
        PacketRecord {
            ts_sec,
            ts_frac,
            original_packet_length: packet_data.len() as u32,
            packet_data: packet_data[..captured].to_vec(),
        }
    }
    pub fn captured_packet_length(&self) -> u32 {
        self.packet_data.len() as u32
    }
    fn write_as<B: ByteOrder, W: Write>(&self, w: &mut W) -> Result<(), ExtcapError> {
        w.write_u32::<B>(self.ts_sec)?;
        w.write_u32::<B>(self.ts_frac)?;
        w.write_u32::<B>(self.captured_packet_length())?;
        w.write_u32::<B>(self.original_packet_length)?;
        w.write_all(&self.packet_data)?;
        Ok(())
    }
    pub fn write<W: Write>(&self, w: &mut W, pbo: PcapByteOrder) -> Result<(), ExtcapError> {
        match pbo {
            PcapByteOrder::LittleEndian | PcapByteOrder::WiresharkDefault => {
                self.write_as::<LittleEndian, W>(w)
            }
            PcapByteOrder::BigEndian => self.write_as::<BigEndian, W>(w),
        }
    }
    fn read_as<B: ByteOrder, R: Read>(r: &mut R) -> Result<PacketRecord, ExtcapError> {
        let ts_sec = r.read_u32::<B>()?;
        let ts_frac = r.read_u32::<B>()?;
        let captured_packet_length = r.read_u32::<B>()?;
        let original_packet_length = r.read_u32::<B>()?;
        let mut packet_data = vec![0u8; captured_packet_length as usize];
        r.read_exact(&mut packet_data)?;
        Ok(PacketRecord {
            ts_sec,
            ts_frac,
            original_packet_length,
            packet_data,
        })
    }
    pub fn read<R: Read>(r: &mut R, pbo: PcapByteOrder) -> Result<PacketRecord, ExtcapError> {
        match pbo {
            PcapByteOrder::LittleEndian | PcapByteOrder::WiresharkDefault => {
                Self::read_as::<LittleEndian, R>(r)
            }
            PcapByteOrder::BigEndian => Self::read_as::<BigEndian, R>(r),
        }
    }
}

/// Writes a pcap stream into the capture sink.
/// ```rust
/// use extcap::pcap::LinkType;
/// use extcap::pcap::PcapByteOrder;
/// use extcap::pcap::PcapWriter;
///
/// let mut writer = PcapWriter::new(Vec::new(), LinkType::Ethernet, PcapByteOrder::WiresharkDefault).unwrap();
/// writer.write_packet(&[0u8; 60]).unwrap();
/// let bytes = writer.into_inner();
/// assert_eq!(bytes.len(), 24 + 16 + 60);
/// ```
pub struct PcapWriter<W: Write> {
    inner: W,
    header: FileHeader,
    pbo: PcapByteOrder,
    packets: u64,
}

impl<W: Write> PcapWriter<W> {
    pub fn new(inner: W, linktype: LinkType, pbo: PcapByteOrder) -> Result<PcapWriter<W>, ExtcapError> {
        Self::with_header(inner, FileHeader::new(linktype, DEFAULT_SNAPLEN), pbo)
    }
    /// Write `header` right away; Wireshark starts decoding once it has it.
    pub fn with_header(
        mut inner: W,
        header: FileHeader,
        pbo: PcapByteOrder,
    ) -> Result<PcapWriter<W>, ExtcapError> {
        header.write(&mut inner, pbo)?;
        inner.flush()?;
        Ok(PcapWriter {
            inner,
            header,
            pbo,
            packets: 0,
        })
    }
    pub fn header(&self) -> &FileHeader {
        &self.header
    }
    pub fn packets(&self) -> u64 {
        self.packets
    }
    /// Append one packet stamped with the current time.
    pub fn write_packet(&mut self, data: &[u8]) -> Result<(), ExtcapError> {
        let record = PacketRecord::now(data, self.header.snaplen, self.header.nanos())?;
        self.write_record(&record)
    }
    pub fn write_record(&mut self, record: &PacketRecord) -> Result<(), ExtcapError> {
        record.write(&mut self.inner, self.pbo)?;
        self.packets += 1;
        Ok(())
    }
    pub fn flush(&mut self) -> Result<(), ExtcapError> {
        self.inner.flush()?;
        Ok(())
    }
    pub fn into_inner(self) -> W {
        self.inner
    }
}

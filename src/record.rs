//! Resource records and the per-type record codec.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::bitmap::Bitmap;
use crate::name::{self, Name, NameMap};
use crate::wire;
use crate::{Error, TYPE_A, TYPE_AAAA, TYPE_NSEC, TYPE_PTR, TYPE_SRV, TYPE_TXT};

/// TXT record attributes: an insertion-ordered key/value map.
///
/// A key that appeared on the wire without an `=` separator holds `None`;
/// `Some(vec![])` is a key with an explicitly empty value. Inserting an
/// existing key overwrites its value in place (last-wins), which diverges
/// deliberately from the first-wins rule of RFC 6763 §6.4.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxtAttributes {
    entries: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl TxtAttributes {
    pub fn new() -> TxtAttributes {
        TxtAttributes::default()
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: Option<Vec<u8>>) {
        let key = key.into();
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks up a key. The outer `Option` is presence of the key, the inner
    /// one whether the key carried a value.
    pub fn get(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], Option<&[u8]>)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_deref()))
    }
}

/// Payload of a resource record, tagged by record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    PTR(Name),
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },
    TXT(TxtAttributes),
    NSEC {
        next_domain: Name,
        bitmap: Bitmap,
    },
    /// A type the codec does not interpret. Its rdata is skipped on decode
    /// and written empty on encode.
    Unknown(u16),
}

impl RData {
    /// The numeric record type code.
    pub fn rtype(&self) -> u16 {
        match *self {
            RData::A(..) => TYPE_A,
            RData::AAAA(..) => TYPE_AAAA,
            RData::PTR(..) => TYPE_PTR,
            RData::SRV { .. } => TYPE_SRV,
            RData::TXT(..) => TYPE_TXT,
            RData::NSEC { .. } => TYPE_NSEC,
            RData::Unknown(rtype) => rtype,
        }
    }
}

/// A resource record from any of the three RR sections.
///
/// `flush_cache` is the mDNS cache-flush bit carried in the top bit of the
/// wire class field (RFC 6762 §10.2); the class itself is implicitly IN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: Name,
    pub flush_cache: bool,
    pub ttl: u32,
    pub rdata: RData,
}

impl Record {
    pub fn rtype(&self) -> u16 {
        self.rdata.rtype()
    }
}

pub(crate) fn parse_record(packet: &[u8], offset: &mut usize) -> Result<Record, Error> {
    let name = name::parse_name(packet, offset)?;
    let rtype = wire::read_u16(packet, offset)?;
    let class = wire::read_u16(packet, offset)?;
    let ttl = wire::read_u32(packet, offset)?;
    let rdlength = wire::read_u16(packet, offset)?;

    let rdata = match rtype {
        TYPE_A => RData::A(Ipv4Addr::from(wire::read_u32(packet, offset)?)),
        TYPE_AAAA => {
            let end = *offset + 16;
            if end > packet.len() {
                return Err(Error::MalformedRecord);
            }
            let mut octets = [0; 16];
            octets.copy_from_slice(&packet[*offset..end]);
            *offset = end;
            RData::AAAA(Ipv6Addr::from(octets))
        }
        TYPE_PTR => RData::PTR(name::parse_name(packet, offset)?),
        TYPE_SRV => {
            let priority = wire::read_u16(packet, offset)?;
            let weight = wire::read_u16(packet, offset)?;
            let port = wire::read_u16(packet, offset)?;
            let target = name::parse_name(packet, offset)?;
            RData::SRV {
                priority,
                weight,
                port,
                target,
            }
        }
        TYPE_TXT => {
            let mut attributes = TxtAttributes::new();
            let end = *offset + usize::from(rdlength);
            while *offset < end {
                let length = wire::read_u8(packet, offset)?;
                if length == 0 {
                    break;
                }
                let attr_end = *offset + usize::from(length);
                if attr_end > packet.len() {
                    return Err(Error::MalformedRecord);
                }
                let attr = &packet[*offset..attr_end];
                *offset = attr_end;
                match attr.iter().position(|&b| b == b'=') {
                    Some(eq) => attributes.insert(&attr[..eq], Some(attr[eq + 1..].to_vec())),
                    None => attributes.insert(attr, None),
                }
            }
            RData::TXT(attributes)
        }
        TYPE_NSEC => {
            let next_domain = name::parse_name(packet, offset)?;
            let window = wire::read_u8(packet, offset)?;
            let length = wire::read_u8(packet, offset)?;
            if window != 0 {
                return Err(Error::InvalidNsecWindow(window));
            }
            let end = *offset + usize::from(length);
            if end > packet.len() {
                return Err(Error::MalformedRecord);
            }
            let bitmap = Bitmap::from_data(&packet[*offset..end]);
            *offset = end;
            RData::NSEC {
                next_domain,
                bitmap,
            }
        }
        _ => {
            *offset += usize::from(rdlength);
            RData::Unknown(rtype)
        }
    };

    Ok(Record {
        name,
        flush_cache: class & 0x8000 != 0,
        ttl,
        rdata,
    })
}

pub(crate) fn write_record(
    packet: &mut Vec<u8>,
    offset: &mut usize,
    record: &Record,
    names: &mut NameMap,
) {
    name::write_name(packet, offset, &record.name, names);
    wire::write_u16(packet, offset, record.rtype());
    wire::write_u16(packet, offset, if record.flush_cache { 0x8001 } else { 0x0001 });
    wire::write_u32(packet, offset, record.ttl);

    // The payload goes into a scratch buffer because its length is only
    // known afterwards, while `offset` keeps counting in packet coordinates
    // (skipping the 2-byte rdlength) so that names inside the payload
    // compress against the final packet layout.
    *offset += 2;
    let mut data = Vec::new();
    match &record.rdata {
        RData::A(address) => wire::write_u32(&mut data, offset, u32::from(*address)),
        RData::AAAA(address) => {
            data.extend_from_slice(&address.octets());
            *offset += 16;
        }
        RData::PTR(target) => name::write_name(&mut data, offset, target, names),
        RData::SRV {
            priority,
            weight,
            port,
            target,
        } => {
            wire::write_u16(&mut data, offset, *priority);
            wire::write_u16(&mut data, offset, *weight);
            wire::write_u16(&mut data, offset, *port);
            name::write_name(&mut data, offset, target, names);
        }
        RData::TXT(attributes) => {
            if attributes.is_empty() {
                // An empty attribute set still needs one zero-length entry.
                wire::write_u8(&mut data, offset, 0);
            } else {
                for (key, value) in attributes.iter() {
                    let mut entry = key.to_vec();
                    if let Some(value) = value {
                        entry.push(b'=');
                        entry.extend_from_slice(value);
                    }
                    wire::write_u8(&mut data, offset, entry.len() as u8);
                    data.extend_from_slice(&entry);
                    *offset += entry.len();
                }
            }
        }
        RData::NSEC {
            next_domain,
            bitmap,
        } => {
            name::write_name(&mut data, offset, next_domain, names);
            wire::write_u8(&mut data, offset, 0);
            wire::write_u8(&mut data, offset, bitmap.len() as u8);
            data.extend_from_slice(bitmap.data());
            *offset += bitmap.len();
        }
        RData::Unknown(..) => {}
    }
    *offset -= 2;
    wire::write_u16(packet, offset, data.len() as u16);
    packet.extend_from_slice(&data);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(record: &Record) -> Vec<u8> {
        let mut packet = Vec::new();
        let mut offset = 0;
        write_record(&mut packet, &mut offset, record, &mut NameMap::new());
        assert_eq!(offset, packet.len());
        packet
    }

    fn roundtrip(record: &Record) -> Record {
        let packet = encode(record);
        let mut offset = 0;
        let parsed = parse_record(&packet, &mut offset).unwrap();
        assert_eq!(offset, packet.len());
        parsed
    }

    #[test]
    fn a_record_bytes() {
        let record = Record {
            name: Name::from("host.local."),
            flush_cache: true,
            ttl: 120,
            rdata: RData::A(Ipv4Addr::new(192, 168, 1, 10)),
        };
        let packet = encode(&record);
        assert_eq!(
            &packet[..],
            &b"\x04host\x05local\x00\x00\x01\x80\x01\x00\x00\x00\x78\x00\x04\xc0\xa8\x01\x0a"[..],
        );
        assert_eq!(roundtrip(&record), record);
    }

    #[test]
    fn aaaa_record_roundtrip() {
        let record = Record {
            name: Name::from("host.local."),
            flush_cache: false,
            ttl: 4500,
            rdata: RData::AAAA("2001:db8::1".parse().unwrap()),
        };
        let packet = encode(&record);
        // rdlength is the last field before the 16 payload bytes.
        let rdlength = &packet[packet.len() - 18..packet.len() - 16];
        assert_eq!(rdlength, [0x00, 0x10]);
        assert_eq!(roundtrip(&record), record);
    }

    #[test]
    fn aaaa_record_truncated_payload_fails() {
        let mut packet = encode(&Record {
            name: Name::from("host.local."),
            flush_cache: false,
            ttl: 0,
            rdata: RData::AAAA(Ipv6Addr::LOCALHOST),
        });
        packet.truncate(packet.len() - 1);
        let mut offset = 0;
        assert_eq!(parse_record(&packet, &mut offset), Err(Error::MalformedRecord));
    }

    #[test]
    fn srv_record_roundtrip() {
        let record = Record {
            name: Name::from("gadget._http._tcp.local."),
            flush_cache: true,
            ttl: 120,
            rdata: RData::SRV {
                priority: 0,
                weight: 5,
                port: 8080,
                target: Name::from("gadget.local."),
            },
        };
        assert_eq!(roundtrip(&record), record);
    }

    #[test]
    fn txt_attributes_last_wins() {
        // "key=value" followed by a bare "key".
        let rdata = b"\x09key=value\x03key";
        let mut packet = Vec::new();
        let mut offset = 0;
        name::write_name(&mut packet, &mut offset, &Name::from("x.local."), &mut NameMap::new());
        wire::write_u16(&mut packet, &mut offset, TYPE_TXT);
        wire::write_u16(&mut packet, &mut offset, 0x0001);
        wire::write_u32(&mut packet, &mut offset, 0);
        wire::write_u16(&mut packet, &mut offset, rdata.len() as u16);
        packet.extend_from_slice(rdata);

        let mut offset = 0;
        let record = parse_record(&packet, &mut offset).unwrap();
        match record.rdata {
            RData::TXT(attributes) => {
                assert_eq!(attributes.len(), 1);
                assert_eq!(attributes.get(b"key"), Some(None));
            }
            other => panic!("expected TXT rdata, got {:?}", other),
        }
    }

    #[test]
    fn txt_preserves_insertion_order() {
        let mut attributes = TxtAttributes::new();
        attributes.insert("b", Some(b"2".to_vec()));
        attributes.insert("a", Some(b"1".to_vec()));
        attributes.insert("flag", None);
        let record = Record {
            name: Name::from("x.local."),
            flush_cache: false,
            ttl: 10,
            rdata: RData::TXT(attributes),
        };
        let packet = encode(&record);
        let tail = &packet[packet.len() - 13..];
        assert_eq!(tail, b"\x03b=2\x03a=1\x04flag");
        assert_eq!(roundtrip(&record), record);
    }

    #[test]
    fn txt_empty_value_differs_from_absent_value() {
        let mut attributes = TxtAttributes::new();
        attributes.insert("empty", Some(Vec::new()));
        let record = Record {
            name: Name::from("x.local."),
            flush_cache: false,
            ttl: 10,
            rdata: RData::TXT(attributes),
        };
        let packet = encode(&record);
        assert!(packet.ends_with(b"\x06empty="));
        match roundtrip(&record).rdata {
            RData::TXT(parsed) => assert_eq!(parsed.get(b"empty"), Some(Some(&b""[..]))),
            other => panic!("expected TXT rdata, got {:?}", other),
        }
    }

    #[test]
    fn txt_without_attributes_writes_one_empty_entry() {
        let record = Record {
            name: Name::from("x.local."),
            flush_cache: false,
            ttl: 10,
            rdata: RData::TXT(TxtAttributes::new()),
        };
        let packet = encode(&record);
        assert!(packet.ends_with(b"\x00\x01\x00"), "rdlength 1, payload 0x00");
        assert_eq!(roundtrip(&record), record);
    }

    #[test]
    fn txt_zero_length_entry_stops_the_scan() {
        let rdata = b"\x03a=1\x00\x03b=2";
        let mut packet = Vec::new();
        let mut offset = 0;
        name::write_name(&mut packet, &mut offset, &Name::from("x.local."), &mut NameMap::new());
        wire::write_u16(&mut packet, &mut offset, TYPE_TXT);
        wire::write_u16(&mut packet, &mut offset, 0x0001);
        wire::write_u32(&mut packet, &mut offset, 0);
        wire::write_u16(&mut packet, &mut offset, rdata.len() as u16);
        packet.extend_from_slice(rdata);

        let mut offset = 0;
        let record = parse_record(&packet, &mut offset).unwrap();
        match record.rdata {
            RData::TXT(attributes) => {
                assert_eq!(attributes.len(), 1);
                assert_eq!(attributes.get(b"a"), Some(Some(&b"1"[..])));
            }
            other => panic!("expected TXT rdata, got {:?}", other),
        }
    }

    #[test]
    fn nsec_record_roundtrip() {
        let record = Record {
            name: Name::from("gadget.local."),
            flush_cache: true,
            ttl: 120,
            rdata: RData::NSEC {
                next_domain: Name::from("gadget.local."),
                bitmap: Bitmap::from_data(vec![0x40, 0x00, 0x00, 0x08]),
            },
        };
        let parsed = roundtrip(&record);
        assert_eq!(parsed, record);
        match parsed.rdata {
            RData::NSEC { bitmap, .. } => {
                assert!(bitmap.contains(crate::TYPE_A));
                assert!(bitmap.contains(crate::TYPE_AAAA));
            }
            other => panic!("expected NSEC rdata, got {:?}", other),
        }
    }

    #[test]
    fn nsec_rejects_nonzero_window() {
        let mut packet = Vec::new();
        let mut offset = 0;
        name::write_name(&mut packet, &mut offset, &Name::from("x.local."), &mut NameMap::new());
        wire::write_u16(&mut packet, &mut offset, TYPE_NSEC);
        wire::write_u16(&mut packet, &mut offset, 0x0001);
        wire::write_u32(&mut packet, &mut offset, 0);
        wire::write_u16(&mut packet, &mut offset, 4);
        // Root next-domain, window 1, one bitmap byte.
        packet.extend_from_slice(b"\x00\x01\x01\x40");

        let mut offset = 0;
        assert_eq!(
            parse_record(&packet, &mut offset),
            Err(Error::InvalidNsecWindow(1))
        );
    }

    #[test]
    fn unknown_type_is_skipped_not_retained() {
        let mut packet = Vec::new();
        let mut offset = 0;
        name::write_name(&mut packet, &mut offset, &Name::from("x.local."), &mut NameMap::new());
        wire::write_u16(&mut packet, &mut offset, 99);
        wire::write_u16(&mut packet, &mut offset, 0x0001);
        wire::write_u32(&mut packet, &mut offset, 60);
        wire::write_u16(&mut packet, &mut offset, 3);
        packet.extend_from_slice(b"\xde\xad\xbe");

        let mut offset = 0;
        let record = parse_record(&packet, &mut offset).unwrap();
        assert_eq!(record.rdata, RData::Unknown(99));
        assert_eq!(offset, packet.len());

        // Encoding it back yields empty rdata.
        let encoded = encode(&record);
        assert!(encoded.ends_with(b"\x00\x63\x00\x01\x00\x00\x00\x3c\x00\x00"));
    }

    #[test]
    fn class_low_bits_are_masked_on_encode() {
        let mut packet = Vec::new();
        let mut offset = 0;
        name::write_name(&mut packet, &mut offset, &Name::from("x.local."), &mut NameMap::new());
        wire::write_u16(&mut packet, &mut offset, TYPE_A);
        wire::write_u16(&mut packet, &mut offset, 0x80ff);
        wire::write_u32(&mut packet, &mut offset, 1);
        wire::write_u16(&mut packet, &mut offset, 4);
        packet.extend_from_slice(&[10, 0, 0, 1]);

        let mut offset = 0;
        let record = parse_record(&packet, &mut offset).unwrap();
        assert!(record.flush_cache);

        let encoded = encode(&record);
        let class = &encoded[encoded.len() - 12..encoded.len() - 10];
        assert_eq!(class, [0x80, 0x01]);
    }
}

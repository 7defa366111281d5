//! Whole-message framing.

use std::net::{IpAddr, Ipv4Addr};

use log::{debug, trace};

use crate::name::{self, NameMap};
use crate::query::Query;
use crate::record::{self, Record};
use crate::wire;
use crate::Error;

/// A complete mDNS message: the 12-byte header fields the codec interprets,
/// the question section, and every resource record.
///
/// The answer, authority, and additional sections are merged into one
/// ordered `records` list on decode; encoding emits them all under the
/// answer count. `address` and `port` identify the sender of a received
/// packet and are ignored when encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub transaction_id: u16,
    pub response: bool,
    pub truncated: bool,
    pub queries: Vec<Query>,
    pub records: Vec<Record>,
    pub address: IpAddr,
    pub port: u16,
}

impl Default for Message {
    fn default() -> Message {
        Message {
            transaction_id: 0,
            response: false,
            truncated: false,
            queries: Vec::new(),
            records: Vec::new(),
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

impl Message {
    /// Decodes a packet received from `address`:`port`.
    ///
    /// Any framing, name, or record error aborts the whole message; a
    /// partially parsed message is never returned. Bytes after the last
    /// record are tolerated and ignored.
    pub fn from_packet(packet: &[u8], address: IpAddr, port: u16) -> Result<Message, Error> {
        match Message::parse(packet, address, port) {
            Ok(message) => {
                trace!(
                    "message from {}:{} with {} queries and {} records",
                    address,
                    port,
                    message.queries.len(),
                    message.records.len(),
                );
                Ok(message)
            }
            Err(error) => {
                debug!("dropping malformed packet from {}:{}: {}", address, port, error);
                Err(error)
            }
        }
    }

    fn parse(packet: &[u8], address: IpAddr, port: u16) -> Result<Message, Error> {
        if packet.len() < 12 {
            return Err(Error::TruncatedHeader);
        }
        let mut offset = 0;
        let transaction_id = wire::read_u16(packet, &mut offset)?;
        let flags = wire::read_u16(packet, &mut offset)?;
        let qdcount = wire::read_u16(packet, &mut offset)?;
        let ancount = wire::read_u16(packet, &mut offset)?;
        let nscount = wire::read_u16(packet, &mut offset)?;
        let arcount = wire::read_u16(packet, &mut offset)?;

        let mut queries = Vec::new();
        for _ in 0..qdcount {
            let qname = name::parse_name(packet, &mut offset)?;
            let qtype = wire::read_u16(packet, &mut offset)?;
            let class = wire::read_u16(packet, &mut offset)?;
            queries.push(Query {
                name: qname,
                qtype,
                unicast_response: class & 0x8000 != 0,
            });
        }

        // Section membership is not kept; all records land in one list.
        let record_count = u32::from(ancount) + u32::from(nscount) + u32::from(arcount);
        let mut records = Vec::new();
        for _ in 0..record_count {
            records.push(record::parse_record(packet, &mut offset)?);
        }

        Ok(Message {
            transaction_id,
            response: flags & 0x8400 != 0,
            truncated: flags & 0x0200 != 0,
            queries,
            records,
            address,
            port,
        })
    }

    /// Encodes the message into a fresh packet buffer.
    ///
    /// Queries and records are written with one shared name-compression
    /// table. No size limit is enforced; keeping the result within one UDP
    /// payload is the caller's concern.
    pub fn to_packet(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(512);
        let mut offset = 0;
        let flags =
            (if self.response { 0x8400 } else { 0 }) | (if self.truncated { 0x0200 } else { 0 });
        wire::write_u16(&mut packet, &mut offset, self.transaction_id);
        wire::write_u16(&mut packet, &mut offset, flags);
        wire::write_u16(&mut packet, &mut offset, self.queries.len() as u16);
        wire::write_u16(&mut packet, &mut offset, self.records.len() as u16);
        wire::write_u16(&mut packet, &mut offset, 0);
        wire::write_u16(&mut packet, &mut offset, 0);

        let mut names = NameMap::new();
        for query in &self.queries {
            name::write_name(&mut packet, &mut offset, &query.name, &mut names);
            wire::write_u16(&mut packet, &mut offset, query.qtype);
            wire::write_u16(
                &mut packet,
                &mut offset,
                if query.unicast_response { 0x8001 } else { 0x0001 },
            );
        }
        for record in &self.records {
            record::write_record(&mut packet, &mut offset, record, &mut names);
        }
        packet
    }
}

//! Encoder and decoder for multicast DNS (mDNS) wire messages.
//!
//! This crate translates between the byte packets exchanged on UDP port
//! 5353 and an owned data model of queries and resource records, covering
//! the RFC 1035 message format (including name compression) and the mDNS
//! additions from RFC 6762 (cache-flush and unicast-response bits). It
//! performs no I/O; transports hand received datagrams to
//! [`Message::from_packet`] and send the buffers returned by
//! [`Message::to_packet`].
//!
//! ```
//! use mdns_codec::{Message, Query, TYPE_PTR};
//!
//! let mut message = Message::default();
//! message.queries.push(Query {
//!     name: "_http._tcp.local.".into(),
//!     qtype: TYPE_PTR,
//!     unicast_response: false,
//! });
//! let packet = message.to_packet();
//! assert_eq!(&packet[12..18], b"\x05_http");
//! ```

use std::net::{Ipv4Addr, Ipv6Addr};

mod bitmap;
mod error;
mod message;
mod name;
mod query;
mod record;
mod wire;

pub use crate::bitmap::Bitmap;
pub use crate::error::Error;
pub use crate::message::Message;
pub use crate::name::Name;
pub use crate::query::Query;
pub use crate::record::{RData, Record, TxtAttributes};

/// Port used for mDNS queries and responses.
pub const MDNS_PORT: u16 = 5353;

/// IPv4 multicast group that mDNS traffic is addressed to.
pub const MDNS_IPV4_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// IPv6 multicast group that mDNS traffic is addressed to.
pub const MDNS_IPV6_GROUP: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb);

pub const TYPE_A: u16 = 1;
pub const TYPE_PTR: u16 = 12;
pub const TYPE_TXT: u16 = 16;
pub const TYPE_AAAA: u16 = 28;
pub const TYPE_SRV: u16 = 33;
pub const TYPE_NSEC: u16 = 47;
pub const TYPE_ANY: u16 = 255;

/// Human-readable name for a record type code.
pub fn type_name(rtype: u16) -> &'static str {
    match rtype {
        TYPE_A => "A",
        TYPE_AAAA => "AAAA",
        TYPE_ANY => "ANY",
        TYPE_NSEC => "NSEC",
        TYPE_PTR => "PTR",
        TYPE_SRV => "SRV",
        TYPE_TXT => "TXT",
        _ => "?",
    }
}

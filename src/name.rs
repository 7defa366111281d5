//! Domain names and the RFC 1035 name codec.

use std::collections::HashMap;
use std::fmt;

use crate::wire;
use crate::Error;

/// Offsets of name suffixes already written to a packet, keyed by the
/// dotted suffix bytes. Local to a single encode pass; every pointer
/// emitted from it targets an offset written earlier in the same packet.
pub(crate) type NameMap = HashMap<Vec<u8>, u16>;

/// An owned DNS name in dotted form, e.g. `_http._tcp.local.`.
///
/// Labels are arbitrary octet strings and are stored verbatim; equality is
/// a case-sensitive byte compare. mDNS matches names case-insensitively,
/// but any normalization is left to the caller, so the wire always carries
/// the caller's chosen form.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Name {
    bytes: Vec<u8>,
}

impl Name {
    /// The dotted form, including the trailing dot when present.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The name without its trailing dot, as the labels appear on the wire.
    fn trimmed(&self) -> &[u8] {
        match self.bytes.split_last() {
            Some((b'.', head)) => head,
            _ => &self.bytes,
        }
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Name {
        Name {
            bytes: name.as_bytes().to_vec(),
        }
    }
}

impl From<String> for Name {
    fn from(name: String) -> Name {
        Name {
            bytes: name.into_bytes(),
        }
    }
}

impl From<&[u8]> for Name {
    fn from(name: &[u8]) -> Name {
        Name {
            bytes: name.to_vec(),
        }
    }
}

impl From<Vec<u8>> for Name {
    fn from(bytes: Vec<u8>) -> Name {
        Name { bytes }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", String::from_utf8_lossy(&self.bytes))
    }
}

/// Reads a name at `offset`, following compression pointers.
///
/// Pointers may only target offsets strictly below the most recent pointer
/// origin, which starts at the offset of the name itself. That rule forbids
/// forward and self references and bounds the walk without a visited-set.
pub(crate) fn parse_name(packet: &[u8], offset: &mut usize) -> Result<Name, Error> {
    let mut name = Vec::new();
    let mut origin = *offset;
    let mut resume_at = None;
    loop {
        let length = wire::read_u8(packet, offset)?;
        if length == 0 {
            break;
        }
        match length & 0xc0 {
            0x00 => {
                let end = *offset + usize::from(length);
                if end > packet.len() {
                    return Err(Error::OutOfBounds);
                }
                name.extend_from_slice(&packet[*offset..end]);
                name.push(b'.');
                *offset = end;
            }
            0xc0 => {
                let low = wire::read_u8(packet, offset)?;
                let target = usize::from(length & 0x3f) << 8 | usize::from(low);
                if target >= origin {
                    return Err(Error::CompressionLoop);
                }
                origin = target;
                // The cursor resumes after the first pointer once the
                // pointed-to labels run out.
                resume_at.get_or_insert(*offset);
                *offset = target;
            }
            _ => return Err(Error::BadLabelTag),
        }
    }
    if let Some(after) = resume_at {
        *offset = after;
    }
    Ok(Name { bytes: name })
}

/// Writes `name` at `offset`, compressing against suffixes already present
/// in `names`.
///
/// Each yet-unseen suffix is recorded under the current offset before its
/// head label is written; a seen suffix is replaced by a 2-byte pointer and
/// ends the name. Suffix lookup is byte-exact, so differently-cased spellings
/// of one name are not deduplicated.
pub(crate) fn write_name(buf: &mut Vec<u8>, offset: &mut usize, name: &Name, names: &mut NameMap) {
    let mut fragment = name.trimmed();
    while !fragment.is_empty() {
        if let Some(&at) = names.get(fragment) {
            wire::write_u16(buf, offset, 0xc000 | at);
            return;
        }
        names.insert(fragment.to_vec(), *offset as u16);
        let label_len = fragment
            .iter()
            .position(|&b| b == b'.')
            .unwrap_or(fragment.len());
        wire::write_u8(buf, offset, label_len as u8);
        buf.extend_from_slice(&fragment[..label_len]);
        *offset += label_len;
        fragment = &fragment[(label_len + 1).min(fragment.len())..];
    }
    wire::write_u8(buf, offset, 0);
}

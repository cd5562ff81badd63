//! Generic netlink wire format
//!
//! Layout of one message, all integers in host byte order:
//!
//! ```text
//! nlmsghdr   len:u32 type:u16 flags:u16 seq:u32 port:u32
//! genlmsghdr cmd:u8 version:u8 reserved:u16
//! nlattr*    len:u16 type:u16 payload (padded to 4 bytes)
//! ```
//!
//! A single datagram may carry several messages back to back.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

pub const NLMSG_HDRLEN: usize = 16;
pub const GENL_HDRLEN: usize = 4;
const NLA_HDRLEN: usize = 4;
const NLA_TYPE_MASK: u16 = 0x3fff;

pub const NLMSG_NOOP: u16 = 1;
pub const NLMSG_ERROR: u16 = 2;
pub const NLMSG_DONE: u16 = 3;
pub const NLMSG_OVERRUN: u16 = 4;

pub const NLM_F_REQUEST: u16 = 0x1;
pub const NLM_F_MULTI: u16 = 0x2;
pub const NLM_F_ACK: u16 = 0x4;

/// Generic netlink controller
pub const GENL_ID_CTRL: u16 = 0x10;
pub const CTRL_CMD_GETFAMILY: u8 = 3;
pub const CTRL_ATTR_FAMILY_ID: u16 = 1;
pub const CTRL_ATTR_FAMILY_NAME: u16 = 2;

const fn align(len: usize) -> usize {
    (len + 3) & !3
}

/// Wire format violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("truncated message: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("invalid length field {0}")]
    InvalidLength(usize),

    #[error("attribute {kind} payload of {len} bytes does not fit")]
    AttributeTooLarge { kind: u16, len: usize },
}

/// One netlink attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: u16,
    pub payload: Bytes,
}

/// Ordered attribute list of a generic netlink message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last attribute of the given type wins, as with the kernel's nla_parse()
    pub fn get(&self, kind: u16) -> Option<&Attribute> {
        self.0.iter().rev().find(|attr| attr.kind == kind)
    }

    pub fn get_u8(&self, kind: u16) -> Option<u8> {
        self.get(kind)?.payload.first().copied()
    }

    pub fn get_u16(&self, kind: u16) -> Option<u16> {
        let mut payload = self.get(kind)?.payload.as_ref();
        (payload.len() >= 2).then(|| payload.get_u16_ne())
    }

    pub fn get_u32(&self, kind: u16) -> Option<u32> {
        let mut payload = self.get(kind)?.payload.as_ref();
        (payload.len() >= 4).then(|| payload.get_u32_ne())
    }

    /// NUL-terminated string attribute
    pub fn get_string(&self, kind: u16) -> Option<String> {
        let payload = self.get(kind)?.payload.as_ref();
        let end = payload.iter().position(|b| *b == 0).unwrap_or(payload.len());
        std::str::from_utf8(&payload[..end]).ok().map(str::to_owned)
    }

    pub fn push(&mut self, kind: u16, payload: impl Into<Bytes>) {
        self.0.push(Attribute {
            kind,
            payload: payload.into(),
        });
    }

    fn encoded_len(&self) -> usize {
        self.0
            .iter()
            .map(|attr| align(NLA_HDRLEN + attr.payload.len()))
            .sum()
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        for attr in &self.0 {
            let len = NLA_HDRLEN + attr.payload.len();
            let wire_len = u16::try_from(len).map_err(|_| CodecError::AttributeTooLarge {
                kind: attr.kind,
                len: attr.payload.len(),
            })?;
            buf.put_u16_ne(wire_len);
            buf.put_u16_ne(attr.kind);
            buf.put_slice(&attr.payload);
            buf.put_bytes(0, align(len) - len);
        }
        Ok(())
    }

    fn decode(mut buf: &[u8]) -> Result<Self, CodecError> {
        let mut attrs = Vec::new();
        while buf.len() >= NLA_HDRLEN {
            let mut header = &buf[..NLA_HDRLEN];
            let len = usize::from(header.get_u16_ne());
            let kind = header.get_u16_ne() & NLA_TYPE_MASK;
            if len < NLA_HDRLEN {
                return Err(CodecError::InvalidLength(len));
            }
            if len > buf.len() {
                return Err(CodecError::Truncated {
                    needed: len,
                    available: buf.len(),
                });
            }
            attrs.push(Attribute {
                kind,
                payload: Bytes::copy_from_slice(&buf[NLA_HDRLEN..len]),
            });
            buf = &buf[align(len).min(buf.len())..];
        }
        Ok(Self(attrs))
    }
}

/// Generic netlink message (header plus attributes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenlMessage {
    /// Family id, carried in `nlmsg_type`
    pub family: u16,
    pub flags: u16,
    pub seq: u32,
    pub port: u32,
    pub command: u8,
    pub version: u8,
    pub attributes: Attributes,
}

impl GenlMessage {
    /// Request expecting an acknowledgement
    pub fn request(family: u16, command: u8) -> Self {
        Self {
            family,
            flags: NLM_F_REQUEST | NLM_F_ACK,
            seq: 0,
            port: 0,
            command,
            version: 1,
            attributes: Attributes::default(),
        }
    }

    pub fn put_u8(&mut self, kind: u16, value: u8) {
        self.attributes.push(kind, vec![value]);
    }

    pub fn put_u16(&mut self, kind: u16, value: u16) {
        self.attributes.push(kind, value.to_ne_bytes().to_vec());
    }

    pub fn put_u32(&mut self, kind: u16, value: u32) {
        self.attributes.push(kind, value.to_ne_bytes().to_vec());
    }

    pub fn put_string(&mut self, kind: u16, value: &str) {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.attributes.push(kind, payload);
    }

    pub fn encode(&self) -> Result<Bytes, CodecError> {
        let total = NLMSG_HDRLEN + GENL_HDRLEN + self.attributes.encoded_len();
        let wire_len = u32::try_from(total).map_err(|_| CodecError::InvalidLength(total))?;

        let mut buf = BytesMut::with_capacity(total);
        buf.put_u32_ne(wire_len);
        buf.put_u16_ne(self.family);
        buf.put_u16_ne(self.flags);
        buf.put_u32_ne(self.seq);
        buf.put_u32_ne(self.port);
        buf.put_u8(self.command);
        buf.put_u8(self.version);
        buf.put_u16_ne(0);
        self.attributes.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    fn decode_body(header: Header, body: &[u8]) -> Result<Self, CodecError> {
        if body.len() < GENL_HDRLEN {
            return Err(CodecError::Truncated {
                needed: GENL_HDRLEN,
                available: body.len(),
            });
        }
        Ok(Self {
            family: header.kind,
            flags: header.flags,
            seq: header.seq,
            port: header.port,
            command: body[0],
            version: body[1],
            attributes: Attributes::decode(&body[GENL_HDRLEN..])?,
        })
    }
}

/// Any message the kernel may send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetlinkMessage {
    Noop { seq: u32 },
    /// `code == 0` is a plain acknowledgement
    Error { seq: u32, code: i32 },
    Done { seq: u32 },
    Overrun { seq: u32 },
    Data(GenlMessage),
}

impl NetlinkMessage {
    pub fn seq(&self) -> u32 {
        match self {
            Self::Noop { seq } | Self::Error { seq, .. } | Self::Done { seq } | Self::Overrun { seq } => *seq,
            Self::Data(msg) => msg.seq,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Header {
    kind: u16,
    flags: u16,
    seq: u32,
    port: u32,
}

/// Split a received datagram into messages
pub fn decode(mut buf: &[u8]) -> Result<Vec<NetlinkMessage>, CodecError> {
    let mut messages = Vec::new();
    while buf.len() >= NLMSG_HDRLEN {
        let mut raw = &buf[..NLMSG_HDRLEN];
        let len = raw.get_u32_ne() as usize;
        let header = Header {
            kind: raw.get_u16_ne(),
            flags: raw.get_u16_ne(),
            seq: raw.get_u32_ne(),
            port: raw.get_u32_ne(),
        };
        if len < NLMSG_HDRLEN {
            return Err(CodecError::InvalidLength(len));
        }
        if len > buf.len() {
            return Err(CodecError::Truncated {
                needed: len,
                available: buf.len(),
            });
        }

        let body = &buf[NLMSG_HDRLEN..len];
        let message = match header.kind {
            NLMSG_NOOP => NetlinkMessage::Noop { seq: header.seq },
            NLMSG_ERROR => {
                if body.len() < 4 {
                    return Err(CodecError::Truncated {
                        needed: 4,
                        available: body.len(),
                    });
                }
                let mut code = &body[..4];
                NetlinkMessage::Error {
                    seq: header.seq,
                    code: code.get_i32_ne(),
                }
            }
            NLMSG_DONE => NetlinkMessage::Done { seq: header.seq },
            NLMSG_OVERRUN => NetlinkMessage::Overrun { seq: header.seq },
            _ => NetlinkMessage::Data(GenlMessage::decode_body(header, body)?),
        };
        messages.push(message);

        buf = &buf[align(len).min(buf.len())..];
    }
    Ok(messages)
}

/// Encode an `NLMSG_ERROR` message; `code == 0` is an acknowledgement.
///
/// The kernel echoes the offending request header after the error code;
/// only its space is reserved here.
pub fn encode_error(seq: u32, code: i32) -> Bytes {
    let total = NLMSG_HDRLEN + 4 + NLMSG_HDRLEN;
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u32_ne(total as u32);
    buf.put_u16_ne(NLMSG_ERROR);
    buf.put_u16_ne(0);
    buf.put_u32_ne(seq);
    buf.put_u32_ne(0);
    buf.put_i32_ne(code);
    buf.put_bytes(0, NLMSG_HDRLEN);
    buf.freeze()
}

/// Encode an `NLMSG_DONE` message
pub fn encode_done(seq: u32) -> Bytes {
    let total = NLMSG_HDRLEN + 4;
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u32_ne(total as u32);
    buf.put_u16_ne(NLMSG_DONE);
    buf.put_u16_ne(NLM_F_MULTI);
    buf.put_u32_ne(seq);
    buf.put_u32_ne(0);
    buf.put_i32_ne(0);
    buf.freeze()
}

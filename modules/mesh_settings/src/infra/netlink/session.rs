//! Netlink session handed to the query executor

use super::codec::{
    self, CodecError, GenlMessage, NetlinkMessage, CTRL_ATTR_FAMILY_ID, CTRL_ATTR_FAMILY_NAME,
    CTRL_CMD_GETFAMILY, GENL_ID_CTRL,
};
use super::{NetlinkSocket, Transport};
use crate::config::Config;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while establishing a session
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("netlink socket unavailable: {0}")]
    Socket(#[source] io::Error),

    #[error("generic netlink family '{0}' is not registered")]
    FamilyNotFound(String),

    #[error("malformed controller reply: {0}")]
    Codec(#[from] CodecError),

    #[error("can't resolve interface index from {}: {reason}", path.display())]
    Interface { path: PathBuf, reason: String },
}

/// Established netlink session for one mesh interface
///
/// A session without transport is valid: every query on it reports the
/// backend as unsupported.
/// Sequence number of the family lookup on a fresh socket
const FAMILY_LOOKUP_SEQ: u32 = 1;

pub struct Session {
    transport: Option<Box<dyn Transport>>,
    family_id: u16,
    mesh_ifindex: u32,
    seq: u32,
}

impl Session {
    pub fn new(transport: Box<dyn Transport>, family_id: u16, mesh_ifindex: u32) -> Self {
        Self {
            transport: Some(transport),
            family_id,
            mesh_ifindex,
            seq: 0,
        }
    }

    pub fn without_transport() -> Self {
        Self {
            transport: None,
            family_id: 0,
            mesh_ifindex: 0,
            seq: 0,
        }
    }

    /// Open a kernel socket, resolve the batman-adv family and the mesh
    /// interface index.
    pub fn open(mesh_iface: &str, config: &Config) -> Result<Self, ConnectError> {
        let mesh_ifindex = read_ifindex(config, mesh_iface)?;
        let socket = NetlinkSocket::open().map_err(ConnectError::Socket)?;
        let session = Self::connect(Box::new(socket), &config.family_name, mesh_ifindex)?;
        tracing::debug!(
            mesh_iface,
            mesh_ifindex,
            family_id = session.family_id,
            "netlink session established"
        );
        Ok(session)
    }

    /// Resolve `family_name` over `transport` and continue numbering requests
    /// after the lookup.
    pub fn connect(
        mut transport: Box<dyn Transport>,
        family_name: &str,
        mesh_ifindex: u32,
    ) -> Result<Self, ConnectError> {
        let family_id = resolve_family(transport.as_mut(), family_name)?;
        let mut session = Self::new(transport, family_id, mesh_ifindex);
        session.seq = FAMILY_LOOKUP_SEQ;
        Ok(session)
    }

    pub fn family_id(&self) -> u16 {
        self.family_id
    }

    pub fn mesh_ifindex(&self) -> u32 {
        self.mesh_ifindex
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) fn next_seq(&mut self) -> u32 {
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }

    pub(crate) fn transport(&mut self) -> Option<&mut Box<dyn Transport>> {
        self.transport.as_mut()
    }
}

fn read_ifindex(config: &Config, mesh_iface: &str) -> Result<u32, ConnectError> {
    let path = config.sysfs_root.join(mesh_iface).join("ifindex");
    let raw = fs::read_to_string(&path).map_err(|e| ConnectError::Interface {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    raw.trim().parse().map_err(|_| ConnectError::Interface {
        path,
        reason: format!("not an interface index: {:?}", raw.trim()),
    })
}

/// Ask the generic netlink controller for the id of `name`.
///
/// Reads up to the acknowledgement that closes the lookup, so nothing of it
/// is left on the socket for the next request.
pub fn resolve_family(transport: &mut dyn Transport, name: &str) -> Result<u16, ConnectError> {
    let mut request = GenlMessage::request(GENL_ID_CTRL, CTRL_CMD_GETFAMILY);
    request.seq = FAMILY_LOOKUP_SEQ;
    request.put_string(CTRL_ATTR_FAMILY_NAME, name);
    transport
        .send(&request.encode()?)
        .map_err(ConnectError::Socket)?;

    let mut family_id = None;
    loop {
        let datagram = transport.recv().map_err(ConnectError::Socket)?;
        for message in codec::decode(&datagram)? {
            if message.seq() != request.seq {
                continue;
            }
            match message {
                NetlinkMessage::Data(reply) => {
                    if family_id.is_none() {
                        family_id = reply.attributes.get_u16(CTRL_ATTR_FAMILY_ID);
                    }
                }
                NetlinkMessage::Error { code: 0, .. } | NetlinkMessage::Done { .. } => {
                    return family_id.ok_or_else(|| ConnectError::FamilyNotFound(name.to_string()));
                }
                NetlinkMessage::Error { code, .. } => {
                    tracing::debug!(family = name, code, "family lookup rejected");
                    return Err(ConnectError::FamilyNotFound(name.to_string()));
                }
                NetlinkMessage::Noop { .. } | NetlinkMessage::Overrun { .. } => {}
            }
        }
    }
}

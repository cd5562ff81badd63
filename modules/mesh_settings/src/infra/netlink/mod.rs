//! Netlink side of the protocol backend

pub mod batadv;
pub mod codec;
pub mod executor;
pub mod session;
pub mod socket;

pub use batadv::Command;
pub use codec::{Attributes, CodecError, GenlMessage, NetlinkMessage};
pub use executor::execute;
pub use session::{ConnectError, Session};
pub use socket::NetlinkSocket;

use std::io;

/// Datagram transport carrying encoded netlink messages
pub trait Transport {
    /// Send one encoded request
    fn send(&mut self, datagram: &[u8]) -> io::Result<()>;

    /// Block until the next datagram arrives
    fn recv(&mut self) -> io::Result<Vec<u8>>;
}

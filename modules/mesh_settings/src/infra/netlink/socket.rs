//! Kernel netlink socket

use super::Transport;
use netlink_sys::{protocols::NETLINK_GENERIC, Socket, SocketAddr};
use std::io;

/// `NETLINK_GENERIC` socket connected to the kernel
pub struct NetlinkSocket {
    socket: Socket,
}

impl NetlinkSocket {
    pub fn open() -> io::Result<Self> {
        let mut socket = Socket::new(NETLINK_GENERIC)?;
        socket.bind_auto()?;
        socket.connect(&SocketAddr::new(0, 0))?;
        Ok(Self { socket })
    }
}

impl Transport for NetlinkSocket {
    fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        self.socket.send(datagram, 0)?;
        Ok(())
    }

    fn recv(&mut self) -> io::Result<Vec<u8>> {
        let (datagram, _from) = self.socket.recv_from_full()?;
        Ok(datagram)
    }
}

//! Multicast socket plumbing for the per-interface SSDP engines.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

pub const SSDP_MCAST_V4: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);
pub const SSDP_PORT: u16 = 1900;

/// An interface entry: IPv4 address + interface index.
#[derive(Debug, Clone, Copy)]
pub struct IfaceV4 {
    pub addr: Ipv4Addr,
    #[allow(dead_code)]
    pub index: u32,
}

/// Receive socket for one interface. Binds the wildcard address on port 1900
/// (with SO_REUSEADDR + SO_REUSEPORT so sibling engines coexist) and joins
/// the SSDP group on `iface_addr`, so the socket sees both group traffic and
/// unicast probes addressed to the interface.
pub fn build_recv_socket(iface_addr: Ipv4Addr) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    let bind_addr: SocketAddr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, SSDP_PORT).into();
    socket.bind(&bind_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_udp: std::net::UdpSocket = socket.into();
    let tokio_udp = UdpSocket::from_std(std_udp)?;
    tokio_udp.join_multicast_v4(SSDP_MCAST_V4, iface_addr)?;
    Ok(tokio_udp)
}

/// Send socket for one interface, used for NOTIFY datagrams and unicast
/// M-SEARCH replies. Bound to the interface address so replies carry it as
/// their source, with IP_MULTICAST_IF pointed at the same interface so
/// NOTIFYs leave through it.
pub fn build_send_socket(iface_addr: Ipv4Addr) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_multicast_if_v4(&iface_addr)?;
    let bind_addr: SocketAddr = SocketAddrV4::new(iface_addr, 0).into();
    socket.bind(&bind_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_udp: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_udp)
}

/// Enumerate non-loopback IPv4 interfaces using the `getifaddrs` crate.
pub fn list_non_loopback_v4() -> std::io::Result<Vec<IfaceV4>> {
    use getifaddrs::InterfaceFlags;
    use std::net::IpAddr;

    let ifaces = getifaddrs::getifaddrs()?;
    Ok(ifaces
        .filter(|i| !i.flags.contains(InterfaceFlags::LOOPBACK))
        .filter_map(|i| {
            let addr = match i.address {
                IpAddr::V4(v4) => v4,
                IpAddr::V6(_) => return None,
            };
            let index = i.index.unwrap_or(0);
            Some(IfaceV4 { addr, index })
        })
        .collect())
}

//! Per-interface SSDP engines: periodic alive announcements, M-SEARCH
//! replies, and a byebye on the way out.

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::device::RootDevice;
use crate::ssdp::{messages, socket};

const SSDP_GROUP: SocketAddrV4 = SocketAddrV4::new(socket::SSDP_MCAST_V4, socket::SSDP_PORT);

pub struct SsdpConfig {
    pub device: Arc<RootDevice>,
    /// Gap between alive announcement cycles.
    pub notify_interval: Duration,
}

/// Supervise one engine per usable IPv4 interface. An interface that fails
/// to initialize (or dies on a read error) is logged and dropped without
/// affecting its siblings; this future resolves once every engine is gone.
pub async fn run(config: SsdpConfig, shutdown: broadcast::Sender<()>) {
    let ifaces = match socket::list_non_loopback_v4() {
        Ok(ifaces) => ifaces,
        Err(e) => {
            eprintln!("error: cannot enumerate network interfaces: {e}");
            std::process::exit(1);
        }
    };
    if ifaces.is_empty() {
        tracing::warn!("SSDP: no usable IPv4 interfaces — discovery disabled, HTTP still works");
        return;
    }

    let mut engines = JoinSet::new();
    for iface in ifaces {
        engines.spawn(run_interface(
            iface,
            Arc::clone(&config.device),
            config.notify_interval,
            shutdown.subscribe(),
        ));
    }
    while let Some(result) = engines.join_next().await {
        if let Err(e) = result {
            tracing::error!("SSDP engine task panicked: {e}");
        } else {
            tracing::info!("SSDP engine exited ({} remaining)", engines.len());
        }
    }
    tracing::info!("all SSDP engines stopped");
}

async fn run_interface(
    iface: socket::IfaceV4,
    device: Arc<RootDevice>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let recv = match socket::build_recv_socket(iface.addr) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("SSDP init failed on {}: {e}", iface.addr);
            return;
        }
    };
    let send = match socket::build_send_socket(iface.addr) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("SSDP send socket failed on {}: {e}", iface.addr);
            return;
        }
    };

    let targets = messages::notify_targets(&device.uuid);
    let location = device.location(iface.addr);
    // A client that misses one announcement must not expire the entry.
    let max_age = interval.as_secs() * 2;

    tracing::info!(
        "SSDP advertising \"{}\" on {}:{}",
        device.friendly_name,
        iface.addr,
        socket::SSDP_PORT
    );

    send_alive_burst(&send, &targets, &location, max_age).await;

    let mut announce = tokio::time::interval(interval);
    announce.tick().await; // immediate first tick, covered by the startup burst

    let mut buf = [0u8; 2048];
    loop {
        tokio::select! {
            _ = announce.tick() => {
                send_alive_set(&send, &targets, &location, max_age).await;
            }
            result = recv.recv_from(&mut buf) => {
                match result {
                    Ok((len, sender)) => {
                        let packet = String::from_utf8_lossy(&buf[..len]).into_owned();
                        handle_packet(&packet, sender, &send, &targets, &location, max_age);
                    }
                    Err(e) => {
                        tracing::error!("SSDP read error on {}: {e} — engine stopping", iface.addr);
                        return;
                    }
                }
            }
            _ = shutdown.recv() => {
                send_byebye(&send, &targets).await;
                tracing::debug!("SSDP byebye sent on {}", iface.addr);
                return;
            }
        }
    }
}

/// Answer an M-SEARCH: each matched target gets its own reply task with an
/// independent uniform delay in [0, MX] seconds.
fn handle_packet(
    packet: &str,
    sender: SocketAddr,
    send: &Arc<UdpSocket>,
    targets: &[(String, String)],
    location: &str,
    max_age: u64,
) {
    let Some(probe) = messages::parse_msearch(packet) else {
        return;
    };
    for (st, usn) in messages::match_targets(&probe.st, targets) {
        let delay = Duration::from_millis(rand::rng().random_range(0..=probe.mx * 1000));
        let message = messages::msearch_response(location, st, usn, max_age);
        let send = Arc::clone(send);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = send.send_to(message.as_bytes(), sender).await {
                tracing::debug!("SSDP reply to {sender} failed: {e}");
            }
        });
    }
}

async fn send_alive_set(
    send: &UdpSocket,
    targets: &[(String, String)],
    location: &str,
    max_age: u64,
) {
    for (nt, usn) in targets {
        let message = messages::notify_alive(location, nt, usn, max_age);
        if let Err(e) = send.send_to(message.as_bytes(), SSDP_GROUP).await {
            tracing::debug!("SSDP notify send failed: {e}");
        }
    }
}

/// Startup burst: the alive set three times with short gaps, in case the
/// first datagram is lost while interfaces settle.
async fn send_alive_burst(
    send: &UdpSocket,
    targets: &[(String, String)],
    location: &str,
    max_age: u64,
) {
    for i in 0..3u8 {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        send_alive_set(send, targets, location, max_age).await;
    }
}

async fn send_byebye(send: &UdpSocket, targets: &[(String, String)]) {
    for (nt, usn) in targets {
        let message = messages::notify_byebye(nt, usn);
        if let Err(e) = send.send_to(message.as_bytes(), SSDP_GROUP).await {
            tracing::debug!("SSDP byebye send failed: {e}");
        }
    }
}

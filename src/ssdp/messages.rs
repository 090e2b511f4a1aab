//! SSDP datagram formats and M-SEARCH matching, kept free of socket I/O.

use crate::device::{ROOT_DEVICE_TYPE, SERVER_FIELD, SERVICES};

/// Longest reply delay a probe may request; larger MX values are clamped.
pub const MAX_MX_SECS: u64 = 5;

/// The advertisement targets for the root device: (NT, USN) pairs covering
/// the root device, the bare UUID, the device type, and each service type.
pub fn notify_targets(uuid: &str) -> Vec<(String, String)> {
    let mut targets = vec![
        ("upnp:rootdevice".to_string(), format!("{uuid}::upnp:rootdevice")),
        (uuid.to_string(), uuid.to_string()),
        (ROOT_DEVICE_TYPE.to_string(), format!("{uuid}::{ROOT_DEVICE_TYPE}")),
    ];
    for service in SERVICES {
        targets.push((
            service.service_type.to_string(),
            format!("{uuid}::{}", service.service_type),
        ));
    }
    targets
}

/// Build a NOTIFY alive message. CRLF line endings are mandatory; strict
/// clients silently drop datagrams with bare newlines.
pub fn notify_alive(location: &str, nt: &str, usn: &str, max_age: u64) -> String {
    format!(
        "NOTIFY * HTTP/1.1\r\n\
HOST: 239.255.255.250:1900\r\n\
CACHE-CONTROL: max-age={max_age}\r\n\
LOCATION: {location}\r\n\
NT: {nt}\r\n\
NTS: ssdp:alive\r\n\
SERVER: {SERVER_FIELD}\r\n\
USN: {usn}\r\n\
\r\n"
    )
}

/// Build a NOTIFY byebye message. byebye carries only NT/NTS/USN — no
/// CACHE-CONTROL, LOCATION, or SERVER.
pub fn notify_byebye(nt: &str, usn: &str) -> String {
    format!(
        "NOTIFY * HTTP/1.1\r\n\
HOST: 239.255.255.250:1900\r\n\
NT: {nt}\r\n\
NTS: ssdp:byebye\r\n\
USN: {usn}\r\n\
\r\n"
    )
}

/// Build a unicast 200 OK response to an M-SEARCH. `st` echoes the searched
/// target.
pub fn msearch_response(location: &str, st: &str, usn: &str, max_age: u64) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
CACHE-CONTROL: max-age={max_age}\r\n\
EXT:\r\n\
LOCATION: {location}\r\n\
SERVER: {SERVER_FIELD}\r\n\
ST: {st}\r\n\
USN: {usn}\r\n\
\r\n"
    )
}

/// A well-formed M-SEARCH probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MSearch {
    pub st: String,
    /// Requested maximum reply delay in seconds, clamped to [0, 5].
    pub mx: u64,
}

/// Parse an inbound datagram as an M-SEARCH. Returns `None` for anything
/// that is not a discover probe with an `ST:` header — NOTIFYs from other
/// devices arrive on the same socket and must be ignored, not answered.
pub fn parse_msearch(packet: &str) -> Option<MSearch> {
    if !packet.starts_with("M-SEARCH * HTTP/1.1") {
        return None;
    }
    let header = |name: &str| {
        packet.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    };
    if !header("MAN")?.contains("ssdp:discover") {
        return None;
    }
    let st = header("ST")?;
    let mx = header("MX")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
        .min(MAX_MX_SECS);
    Some(MSearch { st, mx })
}

/// The (ST, USN) pairs to answer a probe with. `ssdp:all` matches every
/// target; any other recognized ST matches exactly one; unknown STs match
/// nothing and the probe goes unanswered.
pub fn match_targets<'a>(st: &str, targets: &'a [(String, String)]) -> Vec<&'a (String, String)> {
    if st == "ssdp:all" {
        targets.iter().collect()
    } else {
        targets.iter().filter(|(nt, _)| nt == st).collect()
    }
}

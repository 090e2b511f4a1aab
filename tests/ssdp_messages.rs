use dircast::device;
use dircast::ssdp::messages::{
    match_targets, msearch_response, notify_alive, notify_byebye, notify_targets, parse_msearch,
    MSearch,
};

const UUID: &str = "uuid:f47ac10b-58cc-4372-a567-0e02b2c3d479";

fn msearch_packet(st: &str, mx: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
HOST: 239.255.255.250:1900\r\n\
MAN: \"ssdp:discover\"\r\n\
ST: {st}\r\n\
MX: {mx}\r\n\
\r\n"
    )
}

// ── Target set ────────────────────────────────────────────────────────────────

#[test]
fn targets_cover_rootdevice_uuid_device_and_services() {
    let targets = notify_targets(UUID);
    let usns: Vec<&str> = targets.iter().map(|(_, usn)| usn.as_str()).collect();
    assert!(usns.contains(&format!("{UUID}::upnp:rootdevice").as_str()));
    assert!(usns.contains(&UUID));
    assert!(usns.contains(&format!("{UUID}::{}", device::ROOT_DEVICE_TYPE).as_str()));
    for service in device::SERVICES {
        assert!(usns.contains(&format!("{UUID}::{}", service.service_type).as_str()));
    }
    assert_eq!(targets.len(), 3 + device::SERVICES.len());
}

// ── M-SEARCH parsing ──────────────────────────────────────────────────────────

#[test]
fn parse_discover_probe() {
    let parsed = parse_msearch(&msearch_packet("upnp:rootdevice", "3"));
    assert_eq!(
        parsed,
        Some(MSearch { st: "upnp:rootdevice".to_string(), mx: 3 })
    );
}

#[test]
fn parse_clamps_large_mx() {
    assert_eq!(parse_msearch(&msearch_packet("ssdp:all", "120")).unwrap().mx, 5);
}

#[test]
fn parse_defaults_missing_mx() {
    let packet = "M-SEARCH * HTTP/1.1\r\nMAN: \"ssdp:discover\"\r\nST: ssdp:all\r\n\r\n";
    assert_eq!(parse_msearch(packet).unwrap().mx, 1);
}

#[test]
fn parse_headers_case_insensitively() {
    let packet = "M-SEARCH * HTTP/1.1\r\nman: \"ssdp:discover\"\r\nst: ssdp:all\r\nmx: 2\r\n\r\n";
    assert_eq!(parse_msearch(packet).unwrap().st, "ssdp:all");
}

#[test]
fn parse_rejects_probe_without_man() {
    let packet = "M-SEARCH * HTTP/1.1\r\nST: ssdp:all\r\n\r\n";
    assert_eq!(parse_msearch(packet), None);
}

#[test]
fn parse_rejects_probe_without_st() {
    let packet = "M-SEARCH * HTTP/1.1\r\nMAN: \"ssdp:discover\"\r\n\r\n";
    assert_eq!(parse_msearch(packet), None);
}

#[test]
fn parse_ignores_notify_from_other_devices() {
    let packet = "NOTIFY * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nNTS: ssdp:alive\r\n\r\n";
    assert_eq!(parse_msearch(packet), None);
}

// ── Target matching ───────────────────────────────────────────────────────────

#[test]
fn ssdp_all_matches_every_target() {
    let targets = notify_targets(UUID);
    assert_eq!(match_targets("ssdp:all", &targets).len(), targets.len());
}

#[test]
fn rootdevice_matches_one() {
    let targets = notify_targets(UUID);
    let matched = match_targets("upnp:rootdevice", &targets);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].1, format!("{UUID}::upnp:rootdevice"));
}

#[test]
fn bare_uuid_matches_bare_usn() {
    let targets = notify_targets(UUID);
    let matched = match_targets(UUID, &targets);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].1, UUID);
}

#[test]
fn service_urn_matches_one() {
    let targets = notify_targets(UUID);
    let st = device::SERVICES[0].service_type;
    let matched = match_targets(st, &targets);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].0, st);
}

#[test]
fn unknown_st_matches_nothing() {
    let targets = notify_targets(UUID);
    assert!(match_targets("urn:schemas-upnp-org:device:Toaster:1", &targets).is_empty());
}

// ── Message formats ───────────────────────────────────────────────────────────

#[test]
fn alive_carries_the_freshness_contract() {
    let msg = notify_alive("http://10.0.0.2:1338/rootDesc.xml", "upnp:rootdevice", "usn", 60);
    assert!(msg.starts_with("NOTIFY * HTTP/1.1\r\n"));
    assert!(msg.contains("HOST: 239.255.255.250:1900\r\n"));
    assert!(msg.contains("CACHE-CONTROL: max-age=60\r\n"));
    assert!(msg.contains("LOCATION: http://10.0.0.2:1338/rootDesc.xml\r\n"));
    assert!(msg.contains("NTS: ssdp:alive\r\n"));
    assert!(msg.contains(&format!("SERVER: {}\r\n", device::SERVER_FIELD)));
    assert!(msg.ends_with("\r\n\r\n"));
}

#[test]
fn byebye_is_minimal() {
    let msg = notify_byebye("upnp:rootdevice", "usn");
    assert!(msg.contains("NTS: ssdp:byebye\r\n"));
    assert!(!msg.contains("CACHE-CONTROL"));
    assert!(!msg.contains("LOCATION"));
    assert!(!msg.contains("SERVER"));
}

#[test]
fn msearch_response_echoes_st() {
    let msg = msearch_response("http://10.0.0.2:1338/rootDesc.xml", "upnp:rootdevice", "usn", 60);
    assert!(msg.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(msg.contains("EXT:\r\n"));
    assert!(msg.contains("ST: upnp:rootdevice\r\n"));
    assert!(msg.contains("USN: usn\r\n"));
    assert!(msg.contains("CACHE-CONTROL: max-age=60\r\n"));
    assert!(msg.contains("LOCATION: http://10.0.0.2:1338/rootDesc.xml\r\n"));
}

//! Root device registry: stable identity, advertised services, and the
//! prerendered device description.

use std::net::Ipv4Addr;

use quick_xml::escape::escape;
use uuid::Uuid;

use crate::upnp::Service;

pub const SERVER_FIELD: &str = "Linux/3.4 DLNADOC/1.50 UPnP/1.0 dircast/1.0";
pub const ROOT_DEVICE_TYPE: &str = "urn:schemas-upnp-org:device:MediaServer:1";
pub const MODEL_NAME: &str = "dircast 1.0";
pub const MANUFACTURER: &str = "dircast project";

pub const ROOT_DESC_PATH: &str = "/rootDesc.xml";
pub const RES_PATH: &str = "/res";

pub const SERVICES: &[Service] = &[Service {
    service_type: "urn:schemas-upnp-org:service:ContentDirectory:1",
    service_id: "urn:upnp-org:serviceId:ContentDirectory",
    scpd_url: "/scpd/ContentDirectory.xml",
    control_url: "/ctl/ContentDirectory",
}];

/// Derive the device UUID from the friendly name: a 128-bit name hash in the
/// standard UUID group layout. Relaunching with the same name re-announces
/// the same identity.
pub fn device_uuid(friendly_name: &str) -> String {
    format!(
        "uuid:{}",
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, friendly_name.as_bytes())
    )
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "nobody".to_string())
}

fn current_host() -> String {
    hostname::get()
        .ok()
        .and_then(|os| os.into_string().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// `"<model>: <user> on <host>"`, e.g. `"dircast 1.0: alice on mars"`.
pub fn default_friendly_name() -> String {
    format!("{}: {} on {}", MODEL_NAME, current_user(), current_host())
}

/// The one root device this process advertises. Built once at startup,
/// immutable afterwards.
#[derive(Debug)]
pub struct RootDevice {
    pub friendly_name: String,
    pub uuid: String,
    pub http_port: u16,
    desc_xml: Vec<u8>,
}

impl RootDevice {
    pub fn new(friendly_name: String, http_port: u16) -> Self {
        let uuid = device_uuid(&friendly_name);
        let desc_xml = render_description(&friendly_name, &uuid);
        RootDevice {
            friendly_name,
            uuid,
            http_port,
            desc_xml,
        }
    }

    /// The cached device description document.
    pub fn description_xml(&self) -> &[u8] {
        &self.desc_xml
    }

    /// Description URL to advertise for clients reachable via `ip`. Fills the
    /// `LOCATION:` header of every SSDP message sent on that interface.
    pub fn location(&self, ip: Ipv4Addr) -> String {
        format!("http://{}:{}{}", ip, self.http_port, ROOT_DESC_PATH)
    }
}

fn render_description(friendly_name: &str, uuid: &str) -> Vec<u8> {
    let service_list: String = SERVICES
        .iter()
        .map(|s| {
            format!(
                r#"
      <service>
        <serviceType>{}</serviceType>
        <serviceId>{}</serviceId>
        <SCPDURL>{}</SCPDURL>
        <controlURL>{}</controlURL>
        <eventSubURL></eventSubURL>
      </service>"#,
                s.service_type, s.service_id, s.scpd_url, s.control_url
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion>
    <major>1</major>
    <minor>0</minor>
  </specVersion>
  <device>
    <deviceType>{device_type}</deviceType>
    <friendlyName>{friendly_name}</friendlyName>
    <manufacturer>{manufacturer}</manufacturer>
    <modelName>{model_name}</modelName>
    <UDN>{uuid}</UDN>
    <serviceList>{service_list}
    </serviceList>
  </device>
</root>"#,
        device_type = ROOT_DEVICE_TYPE,
        friendly_name = escape(friendly_name),
        manufacturer = MANUFACTURER,
        model_name = MODEL_NAME,
        uuid = uuid,
    )
    .into_bytes()
}

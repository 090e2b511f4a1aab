//! UPnP value types shared by the device description, SOAP dispatch, and SSDP
//! announcements.

/// One service entry in the root device description.
#[derive(Debug, Clone, Copy)]
pub struct Service {
    pub service_type: &'static str,
    pub service_id: &'static str,
    pub scpd_url: &'static str,
    pub control_url: &'static str,
}

/// A parsed `SOAPACTION` header: `"<serviceURN>#<action>"` (quotes optional).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapAction {
    pub service_urn: String,
    pub action: String,
}

/// Parse the `SOAPACTION` HTTP header. Returns `None` unless the value is a
/// non-empty URN and action separated by exactly one `#`.
pub fn parse_action_header(header: &str) -> Option<SoapAction> {
    let value = header.trim().trim_matches('"');
    let (urn, action) = value.split_once('#')?;
    if urn.is_empty() || action.is_empty() || action.contains('#') {
        return None;
    }
    Some(SoapAction {
        service_urn: urn.to_string(),
        action: action.to_string(),
    })
}

/// A UPnP control-point-visible error, carried in the `<UPnPError>` detail of
/// a SOAP fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{description} ({code})")]
pub struct UpnpError {
    pub code: u16,
    pub description: &'static str,
}

impl UpnpError {
    pub fn invalid_action() -> Self {
        UpnpError { code: 401, description: "Invalid Action" }
    }

    pub fn invalid_args() -> Self {
        UpnpError { code: 402, description: "Invalid Args" }
    }

    pub fn no_such_object() -> Self {
        UpnpError { code: 701, description: "No such object" }
    }
}

//! SOAP 1.1 envelope codec for UPnP control: decodes inbound action requests
//! and renders response/fault envelopes.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::upnp::UpnpError;

/// An action invocation pulled out of a request envelope: the service URN the
/// action element is bound to, the action name, and the argument elements in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCall {
    pub service_urn: String,
    pub action: String,
    pub args: Vec<(String, String)>,
}

impl ActionCall {
    /// First argument with the given name, if present.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SoapError {
    #[error("malformed envelope: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("envelope carries no action element")]
    NoAction,
}

/// Decode a request envelope. The action element is the first child of
/// `<s:Body>`; its namespace is the service URN and its children are the
/// input arguments. Markup nested deeper than one level inside an argument
/// is not expected from UPnP control points and is ignored.
pub fn decode_request(xml: &str) -> Result<ActionCall, SoapError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_body = false;
    let mut action: Option<(String, String)> = None;
    let mut args: Vec<(String, String)> = Vec::new();
    let mut current_arg: Option<(String, String)> = None;

    loop {
        match reader.read_resolved_event()? {
            (_, Event::Eof) => break,
            (ns, Event::Start(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if !in_body {
                    if local == "Body" {
                        in_body = true;
                    }
                } else if action.is_none() {
                    let urn = match ns {
                        ResolveResult::Bound(ns) => {
                            String::from_utf8_lossy(ns.into_inner()).into_owned()
                        }
                        _ => String::new(),
                    };
                    action = Some((urn, local));
                } else if current_arg.is_none() {
                    current_arg = Some((local, String::new()));
                }
            }
            (ns, Event::Empty(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if !in_body {
                    continue;
                }
                if action.is_none() {
                    // A self-closing action element: no arguments.
                    let urn = match ns {
                        ResolveResult::Bound(ns) => {
                            String::from_utf8_lossy(ns.into_inner()).into_owned()
                        }
                        _ => String::new(),
                    };
                    action = Some((urn, local));
                    break;
                }
                if current_arg.is_none() {
                    args.push((local, String::new()));
                }
            }
            (_, Event::Text(t)) => {
                if let Some((_, value)) = current_arg.as_mut() {
                    value.push_str(&t.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            (_, Event::End(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let arg_closed = matches!(&current_arg, Some((name, _)) if *name == local);
                if arg_closed {
                    if let Some(arg) = current_arg.take() {
                        args.push(arg);
                    }
                } else if matches!(&action, Some((_, name)) if *name == local) {
                    break;
                }
            }
            _ => {}
        }
    }

    let (service_urn, action) = action.ok_or(SoapError::NoAction)?;
    Ok(ActionCall { service_urn, action, args })
}

fn envelope(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"
            s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    {inner}
  </s:Body>
</s:Envelope>"#
    )
}

fn render_args(args: &[(String, String)]) -> String {
    args.iter()
        .map(|(name, value)| format!("<{name}>{}</{name}>", escape(value.as_str())))
        .collect()
}

/// Render a response envelope: one `<u:{action}Response>` element in the
/// service URN namespace with a child per output argument.
pub fn encode_response(service_urn: &str, action: &str, args: &[(String, String)]) -> String {
    envelope(&format!(
        r#"<u:{action}Response xmlns:u="{service_urn}">{}</u:{action}Response>"#,
        render_args(args)
    ))
}

/// Render a request envelope, the control-point side of [`decode_request`].
pub fn encode_request(service_urn: &str, action: &str, args: &[(String, String)]) -> String {
    envelope(&format!(
        r#"<u:{action} xmlns:u="{service_urn}">{}</u:{action}>"#,
        render_args(args)
    ))
}

/// Render a `UPnPError` SOAP fault envelope.
pub fn encode_fault(err: &UpnpError) -> String {
    envelope(&format!(
        r#"<s:Fault>
      <faultcode>s:Client</faultcode>
      <faultstring>UPnPError</faultstring>
      <detail>
        <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
          <errorCode>{}</errorCode>
          <errorDescription>{}</errorDescription>
        </UPnPError>
      </detail>
    </s:Fault>"#,
        err.code,
        escape(err.description)
    ))
}

//! DIDL-Lite object model and its XML projection, as returned in Browse
//! `Result` documents.

use quick_xml::escape::escape;

/// Header fields shared by containers and items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub class: String,
}

/// A streamable representation of an item.
///
/// `size` is absent for transcoded resources (their length is unknown until
/// the stream ends). `bitrate` and `duration` come from the media probe and
/// are omitted when probing failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    pub protocol_info: String,
    pub url: String,
    pub size: Option<u64>,
    pub bitrate: Option<u64>,
    pub duration: Option<String>,
}

/// A browseable entity. Containers project `childCount` and no `<res>`;
/// items project exactly one `<res>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Container { object: Object, child_count: usize },
    Item { object: Object, res: Resource },
}

impl Entry {
    pub fn object(&self) -> &Object {
        match self {
            Entry::Container { object, .. } => object,
            Entry::Item { object, .. } => object,
        }
    }

    fn render(&self, out: &mut String) {
        let obj = self.object();
        let common = format!(
            r#"id="{}" parentID="{}" restricted="1""#,
            escape(obj.id.as_str()),
            escape(obj.parent_id.as_str()),
        );
        let header = format!(
            "<dc:title>{}</dc:title><upnp:class>{}</upnp:class>",
            escape(obj.title.as_str()),
            escape(obj.class.as_str()),
        );
        match self {
            Entry::Container { child_count, .. } => {
                out.push_str(&format!(
                    r#"<container {common} childCount="{child_count}">{header}</container>"#
                ));
            }
            Entry::Item { res, .. } => {
                let mut attrs = format!(r#" protocolInfo="{}""#, escape(res.protocol_info.as_str()));
                if let Some(size) = res.size {
                    attrs.push_str(&format!(r#" size="{size}""#));
                }
                if let Some(bitrate) = res.bitrate {
                    attrs.push_str(&format!(r#" bitrate="{bitrate}""#));
                }
                if let Some(duration) = &res.duration {
                    attrs.push_str(&format!(r#" duration="{duration}""#));
                }
                out.push_str(&format!(
                    r#"<item {common}>{header}<res{attrs}>{}</res></item>"#,
                    escape(res.url.as_str()),
                ));
            }
        }
    }
}

/// Wrap rendered entries in the DIDL-Lite root element. All four namespace
/// declarations are required; some renderers silently reject documents that
/// drop `xmlns:dlna`.
pub fn didl_document(entries: &[Entry]) -> String {
    let mut inner = String::new();
    for entry in entries {
        entry.render(&mut inner);
    }
    format!(
        r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dlna="urn:schemas-dlna-org:metadata-1-0/">{inner}</DIDL-Lite>"#
    )
}

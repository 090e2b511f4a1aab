//! ContentDirectory control endpoint: SOAP dispatch and the Browse pipeline
//! that turns a directory listing into DIDL-Lite.

use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::device::RES_PATH;
use crate::didl::{self, Entry, Object, Resource};
use crate::dlna::{self, ContentFeatures};
use crate::http::state::AppState;
use crate::mapper;
use crate::media::{mime, probe};
use crate::soap::{self, ActionCall};
use crate::upnp::{self, UpnpError};

const XML_CONTENT_TYPE: &str = "text/xml; charset=\"utf-8\"";

/// Object-id suffix denoting the transcoded sibling of a video file.
pub const TRANSCODE_SUFFIX: &str = "/transcode";

pub async fn control(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let soap_action = headers
        .get("soapaction")
        .and_then(|v| v.to_str().ok())
        .and_then(upnp::parse_action_header);
    let Some(soap_action) = soap_action else {
        tracing::warn!("missing or malformed SOAPACTION header");
        return fault_response(&UpnpError::invalid_action());
    };
    let call = match soap::decode_request(&body) {
        Ok(call) => call,
        Err(e) => {
            tracing::warn!("bad SOAP envelope from control point: {e}");
            return fault_response(&UpnpError::invalid_action());
        }
    };
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost:1338")
        .to_string();
    tracing::debug!("SOAP request: {}#{}", soap_action.service_urn, soap_action.action);

    let result = match soap_action.action.as_str() {
        "Browse" => handle_browse(&state, &host, &call).await,
        "GetSortCapabilities" => Ok(vec![("SortCaps".to_string(), "dc:title".to_string())]),
        "GetSearchCapabilities" => Ok(vec![("SearchCaps".to_string(), String::new())]),
        "GetSystemUpdateID" => Ok(vec![("Id".to_string(), "0".to_string())]),
        other => {
            tracing::warn!("unhandled ContentDirectory action: {other}");
            Err(UpnpError::invalid_action())
        }
    };
    match result {
        Ok(args) => {
            let body = soap::encode_response(&soap_action.service_urn, &soap_action.action, &args);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
                body,
            )
                .into_response()
        }
        Err(err) => fault_response(&err),
    }
}

fn fault_response(err: &UpnpError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
        soap::encode_fault(err),
    )
        .into_response()
}

// ── Browse ────────────────────────────────────────────────────────────────────

async fn handle_browse(
    state: &AppState,
    host: &str,
    call: &ActionCall,
) -> Result<Vec<(String, String)>, UpnpError> {
    let object_id = call.arg("ObjectID").ok_or_else(UpnpError::invalid_args)?;
    let browse_flag = call.arg("BrowseFlag").ok_or_else(UpnpError::invalid_args)?;
    if browse_flag != "BrowseDirectChildren" {
        tracing::warn!("unhandled browse flag: {browse_flag}");
        return Err(UpnpError::invalid_action());
    }
    // Filter is accepted and ignored: responses always carry every field.
    let starting_index: usize = call
        .arg("StartingIndex")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let requested_count: usize = call
        .arg("RequestedCount")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let path = if object_id == "0" {
        state.root.as_ref().clone()
    } else {
        PathBuf::from(object_id)
    };
    if !path.is_dir() {
        return Err(UpnpError::no_such_object());
    }

    let objects = read_container(&path, object_id, host).await;
    let total = objects.len();
    let page = paginate(&objects, starting_index, requested_count);
    let result = didl::didl_document(page);
    Ok(vec![
        ("Result".to_string(), result),
        ("NumberReturned".to_string(), page.len().to_string()),
        ("TotalMatches".to_string(), total.to_string()),
        ("UpdateID".to_string(), "0".to_string()),
    ])
}

/// Browse pagination: skip `starting_index`, then take `requested_count`
/// unless it is zero, which means "all remaining".
pub fn paginate<T>(items: &[T], starting_index: usize, requested_count: usize) -> &[T] {
    let start = starting_index.min(items.len());
    let slice = &items[start..];
    if requested_count == 0 {
        slice
    } else {
        &slice[..requested_count.min(slice.len())]
    }
}

/// One browseable row before it becomes a DIDL object. A video file expands
/// into two of these: the file itself and its transcoded variant.
#[derive(Debug, Clone)]
struct CdsEntry {
    title: String,
    path: PathBuf,
    is_dir: bool,
    size: u64,
    mime: &'static str,
    transcode: bool,
}

impl CdsEntry {
    fn object_id(&self) -> String {
        let path = self.path.to_string_lossy();
        if self.transcode {
            format!("{path}{TRANSCODE_SUFFIX}")
        } else {
            path.into_owned()
        }
    }
}

fn expand_entry(name: &str, path: PathBuf, meta: &std::fs::Metadata) -> Vec<CdsEntry> {
    let mime_type = mime::by_extension(&path);
    let entry = CdsEntry {
        title: name.to_string(),
        path,
        is_dir: meta.is_dir(),
        size: meta.len(),
        mime: mime_type,
        transcode: false,
    };
    if !entry.is_dir && mime::is_video(mime_type) {
        let variant = CdsEntry {
            title: format!("{name}{TRANSCODE_SUFFIX}"),
            transcode: true,
            ..entry.clone()
        };
        return vec![entry, variant];
    }
    vec![entry]
}

/// Enumerate a directory into CDS entries, sorted case-insensitively by
/// filename with each video immediately followed by its transcode variant.
/// Unreadable entries are logged and dropped.
fn list_directory(dir: &Path) -> std::io::Result<Vec<CdsEntry>> {
    let mut listed: Vec<(String, PathBuf, std::fs::Metadata)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("cannot stat {}: {e}", entry.path().display());
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        listed.push((name, entry.path(), meta));
    }
    listed.sort_by_key(|(name, ..)| name.to_lowercase());
    Ok(listed
        .into_iter()
        .flat_map(|(name, path, meta)| expand_entry(&name, path, &meta))
        .collect())
}

/// CDS entries under `dir` — what a container reports as `childCount`.
/// A directory holding three videos counts six.
fn child_count(dir: &Path) -> usize {
    match list_directory(dir) {
        Ok(entries) => entries.len(),
        Err(e) => {
            tracing::warn!("cannot count children of {}: {e}", dir.display());
            0
        }
    }
}

/// List a directory and synthesize its DIDL objects under a worker pool
/// sized to the host CPU count. Output order matches the sorted listing.
/// Enumeration failure yields an empty (but valid) result.
async fn read_container(dir: &Path, parent_id: &str, host: &str) -> Vec<Entry> {
    let entries = match list_directory(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("cannot list {}: {e}", dir.display());
            return Vec::new();
        }
    };
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let parent_id = parent_id.to_string();
    let host = host.to_string();
    mapper::map_ordered_collect(entries, workers, move |entry| {
        entry_object(entry, parent_id.clone(), host.clone())
    })
    .await
}

/// Synthesize the DIDL object for one CDS entry. The parent id is the
/// requesting ObjectID, which keeps the client's navigation context intact
/// even for the root.
async fn entry_object(entry: CdsEntry, parent_id: String, host: String) -> Entry {
    let id = entry.object_id();
    if entry.is_dir {
        let child_count = child_count(&entry.path);
        return Entry::Container {
            object: Object {
                id,
                parent_id,
                title: entry.title,
                class: "object.container.storageFolder".to_string(),
            },
            child_count,
        };
    }

    let (mime_type, features, size) = if entry.transcode {
        (
            "video/mpeg",
            ContentFeatures {
                support_time_seek: true,
                transcoded: true,
                ..Default::default()
            },
            None,
        )
    } else {
        (
            entry.mime,
            ContentFeatures {
                support_range: true,
                ..Default::default()
            },
            Some(entry.size),
        )
    };

    let mut url = format!(
        "http://{host}{RES_PATH}?path={}",
        urlencoding::encode(&entry.path.to_string_lossy())
    );
    if entry.transcode {
        url.push_str("&transcode=t");
    }

    let info = match probe::probe(&entry.path).await {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!("probing {} failed: {e}", entry.path.display());
            probe::ProbeInfo::default()
        }
    };

    Entry::Item {
        object: Object {
            id,
            parent_id,
            title: entry.title,
            class: mime::upnp_class(mime_type),
        },
        res: Resource {
            protocol_info: format!("http-get:*:{mime_type}:{features}"),
            url,
            size,
            bitrate: info.bitrate,
            duration: info.duration.map(dlna::format_npt_time),
        },
    }
}

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use dircast::device::RootDevice;
use dircast::http::build_router;
use dircast::http::state::AppState;
use dircast::soap;

const CDS_URN: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";
const CONTROL_URL: &str = "/ctl/ContentDirectory";

fn make_app(root: &Path) -> axum::Router {
    let state = AppState {
        device: Arc::new(RootDevice::new("Test DLNA Server".to_string(), 1338)),
        root: Arc::new(root.to_path_buf()),
        started: chrono::Utc::now(),
    };
    build_router(state)
}

/// Media tree used by most tests: two videos and a text file whose names
/// exercise case-insensitive ordering.
fn media_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.mp4"), b"avideo").unwrap();
    std::fs::write(dir.path().join("B.txt"), b"notes").unwrap();
    std::fs::write(dir.path().join("c.MKV"), b"bvideo").unwrap();
    dir
}

fn soap_request(action: &str, args: &[(String, String)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(CONTROL_URL)
        .header("soapaction", format!("\"{CDS_URN}#{action}\""))
        .header("content-type", "text/xml; charset=\"utf-8\"")
        .body(Body::from(soap::encode_request(CDS_URN, action, args)))
        .unwrap()
}

fn browse_request(object_id: &str, starting_index: u32, requested_count: u32) -> Request<Body> {
    let args = vec![
        ("ObjectID".to_string(), object_id.to_string()),
        ("BrowseFlag".to_string(), "BrowseDirectChildren".to_string()),
        ("Filter".to_string(), "*".to_string()),
        ("StartingIndex".to_string(), starting_index.to_string()),
        ("RequestedCount".to_string(), requested_count.to_string()),
        ("SortCriteria".to_string(), String::new()),
    ];
    soap_request("Browse", &args)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Extract one output argument from a response envelope.
fn out_arg(body: &str, name: &str) -> Option<String> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].to_string())
}

/// Undo the XML escaping applied to the Result argument.
fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

async fn browse_result(app: axum::Router, object_id: &str, s: u32, r: u32) -> (String, String, String) {
    let response = app
        .oneshot(browse_request(object_id, s, r))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    let didl = unescape(&out_arg(&body, "Result").expect("missing Result"));
    let returned = out_arg(&body, "NumberReturned").expect("missing NumberReturned");
    let total = out_arg(&body, "TotalMatches").expect("missing TotalMatches");
    (didl, returned, total)
}

// ── Root listing ──────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn root_listing_expands_videos_in_order() {
    let dir = media_tree();
    let (didl, returned, total) = browse_result(make_app(dir.path()), "0", 0, 0).await;
    assert_eq!(returned, "5");
    assert_eq!(total, "5");

    let titles = [
        "<dc:title>a.mp4</dc:title>",
        "<dc:title>a.mp4/transcode</dc:title>",
        "<dc:title>B.txt</dc:title>",
        "<dc:title>c.MKV</dc:title>",
        "<dc:title>c.MKV/transcode</dc:title>",
    ];
    let mut last = 0;
    for title in titles {
        let pos = didl.find(title).unwrap_or_else(|| panic!("missing {title} in {didl}"));
        assert!(pos >= last, "{title} out of order in {didl}");
        last = pos;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn children_carry_the_requested_parent_id() {
    let dir = media_tree();
    let (didl, ..) = browse_result(make_app(dir.path()), "0", 0, 0).await;
    assert_eq!(didl.matches(r#"parentID="0""#).count(), 5, "in {didl}");
}

#[tokio::test(flavor = "multi_thread")]
async fn item_classes_follow_major_mime_type() {
    let dir = media_tree();
    let (didl, ..) = browse_result(make_app(dir.path()), "0", 0, 0).await;
    assert!(didl.contains("object.item.videoItem"), "in {didl}");
    assert!(didl.contains("object.item.textItem"), "in {didl}");
}

#[tokio::test(flavor = "multi_thread")]
async fn direct_resource_declares_range_support_and_size() {
    let dir = media_tree();
    let (didl, ..) = browse_result(make_app(dir.path()), "0", 0, 0).await;
    assert!(
        didl.contains("http-get:*:video/mp4:DLNA.ORG_PN=;DLNA.ORG_OP=01;DLNA.ORG_CI=0"),
        "in {didl}"
    );
    assert!(didl.contains(r#"size="6""#), "in {didl}");
    assert!(didl.contains("/res?path="), "in {didl}");
}

#[tokio::test(flavor = "multi_thread")]
async fn transcode_resource_is_mpeg_time_seek_and_sizeless() {
    let dir = media_tree();
    let (didl, ..) = browse_result(make_app(dir.path()), "0", 0, 0).await;
    assert!(
        didl.contains("http-get:*:video/mpeg:DLNA.ORG_PN=;DLNA.ORG_OP=10;DLNA.ORG_CI=1"),
        "in {didl}"
    );
    assert!(didl.contains("transcode=t"), "in {didl}");
    // The transcoded stream's length is unknown, so its res has no size.
    let transcoded = didl
        .split("<item")
        .find(|chunk| chunk.contains("a.mp4/transcode"))
        .expect("transcode item missing");
    assert!(!transcoded.contains("size="), "in {transcoded}");
}

// ── Pagination ────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn pagination_window() {
    let dir = media_tree();
    let (didl, returned, total) = browse_result(make_app(dir.path()), "0", 2, 2).await;
    assert_eq!(returned, "2");
    assert_eq!(total, "5");
    assert!(didl.contains("<dc:title>B.txt</dc:title>"), "in {didl}");
    assert!(didl.contains("<dc:title>c.MKV</dc:title>"), "in {didl}");
    assert!(!didl.contains("<dc:title>a.mp4</dc:title>"), "in {didl}");
}

#[tokio::test(flavor = "multi_thread")]
async fn starting_index_past_end_is_empty_but_truthful() {
    let dir = media_tree();
    let (didl, returned, total) = browse_result(make_app(dir.path()), "0", 10, 0).await;
    assert_eq!(returned, "0");
    assert_eq!(total, "5");
    assert!(didl.starts_with("<DIDL-Lite"), "wrapper missing: {didl}");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_directory_is_a_valid_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let (didl, returned, total) = browse_result(make_app(dir.path()), "0", 0, 0).await;
    assert_eq!(returned, "0");
    assert_eq!(total, "0");
    assert!(didl.contains("</DIDL-Lite>") || didl.ends_with("/>"), "in {didl}");
}

// ── Subdirectories ────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn subdirectory_child_count_counts_cds_entries() {
    let dir = tempfile::tempdir().unwrap();
    let films = dir.path().join("films");
    std::fs::create_dir(&films).unwrap();
    std::fs::write(films.join("one.mp4"), b"x").unwrap();

    let (didl, returned, _) = browse_result(make_app(dir.path()), "0", 0, 0).await;
    assert_eq!(returned, "1");
    // One video expands to two browseable entries.
    assert!(didl.contains(r#"childCount="2""#), "in {didl}");
    assert!(didl.contains("object.container.storageFolder"), "in {didl}");
    assert!(!didl.contains("<res"), "containers carry no res: {didl}");
}

#[tokio::test(flavor = "multi_thread")]
async fn browse_subdirectory_by_path_object_id() {
    let dir = tempfile::tempdir().unwrap();
    let films = dir.path().join("films");
    std::fs::create_dir(&films).unwrap();
    std::fs::write(films.join("one.mp4"), b"x").unwrap();

    let object_id = films.to_string_lossy().into_owned();
    let (didl, returned, total) =
        browse_result(make_app(dir.path()), &object_id, 0, 0).await;
    assert_eq!(returned, "2");
    assert_eq!(total, "2");
    assert_eq!(
        didl.matches(&format!(r#"parentID="{object_id}""#)).count(),
        2,
        "in {didl}"
    );
}

// ── Faults ────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn browsing_a_file_faults_with_no_such_object() {
    let dir = media_tree();
    let file_id = dir.path().join("B.txt").to_string_lossy().into_owned();
    let response = make_app(dir.path())
        .oneshot(browse_request(&file_id, 0, 0))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(body.contains("<errorCode>701</errorCode>"), "in {body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn browsing_a_missing_path_faults() {
    let dir = media_tree();
    let response = make_app(dir.path())
        .oneshot(browse_request("/does/not/exist", 0, 0))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(body.contains("<errorCode>701</errorCode>"), "in {body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn browse_metadata_flag_is_not_implemented() {
    let dir = media_tree();
    let args = vec![
        ("ObjectID".to_string(), "0".to_string()),
        ("BrowseFlag".to_string(), "BrowseMetadata".to_string()),
    ];
    let response = make_app(dir.path())
        .oneshot(soap_request("Browse", &args))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(body.contains("<errorCode>401</errorCode>"), "in {body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn declared_but_unimplemented_action_faults() {
    let dir = media_tree();
    let response = make_app(dir.path())
        .oneshot(soap_request("CreateObject", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(body.contains("UPnPError"), "in {body}");
    assert!(body.contains("<errorCode>401</errorCode>"), "in {body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_soapaction_header_faults() {
    let dir = media_tree();
    let response = make_app(dir.path())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(CONTROL_URL)
                .header("content-type", "text/xml; charset=\"utf-8\"")
                .body(Body::from(soap::encode_request(CDS_URN, "Browse", &[])))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ── Capability getters ────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn sort_capabilities_is_title() {
    let dir = media_tree();
    let response = make_app(dir.path())
        .oneshot(soap_request("GetSortCapabilities", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<SortCaps>dc:title</SortCaps>"), "in {body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn search_capabilities_is_empty() {
    let dir = media_tree();
    let response = make_app(dir.path())
        .oneshot(soap_request("GetSearchCapabilities", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<SearchCaps></SearchCaps>"), "in {body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn system_update_id_is_stable() {
    let dir = media_tree();
    let response = make_app(dir.path())
        .oneshot(soap_request("GetSystemUpdateID", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<Id>0</Id>"), "in {body}");
}

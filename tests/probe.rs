use std::path::Path;

use dircast::media::probe::{probe, ProbeInfo};

#[tokio::test]
async fn probing_a_missing_file_is_an_error() {
    let result = probe(Path::new("/nonexistent/clip.mp4")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn probing_garbage_is_an_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.mkv");
    std::fs::write(&path, b"definitely not matroska").unwrap();
    // Whether ffprobe is installed or not, this must surface as Err.
    assert!(probe(&path).await.is_err());
}

#[test]
fn default_info_is_fully_absent() {
    let info = ProbeInfo::default();
    assert_eq!(info.bitrate, None);
    assert_eq!(info.duration, None);
}

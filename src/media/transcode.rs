//! Live transcoding to an MPEG transport stream via an `ffmpeg` child
//! process.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};

const FFMPEG_BIN: &str = "ffmpeg";

/// The stdout of a running transcoder.
///
/// The child handle rides along with the pipe and is spawned with
/// `kill_on_drop`, so every way this stream can go away — EOF, a write error
/// on the response, the client hanging up, the handler task dying — reclaims
/// the subprocess.
pub struct TranscodeStream {
    _child: Child,
    stdout: ChildStdout,
}

impl AsyncRead for TranscodeStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().stdout).poll_read(cx, buf)
    }
}

/// Start transcoding `path` from `start` seconds, optionally limited to
/// `length` seconds of output.
pub fn spawn(path: &Path, start: f64, length: Option<f64>) -> io::Result<TranscodeStream> {
    let mut cmd = Command::new(FFMPEG_BIN);
    cmd.arg("-ss").arg(format!("{start:.3}"));
    if let Some(length) = length {
        cmd.arg("-t").arg(format!("{length:.3}"));
    }
    cmd.arg("-i")
        .arg(path)
        .args(["-f", "mpegts", "-c:v", "mpeg2video", "-qscale:v", "2"])
        .args(["-c:a", "mp2", "-b:a", "192k"])
        .arg("pipe:1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = cmd.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("transcoder stdout was not piped"))?;
    Ok(TranscodeStream { _child: child, stdout })
}

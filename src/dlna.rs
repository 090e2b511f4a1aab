//! DLNA header values: normal-play-time (NPT) parsing/formatting and the
//! `contentFeatures.dlna.org` descriptor string.

use std::fmt;

pub const CONTENT_FEATURES_HEADER: &str = "contentfeatures.dlna.org";
pub const TIME_SEEK_RANGE_HEADER: &str = "timeseekrange.dlna.org";
pub const TRANSFER_MODE_HEADER: &str = "transfermode.dlna.org";

/// DLNA.ORG_FLAGS: 8 significant hex digits + 24 zero padding (required length).
/// 01700000 = streaming transfer | background transfer | connection stall | DLNA v1.5.
pub const DLNA_FLAGS: &str = "01700000000000000000000000000000";

/// Format seconds as an NPT time: `H:MM:SS.mmm`, hours unpadded.
pub fn format_npt_time(seconds: f64) -> String {
    let mut whole = seconds.floor() as u64;
    let mut millis = ((seconds - whole as f64) * 1000.0).round() as u32;
    if millis == 1000 {
        whole += 1;
        millis = 0;
    }
    format!(
        "{}:{:02}:{:02}.{:03}",
        whole / 3600,
        (whole % 3600) / 60,
        whole % 60,
        millis
    )
}

/// Parse an NPT time endpoint: either a plain seconds float ("123.45") or a
/// sexagesimal `H:MM:SS[.fff]`. Returns `None` for anything else, including
/// negative values.
pub fn parse_npt_time(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if !s.contains(':') {
        let secs: f64 = s.parse().ok()?;
        return (secs >= 0.0 && secs.is_finite()).then_some(secs);
    }
    let mut parts = s.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes > 59 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// An NPT range from a `TimeSeekRange.dlna.org` header, after the `npt=`
/// prefix has been stripped. The end is optional ("10.0-" and "10.0" both
/// mean "from ten seconds onward").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NptRange {
    pub start: f64,
    pub end: Option<f64>,
}

impl NptRange {
    pub fn parse(s: &str) -> Option<NptRange> {
        let (start, end) = match s.split_once('-') {
            Some((start, "")) => (start, None),
            Some((start, end)) => (start, Some(end)),
            None => (s, None),
        };
        let start = parse_npt_time(start)?;
        let end = match end {
            Some(e) => {
                let e = parse_npt_time(e)?;
                if e < start {
                    return None;
                }
                Some(e)
            }
            None => None,
        };
        Some(NptRange { start, end })
    }
}

/// The feature flags printed into the fourth protocolInfo field and the
/// `contentFeatures.dlna.org` response header.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentFeatures {
    pub support_time_seek: bool,
    pub support_range: bool,
    pub transcoded: bool,
}

impl fmt::Display for ContentFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DLNA.ORG_PN=;DLNA.ORG_OP={}{};DLNA.ORG_CI={};DLNA.ORG_FLAGS={}",
            self.support_time_seek as u8,
            self.support_range as u8,
            self.transcoded as u8,
            DLNA_FLAGS
        )
    }
}

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemuxError {
    #[error("{path}: could not open file for {mode} ({source})")]
    Open {
        path: String,
        mode: &'static str,
        source: io::Error,
    },
    #[error("{path}: {offset:#010X}: seek error ({source})")]
    Seek {
        path: String,
        offset: u64,
        source: io::Error,
    },
    #[error("{path}: {offset:#010X}: read error ({source})")]
    Read {
        path: String,
        offset: u64,
        source: io::Error,
    },
    #[error("{path}: {offset:#010X}: read error (unexpected end of file)")]
    UnexpectedEof { path: String, offset: u64 },
    #[error("{path}: {offset:#010X}: write error ({source})")]
    Write {
        path: String,
        offset: u64,
        source: io::Error,
    },
    #[error("{path}: {offset:#010X}: invalid MPEG start code: {prefix:06X}")]
    InvalidStartCode {
        path: String,
        offset: u64,
        prefix: u32,
    },
    #[error("{path}: {offset:#010X}: unexpected MPEG ID: {id:02X}")]
    UnexpectedId { path: String, offset: u64, id: u8 },
    #[error("{path}: {offset:#010X}: invalid private header/packet")]
    InvalidPrivateHeader { path: String, offset: u64 },
    #[error("{path}: {offset:#010X}: invalid PES header")]
    InvalidPesHeader { path: String, offset: u64 },
    #[error("{path}: {offset:#010X}: unexpected substream ID: {ssid:02X}")]
    UnexpectedSubstreamId {
        path: String,
        offset: u64,
        ssid: u8,
    },
    #[error("{path}: invalid/unsupported channel count: {channels}")]
    InvalidChannelCount { path: String, channels: u8 },
    #[error("{path}: malformed or no ADPCM data")]
    MalformedAdpcm { path: String },
}

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use anyhow::Error;
use log::{debug, info};

use crate::error::DemuxError;
use crate::genh;
use crate::pss::{Demuxer, Output, StreamKind};
use crate::util;

pub fn run(input: &str) -> Result<(), Error> {
    let file = File::open(input).map_err(|e| DemuxError::Open {
        path: input.to_string(),
        mode: "reading",
        source: e,
    })?;
    let mut demuxer = Demuxer::new(
        BufReader::new(file),
        input.to_string(),
        |kind: StreamKind| -> Result<Output<BufWriter<File>>, DemuxError> {
            let path = util::replace_ext(input, kind.suffix());
            debug!("{}: extracting {} stream", path, kind);
            let sink = File::create(&path).map_err(|e| DemuxError::Open {
                path: path.clone(),
                mode: "writing",
                source: e,
            })?;
            Ok(Output::new(BufWriter::new(sink), path))
        },
    );
    demuxer.run()?;
    let outputs = demuxer.into_outputs();
    for out in outputs.iter().flatten() {
        info!("{}: {} bytes", out.path, out.written);
    }
    let has_adpcm = outputs[StreamKind::Adpcm.index()].is_some();
    // close the sinks before the finalizer reopens the audio for update.
    drop(outputs);

    if has_adpcm {
        let path = util::replace_ext(input, StreamKind::Adpcm.suffix());
        let mut sink = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| DemuxError::Open {
                path: path.clone(),
                mode: "updating",
                source: e,
            })?;
        genh::finalize(&mut sink, &path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private_packet(ssid: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x00, 0x00, 0x01, 0xbd];
        out.extend_from_slice(&((0x11 + payload.len()) as u16).to_be_bytes());
        let mut header = [0u8; 0x11];
        header[0x10] = ssid;
        out.extend_from_slice(&header);
        out.extend_from_slice(payload);
        out
    }

    fn pes_packet(id: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x00, 0x00, 0x01, id];
        out.extend_from_slice(&((3 + payload.len()) as u16).to_be_bytes());
        out.extend_from_slice(&[0x80, 0x00, 0x00]);
        out.extend_from_slice(payload);
        out
    }

    fn adpcm_payload(channels: u8, sample_rate: u16, audio: &[u8]) -> Vec<u8> {
        let mut params = vec![0u8; 0x800];
        params[6..8].copy_from_slice(&sample_rate.to_be_bytes());
        params[8] = channels;
        params.extend_from_slice(audio);
        params
    }

    fn u32_le(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn extraction_writes_streams_and_finalizes_the_audio() {
        let mut terminator = [0x77u8; 16];
        terminator[0] = 0x00;
        terminator[1] = 0x00;
        let container = [
            private_packet(0x01, &adpcm_payload(1, 44100, &terminator)),
            pes_packet(0xe0, b"video frame"),
            vec![0x00, 0x00, 0x01, 0xb9],
        ]
        .concat();

        let dir = tempfile::tempdir().unwrap();
        let pss = dir.path().join("movie.pss");
        std::fs::write(&pss, container).unwrap();
        run(pss.to_str().unwrap()).unwrap();

        let audio = std::fs::read(dir.path().join("movie.genh")).unwrap();
        assert_eq!(audio.len(), 0x1810);
        assert_eq!(&audio[0..4], b"GENH");
        assert_eq!(u32_le(&audio, 0x04), 1);
        assert_eq!(u32_le(&audio, 0x0c), 44100);
        assert_eq!(u32_le(&audio, 0x14), 28);
        assert_eq!(audio[0x1801], 0x07);

        let video = std::fs::read(dir.path().join("movie.m2v")).unwrap();
        assert_eq!(video, b"video frame");
        assert!(!dir.path().join("movie.m2a").exists());
    }

    #[test]
    fn a_stream_too_short_to_finalize_fails_after_extraction() {
        let container = [
            private_packet(0x01, &adpcm_payload(1, 44100, &[])),
            vec![0x00, 0x00, 0x01, 0xb9],
        ]
        .concat();

        let dir = tempfile::tempdir().unwrap();
        let pss = dir.path().join("movie.pss");
        std::fs::write(&pss, container).unwrap();
        let err = run(pss.to_str().unwrap()).unwrap_err();
        match err.downcast::<DemuxError>().unwrap() {
            DemuxError::MalformedAdpcm { path } => assert!(path.ends_with("movie.genh")),
            other => panic!("unexpected error: {}", other),
        }
        // the extracted bytes stay on disk, just without a header.
        let audio = std::fs::read(dir.path().join("movie.genh")).unwrap();
        assert_eq!(audio.len(), 0x1800);
        assert!(audio[..0x1000].iter().all(|&b| b == 0));
    }

    #[test]
    fn a_missing_input_reports_the_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pss = dir.path().join("no_such_film.pss");
        let err = run(pss.to_str().unwrap()).unwrap_err();
        match err.downcast::<DemuxError>().unwrap() {
            DemuxError::Open { path, mode, .. } => {
                assert!(path.ends_with("no_such_film.pss"));
                assert_eq!(mode, "reading");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

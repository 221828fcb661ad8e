use std::io::{self, Read, Seek, SeekFrom, Write};

use bytes::{BufMut, BytesMut};
use log::debug;

use crate::error::DemuxError;
use crate::util;

pub const HEADER_SIZE: usize = 0x1000;

const MAGIC: &[u8; 4] = b"GENH";
const ADPCM_BLOCK_SIZE: usize = 16;
const SAMPLES_PER_BLOCK: u64 = 28;
const AUDIO_START: u64 = 0x1800;
const INTERLEAVE: u64 = 0x800;
const NO_LOOP_START: u32 = 0xffff_ffff;
const END_FLAG: u8 = 0x07;
const END_SENTINEL: [u8; 14] = [0x77; 14];

/// Repairs the tail of a demuxed ADPCM stream and overwrites its reserved
/// first block with a GENH header, making the file playable. The stream
/// parameters are read back from the block the encoder stores at the end
/// of the reserved space.
pub fn finalize<F: Read + Write + Seek>(file: &mut F, path: &str) -> Result<(), DemuxError> {
    let size = file
        .seek(SeekFrom::End(0))
        .map_err(|e| seek_error(path, 0, e))?;
    if size % ADPCM_BLOCK_SIZE as u64 != 0 || size < AUDIO_START {
        return Err(DemuxError::MalformedAdpcm {
            path: path.to_string(),
        });
    }

    let mut params = [0u8; ADPCM_BLOCK_SIZE];
    file.seek(SeekFrom::Start(HEADER_SIZE as u64))
        .map_err(|e| seek_error(path, HEADER_SIZE as u64, e))?;
    util::read_exact(file, path, HEADER_SIZE as u64, &mut params)?;
    let sample_rate = u16::from_be_bytes([params[6], params[7]]);
    let channels = params[8];
    if channels != 1 && channels != 2 {
        return Err(DemuxError::InvalidChannelCount {
            path: path.to_string(),
            channels,
        });
    }
    let min_size = match channels {
        1 => AUDIO_START + ADPCM_BLOCK_SIZE as u64,
        _ => AUDIO_START + 2 * INTERLEAVE,
    };
    if size < min_size {
        return Err(DemuxError::MalformedAdpcm {
            path: path.to_string(),
        });
    }
    debug!(
        "{}: {} Hz, {} channel(s), {} bytes",
        path, sample_rate, channels, size
    );

    // the encoder leaves garbage blocks behind the real end of stream;
    // flag the last end-of-stream placeholder so decoders stop there.
    let (tail_start, tail_len) = if channels == 1 && size < AUDIO_START + INTERLEAVE {
        (AUDIO_START, (size - AUDIO_START) as usize)
    } else {
        let len = u64::from(channels) * INTERLEAVE;
        (size - len, len as usize)
    };
    let mut tail = vec![0u8; tail_len];
    file.seek(SeekFrom::Start(tail_start))
        .map_err(|e| seek_error(path, tail_start, e))?;
    util::read_exact(file, path, tail_start, &mut tail)?;
    match channels {
        1 => patch_tail(&mut tail),
        _ => {
            let (left, right) = tail.split_at_mut(INTERLEAVE as usize);
            patch_tail(left);
            patch_tail(right);
        }
    }
    file.seek(SeekFrom::Start(tail_start))
        .map_err(|e| seek_error(path, tail_start, e))?;
    file.write_all(&tail)
        .map_err(|e| write_error(path, tail_start, e))?;

    let blocks = (size - AUDIO_START) / ADPCM_BLOCK_SIZE as u64;
    let mut header = BytesMut::with_capacity(HEADER_SIZE);
    header.put_slice(MAGIC);
    header.put_u32_le(u32::from(channels));
    header.put_u32_le(if channels == 2 { INTERLEAVE as u32 } else { 0 });
    header.put_u32_le(u32::from(sample_rate));
    // no loop start, loop end at the last sample.
    header.put_u32_le(NO_LOOP_START);
    header.put_u32_le((blocks * SAMPLES_PER_BLOCK / u64::from(channels)) as u32);
    // coding type 0, PSX 4-bit ADPCM.
    header.put_u32_le(0);
    header.put_u32_le(AUDIO_START as u32);
    header.put_u32_le(HEADER_SIZE as u32);
    header.resize(HEADER_SIZE, 0);
    file.seek(SeekFrom::Start(0))
        .map_err(|e| seek_error(path, 0, e))?;
    file.write_all(&header).map_err(|e| write_error(path, 0, e))?;
    Ok(())
}

// scans 16-byte blocks from the end of the region toward its start and
// rewrites the flag byte of the first block that looks like the encoder's
// end-of-stream placeholder (valid predictor nibble, valid flag, sentinel
// filler in the sample bytes).
fn patch_tail(region: &mut [u8]) {
    for block in region.chunks_exact_mut(ADPCM_BLOCK_SIZE).rev() {
        if block[0] >> 4 <= 4 && block[1] <= 7 && block[2..] == END_SENTINEL {
            block[1] = END_FLAG;
            return;
        }
    }
}

fn seek_error(path: &str, offset: u64, source: io::Error) -> DemuxError {
    DemuxError::Seek {
        path: path.to_string(),
        offset,
        source,
    }
}

fn write_error(path: &str, offset: u64, source: io::Error) -> DemuxError {
    DemuxError::Write {
        path: path.to_string(),
        offset,
        source,
    }
}

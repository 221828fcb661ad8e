use std::io::{self, Read, Seek, SeekFrom, Write};

use bytes::BytesMut;

use crate::error::DemuxError;
use crate::genh;
use crate::pss::{
    StreamKind, PACK_HEADER, PADDING_STREAM, PRIVATE_HEADER_SIZE, PRIVATE_STREAM_1,
    PRIVATE_STREAM_2, PROGRAM_END, SYSTEM_HEADER,
};
use crate::util;

const START_CODE_PREFIX: u32 = 0x000001;
const PES_HEADER_MIN: usize = 3;
const INITIAL_BUFFER_SIZE: usize = 4096;

pub struct Output<W> {
    pub sink: W,
    pub path: String,
    pub written: u64,
}

impl<W: Write> Output<W> {
    pub fn new(sink: W, path: String) -> Output<W> {
        Output {
            sink,
            path,
            written: 0,
        }
    }

    fn append(&mut self, data: &[u8]) -> Result<(), DemuxError> {
        self.sink.write_all(data).map_err(|e| DemuxError::Write {
            path: self.path.clone(),
            offset: self.written,
            source: e,
        })?;
        self.written += data.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DemuxError> {
        self.sink.flush().map_err(|e| DemuxError::Write {
            path: self.path.clone(),
            offset: self.written,
            source: e,
        })
    }
}

/// Single-pass packet reader splitting a PSS container into its tracks.
/// Sinks are created through the `open` callback the first time a packet
/// addresses their slot.
pub struct Demuxer<R, W, F> {
    input: R,
    path: String,
    open: F,
    outputs: [Option<Output<W>>; StreamKind::COUNT],
    scratch: BytesMut,
    offset: u64,
}

impl<R, W, F> Demuxer<R, W, F>
where
    R: Read + Seek,
    W: Write,
    F: FnMut(StreamKind) -> Result<Output<W>, DemuxError>,
{
    pub fn new(input: R, path: String, open: F) -> Demuxer<R, W, F> {
        let mut scratch = BytesMut::new();
        scratch.resize(INITIAL_BUFFER_SIZE, 0);
        Demuxer {
            input,
            path,
            open,
            outputs: std::array::from_fn(|_| None),
            scratch,
            offset: 0,
        }
    }

    pub fn run(&mut self) -> Result<(), DemuxError> {
        while let Some(code) = self.next_start_code()? {
            if code >> 8 != START_CODE_PREFIX {
                return Err(DemuxError::InvalidStartCode {
                    path: self.path.clone(),
                    offset: self.offset - 4,
                    prefix: code >> 8,
                });
            }
            match (code & 0xff) as u8 {
                PROGRAM_END => break,
                PACK_HEADER => self.skip_pack_header()?,
                SYSTEM_HEADER | PADDING_STREAM => {
                    let len = self.read_packet_length()?;
                    self.skip(u64::from(len))?;
                }
                PRIVATE_STREAM_1 | PRIVATE_STREAM_2 => self.read_private_packet()?,
                0xc0..=0xdf => self.read_pes_packet(StreamKind::Audio)?,
                0xe0..=0xef => self.read_pes_packet(StreamKind::Video)?,
                id => {
                    return Err(DemuxError::UnexpectedId {
                        path: self.path.clone(),
                        offset: self.offset - 1,
                        id,
                    })
                }
            }
        }
        self.flush()
    }

    pub fn into_outputs(self) -> [Option<Output<W>>; StreamKind::COUNT] {
        self.outputs
    }

    // None at a packet boundary means the container is exhausted.
    fn next_start_code(&mut self) -> Result<Option<u32>, DemuxError> {
        let mut code = [0u8; 4];
        let mut filled = 0;
        while filled < code.len() {
            match self.input.read(&mut code[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(DemuxError::UnexpectedEof {
                        path: self.path.clone(),
                        offset: self.offset + filled as u64,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(DemuxError::Read {
                        path: self.path.clone(),
                        offset: self.offset,
                        source: e,
                    })
                }
            }
        }
        self.offset += code.len() as u64;
        Ok(Some(u32::from_be_bytes(code)))
    }

    fn read_packet_length(&mut self) -> Result<u16, DemuxError> {
        let mut buf = [0u8; 2];
        util::read_exact(&mut self.input, &self.path, self.offset, &mut buf)?;
        self.offset += buf.len() as u64;
        Ok(u16::from_be_bytes(buf))
    }

    fn skip(&mut self, count: u64) -> Result<(), DemuxError> {
        self.input
            .seek(SeekFrom::Current(count as i64))
            .map_err(|e| DemuxError::Seek {
                path: self.path.clone(),
                offset: self.offset,
                source: e,
            })?;
        self.offset += count;
        Ok(())
    }

    fn skip_pack_header(&mut self) -> Result<(), DemuxError> {
        let mut first = [0u8; 1];
        util::read_exact(&mut self.input, &self.path, self.offset, &mut first)?;
        self.offset += 1;
        if first[0] & 0xf1 == 0x21 {
            // MPEG-1 pack header, fixed length.
            self.skip(7)
        } else {
            // MPEG-2 pack header carries a stuffing count in its last byte.
            let mut rest = [0u8; 9];
            util::read_exact(&mut self.input, &self.path, self.offset, &mut rest)?;
            self.offset += rest.len() as u64;
            self.skip(u64::from(rest[8] & 0x07))
        }
    }

    fn read_private_packet(&mut self) -> Result<(), DemuxError> {
        let size = usize::from(self.read_packet_length()?);
        self.fill_scratch(size)?;
        let start = self.offset - size as u64;
        if size < PRIVATE_HEADER_SIZE {
            return Err(DemuxError::InvalidPrivateHeader {
                path: self.path.clone(),
                offset: start,
            });
        }
        let ssid = self.scratch[PRIVATE_HEADER_SIZE - 1];
        let kind = match StreamKind::from_substream_id(ssid) {
            Some(kind) => kind,
            None => {
                return Err(DemuxError::UnexpectedSubstreamId {
                    path: self.path.clone(),
                    offset: start + PRIVATE_HEADER_SIZE as u64 - 1,
                    ssid,
                })
            }
        };
        self.append(kind, PRIVATE_HEADER_SIZE, size)
    }

    fn read_pes_packet(&mut self, kind: StreamKind) -> Result<(), DemuxError> {
        let size = usize::from(self.read_packet_length()?);
        self.fill_scratch(size)?;
        let start = self.offset - size as u64;
        if size < PES_HEADER_MIN {
            return Err(DemuxError::InvalidPesHeader {
                path: self.path.clone(),
                offset: start,
            });
        }
        let header_size = PES_HEADER_MIN + usize::from(self.scratch[2]);
        if header_size > size {
            return Err(DemuxError::InvalidPesHeader {
                path: self.path.clone(),
                offset: start,
            });
        }
        self.append(kind, header_size, size)
    }

    fn fill_scratch(&mut self, len: usize) -> Result<(), DemuxError> {
        if self.scratch.len() < len {
            self.scratch.resize(len, 0);
        }
        util::read_exact(
            &mut self.input,
            &self.path,
            self.offset,
            &mut self.scratch[..len],
        )?;
        self.offset += len as u64;
        Ok(())
    }

    fn append(&mut self, kind: StreamKind, from: usize, to: usize) -> Result<(), DemuxError> {
        let slot = kind.index();
        let out = match self.outputs[slot] {
            Some(ref mut out) => out,
            None => {
                let mut out = (self.open)(kind)?;
                if kind == StreamKind::Adpcm {
                    // reserve room for the header written during finalization.
                    out.append(&[0u8; genh::HEADER_SIZE])?;
                }
                self.outputs[slot].insert(out)
            }
        };
        out.append(&self.scratch[from..to])
    }

    fn flush(&mut self) -> Result<(), DemuxError> {
        for out in self.outputs.iter_mut().flatten() {
            out.flush()?;
        }
        Ok(())
    }
}

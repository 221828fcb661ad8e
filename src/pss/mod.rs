use std::fmt;

pub mod demuxer;

pub use demuxer::{Demuxer, Output};

pub const PROGRAM_END: u8 = 0xb9;
pub const PACK_HEADER: u8 = 0xba;
pub const SYSTEM_HEADER: u8 = 0xbb;
pub const PRIVATE_STREAM_1: u8 = 0xbd;
pub const PADDING_STREAM: u8 = 0xbe;
pub const PRIVATE_STREAM_2: u8 = 0xbf;

pub const PRIVATE_HEADER_SIZE: usize = 0x11;

const SUBSTREAM_ADPCM: u8 = 0x01;
const SUBSTREAM_BIN: u8 = 0x05;
const SUBSTREAM_SUBS_EN: u8 = 0x07;
const SUBSTREAM_SUBS_FR: u8 = 0x08;
const SUBSTREAM_SUBS_DE: u8 = 0x09;
const SUBSTREAM_SUBS_IT: u8 = 0x0a;

/// The fixed set of logical tracks a PSS container can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Adpcm,
    Audio,
    Video,
    Bin,
    SubsEn,
    SubsFr,
    SubsDe,
    SubsIt,
}

impl StreamKind {
    pub const COUNT: usize = 8;

    pub fn from_substream_id(ssid: u8) -> Option<StreamKind> {
        match ssid {
            SUBSTREAM_ADPCM => Some(StreamKind::Adpcm),
            SUBSTREAM_BIN => Some(StreamKind::Bin),
            SUBSTREAM_SUBS_EN => Some(StreamKind::SubsEn),
            SUBSTREAM_SUBS_FR => Some(StreamKind::SubsFr),
            SUBSTREAM_SUBS_DE => Some(StreamKind::SubsDe),
            SUBSTREAM_SUBS_IT => Some(StreamKind::SubsIt),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            StreamKind::Adpcm => ".genh",
            StreamKind::Audio => ".m2a",
            StreamKind::Video => ".m2v",
            StreamKind::Bin => ".bin",
            StreamKind::SubsEn => "_subs_en.bin",
            StreamKind::SubsFr => "_subs_fr.bin",
            StreamKind::SubsDe => "_subs_de.bin",
            StreamKind::SubsIt => "_subs_it.bin",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            StreamKind::Adpcm => "adpcm",
            StreamKind::Audio => "audio",
            StreamKind::Video => "video",
            StreamKind::Bin => "bin",
            StreamKind::SubsEn => "subs_en",
            StreamKind::SubsFr => "subs_fr",
            StreamKind::SubsDe => "subs_de",
            StreamKind::SubsIt => "subs_it",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::StreamKind;

    const KINDS: [StreamKind; StreamKind::COUNT] = [
        StreamKind::Adpcm,
        StreamKind::Audio,
        StreamKind::Video,
        StreamKind::Bin,
        StreamKind::SubsEn,
        StreamKind::SubsFr,
        StreamKind::SubsDe,
        StreamKind::SubsIt,
    ];

    #[test]
    fn substream_ids_map_to_their_slots() {
        assert_eq!(StreamKind::from_substream_id(0x01), Some(StreamKind::Adpcm));
        assert_eq!(StreamKind::from_substream_id(0x05), Some(StreamKind::Bin));
        assert_eq!(
            StreamKind::from_substream_id(0x07),
            Some(StreamKind::SubsEn)
        );
        assert_eq!(
            StreamKind::from_substream_id(0x08),
            Some(StreamKind::SubsFr)
        );
        assert_eq!(
            StreamKind::from_substream_id(0x09),
            Some(StreamKind::SubsDe)
        );
        assert_eq!(
            StreamKind::from_substream_id(0x0a),
            Some(StreamKind::SubsIt)
        );
    }

    #[test]
    fn unknown_substream_ids_do_not_map() {
        assert_eq!(StreamKind::from_substream_id(0x00), None);
        assert_eq!(StreamKind::from_substream_id(0x02), None);
        assert_eq!(StreamKind::from_substream_id(0x06), None);
        assert_eq!(StreamKind::from_substream_id(0x0b), None);
        assert_eq!(StreamKind::from_substream_id(0xff), None);
    }

    #[test]
    fn slot_indices_match_the_declaration_order() {
        for (i, kind) in KINDS.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn slot_suffixes_are_distinct() {
        for a in KINDS {
            for b in KINDS {
                if a != b {
                    assert_ne!(a.suffix(), b.suffix());
                }
            }
        }
    }
}

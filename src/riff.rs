use std::io::Cursor;

use binrw::BinReaderExt;

pub const WAVE_FORM: [u8; 4] = *b"WAVE";

// note: the declared size counts everything after the size field, so a whole
// container spans 8 + size bytes.

#[binrw::binread]
#[br(little, magic = b"RIFF", assert(form == WAVE_FORM))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    pub size: u32,
    pub form: [u8; 4],
}

impl RiffHeader {
    pub const fn byte_len() -> usize {
        12
    }
}

/// body of a `fmt ` chunk
#[binrw::binread]
#[br(little, magic = b"fmt ")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    #[br(temp)]
    chunk_size: u32,
    pub audio_format: u16,
    pub channel_count: u16,
    pub sample_rate: u32,
    pub bytes_per_second: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    pub fn codec_name(&self) -> &'static str {
        codec_name(self.audio_format)
    }
}

pub fn codec_name(audio_format: u16) -> &'static str {
    match audio_format {
        0x0001 => "PCM",
        0x0002 => "MS ADPCM",
        0x0003 => "IEEE float",
        0x0011 => "IMA ADPCM",
        0x0055 => "MP3",
        0xFFFE => "extensible",
        0xFFFF => "Wwise Vorbis",
        _ => "unknown",
    }
}

/// Tries to read the format of a container whose `fmt ` chunk directly follows
/// the RIFF header. Only informational, a `None` doesn't mean the chunk is bad.
pub fn probe(chunk: &[u8]) -> Option<WavFormat> {
    let mut cursor = Cursor::new(chunk);
    cursor.read_le::<RiffHeader>().ok()?;
    cursor.read_le::<WavFormat>().ok()
}

/// Builds a mono 16 bit PCM container with `data_len` bytes of silence.
#[cfg(test)]
pub(crate) fn minimal_wav(data_len: u32) -> Vec<u8> {
    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&8000u32.to_le_bytes());
    wav.extend_from_slice(&16000u32.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(wav.len() + data_len as usize, 0);
    wav
}

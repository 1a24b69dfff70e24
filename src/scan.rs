use std::io::Cursor;

use binrw::BinReaderExt;
use log::debug;

use crate::riff::{RiffHeader, WAVE_FORM};

const NAME_EXTENSION: &[u8] = b".wav";
// minimum amount of name bytes before the extension
const MIN_NAME_LEN: usize = 4;

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'/')
}

/// Finds all strings in the blob that look like a wav filename, in the order
/// they appear. A name is at least 4 bytes of `[A-Za-z0-9_/-]` followed by
/// `.wav`, matches don't overlap and the extension is part of the result.
pub fn scan_names(blob: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut pos = 0;
    while pos < blob.len() {
        if !is_name_byte(blob[pos]) {
            pos += 1;
            continue;
        }
        // no shorter suffix of a run can match if the whole run doesn't,
        // so the next candidate starts after it
        let run_end = blob[pos..]
            .iter()
            .position(|&b| !is_name_byte(b))
            .map_or(blob.len(), |len| pos + len);
        if run_end - pos >= MIN_NAME_LEN && blob[run_end..].starts_with(NAME_EXTENSION) {
            let end = run_end + NAME_EXTENSION.len();
            // matched bytes are all ascii
            names.push(String::from_utf8_lossy(&blob[pos..end]).into_owned());
            pos = end;
        } else {
            pos = run_end;
        }
    }
    names
}

/// A RIFF/WAVE container found in a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub declared_size: u32,
}

impl Chunk {
    /// end offset according to the size field, can be past the blob
    pub fn declared_end(&self) -> u64 {
        self.start as u64 + 8 + u64::from(self.declared_size)
    }

    pub fn end(&self, blob_len: usize) -> usize {
        // the min is at most blob_len, so it fits
        self.declared_end().min(blob_len as u64) as usize
    }

    pub fn is_truncated(&self, blob_len: usize) -> bool {
        self.declared_end() > blob_len as u64
    }

    /// the bytes of this container, cut off at the end of the blob
    pub fn slice<'a>(&self, blob: &'a [u8]) -> &'a [u8] {
        &blob[self.start..self.end(blob.len())]
    }
}

fn find_signature(blob: &[u8], from: usize) -> Option<usize> {
    blob.get(from..)?
        .windows(RiffHeader::byte_len())
        .position(|w| &w[..4] == b"RIFF" && w[8..] == WAVE_FORM)
        .map(|off| from + off)
}

/// Finds every `RIFF????WAVE` signature in the blob, in order. The search
/// continues after the 12 signature bytes, so matches never overlap.
pub fn scan_chunks(blob: &[u8]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while let Some(start) = find_signature(blob, pos) {
        match Cursor::new(&blob[start..]).read_le::<RiffHeader>() {
            Ok(header) => chunks.push(Chunk {
                start,
                declared_size: header.size,
            }),
            Err(e) => debug!("could not read header at {start:#x}: {e}"),
        }
        pos = start + RiffHeader::byte_len();
    }
    chunks
}

/// Slices out all containers, see [`scan_chunks`]
pub fn extract(blob: &[u8]) -> Vec<&[u8]> {
    scan_chunks(blob)
        .iter()
        .map(|chunk| chunk.slice(blob))
        .collect()
}

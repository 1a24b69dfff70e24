use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use log::debug;

use crate::{Error, Result};

/// Turns a raw sound pulled out of a bank into a playable file
pub trait Converter {
    fn convert(&self, raw: &Path, out: &Path) -> Result<()>;
}

/// Runs `ffmpeg -y -i <raw> <out>` and waits for it, its output is discarded.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: OsString,
}

impl Ffmpeg {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Converter for Ffmpeg {
    fn convert(&self, raw: &Path, out: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("-y")
            .arg("-i")
            .arg(raw)
            .arg(out)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| Error::ConverterSpawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::Converter {
                raw: raw.to_owned(),
                status,
            })
        }
    }
}

/// What to do when the converter fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConverterPolicy {
    /// only mention it in the debug log, the output is just missing
    #[default]
    Ignore,
    /// log it as an error and count it, so the run can fail at the end
    Fail,
}

/// A raw sound on disk, removed again when this is dropped.
#[derive(Debug)]
pub struct RawFile {
    path: PathBuf,
}

impl RawFile {
    pub fn create(path: PathBuf, data: &[u8]) -> Result<Self> {
        // create the guard first so a partial write gets cleaned up too
        let raw = Self { path };
        fs::write(&raw.path, data)?;
        Ok(raw)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RawFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!("could not remove {:?}: {e}", self.path);
        }
    }
}

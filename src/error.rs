use std::{io, path::PathBuf, process::ExitStatus};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("could not read header: {0}")]
    Binrw(#[from] binrw::Error),
    #[error("could not start converter {program}: {source}")]
    ConverterSpawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("converter failed on {raw:?} with {status}")]
    Converter { raw: PathBuf, status: ExitStatus },
}

pub type Result<T> = std::result::Result<T, Error>;

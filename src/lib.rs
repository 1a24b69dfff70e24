pub mod bank;
pub mod convert;
mod error;
pub use error::*;
pub mod naming;
pub mod riff;
pub mod scan;

pub use bank::{extract_bank, list_bank, run, BankReport, ExtractOptions, RunSummary};
pub use convert::{Converter, ConverterPolicy, Ffmpeg};

/// extension of the bank files picked up in directory mode
pub const BANK_EXTENSION: &str = "bnk";

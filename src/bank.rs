use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};

use crate::{
    convert::{Converter, ConverterPolicy, RawFile},
    naming::assign_names,
    riff::{probe, WavFormat},
    scan::{scan_chunks, scan_names, Chunk},
    Result, BANK_EXTENSION,
};

pub const DEFAULT_OUTPUT_DIR: &str = "extracted_wavs";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// every bank gets its own subdirectory in here
    pub output_dir: PathBuf,
    pub policy: ConverterPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            policy: ConverterPolicy::default(),
        }
    }
}

/// outcome of extracting a single bank
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankReport {
    pub bank: PathBuf,
    pub out_dir: PathBuf,
    /// amount of RIFF/WAVE containers in the bank
    pub found: usize,
    pub converted: usize,
    pub failed: usize,
    /// containers whose size field points past the end of the bank
    pub truncated: usize,
    /// the files the converter was asked to produce, in bank order
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub banks: Vec<BankReport>,
    /// banks that couldn't be processed at all
    pub errors: usize,
}

impl RunSummary {
    pub fn failed_conversions(&self) -> usize {
        self.banks.iter().map(|b| b.failed).sum()
    }
}

fn bank_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bank".to_string())
}

/// Pulls every sound out of the bank at `path` and converts it into
/// `<output_dir>/<bank stem>/<name>`. Only failing to read the bank or to
/// write the raw sounds is an error, a bank without sounds just logs a warning.
pub fn extract_bank(
    path: &Path,
    options: &ExtractOptions,
    converter: &dyn Converter,
) -> Result<BankReport> {
    let blob = fs::read(path)?;
    let out_dir = options.output_dir.join(bank_stem(path));
    fs::create_dir_all(&out_dir)?;

    let mut report = BankReport {
        bank: path.to_owned(),
        out_dir,
        ..Default::default()
    };

    let names = scan_names(&blob);
    let chunks = scan_chunks(&blob);
    if chunks.is_empty() {
        warn!("no RIFF headers found in {path:?}");
        return Ok(report);
    }
    info!("{path:?}: {} sounds found", chunks.len());
    debug!("{} names found", names.len());
    report.found = chunks.len();

    let filenames = assign_names(&names, chunks.len());
    for (chunk, filename) in chunks.iter().zip(filenames) {
        if chunk.is_truncated(blob.len()) {
            debug!(
                "{filename}: declared size {} goes past the end of the bank",
                chunk.declared_size
            );
            report.truncated += 1;
        }
        let data = chunk.slice(&blob);
        if let Some(format) = probe(data) {
            debug!(
                "{filename}: {}, {} channels, {} Hz",
                format.codec_name(),
                format.channel_count,
                format.sample_rate
            );
        }
        let out_path = report.out_dir.join(&filename);
        let raw = RawFile::create(report.out_dir.join(format!("raw_{filename}")), data)?;
        match converter.convert(raw.path(), &out_path) {
            Ok(()) => report.converted += 1,
            Err(e) => {
                match options.policy {
                    ConverterPolicy::Ignore => debug!("converting {filename} failed: {e}"),
                    ConverterPolicy::Fail => error!("converting {filename} failed: {e}"),
                }
                report.failed += 1;
            }
        }
        report.outputs.push(out_path);
    }
    info!("extracted and converted to {:?}", report.out_dir);
    Ok(report)
}

/// a sound found by [`list_bank`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedSound {
    pub name: String,
    pub chunk: Chunk,
    /// length of the bytes that would be extracted
    pub len: usize,
    pub truncated: bool,
    pub format: Option<WavFormat>,
}

/// Finds the sounds of a bank and the names they would get, without writing anything.
pub fn list_bank(path: &Path) -> Result<Vec<ListedSound>> {
    let blob = fs::read(path)?;
    let chunks = scan_chunks(&blob);
    let names = assign_names(&scan_names(&blob), chunks.len());
    Ok(chunks
        .into_iter()
        .zip(names)
        .map(|(chunk, name)| {
            let data = chunk.slice(&blob);
            ListedSound {
                name,
                chunk,
                len: data.len(),
                truncated: chunk.is_truncated(blob.len()),
                format: probe(data),
            }
        })
        .collect())
}

/// the banks listed by [`list_banks`] or [`list_input`]
#[derive(Debug, Clone, Default)]
pub struct ListSummary {
    pub banks: Vec<(PathBuf, Vec<ListedSound>)>,
    /// banks that couldn't be read
    pub errors: usize,
}

/// Lists every bank in `banks`, a bank that can't be read is logged and skipped.
pub fn list_banks(banks: &[PathBuf]) -> ListSummary {
    let mut summary = ListSummary::default();
    for bank in banks {
        match list_bank(bank) {
            Ok(sounds) => summary.banks.push((bank.clone(), sounds)),
            Err(e) => {
                error!("problem with {bank:?}: {e}");
                summary.errors += 1;
            }
        }
    }
    summary
}

/// The listing counterpart of [`run`]: a single file has to be readable, in a
/// directory unreadable banks are skipped.
pub fn list_input(input: &Path) -> Result<ListSummary> {
    let mut summary = ListSummary::default();
    if input.is_file() {
        summary.banks.push((input.to_owned(), list_bank(input)?));
    } else if input.is_dir() {
        summary = list_banks(&collect_banks(input)?);
    } else {
        error!("the path {input:?} is not valid");
    }
    Ok(summary)
}

/// All bank files directly inside `dir`, sorted by path
pub fn collect_banks(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut banks = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        // follows symlinks, a linked bank counts as a bank
        if path.is_file() && path.extension().is_some_and(|e| e == BANK_EXTENSION) {
            banks.push(path);
        } else {
            debug!("skipping {path:?}");
        }
    }
    banks.sort();
    Ok(banks)
}

/// Extracts a single bank file, or every bank in a directory. In a directory a
/// bank that fails is logged and skipped, an input that is neither only logs an error.
pub fn run(
    input: &Path,
    options: &ExtractOptions,
    converter: &dyn Converter,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    if input.is_file() {
        summary.banks.push(extract_bank(input, options, converter)?);
    } else if input.is_dir() {
        for bank in collect_banks(input)? {
            match extract_bank(&bank, options, converter) {
                Ok(report) => summary.banks.push(report),
                Err(e) => {
                    error!("problem with {bank:?}: {e}");
                    summary.errors += 1;
                }
            }
        }
    } else {
        error!("the path {input:?} is not valid");
    }
    Ok(summary)
}

#[cfg(test)]
mod test {
    use std::{
        cell::RefCell,
        fs,
        path::{Path, PathBuf},
    };

    use super::{
        collect_banks, extract_bank, list_bank, list_banks, list_input, run, ExtractOptions,
    };
    use crate::{
        convert::{Converter, ConverterPolicy},
        riff::minimal_wav,
        Error, Result,
    };

    /// copies the raw file, remembering what it was asked to do
    #[derive(Default)]
    struct CopyConverter {
        calls: RefCell<Vec<(PathBuf, PathBuf)>>,
    }

    impl Converter for CopyConverter {
        fn convert(&self, raw: &Path, out: &Path) -> Result<()> {
            assert!(raw.exists(), "raw file must exist during conversion");
            fs::copy(raw, out)?;
            self.calls
                .borrow_mut()
                .push((raw.to_owned(), out.to_owned()));
            Ok(())
        }
    }

    struct FailingConverter;

    impl Converter for FailingConverter {
        fn convert(&self, raw: &Path, _out: &Path) -> Result<()> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("can't convert {raw:?}"),
            )))
        }
    }

    fn options(dir: &Path) -> ExtractOptions {
        ExtractOptions {
            output_dir: dir.join("extracted_wavs"),
            ..Default::default()
        }
    }

    fn no_raw_files(dir: &Path) -> bool {
        fs::read_dir(dir).unwrap().all(|e| {
            !e.unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with("raw_")
        })
    }

    #[test]
    pub fn unnamed_sounds() {
        let dir = tempfile::tempdir().unwrap();
        let first = minimal_wav(4);
        let second = minimal_wav(8);
        let bank = dir.path().join("test.bnk");
        fs::write(&bank, [first.clone(), second.clone()].concat()).unwrap();

        let converter = CopyConverter::default();
        let report = extract_bank(&bank, &options(dir.path()), &converter).unwrap();
        let out_dir = dir.path().join("extracted_wavs").join("test");
        assert_eq!(report.out_dir, out_dir);
        assert_eq!(report.found, 2);
        assert_eq!(report.converted, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(
            report.outputs,
            vec![out_dir.join("sound_01.wav"), out_dir.join("sound_02.wav")]
        );
        assert_eq!(fs::read(out_dir.join("sound_01.wav")).unwrap(), first);
        assert_eq!(fs::read(out_dir.join("sound_02.wav")).unwrap(), second);
        assert_eq!(
            converter.calls.borrow()[0].0,
            out_dir.join("raw_sound_01.wav")
        );
        assert!(no_raw_files(&out_dir));
    }

    #[test]
    pub fn named_sounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut blob = b"STID\0sfx/door_open.wav\0amb_wind.wav\0".to_vec();
        for len in [2, 4, 6] {
            blob.extend_from_slice(&minimal_wav(len));
        }
        let bank = dir.path().join("doors.bnk");
        fs::write(&bank, &blob).unwrap();

        let report = extract_bank(&bank, &options(dir.path()), &CopyConverter::default()).unwrap();
        let names: Vec<_> = report
            .outputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sfx_door_open.wav", "amb_wind.wav", "sound_03.wav"]);
        assert_eq!(
            fs::read(report.out_dir.join("amb_wind.wav")).unwrap(),
            minimal_wav(4)
        );
    }

    #[test]
    pub fn failed_conversion_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let bank = dir.path().join("broken.bnk");
        fs::write(&bank, minimal_wav(16)).unwrap();

        for policy in [ConverterPolicy::Ignore, ConverterPolicy::Fail] {
            let options = ExtractOptions {
                policy,
                ..options(dir.path())
            };
            let report = extract_bank(&bank, &options, &FailingConverter).unwrap();
            assert_eq!(report.found, 1);
            assert_eq!(report.converted, 0);
            assert_eq!(report.failed, 1);
            assert!(no_raw_files(&report.out_dir));
            assert!(!report.out_dir.join("sound_01.wav").exists());
        }
    }

    #[test]
    pub fn bank_without_sounds() {
        let dir = tempfile::tempdir().unwrap();
        let bank = dir.path().join("empty.bnk");
        fs::write(&bank, b"BKHD\0\0\0\0some_name.wav").unwrap();

        let report = extract_bank(&bank, &options(dir.path()), &CopyConverter::default()).unwrap();
        assert_eq!(report.found, 0);
        assert!(report.outputs.is_empty());
        assert_eq!(fs::read_dir(&report.out_dir).unwrap().count(), 0);
    }

    #[test]
    pub fn truncated_sound() {
        let dir = tempfile::tempdir().unwrap();
        let mut wav = minimal_wav(64);
        wav.truncate(50);
        let bank = dir.path().join("cut.bnk");
        fs::write(&bank, &wav).unwrap();

        let report = extract_bank(&bank, &options(dir.path()), &CopyConverter::default()).unwrap();
        assert_eq!(report.truncated, 1);
        assert_eq!(fs::read(&report.outputs[0]).unwrap(), wav);
    }

    #[test]
    pub fn missing_bank() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_bank(
            &dir.path().join("nope.bnk"),
            &options(dir.path()),
            &CopyConverter::default(),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    pub fn lists_sounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut blob = b"music_loop.wav".to_vec();
        blob.extend_from_slice(&minimal_wav(2));
        let bank = dir.path().join("music.bnk");
        fs::write(&bank, &blob).unwrap();

        let listed = list_bank(&bank).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "music_loop.wav");
        assert_eq!(listed[0].chunk.start, 14);
        assert_eq!(listed[0].len, 46);
        assert!(!listed[0].truncated);
        assert_eq!(listed[0].format.unwrap().sample_rate, 8000);
        // nothing written
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    pub fn directory_mode() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("banks");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("b.bnk"), minimal_wav(2)).unwrap();
        fs::write(input.join("a.bnk"), [minimal_wav(2), minimal_wav(2)].concat()).unwrap();
        fs::write(input.join("notes.txt"), minimal_wav(2)).unwrap();
        fs::create_dir(input.join("nested.bnk")).unwrap();

        assert_eq!(
            collect_banks(&input).unwrap(),
            vec![input.join("a.bnk"), input.join("b.bnk")]
        );

        let summary = run(&input, &options(dir.path()), &CopyConverter::default()).unwrap();
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.banks.len(), 2);
        assert_eq!(summary.banks[0].found, 2);
        assert_eq!(summary.banks[1].found, 1);
        assert!(dir.path().join("extracted_wavs/a/sound_02.wav").exists());
        assert!(dir.path().join("extracted_wavs/b/sound_01.wav").exists());
        assert!(!dir.path().join("extracted_wavs/notes").exists());
    }

    #[test]
    pub fn failures_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let bank = dir.path().join("one.bnk");
        fs::write(&bank, [minimal_wav(2), minimal_wav(2)].concat()).unwrap();
        let options = ExtractOptions {
            policy: ConverterPolicy::Fail,
            ..options(dir.path())
        };
        let summary = run(&bank, &options, &FailingConverter).unwrap();
        assert_eq!(summary.failed_conversions(), 2);
    }

    #[test]
    pub fn invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run(
            &dir.path().join("missing"),
            &options(dir.path()),
            &CopyConverter::default(),
        )
        .unwrap();
        assert!(summary.banks.is_empty());
        assert_eq!(summary.errors, 0);
        assert!(!dir.path().join("extracted_wavs").exists());
    }

    #[cfg(unix)]
    #[test]
    pub fn symlinked_bank() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.bnk");
        fs::write(&real, minimal_wav(2)).unwrap();
        let input = dir.path().join("banks");
        fs::create_dir(&input).unwrap();
        std::os::unix::fs::symlink(&real, input.join("link.bnk")).unwrap();
        // dangling links are not files
        std::os::unix::fs::symlink(dir.path().join("gone.bnk"), input.join("gone.bnk")).unwrap();

        assert_eq!(collect_banks(&input).unwrap(), vec![input.join("link.bnk")]);
        let summary = run(&input, &options(dir.path()), &CopyConverter::default()).unwrap();
        assert_eq!(summary.banks.len(), 1);
        assert!(dir.path().join("extracted_wavs/link/sound_01.wav").exists());
    }

    #[test]
    pub fn listing_skips_unreadable_banks() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("b.bnk");
        fs::write(&good, [minimal_wav(2), minimal_wav(4)].concat()).unwrap();
        let banks = vec![dir.path().join("a.bnk"), good.clone()];

        let summary = list_banks(&banks);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.banks.len(), 1);
        assert_eq!(summary.banks[0].0, good);
        assert_eq!(summary.banks[0].1.len(), 2);
    }

    #[test]
    pub fn listing_input() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.bnk"), minimal_wav(2)).unwrap();
        fs::write(dir.path().join("two.bnk"), b"no sounds here").unwrap();

        let summary = list_input(dir.path()).unwrap();
        assert_eq!(summary.errors, 0);
        let counts: Vec<_> = summary.banks.iter().map(|(_, s)| s.len()).collect();
        assert_eq!(counts, vec![1, 0]);

        assert!(list_input(&dir.path().join("missing")).unwrap().banks.is_empty());
    }
}

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use bnkwav::{
    bank::{list_input, DEFAULT_OUTPUT_DIR},
    run, ConverterPolicy, ExtractOptions, Ffmpeg,
};
use clap::Parser;
use env_logger::Env;
use log::info;

#[derive(Parser)]
#[command(version)]
/// Extracts the sounds embedded in .bnk files and converts them to playable wav files
pub struct Args {
    /// Path to a .bnk file or a directory with .bnk files
    input: PathBuf,
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    /// Output directory, every bank gets a subdirectory in it
    output: PathBuf,
    #[arg(long, default_value = "ffmpeg")]
    /// Program used to convert the extracted sounds
    ffmpeg: String,
    #[arg(long)]
    /// Log failed conversions as errors and exit with an error if any happened
    fail_on_convert_error: bool,
    #[arg(short, long)]
    /// Only list the sounds found, without writing anything
    list: bool,
}

fn list(input: &Path) -> anyhow::Result<()> {
    let summary = list_input(input).with_context(|| format!("couldn't read {input:?}"))?;
    for (bank, sounds) in summary.banks {
        println!("{}: {} sounds", bank.display(), sounds.len());
        for sound in sounds {
            let format = match sound.format {
                Some(f) => format!(
                    "{}, {} ch, {} Hz, {} bit",
                    f.codec_name(),
                    f.channel_count,
                    f.sample_rate,
                    f.bits_per_sample
                ),
                None => "unknown format".to_string(),
            };
            println!(
                "  {:#010x} {:>10} {}{} ({format})",
                sound.chunk.start,
                sound.len,
                sound.name,
                if sound.truncated { " [truncated]" } else { "" },
            );
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let env = Env::new().default_filter_or("info");
    env_logger::init_from_env(env);
    let args = Args::parse();
    if args.list {
        return list(&args.input);
    }
    let policy = if args.fail_on_convert_error {
        ConverterPolicy::Fail
    } else {
        ConverterPolicy::Ignore
    };
    let options = ExtractOptions {
        output_dir: args.output,
        policy,
    };
    let converter = Ffmpeg::new(args.ffmpeg);
    let summary = run(&args.input, &options, &converter)
        .with_context(|| format!("error extracting {:?}", args.input))?;
    let sounds: usize = summary.banks.iter().map(|b| b.found).sum();
    info!("{} banks, {sounds} sounds", summary.banks.len());
    if policy == ConverterPolicy::Fail && summary.failed_conversions() > 0 {
        bail!("{} conversions failed", summary.failed_conversions());
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context};
use hdr_bracket::{HdrConfig, HdrMerger, Image, MergeBackend, WgpuBackend};

const USAGE: &str =
    "usage: hdr-bracket [--config FILE] [--block-size N] [--max-offset N] [--gpu] LOW MID HIGH OUTPUT";

#[derive(Debug)]
struct Args {
    config: HdrConfig,
    gpu: bool,
    inputs: [PathBuf; 3],
    output: PathBuf,
}

fn parse_value(flag: &str, value: Option<String>) -> anyhow::Result<usize> {
    let value = value.with_context(|| format!("{flag} needs a value"))?;

    value
        .parse()
        .with_context(|| format!("{flag}: `{value}` is not a positive integer"))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut config_path = None;
    let mut block_size = None;
    let mut max_offset = None;
    let mut gpu = false;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a value")?;
                config_path = Some(PathBuf::from(path));
            }
            "--block-size" => block_size = Some(parse_value(&arg, args.next())?),
            "--max-offset" => max_offset = Some(parse_value(&arg, args.next())?),
            "--gpu" => gpu = true,
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown flag `{flag}`\n{USAGE}"),
            _ => positional.push(PathBuf::from(&arg)),
        }
    }

    let mut config = match config_path {
        Some(path) => HdrConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HdrConfig::default(),
    };

    if let Some(block_size) = block_size {
        config.block_size = block_size;
    }
    if let Some(max_offset) = max_offset {
        config.max_offset = max_offset;
    }

    let [low, mid, high, output]: [PathBuf; 4] = positional
        .try_into()
        .map_err(|_| anyhow!("expected four image paths\n{USAGE}"))?;

    Ok(Args {
        config,
        gpu,
        inputs: [low, mid, high],
        output,
    })
}

fn load(path: &Path) -> anyhow::Result<Image> {
    let rgba = image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .into_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(Image::from_raw(
        width as usize,
        height as usize,
        rgba.into_raw(),
    )?)
}

fn save(path: &Path, merged: Image) -> anyhow::Result<()> {
    let (width, height) = merged.dimensions();
    let rgba = image::RgbaImage::from_raw(width as u32, height as u32, merged.into_raw())
        .context("merged buffer does not match its dimensions")?;

    rgba.save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn merge<B: MergeBackend>(merger: &HdrMerger<B>, exposures: &[Image]) -> anyhow::Result<Image> {
    let start = Instant::now();
    let merged = merger.compute(exposures.first(), exposures.get(1), exposures.get(2))?;
    log::info!("merged in {:.2?}", start.elapsed());

    Ok(merged)
}

async fn run() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    let exposures = args
        .inputs
        .iter()
        .map(PathBuf::as_path)
        .map(load)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let merged = if args.gpu {
        let backend = WgpuBackend::new().await?;
        merge(&HdrMerger::new(args.config, backend)?, &exposures)?
    } else {
        merge(&HdrMerger::cpu(args.config)?, &exposures)?
    };

    save(&args.output, merged)?;
    println!("wrote {}", args.output.display());

    Ok(())
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();
    pollster::block_on(run())
}

#![warn(clippy::pedantic)]

pub mod cli;
pub mod global;
pub mod script;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyResult};
use clap::Parser;
use zimage_core::{
    batch::{BatchItem, BatchJob, BatchProgress, CancelToken, ItemOutcome},
    collage::CollageSpec,
    io::{self, OutputFormat},
    meme::{MemeSpec, MemeTemplate, TextPosition},
    resample::ResizeSpec,
    settings::Settings,
    Document,
};

#[cfg(all(feature = "jemallocator", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn resize_spec(settings: &Settings, args: &cli::ResizeArgs) -> ResizeSpec {
    let mut spec = settings.resize.spec(args.width, args.height);
    if args.no_aspect_lock {
        spec.aspect_lock = false;
    }
    if let Some(filter) = args.filter {
        spec.filter = filter;
    }
    if args.format.is_some() {
        spec.format = args.format;
    }
    if let Some(quality) = args.quality {
        spec.quality = quality;
    }
    spec
}

/// Encode to `path`, in the format its extension names, else PNG.
fn save(buffer: &zimage_core::PixelBuffer, path: &Path, quality: u8) -> AnyResult<()> {
    let format = OutputFormat::from_path(path).unwrap_or(OutputFormat::Png);
    let bytes = io::encode_to_path(buffer, path, format, quality)?;
    log::info!(
        "wrote {} ({}x{}, {})",
        path.display(),
        buffer.width(),
        buffer.height(),
        human_bytes::human_bytes(bytes as f64)
    );
    Ok(())
}

/// Expand directories into the images directly inside them, sorted by name.
fn expand_inputs(inputs: &[PathBuf]) -> AnyResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = std::fs::read_dir(input)
                .with_context(|| format!("reading {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.is_file() && io::is_image_path(path))
                .collect::<Vec<_>>();
            found.sort();
            log::debug!("{} image(s) in {}", found.len(), input.display());
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

fn run(command: cli::Command, settings: &Settings) -> AnyResult<()> {
    use cli::Command;
    match command {
        Command::Resize {
            input,
            output,
            resize,
        } => {
            let spec = resize_spec(settings, &resize);
            let source = io::decode_path(&input)?;
            let format = spec
                .format
                .or_else(|| OutputFormat::from_path(&input))
                .unwrap_or(OutputFormat::Png);
            let output = output.unwrap_or_else(|| {
                let stem = input
                    .file_stem()
                    .map_or_else(|| "image".into(), |stem| stem.to_string_lossy());
                input.with_file_name(settings.resize.naming().file_name(
                    &stem,
                    0,
                    format.extension(),
                ))
            });
            let spec = ResizeSpec {
                format: Some(format),
                ..spec
            };
            let resized = zimage_core::resize_one(&source, &spec)?;
            let bytes = io::encode_to_path(&resized, &output, format, spec.quality)?;
            log::info!(
                "wrote {} ({}x{}, {})",
                output.display(),
                resized.width(),
                resized.height(),
                human_bytes::human_bytes(bytes as f64)
            );
        }
        Command::Batch {
            inputs,
            destination,
            resize,
            suffix,
            workers,
        } => {
            let items = expand_inputs(&inputs)?
                .into_iter()
                .map(BatchItem::path)
                .collect::<Vec<_>>();
            anyhow::ensure!(!items.is_empty(), "no images found");
            let mut job = BatchJob::new(items, resize_spec(settings, &resize), destination);
            job.naming = settings.resize.naming();
            if let Some(suffix) = suffix {
                job.naming.suffix = suffix;
            }
            job.workers = workers.or(settings.batch.workers);

            let progress = |progress: BatchProgress| {
                log::info!(
                    "{}/{} done, {} failed",
                    progress.completed,
                    progress.total,
                    progress.failed
                );
            };
            let result = zimage_core::run_batch(&job, &CancelToken::new(), &progress);
            for (item, outcome) in job.items.iter().zip(&result.outcomes) {
                match outcome {
                    ItemOutcome::Written { output, .. } => {
                        println!("{} -> {}", item.source, output.display());
                    }
                    ItemOutcome::Failed(err) => eprintln!("{}: {err:#}", item.source),
                    ItemOutcome::Cancelled => eprintln!("{}: cancelled", item.source),
                }
            }
            anyhow::ensure!(
                result.failed() == 0,
                "{} of {} image(s) failed",
                result.failed(),
                result.outcomes.len()
            );
        }
        Command::Collage {
            inputs,
            output,
            orientation,
            spacing,
            background,
        } => {
            let sources = expand_inputs(&inputs)?
                .iter()
                .map(io::decode_path)
                .collect::<Result<Vec<_>, _>>()?;
            let spec = CollageSpec {
                sources,
                orientation: orientation.unwrap_or(settings.collage.orientation),
                spacing: spacing.unwrap_or(settings.collage.spacing),
                background: Some(background.unwrap_or(settings.collage.background)),
            };
            let collage = zimage_core::make_collage(&spec)?;
            save(&collage, &output, settings.resize.quality)?;
        }
        Command::Meme {
            input,
            output,
            top,
            bottom,
            template,
            save_template,
        } => {
            let template = template
                .map(|path| {
                    MemeTemplate::load(&path).with_context(|| format!("loading {}", path.display()))
                })
                .transpose()?;
            let image = input
                .or_else(|| template.as_ref().map(|t| t.image_path.clone()))
                .context("no image given")?;
            let mut blocks = template.map(|t| t.blocks).unwrap_or_default();
            for (text, position) in [(top, TextPosition::Top), (bottom, TextPosition::Bottom)] {
                if let Some(text) = text {
                    blocks.retain(|block| block.position != position);
                    blocks.push(settings.meme.block(text.to_uppercase(), position));
                }
            }
            if let Some(path) = save_template {
                let name = image
                    .file_stem()
                    .map_or_else(|| "meme".into(), |stem| stem.to_string_lossy().into_owned());
                MemeTemplate {
                    blocks: blocks.clone(),
                    ..MemeTemplate::classic(&image, name)
                }
                .save(&path)
                .with_context(|| format!("saving {}", path.display()))?;
            }
            let spec = MemeSpec {
                source: io::decode_path(&image)?,
                blocks,
            };
            save(&zimage_core::make_meme(&spec), &output, settings.resize.quality)?;
        }
        Command::Edit {
            input,
            script,
            output,
        } => {
            let text = std::fs::read_to_string(&script)
                .with_context(|| format!("reading {}", script.display()))?;
            let script = script::Script::parse(&text)?;
            let mut document = Document::open_path(&input)?;
            script.run(&mut document)?;
            save(document.buffer(), &output, settings.resize.quality)?;
        }
        Command::Settings { write } => {
            let user = global::UserSettings::get();
            println!("{}", toml::ser::to_string_pretty(&user.settings)?);
            if write {
                let path = user.save()?;
                println!("# written to {}", path.display());
            } else if let Some(path) = global::UserSettings::path() {
                println!("# from {}", path.display());
            }
        }
    }
    Ok(())
}

fn main() -> AnyResult<()> {
    let cli = cli::Cli::parse();
    let user = global::UserSettings::get();
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        user.log_level().unwrap_or(log::LevelFilter::Info)
    };

    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder().filter_level(level).init();
    } else {
        let _ = simple_logging::log_to_file("log.out", level);
    }
    if user.did_fail_to_load() {
        log::warn!("Settings weren't available, defaulting.");
    }

    run(cli.command, &user.settings)
}

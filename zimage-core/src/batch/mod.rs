//! # Batches
//!
//! Resizes and converts many images at once on a bounded worker pool. Items are isolated from each
//! other: one item failing to decode never stops the rest. Outcomes come back in input order, and
//! output names are decided up front so a rerun of the same job writes the same files.

pub mod naming;

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};

use rayon::prelude::*;

use crate::{
    buffer::PixelBuffer,
    io::{self, CodecError, OutputFormat},
    resample::{self, ResizeError, ResizeSpec},
};
pub use naming::NamingPolicy;

/// Where a batch item's pixels come from.
#[derive(Clone, Debug)]
pub enum BatchSource {
    /// An encoded image on disk, decoded by the worker.
    Path(PathBuf),
    /// An already decoded image. `name` stands in for the file name when naming the output.
    Buffer { name: String, buffer: Arc<PixelBuffer> },
}
impl BatchSource {
    fn name_path(&self) -> &Path {
        match self {
            Self::Path(path) => path,
            Self::Buffer { name, .. } => Path::new(name),
        }
    }
    /// File stem used for the output name.
    fn stem(&self) -> &str {
        self.name_path()
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("image")
    }
}
impl std::fmt::Display for BatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Buffer { name, .. } => write!(f, "<{name}>"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BatchItem {
    pub source: BatchSource,
    /// Replaces the job's default spec for this item.
    pub spec: Option<ResizeSpec>,
}
impl BatchItem {
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: BatchSource::Path(path.into()),
            spec: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BatchJob {
    pub items: Vec<BatchItem>,
    pub default_spec: ResizeSpec,
    /// Directory outputs are written to. Created if missing.
    pub destination: PathBuf,
    pub naming: NamingPolicy,
    /// Worker threads. `None` uses the available parallelism.
    pub workers: Option<usize>,
}
impl BatchJob {
    #[must_use]
    pub fn new(items: Vec<BatchItem>, default_spec: ResizeSpec, destination: impl Into<PathBuf>) -> Self {
        Self {
            items,
            default_spec,
            destination: destination.into(),
            naming: NamingPolicy::default(),
            workers: None,
        }
    }
    fn spec_for<'a>(&'a self, item: &'a BatchItem) -> &'a ResizeSpec {
        item.spec.as_ref().unwrap_or(&self.default_spec)
    }
    /// Decide the output path and format of every item, in input order.
    ///
    /// The format is the item's spec format, else the source's own if it is encodable, else PNG.
    #[must_use]
    pub fn plan(&self) -> Vec<(PathBuf, OutputFormat)> {
        let formats: Vec<OutputFormat> = self
            .items
            .iter()
            .map(|item| {
                self.spec_for(item)
                    .format
                    .or_else(|| OutputFormat::from_path(item.source.name_path()))
                    .unwrap_or(OutputFormat::Png)
            })
            .collect();
        let names = self.naming.resolve(
            self.items
                .iter()
                .zip(&formats)
                .map(|(item, format)| (item.source.stem(), format.extension())),
        );
        names
            .into_iter()
            .zip(formats)
            .map(|(name, format)| (self.destination.join(name), format))
            .collect()
    }
}

/// Shared flag to stop a running batch. Items already started still finish.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Reported after every finished item.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    /// Items finished so far, successful or not.
    pub completed: usize,
    pub total: usize,
    /// Of `completed`, how many failed.
    pub failed: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Decode(CodecError),
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error(transparent)]
    Encode(CodecError),
}

#[derive(Debug)]
pub enum ItemOutcome {
    Written {
        output: PathBuf,
        width: u32,
        height: u32,
        /// Size of the written file.
        bytes: u64,
    },
    Failed(ItemError),
    /// Never started, as the batch was cancelled first.
    Cancelled,
}
impl ItemOutcome {
    #[must_use]
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Outcomes of a batch, one per item in input order.
#[derive(Debug)]
pub struct BatchResult {
    pub outcomes: Vec<ItemOutcome>,
}
impl BatchResult {
    #[must_use]
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Failed(_)))
            .count()
    }
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Cancelled))
            .count()
    }
}

fn process(
    item: &BatchItem,
    spec: &ResizeSpec,
    output: &Path,
    format: OutputFormat,
) -> Result<ItemOutcome, ItemError> {
    let decoded;
    let source = match &item.source {
        BatchSource::Path(path) => {
            decoded = io::decode_path(path).map_err(ItemError::Decode)?;
            &decoded
        }
        BatchSource::Buffer { buffer, .. } => buffer.as_ref(),
    };
    let spec = ResizeSpec {
        format: Some(format),
        ..spec.clone()
    };
    let resized = resample::resize(source, &spec)?;
    let bytes = io::encode_to_path(&resized, output, format, spec.quality).map_err(ItemError::Encode)?;
    Ok(ItemOutcome::Written {
        output: output.to_owned(),
        width: resized.width(),
        height: resized.height(),
        bytes,
    })
}

/// Run every item of `job`. Never fails as a whole: per-item failures are reported as outcomes.
///
/// `progress` is called from worker threads after each item finishes.
pub fn run_batch(
    job: &BatchJob,
    cancel: &CancelToken,
    progress: &(dyn Fn(BatchProgress) + Sync),
) -> BatchResult {
    let total = job.items.len();
    let plan = job.plan();
    log::info!(
        "batch of {total} item(s) into {}",
        job.destination.display()
    );

    if let Err(err) = std::fs::create_dir_all(&job.destination) {
        log::warn!("cannot create {}: {err}", job.destination.display());
        let outcomes = (0..total)
            .map(|_| {
                ItemOutcome::Failed(ItemError::Encode(CodecError::Encode {
                    path: Some(job.destination.clone()),
                    source: image::ImageError::IoError(std::io::Error::new(
                        err.kind(),
                        err.to_string(),
                    )),
                }))
            })
            .collect();
        return BatchResult { outcomes };
    }

    let completed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let written_bytes = AtomicU64::new(0);
    let work = || -> Vec<ItemOutcome> {
        job.items
            .par_iter()
            .zip(plan.par_iter())
            .map(|(item, (output, format))| {
                if cancel.is_cancelled() {
                    return ItemOutcome::Cancelled;
                }
                let outcome = process(item, job.spec_for(item), output, *format)
                    .unwrap_or_else(ItemOutcome::Failed);
                match &outcome {
                    ItemOutcome::Written { bytes, .. } => {
                        written_bytes.fetch_add(*bytes, Ordering::Relaxed);
                        log::debug!("{} -> {}", item.source, output.display());
                    }
                    ItemOutcome::Failed(err) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        log::warn!("{} failed: {err}", item.source);
                    }
                    ItemOutcome::Cancelled => (),
                }
                // Counted after the failure, so `failed <= completed` in every report.
                let done = completed.fetch_add(1, Ordering::AcqRel) + 1;
                progress(BatchProgress {
                    completed: done,
                    total,
                    failed: failed.load(Ordering::Acquire),
                });
                outcome
            })
            .collect()
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(job.workers.unwrap_or(0))
        .thread_name(|idx| format!("zimage-batch-{idx}"))
        .build();
    let outcomes = match pool {
        Ok(pool) => pool.install(work),
        Err(err) => {
            log::warn!("could not start batch workers ({err}), using the global pool");
            work()
        }
    };
    let result = BatchResult { outcomes };
    log::info!(
        "batch finished: {} written ({}), {} failed, {} cancelled",
        result.written(),
        human_bytes::human_bytes(written_bytes.into_inner() as f64),
        result.failed(),
        result.cancelled()
    );
    result
}

#[cfg(test)]
mod test {
    use super::{run_batch, BatchItem, BatchJob, BatchSource, CancelToken, ItemError, ItemOutcome};
    use crate::{
        buffer::{ChannelFormat, PixelBuffer},
        color::Color,
        io::{self, OutputFormat},
        resample::ResizeSpec,
    };
    use std::{path::Path, sync::Arc};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let buffer = PixelBuffer::create(width, height, ChannelFormat::Rgb, Color::rgb(9, 99, 199)).unwrap();
        let path = dir.join(name);
        io::encode_to_path(&buffer, &path, OutputFormat::Png, 90).unwrap();
        path
    }
    #[test]
    fn failures_are_isolated_and_ordered() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let mut items: Vec<BatchItem> = (0..5)
            .map(|i| BatchItem::path(write_png(input.path(), &format!("img{i}.png"), 40, 20)))
            .collect();
        let broken = input.path().join("img2.png");
        std::fs::write(&broken, b"garbage, not an image").unwrap();
        items[2] = BatchItem::path(broken);

        let mut job = BatchJob::new(items, ResizeSpec::new(Some(10), None), output.path());
        job.workers = Some(3);
        let reports = parking_lot::Mutex::new(Vec::new());
        let result = run_batch(&job, &CancelToken::new(), &|p| reports.lock().push(p));

        assert_eq!(result.outcomes.len(), 5);
        for (i, outcome) in result.outcomes.iter().enumerate() {
            if i == 2 {
                assert!(matches!(outcome, ItemOutcome::Failed(ItemError::Decode(_))));
            } else {
                match outcome {
                    ItemOutcome::Written {
                        output: path,
                        width,
                        height,
                        ..
                    } => {
                        assert_eq!((*width, *height), (10, 5));
                        assert_eq!(
                            path.file_name().and_then(|n| n.to_str()),
                            Some(format!("img{i}_resized.png").as_str())
                        );
                        assert!(path.is_file());
                    }
                    other => panic!("item {i}: {other:?}"),
                }
            }
        }
        let reports = reports.into_inner();
        assert_eq!(reports.len(), 5);
        let last = reports.iter().max_by_key(|p| p.completed).unwrap();
        assert_eq!((last.completed, last.total, last.failed), (5, 5, 1));
    }
    #[test]
    fn same_stem_names_are_stable() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::create_dir(input.path().join("a")).unwrap();
        std::fs::create_dir(input.path().join("b")).unwrap();
        let items = vec![
            BatchItem::path(write_png(&input.path().join("a"), "x.png", 8, 8)),
            BatchItem::path(write_png(&input.path().join("b"), "x.png", 8, 8)),
        ];
        let job = BatchJob::new(items, ResizeSpec::new(Some(4), Some(4)), output.path());
        let names = |job: &BatchJob| -> Vec<String> {
            run_batch(job, &CancelToken::new(), &|_| ())
                .outcomes
                .iter()
                .map(|o| match o {
                    ItemOutcome::Written { output, .. } => {
                        output.file_name().unwrap().to_string_lossy().into_owned()
                    }
                    other => panic!("{other:?}"),
                })
                .collect()
        };
        let first = names(&job);
        assert_eq!(first, ["x_resized.png", "x_resized_1.png"]);
        // Outputs of the last run do not shift the names.
        assert_eq!(names(&job), first);
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 2);
    }
    #[test]
    fn cancelled_before_start() {
        let output = tempfile::tempdir().unwrap();
        let buffer = Arc::new(PixelBuffer::create(4, 4, ChannelFormat::Rgba, Color::WHITE).unwrap());
        let items = (0..3)
            .map(|i| BatchItem {
                source: BatchSource::Buffer {
                    name: format!("mem{i}"),
                    buffer: buffer.clone(),
                },
                spec: None,
            })
            .collect();
        let job = BatchJob::new(items, ResizeSpec::new(Some(2), None), output.path());
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = run_batch(&job, &cancel, &|_| ());
        assert_eq!(result.cancelled(), 3);
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
    }
    #[test]
    fn format_follows_spec_then_source() {
        let output = tempfile::tempdir().unwrap();
        let buffer = Arc::new(PixelBuffer::create(4, 4, ChannelFormat::Rgba, Color::WHITE).unwrap());
        let item = |name: &str, format: Option<OutputFormat>| BatchItem {
            source: BatchSource::Buffer {
                name: name.into(),
                buffer: buffer.clone(),
            },
            spec: format.map(|format| ResizeSpec {
                format: Some(format),
                ..ResizeSpec::new(Some(2), None)
            }),
        };
        let job = BatchJob::new(
            vec![
                item("a.jpeg", None),
                item("b.gif", None),
                item("c.png", Some(OutputFormat::Bmp)),
            ],
            ResizeSpec::new(Some(2), None),
            output.path(),
        );
        let plan: Vec<String> = job
            .plan()
            .iter()
            .map(|(path, _)| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(plan, ["a_resized.jpg", "b_resized.png", "c_resized.bmp"]);
        let result = run_batch(&job, &CancelToken::new(), &|_| ());
        assert_eq!(result.written(), 3);
    }
}

//! Structured logging
//!
//! JSON log output with an optional size-rotated file sink. Rotated files
//! are timestamped, gzip-compressed, and pruned by backup count and age.
//! Sink failures degrade output; they are never surfaced to request handling.

use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error)
    pub level: String,
    /// Deployment environment; "production" switches stdout to JSON
    pub environment: String,
    /// Directory for the file sink; `None` disables file logging
    pub directory: Option<PathBuf>,
    /// Rotate the active file once it reaches this size
    pub max_size_mb: u64,
    /// Keep at most this many rotated files
    pub max_backups: usize,
    /// Remove rotated files older than this many days
    pub max_age_days: u64,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            environment: "development".to_string(),
            directory: None,
            max_size_mb: 1024,
            max_backups: 30,
            max_age_days: 90,
            compress: true,
        }
    }
}

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    File(#[from] io::Error),
    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

const LOG_FILE_NAME: &str = "stockroom.log";

/// Initialize the global subscriber.
///
/// Stdout gets pretty output in development and JSON in production. When a
/// log directory is configured, a second JSON layer writes through a
/// [`RotatingFileWriter`].
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let mut filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    // Suppress per-query sqlx logs at the default level
    if let Ok(directive) = "sqlx=warn".parse() {
        filter = filter.add_directive(directive);
    }

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.environment.eq_ignore_ascii_case("production") {
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .boxed(),
        );
    } else {
        layers.push(tracing_subscriber::fmt::layer().pretty().boxed());
    }

    if let Some(dir) = &config.directory {
        let writer = RotatingFileWriter::new(dir.join(LOG_FILE_NAME), config)?;
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(())
}

/// Size-rotating log file writer.
///
/// Cheap to clone; all clones share one file handle. When the active file
/// reaches the size limit it is renamed to `stockroom-<timestamp>.log`,
/// optionally gzipped, and a fresh active file is opened. Pruning keeps the
/// newest `max_backups` rotated files and drops any older than `max_age`.
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    path: PathBuf,
    file: File,
    written: u64,
    max_size: u64,
    max_backups: usize,
    max_age: Duration,
    compress: bool,
}

impl RotatingFileWriter {
    pub fn new(path: PathBuf, config: &LoggingConfig) -> Result<Self, io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                path,
                file,
                written,
                max_size: config.max_size_mb.saturating_mul(1024 * 1024),
                max_backups: config.max_backups,
                max_age: Duration::from_secs(config.max_age_days * 24 * 60 * 60),
                compress: config.compress,
            })),
        })
    }
}

impl io::Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if inner.written > 0 && inner.written + buf.len() as u64 > inner.max_size {
            // A failed rotation keeps writing to the oversized file rather
            // than losing the record.
            let _ = inner.rotate();
        }
        let n = inner.file.write(buf)?;
        inner.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Inner {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let backup = self.backup_path();
        fs::rename(&self.path, &backup)?;

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = 0;

        if self.compress {
            let _ = compress_file(&backup);
        }
        let _ = self.prune_backups();
        Ok(())
    }

    /// `stockroom-20250830T141503.234.log`, with a numeric suffix on
    /// same-millisecond collisions.
    fn backup_path(&self) -> PathBuf {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let base = dir.join(format!("stockroom-{stamp}.log"));
        if !base.exists() && !base.with_extension("log.gz").exists() {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = dir.join(format!("stockroom-{stamp}-{n}.log"));
            if !candidate.exists() && !candidate.with_extension("log.gz").exists() {
                return candidate;
            }
            n += 1;
        }
    }

    fn prune_backups(&self) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) => dir,
            None => return Ok(()),
        };

        let mut backups: Vec<(PathBuf, SystemTime)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with("stockroom-")
                || !(name.ends_with(".log") || name.ends_with(".log.gz"))
            {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            backups.push((entry.path(), modified));
        }

        // Newest first
        backups.sort_by(|a, b| b.1.cmp(&a.1));

        let cutoff = SystemTime::now()
            .checked_sub(self.max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        for (i, (path, modified)) in backups.iter().enumerate() {
            if i >= self.max_backups || *modified < cutoff {
                let _ = fs::remove_file(path);
            }
        }
        Ok(())
    }
}

fn compress_file(path: &Path) -> io::Result<()> {
    let data = fs::read(path)?;
    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    let mut encoder = GzEncoder::new(File::create(&gz_path)?, Compression::default());
    encoder.write_all(&data)?;
    encoder.finish()?;
    fs::remove_file(path)?;
    Ok(())
}

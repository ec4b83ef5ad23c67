use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, TrySendError},
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush to disk every 100 lines if debugging/tracing (to see crashes near real-time).
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

/// Flush to disk every 1000 lines otherwise.
#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

const LOGGING_SECTION: &str = "logging";
const DIR_KEY: &str = "dir";
const FALLBACK_FILE: &str = "rustyshare-fallback.log";

/// Bounded, non-blocking logger that writes to a per-process log file.
///
/// # Architecture
///
/// 1. **Producers**: transports hold a [`LoggerHandle`] and call `log`/`try_log`.
/// 2. **Queue**: a bounded `mpsc` channel buffers messages; overflow is dropped.
/// 3. **Consumer**: the `logger-worker` thread writes lines and flushes in batches.
///
/// The worker exits once every handle (including the one owned here) is gone.
pub struct Logger {
    handle: LoggerHandle,
    thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts the logger in the directory named by `[logging] dir`, or next to
    /// the executable when the key is missing.
    #[must_use]
    pub fn start_from_config(app_name: Option<&str>, cap: usize, config: &Config) -> Self {
        match config.get_non_empty(LOGGING_SECTION, DIR_KEY) {
            Some(dir) => Self::start_in_dir(expand_path(dir), app_name, cap),
            None => Self::start_default(app_name, cap),
        }
    }

    /// Creates a `logs/` directory next to the executable and starts the logger there.
    ///
    /// # Example Filename
    /// `target/debug/logs/rustyshare-20251102_023045-pid1234.log`
    #[must_use]
    pub fn start_default(app_name: Option<&str>, cap: usize) -> Self {
        let base = exe_dir_fallback_cwd().join("logs");
        Self::start_in_dir(base, app_name, cap)
    }

    /// Starts the logger in a specific directory, creating it if missing.
    ///
    /// * `app_name` - Optional prefix for the log filename.
    /// * `cap` - Capacity of the log channel.
    pub fn start_in_dir<D: AsRef<Path>>(dir: D, app_name: Option<&str>, cap: usize) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let ts = timestamp_for_filename();
        let pid = std::process::id();
        let fname = match app_name {
            Some(name) => format!("{name}-{ts}-pid{pid}.log"),
            None => format!("{ts}-pid{pid}.log"),
        };
        let file_path = dir.join(fname);

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap.max(1));
        let worker_path = file_path.clone();

        let thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || run_worker(&worker_path, &rx))
            .ok();

        Self {
            handle: LoggerHandle { tx },
            thread,
            file_path,
        }
    }

    /// Enqueues a message without blocking; see [`LoggerHandle::try_log`].
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Drops the owned handle and waits for the worker to drain.
    ///
    /// Blocks until every other [`LoggerHandle`] clone has been dropped too.
    pub fn shutdown(self) {
        let Self { handle, thread, .. } = self;
        drop(handle);
        if let Some(t) = thread {
            let _ = t.join();
        }
    }
}

fn run_worker(path: &Path, rx: &mpsc::Receiver<LogMsg>) {
    // target file -> temp file -> sink, never panic
    let writer: Box<dyn Write + Send> =
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Box::new(f),
            Err(_) => {
                let fallback = std::env::temp_dir().join(FALLBACK_FILE);
                match OpenOptions::new().create(true).append(true).open(&fallback) {
                    Ok(f) => Box::new(f),
                    Err(_) => Box::new(io::sink()),
                }
            }
        };

    let mut out = BufWriter::new(writer);
    let mut lines_written: u32 = 0;

    while let Ok(m) = rx.recv() {
        let _ = writeln!(&mut out, "[{}] {} {} | {}", m.level, m.ts_ms, m.target, m.text);
        lines_written = lines_written.wrapping_add(1);

        if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) || m.level == LogLevel::Error {
            let _ = out.flush();
        }
    }

    let _ = out.flush();
}

/// Directory of the running executable, or the current working directory.
fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// `YYYYMMDD_HHMMSS` in UTC, without pulling in a date crate.
fn timestamp_for_filename() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let (year, mon, day) = civil_from_days(secs / 86_400);
    let rem = secs % 86_400;
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        year,
        mon,
        day,
        rem / 3_600,
        (rem / 60) % 60,
        rem % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
#[allow(clippy::many_single_char_names)]
fn civil_from_days(days: u64) -> (i64, u64, u64) {
    let z = i64::try_from(days).unwrap_or(i64::MAX / 2) + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m.unsigned_abs(), d.unsigned_abs())
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from);

    match (path_str, home) {
        ("~", Some(home)) => home,
        (p, Some(mut home)) if p.starts_with("~/") || p.starts_with("~\\") => {
            home.push(&p[2..]);
            home
        }
        (p, _) => PathBuf::from(p),
    }
}

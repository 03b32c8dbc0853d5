//! `tracing` subscriber setup driven by the `logging` config section.
//!
//! Console output is human-readable; file output is JSON and rotated by size.
//! The "default" section sets the catch-all levels and file, every other key
//! names a crate (target prefix) with its own levels and optionally its own file.

use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, Layer, Registry};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_KEY: &str = "default";

fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        // empty or unknown
        _ => LevelFilter::INFO,
    }
}

/// Returns true if target == crate_name or target starts with "crate_name::"
fn matches_crate_prefix(target: &str, crate_name: &str) -> bool {
    target == crate_name
        || (target.starts_with(crate_name) && target[crate_name.len()..].starts_with("::"))
}

fn console_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg
        .get(DEFAULT_KEY)
        .map(|s| parse_level(&s.console_level))
        .unwrap_or(LevelFilter::INFO);
    cfg.iter()
        .filter(|(k, _)| k.as_str() != DEFAULT_KEY)
        .fold(Targets::new().with_default(default), |t, (name, s)| {
            t.with_target(name.clone(), parse_level(&s.console_level))
        })
}

fn file_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg
        .get(DEFAULT_KEY)
        .filter(|s| !s.file.trim().is_empty())
        .map(|s| parse_level(&s.file_level))
        .unwrap_or(LevelFilter::OFF);
    cfg.iter()
        .filter(|(k, _)| k.as_str() != DEFAULT_KEY)
        .fold(Targets::new().with_default(default), |t, (name, s)| {
            // A crate without its own file still lands in the default file at its level.
            let level = if s.file_level.trim().is_empty() {
                parse_level(&s.console_level)
            } else {
                parse_level(&s.file_level)
            };
            t.with_target(name.clone(), level)
        })
}

// -------- rotating file sinks --------

type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

struct RotHandle(Option<SharedRotate>);

impl Write for RotHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(file) => file
                .lock()
                .map_err(|_| std::io::Error::other("log file lock poisoned"))?
                .write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(file) => file
                .lock()
                .map_err(|_| std::io::Error::other("log file lock poisoned"))?
                .flush(),
            None => Ok(()),
        }
    }
}

/// Routes each record to the file of the most specific crate section, falling
/// back to the default file.
#[derive(Default)]
struct FileRouter {
    default: Option<SharedRotate>,
    by_prefix: Vec<(String, SharedRotate)>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<SharedRotate> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_crate_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RotHandle;

    fn make_writer(&'a self) -> Self::Writer {
        RotHandle(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RotHandle(self.resolve(meta.target()))
    }
}

/// Resolve a log file path against `base_dir` (server.home_dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(section: &Section, base_dir: &Path) -> std::io::Result<SharedRotate> {
    let path = resolve_log_path(section.file.trim(), base_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;
    let rot = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(section.max_backups.unwrap_or(3))),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(Arc::new(Mutex::new(rot)))
}

fn build_file_router(cfg: &LoggingConfig, base_dir: &Path) -> FileRouter {
    let mut router = FileRouter::default();
    // Sections pointing at the same file share one writer.
    let mut opened: HashMap<PathBuf, SharedRotate> = HashMap::new();

    for (name, section) in cfg {
        if section.file.trim().is_empty() {
            continue;
        }
        let key = resolve_log_path(section.file.trim(), base_dir);
        let writer = match opened.get(&key) {
            Some(w) => w.clone(),
            None => match open_rotating(section, base_dir) {
                Ok(w) => {
                    opened.insert(key, w.clone());
                    w
                }
                Err(e) => {
                    eprintln!("Failed to open log file {}: {e}", key.display());
                    continue;
                }
            },
        };
        if name == DEFAULT_KEY {
            router.default = Some(writer);
        } else {
            router.by_prefix.push((name.clone(), writer));
        }
    }
    router
}

/// Initialize the global subscriber from a logging configuration.
/// `base_dir` resolves relative log file paths (usually server.home_dir).
/// Calling it more than once is harmless; later calls are ignored.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` before installing the subscriber (sqlx logs via `log`).
    let _ = tracing_log::LogTracer::init();

    let console = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets(cfg));

    let router = build_file_router(cfg, base_dir);
    let file = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_current_span(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(file_targets(cfg))
    });

    let subscriber = Registry::default().with(console).with(file);
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn level_parsing() {
        assert_eq!(parse_level("trace"), LevelFilter::TRACE);
        assert_eq!(parse_level("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(parse_level(" Info "), LevelFilter::INFO);
        assert_eq!(parse_level("warn"), LevelFilter::WARN);
        assert_eq!(parse_level("ERROR"), LevelFilter::ERROR);
        assert_eq!(parse_level("off"), LevelFilter::OFF);
        assert_eq!(parse_level("none"), LevelFilter::OFF);
        assert_eq!(parse_level("loud"), LevelFilter::INFO);
    }

    #[test]
    fn crate_prefix_matching() {
        assert!(matches_crate_prefix("booking", "booking"));
        assert!(matches_crate_prefix("booking::domain::service", "booking"));
        assert!(!matches_crate_prefix("booking_extra", "booking"));
        assert!(!matches_crate_prefix("api_ingress", "booking"));
    }

    #[test]
    fn console_targets_use_per_crate_levels() {
        let mut cfg = default_logging_config();
        cfg.insert("sqlx".into(), section("warn", "", ""));
        cfg.insert("booking".into(), section("trace", "", ""));

        let t = console_targets(&cfg);
        assert!(t.would_enable("booking::domain", &tracing::Level::TRACE));
        assert!(!t.would_enable("sqlx::query", &tracing::Level::INFO));
        assert!(t.would_enable("api_ingress", &tracing::Level::INFO));
        assert!(!t.would_enable("api_ingress", &tracing::Level::DEBUG));
    }

    #[test]
    fn file_targets_are_off_without_default_file() {
        let mut cfg = LoggingConfig::new();
        cfg.insert(DEFAULT_KEY.into(), section("info", "", "debug"));
        let t = file_targets(&cfg);
        assert!(!t.would_enable("anything", &tracing::Level::ERROR));
    }

    #[test]
    fn file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let absolute = tmp.path().join("abs.log");
        let kept = resolve_log_path(absolute.to_str().unwrap(), Path::new("/elsewhere"));
        assert_eq!(kept, absolute);
    }

    #[test]
    fn router_prefers_crate_file_and_shares_writers() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert(DEFAULT_KEY.into(), section("info", "logs/all.log", "debug"));
        cfg.insert("booking".into(), section("info", "logs/booking.log", "debug"));
        cfg.insert("sqlx".into(), section("info", "logs/all.log", "warn"));

        let router = build_file_router(&cfg, tmp.path());
        assert!(tmp.path().join("logs").is_dir(), "parent dir must be created");

        let default = router.default.clone().unwrap();
        let booking = router.resolve("booking::api").unwrap();
        let sqlx = router.resolve("sqlx::query").unwrap();
        let other = router.resolve("tower_http::trace").unwrap();

        assert!(!Arc::ptr_eq(&booking, &default));
        assert!(Arc::ptr_eq(&sqlx, &default));
        assert!(Arc::ptr_eq(&other, &default));
    }
}

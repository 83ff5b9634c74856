//! 日志初始化
//!
//! 文件按天滚动写入日志目录；同时可以把每一行转发给宿主（例如一个日志面板 presenter）。

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::services::adapters::ensure_log_dir;
use crate::services::ports::FrameworkConfig;

const LOG_FILE: &str = "eduframe.log";
/// Forwarded lines waiting for the host. Further lines are dropped until it
/// catches up.
const LINE_BUFFER: usize = 1024;

/// Keeps the background writer alive. Dropping it flushes and stops logging
/// to the file.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: PathBuf,
    lines: Option<Receiver<String>>,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Formatted log lines, for hosts that display logs themselves. Can be
    /// taken once. At most `LINE_BUFFER` lines are held; the file gets
    /// everything regardless.
    pub fn take_lines(&mut self) -> Option<Receiver<String>> {
        self.lines.take()
    }
}

/// Buffers one event's output and forwards it line by line when the event
/// is done.
struct LineForwarder {
    pending: Vec<u8>,
    tx: SyncSender<String>,
}

impl Write for LineForwarder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineForwarder {
    fn drop(&mut self) {
        for line in String::from_utf8_lossy(&self.pending).lines() {
            // Full or no receiver: the rest of this event is dropped.
            if self.tx.try_send(line.to_string()).is_err() {
                break;
            }
        }
    }
}

#[derive(Clone)]
struct SplitMakeWriter {
    file: NonBlocking,
    tx: SyncSender<String>,
}

struct SplitWriter {
    file: NonBlocking,
    forward: LineForwarder,
}

impl<'a> MakeWriter<'a> for SplitMakeWriter {
    type Writer = SplitWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SplitWriter {
            file: self.file.make_writer(),
            forward: LineForwarder {
                pending: Vec::with_capacity(256),
                tx: self.tx.clone(),
            },
        }
    }
}

impl Write for SplitWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.file.write(buf)?;
        self.forward.write_all(&buf[..written])?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Installs the global subscriber. Returns `None` when the log directory
/// cannot be created or a subscriber is already installed.
pub fn init(config: &FrameworkConfig) -> Option<LoggingGuard> {
    let log_dir = match ensure_log_dir(config.log_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("eduframe: cannot create log dir: {e}");
            return None;
        }
    };

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (file, guard) = tracing_appender::non_blocking(appender);
    let (tx, lines) = mpsc::sync_channel::<String>(LINE_BUFFER);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new(crate::services::ports::config::DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(SplitMakeWriter { file, tx })
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true),
    );
    if subscriber.try_init().is_err() {
        return None;
    }

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));

    tracing::info!(log_dir = %log_dir.display(), "logging initialized");
    Some(LoggingGuard {
        _guard: guard,
        log_dir,
        lines: Some(lines),
    })
}

#[cfg(test)]
#[path = "../tests/unit/logging.rs"]
mod tests;

use crate::error::{CliError, Result};
use crate::ui::UiEvent;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self},
    prelude::*,
};

/// Writer that forwards each formatted log line to the UI task, so log output
/// is interleaved cleanly with progress bars.
struct UiLogWriter {
    sender: mpsc::Sender<UiEvent>,
    buffer: Vec<u8>,
}

impl Write for UiLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for UiLogWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        // The UI may already have shut down; fall back to plain stderr.
        if self.sender.try_send(UiEvent::Log(line.to_string())).is_err() {
            eprintln!("{}", line);
        }
    }
}

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Installs the global subscriber. Console output goes through the UI
/// channel when one is given, otherwise straight to stderr.
pub fn setup_logging(
    verbosity: u8,
    quiet: bool,
    log_file: Option<PathBuf>,
    ui_sender: Option<mpsc::Sender<UiEvent>>,
) -> Result<()> {
    let level_filter = level_filter(verbosity, quiet);

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true),
            )
        }
        None => None,
    };

    let (ui_layer, stderr_layer) = match ui_sender {
        Some(sender) => {
            let layer = fmt::layer()
                .with_writer(move || UiLogWriter {
                    sender: sender.clone(),
                    buffer: Vec::new(),
                })
                .with_ansi(true)
                .with_target(false)
                .compact();
            (Some(layer), None)
        }
        None => {
            let layer = fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true)
                .with_target(false)
                .compact();
            (None, Some(layer))
        }
    };

    tracing_subscriber::registry()
        .with(level_filter)
        .with(ui_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use std::thread;
    use std::time::Duration;
    use tracing::{debug, error, info, trace, warn};

    static INIT: Once = Once::new();

    fn ensure_global_logger_is_set() {
        INIT.call_once(|| {
            setup_logging(3, false, None, None).expect("Failed to set up global logger for tests");
        });
    }

    #[test]
    #[serial]
    fn initialization_and_macros_work() {
        ensure_global_logger_is_set();

        error!("This is an error");
        warn!("This is a warning");
        info!("This is info");
        debug!("This is debug");
        trace!("This is trace");
    }

    #[test]
    #[serial]
    fn second_initialization_is_an_error() {
        ensure_global_logger_is_set();
        assert!(matches!(
            setup_logging(0, false, None, None),
            Err(CliError::Other(_))
        ));
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(3, true), LevelFilter::OFF);
    }

    #[test]
    #[serial]
    fn file_logging_layer_writes_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("test.log");

        let file = File::create(log_path.clone()).unwrap();
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true);
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            debug!("Message for file-only test.");
        });

        thread::sleep(Duration::from_millis(100));

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Message for file-only test."));
        assert!(content.contains("DEBUG"));
        assert!(content.contains("ThreadId"));
    }

    #[test]
    fn ui_writer_forwards_complete_lines() {
        let (sender, mut receiver) = mpsc::channel(4);
        let layer = fmt::layer()
            .with_writer(move || UiLogWriter {
                sender: sender.clone(),
                buffer: Vec::new(),
            })
            .with_ansi(false)
            .without_time();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            info!("embedding started");
        });

        match receiver.try_recv() {
            Ok(UiEvent::Log(line)) => {
                assert!(line.contains("embedding started"));
                assert!(!line.ends_with('\n'));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(invalid_path), None);
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}

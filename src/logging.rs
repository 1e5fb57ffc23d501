//! Log subscriber setup.
//!
//! The CLI writes to stderr, filtered by `RUST_LOG` and optionally as JSON.
//! The browser build has no stderr and no clock, so each event is handed to
//! the `console` method matching its level instead.

use std::io;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::{self, MakeWriter};

pub const ENV_LOG_JSON: &str = "USD_WITHDRAWER_LOG_JSON";

/// Install the stderr subscriber for the CLI.
///
/// Defaults to `info`; `RUST_LOG=usd_withdrawer=debug` shows ownership checks
/// and RPC traffic. Set `USD_WITHDRAWER_LOG_JSON=1` for one JSON object per event.
#[cfg(feature = "native")]
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var(ENV_LOG_JSON).map(|value| value == "1").unwrap_or(false);

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if use_json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.pretty().try_init();
    }
}

/// Route bridge logs to the browser console. Safe to call more than once.
#[cfg(feature = "wasm")]
pub fn init_console_logging() {
    let _ = tracing::subscriber::set_global_default(line_subscriber(console_sink));
}

#[cfg(feature = "wasm")]
fn console_sink(level: Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    if level == Level::ERROR {
        web_sys::console::error_1(&line);
    } else if level == Level::WARN {
        web_sys::console::warn_1(&line);
    } else {
        web_sys::console::log_1(&line);
    }
}

/// Plain-text subscriber that hands every formatted event to `sink`.
pub fn line_subscriber<S>(sink: S) -> impl tracing::Subscriber + Send + Sync + 'static
where
    S: Fn(Level, &str) + Clone + Send + Sync + 'static,
{
    fmt::Subscriber::builder()
        .with_writer(LevelWriter { sink })
        .with_max_level(Level::INFO)
        .with_ansi(false)
        .without_time()
        .finish()
}

/// [`MakeWriter`] that remembers the level of the event being written.
#[derive(Clone)]
pub struct LevelWriter<S> {
    sink: S,
}

/// One event's worth of output, flushed to the sink on drop.
pub struct LevelLine<S: Fn(Level, &str)> {
    sink: S,
    level: Level,
    buf: Vec<u8>,
}

impl<S: Fn(Level, &str)> io::Write for LevelLine<S> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Fn(Level, &str)> Drop for LevelLine<S> {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end();
        if !line.is_empty() {
            (self.sink)(self.level, line);
        }
    }
}

impl<'a, S> MakeWriter<'a> for LevelWriter<S>
where
    S: Fn(Level, &str) + Clone + 'a,
{
    type Writer = LevelLine<S>;

    fn make_writer(&'a self) -> Self::Writer {
        LevelLine { sink: self.sink.clone(), level: Level::INFO, buf: Vec::new() }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        LevelLine { sink: self.sink.clone(), level: *meta.level(), buf: Vec::new() }
    }
}

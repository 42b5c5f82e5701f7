use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

const RELEASE_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";
const DEBUG_FILTER: &str = "debug,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Routes formatted events to the browser console. There is no wall clock on
/// `wasm32-unknown-unknown`, so timestamps are left to the devtools.
pub fn init() {
    let directives = if cfg!(debug_assertions) {
        DEBUG_FILTER
    } else {
        RELEASE_FILTER
    };
    let result = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_writer(MakeConsoleWriter)
        .without_time()
        .with_ansi(false)
        .with_target(true)
        .try_init();
    if let Err(err) = result {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "logging already initialised: {err}"
        )));
    }
}

struct MakeConsoleWriter;

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one formatted event and emits it on drop.
struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buf: Vec::new(),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let Some(line) = event_text(&self.buf) else {
            return;
        };
        let line = JsValue::from_str(&line);
        match self.level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

fn event_text(buf: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(buf);
    let text = text.trim_end_matches(['\n', '\r']);
    (!text.is_empty()).then(|| text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::event_text;

    #[test]
    fn strips_trailing_newline() {
        assert_eq!(
            event_text(b" INFO engine: regenerated routes\n").as_deref(),
            Some(" INFO engine: regenerated routes")
        );
    }

    #[test]
    fn empty_events_are_dropped() {
        assert_eq!(event_text(b""), None);
        assert_eq!(event_text(b"\n"), None);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let text = event_text(&[b'o', b'k', 0xff]).unwrap_or_default();
        assert!(text.starts_with("ok"));
    }
}

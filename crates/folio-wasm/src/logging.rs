//! Forwards `tracing` events from the core to the browser console.

use std::fmt::{self, Write};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Collects the message and the remaining fields of one event.
#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: String,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

fn format_line(level: &Level, target: &str, visitor: &EventVisitor) -> String {
    format!("[{level} {target}] {}{}", visitor.message, visitor.fields)
}

/// [`Layer`] writing each event to the console method matching its level.
pub struct ConsoleLayer {
    max_level: Level,
}

impl ConsoleLayer {
    pub fn new(max_level: Level) -> Self {
        Self { max_level }
    }

    fn enabled_for(&self, level: &Level) -> bool {
        // More verbose levels compare greater.
        *level <= self.max_level
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !self.enabled_for(meta.level()) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        write_console(meta.level(), &format_line(meta.level(), meta.target(), &visitor));
    }
}

#[cfg(target_arch = "wasm32")]
fn write_console(level: &Level, line: &str) {
    use web_sys::console;

    let value = wasm_bindgen::JsValue::from_str(line);
    if *level == Level::ERROR {
        console::error_1(&value);
    } else if *level == Level::WARN {
        console::warn_1(&value);
    } else if *level == Level::INFO {
        console::info_1(&value);
    } else {
        console::debug_1(&value);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_console(_level: &Level, line: &str) {
    eprintln!("{line}");
}

/// Install the console layer as the global subscriber.
///
/// Calling it again is harmless; the first subscriber stays installed.
pub fn init(max_level: Level) {
    let subscriber = Registry::default().with(ConsoleLayer::new(max_level));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("console logging already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        let layer = ConsoleLayer::new(Level::INFO);
        assert!(layer.enabled_for(&Level::ERROR));
        assert!(layer.enabled_for(&Level::INFO));
        assert!(!layer.enabled_for(&Level::DEBUG));
    }

    #[test]
    fn test_format_line() {
        let visitor = EventVisitor {
            message: "appended images".into(),
            fields: " added=3".into(),
        };
        assert_eq!(
            format_line(&Level::DEBUG, "folio_core::store", &visitor),
            "[DEBUG folio_core::store] appended images added=3"
        );
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(Level::WARN);
        init(Level::WARN);
    }
}

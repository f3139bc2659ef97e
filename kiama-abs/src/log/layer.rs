/*!

The `tracing` plumbing behind the level macros: a filtering layer that drops events logged above
the global threshold, and a field formatter that hides the bookkeeping fields from the output.
This baroque machinery is specific to the `tracing` crate.

*/
use std::fmt::Debug;

use tracing::{
  field::{Field, Visit},
  Event,
  Subscriber,
};
use tracing_subscriber::{
  field::RecordFields,
  fmt::{format::Writer, FormatFields},
  layer::Context,
  registry::LookupSpan,
  Layer,
};

use super::get_global_logging_threshold;

/// A layer that causes the logging system to only emit messages at or below the global logging
/// threshold.
pub(crate) struct ThresholdFilterLayer;

impl<S> Layer<S> for ThresholdFilterLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
  fn event_enabled(&self, event: &Event<'_>, _ctx: Context<'_, S>) -> bool {
    let mut visitor = ThresholdVisitor { threshold: None };
    event.record(&mut visitor);

    match visitor.threshold {
      // Emit iff the event's threshold is within the global threshold.
      Some(threshold_value) => threshold_value <= get_global_logging_threshold(),
      // No threshold provided; treat as threshold 0, i.e. always emit.
      None => true,
    }
  }
}

/// A visitor used for extracting the threshold from log records. Used by `ThresholdFilterLayer`;
/// this is how the `tracing` crate does things.
struct ThresholdVisitor {
  threshold: Option<u8>,
}

impl Visit for ThresholdVisitor {
  fn record_i64(&mut self, field: &Field, value: i64) {
    if field.name() == "threshold" {
      if (0..=u8::MAX as i64).contains(&value) {
        self.threshold = Some(value as u8);
      } else {
        panic!("Invalid threshold value supplied to the logger: {:?}", value);
      }
    }
  }

  fn record_u64(&mut self, field: &Field, value: u64) {
    if field.name() == "threshold" {
      if value <= u8::MAX as u64 {
        self.threshold = Some(value as u8);
      } else {
        panic!("Invalid threshold value supplied to the logger: {:?}", value);
      }
    }
  }

  fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
    if field.name() == "threshold" {
      panic!("Invalid threshold value supplied to the logger: {:?}", value);
    }
  }
}

/// Writes out every event field except the bookkeeping ones: `threshold` is suppressed and
/// `critical` is rendered as a `[CRITICAL]` prefix.
pub(crate) struct ThresholdFieldFormatter;

impl<'writer> FormatFields<'writer> for ThresholdFieldFormatter {
  fn format_fields<R: RecordFields>(&self, writer: Writer<'writer>, fields: R) -> std::fmt::Result {
    let mut visitor = FieldFilterVisitor { writer };
    fields.record(&mut visitor);
    Ok(())
  }
}

struct FieldFilterVisitor<'writer> {
  writer: Writer<'writer>,
}

impl<'writer> Visit for FieldFilterVisitor<'writer> {
  fn record_i64(&mut self, field: &Field, value: i64) {
    if field.name() != "threshold" {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_u64(&mut self, field: &Field, value: u64) {
    if field.name() != "threshold" {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_bool(&mut self, field: &Field, value: bool) {
    if field.name() != "critical" {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    } else if value {
      let _ = write!(self.writer, "[CRITICAL] ");
    }
  }

  fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
    match field.name() {
      "message" => {
        let _ = write!(self.writer, "{:?}", value);
      }

      "critical" => {
        let _ = write!(self.writer, "[CRITICAL] ");
      }

      "threshold" => {
        // Do not print.
      }

      name => {
        let _ = write!(self.writer, "{}={:?} ", name, value);
      }
    }
  }
}

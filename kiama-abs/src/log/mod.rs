/*!

# Overview

The `log` module provides logging capabilities with customizable thresholds and log levels. The
log level describes what _kind_ of messages are to be logged, and the numeric threshold is a
verbosity level, which describes the _verbosity_ of the logger.

## Threshold

The global logging threshold is a numerical value, with higher values meaning more verbose
logging. This global value is the same for all "levels" (info, warning, error, etc.). Individual
log entries are logged "at" a given threshold and are only emitted if their threshold is _at most_
the global threshold. A message with threshold 0 is always emitted.

```
use kiama_abs::log::{set_global_logging_threshold, get_global_logging_threshold, info};

set_global_logging_threshold(3);
let value = 42;
// Emitted, because its threshold (2) <= global threshold (3).
info!(2, "processing value: {}", value);
// Not emitted, because its threshold (4) > global threshold (3).
info!(4, "this message will not be logged");
```

## Levels

Available levels are: Critical, Error, Warning, Info, Debug, Trace. The macros are `critical!`,
`error!`, `warning!`, `info!`, `debug!`, and `trace!`, with syntax

```ignore
// With threshold
level!(threshold, "format string", args...);

// Without threshold (indicates threshold of 0, always emitted)
level!("format string");
```

The logging macros handle logger initialization automatically; no explicit initialization is
required. The global logging threshold is managed with atomic operations and may be adjusted at
runtime.

*/
mod layer;
mod macros;

use std::sync::{
  atomic::{AtomicU8, Ordering},
  LazyLock,
};

use tracing_subscriber::{fmt, layer::SubscriberExt, Registry};

use layer::{ThresholdFieldFormatter, ThresholdFilterLayer};
pub use macros::*;

/// Used for implicit initialization.
static INIT_LOGGER: LazyLock<()> = LazyLock::new(|| {
  let subscriber = Registry::default()
      .with(ThresholdFilterLayer)
      .with(
        fmt::layer()
            .fmt_fields(ThresholdFieldFormatter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stdout),
      );

  tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
});

/// This does not need to be called directly. Initializes the logging system.
pub fn init_logger() {
  LazyLock::force(&INIT_LOGGER);
}

static GLOBAL_LOGGING_THRESHOLD: AtomicU8 = AtomicU8::new(3); // Default threshold

/// Sets the global threshold. Takes effect for all subsequent messages.
pub fn set_global_logging_threshold(new_threshold: u8) {
  GLOBAL_LOGGING_THRESHOLD.store(new_threshold, Ordering::SeqCst);
}

/// Retrieves the global threshold.
pub fn get_global_logging_threshold() -> u8 {
  GLOBAL_LOGGING_THRESHOLD.load(Ordering::SeqCst)
}

//! Macros for generating log messages.

/// Shared plumbing for the level macros: initialize the logger implicitly, then emit a `tracing`
/// event carrying the threshold as a field for `ThresholdFilterLayer` to inspect.
#[macro_export]
macro_rules! log_at_level {
  ($level:expr, $threshold:expr, $($arg:tt)+) => {
    {
      $crate::log::init_logger();
      $crate::tracing::event!(
        $level,
        threshold = $threshold,
        message = format_args!($($arg)+)
      );
    }
  };
}

#[macro_export]
macro_rules! critical {
  ($threshold:expr, $($arg:tt)+) => {
    {
      $crate::log::init_logger();
      $crate::tracing::event!(
        $crate::tracing::Level::ERROR,
        critical = true,
        threshold = $threshold,
        message = format_args!($($arg)+)
      );
    }
  };
  ($($arg:tt)+) => { $crate::log::critical!(0, $($arg)+) };
}

#[macro_export]
macro_rules! error {
  ($threshold:expr, $($arg:tt)+) => {
    $crate::log::log_at_level!($crate::tracing::Level::ERROR, $threshold, $($arg)+)
  };
  ($($arg:tt)+) => { $crate::log::log_at_level!($crate::tracing::Level::ERROR, 0, $($arg)+) };
}

#[macro_export]
macro_rules! warning {
  ($threshold:expr, $($arg:tt)+) => {
    $crate::log::log_at_level!($crate::tracing::Level::WARN, $threshold, $($arg)+)
  };
  ($($arg:tt)+) => { $crate::log::log_at_level!($crate::tracing::Level::WARN, 0, $($arg)+) };
}

#[macro_export]
macro_rules! info {
  ($threshold:expr, $($arg:tt)+) => {
    $crate::log::log_at_level!($crate::tracing::Level::INFO, $threshold, $($arg)+)
  };
  ($($arg:tt)+) => { $crate::log::log_at_level!($crate::tracing::Level::INFO, 0, $($arg)+) };
}

#[macro_export]
macro_rules! debug {
  ($threshold:expr, $($arg:tt)+) => {
    $crate::log::log_at_level!($crate::tracing::Level::DEBUG, $threshold, $($arg)+)
  };
  ($($arg:tt)+) => { $crate::log::log_at_level!($crate::tracing::Level::DEBUG, 0, $($arg)+) };
}

#[macro_export]
macro_rules! trace {
  ($threshold:expr, $($arg:tt)+) => {
    $crate::log::log_at_level!($crate::tracing::Level::TRACE, $threshold, $($arg)+)
  };
  ($($arg:tt)+) => { $crate::log::log_at_level!($crate::tracing::Level::TRACE, 0, $($arg)+) };
}

// The following makes the macros importable directly from the `log` module.
pub use {critical, debug, error, info, log_at_level, trace, warning};

//! User-facing notifications.
//!
//! A message is reported and execution continues. Nothing here can fail or
//! abort the process.

use std::fmt;

/// How serious a message is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Something failed.
    Error,
    /// Something needs the user's attention. Logged at info.
    Question,
    /// Something looks wrong but work continues.
    Warning,
    /// Progress or status.
    Info,
}

impl Severity {
    /// The log level a message of this severity is written at.
    #[must_use]
    pub fn level(self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warning => log::Level::Warn,
            Self::Question | Self::Info => log::Level::Info,
        }
    }

    /// Label prefixed to the message text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Question => "Question",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Report `args` at `severity`.
///
/// Usually called through [`message!`](crate::message!).
pub fn message(severity: Severity, args: fmt::Arguments<'_>) {
    log::log!(target: "anvil_engine::message", severity.level(), "{severity}: {args}");
}

/// Report a formatted message and continue.
///
/// ```
/// use anvil_engine::{message, message::Severity};
/// message!(Severity::Warning, "cannot find {}", "font.ttf");
/// ```
#[macro_export]
macro_rules! message {
    ($severity:expr, $($arg:tt)+) => {
        $crate::message::message($severity, format_args!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Severity::Error, log::Level::Error)]
    #[case(Severity::Warning, log::Level::Warn)]
    #[case(Severity::Info, log::Level::Info)]
    #[case(Severity::Question, log::Level::Info)]
    fn severity_maps_to_log_level(#[case] severity: Severity, #[case] level: log::Level) {
        assert_eq!(severity.level(), level);
    }

    #[test]
    fn reporting_never_panics() {
        crate::message!(Severity::Error, "failed to open {}", "nothing.png");
        message(Severity::Question, format_args!("continue?"));
    }
}

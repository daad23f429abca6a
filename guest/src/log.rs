//! Host-routed logging.
//!
//! ```ignore
//! plugwire_guest::info!(host, "counted {} vowels", n);
//! ```

use plugwire_engine::{HostInterface, LogLevel};

/// Write a log line. Failures are ignored.
pub fn log(host: &mut dyn HostInterface, level: LogLevel, message: &str) {
    let _ = host.log(level, message);
}

#[macro_export]
macro_rules! log {
    ($host:expr, $level:expr, $($arg:tt)+) => {
        $crate::log::log($host, $level, &::std::format!($($arg)+))
    };
}

#[macro_export]
macro_rules! error {
    ($host:expr, $($arg:tt)+) => { $crate::log!($host, $crate::LogLevel::Error, $($arg)+) };
}

#[macro_export]
macro_rules! warn {
    ($host:expr, $($arg:tt)+) => { $crate::log!($host, $crate::LogLevel::Warn, $($arg)+) };
}

#[macro_export]
macro_rules! info {
    ($host:expr, $($arg:tt)+) => { $crate::log!($host, $crate::LogLevel::Info, $($arg)+) };
}

#[macro_export]
macro_rules! debug {
    ($host:expr, $($arg:tt)+) => { $crate::log!($host, $crate::LogLevel::Debug, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use plugwire_engine::{LogLevel, MockHost};

    #[test]
    fn test_macros_route_to_host() {
        let mut host = MockHost::new();
        crate::info!(&mut host, "counted {} vowels", 3);
        crate::warn!(&mut host, "slow");
        crate::error!(&mut host, "bad {}", "input");
        crate::debug!(&mut host, "x={:?}", (1, 2));

        let lines: Vec<_> = host.logs().iter().map(|l| (l.level, l.message.as_str())).collect();
        assert_eq!(
            lines,
            vec![
                (LogLevel::Info, "counted 3 vowels"),
                (LogLevel::Warn, "slow"),
                (LogLevel::Error, "bad input"),
                (LogLevel::Debug, "x=(1, 2)"),
            ]
        );
    }
}

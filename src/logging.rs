//! Logging façade (C12).
//!
//! The core never calls `eprintln!`/`println!` for anything a driver might
//! want to route elsewhere. It logs through a `Logger`, defaulting to one
//! backed by the `log` crate so the crate behaves sensibly even if the
//! driver never installs a custom implementation.

pub trait Logger {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
}

/// Forwards to the `log` crate. The driver picks whatever backend
/// (`env_logger`, `tracing-log`, ...) it wants; this crate only emits
/// through the macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateLogger;

impl Logger for LogCrateLogger {
    fn debug(&self, msg: &str) {
        log::debug!("{msg}");
    }
    fn info(&self, msg: &str) {
        log::info!("{msg}");
    }
    fn warn(&self, msg: &str) {
        log::warn!("{msg}");
    }
}

#[cfg(test)]
pub mod test_support {
    use super::Logger;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct RecordingLogger {
        pub warnings: RefCell<Vec<String>>,
        pub infos: RefCell<Vec<String>>,
        pub debugs: RefCell<Vec<String>>,
    }

    impl Logger for RecordingLogger {
        fn debug(&self, msg: &str) {
            self.debugs.borrow_mut().push(msg.to_string());
        }
        fn info(&self, msg: &str) {
            self.infos.borrow_mut().push(msg.to_string());
        }
        fn warn(&self, msg: &str) {
            self.warnings.borrow_mut().push(msg.to_string());
        }
    }
}

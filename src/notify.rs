use chrono::Local;
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

/// Receives user-facing, non-fatal warnings.
pub trait WarningSink {
    fn warn(&self, message: &str);
}

/// Logs warnings and, when a path is configured, appends them to a toast log.
#[derive(Debug, Clone, Default)]
pub struct ToastLog {
    path: Option<PathBuf>,
}

impl ToastLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl WarningSink for ToastLog {
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
        let Some(path) = &self.path else {
            return;
        };
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{} - {}", Local::now().to_rfc3339(), message);
        }
    }
}

/// Keeps warnings in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Rc<RefCell<Vec<String>>>,
}

impl MemorySink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl WarningSink for MemorySink {
    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

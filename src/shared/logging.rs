use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn session_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/roteiro.log")
}

/// JSON-lines event log for one wizard or batch session.
///
/// Writes are best effort: a log that cannot be opened never fails the
/// operation being logged.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    path: Option<PathBuf>,
}

impl SessionLog {
    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn for_state_root(state_root: &Path) -> Self {
        Self::at(session_log_path(state_root))
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, event: &str, message: &str) {
        self.append("info", event, message);
    }

    pub fn warn(&self, event: &str, message: &str) {
        self.append("warn", event, message);
    }

    pub fn error(&self, event: &str, message: &str) {
        self.append("error", event, message);
    }

    fn append(&self, level: &str, event: &str, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let payload = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "level": level,
            "event": event,
            "message": message,
        });
        let Ok(line) = serde_json::to_string(&payload) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };
        let _ = writeln!(file, "{line}");
    }
}

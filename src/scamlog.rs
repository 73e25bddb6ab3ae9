//! scamlog.rs — append-only CSV log of high-alert detections.
//!
//! The check-exists / write-header / append sequence runs under a mutex so
//! concurrent requests cannot interleave rows. Write failures are logged and
//! swallowed; the classification response never waits on or fails with the
//! log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::error;

const HEADER: &str = "timestamp,sender_id,message_content,analysis_json";

#[derive(Debug)]
pub struct ScamLogWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ScamLogWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Best-effort: failures are reported via tracing and
    /// otherwise ignored.
    pub fn append(&self, sender: &str, message: &str, analysis_json: &str) {
        if let Err(e) = self.try_append(sender, message, analysis_json) {
            error!(path = %self.path.display(), error = %e, "failed to append scam log record");
        }
    }

    fn try_append(&self, sender: &str, message: &str, analysis_json: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut row = String::new();
        if needs_header {
            row.push_str(HEADER);
            row.push('\n');
        }
        row.push_str(&format!(
            "{},{},{},{}\n",
            Utc::now().to_rfc3339(),
            escape_field(sender),
            escape_field(message),
            escape_field(analysis_json),
        ));
        file.write_all(row.as_bytes())
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

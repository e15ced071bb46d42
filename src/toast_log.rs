use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

pub const TOAST_LOG_FILE: &str = "toast.log";

/// Append one notification line to [`TOAST_LOG_FILE`]. Failures are
/// ignored; the log is a convenience, not a record.
pub fn append_toast_log(msg: &str) {
    append_toast_log_to(TOAST_LOG_FILE, msg);
}

pub fn append_toast_log_to(path: &str, msg: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{} - {}", Local::now().to_rfc3339(), msg);
    }
}

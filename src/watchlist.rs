//! watchlist.rs — in-memory lookup of flagged sender numbers.
//!
//! Loaded once at startup from a CSV file (`phone_number,country_code,name,
//! source,detection_date`), then read-only for the process lifetime. A missing
//! or partially malformed file degrades to an empty or partial table; startup
//! never fails because of the watchlist.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

/// Metadata for one flagged number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntry {
    pub name: String,
    pub source: String,
    pub detection_date: String,
}

#[derive(Debug, Default)]
pub struct WatchlistStore {
    entries: HashMap<String, WatchlistEntry>,
    default_country_code: String,
}

impl WatchlistStore {
    pub fn empty(default_country_code: &str) -> Self {
        Self {
            entries: HashMap::new(),
            default_country_code: default_country_code.to_string(),
        }
    }

    /// Load from a CSV file. Column order is taken from the header row;
    /// unreadable files and rows missing a phone number are skipped with a
    /// warning.
    pub fn load<P: AsRef<Path>>(path: P, default_country_code: &str) -> Self {
        let mut store = Self::empty(default_country_code);

        let raw = match fs::read_to_string(path.as_ref()) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e,
                      "watchlist file not readable; starting with empty watchlist");
                return store;
            }
        };

        let mut lines = raw.lines();
        let header = match lines.next() {
            Some(h) => h,
            None => return store,
        };
        let columns: Vec<String> = header
            .split(',')
            .map(|c| c.trim().to_lowercase())
            .collect();
        let col = |name: &str| columns.iter().position(|c| c == name);

        let (Some(phone_idx), name_idx, source_idx, date_idx, cc_idx) = (
            col("phone_number"),
            col("name"),
            col("source"),
            col("detection_date"),
            col("country_code"),
        ) else {
            warn!("watchlist header missing 'phone_number' column; ignoring file");
            return store;
        };

        for (lineno, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let Some(raw_phone) = fields.get(phone_idx).filter(|p| !p.is_empty()) else {
                warn!(line = lineno + 2, "watchlist row has no phone number; skipped");
                continue;
            };
            let country_code = cc_idx.and_then(|i| fields.get(i)).copied().unwrap_or("");
            let key = store.normalize(raw_phone, country_code);

            let field = |idx: Option<usize>| {
                idx.and_then(|i| fields.get(i))
                    .copied()
                    .unwrap_or("")
                    .to_string()
            };
            store.entries.insert(
                key,
                WatchlistEntry {
                    name: field(name_idx),
                    source: field(source_idx),
                    detection_date: field(date_idx),
                },
            );
        }

        store
    }

    /// Normalization used for both stored rows and lookups:
    /// - already-international numbers (`+...`) pass through,
    /// - an explicit country code is prefixed (adding `+` when missing),
    /// - bare 10-digit numbers get the default country code,
    /// - anything else is kept unmodified.
    fn normalize(&self, raw_phone: &str, country_code: &str) -> String {
        let phone = raw_phone.trim();
        let cc = country_code.trim();
        if phone.starts_with('+') {
            phone.to_string()
        } else if !cc.is_empty() {
            if cc.starts_with('+') {
                format!("{cc}{phone}")
            } else {
                format!("+{cc}{phone}")
            }
        } else if is_bare_ten_digits(phone) {
            format!("{}{phone}", self.default_country_code)
        } else {
            phone.to_string()
        }
    }

    /// Point lookup. Tries the query as-is (trimmed), then the
    /// default-country-code variant for bare 10-digit numbers.
    pub fn lookup(&self, sender: &str) -> Option<&WatchlistEntry> {
        let query = sender.trim();
        if let Some(entry) = self.entries.get(query) {
            return Some(entry);
        }
        if is_bare_ten_digits(query) {
            let prefixed = format!("{}{query}", self.default_country_code);
            return self.entries.get(&prefixed);
        }
        None
    }

    pub fn contains(&self, sender: &str) -> bool {
        self.lookup(sender).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_bare_ten_digits(s: &str) -> bool {
    s.len() == 10 && s.chars().all(|c| c.is_ascii_digit())
}

//! Human-readable listing and verification report rendering.

use super::{Archive, ListOptions};
use crate::crypto::{self, Password};
use crate::entry::format_size;
use crate::error::Result;

impl Archive {
    /// Renders the archive contents as a table.
    ///
    /// Path and size are always shown; type, checksum, and modification
    /// time follow the options. A trailing summary line gives the entry
    /// count and total original size, plus the stored size and ratio when
    /// the archive carries compressed entries.
    pub fn list(&self, options: &ListOptions) -> String {
        let mut out = String::new();

        let name = self
            .filepath()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(unsaved)".into());
        out.push_str(&format!("Archive: {}\n", name));
        out.push_str(&"=".repeat(40));
        out.push('\n');

        if self.entries.is_empty() {
            out.push_str("(empty archive)\n");
            return out;
        }

        out.push_str(&format!("{:<50}{:>12}", "Name", "Size"));
        if options.show_type {
            out.push_str(&format!("{:>10}", "Type"));
        }
        if options.show_checksums {
            out.push_str(&format!("  {:<64}", "Checksum"));
        }
        if options.show_timestamps {
            out.push_str(&format!("  {:<19}", "Modified"));
        }
        out.push('\n');

        for entry in &self.entries {
            let path = truncate_front(&entry.path, 48);

            let mut size = if options.human_readable {
                format_size(entry.original_size)
            } else {
                entry.original_size.to_string()
            };
            if entry.is_compressed() && entry.stored_size != entry.original_size {
                size.push('*');
            }

            out.push_str(&format!("{:<50}{:>12}", path, size));
            if options.show_type {
                let label = if entry.is_directory() {
                    entry.kind.label()
                } else {
                    entry.file_type.label()
                };
                out.push_str(&format!("{:>10}", label));
            }
            if options.show_checksums {
                out.push_str(&format!("  {:<64}", crypto::to_hex(&entry.checksum)));
            }
            if options.show_timestamps {
                out.push_str(&format!(
                    "  {:<19}",
                    format_timestamp(entry.modification_time)
                ));
            }
            out.push('\n');
        }

        out.push('\n');
        let total = if options.human_readable {
            format_size(self.total_original_size())
        } else {
            self.total_original_size().to_string()
        };
        out.push_str(&format!(
            "Total: {} files, {}\n",
            self.entries.len(),
            total
        ));

        if self.header.is_compressed() {
            let stats = self.statistics();
            let stored = if options.human_readable {
                format_size(stats.total_stored_size)
            } else {
                stats.total_stored_size.to_string()
            };
            out.push_str(&format!("Compressed: {} ({:.1}%)\n", stored, stats.ratio));
        }

        out
    }

    /// Runs a full verification pass and renders the outcome per entry.
    pub fn verification_report(&mut self, password: Option<&Password>) -> Result<String> {
        let mut out = String::new();
        out.push_str("Archive Verification Report\n");
        out.push_str("============================\n\n");

        let name = self
            .filepath()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(unsaved)".into());
        out.push_str(&format!("Archive: {}\n", name));
        out.push_str(&format!("Files: {}\n", self.entries.len()));
        out.push_str(&format!(
            "Encrypted: {}\n",
            if self.header.is_encrypted() { "Yes" } else { "No" }
        ));
        out.push_str(&format!(
            "Compressed: {}\n\n",
            if self.header.is_compressed() { "Yes" } else { "No" }
        ));

        self.ensure_read_state(password)?;

        out.push_str("Entries:\n");
        out.push_str("--------\n");
        for entry in &self.entries {
            let status = match super::pipeline::verify_entry(
                entry,
                self.crypto_state.as_ref(),
                &self.provider,
            ) {
                Ok(()) => "OK".to_string(),
                Err(e) => format!("FAILED ({})", e),
            };

            out.push_str(&format!(
                "{} - {} - {}\n",
                entry.path,
                format_size(entry.original_size),
                status
            ));
        }

        Ok(out)
    }
}

/// Shortens a path to at most `max_chars` characters, keeping the tail and
/// prefixing `...`. Operates on characters, never on raw bytes, so
/// multibyte paths cannot split mid-character.
fn truncate_front(path: &str, max_chars: usize) -> String {
    let count = path.chars().count();
    if count <= max_chars {
        return path.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let tail: String = path.chars().skip(count - keep).collect();
    format!("...{}", tail)
}

/// Formats Unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC). Zero renders as a
/// dash.
pub(crate) fn format_timestamp(unix_secs: u64) -> String {
    if unix_secs == 0 {
        return "-".to_string();
    }

    let days = (unix_secs / 86_400) as i64;
    let secs_of_day = unix_secs % 86_400;

    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day,
        secs_of_day / 3600,
        (secs_of_day % 3600) / 60,
        secs_of_day % 60
    )
}

/// Converts days since 1970-01-01 to a (year, month, day) civil date.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

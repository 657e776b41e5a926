// ledger.rs: Append-only JSONL audit ledger.
//
// The ledger lives at `<project root>/.safeclaw/audit.jsonl`, one JSON
// object per line. The only mutation is appending a new line:
//
// - the directory and file are created lazily on first append;
// - `detail` is redacted before serialization;
// - the timestamp is stamped at append time;
// - `previous_hash` is the SHA-256 of the previous raw line (read from the
//   end of the file), forming a chain that `verify_chain` can check;
// - the complete line (including '\n') goes out in one `write_all` on an
//   append-mode handle, so concurrent writers never interleave partial lines.
//
// There is no cross-process lock. With several concurrent writers the line
// order is whatever the OS produced, and two writers may link to the same
// predecessor; `verify_chain` reports that as an integrity violation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::hasher;
use crate::redact::redact;

/// Hidden per-project directory holding SafeClaw state.
pub const AUDIT_DIR: &str = ".safeclaw";

/// Ledger file name inside [`AUDIT_DIR`].
pub const AUDIT_FILE: &str = "audit.jsonl";

/// Bytes read per step when looking for the last line.
const TAIL_CHUNK: u64 = 4096;

/// Location of the ledger for a project root.
pub fn ledger_path(project_root: impl AsRef<Path>) -> PathBuf {
    project_root.as_ref().join(AUDIT_DIR).join(AUDIT_FILE)
}

/// Append `event` to the project's ledger and return the ledger path.
pub fn append(project_root: impl AsRef<Path>, event: AuditEvent) -> Result<PathBuf, AuditError> {
    let ledger = AuditLedger::for_project(project_root);
    ledger.append(event)?;
    Ok(ledger.path)
}

/// The `n` most recent records, newest first. Empty if there is no ledger.
pub fn read_recent(project_root: impl AsRef<Path>, n: usize) -> Result<Vec<AuditEvent>, AuditError> {
    AuditLedger::for_project(project_root).read_recent(n)
}

/// One page of records, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct AuditPage {
    pub entries: Vec<AuditEvent>,
    /// 1-based page number that was requested.
    pub page: usize,
    pub per_page: usize,
    /// Total number of readable records in the ledger.
    pub total: usize,
}

/// Handle to a ledger file. Holds no open descriptor between calls.
#[derive(Debug, Clone)]
pub struct AuditLedger {
    path: PathBuf,
}

impl AuditLedger {
    /// The ledger at the standard location under `project_root`.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        Self {
            path: ledger_path(project_root),
        }
    }

    /// A ledger at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event. Redacts `detail`, stamps the time, links the chain.
    pub fn append(&self, mut event: AuditEvent) -> Result<(), AuditError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| AuditError::OpenFailed {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        event.detail = redact(&event.detail);
        event.timestamp = Utc::now();
        event.previous_hash = self.last_line_hash()?;

        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| AuditError::OpenFailed {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        tracing::debug!(
            action = %event.action,
            status = %event.status,
            "audit record appended to {}",
            self.path.display()
        );
        Ok(())
    }

    /// The `n` most recent records, newest first.
    ///
    /// Lines that do not parse are skipped with a warning rather than
    /// hiding every other record; `verify_chain` is the strict reader.
    pub fn read_recent(&self, n: usize) -> Result<Vec<AuditEvent>, AuditError> {
        let mut events = self.read_lenient()?;
        let start = events.len().saturating_sub(n);
        let mut recent = events.split_off(start);
        recent.reverse();
        Ok(recent)
    }

    /// Records for a 1-based `page`, newest first.
    pub fn read_page(&self, page: usize, per_page: usize) -> Result<AuditPage, AuditError> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let events = self.read_lenient()?;
        let total = events.len();
        let entries = events
            .into_iter()
            .rev()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Ok(AuditPage {
            entries,
            page,
            per_page,
            total,
        })
    }

    /// Every record, oldest first. Fails on the first malformed line.
    pub fn read_all(&self) -> Result<Vec<AuditEvent>, AuditError> {
        let mut events = Vec::new();
        for (_, line) in self.strict_lines()? {
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }

    /// Walk the chain from the first record and return how many records link
    /// correctly. Any undecodable line is an error here.
    pub fn verify_chain(&self) -> Result<usize, AuditError> {
        let mut expected: Option<String> = None;
        let mut count = 0;
        for (number, line) in self.strict_lines()? {
            let event: AuditEvent = serde_json::from_str(&line)?;
            if event.previous_hash != expected {
                let none = || "None".to_string();
                return Err(AuditError::IntegrityViolation {
                    line: number,
                    expected: expected.unwrap_or_else(none),
                    actual: event.previous_hash.unwrap_or_else(none),
                });
            }
            expected = Some(hasher::hash_bytes(line.as_bytes()));
            count += 1;
        }
        Ok(count)
    }

    fn read_lenient(&self) -> Result<Vec<AuditEvent>, AuditError> {
        let mut events = Vec::new();
        for (number, raw) in self.raw_lines()? {
            let parsed = std::str::from_utf8(&raw)
                .map_err(|e| e.to_string())
                .and_then(|line| serde_json::from_str::<AuditEvent>(line).map_err(|e| e.to_string()));
            match parsed {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(
                    "skipping malformed audit line {} in {}: {}",
                    number,
                    self.path.display(),
                    e
                ),
            }
        }
        Ok(events)
    }

    /// Non-blank lines as UTF-8, with 1-based line numbers.
    fn strict_lines(&self) -> Result<Vec<(usize, String)>, AuditError> {
        self.raw_lines()?
            .into_iter()
            .map(|(number, raw)| {
                String::from_utf8(raw)
                    .map(|line| (number, line))
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
            })
            .collect()
    }

    /// Non-blank raw lines with 1-based line numbers, line endings removed.
    /// Empty when the ledger does not exist.
    fn raw_lines(&self) -> Result<Vec<(usize, Vec<u8>)>, AuditError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(AuditError::OpenFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let mut lines = Vec::new();
        for (index, chunk) in BufReader::new(file).split(b'\n').enumerate() {
            let mut raw = chunk?;
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            if !raw.iter().all(u8::is_ascii_whitespace) {
                lines.push((index + 1, raw));
            }
        }
        Ok(lines)
    }

    /// Hash of the last non-blank line, read backwards from the end of the
    /// file. The line is hashed as raw bytes so an undecodable tail does not
    /// stop later appends from linking to it.
    fn last_line_hash(&self) -> Result<Option<String>, AuditError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AuditError::OpenFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut tail: Vec<u8> = Vec::new();
        let mut end = file.metadata()?.len();
        loop {
            let start = end.saturating_sub(TAIL_CHUNK);
            let mut chunk = vec![0u8; (end - start) as usize];
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(&mut chunk)?;
            chunk.extend_from_slice(&tail);
            tail = chunk;

            let content_end = tail
                .iter()
                .rposition(|b| !b.is_ascii_whitespace())
                .map(|i| i + 1);
            if let Some(content_end) = content_end {
                let line = &tail[..content_end];
                match line.iter().rposition(|&b| b == b'\n') {
                    Some(newline) => return Ok(Some(hasher::hash_bytes(&line[newline + 1..]))),
                    None if start == 0 => return Ok(Some(hasher::hash_bytes(line))),
                    None => {}
                }
            } else if start == 0 {
                return Ok(None);
            }
            end = start;
        }
    }
}

//! Membership snapshot sinks
//!
//! Every installed membership is handed to a sink as a flat content
//! string. A sink never accepts a snapshot older than the newest one it
//! already holds for the same segment.
//!
//! The file sink appends one JSON record per line:
//! `{"segment":..,"content":"..","crc32":..,"persisted_at":"<rfc3339>"}`.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::membership::{SegmentMembership, SegmentVersion};
use crate::observability::{Event, Logger, Severity};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StoreError, StoreResult};

/// One persisted membership snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub segment: u64,
    pub content: String,
    pub crc32: u32,
    pub persisted_at: DateTime<Utc>,
}

impl SnapshotRecord {
    pub fn new(segment: u64, membership: &SegmentMembership) -> Self {
        let content = membership.serialize_to_content();
        Self {
            segment,
            crc32: compute_checksum(segment, &content),
            content,
            persisted_at: Utc::now(),
        }
    }

    pub fn is_intact(&self) -> bool {
        verify_checksum(self.segment, &self.content, self.crc32)
    }

    pub fn membership(&self) -> StoreResult<SegmentMembership> {
        Ok(SegmentMembership::deserialize_from_content(&self.content)?)
    }
}

/// Receiver of membership snapshots.
pub trait MembershipSink: Send + Sync {
    /// Persist a snapshot. Must be durable when this returns.
    fn persist(&self, segment: u64, membership: &SegmentMembership) -> StoreResult<()>;

    /// The newest snapshot of `segment`, if any.
    fn load_latest(&self, segment: u64) -> StoreResult<Option<SegmentMembership>>;
}

fn refuse_stale(
    segment: u64,
    persisted: Option<SegmentVersion>,
    offered: SegmentVersion,
) -> StoreResult<()> {
    match persisted {
        Some(persisted) if offered < persisted => Err(StoreError::StaleVersion {
            segment,
            offered,
            persisted,
        }),
        _ => Ok(()),
    }
}

/// In-memory sink, used when no store path is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryMembershipSink {
    records: Arc<Mutex<Vec<SnapshotRecord>>>,
}

impl MemoryMembershipSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots in persist order.
    pub fn records(&self) -> Vec<SnapshotRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

impl MembershipSink for MemoryMembershipSink {
    fn persist(&self, segment: u64, membership: &SegmentMembership) -> StoreResult<()> {
        let mut records = self.records.lock().unwrap();
        let persisted = records
            .iter()
            .rev()
            .find(|r| r.segment == segment)
            .map(|r| r.membership())
            .transpose()?
            .map(|m| m.version());
        refuse_stale(segment, persisted, membership.version())?;
        records.push(SnapshotRecord::new(segment, membership));
        Ok(())
    }

    fn load_latest(&self, segment: u64) -> StoreResult<Option<SegmentMembership>> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .rev()
            .find(|r| r.segment == segment)
            .map(|r| r.membership())
            .transpose()
    }
}

/// Append-only file sink with CRC32-checked records.
pub struct FileMembershipSink {
    path: PathBuf,
    fsync: bool,
    writer: Arc<Mutex<BufWriter<File>>>,
    latest: Mutex<HashMap<u64, SegmentVersion>>,
}

impl FileMembershipSink {
    /// Open or create the log at `path`.
    ///
    /// Existing records are verified while the newest version of every
    /// segment is recovered; a corrupted log fails the open.
    pub fn open(path: impl AsRef<Path>, fsync: bool) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let mut latest = HashMap::new();
        if path.exists() {
            for record in read_records(&path)? {
                let version = record.membership()?.version();
                let entry = latest.entry(record.segment).or_insert(version);
                if version > *entry {
                    *entry = version;
                }
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            fsync,
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
            latest: Mutex::new(latest),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every snapshot of `segment`, oldest first.
    pub fn history(&self, segment: u64) -> StoreResult<Vec<SnapshotRecord>> {
        self.writer.lock().unwrap().flush()?;
        Ok(read_records(&self.path)?
            .into_iter()
            .filter(|r| r.segment == segment)
            .collect())
    }
}

impl MembershipSink for FileMembershipSink {
    fn persist(&self, segment: u64, membership: &SegmentMembership) -> StoreResult<()> {
        let mut latest = self.latest.lock().unwrap();
        let version = membership.version();
        refuse_stale(segment, latest.get(&segment).copied(), version)?;

        let record = SnapshotRecord::new(segment, membership);
        let line = serde_json::to_string(&record).map_err(|e| StoreError::MalformedRecord {
            line: 0,
            reason: e.to_string(),
        })?;

        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        if self.fsync {
            writer.get_ref().sync_all()?;
        }
        latest.insert(segment, version);

        Logger::trace(
            Event::SnapshotPersisted.as_str(),
            &[
                ("segment", &segment.to_string()),
                ("version", &version.to_string()),
                ("path", &self.path.display().to_string()),
            ],
        );
        Ok(())
    }

    fn load_latest(&self, segment: u64) -> StoreResult<Option<SegmentMembership>> {
        self.history(segment)?
            .pop()
            .map(|r| r.membership())
            .transpose()
    }
}

/// Read and verify every record of a membership log.
pub fn read_records(path: &Path) -> StoreResult<Vec<SnapshotRecord>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: SnapshotRecord =
            serde_json::from_str(&line).map_err(|e| StoreError::MalformedRecord {
                line: number,
                reason: e.to_string(),
            })?;

        if !record.is_intact() {
            let computed = compute_checksum(record.segment, &record.content);
            Logger::event(
                Severity::Fatal,
                Event::SnapshotCorrupted,
                &[
                    ("path", &path.display().to_string()),
                    ("line", &number.to_string()),
                    ("segment", &record.segment.to_string()),
                ],
            );
            return Err(StoreError::ChecksumMismatch {
                line: number,
                stored: record.crc32,
                computed,
            });
        }
        records.push(record);
    }

    Ok(records)
}

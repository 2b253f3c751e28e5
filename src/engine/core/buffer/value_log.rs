use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::core::key::Key;
use crate::engine::errors::StoreError;

const FRAME_HEADER: u64 = 8; // u32 length + u32 checksum

/// One durable record in the buffer's value log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogRecord {
    Put {
        key: [u8; 24],
        expires_at: u64,
        value: Vec<u8>,
    },
    Delete {
        key: [u8; 24],
    },
}

/// A live buffer entry as held by the in-memory index.
#[derive(Debug, Clone)]
pub struct Entry {
    pub value: Vec<u8>,
    pub expires_at: u64,
    /// Bytes this entry occupies in the log, used for reclaim accounting.
    pub record_size: u64,
}

/// Append-only, crc32-framed log backing the row buffer. Writes are flushed
/// to the OS but not fsynced: a crash may lose the last seconds of writes,
/// which upstream producers cover by retrying.
pub struct ValueLog {
    dir: PathBuf,
    file: BufWriter<File>,
    log_id: u64,
    total_bytes: u64,
    dead_bytes: u64,
}

impl ValueLog {
    /// Opens the log directory, replays every log file in id order into an
    /// index, and positions the writer on the newest file.
    pub fn open(dir: &Path) -> Result<(ValueLog, BTreeMap<Key, Entry>), StoreError> {
        std::fs::create_dir_all(dir)?;

        let mut index = BTreeMap::new();
        let mut total_bytes = 0u64;
        let mut dead_bytes = 0u64;

        let mut ids = Self::log_ids(dir);
        ids.sort_unstable();
        for id in &ids {
            let path = Self::log_path(dir, *id);
            replay_file(&path, &mut index, &mut total_bytes, &mut dead_bytes)?;
        }

        let log_id = ids.last().copied().unwrap_or(0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(Self::log_path(dir, log_id))?;

        info!(
            target: "talaria::buffer",
            dir = %dir.display(),
            log_id,
            entries = index.len(),
            total_bytes,
            dead_bytes,
            "Opened value log"
        );

        Ok((
            ValueLog {
                dir: dir.to_path_buf(),
                file: BufWriter::new(file),
                log_id,
                total_bytes,
                dead_bytes,
            },
            index,
        ))
    }

    /// Appends one record and flushes it to the OS. Returns the framed size.
    pub fn append(&mut self, record: &LogRecord) -> Result<u64, StoreError> {
        let payload = bincode::serialize(record)?;
        let written = write_frame(&mut self.file, &payload)?;
        self.file.flush()?;
        self.total_bytes += written;
        Ok(written)
    }

    /// Marks bytes previously written as no longer live.
    pub fn note_dead(&mut self, bytes: u64) {
        self.dead_bytes = self.dead_bytes.saturating_add(bytes);
    }

    pub fn dead_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.dead_bytes as f64 / self.total_bytes as f64
    }

    /// Runs one garbage-collection pass: when the dead ratio reaches the
    /// discard threshold the live entries are rewritten into a fresh log
    /// file and the old files are removed. Returns whether anything was
    /// reclaimed; callers loop until it reports false.
    pub fn gc(
        &mut self,
        discard_ratio: f64,
        index: &mut BTreeMap<Key, Entry>,
    ) -> Result<bool, StoreError> {
        if self.dead_ratio() < discard_ratio {
            return Ok(false);
        }

        let old_ids = Self::log_ids(&self.dir);
        let next_id = self.log_id + 1;
        let next_path = Self::log_path(&self.dir, next_id);

        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&next_path)?;
        let mut writer = BufWriter::new(file);

        let mut rewritten = 0u64;
        for (key, entry) in index.iter_mut() {
            let record = LogRecord::Put {
                key: key.as_bytes().try_into().expect("24-byte key"),
                expires_at: entry.expires_at,
                value: entry.value.clone(),
            };
            let payload = bincode::serialize(&record)?;
            let written = write_frame(&mut writer, &payload)?;
            entry.record_size = written;
            rewritten += written;
        }
        writer.flush()?;

        let reclaimed = self.total_bytes.saturating_sub(rewritten);
        self.file = writer;
        self.log_id = next_id;
        self.total_bytes = rewritten;
        self.dead_bytes = 0;

        for id in old_ids {
            let path = Self::log_path(&self.dir, id);
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(
                    target: "talaria::buffer",
                    path = %path.display(),
                    error = %e,
                    "Unable to remove a collected log file"
                );
            }
        }

        debug!(
            target: "talaria::buffer",
            log_id = self.log_id,
            reclaimed,
            live_bytes = rewritten,
            "Value log rewritten"
        );
        Ok(reclaimed > 0)
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.file.flush()?;
        Ok(())
    }

    fn log_path(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("buffer-{:05}.vlog", id))
    }

    fn log_ids(dir: &Path) -> Vec<u64> {
        std::fs::read_dir(dir)
            .ok()
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_prefix("buffer-")
                    .and_then(|s| s.strip_suffix(".vlog"))
                    .and_then(|n| n.parse::<u64>().ok())
            })
            .collect()
    }
}

fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<u64, StoreError> {
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(&crc32fast::hash(payload).to_le_bytes())?;
    writer.write_all(payload)?;
    Ok(FRAME_HEADER + payload.len() as u64)
}

fn replay_file(
    path: &Path,
    index: &mut BTreeMap<Key, Entry>,
    total_bytes: &mut u64,
    dead_bytes: &mut u64,
) -> Result<(), StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let mut reader = BufReader::new(file);

    loop {
        let mut header = [0u8; 8];
        match reader.read_exact(&mut header[..4]) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        if reader.read_exact(&mut header[4..]).is_err() {
            warn!(target: "talaria::buffer", path = %path.display(), "Truncated frame header, stopping replay");
            break;
        }

        let len = u32::from_le_bytes(header[..4].try_into().unwrap()) as usize;
        let checksum = u32::from_le_bytes(header[4..].try_into().unwrap());

        let mut payload = vec![0u8; len];
        if reader.read_exact(&mut payload).is_err() {
            warn!(target: "talaria::buffer", path = %path.display(), "Truncated frame payload, stopping replay");
            break;
        }
        if crc32fast::hash(&payload) != checksum {
            warn!(target: "talaria::buffer", path = %path.display(), "Checksum mismatch, stopping replay");
            break;
        }

        let record_size = FRAME_HEADER + len as u64;
        *total_bytes += record_size;

        match bincode::deserialize::<LogRecord>(&payload) {
            Ok(LogRecord::Put {
                key,
                expires_at,
                value,
            }) => {
                let Some(key) = Key::from_bytes(&key) else {
                    continue;
                };
                if let Some(previous) = index.insert(
                    key,
                    Entry {
                        value,
                        expires_at,
                        record_size,
                    },
                ) {
                    *dead_bytes += previous.record_size;
                }
            }
            Ok(LogRecord::Delete { key }) => {
                let Some(key) = Key::from_bytes(&key) else {
                    continue;
                };
                // The tombstone and the record it shadows are both garbage.
                *dead_bytes += record_size;
                if let Some(previous) = index.remove(&key) {
                    *dead_bytes += previous.record_size;
                }
            }
            Err(e) => {
                warn!(
                    target: "talaria::buffer",
                    path = %path.display(),
                    error = %e,
                    "Undecodable record, stopping replay"
                );
                break;
            }
        }
    }

    Ok(())
}

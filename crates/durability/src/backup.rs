//! Sequential backup file format
//!
//! Layout: one bincode-encoded `Header` followed by a stream of
//! bincode-encoded `Record`s, one per key visible to the snapshot taken
//! when the backup started. Tombstoned keys and historical versions are
//! not written; a backup captures exactly what the latest snapshot can
//! see. The stream ends at end-of-file, there is no trailer.
//!
//! Restore rebuilds each key as a single-version chain and then advances
//! both version counters one past the header values, so transactions and
//! commits on the restored database stay above the backed-up history.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use memkv_core::{Error, Result};
use memkv_engine::{Database, VersionCounters};
use memkv_storage::Value;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    last_tx_version: u64,
    max_commit_version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    key: String,
    version: u64,
    data: Vec<u8>,
}

/// Save the database content to `path`
///
/// Takes a snapshot, then streams every key-value pair visible to it.
/// Concurrent commits during the scan do not affect the captured set.
pub fn backup(db: &Arc<Database>, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let snap = db.snapshot();
    let counters = db.version_counters();

    let header = Header {
        last_tx_version: counters.last_tx_version,
        max_commit_version: counters.max_commit_version,
    };
    bincode::serialize_into(&mut writer, &header).map_err(|e| Error::codec(e.to_string()))?;

    let mut records = 0usize;
    let mut status = Ok(());
    db.for_each_chain(|key, chain| {
        if let Some(value) = chain.fetch(snap.version()) {
            if !value.deleted {
                let record = Record {
                    key: key.to_string(),
                    version: value.version,
                    data: value.data.clone(),
                };
                if let Err(e) = bincode::serialize_into(&mut writer, &record) {
                    status = Err(Error::codec(e.to_string()));
                    return false;
                }
                records += 1;
            }
        }
        true
    });
    status?;

    writer.flush()?;
    writer.get_ref().sync_all()?;
    debug!(records, "backup completed");
    Ok(())
}

/// Rebuild a database from a backup file
pub fn restore(path: &Path) -> Result<Arc<Database>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let header: Header =
        bincode::deserialize_from(&mut reader).map_err(|e| Error::codec(e.to_string()))?;

    let db = Database::new();
    let mut records = 0usize;
    loop {
        match bincode::deserialize_from::<_, Record>(&mut reader) {
            Ok(record) => {
                db.restore_value(record.key, Value::live(record.version, record.data));
                records += 1;
            }
            Err(e) => match *e {
                bincode::ErrorKind::Io(ref io) if io.kind() == ErrorKind::UnexpectedEof => break,
                _ => return Err(Error::codec(e.to_string())),
            },
        }
    }

    db.restore_counters(VersionCounters {
        last_tx_version: header.last_tx_version + 1,
        max_commit_version: header.max_commit_version + 1,
    });
    debug!(records, "restore completed");
    Ok(db)
}

//! Session registry
//!
//! Maps client-chosen names to live transactions, snapshots, and
//! iterators. Each session slot carries its own lock, so at most one
//! request per session runs at a time while different sessions proceed in
//! parallel.
//!
//! Iterators are registered under their own names but resolve values
//! through their owning session at fetch time, which keeps transaction
//! shadowing and read tracking intact for remote callers. When a session
//! is torn down, its iterators go with it.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use memkv_core::cursor::Direction;
use memkv_core::Result;
use memkv_engine::{Database, Snapshot, Transaction};

use crate::api::*;
use crate::errors::{encode_error, EOF, ERR_INVALID};

/// A live remote session: the two-variant capability split
enum Session {
    Transaction(Transaction),
    Snapshot(Snapshot),
}

impl Session {
    fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        match self {
            Session::Transaction(tx) => tx.get(key),
            Session::Snapshot(snap) => snap.get(key),
        }
    }

    fn range_keys(&self, begin: &str, end: &str, direction: Direction) -> Result<Vec<String>> {
        match self {
            Session::Transaction(tx) => tx.range_keys(begin, end, direction),
            Session::Snapshot(snap) => snap.range_keys(begin, end, direction),
        }
    }

    fn scan_keys(&self) -> Result<Vec<String>> {
        match self {
            Session::Transaction(tx) => tx.scan_keys(),
            Session::Snapshot(snap) => snap.scan_keys(),
        }
    }
}

/// One named session: a unique id plus the per-name lock
struct SessionSlot {
    id: Uuid,
    session: Mutex<Option<Session>>,
}

struct IterState {
    keys: Vec<String>,
    index: usize,
}

/// One named iterator, bound to the session that created it
struct IterSlot {
    owner: String,
    state: Mutex<IterState>,
}

/// Name-to-session mapping over one database
///
/// Shared by reference between transport workers; all methods take
/// `&self`.
pub struct SessionRegistry {
    db: Arc<Database>,
    sessions: DashMap<String, Arc<SessionSlot>>,
    iterators: DashMap<String, Arc<IterSlot>>,
    session_iterators: DashMap<Uuid, Vec<String>>,
}

fn unknown_session(name: &str) -> String {
    format!("unknown session: {name}")
}

/// Pick the target session name: exactly one of the two must be set
fn target_name<'r>(transaction: &'r str, snapshot: &'r str) -> std::result::Result<&'r str, String> {
    match (transaction.is_empty(), snapshot.is_empty()) {
        (false, true) => Ok(transaction),
        (true, false) => Ok(snapshot),
        _ => Err(ERR_INVALID.to_string()),
    }
}

impl SessionRegistry {
    /// Create a registry over `db`
    pub fn new(db: Arc<Database>) -> Self {
        SessionRegistry {
            db,
            sessions: DashMap::new(),
            iterators: DashMap::new(),
            session_iterators: DashMap::new(),
        }
    }

    fn create_session(&self, name: &str, session: Session) -> StatusResponse {
        if name.is_empty() {
            return StatusResponse::err(ERR_INVALID);
        }
        match self.sessions.entry(name.to_string()) {
            Entry::Occupied(_) => StatusResponse::err(format!("session already exists: {name}")),
            Entry::Vacant(vacant) => {
                let slot = Arc::new(SessionSlot {
                    id: Uuid::new_v4(),
                    session: Mutex::new(Some(session)),
                });
                debug!(name, id = %slot.id, "session created");
                vacant.insert(slot);
                StatusResponse::ok()
            }
        }
    }

    fn slot(&self, name: &str) -> Option<Arc<SessionSlot>> {
        self.sessions.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Run `body` while holding the named session's lock
    fn with_session<R>(&self, name: &str, body: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let slot = self.slot(name)?;
        let mut guard = slot.session.lock();
        guard.as_mut().map(body)
    }

    /// Handle `/new-transaction`
    pub fn new_transaction(&self, req: NewTransactionRequest) -> StatusResponse {
        self.create_session(&req.name, Session::Transaction(self.db.transaction()))
    }

    /// Handle `/new-snapshot`
    pub fn new_snapshot(&self, req: NewSnapshotRequest) -> StatusResponse {
        self.create_session(&req.name, Session::Snapshot(self.db.snapshot()))
    }

    /// Handle `/tx/get` and `/snap/get`
    pub fn get(&self, req: GetRequest) -> GetResponse {
        let name = match target_name(&req.transaction, &req.snapshot) {
            Ok(name) => name,
            Err(error) => return GetResponse { error, value: Vec::new() },
        };
        match self.with_session(name, |session| session.get(&req.key)) {
            None => GetResponse {
                error: unknown_session(name),
                value: Vec::new(),
            },
            Some(Ok(value)) => GetResponse {
                error: String::new(),
                value,
            },
            Some(Err(e)) => GetResponse {
                error: encode_error(&e),
                value: Vec::new(),
            },
        }
    }

    /// Handle `/tx/set`
    pub fn set(&self, req: SetRequest) -> StatusResponse {
        let outcome = self.with_session(&req.transaction, |session| match session {
            Session::Transaction(tx) => tx
                .set(&req.key, &req.value)
                .map_err(|e| encode_error(&e)),
            Session::Snapshot(_) => Err(ERR_INVALID.to_string()),
        });
        match outcome {
            None => StatusResponse::err(unknown_session(&req.transaction)),
            Some(Ok(())) => StatusResponse::ok(),
            Some(Err(error)) => StatusResponse::err(error),
        }
    }

    /// Handle `/tx/delete`
    pub fn delete(&self, req: DeleteRequest) -> StatusResponse {
        let outcome = self.with_session(&req.transaction, |session| match session {
            Session::Transaction(tx) => tx.delete(&req.key).map_err(|e| encode_error(&e)),
            Session::Snapshot(_) => Err(ERR_INVALID.to_string()),
        });
        match outcome {
            None => StatusResponse::err(unknown_session(&req.transaction)),
            Some(Ok(())) => StatusResponse::ok(),
            Some(Err(error)) => StatusResponse::err(error),
        }
    }

    fn new_iterator(
        &self,
        transaction: &str,
        snapshot: &str,
        iterator_name: &str,
        keys_of: impl FnOnce(&Session) -> Result<Vec<String>>,
    ) -> StatusResponse {
        if iterator_name.is_empty() {
            return StatusResponse::err(ERR_INVALID);
        }
        let owner_name = match target_name(transaction, snapshot) {
            Ok(name) => name,
            Err(error) => return StatusResponse::err(error),
        };
        let Some(slot) = self.slot(owner_name) else {
            return StatusResponse::err(unknown_session(owner_name));
        };
        let guard = slot.session.lock();
        let Some(session) = guard.as_ref() else {
            return StatusResponse::err(unknown_session(owner_name));
        };
        let keys = match keys_of(session) {
            Ok(keys) => keys,
            Err(e) => return StatusResponse::err(encode_error(&e)),
        };
        match self.iterators.entry(iterator_name.to_string()) {
            Entry::Occupied(_) => {
                StatusResponse::err(format!("iterator already exists: {iterator_name}"))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(IterSlot {
                    owner: owner_name.to_string(),
                    state: Mutex::new(IterState { keys, index: 0 }),
                }));
                self.session_iterators
                    .entry(slot.id)
                    .or_default()
                    .push(iterator_name.to_string());
                StatusResponse::ok()
            }
        }
    }

    /// Handle `/tx/ascend` and `/snap/ascend`
    pub fn ascend(&self, req: RangeRequest) -> StatusResponse {
        self.new_iterator(&req.transaction, &req.snapshot, &req.name, |session| {
            session.range_keys(&req.begin, &req.end, Direction::Ascending)
        })
    }

    /// Handle `/tx/descend` and `/snap/descend`
    pub fn descend(&self, req: RangeRequest) -> StatusResponse {
        self.new_iterator(&req.transaction, &req.snapshot, &req.name, |session| {
            session.range_keys(&req.begin, &req.end, Direction::Descending)
        })
    }

    /// Handle `/tx/scan` and `/snap/scan`
    pub fn scan(&self, req: ScanRequest) -> StatusResponse {
        self.new_iterator(&req.transaction, &req.snapshot, &req.name, |session| {
            session.scan_keys()
        })
    }

    /// Handle `/it/fetch`
    ///
    /// `advance = false` reads the current position (the first pair right
    /// after creation); `advance = true` moves first. Keys that no longer
    /// resolve are skipped; `EOF` marks the end of the range.
    pub fn fetch(&self, req: FetchRequest) -> FetchResponse {
        let Some(iter) = self
            .iterators
            .get(&req.iterator)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return FetchResponse {
                error: format!("unknown iterator: {}", req.iterator),
                ..FetchResponse::default()
            };
        };

        let mut state = iter.state.lock();
        if req.advance && state.index < state.keys.len() {
            state.index += 1;
        }

        let Some(slot) = self.slot(&iter.owner) else {
            return FetchResponse {
                error: unknown_session(&iter.owner),
                ..FetchResponse::default()
            };
        };
        let mut guard = slot.session.lock();
        let Some(session) = guard.as_mut() else {
            return FetchResponse {
                error: unknown_session(&iter.owner),
                ..FetchResponse::default()
            };
        };

        while state.index < state.keys.len() {
            let key = state.keys[state.index].clone();
            match session.get(&key) {
                Ok(value) => {
                    return FetchResponse {
                        error: String::new(),
                        key,
                        value,
                    }
                }
                Err(e) if e.is_not_exist() => state.index += 1,
                Err(e) => {
                    return FetchResponse {
                        error: encode_error(&e),
                        ..FetchResponse::default()
                    }
                }
            }
        }

        FetchResponse {
            error: EOF.to_string(),
            ..FetchResponse::default()
        }
    }

    /// Tear down a session of the expected kind and run `finish` on it
    fn teardown(
        &self,
        name: &str,
        expect_transaction: bool,
        finish: impl FnOnce(Session) -> Result<()>,
    ) -> StatusResponse {
        let Some(slot) = self.slot(name) else {
            return StatusResponse::err(unknown_session(name));
        };
        let mut guard = slot.session.lock();
        let matches = match guard.as_ref() {
            Some(Session::Transaction(_)) => expect_transaction,
            Some(Session::Snapshot(_)) => !expect_transaction,
            None => false,
        };
        if !matches {
            return StatusResponse::err(unknown_session(name));
        }

        let session = guard.take().expect("session checked above");
        self.sessions.remove(name);
        if let Some((_, iterator_names)) = self.session_iterators.remove(&slot.id) {
            for iterator_name in iterator_names {
                self.iterators.remove(&iterator_name);
            }
        }
        debug!(name, id = %slot.id, "session torn down");

        match finish(session) {
            Ok(()) => StatusResponse::ok(),
            Err(e) => StatusResponse::err(encode_error(&e)),
        }
    }

    /// Handle `/tx/commit`
    pub fn commit(&self, req: CommitRequest) -> StatusResponse {
        self.teardown(&req.transaction, true, |session| match session {
            Session::Transaction(mut tx) => tx.commit(),
            Session::Snapshot(_) => unreachable!("kind checked in teardown"),
        })
    }

    /// Handle `/tx/rollback`
    pub fn rollback(&self, req: RollbackRequest) -> StatusResponse {
        self.teardown(&req.transaction, true, |session| match session {
            Session::Transaction(mut tx) => tx.rollback(),
            Session::Snapshot(_) => unreachable!("kind checked in teardown"),
        })
    }

    /// Handle `/snap/discard`
    pub fn discard(&self, req: DiscardRequest) -> StatusResponse {
        self.teardown(&req.snapshot, false, |session| match session {
            Session::Snapshot(mut snap) => snap.discard(),
            Session::Transaction(_) => unreachable!("kind checked in teardown"),
        })
    }

    /// Number of live sessions, for diagnostics
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of live iterators, for diagnostics
    pub fn iterator_count(&self) -> usize {
        self.iterators.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Database::new())
    }

    fn new_tx(reg: &SessionRegistry, name: &str) {
        let resp = reg.new_transaction(NewTransactionRequest {
            name: name.to_string(),
        });
        assert!(resp.is_ok(), "{}", resp.error);
    }

    fn tx_set(reg: &SessionRegistry, tx: &str, key: &str, value: &[u8]) {
        let resp = reg.set(SetRequest {
            transaction: tx.to_string(),
            key: key.to_string(),
            value: value.to_vec(),
        });
        assert!(resp.is_ok(), "{}", resp.error);
    }

    fn tx_commit(reg: &SessionRegistry, tx: &str) -> StatusResponse {
        reg.commit(CommitRequest {
            transaction: tx.to_string(),
        })
    }

    #[test]
    fn test_duplicate_session_name_rejected() {
        let reg = registry();
        new_tx(&reg, "t1");
        let resp = reg.new_transaction(NewTransactionRequest {
            name: "t1".to_string(),
        });
        assert!(resp.error.contains("already exists"));
    }

    #[test]
    fn test_empty_session_name_rejected() {
        let reg = registry();
        let resp = reg.new_transaction(NewTransactionRequest::default());
        assert_eq!(resp.error, ERR_INVALID);
    }

    #[test]
    fn test_get_requires_exactly_one_target() {
        let reg = registry();
        let both = reg.get(GetRequest {
            transaction: "a".to_string(),
            snapshot: "b".to_string(),
            key: "k".to_string(),
        });
        assert_eq!(both.error, ERR_INVALID);

        let neither = reg.get(GetRequest::default());
        assert_eq!(neither.error, ERR_INVALID);
    }

    #[test]
    fn test_set_on_snapshot_session_rejected() {
        let reg = registry();
        let resp = reg.new_snapshot(NewSnapshotRequest {
            name: "s1".to_string(),
        });
        assert!(resp.is_ok());

        let resp = reg.set(SetRequest {
            transaction: "s1".to_string(),
            key: "k".to_string(),
            value: b"v".to_vec(),
        });
        assert_eq!(resp.error, ERR_INVALID);
    }

    #[test]
    fn test_commit_requires_transaction_session() {
        let reg = registry();
        let resp = reg.new_snapshot(NewSnapshotRequest {
            name: "s1".to_string(),
        });
        assert!(resp.is_ok());

        let resp = tx_commit(&reg, "s1");
        assert!(resp.error.contains("unknown session"));
        // The snapshot session survives a mistyped commit.
        assert_eq!(reg.session_count(), 1);
    }

    #[test]
    fn test_session_gone_after_commit() {
        let reg = registry();
        new_tx(&reg, "t1");
        tx_set(&reg, "t1", "k", b"v");
        assert!(tx_commit(&reg, "t1").is_ok());
        assert_eq!(reg.session_count(), 0);

        let resp = reg.get(GetRequest {
            transaction: "t1".to_string(),
            snapshot: String::new(),
            key: "k".to_string(),
        });
        assert!(resp.error.contains("unknown session"));
    }

    #[test]
    fn test_iterators_die_with_their_session() {
        let reg = registry();
        new_tx(&reg, "t1");
        tx_set(&reg, "t1", "a", b"1");

        let resp = reg.ascend(RangeRequest {
            transaction: "t1".to_string(),
            name: "it1".to_string(),
            ..RangeRequest::default()
        });
        assert!(resp.is_ok(), "{}", resp.error);
        assert_eq!(reg.iterator_count(), 1);

        assert!(tx_commit(&reg, "t1").is_ok());
        assert_eq!(reg.iterator_count(), 0);

        let fetched = reg.fetch(FetchRequest {
            iterator: "it1".to_string(),
            advance: false,
        });
        assert!(fetched.error.contains("unknown iterator"));
    }

    #[test]
    fn test_conflict_crosses_the_wire_as_free_form() {
        let reg = registry();
        new_tx(&reg, "init");
        tx_set(&reg, "init", "k", b"zero");
        assert!(tx_commit(&reg, "init").is_ok());

        new_tx(&reg, "t1");
        new_tx(&reg, "t2");

        // Both read, both write: the second committer loses.
        for tx in ["t1", "t2"] {
            let resp = reg.get(GetRequest {
                transaction: tx.to_string(),
                snapshot: String::new(),
                key: "k".to_string(),
            });
            assert!(resp.error.is_empty());
        }
        tx_set(&reg, "t1", "k", b"one");
        tx_set(&reg, "t2", "k", b"two");

        assert!(tx_commit(&reg, "t1").is_ok());
        let resp = tx_commit(&reg, "t2");
        assert!(resp.error.contains("commit conflict"));
    }
}

//! JSONL plan store
//!
//! Every write appends the full record as one JSON line to `plans.jsonl`;
//! replaying the file lets the last line for an id win. Several `dp`
//! processes may share one store directory, so every operation holds an
//! advisory lock on `plans.lock`, replays the file, and only then reads or
//! appends. Appends always reopen the file by path.
//!
//! A plan in `executing` is owned by whoever holds its lease file under
//! `running/`. The lock is released by the OS when the owner dies, so an
//! `executing` record whose lease can be taken on open was interrupted.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{PlanRecord, PlanStatus};

const STORE_FILE: &str = "plans.jsonl";
const LOCK_FILE: &str = "plans.lock";
const LEASE_DIR: &str = "running";

/// Error recorded on executions whose owner went away
pub const INTERRUPTED: &str = "interrupted";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Plan already exists: {0}")]
    Duplicate(String),

    #[error("Plan not found: {0}")]
    NotFound(String),

    #[error("Plan is being executed by another process: {0}")]
    Busy(String),
}

/// Advisory lock on the store directory, released on drop
struct DirLock(File);

impl DirLock {
    fn exclusive(path: &Path) -> Result<Self, StoreError> {
        let file = open_lock_file(path)?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self(file))
    }

    fn shared(path: &Path) -> Result<Self, StoreError> {
        let file = open_lock_file(path)?;
        FileExt::lock_shared(&file)?;
        Ok(Self(file))
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.0) {
            warn!(error = %e, "failed to release plan store lock");
        }
    }
}

/// Append-only plan store with an in-memory index
pub struct PlanStore {
    dir: PathBuf,
    path: PathBuf,
    lock_path: PathBuf,
    records: HashMap<String, PlanRecord>,
    leases: HashMap<String, File>,
}

impl PlanStore {
    /// Open or create the store under `dir`
    ///
    /// Interrupted executions are marked failed and superseded lines are
    /// compacted away, both while holding the directory lock.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        debug!(dir = %dir.display(), "PlanStore::open: called");
        fs::create_dir_all(dir.join(LEASE_DIR))?;

        let mut store = Self {
            dir: dir.to_path_buf(),
            path: dir.join(STORE_FILE),
            lock_path: dir.join(LOCK_FILE),
            records: HashMap::new(),
            leases: HashMap::new(),
        };

        let _lock = DirLock::exclusive(&store.lock_path)?;
        let superseded = store.reload()?;
        let recovered = store.recover_interrupted()?;
        if superseded + recovered > 0 {
            store.rewrite()?;
        }

        info!(path = %store.path.display(), plans = store.records.len(), recovered, "Opened plan store");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records as of the last operation
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a new record; fails if the id is taken
    pub fn create(&mut self, record: PlanRecord) -> Result<String, StoreError> {
        let id = record.id().to_string();
        debug!(%id, "PlanStore::create: called");
        let _lock = DirLock::exclusive(&self.lock_path)?;
        self.reload()?;

        if self.records.contains_key(&id) {
            return Err(StoreError::Duplicate(id));
        }
        self.append(&record)?;
        self.records.insert(id.clone(), record);
        Ok(id)
    }

    pub fn get(&mut self, id: &str) -> Result<Option<PlanRecord>, StoreError> {
        let _lock = DirLock::shared(&self.lock_path)?;
        self.reload()?;
        Ok(self.records.get(id).cloned())
    }

    /// Read-check-write on one record under the directory lock
    ///
    /// `change` sees the record as currently on disk and returns whether it
    /// changed anything. Entering `executing` takes the plan's lease and
    /// leaving it releases the lease.
    pub fn modify<E>(
        &mut self,
        id: &str,
        change: impl FnOnce(&mut PlanRecord) -> Result<bool, E>,
    ) -> Result<PlanRecord, E>
    where
        E: From<StoreError>,
    {
        debug!(%id, "PlanStore::modify: called");
        let _lock = DirLock::exclusive(&self.lock_path)?;
        self.reload()?;

        let mut record = self
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let from = record.status;
        if !change(&mut record)? {
            return Ok(record);
        }
        let to = record.status;

        if to == PlanStatus::Executing && from != PlanStatus::Executing {
            let lease = try_lease(&self.lease_path(id))?.ok_or_else(|| StoreError::Busy(id.to_string()))?;
            self.append(&record)?;
            self.leases.insert(id.to_string(), lease);
        } else {
            self.append(&record)?;
            if from == PlanStatus::Executing && to != PlanStatus::Executing {
                self.release_lease(id);
            }
        }

        self.records.insert(id.to_string(), record.clone());
        Ok(record)
    }

    /// Records, oldest first, optionally filtered by status
    pub fn list(&mut self, status: Option<PlanStatus>) -> Result<Vec<PlanRecord>, StoreError> {
        let _lock = DirLock::shared(&self.lock_path)?;
        self.reload()?;
        Ok(self.sorted(status))
    }

    /// Rewrite the file with one line per live record
    pub fn compact(&mut self) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), "PlanStore::compact: called");
        let _lock = DirLock::exclusive(&self.lock_path)?;
        self.reload()?;
        self.rewrite()
    }

    fn sorted(&self, status: Option<PlanStatus>) -> Vec<PlanRecord> {
        let mut records: Vec<PlanRecord> = self
            .records
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id().cmp(b.id())));
        records
    }

    /// Replace the index with the file contents; returns the superseded line count
    fn reload(&mut self) -> Result<usize, StoreError> {
        let (records, lines) = replay(&self.path)?;
        self.records = records;
        Ok(lines.saturating_sub(self.records.len()))
    }

    /// Caller holds the exclusive lock
    fn recover_interrupted(&mut self) -> Result<usize, StoreError> {
        let stranded: Vec<String> = self
            .records
            .values()
            .filter(|r| r.status == PlanStatus::Executing)
            .map(|r| r.id().to_string())
            .collect();

        let mut recovered = 0;
        for id in stranded {
            let lease_path = self.lease_path(&id);
            let Some(lease) = try_lease(&lease_path)? else {
                debug!(%id, "execution still owned, leaving it alone");
                continue;
            };

            if let Some(record) = self.records.get_mut(&id) {
                record.error = Some(INTERRUPTED.to_string());
                record.set_status(PlanStatus::Failed);
                warn!(plan_id = %id, "execution was interrupted, marking plan failed");
                recovered += 1;
            }
            remove_lease_file(&lease_path);
            drop(lease);
        }
        Ok(recovered)
    }

    /// Caller holds the exclusive lock
    fn rewrite(&self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut out = BufWriter::new(File::create(&tmp)?);
            for record in self.sorted(None) {
                writeln!(out, "{}", serde_json::to_string(&record)?)?;
            }
            out.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Caller holds the exclusive lock
    fn append(&self, record: &PlanRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn lease_path(&self, id: &str) -> PathBuf {
        self.dir.join(LEASE_DIR).join(format!("{}.lock", id))
    }

    fn release_lease(&mut self, id: &str) {
        if let Some(lease) = self.leases.remove(id) {
            remove_lease_file(&self.lease_path(id));
            drop(lease);
        }
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).write(true).truncate(false).open(path)
}

/// Take the lease at `path`, or None if a live owner holds it
fn try_lease(path: &Path) -> Result<Option<File>, StoreError> {
    let file = open_lock_file(path)?;
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => Ok(Some(file)),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_lease_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove lease file");
    }
}

/// Load records from the file; returns the index and the number of valid lines
fn replay(path: &Path) -> Result<(HashMap<String, PlanRecord>, usize), StoreError> {
    let mut records = HashMap::new();
    if !path.exists() {
        return Ok((records, 0));
    }

    let content = fs::read_to_string(path)?;
    let mut lines = 0;
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<PlanRecord>(line) {
            Ok(record) => {
                lines += 1;
                records.insert(record.id().to_string(), record);
            }
            Err(e) => {
                warn!(line = number + 1, error = %e, "skipping unreadable plan record");
            }
        }
    }
    Ok((records, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AggregatedContext, TaskType};
    use crate::planning::synthesize;
    use tempfile::tempdir;

    fn record(task_type: TaskType) -> PlanRecord {
        let plan = synthesize(task_type, &AggregatedContext::default(), None);
        PlanRecord::new(plan, "test query", Some("acme".to_string()))
    }

    fn approve(store: &mut PlanStore, id: &str) -> PlanRecord {
        store
            .modify(id, |r| {
                r.approve();
                Ok::<_, StoreError>(true)
            })
            .unwrap()
    }

    fn set_status(store: &mut PlanStore, id: &str, status: PlanStatus) -> Result<PlanRecord, StoreError> {
        store.modify(id, |r| {
            r.set_status(status);
            Ok(true)
        })
    }

    #[test]
    fn test_create_get_modify() {
        let temp = tempdir().unwrap();
        let mut store = PlanStore::open(temp.path()).unwrap();
        assert!(store.is_empty());

        let rec = record(TaskType::QbrGeneration);
        let id = store.create(rec.clone()).unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap(), rec);

        approve(&mut store, &id);
        assert!(store.get(&id).unwrap().unwrap().approved);
    }

    #[test]
    fn test_unchanged_modify_writes_nothing() {
        let temp = tempdir().unwrap();
        let mut store = PlanStore::open(temp.path()).unwrap();
        let id = store.create(record(TaskType::SavePlay)).unwrap();

        let untouched = store.modify(&id, |_| Ok::<_, StoreError>(false)).unwrap();
        assert_eq!(untouched.status, PlanStatus::Pending);
        assert_eq!(fs::read_to_string(store.path()).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_duplicate_and_missing() {
        let temp = tempdir().unwrap();
        let mut store = PlanStore::open(temp.path()).unwrap();
        let rec = record(TaskType::SavePlay);

        store.create(rec.clone()).unwrap();
        assert!(matches!(store.create(rec), Err(StoreError::Duplicate(_))));
        assert!(matches!(
            store.modify("plan-missing", |_| Ok::<_, StoreError>(true)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_reopen_replays_last_write() {
        let temp = tempdir().unwrap();
        let id = {
            let mut store = PlanStore::open(temp.path()).unwrap();
            let id = store.create(record(TaskType::AccountPlan)).unwrap();
            approve(&mut store, &id);
            id
        };

        let mut store = PlanStore::open(temp.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).unwrap().unwrap().approved);

        // Reopening compacted the superseded line away
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp = tempdir().unwrap();
        let rec = record(TaskType::RiskAssessment);
        let line = serde_json::to_string(&rec).unwrap();
        fs::write(temp.path().join(STORE_FILE), format!("{}\n{{not json\n\n", line)).unwrap();

        let mut store = PlanStore::open(temp.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(rec.id()).unwrap().is_some());
    }

    #[test]
    fn test_list_filters_by_status() {
        let temp = tempdir().unwrap();
        let mut store = PlanStore::open(temp.path()).unwrap();

        let pending = record(TaskType::QbrGeneration);
        let mut failed = record(TaskType::SavePlay);
        failed.set_status(PlanStatus::Failed);
        store.create(pending.clone()).unwrap();
        store.create(failed.clone()).unwrap();

        assert_eq!(store.list(None).unwrap().len(), 2);
        let only_failed = store.list(Some(PlanStatus::Failed)).unwrap();
        assert_eq!(only_failed.len(), 1);
        assert_eq!(only_failed[0].id(), failed.id());
    }

    #[test]
    fn test_writes_survive_another_store_compacting() {
        let temp = tempdir().unwrap();
        let mut first = PlanStore::open(temp.path()).unwrap();
        let id = first.create(record(TaskType::QbrGeneration)).unwrap();
        approve(&mut first, &id);
        set_status(&mut first, &id, PlanStatus::Executing).unwrap();

        // Superseded lines exist, so this open rewrites the file
        let mut second = PlanStore::open(temp.path()).unwrap();
        assert_eq!(second.get(&id).unwrap().unwrap().status, PlanStatus::Executing);

        set_status(&mut first, &id, PlanStatus::Completed).unwrap();
        assert_eq!(second.get(&id).unwrap().unwrap().status, PlanStatus::Completed);

        drop(first);
        drop(second);
        let mut reopened = PlanStore::open(temp.path()).unwrap();
        assert_eq!(reopened.get(&id).unwrap().unwrap().status, PlanStatus::Completed);
    }

    #[test]
    fn test_stores_see_each_others_writes() {
        let temp = tempdir().unwrap();
        let mut first = PlanStore::open(temp.path()).unwrap();
        let mut second = PlanStore::open(temp.path()).unwrap();

        let id = first.create(record(TaskType::SavePlay)).unwrap();
        assert!(second.get(&id).unwrap().is_some());
        assert!(matches!(
            second.create(first.get(&id).unwrap().unwrap()),
            Err(StoreError::Duplicate(_))
        ));

        approve(&mut second, &id);
        assert!(first.list(None).unwrap()[0].approved);
    }

    #[test]
    fn test_interrupted_execution_is_failed_on_open() {
        let temp = tempdir().unwrap();
        let mut owner = PlanStore::open(temp.path()).unwrap();
        let id = owner.create(record(TaskType::RiskAssessment)).unwrap();
        approve(&mut owner, &id);
        set_status(&mut owner, &id, PlanStatus::Executing).unwrap();

        // The owner still holds the lease
        let mut observer = PlanStore::open(temp.path()).unwrap();
        let live = observer.get(&id).unwrap().unwrap();
        assert_eq!(live.status, PlanStatus::Executing);
        assert!(live.error.is_none());

        drop(owner);
        let mut recovered = PlanStore::open(temp.path()).unwrap();
        let rec = recovered.get(&id).unwrap().unwrap();
        assert_eq!(rec.status, PlanStatus::Failed);
        assert_eq!(rec.error.as_deref(), Some(INTERRUPTED));
        assert!(!temp.path().join(LEASE_DIR).join(format!("{}.lock", id)).exists());
    }

    #[test]
    fn test_finished_execution_releases_lease() {
        let temp = tempdir().unwrap();
        let mut store = PlanStore::open(temp.path()).unwrap();
        let id = store.create(record(TaskType::AccountPlan)).unwrap();
        approve(&mut store, &id);

        set_status(&mut store, &id, PlanStatus::Executing).unwrap();
        let lease = temp.path().join(LEASE_DIR).join(format!("{}.lock", id));
        assert!(lease.exists());

        set_status(&mut store, &id, PlanStatus::Completed).unwrap();
        assert!(!lease.exists());

        drop(store);
        let mut reopened = PlanStore::open(temp.path()).unwrap();
        assert_eq!(reopened.get(&id).unwrap().unwrap().status, PlanStatus::Completed);
    }
}

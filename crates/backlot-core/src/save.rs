//! Save persistence: binary snapshot codec, atomic file store with backup
//! fallback, and the autosave/backup scheduler.
//!
//! # Wire layout (little-endian)
//!
//! ```text
//! i32 version
//! i64 timestamp
//! i32 currency_count   { i32 currency, i32 amount } x count
//! i32 grid_item_count  { i32 x, i32 y, str item_id, i32 department, i32 tier } x count
//! i32 overflow_count   { str department, i32 tier, i32 base_value } x count
//! i32 overflow_slots
//! i32 fame_level
//! f32 fame_progress
//! f32 universal_crate_timer
//! ```
//!
//! Strings are a `u32` byte length followed by UTF-8 bytes. Re-encoding a
//! decoded snapshot reproduces the input byte-for-byte.
//!
//! # File protocol
//!
//! Writes go to a temp file that atomically replaces the primary, so the
//! primary is never observable half-written. A backup copy of the primary
//! is taken on a fixed interval. Reads try the primary, fall back to the
//! backup on missing/corrupt/future-versioned data, and finally report a
//! fresh start — never a hard failure.

use crate::fixed::Seconds;
use crate::id::{CurrencyType, Department};
use std::fs;
use std::path::{Path, PathBuf};

/// Current save format version.
pub const SAVE_VERSION: i32 = 1;

// ---------------------------------------------------------------------------
// Snapshot records
// ---------------------------------------------------------------------------

/// One currency balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyRecord {
    pub currency: CurrencyType,
    pub amount: i32,
}

/// One item sitting on the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridItemRecord {
    pub x: i32,
    pub y: i32,
    pub item_id: String,
    pub department: Department,
    pub tier: i32,
}

/// One item in the overflow store. The department is kept as the persisted
/// string so unknown values survive a round-trip; it is parsed when the
/// snapshot is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowRecord {
    pub department: String,
    pub tier: i32,
    pub base_value: i32,
}

/// A point-in-time copy of the persisted state.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSnapshot {
    pub version: i32,
    pub timestamp: i64,
    pub currencies: Vec<CurrencyRecord>,
    pub grid_items: Vec<GridItemRecord>,
    pub overflow_items: Vec<OverflowRecord>,
    pub overflow_slots: i32,
    pub fame_level: i32,
    pub fame_progress: f32,
    pub universal_crate_timer: f32,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of data")]
    UnexpectedEof,
    #[error("snapshot from future version {0} (this build reads up to {SAVE_VERSION})")]
    FutureVersion(i32),
    #[error("negative element count")]
    NegativeCount,
    #[error("string is not valid UTF-8")]
    BadString,
    #[error("unknown currency type {0}")]
    UnknownCurrency(i32),
    #[error("unknown department {0}")]
    UnknownDepartment(i32),
    #[error("{0} trailing bytes after snapshot")]
    TrailingBytes(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Byte-level codec
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_str(&mut self, s: &str) {
        self.buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(s.as_bytes());
    }
}

#[derive(Debug)]
struct ByteReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.offset.checked_add(n).ok_or(DecodeError::UnexpectedEof)?;
        if end > self.buf.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn get_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn get_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn get_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn get_str(&mut self) -> Result<String, DecodeError> {
        let len = u32::from_le_bytes(self.take(4)?.try_into().unwrap()) as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::BadString)
    }

    fn get_count(&mut self) -> Result<usize, DecodeError> {
        let count = self.get_i32()?;
        usize::try_from(count).map_err(|_| DecodeError::NegativeCount)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }
}

// ---------------------------------------------------------------------------
// Snapshot codec
// ---------------------------------------------------------------------------

/// Encode a snapshot to the wire layout.
pub fn encode(snapshot: &SaveSnapshot) -> Vec<u8> {
    let mut w = ByteWriter::default();
    w.put_i32(snapshot.version);
    w.put_i64(snapshot.timestamp);

    w.put_i32(snapshot.currencies.len() as i32);
    for entry in &snapshot.currencies {
        w.put_i32(entry.currency.to_index());
        w.put_i32(entry.amount);
    }

    w.put_i32(snapshot.grid_items.len() as i32);
    for item in &snapshot.grid_items {
        w.put_i32(item.x);
        w.put_i32(item.y);
        w.put_str(&item.item_id);
        w.put_i32(item.department.to_index());
        w.put_i32(item.tier);
    }

    w.put_i32(snapshot.overflow_items.len() as i32);
    for item in &snapshot.overflow_items {
        w.put_str(&item.department);
        w.put_i32(item.tier);
        w.put_i32(item.base_value);
    }

    w.put_i32(snapshot.overflow_slots);
    w.put_i32(snapshot.fame_level);
    w.put_f32(snapshot.fame_progress);
    w.put_f32(snapshot.universal_crate_timer);
    w.buf
}

/// Decode a snapshot. Any structural problem is an error; callers treat
/// errors as corruption and fall back.
pub fn decode(bytes: &[u8]) -> Result<SaveSnapshot, DecodeError> {
    let mut r = ByteReader::new(bytes);

    let version = r.get_i32()?;
    if version > SAVE_VERSION {
        return Err(DecodeError::FutureVersion(version));
    }
    let timestamp = r.get_i64()?;

    let currency_count = r.get_count()?;
    let mut currencies = Vec::with_capacity(currency_count.min(64));
    for _ in 0..currency_count {
        let raw = r.get_i32()?;
        let currency =
            CurrencyType::from_index(raw).ok_or(DecodeError::UnknownCurrency(raw))?;
        let amount = r.get_i32()?;
        currencies.push(CurrencyRecord { currency, amount });
    }

    let grid_count = r.get_count()?;
    let mut grid_items = Vec::with_capacity(grid_count.min(1024));
    for _ in 0..grid_count {
        let x = r.get_i32()?;
        let y = r.get_i32()?;
        let item_id = r.get_str()?;
        let raw_dept = r.get_i32()?;
        let department =
            Department::from_index(raw_dept).ok_or(DecodeError::UnknownDepartment(raw_dept))?;
        let tier = r.get_i32()?;
        grid_items.push(GridItemRecord { x, y, item_id, department, tier });
    }

    let overflow_count = r.get_count()?;
    let mut overflow_items = Vec::with_capacity(overflow_count.min(1024));
    for _ in 0..overflow_count {
        let department = r.get_str()?;
        let tier = r.get_i32()?;
        let base_value = r.get_i32()?;
        overflow_items.push(OverflowRecord { department, tier, base_value });
    }

    let overflow_slots = r.get_i32()?;
    let fame_level = r.get_i32()?;
    let fame_progress = r.get_f32()?;
    let universal_crate_timer = r.get_f32()?;

    if r.remaining() > 0 {
        return Err(DecodeError::TrailingBytes(r.remaining()));
    }

    Ok(SaveSnapshot {
        version,
        timestamp,
        currencies,
        grid_items,
        overflow_items,
        overflow_slots,
        fame_level,
        fame_progress,
        universal_crate_timer,
    })
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Where a loaded snapshot came from.
#[derive(Debug, PartialEq)]
pub enum LoadOutcome {
    Primary(SaveSnapshot),
    Backup(SaveSnapshot),
    /// Neither file was usable; start fresh.
    Fresh,
}

/// Primary + backup save files with atomic replacement.
#[derive(Debug, Clone)]
pub struct SaveStore {
    primary: PathBuf,
    backup: PathBuf,
}

impl SaveStore {
    pub fn new(primary: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            backup: backup.into(),
        }
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Encode and write the snapshot: temp file first, then an atomic rename
    /// over the primary. On failure the previous primary is untouched and
    /// the error is surfaced for the caller to retry.
    pub fn write(&self, snapshot: &SaveSnapshot) -> Result<(), SaveError> {
        let bytes = encode(snapshot);
        let tmp = self.temp_path();
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.primary)?;
        Ok(())
    }

    /// Copy the primary over the backup. No-op when there is no primary yet.
    pub fn create_backup(&self) -> Result<(), SaveError> {
        if self.primary.exists() {
            fs::copy(&self.primary, &self.backup)?;
        }
        Ok(())
    }

    /// Load with the fallback chain: primary, then backup, then fresh.
    pub fn load(&self) -> LoadOutcome {
        if let Some(snapshot) = Self::try_read(&self.primary) {
            return LoadOutcome::Primary(snapshot);
        }
        if let Some(snapshot) = Self::try_read(&self.backup) {
            return LoadOutcome::Backup(snapshot);
        }
        LoadOutcome::Fresh
    }

    pub fn has_save(&self) -> bool {
        self.primary.exists() || self.backup.exists()
    }

    fn try_read(path: &Path) -> Option<SaveSnapshot> {
        let bytes = fs::read(path).ok()?;
        decode(&bytes).ok()
    }

    fn temp_path(&self) -> PathBuf {
        let mut os = self.primary.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Which periodic actions came due this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveDue {
    pub autosave: bool,
    pub backup: bool,
}

/// Autosave/backup cadence plus the mutual-exclusion flag for in-flight
/// saves. A request arriving while a save is in flight is dropped, not
/// queued; nothing here ever blocks a tick.
#[derive(Debug)]
pub struct SaveScheduler {
    autosave_interval: Seconds,
    backup_interval: Seconds,
    since_autosave: Seconds,
    since_backup: Seconds,
    in_flight: bool,
}

impl SaveScheduler {
    pub fn new(autosave_interval: Seconds, backup_interval: Seconds) -> Self {
        Self {
            autosave_interval,
            backup_interval,
            since_autosave: Seconds::ZERO,
            since_backup: Seconds::ZERO,
            in_flight: false,
        }
    }

    /// Advance the timers; a due flag resets its timer.
    pub fn advance(&mut self, dt: Seconds) -> SaveDue {
        let mut due = SaveDue::default();
        self.since_autosave += dt;
        self.since_backup += dt;
        if self.since_autosave >= self.autosave_interval {
            self.since_autosave = Seconds::ZERO;
            due.autosave = true;
        }
        if self.since_backup >= self.backup_interval {
            self.since_backup = Seconds::ZERO;
            due.backup = true;
        }
        due
    }

    /// Claim the save slot. `false` means a save is already in flight and
    /// this request is dropped.
    pub fn begin_save(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish_save(&mut self) {
        self.in_flight = false;
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> SaveSnapshot {
        SaveSnapshot {
            version: SAVE_VERSION,
            timestamp: 1_765_000_123,
            currencies: vec![
                CurrencyRecord { currency: CurrencyType::Money, amount: 1450 },
                CurrencyRecord { currency: CurrencyType::Gems, amount: 12 },
                CurrencyRecord { currency: CurrencyType::Tickets, amount: 0 },
            ],
            grid_items: vec![
                GridItemRecord {
                    x: 0,
                    y: 3,
                    item_id: "camera_t2".to_string(),
                    department: Department::Camera,
                    tier: 1,
                },
                GridItemRecord {
                    x: 4,
                    y: 6,
                    item_id: "boom_t1".to_string(),
                    department: Department::Sound,
                    tier: 0,
                },
            ],
            overflow_items: vec![OverflowRecord {
                department: "Art".to_string(),
                tier: 2,
                base_value: 40,
            }],
            overflow_slots: 4,
            fame_level: 3,
            fame_progress: 41.5,
            universal_crate_timer: 1.25,
        }
    }

    // -----------------------------------------------------------------------
    // Codec
    // -----------------------------------------------------------------------

    #[test]
    fn encode_decode_round_trip() {
        let snapshot = sample_snapshot();
        let decoded = decode(&encode(&snapshot)).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn re_encoding_is_byte_stable() {
        let snapshot = sample_snapshot();
        let bytes = encode(&snapshot);
        let bytes2 = encode(&decode(&bytes).unwrap());
        assert_eq!(bytes, bytes2);
    }

    #[test]
    fn empty_sections_round_trip() {
        let snapshot = SaveSnapshot {
            version: SAVE_VERSION,
            timestamp: 0,
            currencies: vec![],
            grid_items: vec![],
            overflow_items: vec![],
            overflow_slots: 0,
            fame_level: 1,
            fame_progress: 0.0,
            universal_crate_timer: 0.0,
        };
        assert_eq!(decode(&encode(&snapshot)).unwrap(), snapshot);
    }

    #[test]
    fn truncated_data_is_an_error() {
        let bytes = encode(&sample_snapshot());
        for cut in [0, 1, 4, 12, bytes.len() - 1] {
            assert!(matches!(
                decode(&bytes[..cut]),
                Err(DecodeError::UnexpectedEof)
            ));
        }
    }

    #[test]
    fn future_version_is_an_error() {
        let mut snapshot = sample_snapshot();
        snapshot.version = SAVE_VERSION + 1;
        assert!(matches!(
            decode(&encode(&snapshot)),
            Err(DecodeError::FutureVersion(_))
        ));
    }

    #[test]
    fn negative_count_is_an_error() {
        let mut w = ByteWriter::default();
        w.put_i32(SAVE_VERSION);
        w.put_i64(0);
        w.put_i32(-1); // currency count
        assert!(matches!(decode(&w.buf), Err(DecodeError::NegativeCount)));
    }

    #[test]
    fn unknown_currency_is_an_error() {
        let mut w = ByteWriter::default();
        w.put_i32(SAVE_VERSION);
        w.put_i64(0);
        w.put_i32(1);
        w.put_i32(77); // no such currency
        w.put_i32(100);
        assert!(matches!(decode(&w.buf), Err(DecodeError::UnknownCurrency(77))));
    }

    #[test]
    fn trailing_bytes_are_an_error() {
        let mut bytes = encode(&sample_snapshot());
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(DecodeError::TrailingBytes(1))));
    }

    #[test]
    fn string_length_prefix_is_u32_le() {
        let snapshot = SaveSnapshot {
            version: SAVE_VERSION,
            timestamp: 0,
            currencies: vec![],
            grid_items: vec![GridItemRecord {
                x: 0,
                y: 0,
                item_id: "ab".to_string(),
                department: Department::Camera,
                tier: 0,
            }],
            overflow_items: vec![],
            overflow_slots: 0,
            fame_level: 1,
            fame_progress: 0.0,
            universal_crate_timer: 0.0,
        };
        let bytes = encode(&snapshot);
        // version(4) + timestamp(8) + currency_count(4) + grid_count(4)
        // + x(4) + y(4) = offset 28 for the string.
        assert_eq!(&bytes[28..32], &2u32.to_le_bytes());
        assert_eq!(&bytes[32..34], b"ab");
    }

    // -----------------------------------------------------------------------
    // File store
    // -----------------------------------------------------------------------

    fn temp_store(tag: &str) -> SaveStore {
        let dir = std::env::temp_dir().join(format!("backlot_save_test_{tag}_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        SaveStore::new(dir.join("backlot_save.dat"), dir.join("backlot_backup.dat"))
    }

    fn cleanup(store: &SaveStore) {
        if let Some(dir) = store.primary_path().parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn write_then_load_primary() {
        let store = temp_store("write_load");
        let snapshot = sample_snapshot();
        store.write(&snapshot).unwrap();
        assert_eq!(store.load(), LoadOutcome::Primary(snapshot));
        assert!(store.has_save());
        cleanup(&store);
    }

    #[test]
    fn missing_files_load_fresh() {
        let store = temp_store("fresh");
        assert_eq!(store.load(), LoadOutcome::Fresh);
        assert!(!store.has_save());
        cleanup(&store);
    }

    #[test]
    fn corrupt_primary_falls_back_to_backup() {
        let store = temp_store("fallback");
        let snapshot = sample_snapshot();
        store.write(&snapshot).unwrap();
        store.create_backup().unwrap();

        fs::write(store.primary_path(), b"garbage").unwrap();
        assert_eq!(store.load(), LoadOutcome::Backup(snapshot));
        cleanup(&store);
    }

    #[test]
    fn corrupt_primary_and_backup_load_fresh() {
        let store = temp_store("double_corrupt");
        fs::write(store.primary_path(), b"garbage").unwrap();
        fs::write(store.backup_path(), b"more garbage").unwrap();
        assert_eq!(store.load(), LoadOutcome::Fresh);
        cleanup(&store);
    }

    #[test]
    fn future_versioned_primary_falls_back() {
        let store = temp_store("future");
        let mut snapshot = sample_snapshot();
        store.write(&snapshot).unwrap();
        store.create_backup().unwrap();

        snapshot.version = SAVE_VERSION + 5;
        fs::write(store.primary_path(), encode(&snapshot)).unwrap();

        let expected = sample_snapshot();
        assert_eq!(store.load(), LoadOutcome::Backup(expected));
        cleanup(&store);
    }

    #[test]
    fn rewrite_replaces_previous_save() {
        let store = temp_store("rewrite");
        let mut snapshot = sample_snapshot();
        store.write(&snapshot).unwrap();

        snapshot.fame_level = 9;
        store.write(&snapshot).unwrap();
        match store.load() {
            LoadOutcome::Primary(loaded) => assert_eq!(loaded.fame_level, 9),
            other => panic!("expected primary load, got {other:?}"),
        }
        cleanup(&store);
    }

    #[test]
    fn backup_without_primary_is_noop() {
        let store = temp_store("backup_noop");
        store.create_backup().unwrap();
        assert!(!store.backup_path().exists());
        cleanup(&store);
    }

    // -----------------------------------------------------------------------
    // Scheduler
    // -----------------------------------------------------------------------

    #[test]
    fn intervals_come_due_and_reset() {
        let mut scheduler = SaveScheduler::new(Seconds::from_num(30), Seconds::from_num(90));

        let due = scheduler.advance(Seconds::from_num(29));
        assert_eq!(due, SaveDue::default());

        let due = scheduler.advance(Seconds::from_num(1));
        assert!(due.autosave);
        assert!(!due.backup);

        // Timer reset: another 30 seconds to the next autosave, and the
        // backup fires at its own cadence.
        let due = scheduler.advance(Seconds::from_num(30));
        assert!(due.autosave);
        let due = scheduler.advance(Seconds::from_num(30));
        assert!(due.autosave);
        assert!(due.backup);
    }

    #[test]
    fn concurrent_save_requests_are_dropped() {
        let mut scheduler = SaveScheduler::new(Seconds::from_num(30), Seconds::from_num(90));
        assert!(scheduler.begin_save());
        // A request while one is in flight is dropped, not queued.
        assert!(!scheduler.begin_save());
        scheduler.finish_save();
        assert!(scheduler.begin_save());
    }
}

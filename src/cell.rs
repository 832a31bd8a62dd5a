//! Typed, observable views over single storage slots.
//!
//! [`LocalStorage`] hands out one [`PersistentCell`] per key. A cell starts
//! with its default value and `is_loading = true`, hydrates from the storage
//! area in the background, and from then on:
//!
//! - local writes are applied and published to every subscriber before the
//!   write call returns, then persisted in issue order by the cell's task;
//! - changes announced on the storage area's feed by other origins (other
//!   tabs, other processes) are read back from storage and replace the local
//!   value once no local write is in flight. Echoes of the cell's own writes
//!   are ignored, so writes under a [`LocalStorage`]'s origin must go through
//!   its cells.
//!
//! Updaters run while the cell is locked. They must not call back into the
//! same cell, and subscribers must not hold a `borrow()` across a write.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::storage::{StorageArea, StorageEvent};

/// Anything that can live in a storage slot.
pub trait SlotValue:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> SlotValue for T where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// What observers of a cell see.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub value: T,
    pub is_loading: bool,
}

/// A write to a cell: either a literal value or a function of the current one.
pub enum Write<T> {
    Replace(T),
    Update(Arc<dyn Fn(&T) -> T + Send + Sync>),
}

impl<T: Clone> Write<T> {
    pub fn update(f: impl Fn(&T) -> T + Send + Sync + 'static) -> Self {
        Write::Update(Arc::new(f))
    }

    fn apply(&self, current: &T) -> T {
        match self {
            Write::Replace(value) => value.clone(),
            Write::Update(f) => f(current),
        }
    }
}

enum PersistOp {
    Store(String),
    Flush(oneshot::Sender<()>),
}

struct CellState<T> {
    value: T,
    is_loading: bool,
    /// Writes made before hydration finished, replayed on the loaded value.
    pending: Vec<Write<T>>,
    /// Local writes queued for storage but not yet written.
    unsynced: usize,
    /// A storage change was skipped while local writes were in flight.
    stale: bool,
}

struct CellInner<T> {
    key: String,
    default: T,
    state: Mutex<CellState<T>>,
    snapshots: watch::Sender<Snapshot<T>>,
    ops: mpsc::UnboundedSender<PersistOp>,
}

impl<T: SlotValue> CellInner<T> {
    fn publish(&self, state: &CellState<T>) {
        self.snapshots.send_replace(Snapshot {
            value: state.value.clone(),
            is_loading: state.is_loading,
        });
    }

    fn persist(&self, state: &mut CellState<T>) {
        let raw = match serde_json::to_string(&state.value) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to serialize slot '{}': {}", self.key, e);
                return;
            }
        };

        if self.ops.send(PersistOp::Store(raw)).is_ok() {
            state.unsynced += 1;
        } else {
            log::error!("Slot '{}' has no writer, change not persisted", self.key);
        }
    }

    fn write(&self, write: Write<T>) {
        let mut state = self.state.lock();
        let next = write.apply(&state.value);

        if state.is_loading {
            state.pending.push(write);
            if next != state.value {
                state.value = next;
                self.publish(&state);
            }
            return;
        }

        if next == state.value {
            return;
        }

        state.value = next;
        self.publish(&state);
        self.persist(&mut state);
    }

    fn hydrate(&self, loaded: T) {
        let mut state = self.state.lock();
        if !state.is_loading {
            return;
        }

        let pending = std::mem::take(&mut state.pending);
        let mut value = loaded;
        for write in &pending {
            value = write.apply(&value);
        }

        state.value = value;
        state.is_loading = false;

        if !pending.is_empty() {
            log::debug!(
                "Slot '{}' replayed {} write(s) made while loading",
                self.key,
                pending.len()
            );
            self.persist(&mut state);
        }

        self.publish(&state);
    }

    /// Returns true when a skipped storage change should now be re-read.
    fn persisted(&self) -> bool {
        let mut state = self.state.lock();
        state.unsynced = state.unsynced.saturating_sub(1);
        state.unsynced == 0 && std::mem::take(&mut state.stale)
    }

    fn apply_stored(&self, raw: Option<String>) {
        let value = decode(&self.key, raw, &self.default);

        let mut state = self.state.lock();
        if state.unsynced > 0 {
            state.stale = true;
            return;
        }
        if state.is_loading || value == state.value {
            return;
        }

        state.value = value;
        self.publish(&state);
    }

    fn mark_stale(&self) -> bool {
        let mut state = self.state.lock();
        if state.unsynced > 0 {
            state.stale = true;
            false
        } else {
            true
        }
    }
}

fn decode<T: SlotValue>(key: &str, raw: Option<String>, default: &T) -> T {
    let Some(raw) = raw else {
        return default.clone();
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Slot '{}' holds unreadable data, using default: {}", key, e);
            default.clone()
        }
    }
}

async fn read_raw(area: &dyn StorageArea, key: &str) -> Option<String> {
    match area.get_item(key).await {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Failed to read slot '{}', using default: {}", key, e);
            None
        }
    }
}

async fn resync<T: SlotValue>(cell: &Weak<CellInner<T>>, area: &dyn StorageArea, key: &str) {
    let raw = read_raw(area, key).await;
    if let Some(cell) = cell.upgrade() {
        cell.apply_stored(raw);
    }
}

/// Hydrates the cell, then serves its persistence queue and the storage
/// change feed until the cell is dropped.
async fn run_slot<T: SlotValue>(
    cell: Weak<CellInner<T>>,
    area: Arc<dyn StorageArea>,
    key: String,
    origin: Uuid,
    mut ops: mpsc::UnboundedReceiver<PersistOp>,
    mut feed: broadcast::Receiver<StorageEvent>,
) {
    let raw = read_raw(&*area, &key).await;
    match cell.upgrade() {
        Some(inner) => {
            let loaded = decode(&key, raw, &inner.default);
            inner.hydrate(loaded);
        }
        None => return,
    }

    let mut feed_open = true;

    loop {
        tokio::select! {
            op = ops.recv() => match op {
                Some(PersistOp::Store(raw)) => {
                    if let Err(e) = area.set_item(&key, &raw, origin).await {
                        log::error!("Failed to persist slot '{}': {}", key, e);
                    }
                    let needs_resync = cell.upgrade().is_some_and(|inner| inner.persisted());
                    if needs_resync {
                        resync(&cell, &*area, &key).await;
                    }
                }
                Some(PersistOp::Flush(done)) => {
                    let _ = done.send(());
                }
                None => break,
            },
            event = feed.recv(), if feed_open => match event {
                // Local writes are already applied, their echo can only be older.
                Ok(event) if event.key == key && event.origin == origin => {}
                Ok(event) if event.key == key => {
                    if cell.strong_count() == 0 {
                        break;
                    }
                    // The payload may predate a local write persisted since.
                    log::debug!("Slot '{}' changed elsewhere ({})", key, event.origin);
                    resync(&cell, &*area, &key).await;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Slot '{}' missed {} storage change(s), re-reading", key, skipped);
                    let now = cell.upgrade().is_some_and(|inner| inner.mark_stale());
                    if now {
                        resync(&cell, &*area, &key).await;
                    }
                }
                Err(RecvError::Closed) => feed_open = false,
            },
        }
    }

    log::debug!("Slot '{}' closed", key);
}

/// Shared, typed handle to one storage slot. Clones observe the same value.
pub struct PersistentCell<T: SlotValue> {
    inner: Arc<CellInner<T>>,
}

impl<T: SlotValue> Clone for PersistentCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: SlotValue> PersistentCell<T> {
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Current value and whether the initial load is still running.
    pub fn read(&self) -> (T, bool) {
        let state = self.inner.state.lock();
        (state.value.clone(), state.is_loading)
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        let (value, is_loading) = self.read();
        Snapshot { value, is_loading }
    }

    pub fn get(&self) -> T {
        self.inner.state.lock().value.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().is_loading
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.state.lock().value)
    }

    pub fn set(&self, value: T) {
        self.inner.write(Write::Replace(value));
    }

    pub fn update(&self, f: impl Fn(&T) -> T + Send + Sync + 'static) {
        self.inner.write(Write::update(f));
    }

    pub fn write(&self, write: Write<T>) {
        self.inner.write(write);
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.inner.snapshots.subscribe()
    }

    /// Resolves once the initial load has finished.
    pub async fn ready(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|snapshot| !snapshot.is_loading).await;
    }

    /// Resolves once every write issued so far has reached storage.
    pub async fn flush(&self) {
        let (done, rx) = oneshot::channel();
        if self.inner.ops.send(PersistOp::Flush(done)).is_ok() {
            let _ = rx.await;
        }
    }
}

/// Per-process view of a storage area: one origin id and one cell per key.
pub struct LocalStorage {
    area: Arc<dyn StorageArea>,
    origin: Uuid,
    slots: Mutex<HashMap<String, Weak<dyn Any + Send + Sync>>>,
}

impl LocalStorage {
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self {
            area,
            origin: Uuid::new_v4(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn area(&self) -> &Arc<dyn StorageArea> {
        &self.area
    }

    /// The shared cell for `key`, opening it with `default` if nobody holds
    /// it yet. Must be called from within a tokio runtime.
    pub fn slot<T: SlotValue>(&self, key: &str, default: T) -> Result<PersistentCell<T>> {
        let mut slots = self.slots.lock();

        if let Some(existing) = slots.get(key).and_then(Weak::upgrade) {
            return existing
                .downcast::<CellInner<T>>()
                .map(|inner| PersistentCell { inner })
                .map_err(|_| AppError::SlotType(key.to_string()));
        }

        let runtime = Handle::try_current().map_err(|_| {
            AppError::Internal(format!(
                "storage slot '{}' opened outside an async runtime",
                key
            ))
        })?;

        let (ops, ops_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(Snapshot {
            value: default.clone(),
            is_loading: true,
        });

        let inner = Arc::new(CellInner {
            key: key.to_string(),
            default: default.clone(),
            state: Mutex::new(CellState {
                value: default,
                is_loading: true,
                pending: Vec::new(),
                unsynced: 0,
                stale: false,
            }),
            snapshots,
            ops,
        });

        runtime.spawn(run_slot(
            Arc::downgrade(&inner),
            self.area.clone(),
            key.to_string(),
            self.origin,
            ops_rx,
            self.area.subscribe(),
        ));

        let erased: Arc<dyn Any + Send + Sync> = inner.clone();
        slots.retain(|_, slot| slot.strong_count() > 0);
        slots.insert(key.to_string(), Arc::downgrade(&erased));

        log::debug!("Opened storage slot '{}'", key);
        Ok(PersistentCell { inner })
    }
}

use crate::catalog::PollCatalog;
use crate::error::CoreError;
use crate::manager::{Outcome, PollStateManager};
use dashmap::DashMap;
use pollroom_models::{Command, PollCollectionState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const MAX_ROOM_NAME_LEN: usize = 64;

/// How long an empty room keeps its state before it is discarded.
pub const DEFAULT_ROOM_IDLE_TTL: Duration = Duration::from_secs(300);

/// Encoded snapshot shared by every recipient of one resync.
pub type SnapshotFrame = Arc<str>;

pub fn validate_room_name(name: &str) -> Result<(), CoreError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_ROOM_NAME_LEN
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidRoomName(name.to_string()))
    }
}

fn encode(state: &PollCollectionState) -> Result<SnapshotFrame, CoreError> {
    Ok(serde_json::to_string(state)?.into())
}

/// One live session: its poll state plus the fan-out channel to participants.
///
/// Commands are applied and broadcast while holding the state lock, so the
/// order of resyncs on the channel always matches the order of mutations.
pub struct Room {
    name: String,
    state: Mutex<PollStateManager>,
    sender: broadcast::Sender<SnapshotFrame>,
    /// Bumped each time the room becomes empty; a pending discard only
    /// fires if no one came and went since it was scheduled.
    idle_epoch: AtomicU64,
}

/// Handed to a connection when it joins a room.
pub struct Membership {
    pub room: Arc<Room>,
    pub snapshot: SnapshotFrame,
    pub updates: broadcast::Receiver<SnapshotFrame>,
}

impl Room {
    pub fn new(name: impl Into<String>, manager: PollStateManager, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name: name.into(),
            state: Mutex::new(manager),
            sender,
            idle_epoch: AtomicU64::new(0),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PollStateManager> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current snapshot plus a receiver for every resync after it.
    pub fn subscribe(
        &self,
    ) -> Result<(SnapshotFrame, broadcast::Receiver<SnapshotFrame>), CoreError> {
        let state = self.lock_state();
        let snapshot = encode(&state.snapshot())?;
        Ok((snapshot, self.sender.subscribe()))
    }

    /// Next frame for a participant, or `None` once the room is gone.
    ///
    /// A receiver that fell behind is swapped for a fresh subscription and
    /// handed the current snapshot, so the stale backlog is never delivered.
    pub async fn next_frame(
        &self,
        updates: &mut broadcast::Receiver<SnapshotFrame>,
    ) -> Result<Option<SnapshotFrame>, CoreError> {
        match updates.recv().await {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(room = %self.name, skipped, "participant lagged; resending snapshot");
                let (frame, fresh) = self.subscribe()?;
                *updates = fresh;
                Ok(Some(frame))
            }
            Err(RecvError::Closed) => Ok(None),
        }
    }

    pub fn snapshot(&self) -> PollCollectionState {
        self.lock_state().snapshot()
    }

    pub fn encoded_snapshot(&self) -> Result<SnapshotFrame, CoreError> {
        encode(&self.lock_state().snapshot())
    }

    /// Apply a command; an accepted one is resynced to every participant exactly once.
    ///
    /// The command runs against a copy that is committed only once its
    /// snapshot has been encoded, so state never moves without a resync.
    pub fn dispatch(&self, command: &Command) -> Result<Outcome, CoreError> {
        let mut state = self.lock_state();
        let mut next = state.clone();
        let outcome = next.apply(command);
        if outcome.is_accepted() {
            let frame = encode(&next.snapshot())?;
            *state = next;
            // No receivers is fine; the next joiner gets a fresh snapshot.
            let recipients = self.sender.send(frame).unwrap_or(0);
            tracing::debug!(
                room = %self.name,
                command = command.kind(),
                poll_id = command.poll_id(),
                recipients,
                "state resynchronized"
            );
        }
        Ok(outcome)
    }

    pub fn participant_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn mark_idle(&self) -> u64 {
        self.idle_epoch.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn idle_since(&self, epoch: u64) -> bool {
        self.participant_count() == 0 && self.idle_epoch.load(Ordering::Relaxed) == epoch
    }
}

fn discard_if_idle(rooms: &DashMap<String, Arc<Room>>, name: &str, epoch: u64) {
    if rooms
        .remove_if(name, |_, room| room.idle_since(epoch))
        .is_some()
    {
        tracing::info!(room = %name, "room closed");
    }
}

/// All live rooms in this process. Rooms never share state with each other.
pub struct RoomRegistry {
    catalog: PollCatalog,
    capacity: usize,
    idle_ttl: Duration,
    rooms: Arc<DashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new(catalog: PollCatalog, capacity: usize) -> Result<Self, CoreError> {
        catalog.validate()?;
        Ok(Self {
            catalog,
            capacity,
            idle_ttl: DEFAULT_ROOM_IDLE_TTL,
            rooms: Arc::new(DashMap::new()),
        })
    }

    /// Grace period an empty room survives, so a participant who reconnects
    /// finds the state they left. Zero discards empty rooms immediately.
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Join `name`, creating it from the catalog if it is not live.
    pub fn join(&self, name: &str) -> Result<Membership, CoreError> {
        validate_room_name(name)?;

        // Subscribing under the map entry keeps a pending discard from
        // removing the room between lookup and subscription.
        let entry = self.rooms.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(room = %name, "room created");
            Arc::new(Room::new(
                name,
                PollStateManager::seed(&self.catalog),
                self.capacity,
            ))
        });
        let room = Arc::clone(entry.value());
        let (snapshot, updates) = room.subscribe()?;
        drop(entry);

        Ok(Membership {
            room,
            snapshot,
            updates,
        })
    }

    /// Called after a participant dropped its receiver. Once the room is
    /// empty it is discarded after the idle grace period, unless someone
    /// joins in the meantime. State is never persisted.
    ///
    /// With a non-zero grace period this must run inside a tokio runtime.
    pub fn leave(&self, name: &str) {
        let epoch = match self.rooms.get(name) {
            Some(room) if room.participant_count() == 0 => room.mark_idle(),
            _ => return,
        };

        if self.idle_ttl.is_zero() {
            discard_if_idle(&self.rooms, name, epoch);
            return;
        }

        tracing::debug!(room = %name, idle_ttl = ?self.idle_ttl, "room idle");
        let rooms = Arc::clone(&self.rooms);
        let name = name.to_string();
        let delay = self.idle_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            discard_if_idle(&rooms, &name, epoch);
        });
    }

    pub fn get(&self, name: &str) -> Option<Arc<Room>> {
        self.rooms.get(name).map(|room| Arc::clone(room.value()))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::document::{PlayerSlot, RoomDocument};
use crate::error::{GameError, Result};
use crate::rules::{GameRules, Mover};
use crate::store::RoomStore;

/// One player's view of a shared room.
///
/// The session owns the cached document. `refresh` and `submit_move` hold
/// the cache lock for their whole fetch or read-merge-write, so local
/// operations never interleave. Writes from the other client can still be
/// overwritten: every write replaces the whole remote document based on the
/// cached copy, and there is no version check on the store side.
pub struct RoomSession<G: GameRules> {
    inner: Arc<SessionInner>,
    _rules: PhantomData<fn() -> G>,
}

struct SessionInner {
    room_id: String,
    store: Arc<dyn RoomStore>,
    cache: Mutex<RoomDocument>,
    view: watch::Sender<RoomDocument>,
    closed: AtomicBool,
}

impl<G: GameRules> Clone for RoomSession<G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _rules: PhantomData,
        }
    }
}

impl<G: GameRules> RoomSession<G> {
    /// Joins `room_id` when given, otherwise creates a room seeded by the
    /// game rules
    pub async fn join_or_create(store: Arc<dyn RoomStore>, room_id: Option<&str>) -> Result<Self> {
        match room_id {
            Some(id) => Self::join(store, id).await,
            None => Self::create(store).await,
        }
    }

    pub async fn create(store: Arc<dyn RoomStore>) -> Result<Self> {
        let created = store.create(&G::seed()).await?;
        tracing::info!(
            room_id = %created.room_id,
            game = G::NAME,
            "Created new room"
        );
        Ok(Self::with_document(store, created.room_id, created.game_state))
    }

    pub async fn join(store: Arc<dyn RoomStore>, room_id: &str) -> Result<Self> {
        let document = store.fetch(room_id).await?;
        tracing::info!(room_id = %room_id, game = G::NAME, "Joined room");
        Ok(Self::with_document(store, room_id.to_string(), document))
    }

    fn with_document(store: Arc<dyn RoomStore>, room_id: String, document: RoomDocument) -> Self {
        let (view, _) = watch::channel(document.clone());
        Self {
            inner: Arc::new(SessionInner {
                room_id,
                store,
                cache: Mutex::new(document),
                view,
                closed: AtomicBool::new(false),
            }),
            _rules: PhantomData,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.inner.room_id
    }

    /// Last document this session accepted
    pub async fn document(&self) -> RoomDocument {
        self.inner.cache.lock().await.clone()
    }

    /// Observes every accepted change of the local view
    pub fn subscribe(&self) -> watch::Receiver<RoomDocument> {
        self.inner.view.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Ends the session. Results of requests still in flight are dropped.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(room_id = %self.inner.room_id, "Room session closed");
        }
    }

    /// Replaces the local view with the remote document.
    ///
    /// Failures are logged and the previous view is kept; the returned
    /// document is whatever the session holds afterwards.
    pub async fn refresh(&self) -> RoomDocument {
        let mut cached = self.inner.cache.lock().await;

        match self.inner.store.fetch(&self.inner.room_id).await {
            Ok(remote) if !self.is_closed() => {
                if *cached != remote {
                    tracing::debug!(room_id = %self.inner.room_id, "Remote room changed");
                }
                *cached = remote;
                self.publish(&cached);
            }
            Ok(_) => {
                tracing::debug!(
                    room_id = %self.inner.room_id,
                    "Discarding refresh result after close"
                );
            }
            Err(e) => {
                tracing::warn!(
                    room_id = %self.inner.room_id,
                    error = %e,
                    "Room refresh failed, keeping previous view"
                );
            }
        }

        cached.clone()
    }

    /// Seats `player_id` without making a move. A player already seated
    /// gets their seat back without a write.
    pub async fn claim_seat(&self, player_id: &str) -> Result<PlayerSlot> {
        let mut cached = self.inner.cache.lock().await;
        self.ensure_open()?;

        if let Some(slot) = cached.players.slot_of(player_id) {
            return Ok(slot);
        }

        let mut next = cached.clone();
        let slot = next
            .players
            .claim(player_id)
            .ok_or_else(|| GameError::RoomFull(player_id.to_string()))?;

        self.write(&mut cached, next).await?;
        tracing::info!(
            room_id = %self.inner.room_id,
            player = %player_id,
            %slot,
            "Player took a seat"
        );
        Ok(slot)
    }

    /// Applies the local player's move on top of the cached document and
    /// writes the merged document back.
    ///
    /// The player is seated first if needed. Rejections and transport
    /// failures leave both the cache and the remote document untouched,
    /// with one exception: a newcomer turned away with `WaitingForOpponent`
    /// keeps the seat, so the opponent can find them and the game can start.
    pub async fn submit_move(&self, player_id: &str, mv: G::Move) -> Result<RoomDocument> {
        let mut cached = self.inner.cache.lock().await;
        self.ensure_open()?;

        let mut seated = cached.clone();
        let slot = seated
            .players
            .claim(player_id)
            .ok_or_else(|| GameError::RoomFull(player_id.to_string()))?;
        let newly_seated = seated.players != cached.players;

        let mut next = seated.clone();
        if let Err(e) = G::apply(&mut next, Mover { id: player_id, slot }, &mv) {
            tracing::debug!(
                room_id = %self.inner.room_id,
                player = %player_id,
                ?mv,
                error = %e,
                "Move rejected"
            );

            if newly_seated && matches!(e, GameError::WaitingForOpponent) {
                self.write(&mut cached, seated).await?;
                tracing::info!(
                    room_id = %self.inner.room_id,
                    player = %player_id,
                    %slot,
                    "Player took a seat"
                );
            }
            return Err(e);
        }

        let written = self.write(&mut cached, next).await?;
        tracing::info!(
            room_id = %self.inner.room_id,
            player = %player_id,
            %slot,
            ?mv,
            game = G::NAME,
            "Move accepted"
        );
        Ok(written)
    }

    /// Starts refreshing on `interval` in a background task
    pub fn start_polling(&self, interval: Duration) -> PollHandle {
        let session = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the session already
            // holds a fresh document at this point
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if session.is_closed() {
                    break;
                }
                session.refresh().await;
            }

            tracing::debug!(room_id = %session.room_id(), "Room polling stopped");
        });

        tracing::debug!(
            room_id = %self.inner.room_id,
            interval_ms = interval.as_millis() as u64,
            "Room polling started"
        );
        PollHandle { task: Some(task) }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(GameError::SessionClosed);
        }
        Ok(())
    }

    /// Writes `next` to the store and adopts it locally once the store
    /// accepted it. A room missing on write is reported as `Transport`,
    /// like any other failed write.
    ///
    /// A write that lands after `close()` is still returned to the caller,
    /// but the local view is left as it was.
    async fn write(&self, cached: &mut RoomDocument, next: RoomDocument) -> Result<RoomDocument> {
        self.inner
            .store
            .replace(&self.inner.room_id, &next)
            .await
            .map_err(|e| match e {
                GameError::RoomNotFound(id) => {
                    GameError::Transport(format!("Room {} disappeared before the write", id))
                }
                other => other,
            })?;

        if self.is_closed() {
            tracing::debug!(
                room_id = %self.inner.room_id,
                "Write landed after close, local view left as is"
            );
            return Ok(next);
        }

        *cached = next.clone();
        self.publish(cached);
        Ok(next)
    }

    fn publish(&self, document: &RoomDocument) {
        self.inner.view.send_replace(document.clone());
    }
}

/// Owns the background poll task; stopping or dropping it aborts the task
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn stop(mut self) {
        self.abort();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Mark;
    use crate::rules::{Cell, Hand, RockPaperScissors, TicTacToe};
    use crate::store::{CreatedRoom, MemoryRoomStore};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Wraps a memory store and fails on demand
    struct FlakyStore {
        inner: Arc<MemoryRoomStore>,
        fail_fetch: AtomicBool,
        fail_replace: AtomicBool,
        lose_room_on_replace: AtomicBool,
        replaces: AtomicUsize,
    }

    impl FlakyStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryRoomStore::new(),
                fail_fetch: AtomicBool::new(false),
                fail_replace: AtomicBool::new(false),
                lose_room_on_replace: AtomicBool::new(false),
                replaces: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RoomStore for FlakyStore {
        async fn create(&self, initial_state: &RoomDocument) -> Result<CreatedRoom> {
            self.inner.create(initial_state).await
        }

        async fn fetch(&self, room_id: &str) -> Result<RoomDocument> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(GameError::transport("connection reset"));
            }
            self.inner.fetch(room_id).await
        }

        async fn replace(&self, room_id: &str, state: &RoomDocument) -> Result<()> {
            if self.fail_replace.load(Ordering::SeqCst) {
                return Err(GameError::transport("connection reset"));
            }
            if self.lose_room_on_replace.load(Ordering::SeqCst) {
                return Err(GameError::RoomNotFound(room_id.to_string()));
            }
            self.replaces.fetch_add(1, Ordering::SeqCst);
            self.inner.replace(room_id, state).await
        }
    }

    /// Holds every write until the test releases it
    struct GatedStore {
        inner: Arc<MemoryRoomStore>,
        entered: Notify,
        release: Notify,
    }

    impl GatedStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryRoomStore::new(),
                entered: Notify::new(),
                release: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl RoomStore for GatedStore {
        async fn create(&self, initial_state: &RoomDocument) -> Result<CreatedRoom> {
            self.inner.create(initial_state).await
        }

        async fn fetch(&self, room_id: &str) -> Result<RoomDocument> {
            self.inner.fetch(room_id).await
        }

        async fn replace(&self, room_id: &str, state: &RoomDocument) -> Result<()> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.replace(room_id, state).await
        }
    }

    async fn tic_tac_toe_pair() -> (Arc<MemoryRoomStore>, RoomSession<TicTacToe>, RoomSession<TicTacToe>) {
        let store = MemoryRoomStore::new();
        let a = RoomSession::<TicTacToe>::create(store.clone()).await.unwrap();
        let b = RoomSession::<TicTacToe>::join(store.clone(), a.room_id()).await.unwrap();
        (store, a, b)
    }

    #[tokio::test]
    async fn test_fresh_room_scenario() {
        let (_store, a, b) = tic_tac_toe_pair().await;

        let fresh = a.document().await;
        assert_eq!(fresh.players.player1, None);
        assert_eq!(fresh.players.player2, None);
        assert_eq!(fresh.current_turn, Some(PlayerSlot::Player1));
        assert_eq!(fresh.board, Some([[None; 3]; 3]));

        let doc = a.submit_move("alice", Cell::new(0, 0)).await.unwrap();
        assert_eq!(doc.players.player1.as_deref(), Some("alice"));
        assert_eq!(doc.board.unwrap()[0][0], Some(Mark::X));
        assert_eq!(doc.current_turn, Some(PlayerSlot::Player2));

        b.refresh().await;
        let doc = b.submit_move("bob", Cell::new(1, 1)).await.unwrap();
        assert_eq!(doc.players.player2.as_deref(), Some("bob"));
        assert_eq!(doc.board.unwrap()[1][1], Some(Mark::O));
        assert_eq!(doc.current_turn, Some(PlayerSlot::Player1));
    }

    #[tokio::test]
    async fn test_join_unknown_room() {
        let store = MemoryRoomStore::new();
        let result = RoomSession::<TicTacToe>::join_or_create(store, Some("424242")).await;
        assert!(matches!(result, Err(GameError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_join_or_create_without_id_creates() {
        let store = MemoryRoomStore::new();
        let session = RoomSession::<RockPaperScissors>::join_or_create(store.clone(), None)
            .await
            .unwrap();
        assert_eq!(store.room_count().await, 1);
        assert_eq!(session.document().await, RockPaperScissors::seed());
    }

    #[tokio::test]
    async fn test_out_of_turn_leaves_document_unchanged() {
        let (store, a, b) = tic_tac_toe_pair().await;
        a.submit_move("alice", Cell::new(0, 0)).await.unwrap();
        b.refresh().await;
        b.submit_move("bob", Cell::new(2, 2)).await.unwrap();
        a.refresh().await;

        let before_local = a.document().await;
        let before_remote = store.fetch(a.room_id()).await.unwrap();

        let err = b.submit_move("bob", Cell::new(1, 1)).await.unwrap_err();
        assert!(matches!(err, GameError::NotYourTurn { .. }));

        assert_eq!(a.document().await, before_local);
        assert_eq!(store.fetch(a.room_id()).await.unwrap(), before_remote);
    }

    #[tokio::test]
    async fn test_third_player_rejected() {
        let store = MemoryRoomStore::new();
        let session = RoomSession::<RockPaperScissors>::create(store).await.unwrap();
        session.claim_seat("alice").await.unwrap();
        session.claim_seat("bob").await.unwrap();

        let err = session.claim_seat("carol").await.unwrap_err();
        assert!(matches!(err, GameError::RoomFull(_)));
        let err = session.submit_move("carol", Hand::Rock).await.unwrap_err();
        assert!(matches!(err, GameError::RoomFull(_)));

        let doc = session.document().await;
        assert!(doc.moves.is_empty());
        assert_eq!(doc.players.slot_of("carol"), None);
    }

    #[tokio::test]
    async fn test_claim_seat_is_idempotent() {
        let store = FlakyStore::new();
        let session = RoomSession::<RockPaperScissors>::create(store.clone()).await.unwrap();

        assert_eq!(session.claim_seat("alice").await.unwrap(), PlayerSlot::Player1);
        assert_eq!(session.claim_seat("alice").await.unwrap(), PlayerSlot::Player1);
        assert_eq!(store.replaces.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_simultaneous_round_across_sessions() {
        let store = MemoryRoomStore::new();
        let a = RoomSession::<RockPaperScissors>::create(store.clone()).await.unwrap();
        let b = RoomSession::<RockPaperScissors>::join(store.clone(), a.room_id()).await.unwrap();

        a.claim_seat("alice").await.unwrap();
        b.refresh().await;
        b.claim_seat("bob").await.unwrap();
        a.refresh().await;

        a.submit_move("alice", Hand::Rock).await.unwrap();
        b.refresh().await;
        let doc = b.submit_move("bob", Hand::Scissors).await.unwrap();

        assert!(doc.moves.is_empty());
        assert_eq!(doc.history, vec!["alice chose rock, bob chose scissors. alice wins!"]);
        assert_eq!(store.fetch(a.room_id()).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let (_store, a, _b) = tic_tac_toe_pair().await;
        let first = a.refresh().await;
        let second = a.refresh().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_view() {
        let store = FlakyStore::new();
        let a = RoomSession::<TicTacToe>::create(store.clone()).await.unwrap();
        let b = RoomSession::<TicTacToe>::join(store.clone(), a.room_id()).await.unwrap();
        a.submit_move("alice", Cell::new(0, 0)).await.unwrap();

        store.fail_fetch.store(true, Ordering::SeqCst);
        let stale = b.refresh().await;
        assert_eq!(stale, TicTacToe::seed());

        store.fail_fetch.store(false, Ordering::SeqCst);
        let fresh = b.refresh().await;
        assert_eq!(fresh.current_turn, Some(PlayerSlot::Player2));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache() {
        let store = FlakyStore::new();
        let session = RoomSession::<TicTacToe>::create(store.clone()).await.unwrap();

        store.fail_replace.store(true, Ordering::SeqCst);
        let err = session.submit_move("alice", Cell::new(0, 0)).await.unwrap_err();
        assert!(matches!(err, GameError::Transport(_)));
        assert_eq!(session.document().await, TicTacToe::seed());

        // Retrying once the store recovers succeeds
        store.fail_replace.store(false, Ordering::SeqCst);
        let doc = session.submit_move("alice", Cell::new(0, 0)).await.unwrap();
        assert_eq!(doc.board.unwrap()[0][0], Some(Mark::X));
    }

    #[tokio::test]
    async fn test_stale_cache_loses_update() {
        let store = MemoryRoomStore::new();
        let a = RoomSession::<RockPaperScissors>::create(store.clone()).await.unwrap();
        let b = RoomSession::<RockPaperScissors>::join(store.clone(), a.room_id()).await.unwrap();

        a.claim_seat("alice").await.unwrap();
        b.refresh().await;
        b.claim_seat("bob").await.unwrap();
        a.refresh().await;

        // Both submit before seeing each other's write
        a.submit_move("alice", Hand::Paper).await.unwrap();
        b.submit_move("bob", Hand::Rock).await.unwrap();

        let remote = store.fetch(a.room_id()).await.unwrap();
        assert_eq!(remote.moves.len(), 1);
        assert_eq!(remote.moves.get("bob"), Some(&Hand::Rock));
        assert!(remote.history.is_empty());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_moves() {
        let store = MemoryRoomStore::new();
        let session = RoomSession::<TicTacToe>::create(store.clone()).await.unwrap();
        session.close();

        let err = session.submit_move("alice", Cell::new(0, 0)).await.unwrap_err();
        assert!(matches!(err, GameError::SessionClosed));

        // A refresh after close no longer changes the view
        let other = RoomSession::<TicTacToe>::join(store, session.room_id()).await.unwrap();
        other.submit_move("alice", Cell::new(0, 0)).await.unwrap();
        assert_eq!(session.refresh().await, TicTacToe::seed());
    }

    #[tokio::test]
    async fn test_polling_picks_up_remote_writes() {
        let (_store, a, b) = tic_tac_toe_pair().await;
        let mut view = b.subscribe();
        let poll = b.start_polling(Duration::from_millis(20));

        a.submit_move("alice", Cell::new(2, 0)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                view.changed().await.unwrap();
                if view.borrow().current_turn == Some(PlayerSlot::Player2) {
                    break;
                }
            }
        })
        .await
        .expect("poll task should deliver the remote move");

        assert!(poll.is_running());
        poll.stop();
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_polling() {
        let store = FlakyStore::new();
        let session = RoomSession::<TicTacToe>::create(store.clone()).await.unwrap();

        let poll = session.start_polling(Duration::from_millis(10));
        drop(poll);

        // Writes from elsewhere no longer reach the session
        let other = RoomSession::<TicTacToe>::join(store.clone(), session.room_id())
            .await
            .unwrap();
        other.submit_move("alice", Cell::new(0, 0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(session.document().await, TicTacToe::seed());
    }

    #[tokio::test]
    async fn test_waiting_player_keeps_seat() {
        let store = FlakyStore::new();
        let session = RoomSession::<RockPaperScissors>::create(store.clone()).await.unwrap();

        let err = session.submit_move("alice", Hand::Rock).await.unwrap_err();
        assert!(matches!(err, GameError::WaitingForOpponent));

        let remote = store.fetch(session.room_id()).await.unwrap();
        assert_eq!(remote.players.get(PlayerSlot::Player1), Some("alice"));
        assert!(remote.moves.is_empty());
        assert_eq!(session.document().await, remote);

        // Already seated: nothing more to write
        let err = session.submit_move("alice", Hand::Rock).await.unwrap_err();
        assert!(matches!(err, GameError::WaitingForOpponent));
        assert_eq!(store.replaces.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_simultaneous_round_through_moves_alone() {
        for rock_first in [true, false] {
            let store = MemoryRoomStore::new();
            let a = RoomSession::<RockPaperScissors>::create(store.clone()).await.unwrap();
            let b = RoomSession::<RockPaperScissors>::join(store.clone(), a.room_id())
                .await
                .unwrap();

            let (first, first_id, first_hand, second, second_id, second_hand) = if rock_first {
                (&a, "alice", Hand::Rock, &b, "bob", Hand::Scissors)
            } else {
                (&b, "bob", Hand::Scissors, &a, "alice", Hand::Rock)
            };

            // The first hand only seats its player
            let err = first.submit_move(first_id, first_hand).await.unwrap_err();
            assert!(matches!(err, GameError::WaitingForOpponent));

            second.refresh().await;
            second.submit_move(second_id, second_hand).await.unwrap();

            first.refresh().await;
            let doc = first.submit_move(first_id, first_hand).await.unwrap();

            assert!(doc.moves.is_empty());
            assert_eq!(doc.history.len(), 1);
            assert!(doc.history[0].ends_with("alice wins!"));
            assert_eq!(doc.players.get(PlayerSlot::Player1), Some(first_id));
            assert_eq!(store.fetch(a.room_id()).await.unwrap(), doc);
        }
    }

    #[tokio::test]
    async fn test_missing_room_on_write_is_transport() {
        let store = FlakyStore::new();
        let session = RoomSession::<TicTacToe>::create(store.clone()).await.unwrap();

        store.lose_room_on_replace.store(true, Ordering::SeqCst);
        let err = session.submit_move("alice", Cell::new(0, 0)).await.unwrap_err();
        assert!(matches!(err, GameError::Transport(_)));
        assert_eq!(session.document().await, TicTacToe::seed());
    }

    #[tokio::test]
    async fn test_write_landing_after_close_is_returned() {
        let store = GatedStore::new();
        let session = RoomSession::<TicTacToe>::create(store.clone()).await.unwrap();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.submit_move("alice", Cell::new(0, 0)).await }
        });

        store.entered.notified().await;
        session.close();
        store.release.notify_one();

        let doc = pending.await.unwrap().unwrap();
        assert_eq!(doc.board.unwrap()[0][0], Some(Mark::X));
        assert_eq!(store.inner.fetch(session.room_id()).await.unwrap(), doc);

        // The local view stays where it was when the session closed
        assert_eq!(session.document().await, TicTacToe::seed());
    }
}

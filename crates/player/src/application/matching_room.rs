//! Matching room - the orchestration loop of the waiting-pool screen.
//!
//! [`MatchingRoom::mount`] opens the real-time subscription for the user and
//! seeds the waiting pool. [`MountedRoom::run`] then owns the offer machine,
//! the pool and the countdown on a single task, multiplexing broker events,
//! user commands and countdown ticks with `tokio::select!`. Whatever way the
//! loop ends, the countdown is cancelled and the subscription released before
//! `run` returns.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use galaxytalk_domain::{ChatHandoff, UserId, WaitingUser};
use galaxytalk_shared::PoolEvent;

use crate::application::countdown::Countdown;
use crate::application::dispatcher::ActionDispatcher;
use crate::application::notice::{self, Notice};
use crate::application::services::chat_service::store_handoff;
use crate::application::state::{Effect, MatchOfferMachine, OfferInput, OfferState, WaitingPool};
use crate::ports::outbound::{
    MatchActionPort, RealtimeError, RealtimeEvent, RealtimePort, RealtimeSubscription,
    StorageProvider,
};

/// What the user can do while waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCommand {
    Accept,
    Pass,
    Cancel,
}

impl From<RoomCommand> for OfferInput {
    fn from(command: RoomCommand) -> Self {
        match command {
            RoomCommand::Accept => OfferInput::Accept,
            RoomCommand::Pass => OfferInput::Pass,
            RoomCommand::Cancel => OfferInput::Cancel,
        }
    }
}

/// Changes a UI would render.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomUpdate {
    State(OfferState),
    RemainingTime(u32),
    Pool(Vec<WaitingUser>),
    Notice(Notice),
}

/// Where the user goes once the room is done.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomExit {
    /// A chat room was created; the handoff is also stored for the chat surface.
    Chat(ChatHandoff),
    /// Matching was cancelled, timed out, or the transport failed.
    Home,
    /// The command channel closed (screen unmounted). Resources were released,
    /// nothing was sent to the backend.
    Closed,
}

pub struct MatchingRoom {
    realtime: Arc<dyn RealtimePort>,
    dispatcher: ActionDispatcher,
    storage: Arc<dyn StorageProvider>,
    updates: Option<mpsc::UnboundedSender<RoomUpdate>>,
    timers: TaskTracker,
}

impl MatchingRoom {
    pub fn new(
        realtime: Arc<dyn RealtimePort>,
        actions: Arc<dyn MatchActionPort>,
        storage: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            realtime,
            dispatcher: ActionDispatcher::new(actions),
            storage,
            updates: None,
            timers: TaskTracker::new(),
        }
    }

    pub fn with_updates(mut self, updates: mpsc::UnboundedSender<RoomUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Tracker of the countdown tasks this room spawns.
    pub fn timers(&self) -> TaskTracker {
        self.timers.clone()
    }

    /// Subscribe for `user_id` and load the current waiting pool.
    ///
    /// A failed pool load is reported as a notice; the room still mounts.
    pub async fn mount(self, user_id: &UserId) -> Result<MountedRoom, RealtimeError> {
        let subscription = self.realtime.subscribe(user_id).await?;
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();

        let mut room = MountedRoom {
            subscription,
            machine: MatchOfferMachine::new(),
            pool: WaitingPool::new(user_id.clone()),
            countdown: Countdown::new(self.timers),
            dispatcher: self.dispatcher,
            storage: self.storage,
            updates: self.updates,
            ticks_tx,
            ticks_rx,
        };

        match room.dispatcher.waiting_users().await {
            Ok(users) => room.pool.seed(users),
            Err(notice) => room.publish(RoomUpdate::Notice(notice)),
        }
        tracing::info!(user_id = %user_id, waiting = room.pool.len(), "Matching room mounted");
        room.publish(RoomUpdate::State(room.machine.state().clone()));
        room.publish_pool();
        Ok(room)
    }
}

pub struct MountedRoom {
    subscription: RealtimeSubscription,
    machine: MatchOfferMachine,
    pool: WaitingPool,
    countdown: Countdown,
    dispatcher: ActionDispatcher,
    storage: Arc<dyn StorageProvider>,
    updates: Option<mpsc::UnboundedSender<RoomUpdate>>,
    ticks_tx: mpsc::UnboundedSender<u64>,
    ticks_rx: mpsc::UnboundedReceiver<u64>,
}

impl MountedRoom {
    pub fn state(&self) -> &OfferState {
        self.machine.state()
    }

    pub fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    /// Run until the room is left. Resources are released on every path.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<RoomCommand>) -> RoomExit {
        let exit = loop {
            let input = tokio::select! {
                event = self.subscription.next_event() => match event {
                    Some(RealtimeEvent::Matching(event)) => {
                        tracing::debug!(kind = event.kind(), "Matching event");
                        OfferInput::from(event)
                    }
                    Some(RealtimeEvent::Pool(event)) => {
                        self.apply_pool_event(event);
                        continue;
                    }
                    Some(RealtimeEvent::TransportFailed(reason)) => {
                        tracing::warn!(reason = %reason, "Leaving matching room, transport failed");
                        self.publish(RoomUpdate::Notice(Notice::error(notice::CONNECTION_LOST)));
                        OfferInput::Cancel
                    }
                    None => {
                        tracing::warn!("Real-time subscription ended unexpectedly");
                        self.publish(RoomUpdate::Notice(Notice::error(notice::CONNECTION_LOST)));
                        OfferInput::Cancel
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => {
                        tracing::debug!(?command, "Room command");
                        command.into()
                    }
                    None => break RoomExit::Closed,
                },
                Some(generation) = self.ticks_rx.recv() => OfferInput::Tick { generation },
            };

            if let Some(exit) = self.step(input).await {
                break exit;
            }
        };

        self.release();
        tracing::info!(exit = ?exit, "Matching room closed");
        exit
    }

    async fn step(&mut self, input: OfferInput) -> Option<RoomExit> {
        let before = self.machine.state().clone();
        let effects = self.machine.handle(input);
        if self.machine.state() != &before {
            tracing::debug!(from = %before, to = %self.machine.state(), "Offer state changed");
            self.publish(RoomUpdate::State(self.machine.state().clone()));
        }
        self.apply(effects).await
    }

    async fn apply(&mut self, effects: Vec<Effect>) -> Option<RoomExit> {
        let mut exit = None;
        let mut tear_down = false;

        for effect in effects {
            match effect {
                Effect::StartCountdown { generation, seconds } => {
                    self.countdown.start(generation, seconds, self.ticks_tx.clone());
                }
                Effect::CancelCountdown => self.countdown.cancel(),
                Effect::Approve { match_id, accepted } => {
                    if let Some(notice) = self.dispatcher.approve(&match_id, accepted).await {
                        self.publish(RoomUpdate::Notice(notice));
                    }
                }
                Effect::LeavePool => {
                    if let Some(notice) = self.dispatcher.leave_pool().await {
                        self.publish(RoomUpdate::Notice(notice));
                    }
                }
                Effect::Notify(notice) => self.publish(RoomUpdate::Notice(notice)),
                Effect::RemainingTime(seconds) => {
                    self.publish(RoomUpdate::RemainingTime(seconds));
                }
                Effect::NavigateHome => exit = Some(RoomExit::Home),
                Effect::NavigateChat(handoff) => {
                    store_handoff(self.storage.as_ref(), &handoff);
                    exit = Some(RoomExit::Chat(handoff));
                }
                Effect::TearDown => tear_down = true,
            }
        }

        if tear_down {
            self.release();
            return exit.or(Some(RoomExit::Home));
        }
        exit
    }

    fn apply_pool_event(&mut self, event: PoolEvent) {
        let changed = match event {
            PoolEvent::NewUser(user) => self.pool.insert(user),
            PoolEvent::ExitUser(user_id) => self.pool.remove(&user_id),
        };
        if changed {
            self.publish_pool();
        }
    }

    fn release(&mut self) {
        self.countdown.cancel();
        if self.subscription.is_open() {
            self.subscription.close();
            tracing::debug!("Real-time subscription released");
        }
    }

    fn publish_pool(&self) {
        self.publish(RoomUpdate::Pool(self.pool.users().to_vec()));
    }

    fn publish(&self, update: RoomUpdate) {
        if let Some(updates) = &self.updates {
            let _ = updates.send(update);
        }
    }
}

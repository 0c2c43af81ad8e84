//! Match-offer state machine.
//!
//! A pure transition function: [`MatchOfferMachine::handle`] takes one input
//! and returns the effects the caller must perform (timers, backend calls,
//! notices, navigation). Nothing here touches I/O, which keeps every
//! transition testable without a runtime.

use std::fmt;

use galaxytalk_domain::{ChatHandoff, MatchId, MatchOffer};
use galaxytalk_shared::MatchingEvent;

use crate::application::notice::{self, Notice};

/// Seconds a user has to answer an offer.
pub const OFFER_TIMEOUT_SECS: u32 = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum OfferState {
    NoOffer,
    OfferPending {
        offer: MatchOffer,
        generation: u64,
        remaining: u32,
    },
    AcceptedAwaitingCounterpart {
        offer: MatchOffer,
    },
    Declined,
    Cancelled,
    Expired,
    ChatCreated(ChatHandoff),
}

impl OfferState {
    /// States with no live offer. They behave identically for a new offer.
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            OfferState::NoOffer | OfferState::Declined | OfferState::Cancelled | OfferState::Expired
        )
    }

    /// The machine has left the pool (cancelled or timed out).
    fn has_left(&self) -> bool {
        matches!(self, OfferState::Cancelled | OfferState::Expired)
    }

    pub fn offer(&self) -> Option<&MatchOffer> {
        match self {
            OfferState::OfferPending { offer, .. }
            | OfferState::AcceptedAwaitingCounterpart { offer } => Some(offer),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OfferState::NoOffer => "no_offer",
            OfferState::OfferPending { .. } => "offer_pending",
            OfferState::AcceptedAwaitingCounterpart { .. } => "accepted_awaiting_counterpart",
            OfferState::Declined => "declined",
            OfferState::Cancelled => "cancelled",
            OfferState::Expired => "expired",
            OfferState::ChatCreated(_) => "chat_created",
        }
    }
}

impl fmt::Display for OfferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OfferInput {
    /// `MATCH_SUCCESS`
    Offer(MatchOffer),
    Accept,
    Pass,
    Cancel,
    /// One second elapsed on the countdown of `generation`.
    Tick { generation: u64 },
    /// `WAITING`
    Waiting { message: Option<String> },
    /// `MATCH_FAILED`
    Failed { message: Option<String> },
    /// `CHAT_CREATED`
    ChatCreated(ChatHandoff),
}

impl From<MatchingEvent> for OfferInput {
    fn from(event: MatchingEvent) -> Self {
        match event {
            MatchingEvent::MatchSuccess(offer) => OfferInput::Offer(offer),
            MatchingEvent::Waiting { message } => OfferInput::Waiting { message },
            MatchingEvent::MatchFailed { message } => OfferInput::Failed { message },
            MatchingEvent::ChatCreated(handoff) => OfferInput::ChatCreated(handoff),
        }
    }
}

/// Work the owner of the machine must carry out, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartCountdown { generation: u64, seconds: u32 },
    CancelCountdown,
    Approve { match_id: MatchId, accepted: bool },
    LeavePool,
    Notify(Notice),
    RemainingTime(u32),
    NavigateHome,
    NavigateChat(ChatHandoff),
    /// Release the countdown and the real-time subscription.
    TearDown,
}

#[derive(Debug, Clone)]
pub struct MatchOfferMachine {
    state: OfferState,
    last_generation: u64,
}

impl Default for MatchOfferMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchOfferMachine {
    pub fn new() -> Self {
        Self {
            state: OfferState::NoOffer,
            last_generation: 0,
        }
    }

    pub fn state(&self) -> &OfferState {
        &self.state
    }

    pub fn remaining_time(&self) -> Option<u32> {
        match self.state {
            OfferState::OfferPending { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    /// Generation of the countdown that should currently be running.
    pub fn live_generation(&self) -> Option<u64> {
        match self.state {
            OfferState::OfferPending { generation, .. } => Some(generation),
            _ => None,
        }
    }

    pub fn handle(&mut self, input: OfferInput) -> Vec<Effect> {
        match input {
            OfferInput::Offer(offer) => self.on_offer(offer),
            OfferInput::Accept => self.on_accept(),
            OfferInput::Pass => self.on_pass(),
            OfferInput::Cancel => self.on_cancel(),
            OfferInput::Tick { generation } => self.on_tick(generation),
            OfferInput::Waiting { .. } => self.on_counterpart_gone(None),
            OfferInput::Failed { message } => self.on_counterpart_gone(Some(
                message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Matching failed.".to_string()),
            )),
            OfferInput::ChatCreated(handoff) => self.on_chat_created(handoff),
        }
    }

    fn on_offer(&mut self, offer: MatchOffer) -> Vec<Effect> {
        if matches!(self.state, OfferState::ChatCreated(_)) {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if self.live_generation().is_some() {
            effects.push(Effect::CancelCountdown);
        }
        self.last_generation += 1;
        let generation = self.last_generation;
        self.state = OfferState::OfferPending {
            offer,
            generation,
            remaining: OFFER_TIMEOUT_SECS,
        };
        effects.push(Effect::StartCountdown {
            generation,
            seconds: OFFER_TIMEOUT_SECS,
        });
        effects.push(Effect::RemainingTime(OFFER_TIMEOUT_SECS));
        effects
    }

    fn on_accept(&mut self) -> Vec<Effect> {
        let OfferState::OfferPending { offer, .. } = &self.state else {
            return Vec::new();
        };
        let offer = offer.clone();
        let match_id = offer.match_id.clone();
        self.state = OfferState::AcceptedAwaitingCounterpart { offer };
        vec![
            Effect::Approve {
                match_id,
                accepted: true,
            },
            Effect::CancelCountdown,
            Effect::Notify(Notice::info(notice::WAITING_FOR_COUNTERPART)),
        ]
    }

    fn on_pass(&mut self) -> Vec<Effect> {
        let OfferState::OfferPending { offer, .. } = &self.state else {
            return Vec::new();
        };
        let match_id = offer.match_id.clone();
        self.state = OfferState::NoOffer;
        vec![
            Effect::Approve {
                match_id,
                accepted: false,
            },
            Effect::CancelCountdown,
            Effect::Notify(Notice::info(notice::LOOKING_FOR_SOMEONE_ELSE)),
        ]
    }

    fn on_cancel(&mut self) -> Vec<Effect> {
        if self.state.has_left() || matches!(self.state, OfferState::ChatCreated(_)) {
            return Vec::new();
        }
        self.leave(OfferState::Cancelled, notice::MATCHING_CANCELLED)
    }

    fn on_tick(&mut self, tick_generation: u64) -> Vec<Effect> {
        let OfferState::OfferPending {
            generation,
            remaining,
            ..
        } = &mut self.state
        else {
            return Vec::new();
        };
        if *generation != tick_generation {
            return Vec::new();
        }
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return vec![Effect::RemainingTime(*remaining)];
        }
        let mut effects = vec![Effect::RemainingTime(0)];
        effects.extend(self.leave(OfferState::Expired, notice::MATCH_TIMED_OUT));
        effects
    }

    /// Shared exit for cancel and timeout: decline any live offer, leave the
    /// pool, go home.
    fn leave(&mut self, next: OfferState, message: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(offer) = self.state.offer() {
            effects.push(Effect::Approve {
                match_id: offer.match_id.clone(),
                accepted: false,
            });
        }
        effects.push(Effect::LeavePool);
        effects.push(Effect::CancelCountdown);
        effects.push(Effect::Notify(Notice::warning(message)));
        effects.push(Effect::NavigateHome);
        effects.push(Effect::TearDown);
        self.state = next;
        effects
    }

    fn on_counterpart_gone(&mut self, failure: Option<String>) -> Vec<Effect> {
        let mut effects = Vec::new();
        let next = match &self.state {
            OfferState::ChatCreated(_) => return effects,
            OfferState::AcceptedAwaitingCounterpart { .. } => {
                effects.push(Effect::Notify(Notice::info(notice::COUNTERPART_PASSED)));
                OfferState::Declined
            }
            OfferState::OfferPending { .. } => {
                effects.push(Effect::CancelCountdown);
                effects.push(Effect::Notify(Notice::info(notice::LOOKING_FOR_SOMEONE_ELSE)));
                OfferState::NoOffer
            }
            _ => {
                effects.push(Effect::Notify(Notice::info(notice::LOOKING_FOR_SOMEONE_ELSE)));
                OfferState::NoOffer
            }
        };
        if let Some(message) = failure {
            effects.insert(0, Effect::Notify(Notice::error(message)));
        }
        self.state = next;
        effects
    }

    fn on_chat_created(&mut self, handoff: ChatHandoff) -> Vec<Effect> {
        if matches!(self.state, OfferState::ChatCreated(_)) {
            return Vec::new();
        }
        self.state = OfferState::ChatCreated(handoff.clone());
        vec![
            Effect::CancelCountdown,
            Effect::NavigateChat(handoff),
            Effect::TearDown,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxytalk_domain::{ChatRoomId, MediaSessionId, Mbti};

    fn example_offer() -> MatchOffer {
        MatchOffer::new("42", "career")
            .with_mbti(Mbti::Entp)
            .with_scores(55, 87.0)
    }

    fn handoff() -> ChatHandoff {
        ChatHandoff {
            chat_room_id: ChatRoomId::new("room-1"),
            session_id: MediaSessionId::new("77"),
            token: "tok".into(),
        }
    }

    fn approvals(effects: &[Effect]) -> Vec<(String, bool)> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Approve { match_id, accepted } => {
                    Some((match_id.to_string(), *accepted))
                }
                _ => None,
            })
            .collect()
    }

    fn count(effects: &[Effect], pred: impl Fn(&Effect) -> bool) -> usize {
        effects.iter().filter(|e| pred(e)).count()
    }

    fn pending() -> MatchOfferMachine {
        let mut machine = MatchOfferMachine::new();
        machine.handle(OfferInput::Offer(example_offer()));
        machine
    }

    #[test]
    fn offer_in_no_offer_starts_one_countdown() {
        let mut machine = MatchOfferMachine::new();
        let effects = machine.handle(OfferInput::Offer(example_offer()));

        assert_eq!(
            effects,
            vec![
                Effect::StartCountdown {
                    generation: 1,
                    seconds: 60
                },
                Effect::RemainingTime(60),
            ]
        );
        assert_eq!(machine.state().name(), "offer_pending");
        assert_eq!(machine.remaining_time(), Some(60));
        assert_eq!(machine.state().offer(), Some(&example_offer()));
    }

    #[test]
    fn new_offer_replaces_countdown_and_stale_ticks_are_ignored() {
        let mut machine = pending();
        let effects = machine.handle(OfferInput::Offer(MatchOffer::new("43", "exams")));
        assert_eq!(effects[0], Effect::CancelCountdown);
        assert_eq!(machine.live_generation(), Some(2));

        assert!(machine.handle(OfferInput::Tick { generation: 1 }).is_empty());
        assert_eq!(machine.remaining_time(), Some(60));
        assert_eq!(
            machine.handle(OfferInput::Tick { generation: 2 }),
            vec![Effect::RemainingTime(59)]
        );
    }

    #[test]
    fn countdown_runs_down_and_expires_once() {
        let mut machine = pending();
        let mut seen = vec![machine.remaining_time().unwrap_or_default()];
        let mut all = Vec::new();
        for _ in 0..60 {
            let effects = machine.handle(OfferInput::Tick { generation: 1 });
            for e in &effects {
                if let Effect::RemainingTime(s) = e {
                    seen.push(*s);
                }
            }
            all.extend(effects);
        }

        assert_eq!(seen, (0..=60).rev().collect::<Vec<u32>>());
        assert_eq!(approvals(&all), vec![("42".to_string(), false)]);
        assert_eq!(count(&all, |e| *e == Effect::LeavePool), 1);
        assert_eq!(count(&all, |e| *e == Effect::TearDown), 1);
        assert_eq!(machine.state(), &OfferState::Expired);
        assert!(machine.state().is_resting());

        // Late ticks and a cancel after expiry do nothing.
        assert!(machine.handle(OfferInput::Tick { generation: 1 }).is_empty());
        assert!(machine.handle(OfferInput::Cancel).is_empty());
    }

    #[test]
    fn accept_then_chat_created_navigates_once() {
        let mut machine = pending();
        let effects = machine.handle(OfferInput::Accept);
        assert_eq!(approvals(&effects), vec![("42".to_string(), true)]);
        assert!(effects.contains(&Effect::CancelCountdown));
        assert_eq!(machine.state().name(), "accepted_awaiting_counterpart");

        // A second accept is not a second approval.
        assert!(machine.handle(OfferInput::Accept).is_empty());

        let effects = machine.handle(OfferInput::ChatCreated(handoff()));
        assert_eq!(
            effects,
            vec![
                Effect::CancelCountdown,
                Effect::NavigateChat(handoff()),
                Effect::TearDown
            ]
        );
        assert!(machine.handle(OfferInput::ChatCreated(handoff())).is_empty());
        assert!(machine
            .handle(OfferInput::Offer(example_offer()))
            .is_empty());
        assert_eq!(machine.state(), &OfferState::ChatCreated(handoff()));
    }

    #[test]
    fn pass_declines_once_and_allows_a_fresh_countdown() {
        let mut machine = pending();
        let effects = machine.handle(OfferInput::Pass);
        assert_eq!(approvals(&effects), vec![("42".to_string(), false)]);
        assert_eq!(count(&effects, |e| *e == Effect::LeavePool), 0);
        assert_eq!(machine.state(), &OfferState::NoOffer);
        assert!(machine.state().offer().is_none());

        assert!(machine.handle(OfferInput::Pass).is_empty());

        let effects = machine.handle(OfferInput::Offer(example_offer()));
        assert_eq!(
            effects[0],
            Effect::StartCountdown {
                generation: 2,
                seconds: 60
            }
        );
    }

    #[test]
    fn cancel_while_pending_declines_and_leaves() {
        let mut machine = pending();
        let effects = machine.handle(OfferInput::Cancel);
        assert_eq!(approvals(&effects), vec![("42".to_string(), false)]);
        assert_eq!(count(&effects, |e| *e == Effect::LeavePool), 1);
        assert_eq!(count(&effects, |e| *e == Effect::NavigateHome), 1);
        assert_eq!(machine.state(), &OfferState::Cancelled);
        assert!(machine.handle(OfferInput::Cancel).is_empty());
    }

    #[test]
    fn cancel_while_resting_only_leaves_the_pool() {
        let mut machine = MatchOfferMachine::new();
        let effects = machine.handle(OfferInput::Cancel);
        assert!(approvals(&effects).is_empty());
        assert_eq!(count(&effects, |e| *e == Effect::LeavePool), 1);
        assert_eq!(count(&effects, |e| *e == Effect::TearDown), 1);
    }

    #[test]
    fn waiting_after_accept_means_counterpart_declined() {
        let mut machine = pending();
        machine.handle(OfferInput::Accept);
        let effects = machine.handle(OfferInput::Waiting { message: None });

        assert_eq!(machine.state(), &OfferState::Declined);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::info(notice::COUNTERPART_PASSED))]
        );

        // Declined is a resting state: a new offer starts over.
        machine.handle(OfferInput::Offer(example_offer()));
        assert_eq!(machine.remaining_time(), Some(60));
    }

    #[test]
    fn waiting_while_pending_drops_the_offer() {
        let mut machine = pending();
        let effects = machine.handle(OfferInput::Waiting { message: None });
        assert_eq!(effects[0], Effect::CancelCountdown);
        assert_eq!(machine.state(), &OfferState::NoOffer);
        assert!(approvals(&effects).is_empty());
    }

    #[test]
    fn match_failed_adds_failure_notice() {
        let mut machine = pending();
        machine.handle(OfferInput::Accept);
        let effects = machine.handle(OfferInput::Failed {
            message: Some("counterpart left".into()),
        });
        assert_eq!(machine.state(), &OfferState::Declined);
        assert_eq!(
            effects[0],
            Effect::Notify(Notice::error("counterpart left"))
        );
        assert_eq!(effects.len(), 2);

        let mut machine = MatchOfferMachine::new();
        let effects = machine.handle(OfferInput::Failed { message: None });
        assert_eq!(effects[0], Effect::Notify(Notice::error("Matching failed.")));
        assert_eq!(machine.state(), &OfferState::NoOffer);
    }

    #[test]
    fn converts_from_matching_events() {
        assert_eq!(
            OfferInput::from(MatchingEvent::MatchSuccess(example_offer())),
            OfferInput::Offer(example_offer())
        );
        assert_eq!(
            OfferInput::from(MatchingEvent::ChatCreated(handoff())),
            OfferInput::ChatCreated(handoff())
        );
    }
}

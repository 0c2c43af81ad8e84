//! GalaxyTalk Protocol - Wire contracts between the Player and the backend
//!
//! - REST response envelope and request/response DTOs ([`api`])
//! - Real-time envelopes and their decoded events ([`envelope`])
//! - STOMP 1.2 framing used by the match broker ([`stomp`])
//! - Broker destinations ([`topics`])
//! - Data-channel signals exchanged during a chat ([`signal`])
//!
//! Pure data and codecs. No I/O.

pub mod api;
pub mod envelope;
pub mod signal;
pub mod stomp;
pub mod topics;

pub use api::{
    AiQuestionDto, ApiResponse, ChatMessageDto, ChatMessageRequest, ChatParticipantDto,
    ChatRoomDto, ChatRoomPage, FeedbackRequest, LetterDto, LetterRequest, MatchApproveRequest,
    MatchStartRequest, MatchStartTime, ParticipantsDto,
};
pub use envelope::{EnvelopeError, MatchingEnvelope, MatchingEvent, PoolEvent};
pub use signal::ChatSignal;
pub use stomp::{Command, Frame, Inbound, StompError};

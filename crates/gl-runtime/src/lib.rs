pub mod attempts;
pub mod config;
mod engine;
pub mod evaluator;
pub mod guard;
pub mod ports;
pub mod retry;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;

pub use attempts::AttemptTracker;
pub use config::{GenerationConfig, GenerationSettings, TimingConfig};
pub use engine::{DialogueEngine, DialogueEngineOptions, EnginePhase, StartOutcome, SubmitOutcome};
pub use evaluator::{
    AiEvaluator, GradingInput, DEFAULT_STREAM_IDLE_TIMEOUT, FALLBACK_ACKNOWLEDGMENT,
    FALLBACK_EXPLANATION, FALLBACK_VERDICT,
};
pub use guard::{EpochTicket, RequestGuard};
pub use ports::{
    GenerationRequest, HistoryStore, InMemoryHistoryStore, TextGenerator, TextStream,
};
pub use retry::{HintLevel, RetryDecision, RetryPolicy, REVEAL_ENCOURAGEMENT};
pub use router::{ChannelRouter, RoutePlan};

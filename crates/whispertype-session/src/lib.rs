//! Session orchestration for push-to-talk dictation.
//!
//! One `SessionOrchestrator` exists per process. It owns the state machine
//! and every platform collaborator, and consumes a serialized stream of
//! `SessionEvent`s from the `Dispatcher` mailbox. Background workers and
//! timers never touch session state directly; they enqueue events.

pub mod dispatcher;
pub mod event;
pub mod orchestrator;
pub mod state;

pub use dispatcher::Dispatcher;
pub use event::SessionEvent;
pub use orchestrator::{spawn_model_load, SessionOrchestrator, SessionPorts, CANCEL_COMBO};
pub use state::SessionState;

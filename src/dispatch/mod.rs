//! Dispatch Layer
//!
//! The core of FlashBridge: for each decoded message, pick the specialized
//! handler or the generic cache path, wait for the result asynchronously,
//! and send one reply on the session.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Dispatcher                           │
//! │                                                             │
//! │  on_message(session, msg)                                   │
//! │        │                                                    │
//! │        ▼                                                    │
//! │  HandlerRegistry ──hit──> CommandHandler ──────────┐        │
//! │        │                                           │        │
//! │       miss                                         │        │
//! │        ▼                                           ▼        │
//! │  CacheBridge::translate ──> CacheExecutor ──> frame_response│
//! │                                                    │        │
//! │                                                    ▼        │
//! │                                            session.send()   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod bridge;
pub mod dispatcher;

pub use bridge::{
    cache_command, frame_response, response_rule, translate, CacheBridge, ResponseRule,
    OPERATION_ERROR, UNSUPPORTED_OPERATION,
};
pub use dispatcher::{DispatchError, Dispatcher, DEFAULT_COMMAND_TIMEOUT, OPERATION_TIMED_OUT};

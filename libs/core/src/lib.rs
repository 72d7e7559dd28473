//! Core contracts for the Evolution attendant.
//!
//! This crate owns the canonical inbound message envelope, the resolver that
//! locates it inside the several webhook payload shapes the gateway emits,
//! and the ordered content extractor that turns a resolved envelope into
//! plain text (delegating voice notes to a [`SpeechTranscriber`]).

pub mod extract;
pub mod resolver;
pub mod types;

pub use extract::{AUDIO_FALLBACK_TEXT, UNSUPPORTED_TEXT, SpeechTranscriber, extract_text};
pub use resolver::{MAX_SCAN_DEPTH, resolve_envelope};
pub use types::{InboundEnvelope, MessageBody};

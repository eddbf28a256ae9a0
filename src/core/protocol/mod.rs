//! Wire protocol between the avatar client and the conversational backend.
//!
//! The backend speaks over a single WebSocket:
//!
//! - Binary frames carry synthesized speech (one playable clip per frame).
//! - Text frames carry a loosely structured JSON record with any subset of
//!   `message`, `text`, `done`, `expression`, `model` and `motion`.
//!
//! The client sends raw user text, or a small JSON record when a selector
//! changes (`{"model": ..}`, `{"voice": {..}}`, `{"llm": ..}`).
//!
//! Inbound records are validated once, here, and turned into an
//! [`InboundEvent`] whose fields are all optional. Nothing downstream looks at
//! raw JSON.

mod messages;

pub use messages::{
    ClientMessage, ExpressionId, InboundEvent, InboundFrame, MotionSpec, ProtocolError,
    ProtocolResult,
};

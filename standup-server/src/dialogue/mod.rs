//! Explicit state machine for the report collection dialogue.
//!
//! This module implements a pure functional state machine for walking one
//! user through the three standup questions. The design separates:
//! - **State**: Where the dialogue stands (`DialogueState`)
//! - **Events**: What the user did (`Event`)
//! - **Effects**: What to do about it (`Effect`)
//! - **Transition**: Pure function `(State, Event) -> (State, Vec<Effect>)`
//!
//! The interpreter executes effects against Telegram and the report
//! repository; the session store owns the user-to-dialogue mapping.

pub mod effect;
pub mod event;
pub mod interpreter;
pub mod state;
pub mod store;
pub mod transition;

pub use effect::*;
pub use event::*;
pub use interpreter::*;
pub use state::*;
pub use store::*;
pub use transition::*;

//! Centralized user-facing message system.
//!
//! All CLI output goes through the [`Message`] enum and the `msg_*` macros
//! instead of inline string literals. Keeping the text in one place gives
//! every command the same tone, makes the wording reviewable in isolation,
//! and leaves room to localize later without touching command logic.

pub mod display;
pub mod macros;
pub mod types;

pub use types::Message;

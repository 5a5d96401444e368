pub mod state;
pub mod store;
pub mod transcript;

pub use state::SessionState;
pub use store::{Session, SessionHandle, SessionStore, SESSION_COOKIE};
pub use transcript::{Transcript, TranscriptEntry};

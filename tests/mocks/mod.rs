//! Mock implementations of the external collaborators
//!
//! The credential store, the Telegram messenger and the session verifier are
//! replaced with in-memory versions whose failures can be switched on.

pub mod mock_messenger;
pub mod mock_sessions;
pub mod mock_store;

#[allow(unused_imports)]
pub use mock_messenger::{MockMessenger, SentCall};
#[allow(unused_imports)]
pub use mock_sessions::MockSessions;
#[allow(unused_imports)]
pub use mock_store::MockStore;

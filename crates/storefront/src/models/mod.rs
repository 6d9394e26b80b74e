//! Session-backed models.

pub mod session;

pub use session::keys as session_keys;
pub use session::{load_language, load_shopping, save_language, save_shopping};

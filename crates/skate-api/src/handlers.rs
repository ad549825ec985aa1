//! Request handlers.

pub mod health;
pub mod leaderboard;
pub mod submissions;
pub mod tricks;

pub use health::*;
pub use leaderboard::*;
pub use submissions::*;
pub use tricks::*;

//! In-memory announcement board and the daily newsletter digest.
//!
//! Announcements live only as long as the `NewsBoard` that holds them; the
//! remote API is told about each one but is never read back.

pub mod board;
pub mod newsletter;

pub use board::{group_by_category, BoardError, CategoryGroup, NewsBoard};
pub use newsletter::Newsletter;

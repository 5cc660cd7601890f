//! Request handlers.

pub mod avatars;
pub mod generate;
pub mod health;
pub mod videos;

pub use avatars::*;
pub use generate::*;
pub use health::*;
pub use videos::*;

pub mod config;
pub mod link;
pub mod session;

pub use config::SessionConfig;
pub use link::Link;
pub use session::{ActorInstance, Session};

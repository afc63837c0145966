pub mod chat;
pub mod notify;
pub mod registry;

pub use chat::ChatService;
pub use notify::Notifier;
pub use registry::{ConnId, ConnectionRegistry};

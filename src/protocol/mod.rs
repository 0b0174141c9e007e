pub mod connection;
pub mod events;
pub mod messages;

pub use connection::Connection;
pub use events::*;
pub use messages::*;

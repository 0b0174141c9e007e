pub mod base;
pub mod server;

pub use base::*;
pub use server::*;

pub mod errors;
pub mod logger;
pub mod types;

pub use errors::*;
pub use types::*;

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

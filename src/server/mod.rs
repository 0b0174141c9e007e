pub mod app_state;
pub mod clock;
pub mod member;
pub mod registry;
pub mod session;

pub use app_state::AppState;
pub use member::Member;
pub use registry::{SessionRegistry, Unbound};
pub use session::Session;

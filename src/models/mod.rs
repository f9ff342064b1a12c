pub mod app_state;
pub mod messages;
pub mod view;

// Re-export important types
pub use app_state::*;
pub use messages::*;
pub use view::*;

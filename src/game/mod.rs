pub mod celebration;
pub mod notation;
pub mod opponent;
pub mod rules;
pub mod selection;
pub mod session;
pub mod standard;
pub mod store;
pub mod utils;

pub use rules::{MoveFlags, MoveInfo, Occupant, RulesEngine, RulesError};
pub use session::Session;
pub use standard::{StandardRules, START_FEN};
pub use store::{LoadOutcome, MoveRecord, PositionStore};

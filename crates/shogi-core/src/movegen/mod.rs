//! 指し手生成

mod generator;
mod movelist;
mod perft;
mod types;

pub use generator::{generate_all, generate_legal, generate_legal_all, generate_with_type};
pub use movelist::MoveList;
pub use perft::{perft, perft_divide, perft_divide_with, perft_with};
pub use types::{ExtMove, ExtMoveBuffer, GenType, MAX_MOVES};

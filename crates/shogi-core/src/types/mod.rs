//! 基本型モジュール
//!
//! - `Color`: 手番
//! - `File` / `Rank` / `Square`: 筋・段・升
//! - `PieceType` / `Piece`: 駒種・駒
//! - `Hand`: 手駒（32bitパック）
//! - `Move`: 指し手（32bit）
//! - `Value` / `Bound` / 深さ定数
//! - `RepetitionState`: 千日手判定結果

mod color;
mod hand;
mod moves;
mod piece;
mod repetition;
mod square;
mod value;

pub use color::Color;
pub use hand::Hand;
pub use moves::{Move, MoveParseError};
pub use piece::{Piece, PieceType};
pub use repetition::RepetitionState;
pub use square::{File, Rank, Square};
pub use value::{
    capture_value, piece_value, promotion_bonus, Bound, Depth, Value, DEPTH_ENTRY_OFFSET,
    DEPTH_NONE, DEPTH_QS, DEPTH_QS_NO_CHECKS, DEPTH_QS_RECAPTURES,
};

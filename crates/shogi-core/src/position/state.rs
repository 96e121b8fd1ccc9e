//! 局面状態（StateInfo）
//!
//! `Position` が手数ごとに1つずつ持つ状態レコード。
//! 手を進めるたびに `Position` 内のアリーナの次のスロットへ書き込み、
//! `previous` で直前のレコードのインデックスを指す。

use crate::bitboard::Bitboard;
use crate::types::{Color, Hand, Move, Piece, PieceType, Value};

/// 局面状態
#[derive(Clone, Copy, Debug)]
pub struct StateInfo {
    // === do_move時に前の状態から引き継ぐ部分 ===
    /// 盤面ハッシュ（手番込み）
    pub board_key: u64,
    /// 手駒ハッシュ
    pub hand_key: u64,
    /// 駒割評価値（先手視点）
    pub material_value: Value,
    /// null moveからの手数
    pub plies_from_null: i32,
    /// 連続王手カウンタ [Color]（その手番側が王手をかけ続けている手数）
    pub continuous_check: [i32; Color::NUM],

    // === do_move時に再計算される部分 ===
    /// 手番側の玉に王手している駒
    pub checkers: Bitboard,
    /// 玉と敵の遠方駒の間にある唯一の駒 [Color]（両陣営の駒を含む）
    pub blockers_for_king: [Bitboard; Color::NUM],
    /// その手番の駒をpinしている敵の遠方駒 [Color]
    pub pinners: [Bitboard; Color::NUM],
    /// 手番側がその駒種で王手できる升 [PieceType]
    pub check_squares: [Bitboard; PieceType::NUM + 1],
    /// 直前の指し手で捕獲された駒
    pub captured_piece: Piece,
    /// 直前の指し手
    pub last_move: Move,
    /// 手駒スナップショット [Color]（千日手の優劣判定用）
    pub hand_snapshot: [Hand; Color::NUM],
    /// 前の状態のインデックス（Position 内のアリーナ）
    pub previous: Option<usize>,
}

impl StateInfo {
    /// 空の状態
    pub const fn new() -> Self {
        StateInfo {
            board_key: 0,
            hand_key: 0,
            material_value: Value::ZERO,
            plies_from_null: 0,
            continuous_check: [0; Color::NUM],
            checkers: Bitboard::EMPTY,
            blockers_for_king: [Bitboard::EMPTY; Color::NUM],
            pinners: [Bitboard::EMPTY; Color::NUM],
            check_squares: [Bitboard::EMPTY; PieceType::NUM + 1],
            captured_piece: Piece::NONE,
            last_move: Move::NONE,
            hand_snapshot: [Hand::EMPTY; Color::NUM],
            previous: None,
        }
    }

    /// 局面のハッシュキー（盤面 XOR 手駒）
    #[inline]
    pub const fn key(&self) -> u64 {
        self.board_key ^ self.hand_key
    }

    /// 次の手数の状態の初期値（引き継ぐ部分だけコピー）
    #[inline]
    pub(super) fn successor(&self, previous: usize) -> StateInfo {
        StateInfo {
            board_key: self.board_key,
            hand_key: self.hand_key,
            material_value: self.material_value,
            plies_from_null: self.plies_from_null,
            continuous_check: self.continuous_check,
            previous: Some(previous),
            ..StateInfo::new()
        }
    }
}

impl Default for StateInfo {
    fn default() -> Self {
        Self::new()
    }
}

//! 局面状態の再計算と整合性検証
//!
//! `set_state` は盤面・手駒から差分更新される値をすべて作り直す。
//! `verify` は差分更新の結果を作り直した値と突き合わせる（テスト・`debug` feature 用）。

use thiserror::Error;

use crate::bitboard::Bitboard;
use crate::types::{Color, PieceType, Square, Value};

use super::pos::Position;
use super::sfen::max_pieces;
use super::zobrist::{zobrist_hand, zobrist_psq, zobrist_side};

/// 差分更新と再計算の不一致
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMismatch {
    #[error("board key mismatch: incremental {incremental:#018x}, recomputed {recomputed:#018x}")]
    BoardKey { incremental: u64, recomputed: u64 },
    #[error("hand key mismatch: incremental {incremental:#018x}, recomputed {recomputed:#018x}")]
    HandKey { incremental: u64, recomputed: u64 },
    #[error("material mismatch: incremental {incremental}, recomputed {recomputed}")]
    Material { incremental: i32, recomputed: i32 },
    #[error("checkers mismatch")]
    Checkers,
    #[error("{0:?} king square does not hold a king")]
    KingSquare(Color),
    #[error("{0:?} pawn file mask mismatch")]
    PawnFiles(Color),
    #[error("piece bitboards disagree with the board array")]
    Bitboards,
    #[error("{piece_type:?} count mismatch: expected {expected}, found {found}")]
    PieceCount { piece_type: PieceType, expected: u32, found: u32 },
}

impl Position {
    /// 盤面・手駒から状態を作り直す
    ///
    /// 連続王手カウンタと null move からの手数は 0 に戻す。
    pub(crate) fn set_state(&mut self) {
        let board_key = self.compute_board_key();
        let hand_key = self.compute_hand_key();
        let material = self.compute_material();
        let us = self.side_to_move();
        let checkers = self.attackers_to_c(self.king_square(us), !us);
        let hand = self.hand;

        let st = self.state_mut();
        st.board_key = board_key;
        st.hand_key = hand_key;
        st.material_value = material;
        st.plies_from_null = 0;
        st.continuous_check = [0; Color::NUM];
        st.checkers = checkers;
        st.hand_snapshot = hand;

        self.update_blockers_and_pinners();
        self.update_check_squares();
    }

    fn compute_board_key(&self) -> u64 {
        let mut key = 0;
        for sq in Square::all() {
            let pc = self.piece_on(sq);
            if pc.is_some() {
                key ^= zobrist_psq(pc, sq);
            }
        }
        if self.side_to_move() == Color::White {
            key ^= zobrist_side();
        }
        key
    }

    fn compute_hand_key(&self) -> u64 {
        let mut key = 0;
        for c in Color::ALL {
            for (pt, n) in self.hand(c).iter() {
                key ^= zobrist_hand(c, pt, n);
            }
        }
        key
    }

    /// 駒種ごとの枚数（盤上の成駒は生駒に戻して数え、両者の手駒を含む）
    pub(super) fn count_pieces(&self) -> [u32; PieceType::NUM + 1] {
        let mut counts = [0; PieceType::NUM + 1];
        for sq in Square::all() {
            let pc = self.piece_on(sq);
            if pc.is_some() {
                counts[pc.piece_type().unpromote().index()] += 1;
            }
        }
        for c in Color::ALL {
            for (pt, n) in self.hand(c).iter() {
                counts[pt.index()] += n;
            }
        }
        counts
    }

    /// 駒割（先手視点）。手駒は生駒の価値で数える
    fn compute_material(&self) -> Value {
        let mut v = 0;
        for sq in Square::all() {
            let pc = self.piece_on(sq);
            if pc.is_some() && pc.piece_type() != PieceType::King {
                let sign = if pc.color() == Color::Black { 1 } else { -1 };
                v += sign * crate::types::piece_value(pc.piece_type());
            }
        }
        for c in Color::ALL {
            let sign = if c == Color::Black { 1 } else { -1 };
            for (pt, n) in self.hand(c).iter() {
                v += sign * crate::types::piece_value(pt) * n as i32;
            }
        }
        Value::new(v)
    }

    /// 差分更新された状態が再計算した値と一致するか検証する
    pub fn verify(&self) -> Result<(), StateMismatch> {
        let result = self.verify_inner();
        if let Err(e) = &result {
            log::error!("position state mismatch: {e} at {}", self.to_sfen());
        }
        result
    }

    fn verify_inner(&self) -> Result<(), StateMismatch> {
        // 盤面配列とBitboard
        let mut by_color = [Bitboard::EMPTY; Color::NUM];
        let mut by_type = [Bitboard::EMPTY; PieceType::NUM + 1];
        for sq in Square::all() {
            let pc = self.piece_on(sq);
            if pc.is_some() {
                by_color[pc.color().index()].set(sq);
                by_type[pc.piece_type().index()].set(sq);
            }
        }
        if by_color != self.by_color || by_type != self.by_type {
            return Err(StateMismatch::Bitboards);
        }

        // 駒数は局面設定時から変わらず、各駒種の総数を超えない
        let counts = self.count_pieces();
        for pt in PieceType::HAND_TYPES.into_iter().chain([PieceType::King]) {
            let found = counts[pt.index()];
            let expected = self.piece_counts[pt.index()];
            if found != expected || found > max_pieces(pt) {
                return Err(StateMismatch::PieceCount {
                    piece_type: pt,
                    expected,
                    found,
                });
            }
        }

        for c in Color::ALL {
            let ksq = self.king_square(c);
            if self.piece_on(ksq).piece_type() != PieceType::King || self.piece_on(ksq).color() != c
            {
                return Err(StateMismatch::KingSquare(c));
            }

            let mut mask = 0u16;
            for sq in self.pieces(c, PieceType::Pawn).iter() {
                mask |= 1 << sq.file().index();
            }
            if mask != self.pawn_file_mask(c) {
                return Err(StateMismatch::PawnFiles(c));
            }
        }

        let st = self.state();
        let board_key = self.compute_board_key();
        if board_key != st.board_key {
            return Err(StateMismatch::BoardKey {
                incremental: st.board_key,
                recomputed: board_key,
            });
        }
        let hand_key = self.compute_hand_key();
        if hand_key != st.hand_key {
            return Err(StateMismatch::HandKey {
                incremental: st.hand_key,
                recomputed: hand_key,
            });
        }
        let material = self.compute_material();
        if material != st.material_value {
            return Err(StateMismatch::Material {
                incremental: st.material_value.raw(),
                recomputed: material.raw(),
            });
        }

        let us = self.side_to_move();
        if self.attackers_to_c(self.king_square(us), !us) != st.checkers {
            return Err(StateMismatch::Checkers);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Move;

    #[test]
    fn test_verify_after_sfen() {
        let pos = Position::startpos();
        assert_eq!(pos.verify(), Ok(()));
        assert_eq!(pos.material_value(), Value::ZERO, "平手は駒割 0");
    }

    #[test]
    fn test_verify_detects_corruption() {
        let mut pos = Position::startpos();
        pos.state_mut().board_key ^= 1;
        assert!(matches!(pos.verify(), Err(StateMismatch::BoardKey { .. })));

        let mut pos = Position::startpos();
        pos.state_mut().material_value = Value::new(1);
        assert!(matches!(pos.verify(), Err(StateMismatch::Material { .. })));
    }

    #[test]
    fn test_verify_piece_counts() {
        let pos = Position::startpos();
        let counts = pos.count_pieces();
        assert_eq!(counts[PieceType::Pawn.index()], 18);
        assert_eq!(counts[PieceType::Rook.index()], 2);
        assert_eq!(counts[PieceType::King.index()], 2);
        assert_eq!(counts.iter().sum::<u32>(), 40, "平手は40枚");

        // 手駒から1枚消える（駒の消失）
        let mut pos = Position::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b 2P 1").unwrap();
        assert_eq!(pos.verify(), Ok(()));
        pos.hand[Color::Black.index()] = Position::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b P 1")
            .unwrap()
            .hand(Color::Black);
        assert_eq!(
            pos.verify(),
            Err(StateMismatch::PieceCount {
                piece_type: PieceType::Pawn,
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_piece_counts_survive_captures_and_promotions() {
        let mut pos = Position::startpos();
        let before = pos.count_pieces();
        for usi in ["7g7f", "3c3d", "8h2b+", "3a2b", "B*4e"] {
            let m = pos.move_from_usi(usi).unwrap();
            pos.do_move(m, pos.gives_check(m));
            assert_eq!(pos.count_pieces(), before, "{usi} の後で駒数が変わった");
        }
        assert_eq!(pos.verify(), Ok(()));
    }

    #[test]
    fn test_incremental_matches_recomputed() {
        let mut pos = Position::startpos();
        for usi in ["7g7f", "3c3d", "8h2b+", "3a2b", "B*4e", "B*6e"] {
            let m = pos.move_from_usi(usi).unwrap();
            pos.do_move(m, pos.gives_check(m));
            assert_eq!(pos.verify(), Ok(()), "{usi} の後で不一致");
        }
        let snapshot = pos.key();
        let mut recomputed = pos.clone();
        recomputed.set_state();
        assert_eq!(recomputed.key(), snapshot);
        assert_ne!(pos.last_move(), Move::NONE);
    }
}

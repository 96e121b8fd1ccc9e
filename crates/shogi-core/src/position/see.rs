//! SEE (Static Exchange Evaluation)
//!
//! 指し手の行き先で駒の取り合いを最後まで続けたときの損得が閾値以上かを判定する。
//! 取り合いに参加する駒は安い順に選ぶ。

use crate::bitboard::{line_bb, Bitboard};
use crate::types::{capture_value, piece_value, promotion_bonus, Color, Move, PieceType, Square, Value};

use super::legality::can_promote_move;
use super::pos::Position;

/// 取り合いの最大手数（盤上の駒数より多い）
const MAX_EXCHANGES: usize = 48;

/// 取り合いで使う駒の順（価値の安い順）
const SEE_ORDER: [PieceType; 14] = [
    PieceType::Pawn,
    PieceType::Lance,
    PieceType::Knight,
    PieceType::Silver,
    PieceType::ProPawn,
    PieceType::ProLance,
    PieceType::ProKnight,
    PieceType::ProSilver,
    PieceType::Gold,
    PieceType::Bishop,
    PieceType::Horse,
    PieceType::Rook,
    PieceType::Dragon,
    PieceType::King,
];

impl Position {
    /// SEE >= threshold かどうか
    pub fn see_ge(&self, m: Move, threshold: Value) -> bool {
        let us = self.side_to_move();
        let to = m.to();

        let (moved_before, moved_after, from) = if m.is_drop() {
            let pt = m.drop_piece_type();
            (pt, pt, None)
        } else {
            let from = m.from();
            let pt = self.piece_on(from).piece_type();
            let after = if m.is_promote() { pt.promote().unwrap_or(pt) } else { pt };
            (pt, after, Some(from))
        };

        let captured = if m.is_drop() { 0 } else { capture_value(self.piece_on(to)) };
        let bonus = if moved_after != moved_before { promotion_bonus(moved_before) } else { 0 };

        // gain[d]: d 手目を取った側から見て、そこで取り合いを止めたときの損得（閾値込み）
        let mut gain = [0i32; MAX_EXCHANGES];
        gain[0] = captured + bonus - threshold.raw();
        if gain[0] < 0 {
            return false;
        }

        // 次に取られる駒（行き先にいる駒）の価値
        let mut on_square = piece_value(moved_after);
        let mut occupied = self.occupied();
        if let Some(from) = from {
            occupied.clear(from);
        }
        let mut attackers = self.attackers_to_occ(to, occupied) & occupied;
        let mut stm = us;
        let mut d = 0;

        while d + 1 < MAX_EXCHANGES {
            stm = !stm;
            attackers &= occupied;

            let mut stm_attackers = attackers & self.pieces_c(stm);
            // pinされている駒は、pinしている駒がまだ盤上にあれば玉との直線上でしか取れない
            if !(self.pinners(stm) & occupied).is_empty() {
                let pinned = self.blockers_for_king(stm) & self.pieces_c(stm);
                stm_attackers &= !(pinned & !line_bb(self.king_square(stm), to));
            }

            let Some((sq, pt)) = least_valuable(self, stm_attackers, stm) else {
                break;
            };

            // 相手の利きが残っている升は玉で取れない
            if pt == PieceType::King && !(attackers & self.pieces_c(!stm)).is_empty() {
                break;
            }

            // 成れる升での取り返しは成るものとして数える
            let after = match pt.promote() {
                Some(promoted) if can_promote_move(stm, sq, to) => promoted,
                _ => pt,
            };
            d += 1;
            gain[d] = on_square + piece_value(after) - piece_value(pt) - gain[d - 1];

            // 取っても取らなくても負けなら、ここから先は判定に影響しない
            if (-gain[d - 1]).max(gain[d]) < 0 || pt == PieceType::King {
                break;
            }

            on_square = piece_value(after);
            occupied.clear(sq);
            // 取り除いた駒の背後にいた遠方駒を追加
            attackers |= self.slider_attackers_to(to, occupied) & occupied;
        }

        // 後ろから、各手番が取るか止めるかの良い方を選ぶ
        while d > 0 {
            gain[d - 1] = -(-gain[d - 1]).max(gain[d]);
            d -= 1;
        }
        gain[0] >= 0
    }
}

/// 最も安い攻め駒（盤上の駒種で選ぶ）
fn least_valuable(pos: &Position, attackers: Bitboard, stm: Color) -> Option<(Square, PieceType)> {
    for pt in SEE_ORDER {
        let bb = attackers & pos.pieces(stm, pt);
        if let Some(sq) = bb.lsb() {
            return Some((sq, pt));
        }
    }
    None
}

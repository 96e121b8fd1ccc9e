//! 指し手の合法性判定
//!
//! - `pseudo_legal`: 置換表・killerなど外部から来た指し手を現局面に対して検証する
//! - `is_legal`: 自玉を取られる手（pin駒の移動・利きのある升への玉移動）と打ち歩詰めを除外する

use crate::bitboard::{aligned, between_bb, enemy_field, pawn_effect, piece_effect};
use crate::movegen::{generate_with_type, ExtMoveBuffer, GenType};
use crate::types::{Color, Move, Piece, PieceType, Square};

use super::pos::Position;

/// from → to の移動で成ることができるか（どちらかが敵陣）
#[inline]
pub(crate) fn can_promote_move(us: Color, from: Square, to: Square) -> bool {
    let zone = enemy_field(us);
    zone.contains(from) || zone.contains(to)
}

/// 成れる移動について、成らない手も生成・許容するか
///
/// `all` が false のときは歩・角・飛の成らずと、3段目以外への香の成らずを省く。
#[inline]
pub(crate) fn allows_non_promotion(pt: PieceType, us: Color, to: Square, all: bool) -> bool {
    let rel = to.rank().relative(us).index();
    match pt {
        PieceType::Pawn => all && rel != 0,
        PieceType::Lance => rel != 0 && (all || rel == 2),
        PieceType::Knight => rel >= 2,
        PieceType::Bishop | PieceType::Rook => all,
        _ => true,
    }
}

/// その駒種をその升に打てるか（行き所のない升を除く）
#[inline]
pub(crate) fn can_drop_on(pt: PieceType, us: Color, to: Square) -> bool {
    let rel = to.rank().relative(us).index();
    match pt {
        PieceType::Pawn | PieceType::Lance => rel != 0,
        PieceType::Knight => rel >= 2,
        _ => true,
    }
}

impl Position {
    /// 指し手が現局面で擬似合法か
    ///
    /// 成らずは駒の行き所がある限りすべて許容する。
    #[inline]
    pub fn pseudo_legal(&self, m: Move) -> bool {
        self.pseudo_legal_with(m, true)
    }

    /// 指し手が現局面で擬似合法か
    ///
    /// `all` が false のときは、指し手生成が省く成らず（歩・角・飛など）を拒否する。
    /// 自玉への王手放置は王手回避の範囲だけ確認し、pinは `is_legal` に任せる。
    pub fn pseudo_legal_with(&self, m: Move, all: bool) -> bool {
        if !m.is_ok() || !m.is_well_formed() {
            return false;
        }

        let us = self.side_to_move();
        let to = m.to();
        let to_pc = self.piece_on(to);

        if m.is_drop() {
            let pt = m.drop_piece_type();
            if !pt.is_hand_type() || !self.hand(us).has(pt) || to_pc.is_some() {
                return false;
            }
            if m.raw() > 0xFFFF && m.moved_piece_after() != Piece::new(us, pt) {
                return false;
            }
            if !can_drop_on(pt, us, to) {
                return false;
            }
            // 二歩
            if pt == PieceType::Pawn && self.pawn_file_mask(us) & (1 << to.file().index()) != 0 {
                return false;
            }

            if self.in_check() {
                // 合い駒のみ（両王手なら打てない）
                let checkers = self.checkers();
                if checkers.more_than_one() {
                    return false;
                }
                let Some(checker) = checkers.lsb() else {
                    return false;
                };
                return between_bb(checker, self.king_square(us)).contains(to);
            }
            return true;
        }

        let from = m.from();
        let pc = self.piece_on(from);
        if pc.is_none() || pc.color() != us {
            return false;
        }
        if to_pc.is_some() && to_pc.color() == us {
            return false;
        }

        // 駒情報付きの指し手は盤面と一致していること
        if m.raw() > 0xFFFF {
            let expected_after = if m.is_promote() { pc.promote() } else { Some(pc) };
            if expected_after != Some(m.moved_piece_after()) || m.captured_piece() != to_pc {
                return false;
            }
        }

        let pt = pc.piece_type();
        if m.is_promote() {
            if !pt.can_promote() || !can_promote_move(us, from, to) {
                return false;
            }
        } else if pt.can_promote()
            && can_promote_move(us, from, to)
            && !allows_non_promotion(pt, us, to, all)
        {
            return false;
        }

        if !piece_effect(pt, us, from, self.occupied()).contains(to) {
            return false;
        }

        if self.in_check() && pt != PieceType::King {
            // 玉以外の駒は、単独の王手駒を取るか合い駒をするしかない
            let checkers = self.checkers();
            if checkers.more_than_one() {
                return false;
            }
            let Some(checker) = checkers.lsb() else {
                return false;
            };
            let target = between_bb(checker, self.king_square(us)) | checkers;
            if !target.contains(to) {
                return false;
            }
        }

        true
    }

    /// 擬似合法手が合法か（自玉が取られないか・打ち歩詰めでないか）
    pub fn is_legal(&self, m: Move) -> bool {
        let us = self.side_to_move();

        if m.is_drop() {
            if m.drop_piece_type() == PieceType::Pawn {
                let to = m.to();
                if pawn_effect(us, to).contains(self.king_square(!us)) {
                    return !self.is_pawn_drop_mate(to);
                }
            }
            return true;
        }

        let from = m.from();
        let to = m.to();

        if self.piece_on(from).piece_type() == PieceType::King {
            // 玉自身を取り除いた占有で利きを見る（玉の陰になっていた升への移動を防ぐ）
            let mut occupied = self.occupied();
            occupied.clear(from);
            return self.attackers_to_c_occ(to, !us, occupied).is_empty();
        }

        // pinされた駒は玉との直線上でしか動けない
        !self.blockers_for_king(us).contains(from) || aligned(from, to, self.king_square(us))
    }

    /// 合法手が1つでもあるか
    ///
    /// 疑似合法手を生成し、最初に合法と分かった時点で打ち切る。
    /// 成れる手の不成は成る手と同じ升の利きで判定されるので省いた生成で足りる。
    pub fn has_legal_move(&self) -> bool {
        let gen_type = if self.in_check() { GenType::Evasions } else { GenType::NonEvasions };
        let mut buffer = ExtMoveBuffer::new();
        generate_with_type(self, gen_type, &mut buffer, None);
        buffer.iter().any(|ext| self.is_legal(ext.mv))
    }

    /// 手番側が詰んでいるか（王手されていて合法手がない）
    #[inline]
    pub fn is_mate(&self) -> bool {
        self.in_check() && !self.has_legal_move()
    }
}

//! 1手詰め判定の補助関数
//!
//! 王手をかける1手を指した後の盤面を、局面を書き換えずに占有Bitboardと
//! 「動いた駒」「消えた駒」の組で表して判定する。

use crate::bitboard::{between_bb, king_effect, piece_effect, Bitboard};
use crate::position::{can_drop_on, Position};
use crate::types::{Color, Move, Piece, PieceType, Square};

/// 王手をかける1手を指した後の仮の盤面
#[derive(Clone, Copy)]
pub(super) struct AfterMove<'a> {
    pos: &'a Position,
    /// 攻め方
    us: Color,
    /// 移動元（駒打ちなら None）
    from: Option<Square>,
    /// 移動先
    to: Square,
    /// 移動後の駒
    piece: Piece,
    /// 指した後の占有
    occupied: Bitboard,
}

impl<'a> AfterMove<'a> {
    pub(super) fn new(pos: &'a Position, m: Move) -> Self {
        let us = pos.side_to_move();
        let to = m.to();
        let mut occupied = pos.occupied();
        occupied.set(to);
        let (from, piece) = if m.is_drop() {
            (None, Piece::new(us, m.drop_piece_type()))
        } else {
            let from = m.from();
            occupied.clear(from);
            let pc = pos.piece_on(from);
            let piece = if m.is_promote() { pc.promote().unwrap_or(pc) } else { pc };
            (Some(from), piece)
        };
        Self {
            pos,
            us,
            from,
            to,
            piece,
            occupied,
        }
    }

    /// 攻め方の駒で sq に利いているもの
    ///
    /// `captured` の升にあった攻め方の駒は取られたものとして除く。
    fn our_attackers(&self, sq: Square, occupied: Bitboard, captured: Option<Square>) -> Bitboard {
        let mut bb = self.pos.attackers_to_c_occ(sq, self.us, occupied);
        if let Some(from) = self.from {
            bb.clear(from);
        }
        if captured != Some(self.to) && piece_effect(self.piece.piece_type(), self.us, self.to, occupied).contains(sq)
        {
            bb.set(self.to);
        }
        if let Some(c) = captured {
            bb.clear(c);
        }
        bb
    }

    /// 受け方の玉以外の駒で sq に利いているもの（移動先で取られた駒は除く）
    fn their_movers(&self, sq: Square) -> Bitboard {
        let them = !self.us;
        let mut bb = self.pos.attackers_to_c_occ(sq, them, self.occupied);
        bb.clear(self.pos.king_square(them));
        bb.clear(self.to);
        bb
    }

    /// 受け方の玉に利いている攻め方の駒（王手駒）
    pub(super) fn checkers(&self) -> Bitboard {
        let ksq = self.pos.king_square(!self.us);
        self.our_attackers(ksq, self.occupied, None)
    }

    /// 受け方の玉が逃げられる升があるか
    ///
    /// 玉自身を取り除いた占有で利きを見るので、王手駒の利きの延長線上にも逃げられない。
    /// 王手駒を玉で取る手もここに含まれる。
    pub(super) fn can_king_escape(&self) -> bool {
        let them = !self.us;
        let ksq = self.pos.king_square(them);
        let mut occ = self.occupied;
        occ.clear(ksq);

        let mut own = self.pos.pieces_c(them);
        own.clear(self.to);
        let around = king_effect(ksq);
        // 玉の周囲が片側のワードに収まっていればそのワードだけを見る
        let escapes = match around.single_part() {
            Some(part) => Bitboard::from_half(part, around.half(part) & !own.half(part)),
            None => around & !own,
        };

        escapes.iter().any(|sq| {
            let captured = if self.occupied.contains(sq) { Some(sq) } else { None };
            self.our_attackers(sq, occ, captured).is_empty()
        })
    }

    /// 受け方の駒が sq へ動いた後に玉が取られないか
    fn is_legal_defence(&self, from: Square, sq: Square) -> bool {
        let ksq = self.pos.king_square(!self.us);
        let mut occ = self.occupied;
        occ.clear(from);
        occ.set(sq);
        let captured = if self.occupied.contains(sq) { Some(sq) } else { None };
        self.our_attackers(ksq, occ, captured).is_empty()
    }

    /// 受け方が王手駒を取るか合い駒をできるか（玉以外の駒による）
    pub(super) fn can_block_or_capture(&self, checker: Square) -> bool {
        let them = !self.us;
        let ksq = self.pos.king_square(them);

        // 王手駒を取る
        for from in self.their_movers(checker).iter() {
            if self.is_legal_defence(from, checker) {
                return true;
            }
        }

        let between = between_bb(checker, ksq);
        if between.is_empty() {
            return false;
        }

        // 移動合い
        for sq in between.iter() {
            for from in self.their_movers(sq).iter() {
                if self.is_legal_defence(from, sq) {
                    return true;
                }
            }
        }

        // 打つ合い駒
        let hand = self.pos.hand(them);
        if hand.is_empty() {
            return false;
        }
        let pawn_files = self.their_pawn_files();
        for sq in between.iter() {
            for pt in PieceType::HAND_TYPES {
                if !hand.has(pt) || !can_drop_on(pt, them, sq) {
                    continue;
                }
                if pt == PieceType::Pawn && pawn_files & (1 << sq.file().index()) != 0 {
                    continue;
                }
                return true;
            }
        }
        false
    }

    /// 指した後の受け方の歩のある筋（移動先で取られた歩の筋は空く）
    fn their_pawn_files(&self) -> u16 {
        let them = !self.us;
        let mut files = self.pos.pawn_file_mask(them);
        if self.pos.piece_on(self.to) == Piece::new(them, PieceType::Pawn) {
            files &= !(1 << self.to.file().index());
        }
        files
    }

    /// 受け方が詰んでいるか
    pub(super) fn is_mate(&self) -> bool {
        let checkers = self.checkers();
        if checkers.is_empty() {
            return false;
        }
        if self.can_king_escape() {
            return false;
        }
        // 両王手は玉が動くしかない
        if checkers.more_than_one() {
            return true;
        }
        match checkers.lsb() {
            Some(checker) => !self.can_block_or_capture(checker),
            None => false,
        }
    }
}

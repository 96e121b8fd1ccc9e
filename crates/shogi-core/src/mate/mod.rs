//! 1手詰め判定
//!
//! 王手のかかっていない局面で、指せば相手が詰む1手を探す。
//! 候補は王手生成（不成含む）で作り、合法性を確かめた上で
//! 「王手駒に支えがあるか玉で取れない」「玉の逃げ場がない」「合い駒・駒取りで防げない」
//! の3つを満たすかを局面を書き換えずに判定する。

mod helpers;

use crate::movegen::{generate_with_type, ExtMoveBuffer, GenType};
use crate::position::Position;
use crate::types::{Move, PieceType, Square};

use helpers::AfterMove;

/// 1手詰めの手を返す（なければ None）
///
/// 王手がかかっている局面では判定せず None を返す。駒打ちを先に調べる。
pub fn mate_1ply(pos: &Position) -> Option<Move> {
    if pos.in_check() {
        return None;
    }

    let mut checks = ExtMoveBuffer::new();
    generate_with_type(pos, GenType::ChecksAll, &mut checks, None);

    let drops = checks.iter().filter(|e| e.mv.is_drop());
    let moves = checks.iter().filter(|e| !e.mv.is_drop());
    for ext in drops.chain(moves) {
        let m = ext.mv;
        // 打ち歩詰めは is_legal が弾く
        if !pos.is_legal(m) {
            continue;
        }
        if AfterMove::new(pos, m).is_mate() {
            return Some(m);
        }
    }
    None
}

impl Position {
    /// 1手詰めの手を返す（なければ None）
    pub fn mate_1ply(&self) -> Option<Move> {
        mate_1ply(self)
    }

    /// to への歩打ちが打ち歩詰めになるか
    pub(crate) fn is_pawn_drop_mate(&self, to: Square) -> bool {
        let m = Move::new_drop(PieceType::Pawn, to);
        AfterMove::new(self, m).is_mate()
    }
}

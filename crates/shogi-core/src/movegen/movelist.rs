//! 指し手リスト

use crate::types::Move;

use super::types::MAX_MOVES;

/// 指し手生成バッファ（スコアなし）
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    /// 空のMoveListを作成
    #[inline]
    pub const fn new() -> Self {
        Self {
            moves: [Move::NONE; MAX_MOVES],
            len: 0,
        }
    }

    /// 指し手の数
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// 空かどうか
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// イテレータを取得
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves[..self.len].iter()
    }

    /// 指定された指し手が含まれているか
    pub fn contains(&self, mv: Move) -> bool {
        self.moves[..self.len].contains(&mv)
    }

    /// i番目の指し手を取得
    #[inline]
    pub fn at(&self, i: usize) -> Move {
        debug_assert!(i < self.len);
        self.moves[i]
    }

    /// 指し手を追加
    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = mv;
        self.len += 1;
    }

    /// 空にする
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// スライスとして取得
    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves[..self.len].iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, PieceType, Rank, Square};

    #[test]
    fn test_movelist_push() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        let sq1 = Square::new(File::File7, Rank::Rank7);
        let sq2 = Square::new(File::File7, Rank::Rank6);
        let mv = Move::new_move(sq1, sq2, false);

        list.push(mv);
        assert_eq!(list.len(), 1);
        assert_eq!(list.at(0), mv);
        assert_eq!(list[0], mv);
        assert!(list.contains(mv));
    }

    #[test]
    fn test_movelist_iter_and_clear() {
        let mut list = MoveList::new();
        list.push(Move::new_drop(PieceType::Pawn, Square::SQ_55));
        list.push(Move::new_drop(PieceType::Gold, Square::SQ_59));
        assert_eq!(list.iter().count(), 2);
        assert_eq!((&list).into_iter().count(), 2);
        list.clear();
        assert!(list.is_empty());
    }
}

//! 手駒（Hand）
//!
//! 7種の手駒枚数を32bitに詰め込んで保持する。
//! 歩: bit0-4, 香: bit5-7, 桂: bit8-10, 銀: bit11-13, 金: bit14-16, 角: bit17-18, 飛: bit19-20

use super::PieceType;

/// 手駒
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Hand(u32);

/// 駒種ごとの (シフト量, マスク)。インデックスは PieceType の値。
const HAND_LAYOUT: [(u32, u32); 8] = [
    (0, 0),
    (0, 0x1F),  // 歩
    (5, 0x07),  // 香
    (8, 0x07),  // 桂
    (11, 0x07), // 銀
    (17, 0x03), // 角
    (19, 0x03), // 飛
    (14, 0x07), // 金
];

impl Hand {
    /// 空の手駒
    pub const EMPTY: Hand = Hand(0);

    /// SFEN出力の駒順（飛角金銀桂香歩）
    pub const SFEN_ORDER: [PieceType; 7] = [
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Gold,
        PieceType::Silver,
        PieceType::Knight,
        PieceType::Lance,
        PieceType::Pawn,
    ];

    /// 生の値から作る
    #[inline]
    pub const fn from_raw(raw: u32) -> Hand {
        Hand(raw)
    }

    /// 生の値
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// 指定駒種の枚数
    #[inline]
    pub const fn count(self, pt: PieceType) -> u32 {
        debug_assert!(pt.is_hand_type());
        let (shift, mask) = HAND_LAYOUT[pt as usize];
        (self.0 >> shift) & mask
    }

    /// 指定駒種を持っているか
    #[inline]
    pub const fn has(self, pt: PieceType) -> bool {
        self.count(pt) > 0
    }

    /// 歩以外の駒を持っているか
    #[inline]
    pub const fn has_except_pawn(self) -> bool {
        self.0 & !HAND_LAYOUT[PieceType::Pawn as usize].1 != 0
    }

    /// 空か
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 1枚加える
    #[inline]
    pub const fn add(self, pt: PieceType) -> Hand {
        debug_assert!(self.count(pt) < HAND_LAYOUT[pt as usize].1);
        Hand(self.0 + (1 << HAND_LAYOUT[pt as usize].0))
    }

    /// 1枚減らす
    #[inline]
    pub const fn sub(self, pt: PieceType) -> Hand {
        debug_assert!(self.count(pt) > 0);
        Hand(self.0 - (1 << HAND_LAYOUT[pt as usize].0))
    }

    /// 枚数を設定する（SFEN読み込み用）
    #[inline]
    pub const fn set(self, pt: PieceType, n: u32) -> Hand {
        let (shift, mask) = HAND_LAYOUT[pt as usize];
        debug_assert!(n <= mask);
        Hand((self.0 & !(mask << shift)) | ((n & mask) << shift))
    }

    /// 全駒種について `self` の枚数が `other` 以上か
    ///
    /// 千日手判定で同一盤面の手駒の優劣を調べるのに使う。
    #[inline]
    pub fn is_superior_or_equal(self, other: Hand) -> bool {
        PieceType::HAND_TYPES
            .iter()
            .all(|&pt| self.count(pt) >= other.count(pt))
    }

    /// 駒種と枚数の組を列挙する（枚数0は除く）
    pub fn iter(self) -> impl Iterator<Item = (PieceType, u32)> {
        PieceType::HAND_TYPES
            .into_iter()
            .map(move |pt| (pt, self.count(pt)))
            .filter(|&(_, n)| n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_add_sub() {
        let mut hand = Hand::EMPTY;
        for _ in 0..18 {
            hand = hand.add(PieceType::Pawn);
        }
        hand = hand.add(PieceType::Rook).add(PieceType::Rook);
        assert_eq!(hand.count(PieceType::Pawn), 18);
        assert_eq!(hand.count(PieceType::Rook), 2);
        assert_eq!(hand.count(PieceType::Bishop), 0);
        hand = hand.sub(PieceType::Rook);
        assert_eq!(hand.count(PieceType::Rook), 1);
        assert!(hand.has_except_pawn());
    }

    #[test]
    fn test_hand_fields_do_not_overlap() {
        let mut hand = Hand::EMPTY;
        for pt in PieceType::HAND_TYPES {
            hand = hand.set(pt, 1);
        }
        for pt in PieceType::HAND_TYPES {
            assert_eq!(hand.count(pt), 1, "{pt:?} の枚数が壊れている");
        }
    }

    #[test]
    fn test_hand_superior() {
        let a = Hand::EMPTY.add(PieceType::Pawn).add(PieceType::Gold);
        let b = Hand::EMPTY.add(PieceType::Pawn);
        assert!(a.is_superior_or_equal(b));
        assert!(!b.is_superior_or_equal(a));
        assert!(a.is_superior_or_equal(a));

        let c = Hand::EMPTY.add(PieceType::Silver);
        assert!(!a.is_superior_or_equal(c));
        assert!(!c.is_superior_or_equal(a));
    }

    #[test]
    fn test_hand_iter() {
        let hand = Hand::EMPTY.add(PieceType::Knight).add(PieceType::Knight);
        let items: Vec<_> = hand.iter().collect();
        assert_eq!(items, vec![(PieceType::Knight, 2)]);
    }
}

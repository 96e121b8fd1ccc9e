//! Bitboard本体
//!
//! 升 sq は `sq < 63` なら p[0] の bit sq、それ以外は p[1] の bit (sq - 63) に対応する。
//! 1-7筋（63升）が p[0]、8-9筋（18升）が p[1] に入る。

use crate::types::Square;

/// 升 → (ワード番号, ビット番号)
const SQUARE_LOCATION: [(u8, u8); Square::NUM] = {
    let mut table = [(0u8, 0u8); Square::NUM];
    let mut sq = 0;
    while sq < Square::NUM {
        table[sq] = if sq < 63 { (0, sq as u8) } else { (1, (sq - 63) as u8) };
        sq += 1;
    }
    table
};

/// 升がどのワードのどのビットに入るか
#[inline]
pub const fn square_location(sq: Square) -> (usize, u32) {
    let (part, bit) = SQUARE_LOCATION[sq.index()];
    (part as usize, bit as u32)
}

/// 81マスの盤面
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C, align(16))]
pub struct Bitboard {
    p: [u64; 2],
}

impl Bitboard {
    /// 空
    pub const EMPTY: Bitboard = Bitboard { p: [0, 0] };
    /// 全升
    pub const ALL: Bitboard = Bitboard {
        p: [0x7FFF_FFFF_FFFF_FFFF, 0x3_FFFF],
    };

    /// 2つのワードから作る
    #[inline]
    pub const fn from_u64_pair(p0: u64, p1: u64) -> Bitboard {
        Bitboard { p: [p0, p1] }
    }

    /// 1升だけのBitboard
    #[inline]
    pub const fn from_square(sq: Square) -> Bitboard {
        let (part, bit) = square_location(sq);
        if part == 0 {
            Bitboard { p: [1u64 << bit, 0] }
        } else {
            Bitboard { p: [0, 1u64 << bit] }
        }
    }

    /// 片側のワードだけから作る
    #[inline]
    pub const fn from_half(part: usize, bits: u64) -> Bitboard {
        if part == 0 { Bitboard { p: [bits, 0] } } else { Bitboard { p: [0, bits] } }
    }

    /// 升が入っているワード番号
    #[inline]
    pub const fn part(sq: Square) -> usize {
        square_location(sq).0
    }

    /// N番目のワードを取り出す
    #[inline]
    pub const fn extract64<const N: usize>(&self) -> u64 {
        self.p[N]
    }

    /// 指定ワードを取り出す
    #[inline]
    pub const fn half(&self, part: usize) -> u64 {
        self.p[part]
    }

    /// 全ビットが同じワードにあればそのワード番号（空なら None）
    #[inline]
    pub const fn single_part(&self) -> Option<usize> {
        match (self.p[0] != 0, self.p[1] != 0) {
            (true, false) => Some(0),
            (false, true) => Some(1),
            _ => None,
        }
    }

    /// 升が含まれるか
    #[inline]
    pub const fn contains(&self, sq: Square) -> bool {
        let (part, bit) = square_location(sq);
        self.p[part] & (1u64 << bit) != 0
    }

    /// 升を立てる
    #[inline]
    pub fn set(&mut self, sq: Square) {
        let (part, bit) = square_location(sq);
        self.p[part] |= 1u64 << bit;
    }

    /// 升を落とす
    #[inline]
    pub fn clear(&mut self, sq: Square) {
        let (part, bit) = square_location(sq);
        self.p[part] &= !(1u64 << bit);
    }

    /// 升を反転する
    #[inline]
    pub fn toggle(&mut self, sq: Square) {
        let (part, bit) = square_location(sq);
        self.p[part] ^= 1u64 << bit;
    }

    /// 空か
    #[inline]
    pub const fn is_empty(&self) -> bool {
        (self.p[0] | self.p[1]) == 0
    }

    /// 立っている升の数
    #[inline]
    pub const fn count(&self) -> u32 {
        self.p[0].count_ones() + self.p[1].count_ones()
    }

    /// 2升以上立っているか
    #[inline]
    pub const fn more_than_one(&self) -> bool {
        if self.p[0] != 0 && self.p[1] != 0 {
            return true;
        }
        let w = self.p[0] | self.p[1];
        w & w.wrapping_sub(1) != 0
    }

    /// `other` の升を除いたもの
    #[inline]
    pub const fn and_not(self, other: Bitboard) -> Bitboard {
        Bitboard {
            p: [self.p[0] & !other.p[0], self.p[1] & !other.p[1]],
        }
    }

    /// 升番号の最も小さい升
    #[inline]
    pub const fn lsb(&self) -> Option<Square> {
        if self.p[0] != 0 {
            Some(Square::from_u8_unchecked(self.p[0].trailing_zeros() as u8))
        } else if self.p[1] != 0 {
            Some(Square::from_u8_unchecked(63 + self.p[1].trailing_zeros() as u8))
        } else {
            None
        }
    }

    /// 升番号の最も大きい升
    #[inline]
    pub const fn msb(&self) -> Option<Square> {
        if self.p[1] != 0 {
            Some(Square::from_u8_unchecked(63 + 63 - self.p[1].leading_zeros() as u8))
        } else if self.p[0] != 0 {
            Some(Square::from_u8_unchecked(63 - self.p[0].leading_zeros() as u8))
        } else {
            None
        }
    }

    /// 最も小さい升を取り出して落とす
    #[inline]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        if self.p[0] != 0 {
            let bit = self.p[0].trailing_zeros();
            self.p[0] &= self.p[0] - 1;
            Some(Square::from_u8_unchecked(bit as u8))
        } else if self.p[1] != 0 {
            let bit = self.p[1].trailing_zeros();
            self.p[1] &= self.p[1] - 1;
            Some(Square::from_u8_unchecked(63 + bit as u8))
        } else {
            None
        }
    }

    /// 升を順に返すイテレータ
    #[inline]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bb: *self }
    }
}

/// Bitboardの升イテレータ（升番号の昇順）
pub struct BitboardIter {
    bb: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        self.bb.pop_lsb()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bb.count() as usize;
        (n, Some(n))
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;

    #[inline]
    fn into_iter(self) -> BitboardIter {
        self.iter()
    }
}

impl std::ops::BitAnd for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitand(self, rhs: Bitboard) -> Bitboard {
        Bitboard {
            p: [self.p[0] & rhs.p[0], self.p[1] & rhs.p[1]],
        }
    }
}

impl std::ops::BitOr for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitor(self, rhs: Bitboard) -> Bitboard {
        Bitboard {
            p: [self.p[0] | rhs.p[0], self.p[1] | rhs.p[1]],
        }
    }
}

impl std::ops::BitXor for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitxor(self, rhs: Bitboard) -> Bitboard {
        Bitboard {
            p: [self.p[0] ^ rhs.p[0], self.p[1] ^ rhs.p[1]],
        }
    }
}

impl std::ops::Not for Bitboard {
    type Output = Bitboard;

    /// 盤外ビットは立てない
    #[inline]
    fn not(self) -> Bitboard {
        Bitboard {
            p: [!self.p[0] & Self::ALL.p[0], !self.p[1] & Self::ALL.p[1]],
        }
    }
}

impl std::ops::BitAndAssign for Bitboard {
    #[inline]
    fn bitand_assign(&mut self, rhs: Bitboard) {
        self.p[0] &= rhs.p[0];
        self.p[1] &= rhs.p[1];
    }
}

impl std::ops::BitOrAssign for Bitboard {
    #[inline]
    fn bitor_assign(&mut self, rhs: Bitboard) {
        self.p[0] |= rhs.p[0];
        self.p[1] |= rhs.p[1];
    }
}

impl std::ops::BitXorAssign for Bitboard {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Bitboard) {
        self.p[0] ^= rhs.p[0];
        self.p[1] ^= rhs.p[1];
    }
}

impl std::fmt::Debug for Bitboard {
    /// 9筋を左にした盤面図で表示する
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Bitboard({:#x}, {:#x})", self.p[0], self.p[1])?;
        for rank in 0..9u8 {
            for file in (0..9u8).rev() {
                let sq = Square::from_u8_unchecked(file * 9 + rank);
                f.write_str(if self.contains(sq) { " *" } else { " ." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    #[test]
    fn test_square_location_boundary() {
        let sq62 = Square::from_u8(62).unwrap();
        let sq63 = Square::from_u8(63).unwrap();
        assert_eq!(square_location(sq62), (0, 62));
        assert_eq!(square_location(sq63), (1, 0));
        assert_eq!(square_location(Square::SQ_99), (1, 17));
    }

    #[test]
    fn test_set_clear_contains() {
        let mut bb = Bitboard::EMPTY;
        for sq in [Square::SQ_11, Square::SQ_55, Square::SQ_99] {
            bb.set(sq);
            assert!(bb.contains(sq));
        }
        assert_eq!(bb.count(), 3);
        bb.clear(Square::SQ_55);
        assert!(!bb.contains(Square::SQ_55));
        assert_eq!(bb.count(), 2);
    }

    #[test]
    fn test_all_has_81_squares() {
        assert_eq!(Bitboard::ALL.count(), 81);
        assert!((!Bitboard::ALL).is_empty());
        assert_eq!((!Bitboard::EMPTY), Bitboard::ALL);
    }

    #[test]
    fn test_lsb_msb_iter() {
        let a = Square::new(File::File3, Rank::Rank4);
        let b = Square::new(File::File8, Rank::Rank2);
        let bb = Bitboard::from_square(a) | Bitboard::from_square(b);
        assert_eq!(bb.lsb(), Some(a));
        assert_eq!(bb.msb(), Some(b));
        let squares: Vec<_> = bb.iter().collect();
        assert_eq!(squares, vec![a, b]);
        assert!(bb.more_than_one());
        assert!(!Bitboard::from_square(b).more_than_one());
        assert_eq!(Bitboard::EMPTY.lsb(), None);
    }

    #[test]
    fn test_single_part() {
        assert_eq!(Bitboard::from_square(Square::SQ_11).single_part(), Some(0));
        assert_eq!(Bitboard::from_square(Square::SQ_99).single_part(), Some(1));
        let both = Bitboard::from_square(Square::SQ_11) | Bitboard::from_square(Square::SQ_99);
        assert_eq!(both.single_part(), None);
        assert_eq!(Bitboard::EMPTY.single_part(), None);
        assert_eq!(Bitboard::from_half(1, both.half(1)), Bitboard::from_square(Square::SQ_99));
    }
}

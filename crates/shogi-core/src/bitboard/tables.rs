//! 筋・段のマスクと近接駒の利きテーブル

use std::sync::OnceLock;

use crate::types::{Color, PieceType, Square};

use super::sliders::{bishop_effect, dragon_effect, horse_effect, lance_effect, rook_effect};
use super::Bitboard;

const fn file_mask(file: usize) -> Bitboard {
    let mut p0 = 0u64;
    let mut p1 = 0u64;
    let mut rank = 0;
    while rank < 9 {
        let sq = file * 9 + rank;
        if sq < 63 {
            p0 |= 1 << sq;
        } else {
            p1 |= 1 << (sq - 63);
        }
        rank += 1;
    }
    Bitboard::from_u64_pair(p0, p1)
}

const fn rank_mask(rank: usize) -> Bitboard {
    let mut p0 = 0u64;
    let mut p1 = 0u64;
    let mut file = 0;
    while file < 9 {
        let sq = file * 9 + rank;
        if sq < 63 {
            p0 |= 1 << sq;
        } else {
            p1 |= 1 << (sq - 63);
        }
        file += 1;
    }
    Bitboard::from_u64_pair(p0, p1)
}

/// 筋ごとのマスク [File]
pub const FILE_BB: [Bitboard; 9] = [
    file_mask(0),
    file_mask(1),
    file_mask(2),
    file_mask(3),
    file_mask(4),
    file_mask(5),
    file_mask(6),
    file_mask(7),
    file_mask(8),
];

/// 段ごとのマスク [Rank]
pub const RANK_BB: [Bitboard; 9] = [
    rank_mask(0),
    rank_mask(1),
    rank_mask(2),
    rank_mask(3),
    rank_mask(4),
    rank_mask(5),
    rank_mask(6),
    rank_mask(7),
    rank_mask(8),
];

/// 敵陣（成れる領域）
#[inline]
pub const fn enemy_field(us: Color) -> Bitboard {
    match us {
        Color::Black => Bitboard::from_u64_pair(
            RANK_BB[0].extract64::<0>() | RANK_BB[1].extract64::<0>() | RANK_BB[2].extract64::<0>(),
            RANK_BB[0].extract64::<1>() | RANK_BB[1].extract64::<1>() | RANK_BB[2].extract64::<1>(),
        ),
        Color::White => Bitboard::from_u64_pair(
            RANK_BB[6].extract64::<0>() | RANK_BB[7].extract64::<0>() | RANK_BB[8].extract64::<0>(),
            RANK_BB[6].extract64::<1>() | RANK_BB[7].extract64::<1>() | RANK_BB[8].extract64::<1>(),
        ),
    }
}

// 先手から見た (筋の差分, 段の差分)。後手は段の差分を反転する。
const PAWN_STEPS: &[(i32, i32)] = &[(0, -1)];
const KNIGHT_STEPS: &[(i32, i32)] = &[(-1, -2), (1, -2)];
const SILVER_STEPS: &[(i32, i32)] = &[(-1, -1), (0, -1), (1, -1), (-1, 1), (1, 1)];
const GOLD_STEPS: &[(i32, i32)] = &[(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (0, 1)];
const KING_STEPS: &[(i32, i32)] = &[
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

struct StepTable {
    pawn: [[Bitboard; Square::NUM]; Color::NUM],
    knight: [[Bitboard; Square::NUM]; Color::NUM],
    silver: [[Bitboard; Square::NUM]; Color::NUM],
    gold: [[Bitboard; Square::NUM]; Color::NUM],
    king: [Bitboard; Square::NUM],
}

static STEP_ATTACKS: OnceLock<StepTable> = OnceLock::new();

#[inline]
fn step_attacks() -> &'static StepTable {
    STEP_ATTACKS.get_or_init(StepTable::new)
}

pub(super) fn init_step_tables() {
    let _ = step_attacks();
}

fn step_effect_of(sq: Square, color: Color, steps: &[(i32, i32)]) -> Bitboard {
    let sign = if color == Color::Black { 1 } else { -1 };
    let mut bb = Bitboard::EMPTY;
    for &(df, dr) in steps {
        if let Some(to) = sq.offset(df, dr * sign) {
            bb.set(to);
        }
    }
    bb
}

impl StepTable {
    fn new() -> Self {
        let mut table = StepTable {
            pawn: [[Bitboard::EMPTY; Square::NUM]; Color::NUM],
            knight: [[Bitboard::EMPTY; Square::NUM]; Color::NUM],
            silver: [[Bitboard::EMPTY; Square::NUM]; Color::NUM],
            gold: [[Bitboard::EMPTY; Square::NUM]; Color::NUM],
            king: [Bitboard::EMPTY; Square::NUM],
        };

        for sq in Square::all() {
            for c in Color::ALL {
                table.pawn[c.index()][sq.index()] = step_effect_of(sq, c, PAWN_STEPS);
                table.knight[c.index()][sq.index()] = step_effect_of(sq, c, KNIGHT_STEPS);
                table.silver[c.index()][sq.index()] = step_effect_of(sq, c, SILVER_STEPS);
                table.gold[c.index()][sq.index()] = step_effect_of(sq, c, GOLD_STEPS);
            }
            table.king[sq.index()] = step_effect_of(sq, Color::Black, KING_STEPS);
        }

        table
    }
}

/// 歩の利き
#[inline]
pub fn pawn_effect(color: Color, sq: Square) -> Bitboard {
    step_attacks().pawn[color.index()][sq.index()]
}

/// 桂の利き
#[inline]
pub fn knight_effect(color: Color, sq: Square) -> Bitboard {
    step_attacks().knight[color.index()][sq.index()]
}

/// 銀の利き
#[inline]
pub fn silver_effect(color: Color, sq: Square) -> Bitboard {
    step_attacks().silver[color.index()][sq.index()]
}

/// 金の利き（と・成香・成桂・成銀も同じ）
#[inline]
pub fn gold_effect(color: Color, sq: Square) -> Bitboard {
    step_attacks().gold[color.index()][sq.index()]
}

/// 玉の利き
#[inline]
pub fn king_effect(sq: Square) -> Bitboard {
    step_attacks().king[sq.index()]
}

/// 駒種と手番を指定した利き（遠方駒は occupied を考慮する）
#[inline]
pub fn piece_effect(pt: PieceType, color: Color, sq: Square, occupied: Bitboard) -> Bitboard {
    match pt {
        PieceType::Pawn => pawn_effect(color, sq),
        PieceType::Lance => lance_effect(color, sq, occupied),
        PieceType::Knight => knight_effect(color, sq),
        PieceType::Silver => silver_effect(color, sq),
        PieceType::Gold
        | PieceType::ProPawn
        | PieceType::ProLance
        | PieceType::ProKnight
        | PieceType::ProSilver => gold_effect(color, sq),
        PieceType::Bishop => bishop_effect(sq, occupied),
        PieceType::Rook => rook_effect(sq, occupied),
        PieceType::King => king_effect(sq),
        PieceType::Horse => horse_effect(sq, occupied),
        PieceType::Dragon => dragon_effect(sq, occupied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    #[test]
    fn test_file_rank_masks() {
        for i in 0..9 {
            assert_eq!(FILE_BB[i].count(), 9);
            assert_eq!(RANK_BB[i].count(), 9);
        }
        assert!(FILE_BB[7].single_part() == Some(1) && FILE_BB[8].single_part() == Some(1));
        assert!(FILE_BB[6].single_part() == Some(0));
        assert_eq!(enemy_field(Color::Black).count(), 27);
        assert!(enemy_field(Color::White).contains(Square::SQ_99));
    }

    #[test]
    fn test_pawn_knight_effect() {
        let sq = Square::new(File::File5, Rank::Rank5);
        assert_eq!(pawn_effect(Color::Black, sq), Bitboard::from_square(Square::new(File::File5, Rank::Rank4)));
        assert_eq!(pawn_effect(Color::White, sq), Bitboard::from_square(Square::new(File::File5, Rank::Rank6)));
        let n = knight_effect(Color::Black, sq);
        assert_eq!(n.count(), 2);
        assert!(n.contains(Square::new(File::File4, Rank::Rank3)));
        assert!(n.contains(Square::new(File::File6, Rank::Rank3)));
        assert!(knight_effect(Color::Black, Square::new(File::File5, Rank::Rank2)).is_empty());
    }

    #[test]
    fn test_gold_silver_king_counts() {
        assert_eq!(gold_effect(Color::Black, Square::SQ_55).count(), 6);
        assert_eq!(silver_effect(Color::White, Square::SQ_55).count(), 5);
        assert_eq!(king_effect(Square::SQ_55).count(), 8);
        assert_eq!(king_effect(Square::SQ_11).count(), 3);
        // 後手の金は後ろ斜めにも利く
        assert!(gold_effect(Color::White, Square::SQ_55).contains(Square::new(File::File4, Rank::Rank6)));
        assert!(!gold_effect(Color::White, Square::SQ_55).contains(Square::new(File::File4, Rank::Rank4)));
    }
}

//! Zobristハッシュ
//!
//! 乱数は固定シードの Xoshiro256++ から生成する。
//! `crate::init()` で一度だけ構築し、以後は読み取り専用。

use std::sync::OnceLock;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::{Color, Piece, PieceType, Square};

/// 乱数シード
const ZOBRIST_SEED: u64 = 0x1234_5678_90AB_CDEF;

/// 手駒枚数の上限（歩18枚）+ 1
const HAND_COUNT_MAX: usize = 19;

/// Zobristハッシュ用乱数テーブル
pub struct Zobrist {
    /// 手番用（後手番のとき盤面キーに XOR する）
    pub side: u64,
    /// 駒×升 [Piece][Square]
    pub psq: [[u64; Square::NUM]; Piece::NUM],
    /// 手駒 [Color][PieceType][枚数]。枚数0のキーは0
    pub hand: [[[u64; HAND_COUNT_MAX]; PieceType::HAND_NUM + 1]; Color::NUM],
}

impl Zobrist {
    fn generate() -> Box<Self> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(ZOBRIST_SEED);
        let mut z = Box::new(Zobrist {
            side: 0,
            psq: [[0; Square::NUM]; Piece::NUM],
            hand: [[[0; HAND_COUNT_MAX]; PieceType::HAND_NUM + 1]; Color::NUM],
        });

        z.side = rng.next_u64();

        // Piece::NONE の行は0のまま
        for pc in 1..Piece::NUM {
            if Piece::from_u8(pc as u8).is_none() {
                continue;
            }
            for sq in 0..Square::NUM {
                z.psq[pc][sq] = rng.next_u64();
            }
        }

        for c in 0..Color::NUM {
            for pt in PieceType::HAND_TYPES {
                for n in 1..HAND_COUNT_MAX {
                    z.hand[c][pt as usize][n] = rng.next_u64();
                }
            }
        }

        z
    }
}

static ZOBRIST: OnceLock<Box<Zobrist>> = OnceLock::new();

/// テーブルを構築する（`crate::init` から呼ばれる）
pub(crate) fn init_zobrist() {
    let _ = zobrist();
}

/// グローバルZobristテーブル
#[inline]
pub fn zobrist() -> &'static Zobrist {
    ZOBRIST.get_or_init(Zobrist::generate)
}

/// 駒と升のハッシュを取得
#[inline]
pub fn zobrist_psq(pc: Piece, sq: Square) -> u64 {
    zobrist().psq[pc.index()][sq.index()]
}

/// 手駒のハッシュを取得（その駒種を `count` 枚持っている状態）
#[inline]
pub fn zobrist_hand(color: Color, pt: PieceType, count: u32) -> u64 {
    debug_assert!(pt.is_hand_type());
    zobrist().hand[color.index()][pt as usize][count as usize]
}

/// 手番のハッシュを取得
#[inline]
pub fn zobrist_side() -> u64 {
    zobrist().side
}

//! 遠方駒（香・角・飛・馬・龍）の利きと、2升間の between / line

use std::sync::OnceLock;

use crate::types::{Color, Square};

use super::tables::king_effect;
use super::Bitboard;

/// 8方向の単一レイ
///
/// 筋番号が増える向きを「左」、段番号が減る向きを「上」とする。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direct {
    RU = 0,
    R = 1,
    RD = 2,
    U = 3,
    D = 4,
    LU = 5,
    L = 6,
    LD = 7,
}

impl Direct {
    /// 方向の数
    pub const NUM: usize = 8;

    /// 全方向
    pub const ALL: [Direct; 8] = [
        Direct::RU,
        Direct::R,
        Direct::RD,
        Direct::U,
        Direct::D,
        Direct::LU,
        Direct::L,
        Direct::LD,
    ];

    /// (筋の差分, 段の差分)
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direct::RU => (-1, -1),
            Direct::R => (-1, 0),
            Direct::RD => (-1, 1),
            Direct::U => (0, -1),
            Direct::D => (0, 1),
            Direct::LU => (1, -1),
            Direct::L => (1, 0),
            Direct::LD => (1, 1),
        }
    }

    /// 逆方向
    #[inline]
    pub const fn opposite(self) -> Direct {
        Self::ALL[7 - self as usize]
    }

    /// 升番号が増える向きか（最も近い駒は lsb で求まる）
    #[inline]
    const fn is_ascending(self) -> bool {
        let (df, dr) = self.delta();
        df * 9 + dr > 0
    }

    /// 斜め方向か
    #[inline]
    pub const fn is_diagonal(self) -> bool {
        let (df, dr) = self.delta();
        df != 0 && dr != 0
    }
}

struct RayTable {
    /// 方向ごとのレイ（起点を含まない）[Direct][Square]
    rays: [[Bitboard; Square::NUM]; Direct::NUM],
    /// 2升の間（両端を含まない）[Square][Square]
    between: Box<[[Bitboard; Square::NUM]; Square::NUM]>,
    /// 2升を通る直線（両端を含む、盤端まで）[Square][Square]
    line: Box<[[Bitboard; Square::NUM]; Square::NUM]>,
}

static RAYS: OnceLock<RayTable> = OnceLock::new();

#[inline]
fn ray_table() -> &'static RayTable {
    RAYS.get_or_init(RayTable::new)
}

pub(super) fn init_ray_tables() {
    let _ = ray_table();
}

impl RayTable {
    fn new() -> Self {
        let mut rays = [[Bitboard::EMPTY; Square::NUM]; Direct::NUM];
        for d in Direct::ALL {
            let (df, dr) = d.delta();
            for sq in Square::all() {
                let mut bb = Bitboard::EMPTY;
                let mut cur = sq.offset(df, dr);
                while let Some(s) = cur {
                    bb.set(s);
                    cur = s.offset(df, dr);
                }
                rays[d as usize][sq.index()] = bb;
            }
        }

        let mut between = Box::new([[Bitboard::EMPTY; Square::NUM]; Square::NUM]);
        let mut line = Box::new([[Bitboard::EMPTY; Square::NUM]; Square::NUM]);
        for a in Square::all() {
            for b in Square::all() {
                if let Some(d) = direct_of(a, b) {
                    let back = d.opposite();
                    between[a.index()][b.index()] =
                        rays[d as usize][a.index()] & rays[back as usize][b.index()];
                    line[a.index()][b.index()] = rays[d as usize][a.index()]
                        | rays[back as usize][a.index()]
                        | Bitboard::from_square(a);
                }
            }
        }

        RayTable {
            rays,
            between,
            line,
        }
    }
}

/// `from` から見た `to` の方向（同一直線上になければ None）
#[inline]
pub fn direct_of(from: Square, to: Square) -> Option<Direct> {
    if from == to {
        return None;
    }
    let df = to.file().index() as i32 - from.file().index() as i32;
    let dr = to.rank().index() as i32 - from.rank().index() as i32;
    if df != 0 && dr != 0 && df.abs() != dr.abs() {
        return None;
    }
    let d = match (df.signum(), dr.signum()) {
        (-1, -1) => Direct::RU,
        (-1, 0) => Direct::R,
        (-1, 1) => Direct::RD,
        (0, -1) => Direct::U,
        (0, 1) => Direct::D,
        (1, -1) => Direct::LU,
        (1, 0) => Direct::L,
        _ => Direct::LD,
    };
    Some(d)
}

/// 盤上の駒を考慮しないレイ（起点を含まない）
#[inline]
pub fn ray_bb(d: Direct, sq: Square) -> Bitboard {
    ray_table().rays[d as usize][sq.index()]
}

/// 1方向のレイの利き（最初にぶつかった駒の升を含む）
#[inline]
pub fn ray_effect(d: Direct, sq: Square, occupied: Bitboard) -> Bitboard {
    let table = ray_table();
    let ray = table.rays[d as usize][sq.index()];
    let blockers = ray & occupied;
    let nearest = if d.is_ascending() {
        blockers.lsb()
    } else {
        blockers.msb()
    };
    match nearest {
        Some(b) => ray.and_not(table.rays[d as usize][b.index()]),
        None => ray,
    }
}

/// 2升の間（両端を含まない）。同一直線上になければ空
#[inline]
pub fn between_bb(a: Square, b: Square) -> Bitboard {
    ray_table().between[a.index()][b.index()]
}

/// 2升を通る直線（盤端まで）。同一直線上になければ空
#[inline]
pub fn line_bb(a: Square, b: Square) -> Bitboard {
    ray_table().line[a.index()][b.index()]
}

/// 3升が同一直線上にあるか
#[inline]
pub fn aligned(a: Square, b: Square, c: Square) -> bool {
    line_bb(a, b).contains(c)
}

/// 盤上の駒を考慮しない香の利き
#[inline]
pub fn lance_step_effect(color: Color, sq: Square) -> Bitboard {
    match color {
        Color::Black => ray_bb(Direct::U, sq),
        Color::White => ray_bb(Direct::D, sq),
    }
}

/// 盤上の駒を考慮しない角の利き
#[inline]
pub fn bishop_step_effect(sq: Square) -> Bitboard {
    ray_bb(Direct::RU, sq) | ray_bb(Direct::RD, sq) | ray_bb(Direct::LU, sq) | ray_bb(Direct::LD, sq)
}

/// 盤上の駒を考慮しない飛車の利き
#[inline]
pub fn rook_step_effect(sq: Square) -> Bitboard {
    ray_bb(Direct::R, sq) | ray_bb(Direct::U, sq) | ray_bb(Direct::D, sq) | ray_bb(Direct::L, sq)
}

/// 香の利き
#[inline]
pub fn lance_effect(color: Color, sq: Square, occupied: Bitboard) -> Bitboard {
    match color {
        Color::Black => ray_effect(Direct::U, sq, occupied),
        Color::White => ray_effect(Direct::D, sq, occupied),
    }
}

/// 角の利き
#[inline]
pub fn bishop_effect(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_effect(Direct::RU, sq, occupied)
        | ray_effect(Direct::RD, sq, occupied)
        | ray_effect(Direct::LU, sq, occupied)
        | ray_effect(Direct::LD, sq, occupied)
}

/// 飛車の利き
#[inline]
pub fn rook_effect(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_effect(Direct::R, sq, occupied)
        | ray_effect(Direct::U, sq, occupied)
        | ray_effect(Direct::D, sq, occupied)
        | ray_effect(Direct::L, sq, occupied)
}

/// 馬の利き
#[inline]
pub fn horse_effect(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_effect(sq, occupied) | king_effect(sq)
}

/// 龍の利き
#[inline]
pub fn dragon_effect(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_effect(sq, occupied) | king_effect(sq)
}

//! 評価値（Value）・境界（Bound）・深さ定数・駒価値
//!
//! 値のスケールは歩 = 90 を基準とする。

use super::{Piece, PieceType};

/// 評価値
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Value(i32);

impl Value {
    /// ゼロ
    pub const ZERO: Value = Value(0);
    /// 引き分け
    pub const DRAW: Value = Value(0);
    /// 詰み（勝ち側の最大スコア）
    pub const MATE: Value = Value(32000);
    /// 無限大
    pub const INFINITE: Value = Value(32001);
    /// 無効値
    pub const NONE: Value = Value(32002);

    /// 最大探索深度内での詰みスコア
    pub const MATE_IN_MAX_PLY: Value = Value(Self::MATE.0 - 128);
    /// 最大探索深度内での詰まされスコア
    pub const MATED_IN_MAX_PLY: Value = Value(-Self::MATE_IN_MAX_PLY.0);

    /// 値から生成
    #[inline]
    pub const fn new(v: i32) -> Value {
        Value(v)
    }

    /// ply手で詰ますスコア
    #[inline]
    pub const fn mate_in(ply: i32) -> Value {
        Value(Self::MATE.0 - ply)
    }

    /// ply手で詰まされるスコア
    #[inline]
    pub const fn mated_in(ply: i32) -> Value {
        Value(-Self::MATE.0 + ply)
    }

    /// 生の値を取得
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl std::ops::Neg for Value {
    type Output = Value;

    #[inline]
    fn neg(self) -> Value {
        Value(-self.0)
    }
}

impl std::ops::Add for Value {
    type Output = Value;

    #[inline]
    fn add(self, rhs: Value) -> Value {
        Value(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Value {
    type Output = Value;

    #[inline]
    fn sub(self, rhs: Value) -> Value {
        Value(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Value {
    #[inline]
    fn add_assign(&mut self, rhs: Value) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Value {
    #[inline]
    fn sub_assign(&mut self, rhs: Value) {
        self.0 -= rhs.0;
    }
}

/// 置換表に保存する値の境界
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Bound {
    #[default]
    None = 0,
    /// 上界（fail low）
    Upper = 1,
    /// 下界（fail high）
    Lower = 2,
    /// 確定値
    Exact = 3,
}

impl Bound {
    /// u8から変換
    #[inline]
    pub const fn from_u8(v: u8) -> Option<Bound> {
        match v {
            0 => Some(Bound::None),
            1 => Some(Bound::Upper),
            2 => Some(Bound::Lower),
            3 => Some(Bound::Exact),
            _ => None,
        }
    }

    /// 下界を含むか
    #[inline]
    pub const fn is_lower(self) -> bool {
        (self as u8) & (Bound::Lower as u8) != 0
    }

    /// 上界を含むか
    #[inline]
    pub const fn is_upper(self) -> bool {
        (self as u8) & (Bound::Upper as u8) != 0
    }
}

/// 探索深さ
pub type Depth = i32;

/// 静止探索の深さ（王手を生成する）
pub const DEPTH_QS: Depth = 0;
/// 静止探索の深さ（王手を生成しない）
pub const DEPTH_QS_NO_CHECKS: Depth = -1;
/// これ以下の静止探索深さでは直前の移動先への取り返しのみ
pub const DEPTH_QS_RECAPTURES: Depth = -5;
/// 未探索（置換表の評価値キャッシュのみ）
pub const DEPTH_NONE: Depth = -6;
/// 置換表エントリの深さオフセット（depth8 = depth - DEPTH_ENTRY_OFFSET）
pub const DEPTH_ENTRY_OFFSET: Depth = -7;

/// 盤上の駒種の価値
pub const fn piece_value(pt: PieceType) -> i32 {
    match pt {
        PieceType::Pawn => 90,
        PieceType::Lance => 315,
        PieceType::Knight => 405,
        PieceType::Silver => 495,
        PieceType::Gold
        | PieceType::ProPawn
        | PieceType::ProLance
        | PieceType::ProKnight
        | PieceType::ProSilver => 540,
        PieceType::Bishop => 855,
        PieceType::Rook => 990,
        PieceType::Horse => 945,
        PieceType::Dragon => 1395,
        PieceType::King => 15000,
    }
}

/// 駒を取ったときに得る価値（駒なしは 0）
#[inline]
pub const fn capture_value(pc: Piece) -> i32 {
    if pc.is_none() { 0 } else { piece_value(pc.piece_type()) }
}

/// 成りによる価値の増分（成れない駒種は 0）
#[inline]
pub const fn promotion_bonus(pt: PieceType) -> i32 {
    match pt.promote() {
        Some(promoted) => piece_value(promoted) - piece_value(pt),
        None => 0,
    }
}

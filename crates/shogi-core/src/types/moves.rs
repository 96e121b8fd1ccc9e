//! 指し手（Move）
//!
//! 32bitの指し手表現。
//! - bit0-6: 移動先
//! - bit7-13: 移動元（駒打ちのときは打つ駒種）
//! - bit14: 駒打ちフラグ
//! - bit15: 成りフラグ
//! - bit16-23: 移動後の駒（成りなら成駒）
//! - bit24-31: 捕獲した駒（なければ 0）
//!
//! 下位16bitが置換表に保存される部分で、上位16bitは生成時に局面から付与される。

use thiserror::Error;

use super::{Piece, PieceType, Square};

/// USI形式の指し手文字列の解析エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("move string has invalid length: {0:?}")]
    InvalidLength(String),
    #[error("invalid square in move string: {0:?}")]
    InvalidSquare(String),
    #[error("invalid drop piece in move string: {0:?}")]
    InvalidDropPiece(String),
    #[error("move is not possible in this position: {0}")]
    NotApplicable(String),
}

/// 指し手
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(u32);

impl Move {
    const TO_MASK: u32 = 0x7F;
    const FROM_SHIFT: u32 = 7;
    const FROM_MASK: u32 = 0x7F;
    const DROP_FLAG: u32 = 1 << 14;
    const PROMOTE_FLAG: u32 = 1 << 15;
    const PIECE_SHIFT: u32 = 16;
    const CAPTURED_SHIFT: u32 = 24;

    /// 指し手なし
    pub const NONE: Move = Move(0);
    /// null move（from=to=1 の特殊値）
    pub const NULL: Move = Move((1 << 7) | 1);

    /// 盤上の移動（駒情報なし）
    #[inline]
    pub const fn new_move(from: Square, to: Square, promote: bool) -> Move {
        let mut raw = ((from.raw() as u32) << Self::FROM_SHIFT) | to.raw() as u32;
        if promote {
            raw |= Self::PROMOTE_FLAG;
        }
        Move(raw)
    }

    /// 駒打ち（駒情報なし）
    #[inline]
    pub const fn new_drop(pt: PieceType, to: Square) -> Move {
        Move(((pt as u32) << Self::FROM_SHIFT) | Self::DROP_FLAG | to.raw() as u32)
    }

    /// 盤上の移動（移動後の駒と捕獲した駒を付与）
    #[inline]
    pub const fn make_move(
        from: Square,
        to: Square,
        promote: bool,
        moved_after: Piece,
        captured: Piece,
    ) -> Move {
        let base = Self::new_move(from, to, promote).0;
        Move(
            base | ((moved_after.raw() as u32) << Self::PIECE_SHIFT)
                | ((captured.raw() as u32) << Self::CAPTURED_SHIFT),
        )
    }

    /// 駒打ち（打つ駒を付与）
    #[inline]
    pub const fn make_drop(pc: Piece, to: Square) -> Move {
        let base = Self::new_drop(pc.piece_type(), to).0;
        Move(base | ((pc.raw() as u32) << Self::PIECE_SHIFT))
    }

    /// 生の値から作る
    #[inline]
    pub const fn from_raw(raw: u32) -> Move {
        Move(raw)
    }

    /// 16bit表現から作る（駒情報なし）
    #[inline]
    pub const fn from_u16(v: u16) -> Move {
        Move(v as u32)
    }

    /// 生の値
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// 16bit表現（置換表保存用）
    #[inline]
    pub const fn to_u16(self) -> u16 {
        self.0 as u16
    }

    /// 移動先
    #[inline]
    pub const fn to(self) -> Square {
        Square::from_u8_unchecked((self.0 & Self::TO_MASK) as u8)
    }

    /// 移動元（駒打ちに対して呼ばないこと）
    #[inline]
    pub const fn from(self) -> Square {
        debug_assert!(!self.is_drop());
        Square::from_u8_unchecked(((self.0 >> Self::FROM_SHIFT) & Self::FROM_MASK) as u8)
    }

    /// 移動元の生の値（駒打ちなら駒種）
    #[inline]
    pub(crate) const fn from_raw_bits(self) -> u8 {
        ((self.0 >> Self::FROM_SHIFT) & Self::FROM_MASK) as u8
    }

    /// 駒打ちか
    #[inline]
    pub const fn is_drop(self) -> bool {
        self.0 & Self::DROP_FLAG != 0
    }

    /// 成りか
    #[inline]
    pub const fn is_promote(self) -> bool {
        self.0 & Self::PROMOTE_FLAG != 0
    }

    /// 打つ駒種（駒打ちに対してのみ有効）
    #[inline]
    pub const fn drop_piece_type(self) -> PieceType {
        debug_assert!(self.is_drop());
        match PieceType::from_u8(self.from_raw_bits()) {
            Some(pt) => pt,
            None => PieceType::Pawn,
        }
    }

    /// 移動後の駒（成りなら成駒）。駒情報のない指し手では `Piece::NONE`
    #[inline]
    pub const fn moved_piece_after(self) -> Piece {
        match Piece::from_u8((self.0 >> Self::PIECE_SHIFT) as u8) {
            Some(pc) => pc,
            None => Piece::NONE,
        }
    }

    /// 移動前の駒
    #[inline]
    pub const fn moved_piece_before(self) -> Piece {
        let pc = self.moved_piece_after();
        if self.is_promote() && pc.is_some() { pc.unpromote() } else { pc }
    }

    /// 捕獲した駒（なければ `Piece::NONE`）
    #[inline]
    pub const fn captured_piece(self) -> Piece {
        match Piece::from_u8((self.0 >> Self::CAPTURED_SHIFT) as u8) {
            Some(pc) => pc,
            None => Piece::NONE,
        }
    }

    /// 駒を取る手か
    #[inline]
    pub const fn is_capture(self) -> bool {
        self.0 >> Self::CAPTURED_SHIFT != 0
    }

    /// 駒を取る手または成る手か
    #[inline]
    pub const fn is_capture_or_promotion(self) -> bool {
        self.is_capture() || self.is_promote()
    }

    /// 指し手なしか
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// 指し手なし以外か
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// 普通の指し手か（NONE / NULL 以外）
    #[inline]
    pub const fn is_ok(self) -> bool {
        (self.0 & 0xFFFF) != 0 && (self.0 & 0xFFFF) != Self::NULL.0
    }

    /// 升番号・駒種の範囲が正しいか（局面との整合は見ない）
    #[inline]
    pub const fn is_well_formed(self) -> bool {
        let to_ok = (self.0 & Self::TO_MASK) < Square::NUM as u32;
        let from = self.from_raw_bits();
        let from_ok = if self.is_drop() {
            match PieceType::from_u8(from) {
                Some(pt) => pt.is_hand_type() && !self.is_promote(),
                None => false,
            }
        } else {
            (from as usize) < Square::NUM
        };
        to_ok && from_ok
    }

    /// USI形式の文字列
    pub fn to_usi(self) -> String {
        if self.is_none() {
            return "none".to_string();
        }
        if self.0 & 0xFFFF == Self::NULL.0 {
            return "null".to_string();
        }
        if !self.is_well_formed() {
            return format!("invalid({:#x})", self.0);
        }
        if self.is_drop() {
            format!("{}*{}", self.drop_piece_type().to_usi_char(), self.to().to_usi())
        } else {
            let promote = if self.is_promote() { "+" } else { "" };
            format!("{}{}{}", self.from().to_usi(), self.to().to_usi(), promote)
        }
    }

    /// USI形式の文字列から16bit指し手を作る（駒情報は付与されない）
    ///
    /// 局面に合わせた駒情報の付与は `Position::move_from_usi` を使う。
    pub fn from_usi(s: &str) -> Result<Move, MoveParseError> {
        let bytes = s.as_bytes();
        if bytes.len() < 4 || bytes.len() > 5 {
            return Err(MoveParseError::InvalidLength(s.to_string()));
        }

        if bytes[1] == b'*' {
            if bytes.len() != 4 {
                return Err(MoveParseError::InvalidLength(s.to_string()));
            }
            let pt = PieceType::from_usi_char(bytes[0] as char)
                .filter(|pt| pt.is_hand_type() && bytes[0].is_ascii_uppercase())
                .ok_or_else(|| MoveParseError::InvalidDropPiece(s.to_string()))?;
            let to = s
                .get(2..4)
                .and_then(Square::from_usi)
                .ok_or_else(|| MoveParseError::InvalidSquare(s.to_string()))?;
            return Ok(Move::new_drop(pt, to));
        }

        let from = s
            .get(0..2)
            .and_then(Square::from_usi)
            .ok_or_else(|| MoveParseError::InvalidSquare(s.to_string()))?;
        let to = s
            .get(2..4)
            .and_then(Square::from_usi)
            .ok_or_else(|| MoveParseError::InvalidSquare(s.to_string()))?;
        let promote = match bytes.get(4) {
            None => false,
            Some(b'+') => true,
            Some(_) => return Err(MoveParseError::InvalidLength(s.to_string())),
        };
        Ok(Move::new_move(from, to, promote))
    }
}

impl std::fmt::Debug for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Move({})", self.to_usi())
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_usi())
    }
}

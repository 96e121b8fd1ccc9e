//! 駒種（PieceType）と駒（Piece）

use super::Color;

/// 駒種
///
/// 成駒は生駒 + 8（金を除く）。`King` は 8 で、成駒の基準にもなる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 1,
    Lance = 2,
    Knight = 3,
    Silver = 4,
    Bishop = 5,
    Rook = 6,
    Gold = 7,
    King = 8,
    ProPawn = 9,
    ProLance = 10,
    ProKnight = 11,
    ProSilver = 12,
    Horse = 13,
    Dragon = 14,
}

impl PieceType {
    /// 駒種の数（1-origin なので配列長は NUM + 1）
    pub const NUM: usize = 14;

    /// 手駒になる駒種の数
    pub const HAND_NUM: usize = 7;

    /// 全駒種
    pub const ALL: [PieceType; 14] = [
        PieceType::Pawn,
        PieceType::Lance,
        PieceType::Knight,
        PieceType::Silver,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Gold,
        PieceType::King,
        PieceType::ProPawn,
        PieceType::ProLance,
        PieceType::ProKnight,
        PieceType::ProSilver,
        PieceType::Horse,
        PieceType::Dragon,
    ];

    /// 手駒になる駒種（SFEN出力順とは別。Hand のビット配置順）
    pub const HAND_TYPES: [PieceType; 7] = [
        PieceType::Pawn,
        PieceType::Lance,
        PieceType::Knight,
        PieceType::Silver,
        PieceType::Gold,
        PieceType::Bishop,
        PieceType::Rook,
    ];

    /// u8から駒種に変換
    #[inline]
    pub const fn from_u8(n: u8) -> Option<PieceType> {
        if n >= 1 && n <= 14 {
            Some(Self::ALL[(n - 1) as usize])
        } else {
            None
        }
    }

    /// インデックスとして使用
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 成れる駒種か（歩・香・桂・銀・角・飛）
    #[inline]
    pub const fn can_promote(self) -> bool {
        matches!(
            self,
            PieceType::Pawn
                | PieceType::Lance
                | PieceType::Knight
                | PieceType::Silver
                | PieceType::Bishop
                | PieceType::Rook
        )
    }

    /// 成駒か
    #[inline]
    pub const fn is_promoted(self) -> bool {
        self as u8 > PieceType::King as u8
    }

    /// 成った駒種（成れない駒種は None）
    #[inline]
    pub const fn promote(self) -> Option<PieceType> {
        if self.can_promote() {
            Self::from_u8(self as u8 + 8)
        } else {
            None
        }
    }

    /// 生駒に戻した駒種
    #[inline]
    pub const fn unpromote(self) -> PieceType {
        if self.is_promoted() {
            Self::ALL[(self as u8 - 8 - 1) as usize]
        } else {
            self
        }
    }

    /// 金と同じ動きをする駒種か（金・と・成香・成桂・成銀）
    #[inline]
    pub const fn is_gold_like(self) -> bool {
        matches!(
            self,
            PieceType::Gold
                | PieceType::ProPawn
                | PieceType::ProLance
                | PieceType::ProKnight
                | PieceType::ProSilver
        )
    }

    /// 手駒になる駒種か
    #[inline]
    pub const fn is_hand_type(self) -> bool {
        (self as u8) <= PieceType::Gold as u8
    }

    /// SFEN/USIの駒文字（先手側の大文字、生駒のみ）
    pub const fn to_usi_char(self) -> char {
        match self.unpromote() {
            PieceType::Pawn => 'P',
            PieceType::Lance => 'L',
            PieceType::Knight => 'N',
            PieceType::Silver => 'S',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Gold => 'G',
            _ => 'K',
        }
    }

    /// SFEN/USIの駒文字（大文字小文字を問わない）から生駒の駒種に変換
    pub const fn from_usi_char(c: char) -> Option<PieceType> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceType::Pawn),
            'L' => Some(PieceType::Lance),
            'N' => Some(PieceType::Knight),
            'S' => Some(PieceType::Silver),
            'B' => Some(PieceType::Bishop),
            'R' => Some(PieceType::Rook),
            'G' => Some(PieceType::Gold),
            'K' => Some(PieceType::King),
            _ => None,
        }
    }
}

/// 駒（手番 + 駒種）
///
/// 下位4bitが駒種、bit4が手番。0 は駒なし。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Piece(u8);

impl Piece {
    /// 配列長（後手の龍 = 30 まで収まる）
    pub const NUM: usize = 32;

    pub const NONE: Piece = Piece(0);

    pub const B_PAWN: Piece = Piece(1);
    pub const B_LANCE: Piece = Piece(2);
    pub const B_KNIGHT: Piece = Piece(3);
    pub const B_SILVER: Piece = Piece(4);
    pub const B_BISHOP: Piece = Piece(5);
    pub const B_ROOK: Piece = Piece(6);
    pub const B_GOLD: Piece = Piece(7);
    pub const B_KING: Piece = Piece(8);
    pub const B_PRO_PAWN: Piece = Piece(9);
    pub const B_PRO_LANCE: Piece = Piece(10);
    pub const B_PRO_KNIGHT: Piece = Piece(11);
    pub const B_PRO_SILVER: Piece = Piece(12);
    pub const B_HORSE: Piece = Piece(13);
    pub const B_DRAGON: Piece = Piece(14);

    pub const W_PAWN: Piece = Piece(17);
    pub const W_LANCE: Piece = Piece(18);
    pub const W_KNIGHT: Piece = Piece(19);
    pub const W_SILVER: Piece = Piece(20);
    pub const W_BISHOP: Piece = Piece(21);
    pub const W_ROOK: Piece = Piece(22);
    pub const W_GOLD: Piece = Piece(23);
    pub const W_KING: Piece = Piece(24);
    pub const W_PRO_PAWN: Piece = Piece(25);
    pub const W_PRO_LANCE: Piece = Piece(26);
    pub const W_PRO_KNIGHT: Piece = Piece(27);
    pub const W_PRO_SILVER: Piece = Piece(28);
    pub const W_HORSE: Piece = Piece(29);
    pub const W_DRAGON: Piece = Piece(30);

    /// 手番と駒種から駒を作る
    #[inline]
    pub const fn new(color: Color, pt: PieceType) -> Piece {
        Piece(((color as u8) << 4) | pt as u8)
    }

    /// u8から駒に変換（駒なし・範囲外は None）
    #[inline]
    pub const fn from_u8(n: u8) -> Option<Piece> {
        if n & !0x1F == 0 && PieceType::from_u8(n & 0x0F).is_some() {
            Some(Piece(n))
        } else {
            None
        }
    }

    /// 駒なしか
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// 駒があるか
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// 手番
    #[inline]
    pub const fn color(self) -> Color {
        if self.0 & 0x10 == 0 { Color::Black } else { Color::White }
    }

    /// 駒種（駒なしに対して呼ばないこと）
    #[inline]
    pub const fn piece_type(self) -> PieceType {
        debug_assert!(self.0 != 0);
        match PieceType::from_u8(self.0 & 0x0F) {
            Some(pt) => pt,
            None => PieceType::King,
        }
    }

    /// インデックスとして使用
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 生の値
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 成った駒（成れない駒は None）
    #[inline]
    pub const fn promote(self) -> Option<Piece> {
        match self.piece_type().promote() {
            Some(pt) => Some(Piece::new(self.color(), pt)),
            None => None,
        }
    }

    /// 生駒に戻した駒
    #[inline]
    pub const fn unpromote(self) -> Piece {
        Piece::new(self.color(), self.piece_type().unpromote())
    }

    /// SFENの駒表記（成駒は '+' 付き）
    pub fn to_sfen(self) -> String {
        let pt = self.piece_type();
        let c = pt.to_usi_char();
        let c = if self.color() == Color::White { c.to_ascii_lowercase() } else { c };
        if pt.is_promoted() { format!("+{c}") } else { c.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_new() {
        assert_eq!(Piece::new(Color::Black, PieceType::Pawn), Piece::B_PAWN);
        assert_eq!(Piece::new(Color::White, PieceType::Dragon), Piece::W_DRAGON);
        assert_eq!(Piece::W_GOLD.color(), Color::White);
        assert_eq!(Piece::W_GOLD.piece_type(), PieceType::Gold);
    }

    #[test]
    fn test_promote_unpromote() {
        assert_eq!(PieceType::Pawn.promote(), Some(PieceType::ProPawn));
        assert_eq!(PieceType::Rook.promote(), Some(PieceType::Dragon));
        assert_eq!(PieceType::Gold.promote(), None);
        assert_eq!(PieceType::King.promote(), None);
        assert_eq!(PieceType::Horse.unpromote(), PieceType::Bishop);
        assert_eq!(PieceType::ProSilver.unpromote(), PieceType::Silver);
        assert_eq!(Piece::W_SILVER.promote(), Some(Piece::W_PRO_SILVER));
        assert_eq!(Piece::B_DRAGON.unpromote(), Piece::B_ROOK);
    }

    #[test]
    fn test_piece_from_u8() {
        assert_eq!(Piece::from_u8(0), None);
        assert_eq!(Piece::from_u8(15), None);
        assert_eq!(Piece::from_u8(16), None);
        assert_eq!(Piece::from_u8(30), Some(Piece::W_DRAGON));
        assert_eq!(Piece::from_u8(31), None);
    }

    #[test]
    fn test_piece_to_sfen() {
        assert_eq!(Piece::B_PAWN.to_sfen(), "P");
        assert_eq!(Piece::W_HORSE.to_sfen(), "+b");
        assert_eq!(Piece::W_KING.to_sfen(), "k");
    }

    #[test]
    fn test_gold_like() {
        assert!(PieceType::ProKnight.is_gold_like());
        assert!(PieceType::Gold.is_gold_like());
        assert!(!PieceType::Silver.is_gold_like());
        assert!(!PieceType::Horse.is_gold_like());
    }
}

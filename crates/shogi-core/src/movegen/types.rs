//! 指し手生成の型定義

use crate::types::Move;

/// 1局面での最大合法手数
/// 理論上の最大は593手だが、余裕を持たせる
pub const MAX_MOVES: usize = 600;

/// 指し手生成のタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenType {
    /// 駒を取らない指し手
    Quiets,
    /// 駒を取る指し手
    Captures,
    /// 駒を取らない指し手（不成含む）
    QuietsAll,
    /// 駒を取る指し手（不成含む）
    CapturesAll,
    /// 駒を取る指し手 + 駒を取らない歩の成り
    CapturesProPlus,
    /// 駒を取らない指し手 - 歩の成り
    QuietsProMinus,
    /// 駒を取る指し手 + 駒を取らない歩の成り（不成含む）
    CapturesProPlusAll,
    /// 駒を取らない指し手 - 歩の成り（不成含む）
    QuietsProMinusAll,
    /// 王手回避手
    Evasions,
    /// 王手回避手（不成含む）
    EvasionsAll,
    /// 王手がかかっていない全ての手
    NonEvasions,
    /// 王手がかかっていない全ての手（不成含む）
    NonEvasionsAll,
    /// 合法手すべて（is_legal()チェック付き）
    Legal,
    /// 合法手すべて（不成含む）
    LegalAll,
    /// 王手となる指し手
    Checks,
    /// 王手となる指し手（不成含む）
    ChecksAll,
    /// 駒を取らない王手
    QuietChecks,
    /// 駒を取らない王手（不成含む）
    QuietChecksAll,
    /// 指定升への再捕獲
    Recaptures,
    /// 指定升への再捕獲（不成含む）
    RecapturesAll,
}

impl GenType {
    /// 不成も含めて生成するタイプか
    #[inline]
    pub const fn includes_non_promotions(self) -> bool {
        matches!(
            self,
            Self::QuietsAll
                | Self::CapturesAll
                | Self::CapturesProPlusAll
                | Self::QuietsProMinusAll
                | Self::EvasionsAll
                | Self::NonEvasionsAll
                | Self::LegalAll
                | Self::ChecksAll
                | Self::QuietChecksAll
                | Self::RecapturesAll
        )
    }

    /// 不成を含むかどうかだけを切り替えたタイプ
    pub const fn with_non_promotions(self, all: bool) -> GenType {
        use GenType::*;
        match (self, all) {
            (Quiets | QuietsAll, false) => Quiets,
            (Quiets | QuietsAll, true) => QuietsAll,
            (Captures | CapturesAll, false) => Captures,
            (Captures | CapturesAll, true) => CapturesAll,
            (CapturesProPlus | CapturesProPlusAll, false) => CapturesProPlus,
            (CapturesProPlus | CapturesProPlusAll, true) => CapturesProPlusAll,
            (QuietsProMinus | QuietsProMinusAll, false) => QuietsProMinus,
            (QuietsProMinus | QuietsProMinusAll, true) => QuietsProMinusAll,
            (Evasions | EvasionsAll, false) => Evasions,
            (Evasions | EvasionsAll, true) => EvasionsAll,
            (NonEvasions | NonEvasionsAll, false) => NonEvasions,
            (NonEvasions | NonEvasionsAll, true) => NonEvasionsAll,
            (Legal | LegalAll, false) => Legal,
            (Legal | LegalAll, true) => LegalAll,
            (Checks | ChecksAll, false) => Checks,
            (Checks | ChecksAll, true) => ChecksAll,
            (QuietChecks | QuietChecksAll, false) => QuietChecks,
            (QuietChecks | QuietChecksAll, true) => QuietChecksAll,
            (Recaptures | RecapturesAll, false) => Recaptures,
            (Recaptures | RecapturesAll, true) => RecapturesAll,
        }
    }
}

/// 指し手とスコアのペア（オーダリング用）
#[derive(Debug, Clone, Copy)]
pub struct ExtMove {
    /// 指し手
    pub mv: Move,
    /// オーダリング用スコア
    pub value: i32,
}

impl ExtMove {
    /// 空のExtMove
    pub const EMPTY: ExtMove = ExtMove {
        mv: Move::NONE,
        value: 0,
    };

    /// 新しいExtMoveを作成
    #[inline]
    pub const fn new(mv: Move, value: i32) -> Self {
        Self { mv, value }
    }
}

impl From<Move> for ExtMove {
    #[inline]
    fn from(mv: Move) -> Self {
        Self { mv, value: 0 }
    }
}

impl PartialOrd for ExtMove {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExtMove {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl PartialEq for ExtMove {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for ExtMove {}

/// 指し手生成バッファ（固定長、スコア付き）
pub struct ExtMoveBuffer {
    moves: [ExtMove; MAX_MOVES],
    len: usize,
}

impl ExtMoveBuffer {
    /// 空のバッファ
    #[inline]
    pub const fn new() -> Self {
        Self {
            moves: [ExtMove::EMPTY; MAX_MOVES],
            len: 0,
        }
    }

    /// 要素数
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// 空かどうか
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 指し手を追加（スコア 0）
    #[inline]
    pub fn push_move(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = ExtMove::new(mv, 0);
        self.len += 1;
    }

    /// スコア付きで追加
    #[inline]
    pub fn push(&mut self, ext: ExtMove) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = ext;
        self.len += 1;
    }

    /// i番目の要素
    #[inline]
    pub fn get(&self, i: usize) -> ExtMove {
        debug_assert!(i < self.len);
        self.moves[i]
    }

    /// i番目の要素を置き換える
    #[inline]
    pub fn set(&mut self, i: usize, ext: ExtMove) {
        debug_assert!(i < self.len);
        self.moves[i] = ext;
    }

    /// i番目のスコアを設定
    #[inline]
    pub fn set_value(&mut self, i: usize, value: i32) {
        debug_assert!(i < self.len);
        self.moves[i].value = value;
    }

    /// 2要素を入れ替える
    #[inline]
    pub fn swap(&mut self, i: usize, j: usize) {
        self.moves.swap(i, j);
    }

    /// 長さを設定（切り詰め用）
    #[inline]
    pub fn set_len(&mut self, len: usize) {
        debug_assert!(len <= MAX_MOVES);
        self.len = len;
    }

    /// 空にする
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// イテレータ
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ExtMove> {
        self.moves[..self.len].iter()
    }

    /// スライスとして取得
    #[inline]
    pub fn as_slice(&self) -> &[ExtMove] {
        &self.moves[..self.len]
    }

    /// 可変スライスとして取得
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [ExtMove] {
        &mut self.moves[..self.len]
    }

    /// 指し手が含まれているか
    pub fn contains(&self, mv: Move) -> bool {
        self.iter().any(|e| e.mv == mv)
    }
}

impl Default for ExtMoveBuffer {
    fn default() -> Self {
        Self::new()
    }
}

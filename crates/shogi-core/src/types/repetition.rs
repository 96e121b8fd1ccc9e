//! 千日手判定の結果

/// 千日手判定の結果（手番側から見た分類）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepetitionState {
    /// 千日手ではない
    #[default]
    None,
    /// 通常の千日手（引き分け）
    Draw,
    /// 連続王手の千日手（相手が王手し続けた = 手番側の勝ち）
    Win,
    /// 連続王手の千日手（手番側が王手し続けた = 手番側の負け）
    Lose,
    /// 同一盤面で手駒が以前より多い（優等局面）
    Superior,
    /// 同一盤面で手駒が以前より少ない（劣等局面）
    Inferior,
}

impl RepetitionState {
    /// 千日手として扱われる結果か
    #[inline]
    pub const fn is_repetition(self) -> bool {
        !matches!(self, RepetitionState::None)
    }
}

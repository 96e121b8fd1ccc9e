//! 指し手オーダリング
//!
//! - `MovePicker`: 探索の種類ごとに段階的に指し手を返す
//! - `HistoryTables`: 順序付けに使う履歴統計（探索ドライバが更新する）

mod history;
mod picker;

pub use history::{
    from_to_index, stat_bonus, ButterflyHistory, ContinuationHistory, CounterMoveHistory,
    HistoryTables, PieceToHistory, StatsEntry, FROM_TO_SIZE,
};
pub use picker::MovePicker;

//! 静的テーブルの初期化
//!
//! Zobrist乱数・近接駒の利き・遠方駒のレイ・between/lineテーブルを
//! 依存順に一度だけ構築する。複数スレッドから同時に呼ばれても安全。

use std::sync::Once;

static INIT_ONCE: Once = Once::new();

/// 全テーブルを初期化する（2回目以降の呼び出しは何もしない）
///
/// 初期化順: Zobrist → 近接駒の利き → レイ → between/line
pub fn init() {
    INIT_ONCE.call_once(|| {
        crate::position::zobrist::init_zobrist();
        crate::bitboard::init_tables();
        log::debug!("shogi-core: static tables initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::king_effect;
    use crate::types::Square;

    #[test]
    fn test_init_is_idempotent() {
        init();
        let before = crate::position::zobrist::zobrist_side();
        init();
        assert_eq!(crate::position::zobrist::zobrist_side(), before, "再初期化で値が変わった");
        assert_eq!(king_effect(Square::SQ_55).count(), 8);
    }
}

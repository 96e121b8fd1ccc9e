//! ビットボードモジュール
//!
//! 81マスの盤面を2つの64bitワードで表現し、利き計算を提供する。
//!
//! - `Bitboard`: 縦型の2ワード盤面表現（p[0]=1-7筋, p[1]=8-9筋）
//! - 升→(ワード, ビット) の対応表と、片側ワードだけを扱うヘルパー
//! - 筋・段のマスク（`FILE_BB`, `RANK_BB`）
//! - 近接駒の利きテーブル（歩・桂・銀・金・玉）
//! - 遠方駒の利き計算（香・角・飛・馬・龍、`between_bb` / `line_bb` / `direct_of`）

mod core;
mod sliders;
mod tables;

pub use self::core::{square_location, Bitboard, BitboardIter};
pub use sliders::*;
pub use tables::*;

/// 利きテーブルを構築する（`crate::init` から呼ばれる）
pub(crate) fn init_tables() {
    tables::init_step_tables();
    sliders::init_ray_tables();
}

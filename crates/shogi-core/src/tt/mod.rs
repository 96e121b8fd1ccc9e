//! 置換表モジュール
//!
//! 探索結果をキャッシュする置換表（Transposition Table）。
//!
//! - `TTEntry`: エントリ（16バイト、32bitキー）
//! - `Cluster`: エントリのグループ（64バイト = 1キャッシュライン）
//! - `TranspositionTable`: テーブル本体
//! - 世代管理
//! - prefetch
//!
//! クラスターインデックスは64bitキーの下位ビット、クラスター内のマッチングには上位32bitを使う。
//! エントリの読み書きはロックを取らない。複数スレッドから同時に書かれると
//! 別局面のデータが読めることがあるので、取り出した指し手は必ず
//! `Position::to_move` / `pseudo_legal` / `is_legal` で確かめてから使うこと。

mod entry;
mod table;

use thiserror::Error;

pub use entry::{TTData, TTEntry};
pub use table::{Cluster, ProbeResult, TranspositionTable};

/// クラスターサイズ（エントリ数）
pub const CLUSTER_SIZE: usize = 4;

/// Generation関連の定数
pub const GENERATION_BITS: u32 = 3;
pub const GENERATION_DELTA: u8 = 1 << GENERATION_BITS; // 8
pub const GENERATION_CYCLE: u16 = 255 + GENERATION_DELTA as u16;
pub const GENERATION_MASK: u16 = 0xF8; // (0xFF << GENERATION_BITS) as u8

/// 置換表の確保エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TtError {
    /// 1クラスターも確保できないサイズ
    #[error("hash size {requested_mb} MB cannot hold a single cluster")]
    TooSmall { requested_mb: usize },
}

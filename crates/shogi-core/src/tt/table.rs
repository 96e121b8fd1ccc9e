//! TranspositionTable本体
//!
//! - Cluster: エントリのグループ
//! - TranspositionTable: テーブル本体
//! - probe/write操作

use std::sync::atomic::{AtomicU8, Ordering};

use super::entry::{TTData, TTEntry};
use super::{TtError, CLUSTER_SIZE, GENERATION_BITS, GENERATION_DELTA};
use crate::config::CoreOptions;
use crate::types::{Bound, Move, Value};

/// クラスター構造
/// 同じハッシュインデックスに対して複数のエントリを持つ
/// 16bytes × 4 = 64bytes（キャッシュライン1本）
#[repr(C, align(64))]
pub struct Cluster {
    entries: [TTEntry; CLUSTER_SIZE],
}

impl Cluster {
    /// 新しいクラスターを作成
    const fn new() -> Self {
        Self {
            entries: [TTEntry::new(), TTEntry::new(), TTEntry::new(), TTEntry::new()],
        }
    }

    fn clear(&self) {
        for entry in &self.entries {
            entry.clear();
        }
    }
}

impl Default for Cluster {
    fn default() -> Self {
        Self::new()
    }
}

// クラスターは64バイトであることを保証（キャッシュラインサイズ）
const _: () = assert!(std::mem::size_of::<Cluster>() == 64);

const MB: usize = 1024 * 1024;

/// 置換表
pub struct TranspositionTable {
    /// クラスターの配列
    table: Vec<Cluster>,
    /// 世代カウンター（下位3bitは使用しない）
    generation8: AtomicU8,
}

impl TranspositionTable {
    /// 新しい置換表を作成（サイズはMB単位）
    pub fn new(mb_size: usize) -> Result<Self, TtError> {
        let mut tt = Self {
            table: Vec::new(),
            generation8: AtomicU8::new(0),
        };
        tt.resize(mb_size)?;
        Ok(tt)
    }

    /// オプションのハッシュサイズで作成
    pub fn with_options(options: &CoreOptions) -> Result<Self, TtError> {
        Self::new(options.hash_mb)
    }

    /// mb_size に収まる最大の2の冪のクラスター数
    fn cluster_count_for(mb_size: usize) -> usize {
        let fit = mb_size.saturating_mul(MB) / std::mem::size_of::<Cluster>();
        if fit == 0 {
            0
        } else {
            1 << (usize::BITS - 1 - fit.leading_zeros())
        }
    }

    /// サイズを変更（内容は消える）
    pub fn resize(&mut self, mb_size: usize) -> Result<(), TtError> {
        let new_count = Self::cluster_count_for(mb_size);
        if new_count == 0 {
            log::warn!("rejected transposition table resize to {mb_size} MB");
            return Err(TtError::TooSmall {
                requested_mb: mb_size,
            });
        }

        if new_count != self.table.len() {
            self.table = Vec::new();
            self.table = (0..new_count).map(|_| Cluster::new()).collect();
            log::info!(
                "transposition table allocated: {} clusters ({} MB)",
                new_count,
                new_count * std::mem::size_of::<Cluster>() / MB
            );
        } else {
            self.clear();
        }
        self.generation8.store(0, Ordering::Relaxed);
        Ok(())
    }

    /// クラスター数
    pub fn cluster_count(&self) -> usize {
        self.table.len()
    }

    /// クリア
    pub fn clear(&mut self) {
        self.generation8.store(0, Ordering::Relaxed);
        let len = self.table.len();
        let threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

        // サイズが小さい場合やスレッド数が1の場合は逐次クリア
        if threads <= 1 || len < threads * 1024 {
            for cluster in &self.table {
                cluster.clear();
            }
            return;
        }

        let chunk = len.div_ceil(threads);
        std::thread::scope(|scope| {
            for part in self.table.chunks(chunk) {
                scope.spawn(move || {
                    for cluster in part {
                        cluster.clear();
                    }
                });
            }
        });
    }

    /// 新しい探索を開始（世代を進める）
    pub fn new_search(&self) {
        self.generation8.fetch_add(GENERATION_DELTA, Ordering::Relaxed);
    }

    /// 現在の世代を取得
    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation8.load(Ordering::Relaxed)
    }

    /// 置換表を検索
    ///
    /// ヒットしなければ置き換え候補（深さが浅く古いもの）のエントリを返す。
    /// 候補が空であるとは限らない。
    pub fn probe(&self, key: u64) -> ProbeResult<'_> {
        let key32 = (key >> 32) as u32;
        let cluster = self.first_entry(key);
        let gen8 = self.generation();

        for entry in &cluster.entries {
            if entry.key32() == key32 && entry.is_occupied() {
                entry.refresh(gen8);
                return ProbeResult {
                    found: true,
                    data: entry.read(),
                    key32,
                    writer: entry,
                };
            }
        }

        // 置換するエントリを選択（価値が最小のもの）
        let mut replace = &cluster.entries[0];
        let mut min_value = i32::MAX;
        for entry in &cluster.entries {
            let value = entry.depth8() as i32 - entry.relative_age(gen8) as i32;
            if value < min_value {
                min_value = value;
                replace = entry;
            }
        }

        ProbeResult {
            found: false,
            data: TTData::EMPTY,
            key32,
            writer: replace,
        }
    }

    /// 置換表の使用率を1000分率で返す
    pub fn hashfull(&self, max_age: u8) -> i32 {
        let max_age_internal = max_age << GENERATION_BITS;
        let gen8 = self.generation();
        let sample_count = 1000.min(self.table.len());
        if sample_count == 0 {
            return 0;
        }

        let mut count = 0;
        for cluster in self.table.iter().take(sample_count) {
            for entry in &cluster.entries {
                if entry.is_occupied() && entry.relative_age(gen8) <= max_age_internal {
                    count += 1;
                }
            }
        }

        (count * 1000 / (sample_count * CLUSTER_SIZE)) as i32
    }

    /// クラスターインデックスを計算
    #[inline]
    fn cluster_index(&self, key: u64) -> usize {
        key as usize & (self.table.len() - 1)
    }

    /// クラスターの参照を取得
    #[inline]
    fn first_entry(&self, key: u64) -> &Cluster {
        &self.table[self.cluster_index(key)]
    }

    /// 指定キーのクラスターをプリフェッチ
    #[inline]
    pub fn prefetch(&self, key: u64) {
        let cluster = self.first_entry(key);

        #[cfg(target_arch = "x86_64")]
        // SAFETY: プリフェッチはメモリを読み書きせず、有効な参照から得たアドレスを渡している
        unsafe {
            use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
            _mm_prefetch::<_MM_HINT_T0>(cluster as *const Cluster as *const i8);
        }

        #[cfg(not(target_arch = "x86_64"))]
        let _ = cluster; // 何もしない
    }
}

/// probe結果
pub struct ProbeResult<'a> {
    /// ヒットしたか
    pub found: bool,
    /// 読み取ったデータ
    pub data: TTData,
    key32: u32,
    /// 書き込み用エントリ
    writer: &'a TTEntry,
}

impl ProbeResult<'_> {
    /// エントリに書き込む
    #[allow(clippy::too_many_arguments)]
    pub fn write(
        &self,
        value: Value,
        is_pv: bool,
        bound: Bound,
        depth: i32,
        mv: Move,
        eval: Value,
        generation8: u8,
    ) {
        self.writer.save(self.key32, value, is_pv, bound, depth, mv, eval, generation8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn test_tt_new() {
        let tt = TranspositionTable::new(1).unwrap();
        assert_eq!(tt.cluster_count(), MB / 64);
        assert_eq!(tt.generation(), 0);
    }

    #[test]
    fn test_tt_power_of_two() {
        let tt = TranspositionTable::new(3).unwrap();
        assert_eq!(tt.cluster_count(), 2 * MB / 64, "3MBなら2MB分のクラスター");
        assert!(tt.cluster_count().is_power_of_two());
    }

    #[test]
    fn test_tt_too_small() {
        assert_eq!(
            TranspositionTable::new(0).err(),
            Some(TtError::TooSmall { requested_mb: 0 })
        );
        let mut tt = TranspositionTable::new(1).unwrap();
        assert!(tt.resize(0).is_err());
        assert_eq!(tt.cluster_count(), MB / 64, "失敗時はサイズを変えない");
    }

    #[test]
    fn test_tt_new_search() {
        let tt = TranspositionTable::new(1).unwrap();
        tt.new_search();
        assert_eq!(tt.generation(), GENERATION_DELTA);
        tt.new_search();
        assert_eq!(tt.generation(), GENERATION_DELTA * 2);
    }

    #[test]
    fn test_tt_probe_and_write() {
        let pos = Position::startpos();
        let tt = TranspositionTable::new(1).unwrap();
        let key = pos.key();
        let mv = pos.move_from_usi("7g7f").unwrap();

        // 最初はヒットしない
        let probe1 = tt.probe(key);
        assert!(!probe1.found);
        probe1.write(Value::new(50), true, Bound::Exact, 10, mv, Value::ZERO, tt.generation());

        // 2回目はヒット
        let probe2 = tt.probe(key);
        assert!(probe2.found);
        assert_eq!(probe2.data.value.raw(), 50);
        assert_eq!(probe2.data.bound, Bound::Exact);
        assert_eq!(pos.to_move(probe2.data.mv), Some(mv), "16bitの手から駒情報を復元できる");
    }

    #[test]
    fn test_tt_same_cluster_different_key() {
        let tt = TranspositionTable::new(1).unwrap();
        let k1 = 0x0000_0001_0000_0005u64;
        let k2 = 0x0000_0002_0000_0005u64;
        tt.probe(k1).write(Value::new(1), false, Bound::Lower, 4, Move::NONE, Value::ZERO, 0);
        tt.probe(k2).write(Value::new(2), false, Bound::Lower, 4, Move::NONE, Value::ZERO, 0);
        assert_eq!(tt.probe(k1).data.value.raw(), 1);
        assert_eq!(tt.probe(k2).data.value.raw(), 2);
    }

    #[test]
    fn test_tt_hashfull() {
        let tt = TranspositionTable::new(1).unwrap();
        assert_eq!(tt.hashfull(0), 0);
        for i in 0..4000u64 {
            tt.probe(i).write(Value::ZERO, false, Bound::Lower, 1, Move::NONE, Value::ZERO, 0);
        }
        // 先頭1000クラスターにそれぞれ1エントリずつ入っている
        assert_eq!(tt.hashfull(0), 250);
    }

    #[test]
    fn test_tt_clear() {
        let pos = Position::startpos();
        let mut tt = TranspositionTable::new(1).unwrap();
        let key = pos.key();

        tt.probe(key).write(Value::new(100), false, Bound::Lower, 10, Move::NONE, Value::ZERO, 0);
        tt.clear();
        assert!(!tt.probe(key).found);
    }

    #[test]
    fn test_tt_resize() {
        let mut tt = TranspositionTable::new(1).unwrap();
        let initial_count = tt.cluster_count();

        tt.resize(2).unwrap();
        assert_eq!(tt.cluster_count(), initial_count * 2);

        tt.resize(1).unwrap();
        assert_eq!(tt.cluster_count(), initial_count);
    }

    #[test]
    fn test_with_options() {
        let opts = CoreOptions {
            hash_mb: 2,
            ..CoreOptions::default()
        };
        let tt = TranspositionTable::with_options(&opts).unwrap();
        assert_eq!(tt.cluster_count(), 2 * MB / 64);
    }
}

//! 置換表エントリー
//!
//! TTEntry: 2つの64bitワードに詰めたエントリ（ワード単位でアトミックに読み書きする）
//! TTData: 読み取り用のデータ構造

use std::sync::atomic::{AtomicU64, Ordering};

use super::{GENERATION_CYCLE, GENERATION_MASK};
use crate::types::{Bound, Move, Value, DEPTH_ENTRY_OFFSET};

/// 置換表エントリー
///
/// word0: key32 | move16 << 32 | value16 << 48
/// word1: eval16 | depth8 << 16 | gen_bound8 << 24
///
/// gen_bound8 は generation(5bit) | pv(1bit) | bound(2bit)。
/// 2ワードの間で書き込みが割り込むと食い違ったデータが読めるが、キーの照合と
/// 指し手の再検証で吸収する。
#[derive(Default)]
#[repr(C, align(16))]
pub struct TTEntry {
    word0: AtomicU64,
    word1: AtomicU64,
}

// エントリサイズが16バイトであることを保証
const _: () = assert!(std::mem::size_of::<TTEntry>() == 16);

/// ワードから取り出したフィールド
#[derive(Clone, Copy)]
struct Fields {
    key32: u32,
    move16: u16,
    value16: i16,
    eval16: i16,
    depth8: u8,
    gen_bound8: u8,
}

impl Fields {
    #[inline]
    fn unpack(w0: u64, w1: u64) -> Self {
        Self {
            key32: w0 as u32,
            move16: (w0 >> 32) as u16,
            value16: (w0 >> 48) as u16 as i16,
            eval16: w1 as u16 as i16,
            depth8: (w1 >> 16) as u8,
            gen_bound8: (w1 >> 24) as u8,
        }
    }

    #[inline]
    fn pack(self) -> (u64, u64) {
        let w0 = self.key32 as u64 | (self.move16 as u64) << 32 | (self.value16 as u16 as u64) << 48;
        let w1 = self.eval16 as u16 as u64 | (self.depth8 as u64) << 16 | (self.gen_bound8 as u64) << 24;
        (w0, w1)
    }
}

impl TTEntry {
    /// 新しい空のエントリを作成
    #[inline]
    pub const fn new() -> Self {
        Self {
            word0: AtomicU64::new(0),
            word1: AtomicU64::new(0),
        }
    }

    #[inline]
    fn load(&self) -> Fields {
        Fields::unpack(self.word0.load(Ordering::Relaxed), self.word1.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, f: Fields) {
        let (w0, w1) = f.pack();
        self.word1.store(w1, Ordering::Relaxed);
        self.word0.store(w0, Ordering::Relaxed);
    }

    /// エントリが使用されているか
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.depth8() != 0
    }

    /// キー（64bitキーの上位32bit）を取得
    #[inline]
    pub fn key32(&self) -> u32 {
        self.word0.load(Ordering::Relaxed) as u32
    }

    /// 深さを取得（DEPTH_ENTRY_OFFSETを加算）
    #[inline]
    pub fn depth(&self) -> i32 {
        self.depth8() as i32 + DEPTH_ENTRY_OFFSET
    }

    /// 保存されている生のdepth8を取得
    #[inline]
    pub fn depth8(&self) -> u8 {
        (self.word1.load(Ordering::Relaxed) >> 16) as u8
    }

    #[inline]
    fn gen_bound8(&self) -> u8 {
        (self.word1.load(Ordering::Relaxed) >> 24) as u8
    }

    /// エントリを読み取る
    ///
    /// 指し手は16bit形式のまま返す（駒情報は `Position::to_move` で付与する）。
    pub fn read(&self) -> TTData {
        let f = self.load();
        TTData {
            mv: Move::from_u16(f.move16),
            value: Value::new(f.value16 as i32),
            eval: Value::new(f.eval16 as i32),
            depth: f.depth8 as i32 + DEPTH_ENTRY_OFFSET,
            bound: Bound::from_u8(f.gen_bound8 & 0x3).unwrap_or(Bound::None),
            is_pv: (f.gen_bound8 & 0x4) != 0,
        }
    }

    /// 世代だけを現在のものに更新する（ヒット時）
    pub(super) fn refresh(&self, generation8: u8) {
        let mut f = self.load();
        f.gen_bound8 = generation8 | (f.gen_bound8 & 0x7);
        self.store(f);
    }

    /// エントリに保存
    ///
    /// ホットパスなので構造体にまとめず個別の引数で受け取る。
    #[allow(clippy::too_many_arguments)]
    pub fn save(
        &self,
        key32: u32,
        value: Value,
        is_pv: bool,
        bound: Bound,
        depth: i32,
        mv: Move,
        eval: Value,
        generation8: u8,
    ) {
        let mut f = self.load();

        // 新しい手がない場合は古い手を保持
        if mv != Move::NONE || key32 != f.key32 {
            f.move16 = mv.to_u16();
        }

        // 上書き条件：
        // - BOUND_EXACT（確定値）
        // - 異なるキー
        // - 浅すぎない探索 or PVノード優先
        // - 古いエントリ
        let d8 = depth - DEPTH_ENTRY_OFFSET;
        if bound == Bound::Exact
            || key32 != f.key32
            || d8 + 2 * (is_pv as i32) > f.depth8 as i32 - 4
            || relative_age(f.gen_bound8, generation8) != 0
        {
            debug_assert!(d8 > 0 && d8 < 256);

            f.key32 = key32;
            f.depth8 = d8 as u8;
            f.gen_bound8 = generation8 | ((is_pv as u8) << 2) | bound as u8;
            f.value16 = value.raw() as i16;
            f.eval16 = eval.raw() as i16;
        } else if f.depth8 as i32 + DEPTH_ENTRY_OFFSET >= 5
            && Bound::from_u8(f.gen_bound8 & 0x3) != Some(Bound::Exact)
        {
            // EXACT以外の深い項目はわずかに劣化させる
            f.depth8 = f.depth8.saturating_sub(1);
        }

        self.store(f);
    }

    /// 相対的な世代（0 = 最新）
    #[inline]
    pub fn relative_age(&self, generation8: u8) -> u8 {
        relative_age(self.gen_bound8(), generation8)
    }

    /// 空に戻す
    pub(super) fn clear(&self) {
        self.word1.store(0, Ordering::Relaxed);
        self.word0.store(0, Ordering::Relaxed);
    }
}

#[inline]
fn relative_age(gen_bound8: u8, generation8: u8) -> u8 {
    let age = GENERATION_CYCLE
        .wrapping_add(generation8 as u16)
        .wrapping_sub(gen_bound8 as u16);
    (age & GENERATION_MASK) as u8
}

/// 置換表から読み取ったデータ
#[derive(Clone, Copy, Debug)]
pub struct TTData {
    /// 最善手（16bit形式）
    pub mv: Move,
    /// 探索値
    pub value: Value,
    /// 評価値
    pub eval: Value,
    /// 探索深さ
    pub depth: i32,
    /// 境界タイプ
    pub bound: Bound,
    /// PVノードかどうか
    pub is_pv: bool,
}

impl TTData {
    /// 空のデータ
    pub const EMPTY: Self = Self {
        mv: Move::NONE,
        value: Value::NONE,
        eval: Value::NONE,
        depth: DEPTH_ENTRY_OFFSET,
        bound: Bound::None,
        is_pv: false,
    };
}

impl Default for TTData {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank, Square};

    #[test]
    fn test_tt_entry_new() {
        let entry = TTEntry::new();
        assert!(!entry.is_occupied());
        assert_eq!(entry.key32(), 0);
    }

    #[test]
    fn test_tt_entry_save_and_read() {
        let entry = TTEntry::new();

        let key = 0x1234_5678u32;
        let from = Square::new(File::File7, Rank::Rank7);
        let to = Square::new(File::File7, Rank::Rank6);
        let mv = Move::new_move(from, to, false);

        entry.save(key, Value::new(100), true, Bound::Exact, 10, mv, Value::new(-50), 8);

        assert!(entry.is_occupied());
        assert_eq!(entry.key32(), key);

        let data = entry.read();
        assert_eq!(data.mv, mv);
        assert_eq!(data.value.raw(), 100);
        assert_eq!(data.eval.raw(), -50);
        assert_eq!(data.depth, 10);
        assert_eq!(data.bound, Bound::Exact);
        assert!(data.is_pv);
    }

    #[test]
    fn test_tt_entry_negative_values() {
        let entry = TTEntry::new();
        entry.save(1, Value::new(-31000), false, Bound::Upper, 0, Move::NONE, Value::new(-1), 0);
        let data = entry.read();
        assert_eq!(data.value.raw(), -31000);
        assert_eq!(data.eval.raw(), -1);
        assert_eq!(data.bound, Bound::Upper);
    }

    #[test]
    fn test_tt_entry_keeps_move_when_none() {
        let entry = TTEntry::new();
        let mv = Move::new_move(Square::SQ_59, Square::SQ_55, false);
        entry.save(7, Value::ZERO, false, Bound::Lower, 3, mv, Value::ZERO, 0);
        entry.save(7, Value::ZERO, false, Bound::Lower, 4, Move::NONE, Value::ZERO, 0);
        assert_eq!(entry.read().mv, mv, "同一キーで手なしなら古い手を残す");
    }

    #[test]
    fn test_tt_entry_relative_age() {
        let entry = TTEntry::new();
        entry.save(0, Value::ZERO, false, Bound::Lower, 10, Move::NONE, Value::ZERO, 8);

        // 同じ世代では0
        assert_eq!(entry.relative_age(8), 0);

        // 世代が進むと8刻みでageが増える（GENERATION_DELTA = 8）
        assert_eq!(entry.relative_age(16), 8);

        entry.refresh(16);
        assert_eq!(entry.relative_age(16), 0);
        assert_eq!(entry.read().bound, Bound::Lower, "世代更新で境界は変わらない");
    }

    #[test]
    fn test_tt_entry_shallow_does_not_replace_exact() {
        let entry = TTEntry::new();
        entry.save(9, Value::new(300), false, Bound::Exact, 12, Move::NONE, Value::ZERO, 0);
        entry.save(9, Value::new(-20), false, Bound::Lower, 2, Move::NONE, Value::ZERO, 0);
        let data = entry.read();
        assert_eq!(data.value.raw(), 300);
        assert_eq!(data.bound, Bound::Exact);
        assert_eq!(data.depth, 12);
    }

    #[test]
    fn test_tt_entry_decay_non_exact() {
        let entry = TTEntry::new();
        let key = 0x1234u32;

        entry.save(key, Value::ZERO, false, Bound::Lower, 8, Move::NONE, Value::ZERO, 0);
        let depth_before = entry.depth8();

        // 同一世代・同一キー・浅いLowerを保存すると深さが1減衰する
        entry.save(key, Value::ZERO, false, Bound::Lower, 1, Move::NONE, Value::ZERO, 0);
        assert_eq!(entry.depth8(), depth_before - 1);
    }

    #[test]
    fn test_tt_data_empty() {
        let data = TTData::EMPTY;
        assert_eq!(data.mv, Move::NONE);
        assert_eq!(data.bound, Bound::None);
        assert!(!data.is_pv);
    }
}

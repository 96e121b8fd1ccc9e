//! History統計
//!
//! 探索中の静かな手の成功/失敗を記録し、手の順序付けに利用する。
//!
//! - `StatsEntry`: 範囲制限付き履歴エントリ
//! - `ButterflyHistory`: [Color][from_to] -> score
//! - `PieceToHistory`: [piece][to] -> score
//! - `ContinuationHistory`: [prev_pc][prev_to][pc][to] -> score
//! - `CounterMoveHistory`: [piece][to] -> Move

use crate::position::Position;
use crate::types::{Color, Depth, Move, Piece, PieceType, Square};

/// from_toインデックスのサイズ
/// from = 81 + (駒種 - 1) で駒打ちを表す
pub const FROM_TO_SIZE: usize = (Square::NUM + PieceType::HAND_NUM) * Square::NUM;

/// 駒の数（NONE含む）
const PIECE_NUM: usize = Piece::NUM;

/// ButterflyHistoryの値の上限
const BUTTERFLY_MAX: i32 = 7183;

/// PieceToHistoryの値の上限
const PIECE_TO_MAX: i32 = 30000;

/// 指し手の from_to インデックス
#[inline]
pub fn from_to_index(m: Move) -> usize {
    let from = if m.is_drop() {
        Square::NUM + m.drop_piece_type().index() - 1
    } else {
        m.from().index()
    };
    from * Square::NUM + m.to().index()
}

/// 深さに応じた履歴ボーナス
#[inline]
pub fn stat_bonus(depth: Depth) -> i32 {
    if depth > 17 { 0 } else { 32 * depth * depth + 64 * depth - 64 }
}

/// 指し手で動いた駒（成りなら成駒）
pub(crate) fn moved_piece_after(pos: &Position, m: Move) -> Piece {
    let pc = pos.moved_piece(m);
    if m.is_promote() && pc.is_some() {
        pc.promote().unwrap_or(pc)
    } else {
        pc
    }
}

/// 1手前・2手前の指し手の (動いた駒, 移動先)
///
/// 遡れない・null move のときは None。
pub(crate) fn continuation_keys(pos: &Position) -> [Option<(Piece, Square)>; 2] {
    let key = |n: usize| {
        let m = pos.move_before(n);
        let pc = m.moved_piece_after();
        if m.is_ok() && pc.is_some() { Some((pc, m.to())) } else { None }
    };
    [key(1), key(2)]
}

// =============================================================================
// StatsEntry
// =============================================================================

/// 履歴統計の1エントリ
///
/// 値の範囲を [-D, D] に制限しながら更新できる。
#[derive(Clone, Copy)]
pub struct StatsEntry<const D: i32> {
    value: i16,
}

impl<const D: i32> Default for StatsEntry<D> {
    fn default() -> Self {
        Self { value: 0 }
    }
}

impl<const D: i32> StatsEntry<D> {
    /// 値を取得
    #[inline]
    pub fn get(&self) -> i16 {
        self.value
    }

    /// 値を設定
    #[inline]
    pub fn set(&mut self, v: i16) {
        self.value = v;
    }

    /// ボーナス値を加算（範囲制限付き）
    ///
    /// 更新式: entry += clamp(bonus, -D, D) - entry * |clamp(bonus, -D, D)| / D
    #[inline]
    pub fn update(&mut self, bonus: i32) {
        let clamped = bonus.clamp(-D, D);
        let delta = clamped - (self.value as i32) * clamped.abs() / D;
        self.value = (self.value as i32 + delta) as i16;
        debug_assert!(self.value.abs() as i32 <= D);
    }
}

// =============================================================================
// ButterflyHistory
// =============================================================================

/// ButterflyHistory: [Color][from_to] -> score
pub struct ButterflyHistory {
    table: Vec<[StatsEntry<BUTTERFLY_MAX>; FROM_TO_SIZE]>,
}

impl ButterflyHistory {
    pub fn new() -> Self {
        Self {
            table: vec![[StatsEntry::default(); FROM_TO_SIZE]; Color::NUM],
        }
    }

    #[inline]
    pub fn get(&self, color: Color, mv: Move) -> i16 {
        self.table[color.index()][from_to_index(mv)].get()
    }

    #[inline]
    pub fn update(&mut self, color: Color, mv: Move, bonus: i32) {
        self.table[color.index()][from_to_index(mv)].update(bonus);
    }

    pub fn clear(&mut self) {
        for color_table in &mut self.table {
            color_table.fill(StatsEntry::default());
        }
    }
}

impl Default for ButterflyHistory {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PieceToHistory
// =============================================================================

/// PieceToHistory: [piece][to] -> score
#[derive(Clone)]
pub struct PieceToHistory {
    table: [[StatsEntry<PIECE_TO_MAX>; Square::NUM]; PIECE_NUM],
}

impl PieceToHistory {
    pub fn new() -> Self {
        Self {
            table: [[StatsEntry::default(); Square::NUM]; PIECE_NUM],
        }
    }

    #[inline]
    pub fn get(&self, pc: Piece, to: Square) -> i16 {
        self.table[pc.index()][to.index()].get()
    }

    #[inline]
    pub fn update(&mut self, pc: Piece, to: Square, bonus: i32) {
        self.table[pc.index()][to.index()].update(bonus);
    }

    pub fn clear(&mut self) {
        for row in &mut self.table {
            row.fill(StatsEntry::default());
        }
    }
}

impl Default for PieceToHistory {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ContinuationHistory
// =============================================================================

/// ContinuationHistory: [prev_piece][prev_to][piece][to] -> score
///
/// 1手前（カウンター）・2手前（フォローアップ）の駒と移動先から、
/// 現在の駒と移動先へのスコア。約13MBあるのでヒープに置く。
pub struct ContinuationHistory {
    table: Vec<PieceToHistory>,
}

impl ContinuationHistory {
    pub fn new() -> Self {
        Self {
            table: vec![PieceToHistory::new(); PIECE_NUM * Square::NUM],
        }
    }

    #[inline]
    pub fn get_table(&self, prev_pc: Piece, prev_to: Square) -> &PieceToHistory {
        &self.table[prev_pc.index() * Square::NUM + prev_to.index()]
    }

    #[inline]
    pub fn get_table_mut(&mut self, prev_pc: Piece, prev_to: Square) -> &mut PieceToHistory {
        &mut self.table[prev_pc.index() * Square::NUM + prev_to.index()]
    }

    /// 直前の手の組 `keys` から見た (pc, to) のスコア。キーのない手は 0
    #[inline]
    pub fn score(&self, key: Option<(Piece, Square)>, pc: Piece, to: Square) -> i32 {
        match key {
            Some((prev_pc, prev_to)) => self.get_table(prev_pc, prev_to).get(pc, to) as i32,
            None => 0,
        }
    }

    pub fn clear(&mut self) {
        for t in &mut self.table {
            t.clear();
        }
    }
}

impl Default for ContinuationHistory {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// CounterMoveHistory
// =============================================================================

/// CounterMoveHistory: [piece][to] -> Move
///
/// 直前の相手の手に対して良かった応手。
pub struct CounterMoveHistory {
    table: [[Move; Square::NUM]; PIECE_NUM],
}

impl CounterMoveHistory {
    pub fn new() -> Self {
        Self {
            table: [[Move::NONE; Square::NUM]; PIECE_NUM],
        }
    }

    #[inline]
    pub fn get(&self, pc: Piece, sq: Square) -> Move {
        self.table[pc.index()][sq.index()]
    }

    #[inline]
    pub fn set(&mut self, pc: Piece, sq: Square, mv: Move) {
        self.table[pc.index()][sq.index()] = mv;
    }

    pub fn clear(&mut self) {
        for row in &mut self.table {
            row.fill(Move::NONE);
        }
    }
}

impl Default for CounterMoveHistory {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HistoryTables
// =============================================================================

/// 探索スレッド1つ分の履歴テーブル
pub struct HistoryTables {
    pub main_history: ButterflyHistory,
    pub counter_moves: CounterMoveHistory,
    pub continuation_history: ContinuationHistory,
}

impl HistoryTables {
    /// ヒープ上に確保する
    pub fn new_boxed() -> Box<Self> {
        Box::new(Self {
            main_history: ButterflyHistory::new(),
            counter_moves: CounterMoveHistory::new(),
            continuation_history: ContinuationHistory::new(),
        })
    }

    pub fn clear(&mut self) {
        self.main_history.clear();
        self.counter_moves.clear();
        self.continuation_history.clear();
    }

    /// 静かな手でβカットしたときの更新
    ///
    /// `best` に深さに応じたボーナス、それ以前に試して失敗した `quiets` にペナルティを与え、
    /// 直前の手に対するカウンター手として `best` を登録する。`pos` は `best` を指す前の局面。
    pub fn update_quiet_stats(&mut self, pos: &Position, best: Move, depth: Depth, quiets: &[Move]) {
        let us = pos.side_to_move();
        let bonus = stat_bonus(depth);
        let keys = continuation_keys(pos);

        self.update_quiet(pos, us, &keys, best, bonus);
        for &m in quiets {
            if m.to_u16() != best.to_u16() {
                self.update_quiet(pos, us, &keys, m, -bonus);
            }
        }

        if let Some((prev_pc, prev_to)) = keys[0] {
            self.counter_moves.set(prev_pc, prev_to, Move::from_u16(best.to_u16()));
        }
    }

    fn update_quiet(
        &mut self,
        pos: &Position,
        us: Color,
        keys: &[Option<(Piece, Square)>; 2],
        m: Move,
        bonus: i32,
    ) {
        self.main_history.update(us, m, bonus);
        let pc = moved_piece_after(pos, m);
        for &(prev_pc, prev_to) in keys.iter().flatten() {
            self.continuation_history.get_table_mut(prev_pc, prev_to).update(pc, m.to(), bonus);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    #[test]
    fn test_stats_entry_update_is_bounded() {
        let mut e = StatsEntry::<1000>::default();
        for _ in 0..100 {
            e.update(1000);
        }
        assert!(e.get() <= 1000, "上限を超えない");
        assert!(e.get() > 900, "上限に近づく");
        for _ in 0..200 {
            e.update(-1000);
        }
        assert!(e.get() >= -1000);
    }

    #[test]
    fn test_from_to_index_range() {
        let m = Move::new_drop(PieceType::Rook, Square::SQ_55);
        assert!(from_to_index(m) < FROM_TO_SIZE);
        let board = Move::new_move(Square::SQ_59, Square::new(File::File5, Rank::Rank8), false);
        assert_ne!(from_to_index(m), from_to_index(board));
    }

    #[test]
    fn test_update_quiet_stats() {
        let mut pos = Position::startpos();
        let first = pos.move_from_usi("7g7f").unwrap();
        let gc = pos.gives_check(first);
        pos.do_move(first, gc);

        let best = pos.move_from_usi("3c3d").unwrap();
        let tried = pos.move_from_usi("8c8d").unwrap();
        let mut h = HistoryTables::new_boxed();
        h.update_quiet_stats(&pos, best, 4, &[tried, best]);

        let us = pos.side_to_move();
        assert!(h.main_history.get(us, best) > 0, "最善手にボーナス");
        assert!(h.main_history.get(us, tried) < 0, "失敗した手にペナルティ");

        let keys = continuation_keys(&pos);
        let (prev_pc, prev_to) = keys[0].unwrap();
        assert_eq!(h.counter_moves.get(prev_pc, prev_to).to_u16(), best.to_u16());
        let pc = moved_piece_after(&pos, best);
        assert!(h.continuation_history.score(keys[0], pc, best.to()) > 0);
        assert!(keys[1].is_none(), "2手前はない");

        h.clear();
        assert_eq!(h.main_history.get(us, best), 0);
        assert_eq!(h.counter_moves.get(prev_pc, prev_to), Move::NONE);
    }
}

//! MovePicker（指し手オーダリング）
//!
//! 段階的に指し手を生成し、探索に有望な順で1手ずつ返す。
//! 各段階の指し手はその段階に入ったときに初めて生成する。
//!
//! 通常探索: 置換表の手 → 良い駒取り → キラー1 → キラー2 → カウンター手 → 静かな手 → 悪い駒取り
//! 王手回避: 置換表の手 → 回避手
//! ProbCut:   置換表の手 → SEEが閾値を超える駒取り
//! 静止探索: 置換表の手 → 駒取り（または取り返し）→ 静かな王手

use smallvec::SmallVec;

use crate::movegen::{generate_with_type, ExtMove, ExtMoveBuffer, GenType};
use crate::position::Position;
use crate::types::{
    capture_value, piece_value, promotion_bonus, Depth, Move, Piece, PieceType, Square, Value,
    DEPTH_QS, DEPTH_QS_RECAPTURES,
};

use super::history::{continuation_keys, moved_piece_after, HistoryTables};

/// 静かな手を部分ソートする閾値の深さ係数
const QUIET_SORT_LIMIT_PER_DEPTH: i32 = -3000;

/// 王手回避で駒を取る手に加える底上げ
const EVASION_CAPTURE_BONUS: i32 = 1 << 28;

// =============================================================================
// Stage
// =============================================================================

/// 指し手生成の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    // 通常探索
    MainTT,
    CaptureInit,
    GoodCapture,
    Killer1,
    Killer2,
    CounterMove,
    QuietInit,
    Quiet,
    BadCapture,

    // 王手回避
    EvasionTT,
    EvasionInit,
    Evasion,

    // ProbCut
    ProbCutTT,
    ProbCutInit,
    ProbCut,

    // 静止探索
    QSearchTT,
    QCaptureInit,
    QCapture,
    QCheckInit,
    QCheck,

    Done,
}

impl Stage {
    /// 次の段階
    ///
    /// 静止探索の駒取りの後に王手を生成するかは深さで決まるので、ここでは扱わない。
    pub(crate) const fn next(self) -> Stage {
        match self {
            Stage::MainTT => Stage::CaptureInit,
            Stage::CaptureInit => Stage::GoodCapture,
            Stage::GoodCapture => Stage::Killer1,
            Stage::Killer1 => Stage::Killer2,
            Stage::Killer2 => Stage::CounterMove,
            Stage::CounterMove => Stage::QuietInit,
            Stage::QuietInit => Stage::Quiet,
            Stage::Quiet => Stage::BadCapture,
            Stage::BadCapture => Stage::Done,

            Stage::EvasionTT => Stage::EvasionInit,
            Stage::EvasionInit => Stage::Evasion,
            Stage::Evasion => Stage::Done,

            Stage::ProbCutTT => Stage::ProbCutInit,
            Stage::ProbCutInit => Stage::ProbCut,
            Stage::ProbCut => Stage::Done,

            Stage::QSearchTT => Stage::QCaptureInit,
            Stage::QCaptureInit => Stage::QCapture,
            Stage::QCapture => Stage::QCheckInit,
            Stage::QCheckInit => Stage::QCheck,
            Stage::QCheck => Stage::Done,

            Stage::Done => Stage::Done,
        }
    }
}

// =============================================================================
// MovePicker
// =============================================================================

/// 指し手オーダリング器
///
/// 返す手は擬似合法手であり、合法性（自玉の安全）は呼び出し側が `is_legal` で確かめる。
/// 尽きたら `Move::NONE` を返す。
pub struct MovePicker {
    stage: Stage,
    tt_move: Move,
    /// 置換表の手・キラー・カウンター手のうち既に返したもの
    refutations: SmallVec<[Move; 4]>,
    killers: [Move; 2],
    counter_move: Move,
    cont_keys: [Option<(Piece, Square)>; 2],
    recapture_sq: Option<Square>,
    threshold: Value,
    depth: Depth,
    skip_quiets: bool,
    generate_all_legal_moves: bool,
    moves: ExtMoveBuffer,
    cur: usize,
    end_cur: usize,
    end_bad_captures: usize,
    end_captures: usize,
}

impl MovePicker {
    fn with_stage(pos: &Position, stage: Stage, depth: Depth, generate_all_legal_moves: bool) -> Self {
        Self {
            stage,
            tt_move: Move::NONE,
            refutations: SmallVec::new(),
            killers: [Move::NONE; 2],
            counter_move: Move::NONE,
            cont_keys: continuation_keys(pos),
            recapture_sq: None,
            threshold: Value::ZERO,
            depth,
            skip_quiets: false,
            generate_all_legal_moves,
            moves: ExtMoveBuffer::new(),
            cur: 0,
            end_cur: 0,
            end_bad_captures: 0,
            end_captures: 0,
        }
    }

    /// 通常探索用（王手がかかっていれば王手回避用）
    ///
    /// `tt_move` は16bit形式でもよい。局面で指せない手は無視する。
    pub fn new(
        pos: &Position,
        tt_move: Move,
        depth: Depth,
        killers: [Move; 2],
        history: &HistoryTables,
        generate_all_legal_moves: bool,
    ) -> Self {
        debug_assert!(depth > DEPTH_QS);
        let stage = if pos.in_check() { Stage::EvasionTT } else { Stage::MainTT };
        let mut mp = Self::with_stage(pos, stage, depth, generate_all_legal_moves);
        mp.tt_move = mp.validate(pos, tt_move);
        mp.killers = killers;
        if let Some((prev_pc, prev_to)) = mp.cont_keys[0] {
            mp.counter_move = history.counter_moves.get(prev_pc, prev_to);
        }
        if mp.tt_move.is_none() {
            mp.stage = mp.stage.next();
        }
        mp
    }

    /// 静止探索用
    ///
    /// `depth` が `DEPTH_QS_RECAPTURES` 以下なら直前の手の移動先への取り返しだけを返す。
    /// `DEPTH_QS` 以上なら駒取りの後に静かな王手も返す。
    pub fn new_qsearch(pos: &Position, tt_move: Move, depth: Depth, generate_all_legal_moves: bool) -> Self {
        debug_assert!(depth <= DEPTH_QS);
        let in_check = pos.in_check();
        let stage = if in_check { Stage::EvasionTT } else { Stage::QSearchTT };
        let mut mp = Self::with_stage(pos, stage, depth, generate_all_legal_moves);

        let last = pos.last_move();
        if !in_check && depth <= DEPTH_QS_RECAPTURES && last.is_ok() {
            mp.recapture_sq = Some(last.to());
        }

        let tt = mp.validate(pos, tt_move);
        let recapture_ok = depth > DEPTH_QS_RECAPTURES || in_check || Some(tt.to()) == mp.recapture_sq;
        mp.tt_move = if tt.is_some() && recapture_ok { tt } else { Move::NONE };
        if mp.tt_move.is_none() {
            mp.stage = mp.stage.next();
        }
        mp
    }

    /// ProbCut用
    ///
    /// SEE が `threshold` を超える駒取りだけを返す。置換表の手も同じ条件を満たすときだけ返す。
    pub fn new_probcut(pos: &Position, tt_move: Move, threshold: Value, generate_all_legal_moves: bool) -> Self {
        debug_assert!(!pos.in_check());
        let mut mp = Self::with_stage(pos, Stage::ProbCutTT, DEPTH_QS, generate_all_legal_moves);
        mp.threshold = threshold;

        let tt = mp.validate(pos, tt_move);
        mp.tt_move = if tt.is_some() && pos.is_capture(tt) && mp.passes_probcut(pos, tt) {
            tt
        } else {
            Move::NONE
        };
        if mp.tt_move.is_none() {
            mp.stage = mp.stage.next();
        }
        mp
    }

    /// 以降の静かな手を返さない
    pub fn skip_quiets(&mut self) {
        self.skip_quiets = true;
    }

    /// 置換表の手を局面に合わせて復元し、擬似合法なら返す
    fn validate(&self, pos: &Position, m: Move) -> Move {
        match pos.to_move(m) {
            Some(m) if pos.pseudo_legal_with(m, self.generate_all_legal_moves) => m,
            _ => Move::NONE,
        }
    }

    #[inline]
    fn gen_type(&self, base: GenType) -> GenType {
        base.with_non_promotions(self.generate_all_legal_moves)
    }

    #[inline]
    fn passes_probcut(&self, pos: &Position, m: Move) -> bool {
        pos.see_ge(m, Value::new(self.threshold.raw() + 1))
    }

    /// 既に返した置換表の手・キラー・カウンター手か
    #[inline]
    fn is_refutation(&self, m: Move) -> bool {
        self.refutations.iter().any(|r| r.to_u16() == m.to_u16())
    }

    /// 現在の段階のバッファ [cur, end_cur) を (再) 設定
    fn generate(&mut self, pos: &Position, gen_type: GenType, start: usize) {
        self.moves.set_len(start);
        let end = generate_with_type(pos, gen_type, &mut self.moves, self.recapture_sq);
        self.cur = start;
        self.end_cur = end;
    }

    // =========================================================================
    // スコアリング
    // =========================================================================

    /// 駒取り（と歩の成り）: 取る駒の価値を優先し、同じなら安い駒で取る手を先に
    fn score_captures(&mut self, pos: &Position) {
        for i in self.cur..self.end_cur {
            let m = self.moves.get(i).mv;
            let captured = pos.piece_on(m.to());
            let moved = pos.moved_piece(m).piece_type();
            let mut value = capture_value(captured) * 8 - moved.index() as i32;
            if m.is_promote() {
                value += promotion_bonus(moved);
            }
            self.moves.set_value(i, value);
        }
    }

    /// 静かな手: 履歴 + カウンター/フォローアップ履歴
    fn score_quiets(&mut self, pos: &Position, history: &HistoryTables) {
        let us = pos.side_to_move();
        let cont = &history.continuation_history;
        for i in self.cur..self.end_cur {
            let m = self.moves.get(i).mv;
            let pc = moved_piece_after(pos, m);
            let to = m.to();
            let value = 2 * history.main_history.get(us, m) as i32
                + cont.score(self.cont_keys[0], pc, to)
                + cont.score(self.cont_keys[1], pc, to);
            self.moves.set_value(i, value);
        }
    }

    /// 王手回避: 駒取りは取る駒の価値 - 動かす駒の価値で最優先、それ以外は履歴
    fn score_evasions(&mut self, pos: &Position, history: &HistoryTables) {
        let us = pos.side_to_move();
        for i in self.cur..self.end_cur {
            let m = self.moves.get(i).mv;
            let value = if pos.is_capture(m) {
                let moved = pos.moved_piece(m).piece_type();
                capture_value(pos.piece_on(m.to())) - piece_value(moved) + EVASION_CAPTURE_BONUS
            } else {
                let pc = moved_piece_after(pos, m);
                history.main_history.get(us, m) as i32
                    + history.continuation_history.score(self.cont_keys[0], pc, m.to())
            };
            self.moves.set_value(i, value);
        }
    }

    // =========================================================================
    // 選択
    // =========================================================================

    /// [cur, end_cur) の最大スコアの手を cur に持ってきて返す
    fn pick_best(&mut self) -> Move {
        let mut best = self.cur;
        for i in self.cur + 1..self.end_cur {
            if self.moves.get(i).value > self.moves.get(best).value {
                best = i;
            }
        }
        self.moves.swap(self.cur, best);
        let m = self.moves.get(self.cur).mv;
        self.cur += 1;
        m
    }

    /// 置換表の手を除いて最良のものから返す
    fn select_best(&mut self) -> Option<Move> {
        while self.cur < self.end_cur {
            let m = self.pick_best();
            if m.to_u16() != self.tt_move.to_u16() {
                return Some(m);
            }
        }
        None
    }

    /// 置換表の手を除いて順に返す
    fn select_next(&mut self) -> Option<Move> {
        while self.cur < self.end_cur {
            let m = self.moves.get(self.cur).mv;
            self.cur += 1;
            if !self.is_refutation(m) {
                return Some(m);
            }
        }
        None
    }

    /// 良い駒取り（SEE ≥ 0）を返す。悪い駒取りはバッファ先頭に寄せて後回しにする
    fn select_good_capture(&mut self, pos: &Position) -> Option<Move> {
        while self.cur < self.end_cur {
            let m = self.pick_best();
            if m.to_u16() == self.tt_move.to_u16() {
                continue;
            }
            if pos.see_ge(m, Value::ZERO) {
                return Some(m);
            }
            self.moves.swap(self.end_bad_captures, self.cur - 1);
            self.end_bad_captures += 1;
        }
        None
    }

    /// ProbCut の条件を満たす駒取り
    fn select_probcut(&mut self, pos: &Position) -> Option<Move> {
        while let Some(m) = self.select_best() {
            if self.passes_probcut(pos, m) {
                return Some(m);
            }
        }
        None
    }

    /// キラー・カウンター手を検証して返す
    ///
    /// 駒取り段階で返る手（駒取り・歩の成り）、既に返した手、指せない手は除く。
    fn refutation(&mut self, pos: &Position, m: Move) -> Option<Move> {
        if m.is_none() || self.is_refutation(m) {
            return None;
        }
        let m = self.validate(pos, m);
        if m.is_none() || is_capture_stage(pos, m) {
            return None;
        }
        self.refutations.push(m);
        Some(m)
    }

    /// 次の指し手を返す（なければ `Move::NONE`）
    pub fn next_move(&mut self, pos: &Position, history: &HistoryTables) -> Move {
        loop {
            match self.stage {
                Stage::MainTT | Stage::EvasionTT | Stage::ProbCutTT | Stage::QSearchTT => {
                    self.stage = self.stage.next();
                    self.refutations.push(self.tt_move);
                    return self.tt_move;
                }

                Stage::CaptureInit | Stage::ProbCutInit | Stage::QCaptureInit => {
                    let base = match (self.stage, self.recapture_sq) {
                        (Stage::CaptureInit, _) => GenType::CapturesProPlus,
                        (Stage::ProbCutInit, _) => GenType::Captures,
                        (_, Some(_)) => GenType::Recaptures,
                        (_, None) => GenType::CapturesProPlus,
                    };
                    let gen_type = self.gen_type(base);
                    self.generate(pos, gen_type, 0);
                    self.end_captures = self.end_cur;
                    self.score_captures(pos);
                    self.stage = self.stage.next();
                }

                Stage::GoodCapture => {
                    if let Some(m) = self.select_good_capture(pos) {
                        return m;
                    }
                    self.stage = self.stage.next();
                }

                Stage::Killer1 | Stage::Killer2 | Stage::CounterMove => {
                    let candidate = match self.stage {
                        Stage::Killer1 => self.killers[0],
                        Stage::Killer2 => self.killers[1],
                        _ => self.counter_move,
                    };
                    self.stage = self.stage.next();
                    if let Some(m) = self.refutation(pos, candidate) {
                        return m;
                    }
                }

                Stage::QuietInit => {
                    if self.skip_quiets {
                        self.cur = self.end_captures;
                        self.end_cur = self.end_captures;
                    } else {
                        let gen_type = self.gen_type(GenType::QuietsProMinus);
                        self.generate(pos, gen_type, self.end_captures);
                        self.score_quiets(pos, history);
                        let limit = QUIET_SORT_LIMIT_PER_DEPTH * self.depth;
                        partial_insertion_sort(&mut self.moves.as_mut_slice()[self.cur..], limit);
                    }
                    self.stage = self.stage.next();
                }

                Stage::Quiet => {
                    if !self.skip_quiets {
                        if let Some(m) = self.select_next() {
                            return m;
                        }
                    }
                    self.cur = 0;
                    self.end_cur = self.end_bad_captures;
                    self.stage = self.stage.next();
                }

                Stage::BadCapture => {
                    if self.cur < self.end_cur {
                        let m = self.moves.get(self.cur).mv;
                        self.cur += 1;
                        return m;
                    }
                    self.stage = self.stage.next();
                }

                Stage::EvasionInit => {
                    let gen_type = self.gen_type(GenType::Evasions);
                    self.generate(pos, gen_type, 0);
                    self.score_evasions(pos, history);
                    self.stage = self.stage.next();
                }

                Stage::Evasion | Stage::QCapture => {
                    if let Some(m) = self.select_best() {
                        return m;
                    }
                    self.stage = if self.stage == Stage::QCapture && self.depth >= DEPTH_QS {
                        Stage::QCheckInit
                    } else {
                        Stage::Done
                    };
                }

                Stage::ProbCut => {
                    if let Some(m) = self.select_probcut(pos) {
                        return m;
                    }
                    self.stage = self.stage.next();
                }

                Stage::QCheckInit => {
                    let gen_type = self.gen_type(GenType::QuietChecks);
                    self.generate(pos, gen_type, self.end_captures);
                    self.stage = self.stage.next();
                }

                Stage::QCheck => {
                    // 歩の成りは駒取り段階で返している
                    while let Some(m) = self.select_next() {
                        if !is_capture_stage(pos, m) {
                            return m;
                        }
                    }
                    self.stage = self.stage.next();
                }

                Stage::Done => return Move::NONE,
            }
        }
    }
}

/// 駒取り段階で生成される手か（駒取り・歩の成り）
fn is_capture_stage(pos: &Position, m: Move) -> bool {
    pos.is_capture(m) || (m.is_promote() && pos.moved_piece(m).piece_type() == PieceType::Pawn)
}

/// limit 以上のスコアの手だけを先頭に降順で並べる
///
/// 先頭要素を整列済み領域の初期値とし、2番目以降を走査する。
/// 整列済み領域の末尾インデックスを返す。limit 未満の手の順序は保証しない。
pub(crate) fn partial_insertion_sort(moves: &mut [ExtMove], limit: i32) -> usize {
    let mut sorted_end: usize = 0;
    for p in 1..moves.len() {
        if moves[p].value >= limit {
            let tmp = moves[p];
            sorted_end += 1;
            moves[p] = moves[sorted_end];
            let mut q = sorted_end;
            while q > 0 && moves[q - 1].value < tmp.value {
                moves[q] = moves[q - 1];
                q -= 1;
            }
            moves[q] = tmp;
        }
    }
    sorted_end
}

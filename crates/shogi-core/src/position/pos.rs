//! 局面（Position）

use crate::bitboard::{
    bishop_effect, direct_of, gold_effect, king_effect, knight_effect, lance_effect, line_bb,
    pawn_effect, piece_effect, ray_effect, rook_effect, silver_effect, Bitboard,
};
use crate::types::{
    capture_value, piece_value, promotion_bonus, Color, Hand, Move, MoveParseError, Piece,
    PieceType, Square, Value,
};

use super::state::StateInfo;
use super::zobrist::{zobrist_hand, zobrist_psq, zobrist_side};

/// 既定で確保する状態レコード数
pub const DEFAULT_STATE_CAPACITY: usize = 256;

/// 将棋の局面
///
/// `Clone` は盤面・手駒・状態アリーナを含む完全なコピーを作る。
/// 探索スレッドごとに複製して使い、インスタンス間で共有する部分はない。
#[derive(Clone)]
pub struct Position {
    // === 盤面 ===
    /// 各マスの駒 [Square]
    pub(super) board: [Piece; Square::NUM],
    /// 駒種別Bitboard [PieceType]（両陣営）
    pub(super) by_type: [Bitboard; PieceType::NUM + 1],
    /// 先後別Bitboard [Color]
    pub(super) by_color: [Bitboard; Color::NUM],

    // === 手駒 ===
    /// 手駒 [Color]
    pub(super) hand: [Hand; Color::NUM],
    /// 生の歩がいる筋（bit0 = 1筋）[Color]
    pub(super) pawn_files: [u16; Color::NUM],
    /// 局面設定時の駒種ごとの枚数（成駒は生駒で数え、手駒を含む）
    pub(super) piece_counts: [u32; PieceType::NUM + 1],

    // === 状態 ===
    /// 玉の位置 [Color]
    pub(super) king_square: [Square; Color::NUM],
    /// 手番
    pub(super) side_to_move: Color,
    /// 手数（SFENの手数フィールド）
    pub(super) game_ply: i32,
    /// 状態レコードのアリーナ（手数順）
    pub(super) states: Vec<StateInfo>,
    /// 現在の状態レコードのインデックス
    pub(super) st: usize,
}

impl Position {
    // ========== 局面設定 ==========

    /// 空の局面を生成
    pub fn new() -> Self {
        Self::with_state_capacity(DEFAULT_STATE_CAPACITY)
    }

    /// 状態レコードを `capacity` 手分あらかじめ確保した空の局面を生成
    ///
    /// 探索の最大深さ分を確保しておけば `do_move` でメモリ確保が起きない。
    pub fn with_state_capacity(capacity: usize) -> Self {
        crate::init();
        let mut states = Vec::with_capacity(capacity.max(1));
        states.push(StateInfo::new());
        Position {
            board: [Piece::NONE; Square::NUM],
            by_type: [Bitboard::EMPTY; PieceType::NUM + 1],
            by_color: [Bitboard::EMPTY; Color::NUM],
            hand: [Hand::EMPTY; Color::NUM],
            pawn_files: [0; Color::NUM],
            piece_counts: [0; PieceType::NUM + 1],
            king_square: [Square::SQ_11; Color::NUM],
            side_to_move: Color::Black,
            game_ply: 1,
            states,
            st: 0,
        }
    }

    /// 状態レコードの容量を `additional` 手分追加で確保する
    pub fn reserve_states(&mut self, additional: usize) {
        let used = self.st + 1;
        let len = self.states.len();
        if len > used {
            self.states.truncate(used);
        }
        self.states.reserve(additional);
    }

    // ========== 盤面アクセス ==========

    /// 指定マスの駒を取得
    #[inline]
    pub fn piece_on(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }

    /// 全駒のBitboard
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.by_color[0] | self.by_color[1]
    }

    /// 駒のない升
    #[inline]
    pub fn empties(&self) -> Bitboard {
        !self.occupied()
    }

    /// 駒種のBitboard（両陣営）
    #[inline]
    pub fn pieces_pt(&self, pt: PieceType) -> Bitboard {
        self.by_type[pt.index()]
    }

    /// 手番側の全駒
    #[inline]
    pub fn pieces_c(&self, c: Color) -> Bitboard {
        self.by_color[c.index()]
    }

    /// 手番と駒種を指定したBitboard
    #[inline]
    pub fn pieces(&self, c: Color, pt: PieceType) -> Bitboard {
        self.by_type[pt.index()] & self.by_color[c.index()]
    }

    /// 金と同じ動きの駒（金・と・成香・成桂・成銀、両陣営）
    #[inline]
    pub fn golds(&self) -> Bitboard {
        self.by_type[PieceType::Gold.index()]
            | self.by_type[PieceType::ProPawn.index()]
            | self.by_type[PieceType::ProLance.index()]
            | self.by_type[PieceType::ProKnight.index()]
            | self.by_type[PieceType::ProSilver.index()]
    }

    /// 角・馬（両陣営）
    #[inline]
    pub fn bishop_horse(&self) -> Bitboard {
        self.by_type[PieceType::Bishop.index()] | self.by_type[PieceType::Horse.index()]
    }

    /// 飛・龍（両陣営）
    #[inline]
    pub fn rook_dragon(&self) -> Bitboard {
        self.by_type[PieceType::Rook.index()] | self.by_type[PieceType::Dragon.index()]
    }

    /// 玉・馬・龍（玉の利きを持つ駒、両陣営）
    #[inline]
    pub fn hdk(&self) -> Bitboard {
        self.by_type[PieceType::King.index()]
            | self.by_type[PieceType::Horse.index()]
            | self.by_type[PieceType::Dragon.index()]
    }

    /// 手駒
    #[inline]
    pub fn hand(&self, c: Color) -> Hand {
        self.hand[c.index()]
    }

    /// 生の歩がいる筋のマスク（bit0 = 1筋）
    #[inline]
    pub fn pawn_file_mask(&self, c: Color) -> u16 {
        self.pawn_files[c.index()]
    }

    /// 玉の位置
    #[inline]
    pub fn king_square(&self, c: Color) -> Square {
        self.king_square[c.index()]
    }

    /// 手番
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// 手数
    #[inline]
    pub fn game_ply(&self) -> i32 {
        self.game_ply
    }

    /// 現在の状態
    #[inline]
    pub fn state(&self) -> &StateInfo {
        &self.states[self.st]
    }

    #[inline]
    pub(super) fn state_mut(&mut self) -> &mut StateInfo {
        &mut self.states[self.st]
    }

    /// アリーナ内のインデックスで状態を取得
    #[inline]
    pub fn state_at(&self, index: usize) -> Option<&StateInfo> {
        if index <= self.st { self.states.get(index) } else { None }
    }

    /// 局面のハッシュキー
    #[inline]
    pub fn key(&self) -> u64 {
        self.state().key()
    }

    /// 盤面ハッシュ（手番込み）
    #[inline]
    pub fn board_key(&self) -> u64 {
        self.state().board_key
    }

    /// 手駒ハッシュ
    #[inline]
    pub fn hand_key(&self) -> u64 {
        self.state().hand_key
    }

    /// 駒割評価値（先手視点）
    #[inline]
    pub fn material_value(&self) -> Value {
        self.state().material_value
    }

    /// 王手している駒
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        self.state().checkers
    }

    /// 王手されているか
    #[inline]
    pub fn in_check(&self) -> bool {
        !self.state().checkers.is_empty()
    }

    /// 玉と敵の遠方駒の間にある駒
    #[inline]
    pub fn blockers_for_king(&self, c: Color) -> Bitboard {
        self.state().blockers_for_king[c.index()]
    }

    /// c の駒をpinしている敵の遠方駒
    #[inline]
    pub fn pinners(&self, c: Color) -> Bitboard {
        self.state().pinners[c.index()]
    }

    /// 手番側がその駒種で王手できる升
    #[inline]
    pub fn check_squares(&self, pt: PieceType) -> Bitboard {
        self.state().check_squares[pt.index()]
    }

    /// 直前の指し手で取られた駒
    #[inline]
    pub fn captured_piece(&self) -> Piece {
        self.state().captured_piece
    }

    /// 直前の指し手
    #[inline]
    pub fn last_move(&self) -> Move {
        self.state().last_move
    }

    /// n 手前の指し手（1 = 直前）。遡れなければ `Move::NONE`
    pub fn move_before(&self, n: usize) -> Move {
        let mut idx = self.st;
        for _ in 1..n {
            match self.states[idx].previous {
                Some(p) => idx = p,
                None => return Move::NONE,
            }
        }
        self.states[idx].last_move
    }

    /// 指し手で動く駒（移動前）
    #[inline]
    pub fn moved_piece(&self, m: Move) -> Piece {
        if m.is_drop() {
            Piece::new(self.side_to_move, m.drop_piece_type())
        } else {
            self.piece_on(m.from())
        }
    }

    /// 駒を取る手か（盤面から判定）
    #[inline]
    pub fn is_capture(&self, m: Move) -> bool {
        !m.is_drop() && self.piece_on(m.to()).is_some()
    }

    /// 駒を取る手または成る手か（盤面から判定）
    #[inline]
    pub fn is_capture_or_promotion(&self, m: Move) -> bool {
        m.is_promote() || self.is_capture(m)
    }

    // ========== 利き ==========

    /// 升 sq に利いている c の駒（occupied を盤面の駒配置とみなす）
    pub fn attackers_to_c_occ(&self, sq: Square, c: Color, occupied: Bitboard) -> Bitboard {
        let them = !c;
        let attackers = (pawn_effect(them, sq) & self.by_type[PieceType::Pawn.index()])
            | (knight_effect(them, sq) & self.by_type[PieceType::Knight.index()])
            | (silver_effect(them, sq) & self.by_type[PieceType::Silver.index()])
            | (gold_effect(them, sq) & self.golds())
            | (king_effect(sq) & self.hdk())
            | (lance_effect(them, sq, occupied) & self.by_type[PieceType::Lance.index()])
            | (bishop_effect(sq, occupied) & self.bishop_horse())
            | (rook_effect(sq, occupied) & self.rook_dragon());
        attackers & self.pieces_c(c)
    }

    /// 升 sq に利いている c の駒
    #[inline]
    pub fn attackers_to_c(&self, sq: Square, c: Color) -> Bitboard {
        self.attackers_to_c_occ(sq, c, self.occupied())
    }

    /// 升 sq に利いている両陣営の駒
    #[inline]
    pub fn attackers_to_occ(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.attackers_to_c_occ(sq, Color::Black, occupied)
            | self.attackers_to_c_occ(sq, Color::White, occupied)
    }

    /// 升 sq に利いている両陣営の駒
    #[inline]
    pub fn attackers_to(&self, sq: Square) -> Bitboard {
        self.attackers_to_occ(sq, self.occupied())
    }

    /// 升 sq に利いている両陣営の遠方駒（SEEのX線追加用）
    pub(crate) fn slider_attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let lances = self.by_type[PieceType::Lance.index()];
        (lance_effect(Color::White, sq, occupied) & lances & self.pieces_c(Color::Black))
            | (lance_effect(Color::Black, sq, occupied) & lances & self.pieces_c(Color::White))
            | (bishop_effect(sq, occupied) & self.bishop_horse())
            | (rook_effect(sq, occupied) & self.rook_dragon())
    }

    /// c 側の玉が取られる升か（c の駒が動いた後の occupied を指定）
    #[inline]
    pub fn is_attacked_by(&self, sq: Square, c: Color, occupied: Bitboard) -> bool {
        !(self.attackers_to_c_occ(sq, c, occupied) & occupied).is_empty()
    }

    // ========== 駒の配置 ==========

    /// 盤面に駒を置く（ハッシュ・駒割は呼び出し側で更新する）
    pub(super) fn put_piece(&mut self, pc: Piece, sq: Square) {
        debug_assert!(self.board[sq.index()].is_none());
        self.board[sq.index()] = pc;
        self.by_type[pc.piece_type().index()].set(sq);
        self.by_color[pc.color().index()].set(sq);
    }

    /// 盤面から駒を取り除く
    pub(super) fn remove_piece(&mut self, sq: Square) {
        let pc = self.board[sq.index()];
        debug_assert!(pc.is_some());
        self.board[sq.index()] = Piece::NONE;
        self.by_type[pc.piece_type().index()].clear(sq);
        self.by_color[pc.color().index()].clear(sq);
    }

    /// pin駒とpinしている駒を更新
    pub(super) fn update_blockers_and_pinners(&mut self) {
        let occupied = self.occupied();
        for c in Color::ALL {
            let them = !c;
            let ksq = self.king_square[c.index()];

            // 玉に遠方から利きうる敵の駒
            let snipers = ((lance_effect(c, ksq, Bitboard::EMPTY)
                & self.by_type[PieceType::Lance.index()])
                | (bishop_effect(ksq, Bitboard::EMPTY) & self.bishop_horse())
                | (rook_effect(ksq, Bitboard::EMPTY) & self.rook_dragon()))
                & self.pieces_c(them);

            let mut blockers = Bitboard::EMPTY;
            let mut pinners = Bitboard::EMPTY;
            for sniper in snipers.iter() {
                let between = crate::bitboard::between_bb(ksq, sniper) & occupied;
                if !between.is_empty() && !between.more_than_one() {
                    blockers |= between;
                    if !(between & self.pieces_c(c)).is_empty() {
                        pinners.set(sniper);
                    }
                }
            }

            let st = self.state_mut();
            st.blockers_for_king[c.index()] = blockers;
            st.pinners[c.index()] = pinners;
        }
    }

    /// 王手マスを更新
    pub(super) fn update_check_squares(&mut self) {
        let them = !self.side_to_move;
        let ksq = self.king_square[them.index()];
        let occupied = self.occupied();

        let mut squares = [Bitboard::EMPTY; PieceType::NUM + 1];
        for pt in PieceType::ALL {
            if pt != PieceType::King {
                squares[pt.index()] = piece_effect(pt, them, ksq, occupied);
            }
        }
        self.state_mut().check_squares = squares;
    }

    /// 新しい状態レコードをアリーナに積む
    #[inline]
    fn push_state(&mut self, st: StateInfo) {
        self.st += 1;
        if self.st < self.states.len() {
            self.states[self.st] = st;
        } else {
            self.states.push(st);
        }
    }

    // ========== 指し手実行 ==========

    /// 指し手を実行
    ///
    /// `gives_check` は `gives_check(m)` の結果を渡す。
    pub fn do_move(&mut self, m: Move, gives_check: bool) {
        debug_assert!(m.is_ok());
        debug_assert_eq!(gives_check, self.gives_check(m));

        let us = self.side_to_move;
        let them = !us;
        let prev_idx = self.st;
        let prev = self.states[prev_idx];
        let mut st = prev.successor(prev_idx);
        let sign = if us == Color::Black { 1 } else { -1 };

        st.plies_from_null += 1;
        st.board_key ^= zobrist_side();

        let to = m.to();
        let moved_after = if m.is_drop() {
            let pt = m.drop_piece_type();
            let pc = Piece::new(us, pt);

            // 手駒から減らす
            let n = self.hand[us.index()].count(pt);
            self.hand[us.index()] = self.hand[us.index()].sub(pt);
            st.hand_key ^= zobrist_hand(us, pt, n) ^ zobrist_hand(us, pt, n - 1);

            // 盤上に配置
            self.put_piece(pc, to);
            st.board_key ^= zobrist_psq(pc, to);
            if pt == PieceType::Pawn {
                self.pawn_files[us.index()] |= 1 << to.file().index();
            }

            st.captured_piece = Piece::NONE;
            pc
        } else {
            let from = m.from();
            let pc = self.piece_on(from);
            let captured = self.piece_on(to);
            debug_assert!(pc.is_some() && pc.color() == us);

            if captured.is_some() {
                debug_assert!(captured.color() == them);
                let cap_pt = captured.piece_type().unpromote();
                self.remove_piece(to);
                st.board_key ^= zobrist_psq(captured, to);

                // 手駒に追加（成駒は生駒に戻す）
                let n = self.hand[us.index()].count(cap_pt);
                self.hand[us.index()] = self.hand[us.index()].add(cap_pt);
                st.hand_key ^= zobrist_hand(us, cap_pt, n) ^ zobrist_hand(us, cap_pt, n + 1);

                if captured.piece_type() == PieceType::Pawn {
                    self.pawn_files[them.index()] &= !(1 << to.file().index());
                }
                st.material_value +=
                    Value::new(sign * (capture_value(captured) + piece_value(cap_pt)));
            }
            st.captured_piece = captured;

            // 駒を移動
            self.remove_piece(from);
            st.board_key ^= zobrist_psq(pc, from);

            let moved_pc = match (m.is_promote(), pc.promote()) {
                (true, Some(promoted)) => {
                    st.material_value += Value::new(sign * promotion_bonus(pc.piece_type()));
                    if pc.piece_type() == PieceType::Pawn {
                        self.pawn_files[us.index()] &= !(1 << from.file().index());
                    }
                    promoted
                }
                _ => pc,
            };
            self.put_piece(moved_pc, to);
            st.board_key ^= zobrist_psq(moved_pc, to);

            if pc.piece_type() == PieceType::King {
                self.king_square[us.index()] = to;
            }
            moved_pc
        };

        // 手番交代
        self.side_to_move = them;
        self.game_ply += 1;

        // 駒情報付きで記録する（履歴テーブルの参照に使う）
        st.last_move = if m.is_drop() {
            Move::make_drop(moved_after, to)
        } else {
            Move::make_move(m.from(), to, m.is_promote(), moved_after, st.captured_piece)
        };
        st.hand_snapshot = self.hand;
        st.continuous_check[us.index()] = if gives_check {
            prev.continuous_check[us.index()] + 2
        } else {
            0
        };
        st.checkers = if gives_check {
            self.checkers_after_move(m, moved_after, &prev)
        } else {
            Bitboard::EMPTY
        };

        self.push_state(st);
        self.update_blockers_and_pinners();
        self.update_check_squares();

        #[cfg(feature = "debug")]
        if let Err(e) = self.verify() {
            panic!("state mismatch after {}: {e}", m.to_usi());
        }
    }

    /// 指し手後の王手駒（直接王手 + 開き王手）
    ///
    /// `prev` は指し手前の状態。手番はすでに交代している。
    fn checkers_after_move(&self, m: Move, moved_after: Piece, prev: &StateInfo) -> Bitboard {
        let us = !self.side_to_move;
        let ksq = self.king_square[self.side_to_move.index()];
        let to = m.to();
        let mut checkers = Bitboard::EMPTY;

        if prev.check_squares[moved_after.piece_type().index()].contains(to) {
            checkers.set(to);
        }

        if !m.is_drop() {
            let from = m.from();
            let discovered = prev.blockers_for_king[(!us).index()].contains(from)
                && !line_bb(ksq, from).contains(to);
            if let (true, Some(d)) = (discovered, direct_of(ksq, from)) {
                let occupied = self.occupied();
                let hit = ray_effect(d, ksq, occupied) & self.pieces_c(us);
                if let Some(sq) = hit.lsb() {
                    let pc = self.piece_on(sq);
                    if piece_effect(pc.piece_type(), us, sq, occupied).contains(ksq) {
                        checkers.set(sq);
                    }
                }
            }
        }

        checkers
    }

    /// 指し手を戻す
    pub fn undo_move(&mut self, m: Move) {
        let rec_previous = self.state().previous;
        let captured = self.state().captured_piece;

        self.side_to_move = !self.side_to_move;
        self.game_ply -= 1;
        let us = self.side_to_move;
        let them = !us;
        let to = m.to();

        if m.is_drop() {
            let pt = m.drop_piece_type();
            self.remove_piece(to);
            self.hand[us.index()] = self.hand[us.index()].add(pt);
            if pt == PieceType::Pawn {
                self.pawn_files[us.index()] &= !(1 << to.file().index());
            }
        } else {
            let from = m.from();
            let moved_pc = self.piece_on(to);
            let original_pc = if m.is_promote() {
                moved_pc.unpromote()
            } else {
                moved_pc
            };

            self.remove_piece(to);
            self.put_piece(original_pc, from);

            if original_pc.piece_type() == PieceType::King {
                self.king_square[us.index()] = from;
            }
            if m.is_promote() && original_pc.piece_type() == PieceType::Pawn {
                self.pawn_files[us.index()] |= 1 << from.file().index();
            }

            if captured.is_some() {
                self.put_piece(captured, to);
                let cap_pt = captured.piece_type().unpromote();
                self.hand[us.index()] = self.hand[us.index()].sub(cap_pt);
                if captured.piece_type() == PieceType::Pawn {
                    self.pawn_files[them.index()] |= 1 << to.file().index();
                }
            }
        }

        debug_assert!(rec_previous.is_some());
        self.st = rec_previous.unwrap_or(0);
    }

    /// null move（手番だけを渡す）。王手されているときは呼ばないこと
    pub fn do_null_move(&mut self) {
        debug_assert!(!self.in_check());

        let us = self.side_to_move;
        let prev_idx = self.st;
        let mut st = self.states[prev_idx].successor(prev_idx);
        st.board_key ^= zobrist_side();
        st.plies_from_null = 0;
        st.continuous_check[us.index()] = 0;
        st.captured_piece = Piece::NONE;
        st.last_move = Move::NULL;
        st.hand_snapshot = self.hand;

        self.side_to_move = !us;
        self.push_state(st);
        self.update_blockers_and_pinners();
        self.update_check_squares();
    }

    /// null moveを戻す
    pub fn undo_null_move(&mut self) {
        debug_assert_eq!(self.last_move(), Move::NULL);
        let previous = self.state().previous;
        self.side_to_move = !self.side_to_move;
        debug_assert!(previous.is_some());
        self.st = previous.unwrap_or(0);
    }

    /// 王手になるかどうか
    pub fn gives_check(&self, m: Move) -> bool {
        let us = self.side_to_move;
        let to = m.to();

        if m.is_drop() {
            return self.check_squares(m.drop_piece_type()).contains(to);
        }

        let from = m.from();
        let pc = self.piece_on(from);
        let moved_pt = if m.is_promote() {
            pc.piece_type().promote().unwrap_or(pc.piece_type())
        } else {
            pc.piece_type()
        };

        // 直接王手
        if self.check_squares(moved_pt).contains(to) {
            return true;
        }

        // 開き王手: from が敵玉との直線上の邪魔駒で、to がその直線から外れる
        let ksq = self.king_square[(!us).index()];
        self.blockers_for_king(!us).contains(from) && !line_bb(ksq, from).contains(to)
    }

    // ========== 指し手の復元 ==========

    /// 16bit形式の指し手に現局面の駒情報を付与する
    ///
    /// 置換表の指し手など、局面との対応が保証されない指し手を扱うときに使う。
    /// 駒の配置と矛盾する場合は None（合法性までは見ない）。
    pub fn to_move(&self, m: Move) -> Option<Move> {
        let m = Move::from_u16(m.to_u16());
        if !m.is_ok() || !m.is_well_formed() {
            return None;
        }

        let us = self.side_to_move;
        let to = m.to();
        let captured = self.piece_on(to);
        if captured.is_some() && captured.color() == us {
            return None;
        }

        if m.is_drop() {
            let pt = m.drop_piece_type();
            if !self.hand(us).has(pt) || captured.is_some() {
                return None;
            }
            return Some(Move::make_drop(Piece::new(us, pt), to));
        }

        let from = m.from();
        let pc = self.piece_on(from);
        if pc.is_none() || pc.color() != us {
            return None;
        }
        let moved_after = if m.is_promote() { pc.promote()? } else { pc };
        Some(Move::make_move(from, to, m.is_promote(), moved_after, captured))
    }

    /// USI形式の文字列を現局面の合法手に変換する
    pub fn move_from_usi(&self, s: &str) -> Result<Move, MoveParseError> {
        let raw = Move::from_usi(s)?;
        match self.to_move(raw) {
            Some(m) if self.pseudo_legal(m) && self.is_legal(m) => Ok(m),
            _ => Err(MoveParseError::NotApplicable(s.to_string())),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Position({})", self.to_sfen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    fn sq(f: File, r: Rank) -> Square {
        Square::new(f, r)
    }

    #[test]
    fn test_position_new() {
        let pos = Position::new();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert!(pos.occupied().is_empty());
        assert_eq!(pos.key(), 0);
    }

    #[test]
    fn test_put_and_remove_piece() {
        let mut pos = Position::new();
        let s = Square::SQ_55;
        pos.put_piece(Piece::B_PAWN, s);
        assert_eq!(pos.piece_on(s), Piece::B_PAWN);
        assert!(pos.pieces(Color::Black, PieceType::Pawn).contains(s));
        pos.remove_piece(s);
        assert_eq!(pos.piece_on(s), Piece::NONE);
        assert!(pos.occupied().is_empty());
    }

    #[test]
    fn test_do_undo_pawn_move_hirate() {
        let mut pos = Position::startpos();
        let key0 = pos.key();
        let m = pos.move_from_usi("7g7f").unwrap();
        pos.do_move(m, pos.gives_check(m));
        assert_eq!(pos.piece_on(sq(File::File7, Rank::Rank6)), Piece::B_PAWN);
        assert_eq!(pos.side_to_move(), Color::White);
        assert_ne!(pos.key(), key0);
        assert!(pos.verify().is_ok());

        pos.undo_move(m);
        assert_eq!(pos.piece_on(sq(File::File7, Rank::Rank7)), Piece::B_PAWN);
        assert_eq!(pos.key(), key0);
        assert_eq!(pos.side_to_move(), Color::Black);
    }

    #[test]
    fn test_capture_updates_hand_and_material() {
        // 角交換の局面
        let mut pos =
            Position::from_sfen("lnsgkgsnl/1r5b1/pppppp1pp/6p2/9/2P6/PP1PPPPPP/1B5R1/LNSGKGSNL b - 1")
                .unwrap();
        let m = pos.move_from_usi("8h2b+").unwrap();
        assert!(m.is_capture());
        assert_eq!(m.captured_piece(), Piece::W_BISHOP);
        let material0 = pos.material_value();
        pos.do_move(m, pos.gives_check(m));
        assert_eq!(pos.hand(Color::Black).count(PieceType::Bishop), 1);
        assert_eq!(pos.piece_on(sq(File::File2, Rank::Rank2)), Piece::B_HORSE);
        assert_eq!(
            pos.material_value().raw() - material0.raw(),
            855 + 855 + (945 - 855),
            "取った角（盤上+手駒）と成りの分だけ増える"
        );
        assert!(pos.verify().is_ok());
        pos.undo_move(m);
        assert!(pos.hand(Color::Black).is_empty());
        assert_eq!(pos.material_value(), material0);
        assert!(pos.verify().is_ok());
    }

    #[test]
    fn test_drop_updates_pawn_files() {
        let mut pos = Position::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b P 1").unwrap();
        assert_eq!(pos.pawn_file_mask(Color::Black), 0);
        let m = pos.move_from_usi("P*3e").unwrap();
        pos.do_move(m, pos.gives_check(m));
        assert_eq!(pos.pawn_file_mask(Color::Black), 1 << 2);
        pos.undo_move(m);
        assert_eq!(pos.pawn_file_mask(Color::Black), 0);
    }

    #[test]
    fn test_discovered_check_sets_checkers() {
        // 5九の飛車の前の銀が横にどくと開き王手
        let mut pos = Position::from_sfen("4k4/9/9/9/9/9/9/4S4/3KR4 b - 1").unwrap();
        let m = pos.move_from_usi("5h4g").unwrap();
        assert!(pos.gives_check(m));
        pos.do_move(m, true);
        assert!(pos.in_check());
        assert!(pos.checkers().contains(sq(File::File5, Rank::Rank9)));
        assert_eq!(pos.checkers().count(), 1);
        assert!(pos.verify().is_ok());
    }

    #[test]
    fn test_null_move() {
        let mut pos = Position::startpos();
        let key0 = pos.key();
        pos.do_null_move();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.key(), key0 ^ zobrist_side());
        assert_eq!(pos.state().plies_from_null, 0);
        pos.undo_null_move();
        assert_eq!(pos.key(), key0);
        assert_eq!(pos.side_to_move(), Color::Black);
    }

    #[test]
    fn test_to_move_rejects_inconsistent() {
        let pos = Position::startpos();
        // 空き升からの移動
        assert_eq!(pos.to_move(Move::from_usi("5e5d").unwrap()), None);
        // 相手の駒を動かす
        assert_eq!(pos.to_move(Move::from_usi("3c3d").unwrap()), None);
        // 持っていない駒を打つ
        assert_eq!(pos.to_move(Move::from_usi("P*5e").unwrap()), None);
        // 金は成れない
        assert_eq!(pos.to_move(Move::from_usi("4i4h+").unwrap()), None);
        let m = pos.to_move(Move::from_usi("2g2f").unwrap()).unwrap();
        assert_eq!(m.moved_piece_after(), Piece::B_PAWN);
    }

    #[test]
    fn test_move_before() {
        let mut pos = Position::startpos();
        let m1 = pos.move_from_usi("7g7f").unwrap();
        pos.do_move(m1, false);
        let m2 = pos.move_from_usi("3c3d").unwrap();
        pos.do_move(m2, false);
        assert_eq!(pos.move_before(1), m2);
        assert_eq!(pos.move_before(2), m1);
        assert_eq!(pos.move_before(3), Move::NONE);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = Position::startpos();
        let b = a.clone();
        let m = a.move_from_usi("7g7f").unwrap();
        a.do_move(m, false);
        assert_ne!(a.key(), b.key());
        assert_eq!(b.side_to_move(), Color::Black);
    }
}

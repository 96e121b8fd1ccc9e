//! 指し手生成器
//!
//! 駒種ごとに移動先の候補（target）を絞って生成する。生成されるのは擬似合法手で、
//! pin・打ち歩詰めの判定は `Position::is_legal` で行う（`Legal` 系のみここで除外する）。

use crate::bitboard::{between_bb, enemy_field, king_effect, piece_effect, Bitboard, FILE_BB, RANK_BB};
use crate::position::{allows_non_promotion, can_promote_move, Position};
use crate::types::{Color, Move, Piece, PieceType, Square};

use super::movelist::MoveList;
use super::types::{ExtMoveBuffer, GenType};

#[derive(Clone, Copy)]
struct GenerateTargets {
    /// 歩以外の駒の移動先候補
    general: Bitboard,
    /// 歩の移動先候補
    pawn: Bitboard,
    /// 駒打ちの候補（空なら打たない）
    drop: Bitboard,
}

impl GenerateTargets {
    fn new(bb: Bitboard) -> Self {
        Self {
            general: bb,
            pawn: bb,
            drop: Bitboard::EMPTY,
        }
    }

    fn with_drop(bb: Bitboard, drop: Bitboard) -> Self {
        Self {
            general: bb,
            pawn: bb,
            drop,
        }
    }
}

/// 歩の成り・不成のどちらを生成するか（敵陣内の移動先のみに効く）
#[derive(Clone, Copy, PartialEq, Eq)]
enum PawnPromotion {
    /// 通常の規則どおり
    Normal,
    /// 成りのみ
    PromoteOnly,
    /// 不成のみ（不成を生成する設定のときだけ）
    NonPromoteOnly,
}

/// 行き所のない歩・香が進めない段
fn rank1_bb(us: Color) -> Bitboard {
    match us {
        Color::Black => RANK_BB[0],
        Color::White => RANK_BB[8],
    }
}

/// 行き所のない桂が進めない段
fn rank12_bb(us: Color) -> Bitboard {
    match us {
        Color::Black => RANK_BB[0] | RANK_BB[1],
        Color::White => RANK_BB[7] | RANK_BB[8],
    }
}

/// 二歩にならない筋のBitboard
fn pawn_drop_mask(pos: &Position, us: Color) -> Bitboard {
    let files = pos.pawn_file_mask(us);
    let mut mask = Bitboard::EMPTY;
    for (i, file_bb) in FILE_BB.iter().enumerate() {
        if files & (1 << i) == 0 {
            mask |= *file_bb;
        }
    }
    mask
}

#[inline]
fn push_move(pos: &Position, buffer: &mut ExtMoveBuffer, from: Square, to: Square, pc: Piece, promote: bool) {
    let moved_after = match (promote, pc.promote()) {
        (true, Some(promoted)) => promoted,
        _ => pc,
    };
    buffer.push_move(Move::make_move(from, to, promote, moved_after, pos.piece_on(to)));
}

// ============================================================================
// 駒の移動
// ============================================================================

/// 1つの駒から target への移動手を生成（成り・不成の分岐込み）
fn generate_moves_from_sq(
    pos: &Position,
    buffer: &mut ExtMoveBuffer,
    from: Square,
    target: Bitboard,
    all: bool,
) {
    let us = pos.side_to_move();
    let pc = pos.piece_on(from);
    let pt = pc.piece_type();
    let attacks = piece_effect(pt, us, from, pos.occupied()) & target;

    for to in attacks.iter() {
        if pt.can_promote() && can_promote_move(us, from, to) {
            push_move(pos, buffer, from, to, pc, true);
            if allows_non_promotion(pt, us, to, all) {
                push_move(pos, buffer, from, to, pc, false);
            }
        } else {
            push_move(pos, buffer, from, to, pc, false);
        }
    }
}

/// 歩の移動による指し手を生成
fn generate_pawn_moves(
    pos: &Position,
    buffer: &mut ExtMoveBuffer,
    target: Bitboard,
    mode: PawnPromotion,
    all: bool,
) {
    let us = pos.side_to_move();
    for from in pos.pieces(us, PieceType::Pawn).iter() {
        generate_pawn_moves_from(pos, buffer, from, target, mode, all);
    }
}

/// 歩以外の駒の移動を生成（`with_king` が false なら玉を除く）
fn generate_piece_moves(pos: &Position, buffer: &mut ExtMoveBuffer, target: Bitboard, all: bool, with_king: bool) {
    let us = pos.side_to_move();
    let mut pieces = pos.pieces_c(us) & !pos.pieces_pt(PieceType::Pawn);
    if !with_king {
        pieces &= !pos.pieces_pt(PieceType::King);
    }
    for from in pieces.iter() {
        generate_moves_from_sq(pos, buffer, from, target, all);
    }
}

// ============================================================================
// 駒打ち
// ============================================================================

/// 駒打ちを生成（target は空き升に限ること）
fn generate_drops(pos: &Position, buffer: &mut ExtMoveBuffer, target: Bitboard) {
    let us = pos.side_to_move();
    let hand = pos.hand(us);
    if hand.is_empty() || target.is_empty() {
        return;
    }
    debug_assert!((target & pos.occupied()).is_empty());

    for pt in PieceType::HAND_TYPES {
        if !hand.has(pt) {
            continue;
        }
        let to_bb = match pt {
            // 打ち歩詰めは is_legal で除外する
            PieceType::Pawn => target & !rank1_bb(us) & pawn_drop_mask(pos, us),
            PieceType::Lance => target & !rank1_bb(us),
            PieceType::Knight => target & !rank12_bb(us),
            _ => target,
        };
        let pc = Piece::new(us, pt);
        for to in to_bb.iter() {
            buffer.push_move(Move::make_drop(pc, to));
        }
    }
}

// ============================================================================
// 生成タイプごとの本体
// ============================================================================

/// 王手がかかっていないときの指し手を生成（pseudo-legal）
fn generate_general(pos: &Position, buffer: &mut ExtMoveBuffer, targets: GenerateTargets, all: bool) {
    generate_pawn_moves(pos, buffer, targets.pawn, PawnPromotion::Normal, all);
    generate_piece_moves(pos, buffer, targets.general, all, true);
    generate_drops(pos, buffer, targets.drop);
}

/// 王手回避手を生成（pseudo-legal）
fn generate_evasions(pos: &Position, buffer: &mut ExtMoveBuffer, all: bool) {
    debug_assert!(pos.in_check());

    let us = pos.side_to_move();
    let them = !us;
    let ksq = pos.king_square(us);
    let checkers = pos.checkers();

    // 玉の移動: 玉を取り除いた盤面で敵の利きがない升
    let mut occ_without_king = pos.occupied();
    occ_without_king.clear(ksq);
    let king_pc = pos.piece_on(ksq);
    for to in (king_effect(ksq) & !pos.pieces_c(us)).iter() {
        if pos.attackers_to_c_occ(to, them, occ_without_king).is_empty() {
            push_move(pos, buffer, ksq, to, king_pc, false);
        }
    }

    // 両王手なら玉移動のみ
    if checkers.more_than_one() {
        return;
    }
    let Some(checker) = checkers.lsb() else {
        return;
    };

    // 単王手: 王手駒を取るか合い駒
    let between = between_bb(checker, ksq);
    let move_target = between | checkers;
    generate_pawn_moves(pos, buffer, move_target, PawnPromotion::Normal, all);
    generate_piece_moves(pos, buffer, move_target, all, false);
    generate_drops(pos, buffer, between);
}

/// 王手になる指し手を生成
///
/// 開き王手の候補（敵玉との間にいる自駒）はすべての移動を、それ以外の駒は
/// 王手升へ行く移動だけを候補にして、最後に `gives_check` で確かめる。
fn generate_checks(pos: &Position, buffer: &mut ExtMoveBuffer, all: bool, quiet_only: bool) {
    debug_assert!(!pos.in_check());

    let us = pos.side_to_move();
    let them = !us;
    let target = if quiet_only { pos.empties() } else { !pos.pieces_c(us) };
    let discoverers = pos.blockers_for_king(them) & pos.pieces_c(us);

    let mut candidates = ExtMoveBuffer::new();
    for from in pos.pieces_c(us).iter() {
        let pt = pos.piece_on(from).piece_type();
        let piece_target = if discoverers.contains(from) {
            target
        } else if pt == PieceType::King {
            continue;
        } else {
            let mut check_sq = pos.check_squares(pt);
            if let Some(promoted) = pt.promote() {
                check_sq |= pos.check_squares(promoted);
            }
            target & check_sq
        };
        if piece_target.is_empty() {
            continue;
        }
        if pt == PieceType::Pawn {
            generate_pawn_moves_from(pos, &mut candidates, from, piece_target, PawnPromotion::Normal, all);
        } else {
            generate_moves_from_sq(pos, &mut candidates, from, piece_target, all);
        }
    }

    for ext in candidates.iter() {
        if pos.gives_check(ext.mv) {
            buffer.push_move(ext.mv);
        }
    }

    // 駒打ちによる王手
    let hand = pos.hand(us);
    let empties = pos.empties();
    for pt in PieceType::HAND_TYPES {
        if !hand.has(pt) {
            continue;
        }
        let mut to_bb = pos.check_squares(pt) & empties;
        match pt {
            PieceType::Pawn => to_bb &= !rank1_bb(us) & pawn_drop_mask(pos, us),
            PieceType::Lance => to_bb &= !rank1_bb(us),
            PieceType::Knight => to_bb &= !rank12_bb(us),
            _ => {}
        }
        let pc = Piece::new(us, pt);
        for to in to_bb.iter() {
            buffer.push_move(Move::make_drop(pc, to));
        }
    }
}

/// 1枚の歩の移動を生成
fn generate_pawn_moves_from(
    pos: &Position,
    buffer: &mut ExtMoveBuffer,
    from: Square,
    target: Bitboard,
    mode: PawnPromotion,
    all: bool,
) {
    let us = pos.side_to_move();
    let pc = pos.piece_on(from);
    let zone = enemy_field(us);
    for to in (piece_effect(PieceType::Pawn, us, from, Bitboard::EMPTY) & target).iter() {
        if !zone.contains(to) {
            push_move(pos, buffer, from, to, pc, false);
            continue;
        }
        if mode != PawnPromotion::NonPromoteOnly {
            push_move(pos, buffer, from, to, pc, true);
        }
        if mode != PawnPromotion::PromoteOnly && allows_non_promotion(PieceType::Pawn, us, to, all) {
            push_move(pos, buffer, from, to, pc, false);
        }
    }
}

/// GenType に応じた指し手生成（pseudo-legal、`Legal` 系のみ合法手）
///
/// `Recaptures` 系では `recapture_sq` が必要。None なら何も生成しない。
/// 生成後のバッファの長さを返す。
pub fn generate_with_type(
    pos: &Position,
    gen_type: GenType,
    buffer: &mut ExtMoveBuffer,
    recapture_sq: Option<Square>,
) -> usize {
    use GenType::*;

    let us = pos.side_to_move();
    let empties = pos.empties();
    let enemy = pos.pieces_c(!us);
    let all = gen_type.includes_non_promotions();

    match gen_type {
        NonEvasions | NonEvasionsAll => {
            generate_general(pos, buffer, GenerateTargets::with_drop(!pos.pieces_c(us), empties), all);
        }
        Quiets | QuietsAll => {
            generate_general(pos, buffer, GenerateTargets::with_drop(empties, empties), all);
        }
        Captures | CapturesAll => {
            generate_general(pos, buffer, GenerateTargets::new(enemy), all);
        }
        CapturesProPlus | CapturesProPlusAll => {
            // 駒を取る手 + 駒を取らない歩の成り
            generate_pawn_moves(pos, buffer, enemy, PawnPromotion::Normal, all);
            generate_pawn_moves(pos, buffer, empties & enemy_field(us), PawnPromotion::PromoteOnly, all);
            generate_piece_moves(pos, buffer, enemy, all, true);
        }
        QuietsProMinus | QuietsProMinusAll => {
            // 駒を取らない手 - 歩の成り
            generate_pawn_moves(pos, buffer, empties, PawnPromotion::NonPromoteOnly, all);
            generate_piece_moves(pos, buffer, empties, all, true);
            generate_drops(pos, buffer, empties);
        }
        Evasions | EvasionsAll => generate_evasions(pos, buffer, all),
        Legal | LegalAll => {
            let mut temp = ExtMoveBuffer::new();
            if pos.in_check() {
                generate_evasions(pos, &mut temp, all);
            } else {
                generate_general(pos, &mut temp, GenerateTargets::with_drop(!pos.pieces_c(us), empties), all);
            }
            for ext in temp.iter() {
                if pos.is_legal(ext.mv) {
                    buffer.push_move(ext.mv);
                }
            }
        }
        Checks | ChecksAll => generate_checks(pos, buffer, all, false),
        QuietChecks | QuietChecksAll => generate_checks(pos, buffer, all, true),
        Recaptures | RecapturesAll => {
            if let Some(sq) = recapture_sq {
                let target = Bitboard::from_square(sq);
                generate_general(pos, buffer, GenerateTargets::new(target), all);
            }
        }
    }
    buffer.len()
}

/// 全ての擬似合法手を生成（王手の有無で分岐）
pub fn generate_all(pos: &Position, buffer: &mut ExtMoveBuffer) -> usize {
    let gen_type = if pos.in_check() { GenType::Evasions } else { GenType::NonEvasions };
    generate_with_type(pos, gen_type, buffer, None)
}

/// 合法手を生成（歩・角・飛の不成などを除く）
pub fn generate_legal(pos: &Position, list: &mut MoveList) {
    generate_legal_of(pos, GenType::Legal, list);
}

/// 合法手を生成（不成含む）
///
/// 成れる駒が成らない手もすべて生成する。棋譜の検証や perft で使う。
pub fn generate_legal_all(pos: &Position, list: &mut MoveList) {
    generate_legal_of(pos, GenType::LegalAll, list);
}

fn generate_legal_of(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    let mut buffer = ExtMoveBuffer::new();
    generate_with_type(pos, gen_type, &mut buffer, None);
    for ext in buffer.iter() {
        list.push(ext.mv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usi_set(buffer: &ExtMoveBuffer) -> Vec<String> {
        let mut v: Vec<String> = buffer.iter().map(|e| e.mv.to_usi()).collect();
        v.sort();
        v
    }

    #[test]
    fn test_hirate_legal_moves() {
        let pos = Position::startpos();
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);
        assert_eq!(list.len(), 30, "平手初期局面の合法手は30手");
    }

    #[test]
    fn test_quiets_and_captures_partition_non_evasions() {
        let pos = Position::from_sfen(
            "lnsgkgsnl/1r5b1/pppppp1pp/6p2/9/2P6/PP1PPPPPP/1B5R1/LNSGKGSNL b - 1",
        )
        .unwrap();
        let mut all = ExtMoveBuffer::new();
        let mut caps = ExtMoveBuffer::new();
        let mut quiets = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::NonEvasions, &mut all, None);
        generate_with_type(&pos, GenType::Captures, &mut caps, None);
        generate_with_type(&pos, GenType::Quiets, &mut quiets, None);
        assert_eq!(all.len(), caps.len() + quiets.len());
        assert!(caps.iter().all(|e| e.mv.is_capture()));
        assert!(quiets.iter().all(|e| !e.mv.is_capture()));
        assert!(usi_set(&caps).contains(&"8h2b+".to_string()));
        assert!(!usi_set(&caps).contains(&"8h2b".to_string()), "角の不成は通常生成しない");

        let mut caps_all = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::CapturesAll, &mut caps_all, None);
        assert!(usi_set(&caps_all).contains(&"8h2b".to_string()));
    }

    #[test]
    fn test_pro_plus_and_pro_minus() {
        // 5四の歩は5三に成れる。5三は空き升
        let pos = Position::from_sfen("4k4/9/9/4P4/9/9/9/9/4K4 b - 1").unwrap();
        let mut plus = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::CapturesProPlus, &mut plus, None);
        assert_eq!(usi_set(&plus), vec!["5d5c+".to_string()]);

        let mut minus = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::QuietsProMinus, &mut minus, None);
        assert!(!usi_set(&minus).iter().any(|s| s.starts_with("5d")));

        let mut minus_all = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::QuietsProMinusAll, &mut minus_all, None);
        assert!(usi_set(&minus_all).contains(&"5d5c".to_string()));
    }

    #[test]
    fn test_evasions_double_check_only_king() {
        // 5九玉に5一の飛と1五の角で両王手
        let pos = Position::from_sfen("k3r4/9/9/9/8b/9/9/9/3GKG3 b R 1").unwrap();
        assert_eq!(pos.checkers().count(), 2);
        let mut buf = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::Evasions, &mut buf, None);
        assert!(!buf.is_empty());
        assert!(buf.iter().all(|e| !e.mv.is_drop() && e.mv.from() == pos.king_square(Color::Black)));
    }

    #[test]
    fn test_evasions_single_check_interpose() {
        let pos = Position::from_sfen("k3r4/9/9/9/9/9/9/9/3GKG3 b P 1").unwrap();
        let mut buf = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::Evasions, &mut buf, None);
        let moves = usi_set(&buf);
        // 5筋には歩がないので合い駒の歩打ちができる
        assert!(moves.contains(&"P*5e".to_string()));
        assert!(moves.contains(&"6i5h".to_string()));
        assert!(!moves.contains(&"P*1e".to_string()));
    }

    #[test]
    fn test_drop_rules() {
        let pos = Position::from_sfen("4k4/9/9/9/9/9/4P4/9/4K4 b PLN 1").unwrap();
        let mut buf = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::NonEvasions, &mut buf, None);
        let moves = usi_set(&buf);
        assert!(!moves.iter().any(|s| s.starts_with("P*5")), "二歩");
        assert!(!moves.contains(&"P*1a".to_string()));
        assert!(!moves.contains(&"L*1a".to_string()));
        assert!(!moves.contains(&"N*1b".to_string()));
        assert!(moves.contains(&"N*1c".to_string()));
        assert!(moves.contains(&"P*1b".to_string()));
    }

    #[test]
    fn test_checks_all_give_check() {
        let pos = Position::from_sfen("4k4/9/9/9/9/9/9/8R/4K4 b GSNLP 1").unwrap();
        let mut buf = ExtMoveBuffer::new();
        generate_with_type(&pos, GenType::Checks, &mut buf, None);
        assert!(!buf.is_empty());
        assert!(buf.iter().all(|e| pos.gives_check(e.mv)));
        let moves = usi_set(&buf);
        assert!(moves.contains(&"G*5b".to_string()));
        assert!(moves.contains(&"L*5e".to_string()), "5筋の香打ちは王手");
    }

    #[test]
    fn test_recaptures() {
        let pos = Position::from_sfen("4k4/9/9/9/4p4/3G1S3/9/9/4K4 b - 1").unwrap();
        let mut buf = ExtMoveBuffer::new();
        let target = Square::from_usi("5e").unwrap();
        generate_with_type(&pos, GenType::Recaptures, &mut buf, Some(target));
        assert_eq!(usi_set(&buf), vec!["4f5e".to_string(), "6f5e".to_string()]);
        let mut none = ExtMoveBuffer::new();
        assert_eq!(generate_with_type(&pos, GenType::Recaptures, &mut none, None), 0);
    }
}

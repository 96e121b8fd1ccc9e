//! perft（合法手生成の検証用ノード数計測）

use crate::position::Position;
use crate::types::Move;

use super::generator::{generate_legal, generate_legal_all};
use super::movelist::MoveList;

fn legal_moves(pos: &Position, all: bool) -> MoveList {
    let mut list = MoveList::new();
    if all {
        generate_legal_all(pos, &mut list);
    } else {
        generate_legal(pos, &mut list);
    }
    list
}

/// depth 手先までの末端局面数を数える（不成も含めた全合法手）
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    perft_with(pos, depth, true)
}

/// depth 手先までの末端局面数を数える
///
/// `all` が false なら歩・角・飛の不成と2段目の香の不成を数えない。
pub fn perft_with(pos: &mut Position, depth: u32, all: bool) -> u64 {
    if depth == 0 {
        return 1;
    }

    let list = legal_moves(pos, all);
    if depth == 1 {
        return list.len() as u64;
    }

    let mut nodes = 0;
    for &m in list.iter() {
        let gives_check = pos.gives_check(m);
        pos.do_move(m, gives_check);
        nodes += perft_with(pos, depth - 1, all);
        pos.undo_move(m);
    }
    nodes
}

/// ルートの指し手ごとのノード数（不成も含めた全合法手）
pub fn perft_divide(pos: &mut Position, depth: u32) -> Vec<(Move, u64)> {
    perft_divide_with(pos, depth, true)
}

/// ルートの指し手ごとのノード数
pub fn perft_divide_with(pos: &mut Position, depth: u32, all: bool) -> Vec<(Move, u64)> {
    let list = legal_moves(pos, all);

    let mut result = Vec::with_capacity(list.len());
    for &m in list.iter() {
        let gives_check = pos.gives_check(m);
        pos.do_move(m, gives_check);
        let nodes = if depth <= 1 { 1 } else { perft_with(pos, depth - 1, all) };
        pos.undo_move(m);
        result.push((m, nodes));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perft_hirate_shallow() {
        let mut pos = Position::startpos();
        assert_eq!(perft(&mut pos, 1), 30);
        assert_eq!(perft(&mut pos, 2), 900);
        assert_eq!(pos.to_sfen(), Position::startpos().to_sfen(), "perft後に局面が戻っている");
    }

    #[test]
    fn test_perft_divide_sums() {
        let mut pos = Position::startpos();
        let divide = perft_divide(&mut pos, 2);
        assert_eq!(divide.len(), 30);
        assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 900);
    }

    #[test]
    fn test_perft_pruned_promotions() {
        // 2四の歩は2三へ成も不成も合法だが、不成は探索用の生成では省く
        let mut pos = Position::from_sfen("4k4/9/9/9/9/9/9/9/K8 b - 1").unwrap();
        let mut pawn = Position::from_sfen("4k4/9/9/7P1/9/9/9/9/K8 b - 1").unwrap();
        assert_eq!(perft_with(&mut pos, 1, true), perft_with(&mut pos, 1, false));
        assert_eq!(
            perft_with(&mut pawn, 1, true),
            perft_with(&mut pawn, 1, false) + 1,
            "2三歩不成の分だけ多い"
        );
    }
}

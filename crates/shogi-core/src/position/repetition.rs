//! 千日手・優等/劣等局面の判定

use crate::config::CoreOptions;
use crate::types::RepetitionState;

use super::pos::Position;

impl Position {
    /// 千日手の種類を判定
    ///
    /// 現局面から2手ずつ遡り、盤面ハッシュが一致する局面を最大 `max_ply` 手前まで探す。
    /// null move を越えては遡らない。最初に見つかった一致で判定を返す。
    ///
    /// - 手駒も一致: 連続王手をかけ続けていた側の負け、そうでなければ引き分け
    /// - 手駒だけが異なる: 手番側から見た優等局面・劣等局面
    pub fn repetition_state(&self, max_ply: i32) -> RepetitionState {
        let st = self.state();
        let end = max_ply.min(st.plies_from_null);
        if end < 4 {
            return RepetitionState::None;
        }

        let us = self.side_to_move();
        let our_hand = self.hand(us);

        // 2手前の局面から遡り、4手前以降を比較する
        let mut idx = match st.previous.and_then(|p| self.states[p].previous) {
            Some(i) => i,
            None => return RepetitionState::None,
        };

        let mut i = 4;
        while i <= end {
            idx = match self.states[idx].previous.and_then(|p| self.states[p].previous) {
                Some(p) => p,
                None => break,
            };
            let past = &self.states[idx];

            if past.board_key == st.board_key {
                let past_hand = past.hand_snapshot[us.index()];
                if past_hand == our_hand {
                    if i <= st.continuous_check[us.index()] {
                        return RepetitionState::Lose;
                    }
                    if i <= st.continuous_check[(!us).index()] {
                        return RepetitionState::Win;
                    }
                    return RepetitionState::Draw;
                }
                if our_hand.is_superior_or_equal(past_hand) {
                    return RepetitionState::Superior;
                }
                if past_hand.is_superior_or_equal(our_hand) {
                    return RepetitionState::Inferior;
                }
            }
            i += 2;
        }

        RepetitionState::None
    }

    /// オプションの `repetition_max_ply` まで遡って千日手を判定
    pub fn repetition_state_with(&self, options: &CoreOptions) -> RepetitionState {
        let max_ply = i32::try_from(options.repetition_max_ply).unwrap_or(i32::MAX);
        self.repetition_state(max_ply)
    }
}

#[cfg(test)]
mod tests {
    use crate::position::Position;
    use crate::types::RepetitionState;

    fn play(pos: &mut Position, moves: &[&str]) {
        for usi in moves {
            let m = pos.move_from_usi(usi).unwrap();
            let check = pos.gives_check(m);
            pos.do_move(m, check);
        }
    }

    #[test]
    fn test_simple_draw() {
        let mut pos = Position::startpos();
        play(&mut pos, &["2h3h", "8b7b", "3h2h", "7b8b"]);
        assert_eq!(pos.repetition_state(16), RepetitionState::Draw);
        // 4手未満しか遡れない範囲では判定しない
        assert_eq!(pos.repetition_state(3), RepetitionState::None);
    }

    #[test]
    fn test_no_repetition_at_start() {
        let mut pos = Position::startpos();
        assert_eq!(pos.repetition_state(16), RepetitionState::None);
        play(&mut pos, &["2h3h", "8b7b", "3h2h"]);
        assert_eq!(pos.repetition_state(16), RepetitionState::None);
    }

    #[test]
    fn test_perpetual_check() {
        // 先手の飛車が1段目と2段目を往復して王手をかけ続ける
        let mut pos = Position::from_sfen("4k4/9/9/9/9/9/9/9/R3K4 b - 1").unwrap();
        play(&mut pos, &["9i9a", "5a5b", "9a9b", "5b5a", "9b9a", "5a5b", "9a9b", "5b5a"]);
        assert!(!pos.in_check());
        // 先手番: 王手をかけ続けていた側の負け
        assert_eq!(pos.repetition_state(16), RepetitionState::Lose);

        play(&mut pos, &["9b9a"]);
        assert!(pos.in_check());
        // 後手番: 王手をかけられ続けた側の勝ち
        assert_eq!(pos.repetition_state(16), RepetitionState::Win);
    }

    #[test]
    fn test_superior_position() {
        // 先手が歩を取り、後手が同じ升に歩を打ち直して盤面だけが元に戻る
        let mut pos = Position::from_sfen("4k4/9/9/9/p8/9/9/9/R3K4 b p 1").unwrap();
        play(&mut pos, &["9i9e", "5a4a", "9e9h", "P*9e", "9h9i", "4a5a"]);
        assert_eq!(pos.hand(crate::types::Color::Black).count(crate::types::PieceType::Pawn), 1);
        assert_eq!(pos.repetition_state(16), RepetitionState::Superior);
    }

    #[test]
    fn test_null_move_stops_search() {
        let mut pos = Position::startpos();
        play(&mut pos, &["2h3h", "8b7b"]);
        pos.do_null_move();
        pos.do_null_move();
        play(&mut pos, &["3h2h", "7b8b"]);
        assert_eq!(pos.repetition_state(16), RepetitionState::None);
    }
}

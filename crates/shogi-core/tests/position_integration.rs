//! 局面まわりの結合テスト（SFEN・千日手・1手詰め・SEE）

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use shogi_core::movegen::{generate_legal_all, MoveList};
use shogi_core::{CoreOptions, Move, Position, RepetitionState, Value};

fn play(pos: &mut Position, usi: &[&str]) {
    for s in usi {
        let m = pos.move_from_usi(s).unwrap();
        let gc = pos.gives_check(m);
        pos.do_move(m, gc);
    }
}

#[test]
fn test_repetition_draw() {
    let mut pos = Position::startpos();
    play(&mut pos, &["5i5h", "5a5b", "5h5i", "5b5a"]);
    assert_eq!(pos.repetition_state(16), RepetitionState::Draw);
    assert_eq!(pos.repetition_state(2), RepetitionState::None, "遡る手数が足りない");

    let opts = CoreOptions::from_toml_str("repetition_max_ply = 2").unwrap();
    assert_eq!(pos.repetition_state_with(&opts), RepetitionState::None);
    assert_eq!(pos.repetition_state_with(&CoreOptions::default()), RepetitionState::Draw);
}

#[test]
fn test_repetition_by_perpetual_check() {
    // 先手の飛車が王手を続ける
    let mut pos = Position::from_sfen("4k4/9/9/9/9/9/9/9/R3K4 b - 1").unwrap();
    play(&mut pos, &["9i9a", "5a5b", "9a9b", "5b5a", "9b9a", "5a5b", "9a9b"]);
    // 後手番。先手が王手をかけ続けている
    assert_eq!(pos.repetition_state(16), RepetitionState::Win);
}

#[test]
fn test_superior_position() {
    // 先手が歩を取り、後手がその歩を打ち直すと盤面は6手前と同じで先手の手駒だけが多い
    let mut pos = Position::from_sfen("8k/9/9/9/4p4/9/9/4R4/4K4 b p 1").unwrap();
    let start_board = pos.to_sfen().split(' ').next().map(str::to_string);
    play(&mut pos, &["5h5e", "1a2a", "5e5f", "2a1a", "5f5h", "P*5e"]);
    assert_eq!(pos.to_sfen().split(' ').next().map(str::to_string), start_board);
    assert_eq!(pos.repetition_state(16), RepetitionState::Superior);
}

#[test]
fn test_mate_1ply_returns_legal_mating_move() {
    let sfens = [
        "4k4/9/4P4/9/9/9/9/9/4K4 b G 1",
        "k8/9/1G7/9/9/9/9/9/4K4 b R 1",
        "7nk/7p1/7GP/9/9/9/9/9/4K4 b - 1",
    ];
    for sfen in sfens {
        let pos = Position::from_sfen(sfen).unwrap();
        let m = pos.mate_1ply().unwrap_or_else(|| panic!("詰みがあるはず: {sfen}"));
        assert!(pos.pseudo_legal(m) && pos.is_legal(m));

        let mut after = pos.clone();
        let gc = after.gives_check(m);
        assert!(gc);
        after.do_move(m, gc);
        assert!(after.is_mate(), "指した後は詰み: {sfen} {}", m.to_usi());
    }
}

#[test]
fn test_mate_1ply_agrees_with_brute_force() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    for _game in 0..4 {
        let mut pos = Position::startpos();
        for _ply in 0..120 {
            let mut list = MoveList::new();
            generate_legal_all(&pos, &mut list);
            if list.is_empty() {
                break;
            }

            if !pos.in_check() {
                let brute = list.iter().any(|m| {
                    let mut p = pos.clone();
                    let gc = p.gives_check(*m);
                    p.do_move(*m, gc);
                    gc && p.is_mate()
                });
                let found = pos.mate_1ply();
                assert_eq!(found.is_some(), brute, "sfen: {}", pos.to_sfen());
            }

            let m = list[rng.random_range(0..list.len())];
            let gc = pos.gives_check(m);
            pos.do_move(m, gc);
        }
    }
}

#[test]
fn test_see_simple_exchanges() {
    // 只の駒を取る
    let pos = Position::from_sfen("4k4/9/9/9/4p4/9/9/4R4/4K4 b - 1").unwrap();
    let m = pos.move_from_usi("5h5e").unwrap();
    assert!(pos.see_ge(m, Value::ZERO));
    assert!(pos.see_ge(m, Value::new(90)));
    assert!(!pos.see_ge(m, Value::new(91)));

    // 金で守られた歩を飛車で取ると損
    let pos = Position::from_sfen("4k4/9/9/4g4/4p4/9/9/4R4/4K4 b - 1").unwrap();
    let m = pos.move_from_usi("5h5e").unwrap();
    assert!(!pos.see_ge(m, Value::ZERO));
}

#[test]
fn test_see_cheap_attacker_takes_defended_major_piece() {
    // 5六の歩(90)が5五の角(855)を取り、5四の金に取り返される（成りなし）
    let pos = Position::from_sfen("4k4/9/9/4g4/4b4/4P4/9/9/4K4 b - 1").unwrap();
    let m = pos.move_from_usi("5f5e").unwrap();
    assert!(!m.is_promote());

    // 角 - 歩 = 765 までは取り合いで得をする
    assert!(pos.see_ge(m, Value::new(765)));
    assert!(!pos.see_ge(m, Value::new(766)), "取り返されて歩の分だけ減る");
    assert!(!pos.see_ge(m, Value::new(855)), "角の価値そのものには届かない");
    assert!(pos.see_ge(m, Value::ZERO));
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 24, .. ProptestConfig::default() })]

    #[test]
    fn prop_sfen_round_trip_and_undo(seed in any::<u64>(), plies in 0usize..60) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut pos = Position::startpos();
        let mut played: Vec<(Move, String, u64)> = Vec::new();

        for _ in 0..plies {
            let mut list = MoveList::new();
            generate_legal_all(&pos, &mut list);
            if list.is_empty() {
                break;
            }
            let m = list[rng.random_range(0..list.len())];
            let before = (pos.to_sfen(), pos.key());
            let gc = pos.gives_check(m);
            pos.do_move(m, gc);
            played.push((m, before.0, before.1));

            let sfen = pos.to_sfen();
            let reparsed = Position::from_sfen(&sfen).unwrap();
            prop_assert_eq!(reparsed.to_sfen(), sfen);
            prop_assert_eq!(reparsed.key(), pos.key());
        }

        while let Some((m, sfen, key)) = played.pop() {
            pos.undo_move(m);
            prop_assert_eq!(pos.to_sfen(), sfen);
            prop_assert_eq!(pos.key(), key);
        }
    }
}

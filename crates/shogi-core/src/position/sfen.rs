//! SFEN形式の解析・出力

use thiserror::Error;

use crate::types::{Color, File, Hand, Piece, PieceType, Rank, Square};

use super::pos::Position;

/// 平手初期局面のSFEN
pub const SFEN_HIRATE: &str = "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1";

/// SFENパースエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SfenError {
    /// フィールドが足りない
    #[error("sfen is missing the {0} field")]
    MissingField(&'static str),
    /// 盤面の形式が不正
    #[error("invalid board: {0}")]
    Board(String),
    /// 手番の形式が不正
    #[error("invalid side to move: {0:?}")]
    SideToMove(String),
    /// 手駒の形式が不正
    #[error("invalid hand: {0}")]
    Hand(String),
    /// 手数の形式が不正
    #[error("invalid ply: {0:?}")]
    Ply(String),
    /// 駒数が上限を超えている
    #[error("too many {piece_type:?}: {count} > {max}")]
    TooManyPieces {
        piece_type: PieceType,
        count: u32,
        max: u32,
    },
    /// 玉の数が不正
    #[error("{color:?} must have exactly one king, found {count}")]
    KingCount { color: Color, count: u32 },
    /// 行き所のない駒・二歩・手番でない側が王手されている
    #[error("illegal placement: {0}")]
    IllegalPlacement(String),
}

/// 生駒の駒種ごとの総数
pub(super) const fn max_pieces(pt: PieceType) -> u32 {
    match pt {
        PieceType::Pawn => 18,
        PieceType::Lance | PieceType::Knight | PieceType::Silver | PieceType::Gold => 4,
        PieceType::Bishop | PieceType::Rook | PieceType::King => 2,
        _ => 0,
    }
}

impl Position {
    /// 平手初期局面
    pub fn startpos() -> Position {
        match Self::from_sfen(SFEN_HIRATE) {
            Ok(pos) => pos,
            Err(e) => unreachable!("built-in hirate sfen failed to parse: {e}"),
        }
    }

    /// SFEN文字列から局面を生成
    pub fn from_sfen(sfen: &str) -> Result<Position, SfenError> {
        let mut pos = Position::new();
        pos.set_sfen(sfen)?;
        Ok(pos)
    }

    /// SFEN文字列から局面を設定
    ///
    /// 失敗した場合 `self` は変更されない。状態アリーナの容量は引き継ぐ。
    pub fn set_sfen(&mut self, sfen: &str) -> Result<(), SfenError> {
        let mut pos = Position::with_state_capacity(self.states.capacity());
        if let Err(e) = pos.parse_sfen(sfen) {
            log::debug!("rejected sfen {sfen:?}: {e}");
            return Err(e);
        }
        *self = pos;
        Ok(())
    }

    fn parse_sfen(&mut self, sfen: &str) -> Result<(), SfenError> {
        let mut parts = sfen.split_whitespace();

        // 1. 盤面
        let board = parts.next().ok_or(SfenError::MissingField("board"))?;
        self.parse_board(board)?;

        // 2. 手番
        self.side_to_move = match parts.next().ok_or(SfenError::MissingField("side to move"))? {
            "b" => Color::Black,
            "w" => Color::White,
            other => return Err(SfenError::SideToMove(other.to_string())),
        };

        // 3. 手駒
        let hand = parts.next().ok_or(SfenError::MissingField("hand"))?;
        self.parse_hand(hand)?;

        // 4. 手数（省略時は1）
        self.game_ply = match parts.next() {
            Some(s) => match s.parse::<i32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(SfenError::Ply(s.to_string())),
            },
            None => 1,
        };

        self.validate_material()?;
        self.validate_placement()?;
        self.piece_counts = self.count_pieces();

        self.set_state();

        // 手番でない側の玉に王手がかかっている局面は不正
        let them = !self.side_to_move;
        if !self.attackers_to_c(self.king_square(them), self.side_to_move).is_empty() {
            return Err(SfenError::IllegalPlacement(format!(
                "{them:?} king is in check with {:?} to move",
                self.side_to_move
            )));
        }
        Ok(())
    }

    /// 盤面部分をパース
    fn parse_board(&mut self, board: &str) -> Result<(), SfenError> {
        let ranks: Vec<&str> = board.split('/').collect();
        if ranks.len() != Rank::NUM {
            return Err(SfenError::Board(format!("expected 9 ranks, got {}", ranks.len())));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = Rank::ALL[rank_idx];
            // 9筋から1筋へ
            let mut file_idx = File::NUM as i32 - 1;
            let mut promoted = false;

            for c in rank_str.chars() {
                if c == '+' {
                    if promoted {
                        return Err(SfenError::Board(format!("double '+' in rank {}", rank_idx + 1)));
                    }
                    promoted = true;
                    continue;
                }

                if let Some(digit) = c.to_digit(10) {
                    if promoted || digit == 0 {
                        return Err(SfenError::Board(format!(
                            "unexpected {c:?} in rank {}",
                            rank_idx + 1
                        )));
                    }
                    file_idx -= digit as i32;
                    if file_idx < -1 {
                        return Err(SfenError::Board(format!(
                            "too many squares in rank {}",
                            rank_idx + 1
                        )));
                    }
                    continue;
                }

                if file_idx < 0 {
                    return Err(SfenError::Board(format!(
                        "too many pieces in rank {}",
                        rank_idx + 1
                    )));
                }
                let pc = sfen_char_to_piece(c, promoted)?;
                let sq = Square::new(File::ALL[file_idx as usize], rank);
                self.put_piece(pc, sq);
                if pc.piece_type() == PieceType::King {
                    self.king_square[pc.color().index()] = sq;
                }
                promoted = false;
                file_idx -= 1;
            }

            if promoted || file_idx != -1 {
                return Err(SfenError::Board(format!(
                    "rank {} has wrong number of squares",
                    rank_idx + 1
                )));
            }
        }

        Ok(())
    }

    /// 手駒部分をパース
    fn parse_hand(&mut self, hand: &str) -> Result<(), SfenError> {
        if hand == "-" {
            return Ok(());
        }
        if hand.is_empty() {
            return Err(SfenError::Hand("empty".to_string()));
        }

        let mut count: Option<u32> = None;
        for c in hand.chars() {
            if let Some(digit) = c.to_digit(10) {
                let n = count.unwrap_or(0) * 10 + digit;
                if n > max_pieces(PieceType::Pawn) {
                    return Err(SfenError::Hand(format!("count {n} is too large")));
                }
                count = Some(n);
                continue;
            }

            let pt = match PieceType::from_usi_char(c) {
                Some(pt) if pt.is_hand_type() => pt,
                _ => return Err(SfenError::Hand(format!("unexpected {c:?}"))),
            };
            let color = if c.is_ascii_uppercase() { Color::Black } else { Color::White };
            let n = count.take().unwrap_or(1);
            if n == 0 {
                return Err(SfenError::Hand(format!("zero count for {c:?}")));
            }

            let total = self.hand[color.index()].count(pt) + n;
            if total > max_pieces(pt) {
                return Err(SfenError::TooManyPieces {
                    piece_type: pt,
                    count: total,
                    max: max_pieces(pt),
                });
            }
            self.hand[color.index()] = self.hand[color.index()].set(pt, total);
        }

        if count.is_some() {
            return Err(SfenError::Hand("trailing count".to_string()));
        }
        Ok(())
    }

    /// 駒数の検証（各駒種の総数、玉は各1枚）
    fn validate_material(&self) -> Result<(), SfenError> {
        for color in Color::ALL {
            let count = self.pieces(color, PieceType::King).count();
            if count != 1 {
                return Err(SfenError::KingCount { color, count });
            }
        }

        for pt in PieceType::HAND_TYPES {
            let on_board = self.pieces_pt(pt).count()
                + pt.promote().map_or(0, |promoted| self.pieces_pt(promoted).count());
            let in_hand = self.hand(Color::Black).count(pt) + self.hand(Color::White).count(pt);
            let count = on_board + in_hand;
            if count > max_pieces(pt) {
                return Err(SfenError::TooManyPieces {
                    piece_type: pt,
                    count,
                    max: max_pieces(pt),
                });
            }
        }
        Ok(())
    }

    /// 行き所のない駒と二歩の検証、歩の筋マスクの構築
    fn validate_placement(&mut self) -> Result<(), SfenError> {
        for sq in Square::all() {
            let pc = self.piece_on(sq);
            if pc.is_none() {
                continue;
            }
            let rel = sq.rank().relative(pc.color()).index();
            let dead = match pc.piece_type() {
                PieceType::Pawn | PieceType::Lance => rel == 0,
                PieceType::Knight => rel <= 1,
                _ => false,
            };
            if dead {
                return Err(SfenError::IllegalPlacement(format!(
                    "{} cannot stay on {}",
                    pc.to_sfen(),
                    sq.to_usi()
                )));
            }

            if pc.piece_type() == PieceType::Pawn {
                let bit = 1u16 << sq.file().index();
                let mask = &mut self.pawn_files[pc.color().index()];
                if *mask & bit != 0 {
                    return Err(SfenError::IllegalPlacement(format!(
                        "two {:?} pawns on file {}",
                        pc.color(),
                        sq.file().to_usi_char()
                    )));
                }
                *mask |= bit;
            }
        }
        Ok(())
    }

    /// 現局面のSFEN文字列を取得
    pub fn to_sfen(&self) -> String {
        let mut result = String::new();

        // 1. 盤面
        for (rank_idx, rank) in Rank::ALL.iter().enumerate() {
            let mut empty_count = 0;
            for file in File::ALL.iter().rev() {
                let pc = self.piece_on(Square::new(*file, *rank));
                if pc.is_none() {
                    empty_count += 1;
                    continue;
                }
                if empty_count > 0 {
                    result.push_str(&empty_count.to_string());
                    empty_count = 0;
                }
                result.push_str(&pc.to_sfen());
            }
            if empty_count > 0 {
                result.push_str(&empty_count.to_string());
            }
            if rank_idx + 1 < Rank::NUM {
                result.push('/');
            }
        }

        // 2. 手番
        result.push(' ');
        result.push(if self.side_to_move == Color::Black { 'b' } else { 'w' });

        // 3. 手駒（先手から、飛角金銀桂香歩の順）
        result.push(' ');
        let hand_start = result.len();
        for color in Color::ALL {
            for pt in Hand::SFEN_ORDER {
                let cnt = self.hand[color.index()].count(pt);
                if cnt == 0 {
                    continue;
                }
                if cnt > 1 {
                    result.push_str(&cnt.to_string());
                }
                let c = pt.to_usi_char();
                result.push(if color == Color::White { c.to_ascii_lowercase() } else { c });
            }
        }
        if result.len() == hand_start {
            result.push('-');
        }

        // 4. 手数
        result.push(' ');
        result.push_str(&self.game_ply.to_string());

        result
    }
}

/// SFEN文字を駒に変換
fn sfen_char_to_piece(c: char, promoted: bool) -> Result<Piece, SfenError> {
    let pt = PieceType::from_usi_char(c)
        .ok_or_else(|| SfenError::Board(format!("unknown piece {c:?}")))?;
    let pt = if promoted {
        pt.promote()
            .ok_or_else(|| SfenError::Board(format!("{c:?} cannot be promoted")))?
    } else {
        pt
    };
    let color = if c.is_ascii_uppercase() { Color::Black } else { Color::White };
    Ok(Piece::new(color, pt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hirate_roundtrip() {
        let pos = Position::from_sfen(SFEN_HIRATE).unwrap();
        assert_eq!(pos.to_sfen(), SFEN_HIRATE);
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.king_square(Color::Black).to_usi(), "5i");
        assert_eq!(pos.king_square(Color::White).to_usi(), "5a");
        assert_eq!(pos.pawn_file_mask(Color::Black), 0x1FF);
        assert!(!pos.in_check());
    }

    #[test]
    fn test_hand_output_order() {
        let sfen = "4k4/9/9/9/9/9/9/9/4K4 w RB2G2S2N2L9Pr2s 42";
        let pos = Position::from_sfen(sfen).unwrap();
        assert_eq!(pos.to_sfen(), sfen);
        assert_eq!(pos.hand(Color::Black).count(PieceType::Pawn), 9);
        assert_eq!(pos.hand(Color::White).count(PieceType::Silver), 2);
        assert_eq!(pos.game_ply(), 42);
    }

    #[test]
    fn test_promoted_pieces_roundtrip() {
        let sfen = "4k4/9/4+P4/9/9/9/2+r6/9/4K3+B b - 1";
        let pos = Position::from_sfen(sfen).unwrap();
        assert_eq!(pos.to_sfen(), sfen);
        assert_eq!(pos.piece_on(Square::from_usi("5c").unwrap()), Piece::B_PRO_PAWN);
        assert_eq!(pos.piece_on(Square::from_usi("7g").unwrap()), Piece::W_DRAGON);
    }

    #[test]
    fn test_ply_defaults_to_one() {
        let pos = Position::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b -").unwrap();
        assert_eq!(pos.game_ply(), 1);
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(
            Position::from_sfen("").unwrap_err(),
            SfenError::MissingField("board")
        );
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/9/9/9/4K4 b - 1"),
            Err(SfenError::Board(_))
        ));
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/9/9/9/9/4K5 b - 1"),
            Err(SfenError::Board(_))
        ));
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/9/9/9/9/4K4 x - 1"),
            Err(SfenError::SideToMove(_))
        ));
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b K 1"),
            Err(SfenError::Hand(_))
        ));
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b - abc"),
            Err(SfenError::Ply(_))
        ));
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b 3B 1"),
            Err(SfenError::TooManyPieces { piece_type: PieceType::Bishop, .. })
        ));
        assert!(matches!(
            Position::from_sfen("9/9/9/9/9/9/9/9/4K4 b - 1"),
            Err(SfenError::KingCount { color: Color::White, count: 0 })
        ));
    }

    #[test]
    fn test_rejects_illegal_placement() {
        // 二歩
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/4P4/9/4P4/9/4K4 b - 1"),
            Err(SfenError::IllegalPlacement(_))
        ));
        // 行き所のない桂
        assert!(matches!(
            Position::from_sfen("4k3N/9/9/9/9/9/9/9/4K4 b - 1"),
            Err(SfenError::IllegalPlacement(_))
        ));
        // 手番でない側が王手されている
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/9/9/9/9/4K3r b - 1"),
            Ok(_)
        ));
        assert!(matches!(
            Position::from_sfen("4k4/9/9/9/9/9/9/9/4K3r w - 1"),
            Err(SfenError::IllegalPlacement(_))
        ));
    }

    #[test]
    fn test_set_sfen_failure_keeps_position() {
        let mut pos = Position::startpos();
        assert!(pos.set_sfen("garbage").is_err());
        assert_eq!(pos.to_sfen(), SFEN_HIRATE);
    }

    #[test]
    fn test_in_check_after_parse() {
        let pos = Position::from_sfen("4k4/9/9/9/9/9/9/9/4K3r b - 1").unwrap();
        assert!(pos.in_check());
        assert_eq!(pos.checkers().count(), 1);
    }
}

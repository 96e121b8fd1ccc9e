//! shogi-core を手元で確かめるためのコマンドラインツール群の共通部分

pub mod common;

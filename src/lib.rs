pub mod types;
pub mod board;
pub mod movegen;
pub mod game;
pub mod evaluate;
pub mod search;
pub mod perft;

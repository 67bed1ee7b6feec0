pub mod accumulate;
pub mod filter;
pub mod geo;
pub mod heart_rate;
pub mod laps;
pub mod pace;
pub mod parse;
pub mod replay;

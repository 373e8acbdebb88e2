pub mod cache;
pub mod viewed;

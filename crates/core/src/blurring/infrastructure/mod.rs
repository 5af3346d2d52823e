pub mod adaptive_blurrer;
pub mod gaussian;

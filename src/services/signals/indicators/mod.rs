//! Technical indicator implementations.
//!
//! Pure functions over price series: no I/O, no shared state.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod zscore;

pub use atr::Atr;
pub use ema::Ema;
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use zscore::ZScore;

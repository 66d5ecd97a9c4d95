pub mod chart;
pub mod market;
pub mod onchain;
pub mod signals;
pub mod trading;

pub use chart::*;
pub use market::*;
pub use onchain::*;
pub use signals::*;
pub use trading::*;

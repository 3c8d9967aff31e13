pub mod candle;
pub mod direction;
pub mod signal;
pub mod symbol;
pub mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use direction::*;
pub use signal::{Target, TradingSignal};
pub use symbol::Symbol;
pub use timeframe::Timeframe;

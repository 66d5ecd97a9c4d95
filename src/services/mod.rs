pub mod cache;
pub mod fx;
pub mod market_data;
pub mod sentiment;
pub mod signals;
pub mod sqlite_store;
pub mod sync;
pub mod tools;
pub mod trading;

pub use cache::TtlCache;
pub use fx::FxService;
pub use market_data::{MarketDataService, SummaryOutcome};
pub use sentiment::{FearGreedLookup, SentimentService};
pub use signals::SignalPipeline;
pub use sqlite_store::SqliteStore;
pub use sync::{SyncReport, SyncService};
pub use tools::{DcaPlan, ToolsService};
pub use trading::PaperTradingService;

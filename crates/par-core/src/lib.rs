pub mod config;
pub mod error;
pub mod join;
pub mod models;
pub mod output;
pub mod schema;
pub mod season;
pub mod standings;
pub mod throttle;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::FetchConfig;
pub use error::AppError;
pub use models::{
    FetchRequest, FetchResult, JoinedRow, PlayerRow, TableFragment, TeamStanding, season_label,
};
pub use season::{PlayerMetricsService, RunSummary, SeasonRunner, SeasonTarget};
pub use standings::StandingsService;
pub use throttle::RateLimitedFetcher;
pub use traits::{Fetcher, TableReader};

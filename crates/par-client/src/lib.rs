pub mod fbref;
pub mod fetcher;
pub mod table;

pub use fbref::FbrefCompetition;
pub use fetcher::{ReqwestFetcher, polite_client};
pub use table::ScraperTableReader;

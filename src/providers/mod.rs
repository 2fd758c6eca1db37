pub mod eastmoney;
pub mod http;
pub mod util;

pub use eastmoney::EastmoneyHistoryProvider;
pub use http::HttpFetcher;

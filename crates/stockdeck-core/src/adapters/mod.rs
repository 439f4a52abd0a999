mod alphavantage;
mod polygon;
mod yahoo;

pub use alphavantage::AlphaVantageClient;
pub use polygon::PolygonClient;
pub use yahoo::YahooClient;

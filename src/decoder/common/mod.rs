pub mod utils;
pub mod ziplist;

pub use self::ziplist::parse_ziplist;

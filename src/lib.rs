// 公开导出的模块，供外部使用
pub mod models;
pub mod errors;
pub mod config;
pub mod services;

// 数据源和输出端的具体实现
pub mod scrapers;
pub mod sinks;
#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use models::price::{LongRecord, LongTable, OhlcType, UploadTarget, WideTable};
pub use services::data_service::{DataService, RunReport};
pub use services::reshape::reshape_price_data;
pub use errors::{Result, PriceHubError};

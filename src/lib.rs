// Postasy poster compositing library

pub mod compositor;
pub mod config;
pub mod constants;
pub mod error;
pub mod fonts;
pub mod generation;
pub mod logging;
pub mod pipeline;
pub mod raster;
pub mod retry;
pub mod storage;

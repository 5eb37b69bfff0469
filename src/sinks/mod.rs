pub mod base;
pub mod console;
pub mod gcs;
pub mod storage;

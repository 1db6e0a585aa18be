// Adapters layer: concrete implementations for external systems (http providers, storage, spreadsheets).

pub mod http;
pub mod kmdb;
pub mod omdb;
pub mod storage;
pub mod xlsx;

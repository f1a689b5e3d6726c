pub mod config;
pub mod logging;

// Job lifecycle engine
pub mod bench;
pub mod context;
pub mod export;
pub mod job;
pub mod poller;
pub mod remote;
pub mod settings;
pub mod storage;
pub mod store;
pub mod submit;

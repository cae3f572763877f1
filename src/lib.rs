#![forbid(unsafe_code)]

pub mod archive;
pub mod classify;
pub mod cli;
pub mod db;
pub mod document;
pub mod extract;
pub mod fetch;
pub mod filing;
pub mod formats;
pub mod gate;
pub mod logging;
pub mod message;
pub mod normalize;
pub mod notify;
pub mod pipeline;
pub mod serve;
pub mod store;
pub mod watch;
pub mod webhook;

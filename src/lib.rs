pub mod cli;
pub mod config;
pub mod pipeline;
pub mod remote;
pub mod sink;
pub mod source;
pub mod web;

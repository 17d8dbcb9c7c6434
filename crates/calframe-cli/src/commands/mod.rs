pub mod config;
pub mod info;
pub mod master;
pub mod run;

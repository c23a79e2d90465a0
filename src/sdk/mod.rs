pub mod config;
pub mod directory;
pub mod filter;
pub mod pregeocode;
pub mod routing;
pub mod search;
pub mod util;

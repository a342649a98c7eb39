pub mod capture;
pub mod classify;
pub mod init_config;
pub mod replay;
pub mod resolve;
pub mod util;

pub use capture::*;
pub use classify::*;
pub use init_config::*;
pub use replay::*;
pub use resolve::*;
pub use util::*;

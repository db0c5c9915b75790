// Interface adapters: wire protocol, level files and network handling.

pub mod http;
pub mod level;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;

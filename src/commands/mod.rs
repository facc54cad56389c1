//! Command implementations
//!
//! Each module corresponds to a subcommand in the CLI.

pub mod ask;
pub mod backend;
pub mod chat;
pub mod graph;
pub mod init_index;

pub use ask::{run as ask_run, AskOptions};
pub use backend::build_pipeline;
pub use chat::run as chat_run;
pub use graph::run as graph_run;
pub use init_index::run as init_index_run;

pub mod archive;
pub mod fs_ops;
pub mod search;
pub mod validator;

pub use archive::ArchiveCommands;
pub use fs_ops::{FsCommands, Removal, RemovalPlan};
pub use search::SearchCommands;
pub use validator::{CommandValidator, ParsedArgs, RECURSIVE_FLAG};

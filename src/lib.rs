pub mod archiver;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod handler;
pub mod model;
pub mod source;

pub use archiver::{ArchiveOptions, ArchiveReport, Archiver, JobState};
pub use error::{ArchiveError, StorageError};
pub use model::{ArchivedMessage, ChannelInfo, GuildInfo, SourceMessage};

mod client;

pub use client::{DriveClient, DriveError, DriveFile, EntryKind, FOLDER_MIME_TYPE, FileList};

use gdrive_core::{DriveClient, DriveError, DriveFile};

use super::matcher::{NamePattern, find_child_by_pattern};

/// Listing of one remote folder, in the order the API returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteContainer {
    pub id: String,
    pub entries: Vec<DriveFile>,
}

impl RemoteContainer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn find(&self, pattern: &NamePattern) -> Option<&DriveFile> {
        find_child_by_pattern(&self.entries, pattern)
    }
}

#[allow(async_fn_in_trait)]
pub trait DirectoryResolver {
    /// Lists the children of `container_id`. An empty id resolves to an empty
    /// container without touching the network.
    async fn list_children(&self, container_id: &str) -> Result<RemoteContainer, DriveError>;
}

impl DirectoryResolver for DriveClient {
    async fn list_children(&self, container_id: &str) -> Result<RemoteContainer, DriveError> {
        if container_id.is_empty() {
            return Ok(RemoteContainer::empty());
        }
        let entries = self.list_children_all(container_id).await?;
        Ok(RemoteContainer {
            id: container_id.to_string(),
            entries,
        })
    }
}

//! Forum thread handles returned by the chat platform.

/// A thread inside a forum channel, as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHandle {
    pub id: String,
    pub name: String,

    /// Forum channel that owns the thread
    pub parent_id: Option<String>,
    pub archived: bool,
}

impl ThreadHandle {
    /// Whether the thread belongs to `parent_id`.
    pub fn is_child_of(&self, parent_id: &str) -> bool {
        self.parent_id.as_deref() == Some(parent_id)
    }
}

/// Which archived-thread listing to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveScope {
    Public,
    Private,
}

impl ArchiveScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveScope::Public => "public",
            ArchiveScope::Private => "private",
        }
    }
}

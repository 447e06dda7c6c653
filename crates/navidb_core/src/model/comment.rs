//! Comment read model.

use super::{CommentId, UserId};
use serde::{Deserialize, Serialize};

/// One entry of a comment thread.
///
/// Threads are singly linked from the newest comment back to the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Comment this one was appended after. `None` for the first comment.
    pub parent_id: Option<CommentId>,
    pub user_id: UserId,
    pub text: String,
}

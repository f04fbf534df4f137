//! Tag rows.

use serde::Serialize;

use aladabuy_core::{ContentType, TagId, TagItemId, TaggedRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub label: String,
}

/// One attachment of a tag to an arbitrary entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TagItem {
    pub id: TagItemId,
    pub tag_id: TagId,
    pub content_type: ContentType,
    pub object_id: i32,
}

impl TagItem {
    #[must_use]
    pub const fn target(&self) -> TaggedRef {
        TaggedRef::new(self.content_type, self.object_id)
    }
}

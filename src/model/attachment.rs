use crate::utils::compute_hash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an attachment currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum AttachmentContainer {
    /// Uploaded by a user but not yet attached to any posting
    UserTemp(u64),
    Issue(u64),
    Comment(u64),
}

/// Metadata of an uploaded file. The bytes themselves live in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    pub name: String,
    /// SHA-256 of the content
    pub hash: String,
    pub size: u64,
    pub mime_type: String,
    pub container: AttachmentContainer,
}

impl Attachment {
    /// Describe a freshly uploaded file waiting in the user's temporary area
    pub fn pending(user_id: u64, name: impl Into<String>, content: &[u8]) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            id: Uuid::new_v4(),
            hash: compute_hash(content),
            size: content.len() as u64,
            mime_type,
            name,
            container: AttachmentContainer::UserTemp(user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_attachment() {
        let attachment = Attachment::pending(4, "screenshot.png", b"not really a png");
        assert_eq!(attachment.container, AttachmentContainer::UserTemp(4));
        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(attachment.size, 16);
        assert_eq!(attachment.hash.len(), 64);
    }

    #[test]
    fn test_unknown_extension_is_octet_stream() {
        let attachment = Attachment::pending(4, "notes.zzz", b"x");
        assert_eq!(attachment.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_container_serialization() {
        let json = serde_json::to_string(&AttachmentContainer::Issue(9)).unwrap();
        assert_eq!(json, r#"{"kind":"issue","id":9}"#);
    }
}

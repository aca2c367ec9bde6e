/// A file attached to a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    id: u32,
    mime_type: String,
    filename: String,
}

impl Attachment {
    pub fn new(id: u32, mime_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id,
            mime_type: mime_type.into(),
            filename: filename.into(),
        }
    }

    /// 1-based position among the resource's attachments.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

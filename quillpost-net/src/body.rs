//! Multipart request payloads.
//!
//! Multipart bodies are carried through the pipeline as plain
//! [`MultipartField`]s rather than a pre-built `reqwest` form, so the
//! transport boundary stays inspectable by test doubles. The reqwest
//! transport converts fields into a `multipart/form-data` form at the
//! last moment.

/// One field of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartField {
    /// A plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// A binary file field.
    Bytes {
        /// Field name.
        name: String,
        /// File name reported to the server.
        file_name: String,
        /// MIME type of the payload.
        mime: String,
        /// Raw payload bytes.
        data: Vec<u8>,
    },
}

impl MultipartField {
    /// Creates a text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a binary file field.
    pub fn bytes(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self::Bytes {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            data,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::Bytes { name, .. } => name,
        }
    }
}

/// Conversion into a multipart body.
///
/// Implemented by binary request payloads (e.g. image uploads) that
/// are sent through [`crate::ApiClient::send_multipart`].
pub trait IntoMultipart {
    /// Consumes the payload and produces its multipart fields.
    fn into_fields(self) -> Vec<MultipartField>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upload {
        title: String,
        image: Vec<u8>,
    }

    impl IntoMultipart for Upload {
        fn into_fields(self) -> Vec<MultipartField> {
            vec![
                MultipartField::text("title", self.title),
                MultipartField::bytes("image", "photo.jpg", "image/jpeg", self.image),
            ]
        }
    }

    #[test]
    fn test_into_fields() {
        let upload = Upload {
            title: "sunset".into(),
            image: vec![0xFF, 0xD8],
        };

        let fields = upload.into_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name(), "title");
        assert_eq!(fields[1].name(), "image");
    }
}

use crate::ImageSize;

/// Value of a metadata field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// A width/height pair, e.g. a logical screen resolution.
    Dimensions(ImageSize),
}

/// A named metadata field exposed by a ROM reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomField {
    pub name: &'static str,
    pub value: FieldValue,
}

impl RomField {
    pub fn text(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: FieldValue::Text(value.into()),
        }
    }

    pub fn dimensions(name: &'static str, width: u32, height: u32) -> Self {
        Self {
            name,
            value: FieldValue::Dimensions(ImageSize::new(width, height)),
        }
    }

    pub fn as_dimensions(&self) -> Option<ImageSize> {
        match self.value {
            FieldValue::Dimensions(size) => Some(size),
            FieldValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Dimensions(size) => write!(f, "{size}"),
        }
    }
}

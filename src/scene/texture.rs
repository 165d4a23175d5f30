use std::sync::Arc;

/// Handle to a texture entry owned by a [`Scene`](super::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureSlot(pub(crate) usize);

impl TextureSlot {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// An image resource that may resolve after the scene was built.
///
/// `revision` starts at zero and is bumped every time an image is stored, so
/// the renderer can tell when it has to upload again.
#[derive(Clone, Debug)]
pub struct TextureEntry {
    path: String,
    image: Option<Arc<image::RgbaImage>>,
    revision: u64,
}

impl TextureEntry {
    pub(crate) fn pending(path: &str) -> Self {
        Self {
            path: path.to_string(),
            image: None,
            revision: 0,
        }
    }

    pub(crate) fn resolved(path: &str, image: image::RgbaImage) -> Self {
        Self {
            path: path.to_string(),
            image: Some(Arc::new(image)),
            revision: 1,
        }
    }

    pub(crate) fn resolve(&mut self, image: image::RgbaImage) {
        self.image = Some(Arc::new(image));
        self.revision += 1;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn image(&self) -> Option<&Arc<image::RgbaImage>> {
        self.image.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.image.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Byte copy of a pixel buffer taken when a tool is enabled or after an apply.
///
/// Cancel writes it back verbatim, so the restored buffer is byte-identical to
/// the moment the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSnapshot {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl EditSnapshot {
    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bytes,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width
            && self.height == height
            && self.bytes.len() == width as usize * height as usize * 4
    }

    /// Number of RGBA pixels that differ between the snapshot and `current`.
    pub fn changed_pixels(&self, current: &[u8]) -> usize {
        self.bytes
            .chunks_exact(4)
            .zip(current.chunks_exact(4))
            .filter(|(before, after)| before != after)
            .count()
    }
}

//! Decoded video frames.

/// One decoded RGB24 frame.
#[derive(Debug, Clone)]
pub struct RgbFrame {
    /// Zero-based position in the decoded stream
    pub index: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Packed RGB bytes, row-major, `width * height * 3` long
    pub data: Vec<u8>,
}

impl RgbFrame {
    pub fn new(index: u64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            index,
            width,
            height,
            data,
        }
    }

    /// Byte length of one frame at the given size.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    /// Whether the buffer matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == Self::byte_len(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_len() {
        assert_eq!(RgbFrame::byte_len(4, 2), 24);
        let frame = RgbFrame::new(0, 4, 2, vec![0; 24]);
        assert!(frame.is_well_formed());
        let frame = RgbFrame::new(0, 4, 2, vec![0; 23]);
        assert!(!frame.is_well_formed());
    }
}

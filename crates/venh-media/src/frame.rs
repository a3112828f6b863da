//! Decoded video frames.

/// One packed 3-channel raster (`bgr24`), row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Zero-based position in the source video.
    pub index: u64,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, index: u64, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            index,
            data,
        }
    }

    /// Frame filled with a single byte value.
    pub fn filled(width: u32, height: u32, index: u64, value: u8) -> Self {
        Self::new(width, height, index, vec![value; expected_len(width, height)])
    }

    /// Expected byte length for these dimensions.
    pub fn expected_len(&self) -> usize {
        expected_len(self.width, self.height)
    }

    /// Dimensions match the buffer length.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && other.is_well_formed()
    }
}

pub(crate) fn expected_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_checks() {
        let a = Frame::filled(4, 2, 0, 7);
        assert_eq!(a.data.len(), 24);
        assert!(a.is_well_formed());

        let mut b = a.clone();
        b.data.pop();
        assert!(!a.same_shape(&b));

        let c = Frame::filled(2, 4, 0, 7);
        assert!(!a.same_shape(&c));
    }
}

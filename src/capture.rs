/// An RGB frame as delivered by a capture source.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triples, `width * height * 3` bytes
    pub pixels: Vec<u8>,
    pub mirrored: bool,
}

impl Frame {
    pub fn new(seq: u64, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            seq,
            width,
            height,
            pixels,
            mirrored: false,
        }
    }

    /// A black frame; replay and simulated sources carry no real image data.
    pub fn blank(seq: u64, width: u32, height: u32) -> Self {
        Self::new(seq, width, height, vec![0; width as usize * height as usize * 3])
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Mirrors the image around its vertical axis, in place.
    pub fn flip_horizontal(&mut self) {
        let row_len = self.width as usize * 3;
        if row_len == 0 {
            return;
        }
        for row in self.pixels.chunks_exact_mut(row_len) {
            let (mut l, mut r) = (0usize, self.width as usize - 1);
            while l < r {
                for c in 0..3 {
                    row.swap(l * 3 + c, r * 3 + c);
                }
                l += 1;
                r -= 1;
            }
        }
        self.mirrored = !self.mirrored;
    }
}

/// Camera boundary: yields the next frame, or `None` when nothing is available
/// this tick.
pub trait FrameSource {
    fn read_frame(&mut self) -> Option<Frame>;

    fn name(&self) -> &str {
        "capture"
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Option<Frame> {
        (**self).read_frame()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Produces blank frames of a fixed size forever. Pairs with estimators that
/// do not look at pixels.
#[derive(Debug, Clone)]
pub struct BlankCapture {
    width: u32,
    height: u32,
    seq: u64,
}

impl BlankCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            seq: 0,
        }
    }
}

impl FrameSource for BlankCapture {
    fn read_frame(&mut self) -> Option<Frame> {
        let frame = Frame::blank(self.seq, self.width, self.height);
        self.seq += 1;
        Some(frame)
    }

    fn name(&self) -> &str {
        "blank capture"
    }
}

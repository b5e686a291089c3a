/// Fixed-window character splitter with overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl TextSplitter {
    /// `overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        if self.chunk_size == 0 {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let chars: Vec<char> = text.chars().collect();
        let step = (self.chunk_size - self.overlap).max(1);

        while start < chars.len() {
            let end = usize::min(start + self.chunk_size, chars.len());
            let chunk: String = chars[start..end].iter().collect();
            if !chunk.trim().is_empty() {
                chunks.push(chunk);
            }

            if end == chars.len() {
                break;
            }

            start = start.saturating_add(step);
        }

        chunks
    }
}

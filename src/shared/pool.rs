use std::sync::Mutex;

/// Reusable pool of byte buffers shared by the merge workers.
/// Buffers keep their capacity between merges, so steady-state merging
/// performs no large allocations.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    initial_capacity: usize,
}

impl BufferPool {
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            initial_capacity,
        }
    }

    /// Takes a cleared buffer out of the pool, allocating one if empty.
    pub fn get(&self) -> Vec<u8> {
        let mut buffers = self.buffers.lock().unwrap();
        buffers
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.initial_capacity))
    }

    /// Returns a buffer to the pool for reuse.
    pub fn put(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        let mut buffers = self.buffers.lock().unwrap();
        buffers.push(buffer);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        // 16 MiB matches the typical size of a merged columnar file.
        Self::new(16 << 20)
    }
}

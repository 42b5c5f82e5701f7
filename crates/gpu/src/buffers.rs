use bytemuck::Pod;

/// Smallest allocation made for a vertex buffer, in bytes.
pub const MIN_CAPACITY: u64 = 4096;

/// Capacity to allocate so that `required` bytes fit. Never shrinks;
/// grows to the next power of two so a slowly growing route set does not
/// reallocate on every rebuild.
pub fn grown_capacity(current: u64, required: u64) -> u64 {
    if required <= current {
        return current;
    }
    required
        .max(MIN_CAPACITY)
        .next_power_of_two()
        .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

/// A vertex buffer created once and refilled in place with
/// `Queue::write_buffer`, reallocated only when the data outgrows it.
#[derive(Debug)]
pub struct VertexBuffer {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: u64,
    len_bytes: u64,
    count: u32,
}

impl VertexBuffer {
    pub fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            label,
            buffer: allocate(device, label, MIN_CAPACITY),
            capacity: MIN_CAPACITY,
            len_bytes: 0,
            count: 0,
        }
    }

    pub fn upload<T: Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(items);
        let required = bytes.len() as u64;

        let capacity = grown_capacity(self.capacity, required);
        if capacity != self.capacity {
            tracing::debug!(
                label = self.label,
                from = self.capacity,
                to = capacity,
                "growing vertex buffer"
            );
            self.buffer.destroy();
            self.buffer = allocate(device, self.label, capacity);
            self.capacity = capacity;
        }

        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len_bytes = required;
        self.count = items.len() as u32;
    }

    /// Number of elements written by the last upload.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The written prefix. Only valid while `count() > 0`.
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..self.len_bytes)
    }

    pub fn destroy(&mut self) {
        self.buffer.destroy();
        self.len_bytes = 0;
        self.count = 0;
    }
}

fn allocate(device: &wgpu::Device, label: &'static str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::{MIN_CAPACITY, grown_capacity};

    #[test]
    fn fits_without_reallocating() {
        assert_eq!(grown_capacity(MIN_CAPACITY, 0), MIN_CAPACITY);
        assert_eq!(grown_capacity(MIN_CAPACITY, MIN_CAPACITY), MIN_CAPACITY);
        assert_eq!(grown_capacity(1 << 20, 100), 1 << 20);
    }

    #[test]
    fn grows_to_next_power_of_two() {
        assert_eq!(grown_capacity(MIN_CAPACITY, MIN_CAPACITY + 1), 8192);
        assert_eq!(grown_capacity(MIN_CAPACITY, 36 * 3000 * 80), 16 << 20);
    }

    #[test]
    fn never_allocates_below_minimum() {
        assert_eq!(grown_capacity(0, 36), MIN_CAPACITY);
    }

    #[test]
    fn growth_is_copy_aligned() {
        for required in [1, 37, 4097, 100_003] {
            assert_eq!(grown_capacity(0, required) % wgpu::COPY_BUFFER_ALIGNMENT, 0);
        }
    }
}

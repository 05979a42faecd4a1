//! Premultiplied-RGBA8 software surface with device-pixel-ratio sizing.
//!
//! Callers work in logical pixels; the backing buffer is physical
//! (`logical * dpr`). Reallocation happens only when the physical size
//! actually changes, so per-frame `resize` calls with a stable size are free.

#[derive(Default)]
pub struct Surface {
    logical_width: u32,
    logical_height: u32,
    dpr: f64,
    width: u32,
    height: u32,
    data: Vec<u8>,
    realloc_count: u64,
}

impl Surface {
    pub fn new() -> Self {
        Self {
            dpr: 1.0,
            ..Self::default()
        }
    }

    /// Set the logical size and device pixel ratio, reallocating the backing
    /// buffer only when the resulting physical size changed.
    pub fn resize(&mut self, logical_width: u32, logical_height: u32, dpr: f64) {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let width = (f64::from(logical_width) * dpr).round() as u32;
        let height = (f64::from(logical_height) * dpr).round() as u32;

        self.logical_width = logical_width;
        self.logical_height = logical_height;
        self.dpr = dpr;

        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.data = vec![0u8; (width as usize) * (height as usize) * 4];
        self.realloc_count += 1;
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn logical_width(&self) -> u32 {
        self.logical_width
    }

    pub fn logical_height(&self) -> u32 {
        self.logical_height
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn realloc_count(&self) -> u64 {
        self.realloc_count
    }

    /// Physical-pixel read, mostly for tests.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

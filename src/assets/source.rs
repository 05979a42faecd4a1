//! Frame delivery boundary.
//!
//! Sources are fire-and-forget: the experience hands them [`FrameRequest`]s
//! and drains completions with `poll` on each `advance`. Completion order is
//! not guaranteed; the store tolerates out-of-order and stale deliveries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tracing::warn;

use crate::assets::paths;
use crate::foundation::core::{FrameImage, SeqKey};
use crate::foundation::error::{LumicardError, LumicardResult};

#[derive(Clone, Debug)]
pub struct FrameRequest {
    pub key: SeqKey,
    /// 1-based frame number within the sequence.
    pub frame: u32,
    /// Store generation the request was issued under; echoed back in the
    /// delivery so stale completions can be dropped.
    pub generation: u64,
}

#[derive(Debug)]
pub struct FrameDelivery {
    pub key: SeqKey,
    pub frame: u32,
    pub generation: u64,
    pub image: Option<FrameImage>,
}

pub trait FrameSource {
    fn request(&mut self, req: FrameRequest);
    fn poll(&mut self) -> Vec<FrameDelivery>;
}

/// Decode image bytes into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> LumicardResult<FrameImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(FrameImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Disk-backed source resolving templated paths under a root directory.
///
/// Decoding happens in `poll`, keeping the request side non-blocking for the
/// caller's cooperative loop. Missing or corrupt files deliver failures.
pub struct DiskFrameSource {
    root: PathBuf,
    pending: Vec<FrameRequest>,
}

impl DiskFrameSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pending: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, req: &FrameRequest) -> LumicardResult<FrameImage> {
        let rel = paths::normalize_rel_path(&paths::seq_frame_path(&req.key, req.frame))?;
        let path = self.root.join(Path::new(&rel));
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read frame bytes from '{}'", path.display()))
            .map_err(LumicardError::from)?;
        decode_image(&bytes)
    }
}

impl FrameSource for DiskFrameSource {
    fn request(&mut self, req: FrameRequest) {
        self.pending.push(req);
    }

    fn poll(&mut self) -> Vec<FrameDelivery> {
        let pending: Vec<FrameRequest> = self.pending.drain(..).collect();
        let mut deliveries = Vec::with_capacity(pending.len());
        for req in pending {
            let image = match self.load(&req) {
                Ok(img) => Some(img),
                Err(err) => {
                    warn!(key = %req.key, frame = req.frame, %err, "frame load failed");
                    None
                }
            };
            deliveries.push(FrameDelivery {
                key: req.key,
                frame: req.frame,
                generation: req.generation,
                image,
            });
        }
        deliveries
    }
}

/// In-memory source for tests and the demo binary: frames are synthesized
/// solid fills, with optional per-frame failure injection and manual hold of
/// deliveries to exercise out-of-order completion.
#[derive(Default)]
pub struct MemoryFrameSource {
    pending: Vec<FrameRequest>,
    held: bool,
    fail_frames: Vec<(SeqKey, u32)>,
}

impl MemoryFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// While held, `poll` returns nothing; requests queue up until released.
    pub fn hold(&mut self) {
        self.held = true;
    }

    pub fn release(&mut self) {
        self.held = false;
    }

    pub fn fail_frame(&mut self, key: SeqKey, frame: u32) {
        self.fail_frames.push((key, frame));
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Deliver only the pending request at `index`, out of order.
    pub fn deliver_one(&mut self, index: usize) -> Option<FrameDelivery> {
        if index >= self.pending.len() {
            return None;
        }
        let req = self.pending.remove(index);
        Some(self.synthesize(req))
    }

    fn synthesize(&self, req: FrameRequest) -> FrameDelivery {
        let failed = self
            .fail_frames
            .iter()
            .any(|(k, f)| *k == req.key && *f == req.frame);
        let image = if failed {
            None
        } else {
            // Frame number encoded in the red channel keeps frames tellable
            // apart in snapshot assertions.
            let shade = (req.frame % 256) as u8;
            FrameImage::solid(8, 8, [shade, 128, 64, 255]).ok()
        };
        FrameDelivery {
            key: req.key,
            frame: req.frame,
            generation: req.generation,
            image,
        }
    }
}

impl FrameSource for MemoryFrameSource {
    fn request(&mut self, req: FrameRequest) {
        self.pending.push(req);
    }

    fn poll(&mut self) -> Vec<FrameDelivery> {
        if self.held {
            return Vec::new();
        }
        let pending: Vec<FrameRequest> = self.pending.drain(..).collect();
        pending.into_iter().map(|req| self.synthesize(req)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "lumicard_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    fn png_bytes(px: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(1, 1, px.to_vec()).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_premultiplies() {
        let prepared = decode_image(&png_bytes([100, 50, 200, 128])).unwrap();
        assert_eq!(prepared.width, 1);
        assert_eq!(
            prepared.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn disk_source_delivers_success_and_failure() {
        let tmp = temp_dir("disk_source");
        let dir = tmp.join("effects/halo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("01.png"), png_bytes([10, 20, 30, 255])).unwrap();

        let mut source = DiskFrameSource::new(&tmp);
        source.request(FrameRequest {
            key: SeqKey::effect("halo"),
            frame: 1,
            generation: 7,
        });
        source.request(FrameRequest {
            key: SeqKey::effect("halo"),
            frame: 2,
            generation: 7,
        });

        let deliveries = source.poll();
        assert_eq!(deliveries.len(), 2);
        assert!(deliveries[0].image.is_some());
        assert_eq!(deliveries[0].generation, 7);
        assert!(deliveries[1].image.is_none());
        assert!(source.poll().is_empty());

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn memory_source_holds_and_releases() {
        let mut source = MemoryFrameSource::new();
        source.hold();
        source.request(FrameRequest {
            key: SeqKey::card("s", "w"),
            frame: 1,
            generation: 1,
        });
        assert!(source.poll().is_empty());

        source.release();
        assert_eq!(source.poll().len(), 1);
    }
}

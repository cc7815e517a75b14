//! Premultiplied RGBA8 pixel buffers and PNG output.

use crate::error::{SvgError, SvgResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

enum Storage<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl Storage<'_> {
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Owned(data) => data,
            Storage::Borrowed(data) => data,
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Owned(data) => data,
            Storage::Borrowed(data) => data,
        }
    }
}

/// A 2D surface of premultiplied RGBA8 pixels laid out row by row.
///
/// Each row occupies `stride` bytes, of which the first `width * 4` hold
/// pixels. A bitmap either owns its memory ([`Bitmap::new`]) or borrows
/// caller memory for its lifetime ([`Bitmap::from_data`]).
///
/// `Bitmap::default()` is the null bitmap: zero-sized with no storage.
pub struct Bitmap<'a> {
    width: u32,
    height: u32,
    stride: usize,
    storage: Storage<'a>,
}

impl Default for Bitmap<'_> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            stride: 0,
            storage: Storage::Owned(Vec::new()),
        }
    }
}

impl std::fmt::Debug for Bitmap<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field(
                "owned",
                &matches!(self.storage, Storage::Owned(_)),
            )
            .finish()
    }
}

impl Bitmap<'static> {
    /// Allocate a zero-filled (fully transparent) bitmap.
    pub fn new(width: u32, height: u32) -> SvgResult<Self> {
        if width == 0 || height == 0 {
            return Err(SvgError::InvalidDimensions { width, height });
        }

        let stride = (width as usize)
            .checked_mul(4)
            .ok_or(SvgError::OutOfMemory { width, height })?;
        let len = stride
            .checked_mul(height as usize)
            .ok_or(SvgError::OutOfMemory { width, height })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| SvgError::OutOfMemory { width, height })?;
        data.resize(len, 0);

        log::debug!(target: "render", "allocated {}x{} bitmap", width, height);
        Ok(Self {
            width,
            height,
            stride,
            storage: Storage::Owned(data),
        })
    }
}

impl<'a> Bitmap<'a> {
    /// Wrap caller-owned pixel memory.
    ///
    /// `data` must hold at least `height * stride` bytes and `stride` must be
    /// at least `width * 4`. The memory is expected to contain premultiplied
    /// RGBA8 pixels.
    pub fn from_data(data: &'a mut [u8], width: u32, height: u32, stride: usize) -> SvgResult<Self> {
        if width == 0 || height == 0 {
            return Err(SvgError::InvalidDimensions { width, height });
        }

        let min_stride = (width as usize)
            .checked_mul(4)
            .ok_or(SvgError::OutOfMemory { width, height })?;
        if stride < min_stride {
            return Err(SvgError::InvalidStride { stride, width });
        }

        let required = stride
            .checked_mul(height as usize)
            .ok_or(SvgError::OutOfMemory { width, height })?;
        if data.len() < required {
            return Err(SvgError::BufferTooSmall {
                required,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            stride,
            storage: Storage::Borrowed(&mut data[..required]),
        })
    }

    /// True for the null bitmap.
    pub fn is_null(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The raw `height * stride` premultiplied bytes.
    pub fn data(&self) -> &[u8] {
        self.storage.bytes()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.storage.bytes_mut()
    }

    /// Fill every pixel with a straight `0xRRGGBBAA` color.
    pub fn clear(&mut self, color: u32) {
        let pixel = premultiply(color);
        let row_len = self.width as usize * 4;
        let stride = self.stride;
        if stride == 0 {
            return;
        }
        for row in self.storage.bytes_mut().chunks_mut(stride) {
            for px in row[..row_len].chunks_exact_mut(4) {
                px.copy_from_slice(&pixel);
            }
        }
    }

    /// Straight (un-premultiplied) `0xRRGGBBAA` value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride + x as usize * 4;
        let px = self.data().get(idx..idx + 4)?;
        let [r, g, b, a] = demultiply([px[0], px[1], px[2], px[3]]);
        Some(u32::from_be_bytes([r, g, b, a]))
    }

    /// Run `draw` over a contiguous `width * 4`-stride view of the pixels.
    ///
    /// Padded strides go through a scratch copy that is written back row by
    /// row afterwards.
    pub(crate) fn with_packed_pixels<R>(&mut self, draw: impl FnOnce(&mut [u8]) -> R) -> R {
        let row_len = self.width as usize * 4;
        let height = self.height as usize;
        let stride = self.stride;
        if stride == row_len {
            return draw(self.storage.bytes_mut());
        }

        let mut scratch = Vec::with_capacity(row_len * height);
        for row in self.storage.bytes().chunks(stride).take(height) {
            scratch.extend_from_slice(&row[..row_len]);
        }
        let result = draw(&mut scratch);
        for (dst, src) in self
            .storage
            .bytes_mut()
            .chunks_mut(stride)
            .zip(scratch.chunks(row_len))
        {
            dst[..row_len].copy_from_slice(src);
        }
        result
    }

    /// Straight-alpha RGBA rows, packed without padding.
    fn demultiplied_rows(&self) -> Vec<u8> {
        let row_len = self.width as usize * 4;
        let mut out = Vec::with_capacity(row_len * self.height as usize);
        for row in self.data().chunks(self.stride).take(self.height as usize) {
            for px in row[..row_len].chunks_exact(4) {
                out.extend_from_slice(&demultiply([px[0], px[1], px[2], px[3]]));
            }
        }
        out
    }

    /// Encode the bitmap as PNG into `writer`.
    pub fn write_png<W: Write>(&self, writer: W) -> SvgResult<()> {
        if self.is_null() {
            return Err(SvgError::NullBitmap);
        }

        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.demultiplied_rows())?;
        writer.finish()?;
        Ok(())
    }

    /// Encode the bitmap as an in-memory PNG file.
    pub fn encode_png(&self) -> SvgResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_png(&mut buf)?;
        Ok(buf)
    }

    /// Encode the bitmap as PNG and write it to `path`.
    pub fn write_to_png(&self, path: impl AsRef<Path>) -> SvgResult<()> {
        if self.is_null() {
            return Err(SvgError::NullBitmap);
        }
        let file = File::create(path.as_ref())?;
        let mut out = BufWriter::new(file);
        self.write_png(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Encode the bitmap as PNG, pushing each encoded chunk to `sink` in order.
    ///
    /// All chunks are delivered before this call returns.
    pub fn write_to_png_stream<F: FnMut(&[u8])>(&self, sink: F) -> SvgResult<()> {
        self.write_png(ChunkSink(sink))
    }
}

struct ChunkSink<F>(F);

impl<F: FnMut(&[u8])> Write for ChunkSink<F> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        (self.0)(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn premultiply(color: u32) -> [u8; 4] {
    let [r, g, b, a] = color.to_be_bytes();
    let scale = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
    [scale(r), scale(g), scale(b), a]
}

fn demultiply(px: [u8; 4]) -> [u8; 4] {
    let a = px[3];
    match a {
        0 => [0, 0, 0, 0],
        255 => px,
        _ => {
            let scale = |c: u8| ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
            [scale(px[0]), scale(px[1]), scale(px[2]), a]
        }
    }
}

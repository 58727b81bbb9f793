//! Buffered big-endian byte reader.
//!
//! Strictly forward streaming: bytes are pulled from the source into a fixed
//! buffer on demand and handed out as borrowed slices. There is no seeking.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};

use super::tags::READ_BUFFER_SIZE;
use crate::util::{Error, Mat4, Quat, Result, Vec2, Vec3, Vec4};

/// Sequential reader over any byte source.
///
/// Once a read fails the reader is poisoned: [`good`](Self::good) turns false
/// and every later read fails too, so a half-decoded record can never be
/// mistaken for a complete one.
pub struct ByteReader<R> {
    source: R,
    buf: Vec<u8>,
    /// Next unread byte in `buf`
    start: usize,
    /// One past the last valid byte in `buf`
    end: usize,
    /// Total bytes handed out so far
    consumed: u64,
    source_done: bool,
    failed: bool,
}

impl ByteReader<File> {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl<'a> ByteReader<&'a [u8]> {
    /// Read from an in-memory byte slice.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<R: Read> ByteReader<R> {
    /// Wrap a byte source.
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, READ_BUFFER_SIZE)
    }

    /// Wrap a byte source with a custom buffer size.
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self {
            source,
            buf: vec![0; capacity.max(1)],
            start: 0,
            end: 0,
            consumed: 0,
            source_done: false,
            failed: false,
        }
    }

    /// Whether the stream is still usable.
    #[inline]
    pub fn good(&self) -> bool {
        !self.failed
    }

    /// Whether both the source and the buffer are drained.
    pub fn eof(&mut self) -> bool {
        if self.start == self.end && !self.source_done && !self.failed && self.fill(1).is_err() {
            self.failed = true;
        }
        (self.source_done || self.failed) && self.start == self.end
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.consumed
    }

    /// Number of buffered bytes not yet consumed.
    #[inline]
    fn available(&self) -> usize {
        self.end - self.start
    }

    /// Pull bytes from the source until `needed` bytes are buffered or the
    /// source runs dry.
    fn fill(&mut self, needed: usize) -> Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if needed > self.buf.len() {
            self.buf.resize(needed, 0);
        }

        while self.end < needed && !self.source_done {
            match self.source.read(&mut self.buf[self.end..]) {
                Ok(0) => self.source_done = true,
                Ok(n) => self.end += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    /// Return the next `n` bytes, refilling from the source on demand.
    pub fn read(&mut self, n: usize) -> Result<&[u8]> {
        if self.failed {
            return Err(Error::UnexpectedEof { offset: self.consumed, needed: n });
        }

        if self.available() < n {
            if let Err(e) = self.fill(n) {
                self.failed = true;
                return Err(e);
            }
            if self.available() < n {
                self.failed = true;
                return Err(Error::UnexpectedEof {
                    offset: self.consumed + self.available() as u64,
                    needed: n - self.available(),
                });
            }
        }

        let at = self.start;
        self.start += n;
        self.consumed += n as u64;
        Ok(&self.buf[at..at + n])
    }

    /// Read an unsigned byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read(1)?[0])
    }

    /// Read a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.read(2)?))
    }

    /// Read a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.read(4)?))
    }

    /// Read a big-endian IEEE-754 float.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.read(4)?))
    }

    /// Read two big-endian floats.
    pub fn read_vec2(&mut self) -> Result<Vec2> {
        let mut v = [0f32; 2];
        BigEndian::read_f32_into(self.read(8)?, &mut v);
        Ok(Vec2::from_array(v))
    }

    /// Read three big-endian floats.
    pub fn read_vec3(&mut self) -> Result<Vec3> {
        let mut v = [0f32; 3];
        BigEndian::read_f32_into(self.read(12)?, &mut v);
        Ok(Vec3::from_array(v))
    }

    /// Read four big-endian floats.
    pub fn read_vec4(&mut self) -> Result<Vec4> {
        let mut v = [0f32; 4];
        BigEndian::read_f32_into(self.read(16)?, &mut v);
        Ok(Vec4::from_array(v))
    }

    /// Read a quaternion stored as `w, x, y, z`.
    pub fn read_quat(&mut self) -> Result<Quat> {
        let [w, x, y, z] = self.read_vec4()?.to_array();
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    /// Read sixteen floats in column-major order.
    pub fn read_mat4(&mut self) -> Result<Mat4> {
        let mut m = [0f32; 16];
        BigEndian::read_f32_into(self.read(64)?, &mut m);
        Ok(Mat4::from_cols_array(&m))
    }
}

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::error;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};

#[derive(Debug)]
pub enum CursorError {
    Truncated {
        offset: u64,
        requested: u64,
        available: u64,
    },
    UnsupportedWidth {
        width: usize,
    },
    Overflow {
        value: u64,
        width: usize,
    },
    Io {
        error: io::Error,
    },
}

impl CursorError {
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

impl error::Error for CursorError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io { error } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Truncated {
                offset,
                requested,
                available,
            } => {
                write!(
                    f,
                    "truncated input at offset {}: requested {} bytes, {} available",
                    offset, requested, available
                )
            }
            Self::UnsupportedWidth { width } => {
                write!(f, "unsupported field width {} (expected 1 to 8 bytes)", width)
            }
            Self::Overflow { value, width } => {
                write!(f, "value {} does not fit in {} bytes", value, width)
            }
            Self::Io { error } => write!(f, "io error {}", error),
        }
    }
}

impl From<io::Error> for CursorError {
    fn from(error: io::Error) -> Self {
        CursorError::Io { error }
    }
}

/// Big endian field reader and writer over a byte source.
///
/// Every box and marker segment field in a JPEG 2000 file is stored big
/// endian. Reads that run past the end of the source fail with
/// [`CursorError::Truncated`], never with a partial value.
#[derive(Debug)]
pub struct BinaryCursor<S> {
    inner: S,
}

impl<S> BinaryCursor<S> {
    pub fn new(inner: S) -> BinaryCursor<S> {
        BinaryCursor { inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

/// The `start..end` range of a source.
///
/// Positions stay those of the source. Reads stop at `end` and
/// `SeekFrom::End` is relative to it, so a [`BinaryCursor`] over a window
/// reports truncation at the end of the range.
#[derive(Debug)]
pub struct Window<R> {
    inner: R,
    start: u64,
    end: u64,
}

impl<R: Seek> Window<R> {
    pub fn new(mut inner: R, start: u64, end: u64) -> io::Result<Window<R>> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Window { inner, start, end })
    }
}

impl<R: Read + Seek> Read for Window<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let position = self.inner.stream_position()?;
        let remaining = self.end.saturating_sub(position);
        let n = (buf.len() as u64).min(remaining) as usize;
        self.inner.read(&mut buf[..n])
    }
}

impl<R: Seek> Seek for Window<R> {
    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        let target = match position {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.end.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.inner.stream_position()?.checked_add_signed(delta),
        };
        match target {
            Some(target) if target >= self.start => self.inner.seek(SeekFrom::Start(target)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the window",
            )),
        }
    }
}

fn check_width(width: usize) -> Result<(), CursorError> {
    if width == 0 || width > 8 {
        return Err(CursorError::UnsupportedWidth { width });
    }
    Ok(())
}

impl<S: Seek> BinaryCursor<S> {
    pub fn tell(&mut self) -> Result<u64, CursorError> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, offset: u64) -> Result<(), CursorError> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Total length of the underlying source, leaving the position unchanged.
    pub fn length(&mut self) -> Result<u64, CursorError> {
        let position = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(end)
    }

    fn truncated(&mut self, offset: u64, requested: u64) -> CursorError {
        let available = match self.inner.seek(SeekFrom::End(0)) {
            Ok(end) => end.saturating_sub(offset),
            Err(error) => return CursorError::Io { error },
        };
        debug!(
            "read of {} bytes at offset {} truncated, {} available",
            requested, offset, available
        );
        CursorError::Truncated {
            offset,
            requested,
            available,
        }
    }

    fn map_read<T>(
        &mut self,
        offset: u64,
        requested: u64,
        result: io::Result<T>,
    ) -> Result<T, CursorError> {
        match result {
            Ok(value) => Ok(value),
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                Err(self.truncated(offset, requested))
            }
            Err(error) => Err(error.into()),
        }
    }
}

impl<S: Read + Seek> BinaryCursor<S> {
    /// Read an unsigned big endian integer of `width` bytes (1 to 8).
    pub fn read_uint(&mut self, width: usize) -> Result<u64, CursorError> {
        check_width(width)?;
        let offset = self.tell()?;
        let result = self.inner.read_uint::<BigEndian>(width);
        self.map_read(offset, width as u64, result)
    }

    /// Read a two's complement big endian integer of `width` bytes (1 to 8).
    pub fn read_int(&mut self, width: usize) -> Result<i64, CursorError> {
        check_width(width)?;
        let offset = self.tell()?;
        let result = self.inner.read_int::<BigEndian>(width);
        self.map_read(offset, width as u64, result)
    }

    /// Read a fixed width field, sign extended when `signed` is set.
    pub fn read_fixed(&mut self, width: usize, signed: bool) -> Result<i128, CursorError> {
        if signed {
            Ok(self.read_int(width)? as i128)
        } else {
            Ok(self.read_uint(width)? as i128)
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        let offset = self.tell()?;
        let result = self.inner.read_u8();
        self.map_read(offset, 1, result)
    }

    pub fn read_i8(&mut self) -> Result<i8, CursorError> {
        let offset = self.tell()?;
        let result = self.inner.read_i8();
        self.map_read(offset, 1, result)
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        let offset = self.tell()?;
        let result = self.inner.read_u16::<BigEndian>();
        self.map_read(offset, 2, result)
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        let offset = self.tell()?;
        let result = self.inner.read_u32::<BigEndian>();
        self.map_read(offset, 4, result)
    }

    pub fn read_i32(&mut self) -> Result<i32, CursorError> {
        let offset = self.tell()?;
        let result = self.inner.read_i32::<BigEndian>();
        self.map_read(offset, 4, result)
    }

    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        let offset = self.tell()?;
        let result = self.inner.read_u64::<BigEndian>();
        self.map_read(offset, 8, result)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let offset = self.tell()?;
        let mut buffer = [0u8; N];
        let result = self.inner.read_exact(&mut buffer);
        self.map_read(offset, N as u64, result)?;
        Ok(buffer)
    }

    /// Read exactly `n` bytes.
    ///
    /// Only the bytes actually present are ever allocated, so a corrupt
    /// length field cannot trigger a huge allocation.
    pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>, CursorError> {
        let offset = self.tell()?;
        let mut buffer = Vec::new();
        self.inner.by_ref().take(n).read_to_end(&mut buffer)?;
        if (buffer.len() as u64) < n {
            return Err(self.truncated(offset, n));
        }
        Ok(buffer)
    }

    /// Move forward `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> Result<(), CursorError> {
        let offset = self.tell()?;
        let target = offset.checked_add(n).ok_or(CursorError::Truncated {
            offset,
            requested: n,
            available: 0,
        })?;
        if target > self.length()? {
            return Err(self.truncated(offset, n));
        }
        self.seek(target)
    }
}

impl<S: Write> BinaryCursor<S> {
    /// Write `value` as an unsigned big endian integer of `width` bytes.
    pub fn write_uint(&mut self, value: u64, width: usize) -> Result<(), CursorError> {
        check_width(width)?;
        if width < 8 && value >> (width * 8) != 0 {
            return Err(CursorError::Overflow { value, width });
        }
        self.inner.write_uint::<BigEndian>(value, width)?;
        Ok(())
    }

    pub fn write_fixed(&mut self, value: u64, width: usize) -> Result<(), CursorError> {
        self.write_uint(value, width)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), CursorError> {
        self.inner.write_u8(value)?;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), CursorError> {
        self.inner.write_i8(value)?;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), CursorError> {
        self.inner.write_u16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), CursorError> {
        self.inner.write_u32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), CursorError> {
        self.inner.write_u64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), CursorError> {
        self.inner.write_all(data)?;
        Ok(())
    }
}

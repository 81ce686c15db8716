use std::io::{self, Seek, SeekFrom, Write};

pub struct LittleEndianWriter<W> {
    inner: W,
}

impl<W: Write + Seek> LittleEndianWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, v: u8) -> io::Result<()> {
        self.inner.write_all(&[v])
    }

    pub fn write_bool(&mut self, v: bool) -> io::Result<()> {
        self.write_u8(u8::from(v))
    }

    pub fn write_i32(&mut self, v: i32) -> io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_i64(&mut self, v: i64) -> io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_f32(&mut self, v: f32) -> io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_f64(&mut self, v: f64) -> io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_7bit_int(&mut self, mut v: u32) -> io::Result<()> {
        while v >= 0x80 {
            self.write_u8((v as u8) | 0x80)?;
            v >>= 7;
        }
        self.write_u8(v as u8)
    }

    pub fn write_string(&mut self, s: &str) -> io::Result<()> {
        let len = u32::try_from(s.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "string too long to encode")
        })?;
        self.write_7bit_int(len)?;
        self.inner.write_all(s.as_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    pub fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Encoded width of a length-prefixed string.
pub fn encoded_string_len(s: &str) -> usize {
    let mut len = s.len();
    let mut prefix = 1;
    while len >= 0x80 {
        len >>= 7;
        prefix += 1;
    }
    prefix + s.len()
}

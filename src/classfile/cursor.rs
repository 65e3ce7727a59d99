use byteorder::{BigEndian, ByteOrder};

#[derive(Debug, PartialEq)]
pub enum CursorError {
    UnexpectedEof { wanted: usize, remaining: usize },
}

/// Sequential big-endian reader positioned inside serialized class metadata.
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        if self.remaining() < n {
            return Err(CursorError::UnexpectedEof {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, CursorError> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    /// Skips up to `n` bytes and reports how many were actually skipped.
    /// Never fails; the caller compares the count against a declared length.
    pub fn skip(&mut self, n: usize) -> usize {
        let skipped = n.min(self.remaining());
        self.pos += skipped;
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let mut cursor = Cursor::new(&[0x00, 0x2A, 0xFF, 0xFF, 0xFF, 0xF9, 0x07]);
        assert_eq!(cursor.read_u16().unwrap(), 42);
        assert_eq!(cursor.read_i32().unwrap(), -7);
        assert_eq!(cursor.read_u8().unwrap(), 7);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn read_past_end_is_eof() {
        let mut cursor = Cursor::new(&[0x01]);
        assert_eq!(
            cursor.read_u16(),
            Err(CursorError::UnexpectedEof {
                wanted: 2,
                remaining: 1
            })
        );
    }

    #[test]
    fn skip_reports_exact_count() {
        let mut cursor = Cursor::new(&[0; 5]);
        assert_eq!(cursor.skip(3), 3);
        assert_eq!(cursor.skip(7), 2);
        assert_eq!(cursor.skip(1), 0);
    }
}

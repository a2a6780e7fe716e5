//! Patch-back chunk writer
//!
//! Container headers carry fields (chunk offsets, chunk sizes, total file
//! size) whose values are only known after the chunk bodies have been
//! written. The writer appends sequentially and lets an encoder reserve a
//! zeroed field now and patch it later, once its value is known. Patching
//! is the only random-access write in the system; everything else is an
//! append.
//!
//! Every reservation must be patched before [`ChunkWriter::finish`] - an
//! unpatched field is a programming defect in the encoder, not a runtime
//! condition, so `finish` asserts in debug builds rather than returning an
//! error.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Byte order for multi-byte fields, chosen once per build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// A reserved 32-bit field awaiting its value
///
/// Consumed by [`ChunkWriter::patch_u32`]; not clonable, so a field can
/// only be patched once.
#[must_use = "reserved fields must be patched before finish()"]
#[derive(Debug)]
pub struct Reservation {
    offset: u64,
}

impl Reservation {
    /// Absolute file offset of the reserved field
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Sequential writer with reserve/patch/pad support over a seekable stream
#[derive(Debug)]
pub struct ChunkWriter<W: Write + Seek> {
    out: W,
    endian: Endian,
    position: u64,
    outstanding: usize,
}

impl<W: Write + Seek> ChunkWriter<W> {
    /// Wrap an output stream positioned at its start.
    pub fn new(out: W, endian: Endian) -> Self {
        ChunkWriter {
            out,
            endian,
            position: 0,
            outstanding: 0,
        }
    }

    /// Current append position
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> io::Result<()> {
        match self.endian {
            Endian::Big => self.write_bytes(&value.to_be_bytes()),
            Endian::Little => self.write_bytes(&value.to_le_bytes()),
        }
    }

    pub fn write_u32(&mut self, value: u32) -> io::Result<()> {
        match self.endian {
            Endian::Big => self.write_bytes(&value.to_be_bytes()),
            Endian::Little => self.write_bytes(&value.to_le_bytes()),
        }
    }

    pub fn write_i16(&mut self, value: i16) -> io::Result<()> {
        self.write_u16(value as u16)
    }

    /// Big-endian u16 regardless of the build's byte order (the compact
    /// format mixes one big-endian version word into its little-endian
    /// header)
    pub fn write_u16_be(&mut self, value: u16) -> io::Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Little-endian u32 regardless of the build's byte order (the compact
    /// format's track-pair count is always little-endian)
    pub fn write_u32_le(&mut self, value: u32) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Reserve a 32-bit field at the current position, writing zero now.
    pub fn reserve_u32(&mut self) -> io::Result<Reservation> {
        let offset = self.position;
        self.write_u32(0)?;
        self.outstanding += 1;
        Ok(Reservation { offset })
    }

    /// Fill a previously reserved field without disturbing the append
    /// position.
    pub fn patch_u32(&mut self, reservation: Reservation, value: u32) -> io::Result<()> {
        self.out.seek(SeekFrom::Start(reservation.offset))?;
        match self.endian {
            Endian::Big => self.out.write_all(&value.to_be_bytes())?,
            Endian::Little => self.out.write_all(&value.to_le_bytes())?,
        }
        self.out.seek(SeekFrom::Start(self.position))?;
        self.outstanding -= 1;
        Ok(())
    }

    /// Write `count` zero bytes.
    pub fn write_zeros(&mut self, count: u64) -> io::Result<()> {
        const ZEROS: [u8; 0x400] = [0; 0x400];
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(ZEROS.len() as u64) as usize;
            self.write_bytes(&ZEROS[..n])?;
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Zero-fill until the position is a multiple of `align`, returning the
    /// new position.
    pub fn pad_to(&mut self, align: u64) -> io::Result<u64> {
        let target = self.position.div_ceil(align) * align;
        self.write_zeros(target - self.position)?;
        Ok(self.position)
    }

    /// Copy exactly `len` bytes from `src` starting at `src_offset`.
    ///
    /// A short read on the source is an error (the build must not emit a
    /// container describing more data than it holds).
    pub fn copy_from<R: Read + Seek>(
        &mut self,
        src: &mut R,
        src_offset: u64,
        len: u64,
    ) -> io::Result<()> {
        src.seek(SeekFrom::Start(src_offset))?;
        let copied = io::copy(&mut src.take(len), &mut self.out)?;
        if copied != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input ended after {} of {} bytes", copied, len),
            ));
        }
        self.position += len;
        Ok(())
    }

    /// Flush and return the final length. Asserts (debug builds) that no
    /// reserved field was left unpatched.
    pub fn finish(mut self) -> io::Result<u64> {
        debug_assert_eq!(
            self.outstanding, 0,
            "{} reserved field(s) never patched",
            self.outstanding
        );
        self.out.flush()?;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_endian_writes() {
        let mut w = ChunkWriter::new(Cursor::new(Vec::new()), Endian::Big);
        w.write_u16(0x1234).unwrap();
        w.write_u32(0xdeadbeef).unwrap();
        w.write_u16_be(0xfeff).unwrap();
        w.write_u32_le(1).unwrap();
        assert_eq!(w.position(), 12);
        assert_eq!(
            w.into_bytes(),
            [0x12, 0x34, 0xde, 0xad, 0xbe, 0xef, 0xfe, 0xff, 1, 0, 0, 0]
        );

        let mut w = ChunkWriter::new(Cursor::new(Vec::new()), Endian::Little);
        w.write_u16(0x1234).unwrap();
        w.write_u16_be(0xfeff).unwrap();
        assert_eq!(w.into_bytes(), [0x34, 0x12, 0xfe, 0xff]);
    }

    #[test]
    fn test_finish_reports_length() {
        let mut w = ChunkWriter::new(Cursor::new(Vec::new()), Endian::Big);
        w.write_bytes(b"DATA").unwrap();
        let size = w.reserve_u32().unwrap();
        w.patch_u32(size, 8).unwrap();
        assert_eq!(w.finish().unwrap(), 8);
    }

    #[test]
    fn test_reserve_and_patch() {
        let mut w = ChunkWriter::new(Cursor::new(Vec::new()), Endian::Big);
        w.write_bytes(b"SIG!").unwrap();
        let size = w.reserve_u32().unwrap();
        w.write_bytes(&[0xaa; 8]).unwrap();
        let end = w.position() as u32;
        w.patch_u32(size, end).unwrap();

        // Append position is undisturbed by the patch
        w.write_u8(0xbb).unwrap();
        assert_eq!(w.position(), 17);

        let bytes = w.into_bytes();
        assert_eq!(&bytes[4..8], &16u32.to_be_bytes());
        assert_eq!(bytes[16], 0xbb);
    }

    #[test]
    fn test_pad_to() {
        let mut w = ChunkWriter::new(Cursor::new(Vec::new()), Endian::Big);
        w.write_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(w.pad_to(0x20).unwrap(), 0x20);
        // Already aligned: no-op
        assert_eq!(w.pad_to(0x20).unwrap(), 0x20);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 0x20);
        assert!(bytes[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_copy_from_short_source() {
        let mut w = ChunkWriter::new(Cursor::new(Vec::new()), Endian::Big);
        let mut src = Cursor::new(vec![0u8; 10]);
        let err = w.copy_from(&mut src, 4, 10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_copy_from() {
        let mut w = ChunkWriter::new(Cursor::new(Vec::new()), Endian::Big);
        let mut src = Cursor::new((0u8..32).collect::<Vec<_>>());
        w.copy_from(&mut src, 8, 4).unwrap();
        assert_eq!(w.into_bytes(), [8, 9, 10, 11]);
    }

    impl ChunkWriter<Cursor<Vec<u8>>> {
        fn into_bytes(self) -> Vec<u8> {
            self.out.into_inner()
        }
    }
}

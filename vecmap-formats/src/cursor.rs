use bytes::Buf;

use crate::error::VecmapFormatsError;

/// Byte order of multi-byte values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ByteOrder {
    Little,
    Big,
}

/// Wrapper around [`Buf`] that returns [`VecmapFormatsError::UnexpectedEof`] instead of panicking when the data
/// is shorter than expected.
pub(crate) struct ByteCursor<B> {
    inner: B,
    position: usize,
}

impl<B: Buf> ByteCursor<B> {
    pub(crate) fn new(inner: B) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    fn ensure(&mut self, count: usize) -> Result<(), VecmapFormatsError> {
        if self.inner.remaining() < count {
            return Err(VecmapFormatsError::UnexpectedEof);
        }

        self.position += count;
        Ok(())
    }

    pub(crate) fn skip(&mut self, count: usize) -> Result<(), VecmapFormatsError> {
        self.ensure(count)?;
        self.inner.advance(count);
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, VecmapFormatsError> {
        self.ensure(1)?;
        Ok(self.inner.get_u8())
    }

    pub(crate) fn u16_le(&mut self) -> Result<u16, VecmapFormatsError> {
        self.ensure(2)?;
        Ok(self.inner.get_u16_le())
    }

    pub(crate) fn u32_be(&mut self) -> Result<u32, VecmapFormatsError> {
        self.ensure(4)?;
        Ok(self.inner.get_u32())
    }

    pub(crate) fn u32_le(&mut self) -> Result<u32, VecmapFormatsError> {
        self.ensure(4)?;
        Ok(self.inner.get_u32_le())
    }

    pub(crate) fn u32(&mut self, order: ByteOrder) -> Result<u32, VecmapFormatsError> {
        match order {
            ByteOrder::Little => self.u32_le(),
            ByteOrder::Big => self.u32_be(),
        }
    }

    pub(crate) fn f64_le(&mut self) -> Result<f64, VecmapFormatsError> {
        self.ensure(8)?;
        Ok(self.inner.get_f64_le())
    }

    pub(crate) fn f64(&mut self, order: ByteOrder) -> Result<f64, VecmapFormatsError> {
        match order {
            ByteOrder::Little => self.f64_le(),
            ByteOrder::Big => {
                self.ensure(8)?;
                Ok(self.inner.get_f64())
            }
        }
    }

    pub(crate) fn bytes(&mut self, count: usize) -> Result<Vec<u8>, VecmapFormatsError> {
        self.ensure(count)?;
        let mut result = vec![0; count];
        self.inner.copy_to_slice(&mut result);
        Ok(result)
    }

    /// Checks that a declared number of items of `item_size` bytes can be present in the remaining data. Protects
    /// against huge allocations caused by corrupted counts.
    pub(crate) fn check_count(&self, count: usize, item_size: usize) -> Result<(), VecmapFormatsError> {
        match count.checked_mul(item_size) {
            Some(size) if size <= self.inner.remaining() => Ok(()),
            _ => Err(VecmapFormatsError::UnexpectedEof),
        }
    }
}

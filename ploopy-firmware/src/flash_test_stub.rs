use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

extern crate std;

#[derive(Debug)]
pub enum FlashStubError {
    OutOfBounds,
    Injected,
}

/// What the firmware asked the flash to do; handed to [NorFlashStub::observer] before it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum FlashOp {
    Erase(u32, u32),
    Write(u32, std::vec::Vec<u8>),
}

/// RAM backed flash with a 64 byte erase block. Writes can only clear bits, like real NOR flash.
pub struct NorFlashStub<'f, const FLASH_SIZE: usize> {
    pub buf: [u8; FLASH_SIZE],
    #[allow(clippy::type_complexity)]
    pub observer: Option<&'f dyn Fn(FlashOp) -> Result<(), FlashStubError>>,
}
impl NorFlashError for FlashStubError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            FlashStubError::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            FlashStubError::Injected => NorFlashErrorKind::Other,
        }
    }
}
impl<const FLASH_SIZE: usize> ErrorType for NorFlashStub<'_, FLASH_SIZE> {
    type Error = FlashStubError;
}
impl<const FLASH_SIZE: usize> NorFlashStub<'_, FLASH_SIZE> {
    fn range(offset: u32, len: usize) -> Result<core::ops::Range<usize>, FlashStubError> {
        let start = offset as usize;
        let end = start + len;
        if end > FLASH_SIZE {
            Err(FlashStubError::OutOfBounds)
        } else {
            Ok(start..end)
        }
    }
}
impl<const FLASH_SIZE: usize> ReadNorFlash for NorFlashStub<'_, FLASH_SIZE> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.buf[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}
impl<const FLASH_SIZE: usize> NorFlash for NorFlashStub<'_, FLASH_SIZE> {
    const WRITE_SIZE: usize = 1;

    const ERASE_SIZE: usize = 64;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if let Some(observer) = self.observer {
            observer(FlashOp::Erase(from, to))?;
        }
        let range = Self::range(from, to.saturating_sub(from) as usize)?;
        self.buf[range].fill(0xff);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if let Some(observer) = self.observer {
            observer(FlashOp::Write(offset, bytes.into()))?;
        }
        let range = Self::range(offset, bytes.len())?;
        for (t, f) in self.buf[range].iter_mut().zip(bytes.iter()) {
            *t &= *f;
        }
        Ok(())
    }
}
impl<const FLASH_SIZE: usize> Default for NorFlashStub<'_, FLASH_SIZE> {
    fn default() -> Self {
        Self {
            buf: [0xff; FLASH_SIZE],
            observer: None,
        }
    }
}

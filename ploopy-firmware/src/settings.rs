//! Persist the user's settings across power cycles.
//!
//! Settings are appended as fixed size records into a flash region. On start up the region is
//! scanned and the last valid record wins. Once the region is full it is erased and writing starts
//! again from the beginning.

use embedded_storage::nor_flash::{self, NorFlash};

const MAGIC: [u8; 2] = *b"PT";
const VERSION: u8 = 1;
const TERMINATOR: u8 = 0x5a;
const ERASED: u8 = 0xff;

pub const RECORD_LEN: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub dpi_index: u8,
}

impl Settings {
    fn encode(&self) -> [u8; RECORD_LEN as usize] {
        let mut rec = [
            MAGIC[0],
            MAGIC[1],
            VERSION,
            self.dpi_index,
            0,
            0,
            0,
            TERMINATOR,
        ];
        rec[6] = checksum(&rec[..6]);
        rec
    }

    fn decode(rec: &[u8; RECORD_LEN as usize]) -> Option<Self> {
        if rec[..2] != MAGIC
            || rec[2] != VERSION
            || rec[7] != TERMINATOR
            || rec[6] != checksum(&rec[..6])
        {
            return None;
        }
        Some(Self { dpi_index: rec[3] })
    }
}

fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0xa5, |c, b| c.rotate_left(1) ^ b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    NotAligned,
    OutOfBounds,
    Unknown,
}

fn map_flash_error(err: impl nor_flash::NorFlashError) -> SettingsError {
    match err.kind() {
        nor_flash::NorFlashErrorKind::NotAligned => SettingsError::NotAligned,
        nor_flash::NorFlashErrorKind::OutOfBounds => SettingsError::OutOfBounds,
        _ => SettingsError::Unknown,
    }
}

const fn assert_store_params<const BASE: u32, const SIZE: u32>(
    erase_size: u32,
    write_size: u32,
) -> bool {
    assert!(erase_size > 0);
    assert!(BASE % erase_size == 0);
    assert!(SIZE >= erase_size);
    assert!(SIZE % erase_size == 0);
    assert!(write_size > 0 && write_size <= RECORD_LEN);
    assert!(RECORD_LEN % write_size == 0);
    true
}

/// Settings records in the flash region `BASE..BASE + SIZE`.
pub struct SettingsStore<'f, F: NorFlash, const BASE: u32, const SIZE: u32> {
    flash: &'f mut F,
    /// Offset of the first erased record slot; `SIZE` when full.
    next: u32,
    current: Option<Settings>,
}

impl<'f, F: NorFlash, const BASE: u32, const SIZE: u32> SettingsStore<'f, F, BASE, SIZE> {
    const OKAY: bool =
        assert_store_params::<BASE, SIZE>(F::ERASE_SIZE as u32, F::WRITE_SIZE as u32);

    pub fn new(flash: &'f mut F) -> Result<Self, SettingsError> {
        assert!(Self::OKAY);
        let mut store = Self {
            flash,
            next: SIZE,
            current: None,
        };
        store.scan()?;
        Ok(store)
    }

    fn scan(&mut self) -> Result<(), SettingsError> {
        let mut rec = [0u8; RECORD_LEN as usize];
        let mut offset = 0;
        while offset + RECORD_LEN <= SIZE {
            self.flash
                .read(BASE + offset, &mut rec)
                .map_err(map_flash_error)?;
            if rec.iter().all(|b| *b == ERASED) {
                self.next = offset;
                return Ok(());
            }
            if let Some(settings) = Settings::decode(&rec) {
                self.current = Some(settings);
            } else {
                crate::debug!("skipping bad settings record at {}", offset);
            }
            offset += RECORD_LEN;
        }
        self.next = SIZE;
        Ok(())
    }

    /// The most recently saved settings, if any.
    pub fn load(&self) -> Option<Settings> {
        self.current
    }

    /// Append `settings` unless they match what is already stored.
    pub fn save(&mut self, settings: Settings) -> Result<(), SettingsError> {
        if self.current == Some(settings) {
            return Ok(());
        }
        if self.next + RECORD_LEN > SIZE {
            crate::info!("settings region full; erasing");
            self.flash
                .erase(BASE, BASE + SIZE)
                .map_err(map_flash_error)?;
            self.next = 0;
        }
        let offset = self.next;
        self.next += RECORD_LEN;
        self.flash
            .write(BASE + offset, &settings.encode())
            .map_err(map_flash_error)?;
        self.current = Some(settings);
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod test;

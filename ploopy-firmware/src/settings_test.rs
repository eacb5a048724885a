extern crate std;

use core::cell::RefCell;
use std::vec::Vec;

use crate::flash_test_stub::{FlashOp, FlashStubError, NorFlashStub};

use super::*;

type Store<'f, 'o> = SettingsStore<'f, NorFlashStub<'o, 192>, 64, 64>;

fn settings(dpi_index: u8) -> Settings {
    Settings { dpi_index }
}

#[test]
fn empty_region() {
    let mut flash = NorFlashStub::<192>::default();
    let store = Store::new(&mut flash).unwrap();
    assert_eq!(store.load(), None);
    assert_eq!(store.next, 0);
}

#[test]
fn save_then_load() {
    let mut flash = NorFlashStub::<192>::default();
    {
        let mut store = Store::new(&mut flash).unwrap();
        store.save(settings(0)).unwrap();
        assert_eq!(store.load(), Some(settings(0)));
    }
    assert_eq!(&flash.buf[64..66], b"PT");
    assert_eq!(flash.buf[67], 0);
    assert!(flash.buf[..64].iter().all(|b| *b == 0xff));
    assert!(flash.buf[72..].iter().all(|b| *b == 0xff));

    let mut store = Store::new(&mut flash).unwrap();
    assert_eq!(store.load(), Some(settings(0)));
    assert_eq!(store.next, 8);

    store.save(settings(1)).unwrap();
    drop(store);

    let store = Store::new(&mut flash).unwrap();
    assert_eq!(store.load(), Some(settings(1)));
    assert_eq!(store.next, 16);
}

#[test]
fn identical_save_writes_nothing() {
    let ops = RefCell::new(Vec::new());
    let observer = |op: FlashOp| -> Result<(), FlashStubError> {
        ops.borrow_mut().push(op);
        Ok(())
    };
    let mut flash = NorFlashStub::<192> {
        observer: Some(&observer),
        ..Default::default()
    };
    let mut store = Store::new(&mut flash).unwrap();

    store.save(settings(1)).unwrap();
    store.save(settings(1)).unwrap();
    store.save(settings(0)).unwrap();

    let ops = ops.borrow();
    assert_eq!(ops.len(), 2);
    assert!(matches!(ops[0], FlashOp::Write(64, _)));
    assert!(matches!(ops[1], FlashOp::Write(72, _)));
}

#[test]
fn bad_records_skipped() {
    let mut flash = NorFlashStub::<192>::default();
    {
        let mut store = Store::new(&mut flash).unwrap();
        store.save(settings(1)).unwrap();
        store.save(settings(0)).unwrap();
    }
    // corrupt the checksum of the newest record
    flash.buf[72 + 6] ^= 0x10;

    let store = Store::new(&mut flash).unwrap();
    assert_eq!(store.load(), Some(settings(1)));
    assert_eq!(store.next, 16);
}

#[test]
fn full_region_erased() {
    let ops = RefCell::new(Vec::new());
    let observer = |op: FlashOp| -> Result<(), FlashStubError> {
        if let FlashOp::Erase(..) = op {
            ops.borrow_mut().push(op);
        }
        Ok(())
    };
    let mut flash = NorFlashStub::<192> {
        observer: Some(&observer),
        ..Default::default()
    };
    {
        let mut store = Store::new(&mut flash).unwrap();
        for i in 0..8 {
            store.save(settings(i % 2)).unwrap();
        }
        assert_eq!(store.next, 64);
        assert!(ops.borrow().is_empty());

        store.save(settings(0)).unwrap();
        assert_eq!(*ops.borrow(), [FlashOp::Erase(64, 128)]);
        assert_eq!(store.next, 8);
    }

    assert!(flash.buf[72..128].iter().all(|b| *b == 0xff));
    let store = Store::new(&mut flash).unwrap();
    assert_eq!(store.load(), Some(settings(0)));
}

#[test]
fn flash_error() {
    let observer = |_: FlashOp| -> Result<(), FlashStubError> { Err(FlashStubError::Injected) };
    let mut flash = NorFlashStub::<192> {
        observer: Some(&observer),
        ..Default::default()
    };
    let mut store = Store::new(&mut flash).unwrap();

    assert_eq!(store.save(settings(1)), Err(SettingsError::Unknown));
    assert_eq!(store.load(), None);
}

#[test]
fn stale_version_ignored() {
    let mut flash = NorFlashStub::<192>::default();
    let mut rec = settings(0).encode();
    rec[2] = VERSION + 1;
    rec[6] = checksum(&rec[..6]);
    flash.buf[64..72].copy_from_slice(&rec);

    let store = Store::new(&mut flash).unwrap();
    assert_eq!(store.load(), None);
    assert_eq!(store.next, 8);
}

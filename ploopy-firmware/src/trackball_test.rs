use embassy_futures::{block_on, select::select, yield_now};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use ploopy_common::globals::TrackballConfig;

use crate::{
    flash_test_stub::NorFlashStub,
    input::{InputEvent, Motion, ScanKey, WheelDirection},
    keymap::DEFAULT_KEYMAP,
    settings::Settings,
    usb_test_stub::MyEndpointIn,
};

use super::*;

#[test]
fn usb_identity() {
    let identity = UsbIdentity {
        manufacturer: "Ploopy",
        product: "Trackball",
        vendor_id: 0x5043,
        product_id: 0x5c46,
        serial_number: "pt:1",
        max_power: 100,
    };

    let conf = identity.usb_config();
    assert_eq!(conf.manufacturer, Some("Ploopy"));
    assert_eq!(conf.product, Some("Trackball"));
    assert_eq!(conf.serial_number, Some("pt:1"));
    assert_eq!(conf.max_power, 100);
}

#[test]
fn mapper_to_reporter() {
    let mapper_channel = MapperChannel::<NoopRawMutex, 10>::default();
    let input = InputChannel::<NoopRawMutex, 4>::default();
    let mut mapper = Mapper::new(
        &mapper_channel,
        &DEFAULT_KEYMAP,
        TrackballConfig::DEFAULT,
        None,
    );
    let ep_in = MyEndpointIn::default();
    let messages = ep_in.messages.clone();
    let mut reporter = Reporter::new(HidWriter::new(ep_in));

    assert!(input.try_send(InputEvent::Button(ScanKey::new(0, true))));
    assert!(input.try_send(InputEvent::Motion(Motion { x: -1, y: 2 })));
    assert!(input.try_send(InputEvent::Button(ScanKey::new(0, false))));

    block_on(select(
        select(
            run_mapper(&mut mapper, &input),
            run_reporter(&mapper_channel, &mut reporter),
        ),
        async {
            while messages.len() < 3 {
                yield_now().await;
            }
        },
    ));

    assert_eq!(
        messages.take(),
        [
            [2, 1, 0, 0, 0, 0, 0, 0],
            [2, 1, 0xff, 0xff, 2, 0, 0, 0],
            [2, 0, 0, 0, 0, 0, 0, 0],
        ]
    );
}

#[test]
fn motion_and_scroll_reported() {
    let mapper_channel = MapperChannel::<NoopRawMutex, 4>::default();
    let mut mapper = Mapper::new(
        &mapper_channel,
        &DEFAULT_KEYMAP,
        TrackballConfig::DEFAULT,
        None,
    );
    let ep_in = MyEndpointIn::default();
    let messages = ep_in.messages.clone();
    let mut reporter = Reporter::new(HidWriter::new(ep_in));

    mapper.motion(Motion { x: 1, y: 0 });
    mapper.wheel(WheelDirection::Clockwise);

    block_on(select(run_reporter(&mapper_channel, &mut reporter), async {
        while messages.len() < 2 {
            yield_now().await;
        }
    }));

    assert_eq!(
        messages.take(),
        [[2, 0, 1, 0, 0, 0, 0, 0], [2, 0, 0, 0, 0, 0, 1, 0]]
    );
}

#[test]
fn settings_saved() {
    let mapper_channel = MapperChannel::<NoopRawMutex, 4>::default();
    let mut flash = NorFlashStub::<128>::default();
    let mut store = SettingsStore::<_, 64, 64>::new(&mut flash).unwrap();

    mapper_channel.settings().signal(Settings { dpi_index: 0 });

    block_on(select(run_settings(&mapper_channel, &mut store), async {
        yield_now().await;
    }));

    assert_eq!(store.load(), Some(Settings { dpi_index: 0 }));
}

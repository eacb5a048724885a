//! Glue for a board crate: USB identity and the long running tasks that connect the mapper to the
//! HID endpoint and the settings store.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_usb::{
    driver::{Driver, EndpointIn},
    Builder,
};
use embedded_storage::nor_flash::NorFlash;

use crate::{
    hid::HidWriter,
    input::InputChannel,
    key_reporter::Reporter,
    mapper::{Mapper, MapperChannel},
    settings::SettingsStore,
    usb::{Configurator, State, MAX_REPORT_LEN, TRACKBALL_REPORT_DESC},
};

pub type TrackballHidWriter<'d, D> = HidWriter<<D as Driver<'d>>::EndpointIn, MAX_REPORT_LEN>;

/// How the trackball presents itself to the host.
pub struct UsbIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: &'static str,
    pub product: &'static str,
    pub serial_number: &'static str,
    pub max_power: u16,
}
impl UsbIdentity {
    pub fn usb_config(&self) -> embassy_usb::Config<'static> {
        let mut conf = embassy_usb::Config::new(self.vendor_id, self.product_id);
        conf.manufacturer = Some(self.manufacturer);
        conf.product = Some(self.product);
        conf.serial_number = Some(self.serial_number);
        conf.max_power = self.max_power;
        conf
    }

    pub fn usb_configurator<'d>(&self) -> Configurator<'d> {
        Configurator::new(self.usb_config())
    }

    pub fn hid_iface<'d, D: Driver<'d>>(
        &self,
        usb_config: &Configurator<'d>,
        hid_state: &'d mut State<'d>,
        mut usb_builder: Builder<'d, D>,
    ) -> (TrackballHidWriter<'d, D>, Builder<'d, D>) {
        let writer = usb_config.add_iface::<_, MAX_REPORT_LEN>(
            &mut usb_builder,
            &TRACKBALL_REPORT_DESC,
            hid_state,
        );
        (writer, usb_builder)
    }
}

/// Feed input events through the mapper forever. An exit request releases everything that is
/// held and the mapper carries on.
pub async fn run_mapper<
    const N: usize,
    const L: usize,
    M: RawMutex,
    const REPORT_BUFFER_SIZE: usize,
    const INPUT_BUFFER_SIZE: usize,
>(
    mapper: &mut Mapper<'_, N, L, M, REPORT_BUFFER_SIZE>,
    input_channel: &InputChannel<M, INPUT_BUFFER_SIZE>,
) -> ! {
    loop {
        let msg = mapper.run(input_channel).await;
        crate::debug!("mapper stopped {:?}", msg);
    }
}

/// Forward mapper events to the USB HID endpoint.
pub async fn run_reporter<E: EndpointIn, M: RawMutex, const REPORT_BUFFER_SIZE: usize>(
    mapper_channel: &MapperChannel<M, REPORT_BUFFER_SIZE>,
    reporter: &mut Reporter<E>,
) -> ! {
    reporter.ready().await;
    loop {
        reporter.report(mapper_channel.receive().await).await;
    }
}

/// Persist settings changed by the mapper.
pub async fn run_settings<
    F: NorFlash,
    M: RawMutex,
    const BASE: u32,
    const SIZE: u32,
    const REPORT_BUFFER_SIZE: usize,
>(
    mapper_channel: &MapperChannel<M, REPORT_BUFFER_SIZE>,
    store: &mut SettingsStore<'_, F, BASE, SIZE>,
) -> ! {
    loop {
        let settings = mapper_channel.settings().wait().await;
        match store.save(settings) {
            Ok(()) => crate::debug!("saved {:?}", settings),
            Err(err) => crate::warn!("failed to save settings: {:?}", err),
        }
    }
}

#[cfg(test)]
#[path = "trackball_test.rs"]
mod test;

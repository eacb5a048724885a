use core::mem::MaybeUninit;
use embassy_usb::{
    control::{InResponse, OutResponse, Recipient, Request, RequestType},
    driver::Driver,
    types::InterfaceNumber,
    Builder, Config, Handler,
};

use crate::hid::HidWriter;

// HID
const HID_CLASS: u8 = 3;
const HID_DESC_DESCTYPE_HID: u8 = 0x21;
const HID_DESC_DESCTYPE_HID_REPORT: u8 = 0x22;
const HID_DESC_SPEC_1_11: [u8; 2] = [0x11, 0x01];
const HID_DESC_COUNTRY_UNSPEC: u8 = 0x00;

const HID_REQ_SET_IDLE: u8 = 0x0a;
const HID_REQ_GET_IDLE: u8 = 0x02;
const HID_REQ_GET_PROTOCOL: u8 = 0x03;
const HID_REQ_SET_PROTOCOL: u8 = 0x0b;

pub const KEYBOARD_REPORT_ID: u8 = 1;
pub const MOUSE_REPORT_ID: u8 = 2;
pub const CONSUMER_REPORT_ID: u8 = 3;

/// Largest input report including its id byte (the keyboard report).
pub const MAX_REPORT_LEN: usize = 9;

#[rustfmt::skip]
pub const TRACKBALL_REPORT_DESC: [u8; 49 + 75 + 25] = [
    // KEYBOARD_DESC [u8; 49]
    0x05, 0x01, // (GLOBAL) USAGE_PAGE         0x0001 Generic Desktop Page
    0x09, 0x06, // (LOCAL)  USAGE              0x00010006 Keyboard (Application Collection)
    0xA1, 0x01, // (MAIN)   COLLECTION         0x01 Application
    0x85, 0x01, //   (GLOBAL) REPORT_ID          0x01 (1)
    0x05, 0x07, //   (GLOBAL) USAGE_PAGE         0x0007 Keyboard/Keypad Page
    0x19, 0xE0, //   (LOCAL)  USAGE_MINIMUM      0x000700E0 Keyboard LeftControl
    0x29, 0xE7, //   (LOCAL)  USAGE_MAXIMUM      0x000700E7 Keyboard Right GUI
    0x15, 0x00, //   (GLOBAL) LOGICAL_MINIMUM    0x00 (0)
    0x25, 0x01, //   (GLOBAL) LOGICAL_MAXIMUM    0x01 (1)
    0x95, 0x08, //   (GLOBAL) REPORT_COUNT       0x08 (8) Number of fields
    0x75, 0x01, //   (GLOBAL) REPORT_SIZE        0x01 (1) Number of bits per field
    0x81, 0x02, //   (MAIN)   INPUT              0x00000002 (8 fields x 1 bit) Data Variable Absolute
    0x95, 0x01, //   (GLOBAL) REPORT_COUNT       0x01 (1) Number of fields
    0x75, 0x08, //   (GLOBAL) REPORT_SIZE        0x08 (8) Number of bits per field
    0x81, 0x01, //   (MAIN)   INPUT              0x00000001 (1 field x 8 bits) Constant (reserved)
    0x95, 0x06, //   (GLOBAL) REPORT_COUNT       0x06 (6) Number of fields
    0x75, 0x08, //   (GLOBAL) REPORT_SIZE        0x08 (8) Number of bits per field
    0x15, 0x00, //   (GLOBAL) LOGICAL_MINIMUM    0x00 (0)
    0x26, 0xFF, 0x00, // (GLOBAL) LOGICAL_MAXIMUM 0x00FF (255)
    0x05, 0x07, //   (GLOBAL) USAGE_PAGE         0x0007 Keyboard/Keypad Page
    0x19, 0x00, //   (LOCAL)  USAGE_MINIMUM      0x00070000 Keyboard No event indicated
    0x2A, 0xFF, 0x00, // (LOCAL) USAGE_MAXIMUM   0x000700FF
    0x81, 0x00, //   (MAIN)   INPUT              0x00000000 (6 fields x 8 bits) Data Array Absolute
    0xC0,       // (MAIN)   END_COLLECTION     Application

    // MOUSE_DESC  [u8; 75]
    0x05, 0x01, // (GLOBAL) USAGE_PAGE         0x0001 Generic Desktop Page
    0x09, 0x02, // (LOCAL)  USAGE              0x00010002 Mouse (Application Collection)
    0xA1, 0x01, // (MAIN)   COLLECTION         0x01 Application
    0x85, 0x02, //   (GLOBAL) REPORT_ID          0x02 (2)
    0x09, 0x01, //   (LOCAL)  USAGE              0x00010001 Pointer (Physical Collection)
    0xA1, 0x00, //   (MAIN)   COLLECTION         0x00 Physical
    0x05, 0x09, //     (GLOBAL) USAGE_PAGE         0x0009 Button Page
    0x19, 0x01, //     (LOCAL)  USAGE_MINIMUM      0x00090001 Button 1
    0x29, 0x08, //     (LOCAL)  USAGE_MAXIMUM      0x00090008 Button 8
    0x15, 0x00, //     (GLOBAL) LOGICAL_MINIMUM    0x00 (0)
    0x25, 0x01, //     (GLOBAL) LOGICAL_MAXIMUM    0x01 (1)
    0x95, 0x08, //     (GLOBAL) REPORT_COUNT       0x08 (8) Number of fields
    0x75, 0x01, //     (GLOBAL) REPORT_SIZE        0x01 (1) Number of bits per field
    0x81, 0x02, //     (MAIN)   INPUT              0x00000002 (8 fields x 1 bit) Data Variable Absolute
    0x05, 0x01, //     (GLOBAL) USAGE_PAGE         0x0001 Generic Desktop Page
    0x09, 0x30, //     (LOCAL)  USAGE              0x00010030 X (Dynamic Value)
    0x09, 0x31, //     (LOCAL)  USAGE              0x00010031 Y (Dynamic Value)
    0x16, 0x01, 0x80, // (GLOBAL) LOGICAL_MINIMUM  0x8001 (-32767)
    0x26, 0xFF, 0x7F, // (GLOBAL) LOGICAL_MAXIMUM  0x7FFF (32767)
    0x95, 0x02, //     (GLOBAL) REPORT_COUNT       0x02 (2) Number of fields
    0x75, 0x10, //     (GLOBAL) REPORT_SIZE        0x10 (16) Number of bits per field
    0x81, 0x06, //     (MAIN)   INPUT              0x00000006 (2 fields x 16 bits) Data Variable Relative
    0x09, 0x38, //     (LOCAL)  USAGE              0x00010038 Wheel (Dynamic Value)
    0x15, 0x81, //     (GLOBAL) LOGICAL_MINIMUM    0x81 (-127)
    0x25, 0x7F, //     (GLOBAL) LOGICAL_MAXIMUM    0x7F (127)
    0x95, 0x01, //     (GLOBAL) REPORT_COUNT       0x01 (1) Number of fields
    0x75, 0x08, //     (GLOBAL) REPORT_SIZE        0x08 (8) Number of bits per field
    0x81, 0x06, //     (MAIN)   INPUT              0x00000006 (1 field x 8 bits) Data Variable Relative
    0x05, 0x0C, //     (GLOBAL) USAGE_PAGE         0x000C Consumer Page
    0x0A, 0x38, 0x02, // (LOCAL) USAGE             0x000C0238 AC Pan (Linear Control)
    0x15, 0x81, //     (GLOBAL) LOGICAL_MINIMUM    0x81 (-127)
    0x25, 0x7F, //     (GLOBAL) LOGICAL_MAXIMUM    0x7F (127)
    0x95, 0x01, //     (GLOBAL) REPORT_COUNT       0x01 (1) Number of fields
    0x75, 0x08, //     (GLOBAL) REPORT_SIZE        0x08 (8) Number of bits per field
    0x81, 0x06, //     (MAIN)   INPUT              0x00000006 (1 field x 8 bits) Data Variable Relative
    0xC0,       //   (MAIN)   END_COLLECTION     Physical
    0xC0,       // (MAIN)   END_COLLECTION     Application

    // CONSUMER_CTL_DESC: [u8; 25]
    0x05, 0x0C, // (GLOBAL) USAGE_PAGE         0x000C Consumer Page
    0x09, 0x01, // (LOCAL)  USAGE              0x000C0001 Consumer Control (Application Collection)
    0xA1, 0x01, // (MAIN)   COLLECTION         0x01 Application
    0x85, 0x03, //   (GLOBAL) REPORT_ID          0x03 (3)
    0x19, 0x01, //   (LOCAL)  USAGE_MINIMUM      0x000C0001 Consumer Control
    0x2A, 0xA0, 0x02, // (LOCAL) USAGE_MAXIMUM   0x000C02A0 AC Soft Key Left
    0x15, 0x01, //   (GLOBAL) LOGICAL_MINIMUM    0x01 (1)
    0x26, 0xA0, 0x02, // (GLOBAL) LOGICAL_MAXIMUM 0x02A0 (672)
    0x95, 0x01, //   (GLOBAL) REPORT_COUNT       0x01 (1) Number of fields
    0x75, 0x10, //   (GLOBAL) REPORT_SIZE        0x10 (16) Number of bits per field
    0x81, 0x00, //   (MAIN)   INPUT              0x00000000 (1 field x 16 bits) Data Array Absolute
    0xC0,       // (MAIN)   END_COLLECTION     Application
];

/// Internal state for USB HID.
pub struct State<'d> {
    control: MaybeUninit<Control<'d>>,
}
impl Default for State<'_> {
    fn default() -> Self {
        Self::new()
    }
}
impl State<'_> {
    /// Create a new `State`.
    pub const fn new() -> Self {
        State {
            control: MaybeUninit::uninit(),
        }
    }
}

const CONFIG_SIZE: usize = 64;
const BOS_SIZE: usize = 32;
const MSOS_SIZE: usize = 0;
const CONTROL_SIZE: usize = 256;

pub struct UsbBuffers {
    config_descriptor_buf: [u8; CONFIG_SIZE],
    bos_descriptor_buf: [u8; BOS_SIZE],
    msos_descriptor_buf: [u8; MSOS_SIZE],
    control_buf: [u8; CONTROL_SIZE],
}

impl Default for UsbBuffers {
    fn default() -> Self {
        Self {
            config_descriptor_buf: [0; CONFIG_SIZE],
            bos_descriptor_buf: [0; BOS_SIZE],
            msos_descriptor_buf: [0; MSOS_SIZE],
            control_buf: [0; CONTROL_SIZE],
        }
    }
}

pub struct Configurator<'d> {
    device_config: Option<Config<'d>>,
    max_packet_size: u16,
    poll_ms: u8,
}

impl<'d> Configurator<'d> {
    pub fn new(device_config: Config<'d>) -> Self {
        Self {
            max_packet_size: device_config.max_packet_size_0 as u16,
            device_config: Some(device_config),
            poll_ms: 1,
        }
    }

    /// The builder can only be created once.
    pub fn usb_builder<D: Driver<'d>>(
        &mut self,
        driver: D,
        buffers: &'d mut UsbBuffers,
    ) -> Option<Builder<'d, D>> {
        self.device_config.take().map(|device_config| {
            Builder::new(
                driver,
                device_config,
                &mut buffers.config_descriptor_buf,
                &mut buffers.bos_descriptor_buf,
                &mut buffers.msos_descriptor_buf,
                &mut buffers.control_buf,
            )
        })
    }

    /// Add a HID interface (no boot subclass) with one interrupt IN endpoint.
    pub fn add_iface<D: Driver<'d>, const WRITE_N: usize>(
        &self,
        builder: &mut Builder<'d, D>,
        descriptor: &'static [u8],
        state: &'d mut State<'d>,
    ) -> HidWriter<D::EndpointIn, WRITE_N> {
        let mut func = builder.function(HID_CLASS, 0, 0);
        let mut iface = func.interface();
        let if_num = iface.interface_number();
        let mut alt = iface.alt_setting(HID_CLASS, 0, 0, None);

        let control = Control::new(if_num, descriptor);
        alt.descriptor(HID_DESC_DESCTYPE_HID, &control.hid_descriptor[2..]);

        let ep_in = alt.endpoint_interrupt_in(self.max_packet_size, self.poll_ms);

        drop(func);

        let control = state.control.write(control);
        builder.handler(control);
        HidWriter::new(ep_in)
    }
}

struct Control<'d> {
    if_num: InterfaceNumber,
    report_descriptor: &'d [u8],
    hid_descriptor: [u8; 9],
    /// SET_IDLE duration in 4ms units; 0 means only report on change.
    idle: u8,
}
impl<'d> Control<'d> {
    fn new(if_num: InterfaceNumber, report_descriptor: &'d [u8]) -> Self {
        Control {
            if_num,
            report_descriptor,
            hid_descriptor: [
                9,                                           // Length of buf inclusive of size prefix
                HID_DESC_DESCTYPE_HID,                       // Descriptor type
                HID_DESC_SPEC_1_11[0],                       // HID Class spec version
                HID_DESC_SPEC_1_11[1],                       //
                HID_DESC_COUNTRY_UNSPEC,                     // Country code not supported
                1,                                           // Number of following descriptors
                HID_DESC_DESCTYPE_HID_REPORT, // We have a HID report descriptor the host should read
                (report_descriptor.len() & 0xFF) as u8, // HID report descriptor size,
                (report_descriptor.len() >> 8 & 0xFF) as u8, //
            ],
            idle: 0,
        }
    }
}
impl Handler for Control<'_> {
    fn reset(&mut self) {
        self.idle = 0;
    }

    fn control_out(&mut self, req: Request, _data: &[u8]) -> Option<OutResponse> {
        if (req.request_type, req.recipient, req.index)
            != (
                RequestType::Class,
                Recipient::Interface,
                self.if_num.0 as u16,
            )
        {
            return None;
        }

        match req.request {
            HID_REQ_SET_IDLE => {
                self.idle = (req.value >> 8) as u8;
                Some(OutResponse::Accepted)
            }
            HID_REQ_SET_PROTOCOL => {
                if req.value == 1 {
                    Some(OutResponse::Accepted)
                } else {
                    crate::warn!("HID Boot Protocol is unsupported.");
                    Some(OutResponse::Rejected)
                }
            }
            _ => Some(OutResponse::Rejected),
        }
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        if req.index != self.if_num.0 as u16 {
            return None;
        }

        match (req.request_type, req.recipient) {
            (RequestType::Standard, Recipient::Interface) => match req.request {
                Request::GET_DESCRIPTOR => match (req.value >> 8) as u8 {
                    HID_DESC_DESCTYPE_HID_REPORT => {
                        Some(InResponse::Accepted(self.report_descriptor))
                    }
                    HID_DESC_DESCTYPE_HID => Some(InResponse::Accepted(&self.hid_descriptor)),
                    _ => Some(InResponse::Rejected),
                },

                _ => Some(InResponse::Rejected),
            },
            (RequestType::Class, Recipient::Interface) => match req.request {
                HID_REQ_GET_IDLE if !buf.is_empty() => {
                    buf[0] = self.idle;
                    Some(InResponse::Accepted(&buf[0..1]))
                }
                HID_REQ_GET_PROTOCOL if !buf.is_empty() => {
                    // Report protocol only
                    buf[0] = 1;
                    Some(InResponse::Accepted(&buf[0..1]))
                }
                _ => Some(InResponse::Rejected),
            },
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "usb_test.rs"]
mod test;

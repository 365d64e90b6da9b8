//! Power-on defaults and hardware-fixed constants.

use crate::xyz::XYZId;

/// Identification payload returned once an initialize sequence completes.
pub const FIRMWARE_ID: &[u8; 7] = b"XYZ_1.0";

/// Step-compare timer tick rate. One count every 8 us (Fosc/4 through the
/// 1:64 postscale), so an 8-bit compare period covers 246 Hz to 65 kHz
/// half-cycles without reprogramming the prescaler.
pub const STEP_TICK_HZ: u32 = 125_000;

/// Slowest step rate the 8-bit compare period can still express.
pub const MIN_STEP_RATE: u16 = 246;

/// Compare period programmed when a requested rate is out of range.
pub const FALLBACK_PERIOD: u8 = 0xFF;

/// Highest DAC code the chopper reference accepts. 4.7 A through the 0.2 ohm
/// sense resistor is 0.94 V, code 0x1C against the 1.024 V fixed reference.
pub const VREF_LIMIT: u8 = 0x1C;

/// Translator reset pulse settle time.
pub const RESET_SETTLE_MS: u16 = 1;
/// Delay between raising RESET/enable and the first step edge.
pub const ENABLE_SETTLE_MS: u16 = 10;
/// DAC output settle time before the chopper limit can be trusted.
pub const VREF_SETTLE_MS: u16 = 250;

/// Serial payload capacity, commands and responses alike.
pub const FRAME_CAPACITY: usize = 16;
/// Completed command frames waiting for the foreground loop.
pub const COMMAND_QUEUE_DEPTH: usize = 4;
/// Response frames waiting for the transport to clock out.
pub const RESPONSE_QUEUE_DEPTH: usize = 4;

pub struct AxisDefaults {
    pub min_speed: u16,
    pub max_speed: u16,
    pub vref: u8,
}

// 2.8 A motors on X and Y, a 1 A motor on Z.
const X_DEFAULTS: AxisDefaults = AxisDefaults { min_speed: 1300, max_speed: 2000, vref: 0x11 };
const Y_DEFAULTS: AxisDefaults = AxisDefaults { min_speed: 750, max_speed: 2000, vref: 0x11 };
const Z_DEFAULTS: AxisDefaults = AxisDefaults { min_speed: 500, max_speed: 1000, vref: 0x06 };

pub fn axis_defaults(id: XYZId) -> &'static AxisDefaults {
    match id {
        XYZId::X => &X_DEFAULTS,
        XYZId::Y => &Y_DEFAULTS,
        XYZId::Z => &Z_DEFAULTS,
    }
}

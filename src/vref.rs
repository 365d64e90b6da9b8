use thiserror::Error;

use crate::config::{VREF_LIMIT, VREF_SETTLE_MS};
use crate::io::DriveIo;
use crate::status::StatusRegister;
use crate::xyz::XYZId;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum VrefError {
    #[error("vref code {0} exceeds the chopper reference limit")]
    OutOfRange(u8),
}

/// The chopper current reference. There is exactly one DAC behind all three
/// axes, so only one axis's current limit is honored at a time; `active`
/// names the axis the hardware is currently set up for.
///
/// Known hazard of the board topology: starting an axis whose code differs
/// from `working` re-targets the shared reference while any other running
/// axis keeps stepping, silently changing that axis's effective current
/// limit. The reference follows the most recently started axis. Callers are
/// not blocked on this; hosts that care must not run axes with different
/// codes concurrently.
pub struct VrefDac {
    working: u8,
    active: Option<XYZId>,
}

impl VrefDac {
    pub const fn new() -> Self {
        Self { working: 0, active: None }
    }

    /// Code currently latched into the hardware.
    pub fn working(&self) -> u8 {
        self.working
    }

    pub fn active(&self) -> Option<XYZId> {
        self.active
    }

    /// Re-target the reference for `axis`. In range: latch the DAC, wait out
    /// the settle time, take ownership, clear the error bit. Out of range:
    /// hardware and ownership stay as they were and the error bit latches.
    pub fn set_active(
        &mut self,
        axis: XYZId,
        code: u8,
        io: &mut impl DriveIo,
        status: &mut StatusRegister,
    ) -> Result<(), VrefError> {
        if code > VREF_LIMIT {
            status.latch_vref_error();
            return Err(VrefError::OutOfRange(code));
        }
        io.dac(code);
        io.delay_ms(VREF_SETTLE_MS);
        self.working = code;
        self.active = Some(axis);
        status.clear_vref_error();
        debug!("vref {} -> axis {}", code, axis.index());
        Ok(())
    }
}

use crate::config;
use crate::io::{Direction, DriveIo};
use crate::status::StatusRegister;
use crate::vref::VrefDac;
use crate::xyz::XYZId;

/// What the foreground state machine is doing with an axis.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Motion {
    Idle,
    Moving { dest: i16 },
    Homing,
}

/// One stepper channel: its step count, commanded target, speed bounds and
/// current-limit code, plus mirrors of the STEP line level and DIR line.
///
/// `position` has two writers while the axis runs: the compare-match handler
/// and a confirmed home, which resets it to zero. Everything else goes
/// through the dispatcher on the foreground.
pub struct AxisDrive {
    pub id: XYZId,
    pub position: i16,
    pub target: i16,
    pub direction: Direction,
    pub min_speed: u16,
    // Stored and host-settable, but the stepping path never consults it.
    // Speed is fixed per move; there is no ramp.
    pub max_speed: u16,
    pub vref: u8,
    pub step_high: bool,
    pub motion: Motion,
}

impl AxisDrive {
    pub fn new(id: XYZId) -> Self {
        let defaults = config::axis_defaults(id);
        Self {
            id,
            position: 0,
            target: 0,
            direction: Direction::TowardHome,
            min_speed: defaults.min_speed,
            max_speed: defaults.max_speed,
            vref: defaults.vref,
            step_high: false,
            motion: Motion::Idle,
        }
    }

    /// Compare period for a step rate, in 8 us ticks. The period is half a
    /// step cycle, one compare match per signal edge. Rates below 246 Hz
    /// would overflow the 8-bit period, so they latch the period error and
    /// return the slowest expressible period instead; the u16 argument caps
    /// the other end at 65535 Hz.
    pub fn period(speed: u16, status: &mut StatusRegister) -> u8 {
        if speed >= config::MIN_STEP_RATE {
            status.clear_period_error();
            (config::STEP_TICK_HZ / (2 * speed as u32)) as u8
        } else {
            status.latch_period_error();
            config::FALLBACK_PERIOD
        }
    }

    /// Default drive mode: translator reset to its home state, chopper on
    /// the inhibit inputs, half-step sequencing.
    pub fn half_step(&mut self, io: &mut impl DriveIo) {
        io.reset(self.id, false);
        io.delay_ms(config::RESET_SETTLE_MS);
        io.control(self.id, false);
        io.half_full(self.id, true);
    }

    /// Unconditional, idempotent drive disable. Safe to call whatever the
    /// axis is doing; it always ends Idle with the timer off, the translator
    /// held in reset and the STEP line low.
    pub fn abort(&mut self, io: &mut impl DriveIo, status: &mut StatusRegister) {
        io.timer_stop(self.id);
        io.reset(self.id, false);
        io.delay_ms(config::RESET_SETTLE_MS);
        self.step_high = false;
        io.step(self.id, false);
        io.timer_clear(self.id);
        status.clear_running(self.id);
        self.motion = Motion::Idle;
        trace!("axis {} aborted", self.id.index());
    }

    /// Arm and enable the drive at `speed`. The enable half is skipped
    /// entirely while a period error is latched, so a bad speed leaves the
    /// channel disarmed instead of creeping at the fallback rate.
    pub fn start(
        &mut self,
        speed: u16,
        io: &mut impl DriveIo,
        status: &mut StatusRegister,
        vref: &mut VrefDac,
    ) {
        self.half_step(io);
        let period = Self::period(speed, status);
        io.set_period(self.id, period);

        // Only touch the shared reference on a mismatch. A failed switch
        // latches its error bit and the drive keeps the previous limit.
        if self.vref != vref.working() {
            if vref.set_active(self.id, self.vref, io, status).is_err() {
                warn!("axis {} vref {} rejected", self.id.index(), self.vref);
            }
        }

        if !status.period_error() {
            status.set_running(self.id);
            io.reset(self.id, true);
            io.delay_ms(config::ENABLE_SETTLE_MS);
            io.timer_start(self.id);
            self.step_high = true;
            io.step(self.id, true);
            debug!("axis {} running, period {}", self.id.index(), period);
        }
    }

    /// Compare-match handler. Two matches make one physical step; the count
    /// moves on the high-to-low edge only.
    pub fn step_compare(&mut self, io: &mut impl DriveIo) {
        if self.step_high {
            self.position = if self.direction.away() {
                self.position.wrapping_add(1)
            } else {
                self.position.wrapping_sub(1)
            };
            self.step_high = false;
            io.step(self.id, false);
        } else {
            self.step_high = true;
            io.step(self.id, true);
        }
        io.timer_clear(self.id);
    }

    /// Foreground advance for whatever this axis is doing.
    pub fn poll(&mut self, io: &mut impl DriveIo, status: &mut StatusRegister) {
        match self.motion {
            Motion::Idle => {}
            Motion::Moving { .. } => self.poll_move(io, status),
            Motion::Homing => self.poll_home(io, status),
        }
    }
}

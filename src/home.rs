use crate::io::{Direction, DriveIo};
use crate::status::StatusRegister;
use crate::stepper::{AxisDrive, Motion};
use crate::vref::VrefDac;

impl AxisDrive {
    /// Begin driving the axis onto its home switch. Already sitting on the
    /// switch is a no-op and the count is left alone; only a confirmed
    /// arrival re-zeroes it. With a bad minimum speed the drive never
    /// enables and the axis stays Idle with the period error latched.
    pub fn home_start(
        &mut self,
        io: &mut impl DriveIo,
        status: &mut StatusRegister,
        vref: &mut VrefDac,
    ) {
        status.sample_limit(io.sensor_port());
        if status.home(self.id) {
            return;
        }
        self.abort(io, status);
        self.direction = Direction::TowardHome;
        io.dir(self.id, false);
        self.start(self.min_speed, io, status, vref);
        if status.period_error() {
            return;
        }
        self.motion = Motion::Homing;
        debug!("axis {} homing", self.id.index());
    }

    /// One foreground iteration of a homing run. Stops on the home switch
    /// or on a withdrawn running bit; the count and target reset to zero
    /// only when the switch was actually seen, so an interrupted run leaves
    /// the count untouched and the caller finds out from the registers.
    pub(crate) fn poll_home(&mut self, io: &mut impl DriveIo, status: &mut StatusRegister) {
        status.sample_limit(io.sensor_port());
        if status.home(self.id) || !status.is_running(self.id) {
            self.abort(io, status);
            if status.home(self.id) {
                self.position = 0;
                self.target = 0;
                info!("axis {} homed", self.id.index());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::home_bit;
    use crate::xyz::XYZId;

    #[derive(Default)]
    struct Bench {
        port: u8,
        dir_away: [bool; 3],
        timer_on: [bool; 3],
    }

    impl Bench {
        fn new() -> Self {
            Self { port: 0xFF, ..Default::default() }
        }
    }

    impl DriveIo for Bench {
        fn step(&mut self, _: XYZId, _: bool) {}
        fn dir(&mut self, axis: XYZId, away: bool) {
            self.dir_away[axis.index()] = away;
        }
        fn reset(&mut self, _: XYZId, _: bool) {}
        fn half_full(&mut self, _: XYZId, _: bool) {}
        fn control(&mut self, _: XYZId, _: bool) {}
        fn set_period(&mut self, _: XYZId, _: u8) {}
        fn timer_start(&mut self, axis: XYZId) {
            self.timer_on[axis.index()] = true;
        }
        fn timer_stop(&mut self, axis: XYZId) {
            self.timer_on[axis.index()] = false;
        }
        fn timer_clear(&mut self, _: XYZId) {}
        fn dac(&mut self, _: u8) {}
        fn sensor_port(&mut self) -> u8 {
            self.port
        }
        fn delay_ms(&mut self, _: u16) {}
    }

    #[test]
    fn homing_runs_until_the_switch_and_re_zeroes() {
        let mut io = Bench::new();
        let mut status = StatusRegister::default();
        let mut vref = VrefDac::new();
        let mut axis = AxisDrive::new(XYZId::X);
        axis.position = 40;

        axis.home_start(&mut io, &mut status, &mut vref);
        assert_eq!(axis.motion, Motion::Homing);
        assert!(!io.dir_away[0]);
        // The carriage trips the switch after a handful of steps.
        for _ in 0..16 {
            axis.step_compare(&mut io);
            axis.poll(&mut io, &mut status);
        }
        assert!(axis.position < 40);
        io.port &= !home_bit(XYZId::X);
        axis.poll(&mut io, &mut status);
        assert_eq!(axis.motion, Motion::Idle);
        assert_eq!(axis.position, 0);
        assert_eq!(axis.target, 0);
        assert!(!status.is_running(XYZId::X));
        assert!(!io.timer_on[0]);
    }

    #[test]
    fn homing_from_the_switch_is_a_no_op() {
        let mut io = Bench::new();
        let mut status = StatusRegister::default();
        let mut vref = VrefDac::new();
        let mut axis = AxisDrive::new(XYZId::Y);
        axis.position = 12;
        io.port &= !home_bit(XYZId::Y);

        axis.home_start(&mut io, &mut status, &mut vref);
        assert_eq!(axis.motion, Motion::Idle);
        assert!(!io.timer_on[1]);
        assert_eq!(axis.position, 12, "no confirmed run, no re-zero");
    }

    #[test]
    fn period_error_leaves_the_axis_put() {
        let mut io = Bench::new();
        let mut status = StatusRegister::default();
        let mut vref = VrefDac::new();
        let mut axis = AxisDrive::new(XYZId::Z);
        axis.position = 25;
        axis.min_speed = 100;

        axis.home_start(&mut io, &mut status, &mut vref);
        assert_eq!(axis.motion, Motion::Idle);
        assert!(status.period_error());
        assert!(!io.timer_on[2]);
        assert_eq!(axis.position, 25);
    }

    #[test]
    fn withdrawn_running_bit_interrupts_without_re_zeroing() {
        let mut io = Bench::new();
        let mut status = StatusRegister::default();
        let mut vref = VrefDac::new();
        let mut axis = AxisDrive::new(XYZId::X);
        axis.position = 30;

        axis.home_start(&mut io, &mut status, &mut vref);
        for _ in 0..8 {
            axis.step_compare(&mut io);
            axis.poll(&mut io, &mut status);
        }
        status.clear_running(XYZId::X);
        axis.poll(&mut io, &mut status);
        assert_eq!(axis.motion, Motion::Idle);
        assert_ne!(axis.position, 0, "interrupted homing must not re-zero");
    }
}

use crate::xyz::XYZId;

/// Everything the motion core touches on the board, kept behind one trait so
/// the same engine runs against real ports or a bench recorder in tests.
///
/// The binding layer owns pin mapping, clock and UART bring-up, and the
/// interrupt vectors. Its obligations: call [`crate::Machine::on_byte`] from
/// the receive interrupt, [`crate::Machine::step_compare`] from each axis
/// compare-match interrupt (clearing the flag itself), and guard `Machine`
/// access with its interrupt-free sections. `delay_ms` must leave the
/// receive interrupt live so bytes keep accumulating through settle waits.
pub trait DriveIo {
    /// STEP line level.
    fn step(&mut self, axis: XYZId, high: bool);
    /// DIR line. High drives away from home.
    fn dir(&mut self, axis: XYZId, away: bool);
    /// RESET/enable line. Low forces the translator to its home state
    /// with all phase outputs off.
    fn reset(&mut self, axis: XYZId, high: bool);
    /// HALF/FULL mode select line.
    fn half_full(&mut self, axis: XYZId, half: bool);
    /// CONTROL line. Low points the chopper at the inhibit inputs.
    fn control(&mut self, axis: XYZId, high: bool);

    /// Program the axis compare period, in 8 us ticks.
    fn set_period(&mut self, axis: XYZId, period: u8);
    /// Clear the pending compare flag, enable the compare interrupt and
    /// run the axis timer.
    fn timer_start(&mut self, axis: XYZId);
    /// Disable the compare interrupt and stop the axis timer.
    fn timer_stop(&mut self, axis: XYZId);
    /// Zero the axis timer count register.
    fn timer_clear(&mut self, axis: XYZId);

    /// Latch a code into the shared chopper-reference DAC.
    fn dac(&mut self, code: u8);

    /// Raw limit-sensor port. Active low: a zero bit means the switch is
    /// pressed. Bit pairs per axis, home then far-home, X in bits 0..1.
    fn sensor_port(&mut self) -> u8;

    /// Scoped blocking settle delay with interrupts still serviced.
    fn delay_ms(&mut self, ms: u16);
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    TowardHome,
    AwayFromHome,
}

impl Direction {
    pub fn away(self) -> bool {
        matches!(self, Direction::AwayFromHome)
    }
}

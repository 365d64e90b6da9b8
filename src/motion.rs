use crate::io::{Direction, DriveIo};
use crate::status::StatusRegister;
use crate::stepper::{AxisDrive, Motion};
use crate::vref::VrefDac;

impl AxisDrive {
    /// Point the axis at an absolute destination and enable the drive.
    /// Any in-flight motion is cut first; a destination equal to the current
    /// count is a no-op. Completion, limit handling and the final disable
    /// all happen in [`AxisDrive::poll`] on the foreground.
    pub fn drive_to(
        &mut self,
        dest: i16,
        io: &mut impl DriveIo,
        status: &mut StatusRegister,
        vref: &mut VrefDac,
    ) {
        self.abort(io, status);
        self.target = dest;
        if dest == self.position {
            return;
        }
        self.direction = if dest < self.position {
            Direction::TowardHome
        } else {
            Direction::AwayFromHome
        };
        io.dir(self.id, self.direction.away());
        status.sample_limit(io.sensor_port());
        self.start(self.min_speed, io, status, vref);
        self.motion = Motion::Moving { dest };
        debug!("axis {} -> {}", self.id.index(), dest);
    }

    /// One foreground iteration of an active move. Resamples the limit
    /// switches, refuses to travel past the end stop in the commanded
    /// direction, and finishes by disabling the drive once the destination
    /// count is hit or the running bit has been taken away (limit hit,
    /// abort command, or an external status clear).
    pub(crate) fn poll_move(&mut self, io: &mut impl DriveIo, status: &mut StatusRegister) {
        let Motion::Moving { dest } = self.motion else {
            return;
        };
        status.sample_limit(io.sensor_port());
        match self.direction {
            Direction::AwayFromHome if status.far_home(self.id) => status.clear_running(self.id),
            Direction::TowardHome if status.home(self.id) => status.clear_running(self.id),
            _ => {}
        }
        // Exact-count comparison: an overshoot between polls is not
        // recovered here, it keeps stepping until a limit or an abort.
        if self.position == dest || !status.is_running(self.id) {
            self.abort(io, status);
        }
    }
}

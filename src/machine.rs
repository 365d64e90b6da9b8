use arrayvec::ArrayVec;

use crate::config;
use crate::io::DriveIo;
use crate::protocol::{self, Command, DecodeError, Frame, FrameRx};
use crate::status::{StatusRegister, SYS_ERROR};
use crate::stepper::{AxisDrive, Motion};
use crate::vref::VrefDac;
use crate::xyz::{XYZData, XYZId, XYZ_ID_LIST};

/// The whole firmware core behind the transport: three drives, the shared
/// current reference, the status registers and the command plumbing.
///
/// Interrupt entry points ([`Machine::on_byte`], [`Machine::step_compare`])
/// do constant work; everything else, command execution included, runs in
/// [`Machine::poll`] on the foreground. Frames that finish while a move is
/// in flight simply wait in the queue, so the dispatcher never re-enters
/// itself and a later abort can still cancel an active move between polls.
pub struct Machine<IO: DriveIo> {
    io: IO,
    status: StatusRegister,
    vref: VrefDac,
    axes: XYZData<AxisDrive>,
    rx: FrameRx,
    commands: ArrayVec<Frame, { config::COMMAND_QUEUE_DEPTH }>,
    responses: ArrayVec<Frame, { config::RESPONSE_QUEUE_DEPTH }>,
    // Last payload handed to the transport. A read with an unknown selector
    // still owes the host a reply and gets this, replayed verbatim.
    tx_last: Frame,
    home_queue: ArrayVec<XYZId, 3>,
    announce_id: bool,
}

impl<IO: DriveIo> Machine<IO> {
    pub fn new(io: IO) -> Self {
        Self {
            io,
            status: StatusRegister::default(),
            vref: VrefDac::new(),
            axes: XYZData::from_fn(AxisDrive::new),
            rx: FrameRx::default(),
            commands: ArrayVec::new(),
            responses: ArrayVec::new(),
            tx_last: Frame::new(),
            home_queue: ArrayVec::new(),
            announce_id: false,
        }
    }

    /// Receive-interrupt entry point. Accumulates framing and queues the
    /// completed frame for the foreground; with the queue full the frame is
    /// dropped and the generic error bit latches.
    pub fn on_byte(&mut self, byte: u8) {
        if let Some(frame) = self.rx.on_byte(byte) {
            if self.commands.try_push(frame).is_err() {
                self.status.set_system(SYS_ERROR);
                warn!("command queue full, frame dropped");
            }
        }
    }

    /// Compare-match interrupt entry point for one axis timer.
    pub fn step_compare(&mut self, axis: XYZId) {
        self.axes.match_id_mut(axis).step_compare(&mut self.io);
    }

    /// Foreground loop body: advance each drive, feed the homing sequence,
    /// then execute at most one queued command.
    pub fn poll(&mut self) {
        let Self { io, status, axes, .. } = self;
        for id in XYZ_ID_LIST {
            axes.match_id_mut(id).poll(io, status);
        }
        self.advance_home_queue();
        if !self.commands.is_empty() {
            let frame = self.commands.remove(0);
            self.execute(&frame);
        }
    }

    /// Next response payload for the transport, which prepends the length
    /// byte when clocking it out.
    pub fn pop_response(&mut self) -> Option<Frame> {
        if self.responses.is_empty() {
            None
        } else {
            Some(self.responses.remove(0))
        }
    }

    pub fn status(&self) -> &StatusRegister {
        &self.status
    }

    pub fn axis(&self, id: XYZId) -> &AxisDrive {
        self.axes.match_id(id)
    }

    pub fn vref(&self) -> &VrefDac {
        &self.vref
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    fn send(&mut self, payload: &[u8]) {
        let mut frame = Frame::new();
        // Payloads are at most the id string; capacity always holds them.
        let _ = frame.try_extend_from_slice(payload);
        self.tx_last = frame.clone();
        if self.responses.try_push(frame).is_err() {
            self.status.set_system(SYS_ERROR);
            warn!("response queue full, reply dropped");
        }
    }

    fn execute(&mut self, frame: &Frame) {
        match protocol::decode(frame) {
            Ok(command) => self.run(command),
            Err(DecodeError::Unknown) => self.status.latch_invalid_command(),
            Err(DecodeError::UnknownRead) => {
                self.status.latch_invalid_command();
                let last = self.tx_last.clone();
                if self.responses.try_push(last).is_err() {
                    self.status.set_system(SYS_ERROR);
                }
            }
        }
    }

    fn run(&mut self, command: Command) {
        debug!("execute {}", command);
        match command {
            Command::Initialize => self.initialize(),
            Command::AbortAll => self.abort_all(),
            Command::Abort(id) => {
                let Self { io, status, axes, .. } = self;
                axes.match_id_mut(id).abort(io, status);
            }
            Command::DriveTo(id, dest) => {
                let Self { io, status, vref, axes, .. } = self;
                axes.match_id_mut(id).drive_to(dest, io, status, vref);
            }
            Command::HomeAll => {
                // Z first so the tool is clear of the bed before X and Y run.
                self.home_queue.clear();
                let _ = self.home_queue.try_extend_from_slice(&[XYZId::Z, XYZId::X, XYZId::Y]);
            }
            Command::Home(id) => {
                let Self { io, status, vref, axes, .. } = self;
                axes.match_id_mut(id).home_start(io, status, vref);
            }
            Command::WriteVref(id, code) => self.axes.match_id_mut(id).vref = code,
            Command::WriteMaxSpeed(id, speed) => self.axes.match_id_mut(id).max_speed = speed,
            Command::WriteMinSpeed(id, speed) => self.axes.match_id_mut(id).min_speed = speed,
            Command::WritePosition(id, position) => {
                self.axes.match_id_mut(id).position = position
            }
            Command::ReadSystem => {
                let system = self.status.system();
                self.send(&[system]);
            }
            Command::ReadLimit => {
                // Fresh sample, inverted like the register view.
                let raw = self.io.sensor_port();
                self.send(&[!raw]);
            }
            Command::ReadPosition(id) => {
                let position = self.axes.match_id(id).position as u16;
                self.send(&position.to_be_bytes());
            }
            Command::ReadVref(id) => {
                let code = self.axes.match_id(id).vref;
                self.send(&[code]);
            }
            Command::ClearSystem => self.status.clear_all_system(),
            Command::ClearLimit => self.status.clear_all_limit(),
        }
    }

    fn abort_all(&mut self) {
        let Self { io, status, axes, .. } = self;
        for id in XYZ_ID_LIST {
            axes.match_id_mut(id).abort(io, status);
        }
    }

    /// Full bring-up: everything aborted, both registers cleared, drive
    /// modes reasserted, all axes sent home. The id payload goes out once
    /// the homing sequence has drained.
    fn initialize(&mut self) {
        info!("initialize");
        self.abort_all();
        self.status.clear_all_system();
        self.status.clear_all_limit();
        let Self { io, axes, .. } = self;
        for id in XYZ_ID_LIST {
            axes.match_id_mut(id).half_step(io);
        }
        self.home_queue.clear();
        let _ = self.home_queue.try_extend_from_slice(&[XYZId::X, XYZId::Y, XYZId::Z]);
        self.announce_id = true;
    }

    /// Serial homing: the next queued axis starts once nothing is homing,
    /// and the init announcement goes out once the queue is empty and the
    /// machine has gone quiet.
    fn advance_home_queue(&mut self) {
        if self.home_queue.is_empty() {
            if self.announce_id && self.axes.all(|a| a.motion == Motion::Idle) {
                self.announce_id = false;
                self.send(config::FIRMWARE_ID);
            }
            return;
        }
        if self.axes.iter().any(|a| a.motion == Motion::Homing) {
            return;
        }
        let next = self.home_queue.remove(0);
        let Self { io, status, vref, axes, .. } = self;
        axes.match_id_mut(next).home_start(io, status, vref);
    }
}

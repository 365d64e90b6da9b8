use arrayvec::ArrayVec;
use thiserror::Error;

use crate::config::FRAME_CAPACITY;
use crate::xyz::XYZId;

/// Frame payload, without the length prefix the wire carries in front of it.
pub type Frame = ArrayVec<u8, FRAME_CAPACITY>;

/// Inbound framing: one length byte, then that many payload bytes. Fed one
/// byte at a time from the receive interrupt; returns a completed frame.
/// A declared length beyond the buffer keeps consuming but drops the excess,
/// so a babbling host desynchronizes for one frame instead of forever.
#[derive(Default)]
pub struct FrameRx {
    buf: Frame,
    want: u8,
    got: u8,
    in_frame: bool,
}

impl FrameRx {
    pub fn on_byte(&mut self, byte: u8) -> Option<Frame> {
        if !self.in_frame {
            self.want = byte;
            self.got = 0;
            self.buf.clear();
            if byte == 0 {
                return Some(Frame::new());
            }
            self.in_frame = true;
            return None;
        }
        if !self.buf.is_full() {
            self.buf.push(byte);
        }
        self.got += 1;
        if self.got == self.want {
            self.in_frame = false;
            return Some(self.buf.clone());
        }
        None
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Initialize,
    AbortAll,
    Abort(XYZId),
    DriveTo(XYZId, i16),
    HomeAll,
    Home(XYZId),
    WriteVref(XYZId, u8),
    WriteMaxSpeed(XYZId, u16),
    WriteMinSpeed(XYZId, u16),
    WritePosition(XYZId, i16),
    ReadSystem,
    ReadLimit,
    ReadPosition(XYZId),
    ReadVref(XYZId),
    ClearSystem,
    ClearLimit,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized command")]
    Unknown,
    /// Unknown selector under the read family. The dispatcher still owes
    /// the host a reply for these.
    #[error("unrecognized read selector")]
    UnknownRead,
}

/// Decode one command payload. Anything unrecognized at any nesting level
/// comes back as an error for the dispatcher to latch; nothing here touches
/// state.
pub fn decode(frame: &[u8]) -> Result<Command, DecodeError> {
    let axis = |i: usize| frame.get(i).copied().and_then(XYZId::from_opcode);
    let word = |i: usize| Some(u16::from_be_bytes([*frame.get(i)?, *frame.get(i + 1)?]));

    match frame.first().copied() {
        Some(b'I') => Ok(Command::Initialize),
        Some(b'A') => match frame.get(1).copied() {
            Some(b'A') => Ok(Command::AbortAll),
            _ => axis(1).map(Command::Abort).ok_or(DecodeError::Unknown),
        },
        Some(b'S') => match frame.get(1).copied() {
            Some(b'N') => match (axis(2), word(3)) {
                (Some(id), Some(dest)) => Ok(Command::DriveTo(id, dest as i16)),
                _ => Err(DecodeError::Unknown),
            },
            Some(b'H') => match frame.get(2).copied() {
                Some(b'A') => Ok(Command::HomeAll),
                _ => axis(2).map(Command::Home).ok_or(DecodeError::Unknown),
            },
            _ => Err(DecodeError::Unknown),
        },
        Some(b'W') => match (frame.get(1).copied(), axis(2)) {
            (Some(b'V'), Some(id)) => frame
                .get(3)
                .map(|&code| Command::WriteVref(id, code))
                .ok_or(DecodeError::Unknown),
            (Some(b'F'), Some(id)) => word(3)
                .map(|speed| Command::WriteMaxSpeed(id, speed))
                .ok_or(DecodeError::Unknown),
            (Some(b'S'), Some(id)) => word(3)
                .map(|speed| Command::WriteMinSpeed(id, speed))
                .ok_or(DecodeError::Unknown),
            (Some(b'P'), Some(id)) => word(3)
                .map(|pos| Command::WritePosition(id, pos as i16))
                .ok_or(DecodeError::Unknown),
            _ => Err(DecodeError::Unknown),
        },
        Some(b'R') => match frame.get(1).copied() {
            Some(b'S') => Ok(Command::ReadSystem),
            Some(b'L') => Ok(Command::ReadLimit),
            Some(b'P') => axis(2).map(Command::ReadPosition).ok_or(DecodeError::UnknownRead),
            Some(b'V') => axis(2).map(Command::ReadVref).ok_or(DecodeError::UnknownRead),
            _ => Err(DecodeError::UnknownRead),
        },
        Some(b'C') => match frame.get(1).copied() {
            Some(b'S') => Ok(Command::ClearSystem),
            Some(b'L') => Ok(Command::ClearLimit),
            _ => Err(DecodeError::Unknown),
        },
        _ => Err(DecodeError::Unknown),
    }
}

//! Command table and dispatcher
//!
//! One closed command enumeration serves both input origins: binary frames
//! from the streaming parser and ASCII console lines. Origin-specific
//! decoding is a conversion step into a normalized parameter list; dispatch
//! itself is a single match over the enum, so the two paths cannot drift
//! out of sync.
//!
//! Every command validates its own parameter count and values, rejecting
//! with a logged error and no side effect on mismatch; the caller is not
//! trusted to have checked.

use heapless::Vec;

use crate::config::CFG_MAX_PARAMS;
use crate::error::{DiagError, DiagResult};
use crate::types::CmdId;
use crate::{error, warn};

/// PWM frequency fallback when the requested value is out of range
pub const PWM_DEFAULT_FREQ_HZ: u32 = 1_000;

/// Highest accepted PWM frequency
pub const PWM_MAX_FREQ_HZ: u32 = 10_000;

/// The command set
///
/// Identifiers are dense and contiguous; extend by appending before the
/// terminal sentinel. `COUNT` doubles as the INVALID marker: any wire
/// identifier at or past it is rejected before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Turn the indicator output on
    IndicatorOn = 0,
    /// Turn the indicator output off
    IndicatorOff = 1,
    /// Drive an indicator selected by number
    IndicatorSet = 2,
    /// Transmit a raw string over the secondary serial channel
    SerialSend = 3,
    /// Configure a PWM channel's duty and frequency
    PwmConfig = 4,
    /// Deliberately hang forever to exercise watchdog recovery
    DiagHang = 5,
}

impl Command {
    /// Number of commands; also the INVALID rejection sentinel
    pub const COUNT: CmdId = 6;

    /// Decode a wire identifier, rejecting anything at or past the sentinel
    pub fn from_id(id: CmdId) -> Option<Command> {
        match id {
            0 => Some(Command::IndicatorOn),
            1 => Some(Command::IndicatorOff),
            2 => Some(Command::IndicatorSet),
            3 => Some(Command::SerialSend),
            4 => Some(Command::PwmConfig),
            5 => Some(Command::DiagHang),
            _ => None,
        }
    }

    /// Console command word (canonical, upper case)
    pub fn name(self) -> &'static str {
        match self {
            Command::IndicatorOn => "LED_ON",
            Command::IndicatorOff => "LED_OFF",
            Command::IndicatorSet => "SET_LED",
            Command::SerialSend => "UART_TX",
            Command::PwmConfig => "PWM_ON",
            Command::DiagHang => "CRASH",
        }
    }

    /// Look up a console command word, case-insensitively
    pub fn from_name(word: &[u8]) -> Option<Command> {
        for id in 0..Self::COUNT {
            let cmd = Command::from_id(id)?;
            if word.eq_ignore_ascii_case(cmd.name().as_bytes()) {
                return Some(cmd);
            }
        }
        None
    }
}

/// One normalized parameter, whatever the input origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param<'a> {
    /// Numeric argument (decoded console token or raw payload byte)
    Number(u32),
    /// Uninterpreted bytes (console token or serial payload)
    Bytes(&'a [u8]),
}

impl<'a> Param<'a> {
    /// The parameter as a number, or a value error
    pub fn as_number(&self) -> DiagResult<u32> {
        match self {
            Param::Number(n) => Ok(*n),
            Param::Bytes(_) => Err(DiagError::CmdArgValue),
        }
    }
}

/// Normalized parameter list
pub type Params<'a> = Vec<Param<'a>, CFG_MAX_PARAMS>;

/// Device-effecting operations behind the command set
///
/// The firmware integration maps these onto GPIO, UART, and timer
/// peripherals; tests substitute a recording mock.
pub trait DeviceOps {
    fn indicator_on(&mut self);
    fn indicator_off(&mut self);

    /// Drive the indicator selected by `which`. Which numbers exist is
    /// device-defined; unknown selectors are accepted and ignored.
    fn indicator_set(&mut self, which: u32);

    /// Transmit `bytes` over the secondary serial channel
    fn serial_send(&mut self, bytes: &[u8]);

    /// Reconfigure the PWM channel. `duty` is 0..=100; the dispatcher has
    /// already clamped out-of-range requests.
    fn pwm_config(&mut self, duty: u8, freq_hz: u32);

    /// Enter a deliberate non-returning busy-wait so the external watchdog
    /// resets the system. Does not return on hardware.
    fn diag_hang(&mut self);
}

/// Dispatch one command to exactly one handler
///
/// Dispatch errors are logged and leave the device untouched; execution
/// continues at the caller.
pub fn dispatch<D: DeviceOps>(dev: &mut D, cmd: Command, params: &[Param<'_>]) -> DiagResult<()> {
    match cmd {
        Command::IndicatorOn => {
            expect_params(cmd, params, 0)?;
            dev.indicator_on();
        }

        Command::IndicatorOff => {
            expect_params(cmd, params, 0)?;
            dev.indicator_off();
        }

        Command::IndicatorSet => {
            expect_params(cmd, params, 1)?;
            dev.indicator_set(params[0].as_number()?);
        }

        Command::SerialSend => {
            expect_params(cmd, params, 1)?;
            match params[0] {
                Param::Bytes(bytes) => dev.serial_send(bytes),
                Param::Number(_) => return Err(DiagError::CmdArgValue),
            }
        }

        Command::PwmConfig => {
            expect_params(cmd, params, 2)?;
            let mut duty = params[0].as_number()?;
            let freq = params[1].as_number()?;

            if duty > 100 {
                duty = 100;
                warn!("pwm: duty clamped to 100");
            }
            let freq = if freq > PWM_MAX_FREQ_HZ {
                warn!("pwm: freq out of range, using default");
                PWM_DEFAULT_FREQ_HZ
            } else {
                freq
            };

            dev.pwm_config(duty as u8, freq);
        }

        Command::DiagHang => {
            expect_params(cmd, params, 0)?;
            dev.diag_hang();
        }
    }

    Ok(())
}

fn expect_params(cmd: Command, params: &[Param<'_>], expected: usize) -> DiagResult<()> {
    if params.len() != expected {
        error!(
            "cmd {=str}: bad parameter count {=usize}, expected {=usize}",
            cmd.name(),
            params.len(),
            expected
        );
        return Err(DiagError::CmdArgCount);
    }
    Ok(())
}

// ============ Binary origin ============

/// Dispatch a validated frame payload (CMD byte plus raw parameters)
///
/// Normalization mirrors the wire encoding: `SerialSend` takes the rest of
/// the payload as one byte-string parameter; every other command takes one
/// numeric parameter per payload byte.
pub fn dispatch_binary<D: DeviceOps>(dev: &mut D, payload: &[u8]) -> DiagResult<()> {
    let (&id, raw) = payload.split_first().ok_or(DiagError::CmdUnknown)?;
    let cmd = Command::from_id(id).ok_or_else(|| {
        error!("binary cmd invalid: {=u8}", id);
        DiagError::CmdUnknown
    })?;

    let mut params = Params::new();

    if cmd == Command::SerialSend {
        params
            .push(Param::Bytes(raw))
            .map_err(|_| DiagError::CmdTooManyArgs)?;
    } else {
        for &b in raw {
            params
                .push(Param::Number(b as u32))
                .map_err(|_| DiagError::CmdTooManyArgs)?;
        }
    }

    dispatch(dev, cmd, &params)
}

// ============ Line origin ============

/// Dispatch one console line: a command word and space-separated parameters
///
/// Decimal tokens normalize to numbers, anything else stays raw bytes.
/// Same table, same identifiers, same handlers as the binary path.
pub fn dispatch_line<D: DeviceOps>(dev: &mut D, line: &[u8]) -> DiagResult<()> {
    let mut tokens = line
        .split(|&b| b == b' ')
        .filter(|t| !t.is_empty());

    let word = tokens.next().ok_or(DiagError::CmdUnknownName)?;
    let cmd = Command::from_name(word).ok_or_else(|| {
        error!("invalid command word");
        DiagError::CmdUnknownName
    })?;

    let mut params = Params::new();
    for token in tokens {
        let param = match parse_decimal(token) {
            Some(n) => Param::Number(n),
            None => Param::Bytes(token),
        };
        params.push(param).map_err(|_| DiagError::CmdTooManyArgs)?;
    }

    dispatch(dev, cmd, &params)
}

fn parse_decimal(token: &[u8]) -> Option<u32> {
    if token.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for &b in token {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as u32)?;
    }
    Some(value)
}

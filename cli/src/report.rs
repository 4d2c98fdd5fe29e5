//! Printing why each processor stopped.
use std::io::Write;

use termcolor::{self, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::{event, Level};

use cpu::{ProcessorStatus, StopReason};

fn get_colour_choice() -> termcolor::ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Green for a program which stopped itself, yellow for one the
/// emulator or operator stopped, red for anything else.
fn stop_colour(reason: StopReason) -> termcolor::Color {
    use StopReason::*;
    match reason {
        Debug | HaltJumpExecuted | InitiateAutoRecovery => termcolor::Color::Green,
        Development | PanelHalt | Breakpoint | Initial | Cleared => termcolor::Color::Yellow,
        _ => termcolor::Color::Red,
    }
}

pub struct StopReporter {
    stream: StandardStream,
}

impl StopReporter {
    pub fn new() -> StopReporter {
        StopReporter {
            stream: StandardStream::stdout(get_colour_choice()),
        }
    }

    fn set_colour(&mut self, colour: Option<termcolor::Color>) {
        let mut spec = ColorSpec::new();
        spec.set_fg(colour).set_bold(colour.is_some());
        if let Err(e) = self.stream.set_color(&spec) {
            event!(Level::ERROR, "Failed to select colour {:?}: {}", spec, e);
        }
    }

    pub fn report(&mut self, status: &ProcessorStatus) -> Result<(), std::io::Error> {
        write!(self.stream, "UPI {}: ", status.upi)?;
        self.set_colour(Some(stop_colour(status.stop_reason)));
        write!(self.stream, "{}", status.stop_reason)?;
        self.stream.reset()?;
        write!(
            self.stream,
            " detail {:06o} at {} after {} cycles",
            status.stop_detail, status.program_address, status.cycles
        )?;
        if let Some(interrupt) = &status.last_interrupt {
            write!(self.stream, "; last interrupt {interrupt}")?;
        }
        writeln!(self.stream)?;
        self.stream.flush()
    }
}

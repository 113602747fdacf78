use std::io::Write;

/// Kick notification boundary. Implementations must not block the tick.
pub trait CueSink {
    fn play_cue(&mut self);
}

impl<C: CueSink + ?Sized> CueSink for Box<C> {
    fn play_cue(&mut self) {
        (**self).play_cue()
    }
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl CueSink for TerminalBell {
    fn play_cue(&mut self) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

#[derive(Debug, Default)]
pub struct SilentCue;

impl CueSink for SilentCue {
    fn play_cue(&mut self) {}
}

/// Counts cues; lets tests assert one cue per kick.
#[derive(Debug, Default)]
pub struct CountingCue {
    pub played: usize,
}

impl CueSink for CountingCue {
    fn play_cue(&mut self) {
        self.played += 1;
    }
}

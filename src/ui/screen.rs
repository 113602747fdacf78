use ratatui::Frame;

use kickr::render::{AnnotatedFrame, Hud};

use crate::ui::{
    history_table::{render_history, HistoryView},
    GameView, Scorecard,
};

/// A UI Screen boundary: each screen borrows the state it draws
pub trait Screen {
    fn render(&mut self, f: &mut Frame);
}

/// Game screen - camera view with the ball, knee markers and HUD
pub struct GameScreen<'a> {
    pub frame: &'a AnnotatedFrame,
    pub hud: &'a Hud,
}

impl Screen for GameScreen<'_> {
    fn render(&mut self, f: &mut Frame) {
        let view = GameView {
            frame: self.frame,
            hud: self.hud,
        };
        f.render_widget(&view, f.area());
    }
}

/// Scorecard screen - renders the end-of-session summary widget
pub struct ScorecardScreen<'a> {
    pub card: &'a Scorecard,
}

impl Screen for ScorecardScreen<'_> {
    fn render(&mut self, f: &mut Frame) {
        f.render_widget(self.card, f.area());
    }
}

/// History screen - uses dedicated renderer
pub struct HistoryScreen<'a> {
    pub view: &'a mut HistoryView,
}

impl Screen for HistoryScreen<'_> {
    fn render(&mut self, f: &mut Frame) {
        render_history(self.view, f);
    }
}

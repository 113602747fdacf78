pub mod charting;
pub mod history_table;
pub mod screen;

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle},
        Axis, Chart, Dataset, GraphType, Paragraph, Widget,
    },
    Terminal,
};

use kickr::{
    ball::{Side, BALL_RADIUS, GLOW_HALO},
    config::SessionConfig,
    error::Result,
    render::{
        AnnotatedFrame, Hud, Renderer, BALL_COLOR, HALO_COLOR, KNEE_MARKER_RADIUS,
        LEFT_KNEE_COLOR, RIGHT_KNEE_COLOR,
    },
    session::SessionResult,
};

use crate::ui::screen::{GameScreen, Screen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn rgb(c: [u8; 3]) -> Color {
    Color::Rgb(c[0], c[1], c[2])
}

/// Draws game frames into a ratatui terminal. The other screens go through
/// [`TerminalRenderer::draw_screen`] on the same terminal.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    pub fn draw_screen(&mut self, screen: &mut dyn Screen) -> Result<()> {
        self.terminal.draw(|f| screen.render(f))?;
        Ok(())
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, frame: &AnnotatedFrame, hud: &Hud) -> Result<()> {
        self.draw_screen(&mut GameScreen { frame, hud })
    }
}

/// The annotated frame as canvas shapes, with the HUD on top.
pub struct GameView<'a> {
    pub frame: &'a AnnotatedFrame,
    pub hud: &'a Hud,
}

impl Widget for &GameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // hud
                Constraint::Min(1),    // camera view
                Constraint::Length(1), // legend
            ])
            .split(area);

        let hud = Paragraph::new(Line::from(vec![
            Span::styled(self.hud.time_text(), bold_style),
            Span::raw("    "),
            Span::styled(self.hud.kicks_text(), bold_style.fg(Color::Yellow)),
        ]))
        .alignment(Alignment::Center);
        hud.render(chunks[0], buf);

        let width = self.frame.width() as f64;
        let height = self.frame.height() as f64;

        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(|ctx| {
                // canvas y grows upwards, image y downwards
                if let Some(ball) = self.frame.ball {
                    let y = height - ball.center.y;
                    if ball.glow {
                        ctx.draw(&Circle {
                            x: ball.center.x,
                            y,
                            radius: BALL_RADIUS + GLOW_HALO,
                            color: rgb(HALO_COLOR),
                        });
                    }
                    ctx.draw(&Circle {
                        x: ball.center.x,
                        y,
                        radius: ball.radius,
                        color: rgb(BALL_COLOR),
                    });
                }

                if let Some(knees) = self.frame.knees {
                    for (side, knee, color) in [
                        (Side::Left, knees.left, LEFT_KNEE_COLOR),
                        (Side::Right, knees.right, RIGHT_KNEE_COLOR),
                    ] {
                        ctx.draw(&Circle {
                            x: knee.x,
                            y: height - knee.y,
                            radius: KNEE_MARKER_RADIUS,
                            color: rgb(color),
                        });
                        if side == knees.tracked {
                            ctx.print(
                                knee.x,
                                height - knee.y,
                                Span::styled("●", Style::default().fg(rgb(color))),
                            );
                        }
                    }
                }
            });
        canvas.render(chunks[1], buf);

        let legend = Paragraph::new(Span::styled(
            "(r)estart / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ));
        legend.render(chunks[2], buf);
    }
}

/// End-of-session summary shown after the timer runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub config: SessionConfig,
    pub result: SessionResult,
    /// Best kick count for the same setup before this session
    pub personal_best: Option<u32>,
}

impl Scorecard {
    pub fn is_new_best(&self) -> bool {
        self.result.total_kicks > 0
            && self
                .personal_best
                .map_or(true, |best| self.result.total_kicks > best)
    }

    pub fn stats_line(&self) -> String {
        format!(
            "{} kicks   {:.2}s avg   {:.2}s best   {:.2} sd   {}s played",
            self.result.total_kicks,
            self.result.average_kick_time(),
            self.result.best_kick_time(),
            self.result.kick_time_spread(),
            self.result.duration,
        )
    }

    pub fn best_line(&self) -> String {
        if self.is_new_best() {
            return "new personal best!".to_string();
        }
        match self.personal_best {
            Some(best) => format!("personal best: {best} kicks"),
            None => "no personal best yet".to_string(),
        }
    }
}

impl Widget for &Scorecard {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let magenta_style = Style::default().fg(Color::Magenta);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),    // chart
                Constraint::Length(1), // stats
                Constraint::Length(1), // personal best
                Constraint::Length(1), // settings
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ])
            .split(area);

        let (overall_kicks, slowest) =
            crate::ui::charting::compute_chart_params(&self.result.kick_times);
        let points = crate::ui::charting::kick_time_points(&self.result.kick_times);
        let datasets = vec![Dataset::default()
            .marker(Marker::Braille)
            .style(magenta_style)
            .graph_type(GraphType::Line)
            .data(&points)];

        let chart = Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("kick")
                    .bounds([1.0, overall_kicks])
                    .labels(vec![
                        Span::styled("1", bold_style),
                        Span::styled(crate::ui::charting::format_label(overall_kicks), bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, slowest])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(crate::ui::charting::format_label(slowest), bold_style),
                    ]),
            );
        chart.render(chunks[0], buf);

        Paragraph::new(Span::styled(self.stats_line(), bold_style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let best_style = if self.is_new_best() {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)
        };
        Paragraph::new(Span::styled(self.best_line(), best_style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        Paragraph::new(Span::styled(
            format!(
                "{} · difficulty {} · {}s",
                self.config.posture, self.config.difficulty, self.config.duration_secs
            ),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

        Paragraph::new(Span::styled("(r)etry / (h)istory / (esc)ape", italic_style))
            .render(chunks[5], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kickr::capture::Frame;
    use kickr::config::{Difficulty, Posture};
    use kickr::geometry::Point;
    use kickr::render::{BallMarker, KneeMarkers};
    use ratatui::backend::TestBackend;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    fn scorecard(kicks: &[f64], personal_best: Option<u32>) -> Scorecard {
        Scorecard {
            config: SessionConfig::new(Posture::Standing, Difficulty::Medium, 30),
            result: SessionResult {
                total_kicks: kicks.len() as u32,
                kick_times: kicks.to_vec(),
                duration: 30,
            },
            personal_best,
        }
    }

    #[test]
    fn test_renderer_draws_hud() {
        let mut renderer = TerminalRenderer::new(Terminal::new(TestBackend::new(80, 24)).unwrap());
        let frame = AnnotatedFrame {
            frame: Frame::blank(0, 640, 480),
            ball: Some(BallMarker {
                center: Point::new(240.0, 264.0),
                radius: 38.5,
                glow: true,
            }),
            knees: Some(KneeMarkers {
                left: Point::new(290.0, 384.0),
                right: Point::new(350.0, 384.0),
                tracked: Side::Left,
            }),
        };
        let hud = Hud {
            time_left: 17,
            kicks: 4,
        };

        renderer.render(&frame, &hud).unwrap();

        let text = buffer_text(renderer.terminal().backend().buffer());
        assert!(text.contains("TIME: 17s"));
        assert!(text.contains("KICKS: 4"));
        assert!(text.contains("(esc)ape"));
    }

    #[test]
    fn test_renderer_handles_frame_without_overlay() {
        let mut renderer = TerminalRenderer::new(Terminal::new(TestBackend::new(40, 10)).unwrap());
        let frame = AnnotatedFrame {
            frame: Frame::blank(0, 64, 48),
            ball: None,
            knees: None,
        };
        renderer.render(&frame, &Hud::default()).unwrap();
        assert!(buffer_text(renderer.terminal().backend().buffer()).contains("KICKS: 0"));
    }

    #[test]
    fn test_scorecard_best_line() {
        assert_eq!(scorecard(&[1.0; 5], Some(3)).best_line(), "new personal best!");
        assert_eq!(scorecard(&[1.0; 5], None).best_line(), "new personal best!");
        assert_eq!(scorecard(&[1.0; 2], Some(3)).best_line(), "personal best: 3 kicks");
        assert_eq!(scorecard(&[1.0; 3], Some(3)).best_line(), "personal best: 3 kicks");
        assert_eq!(scorecard(&[], None).best_line(), "no personal best yet");
    }

    #[test]
    fn test_scorecard_empty_session_shows_zeroes() {
        let card = scorecard(&[], None);
        assert_eq!(card.stats_line(), "0 kicks   0.00s avg   0.00s best   0.00 sd   30s played");
    }

    #[test]
    fn test_scorecard_widget() {
        let card = scorecard(&[1.5, 0.75, 1.0], Some(2));
        let area = Rect::new(0, 0, 100, 24);
        let mut buffer = Buffer::empty(area);

        (&card).render(area, &mut buffer);

        let text = buffer_text(&buffer);
        assert!(text.contains("3 kicks"));
        assert!(text.contains("0.75s best"));
        assert!(text.contains("new personal best!"));
        assert!(text.contains("standing · difficulty 2 · 30s"));
        assert!(text.contains("(r)etry / (h)istory / (esc)ape"));
    }

    #[test]
    fn test_scorecard_widget_small_area() {
        let card = scorecard(&[1.0], None);
        let area = Rect::new(0, 0, 20, 5);
        let mut buffer = Buffer::empty(area);
        (&card).render(area, &mut buffer);
        assert!(*buffer.area() == area);
    }
}

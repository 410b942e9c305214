use crate::client::{
    AppSnapshot,
    CellId,
};
use color_eyre::eyre::Result;
use crossterm::event::{
    self,
    Event,
    KeyCode,
    KeyEventKind,
};
use crossterm::terminal::{
    disable_raw_mode,
    enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::io::stdout;

pub enum UserEvent {
    Quit,
    Connect,
    Dig,
    SelectCell(CellId),
    DismissAck,
    Redraw,
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    AckModal,
    QuitModal,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    // Create a single persistent Terminal to preserve buffers across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    // keep the acknowledgement modal in step with the snapshot
    if snap.ack.is_some() {
        if matches!(state.mode, Mode::Normal) {
            state.mode = Mode::AckModal;
        }
    } else if matches!(state.mode, Mode::AckModal) {
        state.mode = Mode::Normal;
    }
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub async fn next_event(state: &mut UiState) -> Result<UserEvent> {
    loop {
        if let Event::Key(k) = event::read()? {
            if k.kind != KeyEventKind::Press {
                continue;
            }
            // Modal handling
            match &state.mode {
                Mode::AckModal => {
                    match k.code {
                        KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                            state.mode = Mode::Normal;
                            return Ok(UserEvent::DismissAck);
                        }
                        _ => {}
                    }
                    continue;
                }
                Mode::QuitModal => {
                    match k.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') => {
                            return Ok(UserEvent::Quit);
                        }
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                            state.mode = Mode::Normal;
                            return Ok(UserEvent::Redraw);
                        }
                        _ => {}
                    }
                    continue;
                }
                Mode::Normal => {}
            }
            return Ok(match k.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    state.mode = Mode::QuitModal;
                    UserEvent::Redraw
                }
                KeyCode::Char('c') => UserEvent::Connect,
                KeyCode::Char('d') | KeyCode::Enter => UserEvent::Dig,
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    let d = c.to_digit(10).unwrap() as u8;
                    match CellId::new(d) {
                        Some(cell) => UserEvent::SelectCell(cell),
                        None => continue,
                    }
                }
                _ => continue,
            });
        }
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    // Clear the whole frame to avoid leftover fragments
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // title + account + status
            Constraint::Min(9),    // 3x3 grid
            Constraint::Length(3), // treasure chance
            Constraint::Length(3), // dig control
            Constraint::Length(6), // errors + help
        ])
        .split(f.area());

    draw_top(f, chunks[0], snap);
    draw_grid(f, chunks[1], snap);
    draw_chance(f, chunks[2], snap);
    draw_dig_control(f, chunks[3], snap);
    draw_bottom(f, chunks[4], snap);
    draw_modals(f, state, snap);
}

fn draw_top(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let account_line = match snap.account {
        Some(address) => format!("Connected Account: {address:#x}"),
        None => String::from("No wallet connected. Press c to connect."),
    };
    let header = Paragraph::new(format!("{account_line}\n{}", snap.status)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Treasure Hunt 3x3 Grid"),
    );
    f.render_widget(header, area);
}

fn draw_grid(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let col_w = area.width / 3;
    let row_h = area.height / 3;
    for index in 0..9u8 {
        let row = u16::from(index / 3);
        let col = u16::from(index % 3);
        let rect = Rect::new(area.x + col * col_w, area.y + row * row_h, col_w, row_h);

        let cell = index + 1;
        let selected = snap.selection.map(CellId::get) == Some(cell);
        let label = if selected { "Selected" } else { "Select" };
        let style = if selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!("Cell {cell}"), style));
        f.render_widget(&block, rect);
        let inner = block.inner(rect);
        f.render_widget(Paragraph::new(Line::styled(label, style)), inner);
    }
}

fn draw_chance(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let chance = Paragraph::new(format!("Treasure chance: {}%", snap.chance))
        .block(Block::default().borders(Borders::ALL).title("Chance"));
    f.render_widget(chance, area);
}

fn draw_dig_control(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let label = if snap.busy {
        "Digging..."
    } else {
        "Dig for Treasure (d)"
    };
    let style = if !snap.busy && snap.can_dig {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let control = Paragraph::new(Line::styled(label, style))
        .block(Block::default().borders(Borders::ALL).title("Dig"));
    f.render_widget(control, area);
}

fn draw_bottom(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    if snap.errors.is_empty() {
        lines.push(Line::from("No errors"));
    } else {
        for e in &snap.errors {
            lines.push(Line::from(e.clone()));
        }
    }
    let errors = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Errors"));
    let color = if snap.errors.is_empty() {
        Color::DarkGray
    } else {
        Color::Red
    };
    f.render_widget(errors.style(Style::default().fg(color)), chunks[0]);

    let help = Paragraph::new("1-9 select cell | c connect wallet | d/Enter dig | q/Esc quit")
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[1]);
}

fn draw_modals(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    match &state.mode {
        Mode::AckModal => {
            let area = centered_rect(44, 22, f.area());
            let block = Block::default().borders(Borders::ALL).title("Treasure");
            let text = snap.ack.clone().unwrap_or_default();
            let p = Paragraph::new(format!("{text}\nEnter=dismiss"));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit the game? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}

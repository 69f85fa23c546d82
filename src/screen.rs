use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, Months};
use crossterm::event::{self, DisableFocusChange, EnableFocusChange, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::Config;
use crate::fields::{FIELD_COUNT, FieldStore};
use crate::rows::{HostCommand, PickerState, RowContent, RowController, TimeRange};

// The picker row renders as three lines: the segment editor, the lower
// bound, and a key hint.
const PICKER_ROW_HEIGHT: u16 = 3;
const ACTIVE_SEGMENT_COLOR: Color = Color::Yellow;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);

pub fn run_picker(config: &Config) -> Result<Option<TimeRange>, Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	stdout.execute(EnableFocusChange)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, config);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	config: &Config,
) -> Result<Option<TimeRange>, Box<dyn Error>> {
	let store = FieldStore::new(config.interval_minutes, config.span_minutes, Local::now());
	let mut app = App::new(store, config.use_24_hour_clock);

	loop {
		terminal.draw(|frame| draw_picker(frame, &app))?;

		if event::poll(StdDuration::from_millis(250))? {
			match event::read()? {
				CEvent::Key(key) if key.kind == KeyEventKind::Press => {
					match handle_key(&mut app, key.code) {
						KeyOutcome::Accept => return Ok(Some(app.controller.current_range())),
						KeyOutcome::Cancel => return Ok(None),
						KeyOutcome::Continue => {}
					}
				}
				// Returning to the screen counts as an appearance: if real
				// time has passed the chosen Start, both fields re-sync.
				CEvent::FocusGained => {
					if app.controller.store_mut().resync_times(Local::now()) {
						app.status = "times re-synced to the current clock".to_string();
					}
				}
				_ => {}
			}
		}
	}
}

fn handle_key(app: &mut App, code: KeyCode) -> KeyOutcome {
	match code {
		KeyCode::Char('q') => KeyOutcome::Cancel,
		KeyCode::Esc => {
			if let Some(open_row) = app.controller.picker_row() {
				// Tapping the owning field is how the controller closes.
				let commands = app.controller.row_tapped(open_row - 1);
				app.apply_commands(&commands);
				app.status = "picker closed".to_string();
				KeyOutcome::Continue
			} else {
				KeyOutcome::Cancel
			}
		}
		KeyCode::Char('a') => KeyOutcome::Accept,
		KeyCode::Enter => {
			app.toggle_picker();
			KeyOutcome::Continue
		}
		KeyCode::Up => {
			if app.controller.picker_row().is_some() {
				app.adjust_picker_value(1);
			} else {
				app.move_cursor(-1);
			}
			KeyOutcome::Continue
		}
		KeyCode::Down => {
			if app.controller.picker_row().is_some() {
				app.adjust_picker_value(-1);
			} else {
				app.move_cursor(1);
			}
			KeyOutcome::Continue
		}
		KeyCode::Char('k') => {
			app.move_cursor(-1);
			KeyOutcome::Continue
		}
		KeyCode::Char('j') => {
			app.move_cursor(1);
			KeyOutcome::Continue
		}
		KeyCode::Left | KeyCode::Char('h') => {
			if app.controller.picker_row().is_some() {
				app.segment = app.segment.prev();
			}
			KeyOutcome::Continue
		}
		KeyCode::Right | KeyCode::Char('l') => {
			if app.controller.picker_row().is_some() {
				app.segment = app.segment.next();
			}
			KeyOutcome::Continue
		}
		KeyCode::Char('t') => {
			app.use_24_hour_clock = !app.use_24_hour_clock;
			let commands = app.controller.locale_changed();
			app.apply_commands(&commands);
			app.status = if app.use_24_hour_clock {
				"24-hour clock".to_string()
			} else {
				"12-hour clock".to_string()
			};
			KeyOutcome::Continue
		}
		KeyCode::Char('r') => {
			if app.controller.store_mut().resync_times(Local::now()) {
				app.status = "times re-synced to the current clock".to_string();
			} else {
				app.status = "times are already current".to_string();
			}
			KeyOutcome::Continue
		}
		_ => KeyOutcome::Continue,
	}
}

fn draw_picker(frame: &mut Frame, app: &App) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Length(app.panel_height + 2),
			Constraint::Min(4),
			Constraint::Length(4),
		])
		.split(frame.area());

	render_row_list(frame, layout[0], app);
	render_range_summary(frame, layout[1], app);
	render_footer(frame, layout[2], app);
}

fn render_row_list(frame: &mut Frame, area: Rect, app: &App) {
	let mut items = Vec::new();
	for row in 0..app.controller.row_count() {
		match app.controller.row_content(row) {
			RowContent::Field { title, date } => {
				items.push(ListItem::new(Line::from(vec![
					Span::raw(format!("{title:<12}")),
					Span::styled(
						format_field_date(date, app.use_24_hour_clock),
						Style::default().add_modifier(Modifier::BOLD),
					),
				])));
			}
			RowContent::Picker { current, minimum } => {
				items.push(ListItem::new(vec![
					render_segment_line(current, app.segment, app.use_24_hour_clock),
					Line::from(Span::styled(
						format!(
							"  not before {}",
							format_field_date(minimum, app.use_24_hour_clock)
						),
						Style::default().fg(Color::DarkGray),
					)),
					Line::from(Span::styled(
						"  h/l segment | Up/Down adjust | Enter close",
						Style::default().fg(Color::DarkGray),
					)),
				]));
			}
		}
	}

	let mut state = ListState::default();
	state.select(Some(app.controller.display_row_for_field(app.cursor)));

	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title("Time Range"))
		.highlight_style(
			Style::default()
				.bg(HIGHLIGHT_BACKGROUND_COLOR)
				.add_modifier(Modifier::BOLD),
		);

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_segment_line(
	current: DateTime<Local>,
	active: PickerSegment,
	use_24_hour_clock: bool,
) -> Line<'static> {
	let hour_text = if use_24_hour_clock {
		current.format("%H").to_string()
	} else {
		current.format("%-I").to_string()
	};

	let mut spans = vec![Span::raw("  ")];
	let segments = [
		(PickerSegment::Month, current.format("%b").to_string(), " "),
		(PickerSegment::Day, current.format("%-d").to_string(), ", "),
	];
	for (segment, text, trailer) in segments {
		spans.push(Span::styled(text, segment_style(segment == active)));
		spans.push(Span::raw(trailer.to_string()));
	}
	spans.push(Span::raw(current.format("%Y  ").to_string()));
	spans.push(Span::styled(
		hour_text,
		segment_style(active == PickerSegment::Hour),
	));
	spans.push(Span::raw(":"));
	spans.push(Span::styled(
		current.format("%M").to_string(),
		segment_style(active == PickerSegment::Minute),
	));
	if !use_24_hour_clock {
		spans.push(Span::raw(current.format(" %p").to_string()));
	}

	Line::from(spans)
}

fn segment_style(is_active: bool) -> Style {
	if is_active {
		Style::default()
			.fg(ACTIVE_SEGMENT_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default()
	}
}

fn render_range_summary(frame: &mut Frame, area: Rect, app: &App) {
	let range = app.controller.current_range();
	let lines = vec![
		Line::from(format!(
			"start  {}",
			format_field_date(range.start, app.use_24_hour_clock)
		)),
		Line::from(format!(
			"end    {}",
			format_field_date(range.end, app.use_24_hour_clock)
		)),
		Line::from(format!("length {}", format_length(range.end - range.start))),
	];

	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Selection"));
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let hints = if app.controller.picker_row().is_some() {
		"h/l segment | Up/Down adjust | Enter/Esc close | j/k switch field"
	} else {
		"j/k select field | Enter open picker | a accept | t clock | r re-sync | q quit"
	};

	let footer = Paragraph::new(vec![Line::from(hints), Line::from(app.status.clone())])
		.block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn format_field_date(date: DateTime<Local>, use_24_hour_clock: bool) -> String {
	if use_24_hour_clock {
		date.format("%b %-d, %Y  %H:%M").to_string()
	} else {
		date.format("%b %-d, %Y  %-I:%M %p").to_string()
	}
}

fn format_length(length: Duration) -> String {
	let total_minutes = length.num_minutes().max(0);
	format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// Steps one segment of the picker value, carrying through calendar
/// boundaries. Minutes move in whole rounding intervals; a month step keeps
/// the day clamped to the target month's length.
fn step_picker_date(
	current: DateTime<Local>,
	segment: PickerSegment,
	delta: i32,
	interval_minutes: u32,
) -> DateTime<Local> {
	let stepped = match segment {
		PickerSegment::Month => {
			if delta >= 0 {
				current.checked_add_months(Months::new(1))
			} else {
				current.checked_sub_months(Months::new(1))
			}
		}
		PickerSegment::Day => current.checked_add_signed(Duration::days(delta.into())),
		PickerSegment::Hour => current.checked_add_signed(Duration::hours(delta.into())),
		PickerSegment::Minute => current.checked_add_signed(Duration::minutes(
			i64::from(delta) * i64::from(interval_minutes),
		)),
	};

	stepped.unwrap_or(current)
}

enum KeyOutcome {
	Continue,
	Accept,
	Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickerSegment {
	Month,
	Day,
	Hour,
	Minute,
}

impl PickerSegment {
	fn next(self) -> Self {
		match self {
			PickerSegment::Month => PickerSegment::Day,
			PickerSegment::Day => PickerSegment::Hour,
			PickerSegment::Hour => PickerSegment::Minute,
			PickerSegment::Minute => PickerSegment::Month,
		}
	}

	fn prev(self) -> Self {
		match self {
			PickerSegment::Month => PickerSegment::Minute,
			PickerSegment::Day => PickerSegment::Month,
			PickerSegment::Hour => PickerSegment::Day,
			PickerSegment::Minute => PickerSegment::Hour,
		}
	}
}

struct App {
	controller: RowController,
	cursor: usize,
	segment: PickerSegment,
	use_24_hour_clock: bool,
	panel_height: u16,
	status: String,
}

impl App {
	fn new(store: FieldStore, use_24_hour_clock: bool) -> Self {
		let controller = RowController::new(store, PICKER_ROW_HEIGHT);
		let panel_height = controller.content_height();
		Self {
			controller,
			cursor: 0,
			segment: PickerSegment::Minute,
			use_24_hour_clock,
			panel_height,
			status: "Ready".to_string(),
		}
	}

	fn move_cursor(&mut self, delta: i32) {
		if delta > 0 {
			self.cursor = (self.cursor + delta as usize).min(FIELD_COUNT - 1);
		} else {
			self.cursor = self.cursor.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn toggle_picker(&mut self) {
		let row = self.controller.display_row_for_field(self.cursor);
		let commands = self.controller.row_tapped(row);
		self.apply_commands(&commands);

		match self.controller.picker_state() {
			PickerState::OpenAt(_) => {
				self.segment = PickerSegment::Minute;
				self.status = format!("editing {}", self.controller.store().field(self.cursor).title);
			}
			PickerState::Closed => self.status = "picker closed".to_string(),
		}
	}

	fn adjust_picker_value(&mut self, delta: i32) {
		let Some(open_row) = self.controller.picker_row() else {
			return;
		};
		let RowContent::Picker { current, minimum } = self.controller.row_content(open_row) else {
			return;
		};

		let interval_minutes = self.controller.store().interval_minutes();
		let next = clamp_to_minimum(
			step_picker_date(current, self.segment, delta, interval_minutes),
			minimum,
		);
		if next == current {
			return;
		}

		let range = self.controller.picker_value_changed(next);
		let parent_field = open_row - 1;
		let title = self.controller.store().field(parent_field).title;
		let value = if parent_field == 0 { range.start } else { range.end };
		self.status = format!(
			"{} set to {}",
			title,
			format_field_date(value, self.use_24_hour_clock)
		);
	}

	fn apply_commands(&mut self, commands: &[HostCommand]) {
		for command in commands {
			match command {
				// The visible rows are rebuilt from row_content on every
				// frame, so structural changes carry no retained state here.
				HostCommand::InsertRow(_) | HostCommand::DeleteRow(_) => {}
				HostCommand::Reload => {}
				HostCommand::SetContentHeight(height) => self.panel_height = *height,
			}
		}
	}
}

/// The picker control never offers values before its minimum; a step that
/// would land earlier snaps back to the bound.
fn clamp_to_minimum(candidate: DateTime<Local>, minimum: DateTime<Local>) -> DateTime<Local> {
	if candidate < minimum { minimum } else { candidate }
}

#[cfg(test)]
mod tests {
	use chrono::{DateTime, Local, TimeZone};

	use super::{PickerSegment, clamp_to_minimum, format_length, step_picker_date};

	fn local(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Local> {
		Local
			.with_ymd_and_hms(2026, month, day, hour, minute, 0)
			.unwrap()
	}

	#[test]
	fn minute_steps_move_by_whole_intervals() {
		let stepped = step_picker_date(local(3, 18, 10, 15), PickerSegment::Minute, 1, 15);
		assert_eq!(stepped, local(3, 18, 10, 30));

		let stepped = step_picker_date(local(3, 18, 10, 0), PickerSegment::Minute, -1, 15);
		assert_eq!(stepped, local(3, 18, 9, 45));
	}

	#[test]
	fn hour_steps_roll_the_day() {
		let stepped = step_picker_date(local(3, 18, 23, 30), PickerSegment::Hour, 1, 15);
		assert_eq!(stepped, local(3, 19, 0, 30));
	}

	#[test]
	fn month_steps_clamp_the_day_to_the_target_month() {
		let end_of_january = local(1, 31, 12, 0);
		let stepped = step_picker_date(end_of_january, PickerSegment::Month, 1, 15);
		assert_eq!(stepped, local(2, 28, 12, 0));
	}

	#[test]
	fn steps_below_the_minimum_snap_back() {
		let minimum = local(3, 18, 10, 15);
		let candidate = step_picker_date(local(3, 18, 10, 15), PickerSegment::Hour, -1, 15);
		assert_eq!(clamp_to_minimum(candidate, minimum), minimum);
	}

	#[test]
	fn lengths_format_as_hours_and_minutes() {
		assert_eq!(format_length(local(3, 18, 11, 15) - local(3, 18, 10, 0)), "01:15");
		assert_eq!(format_length(local(3, 18, 10, 0) - local(3, 18, 11, 0)), "00:00");
	}
}

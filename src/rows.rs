use chrono::{DateTime, Local};
use serde::Serialize;

use crate::fields::{FIELD_COUNT, FieldStore};

/// Where the inline picker row currently lives. `OpenAt` names a display row
/// index, not a field index; the two drift apart by one for every field below
/// the open picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Closed,
    OpenAt(usize),
}

/// Row-change signals the controller hands back to whichever list host is
/// rendering it. Each signal is consumed synchronously by the host after the
/// call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    InsertRow(usize),
    DeleteRow(usize),
    Reload,
    SetContentHeight(u16),
}

/// What the host should render at a display row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowContent {
    Field {
        title: &'static str,
        date: DateTime<Local>,
    },
    Picker {
        current: DateTime<Local>,
        minimum: DateTime<Local>,
    },
}

/// The validated pair reported to the application after every edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

/// Translates between logical field indices (0 = Start, 1 = End) and display
/// row indices while zero or one picker row is interleaved, and drives the
/// open/close/move transitions of that picker row.
#[derive(Debug, Clone)]
pub struct RowController {
    store: FieldStore,
    picker: PickerState,
    picker_row_height: u16,
}

impl RowController {
    pub fn new(store: FieldStore, picker_row_height: u16) -> Self {
        Self {
            store,
            picker: PickerState::Closed,
            picker_row_height,
        }
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut FieldStore {
        &mut self.store
    }

    pub fn picker_state(&self) -> PickerState {
        self.picker
    }

    pub fn picker_row(&self) -> Option<usize> {
        match self.picker {
            PickerState::Closed => None,
            PickerState::OpenAt(row) => Some(row),
        }
    }

    pub fn row_count(&self) -> usize {
        match self.picker {
            PickerState::Closed => FIELD_COUNT,
            PickerState::OpenAt(_) => FIELD_COUNT + 1,
        }
    }

    pub fn content_height(&self) -> u16 {
        let field_lines = FIELD_COUNT as u16;
        match self.picker {
            PickerState::Closed => field_lines,
            PickerState::OpenAt(_) => field_lines + self.picker_row_height,
        }
    }

    pub fn current_range(&self) -> TimeRange {
        TimeRange {
            start: self.store.start(),
            end: self.store.end(),
        }
    }

    /// A field row was activated. Opens the picker below it, closes the
    /// picker when the activated field already owns it, or relocates the
    /// picker under the newly activated field.
    pub fn row_tapped(&mut self, row: usize) -> Vec<HostCommand> {
        assert!(
            row < self.row_count(),
            "tapped display row {row} is out of range"
        );

        let mut commands = Vec::new();
        match self.picker {
            PickerState::OpenAt(open_row) if open_row - 1 == row => {
                self.picker = PickerState::Closed;
                commands.push(HostCommand::DeleteRow(open_row));
            }
            _ => {
                if let PickerState::OpenAt(open_row) = self.picker {
                    commands.push(HostCommand::DeleteRow(open_row));
                }
                // The target is computed against the pre-deletion state: a
                // picker above the tapped row vacates a slot the tapped row
                // shifts up into.
                let new_row = self.insertion_row(row);
                self.picker = PickerState::OpenAt(new_row);
                commands.push(HostCommand::InsertRow(new_row));
            }
        }

        commands.push(HostCommand::SetContentHeight(self.content_height()));
        commands
    }

    /// Display row the picker lands on when opened from a tap at `row`.
    fn insertion_row(&self, row: usize) -> usize {
        match self.picker {
            PickerState::OpenAt(open_row) if open_row <= row => row,
            _ => row + 1,
        }
    }

    /// Maps a non-picker display row back to its field index. Asking about
    /// the picker row itself or a row beyond the current row count is a
    /// caller error.
    pub fn field_index_for_display_row(&self, row: usize) -> usize {
        match self.picker {
            PickerState::Closed => row,
            // Picker trails both fields: rows and fields still coincide.
            PickerState::OpenAt(open_row) if open_row == FIELD_COUNT => row,
            // Picker sits below Start, so End has shifted to row 2.
            PickerState::OpenAt(_) => {
                if row == 0 {
                    0
                } else {
                    1
                }
            }
        }
    }

    /// Inverse mapping, used by the host to keep its cursor on a field while
    /// picker rows come and go.
    pub fn display_row_for_field(&self, field_index: usize) -> usize {
        match self.picker {
            PickerState::OpenAt(open_row) if open_row <= field_index => field_index + 1,
            _ => field_index,
        }
    }

    pub fn row_content(&self, row: usize) -> RowContent {
        assert!(row < self.row_count(), "display row {row} is out of range");

        if let PickerState::OpenAt(open_row) = self.picker {
            if open_row == row {
                let parent_field = open_row - 1;
                return RowContent::Picker {
                    current: self.store.field(parent_field).date,
                    minimum: self.store.picker_minimum(parent_field),
                };
            }
        }

        let field = self.store.field(self.field_index_for_display_row(row));
        RowContent::Field {
            title: field.title,
            date: field.date,
        }
    }

    /// The open picker produced a new value. Resolves which field owns the
    /// picker, applies the edit through the store (clamping End as needed)
    /// and returns the validated pair for the application.
    pub fn picker_value_changed(&mut self, date: DateTime<Local>) -> TimeRange {
        let open_row = match self.picker {
            PickerState::OpenAt(row) => row,
            PickerState::Closed => panic!("picker value changed while no picker is open"),
        };

        let parent_field = open_row - 1;
        if parent_field == 0 {
            self.store.set_start_date(date);
        } else {
            self.store.set_end_date(date);
        }

        self.current_range()
    }

    /// Locale/format changes reformat displayed text only; no state moves.
    pub fn locale_changed(&self) -> Vec<HostCommand> {
        vec![HostCommand::Reload]
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, TimeZone};

    use crate::fields::FieldStore;

    use super::{HostCommand, PickerState, RowContent, RowController};

    const PICKER_HEIGHT: u16 = 3;

    fn local(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 18, hour, minute, 0).unwrap()
    }

    fn controller_at(hour: u32, minute: u32) -> RowController {
        RowController::new(FieldStore::new(15, 60, local(hour, minute)), PICKER_HEIGHT)
    }

    #[test]
    fn tapping_while_closed_opens_below_the_tapped_row() {
        let mut controller = controller_at(10, 0);
        let commands = controller.row_tapped(0);
        assert_eq!(controller.picker_state(), PickerState::OpenAt(1));
        assert_eq!(
            commands,
            vec![
                HostCommand::InsertRow(1),
                HostCommand::SetContentHeight(2 + PICKER_HEIGHT),
            ]
        );

        let mut controller = controller_at(10, 0);
        controller.row_tapped(1);
        assert_eq!(controller.picker_state(), PickerState::OpenAt(2));
    }

    #[test]
    fn tapping_the_owning_field_closes_the_picker() {
        let mut controller = controller_at(10, 0);
        controller.row_tapped(0);

        let commands = controller.row_tapped(0);
        assert_eq!(controller.picker_state(), PickerState::Closed);
        assert_eq!(
            commands,
            vec![HostCommand::DeleteRow(1), HostCommand::SetContentHeight(2)]
        );
    }

    #[test]
    fn tapping_the_other_field_relocates_the_picker() {
        let mut controller = controller_at(10, 0);
        controller.row_tapped(0);

        // With the picker at row 1, End renders at display row 2. The delete
        // is signalled first, then the insert at the post-deletion position.
        let commands = controller.row_tapped(2);
        assert_eq!(controller.picker_state(), PickerState::OpenAt(2));
        assert_eq!(
            commands,
            vec![
                HostCommand::DeleteRow(1),
                HostCommand::InsertRow(2),
                HostCommand::SetContentHeight(2 + PICKER_HEIGHT),
            ]
        );

        // And back up: tapping Start (row 0) pulls the picker under it.
        let commands = controller.row_tapped(0);
        assert_eq!(controller.picker_state(), PickerState::OpenAt(1));
        assert_eq!(
            commands,
            vec![
                HostCommand::DeleteRow(2),
                HostCommand::InsertRow(1),
                HostCommand::SetContentHeight(2 + PICKER_HEIGHT),
            ]
        );
    }

    #[test]
    fn row_count_tracks_the_picker() {
        let mut controller = controller_at(10, 0);
        assert_eq!(controller.row_count(), 2);

        controller.row_tapped(0);
        assert_eq!(controller.row_count(), 3);

        controller.row_tapped(2);
        assert_eq!(controller.row_count(), 3);

        controller.row_tapped(1);
        assert_eq!(controller.row_count(), 2);
    }

    #[test]
    fn field_index_mapping_covers_every_picker_position() {
        let controller = controller_at(10, 0);
        assert_eq!(controller.field_index_for_display_row(0), 0);
        assert_eq!(controller.field_index_for_display_row(1), 1);

        let mut controller = controller_at(10, 0);
        controller.row_tapped(0);
        assert_eq!(controller.picker_state(), PickerState::OpenAt(1));
        assert_eq!(controller.field_index_for_display_row(0), 0);
        assert_eq!(controller.field_index_for_display_row(2), 1);

        let mut controller = controller_at(10, 0);
        controller.row_tapped(1);
        assert_eq!(controller.picker_state(), PickerState::OpenAt(2));
        assert_eq!(controller.field_index_for_display_row(0), 0);
        assert_eq!(controller.field_index_for_display_row(1), 1);
    }

    #[test]
    fn display_row_inverts_the_field_mapping() {
        let mut controller = controller_at(10, 0);
        assert_eq!(controller.display_row_for_field(0), 0);
        assert_eq!(controller.display_row_for_field(1), 1);

        controller.row_tapped(0);
        assert_eq!(controller.display_row_for_field(0), 0);
        assert_eq!(controller.display_row_for_field(1), 2);

        controller.row_tapped(2);
        assert_eq!(controller.display_row_for_field(0), 0);
        assert_eq!(controller.display_row_for_field(1), 1);
    }

    #[test]
    fn picker_content_carries_the_owning_fields_bounds() {
        let mut controller = controller_at(10, 0);
        controller.row_tapped(0);
        assert_eq!(
            controller.row_content(1),
            RowContent::Picker {
                current: local(10, 0),
                minimum: local(10, 0),
            }
        );

        controller.row_tapped(2);
        assert_eq!(
            controller.row_content(2),
            RowContent::Picker {
                current: local(11, 0),
                minimum: local(10, 15),
            }
        );
    }

    #[test]
    fn edits_resolve_to_the_picker_owning_field() {
        let mut controller = controller_at(10, 0);
        controller.row_tapped(1);
        assert_eq!(controller.picker_state(), PickerState::OpenAt(2));
        let range = controller.picker_value_changed(local(11, 30));
        assert_eq!(range.start, local(10, 0));
        assert_eq!(range.end, local(11, 30));

        controller.row_tapped(0);
        assert_eq!(controller.picker_state(), PickerState::OpenAt(1));
        let range = controller.picker_value_changed(local(11, 20));
        assert_eq!(range.start, local(11, 20));
        // End trailed by less than an interval, so the store dragged it.
        assert_eq!(range.end, local(11, 35));
    }

    #[test]
    fn walkthrough_from_ten_oh_seven() {
        let mut controller = controller_at(10, 7);
        assert_eq!(controller.store().start(), local(10, 15));
        assert_eq!(controller.store().end(), local(11, 15));
        assert_eq!(controller.store().min_start(), local(10, 15));
        assert_eq!(controller.store().min_end(), local(10, 30));

        let commands = controller.row_tapped(0);
        assert_eq!(commands[0], HostCommand::InsertRow(1));
        assert_eq!(
            controller.row_content(1),
            RowContent::Picker {
                current: local(10, 15),
                minimum: local(10, 15),
            }
        );

        let range = controller.picker_value_changed(local(10, 20));
        assert_eq!(range.start, local(10, 20));
        assert_eq!(range.end, local(11, 15));
        assert_eq!(controller.store().min_end(), local(10, 35));
    }

    #[test]
    fn locale_change_only_reloads() {
        let mut controller = controller_at(10, 0);
        controller.row_tapped(0);
        let before = controller.picker_state();

        assert_eq!(controller.locale_changed(), vec![HostCommand::Reload]);
        assert_eq!(controller.picker_state(), before);
    }

    #[test]
    #[should_panic(expected = "no picker is open")]
    fn edit_without_an_open_picker_is_a_caller_error() {
        let mut controller = controller_at(10, 0);
        controller.picker_value_changed(local(11, 0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn tapping_past_the_row_count_is_a_caller_error() {
        let mut controller = controller_at(10, 0);
        controller.row_tapped(2);
    }
}

use chrono::{DateTime, Duration, Local, Timelike};

pub const FIELD_COUNT: usize = 2;

/// One editable date/time entry in the picker list. The title is fixed at
/// construction; only the date ever changes.
#[derive(Debug, Clone)]
pub struct DateField {
    pub title: &'static str,
    pub date: DateTime<Local>,
}

/// Holds the Start/End field pair and the bounds that keep them consistent:
/// Start may never be earlier than `min_start`, and End may never be earlier
/// than `min_end = current_start + interval`.
#[derive(Debug, Clone)]
pub struct FieldStore {
    fields: [DateField; FIELD_COUNT],
    interval_minutes: u32,
    span_minutes: u32,
    min_start: DateTime<Local>,
    current_start: DateTime<Local>,
    min_end: DateTime<Local>,
}

impl FieldStore {
    pub fn new(interval_minutes: u32, span_minutes: u32, now: DateTime<Local>) -> Self {
        let mut store = Self {
            fields: [
                DateField {
                    title: "Start Time",
                    date: now,
                },
                DateField {
                    title: "End Time",
                    date: now,
                },
            ],
            interval_minutes,
            span_minutes,
            min_start: now,
            current_start: now,
            min_end: now,
        };
        store.reset_times(now);
        store
    }

    /// Overwrites both fields from `now`: Start lands on the next interval
    /// boundary, End lands one span later.
    pub fn reset_times(&mut self, now: DateTime<Local>) {
        let rounded_start = round_up_to_interval(now, self.interval_minutes);

        self.min_start = rounded_start;
        self.current_start = rounded_start;
        self.min_end = rounded_start + self.interval();

        self.fields[0].date = rounded_start;
        self.fields[1].date = rounded_start + Duration::minutes(self.span_minutes.into());
    }

    /// Re-entry guard: if real time has passed the previously chosen
    /// `min_start`, the old times are stale and both fields are reset.
    /// Returns whether a reset happened.
    pub fn resync_times(&mut self, now: DateTime<Local>) -> bool {
        let now_rounded = round_up_to_interval(now, self.interval_minutes);
        if now_rounded > self.min_start {
            self.reset_times(now);
            return true;
        }

        false
    }

    /// Moves Start and rederives `min_end`. End is dragged forward to the new
    /// `min_end` when the edit would leave less than one interval between the
    /// two fields.
    pub fn set_start_date(&mut self, date: DateTime<Local>) {
        self.fields[0].date = date;
        self.current_start = date;
        self.min_end = date + self.interval();

        if self.fields[1].date < self.min_end {
            self.fields[1].date = self.min_end;
        }
    }

    /// Moves End without re-validation. The picker control editing this field
    /// is configured with `picker_minimum(1)` and rejects earlier values, so
    /// the store never sees one.
    pub fn set_end_date(&mut self, date: DateTime<Local>) {
        self.fields[1].date = date;
    }

    pub fn field(&self, index: usize) -> &DateField {
        &self.fields[index]
    }

    pub fn start(&self) -> DateTime<Local> {
        self.fields[0].date
    }

    pub fn end(&self) -> DateTime<Local> {
        self.fields[1].date
    }

    pub fn min_start(&self) -> DateTime<Local> {
        self.min_start
    }

    pub fn min_end(&self) -> DateTime<Local> {
        self.min_end
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    /// Earliest value the picker may offer while editing the given field.
    pub fn picker_minimum(&self, field_index: usize) -> DateTime<Local> {
        if field_index == 0 {
            self.min_start
        } else {
            self.current_start + self.interval()
        }
    }

    fn interval(&self) -> Duration {
        Duration::minutes(self.interval_minutes.into())
    }
}

/// Rounds `t` forward to the next multiple of `interval_minutes` on the
/// clock, leaving exact boundaries untouched. Seconds are preserved; the
/// added minutes carry through hour and day boundaries.
pub fn round_up_to_interval(t: DateTime<Local>, interval_minutes: u32) -> DateTime<Local> {
    let past_boundary = t.minute() % interval_minutes;
    if past_boundary == 0 {
        return t;
    }

    t + Duration::minutes((interval_minutes - past_boundary).into())
}

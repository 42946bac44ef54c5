use tracing::debug;

use crate::models::{BookingMode, BreakInterval, OperatingWindow, SchedulingError, TimeOfDay};

pub const OPEN_QUEUE_MESSAGE: &str = "Open queue: patients are seen in order of arrival";
pub const NO_SLOTS_MESSAGE: &str = "No slots available for this date";

/// Half-open overlap between the slot `[slot_start, slot_end)` and a break
/// `[break_start, break_end)`. Touching endpoints do not overlap.
fn overlaps_break(slot_start: i32, slot_end: i32, break_start: i32, break_end: i32) -> bool {
    let starts_inside = slot_start >= break_start && slot_start < break_end;
    let ends_inside = slot_end > break_start && slot_end <= break_end;
    let contains = slot_start <= break_start && slot_end >= break_end;

    starts_inside || ends_inside || contains
}

/// Bookable start times for one day, ascending.
///
/// The candidate grid is `open, open + d, open + 2d, ...` for every start whose
/// slot ends at or before `close`; candidates overlapping any break are dropped.
/// A reversed or empty window yields no slots. A non-positive duration is an
/// `InvalidConfiguration` error.
pub fn generate_slot_times(
    window: &OperatingWindow,
    slot_duration_minutes: i32,
    breaks: &[BreakInterval],
) -> Result<Vec<TimeOfDay>, SchedulingError> {
    if slot_duration_minutes <= 0 {
        return Err(SchedulingError::InvalidConfiguration(format!(
            "slot duration must be positive, got {} minutes",
            slot_duration_minutes
        )));
    }

    let start_mins = window.open.minutes_since_midnight();
    let end_mins = window.close.minutes_since_midnight();

    let break_ranges: Vec<(i32, i32)> = breaks
        .iter()
        .map(|b| (b.start.minutes_since_midnight(), b.end.minutes_since_midnight()))
        .collect();

    let mut slots = Vec::new();
    let mut current_mins = start_mins;

    while let Some(slot_end) = current_mins.checked_add(slot_duration_minutes) {
        if slot_end > end_mins {
            break;
        }

        let blocked = break_ranges
            .iter()
            .any(|&(break_start, break_end)| overlaps_break(current_mins, slot_end, break_start, break_end));

        if !blocked {
            if let Some(slot) = TimeOfDay::from_minutes(current_mins) {
                slots.push(slot);
            }
        }

        current_mins = slot_end;
    }

    debug!(
        "Generated {} slots between {} and {} ({} minute slots, {} breaks)",
        slots.len(), window.open, window.close, slot_duration_minutes, breaks.len()
    );

    Ok(slots)
}

/// Same as [`generate_slot_times`], formatted as zero-padded `HH:MM`.
pub fn generate_time_slots(
    window: &OperatingWindow,
    slot_duration_minutes: i32,
    breaks: &[BreakInterval],
) -> Result<Vec<String>, SchedulingError> {
    let slots = generate_slot_times(window, slot_duration_minutes, breaks)?;
    Ok(slots.iter().map(TimeOfDay::to_string).collect())
}

pub fn slot_status_message(slot_count: usize, booking_mode: BookingMode) -> String {
    match (booking_mode, slot_count) {
        (BookingMode::OpenQueue, _) => OPEN_QUEUE_MESSAGE.to_string(),
        (_, 0) => NO_SLOTS_MESSAGE.to_string(),
        (_, 1) => "1 slot available".to_string(),
        (_, n) => format!("{} slots available", n),
    }
}

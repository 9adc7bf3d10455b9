use serde::Serialize;

/// Progress of a run, derived from its cursor after every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub percent: u8,
    /// Index of the last completed unit, `None` before the first one finishes.
    pub current_unit_index: Option<usize>,
}

impl ProgressEvent {
    pub const fn idle() -> Self {
        Self {
            percent: 0,
            current_unit_index: None,
        }
    }

    /// `round(cursor / total * 100)`, halves rounding up.
    ///
    /// An unfinished run is capped at 99 so that 100 is only ever reported for
    /// a run whose every unit has completed.
    pub fn from_cursor(cursor: usize, total_units: usize) -> Self {
        if total_units == 0 {
            return Self::idle();
        }

        let cursor = cursor.min(total_units) as u128;
        let total = total_units as u128;
        let mut percent = (cursor * 200 + total) / (2 * total);
        if cursor < total {
            percent = percent.min(99);
        }

        Self {
            percent: percent as u8,
            current_unit_index: (cursor as usize).checked_sub(1),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent == 100
    }
}

impl Default for ProgressEvent {
    fn default() -> Self {
        Self::idle()
    }
}

//! Page-level board state: selected range mode, custom bounds and the start-player memo.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::date_range::{self, DateInterval, RangeError, RangeMode};

/// Single owner of the board's view selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardController {
    mode: RangeMode,
    custom: DateInterval,
    last_pick: Option<Uuid>,
}

impl BoardController {
    /// Current month selected; custom bounds preset to the start of the month until now.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            mode: RangeMode::default(),
            custom: default_custom(now),
            last_pick: None,
        }
    }

    pub fn mode(&self) -> RangeMode {
        self.mode
    }

    pub fn custom(&self) -> DateInterval {
        self.custom
    }

    /// Switch mode. Leaving the custom mode resets its bounds.
    pub fn set_mode(&mut self, mode: RangeMode, now: OffsetDateTime) {
        if self.mode == RangeMode::Custom && mode != RangeMode::Custom {
            self.custom = default_custom(now);
        }
        self.mode = mode;
    }

    /// Select the custom mode with explicit bounds.
    pub fn set_custom(&mut self, interval: DateInterval) {
        self.mode = RangeMode::Custom;
        self.custom = interval;
    }

    /// Interval of the selected mode, or of `mode` when given.
    pub fn interval(
        &self,
        mode: Option<RangeMode>,
        now: OffsetDateTime,
    ) -> Result<DateInterval, RangeError> {
        date_range::resolve(mode.unwrap_or(self.mode), now, Some(self.custom))
    }

    pub fn last_pick(&self) -> Option<Uuid> {
        self.last_pick
    }

    pub fn record_pick(&mut self, player_id: Uuid) {
        self.last_pick = Some(player_id);
    }
}

fn default_custom(now: OffsetDateTime) -> DateInterval {
    let start = now
        .replace_day(1)
        .map(|first| first.replace_time(time::Time::MIDNIGHT))
        .unwrap_or(now);
    DateInterval { start, end: now }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn starts_on_current_month_with_month_to_date_custom_bounds() {
        let now = datetime!(2025-05-20 18:00 UTC);
        let controller = BoardController::new(now);
        assert_eq!(controller.mode(), RangeMode::CurrentMonth);
        assert_eq!(controller.custom().start, datetime!(2025-05-01 00:00 UTC));
        assert_eq!(controller.custom().end, now);
        assert_eq!(controller.last_pick(), None);
    }

    #[test]
    fn leaving_custom_mode_resets_bounds() {
        let now = datetime!(2025-05-20 18:00 UTC);
        let mut controller = BoardController::new(now);
        let custom = DateInterval::new(
            datetime!(2024-01-01 00:00 UTC),
            datetime!(2024-06-30 00:00 UTC),
        )
        .unwrap();

        controller.set_custom(custom);
        assert_eq!(controller.interval(None, now).unwrap(), custom);

        controller.set_mode(RangeMode::YearToDate, now);
        assert_eq!(controller.custom().start, datetime!(2025-05-01 00:00 UTC));

        controller.set_mode(RangeMode::Custom, now);
        assert_eq!(
            controller.interval(None, now).unwrap(),
            controller.custom()
        );
    }

    #[test]
    fn explicit_mode_does_not_change_selection() {
        let now = datetime!(2025-05-20 18:00 UTC);
        let controller = BoardController::new(now);
        let previous = controller
            .interval(Some(RangeMode::PreviousMonth), now)
            .unwrap();
        assert_eq!(previous.start, datetime!(2025-04-01 00:00 UTC));
        assert_eq!(controller.mode(), RangeMode::CurrentMonth);
    }
}

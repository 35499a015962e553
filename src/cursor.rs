//! The month cursor: which calendar month the user is looking at, independent of the real current
//! month.

use crate::model::MonthKey;
use crate::store::Store;
use chrono::{Local, NaiveDate};
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Supplies today's date.
pub trait Clock: Send + Sync + Debug {
    fn today(&self) -> NaiveDate;
}

/// Reads the local system clock on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(NaiveDate);

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self(today)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Tracks the month being viewed and saves it through the `Store` after every move.
///
/// Saving the cursor is best effort: if the store rejects the write, the cursor still moves and the
/// failure is logged. The next successful move saves the then-current month.
pub struct MonthCursor {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    current: MonthKey,
}

impl MonthCursor {
    /// Creates a cursor positioned at the real current month. Call `init` to restore the saved
    /// position.
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        let current = MonthKey::from_date(clock.today());
        Self {
            store,
            clock,
            current,
        }
    }

    /// Restores the saved cursor, falling back to the real current month when nothing was saved or
    /// what was saved is not a valid `YYYY-MM`. The result is always saved back, so calling this
    /// more than once is harmless.
    pub async fn init(&mut self) -> MonthKey {
        let saved = match self.store.get_saved_cursor().await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Unable to read the saved month, using the current month: {e:#}");
                None
            }
        };

        let month = match saved.as_deref().map(MonthKey::from_str) {
            Some(Ok(month)) => month,
            Some(Err(e)) => {
                warn!("Ignoring the saved month: {e}");
                self.real_month()
            }
            None => self.real_month(),
        };
        debug!("Month cursor initialized at {month}");
        self.set(month).await
    }

    /// The month being viewed.
    pub fn current(&self) -> MonthKey {
        self.current
    }

    /// The month that contains today's date, according to the clock, right now.
    pub fn real_month(&self) -> MonthKey {
        MonthKey::from_date(self.clock.today())
    }

    pub async fn previous_month(&mut self) -> MonthKey {
        self.set(self.current.previous()).await
    }

    pub async fn next_month(&mut self) -> MonthKey {
        self.set(self.current.next()).await
    }

    pub async fn go_to_current(&mut self) -> MonthKey {
        let month = self.real_month();
        self.set(month).await
    }

    pub async fn go_to(&mut self, month: MonthKey) -> MonthKey {
        self.set(month).await
    }

    pub fn is_viewing_current_month(&self) -> bool {
        self.current == self.real_month()
    }

    /// The long month name and year for `month`, e.g. `March 2024`. Does not depend on the cursor.
    pub fn display_name(month: MonthKey) -> String {
        month.display_name()
    }

    async fn set(&mut self, month: MonthKey) -> MonthKey {
        self.current = month;
        if let Err(e) = self.store.put_saved_cursor(month).await {
            warn!("Unable to save the current month {month}: {e:#}");
        }
        month
    }
}

impl Debug for MonthCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonthCursor")
            .field("current", &self.current)
            .field("clock", &self.clock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn month(s: &str) -> MonthKey {
        MonthKey::from_str(s).unwrap()
    }

    fn clock(y: i32, m: u32, d: u32) -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
    }

    #[tokio::test]
    async fn test_init_without_saved_month_uses_today() {
        let store = Arc::new(MemoryStore::new());
        let mut cursor = MonthCursor::new(store.clone(), clock(2026, 10, 19));
        assert_eq!(cursor.init().await, month("2026-10"));
        assert!(cursor.is_viewing_current_month());
        assert_eq!(
            store.get_saved_cursor().await.unwrap().as_deref(),
            Some("2026-10")
        );
    }

    #[tokio::test]
    async fn test_init_restores_saved_month() {
        let store = Arc::new(MemoryStore::with_data(Default::default(), Some("2024-03")));
        let mut cursor = MonthCursor::new(store, clock(2026, 10, 19));
        assert_eq!(cursor.init().await, month("2024-03"));
        assert!(!cursor.is_viewing_current_month());
        // idempotent
        assert_eq!(cursor.init().await, month("2024-03"));
    }

    #[tokio::test]
    async fn test_init_with_malformed_saved_month_falls_back() {
        let store = Arc::new(MemoryStore::with_data(Default::default(), Some("2024-3")));
        let mut cursor = MonthCursor::new(store.clone(), clock(2026, 10, 19));
        assert_eq!(cursor.init().await, month("2026-10"));
        assert_eq!(
            store.get_saved_cursor().await.unwrap().as_deref(),
            Some("2026-10")
        );
    }

    #[tokio::test]
    async fn test_navigation_across_year_boundary() {
        let store = Arc::new(MemoryStore::with_data(Default::default(), Some("2024-01")));
        let mut cursor = MonthCursor::new(store.clone(), clock(2026, 10, 19));
        cursor.init().await;

        assert_eq!(cursor.previous_month().await, month("2023-12"));
        assert_eq!(
            store.get_saved_cursor().await.unwrap().as_deref(),
            Some("2023-12")
        );
        assert_eq!(cursor.next_month().await, month("2024-01"));
        assert_eq!(cursor.go_to_current().await, month("2026-10"));
        assert!(cursor.is_viewing_current_month());
    }

    #[tokio::test]
    async fn test_move_survives_failed_save() {
        let store = Arc::new(MemoryStore::with_data(Default::default(), Some("2024-05")));
        let mut cursor = MonthCursor::new(store.clone(), clock(2026, 10, 19));
        cursor.init().await;
        store.set_fail_writes(true);

        assert_eq!(cursor.next_month().await, month("2024-06"));
        assert_eq!(cursor.current(), month("2024-06"));
        assert_eq!(
            store.get_saved_cursor().await.unwrap().as_deref(),
            Some("2024-05")
        );
    }

    /// A clock that can be moved forward between calls.
    #[derive(Debug)]
    struct ManualClock(std::sync::Mutex<NaiveDate>);

    impl ManualClock {
        fn set(&self, date: NaiveDate) {
            *self.0.lock().unwrap() = date;
        }
    }

    impl Clock for ManualClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn test_current_month_check_reads_the_clock_each_time() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let clock = Arc::new(ManualClock(std::sync::Mutex::new(date(2024, 3, 31))));
        let mut cursor = MonthCursor::new(Arc::new(MemoryStore::new()), clock.clone());
        cursor.init().await;
        assert!(cursor.is_viewing_current_month());

        // midnight passes into April while the cursor sits still
        clock.set(date(2024, 4, 1));
        assert!(!cursor.is_viewing_current_month());
        assert_eq!(cursor.current(), month("2024-03"));
        assert_eq!(cursor.real_month(), month("2024-04"));

        assert_eq!(cursor.go_to_current().await, month("2024-04"));
        assert!(cursor.is_viewing_current_month());
    }

    #[tokio::test]
    async fn test_display_name_ignores_cursor_state() {
        let store = Arc::new(MemoryStore::new());
        let mut cursor = MonthCursor::new(store, clock(2026, 10, 19));
        let before = MonthCursor::display_name(month("2024-03"));
        cursor.next_month().await;
        cursor.next_month().await;
        assert_eq!(MonthCursor::display_name(month("2024-03")), before);
        assert_eq!(before, "March 2024");
    }
}

use chrono::{Local, NaiveDate};

use crate::{
    Money, TransactionKind,
    stats::{BudgetStatus, DateRange, MonthlyStats, RangeStats},
    store::BlobStore,
};

use super::Engine;

impl<S: BlobStore> Engine<S> {
    /// Totals of the current local calendar month.
    pub fn monthly_stats(&self) -> MonthlyStats {
        self.monthly_stats_at(Local::now().date_naive())
    }

    pub fn monthly_stats_at(&self, today: NaiveDate) -> MonthlyStats {
        MonthlyStats::compute(&self.ledger.transactions, today)
    }

    pub fn range_stats(
        &self,
        range: DateRange,
        kind: Option<TransactionKind>,
        today: NaiveDate,
    ) -> RangeStats {
        RangeStats::compute(&self.ledger.transactions, range, kind, today)
    }

    pub fn budget_status_at(&self, today: NaiveDate) -> BudgetStatus {
        let spent: Money = self.monthly_stats_at(today).expenses;
        BudgetStatus::new(self.ledger.profile.monthly_budget, spent)
    }
}

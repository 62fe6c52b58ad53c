//! Derived aggregates over the transaction log.
//!
//! Everything here is a pure function of a slice of transactions (plus the
//! reference date), the engine only supplies its current state.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Money, Transaction, TransactionKind};

/// Current-month totals.
///
/// `borrow_amount` and `lend_amount` only count unsettled debts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub income: Money,
    pub expenses: Money,
    pub borrow_amount: Money,
    pub lend_amount: Money,
    pub cashflow: Money,
}

impl MonthlyStats {
    /// Totals over the calendar month containing `day`.
    pub fn compute(transactions: &[Transaction], day: NaiveDate) -> Self {
        let mut stats = Self::default();
        for tx in transactions
            .iter()
            .filter(|tx| tx.date.year() == day.year() && tx.date.month() == day.month())
        {
            match tx.kind {
                TransactionKind::Income => stats.income += tx.amount,
                TransactionKind::Expense => stats.expenses += tx.amount,
                TransactionKind::Borrow if !tx.settled => stats.borrow_amount += tx.amount,
                TransactionKind::Lend if !tx.settled => stats.lend_amount += tx.amount,
                _ => {}
            }
        }
        stats.cashflow = stats.income - stats.expenses + stats.borrow_amount - stats.lend_amount;
        stats
    }
}

/// Period selector of the analytics view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateRange {
    /// From the most recent Sunday.
    Week,
    /// From the first day of the month.
    Month,
    /// From January 1st.
    Year,
    /// From the earliest transaction, one year back when there is none.
    All,
    Custom { from: NaiveDate, to: NaiveDate },
}

impl DateRange {
    /// Inclusive `(from, to)` bounds relative to `today`.
    pub fn bounds(self, today: NaiveDate, earliest: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Week => {
                let back = i64::from(today.weekday().num_days_from_sunday());
                let from = today
                    .checked_sub_signed(chrono::Duration::days(back))
                    .unwrap_or(today);
                (from, today)
            }
            Self::Month => (
                NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today),
                today,
            ),
            Self::Year => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                today,
            ),
            Self::All => {
                let from = earliest.unwrap_or_else(|| {
                    today.checked_sub_months(Months::new(12)).unwrap_or(today)
                });
                (from.min(today), today)
            }
            Self::Custom { from, to } if from <= to => (from, to),
            Self::Custom { from, to } => (to, from),
        }
    }
}

impl TryFrom<&str> for DateRange {
    type Error = crate::EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(crate::EngineError::InvalidTransaction(format!(
                "invalid date range: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Money,
}

/// Totals of a period. Debts are counted whether settled or not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeStats {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub income: Money,
    pub expenses: Money,
    pub borrow: Money,
    pub lend: Money,
    pub expense_by_category: Vec<CategoryTotal>,
    pub income_by_category: Vec<CategoryTotal>,
    pub count: usize,
}

impl RangeStats {
    pub fn compute(
        transactions: &[Transaction],
        range: DateRange,
        kind: Option<TransactionKind>,
        today: NaiveDate,
    ) -> Self {
        let earliest = transactions.iter().map(|tx| tx.date).min();
        let (from, to) = range.bounds(today, earliest);

        let mut income = Money::ZERO;
        let mut expenses = Money::ZERO;
        let mut borrow = Money::ZERO;
        let mut lend = Money::ZERO;
        let mut by_expense: HashMap<&str, Money> = HashMap::new();
        let mut by_income: HashMap<&str, Money> = HashMap::new();
        let mut count = 0;

        for tx in transactions.iter().filter(|tx| {
            tx.date >= from && tx.date <= to && kind.is_none_or(|kind| tx.kind == kind)
        }) {
            count += 1;
            match tx.kind {
                TransactionKind::Income => {
                    income += tx.amount;
                    *by_income.entry(tx.category.as_str()).or_default() += tx.amount;
                }
                TransactionKind::Expense => {
                    expenses += tx.amount;
                    *by_expense.entry(tx.category.as_str()).or_default() += tx.amount;
                }
                TransactionKind::Borrow => borrow += tx.amount,
                TransactionKind::Lend => lend += tx.amount,
                TransactionKind::Transfer => {}
            }
        }

        Self {
            from,
            to,
            income,
            expenses,
            borrow,
            lend,
            expense_by_category: sorted_totals(by_expense),
            income_by_category: sorted_totals(by_income),
            count,
        }
    }
}

fn sorted_totals(map: HashMap<&str, Money>) -> Vec<CategoryTotal> {
    let mut out: Vec<CategoryTotal> = map
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            amount,
        })
        .collect();
    out.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    out
}

/// Month expenses against the profile budget. `remaining` goes negative
/// once the budget is exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub budget: Money,
    pub spent: Money,
    pub remaining: Money,
    pub over_budget: bool,
}

impl BudgetStatus {
    pub fn new(budget: Money, spent: Money) -> Self {
        Self {
            budget,
            spent,
            remaining: budget - spent,
            over_budget: spent > budget,
        }
    }
}

/// History filter. Empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub kinds: Vec<TransactionKind>,
    pub search: Option<String>,
    pub account: Option<AccountId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TransactionFilter {
    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kinds.push(kind);
        self
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    #[must_use]
    pub fn account(mut self, account: AccountId) -> Self {
        self.account = Some(account);
        self
    }

    #[must_use]
    pub fn from(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn to(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&tx.kind) {
            return false;
        }
        if let Some(account) = &self.account
            && !tx.references(account)
        {
            return false;
        }
        if self.from.is_some_and(|from| tx.date < from) || self.to.is_some_and(|to| tx.date > to) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                tx.category.to_lowercase().contains(&needle)
                    || tx.notes.to_lowercase().contains(&needle)
                    || tx
                        .counterparty
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::TransactionId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(kind: TransactionKind, cents: i64, day: NaiveDate, category: &str) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            kind,
            category: category.to_string(),
            amount: Money::new(cents),
            account: AccountId::from("acc"),
            to_account: None,
            date: day,
            notes: String::new(),
            settled: false,
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
            counterparty: kind.is_debt().then(|| "Ann".to_string()),
        }
    }

    #[test]
    fn monthly_stats_cashflow() {
        let today = date(2024, 5, 15);
        let mut settled = tx(TransactionKind::Borrow, 1_000, date(2024, 5, 3), "Personal");
        settled.settled = true;
        let txs = vec![
            tx(TransactionKind::Income, 50_000, date(2024, 5, 1), "Salary"),
            tx(TransactionKind::Expense, 3_000, date(2024, 5, 2), "Food"),
            tx(TransactionKind::Expense, 9_999, date(2024, 4, 30), "Food"),
            tx(TransactionKind::Borrow, 2_000, date(2024, 5, 4), "Personal"),
            tx(TransactionKind::Lend, 500, date(2024, 5, 5), "Personal"),
            settled,
        ];
        let stats = MonthlyStats::compute(&txs, today);
        assert_eq!(stats.income, Money::new(50_000));
        assert_eq!(stats.expenses, Money::new(3_000));
        assert_eq!(stats.borrow_amount, Money::new(2_000));
        assert_eq!(stats.lend_amount, Money::new(500));
        assert_eq!(stats.cashflow, Money::new(48_500));
        assert_eq!(stats, MonthlyStats::compute(&txs, today));
    }

    #[test]
    fn range_bounds() {
        // 2024-05-15 is a Wednesday.
        let today = date(2024, 5, 15);
        assert_eq!(DateRange::Week.bounds(today, None), (date(2024, 5, 12), today));
        assert_eq!(DateRange::Month.bounds(today, None), (date(2024, 5, 1), today));
        assert_eq!(DateRange::Year.bounds(today, None), (date(2024, 1, 1), today));
        assert_eq!(DateRange::All.bounds(today, None), (date(2023, 5, 15), today));
        assert_eq!(
            DateRange::All.bounds(today, Some(date(2020, 2, 29))),
            (date(2020, 2, 29), today)
        );
        let custom = DateRange::Custom {
            from: date(2024, 3, 1),
            to: date(2024, 2, 1),
        };
        assert_eq!(custom.bounds(today, None), (date(2024, 2, 1), date(2024, 3, 1)));
    }

    #[test]
    fn range_stats_breakdown() {
        let today = date(2024, 5, 15);
        let mut settled = tx(TransactionKind::Lend, 700, date(2024, 5, 6), "Personal");
        settled.settled = true;
        let txs = vec![
            tx(TransactionKind::Expense, 1_000, date(2024, 5, 2), "Transport"),
            tx(TransactionKind::Expense, 3_000, date(2024, 5, 3), "Food"),
            tx(TransactionKind::Expense, 1_000, date(2024, 5, 4), "Bills"),
            tx(TransactionKind::Income, 2_000, date(2024, 5, 5), "Gift"),
            tx(TransactionKind::Expense, 5_000, date(2023, 1, 1), "Food"),
            settled,
        ];

        let stats = RangeStats::compute(&txs, DateRange::Month, None, today);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.expenses, Money::new(5_000));
        assert_eq!(stats.income, Money::new(2_000));
        assert_eq!(stats.lend, Money::new(700));
        let names: Vec<&str> = stats
            .expense_by_category
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(names, ["Food", "Bills", "Transport"]);

        let only_income =
            RangeStats::compute(&txs, DateRange::All, Some(TransactionKind::Income), today);
        assert_eq!(only_income.from, date(2023, 1, 1));
        assert_eq!(only_income.count, 1);
        assert!(only_income.expense_by_category.is_empty());
    }

    #[test]
    fn budget_status() {
        let over = BudgetStatus::new(Money::new(1_000), Money::new(1_500));
        assert!(over.over_budget);
        assert_eq!(over.remaining, Money::new(-500));
        assert!(!BudgetStatus::new(Money::new(1_000), Money::new(1_000)).over_budget);
    }

    #[test]
    fn filter_matches() {
        let mut t = tx(TransactionKind::Borrow, 100, date(2024, 5, 1), "Personal");
        t.notes = "Concert tickets".to_string();

        assert!(TransactionFilter::default().matches(&t));
        assert!(TransactionFilter::default().search("ann").matches(&t));
        assert!(TransactionFilter::default().search("CONCERT").matches(&t));
        assert!(!TransactionFilter::default().search("rent").matches(&t));
        assert!(!TransactionFilter::default().kind(TransactionKind::Lend).matches(&t));
        assert!(
            TransactionFilter::default()
                .kind(TransactionKind::Lend)
                .kind(TransactionKind::Borrow)
                .matches(&t)
        );
        assert!(!TransactionFilter::default().from(date(2024, 5, 2)).matches(&t));
        assert!(
            TransactionFilter::default()
                .from(date(2024, 5, 1))
                .to(date(2024, 5, 1))
                .matches(&t)
        );
        assert!(!TransactionFilter::default().account(AccountId::from("other")).matches(&t));
    }
}

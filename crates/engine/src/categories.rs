//! Suggested categories per transaction kind.
//!
//! This is guidance for input forms only; the engine accepts any non-empty
//! category.

use crate::TransactionKind;

const INCOME: &[&str] = &["Salary", "Freelance", "Investment", "Gift", "Other"];
const EXPENSE: &[&str] = &[
    "Food",
    "Transport",
    "Shopping",
    "Bills",
    "Entertainment",
    "Health",
    "Other",
];
const DEBT: &[&str] = &["Personal", "Emergency", "Investment", "Other"];

/// Ordered category suggestions for `kind`. Transfers have none, their
/// description is synthesized from the account names.
#[must_use]
pub fn suggested_categories(kind: TransactionKind) -> &'static [&'static str] {
    match kind {
        TransactionKind::Income => INCOME,
        TransactionKind::Expense => EXPENSE,
        TransactionKind::Borrow | TransactionKind::Lend => DEBT,
        TransactionKind::Transfer => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_but_transfer_ends_with_other() {
        for kind in TransactionKind::ALL {
            let list = suggested_categories(kind);
            if kind == TransactionKind::Transfer {
                assert!(list.is_empty());
            } else {
                assert_eq!(list.last(), Some(&"Other"));
            }
        }
        assert_eq!(suggested_categories(TransactionKind::Expense)[0], "Food");
    }
}

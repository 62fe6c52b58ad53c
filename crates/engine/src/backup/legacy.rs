//! Conversion of older data shapes.
//!
//! Early versions kept exactly two balances (`cash`, `bank`) and transactions
//! pointed at them by name. Later versions keep a dynamic account map but
//! some transactions may still carry a name instead of an id.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::{Account, AccountId, AccountKind, Transaction, util::name_key};

use super::AccountsDocument;

/// Accounts and transactions ready to be installed in the engine.
#[derive(Debug)]
pub(crate) struct Rebuilt {
    pub(crate) accounts: BTreeMap<AccountId, Account>,
    pub(crate) transactions: Vec<Transaction>,
    /// `true` when the accounts came from the fixed pair.
    pub(crate) migrated: bool,
}

/// Turns any accounts shape into the dynamic map and rewrites transaction
/// references through it.
///
/// Balances come only from the account records: transaction effects are
/// **not** replayed.
pub(crate) fn rebuild(
    accounts: AccountsDocument,
    transactions: Vec<Transaction>,
    now: DateTime<Utc>,
) -> Rebuilt {
    let (accounts, migrated) = match accounts {
        AccountsDocument::Dynamic(map) => (map, false),
        AccountsDocument::Legacy(pair) => {
            let mut map = BTreeMap::new();
            let opening = [
                ("Cash", AccountKind::Cash, pair.cash),
                ("Bank", AccountKind::Bank, pair.bank),
            ];
            for (offset, (name, kind, balance)) in (0_i64..).zip(opening) {
                let Some(balance) = balance else {
                    continue;
                };
                let account = Account::new(
                    name.to_string(),
                    kind,
                    balance,
                    now + Duration::milliseconds(offset),
                );
                info!(account = %account.id, name, "legacy account converted");
                map.insert(account.id.clone(), account);
            }
            (map, true)
        }
    };

    let by_name: HashMap<String, AccountId> = accounts
        .values()
        .map(|account| (name_key(&account.name), account.id.clone()))
        .collect();

    let transactions = transactions
        .into_iter()
        .map(|mut tx| {
            tx.account = remap(&tx.id.to_string(), tx.account, &accounts, &by_name);
            tx.to_account = tx
                .to_account
                .map(|to| remap(&tx.id.to_string(), to, &accounts, &by_name));
            tx
        })
        .collect();

    Rebuilt {
        accounts,
        transactions,
        migrated,
    }
}

fn remap(
    tx_id: &str,
    reference: AccountId,
    accounts: &BTreeMap<AccountId, Account>,
    by_name: &HashMap<String, AccountId>,
) -> AccountId {
    if accounts.contains_key(&reference) {
        return reference;
    }
    match by_name.get(&name_key(reference.as_str())) {
        Some(id) => id.clone(),
        None => {
            warn!(transaction = tx_id, reference = %reference, "unresolved account reference");
            reference
        }
    }
}

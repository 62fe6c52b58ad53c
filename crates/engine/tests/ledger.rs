use chrono::{Local, NaiveDate};

use engine::{
    AccountId, AccountKind, AccountPatch, DateRange, Engine, EngineError, MemoryStore, Money,
    OpeningAccount, ProfileUpdate, TransactionDraft, TransactionFilter, TransactionId,
    TransactionKind, TransactionPatch,
};

async fn engine() -> Engine<MemoryStore> {
    Engine::builder()
        .store(MemoryStore::new())
        .build()
        .await
        .unwrap()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Engine with `Cash: 100` and `Bank: 50`.
async fn cash_and_bank() -> (Engine<MemoryStore>, AccountId, AccountId) {
    let mut engine = engine().await;
    let cash = engine
        .add_account("Cash", AccountKind::Cash, Money::new(100_00))
        .await
        .unwrap();
    let bank = engine
        .add_account("Bank", AccountKind::Bank, Money::new(50_00))
        .await
        .unwrap();
    (engine, cash, bank)
}

fn balance(engine: &Engine<MemoryStore>, id: &AccountId) -> Money {
    engine.account(id).unwrap().balance
}

#[tokio::test]
async fn expense_and_transfer_scenario() {
    let (mut engine, cash, bank) = cash_and_bank().await;

    engine
        .add_transaction(
            TransactionDraft::expense(cash.clone(), Money::new(30_00), today()).category("Food"),
        )
        .await
        .unwrap();
    engine
        .add_transaction(TransactionDraft::transfer(
            bank.clone(),
            cash.clone(),
            Money::new(20_00),
            today(),
        ))
        .await
        .unwrap();

    assert_eq!(balance(&engine, &cash), Money::new(90_00));
    assert_eq!(balance(&engine, &bank), Money::new(30_00));
    assert_eq!(engine.total_balance(), Money::new(120_00));

    let stats = engine.monthly_stats();
    assert_eq!(stats.expenses, Money::new(30_00));
    assert_eq!(stats.income, Money::ZERO);
    assert_eq!(stats.cashflow, Money::new(-30_00));
    assert_eq!(engine.monthly_stats(), stats);
}

#[tokio::test]
async fn total_balance_follows_income_and_expenses() {
    let (mut engine, cash, bank) = cash_and_bank().await;
    let drafts = vec![
        TransactionDraft::income(bank.clone(), Money::new(1_234_56), today()).category("Salary"),
        TransactionDraft::expense(cash.clone(), Money::new(12_34), today()).category("Food"),
        TransactionDraft::transfer(bank.clone(), cash.clone(), Money::new(200_00), today()),
        TransactionDraft::expense(bank.clone(), Money::new(99_99), today()).category("Bills"),
        TransactionDraft::transfer(cash.clone(), bank.clone(), Money::new(0_01), today()),
    ];
    for draft in drafts {
        engine.add_transaction(draft).await.unwrap();
    }

    let expected = Money::new(150_00) + Money::new(1_234_56) - Money::new(12_34) - Money::new(99_99);
    assert_eq!(engine.total_balance(), expected);
    assert_eq!(engine.net_worth(), expected);
}

#[tokio::test]
async fn borrow_and_lend_leave_balances_alone() {
    let (mut engine, cash, bank) = cash_and_bank().await;

    let borrow = engine
        .add_transaction(
            TransactionDraft::borrow(cash.clone(), Money::new(40_00), today(), "Ann")
                .category("Personal"),
        )
        .await
        .unwrap();
    engine
        .add_transaction(
            TransactionDraft::lend(bank.clone(), Money::new(15_00), today(), "Bob")
                .category("Emergency"),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, &cash), Money::new(100_00));
    assert_eq!(balance(&engine, &bank), Money::new(50_00));

    let stats = engine.monthly_stats();
    assert_eq!(stats.borrow_amount, Money::new(40_00));
    assert_eq!(stats.lend_amount, Money::new(15_00));
    assert_eq!(stats.cashflow, Money::new(25_00));

    engine.settle_borrow_lend(&borrow).await.unwrap();
    assert!(engine.transaction(&borrow).unwrap().settled);
    let settled = engine.monthly_stats();
    assert_eq!(settled.borrow_amount, Money::ZERO);
    assert_eq!(settled.lend_amount, Money::new(15_00));
    assert_eq!(balance(&engine, &cash), Money::new(100_00));

    engine.set_settled(&borrow, false).await.unwrap();
    assert_eq!(engine.monthly_stats(), stats);
}

#[tokio::test]
async fn settlement_needs_an_existing_debt() {
    let (mut engine, cash, _bank) = cash_and_bank().await;
    let expense = engine
        .add_transaction(
            TransactionDraft::expense(cash, Money::new(1_00), today()).category("Food"),
        )
        .await
        .unwrap();

    assert!(matches!(
        engine.settle_borrow_lend(&expense).await,
        Err(EngineError::InvalidTransaction(_))
    ));
    assert_eq!(
        engine
            .settle_borrow_lend(&TransactionId::from("missing"))
            .await,
        Err(EngineError::NotFound("missing".to_string()))
    );
}

#[tokio::test]
async fn account_names_are_unique_ignoring_case() {
    let mut engine = engine().await;
    engine
        .add_account("Cash", AccountKind::Cash, Money::new(10_00))
        .await
        .unwrap();

    assert_eq!(
        engine
            .add_account("cash", AccountKind::Cash, Money::ZERO)
            .await,
        Err(EngineError::DuplicateName("cash".to_string()))
    );
    assert_eq!(
        engine
            .add_account("  CASH ", AccountKind::Other, Money::ZERO)
            .await,
        Err(EngineError::DuplicateName("CASH".to_string()))
    );
    assert_eq!(
        engine
            .add_account("   ", AccountKind::Other, Money::ZERO)
            .await,
        Err(EngineError::InvalidAccount(
            "account name must not be empty".to_string()
        ))
    );
    assert_eq!(engine.accounts_list().len(), 1);
}

#[tokio::test]
async fn accented_account_names_are_distinct() {
    let mut engine = engine().await;
    let plain = engine
        .add_account("Cafe", AccountKind::Cash, Money::ZERO)
        .await
        .unwrap();
    let accented = engine
        .add_account("Café", AccountKind::Cash, Money::ZERO)
        .await
        .unwrap();
    assert_eq!(
        engine
            .add_account("CAFÉ", AccountKind::Other, Money::ZERO)
            .await,
        Err(EngineError::DuplicateName("CAFÉ".to_string()))
    );

    assert_eq!(engine.account_by_name("cafe").unwrap().id, plain);
    assert_eq!(engine.account_by_name("café").unwrap().id, accented);
    assert_eq!(engine.accounts_list().len(), 2);
}

#[tokio::test]
async fn update_account_merges_and_rechecks_names() {
    let (mut engine, cash, bank) = cash_and_bank().await;

    assert_eq!(
        engine
            .update_account(&bank, AccountPatch::default().name("CASH"))
            .await,
        Err(EngineError::DuplicateName("CASH".to_string()))
    );

    let updated = engine
        .update_account(
            &cash,
            AccountPatch::default()
                .name("cash")
                .kind(AccountKind::Savings),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, cash);
    assert_eq!(updated.name, "cash");
    assert_eq!(updated.kind, AccountKind::Savings);
    assert_eq!(updated.balance, Money::new(100_00));

    let missing = AccountId::from("missing");
    assert_eq!(
        engine
            .update_account(&missing, AccountPatch::default().name("x"))
            .await,
        Err(EngineError::NotFound("missing".to_string()))
    );
}

#[tokio::test]
async fn referenced_accounts_cannot_be_deleted() {
    let (mut engine, cash, bank) = cash_and_bank().await;
    let transfer = engine
        .add_transaction(TransactionDraft::transfer(
            cash.clone(),
            bank.clone(),
            Money::new(5_00),
            today(),
        ))
        .await
        .unwrap();

    assert!(matches!(
        engine.delete_account(&bank).await,
        Err(EngineError::AccountInUse(_))
    ));
    assert!(matches!(
        engine.delete_account(&cash).await,
        Err(EngineError::AccountInUse(_))
    ));

    engine.delete_transaction(&transfer).await.unwrap();
    engine.delete_account(&bank).await.unwrap();
    assert_eq!(engine.accounts_list().len(), 1);
    assert!(matches!(
        engine.delete_account(&bank).await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn invalid_drafts_are_rejected_without_side_effects() {
    let (mut engine, cash, bank) = cash_and_bank().await;

    assert!(matches!(
        engine
            .add_transaction(TransactionDraft::expense(cash.clone(), Money::ZERO, today()).category("Food"))
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .add_transaction(TransactionDraft::expense(cash.clone(), Money::new(-5), today()).category("Food"))
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .add_transaction(TransactionDraft::expense(cash.clone(), Money::new(5), today()).category("  "))
            .await,
        Err(EngineError::InvalidTransaction(_))
    ));
    assert!(matches!(
        engine
            .add_transaction(
                TransactionDraft::borrow(cash.clone(), Money::new(5), today(), " ")
                    .category("Personal")
            )
            .await,
        Err(EngineError::InvalidTransaction(_))
    ));
    assert!(matches!(
        engine
            .add_transaction(TransactionDraft::transfer(
                cash.clone(),
                cash.clone(),
                Money::new(5),
                today()
            ))
            .await,
        Err(EngineError::InvalidTransaction(_))
    ));
    assert!(matches!(
        engine
            .add_transaction(TransactionDraft::new(
                TransactionKind::Transfer,
                cash.clone(),
                Money::new(5),
                today()
            ))
            .await,
        Err(EngineError::InvalidTransaction(_))
    ));
    assert!(matches!(
        engine
            .add_transaction(
                TransactionDraft::expense(cash.clone(), Money::new(5), today())
                    .category("Food")
                    .to_account(bank.clone())
            )
            .await,
        Err(EngineError::InvalidTransaction(_))
    ));

    let ghost = AccountId::from("ghost");
    assert_eq!(
        engine
            .add_transaction(
                TransactionDraft::income(ghost.clone(), Money::new(5), today()).category("Gift")
            )
            .await,
        Err(EngineError::AccountNotFound("ghost".to_string()))
    );
    assert_eq!(
        engine
            .add_transaction(TransactionDraft::transfer(
                cash.clone(),
                ghost,
                Money::new(5),
                today()
            ))
            .await,
        Err(EngineError::AccountNotFound("ghost".to_string()))
    );

    assert!(matches!(
        engine
            .add_transaction(TransactionDraft::transfer(
                bank.clone(),
                cash.clone(),
                Money::new(50_01),
                today()
            ))
            .await,
        Err(EngineError::InsufficientFunds(_))
    ));

    assert!(engine.transactions().is_empty());
    assert_eq!(balance(&engine, &cash), Money::new(100_00));
    assert_eq!(balance(&engine, &bank), Money::new(50_00));
}

#[tokio::test]
async fn credit_accounts_may_overdraw() {
    let (mut engine, cash, _bank) = cash_and_bank().await;
    let card = engine
        .add_account("Card", AccountKind::Credit, Money::ZERO)
        .await
        .unwrap();

    engine
        .add_transaction(TransactionDraft::transfer(
            card.clone(),
            cash.clone(),
            Money::new(75_00),
            today(),
        ))
        .await
        .unwrap();
    assert_eq!(balance(&engine, &card), Money::new(-75_00));
    assert_eq!(balance(&engine, &cash), Money::new(175_00));
}

#[tokio::test]
async fn transfers_get_a_description_and_debts_keep_their_counterparty() {
    let (mut engine, cash, bank) = cash_and_bank().await;

    let transfer = engine
        .add_transaction(TransactionDraft::transfer(
            bank.clone(),
            cash.clone(),
            Money::new(10_00),
            today(),
        ))
        .await
        .unwrap();
    assert_eq!(
        engine.transaction(&transfer).unwrap().category,
        "Transfer from Bank to Cash"
    );

    let expense = engine
        .add_transaction(
            TransactionDraft::expense(cash.clone(), Money::new(1_00), today())
                .category(" Food ")
                .counterparty("Shop"),
        )
        .await
        .unwrap();
    let expense = engine.transaction(&expense).unwrap();
    assert_eq!(expense.category, "Food");
    assert_eq!(expense.counterparty, None);
    assert!(!expense.settled);

    let lend = engine
        .add_transaction(
            TransactionDraft::lend(cash, Money::new(1_00), today(), " Ann ").category("Personal"),
        )
        .await
        .unwrap();
    assert_eq!(
        engine.transaction(&lend).unwrap().counterparty.as_deref(),
        Some("Ann")
    );
}

#[tokio::test]
async fn edits_and_deletes_reverse_balance_effects() {
    let (mut engine, cash, bank) = cash_and_bank().await;
    let id = engine
        .add_transaction(
            TransactionDraft::expense(cash.clone(), Money::new(30_00), today()).category("Food"),
        )
        .await
        .unwrap();
    let opening = |engine: &Engine<MemoryStore>, account: &AccountId| {
        let effect = engine
            .balance_effects()
            .get(account)
            .copied()
            .unwrap_or_default();
        balance(engine, account) - effect
    };

    engine
        .update_transaction(&id, TransactionPatch::default().amount(Money::new(10_00)))
        .await
        .unwrap();
    assert_eq!(balance(&engine, &cash), Money::new(90_00));

    engine
        .update_transaction(&id, TransactionPatch::default().account(bank.clone()))
        .await
        .unwrap();
    assert_eq!(balance(&engine, &cash), Money::new(100_00));
    assert_eq!(balance(&engine, &bank), Money::new(40_00));

    let transfer = engine
        .update_transaction(
            &id,
            TransactionPatch::default()
                .kind(TransactionKind::Transfer)
                .to_account(Some(cash.clone()))
                .category(""),
        )
        .await
        .unwrap();
    assert_eq!(transfer.category, "Transfer from Bank to Cash");
    assert_eq!(balance(&engine, &cash), Money::new(110_00));
    assert_eq!(balance(&engine, &bank), Money::new(40_00));
    assert_eq!(opening(&engine, &cash), Money::new(100_00));
    assert_eq!(opening(&engine, &bank), Money::new(50_00));

    // Back to income: the destination goes away with the kind.
    let income = engine
        .update_transaction(
            &id,
            TransactionPatch::default()
                .kind(TransactionKind::Income)
                .category("Gift"),
        )
        .await
        .unwrap();
    assert_eq!(income.to_account, None);
    assert_eq!(balance(&engine, &bank), Money::new(60_00));
    assert_eq!(balance(&engine, &cash), Money::new(100_00));

    engine.delete_transaction(&id).await.unwrap();
    assert_eq!(balance(&engine, &cash), Money::new(100_00));
    assert_eq!(balance(&engine, &bank), Money::new(50_00));
    assert!(engine.balance_effects().is_empty());
    assert_eq!(
        engine.delete_transaction(&id).await.map(|_| ()),
        Err(EngineError::NotFound(id.to_string()))
    );
}

#[tokio::test]
async fn failed_update_keeps_the_transaction() {
    let (mut engine, cash, bank) = cash_and_bank().await;
    let id = engine
        .add_transaction(TransactionDraft::transfer(
            bank.clone(),
            cash.clone(),
            Money::new(50_00),
            today(),
        ))
        .await
        .unwrap();

    // Bank is at zero, the 50 already moved does not count twice.
    engine
        .update_transaction(&id, TransactionPatch::default().amount(Money::new(50_00)))
        .await
        .unwrap();
    assert!(matches!(
        engine
            .update_transaction(&id, TransactionPatch::default().amount(Money::new(50_01)))
            .await,
        Err(EngineError::InsufficientFunds(_))
    ));
    assert_eq!(engine.transaction(&id).unwrap().amount, Money::new(50_00));
    assert_eq!(balance(&engine, &bank), Money::ZERO);
    assert_eq!(balance(&engine, &cash), Money::new(150_00));
}

#[tokio::test]
async fn history_is_filtered_and_newest_first() {
    let (mut engine, cash, bank) = cash_and_bank().await;
    let first = engine
        .add_transaction(
            TransactionDraft::expense(cash.clone(), Money::new(1_00), day(2024, 5, 2))
                .category("Food")
                .notes("pizza night"),
        )
        .await
        .unwrap();
    let second = engine
        .add_transaction(
            TransactionDraft::income(bank.clone(), Money::new(2_00), day(2024, 5, 2))
                .category("Gift"),
        )
        .await
        .unwrap();
    let older = engine
        .add_transaction(
            TransactionDraft::lend(cash.clone(), Money::new(3_00), day(2024, 4, 1), "Ann")
                .category("Personal"),
        )
        .await
        .unwrap();

    let all: Vec<&TransactionId> = engine
        .list_transactions(&TransactionFilter::default())
        .into_iter()
        .map(|tx| &tx.id)
        .collect();
    assert_eq!(all, vec![&second, &first, &older]);

    let ids = |filter: TransactionFilter| -> Vec<TransactionId> {
        engine
            .list_transactions(&filter)
            .into_iter()
            .map(|tx| tx.id.clone())
            .collect()
    };
    assert_eq!(ids(TransactionFilter::default().search("PIZZA")), vec![first.clone()]);
    assert_eq!(ids(TransactionFilter::default().search("ann")), vec![older.clone()]);
    assert_eq!(
        ids(TransactionFilter::default().account(cash.clone())),
        vec![first.clone(), older.clone()]
    );
    assert_eq!(
        ids(TransactionFilter::default()
            .kind(TransactionKind::Income)
            .kind(TransactionKind::Lend)),
        vec![second.clone(), older.clone()]
    );
    assert_eq!(
        ids(TransactionFilter::default().from(day(2024, 5, 1)).to(day(2024, 5, 31))),
        vec![second, first]
    );
}

#[tokio::test]
async fn range_and_budget_statistics() {
    let (mut engine, cash, bank) = cash_and_bank().await;
    engine
        .update_profile(ProfileUpdate::default().monthly_budget(Money::new(50_00)))
        .await
        .unwrap();

    let today = day(2024, 5, 15);
    for (cents, category, date) in [
        (20_00, "Food", day(2024, 5, 14)),
        (35_00, "Bills", day(2024, 5, 3)),
        (5_00, "Food", day(2024, 4, 30)),
    ] {
        engine
            .add_transaction(
                TransactionDraft::expense(cash.clone(), Money::new(cents), date).category(category),
            )
            .await
            .unwrap();
    }
    engine
        .add_transaction(
            TransactionDraft::income(bank, Money::new(10_00), day(2024, 5, 13)).category("Gift"),
        )
        .await
        .unwrap();

    let week = engine.range_stats(DateRange::Week, None, today);
    assert_eq!(week.expenses, Money::new(20_00));
    assert_eq!(week.income, Money::new(10_00));
    assert_eq!(week.count, 2);

    let month = engine.range_stats(DateRange::Month, Some(TransactionKind::Expense), today);
    assert_eq!(month.count, 2);
    assert_eq!(month.expense_by_category[0].category, "Bills");
    assert_eq!(month.income, Money::ZERO);

    let all = engine.range_stats(DateRange::All, None, today);
    assert_eq!(all.from, day(2024, 4, 30));
    assert_eq!(all.expenses, Money::new(60_00));

    let budget = engine.budget_status_at(today);
    assert_eq!(budget.spent, Money::new(55_00));
    assert_eq!(budget.remaining, Money::new(-5_00));
    assert!(budget.over_budget);
}

#[tokio::test]
async fn setup_creates_the_opening_accounts_in_order() {
    let mut engine = engine().await;
    engine
        .complete_setup(
            ProfileUpdate::default().name("Ada").currency("eur"),
            OpeningAccount::defaults(Money::new(10_00), Money::new(20_00)),
        )
        .await
        .unwrap();

    let profile = engine.profile();
    assert!(profile.is_setup_complete);
    assert_eq!(profile.currency, "EUR");

    let names: Vec<&str> = engine
        .accounts_list()
        .into_iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, ["Cash", "Bank"]);
    assert_eq!(engine.total_balance(), Money::new(30_00));

    let mut other = self::engine().await;
    let duplicated = other
        .complete_setup(
            ProfileUpdate::default().name("Bob"),
            vec![
                OpeningAccount::new("Wallet", AccountKind::Cash, Money::ZERO),
                OpeningAccount::new("wallet", AccountKind::Cash, Money::ZERO),
            ],
        )
        .await;
    assert_eq!(duplicated, Err(EngineError::DuplicateName("wallet".to_string())));
    assert!(!other.profile().is_setup_complete);
    assert!(other.accounts_list().is_empty());
}

use std::{io::BufRead, path::Path};

use chrono::{Local, NaiveDate, Utc};
use engine::{
    AccountId, AccountPatch, AutoBackup, BackupFileKind, DateRange, Engine, EngineError,
    OpeningAccount, ProfileUpdate, SqliteStore, Transaction, TransactionDraft, TransactionFilter,
    TransactionId, TransactionPatch, is_valid_pin, suggested_categories,
};
use serde::Serialize;
use tracing::info;

use crate::{
    cli::{
        AccountCommand, BackupCommand, Command, PinCommand, ProfileCommand, ProfileUpdateArgs,
        SetupArgs, StatsCommand, TxAddArgs, TxCommand, TxListArgs, TxUpdateArgs,
    },
    error::{AppError, Result},
    prompt,
    settings::Settings,
};

pub struct Context {
    pub engine: Engine<SqliteStore>,
    pub settings: Settings,
    pub json: bool,
}

pub async fn run(ctx: &mut Context, command: Command) -> Result<()> {
    match command {
        Command::Setup(args) => setup(ctx, args).await,
        Command::Profile(profile) => match profile.command {
            ProfileCommand::Show => show_profile(ctx),
            ProfileCommand::Update(args) => update_profile(ctx, args).await,
        },
        Command::Pin(pin) => match pin.command {
            PinCommand::Set => {
                unlock(&mut ctx.engine)?;
                let pin = new_pin()?;
                ctx.engine
                    .update_profile(ProfileUpdate::default().pin(pin))
                    .await?;
                println!("PIN updated.");
                Ok(())
            }
            PinCommand::Remove => {
                unlock(&mut ctx.engine)?;
                ctx.engine.remove_pin().await;
                println!("PIN removed.");
                Ok(())
            }
        },
        Command::Account(account) => run_account(ctx, account.command).await,
        Command::Tx(tx) => run_tx(ctx, tx.command).await,
        Command::Stats(stats) => run_stats(ctx, stats.command),
        Command::Categories { kind } => {
            let list = suggested_categories(kind);
            if ctx.json {
                return print_json(&list);
            }
            for category in list {
                println!("{category}");
            }
            Ok(())
        }
        Command::Backup(backup) => run_backup(ctx, backup.command).await,
        Command::Clear { yes } => {
            unlock(&mut ctx.engine)?;
            let question = "This deletes every account and transaction. Type 'yes' to go on: ";
            if !yes && !confirm(question)? {
                println!("Aborted.");
                return Ok(());
            }
            ctx.engine.clear_all().await?;
            println!("All data cleared.");
            Ok(())
        }
    }
}

/// Asks for the PIN when one is set and no session is open.
fn unlock(engine: &mut Engine<SqliteStore>) -> Result<()> {
    if !engine.profile().has_pin() || engine.is_authenticated() {
        return Ok(());
    }
    let pin = prompt::read_pin()?;
    if engine.authenticate(&pin) {
        Ok(())
    } else {
        Err(AppError::WrongPin)
    }
}

fn new_pin() -> Result<String> {
    prompt::prompt_new_secret("PIN", is_valid_pin, "PIN must be 4 to 8 digits.")
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question}");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}

/// Accepts an account id or an account name.
fn resolve_account(engine: &Engine<SqliteStore>, raw: &str) -> Result<AccountId> {
    let id = AccountId::from(raw);
    if engine.account(&id).is_ok() {
        return Ok(id);
    }
    engine
        .account_by_name(raw)
        .map(|account| account.id.clone())
        .ok_or_else(|| EngineError::AccountNotFound(raw.to_string()).into())
}

fn account_name(engine: &Engine<SqliteStore>, id: &AccountId) -> String {
    engine
        .account(id)
        .map(|account| account.name.clone())
        .unwrap_or_else(|_| id.to_string())
}

async fn setup(ctx: &mut Context, args: SetupArgs) -> Result<()> {
    if ctx.engine.profile().is_setup_complete {
        return Err(AppError::Usage(
            "setup already done, use `mvault profile update`".to_string(),
        ));
    }

    let mut update = ProfileUpdate::default()
        .name(args.name)
        .email(args.email)
        .currency(args.currency)
        .monthly_budget(args.budget);
    if !args.no_pin {
        update = update.pin(new_pin()?);
    }

    ctx.engine
        .complete_setup(update, OpeningAccount::defaults(args.cash, args.bank))
        .await?;
    println!("Welcome, {}.", ctx.engine.profile().name);
    Ok(())
}

fn show_profile(ctx: &Context) -> Result<()> {
    let profile = ctx.engine.profile();
    if ctx.json {
        return print_json(&profile.without_pin());
    }
    println!("Name:      {}", profile.name);
    println!("Email:     {}", profile.email.as_deref().unwrap_or("-"));
    println!("Currency:  {}", profile.currency);
    println!("Budget:    {}", profile.monthly_budget.with_currency(&profile.currency));
    println!("Theme:     {:?}", profile.theme);
    println!("PIN:       {}", if profile.has_pin() { "set" } else { "not set" });
    println!("Setup:     {}", if profile.is_setup_complete { "complete" } else { "pending" });
    Ok(())
}

async fn update_profile(ctx: &mut Context, args: ProfileUpdateArgs) -> Result<()> {
    unlock(&mut ctx.engine)?;

    let mut update = ProfileUpdate::default();
    if let Some(name) = args.name {
        update = update.name(name);
    }
    if let Some(email) = args.email {
        update = update.email(Some(email).filter(|e| !e.trim().is_empty()));
    }
    if let Some(currency) = args.currency {
        update = update.currency(currency);
    }
    if let Some(budget) = args.budget {
        update = update.monthly_budget(budget);
    }
    if let Some(theme) = args.theme {
        update = update.theme(theme);
    }
    if let Some(avatar) = args.avatar {
        update = update.avatar_uri(Some(avatar).filter(|a| !a.trim().is_empty()));
    }

    ctx.engine.update_profile(update).await?;
    show_profile(ctx)
}

async fn run_account(ctx: &mut Context, command: AccountCommand) -> Result<()> {
    match command {
        AccountCommand::Add {
            name,
            kind,
            balance,
        } => {
            unlock(&mut ctx.engine)?;
            let id = ctx.engine.add_account(&name, kind, balance).await?;
            println!("{id}");
        }
        AccountCommand::List => {
            let accounts = ctx.engine.accounts_list();
            if ctx.json {
                return print_json(&accounts);
            }
            let currency = ctx.engine.profile().currency.clone();
            for account in accounts {
                println!(
                    "{:<20} {:<10} {:>14}  {}",
                    account.name,
                    account.kind,
                    account.balance.with_currency(&currency),
                    account.id
                );
            }
            println!(
                "{:<20} {:<10} {:>14}",
                "Total",
                "",
                ctx.engine.total_balance().with_currency(&currency)
            );
        }
        AccountCommand::Update {
            account,
            name,
            kind,
            balance,
        } => {
            unlock(&mut ctx.engine)?;
            let id = resolve_account(&ctx.engine, &account)?;
            let mut patch = AccountPatch::default();
            if let Some(name) = name {
                patch = patch.name(name);
            }
            if let Some(kind) = kind {
                patch = patch.kind(kind);
            }
            if let Some(balance) = balance {
                patch = patch.balance(balance);
            }
            if patch.is_empty() {
                return Err(AppError::Usage("nothing to update".to_string()));
            }
            let updated = ctx.engine.update_account(&id, patch).await?;
            if ctx.json {
                return print_json(&updated);
            }
            println!("{} updated.", updated.name);
        }
        AccountCommand::Delete { account } => {
            unlock(&mut ctx.engine)?;
            let id = resolve_account(&ctx.engine, &account)?;
            ctx.engine.delete_account(&id).await?;
            println!("Account deleted.");
        }
    }
    Ok(())
}

async fn run_tx(ctx: &mut Context, command: TxCommand) -> Result<()> {
    match command {
        TxCommand::Add(args) => add_tx(ctx, args).await,
        TxCommand::List(args) => list_tx(ctx, args),
        TxCommand::Update(args) => update_tx(ctx, args).await,
        TxCommand::Delete { id } => {
            unlock(&mut ctx.engine)?;
            ctx.engine
                .delete_transaction(&TransactionId::from(id))
                .await?;
            println!("Transaction deleted.");
            Ok(())
        }
        TxCommand::Settle { id } => {
            unlock(&mut ctx.engine)?;
            ctx.engine
                .settle_borrow_lend(&TransactionId::from(id))
                .await?;
            println!("Settled.");
            Ok(())
        }
        TxCommand::Unsettle { id } => {
            unlock(&mut ctx.engine)?;
            ctx.engine
                .set_settled(&TransactionId::from(id), false)
                .await?;
            println!("Marked as unsettled.");
            Ok(())
        }
    }
}

async fn add_tx(ctx: &mut Context, args: TxAddArgs) -> Result<()> {
    unlock(&mut ctx.engine)?;

    let account = resolve_account(&ctx.engine, &args.account)?;
    let mut draft = TransactionDraft::new(
        args.kind,
        account,
        args.amount,
        args.date.unwrap_or_else(today),
    )
    .category(args.category)
    .notes(args.notes);
    if let Some(to) = args.to {
        draft = draft.to_account(resolve_account(&ctx.engine, &to)?);
    }
    if let Some(person) = args.person {
        draft = draft.counterparty(person);
    }

    let id = ctx.engine.add_transaction(draft).await?;
    info!(transaction = %id, "recorded from cli");
    println!("{id}");
    Ok(())
}

fn list_tx(ctx: &Context, args: TxListArgs) -> Result<()> {
    let mut filter = TransactionFilter {
        kinds: args.kind,
        search: args.search,
        from: args.from,
        to: args.to,
        ..TransactionFilter::default()
    };
    if let Some(account) = args.account {
        filter = filter.account(resolve_account(&ctx.engine, &account)?);
    }

    let list = ctx.engine.list_transactions(&filter);
    if ctx.json {
        return print_json(&list);
    }
    for tx in list {
        println!("{}", describe(&ctx.engine, tx));
    }
    Ok(())
}

fn describe(engine: &Engine<SqliteStore>, tx: &Transaction) -> String {
    let accounts = match &tx.to_account {
        Some(to) => format!(
            "{} -> {}",
            account_name(engine, &tx.account),
            account_name(engine, to)
        ),
        None => account_name(engine, &tx.account),
    };
    let mut line = format!(
        "{}  {:<8} {:>12}  {:<24} {}",
        tx.date, tx.kind, tx.amount, tx.category, accounts
    );
    if let Some(person) = &tx.counterparty {
        line.push_str(&format!("  ({person})"));
    }
    if tx.kind.is_debt() && tx.settled {
        line.push_str("  [settled]");
    }
    line.push_str(&format!("  {}", tx.id));
    line
}

async fn update_tx(ctx: &mut Context, args: TxUpdateArgs) -> Result<()> {
    unlock(&mut ctx.engine)?;

    let mut patch = TransactionPatch::default();
    if let Some(kind) = args.kind {
        patch = patch.kind(kind);
    }
    if let Some(amount) = args.amount {
        patch = patch.amount(amount);
    }
    if let Some(account) = args.account {
        patch = patch.account(resolve_account(&ctx.engine, &account)?);
    }
    if let Some(to) = args.to {
        patch = patch.to_account(Some(resolve_account(&ctx.engine, &to)?));
    }
    if let Some(category) = args.category {
        patch = patch.category(category);
    }
    if let Some(date) = args.date {
        patch = patch.date(date);
    }
    if let Some(notes) = args.notes {
        patch = patch.notes(notes);
    }
    if let Some(person) = args.person {
        patch = patch.counterparty(Some(person));
    }

    let updated = ctx
        .engine
        .update_transaction(&TransactionId::from(args.id), patch)
        .await?;
    if ctx.json {
        return print_json(&updated);
    }
    println!("{}", describe(&ctx.engine, &updated));
    Ok(())
}

fn run_stats(ctx: &Context, command: StatsCommand) -> Result<()> {
    let currency = ctx.engine.profile().currency.as_str();
    match command {
        StatsCommand::Month => {
            let stats = ctx.engine.monthly_stats();
            if ctx.json {
                return print_json(&stats);
            }
            println!("Income:    {}", stats.income.with_currency(currency));
            println!("Expenses:  {}", stats.expenses.with_currency(currency));
            println!("Borrowed:  {}", stats.borrow_amount.with_currency(currency));
            println!("Lent:      {}", stats.lend_amount.with_currency(currency));
            println!("Cashflow:  {}", stats.cashflow.with_currency(currency));
        }
        StatsCommand::Range {
            period,
            from,
            to,
            kind,
        } => {
            let range = match (from, to) {
                (Some(from), Some(to)) => DateRange::Custom { from, to },
                _ => DateRange::try_from(period.as_str())?,
            };
            let stats = ctx.engine.range_stats(range, kind, today());
            if ctx.json {
                return print_json(&stats);
            }
            println!("{} .. {} ({} transactions)", stats.from, stats.to, stats.count);
            println!("Income:    {}", stats.income.with_currency(currency));
            println!("Expenses:  {}", stats.expenses.with_currency(currency));
            println!("Borrowed:  {}", stats.borrow.with_currency(currency));
            println!("Lent:      {}", stats.lend.with_currency(currency));
            for (title, totals) in [
                ("Expenses by category", &stats.expense_by_category),
                ("Income by category", &stats.income_by_category),
            ] {
                if totals.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for total in totals {
                    println!(
                        "  {:<24} {:>14}",
                        total.category,
                        total.amount.with_currency(currency)
                    );
                }
            }
        }
        StatsCommand::Budget => {
            let status = ctx.engine.budget_status_at(today());
            if ctx.json {
                return print_json(&status);
            }
            println!("Budget:    {}", status.budget.with_currency(currency));
            println!("Spent:     {}", status.spent.with_currency(currency));
            println!("Remaining: {}", status.remaining.with_currency(currency));
            if status.over_budget {
                println!("Over budget!");
            }
        }
    }
    Ok(())
}

async fn run_backup(ctx: &mut Context, command: BackupCommand) -> Result<()> {
    match command {
        BackupCommand::Export { dir } => {
            unlock(&mut ctx.engine)?;
            let dir = dir.unwrap_or_else(|| ctx.settings.backup_dir.clone());
            let password = prompt::prompt_new_secret(
                "backup password",
                |p| !p.is_empty(),
                "Password must not be empty.",
            )?;
            let path = ctx.engine.write_backup(&dir, &password, today()).await?;
            println!("{}", path.display());
        }
        BackupCommand::Import { path } => {
            unlock(&mut ctx.engine)?;
            import_backup(ctx, &path).await?;
        }
        BackupCommand::Auto { dir } => {
            let dir = dir.unwrap_or_else(|| ctx.settings.backup_dir.clone());
            let mut auto = AutoBackup::default();
            match auto
                .run(&ctx.engine, &dir, &ctx.settings.auto_backup_password, Utc::now())
                .await?
            {
                Some(path) => println!("{}", path.display()),
                None => println!("Nothing to back up yet, finish `mvault setup` first."),
            }
        }
    }
    Ok(())
}

async fn import_backup(ctx: &mut Context, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let password = match BackupFileKind::detect(&name)? {
        BackupFileKind::Obfuscated => prompt::prompt_secret("Backup password: ")?,
        BackupFileKind::LegacyJson => String::new(),
    };

    ctx.engine.restore_backup_file(path, &password).await?;
    println!(
        "Imported {} accounts and {} transactions. Set a new PIN with `mvault pin set`.",
        ctx.engine.accounts_list().len(),
        ctx.engine.transactions().len()
    );
    Ok(())
}

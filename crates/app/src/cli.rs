use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{AccountKind, Money, Theme, TransactionKind};

#[derive(Parser, Debug)]
#[command(name = "mvault", version)]
#[command(about = "Personal finance ledger: accounts, transactions, budgets and backups")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the database URL (e.g. sqlite:./mvault.db?mode=rwc).
    #[arg(long, global = true)]
    pub database_url: Option<String>,
    /// Override the log level.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// First run: profile, PIN and opening accounts.
    Setup(SetupArgs),
    Profile(Profile),
    Pin(Pin),
    Account(Account),
    Tx(Tx),
    Stats(Stats),
    /// Suggested categories for a transaction type.
    Categories {
        #[arg(value_parser = parse_tx_kind)]
        kind: TransactionKind,
    },
    Backup(Backup),
    /// Delete every profile, account and transaction.
    Clear {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long, default_value = "USD")]
    pub currency: String,
    #[arg(long, default_value = "0")]
    pub budget: Money,
    /// Opening balance of the Cash account.
    #[arg(long, default_value = "0")]
    pub cash: Money,
    /// Opening balance of the Bank account.
    #[arg(long, default_value = "0")]
    pub bank: Money,
    /// Skip the PIN.
    #[arg(long)]
    pub no_pin: bool,
}

#[derive(Args, Debug)]
pub struct Profile {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Update(ProfileUpdateArgs),
}

#[derive(Args, Debug)]
pub struct ProfileUpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub currency: Option<String>,
    #[arg(long)]
    pub budget: Option<Money>,
    #[arg(long, value_parser = parse_theme)]
    pub theme: Option<Theme>,
    #[arg(long)]
    pub avatar: Option<String>,
}

#[derive(Args, Debug)]
pub struct Pin {
    #[command(subcommand)]
    pub command: PinCommand,
}

#[derive(Subcommand, Debug)]
pub enum PinCommand {
    Set,
    Remove,
}

#[derive(Args, Debug)]
pub struct Account {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    Add {
        name: String,
        #[arg(long, value_parser = parse_account_kind, default_value = "other")]
        kind: AccountKind,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        balance: Money,
    },
    List,
    Update {
        /// Account name or id.
        account: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_account_kind)]
        kind: Option<AccountKind>,
        #[arg(long, allow_negative_numbers = true)]
        balance: Option<Money>,
    },
    Delete {
        account: String,
    },
}

#[derive(Args, Debug)]
pub struct Tx {
    #[command(subcommand)]
    pub command: TxCommand,
}

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    Add(TxAddArgs),
    List(TxListArgs),
    Update(TxUpdateArgs),
    Delete { id: String },
    /// Mark a borrow/lend as settled.
    Settle { id: String },
    Unsettle { id: String },
}

#[derive(Args, Debug)]
pub struct TxAddArgs {
    #[arg(value_parser = parse_tx_kind)]
    pub kind: TransactionKind,
    pub amount: Money,
    /// Source account name or id.
    #[arg(long)]
    pub account: String,
    /// Destination account, transfers only.
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long, default_value = "")]
    pub category: String,
    /// Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    pub notes: String,
    /// Counterparty of a borrow/lend.
    #[arg(long)]
    pub person: Option<String>,
}

#[derive(Args, Debug)]
pub struct TxListArgs {
    #[arg(long, value_parser = parse_tx_kind)]
    pub kind: Vec<TransactionKind>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub account: Option<String>,
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct TxUpdateArgs {
    pub id: String,
    #[arg(long, value_parser = parse_tx_kind)]
    pub kind: Option<TransactionKind>,
    #[arg(long)]
    pub amount: Option<Money>,
    #[arg(long)]
    pub account: Option<String>,
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub person: Option<String>,
}

#[derive(Args, Debug)]
pub struct Stats {
    #[command(subcommand)]
    pub command: StatsCommand,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommand {
    /// Current month totals and cashflow.
    Month,
    Range {
        /// week, month, year or all. Ignored with --from/--to.
        #[arg(long, default_value = "month")]
        period: String,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[arg(long, value_parser = parse_tx_kind)]
        kind: Option<TransactionKind>,
    },
    Budget,
}

#[derive(Args, Debug)]
pub struct Backup {
    #[command(subcommand)]
    pub command: BackupCommand,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    Export {
        /// Target directory, defaults to `backup_dir`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    Import {
        path: PathBuf,
    },
    /// Write the automatic backup with the configured password.
    Auto {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn parse_tx_kind(raw: &str) -> Result<TransactionKind, String> {
    TransactionKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_account_kind(raw: &str) -> Result<AccountKind, String> {
    AccountKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_theme(raw: &str) -> Result<Theme, String> {
    Theme::try_from(raw).map_err(|err| err.to_string())
}

//! These structs provide the CLI interface for the budget CLI.

use crate::ledger::Filter;
use crate::model::{Amount, MonthKey, Split, TransactionDraft, TransactionId};
use crate::store::Backend;
use clap::{Parser, Subcommand, ValueEnum};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: track monthly income and expenses from the command line.
///
/// Transactions are kept per calendar month. The month you are looking at is remembered between
/// runs; move it with `budget month previous|next|current`. Every other command works on that
/// month.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the budget home directory and its configuration.
    ///
    /// This is the first command you should run. By default the home is $HOME/budget; pass
    /// --budget-home or set BUDGET_HOME to put it somewhere else.
    Init(InitArgs),
    /// Sign in. Every data command works on the signed-in user's transactions.
    Login(LoginArgs),
    /// Sign out.
    Logout,
    /// Show or move the month being viewed.
    Month(MonthArgs),
    /// Add a transaction to the month being viewed.
    Add(Box<AddArgs>),
    /// Delete a transaction, by id, from the month being viewed.
    Delete(DeleteArgs),
    /// List the month's transactions by day, optionally filtered.
    List(ListArgs),
    /// Show the month's totals and breakdowns by tag, account and person.
    Summary,
    /// List every person named in any month.
    People,
    /// Copy last month's recurring transactions into the month being viewed.
    Carry,
    /// Export the month's transactions as CSV.
    Export(ExportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where budget data and configuration is held. Defaults to ~/budget
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// Args for the `budget init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Where transactions are stored.
    #[arg(long, value_enum, default_value_t = Backend::Json)]
    backend: Backend,
}

impl InitArgs {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }
}

/// Args for the `budget login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// The user name. Letters, digits, '.', '_' and '-'.
    #[arg(long)]
    user: String,
}

impl LoginArgs {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

/// Where `budget month` should move the cursor.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum MonthAction {
    /// Do not move, only print the month.
    #[default]
    Show,
    /// One month back.
    Previous,
    /// One month forward.
    Next,
    /// Back to the month containing today.
    Current,
}

/// Args for the `budget month` command.
#[derive(Debug, Parser, Clone)]
pub struct MonthArgs {
    #[arg(value_enum, default_value_t = MonthAction::Show)]
    action: MonthAction,

    /// Jump straight to a month, YYYY-MM. Overrides the action.
    #[arg(long)]
    to: Option<MonthKey>,
}

impl MonthArgs {
    pub fn new(action: MonthAction, to: Option<MonthKey>) -> Self {
        Self { action, to }
    }

    pub fn action(&self) -> MonthAction {
        self.action
    }

    pub fn to(&self) -> Option<MonthKey> {
        self.to
    }
}

/// Args for the `budget add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// Who was paid, or who paid you.
    #[arg(long)]
    merchant: String,

    /// The amount, e.g. 1200, 1,200.00 or $1,200.00.
    #[arg(long)]
    amount: Amount,

    /// The account the money moved through.
    #[arg(long, default_value = "")]
    account: String,

    /// The day of the month.
    #[arg(long)]
    day: u8,

    /// "income", or an expense tag such as "groceries".
    #[arg(long)]
    tag: String,

    /// The person this transaction is for.
    #[arg(long)]
    person: Option<String>,

    /// Mark the transaction as recurring so `budget carry` copies it into the next month.
    #[arg(long)]
    recurring: bool,

    /// Split the amount: CATEGORY:AMOUNT or CATEGORY:AMOUNT:PERSON. Repeat for each split. The
    /// splits must add up to the amount.
    #[arg(long = "split")]
    splits: Vec<Split>,
}

impl AddArgs {
    pub fn new(draft: TransactionDraft, splits: Vec<Split>) -> Self {
        Self {
            merchant: draft.merchant,
            amount: draft.amount,
            account: draft.account,
            day: draft.day,
            tag: draft.tag.to_string(),
            person: draft.person,
            recurring: draft.recurring,
            splits,
        }
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// The form fields as a draft. Splitting is enabled when any split was given.
    pub fn draft(&self) -> TransactionDraft {
        let draft = TransactionDraft::new(
            self.merchant.as_str(),
            self.amount,
            self.account.as_str(),
            self.day,
            self.tag.as_str(),
        )
        .recurring(self.recurring)
        .split(!self.splits.is_empty());
        match &self.person {
            Some(person) => draft.person(person.as_str()),
            None => draft,
        }
    }
}

/// Args for the `budget delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id shown by `budget list`.
    #[arg(long)]
    id: TransactionId,
}

impl DeleteArgs {
    pub fn new(id: TransactionId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }
}

/// Args for the `budget list` command. Every given filter must match.
#[derive(Debug, Default, Parser, Clone)]
pub struct ListArgs {
    /// Case-insensitive text in the merchant.
    #[arg(long)]
    search: Option<String>,

    /// Exact tag.
    #[arg(long)]
    tag: Option<String>,

    /// Exact account.
    #[arg(long)]
    account: Option<String>,

    /// Exact person, on the transaction or any of its splits.
    #[arg(long)]
    person: Option<String>,
}

impl ListArgs {
    pub fn filter(&self) -> Filter {
        Filter {
            search: self.search.clone(),
            tag: self.tag.clone(),
            account: self.account.clone(),
            person: self.person.clone(),
        }
    }
}

impl From<Filter> for ListArgs {
    fn from(filter: Filter) -> Self {
        Self {
            search: filter.search,
            tag: filter.tag,
            account: filter.account,
            person: filter.person,
        }
    }
}

/// Args for the `budget export` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ExportArgs {
    /// Write to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(out: Option<PathBuf>) -> Self {
        Self { out }
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("budget")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(
            ["budget", "--budget-home", "/tmp/b"]
                .iter()
                .chain(args.iter()),
        )
        .unwrap()
    }

    #[test]
    fn test_add_with_splits() {
        let args = parse(&[
            "add",
            "--merchant",
            "Dinner",
            "--amount",
            "$90.00",
            "--day",
            "9",
            "--tag",
            "Dining",
            "--split",
            "dining:30:Ana",
            "--split",
            "dining:60",
        ]);
        let Command::Add(add) = args.command() else {
            panic!("expected add, got {:?}", args.command());
        };
        let draft = add.draft();
        assert!(draft.split);
        assert_eq!(draft.amount, Amount::from(90));
        assert_eq!(draft.tag.as_str(), "dining");
        assert_eq!(add.splits().len(), 2);
        assert_eq!(add.splits()[0].person(), Some("Ana"));
    }

    #[test]
    fn test_add_rejects_bad_split() {
        let res = Args::try_parse_from([
            "budget", "add", "--merchant", "x", "--amount", "1", "--day", "1", "--tag", "t",
            "--split", "nope",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_month_action() {
        let args = parse(&["month", "previous"]);
        let Command::Month(month) = args.command() else {
            panic!("expected month");
        };
        assert_eq!(month.action(), MonthAction::Previous);

        let args = parse(&["month", "--to", "2024-03"]);
        let Command::Month(month) = args.command() else {
            panic!("expected month");
        };
        assert_eq!(month.action(), MonthAction::Show);
        assert_eq!(month.to(), MonthKey::new(2024, 3));

        assert!(Args::try_parse_from(["budget", "month", "--to", "2024-3"]).is_err());
    }

    #[test]
    fn test_common_defaults() {
        let args = parse(&["summary"]);
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        assert_eq!(args.common().budget_home().path(), Path::new("/tmp/b"));
    }

    #[test]
    fn test_list_filter() {
        let args = parse(&["list", "--tag", "food", "--person", "Ana"]);
        let Command::List(list) = args.command() else {
            panic!("expected list");
        };
        let filter = list.filter();
        assert_eq!(filter.tag.as_deref(), Some("food"));
        assert_eq!(filter.search, None);
    }
}

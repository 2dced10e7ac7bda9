use clap::{Parser, Subcommand, ValueEnum};
use ledgerpulse_core::View;

#[derive(Parser, Debug)]
#[command(name = "ledgerpulse", about = "Live finance dashboard in the terminal.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Screen whose data is kept fresh
    #[arg(long, value_enum, env = "LEDGERPULSE_VIEW", default_value_t = ViewArg::Overview)]
    pub view: ViewArg,

    /// Username for a fresh login; unused when a stored session exists
    #[arg(long, env = "LEDGERPULSE_USERNAME")]
    pub username: Option<String>,

    /// Password for a fresh login
    #[arg(long, env = "LEDGERPULSE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Remove the stored session from the OS keyring.
    Logout,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArg {
    Overview,
    Transactions,
    Reports,
}

impl From<ViewArg> for View {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Overview => View::Overview,
            ViewArg::Transactions => View::Transactions,
            ViewArg::Reports => View::Reports,
        }
    }
}

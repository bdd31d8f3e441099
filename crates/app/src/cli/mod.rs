use clap::{Parser, Subcommand};

mod db;
mod solution;
mod token;
mod voucher;

#[derive(Debug, Parser)]
#[command(name = "agora-app", about = "Agora CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Token(token::TokenCommand),
    Solution(solution::SolutionCommand),
    Voucher(voucher::VoucherCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Token(command) => token::run(command).await,
            Commands::Solution(command) => solution::run(command).await,
            Commands::Voucher(command) => voucher::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}

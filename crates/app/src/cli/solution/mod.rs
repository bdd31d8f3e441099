use agora_app::{
    database::{self, Db},
    domain::solutions::{PgSolutionsService, SolutionsService, data::NewSolution, records::SolutionUuid},
};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Args)]
pub(crate) struct SolutionCommand {
    #[command(subcommand)]
    command: SolutionSubcommand,
}

#[derive(Debug, Subcommand)]
enum SolutionSubcommand {
    /// Add a purchasable solution
    Create(CreateSolutionArgs),
}

#[derive(Debug, Args)]
struct CreateSolutionArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    title: String,

    #[arg(long)]
    description: Option<String>,

    /// Price in naira
    #[arg(long)]
    price: Decimal,
}

pub(crate) async fn run(command: SolutionCommand) -> Result<(), String> {
    match command.command {
        SolutionSubcommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateSolutionArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let solution = PgSolutionsService::new(Db::new(pool))
        .create_solution(NewSolution {
            uuid: SolutionUuid::new(),
            title: args.title,
            description: args.description,
            price: args.price,
        })
        .await
        .map_err(|error| format!("failed to create solution: {error}"))?;

    println!("solution_uuid: {}", solution.uuid);
    println!("title: {}", solution.title);
    println!("price: {}", solution.price);

    Ok(())
}

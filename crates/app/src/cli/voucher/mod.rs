use agora_app::{
    database::{self, Db},
    domain::{
        solutions::records::SolutionUuid,
        vouchers::{
            PgVouchersService, VouchersService,
            data::NewVoucher,
            records::{Discount, VoucherUuid},
        },
    },
};
use clap::{Args, Subcommand, ValueEnum};
use jiff::Timestamp;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct VoucherCommand {
    #[command(subcommand)]
    command: VoucherSubcommand,
}

#[derive(Debug, Subcommand)]
enum VoucherSubcommand {
    /// Create a discount voucher
    Create(CreateVoucherArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DiscountKind {
    Percentage,
    Fixed,
}

#[derive(Debug, Args)]
struct CreateVoucherArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Voucher code; stored upper-cased
    #[arg(long)]
    code: String,

    #[arg(long, value_enum)]
    discount_type: DiscountKind,

    #[arg(long)]
    discount_value: Decimal,

    /// Expiry timestamp (RFC 3339)
    #[arg(long)]
    expires_at: Timestamp,

    /// Maximum redemptions; 0 means unlimited
    #[arg(long, default_value_t = 0)]
    usage_limit: u32,

    #[arg(long)]
    once_per_user: bool,

    #[arg(long)]
    new_users_only: bool,

    #[arg(long, default_value_t = Decimal::ZERO)]
    min_cart_amount: Decimal,

    /// Restrict to a solution; repeatable
    #[arg(long = "solution")]
    solutions: Vec<Uuid>,

    /// Restrict to a buyer email; repeatable
    #[arg(long = "email")]
    emails: Vec<String>,
}

pub(crate) async fn run(command: VoucherCommand) -> Result<(), String> {
    match command.command {
        VoucherSubcommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateVoucherArgs) -> Result<(), String> {
    if args.expires_at <= Timestamp::now() {
        return Err("expires-at must be in the future".to_string());
    }

    let discount = match args.discount_type {
        DiscountKind::Percentage => Discount::Percentage(args.discount_value),
        DiscountKind::Fixed => Discount::Fixed(args.discount_value),
    };

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let voucher = PgVouchersService::new(Db::new(pool))
        .create_voucher(NewVoucher {
            uuid: VoucherUuid::new(),
            code: args.code,
            discount,
            expires_at: args.expires_at,
            usage_limit: args.usage_limit,
            once_per_user: args.once_per_user,
            applicable_solutions: args
                .solutions
                .into_iter()
                .map(SolutionUuid::from_uuid)
                .collect(),
            applicable_emails: args.emails,
            min_cart_amount: args.min_cart_amount,
            new_users_only: args.new_users_only,
        })
        .await
        .map_err(|error| format!("failed to create voucher: {error}"))?;

    println!("voucher_uuid: {}", voucher.uuid);
    println!("code: {}", voucher.code);
    println!(
        "discount: {} {}",
        voucher.discount.type_as_str(),
        voucher.discount.value()
    );
    println!("expires_at: {}", voucher.expires_at);

    Ok(())
}

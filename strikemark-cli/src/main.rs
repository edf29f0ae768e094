//! # Strikemark CLI
//!
//! Command-line host for strikemark prediction markets. The CLI realizes the
//! engine's sequential execution contract trivially: one operation per
//! invocation, with engine and vault state persisted to a JSON file in
//! between. Emitted events are printed after each mutating command, standing
//! in for the external indexer.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use serde::{Deserialize, Serialize};
use strikemark_core::utils::{format_bps, format_price, format_timestamp};
use strikemark_core::{
    AccountId, EngineConfig, InMemoryVault, Market, MarketEngine, MarketId, MarketStatus,
    PositionId, PriceUpdate, Side,
};

#[derive(Parser)]
#[command(name = "strikemark")]
#[command(about = "Oracle-settled binary prediction markets on price thresholds")]
#[command(version)]
struct Cli {
    /// Path of the JSON state file
    #[arg(long, global = true, default_value = "strikemark.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a fresh engine state file
    Init {
        /// Administrative principal
        #[arg(long, default_value = "admin")]
        admin: String,
    },
    /// Open a new market
    Open {
        /// Market description
        #[arg(short, long)]
        description: String,
        /// Price feed identifier (32-byte hex)
        #[arg(short, long)]
        feed: String,
        /// Strike threshold, unscaled at the feed exponent
        #[arg(short, long)]
        threshold: i64,
        /// Expected feed exponent
        #[arg(short, long, default_value_t = -8, allow_negative_numbers = true)]
        exponent: i32,
        /// Expiry (unix timestamp)
        #[arg(short = 'x', long)]
        expires: u64,
    },
    /// Fund an account in the local vault
    Fund {
        account: String,
        amount: u64,
    },
    /// Stake on a market side
    Stake {
        /// Market ID
        market: u64,
        /// Side to back
        side: SideArg,
        /// Stake amount
        amount: u64,
        /// Staking account
        #[arg(short, long)]
        account: String,
    },
    /// Resolve an expired market with a price update
    Resolve {
        /// Market ID
        market: u64,
        /// Unscaled price at the feed exponent
        price: i64,
        /// Feed exponent of the update
        #[arg(short, long, default_value_t = -8, allow_negative_numbers = true)]
        exponent: i32,
        /// Publish time (unix timestamp); defaults to now
        #[arg(short, long)]
        publish_time: Option<u64>,
        /// Aggregation round id, if the feed has one
        #[arg(short, long)]
        round: Option<u64>,
    },
    /// Claim the reward for a position
    Claim {
        /// Position ID
        position: u64,
        /// Claiming account (must own the position)
        #[arg(short, long)]
        account: String,
    },
    /// Transfer a position to a new owner
    Transfer {
        /// Position ID
        position: u64,
        /// Current owner
        #[arg(long)]
        from: String,
        /// New owner
        #[arg(long)]
        to: String,
    },
    /// Show market information
    Info {
        /// Market ID
        market: u64,
    },
    /// Show a position
    Position {
        /// Position ID
        position: u64,
    },
    /// List all markets
    List,
    /// List markets past expiry still awaiting resolution
    ListExpired,
    /// Show vault balances
    Balances,
    /// Show the fee treasury
    Treasury,
    /// Withdraw accrued fees (admin)
    Withdraw {
        /// Amount to withdraw
        amount: u64,
        /// Recipient account
        to: String,
        /// Administrative account
        #[arg(short, long, default_value = "admin")]
        account: String,
    },
    /// Set the protocol fee in basis points (admin)
    SetFee {
        bps: u16,
        /// Administrative account
        #[arg(short, long, default_value = "admin")]
        account: String,
    },
    /// Set the oracle staleness bound in seconds (admin)
    SetStaleness {
        secs: u64,
        /// Administrative account
        #[arg(short, long, default_value = "admin")]
        account: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    /// Price finishes under the threshold
    Below,
    /// Price finishes at or over the threshold
    Above,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Below => Side::Below,
            SideArg::Above => Side::Above,
        }
    }
}

/// Everything the host persists between invocations.
#[derive(Serialize, Deserialize)]
struct HostState {
    engine: MarketEngine,
    vault: InMemoryVault,
}

fn load_state(path: &Path) -> Result<HostState> {
    let raw = fs::read_to_string(path).with_context(|| {
        format!(
            "no state file at {}; run `strikemark init` first",
            path.display()
        )
    })?;
    serde_json::from_str(&raw)
        .with_context(|| format!("state file {} is corrupt", path.display()))
}

fn save_state(path: &Path, state: &HostState) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(state)?)
        .with_context(|| format!("failed to write state file {}", path.display()))?;
    Ok(())
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Print drained events the way the external indexer would consume them.
fn print_events(engine: &mut MarketEngine) -> Result<()> {
    for event in engine.drain_events() {
        let json = serde_json::to_string(&event)?;
        println!("{} {}", "event".bright_black(), json.bright_black());
    }
    Ok(())
}

fn print_market(market: &Market) {
    let status = match market.status {
        MarketStatus::Open => "Open".green().to_string(),
        MarketStatus::Resolved => "Resolved".blue().to_string(),
    };
    println!("{}", "═".repeat(50).bright_black());
    println!("{}: {}", "Market ID".yellow().bold(), market.id);
    println!("{}: {}", "Description".yellow().bold(), market.description);
    println!("{}: {}", "Feed".yellow().bold(), market.feed_id);
    println!(
        "{}: {}",
        "Threshold".yellow().bold(),
        format_price(market.threshold, market.expected_exponent)
    );
    println!(
        "{}: {}",
        "Expires".yellow().bold(),
        format_timestamp(market.expires_at)
    );
    println!("{}: {}", "Status".yellow().bold(), status);
    println!(
        "{}: {} (odds {:.2})",
        "Pool below".yellow().bold(),
        market.pool_below,
        market.odds(Side::Below)
    );
    println!(
        "{}: {} (odds {:.2})",
        "Pool above".yellow().bold(),
        market.pool_above,
        market.odds(Side::Above)
    );
    if let (Some(winner), Some(price)) = (market.winning_side, market.resolution_price) {
        println!("{}: {}", "Winning side".cyan().bold(), winner);
        println!(
            "{}: {}",
            "Resolution price".cyan().bold(),
            format_price(price, market.expected_exponent)
        );
    }
    if let Some(fee_bps) = market.resolved_fee_bps {
        println!("{}: {}", "Fee".yellow().bold(), format_bps(fee_bps));
    }
    println!("{}", "═".repeat(50).bright_black());
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { admin } => {
            if cli.state.exists() {
                bail!("state file {} already exists", cli.state.display());
            }
            let state = HostState {
                engine: MarketEngine::new(EngineConfig::new(AccountId::new(admin)))?,
                vault: InMemoryVault::new(),
            };
            save_state(&cli.state, &state)?;
            println!(
                "{} {}",
                "Initialized engine state at".green().bold(),
                cli.state.display()
            );
        }

        Commands::Open {
            description,
            feed,
            threshold,
            exponent,
            expires,
        } => {
            let mut state = load_state(&cli.state)?;
            let market_id =
                state
                    .engine
                    .open_market(&description, &feed, threshold, exponent, expires)?;
            println!("{}", "Market Created Successfully!".green().bold());
            let market = state.engine.market(market_id)?;
            print_market(&market);
            print_events(&mut state.engine)?;
            save_state(&cli.state, &state)?;
        }

        Commands::Fund { account, amount } => {
            let mut state = load_state(&cli.state)?;
            let account = AccountId::new(account);
            state.vault.deposit(&account, amount);
            println!(
                "{}: {} now holds {}",
                "Funded".green().bold(),
                account,
                state.vault.balance(&account)
            );
            save_state(&cli.state, &state)?;
        }

        Commands::Stake {
            market,
            side,
            amount,
            account,
        } => {
            let mut state = load_state(&cli.state)?;
            let staker = AccountId::new(account);
            // Collect the stake first; the engine reconciles the declared
            // amount against the value actually moved.
            state.vault.debit(&staker, amount)?;
            let receipt = state.engine.record_stake(
                MarketId(market),
                &staker,
                Side::from(side),
                amount,
                amount,
            )?;
            println!("{}", "Stake Recorded!".green().bold());
            println!(
                "{}: {}",
                "Position ID".yellow().bold(),
                receipt.position.to_string().cyan()
            );
            println!(
                "{}: below {} / above {}",
                "Pools".yellow().bold(),
                receipt.pool_below,
                receipt.pool_above
            );
            print_events(&mut state.engine)?;
            save_state(&cli.state, &state)?;
        }

        Commands::Resolve {
            market,
            price,
            exponent,
            publish_time,
            round,
        } => {
            let mut state = load_state(&cli.state)?;
            let update = PriceUpdate {
                price,
                exponent,
                publish_time: publish_time.unwrap_or_else(now),
                round,
            };
            let resolution = state.engine.resolve_market(MarketId(market), &update)?;
            println!("{}", "Market Resolved!".green().bold());
            println!(
                "{}: {}",
                "Winning side".cyan().bold(),
                resolution.winning_side
            );
            println!(
                "{}: {}",
                "Resolution price".cyan().bold(),
                format_price(resolution.price, exponent)
            );
            print_events(&mut state.engine)?;
            save_state(&cli.state, &state)?;
        }

        Commands::Claim { position, account } => {
            let mut state = load_state(&cli.state)?;
            let claimant = AccountId::new(account);
            let net = state
                .engine
                .claim_reward(PositionId(position), &claimant, &mut state.vault)?;
            println!("{}", "Reward Claimed!".green().bold());
            println!("{}: {}", "Net payout".cyan().bold(), net);
            println!(
                "{}: {}",
                "Balance".yellow().bold(),
                state.vault.balance(&claimant)
            );
            print_events(&mut state.engine)?;
            save_state(&cli.state, &state)?;
        }

        Commands::Transfer { position, from, to } => {
            let mut state = load_state(&cli.state)?;
            let from = AccountId::new(from);
            let to = AccountId::new(to);
            state
                .engine
                .transfer_position(PositionId(position), &from, &to)?;
            println!(
                "{}: position {} {} -> {}",
                "Transferred".green().bold(),
                position,
                from,
                to
            );
            print_events(&mut state.engine)?;
            save_state(&cli.state, &state)?;
        }

        Commands::Info { market } => {
            let state = load_state(&cli.state)?;
            let market = state.engine.market(MarketId(market))?;
            print_market(&market);
        }

        Commands::Position { position } => {
            let state = load_state(&cli.state)?;
            let position = state.engine.position(PositionId(position))?;
            println!("{}", "═".repeat(50).bright_black());
            println!("{}: {}", "Position ID".yellow().bold(), position.id);
            println!("{}: {}", "Owner".yellow().bold(), position.owner);
            println!("{}: {}", "Market".yellow().bold(), position.market);
            println!("{}: {}", "Side".yellow().bold(), position.side);
            println!("{}: {}", "Amount".yellow().bold(), position.amount);
            println!(
                "{}: {}",
                "Claimed".yellow().bold(),
                if position.claimed { "yes" } else { "no" }
            );
            println!("{}", "═".repeat(50).bright_black());
        }

        Commands::List => {
            let state = load_state(&cli.state)?;
            for market in state.engine.markets() {
                let status = match market.status {
                    MarketStatus::Open => "open".green().to_string(),
                    MarketStatus::Resolved => "resolved".blue().to_string(),
                };
                println!(
                    "{} [{}] {} (expires {})",
                    market.id.to_string().cyan(),
                    status,
                    market.description,
                    format_timestamp(market.expires_at)
                );
            }
        }

        Commands::ListExpired => {
            let state = load_state(&cli.state)?;
            let expired = state.engine.expired_unresolved();
            if expired.is_empty() {
                println!("{}", "No markets awaiting resolution.".yellow());
            }
            for market_id in expired {
                let market = state.engine.market(market_id)?;
                println!(
                    "{} {} (expired {})",
                    market_id.to_string().cyan(),
                    market.description,
                    format_timestamp(market.expires_at)
                );
            }
        }

        Commands::Balances => {
            let state = load_state(&cli.state)?;
            let mut accounts: Vec<_> = state.vault.accounts().collect();
            accounts.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (account, balance) in accounts {
                println!("{}: {}", account.to_string().yellow().bold(), balance);
            }
        }

        Commands::Treasury => {
            let state = load_state(&cli.state)?;
            println!(
                "{}: {}",
                "Treasury".yellow().bold(),
                state.engine.treasury_balance()
            );
            println!(
                "{}: {}",
                "Fee".yellow().bold(),
                format_bps(state.engine.config().fee_bps)
            );
        }

        Commands::Withdraw {
            amount,
            to,
            account,
        } => {
            let mut state = load_state(&cli.state)?;
            let confirmed = inquire::Confirm::new(&format!(
                "Withdraw {amount} from the treasury to {to}?"
            ))
            .with_default(false)
            .prompt()?;
            if !confirmed {
                println!("{}", "Withdrawal cancelled.".yellow());
                return Ok(());
            }
            let caller = AccountId::new(account);
            let to = AccountId::new(to);
            state
                .engine
                .withdraw_treasury(&caller, amount, &to, &mut state.vault)?;
            println!(
                "{}: {} remaining",
                "Withdrawn".green().bold(),
                state.engine.treasury_balance()
            );
            print_events(&mut state.engine)?;
            save_state(&cli.state, &state)?;
        }

        Commands::SetFee { bps, account } => {
            let mut state = load_state(&cli.state)?;
            state
                .engine
                .set_fee_basis_points(&AccountId::new(account), bps)?;
            println!(
                "{}: {}",
                "Protocol fee set to".green().bold(),
                format_bps(bps)
            );
            save_state(&cli.state, &state)?;
        }

        Commands::SetStaleness { secs, account } => {
            let mut state = load_state(&cli.state)?;
            state
                .engine
                .set_max_staleness(&AccountId::new(account), secs)?;
            println!("{}: {}s", "Staleness bound set to".green().bold(), secs);
            save_state(&cli.state, &state)?;
        }
    }

    Ok(())
}

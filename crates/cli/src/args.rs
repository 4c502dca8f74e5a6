use std::path::PathBuf;

use alloy::primitives::{Address, TxHash};
use clap::{Parser, Subcommand};
use tokendesk_sdk::types::OfferId;

pub(crate) const DEFAULT_CHAIN_ID: u64 = 1;

#[derive(Parser, Debug)]
#[command(name = "tokendesk", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Chain ID to operate on
    #[arg(long, global = true, default_value_t = DEFAULT_CHAIN_ID)]
    pub chain: u64,

    /// TOML file with chain overrides and extra tokens
    #[arg(long, global = true, env = "TOKENDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// RPC endpoint of the selected chain [default: built-in or configured
    /// endpoint]
    #[arg(long, global = true)]
    pub rpc: Option<String>,

    /// RPC throttling (req/sec) [default: none]
    #[arg(long, global = true)]
    pub rpc_throttle: Option<u32>,

    /// P2P exchange contract address on the selected chain [default:
    /// configured address]
    #[arg(long, global = true)]
    pub exchange: Option<Address>,

    /// Hex-encoded private key of the wallet to connect
    #[arg(long, global = true, env = "TOKENDESK_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List supported chains
    Chains,
    /// List known tokens grouped by chain
    Tokens,
    /// Show token balances of the connected wallet on the selected chain
    Balances,
    /// Show token metadata and total supply
    Supply {
        /// Token contract address
        token: Address,
    },
    /// Transfer tokens from the connected wallet
    Transfer {
        /// Token contract address
        token: Address,
        /// Recipient address
        to: String,
        /// Amount in whole tokens, e.g. `12.5`
        amount: String,
        /// Submit without showing the preview first
        #[arg(long, short)]
        yes: bool,
    },
    /// P2P exchange offers
    Offers {
        #[command(subcommand)]
        command: OfferCommands,
    },
    /// Show status of a transaction
    Status {
        /// Transaction hash
        tx_hash: TxHash,
    },
}

#[derive(Subcommand, Debug)]
pub enum OfferCommands {
    /// List open offers
    List,
    /// Create an offer selling one token for another
    Create {
        /// Token to sell
        sell_token: Address,
        /// Amount to sell in whole tokens
        sell_amount: String,
        /// Token to buy
        buy_token: Address,
        /// Amount to buy in whole tokens
        buy_amount: String,
    },
    /// Fill an open offer of another account
    Fill {
        /// Offer ID
        id: OfferId,
    },
    /// Cancel an open offer of the connected account
    Cancel {
        /// Offer ID
        id: OfferId,
    },
}

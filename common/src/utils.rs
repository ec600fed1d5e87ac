use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{impl_display_for_enum, impl_from_str_for_enum};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Ethereum,
    Cronos,
}

impl Chain {
    pub const ALL: [Chain; 3] = [Chain::Solana, Chain::Ethereum, Chain::Cronos];

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Solana => "SOL",
            Chain::Ethereum => "ETH",
            Chain::Cronos => "CRO",
        }
    }

    /// Shape check only: base58 public keys on Solana, `0x` + 40 hex digits on EVM chains.
    pub fn is_valid_address(&self, address: &str) -> bool {
        match self {
            Chain::Solana => {
                (32..=44).contains(&address.len())
                    && address.chars().all(|c| BASE58_ALPHABET.contains(c))
            }
            Chain::Ethereum | Chain::Cronos => {
                address.len() == 42
                    && address.starts_with("0x")
                    && address[2..].chars().all(|c| c.is_ascii_hexdigit())
            }
        }
    }
}

/// Shortens an address to `head...tail` for display.
pub fn format_address(address: &str, chars: usize) -> String {
    if address.chars().count() <= chars * 2 {
        return address.to_string();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address
        .chars()
        .rev()
        .take(chars)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{}...{}", head, tail)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Deposit,
    Withdrawal,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Reward for a correct answer at this tier.
    pub fn base_reward(&self) -> Decimal {
        match self {
            Difficulty::Easy => Decimal::new(1, 2),
            Difficulty::Medium => Decimal::new(2, 2),
            Difficulty::Hard => Decimal::new(5, 2),
        }
    }
}

/// Window of answer history a leaderboard aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "all")]
    AllTime,
    #[serde(rename = "24h")]
    Last24h,
}

impl std::str::FromStr for Timeframe {
    type Err = crate::error::LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Timeframe::AllTime),
            "24h" => Ok(Timeframe::Last24h),
            other => Err(crate::error::LedgerError::InvalidInput(format!(
                "invalid timeframe: {}",
                other
            ))),
        }
    }
}

impl_from_str_for_enum!(Chain, Solana, Ethereum, Cronos);
impl_display_for_enum!(Chain, Solana, Ethereum, Cronos);
impl_from_str_for_enum!(TxType, Deposit, Withdrawal, Transfer);
impl_display_for_enum!(TxType, Deposit, Withdrawal, Transfer);
impl_from_str_for_enum!(TxStatus, Pending, Confirmed, Failed);
impl_display_for_enum!(TxStatus, Pending, Confirmed, Failed);
impl_from_str_for_enum!(Difficulty, Easy, Medium, Hard);
impl_display_for_enum!(Difficulty, Easy, Medium, Hard);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enums_round_trip_through_their_stored_form() {
        assert_eq!(TxStatus::Pending.to_string(), "pending");
        assert_eq!(TxStatus::from_str("CONFIRMED").unwrap(), TxStatus::Confirmed);
        assert_eq!(Chain::from_str(" Solana ").unwrap(), Chain::Solana);
        assert_eq!(Difficulty::Hard.to_string(), "hard");
        assert!(TxType::from_str("refund").is_err());
    }

    #[test]
    fn difficulty_rewards_match_tiers() {
        assert_eq!(Difficulty::Easy.base_reward().to_string(), "0.01");
        assert_eq!(Difficulty::Medium.base_reward().to_string(), "0.02");
        assert_eq!(Difficulty::Hard.base_reward().to_string(), "0.05");
    }

    #[test]
    fn solana_addresses_must_be_base58() {
        let good = "7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV";
        assert!(Chain::Solana.is_valid_address(good));
        // `0`, `O`, `I` and `l` are not in the base58 alphabet
        assert!(!Chain::Solana.is_valid_address("0EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV"));
        assert!(!Chain::Solana.is_valid_address("short"));
    }

    #[test]
    fn evm_addresses_need_prefix_and_hex() {
        let good = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert!(Chain::Ethereum.is_valid_address(good));
        assert!(Chain::Cronos.is_valid_address(good));
        assert!(!Chain::Ethereum.is_valid_address(&good[2..]));
        assert!(!Chain::Ethereum.is_valid_address("0xZZ908400098527886E0F7030069857D2E4169EE7"));
    }

    #[test]
    fn format_address_keeps_head_and_tail() {
        assert_eq!(
            format_address("0x52908400098527886E0F7030069857D2E4169EE7", 4),
            "0x52...9EE7"
        );
        assert_eq!(format_address("abcdef", 4), "abcdef");
    }

    #[test]
    fn timeframe_parses_query_values() {
        assert_eq!(Timeframe::from_str("24h").unwrap(), Timeframe::Last24h);
        assert_eq!(Timeframe::from_str("all").unwrap(), Timeframe::AllTime);
        assert!(Timeframe::from_str("week").is_err());
        assert_eq!(Timeframe::default(), Timeframe::AllTime);
    }
}

use crate::constants::{DEFAULT_LOG_CAPACITY, DEFAULT_MAX_EXPENSE_AMOUNT};
use crate::core::engine::OrphanedDebtPolicy;
use dotenv::dotenv;
use log::warn;
use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub orphaned_debt_policy: OrphanedDebtPolicy,
    pub max_expense_amount: f64,
    pub log_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".to_string(),
            orphaned_debt_policy: OrphanedDebtPolicy::Drop,
            max_expense_amount: DEFAULT_MAX_EXPENSE_AMOUNT,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source. Unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let orphaned_debt_policy = match lookup("ORPHANED_DEBT_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Unknown ORPHANED_DEBT_POLICY {:?}, falling back to drop", raw);
                defaults.orphaned_debt_policy
            }),
            None => defaults.orphaned_debt_policy,
        };

        Self {
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            orphaned_debt_policy,
            max_expense_amount: lookup("MAX_EXPENSE_AMOUNT")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(defaults.max_expense_amount),
            log_capacity: lookup("LOG_CAPACITY")
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.log_capacity),
        }
    }
}

// Global static accessible everywhere
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

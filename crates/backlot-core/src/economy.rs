//! Currency wallet and the fame ledger.

use crate::fixed::Fixed64;
use crate::id::CurrencyType;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// Per-currency balances. Spends are atomic: either the full amount comes
/// off the balance or nothing does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    balances: [i64; CurrencyType::ALL.len()],
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_starting_money(amount: i64) -> Self {
        let mut wallet = Self::new();
        wallet.add(CurrencyType::Money, amount);
        wallet
    }

    pub fn amount(&self, currency: CurrencyType) -> i64 {
        self.balances[currency.to_index() as usize]
    }

    /// Credit a balance. Non-positive amounts are ignored. Returns the new
    /// balance.
    pub fn add(&mut self, currency: CurrencyType, amount: i64) -> i64 {
        if amount > 0 {
            self.balances[currency.to_index() as usize] += amount;
        }
        self.amount(currency)
    }

    /// Debit a balance if it covers the amount. A non-positive amount always
    /// succeeds without touching the balance.
    pub fn spend(&mut self, currency: CurrencyType, amount: i64) -> bool {
        if amount <= 0 {
            return true;
        }
        let index = currency.to_index() as usize;
        if self.balances[index] < amount {
            return false;
        }
        self.balances[index] -= amount;
        true
    }

    /// Replace a balance outright (snapshot restore).
    pub fn set(&mut self, currency: CurrencyType, amount: i64) {
        self.balances[currency.to_index() as usize] = amount;
    }
}

// ---------------------------------------------------------------------------
// Fame
// ---------------------------------------------------------------------------

/// Fame level and progress toward the next level. Each level-up raises the
/// requirement by half again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FameLedger {
    level: u32,
    progress: Fixed64,
    required: Fixed64,
}

const BASE_FAME_REQUIREMENT: i64 = 100;

impl FameLedger {
    pub fn new() -> Self {
        Self {
            level: 1,
            progress: Fixed64::ZERO,
            required: Fixed64::from_num(BASE_FAME_REQUIREMENT),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn progress(&self) -> Fixed64 {
        self.progress
    }

    /// Fraction of the way to the next level.
    pub fn progress_fraction(&self) -> Fixed64 {
        self.progress / self.required
    }

    /// Add fame, carrying overflow across level boundaries. Returns the
    /// number of levels gained. Non-positive amounts are ignored.
    pub fn add(&mut self, amount: Fixed64) -> u32 {
        if amount <= Fixed64::ZERO {
            return 0;
        }
        self.progress += amount;
        let mut gained = 0;
        while self.progress >= self.required {
            self.progress -= self.required;
            self.level += 1;
            self.required *= Fixed64::from_num(1.5);
            gained += 1;
        }
        gained
    }

    /// Restore level and progress from a snapshot. The requirement is
    /// recomputed from the level so a restored ledger levels up at the same
    /// thresholds as one that earned its way there.
    pub fn restore(&mut self, level: u32, progress: Fixed64) {
        self.level = level.max(1);
        self.required = Self::requirement_for(self.level);
        self.progress = progress.clamp(Fixed64::ZERO, self.required);
    }

    fn requirement_for(level: u32) -> Fixed64 {
        let mut required = Fixed64::from_num(BASE_FAME_REQUIREMENT);
        for _ in 1..level {
            required *= Fixed64::from_num(1.5);
        }
        required
    }
}

impl Default for FameLedger {
    fn default() -> Self {
        Self::new()
    }
}

//! Quota Entity
//!
//! Per-user usage counters as reported by the backend. Two allowances
//! cooperate: creations (photo analyses per day, plus purchased bonus
//! creations) and save slots (listings kept in the account).

use serde::{Deserialize, Serialize};

/// Canonical quota shape
///
/// Decodes from either the canonical body or the deprecated
/// `{used, limit, remaining}` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuotaPayload")]
pub struct Quota {
    pub creations_daily_limit: u32,
    pub creations_remaining_today: u32,
    pub bonus_creations_remaining: u32,
    pub free_save_slots: u32,
    /// `None` when the backend did not report save slots
    pub save_slots_remaining: Option<u32>,
    pub is_pro: bool,
}

impl Quota {
    /// Unlimited pro quota
    pub fn pro() -> Self {
        Self {
            creations_daily_limit: 0,
            creations_remaining_today: 0,
            bonus_creations_remaining: 0,
            free_save_slots: 0,
            save_slots_remaining: None,
            is_pro: true,
        }
    }

    /// Another creation is allowed
    pub fn can_create(&self) -> bool {
        self.is_pro || self.creations_remaining_today > 0
    }

    /// Another save is allowed; unknown slots never block
    pub fn can_save(&self) -> bool {
        self.is_pro || self.save_slots_remaining != Some(0)
    }

    /// Non-blocking nudge: few creations left (but possibly not zero)
    pub fn is_low(&self, threshold: u32) -> bool {
        !self.is_pro && self.creations_remaining_today <= threshold
    }

    /// `remaining ≤ daily limit + bonus` for non-pro users
    pub fn is_consistent(&self) -> bool {
        self.is_pro
            || u64::from(self.creations_remaining_today)
                <= u64::from(self.creations_daily_limit)
                    + u64::from(self.bonus_creations_remaining)
    }
}

#[derive(Deserialize)]
struct CurrentQuota {
    creations_daily_limit: u32,
    creations_remaining_today: u32,
    #[serde(default)]
    bonus_creations_remaining: u32,
    #[serde(default)]
    free_save_slots: u32,
    #[serde(default)]
    save_slots_remaining: Option<u32>,
    #[serde(default)]
    is_pro: bool,
}

/// Deprecated shape still served by older endpoints
#[derive(Deserialize)]
struct LegacyQuota {
    limit: u32,
    remaining: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuotaPayload {
    Current(CurrentQuota),
    Legacy(LegacyQuota),
}

impl From<QuotaPayload> for Quota {
    fn from(payload: QuotaPayload) -> Self {
        match payload {
            QuotaPayload::Current(q) => Self {
                creations_daily_limit: q.creations_daily_limit,
                creations_remaining_today: q.creations_remaining_today,
                bonus_creations_remaining: q.bonus_creations_remaining,
                free_save_slots: q.free_save_slots,
                save_slots_remaining: q.save_slots_remaining,
                is_pro: q.is_pro,
            },
            QuotaPayload::Legacy(legacy) => Self {
                creations_daily_limit: legacy.limit,
                creations_remaining_today: legacy.remaining,
                bonus_creations_remaining: 0,
                free_save_slots: 0,
                save_slots_remaining: None,
                is_pro: false,
            },
        }
    }
}

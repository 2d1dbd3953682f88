// 📋 Static Catalog - Seed accounts, chore library, reward pricing
// Fixed configuration consumed by the engine and the UI shell.
// The engine never writes any of this.

use crate::ledger::Account;
use serde::Serialize;

/// Static numeric passcode gating the parent entry tool.
/// A UI gate only - this is NOT a security boundary.
pub const PARENT_PASSCODE: &str = "0515";

pub fn verify_passcode(entered: &str) -> bool {
    entered == PARENT_PASSCODE
}

// ============================================================================
// SEED ACCOUNTS
// ============================================================================

/// Fixed initial accounts, used whenever no snapshot exists yet.
pub fn seed_accounts() -> Vec<Account> {
    vec![
        Account {
            id: "1".to_string(),
            name: "Bryson".to_string(),
            avatar: "https://api.dicebear.com/7.x/adventurer/svg?seed=goblin&skinColor=9e5622,763901&hair=long01&hairColor=2c1b18".to_string(),
            total_points: 0,
        },
        Account {
            id: "2".to_string(),
            name: "Remy".to_string(),
            avatar: "https://api.dicebear.com/7.x/adventurer/svg?seed=cowboy&hat=cowboy&hatColor=4e342e".to_string(),
            total_points: 0,
        },
    ]
}

// ============================================================================
// CHORE LIBRARY
// ============================================================================

/// A fixed chore the parent tool can award points for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Chore {
    pub id: &'static str,
    pub title: &'static str,
    pub points: i64,
    pub icon: &'static str,
    pub category: &'static str,
}

pub const CHORE_LIBRARY: &[Chore] = &[
    Chore { id: "c1", title: "Make Bed", points: 5, icon: "🛏️", category: "Daily" },
    Chore { id: "c2", title: "Unload Dishwasher", points: 15, icon: "🍽️", category: "Kitchen" },
    Chore { id: "c3", title: "Clean Room", points: 20, icon: "🧹", category: "Bedroom" },
    Chore { id: "c4", title: "Feed & Potty Dog", points: 10, icon: "🐕", category: "Pets" },
    Chore { id: "c5", title: "Good School Day", points: 5, icon: "🏫", category: "Education" },
    Chore { id: "c6", title: "Laundry", points: 15, icon: "👕", category: "Chores" },
    Chore { id: "c7", title: "Improve Skill", points: 5, icon: "🎯", category: "Education" },
    Chore { id: "c8", title: "Learn New Skill", points: 20, icon: "💡", category: "Education" },
    Chore { id: "c9", title: "Cat Litter", points: 10, icon: "🐈", category: "Pets" },
    Chore { id: "c10", title: "Feed Charlotte", points: 10, icon: "🥗", category: "Pets" },
    Chore { id: "c11", title: "Vacuum Part of House", points: 10, icon: "🌀", category: "Chores" },
];

pub const CATEGORIES: &[&str] = &[
    "All", "Daily", "Kitchen", "Bedroom", "Pets", "Education", "Chores",
];

pub fn chores_in_category(category: &str) -> Vec<&'static Chore> {
    CHORE_LIBRARY
        .iter()
        .filter(|c| category == "All" || c.category == category)
        .collect()
}

// ============================================================================
// GOAL PRESETS & REWARD PRICING
// ============================================================================

/// Quick-pick reward suggestions shown on the goal form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalPreset {
    pub name: &'static str,
    pub cost: i64,
    pub icon: &'static str,
}

pub const GOAL_PRESETS: &[GoalPreset] = &[
    GoalPreset { name: "400 Robux", cost: 40, icon: "🎮" },
    GoalPreset { name: "Movie Night", cost: 40, icon: "🍿" },
    GoalPreset { name: "Sleepover", cost: 20, icon: "⛺" },
];

/// Point cost for a reward with a nominal currency value.
///
/// Log-scaled so doubling the value does not double the cost, rounded to
/// the nearest multiple of 5, floored at 10 points. Non-positive values
/// cost nothing.
///
/// ```
/// use kidpoint::catalog::reward_cost;
///
/// assert_eq!(reward_cost(20.0), 200);
/// assert_eq!(reward_cost(1.0), 10);
/// assert_eq!(reward_cost(0.0), 0);
/// ```
pub fn reward_cost(value: f64) -> i64 {
    if value <= 0.0 {
        return 0;
    }
    let steps = ((100.99 * value.ln() - 102.5) / 5.0).round() as i64;
    (steps * 5).max(10)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_cost_anchor_values() {
        assert_eq!(reward_cost(20.0), 200);
        assert_eq!(reward_cost(1.0), 10); // hits the floor
        assert_eq!(reward_cost(0.0), 0);
        assert_eq!(reward_cost(-5.0), 0);
    }

    #[test]
    fn test_reward_cost_monotone_and_multiple_of_five() {
        let mut previous = 0;
        for cents in 1..=10_000 {
            let value = cents as f64 / 10.0; // 0.1 .. 1000.0
            let cost = reward_cost(value);
            assert!(cost >= previous, "cost dipped at value {}", value);
            assert_eq!(cost % 5, 0, "cost not a multiple of 5 at value {}", value);
            assert!(cost >= 10);
            previous = cost;
        }
    }

    #[test]
    fn test_reward_cost_diminishing_curve() {
        // Doubling the nominal value does not double the point cost
        assert!(reward_cost(40.0) < 2 * reward_cost(20.0));
    }

    #[test]
    fn test_seed_accounts_start_empty() {
        let accounts = seed_accounts();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|a| a.total_points == 0));

        // Ids are stable - the closed set the ledger contract relies on
        assert_eq!(accounts[0].id, "1");
        assert_eq!(accounts[1].id, "2");
    }

    #[test]
    fn test_chore_filter() {
        assert_eq!(chores_in_category("All").len(), CHORE_LIBRARY.len());
        assert_eq!(chores_in_category("Pets").len(), 3);
        assert!(chores_in_category("Nope").is_empty());
    }

    #[test]
    fn test_passcode_gate() {
        assert!(verify_passcode("0515"));
        assert!(!verify_passcode("0000"));
        assert!(!verify_passcode(""));
    }
}

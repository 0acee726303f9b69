//! Built-in challenge catalog.
//!
//! Three challenges ship with the app and can never be deleted; user
//! created ones live in the engine state next to them.

use crate::types::{Challenge, ChallengeKind};
use once_cell::sync::Lazy;

/// Cached built-in list - built once and reused across all operations
static BUILTIN_CHALLENGES: Lazy<Vec<Challenge>> = Lazy::new(build_builtin_challenges);

/// Get the built-in challenges in their fixed display order
pub fn builtin_challenges() -> &'static [Challenge] {
    &BUILTIN_CHALLENGES
}

/// Whether an id belongs to the protected built-in set
pub fn is_builtin(id: &str) -> bool {
    BUILTIN_CHALLENGES.iter().any(|c| c.id == id)
}

fn build_builtin_challenges() -> Vec<Challenge> {
    vec![
        Challenge {
            id: "sugar_free".into(),
            title: "Sugar-Free Days".into(),
            description: "Cut out sugar and feel the difference".into(),
            kind: ChallengeKind::Custom,
            goal_value: 30.0,
            unit: "day".into(),
            duration_days: 30,
            color: "pink".into(),
            icon: "🍬".into(),
        },
        Challenge {
            id: "water_marathon".into(),
            title: "Water Marathon".into(),
            description: "Drink 90 liters in a month (3 L a day)".into(),
            kind: ChallengeKind::Water,
            goal_value: 90.0,
            unit: "L".into(),
            duration_days: 30,
            color: "blue".into(),
            icon: "💧".into(),
        },
        Challenge {
            id: "steps_100k".into(),
            title: "100,000 Steps".into(),
            description: "Walk one hundred thousand steps in a month".into(),
            kind: ChallengeKind::Step,
            goal_value: 100_000.0,
            unit: "step".into(),
            duration_days: 30,
            color: "emerald".into(),
            icon: "👣".into(),
        },
    ]
}

/// Validate a challenge list for consistency.
///
/// Returns a list of validation errors, or empty Vec if valid. Used on
/// the built-ins at startup and on user-created challenges before they
/// are accepted into the engine state.
pub fn validate(challenges: &[Challenge]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for challenge in challenges {
        if challenge.id.is_empty() {
            errors.push("Challenge has empty ID".to_string());
        }
        if !seen.insert(challenge.id.as_str()) {
            errors.push(format!("Duplicate challenge ID '{}'", challenge.id));
        }
        if challenge.title.is_empty() {
            errors.push(format!("Challenge '{}' has empty title", challenge.id));
        }
        if challenge.goal_value <= 0.0 {
            errors.push(format!(
                "Challenge '{}': goal value {} must be positive",
                challenge.id, challenge.goal_value
            ));
        }
        if challenge.duration_days == 0 {
            errors.push(format!(
                "Challenge '{}' has a zero-day duration",
                challenge.id
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_load() {
        assert_eq!(builtin_challenges().len(), 3);
    }

    #[test]
    fn test_builtin_order_is_fixed() {
        let ids: Vec<_> = builtin_challenges().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["sugar_free", "water_marathon", "steps_100k"]);
    }

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("water_marathon"));
        assert!(!is_builtin("custom-abc"));
    }

    #[test]
    fn test_builtins_validate() {
        let errors = validate(builtin_challenges());
        assert!(
            errors.is_empty(),
            "Built-in challenges have validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_validate_rejects_bad_goal() {
        let mut bad = builtin_challenges()[0].clone();
        bad.goal_value = 0.0;
        let errors = validate(&[bad]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must be positive"));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let a = builtin_challenges()[0].clone();
        let b = builtin_challenges()[0].clone();
        let errors = validate(&[a, b]);
        assert!(errors.iter().any(|e| e.contains("Duplicate")));
    }
}

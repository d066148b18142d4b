//! User profile and derived metabolic quantities.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Weekly activity level with its TDEE multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    High,
    Athlete,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::High => 1.725,
            ActivityLevel::Athlete => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub sex: Sex,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity: ActivityLevel,
}

impl UserProfile {
    /// Basal metabolic rate in kcal/day, Mifflin-St Jeor.
    pub fn bmr(&self) -> f64 {
        let base = 10.0 * self.weight_kg + 6.25 * self.height_cm - 5.0 * f64::from(self.age);
        match self.sex {
            Sex::Male => base + 5.0,
            Sex::Female => base - 161.0,
        }
    }

    /// Total daily energy expenditure in kcal/day.
    pub fn tdee(&self) -> f64 {
        self.bmr() * self.activity.multiplier()
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            sex: Sex::Male,
            age: 30,
            height_cm: 170.0,
            weight_kg: 80.0,
            activity: ActivityLevel::Moderate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmr_male_known_value() {
        let profile = UserProfile {
            sex: Sex::Male,
            age: 30,
            height_cm: 180.0,
            weight_kg: 80.0,
            activity: ActivityLevel::Moderate,
        };
        // 10*80 + 6.25*180 - 5*30 + 5 = 800 + 1125 - 150 + 5
        assert_eq!(profile.bmr(), 1780.0);
    }

    #[test]
    fn bmr_female_known_value() {
        let profile = UserProfile {
            sex: Sex::Female,
            age: 25,
            height_cm: 165.0,
            weight_kg: 60.0,
            activity: ActivityLevel::Light,
        };
        // 10*60 + 6.25*165 - 5*25 - 161 = 600 + 1031.25 - 125 - 161
        assert_eq!(profile.bmr(), 1345.25);
    }

    #[test]
    fn tdee_applies_activity_multiplier() {
        let sedentary = UserProfile {
            activity: ActivityLevel::Sedentary,
            ..UserProfile::default()
        };
        assert!((sedentary.tdee() - sedentary.bmr() * 1.2).abs() < 1e-9);

        let athlete = UserProfile {
            activity: ActivityLevel::Athlete,
            ..UserProfile::default()
        };
        assert!((athlete.tdee() - athlete.bmr() * 1.9).abs() < 1e-9);
    }

    #[test]
    fn activity_multipliers_are_ordered() {
        let levels = [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::High,
            ActivityLevel::Athlete,
        ];
        assert!(levels.windows(2).all(|w| w[0].multiplier() < w[1].multiplier()));
    }
}

use crate::models::question::QuestionType;
use std::collections::HashMap;

/// Static generation policy for one role: what share of a batch should be
/// math questions and which question types the role accepts at all.
#[derive(Debug, Clone)]
pub struct RoleProfile {
    pub math_ratio: f64,
    pub allowed_types: Vec<QuestionType>,
}

impl RoleProfile {
    pub fn new(math_ratio: f64, allowed_types: Vec<QuestionType>) -> Self {
        Self {
            math_ratio,
            allowed_types,
        }
    }

    pub fn balanced() -> Self {
        Self::new(0.5, vec![QuestionType::Math, QuestionType::Reasoning])
    }

    pub fn allows(&self, question_type: QuestionType) -> bool {
        self.allowed_types.contains(&question_type)
    }
}

#[derive(Debug, Clone)]
pub struct RoleTable {
    profiles: HashMap<String, RoleProfile>,
    default_profile: RoleProfile,
}

impl RoleTable {
    /// The built-in role set. Unknown roles resolve to a balanced profile.
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            "tech".to_string(),
            RoleProfile::new(0.05, vec![QuestionType::Math, QuestionType::Reasoning]),
        );
        profiles.insert(
            "apt".to_string(),
            RoleProfile::new(0.7, vec![QuestionType::Math, QuestionType::Reasoning]),
        );
        profiles.insert(
            "hr".to_string(),
            RoleProfile::new(0.0, vec![QuestionType::Reasoning]),
        );
        profiles.insert(
            "beh".to_string(),
            RoleProfile::new(0.0, vec![QuestionType::Reasoning]),
        );

        Self {
            profiles,
            default_profile: RoleProfile::balanced(),
        }
    }

    pub fn with_role(mut self, role: &str, profile: RoleProfile) -> Self {
        self.profiles.insert(role.to_string(), profile);
        self
    }

    pub fn resolve(&self, role: &str) -> &RoleProfile {
        self.profiles.get(role).unwrap_or(&self.default_profile)
    }
}

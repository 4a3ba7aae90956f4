// Prompt constants for per-posting analysis.
// Each stage that needs completion calls defines its own prompts.rs
// alongside it; aggregation prompts live in aggregate::prompts.

/// Display profile for a role category. Drives the system prompt wording;
/// unknown role keys fall back to the raw key with the generic focus line.
pub struct RoleProfile {
    pub key: &'static str,
    pub display: &'static str,
    pub hard_skill_focus: &'static str,
}

pub const ROLE_PROFILES: &[RoleProfile] = &[
    RoleProfile {
        key: "backend",
        display: "backend engineer",
        hard_skill_focus: "programming languages, frameworks, databases, and infrastructure",
    },
    RoleProfile {
        key: "frontend",
        display: "frontend engineer",
        hard_skill_focus: "languages, frameworks and libraries, build tooling, and UI/UX technique",
    },
    RoleProfile {
        key: "ai-ml",
        display: "AI/ML engineer",
        hard_skill_focus: "languages, ML frameworks, algorithmic domains, and serving infrastructure",
    },
    RoleProfile {
        key: "data",
        display: "data analyst",
        hard_skill_focus: "query languages, storage systems, analysis and visualization tools, and pipelines",
    },
    RoleProfile {
        key: "pm-po",
        display: "product manager",
        hard_skill_focus: "product methodologies, planning tools, analysis technique, and business skills",
    },
    RoleProfile {
        key: "planning",
        display: "service planner",
        hard_skill_focus: "planning methodologies, prototyping tools, research technique, and business analysis",
    },
    RoleProfile {
        key: "product-designer",
        display: "product designer",
        hard_skill_focus: "design tools, UI/UX craft, design process, and technical literacy",
    },
    RoleProfile {
        key: "graphic-designer",
        display: "graphic designer",
        hard_skill_focus: "design tools, visual craft, print production, and digital media",
    },
    RoleProfile {
        key: "content-designer",
        display: "content designer",
        hard_skill_focus: "writing craft, publishing tools, marketing knowledge, and content analytics",
    },
];

pub const DEFAULT_HARD_SKILL_FOCUS: &str = "technical skills, tools, and methodology";

pub fn role_profile(role: &str) -> Option<&'static RoleProfile> {
    ROLE_PROFILES.iter().find(|profile| profile.key == role)
}

/// Resolves display name and hard-skill focus for a role key.
pub fn role_display(role: &str) -> (&str, &'static str) {
    match role_profile(role) {
        Some(profile) => (profile.display, profile.hard_skill_focus),
        None => (role, DEFAULT_HARD_SKILL_FOCUS),
    }
}

/// System prompt for per-posting analysis — enforces JSON-only output.
/// Replace `{role_display}` and `{hard_skill_focus}` before sending.
pub const ANALYSIS_SYSTEM_TEMPLATE: &str = r#"You are the hiring manager who wrote a {role_display} job posting. Analyze the posting and extract every competency it asks for: technical hard skills ({hard_skill_focus}) and interpersonal soft skills.

Do not rely on a predefined skill list — derive the skills from the posting text itself. Score each skill's importance from an interviewer's point of view: 100 for a skill that would certainly be probed, down to 10 for a barely relevant one. Exclude anything you would score at 10 or below. Skills stated in the requirements outrank preferred qualifications.

For each of the most important skills, add a highlight: the skill name plus one sentence of concrete evidence from the posting that justifies its importance.

The insight field is a light summary of what kind of candidate the posting is really looking for. The number of skills is not fixed. Respond with ONLY the following JSON object and no comments:
{"title": "", "company": "", "role": "{role_display}", "summary": "",
 "hard_skills": {"skill name": 40}, "soft_skills": {"skill name": 40},
 "highlights": [{"skill": "", "evidence": ""}],
 "insight": ""}"#;

/// User prompt for per-posting analysis.
/// Replace `{role_display}` and `{posting_text}` before sending.
pub const ANALYSIS_USER_TEMPLATE: &str =
    "Analyze the following {role_display} job posting. Respond with JSON only:\n\n{posting_text}";

/// Marker keys the anchor-key recovery strategy uses to find the analysis
/// object when prose surrounds it.
pub const ANALYSIS_ANCHOR_KEYS: &[&str] = &["hard_skills", "soft_skills", "insight"];

pub fn build_analysis_system(role: &str) -> String {
    let (display, focus) = role_display(role);
    ANALYSIS_SYSTEM_TEMPLATE
        .replace("{role_display}", display)
        .replace("{hard_skill_focus}", focus)
}

pub fn build_analysis_user(role: &str, posting_text: &str) -> String {
    let (display, _) = role_display(role);
    ANALYSIS_USER_TEMPLATE
        .replace("{role_display}", display)
        .replace("{posting_text}", posting_text)
}

//! Skill categorization: a deterministic greedy first-match classifier
//! over curated per-role vocabularies. Raw skill phrasing varies wildly,
//! so matching is case-insensitive substring in both directions.

use serde_json::Value;
use tracing::debug;

use crate::models::posting::SkillMap;

/// Label of the catch-all bucket, always appended last.
pub const UNCATEGORIZED: &str = "uncategorized";

type CategoryTable = &'static [(&'static str, &'static [&'static str])];

const BACKEND: CategoryTable = &[
    (
        "languages",
        &["Java", "Python", "Kotlin", "TypeScript", "JavaScript", "C++", "Go", "Scala", "C#", "Rust"],
    ),
    (
        "frameworks",
        &["Spring Boot", "Spring", "Django", "Node.js", "Express", "Flask", "NestJS", "ASP.NET", "Rails"],
    ),
    (
        "databases",
        &["MySQL", "RDBMS", "PostgreSQL", "MongoDB", "Oracle", "MariaDB", "Redis", "Elasticsearch", "JPA", "Hibernate", "NoSQL", "DynamoDB", "SQL", "Database"],
    ),
    (
        "infrastructure",
        &["AWS", "Docker", "Git", "Kubernetes", "Jenkins", "CI/CD", "Linux", "Nginx", "Apache", "REST API", "Azure", "GCP", "Terraform"],
    ),
];

const FRONTEND: CategoryTable = &[
    ("languages", &["JavaScript", "TypeScript", "HTML", "CSS", "Sass", "Less"]),
    (
        "frameworks/libraries",
        &["React", "Vue", "Angular", "Next.js", "Nuxt", "jQuery", "Redux", "MobX", "Svelte"],
    ),
    (
        "tooling",
        &["Webpack", "Vite", "Babel", "ESLint", "Jest", "Cypress", "Git", "npm", "yarn", "Storybook"],
    ),
    (
        "design/ux",
        &["Figma", "Sketch", "Adobe XD", "UI/UX", "responsive design", "accessibility", "CSS Grid", "Flexbox"],
    ),
];

const AI_ML: CategoryTable = &[
    ("languages", &["Python", "R", "C++", "Java", "Julia", "Scala"]),
    (
        "frameworks/libraries",
        &["TensorFlow", "PyTorch", "Keras", "Scikit-learn", "Pandas", "NumPy", "Hugging Face", "XGBoost", "LightGBM"],
    ),
    (
        "domains",
        &["machine learning", "deep learning", "natural language", "NLP", "computer vision", "reinforcement learning", "recommendation", "statistics", "mathematics"],
    ),
    (
        "infrastructure",
        &["Docker", "Kubernetes", "MLOps", "AWS", "GCP", "Azure", "Hadoop", "Spark", "Airflow"],
    ),
];

const DATA: CategoryTable = &[
    ("languages", &["SQL", "Python", "R", "Scala"]),
    (
        "storage",
        &["MySQL", "PostgreSQL", "MongoDB", "Redshift", "BigQuery", "Snowflake", "Hadoop", "HDFS"],
    ),
    (
        "analysis/visualization",
        &["Tableau", "Power BI", "visualization", "statistical analysis", "A/B test", "Pandas", "NumPy", "Matplotlib", "Seaborn"],
    ),
    (
        "pipeline tools",
        &["Spark", "Kafka", "Airflow", "ETL", "ELT", "data modeling", "data pipeline", "AWS", "GCP", "Azure"],
    ),
];

const PM_PO: CategoryTable = &[
    (
        "methodologies",
        &["Agile", "Scrum", "Waterfall", "Kanban", "lean startup", "design thinking"],
    ),
    (
        "tools",
        &["Jira", "Confluence", "Notion", "Asana", "Trello", "Figma", "Google Analytics", "Amplitude"],
    ),
    (
        "skills",
        &["product strategy", "roadmap", "market research", "requirements analysis", "user research", "A/B test", "data analysis"],
    ),
    (
        "business",
        &["business model", "monetization", "KPI", "metrics", "competitive analysis", "user journey"],
    ),
];

const PLANNING: CategoryTable = &[
    (
        "methodologies",
        &["service planning", "UX planning", "content planning", "strategic planning"],
    ),
    (
        "tools",
        &["Figma", "Sketch", "Adobe XD", "Jira", "Confluence", "Notion", "Google Analytics", "Amplitude"],
    ),
    (
        "skills",
        &["requirements analysis", "wireframe", "prototyping", "information architecture", "user scenario", "usability test"],
    ),
    (
        "business",
        &["market research", "competitive analysis", "KPI", "metrics", "data analysis", "business model"],
    ),
];

const PRODUCT_DESIGNER: CategoryTable = &[
    (
        "design tools",
        &["Figma", "Sketch", "Adobe XD", "Illustrator", "Photoshop", "Protopie", "After Effects"],
    ),
    (
        "design skills",
        &["UI design", "UX design", "interaction design", "visual design", "design system", "typography", "grid system"],
    ),
    (
        "process",
        &["design thinking", "user research", "prototyping", "wireframe", "usability test", "A/B test"],
    ),
    (
        "technical literacy",
        &["HTML", "CSS", "JavaScript", "responsive design", "accessibility", "design guideline", "animation"],
    ),
];

const GRAPHIC_DESIGNER: CategoryTable = &[
    (
        "design tools",
        &["Photoshop", "Illustrator", "InDesign", "After Effects", "Figma", "Sketch", "Procreate"],
    ),
    (
        "design skills",
        &["graphic design", "typography", "color theory", "layout", "branding", "logo design", "illustration"],
    ),
    (
        "print/publishing",
        &["print design", "editorial design", "package design", "print production", "paper", "binding"],
    ),
    (
        "digital media",
        &["web design", "social media", "banner design", "motion graphics", "digital marketing"],
    ),
];

const CONTENT_DESIGNER: CategoryTable = &[
    (
        "writing",
        &["copywriting", "content planning", "storytelling", "editing", "translation", "tone and manner", "UX writing"],
    ),
    (
        "tools/platforms",
        &["Notion", "WordPress", "Google Analytics", "CMS", "SEO", "Adobe"],
    ),
    (
        "marketing",
        &["content marketing", "social media marketing", "performance marketing", "brand marketing", "growth hacking"],
    ),
    (
        "analytics",
        &["content analysis", "user behavior", "trend analysis", "competitive analysis", "A/B test"],
    ),
];

// Roles without a curated table get the generic buckets. Their canonical
// lists are empty, so in practice everything partitions into the
// uncategorized bucket — the fourth, "other" bucket of the generic view.
const GENERIC: CategoryTable = &[("technical", &[]), ("tooling", &[]), ("methodology", &[])];

/// Returns the curated table for a role key, or the generic fallback.
pub fn category_table(role: &str) -> CategoryTable {
    match role {
        "backend" => BACKEND,
        "frontend" => FRONTEND,
        "ai-ml" => AI_ML,
        "data" => DATA,
        "pm-po" => PM_PO,
        "planning" => PLANNING,
        "product-designer" => PRODUCT_DESIGNER,
        "graphic-designer" => GRAPHIC_DESIGNER,
        "content-designer" => CONTENT_DESIGNER,
        _ => GENERIC,
    }
}

/// One category's skills, sorted descending by score.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBucket {
    pub label: String,
    pub skills: Vec<(String, Value)>,
}

/// Buckets a skill map for a role. A skill goes to the first category (in
/// table order) whose canonical terms match case-insensitively in either
/// direction; everything unmatched lands in `uncategorized`, appended last.
/// Empty buckets are dropped; surviving buckets are sorted descending by
/// score, stable on ties.
pub fn categorize_skills(skills: &SkillMap, role: &str) -> Vec<CategoryBucket> {
    let table = category_table(role);
    let mut buckets: Vec<CategoryBucket> = table
        .iter()
        .map(|(label, _)| CategoryBucket {
            label: (*label).to_string(),
            skills: Vec::new(),
        })
        .collect();
    buckets.push(CategoryBucket {
        label: UNCATEGORIZED.to_string(),
        skills: Vec::new(),
    });

    for (skill, score) in skills {
        let skill_lower = skill.to_lowercase();
        let slot = table
            .iter()
            .position(|(_, terms)| {
                terms.iter().any(|term| {
                    let term_lower = term.to_lowercase();
                    skill_lower.contains(&term_lower) || term_lower.contains(&skill_lower)
                })
            })
            .unwrap_or(table.len());
        if slot == table.len() {
            debug!(%skill, %role, "skill did not match any curated category");
        }
        buckets[slot].skills.push((skill.clone(), score.clone()));
    }

    let mut result: Vec<CategoryBucket> = buckets
        .into_iter()
        .filter(|bucket| !bucket.skills.is_empty())
        .collect();
    for bucket in &mut result {
        bucket.skills.sort_by(|a, b| {
            score_of(&b.1)
                .partial_cmp(&score_of(&a.1))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    result
}

fn score_of(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0)
}

/// JSON-object view of the buckets (label → skill → score), preserving
/// bucket order and rank order.
pub fn buckets_to_json(buckets: &[CategoryBucket]) -> SkillMap {
    let mut object = SkillMap::new();
    for bucket in buckets {
        let skills: SkillMap = bucket
            .skills
            .iter()
            .map(|(skill, score)| (skill.clone(), score.clone()))
            .collect();
        object.insert(bucket.label.clone(), Value::Object(skills));
    }
    object
}

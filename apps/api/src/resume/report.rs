//! Deterministic keyword report for resume text. No LLM involved.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Technical skills looked for in the resume, matched as case-insensitive patterns.
pub const SKILLS: [&str; 10] = [
    "JavaScript",
    "React",
    "Node.js",
    "Python",
    "Java",
    "SQL",
    "Git",
    "AWS",
    "HTML/CSS",
    "TypeScript",
];

const ACTION_VERBS_TIP: &str = "Use more action verbs (developed, implemented, optimized)";
const QUANTIFY_TIP: &str =
    "Quantify achievements where possible (e.g., \"Increased performance by 30%\")";

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("built-in patterns are valid regexes")
}

static CONTACT: Lazy<Regex> = Lazy::new(|| case_insensitive("(email|phone|contact)"));
static EDUCATION: Lazy<Regex> = Lazy::new(|| case_insensitive("(education|degree|school)"));
static EXPERIENCE: Lazy<Regex> = Lazy::new(|| case_insensitive("(experience|work|job)"));
static SKILLS_SECTION: Lazy<Regex> = Lazy::new(|| case_insensitive("(skills|technical|programming)"));
static SKILL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    SKILLS
        .iter()
        .map(|skill| (*skill, case_insensitive(skill)))
        .collect()
});

/// Number of occurrences of each detected skill.
pub fn skill_frequencies(text: &str) -> Vec<(&'static str, usize)> {
    SKILL_PATTERNS
        .iter()
        .map(|(skill, pattern)| (*skill, pattern.find_iter(text).count()))
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionChecks {
    pub contact: bool,
    pub education: bool,
    pub experience: bool,
    pub skills: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordReport {
    pub word_count: usize,
    pub sections: SectionChecks,
    pub detected_skills: Vec<&'static str>,
    pub recommendations: Vec<String>,
    /// `min(100, 70 + skills * 3 + words / 10)`, not rounded.
    pub score: f64,
}

impl KeywordReport {
    pub fn analyze(text: &str) -> Self {
        let word_count = text.split_whitespace().count();
        let sections = SectionChecks {
            contact: CONTACT.is_match(text),
            education: EDUCATION.is_match(text),
            experience: EXPERIENCE.is_match(text),
            skills: SKILLS_SECTION.is_match(text),
        };
        let detected_skills: Vec<&'static str> = SKILL_PATTERNS
            .iter()
            .filter(|(_, pattern)| pattern.is_match(text))
            .map(|(skill, _)| *skill)
            .collect();

        let recommendations = vec![
            if word_count < 300 {
                "Consider adding more details"
            } else {
                "Good length"
            }
            .to_string(),
            if sections.contact {
                "Contact info looks good"
            } else {
                "Add contact information"
            }
            .to_string(),
            if detected_skills.len() < 3 {
                "Highlight more technical skills"
            } else {
                "Good technical skills coverage"
            }
            .to_string(),
            ACTION_VERBS_TIP.to_string(),
            QUANTIFY_TIP.to_string(),
        ];

        let score =
            (70.0 + detected_skills.len() as f64 * 3.0 + word_count as f64 / 10.0).min(100.0);

        Self {
            word_count,
            sections,
            detected_skills,
            recommendations,
            score,
        }
    }

    /// Plain-text report in the layout the analyzer page displays and copies.
    pub fn render(&self) -> String {
        let mark = |found: bool, present: &str, missing: &str| {
            if found {
                format!("✓ {present}")
            } else {
                format!("⚠ Missing {missing}")
            }
        };
        let skills = if self.detected_skills.is_empty() {
            "    No specific technical skills detected".to_string()
        } else {
            self.detected_skills
                .iter()
                .map(|skill| format!("    • {skill}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "\n    📄 Resume Analysis Report\n    -------------------------\n    \n    🔍 Basic Metrics:\n    - Word Count: {words} words\n    - Sections Detected:\n      {contact}\n      {education}\n      {experience}\n      {skills_section}\n    \n    💻 Technical Skills Found:\n    {skills}\n    \n    ⚡ Recommendations:\n{recommendations}\n    \n    📈 Overall Score: {score}/100\n    ",
            words = self.word_count,
            contact = mark(self.sections.contact, "Contact Information", "Contact Info"),
            education = mark(self.sections.education, "Education", "Education Section"),
            experience = mark(
                self.sections.experience,
                "Work Experience",
                "Experience Section"
            ),
            skills_section = mark(self.sections.skills, "Skills Section", "Skills Section"),
            skills = skills,
            recommendations = self
                .recommendations
                .iter()
                .enumerate()
                .map(|(i, r)| format!("    {}. {r}", i + 1))
                .collect::<Vec<_>>()
                .join("\n"),
            score = self.score,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRONG_RESUME: &str = "Jane Doe - email: jane@example.com\n\
        Education: BSc Computer Science degree\n\
        Experience: Senior engineer building React and TypeScript apps on AWS with Python tooling";

    #[test]
    fn test_sections_and_skills_are_case_insensitive() {
        let report = KeywordReport::analyze("EMAIL me. my SKILLS include javascript and sql");
        assert!(report.sections.contact);
        assert!(report.sections.skills);
        assert!(!report.sections.education);
        assert!(!report.sections.experience);
        // "javascript" also contains "java"
        assert_eq!(report.detected_skills, vec!["JavaScript", "Java", "SQL"]);
    }

    #[test]
    fn test_score_formula() {
        let report = KeywordReport::analyze(STRONG_RESUME);
        assert_eq!(report.detected_skills, vec!["React", "Python", "AWS", "TypeScript"]);
        let expected = 70.0 + 4.0 * 3.0 + report.word_count as f64 / 10.0;
        assert_eq!(report.score, expected);
    }

    #[test]
    fn test_skill_frequencies_count_every_match() {
        let counts = skill_frequencies("Python scripts, python tests, and some Git");
        assert_eq!(counts, vec![("Python", 2), ("Git", 1)]);
    }

    #[test]
    fn test_score_is_capped_at_100() {
        let long = "python ".repeat(1000);
        let report = KeywordReport::analyze(&long);
        assert_eq!(report.word_count, 1000);
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn test_recommendations_for_thin_resume() {
        let report = KeywordReport::analyze("Just a few words here");
        assert_eq!(report.recommendations[0], "Consider adding more details");
        assert_eq!(report.recommendations[1], "Add contact information");
        assert_eq!(report.recommendations[2], "Highlight more technical skills");
        assert_eq!(report.recommendations.len(), 5);
    }

    #[test]
    fn test_recommendations_for_complete_resume() {
        let text = format!("{STRONG_RESUME} {}", "word ".repeat(300));
        let report = KeywordReport::analyze(&text);
        assert_eq!(report.recommendations[0], "Good length");
        assert_eq!(report.recommendations[1], "Contact info looks good");
        assert_eq!(report.recommendations[2], "Good technical skills coverage");
    }

    #[test]
    fn test_render_layout() {
        let rendered = KeywordReport::analyze("phone 555 Git").render();
        assert!(rendered.starts_with("\n    📄 Resume Analysis Report\n"));
        assert!(rendered.contains("    - Word Count: 3 words\n"));
        assert!(rendered.contains("      ✓ Contact Information\n"));
        assert!(rendered.contains("      ⚠ Missing Education Section\n"));
        assert!(rendered.contains("    💻 Technical Skills Found:\n        • Git\n"));
        assert!(rendered.contains("    2. Contact info looks good\n"));
        assert!(rendered.contains("📈 Overall Score: 73.3/100"));
    }

    #[test]
    fn test_render_without_skills() {
        let rendered = KeywordReport::analyze("nothing relevant").render();
        assert!(rendered.contains("        No specific technical skills detected\n"));
    }
}

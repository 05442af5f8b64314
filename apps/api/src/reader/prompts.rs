// Article reader prompt templates.

/// Longest slice of article text sent as context with an AI comment request.
pub const MAX_CONTEXT_CHARS: usize = 12_000;

pub const ARTICLE_ANALYST_SYSTEM: &str = "\
You are a study assistant annotating an academic article for a student.
Write a short margin comment (at most 150 words) that helps the student understand the text.

Guidelines:
- When a passage is selected, explain that passage in the context of the article
- Otherwise summarise the article's main claim, method and findings
- Define jargon in plain language
- Point out one question worth thinking about
- Do not invent content that is not in the article
";

pub fn annotation_prompt(article_name: &str, article_text: &str, selected_text: Option<&str>) -> String {
    let context: String = article_text.chars().take(MAX_CONTEXT_CHARS).collect();
    let context = if context.trim().is_empty() {
        "(no text could be extracted from this file)".to_string()
    } else {
        context
    };

    match selected_text.map(str::trim).filter(|s| !s.is_empty()) {
        Some(selection) => format!(
            "Article: {article_name}\n\n{context}\n\nSelected passage:\n\"{selection}\"\n\nExplain the selected passage."
        ),
        None => format!("Article: {article_name}\n\n{context}\n\nAnalyze this article."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_with_selection() {
        let prompt = annotation_prompt("cells.pdf", "Cells divide.", Some(" mitosis "));
        assert!(prompt.starts_with("Article: cells.pdf\n\nCells divide."));
        assert!(prompt.contains("Selected passage:\n\"mitosis\""));
    }

    #[test]
    fn test_prompt_without_text_or_selection() {
        let prompt = annotation_prompt("scan.pdf", "  ", None);
        assert!(prompt.contains("(no text could be extracted from this file)"));
        assert!(prompt.ends_with("Analyze this article."));
    }

    #[test]
    fn test_context_is_bounded() {
        let long = "q".repeat(MAX_CONTEXT_CHARS + 100);
        let prompt = annotation_prompt("long.txt", &long, None);
        assert!(prompt.contains(&"q".repeat(MAX_CONTEXT_CHARS)));
        assert!(!prompt.contains(&"q".repeat(MAX_CONTEXT_CHARS + 1)));
    }
}

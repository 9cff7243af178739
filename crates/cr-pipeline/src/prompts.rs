//! Prompt templates for the three summarization steps.

use cr_core::Error;

/// A prompt with `{name}` placeholders for a fixed set of input variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub input_variables: &'static [&'static str],
    pub template: &'static str,
}

impl PromptTemplate {
    /// Substitute every declared variable. All declared variables must be
    /// supplied. Substituted values are never re-scanned, so braces inside
    /// fetched content pass through untouched.
    pub fn render(&self, variables: &[(&str, &str)]) -> Result<String, Error> {
        for required in self.input_variables {
            if !variables.iter().any(|(name, _)| name == required) {
                return Err(Error::template(
                    self.name,
                    format!("missing variable '{}'", required),
                ));
            }
        }

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                self.input_variables
                    .contains(&name)
                    .then(|| variables.iter().find(|(n, _)| *n == name))
                    .flatten()
                    .map(|(_, value)| (*value, close))
            });

            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}

pub const COMPANY_PROFILE_PROMPT: PromptTemplate = PromptTemplate {
    name: "company_profile",
    input_variables: &["company_url", "website_content"],
    template: r#"Based on the following content from the company's website ({company_url}), provide a concise overview of the company.
Focus on:
1. What the company does (its main products/services).
2. Its stated mission or primary goal, if apparent.
3. Its target audience or industry, if clear.

Keep the overview to 3-4 concise paragraphs.

Website Content:
{website_content}

Concise Company Overview:
"#,
};

pub const NEWS_SUMMARY_PROMPT: PromptTemplate = PromptTemplate {
    name: "news_summary",
    input_variables: &["company_name", "article_content"],
    template: r#"You are a helpful assistant. Based on the following news article content, provide a 1-2 sentence summary.
Focus on the key takeaway of the article regarding the company {company_name}.

Article Content:
{article_content}

Summary:
"#,
};

pub const FINAL_REPORT_PROMPT: PromptTemplate = PromptTemplate {
    name: "final_report",
    input_variables: &["company_name", "profile_summary", "news_summaries"],
    template: r#"You are a research assistant. Compile a brief company research report for {company_name} using the information provided.
Structure the report with the following sections:
1. Company Overview
2. Recent News Highlights

Use a professional and informative tone. Ensure the report flows well.

Provided Information:
--- Company Overview ---
{profile_summary}

--- Recent News ---
{news_summaries}

---
Company Research Report for {company_name}:
"#,
};

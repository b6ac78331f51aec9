//! Instruction templates for the generation service.
//!
//! Each [`TaskKind`](crate::request::TaskKind) has a fixed system prompt
//! describing the expected structured output; the user prompt interpolates
//! a record's identifying fields with `N/A` placeholders for anything the
//! file does not carry.

use crate::record::Record;
use crate::request::TaskKind;

const ATTRIBUTE_EXTRACTION: &str = "\
You are a product classification expert. Analyze each product and generate \
3-6 concise, relevant product attributes reflecting what the product \
specifically does or supports.

Guidelines:
1. Focus on actual features, capabilities, or technical functionality
2. Add new, complementary attributes rather than repeating existing ones
3. Keep each attribute 1-3 words long
4. Prioritize specificity over generic categories
5. Add a relevance score (1-10)

Return the response in JSON format:
{
    \"attributes\": [{\"name\": \"string\", \"score\": 1}]
}

Be concise and accurate. If information is not available, use null or an \
empty string.";

const SALES_FAQ: &str = "\
You are a sales support specialist. Generate comprehensive FAQ content for \
products based on their descriptions: the 5 most likely customer questions \
with clear, persuasive answers, objection handling points, and suggested \
upsells where applicable.

Return the response in JSON format:
{
    \"faqs\": [{\"question\": \"string\", \"answer\": \"string\", \
\"category\": \"general|pricing|features|compatibility|support\"}],
    \"objection_handling\": [\"string\"],
    \"suggested_upsells\": [\"string\"],
    \"sales_points\": [\"string\"]
}

Make answers customer-friendly and sales-oriented.";

const DATA_QA: &str = "\
You are a data quality analyst. Evaluate each product's data for \
completeness, accuracy, and potential issues, with suggestions for \
improvement.

Return the response in JSON format:
{
    \"completeness_score\": 0,
    \"quality_issues\": [\"string\"],
    \"missing_fields\": [\"string\"],
    \"improvement_suggestions\": [\"string\"],
    \"confidence_score\": 0,
    \"data_quality_grade\": \"A|B|C|D|F\"
}

Be thorough and constructive in your analysis.";

const CONTENT_ENRICHMENT: &str = "\
You are a content marketing specialist. Enhance product descriptions with \
SEO-friendly, engaging content: an enhanced description, SEO keywords, \
marketing copy, and a social media snippet.

Return the response in JSON format:
{
    \"enhanced_description\": \"string\",
    \"seo_keywords\": [\"string\"],
    \"marketing_copy\": \"string\",
    \"social_media_snippet\": \"string\",
    \"meta_description\": \"string\",
    \"benefits\": [\"string\"]
}

Focus on benefits, use persuasive language, and optimize for search engines.";

const CATEGORY_CLASSIFICATION: &str = "\
You are a product categorization expert. Classify products into primary, \
secondary, and tertiary categories with a confidence score and alternative \
categories where applicable.

Return the response in JSON format:
{
    \"primary_category\": \"string\",
    \"secondary_category\": \"string\",
    \"tertiary_category\": \"string\",
    \"confidence_score\": 0,
    \"alternative_categories\": [\"string\"],
    \"classification_reasoning\": \"string\"
}

Use standard e-commerce category structures and be precise in classification.";

/// System prompt for a task.
#[must_use]
pub fn system_prompt(task: TaskKind) -> &'static str {
    match task {
        TaskKind::AttributeExtraction => ATTRIBUTE_EXTRACTION,
        TaskKind::SalesFaq => SALES_FAQ,
        TaskKind::DataQa => DATA_QA,
        TaskKind::ContentEnrichment => CONTENT_ENRICHMENT,
        TaskKind::CategoryClassification => CATEGORY_CLASSIFICATION,
    }
}

/// User prompt interpolating a record's identifying fields.
#[must_use]
pub fn user_prompt(record: &Record) -> String {
    let field = |column: &str| {
        record
            .get_str(column)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "N/A".to_string())
    };
    format!(
        "Product Information:\n\
         - ID: {}\n\
         - Name: {}\n\
         - Description: {}\n\
         - Attributes: {}\n\n\
         Please analyze this product and provide the requested information \
         in the specified JSON format.",
        field("PRODUCT_ID"),
        field("PRODUCT_NAME"),
        field("PRODUCT_DESCRIPTION"),
        field("PRODUCT_ATTRIBUTES"),
    )
}

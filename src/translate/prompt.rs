use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SubfluxError};

/// JSON payload the model is asked to return
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BatchTranslation {
    translations: Vec<String>,
}

/// System instructions shared by every backend
pub fn system_prompt() -> &'static str {
    "You are a professional subtitle translator. You translate film and TV \
     captions naturally and concisely, keeping line breaks inside a caption, \
     and you always answer with JSON only."
}

/// Build the user prompt for one batch of caption texts
pub fn build_batch_prompt(
    texts: &[&str],
    target_language: &str,
    source_language: Option<&str>,
) -> String {
    let target_name = language_name(target_language);
    let source_clause = match source_language {
        Some(code) if !code.trim().is_empty() && code != "auto" => {
            format!("from {} ", language_name(code))
        }
        _ => String::new(),
    };
    let lines = serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Translate the following {} subtitle captions {}to {} (language code: {}).\n\
         \n\
         RULES:\n\
         1. Return exactly {} translations, one per caption, in the same order\n\
         2. Keep \\n line breaks that appear inside a caption\n\
         3. Do not merge, split, number or explain captions\n\
         4. Translate to {} ONLY\n\
         \n\
         Return ONLY JSON in the form {{\"translations\":[\"...\"]}}.\n\
         \n\
         [Captions]\n\
         {}\n",
        texts.len(),
        source_clause,
        target_name,
        target_language,
        texts.len(),
        target_name,
        lines
    )
}

/// Extract the translations array from a raw model answer.
///
/// Models wrap JSON in code fences or chatter, so this tries the plain body,
/// then the fenced body, then the outermost braces, then a bare array.
pub fn parse_batch_response(raw: &str, expected: usize) -> Result<Vec<String>> {
    let translations = try_flexible_json_parsing(raw).ok_or_else(|| {
        SubfluxError::Translation(format!(
            "Could not parse translation response: {}",
            truncate(raw, 200)
        ))
    })?;

    if translations.len() != expected {
        return Err(SubfluxError::Translation(format!(
            "Expected {} translations, received {}",
            expected,
            translations.len()
        )));
    }

    Ok(translations.into_iter().map(|t| t.trim().to_string()).collect())
}

fn try_flexible_json_parsing(text: &str) -> Option<Vec<String>> {
    let text = text.trim();

    if let Ok(parsed) = serde_json::from_str::<BatchTranslation>(text) {
        return Some(parsed.translations);
    }

    let cleaned = remove_markdown_code_blocks(text);
    if cleaned != text {
        debug!("Removed markdown code blocks from translation response");
        if let Ok(parsed) = serde_json::from_str::<BatchTranslation>(&cleaned) {
            return Some(parsed.translations);
        }
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(parsed) = serde_json::from_str::<BatchTranslation>(&cleaned[start..=end]) {
                return Some(parsed.translations);
            }
        }
    }

    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if start < end {
            if let Ok(list) = serde_json::from_str::<Vec<String>>(&cleaned[start..=end]) {
                return Some(list);
            }
        }
    }

    None
}

fn remove_markdown_code_blocks(text: &str) -> String {
    let text = text.trim();

    if let Some(inner) = text.strip_prefix("```json").and_then(|t| t.strip_suffix("```")) {
        return inner.trim().to_string();
    }
    if let Some(inner) = text.strip_prefix("```").and_then(|t| t.strip_suffix("```")) {
        return inner.trim().to_string();
    }

    text.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}

/// Convert language code to full language name for clearer prompts
pub fn language_name(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "en" => "English".to_string(),
        "cs" => "Czech".to_string(),
        "sk" => "Slovak".to_string(),
        "pl" => "Polish".to_string(),
        "de" => "German".to_string(),
        "fr" => "French".to_string(),
        "es" => "Spanish".to_string(),
        "it" => "Italian".to_string(),
        "pt" => "Portuguese".to_string(),
        "nl" => "Dutch".to_string(),
        "sv" => "Swedish".to_string(),
        "da" => "Danish".to_string(),
        "no" => "Norwegian".to_string(),
        "fi" => "Finnish".to_string(),
        "hu" => "Hungarian".to_string(),
        "ro" => "Romanian".to_string(),
        "bg" => "Bulgarian".to_string(),
        "hr" => "Croatian".to_string(),
        "sl" => "Slovenian".to_string(),
        "uk" => "Ukrainian".to_string(),
        "ru" => "Russian".to_string(),
        "el" => "Greek".to_string(),
        "tr" => "Turkish".to_string(),
        "ar" => "Arabic".to_string(),
        "he" => "Hebrew".to_string(),
        "hi" => "Hindi".to_string(),
        "th" => "Thai".to_string(),
        "vi" => "Vietnamese".to_string(),
        "ja" => "Japanese".to_string(),
        "ko" => "Korean".to_string(),
        "zh" => "Chinese".to_string(),
        _ => code.to_string(),
    }
}

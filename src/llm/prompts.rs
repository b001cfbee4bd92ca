//! Prompt templates for note generation.
//!
//! Templates use `format!()` interpolation so a missing variable is a
//! compile-time error rather than a runtime surprise.

use crate::models::{NoteStyle, ProcessingOptions};

/// System prompt sent with every generation request.
pub const SYSTEM_PROMPT: &str = "You are an expert study assistant. You turn raw text \
extracted from images of notes, textbooks, and whiteboards into well-organized study \
notes in Markdown. Be accurate: never invent facts that are not present in the source \
text. If the text is garbled, work with what is legible.";

fn style_instruction(style: NoteStyle) -> &'static str {
    match style {
        NoteStyle::Comprehensive => {
            "Produce comprehensive study notes covering all the material in the text."
        }
        NoteStyle::Concise => {
            "Produce concise study notes. Keep only the essential points, stated briefly."
        }
        NoteStyle::Detailed => {
            "Produce detailed study notes. Expand each topic with explanations and context \
             drawn from the text."
        }
        NoteStyle::Summary => {
            "Produce a short summary of the material rather than full notes."
        }
    }
}

/// Builds the user prompt for turning extracted text into study notes.
///
/// The requested sections and style come from [`ProcessingOptions`]; the
/// extracted text is appended verbatim.
pub fn study_notes_prompt(text: &str, options: &ProcessingOptions) -> String {
    let mut sections = Vec::new();
    sections.push("- A clear title as a top-level Markdown heading".to_string());
    sections.push("- The main content organized under section headings".to_string());
    if options.include_key_points {
        sections.push("- A \"Key Points\" section with the most important takeaways".to_string());
    }
    if options.include_summary {
        sections.push("- A \"Summary\" section of two or three sentences".to_string());
    }
    if options.include_questions {
        sections
            .push("- A \"Review Questions\" section with questions to test understanding".to_string());
    }
    let section_list = sections.join("\n");

    let subject_line = match &options.subject {
        Some(subject) if !subject.trim().is_empty() => {
            format!("The material is from the subject: {}.\n", subject.trim())
        }
        _ => String::new(),
    };

    format!(
        r#"{style}
{subject_line}Format the output as Markdown with the following structure:
{section_list}

Source text (extracted via OCR, may contain recognition errors):
{text}

Respond with the Markdown notes only, no preamble."#,
        style = style_instruction(options.note_style),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_source_text() {
        let text = "The mitochondria is the powerhouse of the cell";
        let prompt = study_notes_prompt(text, &ProcessingOptions::default());

        assert!(prompt.contains(text));
        assert!(prompt.contains("Markdown"));
        assert!(prompt.contains("no preamble"));
    }

    #[test]
    fn default_options_request_all_sections() {
        let prompt = study_notes_prompt("text", &ProcessingOptions::default());

        assert!(prompt.contains("Key Points"));
        assert!(prompt.contains("Summary"));
        assert!(prompt.contains("Review Questions"));
        assert!(prompt.contains("comprehensive"));
    }

    #[test]
    fn disabled_sections_are_omitted() {
        let options = ProcessingOptions {
            include_key_points: false,
            include_questions: false,
            ..ProcessingOptions::default()
        };
        let prompt = study_notes_prompt("text", &options);

        assert!(!prompt.contains("Key Points"));
        assert!(!prompt.contains("Review Questions"));
        assert!(prompt.contains("Summary"));
    }

    #[test]
    fn subject_is_included_when_present() {
        let options = ProcessingOptions {
            subject: Some("Organic Chemistry".to_string()),
            ..ProcessingOptions::default()
        };
        let prompt = study_notes_prompt("text", &options);
        assert!(prompt.contains("Organic Chemistry"));

        let options = ProcessingOptions {
            subject: Some("   ".to_string()),
            ..ProcessingOptions::default()
        };
        let prompt = study_notes_prompt("text", &options);
        assert!(!prompt.contains("subject:"));
    }

    #[test]
    fn style_changes_the_instruction() {
        let concise = ProcessingOptions {
            note_style: NoteStyle::Concise,
            ..ProcessingOptions::default()
        };
        let prompt = study_notes_prompt("text", &concise);
        assert!(prompt.contains("concise"));

        let summary = ProcessingOptions {
            note_style: NoteStyle::Summary,
            ..ProcessingOptions::default()
        };
        let prompt = study_notes_prompt("text", &summary);
        assert!(prompt.contains("short summary"));
    }
}

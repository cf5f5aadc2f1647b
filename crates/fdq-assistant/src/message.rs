//! Assistant message payloads and annotation rewriting

use serde::Deserialize;
use std::collections::HashMap;

use fdq_core::{Answer, Citation};

#[derive(Debug, Deserialize)]
pub(crate) struct MessageList {
    #[serde(default)]
    pub data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageObject {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPart {
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// One annotation span in a raw answer body: the exact substring it covers
/// and, when the excerpt was grounded in an indexed file, that file's id.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Annotation {
    #[serde(default)]
    pub text: String,
    pub file_citation: Option<FileCitation>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileCitation {
    pub file_id: String,
}

impl MessageList {
    /// Text body of the first assistant message, if any
    pub fn first_assistant_text(self) -> Option<TextContent> {
        self.data
            .into_iter()
            .find(|message| message.role == "assistant")
            .and_then(|message| message.content.into_iter().find_map(|part| part.text))
    }
}

/// Rewrite a raw answer body into marker form.
///
/// Each annotation, in listed order, replaces every occurrence of its quoted
/// excerpt with a bracketed marker; the marker increments per annotation, so
/// repeated citations of the same file still get a fresh marker. Annotations
/// that carry a file reference emit a [`Citation`] whose source is looked up
/// in `file_names` (falling back to the raw file id).
pub(crate) fn rewrite_annotations(
    body: &str,
    annotations: &[Annotation],
    file_names: &HashMap<String, String>,
) -> Answer {
    let mut text = body.to_string();
    let mut citations = Vec::new();

    for (marker, annotation) in annotations.iter().enumerate() {
        if !annotation.text.is_empty() {
            text = text.replace(&annotation.text, &format!("[{marker}]"));
        }

        if let Some(file_citation) = &annotation.file_citation {
            let source = file_names
                .get(&file_citation.file_id)
                .cloned()
                .unwrap_or_else(|| file_citation.file_id.clone());
            citations.push(Citation { marker, source });
        }
    }

    Answer::new(text, citations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(text: &str, file_id: Option<&str>) -> Annotation {
        Annotation {
            text: text.to_string(),
            file_citation: file_id.map(|id| FileCitation {
                file_id: id.to_string(),
            }),
        }
    }

    fn names(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect()
    }

    #[test]
    fn single_annotation_becomes_marker_and_citation() {
        let answer = rewrite_annotations(
            "Revenue grew (excerpt A).",
            &[annotation("(excerpt A)", Some("file-1"))],
            &names(&[("file-1", "report.pdf")]),
        );

        assert_eq!(answer.text, "Revenue grew [0].");
        let rendered: Vec<String> = answer.citations.iter().map(Citation::to_string).collect();
        assert_eq!(rendered, vec!["[0] report.pdf"]);
    }

    #[test]
    fn repeated_citations_of_one_file_get_fresh_markers() {
        let answer = rewrite_annotations(
            "First claim (a). Second claim (b).",
            &[
                annotation("(a)", Some("file-1")),
                annotation("(b)", Some("file-1")),
            ],
            &names(&[("file-1", "report.pdf")]),
        );

        assert_eq!(answer.text, "First claim [0]. Second claim [1].");
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].marker, 0);
        assert_eq!(answer.citations[1].marker, 1);
        assert_eq!(answer.citations[1].source, "report.pdf");
    }

    #[test]
    fn every_occurrence_of_an_excerpt_is_replaced() {
        let answer = rewrite_annotations(
            "See (ref) and again (ref).",
            &[annotation("(ref)", Some("file-1"))],
            &names(&[("file-1", "label.pdf")]),
        );

        assert_eq!(answer.text, "See [0] and again [0].");
        assert_eq!(answer.citations.len(), 1);
    }

    #[test]
    fn annotations_without_files_consume_a_marker_but_no_citation() {
        let answer = rewrite_annotations(
            "Alpha (x) beta (y).",
            &[
                annotation("(x)", None),
                annotation("(y)", Some("file-2")),
            ],
            &names(&[("file-2", "review.pdf")]),
        );

        assert_eq!(answer.text, "Alpha [0] beta [1].");
        let rendered: Vec<String> = answer.citations.iter().map(Citation::to_string).collect();
        assert_eq!(rendered, vec!["[1] review.pdf"]);
    }

    #[test]
    fn unknown_file_ids_fall_back_to_the_raw_id() {
        let answer = rewrite_annotations(
            "Claim (z).",
            &[annotation("(z)", Some("file-9"))],
            &HashMap::new(),
        );

        assert_eq!(answer.citations[0].source, "file-9");
    }

    #[test]
    fn first_assistant_text_works_on_a_single_message_page() {
        let list: MessageList = serde_json::from_str(
            r#"{
                "data": [
                    {"role": "assistant", "content": [{"type": "text", "text": {"value": "grounded answer", "annotations": []}}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(list.first_assistant_text().unwrap().value, "grounded answer");
    }

    #[test]
    fn first_assistant_text_skips_user_messages() {
        let list: MessageList = serde_json::from_str(
            r#"{
                "data": [
                    {"role": "assistant", "content": [{"type": "text", "text": {"value": "grounded answer", "annotations": []}}]},
                    {"role": "user", "content": [{"type": "text", "text": {"value": "the question", "annotations": []}}]}
                ]
            }"#,
        )
        .unwrap();

        let text = list.first_assistant_text().unwrap();
        assert_eq!(text.value, "grounded answer");
    }
}

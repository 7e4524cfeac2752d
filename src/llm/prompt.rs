/// Strict instruction header: the model must answer only from the supplied
/// documents and label its reply with `answer:` / `sourceDocument:` lines.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant for document search.
Your primary goal is to answer questions *ONLY* based on the 'Document Content:' provided below.
If you cannot find the answer *strictly* within the provided documents, you MUST respond with: 'answer: I cannot find the answer to your question in the provided documents. Please try rephrasing or upload more relevant documents.'
DO NOT use any outside knowledge or general information.
If your answer is directly derived from the content within the 'Document Content:' sections, provide a concise answer. After the answer, include a 'sourceDocument:' field with the exact 'Document Name:' from which the information was found.
If the question is a greeting or a general conversational query (e.g., 'How are you?'), and no documents are provided or relevant, then do NOT include the 'sourceDocument:' field, and provide a general, conversational answer.
Always format your response with 'answer:' on its own line.

Example for document-based answer:
answer: The capital of France is Paris.
sourceDocument: geography_faq.txt

Example for general answer/greeting (only if no documents are provided or question is not document-related):
answer: Hello! How can I assist you today?

Here are the documents for your reference:
";

pub const NO_DOCUMENTS_NOTICE: &str = "No specific documents are provided for this query.";

const DOCUMENT_SEPARATOR: &str = "\n---END_DOCUMENT---\n";
const DOCUMENTS_TERMINATOR: &str = "---END_OF_ALL_DOCUMENTS---";

/// Assemble the full prompt: instruction header, then each qualifying document
/// as a labeled block, then the user's question. With no documents the fixed
/// notice stands in for the blocks.
pub fn build_prompt(documents: &[(String, String)], question: &str) -> String {
    let mut prompt = String::from(SYSTEM_INSTRUCTION);

    if documents.is_empty() {
        prompt.push('\n');
        prompt.push_str(NO_DOCUMENTS_NOTICE);
        prompt.push_str("\n\n");
    } else {
        let blocks: Vec<String> = documents
            .iter()
            .map(|(name, text)| format!("Document Name: {}\nDocument Content:\n{}", name, text))
            .collect();
        prompt.push('\n');
        prompt.push_str(&blocks.join(DOCUMENT_SEPARATOR));
        prompt.push('\n');
        prompt.push_str(DOCUMENTS_TERMINATOR);
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!("User Question: {}", question));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_set_uses_notice() {
        let prompt = build_prompt(&[], "What is up?");
        assert!(prompt.contains(NO_DOCUMENTS_NOTICE));
        assert!(!prompt.contains("Document Name:"));
        assert!(prompt.ends_with("User Question: What is up?"));
    }

    #[test]
    fn documents_render_as_labeled_blocks() {
        let docs = vec![
            ("a.txt".to_string(), "alpha".to_string()),
            ("b.pdf".to_string(), "beta".to_string()),
        ];
        let prompt = build_prompt(&docs, "Which letter?");

        assert!(prompt.starts_with(SYSTEM_INSTRUCTION));
        assert!(prompt.contains("Document Name: a.txt\nDocument Content:\nalpha"));
        assert!(prompt.contains("Document Name: b.pdf\nDocument Content:\nbeta"));
        assert!(prompt.contains(DOCUMENT_SEPARATOR));
        assert!(prompt.contains(DOCUMENTS_TERMINATOR));
        assert!(!prompt.contains(NO_DOCUMENTS_NOTICE));
        assert!(prompt.ends_with("User Question: Which letter?"));
    }

    #[test]
    fn single_document_has_no_separator() {
        let docs = vec![("only.txt".to_string(), "solo".to_string())];
        let prompt = build_prompt(&docs, "q");
        assert!(!prompt.contains(DOCUMENT_SEPARATOR));
        assert!(prompt.contains(DOCUMENTS_TERMINATOR));
    }
}

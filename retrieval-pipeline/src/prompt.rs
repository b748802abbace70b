/// Renders the single-turn prompt sent to the answer generator. The user
/// question is inserted verbatim.
pub fn build_prompt(preamble: &str, context: &str, user_input: &str) -> String {
    format!("{preamble}\n\nContext:\n{context}\n\nUser Question:\n{user_input}\n\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_layout_is_fixed() {
        let prompt = build_prompt("Be brief.", "X is Y.", "What is X?");
        assert_eq!(
            prompt,
            "Be brief.\n\nContext:\nX is Y.\n\nUser Question:\nWhat is X?\n\nAnswer:"
        );
    }

    #[test]
    fn question_is_not_trimmed_or_escaped() {
        let prompt = build_prompt("P", "ctx", "  {odd} question?\n");
        assert!(prompt.contains("User Question:\n  {odd} question?\n\n\nAnswer:"));
    }
}

use super::AnnotatedSentence;

/// Remove the words that do not have a head.
///
/// Annotations can contain words that are not part of the dependency
/// structure, such as the surface form of a multi-word token. These
/// words must not occupy a word index in the tokenizer output. The
/// relative order of the remaining words is preserved and their heads
/// are not renumbered, since the removed words never had a head
/// ordinal.
pub fn filter_missing_heads(sentence: AnnotatedSentence) -> AnnotatedSentence {
    sentence
        .into_iter()
        .filter(|word| word.head.is_some())
        .collect()
}

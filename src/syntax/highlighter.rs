//! Capture name to tag mapping

use crate::types::TokenTag;
use super::tags;

/// Map a highlight capture name (`keyword.control`, `string`, ...) to a tag
///
/// Only the first dotted component is considered.
pub fn tag_for_capture(name: &str) -> TokenTag {
    let base_category = name.split('.').next().unwrap_or(name);

    match base_category {
        "keyword" | "conditional" | "repeat" | "exception" => tags::KEYWORD,
        "function" | "method" | "constructor" => tags::FUNCTION,
        "type" | "class" | "interface" | "struct" | "enum" => tags::TYPE,
        "variable" | "parameter" | "field" => tags::VARIABLE,
        "constant" | "boolean" => tags::CONSTANT,
        "number" | "float" => tags::NUMBER,
        "string" | "character" | "escape" => tags::STRING,
        "comment" | "note" | "warning" | "danger" => tags::COMMENT,
        "operator" => tags::OPERATOR,
        "punctuation" | "delimiter" | "special" => tags::PUNCTUATION,
        "bracket" => tags::BRACKET,
        "property" | "attribute" | "tag" | "decorator" | "label" => tags::PROPERTY,
        "embedded" | "include" | "preproc" => tags::PREPROCESSOR,
        "namespace" | "module" => tags::TYPE,
        _ => tags::PLAIN,
    }
}

/// Human-readable name of a tag
pub fn tag_name(tag: TokenTag) -> &'static str {
    match tag {
        tags::COMMENT => "comment",
        tags::KEYWORD => "keyword",
        tags::OPERATOR => "operator",
        tags::IDENTIFIER => "identifier",
        tags::NUMBER => "number",
        tags::STRING => "string",
        tags::BRACKET => "bracket",
        tags::PUNCTUATION => "punctuation",
        tags::PREPROCESSOR => "preprocessor",
        tags::TYPE => "type",
        tags::FUNCTION => "function",
        tags::CONSTANT => "constant",
        tags::PROPERTY => "property",
        tags::VARIABLE => "variable",
        _ => "plain",
    }
}

//! Splitting a script file into its top-level blocks.

use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*=\s*\{").expect("block opener pattern is valid"));

/// A named top-level block, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelBlock {
    /// Identifier before the opening `= {`.
    pub key: String,
    /// Lines after the opener, up to and including the closing line.
    pub body: String,
}

fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Split preprocessed content into top-level blocks.
///
/// A line matching `identifier = {` while no block is open starts a new
/// block. Braces are counted per line, and the block ends on the line that
/// brings the count back to zero. Content outside any block (such as
/// `@variable = 5` definitions) is ignored. A block still open at the end
/// of input is kept. Duplicate keys are all returned, in order.
#[must_use]
pub fn split_top_level(content: &str) -> Vec<TopLevelBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<TopLevelBlock> = None;
    let mut depth: i64 = 0;

    for line in content.lines() {
        let opener = if depth == 0 {
            BLOCK_OPENER.captures(line)
        } else {
            None
        };

        if let Some(caps) = opener {
            blocks.extend(current.take());
            current = Some(TopLevelBlock {
                key: caps[1].to_string(),
                body: String::new(),
            });
            depth += brace_delta(line);
        } else if let Some(block) = current.as_mut() {
            block.body.push_str(line);
            block.body.push('\n');
            depth += brace_delta(line);
            if depth == 0 {
                blocks.extend(current.take());
            }
        }
    }
    blocks.extend(current);

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::preprocess;

    #[test]
    fn test_split_two_blocks() {
        let content = "tech_a = {\ncost = 1\n}\ntech_b = {\ncost = 2\n}\n";
        let blocks = split_top_level(content);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].key, "tech_a");
        assert_eq!(blocks[0].body, "cost = 1\n}\n");
        assert_eq!(blocks[1].key, "tech_b");
    }

    #[test]
    fn test_nested_opener_does_not_split() {
        let content = "tech_a = {\nmodifier = {\nfactor = 2\n}\n}\n";
        let blocks = split_top_level(content);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "modifier = {\nfactor = 2\n}\n}\n");
    }

    #[test]
    fn test_variables_outside_blocks_ignored() {
        let content = preprocess("@tier1cost = 500\ntech_a = { cost = @tier1cost }\n");
        let blocks = split_top_level(&content);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].key, "tech_a");
    }

    #[test]
    fn test_unterminated_block_kept() {
        let blocks = split_top_level("tech_a = {\ncost = 1\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "cost = 1\n");
    }

    #[test]
    fn test_duplicate_keys_all_returned() {
        let blocks = split_top_level("tech_a = {\ncost = 1\n}\ntech_a = {\ncost = 2\n}\n");
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.key == "tech_a"));
    }
}

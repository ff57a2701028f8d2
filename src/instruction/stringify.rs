//! Instruction trees back to URL strings.
//!
//! The output parses back to a structurally equal tree: single children use
//! `a/b`, multiple children are grouped as `a/(b+c)`, siblings are joined
//! with `+`, and names and values are percent-encoded.

use super::model::{InstructionTree, ViewportInstruction};

/// Render a whole tree.
pub fn stringify(tree: &InstructionTree) -> String {
    stringify_instructions(&tree.instructions)
}

/// Render a sibling list.
pub fn stringify_instructions(list: &[ViewportInstruction]) -> String {
    list.iter()
        .map(stringify_one)
        .collect::<Vec<_>>()
        .join("+")
}

fn stringify_one(instruction: &ViewportInstruction) -> String {
    let mut out = String::new();
    match &instruction.component {
        None => out.push('-'),
        Some(component) => {
            out.push_str(&urlencoding::encode(component.name()));
            if !instruction.parameters.is_empty() {
                let params: Vec<String> = instruction
                    .parameters
                    .iter()
                    .map(|p| match &p.name {
                        Some(name) => format!(
                            "{}={}",
                            urlencoding::encode(name),
                            urlencoding::encode(&p.value)
                        ),
                        None => urlencoding::encode(&p.value).into_owned(),
                    })
                    .collect();
                out.push('(');
                out.push_str(&params.join(","));
                out.push(')');
            }
        }
    }

    if let Some(viewport) = &instruction.viewport {
        out.push('@');
        out.push_str(&urlencoding::encode(viewport));
    }

    match instruction.children.as_slice() {
        [] => {}
        [only] => {
            out.push('/');
            out.push_str(&stringify_one(only));
        }
        many => {
            out.push_str("/(");
            out.push_str(&stringify_instructions(many));
            out.push(')');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::parser::parse_url;
    use pretty_assertions::assert_eq;

    fn vi(name: &str) -> ViewportInstruction {
        ViewportInstruction::new(name)
    }

    #[test]
    fn renders_nesting_and_siblings() {
        let tree = InstructionTree::new(vec![
            vi("a").with_children([vi("b").with_child(vi("d")), vi("c")]),
            vi("e").with_viewport("side"),
        ]);
        assert_eq!(stringify(&tree), "a/(b/d+c)+e@side");
    }

    #[test]
    fn renders_params_and_clear() {
        let tree = InstructionTree::new(vec![
            vi("user").with_param("1").with_named_param("tab", "a b"),
            ViewportInstruction::clear(Some("left")),
        ]);
        assert_eq!(stringify(&tree), "user(1,tab=a%20b)+-@left");
    }

    #[test]
    fn empty_tree_is_empty_string() {
        assert_eq!(stringify(&InstructionTree::empty()), "");
    }

    #[test]
    fn display_matches_stringify() {
        let tree = InstructionTree::new(vec![vi("a").with_child(vi("b"))]);
        assert_eq!(tree.to_string(), "a/b");
        assert_eq!(tree.instructions[0].to_string(), "a/b");
    }

    #[test]
    fn round_trips() {
        for url in [
            "a",
            "a/b/c",
            "a+b+c",
            "a/b+c",
            "a/(b+c)",
            "a/(b/(x+y)+c/d)+e",
            "user(42,tab=info)@main/detail(x=%2F)",
            "-@left+list@right",
            "shell/(-@aside+page(1))",
        ] {
            let tree = parse_url(url).unwrap();
            let rendered = stringify(&tree);
            assert_eq!(parse_url(&rendered).unwrap(), tree, "round trip of '{url}'");
        }
    }

    #[test]
    fn object_tree_round_trips() {
        let tree = InstructionTree::new(vec![
            vi("a b").with_param("(x)").with_viewport("v/1").with_children([
                vi("c").with_named_param("k+", "v@"),
                vi("d").with_viewport("z"),
            ]),
        ]);
        assert_eq!(parse_url(&stringify(&tree)).unwrap(), tree);
    }
}

//! Structural pointer resolution against the positional tree

use super::json::{NodeKind, SyntaxNode};

/// Split a JSON pointer (`/a/0/b~1c`) into unescaped tokens.
///
/// The empty pointer addresses the root and yields no tokens.
pub fn parse_pointer(pointer: &str) -> Vec<String> {
    let pointer = pointer.strip_prefix('#').unwrap_or(pointer);
    if pointer.is_empty() {
        return Vec::new();
    }

    pointer
        .strip_prefix('/')
        .unwrap_or(pointer)
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Encode tokens back into a JSON pointer
pub fn format_pointer<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| format!("/{}", t.as_ref().replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Find the `Property` node for `key` in an object node
pub fn find_member<'a>(object: &'a SyntaxNode, key: &str) -> Option<&'a SyntaxNode> {
    if object.kind != NodeKind::Object {
        return None;
    }
    // Later duplicates win, matching what serde_json keeps.
    object
        .children
        .iter()
        .rev()
        .find(|property| property.key().and_then(SyntaxNode::as_str) == Some(key))
}

/// Step from a container into the child addressed by `token`
fn child<'a>(node: &'a SyntaxNode, token: &str) -> Option<&'a SyntaxNode> {
    match node.kind {
        NodeKind::Object => find_member(node, token)?.property_value(),
        NodeKind::Array => {
            let index: usize = token.parse().ok()?;
            node.children.get(index)
        }
        _ => None,
    }
}

/// Resolve `tokens` to the tightest node, or `None` if any step is missing
pub fn resolve<'a, S: AsRef<str>>(root: &'a SyntaxNode, tokens: &[S]) -> Option<&'a SyntaxNode> {
    tokens
        .iter()
        .try_fold(root, |node, token| child(node, token.as_ref()))
}

/// Outcome of a best-effort resolution
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    /// The addressed node, or its deepest existing ancestor
    pub node: &'a SyntaxNode,
    /// Key of the property whose value is `node`, when there is one
    pub key: Option<&'a SyntaxNode>,
    /// Whether every token was matched
    pub exact: bool,
}

/// Resolve as far as the tree allows
pub fn resolve_nearest<'a, S: AsRef<str>>(root: &'a SyntaxNode, tokens: &[S]) -> Resolution<'a> {
    let mut resolution = Resolution {
        node: root,
        key: None,
        exact: true,
    };

    for token in tokens {
        let token = token.as_ref();
        let step = match resolution.node.kind {
            NodeKind::Object => find_member(resolution.node, token)
                .and_then(|property| Some((property.property_value()?, property.key()))),
            _ => child(resolution.node, token).map(|node| (node, None)),
        };

        match step {
            Some((node, key)) => {
                resolution.node = node;
                resolution.key = key;
            }
            None => {
                resolution.exact = false;
                break;
            }
        }
    }

    resolution
}

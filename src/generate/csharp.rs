//! C# declaration scan via tree-sitter: classes, their namespace, and their public methods.

use tree_sitter::{Node, Parser, Tree};

use crate::error::TransformError;

/// One class found in a document, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassOutline {
    /// Enclosing namespace joined with `.`, or `None` for the global namespace.
    pub namespace: Option<String>,
    pub name: String,
    /// Names of directly declared `public` methods, in declaration order, not yet unique.
    pub public_methods: Vec<String>,
}

fn parse(source: &str) -> Result<Tree, TransformError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .map_err(|e| TransformError::Grammar(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| TransformError::Grammar("parser returned no tree".to_string()))
}

/// 1-based line of the first error or missing node in document order. Only
/// subtrees that report an error are entered.
fn first_error_line(root: Node) -> Option<usize> {
    if !root.has_error() {
        return None;
    }
    let mut deepest = root;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if !node.has_error() {
            continue;
        }
        deepest = node;
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    Some(deepest.start_position().row + 1)
}

fn text<'a>(node: Node, src: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(src).ok()
}

fn field_text(node: Node, field: &str, src: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| text(n, src))
        .map(|s| s.split_whitespace().collect::<String>())
}

fn is_public(method: Node, src: &[u8]) -> bool {
    let mut cursor = method.walk();
    method
        .children(&mut cursor)
        .any(|c| c.kind() == "modifier" && text(c, src) == Some("public"))
}

fn class_outline(class: Node, src: &[u8], namespace: &[String]) -> Option<ClassOutline> {
    let name = field_text(class, "name", src)?;
    let mut public_methods = Vec::new();
    if let Some(body) = class.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() == "method_declaration"
                && is_public(member, src)
                && let Some(method) = field_text(member, "name", src)
            {
                public_methods.push(method);
            }
        }
    }
    Some(ClassOutline {
        namespace: (!namespace.is_empty()).then(|| namespace.join(".")),
        name,
        public_methods,
    })
}

/// Declaration containers whose members may be classes. Member bodies are never entered.
fn body_of(node: Node) -> Option<Node> {
    match node.kind() {
        "namespace_declaration" | "class_declaration" | "struct_declaration"
        | "record_declaration" | "interface_declaration" => node.child_by_field_name("body"),
        _ => None,
    }
}

/// Work for one container: its members in source order, each with its namespace.
fn members<'t>(
    container: Node<'t>,
    src: &[u8],
    namespace: &[String],
) -> Vec<(Node<'t>, Vec<String>)> {
    // A file-scoped namespace applies to the siblings that follow it.
    let mut scoped = namespace.to_vec();
    let mut out = Vec::new();
    let mut cursor = container.walk();
    for child in container.named_children(&mut cursor) {
        match child.kind() {
            "namespace_declaration" => {
                let mut inner = scoped.clone();
                inner.extend(field_text(child, "name", src));
                out.push((child, inner));
            }
            "file_scoped_namespace_declaration" => {
                scoped.extend(field_text(child, "name", src));
                out.push((child, scoped.clone()));
            }
            "class_declaration" | "struct_declaration" | "record_declaration"
            | "interface_declaration" | "declaration_list" => {
                out.push((child, scoped.clone()));
            }
            _ => {}
        }
    }
    out
}

/// Iterative pre-order walk over declaration containers, so nesting depth never
/// grows the thread stack.
fn collect(root: Node, src: &[u8]) -> Vec<ClassOutline> {
    let mut out = Vec::new();
    let mut stack: Vec<(Node, Vec<String>)> = vec![(root, Vec::new())];
    while let Some((node, namespace)) = stack.pop() {
        if node.kind() == "class_declaration" {
            out.extend(class_outline(node, src, &namespace));
        }
        let container = match node.kind() {
            "compilation_unit" | "declaration_list" | "file_scoped_namespace_declaration" => {
                Some(node)
            }
            _ => body_of(node),
        };
        if let Some(container) = container {
            stack.extend(members(container, src, &namespace).into_iter().rev());
        }
    }
    out
}

/// All classes in `source`, including nested ones, in source order.
/// Any syntax error makes the whole document malformed.
pub fn outline_classes(source: &str) -> Result<Vec<ClassOutline>, TransformError> {
    let tree = parse(source)?;
    let root = tree.root_node();
    if let Some(line) = first_error_line(root) {
        return Err(TransformError::Malformed { line });
    }
    Ok(collect(root, source.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOWFISH: &str = r#"
using System;

namespace Crypto
{
    public class Blowfish
    {
        public Blowfish(byte[] key) { }

        public void Encipher(uint a) { }
        public void Encipher(uint a, uint b) { }
        public byte[] Decipher(byte[] data) { return data; }
        private void Rotate() { }
        static public int Round(int x) { return x; }
    }
}
"#;

    #[test]
    fn finds_public_methods_in_order() {
        let classes = outline_classes(BLOWFISH).unwrap();
        assert_eq!(
            classes,
            vec![ClassOutline {
                namespace: Some("Crypto".into()),
                name: "Blowfish".into(),
                public_methods: vec![
                    "Encipher".into(),
                    "Encipher".into(),
                    "Decipher".into(),
                    "Round".into()
                ],
            }]
        );
    }

    #[test]
    fn nested_namespaces_and_classes() {
        let src = r#"
namespace Outer
{
    namespace Inner
    {
        public class A
        {
            public void Run() { }
            public class B
            {
                public void Stop() { }
            }
        }
    }
}

class Global
{
    public void Go() { }
}
"#;
        let classes = outline_classes(src).unwrap();
        let summary: Vec<_> = classes
            .iter()
            .map(|c| (c.namespace.as_deref(), c.name.as_str(), c.public_methods.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some("Outer.Inner"), "A", vec!["Run".to_string()]),
                (Some("Outer.Inner"), "B", vec!["Stop".to_string()]),
                (None, "Global", vec!["Go".to_string()]),
            ]
        );
    }

    #[test]
    fn file_scoped_namespace() {
        let src = "namespace Shapes.Flat;\n\n\
                   public class Square\n{\n    public double Area() { return 1.0; }\n}\n";
        let classes = outline_classes(src).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].namespace.as_deref(), Some("Shapes.Flat"));
        assert_eq!(classes[0].public_methods, vec!["Area".to_string()]);
    }

    #[test]
    fn no_classes_is_not_an_error() {
        assert!(outline_classes("using System;\n").unwrap().is_empty());
        assert!(outline_classes("").unwrap().is_empty());
    }

    #[test]
    fn deep_method_bodies_are_not_walked() {
        let depth = 100_000;
        let src = format!(
            "public class Deep {{ public void M() {{ int x = {}1{}; }} }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        // Same stack size as a stage worker.
        let classes = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || outline_classes(&src))
            .unwrap()
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].public_methods, vec!["M".to_string()]);
    }

    #[test]
    fn syntax_errors_are_malformed() {
        let err = outline_classes("namespace A {\n public class {\n void (\n").unwrap_err();
        assert!(matches!(err, TransformError::Malformed { .. }));
    }
}

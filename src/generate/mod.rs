//! MSTest stub generation: one `<Class>Tests.cs` skeleton per class in a C# document.

pub mod csharp;
pub mod names;
pub mod render;

pub use csharp::{ClassOutline, outline_classes};
pub use names::{NameDisambiguator, disambiguate};

use crate::error::TransformError;
use crate::pipeline::Transform;
use crate::types::GeneratedFile;

use render::{TEST_CLASS_SUFFIX, TestClassPlan, render_test_class};

/// Generated artifacts for one document, in class order.
///
/// Class names are unique per document and method names per class, so the
/// output never has colliding file names or colliding test methods.
pub fn generate_stubs(source: &str) -> Result<Vec<GeneratedFile>, TransformError> {
    let classes = outline_classes(source)?;
    let mut class_names = NameDisambiguator::new();
    let files = classes
        .iter()
        .map(|class| {
            let test_class = format!("{}{TEST_CLASS_SUFFIX}", class_names.assign(&class.name));
            let methods = disambiguate(&class.public_methods);
            let body = render_test_class(&TestClassPlan {
                namespace: class.namespace.as_deref(),
                class_name: &test_class,
                methods: &methods,
            });
            GeneratedFile::new(format!("{test_class}.cs"), body)
        })
        .collect();
    Ok(files)
}

/// [`Transform`] backed by [`generate_stubs`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StubGenerator;

impl Transform for StubGenerator {
    fn transform(&self, source: &str) -> Result<Vec<GeneratedFile>, TransformError> {
        generate_stubs(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_methods_are_suffixed_in_order() {
        let src = r#"
namespace Demo
{
    public class Widget
    {
        public void Foo() { }
        public void Foo(int x) { }
        public void Bar() { }
    }
}
"#;
        let files = generate_stubs(src).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "WidgetTests.cs");
        let body = &files[0].body;
        let foo = body.find("void Foo()").unwrap();
        let foo1 = body.find("void Foo1()").unwrap();
        let bar = body.find("void Bar()").unwrap();
        assert!(foo < foo1 && foo1 < bar);
        assert!(body.contains("namespace Demo.Test"));
    }

    #[test]
    fn same_class_name_twice_gets_distinct_files() {
        let src = "namespace A { public class Box { public void Open() { } } }\n\
                   namespace B { public class Box { public void Open() { } } }\n";
        let names: Vec<_> = generate_stubs(src)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["BoxTests.cs", "Box1Tests.cs"]);
    }

    #[test]
    fn methods_restart_per_class() {
        let src = "public class A { public void Run() { } }\n\
                   public class B { public void Run() { } }\n";
        let files = generate_stubs(src).unwrap();
        assert!(files.iter().all(|f| f.body.contains("void Run()")));
        assert!(files.iter().all(|f| !f.body.contains("Run1")));
    }

    #[test]
    fn output_is_deterministic() {
        let src = "namespace N { public class C { public int Get() { return 1; } } }";
        assert_eq!(generate_stubs(src).unwrap(), generate_stubs(src).unwrap());
        assert!(StubGenerator.transform("using System;").unwrap().is_empty());
    }
}

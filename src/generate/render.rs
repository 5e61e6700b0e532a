//! MSTest skeleton rendering. Output is deterministic: 4-space indent, `\n` line endings.

pub const USING_DIRECTIVE: &str = "using Microsoft.VisualStudio.TestTools.UnitTesting;";
pub const TEST_NAMESPACE_SUFFIX: &str = "Test";
pub const TEST_CLASS_SUFFIX: &str = "Tests";
pub const FAIL_STATEMENT: &str = "Assert.Fail(\"autogenerated\");";

/// What to render for one source class. Method names must already be unique.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestClassPlan<'a> {
    pub namespace: Option<&'a str>,
    /// Test class name (already suffixed).
    pub class_name: &'a str,
    pub methods: &'a [String],
}

pub fn test_namespace(source_namespace: Option<&str>) -> String {
    match source_namespace {
        Some(ns) => format!("{ns}.{TEST_NAMESPACE_SUFFIX}"),
        None => TEST_NAMESPACE_SUFFIX.to_string(),
    }
}

pub fn render_test_class(plan: &TestClassPlan<'_>) -> String {
    let methods: Vec<String> = plan
        .methods
        .iter()
        .map(|method| {
            format!(
                "        [TestMethod]\n        public void {method}()\n        {{\n            \
                 {FAIL_STATEMENT}\n        }}\n"
            )
        })
        .collect();
    format!(
        "{USING_DIRECTIVE}\n\nnamespace {}\n{{\n    [TestClass]\n    public class {}\n    {{\n\
         {}    }}\n}}\n",
        test_namespace(plan.namespace),
        plan.class_name,
        methods.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_exact_layout() {
        let methods = vec!["Foo".to_string(), "Foo1".to_string()];
        let text = render_test_class(&TestClassPlan {
            namespace: Some("Demo"),
            class_name: "WidgetTests",
            methods: &methods,
        });
        let expected = "\
using Microsoft.VisualStudio.TestTools.UnitTesting;

namespace Demo.Test
{
    [TestClass]
    public class WidgetTests
    {
        [TestMethod]
        public void Foo()
        {
            Assert.Fail(\"autogenerated\");
        }

        [TestMethod]
        public void Foo1()
        {
            Assert.Fail(\"autogenerated\");
        }
    }
}
";
        assert_eq!(text, expected);
    }

    #[test]
    fn global_namespace_and_no_methods() {
        let text = render_test_class(&TestClassPlan {
            namespace: None,
            class_name: "EmptyTests",
            methods: &[],
        });
        assert!(text.contains("namespace Test\n{"));
        assert!(text.contains("public class EmptyTests\n    {\n    }\n}"));
        assert!(!text.contains("[TestMethod]"));
    }
}

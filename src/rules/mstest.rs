//! MSTest to xUnit tables.

use super::{
    ArgumentTransform, AssertTarget, AttributeRole, AttributeRules, ExceptionRules, ImportRules, RuleEntry,
    RuleSet, RuleTable,
};
use crate::resolve::TypeCatalog;
use std::sync::Arc;

pub const MSTEST_NAMESPACE: &str = "Microsoft.VisualStudio.TestTools.UnitTesting";
pub const XUNIT_NAMESPACE: &str = "Xunit";

/// Framework namespaces used by MSTest builds for other platforms
const ALTERNATE_NAMESPACES: &[&str] = &[
    "Microsoft.VisualStudio.TestPlatform.UnitTestFramework",
    "Microsoft.Bcl.Testing",
];

/// Default `Skip` reason for ignored tests
pub const SKIP_REASON: &str = "Ignored in MSTest";

/// Assertions that take a trailing message, with their arity without it.
const MESSAGE_ASSERTIONS: &[(&str, usize)] = &[
    ("AreEqual", 2),
    ("AreNotEqual", 2),
    ("AreSame", 2),
    ("AreNotSame", 2),
    ("IsTrue", 1),
    ("IsFalse", 1),
    ("IsNull", 1),
    ("IsNotNull", 1),
    ("IsInstanceOfType", 2),
    ("IsNotInstanceOfType", 2),
];

const TYPE_CHECKS: &[(&str, &str)] = &[
    ("IsInstanceOfType", "IsType"),
    ("IsNotInstanceOfType", "IsNotType"),
];

const RENAMES: &[(&str, usize, &str)] = &[
    ("AreEqual", 2, "Equal"),
    ("AreNotEqual", 2, "NotEqual"),
    ("AreSame", 2, "Same"),
    ("AreNotSame", 2, "NotSame"),
    ("IsTrue", 1, "True"),
    ("IsFalse", 1, "False"),
    ("IsNull", 1, "Null"),
    ("IsNotNull", 1, "NotNull"),
    ("IsInstanceOfType", 2, "IsAssignableFrom"),
];

const ATTRIBUTES: &[(&str, AttributeRole)] = &[
    ("TestClassAttribute", AttributeRole::TestClass),
    ("TestMethodAttribute", AttributeRole::TestMethod),
    ("IgnoreAttribute", AttributeRole::Skip),
    ("ExpectedExceptionAttribute", AttributeRole::ExpectedException),
];

/// MSTest types that exist but have no rule; binding them keeps same-named
/// user code from being mistaken for something else.
const OTHER_MSTEST_TYPES: &[&str] = &[
    "CollectionAssert",
    "StringAssert",
    "TestContext",
    "TestInitializeAttribute",
    "TestCleanupAttribute",
    "ClassInitializeAttribute",
    "ClassCleanupAttribute",
    "TestCategoryAttribute",
    "DescriptionAttribute",
    "DataRowAttribute",
    "DataTestMethodAttribute",
];

const XUNIT_TYPES: &[&str] = &["Assert", "FactAttribute", "TheoryAttribute", "InlineDataAttribute"];

impl RuleSet {
    /// The built-in MSTest to xUnit rules.
    pub fn mstest_to_xunit() -> Self {
        Self::mstest_with(SKIP_REASON, XUNIT_NAMESPACE, &[])
    }

    /// MSTest rules with a custom skip reason, target namespace and extra
    /// framework namespaces recognized in conditional imports.
    pub fn mstest_with(skip_reason: &str, target: &str, extra_alternates: &[String]) -> Self {
        let assert = format!("{MSTEST_NAMESPACE}.Assert");

        let assertions = MESSAGE_ASSERTIONS.iter().map(|&(member, arity)| {
            let mut entry = RuleEntry::arity(arity);
            if let Some((_, reshaped)) = TYPE_CHECKS.iter().find(|(m, _)| *m == member) {
                entry = entry
                    .renamed(reshaped)
                    .with_transform(ArgumentTransform::TypeArgument { index: 1 });
            }
            (format!("{assert}.{member}"), entry)
        });

        let renames = RENAMES.iter().map(|&(member, arity, renamed)| {
            let mut entry = RuleEntry::arity(arity).renamed(renamed);
            if member == "IsInstanceOfType" {
                entry = entry.with_transform(ArgumentTransform::Swap);
            }
            (format!("{assert}.{member}"), entry)
        });

        let roles = ATTRIBUTES
            .iter()
            .map(|&(name, role)| (format!("{MSTEST_NAMESPACE}.{name}"), role));

        let mut catalog = TypeCatalog::new(
            std::iter::once("Assert")
                .chain(ATTRIBUTES.iter().map(|(name, _)| *name))
                .chain(OTHER_MSTEST_TYPES.iter().copied())
                .map(|name| format!("{MSTEST_NAMESPACE}.{name}")),
        );
        for name in XUNIT_TYPES {
            catalog.insert(format!("{target}.{name}"));
        }

        let mut alternates: Vec<String> = ALTERNATE_NAMESPACES.iter().map(|s| s.to_string()).collect();
        alternates.extend(extra_alternates.iter().cloned());

        Self {
            assertions: Arc::new(RuleTable::new(assertions)),
            renames: Arc::new(RuleTable::new(renames)),
            assert_target: Arc::new(AssertTarget {
                name: "Assert".to_string(),
                qualified: format!("{target}.Assert"),
            }),
            attributes: Arc::new(AttributeRules {
                roles: RuleTable::new(roles),
                target_marker: format!("{target}.FactAttribute"),
                marker_name: "Fact".to_string(),
                skip_argument: "Skip".to_string(),
                skip_reason: skip_reason.to_string(),
            }),
            exceptions: Arc::new(ExceptionRules {
                assert_type: "Assert".to_string(),
                throws: "Throws".to_string(),
                throws_any: "ThrowsAny".to_string(),
                throws_async: "ThrowsAsync".to_string(),
                throws_any_async: "ThrowsAnyAsync".to_string(),
                allow_derived: "AllowDerivedTypes".to_string(),
            }),
            imports: Arc::new(ImportRules {
                sources: vec![MSTEST_NAMESPACE.to_string()],
                alternates,
                target: target.to_string(),
            }),
            catalog: Arc::new(catalog),
        }
    }
}

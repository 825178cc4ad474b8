//! The shipped rule file

use std::path::Path;

use jarvault::java::JavaResolver;
use jarvault::models::Category;
use rstest::rstest;

fn shipped() -> JavaResolver {
    let resolver = JavaResolver::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("java.json"));
    assert!(!resolver.is_fallback());
    resolver
}

#[rstest]
#[case("1.21.4", Category::Paper, 21)]
#[case("1.20.4", Category::Purpur, 17)]
#[case("1.17.1", Category::Vanilla, 16)]
#[case("1.12.2", Category::Vanilla, 8)]
#[case("b1.7.3", Category::Vanilla, 8)]
#[case("24w33a", Category::Vanilla, 21)]
#[case("3.4.0-SNAPSHOT", Category::Velocity, 21)]
#[case("1.21", Category::Waterfall, 17)]
fn shipped_rules(#[case] version: &str, #[case] category: Category, #[case] expected: u32) {
    assert_eq!(shipped().resolve(version, category), expected);
}

//! Snapshot tests
//!
//! Loads each *.hcl file in /tests/expand/ individually, registers it with an expander and
//! compares the listed instances.

use terrace::instances::{config_tree::ConfigTree, Expander};

fn render(tree: &ConfigTree) -> String {
    let expander = Expander::new();
    let diags = tree.register(&expander);
    let instances = tree.instances(&expander);

    let mut rendered = String::from("modules:\n");
    for module in &instances.modules {
        if module.is_root() {
            rendered.push_str("  (root)\n");
        } else {
            rendered.push_str(&format!("  {module}\n"));
        }
    }
    rendered.push_str("resources:\n");
    for resource in &instances.resources {
        rendered.push_str(&format!("  {resource}\n"));
    }
    if !diags.is_empty() {
        rendered.push_str("diagnostics:\n");
        for diag in &diags {
            rendered.push_str(&format!("  {diag}\n"));
        }
    }
    rendered
}

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TERRACE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    insta::glob!("expand/*.hcl", |path| {
        let tree = ConfigTree::load_file(path).expect("must be a valid config tree");
        insta::assert_snapshot!(render(&tree));
    });
}

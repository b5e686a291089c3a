mod common;

use common::{Counter, Hub, Inc};
use grantspider_graph::{GraphBuilder, NodeKind};

#[test]
fn program_lists_nodes_and_edges() {
    let graph = GraphBuilder::<Counter>::new()
        .add_router("hub", Hub { worker: "inc", limit: 1 })
        .add_node("inc", Inc("inc"))
        .add_edge("inc", "hub")
        .set_entry("hub")
        .build()
        .expect("build");

    let program = graph.program();
    assert_eq!(program.node_names(), vec!["__start__", "hub", "inc", "__end__"]);
    assert_eq!(program.node_kind("hub"), Some(NodeKind::Router));
    assert_eq!(
        program.edge_names(),
        vec![
            ("__start__".to_string(), "hub".to_string()),
            ("hub".to_string(), "inc".to_string()),
            ("hub".to_string(), "__end__".to_string()),
            ("inc".to_string(), "hub".to_string()),
        ]
    );
}

#[test]
fn mermaid_marks_routers_and_conditional_edges() {
    let graph = GraphBuilder::<Counter>::new()
        .add_router("hub", Hub { worker: "inc", limit: 1 })
        .add_node("inc", Inc("inc"))
        .add_edge("inc", "hub")
        .set_entry("hub")
        .build()
        .expect("build");

    let mermaid = graph.program().to_mermaid();
    assert!(mermaid.starts_with("graph TD\n"));
    assert!(mermaid.contains("    hub{hub}\n"));
    assert!(mermaid.contains("    inc[inc]\n"));
    assert!(mermaid.contains("    __start__ --> hub\n"));
    assert!(mermaid.contains("    hub -.-> inc\n"));
    assert!(mermaid.contains("    inc --> hub\n"));
}

use page_dom::{Document, MutationRecord};
use tokio::sync::broadcast::error::TryRecvError;

#[tokio::test]
async fn connected_child_list_changes_are_published() {
    let doc = Document::new();
    let mut rx = doc.subscribe();

    // Building a detached subtree is silent.
    let panel = doc.create_element("div");
    let label = doc.create_element("span");
    doc.append_child(panel, label).unwrap();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    doc.append_child(doc.body(), panel).unwrap();
    let record = rx.recv().await.unwrap();
    assert_eq!(
        record,
        MutationRecord {
            target: doc.body(),
            added: vec![panel],
            removed: Vec::new(),
        }
    );

    doc.remove(panel).unwrap();
    let record = rx.recv().await.unwrap();
    assert_eq!(record.removed, vec![panel]);
    assert!(!doc.is_connected(label));
}

#[tokio::test]
async fn attribute_changes_are_not_published() {
    let doc = Document::new();
    let node = doc.append_element(doc.body(), "div", &[]).unwrap();
    let mut rx = doc.subscribe();

    doc.set_attribute(node, "data-x", "1").unwrap();
    doc.set_style(node, "cursor", "pointer").unwrap();
    doc.mark_once(node, "data-y", "true").unwrap();

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn moving_a_node_reports_both_sides() {
    let doc = Document::new();
    let left = doc.append_element(doc.body(), "div", &[]).unwrap();
    let right = doc.append_element(doc.body(), "div", &[]).unwrap();
    let item = doc.append_element(left, "span", &[]).unwrap();
    let mut rx = doc.subscribe();

    doc.append_child(right, item).unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.target, left);
    assert_eq!(first.removed, vec![item]);
    assert_eq!(second.target, right);
    assert_eq!(second.added, vec![item]);
}

#[tokio::test]
async fn replace_children_is_a_single_record() {
    let doc = Document::new();
    let content = doc.append_element(doc.body(), "div", &[]).unwrap();
    let old = doc.append_element(content, "p", &[]).unwrap();
    let mut rx = doc.subscribe();

    let fresh = doc.create_element("table");
    doc.replace_children(content, &[fresh]).unwrap();

    let record = rx.recv().await.unwrap();
    assert_eq!(record.added, vec![fresh]);
    assert_eq!(record.removed, vec![old]);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(doc.children(content), vec![fresh]);
}

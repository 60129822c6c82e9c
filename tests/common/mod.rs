//! Shared test helpers compiled into every integration-test binary.
//! Items may not all be used in every binary, so dead_code is suppressed.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tabletest::{reflect_record, Comparator, Record, Shared, Value};

/// Tolerance used by the default comparator.
pub const EPSILON: f64 = tabletest::DEFAULT_EPSILON;

pub fn assert_equal(actual: &Value, expected: &Value, label: &str) {
    if let Err(mismatch) = Comparator::default().compare(actual, expected) {
        panic!("{label}: expected equal, got `{mismatch}`\n  actual:   {actual}\n  expected: {expected}");
    }
}

/// Asserts the values differ and returns the diagnostic.
pub fn assert_unequal(actual: &Value, expected: &Value, label: &str) -> String {
    match Comparator::default().compare(actual, expected) {
        Ok(()) => panic!("{label}: expected a mismatch\n  actual:   {actual}\n  expected: {expected}"),
        Err(mismatch) => mismatch.to_string(),
    }
}

fn node(label: f64, next: Value) -> Value {
    Record::new("Node")
        .field("label", Value::Float(label))
        .field("next", next)
        .into()
}

/// A two-node ring built directly as values: `a -> b -> a`, returned as a
/// pointer to `a`.
pub fn ring(label_a: f64, label_b: f64) -> Value {
    let a: Shared = Rc::new(RefCell::new(Value::UNIT));
    let b: Shared = Rc::new(RefCell::new(Value::UNIT));
    *a.borrow_mut() = node(label_a, Value::pointer_to(&b));
    *b.borrow_mut() = node(label_b, Value::pointer_to(&a));
    Value::pointer_to(&a)
}

/// A node that points at itself.
pub fn self_loop(label: f64) -> Value {
    let slot: Shared = Rc::new(RefCell::new(Value::UNIT));
    *slot.borrow_mut() = node(label, Value::pointer_to(&slot));
    Value::pointer_to(&slot)
}

/// A tree node whose children may point back at ancestors.
#[derive(Debug)]
pub struct Tree {
    pub label: f64,
    pub children: Vec<Rc<RefCell<Tree>>>,
}

reflect_record!(@reflect Tree { label, children });

/// `root -> child -> root`, with the child labelled `child_label`.
pub fn looped_tree(root_label: f64, child_label: f64) -> Rc<RefCell<Tree>> {
    let root = Rc::new(RefCell::new(Tree {
        label: root_label,
        children: Vec::new(),
    }));
    let child = Rc::new(RefCell::new(Tree {
        label: child_label,
        children: vec![Rc::clone(&root)],
    }));
    root.borrow_mut().children.push(child);
    root
}

/// A node whose two children are the same allocation.
#[derive(Debug)]
pub struct Dag {
    pub label: f64,
    pub left: Option<Rc<Dag>>,
    pub right: Option<Rc<Dag>>,
}
reflect_record!(@reflect Dag { label, left, right });

/// `depth` levels of nodes, each pointing twice at the level below: linear
/// in size, but with `2^depth` paths from the root.
pub fn dag(depth: usize, leaf_label: f64) -> Rc<Dag> {
    let mut node = Rc::new(Dag {
        label: leaf_label,
        left: None,
        right: None,
    });
    for level in 1..=depth {
        node = Rc::new(Dag {
            label: level as f64,
            left: Some(Rc::clone(&node)),
            right: Some(node),
        });
    }
    node
}

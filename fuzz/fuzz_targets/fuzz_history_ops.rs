#![no_main]

use arbitrary::Arbitrary;
use arbor_core::{Document, NodeData, NodeId};
use arbor_runtime::config::HistoryConfig;
use arbor_runtime::undo::{StepOutcome, UndoHistory};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Append { parent: u8, name: u8 },
    Remove { node: u8 },
    Rename { node: u8, name: u8 },
    SetProperty { node: u8, value: u8 },
    Toggle { node: u8 },
    Undo,
    Redo,
    Navigate(i8),
    Record,
    Pause,
    Resume,
    ClearHistory,
    ClearDocument,
}

#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u8,
    ops: Vec<Op>,
}

/// Live node picked by index in pre-order; index 0 is the root.
fn pick(doc: &Document, index: u8) -> NodeId {
    let mut order = vec![doc.root()];
    let mut cursor = 0;
    while cursor < order.len() {
        let children = doc.children(order[cursor]);
        order.extend(children);
        cursor += 1;
    }
    order[usize::from(index) % order.len()]
}

fuzz_target!(|input: Input| {
    // Bounded so eviction is exercised.
    let capacity = usize::from(input.capacity % 12);
    let doc = Document::new();
    let history = UndoHistory::new(doc.clone(), HistoryConfig::with_capacity(capacity));

    for op in input.ops.into_iter().take(256) {
        let before = history.len();
        match op {
            Op::Append { parent, name } => {
                let parent = pick(&doc, parent);
                let _ = doc.append_child(parent, NodeData::new(format!("n{name}"), "Node"));
            }
            Op::Remove { node } => {
                let _ = doc.remove(pick(&doc, node));
            }
            Op::Rename { node, name } => {
                let _ = doc.rename(pick(&doc, node), format!("r{name}"));
            }
            Op::SetProperty { node, value } => {
                let _ = doc.set_property(pick(&doc, node), "value", value.to_string());
            }
            Op::Toggle { node } => {
                let id = pick(&doc, node);
                let enabled = doc.node(id).is_some_and(|data| data.is_enabled());
                let _ = doc.set_enabled(id, !enabled);
            }
            Op::Undo | Op::Redo | Op::Navigate(_) => {
                let offset = match op {
                    Op::Undo => -1,
                    Op::Redo => 1,
                    Op::Navigate(offset) => isize::from(offset % 4),
                    _ => 0,
                };
                let position = history.position();
                let expected = {
                    let current = position.map_or(-1, |p| p as isize);
                    let target = current + offset;
                    (target >= 0 && (target as usize) < before).then_some(target as usize)
                };
                let outcome = history.navigate(offset);
                assert_eq!(history.len(), before, "replay must not record");
                match outcome {
                    StepOutcome::Applied { position: p, .. } => {
                        assert_eq!(Some(p), expected);
                        let entry = history.current().expect("cursor on an entry");
                        let live = doc.snapshot().expect("live document clones");
                        assert_eq!(&live, entry.snapshot(), "replay must be exact");
                    }
                    StepOutcome::Refused => assert_eq!(history.position(), position),
                    StepOutcome::ReplayFailed { error } => {
                        panic!("stored snapshot failed to replay: {error}")
                    }
                }
            }
            Op::Record => {
                history.record("Manual");
            }
            Op::Pause => history.pause_recording(),
            Op::Resume => history.resume_recording(),
            Op::ClearHistory => history.clear(),
            Op::ClearDocument => doc.clear(),
        }

        assert!(history.len() <= capacity);
        match history.position() {
            Some(p) => assert!(p < history.len()),
            None => assert!(history.is_empty()),
        }
        assert!(history.is_attached());
    }
});

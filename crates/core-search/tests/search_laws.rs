use core_search::{Direction, EngineOptions, SearchEngine, WrapState, case_replace};
use core_state::{Document, Selection};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(char),
    Backspace,
    Repeat,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::sample::select(vec!['a', 'b', 'A', ' ']).prop_map(Op::Add),
        2 => Just(Op::Backspace),
        1 => Just(Op::Repeat),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Observed {
    text: String,
    search_offset: usize,
    found: bool,
    failing: bool,
    wrap: WrapState,
    selection: Selection,
    caret: usize,
}

fn observe(e: &SearchEngine, d: &Document) -> Observed {
    Observed {
        text: e.text().to_string(),
        search_offset: e.search_offset(),
        found: e.is_found(),
        failing: e.is_failing(),
        wrap: e.wrap_state(),
        selection: d.selection(),
        caret: d.caret(),
    }
}

fn run(content: &str, start: usize, ops: &[Op]) -> Vec<Observed> {
    let mut d = Document::from_str("t", content).unwrap();
    d.set_caret(start);
    let mut e = SearchEngine::new(EngineOptions::default(), Direction::Forward, false, d.caret());
    let mut trace = vec![observe(&e, &d)];
    for op in ops {
        match op {
            Op::Add(c) => {
                e.add_character(&mut d, *c).unwrap();
            }
            Op::Backspace => {
                e.backspace(&mut d);
            }
            Op::Repeat => {
                e.repeat(&mut d).unwrap();
            }
        }
        trace.push(observe(&e, &d));
    }
    trace
}

proptest! {
    #[test]
    fn backspace_inverts_the_previous_key(
        content in "[ab A]{0,16}",
        start in 0usize..16,
        ops in prop::collection::vec(op(), 0..24),
    ) {
        let mut d = Document::from_str("t", &content).unwrap();
        d.set_caret(start);
        let mut e = SearchEngine::new(EngineOptions::default(), Direction::Forward, false, d.caret());
        let mut model: Vec<Observed> = Vec::new();
        for op in &ops {
            match op {
                Op::Add(c) => {
                    model.push(observe(&e, &d));
                    e.add_character(&mut d, *c).unwrap();
                }
                Op::Repeat => {
                    model.push(observe(&e, &d));
                    e.repeat(&mut d).unwrap();
                }
                Op::Backspace => match model.pop() {
                    Some(expected) => {
                        prop_assert!(e.backspace(&mut d));
                        prop_assert_eq!(observe(&e, &d), expected);
                    }
                    None => {
                        let before = observe(&e, &d);
                        prop_assert!(!e.backspace(&mut d));
                        prop_assert_eq!(observe(&e, &d), before);
                    }
                },
            }
        }
    }

    #[test]
    fn replaying_keys_is_deterministic(
        content in "[ab A]{0,16}",
        start in 0usize..16,
        ops in prop::collection::vec(op(), 0..24),
    ) {
        prop_assert_eq!(run(&content, start, &ops), run(&content, start, &ops));
    }

    #[test]
    fn case_replace_follows_the_match_shape(m in "[a-zA-Z]{1,8}", r in "[a-z]{1,8}") {
        let uppercase = m.chars().filter(|c| c.is_ascii_uppercase()).count();
        let first_upper = m.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        let expected = if uppercase == m.len() {
            r.to_uppercase()
        } else if first_upper && uppercase == 1 {
            let mut chars = r.chars();
            match chars.next() {
                Some(f) => f.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        } else {
            r.clone()
        };
        prop_assert_eq!(case_replace(&m, &r), expected);
    }
}

//! Trace synthesis over parsed source text.

use stepwise::application::synthesize_trace;
use stepwise::domain::input_feed::{InputFeed, INPUT_MISSING};
use stepwise::domain::trace::{Step, StepKind, TraceLimits, TraceSynthesizer};
use stepwise::domain::value::{Value, MAX_RENDER_LEN};
use stepwise::infrastructure::parser::parse_module;
use stepwise::infrastructure::ScriptParser;

fn step(kind: StepKind, content: &str) -> Step {
    Step::new(kind, content)
}

fn inputs(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_assignment_then_print() {
    let trace = stepwise::synthesize_trace("x = 3 + 4\nprint(x)\n", &[]);
    assert_eq!(
        trace,
        vec![step(StepKind::Assign, "x = 7"), step(StepKind::Print, "7")]
    );
    assert_eq!(stepwise::estimate_complexity("x = 3 + 4\nprint(x)\n").to_string(), "O(1)");
}

#[test]
fn test_index_loop_prints_counter_after_body() {
    let source = "for i in [1, 2, 3]:\n    print(i)\n";
    let trace = stepwise::synthesize_trace(source, &[]);

    let mut expected = vec![step(StepKind::For, "for i in [1, 2, 3]:")];
    for v in ["1", "2", "3"] {
        expected.push(step(StepKind::Assign, &format!("i = {}", v)));
        expected.push(step(StepKind::Print, v));
        expected.push(step(StepKind::Print, &format!("Print i: {}", v)));
    }
    assert_eq!(trace, expected);
    assert_eq!(stepwise::estimate_complexity(source).to_string(), "O(n)");
}

#[test]
fn test_other_loop_names_get_no_counter_step() {
    let trace = stepwise::synthesize_trace("for k in ['a']:\n    pass\n", &[]);
    assert_eq!(
        trace,
        vec![step(StepKind::For, "for k in ['a']:"), step(StepKind::Assign, "k = a")]
    );
}

#[test]
fn test_input_is_consumed_in_order() {
    let module = parse_module("x = input()\n").unwrap();
    let lines = inputs(&["5"]);
    let mut synthesizer = TraceSynthesizer::new(&lines, TraceLimits::default());
    synthesizer.visit_module(&module);

    assert_eq!(synthesizer.steps(), &[step(StepKind::Assign, "x = '5'")]);
    assert!(synthesizer.feed().is_exhausted());
    assert_eq!(synthesizer.environment().get("x"), Some(&Value::str("5")));
}

#[test]
fn test_int_input_and_missing_input() {
    let source = "a = int(input())\nb = int(input())\nc = input()\n";
    let trace = stepwise::synthesize_trace(source, &inputs(&[" 42 ", "abc"]));
    assert_eq!(
        trace,
        vec![
            step(StepKind::Assign, "a = 42"),
            step(StepKind::Assign, "b = error"),
            step(StepKind::Assign, &format!("c = '{}'", INPUT_MISSING)),
        ]
    );
}

#[test]
fn test_input_feed_exhaustion_is_idempotent() {
    let lines = inputs(&["only"]);
    let mut feed = InputFeed::new(&lines);
    assert_eq!(feed.next(), "only");
    for _ in 0..5 {
        assert_eq!(feed.next(), INPUT_MISSING);
    }
    assert_eq!(feed.consumed(), 1);
}

#[test]
fn test_unresolved_name_folds_to_text() {
    let trace = stepwise::synthesize_trace("y = z + 1\nprint(y)\n", &[]);
    assert_eq!(trace[0], step(StepKind::Assign, "y = (<unresolved z> + 1)"));
    assert_eq!(trace[1], step(StepKind::Print, "(<unresolved z> + 1)"));
}

#[test]
fn test_branches_record_condition_and_walk_body() {
    let source = "x = 2\nif x > 1:\n    y = x * 10\nelse:\n    y = 0\n";
    let trace = stepwise::synthesize_trace(source, &[]);
    assert_eq!(
        trace,
        vec![
            step(StepKind::Assign, "x = 2"),
            step(StepKind::If, "if <complex_expression>:"),
            step(StepKind::Assign, "y = 20"),
        ]
    );
}

#[test]
fn test_while_loop_is_capped() {
    let source = "n = 3\nwhile n > 0:\n    n -= 1\n";
    let limits = TraceLimits {
        max_while_iterations: 4,
        ..TraceLimits::default()
    };
    let trace = synthesize_trace(&ScriptParser, source, &[], limits);
    assert_eq!(trace[1], step(StepKind::While, "while <complex_expression>:"));
    let last = trace.last().unwrap();
    assert_eq!(last.kind, StepKind::Info);
    assert!(last.content.contains("after 4 iterations"));
}

#[test]
fn test_false_while_condition_skips_body() {
    let trace = stepwise::synthesize_trace("while False:\n    x = 1\n", &[]);
    assert_eq!(trace, vec![step(StepKind::While, "while False:")]);
}

#[test]
fn test_step_budget_truncates() {
    let source = "for i in [1, 2, 3, 4, 5, 6, 7, 8]:\n    x = i\n";
    let limits = TraceLimits {
        max_steps: 5,
        ..TraceLimits::default()
    };
    let trace = synthesize_trace(&ScriptParser, source, &[], limits);
    assert_eq!(trace.len(), 6);
    assert_eq!(trace[5], step(StepKind::Info, "trace truncated after 5 steps"));
}

#[test]
fn test_unparsable_source_yields_single_error_step() {
    for source in ["x = = 1", "for in range(3):\n    pass", "if True\n    pass", "s = 'open"] {
        let trace = stepwise::synthesize_trace(source, &[]);
        assert_eq!(trace.len(), 1, "source: {:?}", source);
        assert_eq!(trace[0].kind, StepKind::Error);
        assert!(trace[0].content.starts_with("Error generating trace: "));
    }
}

#[test]
fn test_calls_and_subscripts_render_as_placeholders() {
    let source = "xs = [10, 20]\na = xs[1]\nb = xs[5]\nn = len(xs)\n";
    let trace = stepwise::synthesize_trace(source, &[]);
    assert_eq!(trace[1], step(StepKind::Assign, "a = 20"));
    assert_eq!(trace[2], step(StepKind::Assign, "b = <index_error>"));
    assert_eq!(trace[3], step(StepKind::Assign, "n = len([10, 20])"));
}

#[test]
fn test_steps_serialize_with_type_tag() {
    let trace = stepwise::synthesize_trace("x = 1\n", &[]);
    let json = serde_json::to_string(&trace).unwrap();
    assert_eq!(json, r#"[{"type":"assign","content":"x = 1"}]"#);
}

#[test]
fn test_deeply_nested_parentheses_yield_error_step() {
    let source = format!("x = {}1{}\nprint(x)\n", "(".repeat(50_000), ")".repeat(50_000));
    let trace = stepwise::synthesize_trace(&source, &[]);
    assert_eq!(trace.len(), 1);
    assert_eq!(trace[0].kind, StepKind::Error);
    assert!(trace[0].content.contains("too many nested"), "{}", trace[0].content);
    assert_eq!(stepwise::estimate_complexity(&source).to_string(), "O(?)");
}

#[test]
fn test_nested_repetition_stays_bounded() {
    let bounded = |trace: &[Step]| trace.iter().all(|s| s.content.len() <= MAX_RENDER_LEN + 3);

    let trace = stepwise::synthesize_trace("s = 'a' * 1000000\nl = [s] * 1000\nprint(l)\n", &[]);
    assert_eq!(trace.len(), 3);
    assert!(bounded(&trace));
    assert!(trace[0].content.ends_with("..."));
    assert!(trace[1].content.starts_with("l = ("), "{}", trace[1].content);

    let trace = stepwise::synthesize_trace("a = [0] * 1000\nb = [a] * 2000\n", &[]);
    assert_eq!(trace.len(), 2);
    assert!(bounded(&trace));
    assert!(trace[1].content.starts_with("b = ([[0, 0"), "{}", trace[1].content);
    assert!(trace[1].content.ends_with(" * 2000)"));
}

#[test]
fn test_while_cap_inside_for_loop_shares_step_budget() {
    let source = "for k in [1, 2, 3]:\n    n = 1\n    while n > 0:\n        x = k\n";
    let limits = TraceLimits {
        max_while_iterations: 10,
        max_steps: 25,
    };
    let trace = synthesize_trace(&ScriptParser, source, &[], limits);
    assert_eq!(trace.len(), 26);
    assert_eq!(
        trace[14],
        step(StepKind::Info, "while loop stopped after 10 iterations (iteration cap reached)")
    );
    assert_eq!(trace[15], step(StepKind::Assign, "k = 2"));
    assert_eq!(trace[25], step(StepKind::Info, "trace truncated after 25 steps"));
    assert_eq!(trace.iter().filter(|s| s.kind == StepKind::Info).count(), 2);
}

#[test]
fn test_valid_programs_trace_without_error() {
    let corpus = [
        ("x: int = 5\nprint(x)\n", "O(1)"),
        (
            "try:\n    v = int('3')\nexcept ValueError:\n    v = 0\nfor i in [1, 2]:\n    print(i)\n",
            "O(n)",
        ),
        (
            "try:\n    for a in xs:\n        for b in xs:\n            pass\nexcept Exception as e:\n    pass\nfinally:\n    pass\n",
            "O(n^2)",
        ),
        (
            "class Counter:\n    total = 0\n    def bump(self):\n        for _ in range(3):\n            self.total += 1\n",
            "O(n)",
        ),
        ("with open('data.txt') as fh:\n    for line in fh:\n        print(line)\n", "O(n)"),
        (
            "count = 0\nassert count == 0, 'start'\ndel count\nglobal total\nif count:\n    raise ValueError('bad')\n",
            "O(1)",
        ),
        ("@staticmethod\ndef helper(x):\n    return x\n", "O(1)"),
        ("if (n := 3) > 2:\n    print(n)\n", "O(1)"),
        (
            "match cmd:\n    case 'go':\n        for s in steps:\n            pass\n    case _:\n        pass\n",
            "O(n)",
        ),
        ("msg = f'{1 + 1} items'\nprint(msg)  # done\n", "O(1)"),
    ];
    for (source, label) in corpus {
        let trace = stepwise::synthesize_trace(source, &[]);
        assert!(
            trace.iter().all(|s| s.kind != StepKind::Error),
            "source: {:?}, trace: {:?}",
            source,
            trace
        );
        assert_eq!(stepwise::estimate_complexity(source).to_string(), label, "source: {:?}", source);
    }
}

#[test]
fn test_annotated_assignment_and_guarded_bodies() {
    let trace = stepwise::synthesize_trace("x: int = 5\nprint(x)\n", &[]);
    assert_eq!(trace, vec![step(StepKind::Print, "<unresolved x>")]);

    let source = "try:\n    v = int('3')\nexcept ValueError:\n    v = 0\nelse:\n    w = v\nfinally:\n    print('done')\n";
    let trace = stepwise::synthesize_trace(source, &[]);
    assert_eq!(
        trace,
        vec![
            step(StepKind::Assign, "v = int(3)"),
            step(StepKind::Assign, "v = 0"),
            step(StepKind::Assign, "w = 0"),
            step(StepKind::Print, "done"),
        ]
    );

    let source = "class Config:\n    debug = False\nwith lock:\n    level = 2\n";
    let trace = stepwise::synthesize_trace(source, &[]);
    assert_eq!(
        trace,
        vec![step(StepKind::Assign, "debug = False"), step(StepKind::Assign, "level = 2")]
    );
}

//! End-to-end behavior of the instrumentation entry point, driven through
//! the interpreter the way user programs reach it.

use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::evaluator::Environment;
use crate::WeaveConfig;

/// Interpreter wired to a [`TraceLog`] plus a combined event/print stream
/// for ordering assertions.
struct Harness {
    interp: Interpreter,
    log: TraceLog,
    stream: Arc<Mutex<Vec<String>>>,
}

fn harness() -> Harness {
    let mut interp = Interpreter::new(WeaveConfig::default());
    let log = TraceLog::new();
    let stream: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let record = log.callback();
    let events = stream.clone();
    interp.set_trace_callback(Arc::new(move |event| {
        record(event);
        events.lock().push(format!("trace {}", event.callee));
    }));

    let prints = stream.clone();
    interp.set_output_callback(Arc::new(move |line| {
        prints.lock().push(format!("print {line}"));
    }));

    Harness {
        interp,
        log,
        stream,
    }
}

impl Harness {
    fn run(&mut self, source: &str) -> anyhow::Result<Value> {
        let program = parser::parse_program(source)?;
        self.interp.eval_program(&program)
    }

    fn stream(&self) -> Vec<String> {
        self.stream.lock().clone()
    }
}

#[test]
fn native_callee_degrades_to_a_direct_call() {
    let mut h = harness();
    let result = h.run("trace(len)(\"abc\")\n").unwrap();
    assert_eq!(result, Value::Integer(3));
    assert_eq!(h.log.callees(), vec!["len"]);
}

#[test]
fn wrapping_alone_emits_no_event() {
    let mut h = harness();
    h.run("fn leaf()\n  return 1\nendfn\nlet w = trace(leaf)\n")
        .unwrap();
    assert!(h.log.is_empty());
}

#[test]
fn leaf_function_emits_exactly_one_event() {
    let mut h = harness();
    let result = h
        .run("fn leaf()\n  return 5\nendfn\ntrace(leaf)()\n")
        .unwrap();
    assert_eq!(result, Value::Integer(5));
    assert_eq!(h.log.callees(), vec!["leaf"]);
}

#[test]
fn instrumentation_propagates_along_the_call_graph() {
    let mut h = harness();
    let code = r#"
fn baz()
  print("in baz")
endfn
fn bar()
  baz()
  print("in bar")
endfn
fn foo()
  bar()
  print("in foo")
endfn
trace(foo)()
"#;
    h.run(code).unwrap();
    assert_eq!(
        h.stream(),
        vec![
            "trace foo",
            "trace bar",
            "trace baz",
            "print in baz",
            "print in bar",
            "print in foo",
        ]
    );
}

#[test]
fn events_carry_sequence_and_depth() {
    let mut h = harness();
    let code = r#"
fn baz()
  return 1
endfn
fn bar()
  return baz()
endfn
fn foo()
  return bar()
endfn
trace(foo)()
"#;
    h.run(code).unwrap();
    let events = h.log.events();
    assert_eq!(
        events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        events.iter().map(|e| e.depth).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn keyword_arguments_survive_the_wrap() {
    let mut h = harness();
    let code = r#"
fn bar(x=0)
  return x
endfn
fn foo()
  return bar(x=5)
endfn
trace(foo)()
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(5));
    assert_eq!(h.log.callees(), vec!["foo", "bar"]);
}

#[test]
fn repeated_call_sites_are_instrumented_independently() {
    let mut h = harness();
    let code = r#"
fn bar()
  return 1
endfn
fn foo()
  return bar() + bar()
endfn
trace(foo)()
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(2));
    assert_eq!(h.log.callees(), vec!["foo", "bar", "bar"]);
}

#[test]
fn decorator_application_instruments_the_declaration() {
    let mut h = harness();
    let code = r#"
fn bar()
  return 2
endfn

@trace
fn foo()
  return bar()
endfn
foo()
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(2));
    assert_eq!(h.log.callees(), vec!["foo", "bar"]);
}

#[test]
fn linking_rebinds_the_declaration_name_to_the_rewritten_form() {
    let mut h = harness();
    let code = r#"
fn bar()
  return 2
endfn
fn foo()
  return bar()
endfn
trace(foo)()
"#;
    h.run(code).unwrap();
    let Some(Value::Function(linked)) = Environment::lookup(h.interp.globals(), "foo") else {
        panic!("expected foo to be rebound to a plain function");
    };
    let source = linked.source.as_deref().unwrap();
    assert!(source.contains("trace(bar)()"), "source was:\n{source}");
    assert!(!source.contains("@trace"));
}

#[test]
fn rewriting_an_already_rewritten_function_does_not_double_events() {
    let mut h = harness();
    let code = r#"
fn bar()
  return 2
endfn
fn foo()
  return bar()
endfn
trace(foo)()
trace(foo)()
"#;
    // The second wrap picks up the already-rewritten replacement; the pass
    // finds nothing new, so each invocation emits the same two events.
    h.run(code).unwrap();
    assert_eq!(h.log.callees(), vec!["foo", "bar", "foo", "bar"]);
}

#[test]
fn wrapping_a_wrapper_collapses() {
    let mut h = harness();
    let code = r#"
fn leaf()
  return 1
endfn
trace(trace(leaf))()
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(1));
    assert_eq!(h.log.callees(), vec!["leaf"]);
}

#[test]
fn traced_recursion_emits_one_event_per_invocation() {
    let mut h = harness();
    let code = r#"
fn fact(n)
  if n < 2
    return 1
  endif
  return n * fact(n - 1)
endfn
trace(fact)(4)
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(24));
    assert_eq!(h.log.callees(), vec!["fact"; 4]);
}

#[test]
fn instance_method_keeps_its_receiver() {
    let mut h = harness();
    let code = r#"
class Counter
  fn init(self, start)
    self.count = start
  endfn

  fn bump(self, by=1)
    self.count = self.count + by
    return self.count
  endfn
endclass
let c = Counter(10)
let traced = trace(c.bump)
traced(by=5)
c.count
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(15));
    assert_eq!(h.log.callees(), vec!["Counter.bump"]);
}

#[test]
fn class_scoped_method_stays_bound_to_the_class() {
    let mut h = harness();
    let code = r#"
class Point
  fn init(self)
    self.x = 0
  endfn

  @classmethod
  fn origin(cls)
    return cls()
  endfn
endclass
let o = trace(Point.origin)()
type_of(o)
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::String("instance".to_string()));
    // The construction inside the rewritten body reaches the entry point
    // and terminates there, named after the class.
    assert_eq!(h.log.callees(), vec!["Point.origin", "Point"]);
}

#[test]
fn static_method_runs_without_a_receiver() {
    let mut h = harness();
    let code = r#"
class Math
  @staticmethod
  fn double(x)
    return x * 2
  endfn
endclass
trace(Math.double)(21)
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(42));
    assert_eq!(h.log.callees(), vec!["double"]);
}

#[test]
fn construction_inside_an_instrumented_body_is_terminal() {
    let mut h = harness();
    let code = r#"
class Point
  fn init(self, x)
    self.x = x
  endfn
endclass
fn make()
  return Point(3)
endfn
let p = trace(make)()
p.x
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(3));
    assert_eq!(h.log.callees(), vec!["make", "Point"]);
}

#[test]
fn unresolvable_free_name_degrades_to_the_original() {
    let mut h = harness();
    let code = r#"
fn helper()
  return 3
endfn
fn risky()
  if false
    ghost()
  endif
  return helper() + 4
endfn
trace(risky)()
"#;
    let result = h.run(code).unwrap();
    assert_eq!(result, Value::Integer(7));
    // The link failed, so the original body ran and the helper call was
    // never instrumented.
    assert_eq!(h.log.callees(), vec!["risky"]);
}

#[test]
fn invoking_a_traced_non_callable_still_fails() {
    let mut h = harness();
    let err = h.run("trace(3)()\n").unwrap_err();
    assert!(err.to_string().contains("not callable"));
    // The event fires before the call is attempted.
    assert_eq!(h.log.len(), 1);
}

#[test]
fn arity_errors_propagate_through_the_wrapper() {
    let mut h = harness();
    let code = r#"
fn leaf()
  return 1
endfn
trace(leaf)(1, 2)
"#;
    let err = h.run(code).unwrap_err();
    assert!(err.to_string().contains("takes 0 arguments"));
    assert_eq!(h.log.callees(), vec!["leaf"]);
}

#[test]
fn entry_point_requires_exactly_one_argument() {
    let mut h = harness();
    assert!(h.run("trace()\n").is_err());
    assert!(h.run("trace(len, str)\n").is_err());
    assert!(h.log.is_empty());
}

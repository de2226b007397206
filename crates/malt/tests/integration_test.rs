use malt::{ErrorPolicy, Interpreter, MaltError, NativeFn, ReadError, Value};

fn eval(input: &str) -> Value {
    let interp = Interpreter::new();
    interp
        .eval_str(input)
        .unwrap_or_else(|e| panic!("failed to eval {input}: {e}"))
}

fn eval_to_string(input: &str) -> String {
    format!("{}", eval(input))
}

fn eval_err(input: &str) -> MaltError {
    Interpreter::new()
        .eval_str(input)
        .expect_err("expected an error")
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval("(+ 1 2)"), Value::int(3));
    assert_eq!(eval("(- 10 3)"), Value::int(7));
    assert_eq!(eval("(* 4 5)"), Value::int(20));
    assert_eq!(eval("(/ 10 2)"), Value::int(5));
    assert_eq!(eval("(mod 10 3)"), Value::int(1));
    assert_eq!(eval("(+ 1 2.0)"), Value::float(3.0));
    assert_eq!(eval_to_string("(* 1.5 2)"), "3.0");
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(eval_err("(/ 1 0)"), MaltError::DivisionByZero));
    assert_eq!(
        eval_to_string("(try* (/ 1 0) (catch* e e))"),
        "\"Division by zero\""
    );
}

#[test]
fn test_comparison() {
    assert_eq!(eval("(< 1 2)"), Value::bool(true));
    assert_eq!(eval("(> 3 2)"), Value::bool(true));
    assert_eq!(eval("(<= 2 2)"), Value::bool(true));
    assert_eq!(eval("(= 42 42)"), Value::bool(true));
    assert_eq!(eval("(not false)"), Value::bool(true));
    assert_eq!(eval("(not 0)"), Value::bool(false));
}

#[test]
fn test_sequence_comparison_counts_items() {
    assert_eq!(eval("(< [9 9] (list 1 2 3))"), Value::bool(true));
    assert_eq!(eval("(>= '(5) [1])"), Value::bool(true));
    assert_eq!(eval("(> [1 2] [3 4])"), Value::bool(false));
    assert_eq!(eval("(= [1 2] '(1 2))"), Value::bool(true));
}

#[test]
fn test_def_and_call() {
    assert_eq!(eval("(do (def! x 42) x)"), Value::int(42));
    assert_eq!(
        eval("(def! square (fn* (x) (* x x))) (square 5)"),
        Value::int(25)
    );
    assert_eq!(eval("(def! a 1 b 2) (+ a b)"), Value::int(3));
}

#[test]
fn test_factorial() {
    assert_eq!(
        eval("(def! fact (fn* (n) (if (<= n 1) 1 (* n (fact (- n 1)))))) (fact 10)"),
        Value::int(3628800)
    );
}

#[test]
fn test_tail_call_loop() {
    assert_eq!(
        eval("(def! loop (fn* (n) (if (= n 0) \"done\" (loop (- n 1))))) (loop 100000)"),
        Value::string("done")
    );
}

#[test]
fn test_let_star_is_sequential() {
    assert_eq!(eval("(let* (a 1 b (+ a 1)) b)"), Value::int(2));
    assert_eq!(eval("(let* [a 1 b (+ a 1)] (+ a b))"), Value::int(3));
}

#[test]
fn test_if_and_do() {
    assert_eq!(eval("(if nil 1)"), Value::Nil);
    assert_eq!(eval("(if 0 :zero :other)"), Value::keyword("zero"));
    assert_eq!(eval("(if \"\" 1 2)"), Value::int(1));
    assert_eq!(eval("(do 1 2 3)"), Value::int(3));
}

#[test]
fn test_map_immutability_and_sharing() {
    let interp = Interpreter::new();
    interp
        .eval_str("(def! m1 {}) (def! m2 (assoc m1 \"k\" 1))")
        .unwrap();
    assert_eq!(interp.eval_str("(count m1)").unwrap(), Value::int(0));
    assert_eq!(interp.eval_str("(get m2 \"k\")").unwrap(), Value::int(1));
    assert_eq!(
        interp.eval_str("(= (dissoc m2 \"k\") m1)").unwrap(),
        Value::bool(true)
    );
    assert_eq!(
        interp.eval_str("(identical? (dissoc m2 \"k\") m1)").unwrap(),
        Value::bool(false)
    );
}

#[test]
fn test_map_keys_stay_distinct() {
    assert_eq!(eval("(count {\"a\" 1 :a 2})"), Value::int(2));
    assert_eq!(eval("(get {\"a\" 1 :a 2} :a)"), Value::int(2));
    assert_eq!(eval_to_string("(keys {:b 1 :a 2})"), "(:a :b)");
}

#[test]
fn test_macro_receives_unevaluated_args() {
    assert_eq!(
        eval_to_string("(defmacro! m (fn* (x) (list 'quote x))) (m (+ 1 2))"),
        "(+ 1 2)"
    );
}

#[test]
fn test_macroexpand_does_not_evaluate() {
    let interp = Interpreter::new();
    interp
        .eval_str("(defmacro! unless (fn* (c a b) `(if ~c ~b ~a)))")
        .unwrap();
    assert_eq!(
        interp
            .eval_str("(macroexpand (unless x 1 2))")
            .unwrap()
            .to_string(),
        "(if x 2 1)"
    );
    assert_eq!(interp.eval_str("(unless false 1 2)").unwrap(), Value::int(1));
}

#[test]
fn test_defmacro_requires_function() {
    assert!(matches!(
        eval_err("(defmacro! bad 42)"),
        MaltError::Type { .. }
    ));
}

#[test]
fn test_cond_prelude_macro() {
    let src = "(def! sign (fn* (n) (cond (< n 0) :neg (= n 0) :zero true :pos)))";
    let interp = Interpreter::new();
    interp.eval_str(src).unwrap();
    assert_eq!(interp.eval_str("(sign -3)").unwrap(), Value::keyword("neg"));
    assert_eq!(interp.eval_str("(sign 0)").unwrap(), Value::keyword("zero"));
    assert_eq!(interp.eval_str("(sign 8)").unwrap(), Value::keyword("pos"));
    assert_eq!(interp.eval_str("(cond false 1)").unwrap(), Value::Nil);
}

#[test]
fn test_exceptions() {
    assert_eq!(
        eval("(try* (throw \"boom\") (catch* e (str \"caught: \" e)))"),
        Value::string("caught: boom")
    );
    assert_eq!(eval("(try* 42)"), Value::int(42));
    assert_eq!(
        eval_to_string("(try* (throw {:code 7}) (catch* e (get e :code)))"),
        "7"
    );
    assert!(matches!(eval_err("(throw 1)"), MaltError::Exception(_)));
}

#[test]
fn test_catch_clause_is_validated() {
    assert!(Interpreter::new().eval_str("(try* 1 (oops e 2))").is_err());
    assert!(Interpreter::new().eval_str("(try* 1 (catch* 5 2))").is_err());
}

#[test]
fn test_catchable_policy_catches_structural_errors() {
    assert_eq!(
        eval("(try* (no-such-fn 1) (catch* e e))"),
        Value::string("'no-such-fn' not found")
    );
    assert_eq!(
        eval("(try* (nth (list 1) 5) (catch* e :caught))"),
        Value::keyword("caught")
    );
}

#[test]
fn test_propagate_policy_skips_catch() {
    let interp = Interpreter::builder()
        .with_error_policy(ErrorPolicy::Propagate)
        .build();
    let err = interp
        .eval_str("(try* (no-such-fn 1) (catch* e :caught))")
        .unwrap_err();
    assert!(matches!(err, MaltError::Unbound(_)));
    assert_eq!(
        interp.eval_str("(try* (throw 3) (catch* e e))").unwrap(),
        Value::int(3)
    );
}

#[test]
fn test_read_string_empty_input_catches_as_nil() {
    assert_eq!(eval("(try* (read-string \"\") (catch* e e))"), Value::Nil);
    assert_eq!(
        eval_to_string("(read-string \"(1 [2] {:a 3})\")"),
        "(1 [2] {:a 3})"
    );
}

#[test]
fn test_quasiquote() {
    assert_eq!(
        eval_to_string("(let* (x (list 2 3)) `(1 ~@x 4))"),
        "(1 2 3 4)"
    );
    assert_eq!(eval_to_string("(let* (x 5) `[a ~x])"), "[a 5]");
    assert_eq!(
        eval_to_string("(quasiquoteexpand (a ~b))"),
        "(cons (quote a) (cons b ()))"
    );
}

#[test]
fn test_closure_capture() {
    let interp = Interpreter::new();
    interp
        .eval_str("(def! make-adder (fn* (n) (fn* (x) (+ x n))))")
        .unwrap();
    interp.eval_str("(def! add5 (make-adder 5))").unwrap();
    assert_eq!(interp.eval_str("(add5 10)").unwrap(), Value::int(15));

    interp
        .eval_str(
            "(def! counter (fn* () (let* (c (atom 0)) (fn* () (swap! c inc)))))
             (def! c1 (counter))
             (def! c2 (counter))
             (c1) (c1)",
        )
        .unwrap();
    assert_eq!(interp.eval_str("(c1)").unwrap(), Value::int(3));
    assert_eq!(interp.eval_str("(c2)").unwrap(), Value::int(1));
}

#[test]
fn test_def_inside_lambda_reaches_global() {
    let interp = Interpreter::new();
    interp
        .eval_str("(def! setter (fn* (v) (def! shared v))) (setter 9)")
        .unwrap();
    assert_eq!(interp.eval_str("shared").unwrap(), Value::int(9));
    interp
        .eval_str("(def! rebind (fn* (v) (do (def! v 1) v))) (def! r (rebind 5))")
        .unwrap();
    assert_eq!(interp.eval_str("r").unwrap(), Value::int(1));
    assert!(interp.eval_str("v").is_err());
}

#[test]
fn test_while_loop() {
    assert_eq!(
        eval("(def! a (atom 0)) (while (< @a 5) (swap! a inc))"),
        Value::int(5)
    );
    assert_eq!(eval("(while false 1)"), Value::Nil);
}

#[test]
fn test_metadata() {
    assert_eq!(eval_to_string("(meta (with-meta [1] {:a 1}))"), "{:a 1}");
    assert_eq!(eval_to_string("(meta ^{:b 2} [1])"), "{:b 2}");
    assert_eq!(eval("(= (with-meta [1] :m) [1])"), Value::bool(true));
    assert!(matches!(
        eval_err("(with-meta 1 {:a 1})"),
        MaltError::Type { .. }
    ));
}

#[test]
fn test_eval_builtin_uses_global_env() {
    assert_eq!(
        eval("(def! x 1) (let* (x 2) (eval (read-string \"x\")))"),
        Value::int(1)
    );
}

#[test]
fn test_depth_guard_stops_runaway_recursion() {
    let interp = Interpreter::builder().with_max_depth(64).build();
    interp.eval_str("(def! f (fn* (n) (+ 1 (f n))))").unwrap();
    let err = interp
        .eval_str("(try* (f 0) (catch* e :caught))")
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(interp.context().eval_depth.get(), 0);
    assert_eq!(interp.eval_str("(+ 1 1)").unwrap(), Value::int(2));
}

#[test]
fn test_deep_recursion_on_default_thread() {
    let interp = Interpreter::new();
    interp
        .eval_str("(def! sum-to (fn* (n) (if (= n 0) 0 (+ n (sum-to (- n 1))))))")
        .unwrap();
    assert_eq!(interp.eval_str("(sum-to 1500)").unwrap(), Value::int(1125750));
}

#[test]
fn test_default_depth_limit_is_fatal_not_a_crash() {
    let interp = Interpreter::new();
    interp.eval_str("(def! f (fn* (n) (+ 1 (f n))))").unwrap();
    let err = interp
        .eval_str("(try* (f 0) (catch* e :caught))")
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(interp.context().eval_depth.get(), 0);
    assert_eq!(interp.eval_str("(+ 1 1)").unwrap(), Value::int(2));
}

#[test]
fn test_and_or_bound() {
    assert_eq!(eval("(and (= 1 1) (< 1 2))"), Value::bool(true));
    assert_eq!(eval("(or false nil (> 2 1))"), Value::bool(true));
    assert_eq!(eval("(def! hits (atom 0)) (or true (swap! hits inc)) @hits"), Value::int(0));
    assert_eq!(eval("(bound? *host-language*)"), Value::bool(true));
    assert_eq!(eval("(bound? not-yet-defined)"), Value::bool(false));
}

#[test]
fn test_set_reaches_global_but_not_through_params() {
    let interp = Interpreter::new();
    interp
        .eval_str("(def! total 0) (def! x :outer) (def! add! (fn* (x) (do (set total (+ total x)) (set x 99))))")
        .unwrap();
    interp.eval_str("(add! 5) (add! 7)").unwrap();
    assert_eq!(interp.eval_str("total").unwrap(), Value::int(12));
    assert_eq!(interp.eval_str("x").unwrap(), Value::keyword("outer"));
}

#[test]
fn test_numeric_helpers() {
    assert_eq!(eval("(abs -7)"), Value::int(7));
    assert_eq!(eval("(zero? (- 3 3))"), Value::bool(true));
    assert_eq!(eval("(number? (time-ms))"), Value::bool(true));
    assert_eq!(eval("(+ +5 1)"), Value::int(6));
}

#[test]
fn test_self_referencing_atom_prints() {
    let interp = Interpreter::new();
    let out = interp.rep("(def! a (atom nil)) (reset! a a) a").unwrap();
    assert_eq!(out.as_deref(), Some("(atom (atom ...))"));
}

#[test]
fn test_arity_errors_name_the_function() {
    assert_eq!(
        eval_err("(def! add (fn* (a b) (+ a b))) (add 1)").to_string(),
        "Arity error: add expects 2 args, got 1"
    );
    assert_eq!(
        eval_to_string("(def! add (fn* (a b) (+ a b))) (try* (add 1 2 3) (catch* e e))"),
        "\"Arity error: add expects 2 args, got 3\""
    );
}

#[test]
fn test_read_errors() {
    let interp = Interpreter::new();
    let err = interp.eval_str("(+ 1").unwrap_err();
    assert!(matches!(err, MaltError::Read(ref e) if e.is_incomplete()));
    assert!(matches!(
        interp.eval_str(")").unwrap_err(),
        MaltError::Read(ReadError::UnexpectedCloseDelimiter { .. })
    ));
    assert_eq!(interp.eval_str("(+ 1\n2)").unwrap(), Value::int(3));
}

#[test]
fn test_rep_prints_readably() {
    let interp = Interpreter::new();
    assert_eq!(interp.rep("\"a\\nb\"").unwrap().as_deref(), Some("\"a\\nb\""));
    assert_eq!(interp.rep("   ").unwrap(), None);
    assert_eq!(interp.rep("; comment").unwrap(), None);
    assert_eq!(interp.rep("(fn* (x) x)").unwrap().as_deref(), Some("#<function>"));
    assert_eq!(interp.rep("+").unwrap().as_deref(), Some("#<builtin +>"));
}

#[test]
fn test_register_fn() {
    let interp = Interpreter::new();
    interp.register_fn("square", |args: &[Value]| match &args[0] {
        Value::Int(n) => Ok(Value::Int(n * n)),
        other => Err(MaltError::type_error("integer", other.type_name())),
    });
    assert_eq!(interp.eval_str("(square 7)").unwrap(), Value::int(49));
    assert!(interp.eval_str("(try* (square \"x\") (catch* e e))").is_ok());
}

#[test]
fn test_install_with_context() {
    let interp = Interpreter::new();
    interp.install(
        "call-with-10",
        NativeFn::with_ctx("call-with-10", |ctx, args| ctx.apply(&args[0], &[Value::int(10)])),
    );
    assert_eq!(
        interp.eval_str("(call-with-10 (fn* (x) (* x x)))").unwrap(),
        Value::int(100)
    );
}

#[test]
fn test_builder_without_stdlib() {
    let interp = Interpreter::builder().with_stdlib(false).build();
    assert!(interp.eval_str("(+ 1 2)").is_err());
    assert_eq!(interp.eval_str("(if true 1 2)").unwrap(), Value::int(1));
}

#[test]
fn test_argv_and_host_language() {
    let interp = Interpreter::new();
    interp.set_argv(&["a".to_string(), "b".to_string()]);
    assert_eq!(interp.eval_str("(count *ARGV*)").unwrap(), Value::int(2));
    assert_eq!(
        interp.eval_str("*host-language*").unwrap(),
        Value::string("malt")
    );
}

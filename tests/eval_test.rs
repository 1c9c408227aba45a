use muscheme::config::Config;
use muscheme::datum::Datum;
use muscheme::env::Env;
use muscheme::error::{EvalError, EvalErrorKind};
use muscheme::parser::{read_line, Parser};
use muscheme::{create_global_frame, evaluate};
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Evaluates every datum of `src` in `env`, returning the last result
fn eval_all(src: &str, env: &Env) -> Result<Datum, EvalError> {
    let exprs = match Parser::new(src).parse_all() {
        Ok(exprs) => exprs,
        Err(e) => panic!("failed to parse source: {:?}", e),
    };
    let mut result = Datum::Okay;
    for expr in exprs.iter() {
        result = evaluate(expr, env)?;
    }
    Ok(result)
}

macro_rules! assert_evaluates_to {
    ($src:expr, $expected:expr) => {{
        init();
        let expected = match read_line($expected) {
            Ok(val) => val,
            Err(e) => panic!("failed to parse result: {:?}", e),
        };
        match eval_all($src, &create_global_frame()) {
            Ok(result) => assert_eq!(expected, result),
            Err(e) => panic!("evaluating `{}` failed: {}", $src, e),
        }
    }};
}

macro_rules! assert_eval_error {
    ($src:expr, $kind:expr) => {{
        init();
        match eval_all($src, &create_global_frame()) {
            Ok(result) => panic!("expected {:?} from `{}` but got `{}`", $kind, $src, result),
            Err(e) => assert_eq!($kind, e.kind, "unexpected error: {}", e),
        }
    }};
    ($src:expr, $kind:expr, $desc:expr) => {{
        init();
        match eval_all($src, &create_global_frame()) {
            Ok(result) => panic!("expected {:?} from `{}` but got `{}`", $kind, $src, result),
            Err(e) => {
                assert_eq!($kind, e.kind);
                assert_eq!($desc, e.desc);
            }
        }
    }};
}

fn with_config<F: FnOnce()>(config: Config, f: F) {
    let saved = Config::current();
    config.install();
    f();
    saved.install();
}

#[test]
fn lexical_scoping() {
    // (\y f -> f 2) #f ((\y -> (\x -> y)) #t)
    // If it's dynamic scope, it should return #f
    // If it's static scope, it should return #t
    assert_evaluates_to!("((lambda (y f) (f 2)) #f ((lambda (y) (lambda (x) y)) #t))", "#t")
}

#[test]
fn dynamic_scoping() {
    // the same program with mu sees the caller's y
    assert_evaluates_to!("((lambda (y f) (f 2)) #f ((lambda (y) (mu (x) y)) #t))", "#f")
}

#[test]
fn mu_sees_each_callers_bindings() {
    let src = "
        (define y 'global)
        (define get-y (mu () y))
        (define get-y-lexical (lambda () y))
        (define (caller-a) (define y 'a) (list (get-y) (get-y-lexical)))
        (define (caller-b y) (list (get-y) (get-y-lexical)))
        (list (caller-a) (caller-b 'b) (get-y))";
    assert_evaluates_to!(src, "((a global) (b global) global)");
}

#[test]
fn eval_to_self_test() {
    assert_evaluates_to!("#t", "#t");
    assert_evaluates_to!("#f", "#f");
    assert_evaluates_to!("23", "23");
    assert_evaluates_to!("-1.5", "-1.5");
    assert_evaluates_to!(r#""str""#, r#""str""#);
    assert_evaluates_to!("()", "()");
}

#[test]
fn symbol_lookup() {
    assert_evaluates_to!("(define x 10) x", "10");
    assert_evaluates_to!("(define x 10) (define (f) x) (f)", "10");
    assert_eval_error!("undefined-thing", EvalErrorKind::UnboundVariable, "unknown identifier: undefined-thing");
}

#[test]
fn quote_test() {
    assert_evaluates_to!("(quote (a b c))", "(a b c)");
    assert_evaluates_to!("'(undefined-thing (1 . 2))", "(undefined-thing (1 . 2))");
    assert_evaluates_to!("''a", "(quote a)");
    assert_eval_error!("(quote)", EvalErrorKind::BadSyntax, "too few operands in form");
    assert_eval_error!("(quote a b)", EvalErrorKind::BadSyntax, "too many operands in form");
}

#[test]
fn if_expression_test() {
    assert_evaluates_to!("(if #t 1 0)", "1");
    assert_evaluates_to!("(if #f 1 0)", "0");
    assert_evaluates_to!("(if 0 1 0)", "1");
    assert_evaluates_to!("(if '() 1 0)", "1");
    assert_evaluates_to!("(if #t 1 undefined-thing)", "1");
    assert_eq!(Ok(Datum::Okay), eval_all("(if #f 1)", &create_global_frame()));
    assert_eval_error!("(if #t)", EvalErrorKind::BadSyntax);
    assert_eval_error!("(if #t 1 2 3)", EvalErrorKind::BadSyntax);
}

#[test]
fn and_or_test() {
    assert_evaluates_to!("(and)", "#t");
    assert_evaluates_to!("(and #f undefined-thing)", "#f");
    assert_evaluates_to!("(and #t 5)", "5");
    assert_evaluates_to!("(and 1 2 3)", "3");
    assert_evaluates_to!("(or)", "#f");
    assert_evaluates_to!("(or 5 undefined-thing)", "5");
    assert_evaluates_to!("(or #f 7)", "7");
    assert_evaluates_to!("(or #f #f)", "#f");
}

#[test]
fn or_does_not_reevaluate() {
    // a symbol or list value must come back as is
    assert_evaluates_to!("(or 'undefined-thing #f)", "undefined-thing");
    assert_evaluates_to!("(or '(car '(1)) #f)", "(car (quote (1)))");
    assert_evaluates_to!("(define (f) 'x) (or (f) 1)", "x");
}

#[test]
fn cond_test() {
    assert_evaluates_to!("(cond (#f 1) (#t 2))", "2");
    assert_evaluates_to!("(cond (#f 1) (else 2 3))", "3");
    assert_evaluates_to!("(cond ((+ 1 2)))", "3");
    assert_evaluates_to!("(cond ('(a b)))", "(a b)");
    assert_eq!(Ok(Datum::Okay), eval_all("(cond (#f 1))", &create_global_frame()));
    assert_eval_error!("(cond (else 1) (#t 2))", EvalErrorKind::BadSyntax, "else must be last");
    assert_eval_error!("(cond (else))", EvalErrorKind::BadSyntax, "badly formed else clause");
    assert_eval_error!("(cond ())", EvalErrorKind::BadSyntax);
}

#[test]
fn begin_test() {
    assert_evaluates_to!("(begin 1 2 3)", "3");
    assert_evaluates_to!("(begin (define x 1) (+ x 1))", "2");
    assert_eval_error!("(begin)", EvalErrorKind::BadSyntax, "too few operands in form");
}

#[test]
fn numeric_expressions_test() {
    assert_evaluates_to!("(+ 23 42)", "65");
    assert_evaluates_to!("(+ 14 (* 23 42))", "980");
    assert_evaluates_to!("(- 3 1)", "2");
    assert_evaluates_to!("(- 3)", "-3");
    assert_evaluates_to!("(/ 1 2)", "0.5");
    assert_eval_error!("(/ 1 0)", EvalErrorKind::DivideByZero);
}

#[test]
fn define_test() {
    assert_evaluates_to!("(define (f x) (* x x)) (f 5)", "25");
    assert_evaluates_to!("(define x 3)", "x");
    assert_evaluates_to!("(define (f x) x)", "f");
    assert_eval_error!("(define (f . args) args)", EvalErrorKind::BadFormals, "badly formed parameter list: args");
    assert_evaluates_to!("(define (f) (define a 1) (define b 2) (+ a b)) (f)", "3");
    assert_eval_error!("(define 3 4)", EvalErrorKind::BadSyntax, "bad argument to define");
    assert_eval_error!("(define (3 x) x)", EvalErrorKind::BadSyntax, "Function name not a symbol: 3");
    assert_eval_error!("(define x 1 2)", EvalErrorKind::BadSyntax, "too many operands in form");
}

#[test]
fn define_is_local() {
    // defining inside a call frame never touches the global binding
    assert_evaluates_to!("(define x 1) (define (f) (define x 2) x) (list (f) x)", "(2 1)");
    assert_evaluates_to!("(define x 1) (let ((y 0)) (define x 5) x) x", "1");
}

#[test]
fn let_test() {
    assert_evaluates_to!("(let ((x 23) (y 42)) (+ x y))", "65");
    assert_evaluates_to!("(let ((a 1) (b 2)) (+ a b))", "3");
    assert_evaluates_to!("(let () 5)", "5");
    assert_evaluates_to!("(define a 10) (let ((a 1) (b a)) b)", "10");
    assert_evaluates_to!("(let ((x 1)) (define y 2) (+ x y))", "3");
    assert_eval_error!("(let ((a 1) (b a)) b)", EvalErrorKind::UnboundVariable, "unknown identifier: a");
}

#[test]
fn let_errors() {
    assert_eval_error!("(let x 1)", EvalErrorKind::BadSyntax, "bad bindings list in let form");
    assert_eval_error!("(let ((x)) x)", EvalErrorKind::BadSyntax, "List (x) does not have two elements");
    assert_eval_error!("(let ((x 1 2)) x)", EvalErrorKind::BadSyntax, "List (x 1 2) does not have two elements");
    assert_eval_error!("(let ((1 2)) 1)", EvalErrorKind::BadSyntax, "1 is not a symbol");
    assert_eval_error!("(let ((x 1) (x 2)) x)", EvalErrorKind::BadFormals);
    // names are checked before any value is evaluated
    assert_eval_error!(
        "(let ((a (undefined-thing)) (a 2)) a)",
        EvalErrorKind::BadFormals,
        "Symbol in formals more than once: a"
    );
    assert_eval_error!("(let ((x 1)))", EvalErrorKind::BadSyntax);
}

#[test]
fn lambda_test() {
    assert_evaluates_to!("((lambda (x y) (+ x y)) 1 2)", "3");
    assert_evaluates_to!("((lambda () 1 2))", "2");
    assert_evaluates_to!("(define make-adder (lambda (n) (lambda (x) (+ x n)))) ((make-adder 3) 4)", "7");
    assert_eval_error!("(lambda (x x) x)", EvalErrorKind::BadFormals, "Symbol in formals more than once: x");
    assert_eval_error!("(lambda (x 1) x)", EvalErrorKind::BadFormals, "Not a symbol: 1");
    assert_eval_error!("(lambda (x))", EvalErrorKind::BadSyntax, "too few operands in form");
    assert_eval_error!("(mu (x x) x)", EvalErrorKind::BadFormals);
}

#[test]
fn arity_errors() {
    assert_eval_error!(
        "((lambda (x) x) 1 2)",
        EvalErrorKind::NumArgs,
        "formals and vals must be the same length"
    );
    assert_eval_error!("((lambda (x y) x) 1)", EvalErrorKind::NumArgs);
    assert_eval_error!("((mu (x) x))", EvalErrorKind::NumArgs);
    assert_eval_error!("(car 1 2)", EvalErrorKind::NotCallable, "Cannot call #[car] with 2 arguments");
}

#[test]
fn not_callable() {
    assert_eval_error!("(1 2)", EvalErrorKind::NotCallable, "Cannot call 1");
    assert_eval_error!("('a)", EvalErrorKind::NotCallable, "Cannot call a");
    assert_eval_error!("(define x 5) (x)", EvalErrorKind::NotCallable, "Cannot call 5");
}

#[test]
fn malformed_combination() {
    assert_eval_error!("(+ 1 . 2)", EvalErrorKind::MalformedList, "malformed list: (+ 1 . 2)");
    assert_eval_error!("(if #t . 1)", EvalErrorKind::MalformedList);
}

#[test]
fn eval_and_apply_primitives() {
    assert_evaluates_to!("(eval '(+ 1 2))", "3");
    assert_evaluates_to!("(define x 4) (eval 'x)", "4");
    assert_evaluates_to!("(apply + '(1 2 3))", "6");
    assert_evaluates_to!("(apply (lambda (a b) (list b a)) '(1 2))", "(2 1)");
    assert_evaluates_to!("(define (f) (define z 9) (eval 'z)) (f)", "9");
    assert_evaluates_to!("(define get-z (mu () z)) (define (f z) (apply get-z '())) (f 3)", "3");
}

#[test]
fn special_form_keywords_are_not_values() {
    assert_eval_error!("if", EvalErrorKind::UnboundVariable, "unknown identifier: if");
}

#[test]
fn deep_tail_recursion() {
    with_config(Config::default(), || {
        assert_evaluates_to!(
            "(define (count n) (cond ((= n 0) 'done) (else (count (- n 1))))) (count 100000)",
            "done"
        );
        assert_evaluates_to!(
            "(define (loop n acc) (if (= n 0) acc (loop (- n 1) (+ acc 1)))) (loop 100000 0)",
            "100000"
        );
        assert_evaluates_to!(
            "(define (f n) (and #t (or #f (let ((m (- n 1))) (begin (if (= m 0) 'ok (f m))))))) (f 100000)",
            "ok"
        );
    });
}

#[test]
fn deep_recursion_without_tail_calls() {
    let config = Config {
        tail_calls: false,
        max_depth: 100,
    };
    with_config(config, || {
        assert_eval_error!(
            "(define (count n) (if (= n 0) 'done (count (- n 1)))) (count 1000)",
            EvalErrorKind::RecursionDepth,
            "maximum recursion depth exceeded"
        );
        assert_evaluates_to!(
            "(define (count n) (if (= n 0) 'done (count (- n 1)))) (count 5)",
            "done"
        );
    });
}

#[test]
fn non_tail_recursion_is_bounded() {
    // default limit on the default test thread
    with_config(Config::default(), || {
        assert_eval_error!(
            "(define (sum n) (if (= n 0) 0 (+ n (sum (- n 1))))) (sum 5000)",
            EvalErrorKind::RecursionDepth,
            "maximum recursion depth exceeded"
        );
        assert_evaluates_to!(
            "(define (sum n) (if (= n 0) 0 (+ n (sum (- n 1))))) (sum 900)",
            "405450"
        );
    });
}

#[test]
fn recursive_mode_is_bounded() {
    let config = Config {
        tail_calls: false,
        ..Config::default()
    };
    with_config(config, || {
        assert_eval_error!(
            "(define (sum n) (if (= n 0) 0 (+ n (sum (- n 1))))) (sum 5000)",
            EvalErrorKind::RecursionDepth
        );
        assert_evaluates_to!(
            "(define (sum n) (if (= n 0) 0 (+ n (sum (- n 1))))) (sum 200)",
            "20100"
        );
    });
}

#[test]
fn long_lists() {
    with_config(Config::default(), || {
        assert_evaluates_to!(
            "(define (build n acc) (if (= n 0) acc (build (- n 1) (cons n acc)))) (length (build 300000 '()))",
            "300000"
        );
        assert_evaluates_to!(
            "(define (build n acc) (if (= n 0) acc (build (- n 1) (cons n acc))))
             (equal? (build 200000 '()) (build 200000 '()))",
            "#t"
        );
    });
}

#[test]
fn printed_forms_read_back() {
    let env = create_global_frame();
    for src in ["(1 (2 . 3) \"a\\\"b\" #t x)", "'(quote x)", "(1.5 -2)"] {
        let value = eval_all(&format!("'{}", src.trim_start_matches('\'')), &env).unwrap();
        let printed = format!("{}", value);
        assert_eq!(Ok(value), read_line(&printed));
    }
}

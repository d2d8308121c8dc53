//! Parser tests - verify parsing and AST structure
//!
//! These tests check the AST produced for source text and the errors raised
//! for malformed input. Evaluation is covered by the executor tests.

use crate::interpreter::parser::{parse_module, ParseError};
use crate::interpreter::types::ast::{
    Arg, BinOp, BoolOp, CmpOp, CompClause, Expr, FStringPart, Stmt, UnaryOp,
};

fn parse(source: &str) -> Vec<Stmt> {
    parse_module(source).expect("Should parse")
}

/// Parse a single expression statement
fn expr(source: &str) -> Expr {
    match parse(source).remove(0) {
        Stmt::Expr { expr } => expr,
        other => panic!("Expected expression statement, got {:?}", other),
    }
}

fn error(source: &str) -> String {
    parse_module(source)
        .expect_err("Should fail to parse")
        .to_string()
}

fn name(n: &str) -> Expr {
    Expr::Name { name: n.to_string() }
}

fn int(v: i64) -> Expr {
    Expr::LitInt { v }
}

/* ===================== Literals ===================== */

#[test]
fn test_parse_integer_forms() {
    assert_eq!(expr("42"), int(42));
    assert_eq!(expr("0xff"), int(255));
    assert_eq!(expr("0b101"), int(5));
    assert_eq!(expr("0o17"), int(15));
    assert_eq!(expr("1_000"), int(1000));
}

#[test]
fn test_parse_float_forms() {
    assert_eq!(expr("1e3"), Expr::LitFloat { v: 1000.0 });
    assert_eq!(expr(".5"), Expr::LitFloat { v: 0.5 });
    assert_eq!(expr("2.5"), Expr::LitFloat { v: 2.5 });
}

#[test]
fn test_parse_constants() {
    assert_eq!(expr("None"), Expr::LitNone);
    assert_eq!(expr("True"), Expr::LitBool { v: true });
    assert_eq!(expr("False"), Expr::LitBool { v: false });
}

#[test]
fn test_adjacent_strings_concatenate() {
    assert_eq!(
        expr("'a' \"b\""),
        Expr::LitStr {
            v: "ab".to_string()
        }
    );
}

#[test]
fn test_parse_fstring() {
    let parsed = expr("f\"{name!r:>10} is {age}\"");
    assert_eq!(
        parsed,
        Expr::FString {
            parts: vec![
                FStringPart::Field {
                    expr: name("name"),
                    conversion: Some('r'),
                    spec: vec![FStringPart::Literal(">10".to_string())],
                },
                FStringPart::Literal(" is ".to_string()),
                FStringPart::Field {
                    expr: name("age"),
                    conversion: None,
                    spec: Vec::new(),
                },
            ]
        }
    );
}

#[test]
fn test_parse_fstring_nested_spec() {
    match expr("f'{x:.{n}f}'") {
        Expr::FString { parts } => match parts.as_slice() {
            [FStringPart::Field { spec, .. }] => assert_eq!(
                spec,
                &vec![
                    FStringPart::Literal(".".to_string()),
                    FStringPart::Field {
                        expr: name("n"),
                        conversion: None,
                        spec: Vec::new(),
                    },
                    FStringPart::Literal("f".to_string()),
                ]
            ),
            other => panic!("Expected one field, got {:?}", other),
        },
        other => panic!("Expected FString, got {:?}", other),
    }
}

#[test]
fn test_leading_zero_rejected() {
    let err = parse_module("x = 007").unwrap_err();
    assert!(err.message().starts_with("leading zeros in decimal integer literals"));
}

/* ===================== Operators ===================== */

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(
        expr("1 + 2 * 3"),
        Expr::BinOp {
            op: BinOp::Add,
            left: Box::new(int(1)),
            right: Box::new(Expr::BinOp {
                op: BinOp::Mul,
                left: Box::new(int(2)),
                right: Box::new(int(3)),
            }),
        }
    );
}

#[test]
fn test_unary_minus_binds_looser_than_power() {
    assert_eq!(
        expr("-2 ** 2"),
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::BinOp {
                op: BinOp::Pow,
                left: Box::new(int(2)),
                right: Box::new(int(2)),
            }),
        }
    );
}

#[test]
fn test_chained_comparison() {
    match expr("a < b <= c") {
        Expr::Compare { left, ops } => {
            assert_eq!(*left, name("a"));
            assert_eq!(ops, vec![(CmpOp::Lt, name("b")), (CmpOp::LtE, name("c"))]);
        }
        other => panic!("Expected Compare, got {:?}", other),
    }
}

#[test]
fn test_two_word_comparisons() {
    assert_eq!(
        expr("x not in y"),
        Expr::Compare {
            left: Box::new(name("x")),
            ops: vec![(CmpOp::NotIn, name("y"))],
        }
    );
    assert_eq!(
        expr("x is not None"),
        Expr::Compare {
            left: Box::new(name("x")),
            ops: vec![(CmpOp::IsNot, Expr::LitNone)],
        }
    );
}

#[test]
fn test_not_wraps_comparison() {
    assert_eq!(
        expr("not x in y"),
        Expr::UnaryOp {
            op: UnaryOp::Not,
            operand: Box::new(Expr::Compare {
                left: Box::new(name("x")),
                ops: vec![(CmpOp::In, name("y"))],
            }),
        }
    );
}

#[test]
fn test_boolean_operators() {
    assert_eq!(
        expr("a or b and c"),
        Expr::BoolOp {
            op: BoolOp::Or,
            left: Box::new(name("a")),
            right: Box::new(Expr::BoolOp {
                op: BoolOp::And,
                left: Box::new(name("b")),
                right: Box::new(name("c")),
            }),
        }
    );
}

#[test]
fn test_conditional_expression() {
    assert_eq!(
        expr("a if c else b"),
        Expr::IfExp {
            test: Box::new(name("c")),
            body: Box::new(name("a")),
            orelse: Box::new(name("b")),
        }
    );
}

/* ===================== Postfix ===================== */

#[test]
fn test_call_arguments() {
    match expr("f(1, *rest, key=2)") {
        Expr::Call { func, args } => {
            assert_eq!(*func, name("f"));
            assert_eq!(
                args,
                vec![
                    Arg::Positional(int(1)),
                    Arg::Star(name("rest")),
                    Arg::Keyword("key".to_string(), int(2)),
                ]
            );
        }
        other => panic!("Expected Call, got {:?}", other),
    }
}

#[test]
fn test_generator_argument_becomes_generator() {
    match expr("sum(x for x in xs)") {
        Expr::Call { args, .. } => {
            assert!(matches!(args.as_slice(), [Arg::Positional(Expr::GenExp { .. })]));
        }
        other => panic!("Expected Call, got {:?}", other),
    }
    assert!(matches!(expr("(x * 2 for x in xs if x)"), Expr::GenExp { .. }));
    assert!(matches!(expr("[x for x in xs]"), Expr::ListComp { .. }));
}

#[test]
fn test_method_call_chain() {
    assert_eq!(
        expr("s.strip().upper()"),
        Expr::Call {
            func: Box::new(Expr::Attribute {
                value: Box::new(Expr::Call {
                    func: Box::new(Expr::Attribute {
                        value: Box::new(name("s")),
                        attr: "strip".to_string(),
                    }),
                    args: vec![],
                }),
                attr: "upper".to_string(),
            }),
            args: vec![],
        }
    );
}

#[test]
fn test_slices() {
    assert_eq!(
        expr("a[1:]"),
        Expr::Subscript {
            value: Box::new(name("a")),
            index: Box::new(Expr::Slice {
                lower: Some(Box::new(int(1))),
                upper: None,
                step: None,
            }),
        }
    );
    assert_eq!(
        expr("a[::-1]"),
        Expr::Subscript {
            value: Box::new(name("a")),
            index: Box::new(Expr::Slice {
                lower: None,
                upper: None,
                step: Some(Box::new(Expr::UnaryOp {
                    op: UnaryOp::Neg,
                    operand: Box::new(int(1)),
                })),
            }),
        }
    );
}

/* ===================== Displays ===================== */

#[test]
fn test_list_comprehension() {
    match expr("[x * 2 for x in items if x > 0]") {
        Expr::ListComp { elt, comp } => {
            assert!(matches!(*elt, Expr::BinOp { op: BinOp::Mul, .. }));
            assert_eq!(comp.clauses.len(), 2);
            assert!(matches!(&comp.clauses[0], CompClause::For { target, .. } if *target == name("x")));
            assert!(matches!(&comp.clauses[1], CompClause::If { .. }));
            assert!(comp.locals.contains("x"));
        }
        other => panic!("Expected ListComp, got {:?}", other),
    }
}

#[test]
fn test_dict_display_and_comprehension() {
    assert_eq!(
        expr("{'a': 1, 'b': 2}"),
        Expr::Dict {
            items: vec![
                (Expr::LitStr { v: "a".to_string() }, int(1)),
                (Expr::LitStr { v: "b".to_string() }, int(2)),
            ]
        }
    );
    assert!(matches!(expr("{k: v for k, v in pairs}"), Expr::DictComp { .. }));
    assert_eq!(expr("{}"), Expr::Dict { items: vec![] });
}

#[test]
fn test_tuples() {
    assert_eq!(expr("()"), Expr::Tuple { items: vec![] });
    assert_eq!(expr("(1,)"), Expr::Tuple { items: vec![int(1)] });
    assert_eq!(expr("(1)"), int(1));
    assert_eq!(expr("1, 2"), Expr::Tuple { items: vec![int(1), int(2)] });
}

#[test]
fn test_lambda_with_default() {
    match parse("f = lambda a, b=2: a + b").remove(0) {
        Stmt::Assign { value: Expr::Lambda(def), .. } => {
            assert_eq!(def.name, "<lambda>");
            assert_eq!(def.params.len(), 2);
            assert_eq!(def.params[1].default, Some(int(2)));
            assert!(matches!(def.body.as_slice(), [Stmt::Return { value: Some(_) }]));
        }
        other => panic!("Expected lambda assignment, got {:?}", other),
    }
}

/* ===================== Statements ===================== */

#[test]
fn test_tuple_swap_assignment() {
    assert_eq!(
        parse("a, b = b, a"),
        vec![Stmt::Assign {
            targets: vec![Expr::Tuple { items: vec![name("a"), name("b")] }],
            value: Expr::Tuple { items: vec![name("b"), name("a")] },
        }]
    );
}

#[test]
fn test_chained_assignment_and_augmented() {
    let stmts = parse("a = b = 0; a += 1");
    assert_eq!(stmts.len(), 2);
    assert!(matches!(&stmts[0], Stmt::Assign { targets, .. } if targets.len() == 2));
    assert!(matches!(&stmts[1], Stmt::AugAssign { op: BinOp::Add, .. }));
}

#[test]
fn test_if_elif_else_nests() {
    let stmts = parse("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
    match &stmts[..] {
        [Stmt::If { then_s, else_s, .. }] => {
            assert_eq!(then_s.len(), 1);
            match &else_s[..] {
                [Stmt::If { test, else_s, .. }] => {
                    assert_eq!(*test, name("b"));
                    assert_eq!(else_s.len(), 1);
                }
                other => panic!("Expected nested If, got {:?}", other),
            }
        }
        other => panic!("Expected If, got {:?}", other),
    }
}

#[test]
fn test_loops_with_else() {
    let stmts = parse("for i in range(3):\n    pass\nelse:\n    done = True\nwhile x: break\n");
    assert!(matches!(&stmts[0], Stmt::For { orelse, .. } if orelse.len() == 1));
    assert!(matches!(&stmts[1], Stmt::While { body, orelse, .. } if body == &vec![Stmt::Break] && orelse.is_empty()));
}

#[test]
fn test_try_statement_clauses() {
    let source = "try:\n    x = 1\nexcept (KeyError, IndexError) as e:\n    x = 2\nexcept:\n    x = 3\nelse:\n    x = 4\nfinally:\n    x = 5\n";
    match &parse(source)[..] {
        [Stmt::Try { body, handlers, orelse, finalbody }] => {
            assert_eq!(body.len(), 1);
            assert_eq!(handlers.len(), 2);
            assert!(matches!(handlers[0].kind, Some(Expr::Tuple { .. })));
            assert_eq!(handlers[0].name.as_deref(), Some("e"));
            assert!(handlers[1].kind.is_none());
            assert_eq!(orelse.len(), 1);
            assert_eq!(finalbody.len(), 1);
        }
        other => panic!("Expected Try, got {:?}", other),
    }
}

#[test]
fn test_function_definition() {
    match &parse("def add(a, b=1):\n    # comment\n\n    return a + b\n")[..] {
        [Stmt::FunctionDef(def)] => {
            assert_eq!(def.name, "add");
            assert_eq!(def.params.len(), 2);
            assert_eq!(def.body.len(), 1);
        }
        other => panic!("Expected FunctionDef, got {:?}", other),
    }
}

#[test]
fn test_simple_statement_forms() {
    let stmts = parse("del d['k'], x\nassert x, 'msg'\nraise\nglobal a, b\npass\n");
    assert!(matches!(&stmts[0], Stmt::Delete { targets } if targets.len() == 2));
    assert!(matches!(&stmts[1], Stmt::Assert { msg: Some(_), .. }));
    assert!(matches!(&stmts[2], Stmt::Raise { exc: None }));
    assert!(matches!(&stmts[3], Stmt::Global { names } if names == &vec!["a".to_string(), "b".to_string()]));
    assert_eq!(stmts[4], Stmt::Pass);
}

/* ===================== Errors ===================== */

#[test]
fn test_invalid_syntax_reports_line() {
    assert_eq!(error("x = 1\nreturn 1 +"), "invalid syntax (<string>, line 2)");
}

#[test]
fn test_unclosed_bracket() {
    assert_eq!(error("x = (1 +"), "'(' was never closed (<string>, line 1)");
}

#[test]
fn test_unexpected_indent() {
    assert_eq!(error("x = 1\n    y = 2"), "unexpected indent (<string>, line 2)");
}

#[test]
fn test_missing_indented_block() {
    assert_eq!(
        error("if x:\nprint(1)"),
        "expected an indented block after 'if' statement on line 1 (<string>, line 2)"
    );
}

#[test]
fn test_missing_block_at_end_of_input() {
    assert_eq!(
        error("x = 1\nwhile x:\n"),
        "expected an indented block after 'while' statement on line 2 (<string>, line 2)"
    );
}

#[test]
fn test_tab_error() {
    assert!(matches!(
        parse_module("if x:\n        a = 1\n\tb = 2\n"),
        Err(ParseError::Indentation { .. })
    ));
    assert_eq!(
        error("if x:\n        a = 1\n\tb = 2\n"),
        "inconsistent use of tabs and spaces in indentation (<string>, line 3)"
    );
}

#[test]
fn test_inconsistent_dedent() {
    assert_eq!(
        error("if x:\n        a = 1\n    b = 2\n"),
        "unindent does not match any outer indentation level (<string>, line 3)"
    );
    assert!(matches!(
        parse_module("if x:\n        a = 1\n    b = 2\n"),
        Err(ParseError::Indentation { .. })
    ));
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(error("break"), "'break' outside loop (<string>, line 1)");
    assert_eq!(
        error("for x in y:\n    def f():\n        break\n"),
        "'break' outside loop (<string>, line 3)"
    );
    assert_eq!(
        error("if x:\n    continue\n"),
        "'continue' not properly in loop (<string>, line 2)"
    );
}

#[test]
fn test_unsupported_statement() {
    assert_eq!(
        error("import os"),
        "'import' statements are not supported (<string>, line 1)"
    );
}

#[test]
fn test_bad_assignment_target() {
    assert_eq!(
        error("f() = 1"),
        "cannot assign to function call here. Maybe you meant '==' instead of '='? (<string>, line 1)"
    );
}

#[test]
fn test_positional_after_keyword() {
    assert_eq!(
        error("f(a=1, 2)"),
        "positional argument follows keyword argument (<string>, line 1)"
    );
}

#[test]
fn test_try_requires_handler() {
    assert_eq!(
        error("try:\n    x = 1\ny = 2\n"),
        "expected 'except' or 'finally' block (<string>, line 3)"
    );
}

#[test]
fn test_stray_else() {
    assert_eq!(error("else:\n    x = 1\n"), "invalid syntax (<string>, line 1)");
}

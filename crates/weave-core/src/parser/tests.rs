use pretty_assertions::assert_eq;

use super::*;

fn parse(source: &str) -> Program {
    parse_program(source).unwrap()
}

fn parse_expr(source: &str) -> Expr {
    let program = parse(source);
    match program.statements.into_iter().next() {
        Some(Stmt::Expr(expr)) => expr,
        other => panic!("expected a single expression statement, got {other:?}"),
    }
}

#[test]
fn parses_let_binding() {
    let program = parse("let x = 42\n");
    assert_eq!(
        program.statements,
        vec![Stmt::Let {
            name: "x".to_string(),
            value: Expr::Integer(42),
        }]
    );
}

#[test]
fn parses_literals() {
    assert_eq!(parse_expr("null\n"), Expr::Null);
    assert_eq!(parse_expr("true\n"), Expr::Boolean(true));
    assert_eq!(parse_expr("3.25\n"), Expr::Float(3.25));
    assert_eq!(
        parse_expr("\"a\\nb\"\n"),
        Expr::String("a\nb".to_string())
    );
    assert_eq!(
        parse_expr("[1, 2]\n"),
        Expr::List(vec![Expr::Integer(1), Expr::Integer(2)])
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        parse_expr("1 + 2 * 3\n"),
        Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::Integer(1)),
            right: Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                left: Box::new(Expr::Integer(2)),
                right: Box::new(Expr::Integer(3)),
            }),
        }
    );
}

#[test]
fn parentheses_override_precedence() {
    assert_eq!(
        parse_expr("(1 + 2) * 3\n"),
        Expr::Binary {
            op: BinaryOp::Mul,
            left: Box::new(Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Integer(1)),
                right: Box::new(Expr::Integer(2)),
            }),
            right: Box::new(Expr::Integer(3)),
        }
    );
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    assert_eq!(
        parse_expr("a + 1 < b * 2\n"),
        Expr::Binary {
            op: BinaryOp::Lt,
            left: Box::new(Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Name("a".to_string())),
                right: Box::new(Expr::Integer(1)),
            }),
            right: Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                left: Box::new(Expr::Name("b".to_string())),
                right: Box::new(Expr::Integer(2)),
            }),
        }
    );
}

#[test]
fn parses_call_with_keyword_arguments() {
    assert_eq!(
        parse_expr("f(1, mode=\"fast\")\n"),
        Expr::Call {
            callee: Box::new(Expr::Name("f".to_string())),
            args: vec![Expr::Integer(1)],
            kwargs: vec![Kwarg {
                name: "mode".to_string(),
                value: Expr::String("fast".to_string()),
            }],
        }
    );
}

#[test]
fn positional_after_keyword_is_an_error() {
    let err = parse_program("f(x=1, 2)\n").unwrap_err();
    assert!(matches!(
        err,
        ParseError::PositionalAfterKeyword { line: 1 }
    ));
}

#[test]
fn parses_postfix_chains() {
    assert_eq!(
        parse_expr("obj.items[0].get(1)\n"),
        Expr::Call {
            callee: Box::new(Expr::Attribute {
                object: Box::new(Expr::Index {
                    object: Box::new(Expr::Attribute {
                        object: Box::new(Expr::Name("obj".to_string())),
                        name: "items".to_string(),
                    }),
                    index: Box::new(Expr::Integer(0)),
                }),
                name: "get".to_string(),
            }),
            args: vec![Expr::Integer(1)],
            kwargs: vec![],
        }
    );
}

#[test]
fn parses_function_with_decorators_and_defaults() {
    let program = parse("@trace\n@timing\nfn f(a, b=2)\n  return a + b\nendfn\n");
    match &program.statements[0] {
        Stmt::Fn(decl) => {
            assert_eq!(decl.name, "f");
            assert_eq!(decl.decorators, vec!["trace", "timing"]);
            assert_eq!(decl.params.len(), 2);
            assert_eq!(decl.params[0].default, None);
            assert_eq!(decl.params[1].default, Some(Expr::Integer(2)));
            assert_eq!(decl.body.len(), 1);
        }
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn non_default_after_default_is_an_error() {
    let err = parse_program("fn f(a=1, b)\n  return b\nendfn\n").unwrap_err();
    assert!(matches!(
        err,
        ParseError::NonDefaultAfterDefault { ref name, .. } if name == "b"
    ));
}

#[test]
fn parses_class_with_methods() {
    let program = parse(
        "class Counter\n  fn init(self, start)\n    self.count = start\n  endfn\n\n  @staticmethod\n  fn help()\n    return \"counts\"\n  endfn\nendclass\n",
    );
    match &program.statements[0] {
        Stmt::Class(decl) => {
            assert_eq!(decl.name, "Counter");
            assert_eq!(decl.methods.len(), 2);
            assert_eq!(decl.methods[0].name, "init");
            assert_eq!(decl.methods[1].decorators, vec!["staticmethod"]);
        }
        other => panic!("expected class declaration, got {other:?}"),
    }
}

#[test]
fn parses_attribute_assignment() {
    let program = parse("self.count = self.count + 1\n");
    match &program.statements[0] {
        Stmt::Assign {
            target: AssignTarget::Attribute { object, name },
            ..
        } => {
            assert_eq!(**object, Expr::Name("self".to_string()));
            assert_eq!(name, "count");
        }
        other => panic!("expected attribute assignment, got {other:?}"),
    }
}

#[test]
fn call_result_is_not_an_assignment_target() {
    let err = parse_program("f() = 3\n").unwrap_err();
    assert!(matches!(
        err,
        ParseError::InvalidAssignmentTarget { line: 1 }
    ));
}

#[test]
fn parses_if_else_and_while() {
    let program = parse(
        "if x > 0\n  print(\"pos\")\nelse\n  print(\"neg\")\nendif\nwhile x > 0\n  x = x - 1\n  if x == 2\n    break\n  endif\n  continue\nendwhile\n",
    );
    assert_eq!(program.statements.len(), 2);
    match &program.statements[0] {
        Stmt::If {
            then_body,
            else_body,
            ..
        } => {
            assert_eq!(then_body.len(), 1);
            assert_eq!(else_body.len(), 1);
        }
        other => panic!("expected if statement, got {other:?}"),
    }
    match &program.statements[1] {
        Stmt::While { body, .. } => assert_eq!(body.len(), 3),
        other => panic!("expected while statement, got {other:?}"),
    }
}

#[test]
fn bare_return_has_no_value() {
    let program = parse("fn f()\n  return\nendfn\n");
    match &program.statements[0] {
        Stmt::Fn(decl) => assert_eq!(decl.body, vec![Stmt::Return(None)]),
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let program = parse("// leading comment\n\nlet x = 1 // trailing\n\n\nlet y = 2\n");
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn unterminated_string_reports_its_line() {
    let err = parse_program("let a = 1\nlet s = \"oops\n").unwrap_err();
    assert!(matches!(err, ParseError::UnterminatedString { line: 2 }));
}

#[test]
fn unclosed_block_is_unexpected_eof() {
    let err = parse_program("fn f()\n  return 1\n").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedEof));
}

#[test]
fn two_statements_on_one_line_are_rejected() {
    let err = parse_program("let x = 1 let y = 2\n").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { line: 1, .. }));
}

#[test]
fn not_and_or_have_expected_precedence() {
    // `not a or b` parses as `(not a) or b`.
    assert_eq!(
        parse_expr("not a or b\n"),
        Expr::Binary {
            op: BinaryOp::Or,
            left: Box::new(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Name("a".to_string())),
            }),
            right: Box::new(Expr::Name("b".to_string())),
        }
    );
}

#[test]
fn unary_minus_applies_to_postfix() {
    assert_eq!(
        parse_expr("-f(1)\n"),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::Call {
                callee: Box::new(Expr::Name("f".to_string())),
                args: vec![Expr::Integer(1)],
                kwargs: vec![],
            }),
        }
    );
}

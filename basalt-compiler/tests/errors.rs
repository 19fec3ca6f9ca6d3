use basalt_compiler::ast::{Expr, Primitive, Stmt, Type, UnaryOp, VariableDeclaration};
use basalt_compiler::{compile_to_ir, lower, parse_to_ast, CompileError, SemanticErrorKind};

// ── Semantic error detection ─────────────────────────────────────────────
// Each test verifies that an invalid program produces the correct error
// kind and the exact message the driver renders.

#[test]
fn unbound_symbol() {
    let result = compile_to_ir("int main() { return x; }");
    assert_semantic_error(result, SemanticErrorKind::Unbound, "Unbound symbol \"x\"");
}

#[test]
fn value_return_in_void_function() {
    let result = compile_to_ir("void f() { return 1; }");
    assert_semantic_error(
        result,
        SemanticErrorKind::ReturnMismatch,
        "Unexpected value return statement in void function",
    );
}

#[test]
fn bare_return_in_non_void_function() {
    let result = compile_to_ir("int f() { return; }");
    assert_semantic_error(
        result,
        SemanticErrorKind::ReturnMismatch,
        "Expected value return statement in non-void returning function",
    );
}

#[test]
fn return_outside_function() {
    let result = compile_to_ir("return 0;");
    assert_semantic_error(
        result,
        SemanticErrorKind::ReturnOutsideFunction,
        "Return statement outside of function body",
    );
}

#[test]
fn pointer_declaration_outside_unsafe() {
    let decl = VariableDeclaration::new(Type::pointer(Type::simple(Primitive::Int)), "p", None);
    let root = wrap_in_function(vec![Stmt::VariableDeclaration(decl)]);

    let result = lower(&root);
    assert_semantic_error(
        result,
        SemanticErrorKind::UnsafeOutsideUnsafe,
        "Unsafe declaration outside of unsafe statement",
    );
}

#[test]
fn reference_declaration_without_initializer() {
    let decl = VariableDeclaration::new(
        Type::lvalue_reference(Type::simple(Primitive::Int)),
        "r",
        None,
    );
    let root = wrap_in_function(vec![Stmt::VariableDeclaration(decl)]);

    let result = lower(&root);
    assert_semantic_error(
        result,
        SemanticErrorKind::ReferenceWithoutInit,
        "Expected initialization value in declaration of reference variable",
    );
}

#[test]
fn address_of_non_lvalue() {
    let statement = Stmt::expression(Expr::unary(UnaryOp::AddressOf, Expr::integer(5)));
    let root = wrap_in_function(vec![statement]);

    let result = lower(&root);
    assert_semantic_error(
        result,
        SemanticErrorKind::NotLvalue,
        "Expected lvalue for operand of reference operator",
    );
}

#[test]
fn call_to_non_function() {
    let result = compile_to_ir("int main() { int x; x(); }");
    assert_semantic_error(
        result,
        SemanticErrorKind::NotCallable,
        "Expected callable function expression",
    );
}

#[test]
fn call_to_undefined_name() {
    let result = compile_to_ir("int main() { g(); }");
    assert_semantic_error(
        result,
        SemanticErrorKind::NotCallable,
        "Expected callable function expression",
    );
}

#[test]
fn array_initializer_as_plain_expression() {
    let statement = Stmt::expression(Expr::array_init(vec![Expr::integer(1)]));
    let root = wrap_in_function(vec![statement]);

    let result = lower(&root);
    assert_semantic_error(
        result,
        SemanticErrorKind::ArrayInitOutsidePlace,
        "Expected expression",
    );
}

// ── Parse and lexical failures ───────────────────────────────────────────

#[test]
fn parse_errors_accumulate() {
    let err = parse_to_ast("int main() { return 0 }").unwrap_err();
    match err {
        CompileError::Parse { errors } => assert!(!errors.is_empty()),
        other => panic!("Expected parse failure, got: {other:?}"),
    }
}

#[test]
fn lexical_error_reports_position() {
    let err = compile_to_ir("int x = 1 @ 2;").unwrap_err();
    match err {
        CompileError::Lexical(lexical) => {
            assert_eq!(lexical.unexpected_char, '@');
            assert_eq!(lexical.line, 1);
        }
        other => panic!("Expected lexical error, got: {other:?}"),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn wrap_in_function(statements: Vec<Stmt>) -> Stmt {
    Stmt::block(vec![Stmt::function(
        Type::simple(Primitive::Void),
        "f",
        vec![],
        Stmt::scope(statements),
    )])
}

fn assert_semantic_error<T: std::fmt::Debug>(
    result: Result<T, CompileError>,
    expected_kind: SemanticErrorKind,
    expected_message: &str,
) {
    match result {
        Ok(_) => panic!("Expected {expected_kind:?} error, but lowering succeeded"),
        Err(CompileError::Semantic { kind, message, .. }) => {
            assert_eq!(kind, expected_kind);
            assert_eq!(message, expected_message);
        }
        Err(other) => panic!("Expected {expected_kind:?} semantic error, got: {other:?}"),
    }
}
